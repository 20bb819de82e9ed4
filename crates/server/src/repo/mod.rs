//! Postgres access, one module per table family. Every function takes the
//! pool (or an executor when it must join a caller's transaction) and maps
//! sqlx failures into `AppError`.

pub mod activity;
pub mod cases;
pub mod catalog;
pub mod lawyers;
pub mod membership;
pub mod messages;
pub mod notifications;
pub mod organizations;
pub mod otp;
pub mod provider_services;
pub mod requests;
pub mod settings;
pub mod support;
pub mod time_logs;
pub mod users;
pub mod wallet;
