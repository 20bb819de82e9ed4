pub mod config;
pub mod error;

pub mod account;
pub mod activity;
pub mod case_file;
pub mod catalog;
pub mod common;
pub mod membership;
pub mod notification;
pub mod organization;
pub mod otp;
pub mod pricing;
pub mod provider_service;
pub mod report;
pub mod request;
pub mod settings;
pub mod support;
pub mod time_log;
pub mod wallet;

pub use config::*;
pub use error::*;

pub use account::*;
pub use activity::*;
pub use case_file::*;
pub use catalog::*;
pub use common::*;
pub use membership::*;
pub use notification::*;
pub use organization::*;
pub use otp::*;
pub use pricing::*;
pub use provider_service::*;
pub use report::*;
pub use request::*;
pub use settings::*;
pub use support::*;
pub use time_log::*;
pub use wallet::*;
