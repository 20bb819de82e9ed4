#[cfg(test)]
mod common;


#[cfg(test)]
mod catalog_tests;

#[cfg(test)]
mod provider_service_tests;

#[cfg(test)]
mod request_tests;

#[cfg(test)]
mod message_tests;


#[cfg(test)]
mod organization_tests;

#[cfg(test)]
mod wallet_tests;

#[cfg(test)]
mod report_tests;



#[cfg(test)]
mod otp_tests;

#[cfg(test)]
mod rate_limit_tests;
