// --- Environment helpers ---

fn twilio_account_sid() -> Result<String, String> {
    std::env::var("TWILIO_ACCOUNT_SID")
        .map_err(|_| "TWILIO_ACCOUNT_SID is not configured".to_string())
}

fn twilio_auth_token() -> Result<String, String> {
    std::env::var("TWILIO_AUTH_TOKEN")
        .map_err(|_| "TWILIO_AUTH_TOKEN is not configured".to_string())
}

fn twilio_from_number() -> Result<String, String> {
    std::env::var("TWILIO_FROM_NUMBER")
        .map_err(|_| "TWILIO_FROM_NUMBER is not configured".to_string())
}

pub fn app_name() -> String {
    std::env::var("APP_NAME").unwrap_or_else(|_| "Wakeel".to_string())
}

fn api_base() -> String {
    std::env::var("TWILIO_API_BASE").unwrap_or_else(|_| "https://api.twilio.com".to_string())
}

/// Body of the verification SMS. Arabic first, the code on its own line.
pub fn otp_sms_body(code: &str) -> String {
    format!("رمز التحقق الخاص بك في {}:\n{code}\nYour {} verification code.", app_name(), app_name())
}

/// Send an SMS message via Twilio REST API.
#[tracing::instrument(skip(message))]
pub async fn send_sms(to: &str, message: &str) -> Result<(), String> {
    let sid = twilio_account_sid()?;
    let auth_token = twilio_auth_token()?;
    let from = twilio_from_number()?;

    let url = format!("{}/2010-04-01/Accounts/{}/Messages.json", api_base(), sid);

    let response = reqwest::Client::new()
        .post(&url)
        .basic_auth(&sid, Some(&auth_token))
        .form(&[
            ("From", from),
            ("To", to.to_string()),
            ("Body", message.to_string()),
        ])
        .send()
        .await
        .map_err(|e| format!("Twilio request failed: {}", e))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(format!("Twilio API error ({}): {}", status, body));
    }

    tracing::info!(to = to, "SMS sent");
    Ok(())
}
