// --- Environment helpers ---

fn mailgun_api_key() -> Result<String, String> {
    std::env::var("MAILGUN_API_KEY").map_err(|_| "MAILGUN_API_KEY is not configured".to_string())
}

fn mailgun_domain() -> Result<String, String> {
    std::env::var("MAILGUN_DOMAIN").map_err(|_| "MAILGUN_DOMAIN is not configured".to_string())
}

fn mailgun_from() -> Result<String, String> {
    match std::env::var("MAILGUN_FROM") {
        Ok(v) => Ok(v),
        Err(_) => Ok(format!("{} <noreply@{}>", crate::twilio::app_name(), mailgun_domain()?)),
    }
}

#[tracing::instrument(skip(html_body))]
pub async fn send_email(to: &str, subject: &str, html_body: &str) -> Result<(), String> {
    let domain = mailgun_domain()?;
    let url = format!("https://api.mailgun.net/v3/{}/messages", domain);

    let response = reqwest::Client::new()
        .post(&url)
        .basic_auth("api", Some(mailgun_api_key()?))
        .form(&[
            ("from", mailgun_from()?),
            ("to", to.to_string()),
            ("subject", subject.to_string()),
            ("html", html_body.to_string()),
        ])
        .send()
        .await
        .map_err(|e| format!("Mailgun request failed: {}", e))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(format!("Mailgun API error ({}): {}", status, body));
    }

    tracing::info!(to = to, subject = subject, "Email sent");
    Ok(())
}

/// Send a verification code by email.
pub async fn send_otp_email(to: &str, code: &str) -> Result<(), String> {
    let app = crate::twilio::app_name();
    send_email(to, &format!("{app} verification code"), &templates::otp_html(code, &app)).await
}

mod templates {
    pub fn otp_html(code: &str, app_name: &str) -> String {
        format!(
            r#"<div dir="rtl" style="font-family: sans-serif; max-width: 480px; margin: 0 auto;">
  <h2>{app_name}</h2>
  <p>رمز التحقق الخاص بك:</p>
  <p style="font-size: 28px; letter-spacing: 6px; font-weight: bold;">{code}</p>
  <p style="color: #666;">Your verification code expires in {minutes} minutes.</p>
</div>"#,
            minutes = shared_types::OTP_EXPIRY_MINUTES,
        )
    }
}
