use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use prm_core::config::MailSettings;
use prm_core::{Error, MailMessage, MailTransport, Result};

/// SMTP over implicit TLS (port 465), logging in as the sender.
#[derive(Clone)]
pub struct SmtpMailer {
    host: String,
    username: String,
    password: Option<String>,
}

impl SmtpMailer {
    pub fn new(host: impl Into<String>, username: impl Into<String>, password: Option<String>) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            password,
        }
    }

    pub fn from_settings(settings: &MailSettings) -> Self {
        Self::new(&settings.smtp_host, &settings.sender, settings.password.clone())
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
        let password = self
            .password
            .clone()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| Error::Mail("EMAIL_PASSWORD is not set".to_string()))?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.host)
            .map_err(|e| Error::Mail(format!("Invalid SMTP relay {}: {}", self.host, e)))?
            .credentials(Credentials::new(self.username.clone(), password))
            .build();
        Ok(transport)
    }
}

fn mailbox(address: &str) -> Result<Mailbox> {
    address
        .parse()
        .map_err(|e| Error::Mail(format!("Invalid address {}: {}", address, e)))
}

/// Build the MIME message: plain text, every recipient on the `To` line.
pub fn build_email(message: &MailMessage) -> Result<Message> {
    let mut builder = Message::builder()
        .from(mailbox(&message.from)?)
        .subject(message.subject.as_str())
        .header(ContentType::TEXT_PLAIN);
    for recipient in &message.to {
        builder = builder.to(mailbox(recipient)?);
    }
    builder
        .body(message.body.clone())
        .map_err(|e| Error::Mail(format!("Failed to build email: {}", e)))
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, message: &MailMessage) -> Result<()> {
        let email = build_email(message)?;
        self.transport()?
            .send(email)
            .await
            .map_err(|e| Error::Mail(format!("SMTP delivery via {} failed: {}", self.host, e)))?;
        Ok(())
    }
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(to: Vec<&str>) -> MailMessage {
        MailMessage {
            from: "monitor@example.com".to_string(),
            to: to.into_iter().map(str::to_string).collect(),
            subject: "here's the latest China press release".to_string(),
            body: "Headline.\nSummary.\nhttps://www.gov.cn/1.htm".to_string(),
        }
    }

    #[test]
    fn test_build_email_addresses_every_recipient() {
        let email = build_email(&message(vec!["a@example.com", "b@example.com"])).unwrap();
        let raw = String::from_utf8(email.formatted()).unwrap();
        assert!(raw.contains("a@example.com"));
        assert!(raw.contains("b@example.com"));
        assert!(raw.contains("Content-Type: text/plain"));
    }

    #[test]
    fn test_invalid_recipient_is_a_mail_error() {
        let err = build_email(&message(vec!["not an address"])).unwrap_err();
        assert!(matches!(err, Error::Mail(_)));
    }

    #[tokio::test]
    async fn test_missing_password_fails_before_connecting() {
        let mailer = SmtpMailer::new("smtp.gmail.com", "monitor@example.com", None);
        let err = mailer.send(&message(vec!["a@example.com"])).await.unwrap_err();
        assert!(err.to_string().contains("EMAIL_PASSWORD"));
    }

    #[test]
    fn test_debug_hides_password() {
        let mailer = SmtpMailer::new("smtp.gmail.com", "monitor@example.com", Some("hunter2".to_string()));
        assert!(!format!("{:?}", mailer).contains("hunter2"));
    }
}
