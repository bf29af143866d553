pub mod relay;

use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub text: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: &OutgoingMail) -> anyhow::Result<()>;
}

// Used when no relay is configured; the verification link ends up in the log.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: &OutgoingMail) -> anyhow::Result<()> {
        tracing::warn!(
            to = %mail.to,
            subject = %mail.subject,
            "mail relay not configured, logging message instead"
        );
        tracing::info!("{}", mail.text);
        Ok(())
    }
}

pub fn verification_mail(
    client_url: &str,
    to: &str,
    first_name: &str,
    token: &str,
) -> OutgoingMail {
    let link = format!(
        "{}/verify-email?token={token}",
        client_url.trim_end_matches('/')
    );

    OutgoingMail {
        to: to.to_string(),
        subject: "Verify your email address".to_string(),
        text: format!(
            "Hello {first_name},\n\n\
             Thanks for registering. Please verify your email address by opening this link:\n\n\
             {link}\n\n\
             If you did not create an account you can ignore this message."
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_mail_contains_link() {
        let mail = verification_mail("http://localhost:3000/", "a@example.com", "Alice", "abc123");
        assert_eq!(mail.to, "a@example.com");
        assert!(mail.text.contains("Hello Alice"));
        assert!(mail
            .text
            .contains("http://localhost:3000/verify-email?token=abc123"));
    }
}
