use anyhow::Context;
use async_trait::async_trait;

use super::{Mailer, OutgoingMail};

pub struct RelayMailer {
    url: String,
    from: String,
    client: reqwest::Client,
}

impl RelayMailer {
    pub fn new(url: String, from: String) -> Self {
        Self {
            url,
            from,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Mailer for RelayMailer {
    async fn send(&self, mail: &OutgoingMail) -> anyhow::Result<()> {
        self.client
            .post(&self.url)
            .json(&serde_json::json!({
                "from": self.from,
                "to": mail.to,
                "subject": mail.subject,
                "text": mail.text,
            }))
            .send()
            .await
            .context("failed to reach mail relay")?
            .error_for_status()
            .context("mail relay returned error")?;

        tracing::info!(to = %mail.to, "mail handed to relay");
        Ok(())
    }
}
