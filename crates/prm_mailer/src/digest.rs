use std::sync::Arc;

use prm_core::config::MailSettings;
use prm_core::{AnalyzedArticle, MailMessage, MailTransport, Result};

/// One entry per article: headline, summary and source link on their own
/// lines, entries separated by a blank line.
pub fn render_digest(articles: &[AnalyzedArticle]) -> String {
    articles
        .iter()
        .map(|item| {
            format!(
                "{}\n{}\n{}",
                item.analysis.headline.trim(),
                item.analysis.summary.trim(),
                item.article.pub_url
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Sends the digest of a run's kept articles to the configured recipients.
#[derive(Clone)]
pub struct DigestNotifier {
    transport: Arc<dyn MailTransport>,
    sender: String,
    recipients: Vec<String>,
    subject: String,
}

impl DigestNotifier {
    pub fn new(transport: Arc<dyn MailTransport>, sender: String, recipients: Vec<String>, subject: String) -> Self {
        Self {
            transport,
            sender,
            recipients,
            subject,
        }
    }

    pub fn from_settings(transport: Arc<dyn MailTransport>, settings: &MailSettings) -> Self {
        Self::new(
            transport,
            settings.sender.clone(),
            settings.recipients.clone(),
            settings.subject.clone(),
        )
    }

    pub fn message(&self, articles: &[AnalyzedArticle]) -> MailMessage {
        MailMessage {
            from: self.sender.clone(),
            to: self.recipients.clone(),
            subject: self.subject.clone(),
            body: render_digest(articles),
        }
    }

    /// Send one email covering `articles`. Nothing is sent for an empty
    /// list or when no recipient is configured.
    pub async fn notify(&self, articles: &[AnalyzedArticle]) -> Result<()> {
        if articles.is_empty() {
            return Ok(());
        }
        if self.recipients.is_empty() {
            tracing::warn!("No digest recipients configured, skipping email for {} article(s)", articles.len());
            return Ok(());
        }

        self.transport.send(&self.message(articles)).await?;
        tracing::info!("Digest with {} article(s) sent to {} recipient(s)", articles.len(), self.recipients.len());
        Ok(())
    }
}

impl std::fmt::Debug for DigestNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DigestNotifier")
            .field("sender", &self.sender)
            .field("recipients", &self.recipients)
            .field("subject", &self.subject)
            .finish()
    }
}
