use async_trait::async_trait;

use super::{MailTransport, OutboundMessage};

/// Logs messages instead of delivering them. Used when no mail service is
/// configured.
pub struct LogTransport;

#[async_trait]
impl MailTransport for LogTransport {
    async fn send(&self, message: &OutboundMessage) -> anyhow::Result<()> {
        tracing::info!(
            template = ?message.template,
            to = %message.params.to_email,
            subject = %message.params.subject_line,
            status = %message.params.booking_status,
            "mail transport not configured, message logged only"
        );
        Ok(())
    }

    fn delivers(&self) -> bool {
        false
    }
}
