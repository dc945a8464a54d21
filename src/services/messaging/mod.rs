pub mod emailjs;
pub mod log;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::SalonIdentity;

/// Which outbound template renders a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    Customer,
    Staff,
}

/// Template variables. Field names are the placeholders used by the mail
/// templates.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MessageParams {
    pub to_email: String,
    pub subject_line: String,
    pub email_title: String,
    pub customer_name: String,
    pub service_name: String,
    pub booking_date: String,
    pub booking_time: String,
    pub booking_status: String,
    pub main_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_notes: Option<String>,
    #[serde(flatten)]
    pub salon: SalonIdentity,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub template: Template,
    pub params: MessageParams,
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> anyhow::Result<()>;

    /// Whether a successful `send` means the recipient actually gets mail.
    fn delivers(&self) -> bool {
        true
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::{MailTransport, OutboundMessage};

    /// Records every message; fails every send when `fail` is set.
    #[derive(Clone, Default)]
    pub struct RecordingTransport {
        pub sent: Arc<Mutex<Vec<OutboundMessage>>>,
        pub fail: bool,
    }

    impl RecordingTransport {
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        pub fn sent(&self) -> Vec<OutboundMessage> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MailTransport for RecordingTransport {
        async fn send(&self, message: &OutboundMessage) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("mail service unavailable");
            }
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }
    }
}
