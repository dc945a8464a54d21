use anyhow::Context;
use async_trait::async_trait;
use serde_json::json;

use super::{MailTransport, OutboundMessage, Template};

const EMAILJS_SEND_URL: &str = "https://api.emailjs.com/api/v1.0/email/send";

pub struct EmailJsTransport {
    service_id: String,
    public_key: String,
    customer_template: String,
    staff_template: String,
    endpoint: String,
    client: reqwest::Client,
}

impl EmailJsTransport {
    pub fn new(
        service_id: String,
        public_key: String,
        customer_template: String,
        staff_template: String,
    ) -> Self {
        Self {
            service_id,
            public_key,
            customer_template,
            staff_template,
            endpoint: EMAILJS_SEND_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: String) -> Self {
        self.endpoint = endpoint;
        self
    }

    fn template_id(&self, template: Template) -> &str {
        match template {
            Template::Customer => &self.customer_template,
            Template::Staff => &self.staff_template,
        }
    }
}

#[async_trait]
impl MailTransport for EmailJsTransport {
    async fn send(&self, message: &OutboundMessage) -> anyhow::Result<()> {
        let body = json!({
            "service_id": self.service_id,
            "template_id": self.template_id(message.template),
            "user_id": self.public_key,
            "template_params": message.params,
        });

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .context("failed to call EmailJS")?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!("EmailJS error ({status}): {text}");
        }

        tracing::debug!(to = %message.params.to_email, "email sent");
        Ok(())
    }
}
