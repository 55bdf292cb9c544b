//! Outbound notification delivery.
//!
//! Jobs hand a `Notification` to a `Notifier`; the trait hides whether the
//! message goes to a real delivery service or, in tests, a buffer. Failures
//! surface to the caller, there is no internal retry.

use async_trait::async_trait;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TemplateKind {
    BudgetAlert,
    MonthlyReport,
}

#[derive(Clone, Debug, Serialize)]
pub struct Notification {
    /// Email address of the user the message is for.
    pub recipient: String,
    pub subject: String,
    pub template: TemplateKind,
    /// Template parameters, shape depends on `template`.
    pub data: serde_json::Value,
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("delivery endpoint returned {status}: {message}")]
    Status { status: u16, message: String },
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: Notification) -> Result<(), NotifyError>;
}

/// Posts notifications as JSON to a delivery endpoint.
#[derive(Clone, Debug)]
pub struct HttpNotifier {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpNotifier {
    pub fn new(endpoint: String, api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
            api_key,
        }
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn send(&self, notification: Notification) -> Result<(), NotifyError> {
        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&notification)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let message = resp.text().await.unwrap_or_default();
        Err(NotifyError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

/// Collects notifications in memory; for tests.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    sent: std::sync::Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        match self.sent.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    async fn send(&self, notification: Notification) -> Result<(), NotifyError> {
        match self.sent.lock() {
            Ok(mut guard) => guard.push(notification),
            Err(poisoned) => poisoned.into_inner().push(notification),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_kinds_serialize_kebab_case() {
        let alert = serde_json::to_string(&TemplateKind::BudgetAlert).unwrap();
        assert_eq!(alert, "\"budget-alert\"");
        let report = serde_json::to_string(&TemplateKind::MonthlyReport).unwrap();
        assert_eq!(report, "\"monthly-report\"");
    }
}
