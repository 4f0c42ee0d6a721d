//! Notification decisions
//!
//! This core decides when a notification goes out, to whom, and with which
//! template; delivery (email, in-app, webhook) belongs to the dispatcher
//! collaborator. Dispatch failure is a separate failure domain: callers log
//! it and move on, it never rolls back case state.

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::domain::case::Case;
use crate::domain::notifications::NotificationTemplate;

/// Delivery collaborator.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn notify(
        &self,
        recipients: &[String],
        template: NotificationTemplate,
        data: Value,
    ) -> Result<()>;
}

/// A case crossed the escalation threshold; alert the review board.
pub async fn notify_escalation(
    dispatcher: &dyn NotificationDispatcher,
    recipients: &[String],
    case: &Case,
) -> Result<()> {
    dispatcher
        .notify(
            recipients,
            NotificationTemplate::Escalation,
            json!({
                "case_id": case.id,
                "subject_name": case.subject_name,
                "category": case.category,
                "score": case.score,
                "title": format!("Case escalated: {}", case.category.label()),
                "message": format!(
                    "Case {} reached score {} and requires board review.",
                    case.id, case.score
                ),
            }),
        )
        .await?;

    tracing::info!(case_id = %case.id, score = case.score, "Escalation notification dispatched");
    Ok(())
}

/// A new case entered intake.
pub async fn notify_case_opened(
    dispatcher: &dyn NotificationDispatcher,
    recipients: &[String],
    case: &Case,
) -> Result<()> {
    dispatcher
        .notify(
            recipients,
            NotificationTemplate::CaseOpened,
            json!({
                "case_id": case.id,
                "subject_name": case.subject_name,
                "category": case.category,
                "title": format!("New case: {}", case.category.label()),
                "message": format!("Case {} opened and queued for analysis.", case.id),
            }),
        )
        .await?;

    tracing::info!(case_id = %case.id, "Case-opened notification dispatched");
    Ok(())
}

/// A case reached resolution.
pub async fn notify_resolution(
    dispatcher: &dyn NotificationDispatcher,
    recipients: &[String],
    case: &Case,
) -> Result<()> {
    let resolved_by = case
        .resolution
        .as_ref()
        .map(|r| r.resolved_by.clone())
        .unwrap_or_default();

    dispatcher
        .notify(
            recipients,
            NotificationTemplate::Resolution,
            json!({
                "case_id": case.id,
                "subject_name": case.subject_name,
                "category": case.category,
                "resolved_by": resolved_by,
                "title": format!("Case resolved: {}", case.category.label()),
                "message": format!("Case {} was resolved by {}.", case.id, resolved_by),
            }),
        )
        .await?;

    tracing::info!(case_id = %case.id, "Resolution notification dispatched");
    Ok(())
}

/// A dispatched notification, as recorded by the in-memory dispatcher.
#[derive(Debug, Clone)]
pub struct DispatchedNotification {
    pub recipients: Vec<String>,
    pub template: NotificationTemplate,
    pub data: Value,
}

/// In-memory dispatcher that records instead of delivering.
#[derive(Default)]
pub struct InMemoryNotificationDispatcher {
    sent: Mutex<Vec<DispatchedNotification>>,
}

impl InMemoryNotificationDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<DispatchedNotification> {
        self.sent.lock().clone()
    }

    pub fn count_of(&self, template: NotificationTemplate) -> usize {
        self.sent
            .lock()
            .iter()
            .filter(|n| n.template == template)
            .count()
    }
}

#[async_trait]
impl NotificationDispatcher for InMemoryNotificationDispatcher {
    async fn notify(
        &self,
        recipients: &[String],
        template: NotificationTemplate,
        data: Value,
    ) -> Result<()> {
        self.sent.lock().push(DispatchedNotification {
            recipients: recipients.to_vec(),
            template,
            data,
        });
        Ok(())
    }
}
