//! Reminder scheduling
//!
//! Derives a day-offset follow-up plan from a case's score tier and hands it
//! to the deferred-task collaborator. Identity is `(case_id, offset_day)`,
//! so re-deriving the same plan is a no-op.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::scheduler::DeferredTaskScheduler;

/// Day offsets per score tier. Higher tiers get earlier, denser follow-up.
pub fn plan_for_tier(tier: u8) -> &'static [i64] {
    match tier {
        t if t >= 4 => &[3, 7, 14],
        3 => &[7, 14],
        2 => &[14],
        // Tier 1, and conservatively anything out of range.
        _ => &[30],
    }
}

fn reminder_key(case_id: Uuid, offset_day: i64) -> String {
    format!("reminder:{}:{}", case_id, offset_day)
}

pub struct ReminderService {
    scheduler: Arc<dyn DeferredTaskScheduler>,
}

impl ReminderService {
    pub fn new(scheduler: Arc<dyn DeferredTaskScheduler>) -> Self {
        Self { scheduler }
    }

    /// Schedule the tier plan for a case. Returns the number of newly
    /// scheduled reminders (already-scheduled offsets are skipped).
    pub async fn schedule_for_case(
        &self,
        case_id: Uuid,
        tier: u8,
        from: DateTime<Utc>,
    ) -> CoreResult<usize> {
        let mut scheduled = 0usize;

        for &offset_day in plan_for_tier(tier) {
            let key = reminder_key(case_id, offset_day);
            let fire_at = from + Duration::days(offset_day);
            let payload = json!({
                "case_id": case_id,
                "offset_day": offset_day,
                "due_at": fire_at,
            });

            let created = self
                .scheduler
                .schedule(&key, fire_at, payload)
                .await
                .map_err(CoreError::Scheduling)?;

            if created {
                scheduled += 1;
            } else {
                debug!(case_id = %case_id, offset_day, "reminder already scheduled, skipping");
            }
        }

        debug!(case_id = %case_id, tier, scheduled, "reminder plan applied");
        Ok(scheduled)
    }
}
