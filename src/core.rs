//! `CaseCore`: the surface the web layer calls
//!
//! Constructed once with injected collaborators; no ambient globals. The
//! operations here are the whole contract: analysis, scoring, lifecycle
//! transitions. Notifications and reminders are fire-and-forget side effects
//! of those operations; their failures are logged, never propagated.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Settings;
use crate::domain::analysis::AnalysisReport;
use crate::domain::case::{Case, CaseStatus, NewCase, TransitionRequest};
use crate::error::{CoreError, CoreResult};
use crate::repo::{CaseRepository, DocumentStore};
use crate::scheduler::DeferredTaskScheduler;
use crate::services::escalation::{self, TransitionLocks, ESCALATION_THRESHOLD};
use crate::services::notifications::{
    notify_case_opened, notify_escalation, notify_resolution, NotificationDispatcher,
};
use crate::services::{scoring, Analyzer, InferenceService, ReminderService};

pub struct CaseCore {
    repo: Arc<dyn CaseRepository>,
    documents: Arc<dyn DocumentStore>,
    notifier: Arc<dyn NotificationDispatcher>,
    analyzer: Analyzer,
    reminders: ReminderService,
    locks: TransitionLocks,
    settings: Settings,
}

impl CaseCore {
    pub fn new(
        settings: Settings,
        repo: Arc<dyn CaseRepository>,
        documents: Arc<dyn DocumentStore>,
        inference: Arc<dyn InferenceService>,
        notifier: Arc<dyn NotificationDispatcher>,
        scheduler: Arc<dyn DeferredTaskScheduler>,
    ) -> Arc<Self> {
        let analyzer = Analyzer::new(inference, &settings);
        let reminders = ReminderService::new(scheduler);

        Arc::new(Self {
            repo,
            documents,
            notifier,
            analyzer,
            reminders,
            locks: TransitionLocks::new(),
            settings,
        })
    }

    /// Persist a new `Open` case and acknowledge intake.
    pub async fn create_case(&self, input: NewCase) -> CoreResult<Case> {
        let case = Case::new(input, Utc::now());
        self.repo.save(&case).await.map_err(CoreError::Repository)?;

        info!(case_id = %case.id, category = %case.category, "Case created");

        if let Err(e) = notify_case_opened(
            self.notifier.as_ref(),
            &self.settings.review_board_recipients,
            &case,
        )
        .await
        {
            warn!(case_id = %case.id, error = %e, "case_opened notification failed");
        }

        Ok(case)
    }

    /// Run the full analysis pipeline and persist the report.
    ///
    /// Always yields a report: an unreadable document degrades every pass to
    /// its default rather than failing the request.
    pub async fn run_analysis(&self, case_id: Uuid) -> CoreResult<AnalysisReport> {
        let mut case = self.load(case_id).await?;

        let report = match self.documents.fetch(&case.document_ref).await {
            Ok(text) => self.analyzer.analyze(&case, &text).await,
            Err(e) => {
                warn!(
                    case_id = %case_id,
                    document_ref = %case.document_ref,
                    error = %e,
                    "document unavailable, producing fully degraded report"
                );
                AnalysisReport::degraded_default(Utc::now())
            }
        };

        // The aggregate replaces any previous report in one atomic write;
        // readers never observe partial analysis state.
        case.analysis_report = Some(report.clone());
        self.repo.save(&case).await.map_err(CoreError::Repository)?;

        info!(
            case_id = %case_id,
            risks = report.risks.len(),
            degraded = report.degraded,
            "Analysis persisted"
        );
        Ok(report)
    }

    /// Recompute the case's repeat-subject score from a snapshot of prior
    /// cases, persist it, and auto-escalate when it crosses the threshold.
    pub async fn compute_score(&self, case_id: Uuid) -> CoreResult<u8> {
        let mut case = self.load(case_id).await?;

        let prior = match self
            .repo
            .query_by_subject_prior_to(&case.subject_name, &case.subject_address, case.created_at)
            .await
        {
            Ok(prior) => prior,
            Err(e) => {
                warn!(
                    case_id = %case_id,
                    error = %e,
                    "scoring data unavailable, defaulting to tier 1"
                );
                Vec::new()
            }
        };

        let score = scoring::score_case(&case, &prior);
        case.score = score;
        self.repo.save(&case).await.map_err(CoreError::Repository)?;
        debug!(case_id = %case_id, score, prior = prior.len(), "Score computed");

        // Every scored case gets its tier's follow-up cadence; escalation
        // re-derives the denser plan idempotently.
        self.schedule_reminders(&case).await;

        if score >= ESCALATION_THRESHOLD && case.status == CaseStatus::Open {
            // Reuses the guarded transition path, so a concurrent manual
            // transition cannot race this into an illegal state.
            if let Err(e) = self
                .transition(case_id, CaseStatus::Escalated, TransitionRequest::default())
                .await
            {
                warn!(case_id = %case_id, error = %e, "automatic escalation failed");
            }
        }

        Ok(score)
    }

    /// Recompute every case's score in ascending `created_at` order against
    /// one snapshot. Returns how many stored scores changed. Scores can go
    /// down here; escalation state is never reverted automatically.
    pub async fn rescore_all(&self) -> CoreResult<usize> {
        let mut cases = self.repo.list_all().await.map_err(CoreError::Repository)?;
        cases.sort_by_key(|c| c.created_at);
        let snapshot = cases.clone();

        let mut changed = 0usize;
        for case in cases.iter_mut() {
            let score = scoring::score_case(case, &snapshot);
            if score != case.score {
                info!(
                    case_id = %case.id,
                    old_score = case.score,
                    new_score = score,
                    "Rescore changed stored score"
                );
                case.score = score;
                self.repo.save(case).await.map_err(CoreError::Repository)?;
                changed += 1;
            }
        }

        info!(total = snapshot.len(), changed, "Batch rescore complete");
        Ok(changed)
    }

    /// Validate and apply a lifecycle transition, then fire its side effects.
    pub async fn transition(
        &self,
        case_id: Uuid,
        target: CaseStatus,
        request: TransitionRequest,
    ) -> CoreResult<Case> {
        let lock = self.locks.for_case(case_id);
        let _guard = lock.lock().await;

        // Re-read under the lock: concurrent requests must validate against
        // the status the previous one persisted.
        let mut case = self.load(case_id).await?;
        let from = case.status;

        escalation::validate_transition(&case, target, &request)?;
        escalation::apply_transition(&mut case, target, &request, Utc::now());
        self.repo.save(&case).await.map_err(CoreError::Repository)?;

        info!(case_id = %case_id, from = %from, to = %target, "Case transitioned");

        match target {
            CaseStatus::Escalated => self.on_escalated(&case).await,
            CaseStatus::Resolved => {
                if let Err(e) = notify_resolution(
                    self.notifier.as_ref(),
                    &self.settings.review_board_recipients,
                    &case,
                )
                .await
                {
                    warn!(case_id = %case_id, error = %e, "resolution notification failed");
                }
            }
            _ => {}
        }

        Ok(case)
    }

    async fn on_escalated(&self, case: &Case) {
        if let Err(e) = notify_escalation(
            self.notifier.as_ref(),
            &self.settings.review_board_recipients,
            case,
        )
        .await
        {
            warn!(case_id = %case.id, error = %e, "escalation notification failed");
        }

        self.schedule_reminders(case).await;
    }

    /// Fire-and-forget: scheduling failures are logged, never propagated.
    async fn schedule_reminders(&self, case: &Case) {
        match self
            .reminders
            .schedule_for_case(case.id, case.score, Utc::now())
            .await
        {
            Ok(scheduled) => {
                debug!(case_id = %case.id, scheduled, tier = case.score, "Reminder plan applied");
            }
            Err(e) => {
                warn!(case_id = %case.id, error = %e, "reminder scheduling failed");
            }
        }
    }

    async fn load(&self, case_id: Uuid) -> CoreResult<Case> {
        self.repo
            .get(case_id)
            .await
            .map_err(CoreError::Repository)?
            .ok_or(CoreError::NotFound(case_id))
    }
}
