use crate::core::{PageDriver, SearchRoot, SessionConfig, SettleSignal, SubmitConfig};
use crate::form::catalog::{submit_candidates, CandidateCatalog};
use crate::form::locator::CandidateList;
use crate::form::resolver::FieldResolver;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{info, warn};

/// What happened when the driver tried to submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SubmitAttempt {
    Activated {
        /// Description of the control that was clicked.
        control: String,
        signal: SettleSignal,
    },
    /// No usable submit affordance. Reported, never thrown.
    ControlNotFound,
    /// The click itself failed.
    ActivationFailed { control: String, reason: String },
    /// Submission deliberately not attempted.
    Skipped { reason: String },
}

impl SubmitAttempt {
    pub fn navigation_occurred(&self) -> bool {
        matches!(
            self,
            SubmitAttempt::Activated {
                signal: SettleSignal::Navigated,
                ..
            }
        )
    }

    pub fn was_activated(&self) -> bool {
        matches!(self, SubmitAttempt::Activated { .. })
    }
}

/// Finds and clicks the submit control, then races navigation against a fixed bound.
pub struct SubmissionDriver<'a> {
    page: &'a dyn PageDriver,
    candidates: CandidateList,
    navigation_timeout_ms: u64,
    settle_bound_ms: u64,
}

impl<'a> SubmissionDriver<'a> {
    pub fn new(page: &'a dyn PageDriver, submit: &SubmitConfig, session: &SessionConfig) -> Self {
        Self {
            page,
            candidates: submit_candidates(submit),
            navigation_timeout_ms: session.submit_navigation_timeout_ms,
            settle_bound_ms: session.submit_settle_ms,
        }
    }

    pub fn with_candidates(mut self, candidates: CandidateList) -> Self {
        self.candidates = candidates;
        self
    }

    pub async fn submit(&self, root: &SearchRoot) -> SubmitAttempt {
        let catalog = CandidateCatalog::new();
        let resolver = FieldResolver::new(self.page, &catalog);

        let control = match resolver
            .first_usable(&self.candidates, root, &HashSet::new())
            .await
        {
            Ok(found) => found,
            Err(_) => {
                warn!("no submit control in {}", root);
                return SubmitAttempt::ControlNotFound;
            }
        };

        let described = format!(
            "{} {:?}",
            control.profile.describe(),
            control.profile.visible_text()
        );
        info!("submitting via {} ({})", described, control.query.describe());

        if let Err(e) = self.page.click(&control.handle).await {
            warn!("submit click failed: {}", e);
            return SubmitAttempt::ActivationFailed {
                control: described,
                reason: e.to_string(),
            };
        }

        let signal = self.await_settle().await;
        info!("after submit: {:?}", signal);
        SubmitAttempt::Activated {
            control: described,
            signal,
        }
    }

    /// Navigation wait and fixed bound run concurrently; whichever ends first wins.
    async fn await_settle(&self) -> SettleSignal {
        let bound = tokio::time::sleep(Duration::from_millis(self.settle_bound_ms));
        tokio::select! {
            settled = self.page.wait_for_settle(self.navigation_timeout_ms) => match settled {
                Ok(signal) => signal,
                Err(e) => {
                    warn!("settle wait failed: {}", e);
                    SettleSignal::TimedOut
                }
            },
            _ = bound => SettleSignal::BoundElapsed,
        }
    }
}
