use crate::core::{Config, PageDriver, SearchRoot};
use crate::dom::{PageTextProcessor, PostSubmitState};
use crate::form::catalog::{reveal_candidates, CandidateCatalog};
use crate::form::classifier::{OutcomeClassifier, SubmissionOutcome};
use crate::form::intent::{FieldIntent, FieldMap, FieldValue};
use crate::form::locator::{CandidateList, Locator, TagScope};
use crate::form::orchestrator::FillOrchestrator;
use crate::form::platform::AtsPlatform;
use crate::form::resolver::FieldResolver;
use crate::form::submit::{SubmissionDriver, SubmitAttempt};
use crate::types::{ApplicationReport, ApplicationRequest, Checkpoint};
use crate::utils::ScreenshotManager;
use crate::widgets::AdapterRegistry;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Runs one application end to end on an already loaded page.
pub struct FormRunner<'a> {
    page: &'a dyn PageDriver,
    config: &'a Config,
    catalog: CandidateCatalog,
    registry: AdapterRegistry,
    processor: PageTextProcessor,
    classifier: OutcomeClassifier,
}

impl<'a> FormRunner<'a> {
    pub fn new(page: &'a dyn PageDriver, config: &'a Config) -> Self {
        Self {
            page,
            config,
            catalog: CandidateCatalog::new(),
            registry: AdapterRegistry::with_defaults(),
            processor: PageTextProcessor::new(&config.classifier.error_selectors),
            classifier: OutcomeClassifier::new(&config.classifier),
        }
    }

    pub fn with_catalog(mut self, catalog: CandidateCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_registry(mut self, registry: AdapterRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub async fn run(&self, session_id: &str, request: &ApplicationRequest) -> ApplicationReport {
        let mut report = ApplicationReport::new(session_id, &request.url);
        info!("applying to {} ({})", request.url, report.platform);

        let mut root = self.discover_root().await;
        if self.config.session.reveal_form && !self.has_visible_control(&root).await {
            if self.reveal_form(&root).await {
                report.note("clicked an apply button to reveal the form");
                root = self.discover_root().await;
            } else {
                report.note("no visible form controls and nothing to reveal them");
            }
        }
        report.root = root.clone();

        self.checkpoint(&mut report, Checkpoint::BeforeFill).await;

        let fields = fields_with_attachment(request);
        let orchestrator = FillOrchestrator::new(
            self.page,
            &self.catalog,
            &self.registry,
            &self.config.session,
        );
        report.fill = orchestrator.fill(&fields, &root).await;

        self.checkpoint(&mut report, Checkpoint::AfterFill).await;

        report.submission = self.submit_gated(&report, &root).await;
        if report.submission.was_activated() {
            self.checkpoint(&mut report, Checkpoint::AfterSubmit).await;
            self.classify(&mut report, &root).await;
        } else {
            report.outcome = SubmissionOutcome::Uncertain;
        }

        report.final_url = self.page.current_url().await.ok();
        report.finished_at = chrono::Utc::now();
        info!(
            "{}: {} / {}",
            request.url,
            report.fill.summary(),
            report.outcome.label()
        );
        report
    }

    /// First inline frame whose source matches a configured hint, then a frame hosted by a
    /// platform known to embed its forms, else the page.
    async fn discover_root(&self) -> SearchRoot {
        let sources = match self.page.frame_sources().await {
            Ok(sources) => sources,
            Err(e) => {
                debug!("frame listing failed: {}", e);
                return SearchRoot::Page;
            }
        };

        for hint in &self.config.session.frame_hints {
            if sources.iter().any(|src| src.contains(hint.as_str())) {
                info!("application form embedded in a {} frame", hint);
                return SearchRoot::frame(hint.clone());
            }
        }

        let embedded = sources
            .iter()
            .map(|src| AtsPlatform::detect(src))
            .filter(|platform| platform.embeds_in_frame())
            .find_map(|platform| platform.host_marker().map(|marker| (platform, marker)));
        if let Some((platform, marker)) = embedded {
            info!("application form embedded in a {} frame", platform);
            return SearchRoot::frame(marker);
        }
        SearchRoot::Page
    }

    async fn has_visible_control(&self, root: &SearchRoot) -> bool {
        let any_control = CandidateList::scoped(TagScope::Control, &[], vec![Locator::AnyInScope]);
        FieldResolver::new(self.page, &self.catalog)
            .first_usable(&any_control, root, &HashSet::new())
            .await
            .is_ok()
    }

    async fn reveal_form(&self, root: &SearchRoot) -> bool {
        let candidates = reveal_candidates(&self.config.submit);
        let found = match FieldResolver::new(self.page, &self.catalog)
            .first_usable(&candidates, root, &HashSet::new())
            .await
        {
            Ok(found) => found,
            Err(_) => return false,
        };

        info!("revealing form via {:?}", found.profile.visible_text());
        if let Err(e) = self.page.click(&found.handle).await {
            warn!("reveal click failed: {}", e);
            return false;
        }
        if let Err(e) = self
            .page
            .wait_for_settle(self.config.session.navigation_timeout_ms)
            .await
        {
            debug!("settle after reveal: {}", e);
        }
        tokio::time::sleep(std::time::Duration::from_millis(
            self.config.session.widget_settle_ms,
        ))
        .await;
        true
    }

    async fn submit_gated(&self, report: &ApplicationReport, root: &SearchRoot) -> SubmitAttempt {
        let session = &self.config.session;
        if session.dry_run {
            return SubmitAttempt::Skipped {
                reason: "dry run".to_string(),
            };
        }

        let filled = report.fill.filled_count();
        if filled < session.min_filled_fields {
            warn!(
                "only {} fields filled (need {}), not submitting",
                filled, session.min_filled_fields
            );
            return SubmitAttempt::Skipped {
                reason: format!(
                    "{} fields filled, {} required",
                    filled, session.min_filled_fields
                ),
            };
        }

        SubmissionDriver::new(self.page, &self.config.submit, session)
            .submit(root)
            .await
    }

    /// Classify using the root's text plus the top page's text, since a frame may have been
    /// replaced by a confirmation on the parent page.
    async fn classify(&self, report: &mut ApplicationReport, root: &SearchRoot) {
        let url = self.page.current_url().await.unwrap_or_default();
        let mut state = PostSubmitState::new(url, String::new());
        let mut messages = Vec::new();

        let mut roots = vec![root.clone()];
        if root.is_frame() {
            roots.push(SearchRoot::Page);
        }

        for r in &roots {
            match self.page.page_text(r).await {
                Ok(text) => state.append_text(&self.processor.normalize_text(&text)),
                Err(e) => debug!("no text from {}: {}", r, e),
            }
            match self.page.page_html(r).await {
                Ok(html) => messages.extend(self.processor.error_messages(&html)),
                Err(e) => debug!("no html from {}: {}", r, e),
            }
        }
        messages.dedup();
        let state = state.with_error_messages(messages);

        let verdict = self.classifier.verdict(&state.text, &state.error_messages);
        if verdict.captcha_suspected {
            report.note("captcha marker present after submit");
        }
        report.outcome = verdict.outcome;
        report.matched_term = verdict.matched_term;
        report.captcha_suspected = verdict.captcha_suspected;
        report.page_excerpt = Some(state.excerpt(400));
        report.error_messages = state.error_messages;
    }

    async fn checkpoint(&self, report: &mut ApplicationReport, checkpoint: Checkpoint) {
        if !self.config.session.capture_checkpoints {
            return;
        }
        if let Some(capture) = ScreenshotManager::capture(self.page, checkpoint).await {
            report.captures.push(capture);
        }
    }
}

fn fields_with_attachment(request: &ApplicationRequest) -> FieldMap {
    let mut fields = request.fields.clone();
    if let Some(path) = &request.attachment {
        if fields.get(&FieldIntent::ResumeFile).is_none() {
            fields.insert(FieldIntent::ResumeFile, FieldValue::file(path));
        }
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::FillResult;
    use crate::testing::MockPage;

    fn quick_config() -> Config {
        let mut config = Config::default();
        config.session.widget_settle_ms = 0;
        config.session.upload_settle_ms = 0;
        config.session.submit_settle_ms = 50;
        config.session.submit_navigation_timeout_ms = 1000;
        config.session.navigation_timeout_ms = 100;
        config
    }

    fn request(fields: FieldMap) -> ApplicationRequest {
        ApplicationRequest::new("https://careers.acme.nl/jobs/42", fields)
    }

    fn contact_fields() -> FieldMap {
        FieldMap::new()
            .with(FieldIntent::Email, FieldValue::text("user@example.com"))
            .with(FieldIntent::Phone, FieldValue::text("0612345678"))
            .with(FieldIntent::City, FieldValue::text("Utrecht"))
    }

    const FORM: &str = r#"<form>
        <input placeholder="Email">
        <input type="tel" name="phone">
        <button type="submit">Solliciteer</button>
    </form>"#;

    #[tokio::test]
    async fn test_success_after_navigation() {
        let page = MockPage::new(FORM).navigate_on_submit(
            "https://careers.acme.nl/thanks",
            "<h1>Bedankt!</h1><p>We hebben je sollicitatie ontvangen.</p>",
        );
        let config = quick_config();
        let report = FormRunner::new(&page, &config)
            .run("s-1", &request(contact_fields()))
            .await;

        assert_eq!(report.fill.filled_count(), 2);
        assert_eq!(report.fill.result_of(&FieldIntent::City), Some(&FillResult::NotFound));
        assert!(report.submission.navigation_occurred());
        assert_eq!(report.outcome, SubmissionOutcome::Success);
        assert_eq!(report.final_url.as_deref(), Some("https://careers.acme.nl/thanks"));
        assert_eq!(report.captures.len(), 3);
    }

    #[tokio::test]
    async fn test_validation_error_without_navigation() {
        let page = MockPage::new(FORM).error_on_submit(
            r#"<form><input placeholder="Email"><div class="invalid-feedback">Dit veld is verplicht</div></form>"#,
        );
        let config = quick_config();
        let report = FormRunner::new(&page, &config)
            .run("s-2", &request(contact_fields()))
            .await;

        assert_eq!(
            report.outcome,
            SubmissionOutcome::ValidationError(vec!["Dit veld is verplicht".to_string()])
        );
        assert!(!report.submission.navigation_occurred());
    }

    #[tokio::test]
    async fn test_missing_submit_still_returns_full_report() {
        let page = MockPage::new(r#"<form><input placeholder="Email"><input name="phone"></form>"#);
        let config = quick_config();
        let report = FormRunner::new(&page, &config)
            .run("s-3", &request(contact_fields()))
            .await;

        assert_eq!(report.submission, SubmitAttempt::ControlNotFound);
        assert_eq!(report.fill.len(), 3);
        assert_eq!(report.fill.filled_count(), 2);
        assert_eq!(report.outcome, SubmissionOutcome::Uncertain);
    }

    #[tokio::test]
    async fn test_gate_and_dry_run_skip_submission() {
        let page = MockPage::new(FORM);
        let config = quick_config();
        let too_few = FieldMap::new().with(FieldIntent::Email, FieldValue::text("a@b.c"));
        let report = FormRunner::new(&page, &config).run("s-4", &request(too_few)).await;
        assert!(matches!(report.submission, SubmitAttempt::Skipped { .. }));
        assert!(!page.events().iter().any(|e| e.starts_with("click:")));

        let mut dry = quick_config();
        dry.session.dry_run = true;
        let report = FormRunner::new(&page, &dry)
            .run("s-5", &request(contact_fields()))
            .await;
        assert!(matches!(
            report.submission,
            SubmitAttempt::Skipped { ref reason } if reason == "dry run"
        ));
        assert_eq!(report.outcome, SubmissionOutcome::Uncertain);
    }

    #[tokio::test]
    async fn test_embedded_frame_form() {
        let page = MockPage::new("<h1>Rust developer</h1><p>Apply below</p>")
            .with_frame(
                "https://boards.greenhouse.io/embed/job_app?for=acme",
                r#"<form>
                    <input id="email" name="job_application[email]">
                    <input id="phone" name="job_application[phone]">
                    <input type="submit" value="Submit Application">
                </form>"#,
            )
            .navigate_on_submit("https://acme.nl/jobs/thanks", "<p>Thank you for applying</p>");
        let config = quick_config();
        let report = FormRunner::new(&page, &config)
            .run("s-6", &request(contact_fields()))
            .await;

        assert_eq!(report.root, SearchRoot::frame("greenhouse.io"));
        assert_eq!(report.fill.filled_count(), 2);
        assert_eq!(report.outcome, SubmissionOutcome::Success);
    }

    #[tokio::test]
    async fn test_platform_frame_found_without_hints() {
        let page = MockPage::new("<h1>Backend engineer</h1>")
            .with_frame("https://apply.workable.com/acme/j/ABC123/apply", FORM)
            .with_frame("https://www.youtube.com/embed/intro", "<p>video</p>");
        let mut config = quick_config();
        config.session.frame_hints.clear();
        config.session.dry_run = true;
        let report = FormRunner::new(&page, &config)
            .run("s-8", &request(contact_fields()))
            .await;

        assert_eq!(report.root, SearchRoot::frame("workable.com"));
        assert_eq!(report.fill.filled_count(), 2);
    }

    #[tokio::test]
    async fn test_reveals_hidden_form() {
        let page = MockPage::new(
            r#"<a id="apply-now" role="button">Apply now</a>
               <form id="application" style="display:none">
                 <input name="email"><input name="phone"><button>Send</button>
               </form>"#,
        )
        .reveal_on_click("apply-now", "application");
        let mut config = quick_config();
        config.session.dry_run = true;
        let report = FormRunner::new(&page, &config)
            .run("s-7", &request(contact_fields()))
            .await;

        assert!(report.notes.iter().any(|n| n.contains("reveal")));
        assert_eq!(report.fill.filled_count(), 2);
    }

    #[tokio::test]
    async fn test_attachment_added_as_resume_field() {
        let req = request(contact_fields()).with_attachment("/tmp/none.pdf");
        let fields = fields_with_attachment(&req);
        assert_eq!(
            fields.get(&FieldIntent::ResumeFile),
            Some(&FieldValue::file("/tmp/none.pdf"))
        );
    }
}
