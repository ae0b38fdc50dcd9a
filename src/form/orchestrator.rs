use crate::core::{PageDriver, SearchRoot, SessionConfig};
use crate::dom::ElementHandle;
use crate::form::catalog::CandidateCatalog;
use crate::form::intent::{FieldIntent, FieldMap, FieldValue};
use crate::form::report::{FieldFill, FillReport, FillResult};
use crate::form::resolver::{FieldResolver, Unresolved};
use crate::widgets::{AdapterContext, AdapterRegistry};
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Resolves and fills every field of a [`FieldMap`], one at a time.
pub struct FillOrchestrator<'a> {
    page: &'a dyn PageDriver,
    catalog: &'a CandidateCatalog,
    registry: &'a AdapterRegistry,
    config: &'a SessionConfig,
}

impl<'a> FillOrchestrator<'a> {
    pub fn new(
        page: &'a dyn PageDriver,
        catalog: &'a CandidateCatalog,
        registry: &'a AdapterRegistry,
        config: &'a SessionConfig,
    ) -> Self {
        Self {
            page,
            catalog,
            registry,
            config,
        }
    }

    /// Fill all fields. Text-like values go first, files after them, checkboxes last. No field
    /// failure stops the run; the report has one entry per requested intent.
    pub async fn fill(&self, fields: &FieldMap, root: &SearchRoot) -> FillReport {
        let missing_files = missing_attachments(fields).await;

        let mut ordered: Vec<(usize, &FieldIntent, &FieldValue)> = fields
            .iter()
            .enumerate()
            .map(|(i, (intent, value))| (i, intent, value))
            .collect();
        ordered.sort_by_key(|(i, _, value)| (value.fill_phase(), *i));

        let resolver = FieldResolver::new(self.page, self.catalog);
        let mut claimed: HashSet<ElementHandle> = HashSet::new();
        let mut entries: Vec<(usize, FieldFill)> = Vec::with_capacity(fields.len());

        for (index, intent, value) in ordered {
            let started = Instant::now();

            if missing_files.contains(intent) {
                entries.push((
                    index,
                    FieldFill::unresolved(
                        intent.clone(),
                        FillResult::AdapterError("attachment does not exist".to_string()),
                        0,
                    ),
                ));
                continue;
            }

            let resolved = match resolver.resolve(intent, root, &claimed).await {
                Ok(resolved) => resolved,
                Err(reason) => {
                    let result = match reason {
                        Unresolved::NotFound => FillResult::NotFound,
                        Unresolved::NotVisible => FillResult::NotVisible,
                    };
                    debug!("{}: {:?}", intent, result);
                    entries.push((
                        index,
                        FieldFill::unresolved(intent.clone(), result, elapsed(started)),
                    ));
                    continue;
                }
            };
            claimed.insert(resolved.handle.clone());

            let context = AdapterContext::new(root.clone())
                .with_settle(self.config.widget_settle_ms, self.config.upload_settle_ms)
                .with_date_format(self.config.date_format.clone())
                .dismissing_autocomplete(intent.dismisses_autocomplete());

            let applied = self
                .registry
                .apply(self.page, &resolved, value, &context)
                .await;

            match &applied.result {
                FillResult::Filled => info!("filled {} ({:?})", intent, resolved.kind),
                other => warn!("{} not filled: {:?}", intent, other),
            }

            entries.push((
                index,
                FieldFill {
                    intent: intent.clone(),
                    kind: Some(resolved.kind),
                    matched_by: Some(resolved.matched_by),
                    strategy: applied.outcome.as_ref().map(|o| o.strategy.clone()),
                    result: applied.result,
                    snapshot: applied.outcome.and_then(|o| o.snapshot),
                    elapsed_ms: elapsed(started),
                },
            ));
        }

        entries.sort_by_key(|(i, _)| *i);
        let mut report = FillReport::new();
        for (_, fill) in entries {
            report.push(fill);
        }
        info!("fill finished: {}", report.summary());
        report
    }
}

/// Attachments are checked once, up front; adapters trust the path.
async fn missing_attachments(fields: &FieldMap) -> HashSet<FieldIntent> {
    let mut missing = HashSet::new();
    for (intent, value) in fields.iter() {
        if let Some(path) = value.as_path() {
            match tokio::fs::metadata(path).await {
                Ok(meta) if meta.is_file() => {}
                _ => {
                    warn!("{}: attachment {} not found", intent, path.display());
                    missing.insert(intent.clone());
                }
            }
        }
    }
    missing
}

fn elapsed(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
