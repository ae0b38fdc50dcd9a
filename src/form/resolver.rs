use crate::core::{PageDriver, SearchRoot};
use crate::dom::{ElementHandle, ElementProfile};
use crate::form::catalog::CandidateCatalog;
use crate::form::intent::FieldIntent;
use crate::form::locator::{CandidateList, CandidateQuery, TagScope};
use crate::widgets::WidgetKind;
use std::collections::HashSet;
use tracing::{debug, warn};

/// An intent bound to one live element. Only valid until the page changes.
#[derive(Debug, Clone)]
pub struct ResolvedField {
    pub intent: FieldIntent,
    pub handle: ElementHandle,
    pub profile: ElementProfile,
    pub kind: WidgetKind,
    /// Index of the winning query in the candidate list.
    pub rank: usize,
    pub matched_by: String,
}

/// Why resolution produced no element. Both are normal outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unresolved {
    NotFound,
    /// Something matched, but nothing usable was visible and enabled.
    NotVisible,
}

/// A matched element together with the query that found it.
#[derive(Debug, Clone)]
pub struct Match {
    pub handle: ElementHandle,
    pub profile: ElementProfile,
    pub rank: usize,
    pub query: CandidateQuery,
}

/// Read-only probe over a candidate list.
pub struct FieldResolver<'a> {
    page: &'a dyn PageDriver,
    catalog: &'a CandidateCatalog,
}

impl<'a> FieldResolver<'a> {
    pub fn new(page: &'a dyn PageDriver, catalog: &'a CandidateCatalog) -> Self {
        Self { page, catalog }
    }

    /// Resolve an intent, skipping elements already bound to another intent.
    pub async fn resolve(
        &self,
        intent: &FieldIntent,
        root: &SearchRoot,
        claimed: &HashSet<ElementHandle>,
    ) -> std::result::Result<ResolvedField, Unresolved> {
        let candidates = self.catalog.candidates_for(intent);
        let found = self.first_usable(&candidates, root, claimed).await?;
        let kind = WidgetKind::infer(&found.profile);

        debug!(
            "{} -> {} via {} (rank {}, {:?})",
            intent,
            found.profile.describe(),
            found.query.describe(),
            found.rank,
            kind
        );

        Ok(ResolvedField {
            intent: intent.clone(),
            handle: found.handle,
            profile: found.profile,
            kind,
            rank: found.rank,
            matched_by: found.query.describe(),
        })
    }

    /// Walk the list in priority order; within a query take the first usable element in document
    /// order. Query faults count as "no match" for that query.
    pub async fn first_usable(
        &self,
        candidates: &CandidateList,
        root: &SearchRoot,
        claimed: &HashSet<ElementHandle>,
    ) -> std::result::Result<Match, Unresolved> {
        let mut saw_hidden = false;

        for (rank, query) in candidates.iter().enumerate() {
            let handles = match self.page.query(root, query).await {
                Ok(handles) => handles,
                Err(e) => {
                    warn!("candidate {} failed in {}: {}", query.describe(), root, e);
                    continue;
                }
            };

            for handle in handles {
                if claimed.contains(&handle) {
                    continue;
                }
                let profile = match self.page.inspect(&handle).await {
                    Ok(profile) => profile,
                    Err(e) => {
                        debug!("skipping {} ({}): {}", handle, query.describe(), e);
                        continue;
                    }
                };
                if is_usable(query, &profile) {
                    return Ok(Match {
                        handle,
                        profile,
                        rank,
                        query: query.clone(),
                    });
                }
                saw_hidden = true;
            }
        }

        if saw_hidden {
            Err(Unresolved::NotVisible)
        } else {
            Err(Unresolved::NotFound)
        }
    }
}

/// Visible and enabled. File inputs are routinely hidden behind a styled button and only need
/// to be enabled.
fn is_usable(query: &CandidateQuery, profile: &ElementProfile) -> bool {
    if query.scope == TagScope::File {
        !profile.is_disabled
    } else {
        profile.is_interactable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::catalog::default_candidates;
    use crate::testing::{MockPage, TestHelper};

    async fn resolve_on(
        html: &str,
        intent: FieldIntent,
    ) -> std::result::Result<ResolvedField, Unresolved> {
        let page = MockPage::new(html);
        let catalog = CandidateCatalog::new();
        FieldResolver::new(&page, &catalog)
            .resolve(&intent, &SearchRoot::Page, &HashSet::new())
            .await
    }

    #[tokio::test]
    async fn test_lowest_priority_candidate_still_resolves() {
        let catalog = CandidateCatalog::new();
        for intent in FieldIntent::KNOWN {
            let list = default_candidates(intent);
            let last = list.last().unwrap();
            let html = TestHelper::fixture_for(last);
            let page = MockPage::new(&html);
            let resolved = FieldResolver::new(&page, &catalog)
                .resolve(intent, &SearchRoot::Page, &HashSet::new())
                .await;
            assert!(resolved.is_ok(), "{} did not resolve on {}", intent, html);
        }
    }

    #[tokio::test]
    async fn test_every_candidate_fixture_resolves() {
        let catalog = CandidateCatalog::new();
        for intent in FieldIntent::KNOWN {
            for query in default_candidates(intent).iter() {
                let html = TestHelper::fixture_for(query);
                let page = MockPage::new(&html);
                let resolved = FieldResolver::new(&page, &catalog)
                    .resolve(intent, &SearchRoot::Page, &HashSet::new())
                    .await;
                assert!(
                    resolved.is_ok(),
                    "{} via {} did not resolve on {}",
                    intent,
                    query.describe(),
                    html
                );
            }
        }
    }

    #[tokio::test]
    async fn test_specific_match_beats_earlier_fuzzy_element() {
        let html = r#"<form>
            <input placeholder="Your mail">
            <input name="email">
        </form>"#;
        let resolved = resolve_on(html, FieldIntent::Email).await.unwrap();
        assert_eq!(resolved.rank, 0);
        assert_eq!(resolved.profile.name.as_deref(), Some("email"));
    }

    #[tokio::test]
    async fn test_hidden_match_falls_through_to_visible_one() {
        let html = r#"<form>
            <input name="email" type="hidden">
            <input name="email" style="display:none">
            <input placeholder="E-mail adres">
        </form>"#;
        let resolved = resolve_on(html, FieldIntent::Email).await.unwrap();
        assert_eq!(resolved.profile.placeholder.as_deref(), Some("E-mail adres"));
    }

    #[tokio::test]
    async fn test_not_visible_and_not_found() {
        let hidden = resolve_on(
            r#"<input name="phone" style="display:none">"#,
            FieldIntent::Phone,
        )
        .await;
        assert_eq!(hidden.unwrap_err(), Unresolved::NotVisible);

        let missing = resolve_on(r#"<input name="email">"#, FieldIntent::Phone).await;
        assert_eq!(missing.unwrap_err(), Unresolved::NotFound);

        let disabled = resolve_on(r#"<input name="phone" disabled>"#, FieldIntent::Phone).await;
        assert_eq!(disabled.unwrap_err(), Unresolved::NotVisible);
    }

    #[tokio::test]
    async fn test_name_intents_bind_distinct_elements() {
        let html = r#"<form>
            <input placeholder="Your name">
            <input placeholder="First name">
            <input placeholder="Surname">
        </form>"#;
        let page = MockPage::new(html);
        let catalog = CandidateCatalog::new();
        let resolver = FieldResolver::new(&page, &catalog);
        let mut claimed = HashSet::new();
        let mut placeholders = Vec::new();

        for intent in [FieldIntent::FullName, FieldIntent::FirstName, FieldIntent::LastName] {
            let resolved = resolver
                .resolve(&intent, &SearchRoot::Page, &claimed)
                .await
                .unwrap();
            claimed.insert(resolved.handle.clone());
            placeholders.push(resolved.profile.placeholder.unwrap());
        }

        assert_eq!(placeholders, vec!["Your name", "First name", "Surname"]);
        assert_eq!(claimed.len(), 3);
    }

    #[tokio::test]
    async fn test_hidden_file_input_is_usable() {
        let html = r#"<label for="cv">Upload CV</label>
            <input type="file" id="cv" name="cv" style="display:none">"#;
        let resolved = resolve_on(html, FieldIntent::ResumeFile).await.unwrap();
        assert_eq!(resolved.kind, WidgetKind::FileInput);
    }

    #[tokio::test]
    async fn test_resolves_inside_frame_root() {
        let page = MockPage::new("<p>Job description</p>").with_frame(
            "boards.greenhouse.io/embed",
            r#"<form><input id="email" name="job_application[email]"></form>"#,
        );
        let catalog = CandidateCatalog::new();
        let resolver = FieldResolver::new(&page, &catalog);

        let top = resolver
            .resolve(&FieldIntent::Email, &SearchRoot::Page, &HashSet::new())
            .await;
        assert!(top.is_err());

        let framed = resolver
            .resolve(
                &FieldIntent::Email,
                &SearchRoot::frame("greenhouse.io"),
                &HashSet::new(),
            )
            .await
            .unwrap();
        assert_eq!(framed.rank, 1);
    }
}
