//! Prioritized candidate search data.
//!
//! A [`CandidateList`] is an ordered list of [`CandidateQuery`] values; earlier entries are more
//! specific and always outrank later, broader ones. Queries are plain data so the ordering can be
//! tested without a page, and so every [`PageDriver`](crate::core::PageDriver) backend evaluates
//! the same matching rules.

use crate::dom::ElementProfile;
use serde::{Deserialize, Serialize};

/// How a single query identifies an element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", content = "value", rename_all = "snake_case")]
pub enum Locator {
    /// `name` attribute, exact (case-insensitive).
    Name(String),
    NameContains(String),
    Id(String),
    IdContains(String),
    /// `placeholder` attribute, exact (case-insensitive, trimmed).
    Placeholder(String),
    PlaceholderContains(String),
    AriaLabelContains(String),
    /// Effective input `type`.
    InputType(String),
    /// Text of the associated `<label>`.
    LabelContains(String),
    ClassContains(String),
    AttrContains { attr: String, value: String },
    /// Visible text of a button-like control.
    TextContains(String),
    /// First element of the query's [`TagScope`].
    AnyInScope,
    /// Raw CSS, evaluated by the backend.
    Css(String),
}

impl Locator {
    pub fn name(&self) -> &'static str {
        match self {
            Locator::Name(_) => "name",
            Locator::NameContains(_) => "name~",
            Locator::Id(_) => "id",
            Locator::IdContains(_) => "id~",
            Locator::Placeholder(_) => "placeholder",
            Locator::PlaceholderContains(_) => "placeholder~",
            Locator::AriaLabelContains(_) => "aria-label~",
            Locator::InputType(_) => "type",
            Locator::LabelContains(_) => "label~",
            Locator::ClassContains(_) => "class~",
            Locator::AttrContains { .. } => "attr~",
            Locator::TextContains(_) => "text~",
            Locator::AnyInScope => "any",
            Locator::Css(_) => "css",
        }
    }

    /// Whether the element satisfies this locator. `Css` is backend-evaluated and never
    /// matches here.
    pub fn matches(&self, element: &ElementProfile) -> bool {
        match self {
            Locator::Name(v) => eq_ci(element.name.as_deref(), v),
            Locator::NameContains(v) => contains_ci(element.name.as_deref(), v),
            Locator::Id(v) => eq_ci(element.element_id.as_deref(), v),
            Locator::IdContains(v) => contains_ci(element.element_id.as_deref(), v),
            Locator::Placeholder(v) => eq_ci(element.placeholder.as_deref(), v),
            Locator::PlaceholderContains(v) => contains_ci(element.placeholder.as_deref(), v),
            Locator::AriaLabelContains(v) => contains_ci(element.aria_label.as_deref(), v),
            Locator::InputType(v) => element.effective_type().eq_ignore_ascii_case(v),
            Locator::LabelContains(v) => contains_ci(element.label.as_deref(), v),
            Locator::ClassContains(v) => contains_ci(element.class_name.as_deref(), v),
            Locator::AttrContains { attr, value } => {
                contains_ci(element.attribute(&attr.to_lowercase()), value)
            }
            Locator::TextContains(v) => contains_ci(Some(&element.visible_text()), v),
            Locator::AnyInScope => true,
            Locator::Css(_) => false,
        }
    }
}

fn eq_ci(actual: Option<&str>, wanted: &str) -> bool {
    actual
        .map(|a| a.trim().eq_ignore_ascii_case(wanted.trim()))
        .unwrap_or(false)
}

fn contains_ci(actual: Option<&str>, wanted: &str) -> bool {
    actual
        .map(|a| a.to_lowercase().contains(&wanted.to_lowercase()))
        .unwrap_or(false)
}

/// Which element families a query may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagScope {
    /// Text-like `<input>` and `<textarea>`.
    TextEntry,
    TextArea,
    Select,
    /// Text entry or `<select>`.
    Control,
    File,
    Checkbox,
    /// `<button>`, submit/button inputs, links and `role=button`.
    Button,
}

const NON_TEXT_INPUTS: &[&str] = &[
    "hidden", "submit", "button", "reset", "image", "file", "checkbox", "radio",
];

impl TagScope {
    pub fn admits(&self, element: &ElementProfile) -> bool {
        let tag = element.tag_name.as_str();
        let input_type = element.effective_type();
        let text_entry =
            (tag == "input" && !NON_TEXT_INPUTS.contains(&input_type)) || tag == "textarea";

        match self {
            TagScope::TextEntry => text_entry,
            TagScope::TextArea => tag == "textarea",
            TagScope::Select => tag == "select",
            TagScope::Control => text_entry || tag == "select",
            TagScope::File => tag == "input" && input_type == "file",
            TagScope::Checkbox => tag == "input" && input_type == "checkbox",
            TagScope::Button => {
                tag == "button"
                    || (tag == "input" && matches!(input_type, "submit" | "button" | "image"))
                    || tag == "a"
                    || element.attribute("role") == Some("button")
            }
        }
    }

    /// CSS pre-filter handed to DOM backends before [`TagScope::admits`] runs.
    pub fn css(&self) -> &'static str {
        match self {
            TagScope::TextEntry => "input, textarea",
            TagScope::TextArea => "textarea",
            TagScope::Select => "select",
            TagScope::Control => "input, textarea, select",
            TagScope::File => "input[type=file]",
            TagScope::Checkbox => "input[type=checkbox]",
            TagScope::Button => "button, input, a, [role=button]",
        }
    }
}

/// One prioritized query: locator, admissible tags, and negative tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateQuery {
    pub locator: Locator,
    pub scope: TagScope,
    /// Reject elements whose identity text (or visible text, for buttons) contains any token.
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl CandidateQuery {
    pub fn new(locator: Locator, scope: TagScope) -> Self {
        Self {
            locator,
            scope,
            exclude: Vec::new(),
        }
    }

    pub fn excluding(mut self, tokens: &[&str]) -> Self {
        self.exclude = tokens.iter().map(|t| t.to_lowercase()).collect();
        self
    }

    /// Scope, locator and negative filter together. `Css` locators only pass scope and filter.
    pub fn accepts(&self, element: &ElementProfile) -> bool {
        self.scope.admits(element)
            && (matches!(self.locator, Locator::Css(_)) || self.locator.matches(element))
            && !self.is_excluded(element)
    }

    pub fn is_excluded(&self, element: &ElementProfile) -> bool {
        if self.exclude.is_empty() {
            return false;
        }
        let mut haystack = element.identity_text();
        if self.scope == TagScope::Button {
            haystack.push(' ');
            haystack.push_str(&element.visible_text().to_lowercase());
        }
        self.exclude.iter().any(|token| haystack.contains(token))
    }

    pub fn describe(&self) -> String {
        let value = match &self.locator {
            Locator::Name(v)
            | Locator::NameContains(v)
            | Locator::Id(v)
            | Locator::IdContains(v)
            | Locator::Placeholder(v)
            | Locator::PlaceholderContains(v)
            | Locator::AriaLabelContains(v)
            | Locator::InputType(v)
            | Locator::LabelContains(v)
            | Locator::ClassContains(v)
            | Locator::TextContains(v)
            | Locator::Css(v) => v.clone(),
            Locator::AttrContains { attr, value } => format!("{}={}", attr, value),
            Locator::AnyInScope => String::new(),
        };
        format!("{}({})", self.locator.name(), value)
    }
}

/// Ordered queries for one intent; index 0 is the most confident.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateList(Vec<CandidateQuery>);

impl CandidateList {
    pub fn new(queries: Vec<CandidateQuery>) -> Self {
        Self(queries)
    }

    /// Build a list sharing one scope and one set of negative tokens.
    pub fn scoped(scope: TagScope, exclude: &[&str], locators: Vec<Locator>) -> Self {
        Self(
            locators
                .into_iter()
                .map(|locator| CandidateQuery::new(locator, scope).excluding(exclude))
                .collect(),
        )
    }

    pub fn push(&mut self, query: CandidateQuery) {
        self.0.push(query);
    }

    pub fn iter(&self) -> impl Iterator<Item = &CandidateQuery> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<&CandidateQuery> {
        self.0.first()
    }

    pub fn last(&self) -> Option<&CandidateQuery> {
        self.0.last()
    }

    /// Position of the first query accepting the element, i.e. its priority rank.
    pub fn rank_of(&self, element: &ElementProfile) -> Option<usize> {
        self.0.iter().position(|query| query.accepts(element))
    }
}

impl<'a> IntoIterator for &'a CandidateList {
    type Item = &'a CandidateQuery;
    type IntoIter = std::slice::Iter<'a, CandidateQuery>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(attrs: &[(&str, &str)]) -> ElementProfile {
        attrs
            .iter()
            .fold(ElementProfile::new("input"), |p, (k, v)| p.with_attribute(k, v))
    }

    #[test]
    fn test_exact_name_is_case_insensitive() {
        let el = input(&[("name", "Email")]);
        assert!(Locator::Name("email".into()).matches(&el));
        assert!(!Locator::Name("mail".into()).matches(&el));
        assert!(Locator::NameContains("mail".into()).matches(&el));
    }

    #[test]
    fn test_scope_filters_non_text_inputs() {
        let hidden = input(&[("type", "hidden"), ("name", "email")]);
        let checkbox = input(&[("type", "checkbox")]);
        let text = input(&[("name", "email")]);
        assert!(!TagScope::TextEntry.admits(&hidden));
        assert!(!TagScope::TextEntry.admits(&checkbox));
        assert!(TagScope::TextEntry.admits(&text));
        assert!(TagScope::Checkbox.admits(&checkbox));
        assert!(TagScope::TextEntry.admits(&ElementProfile::new("textarea")));
        assert!(!TagScope::TextArea.admits(&text));
    }

    #[test]
    fn test_negative_tokens_reject_lookalikes() {
        let query = CandidateQuery::new(
            Locator::PlaceholderContains("name".into()),
            TagScope::TextEntry,
        )
        .excluding(&["first", "last", "sur"]);

        assert!(query.accepts(&input(&[("placeholder", "Your name")])));
        assert!(!query.accepts(&input(&[("placeholder", "First name")])));
        assert!(!query.accepts(&input(&[("placeholder", "Surname")])));
        assert!(!query.accepts(&input(&[("placeholder", "Name"), ("name", "last_name")])));
    }

    #[test]
    fn test_button_scope_and_text() {
        let query = CandidateQuery::new(Locator::TextContains("apply".into()), TagScope::Button)
            .excluding(&["search"]);
        let button = ElementProfile::new("button").with_text_content("Apply now");
        let search = ElementProfile::new("button")
            .with_text_content("Apply filters")
            .with_attribute("aria-label", "Search jobs");
        assert!(query.accepts(&button));
        assert!(!query.accepts(&search));
    }

    #[test]
    fn test_rank_prefers_earlier_queries() {
        let list = CandidateList::scoped(
            TagScope::TextEntry,
            &[],
            vec![
                Locator::Name("email".into()),
                Locator::PlaceholderContains("mail".into()),
            ],
        );
        let exact = input(&[("name", "email")]);
        let fuzzy = input(&[("placeholder", "E-mail address")]);
        assert_eq!(list.rank_of(&exact), Some(0));
        assert_eq!(list.rank_of(&fuzzy), Some(1));
        assert_eq!(list.rank_of(&input(&[("name", "phone")])), None);
    }

    #[test]
    fn test_query_serializes_for_script_backends() {
        let query = CandidateQuery::new(
            Locator::AttrContains {
                attr: "data-placeholder".into(),
                value: "language".into(),
            },
            TagScope::Select,
        );
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["locator"]["by"], "attr_contains");
        assert_eq!(json["locator"]["value"]["attr"], "data-placeholder");
        assert_eq!(json["scope"], "select");

        let any = serde_json::to_value(CandidateQuery::new(Locator::AnyInScope, TagScope::File))
            .unwrap();
        assert_eq!(any["locator"]["by"], "any_in_scope");
    }
}
