use crate::core::SubmitConfig;
use crate::form::intent::FieldIntent;
use crate::form::locator::{CandidateList, CandidateQuery, Locator, TagScope};
use std::collections::HashMap;

const FULL_NAME_EXCLUDE: &[&str] = &[
    "first", "last", "sur", "given", "family", "middle", "voor", "achter", "user", "company",
    "bedrijf", "file",
];
const FIRST_NAME_EXCLUDE: &[&str] = &["last", "sur", "family", "achter", "full"];
const LAST_NAME_EXCLUDE: &[&str] = &["first", "given", "voor", "full"];
const FILE_EXCLUDE: &[&str] = &["cover", "letter", "motivat", "photo", "avatar"];

fn s(value: &str) -> String {
    value.to_string()
}

fn name(v: &str) -> Locator {
    Locator::Name(s(v))
}

fn name_has(v: &str) -> Locator {
    Locator::NameContains(s(v))
}

fn id(v: &str) -> Locator {
    Locator::Id(s(v))
}

fn id_has(v: &str) -> Locator {
    Locator::IdContains(s(v))
}

fn placeholder(v: &str) -> Locator {
    Locator::Placeholder(s(v))
}

fn placeholder_has(v: &str) -> Locator {
    Locator::PlaceholderContains(s(v))
}

fn aria_has(v: &str) -> Locator {
    Locator::AriaLabelContains(s(v))
}

fn label_has(v: &str) -> Locator {
    Locator::LabelContains(s(v))
}

fn class_has(v: &str) -> Locator {
    Locator::ClassContains(s(v))
}

fn input_type(v: &str) -> Locator {
    Locator::InputType(s(v))
}

fn attr_has(attr: &str, value: &str) -> Locator {
    Locator::AttrContains {
        attr: s(attr),
        value: s(value),
    }
}

/// Default candidate lists for every known intent.
pub fn default_candidates(intent: &FieldIntent) -> CandidateList {
    use TagScope::*;

    match intent {
        FieldIntent::FullName => CandidateList::scoped(
            TextEntry,
            FULL_NAME_EXCLUDE,
            vec![
                name("name"),
                name("full_name"),
                name("fullname"),
                id("name"),
                id_has("full_name"),
                id_has("fullname"),
                placeholder("name"),
                placeholder("your name"),
                placeholder("naam"),
                placeholder_has("full name"),
                placeholder_has("volledige naam"),
                label_has("full name"),
                aria_has("full name"),
                placeholder_has("name"),
                placeholder_has("naam"),
                label_has("name"),
                label_has("naam"),
            ],
        ),
        FieldIntent::FirstName => CandidateList::scoped(
            TextEntry,
            FIRST_NAME_EXCLUDE,
            vec![
                name("first_name"),
                name("firstname"),
                id("first_name"),
                name_has("first"),
                id_has("first"),
                placeholder_has("first name"),
                placeholder_has("voornaam"),
                label_has("first name"),
                label_has("voornaam"),
                aria_has("first name"),
                placeholder_has("given name"),
                label_has("given name"),
            ],
        ),
        FieldIntent::LastName => CandidateList::scoped(
            TextEntry,
            LAST_NAME_EXCLUDE,
            vec![
                name("last_name"),
                name("lastname"),
                id("last_name"),
                name_has("last"),
                id_has("last"),
                name_has("surname"),
                placeholder_has("last name"),
                placeholder_has("surname"),
                placeholder_has("achternaam"),
                label_has("last name"),
                label_has("surname"),
                label_has("achternaam"),
                aria_has("last name"),
                name_has("family"),
                label_has("family name"),
            ],
        ),
        FieldIntent::Email => CandidateList::scoped(
            TextEntry,
            &[],
            vec![
                name("email"),
                id("email"),
                name_has("email"),
                id_has("email"),
                input_type("email"),
                placeholder_has("email"),
                aria_has("email"),
                label_has("email"),
                placeholder_has("e-mail"),
                label_has("e-mail"),
                placeholder_has("mail"),
            ],
        ),
        FieldIntent::Phone => CandidateList::scoped(
            TextEntry,
            &[],
            vec![
                name("phone"),
                id("phone"),
                name_has("phone"),
                id_has("phone"),
                input_type("tel"),
                name_has("tel"),
                placeholder_has("phone"),
                placeholder_has("telefoon"),
                label_has("phone"),
                label_has("telefoon"),
                name_has("mobile"),
                placeholder_has("mobile"),
                placeholder_has("mobiel"),
            ],
        ),
        FieldIntent::City => CandidateList::scoped(
            TextEntry,
            &[],
            vec![
                name("city"),
                name_has("city"),
                id_has("city"),
                placeholder_has("city"),
                placeholder_has("woonplaats"),
                label_has("city"),
                label_has("woonplaats"),
                name_has("location"),
                placeholder_has("location"),
                label_has("location"),
                placeholder_has("plaats"),
            ],
        ),
        FieldIntent::Country => CandidateList::scoped(
            Control,
            &[],
            vec![
                name("country"),
                name_has("country"),
                id_has("country"),
                placeholder_has("country"),
                placeholder("land"),
                label_has("country"),
                aria_has("country"),
            ],
        ),
        FieldIntent::Postcode => CandidateList::scoped(
            TextEntry,
            &[],
            vec![
                name("postcode"),
                name_has("postcode"),
                name_has("postal"),
                name_has("zip"),
                id_has("postcode"),
                placeholder_has("postcode"),
                placeholder_has("postal"),
                placeholder_has("zip"),
                label_has("postcode"),
                label_has("postal code"),
                label_has("zip"),
            ],
        ),
        FieldIntent::LinkedIn => CandidateList::scoped(
            TextEntry,
            &[],
            vec![
                name_has("linkedin"),
                id_has("linkedin"),
                placeholder_has("linkedin"),
                label_has("linkedin"),
                aria_has("linkedin"),
            ],
        ),
        FieldIntent::Github => CandidateList::scoped(
            TextEntry,
            &[],
            vec![
                name_has("github"),
                id_has("github"),
                placeholder_has("github"),
                label_has("github"),
            ],
        ),
        FieldIntent::Website => CandidateList::scoped(
            TextEntry,
            &["linkedin", "github"],
            vec![
                name("website"),
                name_has("website"),
                name_has("portfolio"),
                id_has("website"),
                input_type("url"),
                placeholder_has("website"),
                placeholder_has("portfolio"),
                label_has("website"),
                label_has("portfolio"),
            ],
        ),
        FieldIntent::CoverLetter => CandidateList::scoped(
            TextArea,
            &[],
            vec![
                name_has("cover"),
                name_has("motivat"),
                id_has("cover"),
                id_has("motivat"),
                placeholder_has("cover"),
                placeholder_has("motivat"),
                label_has("cover letter"),
                label_has("motivat"),
                name_has("message"),
                placeholder_has("message"),
                Locator::AnyInScope,
            ],
        ),
        FieldIntent::Salary => CandidateList::scoped(
            TextEntry,
            &[],
            vec![
                name_has("salary"),
                id_has("salary"),
                name_has("salaris"),
                placeholder_has("salary"),
                placeholder_has("salaris"),
                label_has("salary"),
                label_has("salaris"),
                name_has("compensation"),
                label_has("compensation"),
            ],
        ),
        FieldIntent::Languages => CandidateList::scoped(
            Select,
            &[],
            vec![
                name_has("language"),
                id_has("language"),
                name_has("talen"),
                label_has("language"),
                label_has("talen"),
                attr_has("data-placeholder", "language"),
                attr_has("data-placeholder", "taal"),
                attr_has("data-placeholder", "talen"),
                aria_has("language"),
            ],
        ),
        FieldIntent::AvailabilityDate => CandidateList::scoped(
            TextEntry,
            &[],
            vec![
                name_has("availab"),
                name_has("start_date"),
                name_has("startdate"),
                id_has("availab"),
                class_has("flatpickr-input"),
                class_has("datepicker"),
                placeholder_has("availab"),
                placeholder_has("start date"),
                placeholder_has("beschikbaar"),
                label_has("availab"),
                label_has("start date"),
                label_has("beschikbaar"),
                input_type("date"),
            ],
        ),
        FieldIntent::ResumeFile => CandidateList::scoped(
            File,
            FILE_EXCLUDE,
            vec![
                name_has("resume"),
                name_has("cv"),
                id_has("resume"),
                id_has("cv"),
                label_has("resume"),
                label_has("cv"),
                attr_has("accept", "pdf"),
                Locator::AnyInScope,
            ],
        ),
        FieldIntent::Consents => CandidateList::scoped(
            Checkbox,
            &[],
            vec![
                name_has("consent"),
                name_has("gdpr"),
                name_has("privacy"),
                name_has("terms"),
                name_has("akkoord"),
                label_has("privacy"),
                label_has("consent"),
                label_has("terms"),
                label_has("agree"),
                label_has("akkoord"),
                Locator::AnyInScope,
            ],
        ),
        FieldIntent::Custom(key) => custom_candidates(key),
    }
}

/// Candidates for a site-specific key: exact attributes first, then substring matches.
fn custom_candidates(key: &str) -> CandidateList {
    let mut list = CandidateList::scoped(
        TagScope::Control,
        &[],
        vec![
            name(key),
            id(key),
            placeholder(key),
            placeholder_has(key),
            label_has(key),
            aria_has(key),
            name_has(key),
        ],
    );
    list.push(CandidateQuery::new(name(key), TagScope::Checkbox));
    list.push(CandidateQuery::new(label_has(key), TagScope::Checkbox));
    list
}

/// Ordered submit controls: submit-typed controls, then buttons carrying an affirmative verb.
pub fn submit_candidates(config: &SubmitConfig) -> CandidateList {
    let exclude: Vec<&str> = config.exclude_tokens.iter().map(|t| t.as_str()).collect();
    let mut locators = vec![input_type("submit")];
    locators.extend(config.verbs.iter().map(|verb| Locator::TextContains(verb.clone())));
    CandidateList::scoped(TagScope::Button, &exclude, locators)
}

/// Controls that reveal a hidden application form ("Apply now").
pub fn reveal_candidates(config: &SubmitConfig) -> CandidateList {
    let exclude: Vec<&str> = config.exclude_tokens.iter().map(|t| t.as_str()).collect();
    CandidateList::scoped(
        TagScope::Button,
        &exclude,
        config
            .reveal_verbs
            .iter()
            .map(|verb| Locator::TextContains(verb.clone()))
            .collect(),
    )
}

/// Per-intent candidate lists with caller overrides on top of the defaults.
#[derive(Debug, Clone, Default)]
pub struct CandidateCatalog {
    overrides: HashMap<FieldIntent, CandidateList>,
}

impl CandidateCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the list for one intent.
    pub fn register(&mut self, intent: FieldIntent, candidates: CandidateList) {
        self.overrides.insert(intent, candidates);
    }

    /// Put a query ahead of the intent's current list.
    pub fn prepend(&mut self, intent: FieldIntent, query: CandidateQuery) {
        let current = self.candidates_for(&intent);
        let mut queries = vec![query];
        queries.extend(current.iter().cloned());
        self.overrides.insert(intent, CandidateList::new(queries));
    }

    pub fn candidates_for(&self, intent: &FieldIntent) -> CandidateList {
        self.overrides
            .get(intent)
            .cloned()
            .unwrap_or_else(|| default_candidates(intent))
    }
}
