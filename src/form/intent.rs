use chrono::NaiveDate;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};

/// Semantic identity of one form field, independent of any site's markup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldIntent {
    FullName,
    FirstName,
    LastName,
    Email,
    Phone,
    City,
    Country,
    Postcode,
    LinkedIn,
    Github,
    Website,
    CoverLetter,
    Salary,
    Languages,
    AvailabilityDate,
    ResumeFile,
    Consents,
    /// Site-specific question, keyed by the text a site uses for it.
    Custom(String),
}

impl FieldIntent {
    pub const KNOWN: &'static [FieldIntent] = &[
        FieldIntent::FullName,
        FieldIntent::FirstName,
        FieldIntent::LastName,
        FieldIntent::Email,
        FieldIntent::Phone,
        FieldIntent::City,
        FieldIntent::Country,
        FieldIntent::Postcode,
        FieldIntent::LinkedIn,
        FieldIntent::Github,
        FieldIntent::Website,
        FieldIntent::CoverLetter,
        FieldIntent::Salary,
        FieldIntent::Languages,
        FieldIntent::AvailabilityDate,
        FieldIntent::ResumeFile,
        FieldIntent::Consents,
    ];

    pub fn key(&self) -> &str {
        match self {
            FieldIntent::FullName => "fullName",
            FieldIntent::FirstName => "firstName",
            FieldIntent::LastName => "lastName",
            FieldIntent::Email => "email",
            FieldIntent::Phone => "phone",
            FieldIntent::City => "city",
            FieldIntent::Country => "country",
            FieldIntent::Postcode => "postcode",
            FieldIntent::LinkedIn => "linkedin",
            FieldIntent::Github => "github",
            FieldIntent::Website => "website",
            FieldIntent::CoverLetter => "coverLetter",
            FieldIntent::Salary => "salary",
            FieldIntent::Languages => "languages",
            FieldIntent::AvailabilityDate => "availabilityDate",
            FieldIntent::ResumeFile => "resumeFile",
            FieldIntent::Consents => "consents",
            FieldIntent::Custom(key) => key,
        }
    }

    /// Fields whose typing opens an autocomplete list that must be dismissed.
    pub fn dismisses_autocomplete(&self) -> bool {
        matches!(self, FieldIntent::City | FieldIntent::Country)
    }
}

impl From<String> for FieldIntent {
    fn from(key: String) -> Self {
        FieldIntent::KNOWN
            .iter()
            .find(|intent| intent.key().eq_ignore_ascii_case(key.trim()))
            .cloned()
            .unwrap_or(FieldIntent::Custom(key))
    }
}

impl From<&str> for FieldIntent {
    fn from(key: &str) -> Self {
        FieldIntent::from(key.to_string())
    }
}

impl From<FieldIntent> for String {
    fn from(intent: FieldIntent) -> Self {
        intent.key().to_string()
    }
}

impl fmt::Display for FieldIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Value supplied for one intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Check(bool),
    Text(String),
    Choices(Vec<String>),
    Date { date: NaiveDate },
    File { file: PathBuf },
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn choices<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        FieldValue::Choices(values.into_iter().map(Into::into).collect())
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        FieldValue::File { file: path.into() }
    }

    /// Text form used by inputs; dates use `date_format`.
    pub fn as_text(&self, date_format: &str) -> Option<String> {
        match self {
            FieldValue::Text(text) => Some(text.clone()),
            FieldValue::Date { date } => Some(date.format(date_format).to_string()),
            FieldValue::Choices(items) if items.len() == 1 => Some(items[0].clone()),
            _ => None,
        }
    }

    /// Requested entries for select-like widgets.
    pub fn as_choices(&self) -> Vec<String> {
        match self {
            FieldValue::Choices(items) => items.clone(),
            FieldValue::Text(text) => vec![text.clone()],
            _ => Vec::new(),
        }
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            FieldValue::File { file } => Some(file),
            _ => None,
        }
    }

    /// Sort key for filling: text-like first, files next, checkboxes last.
    pub fn fill_phase(&self) -> u8 {
        match self {
            FieldValue::File { .. } => 1,
            FieldValue::Check(_) => 2,
            _ => 0,
        }
    }
}

/// Ordered intent to value map. Inserting an existing intent replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    entries: Vec<(FieldIntent, FieldValue)>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, intent: impl Into<FieldIntent>, value: FieldValue) {
        let intent = intent.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == intent) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((intent, value)),
        }
    }

    pub fn with(mut self, intent: impl Into<FieldIntent>, value: FieldValue) -> Self {
        self.insert(intent, value);
        self
    }

    pub fn get(&self, intent: &FieldIntent) -> Option<&FieldValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == intent)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldIntent, &FieldValue)> {
        self.entries.iter().map(|(intent, value)| (intent, value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for FieldMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (intent, value) in &self.entries {
            map.serialize_entry(intent.key(), value)?;
        }
        map.end()
    }
}

struct FieldMapVisitor;

impl<'de> Visitor<'de> for FieldMapVisitor {
    type Value = FieldMap;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an object of field intents to values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<FieldMap, A::Error> {
        let mut map = FieldMap::new();
        while let Some((key, value)) = access.next_entry::<String, FieldValue>()? {
            map.insert(key, value);
        }
        Ok(map)
    }
}

impl<'de> Deserialize<'de> for FieldMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(FieldMapVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_keys_round_trip_and_custom() {
        assert_eq!(FieldIntent::from("email"), FieldIntent::Email);
        assert_eq!(FieldIntent::from("availabilityDate"), FieldIntent::AvailabilityDate);
        assert_eq!(
            FieldIntent::from("Hoe heb je ons gevonden?"),
            FieldIntent::Custom("Hoe heb je ons gevonden?".into())
        );
        for intent in FieldIntent::KNOWN {
            assert_eq!(&FieldIntent::from(intent.key()), intent);
        }
    }

    #[test]
    fn test_field_map_json_keeps_order_and_value_shapes() {
        let json = r#"{
            "email": "user@example.com",
            "languages": ["39", "40"],
            "availabilityDate": { "date": "2025-01-15" },
            "resumeFile": { "file": "/tmp/cv.pdf" },
            "consents": true
        }"#;
        let map: FieldMap = serde_json::from_str(json).unwrap();
        let intents: Vec<_> = map.iter().map(|(i, _)| i.clone()).collect();
        assert_eq!(
            intents,
            vec![
                FieldIntent::Email,
                FieldIntent::Languages,
                FieldIntent::AvailabilityDate,
                FieldIntent::ResumeFile,
                FieldIntent::Consents,
            ]
        );
        assert_eq!(
            map.get(&FieldIntent::Languages),
            Some(&FieldValue::choices(["39", "40"]))
        );
        assert_eq!(
            map.get(&FieldIntent::AvailabilityDate)
                .and_then(|v| v.as_text("%d-%m-%Y")),
            Some("15-01-2025".to_string())
        );
        assert_eq!(map.get(&FieldIntent::Consents), Some(&FieldValue::Check(true)));
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut map = FieldMap::new()
            .with(FieldIntent::Email, FieldValue::text("a@b.c"))
            .with(FieldIntent::Phone, FieldValue::text("0612345678"));
        map.insert("email", FieldValue::text("x@y.z"));
        assert_eq!(map.len(), 2);
        assert_eq!(map.iter().next().map(|(i, _)| i), Some(&FieldIntent::Email));
        assert_eq!(map.get(&FieldIntent::Email), Some(&FieldValue::text("x@y.z")));
    }

    #[test]
    fn test_fill_phase_orders_files_after_text() {
        assert!(FieldValue::text("a").fill_phase() < FieldValue::file("/cv.pdf").fill_phase());
        assert!(FieldValue::file("/cv.pdf").fill_phase() < FieldValue::Check(true).fill_phase());
    }
}
