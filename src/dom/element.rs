use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Opaque reference to one live DOM element, valid for a single fill attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementHandle(pub String);

impl ElementHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Snapshot of the facts the engine needs about one element.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ElementProfile {
    pub tag_name: String,
    pub input_type: Option<String>,
    pub name: Option<String>,
    pub element_id: Option<String>,
    pub placeholder: Option<String>,
    pub aria_label: Option<String>,
    /// Text of the associated `<label>`, either `for=` or wrapping.
    pub label: Option<String>,
    pub class_name: Option<String>,
    pub text_content: Option<String>,
    pub attributes: HashMap<String, String>,
    pub value: String,
    pub is_visible: bool,
    pub is_disabled: bool,
    pub is_readonly: bool,
    pub is_multiple: bool,
    pub is_checked: bool,
    /// A JS multi-select overlay (select2) renders this select.
    pub is_enhanced_select: bool,
    /// A calendar widget (flatpickr, jQuery UI) owns this input.
    pub has_date_widget: bool,
    pub file_count: usize,
    /// Inside a `<form>` or bound to one through `form=`.
    pub has_form_owner: bool,
}

impl ElementProfile {
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into().to_lowercase(),
            is_visible: true,
            ..Default::default()
        }
    }

    pub fn with_attribute(mut self, key: &str, value: &str) -> Self {
        let key = key.to_lowercase();
        match key.as_str() {
            "type" => self.input_type = Some(value.to_lowercase()),
            "name" => self.name = Some(value.to_string()),
            "id" => self.element_id = Some(value.to_string()),
            "placeholder" => self.placeholder = Some(value.to_string()),
            "aria-label" => self.aria_label = Some(value.to_string()),
            "class" => self.class_name = Some(value.to_string()),
            "disabled" => self.is_disabled = true,
            "readonly" => self.is_readonly = true,
            "multiple" => self.is_multiple = true,
            _ => {}
        }
        self.attributes.insert(key, value.to_string());
        self
    }

    pub fn with_form_owner(mut self) -> Self {
        self.has_form_owner = true;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_text_content(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        if !text.trim().is_empty() {
            self.text_content = Some(text.trim().to_string());
        }
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(|v| v.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.class_name
            .as_deref()
            .map(|classes| classes.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    /// Effective input type; `<input>` without a type is a text box.
    pub fn effective_type(&self) -> &str {
        match (self.tag_name.as_str(), self.input_type.as_deref()) {
            ("input", Some(t)) => t,
            ("input", None) => "text",
            ("button", Some(t)) => t,
            // An untyped button only submits when a form owns it.
            ("button", None) if self.has_form_owner => "submit",
            ("button", None) => "button",
            _ => "",
        }
    }

    pub fn is_interactable(&self) -> bool {
        self.is_visible && !self.is_disabled
    }

    /// Lower-cased concatenation of every attribute a human would read to identify the field.
    pub fn identity_text(&self) -> String {
        [
            self.name.as_deref(),
            self.element_id.as_deref(),
            self.placeholder.as_deref(),
            self.aria_label.as_deref(),
            self.label.as_deref(),
        ]
        .iter()
        .flatten()
        .map(|s| s.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
    }

    /// What a user sees on a button-like control.
    pub fn visible_text(&self) -> String {
        let text = self
            .text_content
            .clone()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| {
                if self.tag_name == "input" {
                    self.attribute("value").map(|v| v.to_string())
                } else {
                    None
                }
            })
            .or_else(|| self.aria_label.clone())
            .unwrap_or_default();
        text.trim().to_string()
    }

    pub fn describe(&self) -> String {
        let mut parts = vec![format!("<{}", self.tag_name)];
        if let Some(t) = &self.input_type {
            parts.push(format!("type={}", t));
        }
        if let Some(n) = &self.name {
            parts.push(format!("name={}", n));
        }
        if let Some(id) = &self.element_id {
            parts.push(format!("id={}", id));
        }
        if let Some(p) = &self.placeholder {
            parts.push(format!("placeholder={:?}", p));
        }
        format!("{}>", parts.join(" "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionInfo {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl OptionInfo {
    /// Requested entries match either the option value or its trimmed label, case-insensitive.
    pub fn matches(&self, wanted: &str) -> bool {
        let wanted = wanted.trim();
        self.value == wanted || self.label.trim().eq_ignore_ascii_case(wanted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_text_collects_naming_attributes() {
        let profile = ElementProfile::new("INPUT")
            .with_attribute("name", "First_Name")
            .with_attribute("placeholder", "Voornaam")
            .with_label("Given name");
        assert_eq!(profile.tag_name, "input");
        let identity = profile.identity_text();
        assert!(identity.contains("first_name"));
        assert!(identity.contains("voornaam"));
        assert!(identity.contains("given name"));
    }

    #[test]
    fn test_effective_type_defaults() {
        assert_eq!(ElementProfile::new("input").effective_type(), "text");
        assert_eq!(ElementProfile::new("button").effective_type(), "button");
        assert_eq!(
            ElementProfile::new("button").with_form_owner().effective_type(),
            "submit"
        );
        assert_eq!(
            ElementProfile::new("input")
                .with_attribute("type", "EMAIL")
                .effective_type(),
            "email"
        );
    }

    #[test]
    fn test_visible_text_falls_back_to_value() {
        let input = ElementProfile::new("input")
            .with_attribute("type", "submit")
            .with_attribute("value", " Send application ");
        assert_eq!(input.visible_text(), "Send application");

        let button = ElementProfile::new("button").with_text_content("  Apply  ");
        assert_eq!(button.visible_text(), "Apply");
    }

    #[test]
    fn test_option_matches_value_or_label() {
        let option = OptionInfo {
            value: "39".into(),
            label: " Dutch ".into(),
            selected: false,
        };
        assert!(option.matches("39"));
        assert!(option.matches("dutch"));
        assert!(!option.matches("English"));
    }
}
