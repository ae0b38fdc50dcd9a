use crate::core::ClassifierConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Tri-state verdict on a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", content = "messages", rename_all = "snake_case")]
pub enum SubmissionOutcome {
    Success,
    ValidationError(Vec<String>),
    Uncertain,
}

impl SubmissionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionOutcome::Success)
    }

    pub fn label(&self) -> &'static str {
        match self {
            SubmissionOutcome::Success => "success",
            SubmissionOutcome::ValidationError(_) => "validation_error",
            SubmissionOutcome::Uncertain => "uncertain",
        }
    }
}

/// Outcome plus the evidence behind it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub outcome: SubmissionOutcome,
    /// Vocabulary term that decided the verdict.
    pub matched_term: Option<String>,
    pub captcha_suspected: bool,
}

/// Vocabulary-based classifier. Success terms are checked before error terms, so a page
/// carrying both reads as success. Never fails; no signal means `Uncertain`.
#[derive(Debug, Clone)]
pub struct OutcomeClassifier {
    success_terms: Vec<String>,
    error_terms: Vec<String>,
    captcha_markers: Vec<String>,
}

impl OutcomeClassifier {
    pub fn new(config: &ClassifierConfig) -> Self {
        let lowered = |terms: &[String]| -> Vec<String> {
            terms
                .iter()
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect()
        };
        Self {
            success_terms: lowered(&config.success_terms),
            error_terms: lowered(&config.error_terms),
            captcha_markers: lowered(&config.captcha_markers),
        }
    }

    pub fn classify(&self, page_text: &str, error_nodes: &[String]) -> SubmissionOutcome {
        self.verdict(page_text, error_nodes).outcome
    }

    pub fn verdict(&self, page_text: &str, error_nodes: &[String]) -> Verdict {
        let text = page_text.to_lowercase();
        let find = |terms: &[String]| terms.iter().find(|t| text.contains(t.as_str())).cloned();
        let captcha_suspected = find(&self.captcha_markers).is_some();

        let (outcome, matched_term) = if let Some(term) = find(&self.success_terms) {
            (SubmissionOutcome::Success, Some(term))
        } else if let Some(term) = find(&self.error_terms) {
            let messages = error_nodes
                .iter()
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .collect();
            (SubmissionOutcome::ValidationError(messages), Some(term))
        } else {
            (SubmissionOutcome::Uncertain, None)
        };

        debug!(
            "verdict {} (term {:?}, captcha {})",
            outcome.label(),
            matched_term,
            captcha_suspected
        );

        Verdict {
            outcome,
            matched_term,
            captcha_suspected,
        }
    }
}

impl Default for OutcomeClassifier {
    fn default() -> Self {
        Self::new(&ClassifierConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_only() {
        let classifier = OutcomeClassifier::default();
        assert_eq!(
            classifier.classify("Bedankt voor je sollicitatie!", &[]),
            SubmissionOutcome::Success
        );
        assert_eq!(
            classifier.classify("THANK YOU for applying", &[]),
            SubmissionOutcome::Success
        );
    }

    #[test]
    fn test_error_only_carries_node_text() {
        let classifier = OutcomeClassifier::default();
        let outcome = classifier.classify(
            "Dit veld is verplicht",
            &["  E-mail is verplicht ".to_string(), String::new()],
        );
        assert_eq!(
            outcome,
            SubmissionOutcome::ValidationError(vec!["E-mail is verplicht".to_string()])
        );
    }

    #[test]
    fn test_neither_is_uncertain() {
        let classifier = OutcomeClassifier::default();
        assert_eq!(
            classifier.classify("Senior Rust Engineer - Amsterdam", &["Phone is wrong".into()]),
            SubmissionOutcome::Uncertain
        );
        assert_eq!(classifier.classify("", &[]), SubmissionOutcome::Uncertain);
    }

    #[test]
    fn test_success_checked_before_error() {
        let classifier = OutcomeClassifier::default();
        assert_eq!(
            classifier.classify("Application received. Fields marked * are required.", &[]),
            SubmissionOutcome::Success
        );
    }

    #[test]
    fn test_deterministic_and_configurable() {
        let config = ClassifierConfig {
            success_terms: vec!["merci".into()],
            error_terms: vec!["obligatoire".into()],
            ..Default::default()
        };
        let classifier = OutcomeClassifier::new(&config);
        for _ in 0..3 {
            assert_eq!(classifier.classify("Merci !", &[]), SubmissionOutcome::Success);
            assert_eq!(
                classifier.classify("Champ obligatoire", &[]),
                SubmissionOutcome::ValidationError(vec![])
            );
            assert_eq!(classifier.classify("Thank you", &[]), SubmissionOutcome::Uncertain);
        }
    }

    #[test]
    fn test_captcha_flag_does_not_change_outcome() {
        let classifier = OutcomeClassifier::default();
        let verdict = classifier.verdict("Please complete the reCAPTCHA", &[]);
        assert!(verdict.captcha_suspected);
        assert_eq!(verdict.outcome, SubmissionOutcome::Uncertain);
    }
}
