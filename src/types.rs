use crate::core::SearchRoot;
use crate::form::{AtsPlatform, FieldMap, FillReport, SubmissionOutcome, SubmitAttempt};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One application to fill and submit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationRequest {
    pub url: String,
    pub fields: FieldMap,
    /// Résumé attached through the `resumeFile` intent unless the field map already has one.
    #[serde(default)]
    pub attachment: Option<PathBuf>,
}

impl ApplicationRequest {
    pub fn new(url: impl Into<String>, fields: FieldMap) -> Self {
        Self {
            url: url.into(),
            fields,
            attachment: None,
        }
    }

    pub fn with_attachment(mut self, path: impl Into<PathBuf>) -> Self {
        self.attachment = Some(path.into());
        self
    }
}

/// Moments at which a full-page capture is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Checkpoint {
    BeforeFill,
    AfterFill,
    AfterSubmit,
}

impl Checkpoint {
    pub fn file_stem(&self) -> &'static str {
        match self {
            Checkpoint::BeforeFill => "before_fill",
            Checkpoint::AfterFill => "after_fill",
            Checkpoint::AfterSubmit => "after_submit",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capture {
    pub checkpoint: Checkpoint,
    pub taken_at: DateTime<Utc>,
    pub size_bytes: usize,
    /// PNG bytes; written out by the caller, never serialized.
    #[serde(skip)]
    pub png: Vec<u8>,
}

/// Everything a caller learns from one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationReport {
    pub session_id: String,
    pub url: String,
    pub platform: AtsPlatform,
    pub root: SearchRoot,
    pub fill: FillReport,
    pub submission: SubmitAttempt,
    pub outcome: SubmissionOutcome,
    pub matched_term: Option<String>,
    pub captcha_suspected: bool,
    pub final_url: Option<String>,
    pub page_excerpt: Option<String>,
    pub error_messages: Vec<String>,
    pub notes: Vec<String>,
    pub captures: Vec<Capture>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ApplicationReport {
    pub fn new(session_id: impl Into<String>, url: impl Into<String>) -> Self {
        let url = url.into();
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            platform: AtsPlatform::detect(&url),
            url,
            root: SearchRoot::Page,
            fill: FillReport::new(),
            submission: SubmitAttempt::Skipped {
                reason: "not attempted".to_string(),
            },
            outcome: SubmissionOutcome::Uncertain,
            matched_term: None,
            captcha_suspected: false,
            final_url: None,
            page_excerpt: None,
            error_messages: Vec::new(),
            notes: Vec::new(),
            captures: Vec::new(),
            started_at: now,
            finished_at: now,
        }
    }

    pub fn note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{FieldIntent, FieldValue};

    #[test]
    fn test_request_json_shape() {
        let json = r#"{
            "url": "https://jobs.lever.co/acme/1/apply",
            "fields": { "email": "a@b.c", "languages": ["Dutch"] },
            "attachment": "/tmp/cv.pdf"
        }"#;
        let request: ApplicationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.fields.len(), 2);
        assert_eq!(
            request.fields.get(&FieldIntent::Email),
            Some(&FieldValue::text("a@b.c"))
        );
        assert_eq!(request.attachment, Some(PathBuf::from("/tmp/cv.pdf")));
    }

    #[test]
    fn test_report_skips_capture_bytes() {
        let mut report = ApplicationReport::new("s-1", "https://boards.greenhouse.io/acme/jobs/1");
        report.captures.push(Capture {
            checkpoint: Checkpoint::AfterSubmit,
            taken_at: Utc::now(),
            size_bytes: 3,
            png: vec![1, 2, 3],
        });
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["platform"], "greenhouse");
        assert_eq!(json["outcome"]["verdict"], "uncertain");
        assert!(json["captures"][0].get("png").is_none());
        assert_eq!(json["captures"][0]["checkpoint"], "after_submit");
    }
}
