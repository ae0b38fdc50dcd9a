use serde::{Deserialize, Serialize};

/// What the page looks like once the submit race is over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostSubmitState {
    pub url: String,
    pub text: String,
    pub error_messages: Vec<String>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl PostSubmitState {
    pub fn new(url: String, text: String) -> Self {
        Self {
            url,
            text,
            error_messages: Vec::new(),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn with_error_messages(mut self, messages: Vec<String>) -> Self {
        self.error_messages = messages;
        self
    }

    /// Append text from another document (e.g. the top page around an embedded form).
    pub fn append_text(&mut self, more: &str) {
        if more.trim().is_empty() {
            return;
        }
        if !self.text.is_empty() {
            self.text.push('\n');
        }
        self.text.push_str(more);
    }

    pub fn excerpt(&self, max_chars: usize) -> String {
        self.text.chars().take(max_chars).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_text_skips_blank() {
        let mut state = PostSubmitState::new("https://x".into(), "frame".into());
        state.append_text("   ");
        assert_eq!(state.text, "frame");
        state.append_text("top page");
        assert_eq!(state.text, "frame\ntop page");
        assert_eq!(state.excerpt(5), "frame");
    }
}
