//! Keyword override that routes distress messages to the `emergency` intent
//! without consulting the model.
//!
//! Matching is plain substring search over the lowercased text, so fragments
//! inside longer words ("firewall") also trigger. A false alarm is preferred
//! to a missed one.

use super::error::ClassifierError;

/// Label reported when the override fires.
pub const EMERGENCY_LABEL: &str = "emergency";

/// Keywords and phrases recognised out of the box.
pub const DEFAULT_EMERGENCY_KEYWORDS: &[&str] = &[
    "fire",
    "smoke",
    "leak",
    "toxic",
    "fumes",
    "explosion",
    "blast",
    "suffocating",
    "can't breathe",
    "pressure dropping",
    "hull breach",
    "gas leak",
    "support failing",
    "danger",
    "emergency",
];

#[derive(Debug, Clone)]
pub struct EmergencyMatcher {
    keywords: Vec<String>,
}

impl Default for EmergencyMatcher {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_EMERGENCY_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

impl EmergencyMatcher {
    /// Builds a matcher with extra site-specific keywords on top of
    /// [`DEFAULT_EMERGENCY_KEYWORDS`]. The built-in list can never be removed.
    /// Keywords are normalised the same way as the input text; blank entries
    /// are rejected since they would match everything.
    pub fn with_additional_keywords<I, S>(keywords: I) -> Result<Self, ClassifierError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut matcher = Self::default();
        for keyword in keywords {
            let keyword = normalize(keyword.as_ref());
            if keyword.trim().is_empty() {
                return Err(ClassifierError::ConfigError("Emergency keywords cannot be empty".into()));
            }
            if !matcher.keywords.contains(&keyword) {
                matcher.keywords.push(keyword);
            }
        }
        Ok(matcher)
    }

    pub fn matches(&self, text: &str) -> bool {
        self.matched_keyword(text).is_some()
    }

    /// Returns the first configured keyword found in `text`.
    pub fn matched_keyword(&self, text: &str) -> Option<&str> {
        let text = normalize(text);
        self.keywords
            .iter()
            .find(|keyword| text.contains(keyword.as_str()))
            .map(String::as_str)
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

// Typographic apostrophes are folded so "can’t breathe" still matches.
fn normalize(text: &str) -> String {
    text.to_lowercase().replace(['\u{2019}', '\u{2018}'], "'")
}
