//! Rule Lists
//!
//! A rule list is newline-delimited text where every non-blank line is a
//! case-insensitive regular expression tested anywhere in a tab URL.
//! Invalid lines are skipped with a warning and never stop the evaluation
//! of the remaining lines.

use regex::{Regex, RegexBuilder};

use crate::types::Exemptions;
use crate::url::{is_about_page, is_extension_page};

/// A line that failed to compile as a pattern.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid regular expression \"{pattern}\": {message}")]
pub struct PatternError {
    /// Offending line, trimmed
    pub pattern: String,
    /// Compiler diagnostic
    pub message: String,
}

/// Compile one trimmed line as a case-insensitive pattern.
pub fn compile_pattern(pattern: &str) -> Result<Regex, PatternError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| PatternError {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })
}

/// Iterate the trimmed, non-empty lines of list text.
pub fn patterns(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n').map(str::trim).filter(|line| !line.is_empty())
}

// =============================================================================
// Matching
// =============================================================================

/// Check whether a list matches a URL.
///
/// Exempted page kinds match before any pattern is consulted. Patterns are
/// tried in list order and the first match wins.
pub fn list_matches(text: &str, url: &str, exemptions: Exemptions) -> bool {
    log::debug!("Checking: {}", url);

    if exemptions.contains(Exemptions::ABOUT_PAGES) && is_about_page(url) {
        return true;
    }
    if exemptions.contains(Exemptions::EXTENSION_PAGES) && is_extension_page(url) {
        return true;
    }

    for pattern in patterns(text) {
        match compile_pattern(pattern) {
            Ok(re) => {
                if re.is_match(url) {
                    return true;
                }
            }
            Err(e) => log::warn!("{}", e),
        }
    }

    false
}

/// Every line of the list that fails to compile, in list order.
pub fn invalid_patterns(text: &str) -> Vec<PatternError> {
    patterns(text)
        .filter_map(|pattern| compile_pattern(pattern).err())
        .collect()
}

// =============================================================================
// Item Addition
// =============================================================================

/// Escape every character with special meaning in the pattern language so the
/// result matches `item` literally.
pub fn escape_pattern(item: &str) -> String {
    regex::escape(item)
}

/// Add an already-escaped item to list text.
///
/// Returns the new text, or the trimmed text unchanged when the trimmed item
/// is blank or already present as a line.
pub fn add_item_to_list(item: &str, text: &str) -> String {
    let mut list = RuleList::from(text.trim());
    list.insert(item);
    list.into_text()
}

// =============================================================================
// RuleList
// =============================================================================

/// Owned rule list text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleList {
    text: String,
}

impl RuleList {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    /// True when the list has no non-blank lines.
    pub fn is_empty(&self) -> bool {
        self.patterns().next().is_none()
    }

    /// Trimmed non-empty lines, in order.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        patterns(&self.text)
    }

    pub fn contains(&self, item: &str) -> bool {
        let item = item.trim();
        self.text.split('\n').any(|line| line.trim() == item)
    }

    /// Append a pattern line unless it is already present.
    ///
    /// Existing text is trimmed first. Blank items are ignored. Returns true
    /// when the list changed.
    pub fn insert(&mut self, item: &str) -> bool {
        let item = item.trim();
        if item.is_empty() {
            return false;
        }
        let trimmed = self.text.trim();

        if trimmed.split('\n').any(|line| line.trim() == item) {
            return false;
        }

        let mut text = String::with_capacity(trimmed.len() + item.len() + 1);
        text.push_str(trimmed);
        if !trimmed.is_empty() {
            text.push('\n');
        }
        text.push_str(item);
        self.text = text;
        true
    }

    /// See [`list_matches`].
    pub fn matches(&self, url: &str, exemptions: Exemptions) -> bool {
        list_matches(&self.text, url, exemptions)
    }

    /// See [`invalid_patterns`].
    pub fn invalid_patterns(&self) -> Vec<PatternError> {
        invalid_patterns(&self.text)
    }

    /// Compile all valid lines once, for repeated evaluation.
    pub fn compile(&self) -> CompiledRuleList {
        let mut compiled = Vec::new();
        let mut errors = Vec::new();

        for pattern in self.patterns() {
            match compile_pattern(pattern) {
                Ok(re) => compiled.push(re),
                Err(e) => {
                    log::warn!("{}", e);
                    errors.push(e);
                }
            }
        }

        CompiledRuleList {
            patterns: compiled,
            errors,
        }
    }
}

impl From<&str> for RuleList {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for RuleList {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl std::fmt::Display for RuleList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Pre-compiled rule list.
#[derive(Debug, Clone)]
pub struct CompiledRuleList {
    patterns: Vec<Regex>,
    errors: Vec<PatternError>,
}

impl CompiledRuleList {
    /// Number of valid patterns.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Lines skipped during compilation.
    pub fn errors(&self) -> &[PatternError] {
        &self.errors
    }

    /// Same semantics as [`list_matches`] without recompiling.
    pub fn matches(&self, url: &str, exemptions: Exemptions) -> bool {
        if exemptions.contains(Exemptions::ABOUT_PAGES) && is_about_page(url) {
            return true;
        }
        if exemptions.contains(Exemptions::EXTENSION_PAGES) && is_extension_page(url) {
            return true;
        }
        self.patterns.iter().any(|re| re.is_match(url))
    }
}
