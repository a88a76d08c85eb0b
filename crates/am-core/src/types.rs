//! Core type definitions for AutoMute
//!
//! These types mirror the shapes the WebExtension host hands to the
//! event handlers and are used throughout the decision engine.

use serde::{Deserialize, Serialize};

// =============================================================================
// Tabs
// =============================================================================

/// Browser tab identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub i32);

impl std::fmt::Display for TabId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Context for a tab being evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tab {
    /// Tab ID
    pub id: TabId,
    /// Current tab URL (empty when the host withholds it)
    #[serde(default)]
    pub url: String,
    /// Is this a private browsing tab?
    #[serde(default)]
    pub incognito: bool,
}

impl Tab {
    pub fn new(id: i32, url: impl Into<String>, incognito: bool) -> Self {
        Self {
            id: TabId(id),
            url: url.into(),
            incognito,
        }
    }
}

// =============================================================================
// Exemptions
// =============================================================================

bitflags::bitflags! {
    /// Page kinds that count as whitelisted without consulting the patterns.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Exemptions: u8 {
        /// Internal browser pages (about:)
        const ABOUT_PAGES = 1 << 0;
        /// This extension's own pages (moz-extension://)
        const EXTENSION_PAGES = 1 << 1;
    }
}

impl Exemptions {
    /// Build from the two ignore toggles of the settings record.
    pub fn from_toggles(ignore_about: bool, ignore_addon: bool) -> Self {
        let mut exemptions = Self::empty();
        exemptions.set(Self::ABOUT_PAGES, ignore_about);
        exemptions.set(Self::EXTENSION_PAGES, ignore_addon);
        exemptions
    }
}

// =============================================================================
// Rule Lists
// =============================================================================

/// Which of the two user rule lists an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    /// Suppresses auto-mute
    Whitelist,
    /// Forces mute
    Blacklist,
}

impl ListKind {
    /// Settings key holding the list text.
    pub fn key(self) -> &'static str {
        match self {
            Self::Whitelist => "whitelist",
            Self::Blacklist => "blacklist",
        }
    }
}

impl std::fmt::Display for ListKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exemptions_from_toggles() {
        assert_eq!(Exemptions::from_toggles(false, false), Exemptions::empty());
        assert_eq!(Exemptions::from_toggles(true, false), Exemptions::ABOUT_PAGES);
        assert_eq!(Exemptions::from_toggles(false, true), Exemptions::EXTENSION_PAGES);
        assert_eq!(
            Exemptions::from_toggles(true, true),
            Exemptions::ABOUT_PAGES | Exemptions::EXTENSION_PAGES
        );
    }

    #[test]
    fn test_tab_deserialize_from_host_shape() {
        let tab: Tab = serde_json::from_str(
            r#"{"id": 7, "url": "https://example.com/", "incognito": true, "active": false}"#,
        )
        .unwrap();
        assert_eq!(tab, Tab::new(7, "https://example.com/", true));

        let bare: Tab = serde_json::from_str(r#"{"id": 3}"#).unwrap();
        assert_eq!(bare.url, "");
        assert!(!bare.incognito);
    }
}
