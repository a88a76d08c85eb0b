//! Persisted settings
//!
//! The store holds a flat record keyed by camelCase field name. Reads may
//! come back with keys missing (first run, fields added later), so the store
//! speaks in [`SettingsPatch`] and handlers resolve it to [`Settings`].

use serde::{Deserialize, Serialize};

use crate::rules::RuleList;
use crate::types::{Exemptions, ListKind};

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Auto-mute normal tabs
    pub normal_mode: bool,
    /// Auto-mute private tabs
    pub private_mode: bool,
    /// Use the dark toolbar icons
    pub dark_theme: bool,
    /// Global auto-mute switch
    pub auto_mute: bool,
    /// Whitelist rule text
    pub whitelist: String,
    /// Blacklist rule text
    pub blacklist: String,
    /// Treat about: pages as whitelisted
    pub ignore_about_tabs: bool,
    /// Treat extension pages as whitelisted
    pub ignore_addon_tabs: bool,
}

impl Default for Settings {
    /// First-run defaults.
    fn default() -> Self {
        Self {
            normal_mode: true,
            private_mode: true,
            dark_theme: false,
            auto_mute: true,
            whitelist: String::new(),
            blacklist: String::new(),
            ignore_about_tabs: false,
            ignore_addon_tabs: false,
        }
    }
}

impl Settings {
    /// Exemptions applied to the whitelist.
    pub fn whitelist_exemptions(&self) -> Exemptions {
        Exemptions::from_toggles(self.ignore_about_tabs, self.ignore_addon_tabs)
    }

    /// Text of one of the rule lists.
    pub fn list(&self, kind: ListKind) -> &str {
        match kind {
            ListKind::Whitelist => &self.whitelist,
            ListKind::Blacklist => &self.blacklist,
        }
    }

    /// Toolbar icon for the current state.
    pub fn icon_path(&self) -> String {
        icon_path(self.auto_mute, self.dark_theme)
    }

    /// Message key of the toolbar tooltip for the current state.
    pub fn title_key(&self) -> &'static str {
        title_key(self.auto_mute)
    }
}

/// Toolbar icon path: `icons/icon_<muted|unmuted>[_dark].svg`.
pub fn icon_path(auto_mute: bool, dark_theme: bool) -> String {
    format!(
        "icons/icon_{}{}.svg",
        if auto_mute { "muted" } else { "unmuted" },
        if dark_theme { "_dark" } else { "" }
    )
}

/// Tooltip message key: offers the action that clicking the button performs.
pub fn title_key(auto_mute: bool) -> &'static str {
    if auto_mute {
        "disableAutoMute"
    } else {
        "enableAutoMute"
    }
}

// =============================================================================
// SettingsPatch
// =============================================================================

/// Partial settings: what a store read returns and what a write updates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normal_mode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_mode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dark_theme: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_mute: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whitelist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blacklist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_about_tabs: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_addon_tabs: Option<bool>,
}

impl SettingsPatch {
    /// Nothing has been seeded yet.
    pub fn is_first_run(&self) -> bool {
        self.normal_mode.is_none()
    }

    /// The values written on first run.
    pub fn seed() -> Self {
        let defaults = Settings::default();
        Self {
            normal_mode: Some(defaults.normal_mode),
            private_mode: Some(defaults.private_mode),
            dark_theme: Some(defaults.dark_theme),
            auto_mute: Some(defaults.auto_mute),
            whitelist: Some(defaults.whitelist),
            blacklist: Some(defaults.blacklist),
            ignore_about_tabs: None,
            ignore_addon_tabs: None,
        }
    }

    /// Patch replacing one rule list.
    pub fn with_list(kind: ListKind, list: RuleList) -> Self {
        let text = Some(list.into_text());
        match kind {
            ListKind::Whitelist => Self {
                whitelist: text,
                ..Self::default()
            },
            ListKind::Blacklist => Self {
                blacklist: text,
                ..Self::default()
            },
        }
    }

    /// Fill absent fields with the first-run defaults.
    pub fn resolve(self) -> Settings {
        let defaults = Settings::default();
        Settings {
            normal_mode: self.normal_mode.unwrap_or(defaults.normal_mode),
            private_mode: self.private_mode.unwrap_or(defaults.private_mode),
            dark_theme: self.dark_theme.unwrap_or(defaults.dark_theme),
            auto_mute: self.auto_mute.unwrap_or(defaults.auto_mute),
            whitelist: self.whitelist.unwrap_or(defaults.whitelist),
            blacklist: self.blacklist.unwrap_or(defaults.blacklist),
            ignore_about_tabs: self.ignore_about_tabs.unwrap_or(defaults.ignore_about_tabs),
            ignore_addon_tabs: self.ignore_addon_tabs.unwrap_or(defaults.ignore_addon_tabs),
        }
    }

    /// Apply `other` on top of `self`, field by field.
    pub fn merge(&mut self, other: &SettingsPatch) {
        fn take<T: Clone>(dst: &mut Option<T>, src: &Option<T>) {
            if src.is_some() {
                dst.clone_from(src);
            }
        }

        take(&mut self.normal_mode, &other.normal_mode);
        take(&mut self.private_mode, &other.private_mode);
        take(&mut self.dark_theme, &other.dark_theme);
        take(&mut self.auto_mute, &other.auto_mute);
        take(&mut self.whitelist, &other.whitelist);
        take(&mut self.blacklist, &other.blacklist);
        take(&mut self.ignore_about_tabs, &other.ignore_about_tabs);
        take(&mut self.ignore_addon_tabs, &other.ignore_addon_tabs);
    }
}

impl From<Settings> for SettingsPatch {
    fn from(s: Settings) -> Self {
        Self {
            normal_mode: Some(s.normal_mode),
            private_mode: Some(s.private_mode),
            dark_theme: Some(s.dark_theme),
            auto_mute: Some(s.auto_mute),
            whitelist: Some(s.whitelist),
            blacklist: Some(s.blacklist),
            ignore_about_tabs: Some(s.ignore_about_tabs),
            ignore_addon_tabs: Some(s.ignore_addon_tabs),
        }
    }
}
