//! Event handlers
//!
//! One handler per browser event. Each handler reads fresh settings from the
//! store, decides, then delegates side effects to the host. Nothing is cached
//! between events, so overlapping handlers converge on the same state.

use serde::Deserialize;

use crate::decision::{decide, MuteContext, MuteDecision};
use crate::host::{Host, HostError};
use crate::menu::{build_menu, ItemSource, MenuAction};
use crate::rules::{escape_pattern, invalid_patterns, list_matches, RuleList};
use crate::settings::{icon_path, Settings, SettingsPatch};
use crate::types::{Exemptions, ListKind, Tab};
use crate::url::{extract_host, extract_scheme};

/// Error type for event handlers.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Host(#[from] HostError),
    #[error("Malformed URL: {0}")]
    MalformedUrl(String),
    #[error("Unknown menu item: {0}")]
    UnknownMenuItem(String),
}

/// Decide the mute state of a tab under the given settings.
///
/// Exemptions apply to the whitelist only; the blacklist always consults its
/// patterns.
pub fn evaluate(settings: &Settings, tab: &Tab) -> MuteDecision {
    let whitelisted = list_matches(&settings.whitelist, &tab.url, settings.whitelist_exemptions());
    let blacklisted = list_matches(&settings.blacklist, &tab.url, Exemptions::empty());

    decide(&MuteContext {
        whitelisted,
        blacklisted,
        auto_mute: settings.auto_mute,
        incognito: tab.incognito,
        normal_mode: settings.normal_mode,
        private_mode: settings.private_mode,
    })
}

// =============================================================================
// Options Page
// =============================================================================

/// Fields edited on the options page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OptionsForm {
    pub normal_mode: bool,
    pub private_mode: bool,
    pub ignore_about_tabs: bool,
    pub ignore_addon_tabs: bool,
    pub dark_theme: bool,
    pub whitelist: String,
    pub blacklist: String,
}

impl From<OptionsForm> for SettingsPatch {
    fn from(form: OptionsForm) -> Self {
        Self {
            normal_mode: Some(form.normal_mode),
            private_mode: Some(form.private_mode),
            dark_theme: Some(form.dark_theme),
            auto_mute: None,
            whitelist: Some(form.whitelist),
            blacklist: Some(form.blacklist),
            ignore_about_tabs: Some(form.ignore_about_tabs),
            ignore_addon_tabs: Some(form.ignore_addon_tabs),
        }
    }
}

/// Localized warnings for invalid lines, one per line, per list.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct OptionsWarnings {
    pub whitelist: Vec<String>,
    pub blacklist: Vec<String>,
}

impl OptionsWarnings {
    pub fn is_empty(&self) -> bool {
        self.whitelist.is_empty() && self.blacklist.is_empty()
    }
}

// =============================================================================
// Extension
// =============================================================================

/// The extension's event handlers, bound to a host.
pub struct Extension<H> {
    host: H,
}

impl<H: Host> Extension<H> {
    pub fn new(host: H) -> Self {
        Self { host }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Read and resolve the current settings.
    pub async fn settings(&self) -> Result<Settings, EngineError> {
        Ok(self.host.get().await?.resolve())
    }

    /// Startup: register the menu, seed defaults on first run, set the icon.
    ///
    /// A menu entry the host rejects is logged and skipped.
    pub async fn start(&self) -> Result<(), EngineError> {
        for item in build_menu(&self.host) {
            if let Err(e) = self.host.create(&item) {
                log::warn!("Skipping menu item {}: {}", item.id, e);
            }
        }

        let stored = self.host.get().await?;
        if stored.is_first_run() {
            log::info!("Seeding default settings");
            self.host.set(&SettingsPatch::seed()).await?;
        }

        self.refresh_icon().await
    }

    /// A tab was opened.
    pub async fn on_tab_created(&self, tab: &Tab) -> Result<MuteDecision, EngineError> {
        self.auto_mute(tab).await
    }

    /// A tab navigated to a new URL.
    pub async fn on_tab_updated(&self, tab: &Tab) -> Result<MuteDecision, EngineError> {
        self.auto_mute(tab).await
    }

    /// Evaluate a tab against current settings and apply the decision.
    pub async fn auto_mute(&self, tab: &Tab) -> Result<MuteDecision, EngineError> {
        let settings = self.settings().await?;
        let decision = evaluate(&settings, tab);

        log::debug!(
            "Tab {} {}: {:?}",
            tab.id,
            if decision.muted { "muted" } else { "unmuted" },
            decision.reason
        );

        self.host.set_muted(tab.id, decision.muted).await?;
        Ok(decision)
    }

    /// A context menu entry was clicked while `tab` was active.
    pub async fn on_menu_clicked(&self, menu_item_id: &str, tab: &Tab) -> Result<(), EngineError> {
        let action = MenuAction::from_id(menu_item_id)
            .ok_or_else(|| EngineError::UnknownMenuItem(menu_item_id.to_string()))?;

        match action {
            MenuAction::MuteAllTabs => {
                self.set_all_muted(true).await?;
            }
            MenuAction::UnmuteAllTabs => {
                self.set_all_muted(false).await?;
            }
            MenuAction::AddToList { source, list } => {
                let item = list_item(source, &tab.url)?;
                self.add_to_list(list, &escape_pattern(&item)).await?;

                if list == ListKind::Blacklist {
                    self.host.set_muted(tab.id, true).await?;
                }
            }
        }

        Ok(())
    }

    /// Insert an already-escaped pattern into a list and persist it.
    ///
    /// Returns false when the pattern was already present.
    pub async fn add_to_list(&self, kind: ListKind, pattern: &str) -> Result<bool, EngineError> {
        let settings = self.settings().await?;
        let mut list = RuleList::from(settings.list(kind).trim());

        if !list.insert(pattern) {
            log::debug!("{} already contains {}", kind, pattern);
            return Ok(false);
        }

        self.host.set(&SettingsPatch::with_list(kind, list)).await?;
        Ok(true)
    }

    /// Apply one mute state to every open tab.
    ///
    /// A failing tab is logged and skipped. Returns how many tabs were updated.
    pub async fn set_all_muted(&self, muted: bool) -> Result<usize, EngineError> {
        let tabs = self.host.query_all().await?;
        let mut updated = 0;

        for tab in &tabs {
            match self.host.set_muted(tab.id, muted).await {
                Ok(()) => updated += 1,
                Err(e) => log::warn!("Skipping tab {}: {}", tab.id, e),
            }
        }

        Ok(updated)
    }

    /// Toolbar button: flip auto-mute. Returns the new state.
    pub async fn toggle_auto_mute(&self) -> Result<bool, EngineError> {
        let settings = self.settings().await?;
        let auto_mute = !settings.auto_mute;

        self.host
            .set(&SettingsPatch {
                auto_mute: Some(auto_mute),
                ..SettingsPatch::default()
            })
            .await?;

        self.refresh_icon().await?;
        Ok(auto_mute)
    }

    /// Set the toolbar icon and tooltip from current settings.
    pub async fn refresh_icon(&self) -> Result<(), EngineError> {
        let settings = self.settings().await?;
        self.host.set_icon(&settings.icon_path()).await?;
        self.host
            .set_title(&self.host.message(settings.title_key()))
            .await?;
        Ok(())
    }

    /// Current settings for populating the options form.
    pub async fn load_options(&self) -> Result<Settings, EngineError> {
        self.settings().await
    }

    /// Localized warnings for every invalid line in the form's lists.
    pub fn option_warnings(&self, form: &OptionsForm) -> OptionsWarnings {
        let prefix = self.host.message("invalidRegex");
        let render = |text: &str| -> Vec<String> {
            invalid_patterns(text)
                .into_iter()
                .map(|e| format!("{} \"{}\"", prefix, e.pattern))
                .collect()
        };

        OptionsWarnings {
            whitelist: render(&form.whitelist),
            blacklist: render(&form.blacklist),
        }
    }

    /// Options page save. Lists are stored as typed, invalid lines included.
    pub async fn save_options(&self, form: OptionsForm) -> Result<OptionsWarnings, EngineError> {
        let warnings = self.option_warnings(&form);

        let settings = self.settings().await?;
        if form.dark_theme != settings.dark_theme {
            self.host
                .set_icon(&icon_path(settings.auto_mute, form.dark_theme))
                .await?;
        }

        self.host.set(&form.into()).await?;
        Ok(warnings)
    }
}

/// The text a menu shortcut adds, before escaping.
fn list_item(source: ItemSource, url: &str) -> Result<String, EngineError> {
    match source {
        ItemSource::Domain => extract_host(url)
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| EngineError::MalformedUrl(url.to_string())),
        ItemSource::Url => match extract_scheme(url) {
            Some(_) => Ok(url.to_string()),
            None => Err(EngineError::MalformedUrl(url.to_string())),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use super::*;
    use crate::host::{ActionButton, Localizer, MenuHost, SettingsStore, TabAudio};
    use crate::menu::MenuItem;
    use crate::types::TabId;

    #[derive(Default)]
    struct FakeHost {
        store: RefCell<SettingsPatch>,
        tabs: Vec<Tab>,
        muted: RefCell<HashMap<TabId, bool>>,
        failing_tab: Option<TabId>,
        failing_menu: Option<&'static str>,
        menus: RefCell<Vec<MenuItem>>,
        icon: RefCell<Option<String>>,
        title: RefCell<Option<String>>,
        writes: RefCell<usize>,
        read_only: bool,
    }

    impl FakeHost {
        fn with_settings(settings: Settings) -> Self {
            Self {
                store: RefCell::new(settings.into()),
                ..Self::default()
            }
        }

        fn muted(&self, id: i32) -> Option<bool> {
            self.muted.borrow().get(&TabId(id)).copied()
        }

        fn stored(&self) -> Settings {
            self.store.borrow().clone().resolve()
        }
    }

    impl SettingsStore for FakeHost {
        async fn get(&self) -> Result<SettingsPatch, HostError> {
            Ok(self.store.borrow().clone())
        }

        async fn set(&self, patch: &SettingsPatch) -> Result<(), HostError> {
            if self.read_only {
                return Err(HostError::Storage("quota exceeded".to_string()));
            }
            *self.writes.borrow_mut() += 1;
            self.store.borrow_mut().merge(patch);
            Ok(())
        }
    }

    impl TabAudio for FakeHost {
        async fn set_muted(&self, tab: TabId, muted: bool) -> Result<(), HostError> {
            if self.failing_tab == Some(tab) {
                return Err(HostError::Tabs(format!("no tab with id {}", tab)));
            }
            self.muted.borrow_mut().insert(tab, muted);
            Ok(())
        }

        async fn query_all(&self) -> Result<Vec<Tab>, HostError> {
            Ok(self.tabs.clone())
        }
    }

    impl MenuHost for FakeHost {
        fn create(&self, item: &MenuItem) -> Result<(), HostError> {
            if self.failing_menu == Some(item.id.as_str()) {
                return Err(HostError::Menus(format!("duplicate id {}", item.id)));
            }
            self.menus.borrow_mut().push(item.clone());
            Ok(())
        }
    }

    impl Localizer for FakeHost {
        fn message(&self, key: &str) -> String {
            match key {
                "invalidRegex" => "Invalid regular expression".to_string(),
                other => other.to_string(),
            }
        }
    }

    impl ActionButton for FakeHost {
        async fn set_icon(&self, path: &str) -> Result<(), HostError> {
            *self.icon.borrow_mut() = Some(path.to_string());
            Ok(())
        }

        async fn set_title(&self, title: &str) -> Result<(), HostError> {
            *self.title.borrow_mut() = Some(title.to_string());
            Ok(())
        }
    }

    fn base_settings() -> Settings {
        Settings {
            auto_mute: true,
            normal_mode: true,
            private_mode: false,
            ..Settings::default()
        }
    }

    #[test]
    fn test_evaluate_plain_tab_muted() {
        let tab = Tab::new(1, "https://example.com", false);
        assert!(evaluate(&base_settings(), &tab).muted);
    }

    #[test]
    fn test_evaluate_blacklist_overrides_whitelist() {
        let settings = Settings {
            whitelist: "example\\.com".to_string(),
            blacklist: "example\\.com".to_string(),
            ..base_settings()
        };
        let tab = Tab::new(1, "https://example.com", false);
        assert!(evaluate(&settings, &tab).muted);
    }

    #[test]
    fn test_evaluate_whitelist_unmutes() {
        for (auto_mute, normal_mode) in [(true, true), (true, false), (false, true), (false, false)] {
            let settings = Settings {
                whitelist: "example\\.com".to_string(),
                auto_mute,
                normal_mode,
                ..base_settings()
            };
            let tab = Tab::new(1, "https://example.com/page", false);
            assert!(!evaluate(&settings, &tab).muted);
        }
    }

    #[test]
    fn test_evaluate_exemptions_whitelist_only() {
        let settings = Settings {
            ignore_about_tabs: true,
            ignore_addon_tabs: true,
            ..base_settings()
        };
        assert!(!evaluate(&settings, &Tab::new(1, "about:blank", false)).muted);
        assert!(!evaluate(&settings, &Tab::new(1, "moz-extension://x/page.html", false)).muted);

        // exemptions never excuse a blacklist match
        let settings = Settings {
            blacklist: "^about:".to_string(),
            ..settings
        };
        assert!(evaluate(&settings, &Tab::new(1, "about:blank", false)).muted);
    }

    #[test]
    fn test_evaluate_private_tab_uses_private_mode() {
        let tab = Tab::new(1, "https://example.com", true);
        assert!(!evaluate(&base_settings(), &tab).muted);

        let settings = Settings {
            private_mode: true,
            normal_mode: false,
            ..base_settings()
        };
        assert!(evaluate(&settings, &tab).muted);
    }

    #[tokio::test]
    async fn test_start_seeds_once() {
        let ext = Extension::new(FakeHost::default());
        ext.start().await.unwrap();

        let host = ext.host();
        assert_eq!(host.stored(), Settings::default());
        assert_eq!(*host.writes.borrow(), 1);
        assert_eq!(host.menus.borrow().len(), 7);
        assert_eq!(host.icon.borrow().as_deref(), Some("icons/icon_muted.svg"));
        assert_eq!(host.title.borrow().as_deref(), Some("disableAutoMute"));

        // user edits survive a restart
        host.store.borrow_mut().auto_mute = Some(false);
        ext.start().await.unwrap();
        assert_eq!(*host.writes.borrow(), 1);
        assert!(!host.stored().auto_mute);
        assert_eq!(host.icon.borrow().as_deref(), Some("icons/icon_unmuted.svg"));
    }

    #[tokio::test]
    async fn test_start_continues_past_rejected_menu_item() {
        let host = FakeHost {
            failing_menu: Some("addDomainToWhitelist"),
            ..FakeHost::default()
        };
        let ext = Extension::new(host);
        ext.start().await.unwrap();

        let host = ext.host();
        let ids: Vec<String> = host.menus.borrow().iter().map(|i| i.id.clone()).collect();
        assert_eq!(ids.len(), 6);
        assert!(!ids.iter().any(|id| id == "addDomainToWhitelist"));
        assert!(ids.iter().any(|id| id == "unmuteAllTabs"));
        assert_eq!(host.stored(), Settings::default());
        assert_eq!(host.icon.borrow().as_deref(), Some("icons/icon_muted.svg"));
    }

    #[tokio::test]
    async fn test_tab_events_apply_decision() {
        let ext = Extension::new(FakeHost::with_settings(Settings {
            whitelist: "music\\.example".to_string(),
            ..base_settings()
        }));

        let created = Tab::new(4, "https://video.example.org", false);
        assert!(ext.on_tab_created(&created).await.unwrap().muted);
        assert_eq!(ext.host().muted(4), Some(true));

        let updated = Tab::new(4, "https://MUSIC.example.org/live", false);
        assert!(!ext.on_tab_updated(&updated).await.unwrap().muted);
        assert_eq!(ext.host().muted(4), Some(false));
    }

    #[tokio::test]
    async fn test_settings_reread_per_event() {
        let ext = Extension::new(FakeHost::with_settings(base_settings()));
        let tab = Tab::new(2, "https://example.com", false);

        assert!(ext.auto_mute(&tab).await.unwrap().muted);
        ext.host().store.borrow_mut().auto_mute = Some(false);
        assert!(!ext.auto_mute(&tab).await.unwrap().muted);
    }

    #[tokio::test]
    async fn test_invalid_pattern_does_not_abort_evaluation() {
        let ext = Extension::new(FakeHost::with_settings(Settings {
            whitelist: "(broken\nexample\\.com".to_string(),
            blacklist: "[".to_string(),
            ..base_settings()
        }));

        let tab = Tab::new(9, "https://example.com", false);
        assert!(!ext.on_tab_created(&tab).await.unwrap().muted);
        assert_eq!(ext.host().muted(9), Some(false));
    }

    #[tokio::test]
    async fn test_menu_add_domain_to_whitelist() {
        let ext = Extension::new(FakeHost::with_settings(base_settings()));
        let tab = Tab::new(1, "https://Sub.Example.com:8443/watch?v=1", false);

        ext.on_menu_clicked("addDomainToWhitelist", &tab).await.unwrap();
        ext.on_menu_clicked("addDomainToWhitelist", &tab).await.unwrap();

        let stored = ext.host().stored();
        assert_eq!(stored.whitelist, "sub\\.example\\.com");
        assert_eq!(*ext.host().writes.borrow(), 1);
        assert_eq!(ext.host().muted(1), None);

        assert!(!ext.auto_mute(&tab).await.unwrap().muted);
    }

    #[tokio::test]
    async fn test_menu_add_url_to_blacklist_mutes_tab() {
        let ext = Extension::new(FakeHost::with_settings(Settings {
            blacklist: "ads\\.example".to_string(),
            ..base_settings()
        }));
        let tab = Tab::new(5, "https://example.com/a?b=c", false);

        ext.on_menu_clicked("addUrlToBlacklist", &tab).await.unwrap();

        assert_eq!(
            ext.host().stored().blacklist,
            "ads\\.example\nhttps://example\\.com/a\\?b=c"
        );
        assert_eq!(ext.host().muted(5), Some(true));
    }

    #[tokio::test]
    async fn test_menu_add_domain_without_host() {
        let ext = Extension::new(FakeHost::with_settings(base_settings()));
        let tab = Tab::new(1, "about:blank", false);

        let err = ext.on_menu_clicked("addDomainToBlacklist", &tab).await.unwrap_err();
        assert!(matches!(err, EngineError::MalformedUrl(_)));
        assert_eq!(*ext.host().writes.borrow(), 0);
        assert_eq!(ext.host().muted(1), None);
    }

    #[tokio::test]
    async fn test_menu_unknown_item() {
        let ext = Extension::new(FakeHost::with_settings(base_settings()));
        let tab = Tab::new(1, "https://example.com", false);
        let err = ext.on_menu_clicked("autoMutePlus", &tab).await.unwrap_err();
        assert!(matches!(err, EngineError::UnknownMenuItem(_)));
    }

    #[tokio::test]
    async fn test_mute_all_skips_failing_tab() {
        let host = FakeHost {
            tabs: vec![
                Tab::new(1, "https://a.com", false),
                Tab::new(2, "https://b.com", true),
                Tab::new(3, "about:blank", false),
            ],
            failing_tab: Some(TabId(2)),
            ..FakeHost::with_settings(base_settings())
        };
        let ext = Extension::new(host);
        let clicked = Tab::new(1, "https://a.com", false);

        ext.on_menu_clicked("muteAllTabs", &clicked).await.unwrap();
        assert_eq!(ext.host().muted(1), Some(true));
        assert_eq!(ext.host().muted(2), None);
        assert_eq!(ext.host().muted(3), Some(true));

        assert_eq!(ext.set_all_muted(false).await.unwrap(), 2);
        assert_eq!(ext.host().muted(3), Some(false));
    }

    #[tokio::test]
    async fn test_toggle_auto_mute() {
        let ext = Extension::new(FakeHost::with_settings(Settings {
            dark_theme: true,
            ..base_settings()
        }));

        assert!(!ext.toggle_auto_mute().await.unwrap());
        assert_eq!(ext.host().icon.borrow().as_deref(), Some("icons/icon_unmuted_dark.svg"));
        assert_eq!(ext.host().title.borrow().as_deref(), Some("enableAutoMute"));

        assert!(ext.toggle_auto_mute().await.unwrap());
        assert_eq!(ext.host().icon.borrow().as_deref(), Some("icons/icon_muted_dark.svg"));
    }

    #[tokio::test]
    async fn test_save_options() {
        let ext = Extension::new(FakeHost::with_settings(base_settings()));
        let form = OptionsForm {
            normal_mode: false,
            private_mode: true,
            dark_theme: true,
            whitelist: "good\n (bad \n".to_string(),
            blacklist: "*nope".to_string(),
            ..OptionsForm::default()
        };

        let warnings = ext.save_options(form).await.unwrap();
        assert_eq!(warnings.whitelist, vec!["Invalid regular expression \"(bad\""]);
        assert_eq!(warnings.blacklist, vec!["Invalid regular expression \"*nope\""]);
        assert_eq!(ext.host().icon.borrow().as_deref(), Some("icons/icon_muted_dark.svg"));

        let stored = ext.load_options().await.unwrap();
        assert!(!stored.normal_mode);
        assert!(stored.private_mode);
        assert!(stored.auto_mute);
        assert_eq!(stored.whitelist, "good\n (bad \n");
    }

    #[tokio::test]
    async fn test_save_options_keeps_icon_when_theme_unchanged() {
        let ext = Extension::new(FakeHost::with_settings(base_settings()));
        let warnings = ext.save_options(OptionsForm::default()).await.unwrap();
        assert!(warnings.is_empty());
        assert!(ext.host().icon.borrow().is_none());
    }

    #[tokio::test]
    async fn test_store_write_failure_surfaces() {
        let host = FakeHost {
            read_only: true,
            ..FakeHost::with_settings(base_settings())
        };
        let ext = Extension::new(host);
        let tab = Tab::new(1, "https://example.com", false);

        let err = ext.on_menu_clicked("addUrlToWhitelist", &tab).await.unwrap_err();
        assert!(matches!(err, EngineError::Host(HostError::Storage(_))));
        assert_eq!(ext.host().stored().whitelist, "");

        // evaluation still works without writes
        assert!(ext.auto_mute(&tab).await.unwrap().muted);
    }
}
