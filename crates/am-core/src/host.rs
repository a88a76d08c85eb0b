//! Host collaborators
//!
//! The browser surfaces the engine talks to. Futures returned here need not
//! be `Send`: the extension host runs every handler on one thread.

#![allow(async_fn_in_trait)]

use crate::menu::MenuItem;
use crate::settings::SettingsPatch;
use crate::types::{Tab, TabId};

/// Error type for collaborator failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Tab error: {0}")]
    Tabs(String),
    #[error("Menu error: {0}")]
    Menus(String),
    #[error("Browser action error: {0}")]
    Action(String),
}

/// Persistent key-value settings store.
pub trait SettingsStore {
    /// Read every stored key.
    async fn get(&self) -> Result<SettingsPatch, HostError>;

    /// Write the fields present in `patch`, leaving the rest untouched.
    async fn set(&self, patch: &SettingsPatch) -> Result<(), HostError>;
}

/// Tab audio control and enumeration.
pub trait TabAudio {
    /// Apply a mute state. Idempotent.
    async fn set_muted(&self, tab: TabId, muted: bool) -> Result<(), HostError>;

    /// All open tabs.
    async fn query_all(&self) -> Result<Vec<Tab>, HostError>;
}

/// Context menu registration.
pub trait MenuHost {
    fn create(&self, item: &MenuItem) -> Result<(), HostError>;
}

/// Localized UI strings.
pub trait Localizer {
    fn message(&self, key: &str) -> String;
}

/// Toolbar button icon and tooltip.
pub trait ActionButton {
    async fn set_icon(&self, path: &str) -> Result<(), HostError>;
    async fn set_title(&self, title: &str) -> Result<(), HostError>;
}

/// Everything the engine needs from its host.
pub trait Host: SettingsStore + TabAudio + MenuHost + Localizer + ActionButton {}

impl<T> Host for T where T: SettingsStore + TabAudio + MenuHost + Localizer + ActionButton {}
