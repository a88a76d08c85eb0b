//! AutoMute Core Library
//!
//! This crate decides whether a browser tab's audio should be muted, based on
//! user rule lists and global toggles.
//!
//! # Architecture
//!
//! Matching and deciding are pure functions. The browser is reached only
//! through the collaborator traits in [`host`], which the event handlers in
//! [`engine`] are generic over, so every handler can be driven by an
//! in-memory host in tests.
//!
//! # Modules
//!
//! - `rules`: Rule list parsing, matching and item addition
//! - `decision`: Mute decision precedence
//! - `settings`: Persisted settings record and defaults
//! - `menu`: Context menu model
//! - `host`: Collaborator traits
//! - `engine`: Event handlers
//! - `url`: Tab URL helpers
//! - `types`: Shared type definitions

pub mod decision;
pub mod engine;
pub mod host;
pub mod menu;
pub mod rules;
pub mod settings;
pub mod types;
pub mod url;

// Re-export commonly used types
pub use decision::{decide, should_mute, MuteContext, MuteDecision, MuteReason};
pub use engine::{evaluate, EngineError, Extension, OptionsForm, OptionsWarnings};
pub use host::{Host, HostError};
pub use rules::{add_item_to_list, escape_pattern, invalid_patterns, list_matches, PatternError, RuleList};
pub use settings::{Settings, SettingsPatch};
pub use types::{Exemptions, ListKind, Tab, TabId};
