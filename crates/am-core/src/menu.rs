//! Context menu model
//!
//! One root entry with list shortcuts and bulk mute actions beneath it.
//! Item ids double as localization keys for their titles.

use serde::Serialize;

use crate::host::Localizer;
use crate::types::ListKind;

/// Id of the root entry.
pub const ROOT_ID: &str = "autoMutePlus";

/// What to add from the clicked tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemSource {
    /// The URL's host name
    Domain,
    /// The full URL
    Url,
}

/// A clickable menu entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    AddToList { source: ItemSource, list: ListKind },
    MuteAllTabs,
    UnmuteAllTabs,
}

impl MenuAction {
    /// Every clickable entry, in menu order.
    pub const ALL: [MenuAction; 6] = [
        Self::AddToList {
            source: ItemSource::Domain,
            list: ListKind::Whitelist,
        },
        Self::AddToList {
            source: ItemSource::Url,
            list: ListKind::Whitelist,
        },
        Self::AddToList {
            source: ItemSource::Domain,
            list: ListKind::Blacklist,
        },
        Self::AddToList {
            source: ItemSource::Url,
            list: ListKind::Blacklist,
        },
        Self::MuteAllTabs,
        Self::UnmuteAllTabs,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Self::AddToList { source, list } => match (source, list) {
                (ItemSource::Domain, ListKind::Whitelist) => "addDomainToWhitelist",
                (ItemSource::Url, ListKind::Whitelist) => "addUrlToWhitelist",
                (ItemSource::Domain, ListKind::Blacklist) => "addDomainToBlacklist",
                (ItemSource::Url, ListKind::Blacklist) => "addUrlToBlacklist",
            },
            Self::MuteAllTabs => "muteAllTabs",
            Self::UnmuteAllTabs => "unmuteAllTabs",
        }
    }

    /// Parse a clicked menu item id.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.id() == id)
    }

    /// 16px icon shown next to the entry, if any.
    pub fn icon(self) -> Option<&'static str> {
        match self {
            Self::MuteAllTabs => Some("icons/icon_muted.svg"),
            Self::UnmuteAllTabs => Some("icons/icon_unmuted.svg"),
            Self::AddToList { .. } => None,
        }
    }
}

/// Icon sizes keyed by pixel size, as the menus API expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuIcons {
    #[serde(rename = "16")]
    pub size_16: String,
}

/// Registration record for one menu entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icons: Option<MenuIcons>,
}

/// Build the full menu, root first, with localized titles.
pub fn build_menu<L: Localizer + ?Sized>(localizer: &L) -> Vec<MenuItem> {
    let mut items = Vec::with_capacity(MenuAction::ALL.len() + 1);
    items.push(MenuItem {
        id: ROOT_ID.to_string(),
        parent_id: None,
        title: localizer.message(ROOT_ID),
        icons: None,
    });

    for action in MenuAction::ALL {
        items.push(MenuItem {
            id: action.id().to_string(),
            parent_id: Some(ROOT_ID.to_string()),
            title: localizer.message(action.id()),
            icons: action.icon().map(|path| MenuIcons {
                size_16: path.to_string(),
            }),
        });
    }

    items
}
