//! Mute Decision Engine
//!
//! Combines list matches, the global toggles and the tab's browsing mode
//! into a single mute/unmute decision. Pure: no settings access, no side
//! effects.

/// Inputs to one decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MuteContext {
    /// Whitelist matched the tab (exemptions included)
    pub whitelisted: bool,
    /// Blacklist matched the tab
    pub blacklisted: bool,
    /// Auto-mute globally enabled
    pub auto_mute: bool,
    /// Tab is in private browsing
    pub incognito: bool,
    /// Auto-mute applies to normal tabs
    pub normal_mode: bool,
    /// Auto-mute applies to private tabs
    pub private_mode: bool,
}

/// Which rule produced the decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MuteReason {
    /// Blacklist match; wins over everything, the whitelist included
    Blacklisted,
    /// Whitelist match
    Whitelisted,
    /// Auto-mute is switched off
    AutoMuteDisabled,
    /// Private tab, decided by the private mode toggle
    PrivateMode,
    /// Normal tab, decided by the normal mode toggle
    NormalMode,
}

/// Final decision for a tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MuteDecision {
    pub muted: bool,
    pub reason: MuteReason,
}

impl MuteDecision {
    const fn new(muted: bool, reason: MuteReason) -> Self {
        Self { muted, reason }
    }
}

/// Decide whether a tab should be muted.
pub fn decide(ctx: &MuteContext) -> MuteDecision {
    if ctx.blacklisted {
        return MuteDecision::new(true, MuteReason::Blacklisted);
    }
    if ctx.whitelisted {
        return MuteDecision::new(false, MuteReason::Whitelisted);
    }
    if !ctx.auto_mute {
        return MuteDecision::new(false, MuteReason::AutoMuteDisabled);
    }
    if ctx.incognito {
        MuteDecision::new(ctx.private_mode, MuteReason::PrivateMode)
    } else {
        MuteDecision::new(ctx.normal_mode, MuteReason::NormalMode)
    }
}

/// Flat form of [`decide`]. Returns true when the tab should be muted.
pub fn should_mute(
    whitelisted: bool,
    blacklisted: bool,
    auto_mute: bool,
    incognito: bool,
    normal_mode: bool,
    private_mode: bool,
) -> bool {
    decide(&MuteContext {
        whitelisted,
        blacklisted,
        auto_mute,
        incognito,
        normal_mode,
        private_mode,
    })
    .muted
}
