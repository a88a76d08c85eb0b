//! WebAssembly bindings for AutoMute

mod browser;

use std::future::Future;
use std::sync::OnceLock;

use am_core::{
    engine::{evaluate, Extension, OptionsForm},
    rules,
    settings::{self, SettingsPatch},
    types::{Exemptions, Tab},
};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::browser::BrowserHost;

type HandlerResult = Result<(), Box<dyn std::error::Error>>;

static BACKGROUND_STARTED: OnceLock<()> = OnceLock::new();

fn extension() -> Extension<BrowserHost> {
    Extension::new(BrowserHost)
}

fn spawn_handler<F>(event: &'static str, handler: F)
where
    F: Future<Output = HandlerResult> + 'static,
{
    spawn_local(async move {
        if let Err(e) = handler.await {
            log::error!("{} handler failed: {}", event, e);
        }
    });
}

fn parse_tab(value: &JsValue) -> Result<Tab, serde_wasm_bindgen::Error> {
    serde_wasm_bindgen::from_value(value.clone())
}

fn to_js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

// =============================================================================
// Background Page
// =============================================================================

/// Register the event listeners and run startup. Call once from the
/// background script.
#[wasm_bindgen]
pub fn init_background(log_level: Option<String>) -> Result<(), JsValue> {
    if BACKGROUND_STARTED.set(()).is_err() {
        return Err(JsValue::from_str("Already initialized. Reload the extension to reinitialize."));
    }

    let level = log_level
        .as_deref()
        .and_then(|level| level.parse().ok())
        .unwrap_or(log::Level::Info);
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::new(level));

    let created = Closure::<dyn FnMut(JsValue)>::new(|tab: JsValue| {
        spawn_handler("tabs.onCreated", async move {
            let tab = parse_tab(&tab)?;
            extension().on_tab_created(&tab).await?;
            HandlerResult::Ok(())
        });
    });
    browser::add_tab_created_listener(&created);
    created.forget();

    let updated = Closure::<dyn FnMut(JsValue, JsValue, JsValue)>::new(
        |_tab_id: JsValue, _change_info: JsValue, tab: JsValue| {
            spawn_handler("tabs.onUpdated", async move {
                let tab = parse_tab(&tab)?;
                extension().on_tab_updated(&tab).await?;
                HandlerResult::Ok(())
            });
        },
    );
    let properties = js_sys::Array::of1(&JsValue::from_str("url"));
    let filter = js_sys::Object::new();
    let _ = js_sys::Reflect::set(&filter, &"properties".into(), &properties);
    browser::add_tab_updated_listener(&updated, &filter);
    updated.forget();

    let clicked = Closure::<dyn FnMut(JsValue, JsValue)>::new(|info: JsValue, tab: JsValue| {
        spawn_handler("menus.onClicked", async move {
            let menu_item_id = js_sys::Reflect::get(&info, &"menuItemId".into())
                .ok()
                .and_then(|value| value.as_string())
                .unwrap_or_default();
            let tab = parse_tab(&tab)?;
            extension().on_menu_clicked(&menu_item_id, &tab).await?;
            HandlerResult::Ok(())
        });
    });
    browser::add_menu_clicked_listener(&clicked);
    clicked.forget();

    let toggled = Closure::<dyn FnMut(JsValue)>::new(|_tab: JsValue| {
        spawn_handler("browserAction.onClicked", async move {
            let auto_mute = extension().toggle_auto_mute().await?;
            log::info!("Auto-mute {}", if auto_mute { "enabled" } else { "disabled" });
            HandlerResult::Ok(())
        });
    });
    browser::add_action_clicked_listener(&toggled);
    toggled.forget();

    spawn_handler("startup", async move {
        extension().start().await?;
        HandlerResult::Ok(())
    });

    Ok(())
}

#[wasm_bindgen]
pub fn is_initialized() -> bool {
    BACKGROUND_STARTED.get().is_some()
}

/// Narrow logging at runtime. Cannot go more verbose than the level passed
/// to `init_background`.
#[wasm_bindgen]
pub fn set_log_level(level: &str) -> Result<(), JsValue> {
    let level: log::LevelFilter = level
        .parse()
        .map_err(|_| JsValue::from_str(&format!("Unknown log level: {}", level)))?;
    log::set_max_level(level);
    Ok(())
}

// =============================================================================
// Options Page
// =============================================================================

/// Resolved settings as a plain object with camelCase keys.
#[wasm_bindgen]
pub async fn load_options() -> Result<JsValue, JsValue> {
    let settings = extension().load_options().await.map_err(to_js_error)?;
    serde_wasm_bindgen::to_value(&settings).map_err(to_js_error)
}

/// Persist the options form. Resolves to `{ whitelist: string[], blacklist: string[] }`
/// holding one localized warning per invalid line.
#[wasm_bindgen]
pub async fn save_options(form: JsValue) -> Result<JsValue, JsValue> {
    let form: OptionsForm = serde_wasm_bindgen::from_value(form).map_err(to_js_error)?;
    let warnings = extension().save_options(form).await.map_err(to_js_error)?;
    serde_wasm_bindgen::to_value(&warnings).map_err(to_js_error)
}

// =============================================================================
// Pure Helpers
// =============================================================================

#[wasm_bindgen]
pub fn list_matches(list: &str, url: &str, ignore_about: bool, ignore_addon: bool) -> bool {
    rules::list_matches(list, url, Exemptions::from_toggles(ignore_about, ignore_addon))
}

#[wasm_bindgen]
pub fn should_mute(
    whitelisted: bool,
    blacklisted: bool,
    auto_mute: bool,
    incognito: bool,
    normal_mode: bool,
    private_mode: bool,
) -> bool {
    am_core::should_mute(whitelisted, blacklisted, auto_mute, incognito, normal_mode, private_mode)
}

/// Decide a tab against a settings object without touching the browser.
#[wasm_bindgen]
pub fn evaluate_tab(settings: JsValue, tab: JsValue) -> Result<bool, JsValue> {
    let settings: SettingsPatch = serde_wasm_bindgen::from_value(settings).map_err(to_js_error)?;
    let tab = parse_tab(&tab).map_err(to_js_error)?;
    Ok(evaluate(&settings.resolve(), &tab).muted)
}

#[wasm_bindgen]
pub fn escape_pattern(item: &str) -> String {
    rules::escape_pattern(item)
}

#[wasm_bindgen]
pub fn add_item_to_list(item: &str, list: &str) -> String {
    rules::add_item_to_list(item, list)
}

/// Invalid lines of a list, each as `{ pattern, message }`.
#[wasm_bindgen]
pub fn invalid_patterns(list: &str) -> JsValue {
    let result = js_sys::Array::new();
    for error in rules::invalid_patterns(list) {
        let entry = js_sys::Object::new();
        let _ = js_sys::Reflect::set(&entry, &"pattern".into(), &JsValue::from_str(&error.pattern));
        let _ = js_sys::Reflect::set(&entry, &"message".into(), &JsValue::from_str(&error.message));
        result.push(&entry);
    }
    result.into()
}

#[wasm_bindgen]
pub fn icon_path(auto_mute: bool, dark_theme: bool) -> String {
    settings::icon_path(auto_mute, dark_theme)
}
