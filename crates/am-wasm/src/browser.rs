//! WebExtension host
//!
//! Implements the engine's collaborator traits over the `browser.*` API.
//! Every call goes straight to the browser; no state is kept here.

use am_core::host::{ActionButton, HostError, Localizer, MenuHost, SettingsStore, TabAudio};
use am_core::menu::MenuItem;
use am_core::settings::SettingsPatch;
use am_core::types::{Tab, TabId};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = ["browser", "storage", "local"], js_name = get)]
    fn storage_get() -> js_sys::Promise;

    #[wasm_bindgen(js_namespace = ["browser", "storage", "local"], js_name = set)]
    fn storage_set(items: &JsValue) -> js_sys::Promise;

    #[wasm_bindgen(js_namespace = ["browser", "tabs"], js_name = update)]
    fn tabs_update(tab_id: i32, props: &JsValue) -> js_sys::Promise;

    #[wasm_bindgen(js_namespace = ["browser", "tabs"], js_name = query)]
    fn tabs_query(query: &JsValue) -> js_sys::Promise;

    #[wasm_bindgen(catch, js_namespace = ["browser", "menus"], js_name = create)]
    fn menus_create(props: &JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(js_namespace = ["browser", "i18n"], js_name = getMessage)]
    fn i18n_get_message(key: &str) -> String;

    #[wasm_bindgen(js_namespace = ["browser", "browserAction"], js_name = setIcon)]
    fn action_set_icon(details: &JsValue) -> js_sys::Promise;

    #[wasm_bindgen(js_namespace = ["browser", "browserAction"], js_name = setTitle)]
    fn action_set_title(details: &JsValue) -> js_sys::Promise;

    #[wasm_bindgen(js_namespace = ["browser", "tabs", "onCreated"], js_name = addListener)]
    pub fn add_tab_created_listener(callback: &Closure<dyn FnMut(JsValue)>);

    #[wasm_bindgen(js_namespace = ["browser", "tabs", "onUpdated"], js_name = addListener)]
    pub fn add_tab_updated_listener(
        callback: &Closure<dyn FnMut(JsValue, JsValue, JsValue)>,
        filter: &JsValue,
    );

    #[wasm_bindgen(js_namespace = ["browser", "menus", "onClicked"], js_name = addListener)]
    pub fn add_menu_clicked_listener(callback: &Closure<dyn FnMut(JsValue, JsValue)>);

    #[wasm_bindgen(js_namespace = ["browser", "browserAction", "onClicked"], js_name = addListener)]
    pub fn add_action_clicked_listener(callback: &Closure<dyn FnMut(JsValue)>);
}

/// Best-effort text of a rejected promise or thrown value.
pub fn describe(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|e| String::from(e.message()))
        })
        .unwrap_or_else(|| format!("{:?}", value))
}

fn object(entries: &[(&str, JsValue)]) -> JsValue {
    let result = js_sys::Object::new();
    for (key, value) in entries {
        let _ = js_sys::Reflect::set(&result, &(*key).into(), value);
    }
    result.into()
}

/// `browser.*` backed host.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserHost;

impl SettingsStore for BrowserHost {
    async fn get(&self) -> Result<SettingsPatch, HostError> {
        let value = JsFuture::from(storage_get())
            .await
            .map_err(|e| HostError::Storage(describe(&e)))?;
        serde_wasm_bindgen::from_value(value).map_err(|e| HostError::Storage(e.to_string()))
    }

    async fn set(&self, patch: &SettingsPatch) -> Result<(), HostError> {
        let items =
            serde_wasm_bindgen::to_value(patch).map_err(|e| HostError::Storage(e.to_string()))?;
        JsFuture::from(storage_set(&items))
            .await
            .map_err(|e| HostError::Storage(describe(&e)))?;
        Ok(())
    }
}

impl TabAudio for BrowserHost {
    async fn set_muted(&self, tab: TabId, muted: bool) -> Result<(), HostError> {
        let props = object(&[("muted", JsValue::from(muted))]);
        JsFuture::from(tabs_update(tab.0, &props))
            .await
            .map_err(|e| HostError::Tabs(describe(&e)))?;
        Ok(())
    }

    async fn query_all(&self) -> Result<Vec<Tab>, HostError> {
        let tabs = JsFuture::from(tabs_query(&js_sys::Object::new()))
            .await
            .map_err(|e| HostError::Tabs(describe(&e)))?;
        serde_wasm_bindgen::from_value(tabs).map_err(|e| HostError::Tabs(e.to_string()))
    }
}

impl MenuHost for BrowserHost {
    fn create(&self, item: &MenuItem) -> Result<(), HostError> {
        let props =
            serde_wasm_bindgen::to_value(item).map_err(|e| HostError::Menus(e.to_string()))?;
        menus_create(&props).map_err(|e| HostError::Menus(describe(&e)))?;
        Ok(())
    }
}

impl Localizer for BrowserHost {
    fn message(&self, key: &str) -> String {
        i18n_get_message(key)
    }
}

impl ActionButton for BrowserHost {
    async fn set_icon(&self, path: &str) -> Result<(), HostError> {
        let details = object(&[("path", JsValue::from_str(path))]);
        JsFuture::from(action_set_icon(&details))
            .await
            .map_err(|e| HostError::Action(describe(&e)))?;
        Ok(())
    }

    async fn set_title(&self, title: &str) -> Result<(), HostError> {
        let details = object(&[("title", JsValue::from_str(title))]);
        JsFuture::from(action_set_title(&details))
            .await
            .map_err(|e| HostError::Action(describe(&e)))?;
        Ok(())
    }
}
