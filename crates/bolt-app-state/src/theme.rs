//! Theme resolution and the process-wide theme store.
//!
//! The theme has to be on the document root before first paint, which is
//! earlier than the WASM bundle can run. The server therefore embeds
//! [`inline_bootstrap_script`] in the document head, and the shell repeats
//! the same resolution through [`resolve_theme`] when it boots. Both are
//! derived from the constants below so the two execution contexts cannot
//! drift apart.

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cell::{CellReader, CellWriter, Subscription, reactive_cell};
use crate::storage::KeyValueStorage;

pub const THEME_STORAGE_KEY: &str = "bolt_theme";
pub const THEME_ATTRIBUTE: &str = "data-theme";
pub const PREFERS_DARK_MEDIA_QUERY: &str = "(prefers-color-scheme: dark)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeValue {
    Light,
    Dark,
}

impl ThemeValue {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn from_system_preference(prefers_dark: bool) -> Self {
        if prefers_dark { Self::Dark } else { Self::Light }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

impl fmt::Display for ThemeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown theme '{0}'")]
pub struct UnknownTheme(pub String);

impl FromStr for ThemeValue {
    type Err = UnknownTheme;

    /// Exact match only. The inline head script compares the raw stored
    /// string, so trimming here would let the two resolvers disagree.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(UnknownTheme(other.to_string())),
        }
    }
}

/// Stored value wins when it names a known theme; anything else (missing,
/// empty, unknown) falls back to the system preference.
pub fn resolve_theme(stored: Option<&str>, prefers_dark: bool) -> ThemeValue {
    stored
        .and_then(|raw| raw.parse::<ThemeValue>().ok())
        .unwrap_or_else(|| ThemeValue::from_system_preference(prefers_dark))
}

/// Synchronous pre-paint script for the document head. Mirrors
/// [`resolve_theme`] exactly.
pub fn inline_bootstrap_script() -> String {
    let light = ThemeValue::Light.as_str();
    let dark = ThemeValue::Dark.as_str();
    format!(
        "(function () {{\n\
         \x20 var theme = null;\n\
         \x20 try {{ theme = window.localStorage.getItem('{THEME_STORAGE_KEY}'); }} catch (_) {{}}\n\
         \x20 if (theme !== '{light}' && theme !== '{dark}') {{\n\
         \x20   var prefersDark = !!(window.matchMedia && window.matchMedia('{PREFERS_DARK_MEDIA_QUERY}').matches);\n\
         \x20   theme = prefersDark ? '{dark}' : '{light}';\n\
         \x20 }}\n\
         \x20 document.documentElement.setAttribute('{THEME_ATTRIBUTE}', theme);\n\
         }})();"
    )
}

/// Reactive theme cell backed by durable storage.
///
/// `set` writes storage first and only then notifies subscribers. A failed
/// write is logged and otherwise ignored: the choice still applies for the
/// rest of this load.
pub struct ThemeStore {
    storage: Rc<dyn KeyValueStorage>,
    writer: CellWriter<ThemeValue>,
}

impl ThemeStore {
    pub fn load(storage: Rc<dyn KeyValueStorage>, prefers_dark: bool) -> Self {
        let stored = match storage.get_item(THEME_STORAGE_KEY) {
            Ok(stored) => stored,
            Err(error) => {
                warn!(%error, "theme storage read failed; using system preference");
                None
            }
        };
        let theme = resolve_theme(stored.as_deref(), prefers_dark);
        debug!(
            theme = theme.as_str(),
            from_storage = stored.is_some(),
            "theme resolved"
        );
        let (writer, _reader) = reactive_cell(theme);
        Self { storage, writer }
    }

    pub fn get(&self) -> ThemeValue {
        self.writer.get()
    }

    pub fn set(&self, theme: ThemeValue) {
        if let Err(error) = self.storage.set_item(THEME_STORAGE_KEY, theme.as_str()) {
            warn!(%error, theme = theme.as_str(), "theme persist failed; keeping it for this load only");
        }
        self.writer.set(theme);
    }

    pub fn toggle(&self) -> ThemeValue {
        let next = self.get().toggled();
        self.set(next);
        next
    }

    pub fn reader(&self) -> CellReader<ThemeValue> {
        self.writer.reader()
    }

    pub fn subscribe(&self, callback: impl FnMut(&ThemeValue) + 'static) -> Subscription {
        self.reader().subscribe(callback)
    }

    pub fn clear_subscribers(&self) {
        self.writer.clear_subscribers();
    }
}

impl fmt::Debug for ThemeStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThemeStore")
            .field("theme", &self.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::storage::MemoryStorage;

    /// Records the order of storage writes relative to notifications.
    struct OrderedStorage {
        log: Rc<RefCell<Vec<String>>>,
    }

    impl KeyValueStorage for OrderedStorage {
        fn get_item(&self, _key: &str) -> Result<Option<String>, crate::StorageError> {
            Ok(None)
        }

        fn set_item(&self, _key: &str, value: &str) -> Result<(), crate::StorageError> {
            self.log.borrow_mut().push(format!("persist:{value}"));
            Ok(())
        }
    }

    #[test]
    fn resolve_prefers_stored_value() {
        assert_eq!(resolve_theme(Some("dark"), false), ThemeValue::Dark);
        assert_eq!(resolve_theme(Some("light"), true), ThemeValue::Light);
    }

    #[test]
    fn resolve_falls_back_to_system_preference() {
        assert_eq!(resolve_theme(None, true), ThemeValue::Dark);
        assert_eq!(resolve_theme(None, false), ThemeValue::Light);
        assert_eq!(resolve_theme(Some(""), true), ThemeValue::Dark);
        assert_eq!(resolve_theme(Some("solarized"), false), ThemeValue::Light);
    }

    #[test]
    fn set_survives_a_fresh_load() {
        let storage = MemoryStorage::new();
        let store = ThemeStore::load(Rc::new(storage.clone()), false);
        assert_eq!(store.get(), ThemeValue::Light);

        store.set(ThemeValue::Dark);
        drop(store);

        let reloaded = ThemeStore::load(Rc::new(storage), false);
        assert_eq!(reloaded.get(), ThemeValue::Dark);
    }

    #[test]
    fn empty_storage_uses_system_preference() {
        let store = ThemeStore::load(Rc::new(MemoryStorage::new()), true);
        assert_eq!(store.get(), ThemeValue::Dark);
    }

    #[test]
    fn unavailable_storage_degrades_to_session_local_theme() {
        let store = ThemeStore::load(Rc::new(MemoryStorage::unavailable()), true);
        assert_eq!(store.get(), ThemeValue::Dark);

        store.set(ThemeValue::Light);
        assert_eq!(store.get(), ThemeValue::Light);
    }

    #[test]
    fn set_persists_before_notifying() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let store = ThemeStore::load(
            Rc::new(OrderedStorage {
                log: Rc::clone(&log),
            }),
            false,
        );
        let notify_log = Rc::clone(&log);
        let _subscription =
            store.subscribe(move |theme| notify_log.borrow_mut().push(format!("notify:{theme}")));

        store.set(ThemeValue::Dark);
        assert_eq!(*log.borrow(), vec!["persist:dark", "notify:dark"]);
    }

    #[test]
    fn toggle_flips_and_persists() {
        let storage = MemoryStorage::with_entry(THEME_STORAGE_KEY, "dark");
        let store = ThemeStore::load(Rc::new(storage.clone()), false);
        assert_eq!(store.toggle(), ThemeValue::Light);
        assert_eq!(
            storage.get_item(THEME_STORAGE_KEY),
            Ok(Some("light".to_string()))
        );
    }

    /// The resolution rule the inline script encodes: the stored string is
    /// used only when it is exactly `light` or `dark`.
    fn inline_script_rule(stored: Option<&str>, prefers_dark: bool) -> ThemeValue {
        match stored {
            Some("light") => ThemeValue::Light,
            Some("dark") => ThemeValue::Dark,
            _ if prefers_dark => ThemeValue::Dark,
            _ => ThemeValue::Light,
        }
    }

    #[test]
    fn inline_script_and_resolver_agree_on_every_stored_value() {
        let script = inline_bootstrap_script();
        assert!(script.contains(&format!("getItem('{THEME_STORAGE_KEY}')")));
        assert!(script.contains(&format!("setAttribute('{THEME_ATTRIBUTE}', theme)")));
        assert!(script.contains(PREFERS_DARK_MEDIA_QUERY));
        assert!(script.contains("theme !== 'light' && theme !== 'dark'"));
        assert!(!script.contains("trim"));
        assert!(!script.contains("{{"));

        let stored_values = [
            None,
            Some(""),
            Some("dark"),
            Some("light"),
            Some(" dark"),
            Some("dark\n"),
            Some("Dark"),
            Some("solarized"),
        ];
        for stored in stored_values {
            for prefers_dark in [false, true] {
                assert_eq!(
                    resolve_theme(stored, prefers_dark),
                    inline_script_rule(stored, prefers_dark),
                    "stored={stored:?} prefers_dark={prefers_dark}"
                );
            }
        }
        assert_eq!(resolve_theme(Some(" dark"), false), ThemeValue::Light);
    }
}
