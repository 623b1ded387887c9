#![allow(clippy::needless_pass_by_value)]

#[cfg(any(target_arch = "wasm32", test))]
mod loader_data;
#[cfg(any(target_arch = "wasm32", test))]
mod log_store;

#[cfg(target_arch = "wasm32")]
mod wasm {
    use std::cell::RefCell;
    use std::rc::Rc;

    use bolt_app_state::{
        AppShell, BootstrapContext, CellWriter, ClientCapability, ClientEnvironment,
        ConversationState, DocumentRoot, HeaderController, HeaderView, KeyValueStorage, MenuState,
        PointerDown, PointerEventHub, PointerTarget, ScriptManifest, SessionIdentity,
        StorageError, ThemeValue, UserAffordance, reactive_cell,
    };
    use bolt_ui_core::{
        ACTION_ATTRIBUTE, BUNDLE_ATTRIBUTE, HEADER_ID, LOADER_DATA_ID, OUTLET_ID,
        TOGGLE_USER_MENU_ACTION, USER_AFFORDANCE_ATTRIBUTE, bundle_loader_script,
        render_header_string,
    };
    use chrono::Utc;
    use serde_json::{Map, Value};
    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;

    use crate::loader_data::parse_loader_data;
    use crate::log_store::{LogLevel, SYSTEM_LOG_CAPACITY, SystemLog};

    mod dom;
    mod events;

    use dom::*;
    use events::*;

    thread_local! {
        static SHELL: RefCell<Option<AppShell>> = const { RefCell::new(None) };
        static HEADER: RefCell<Option<HeaderController>> = const { RefCell::new(None) };
        static CONVERSATION: RefCell<Option<CellWriter<ConversationState>>> = const { RefCell::new(None) };
        static POINTER_HUB: RefCell<PointerEventHub> = RefCell::new(PointerEventHub::unavailable());
        static SYSTEM_LOG: SystemLog = SystemLog::new(SYSTEM_LOG_CAPACITY);
        static POINTER_DOWN_HANDLER: RefCell<Option<Closure<dyn FnMut(web_sys::Event)>>> = const { RefCell::new(None) };
        static ACTION_CLICK_HANDLER: RefCell<Option<Closure<dyn FnMut(web_sys::Event)>>> = const { RefCell::new(None) };
        static POPSTATE_HANDLER: RefCell<Option<Closure<dyn FnMut(web_sys::Event)>>> = const { RefCell::new(None) };
    }

    #[wasm_bindgen(start)]
    pub fn start() {
        console_error_panic_hook::set_once();
        if SHELL.with(|shell| shell.borrow().is_some()) {
            return;
        }
        boot();
    }

    fn boot() {
        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(document) = window.document() else {
            return;
        };

        let identity = match parse_loader_data(loader_data_text(&document).as_deref()) {
            Ok(identity) => identity,
            Err(error) => {
                system_log(
                    LogLevel::Warning,
                    "hydration data unavailable; continuing anonymous",
                    json_details(&[("error", Value::String(error.to_string()))]),
                );
                SessionIdentity::anonymous()
            }
        };

        let storage: Rc<dyn KeyValueStorage> = Rc::new(LocalStorage::new(&window));
        let (bundles, affordance) = (rendered_bundles(&document), rendered_affordance(&document));
        let mut scripts = ScriptManifest::new(&bundles);
        for bundle in &bundles {
            scripts.attach(bundle);
        }

        let context = BootstrapContext {
            identity,
            storage,
            prefers_dark: prefers_dark(&window),
            environment: client_environment(&window),
            route: window.location().pathname().unwrap_or_else(|_| "/".to_string()),
            scripts,
        };
        let root = Rc::new(HtmlRoot::new(&document));
        let mut shell = AppShell::start(context, root);

        let hub = match install_pointer_bridge(&document) {
            Ok(()) => PointerEventHub::new(),
            Err(error) => {
                system_log(
                    LogLevel::Warning,
                    "pointer bridge unavailable; user menu is trigger-only",
                    json_details(&[("error", Value::String(js_error_text(&error)))]),
                );
                PointerEventHub::unavailable()
            }
        };
        POINTER_HUB.with(|slot| *slot.borrow_mut() = hub.clone());
        install_action_delegation(&document);
        install_popstate_handler(&window);

        let (conversation, conversation_reader) = reactive_cell(ConversationState::NOT_STARTED);
        let header = HeaderController::mount(
            conversation_reader,
            shell.auth_presence(),
            hub,
            affordance,
            ClientCapability::Available,
        );

        for bundle in shell.mount() {
            attach_bundle(&document, &bundle);
        }

        CONVERSATION.with(|slot| *slot.borrow_mut() = Some(conversation));
        HEADER.with(|slot| *slot.borrow_mut() = Some(header));
        refresh_header();

        SYSTEM_LOG.with(|log| shell.report_initialized(log, Utc::now()));
        console_info(&format!(
            "bolt shell initialized (theme={}, authenticated={})",
            shell.theme().get(),
            shell.identity().is_authenticated()
        ));
        SHELL.with(|slot| *slot.borrow_mut() = Some(shell));
    }

    /// Redraws the header if anything it depends on changed.
    pub(super) fn refresh_header() {
        let view = HEADER.with(|slot| {
            let mut slot = slot.borrow_mut();
            let header = slot.as_mut()?;
            header.take_invalidated().then(|| header.render())
        });
        if let Some(view) = view {
            paint_header(&view);
        }
    }

    pub(super) fn system_log(level: LogLevel, message: &str, details: Map<String, Value>) {
        match level {
            LogLevel::Warning | LogLevel::Error => console_warn(message),
            LogLevel::Debug | LogLevel::Info => console_info(message),
        }
        SYSTEM_LOG.with(|log| log.record(level, message, details));
    }

    fn json_details(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), value.clone()))
            .collect()
    }

    #[wasm_bindgen]
    pub fn set_conversation_started(started: bool) {
        let changed = CONVERSATION.with(|slot| {
            slot.borrow()
                .as_ref()
                .is_some_and(|writer| writer.set(ConversationState::new(started)))
        });
        if changed {
            refresh_header();
        }
    }

    #[wasm_bindgen]
    pub fn set_signed_in(signed_in: bool) {
        let changed = SHELL.with(|slot| {
            slot.borrow()
                .as_ref()
                .is_some_and(|shell| shell.set_signed_in(signed_in))
        });
        if changed {
            refresh_header();
        }
    }

    #[wasm_bindgen]
    pub fn set_theme(theme: String) -> bool {
        let Ok(theme) = theme.parse::<ThemeValue>() else {
            system_log(
                LogLevel::Warning,
                "ignored unknown theme",
                json_details(&[("theme", Value::String(theme))]),
            );
            return false;
        };
        SHELL.with(|slot| {
            slot.borrow().as_ref().is_some_and(|shell| {
                shell.theme().set(theme);
                true
            })
        })
    }

    #[wasm_bindgen]
    pub fn toggle_user_menu() -> bool {
        let state = HEADER.with(|slot| {
            slot.borrow()
                .as_ref()
                .and_then(HeaderController::toggle_user_menu)
        });
        refresh_header();
        state.is_some_and(MenuState::is_open)
    }

    #[wasm_bindgen]
    pub fn user_menu_open() -> bool {
        HEADER.with(|slot| {
            slot.borrow()
                .as_ref()
                .and_then(HeaderController::user_menu)
                .is_some_and(|menu| menu.is_open())
        })
    }

    #[wasm_bindgen]
    pub fn header_branch() -> u8 {
        HEADER.with(|slot| {
            slot.borrow()
                .as_ref()
                .map_or(0, |header| header.branch().ordinal())
        })
    }

    #[wasm_bindgen]
    pub fn system_logs_json() -> String {
        SYSTEM_LOG.with(SystemLog::to_json)
    }
}
