    use super::*;

    /// `window.localStorage`, looked up on every call so a storage that
    /// becomes unavailable mid-session degrades instead of throwing.
    pub(super) struct LocalStorage {
        window: web_sys::Window,
    }

    impl LocalStorage {
        pub(super) fn new(window: &web_sys::Window) -> Self {
            Self {
                window: window.clone(),
            }
        }

        fn storage(&self) -> Result<web_sys::Storage, StorageError> {
            match self.window.local_storage() {
                Ok(Some(storage)) => Ok(storage),
                Ok(None) => Err(StorageError::Unavailable {
                    reason: "localStorage is not exposed".to_string(),
                }),
                Err(error) => Err(StorageError::Unavailable {
                    reason: js_error_text(&error),
                }),
            }
        }
    }

    impl KeyValueStorage for LocalStorage {
        fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.storage()?
                .get_item(key)
                .map_err(|error| StorageError::Read {
                    key: key.to_string(),
                    reason: js_error_text(&error),
                })
        }

        fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.storage()?
                .set_item(key, value)
                .map_err(|error| StorageError::Write {
                    key: key.to_string(),
                    reason: js_error_text(&error),
                })
        }
    }

    pub(super) struct HtmlRoot {
        document: web_sys::Document,
    }

    impl HtmlRoot {
        pub(super) fn new(document: &web_sys::Document) -> Self {
            Self {
                document: document.clone(),
            }
        }
    }

    impl DocumentRoot for HtmlRoot {
        fn set_root_attribute(&self, name: &str, value: &str) {
            let Some(root) = self.document.document_element() else {
                return;
            };
            if let Err(error) = root.set_attribute(name, value) {
                console_warn(&format!(
                    "failed to set root attribute {name}: {}",
                    js_error_text(&error)
                ));
            }
        }
    }

    /// Event target resolved against the live document.
    pub(super) struct DomTarget {
        document: web_sys::Document,
        node: web_sys::Node,
    }

    impl DomTarget {
        pub(super) fn from_event(document: &web_sys::Document, event: &web_sys::Event) -> Option<Self> {
            let node = event.target()?.dyn_into::<web_sys::Node>().ok()?;
            Some(Self {
                document: document.clone(),
                node,
            })
        }
    }

    impl PointerTarget for DomTarget {
        fn is_within(&self, region: &str) -> bool {
            self.document
                .get_element_by_id(region)
                .is_some_and(|element| element.contains(Some(&self.node)))
        }
    }

    pub(super) fn loader_data_text(document: &web_sys::Document) -> Option<String> {
        document
            .get_element_by_id(LOADER_DATA_ID)
            .and_then(|element| element.text_content())
    }

    /// Bundles the server already rendered as module scripts.
    pub(super) fn rendered_bundles(document: &web_sys::Document) -> Vec<String> {
        let selector = format!("script[{BUNDLE_ATTRIBUTE}]");
        let Ok(nodes) = document.query_selector_all(&selector) else {
            return Vec::new();
        };
        (0..nodes.length())
            .filter_map(|index| nodes.item(index))
            .filter_map(|node| node.dyn_into::<web_sys::Element>().ok())
            .filter_map(|element| element.get_attribute(BUNDLE_ATTRIBUTE))
            .collect()
    }

    pub(super) fn rendered_affordance(document: &web_sys::Document) -> UserAffordance {
        let selector = format!("[{USER_AFFORDANCE_ATTRIBUTE}]");
        document
            .query_selector(&selector)
            .ok()
            .flatten()
            .and_then(|element| element.get_attribute(USER_AFFORDANCE_ATTRIBUTE))
            .and_then(|raw| raw.parse::<UserAffordance>().ok())
            .unwrap_or_default()
    }

    pub(super) fn prefers_dark(window: &web_sys::Window) -> bool {
        window
            .match_media(bolt_app_state::PREFERS_DARK_MEDIA_QUERY)
            .ok()
            .flatten()
            .is_some_and(|query| query.matches())
    }

    pub(super) fn client_environment(window: &web_sys::Window) -> ClientEnvironment {
        let navigator = window.navigator();
        ClientEnvironment {
            platform: navigator.platform().unwrap_or_default(),
            user_agent: navigator.user_agent().unwrap_or_default(),
        }
    }

    pub(super) fn attach_bundle(document: &web_sys::Document, bundle: &str) {
        let Some(body) = document.body() else {
            return;
        };
        let script = match document.create_element("script") {
            Ok(script) => script,
            Err(error) => {
                console_warn(&format!("failed to create bundle script: {}", js_error_text(&error)));
                return;
            }
        };
        let attached = script
            .set_attribute("type", "module")
            .and_then(|()| script.set_attribute(BUNDLE_ATTRIBUTE, bundle))
            .and_then(|()| {
                script.set_text_content(Some(&bundle_loader_script(bundle)));
                body.append_child(&script).map(|_| ())
            });
        if let Err(error) = attached {
            system_log(
                LogLevel::Warning,
                "failed to attach client bundle",
                json_details(&[
                    ("bundle", Value::String(bundle.to_string())),
                    ("error", Value::String(js_error_text(&error))),
                ]),
            );
        }
    }

    pub(super) fn paint_header(view: &HeaderView) {
        let Some(header) = web_sys::window()
            .and_then(|window| window.document())
            .and_then(|document| document.get_element_by_id(HEADER_ID))
        else {
            return;
        };
        header.set_outer_html(&render_header_string(view));
    }

    pub(super) fn set_outlet_route(document: &web_sys::Document, route: &str) {
        if let Some(outlet) = document.get_element_by_id(OUTLET_ID) {
            let _ = outlet.set_attribute("data-route", route);
        }
    }

    pub(super) fn console_info(message: &str) {
        web_sys::console::info_1(&JsValue::from_str(message));
    }

    pub(super) fn console_warn(message: &str) {
        web_sys::console::warn_1(&JsValue::from_str(message));
    }

    pub(super) fn js_error_text(error: &JsValue) -> String {
        error
            .as_string()
            .or_else(|| {
                error
                    .dyn_ref::<js_sys::Error>()
                    .map(|error| String::from(error.message()))
            })
            .unwrap_or_else(|| format!("{error:?}"))
    }
