    use super::*;

    /// The single document-level `mousedown` listener. Every pointer-down is
    /// forwarded into the shared hub; the user menu decides for itself
    /// whether the target is outside its region.
    pub(super) fn install_pointer_bridge(document: &web_sys::Document) -> Result<(), JsValue> {
        let listening_document = document.clone();
        let callback = Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(move |event: web_sys::Event| {
            let hub = POINTER_HUB.with(|slot| slot.borrow().clone());
            let target = DomTarget::from_event(&listening_document, &event);
            let pointer = match &target {
                Some(target) => PointerDown::new(target),
                None => PointerDown::without_target(),
            };
            hub.dispatch(&pointer);
            refresh_header();
        }));
        document.add_event_listener_with_callback("mousedown", callback.as_ref().unchecked_ref())?;
        POINTER_DOWN_HANDLER.with(|slot| *slot.borrow_mut() = Some(callback));
        Ok(())
    }

    /// Click delegation for header actions. The header is repainted with
    /// `outerHTML`, so listeners on its children would not survive a render.
    pub(super) fn install_action_delegation(document: &web_sys::Document) {
        let callback = Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(move |event: web_sys::Event| {
            let Some(action) = event
                .target()
                .and_then(|target| target.dyn_into::<web_sys::Element>().ok())
                .and_then(|element| element.closest(&format!("[{ACTION_ATTRIBUTE}]")).ok().flatten())
                .and_then(|element| element.get_attribute(ACTION_ATTRIBUTE))
            else {
                return;
            };
            if action == TOGGLE_USER_MENU_ACTION {
                event.prevent_default();
                let _ = toggle_user_menu();
            }
        }));
        if let Err(error) =
            document.add_event_listener_with_callback("click", callback.as_ref().unchecked_ref())
        {
            console_warn(&format!("click delegation unavailable: {}", js_error_text(&error)));
            return;
        }
        ACTION_CLICK_HANDLER.with(|slot| *slot.borrow_mut() = Some(callback));
    }

    /// History navigation inside the persistent frame: remember where the
    /// previous route was scrolled to and restore the new route's position.
    pub(super) fn install_popstate_handler(window: &web_sys::Window) {
        let listening_window = window.clone();
        let callback = Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(move |_event| {
            let Ok(route) = listening_window.location().pathname() else {
                return;
            };
            #[expect(clippy::cast_possible_truncation)]
            let scroll_top = listening_window.scroll_y().unwrap_or_default().round() as i32;
            let restored = SHELL.with(|slot| {
                slot.borrow_mut()
                    .as_mut()
                    .map(|shell| shell.frame_mut().navigate(&route, scroll_top))
            });
            let Some(restored) = restored else {
                return;
            };
            listening_window.scroll_to_with_x_and_y(0.0, f64::from(restored.unwrap_or(0)));
            if let Some(document) = listening_window.document() {
                set_outlet_route(&document, &route);
            }
        }));
        if let Err(error) =
            window.add_event_listener_with_callback("popstate", callback.as_ref().unchecked_ref())
        {
            console_warn(&format!("history tracking unavailable: {}", js_error_text(&error)));
            return;
        }
        POPSTATE_HANDLER.with(|slot| *slot.borrow_mut() = Some(callback));
    }
