//! Open/closed state for the authenticated user's dropdown.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::listener::{ListenerGuard, PointerEventHub};

/// Element id of the menu wrapper. Pointer-downs inside it never dismiss.
pub const USER_MENU_REGION_ID: &str = "bolt-user-menu";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MenuState {
    #[default]
    Closed,
    Open,
}

impl MenuState {
    pub fn toggled(self) -> Self {
        match self {
            Self::Closed => Self::Open,
            Self::Open => Self::Closed,
        }
    }

    pub fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }

    /// Value for the trigger's `aria-expanded` attribute.
    pub fn aria_expanded(self) -> &'static str {
        if self.is_open() { "true" } else { "false" }
    }
}

type ChangeCallback = Rc<RefCell<Option<Box<dyn FnMut(MenuState)>>>>;

/// One mounted instance of the user menu.
///
/// The outside-pointer listener is acquired in [`UserMenuController::mount`]
/// and released when the controller is dropped. If no document is available
/// the menu still works through its trigger, it just never auto-dismisses.
pub struct UserMenuController {
    state: Rc<Cell<MenuState>>,
    on_change: ChangeCallback,
    region: String,
    outside_listener: Option<ListenerGuard>,
}

impl UserMenuController {
    pub fn mount(hub: &PointerEventHub) -> Self {
        Self::mount_in_region(hub, USER_MENU_REGION_ID)
    }

    pub fn mount_in_region(hub: &PointerEventHub, region: &str) -> Self {
        let state = Rc::new(Cell::new(MenuState::Closed));
        let on_change: ChangeCallback = Rc::new(RefCell::new(None));

        let listener_state = Rc::clone(&state);
        let listener_change = Rc::clone(&on_change);
        let listener_region = region.to_string();
        let outside_listener = match hub.listen(move |event| {
            if listener_state.get().is_open() && !event.is_within(&listener_region) {
                listener_state.set(MenuState::Closed);
                debug!(region = %listener_region, "user menu dismissed by outside pointer");
                notify(&listener_change, MenuState::Closed);
            }
        }) {
            Ok(guard) => Some(guard),
            Err(error) => {
                warn!(%error, "user menu mounted without outside-click dismissal");
                None
            }
        };

        Self {
            state,
            on_change,
            region: region.to_string(),
            outside_listener,
        }
    }

    pub fn state(&self) -> MenuState {
        self.state.get()
    }

    pub fn is_open(&self) -> bool {
        self.state().is_open()
    }

    pub fn aria_expanded(&self) -> &'static str {
        self.state().aria_expanded()
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn has_outside_listener(&self) -> bool {
        self.outside_listener.is_some()
    }

    pub fn toggle(&self) -> MenuState {
        let next = self.state().toggled();
        self.state.set(next);
        notify(&self.on_change, next);
        next
    }

    pub fn close(&self) {
        if self.is_open() {
            self.state.set(MenuState::Closed);
            notify(&self.on_change, MenuState::Closed);
        }
    }

    /// Called after every state change, including outside dismissals.
    pub fn set_on_change(&self, callback: impl FnMut(MenuState) + 'static) {
        *self.on_change.borrow_mut() = Some(Box::new(callback));
    }

    /// Tears the instance down. Equivalent to dropping it.
    pub fn unmount(self) {
        debug!(open = self.is_open(), "user menu unmounted");
    }
}

fn notify(on_change: &ChangeCallback, state: MenuState) {
    if let Ok(mut slot) = on_change.try_borrow_mut() {
        if let Some(callback) = slot.as_mut() {
            callback(state);
        }
    }
}

impl fmt::Debug for UserMenuController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserMenuController")
            .field("state", &self.state())
            .field("region", &self.region)
            .field("outside_listener", &self.has_outside_listener())
            .finish_non_exhaustive()
    }
}
