//! Process-wide pointer listener hub.
//!
//! The browser shell owns exactly one document-level `mousedown` listener and
//! forwards every event into a [`PointerEventHub`]. Overlay components
//! register with the hub while they are active and get back a
//! [`ListenerGuard`]; dropping the guard deregisters them. Tests drive the
//! hub directly with synthetic events and assert `listener_count` returns to
//! zero after each activation/deactivation pair.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// The element a pointer event landed on, reduced to the one question the
/// overlays ask of it.
pub trait PointerTarget {
    /// Whether this target is the element with id `region` or one of its
    /// descendants.
    fn is_within(&self, region: &str) -> bool;
}

/// A pointer-down event as seen by listeners. A missing target (detached
/// node, non-element target) counts as outside every region.
#[derive(Clone, Copy)]
pub struct PointerDown<'a> {
    target: Option<&'a dyn PointerTarget>,
}

impl<'a> PointerDown<'a> {
    pub fn new(target: &'a dyn PointerTarget) -> Self {
        Self {
            target: Some(target),
        }
    }

    pub fn without_target() -> Self {
        Self { target: None }
    }

    pub fn is_within(&self, region: &str) -> bool {
        self.target.is_some_and(|target| target.is_within(region))
    }
}

impl fmt::Debug for PointerDown<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PointerDown")
            .field("has_target", &self.target.is_some())
            .finish()
    }
}

/// Chain of element ids from the event target up to the document root.
/// Used by tests and by the shell when it has already walked the ancestors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementPath {
    ids: Vec<String>,
}

impl ElementPath {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }
}

impl PointerTarget for ElementPath {
    fn is_within(&self, region: &str) -> bool {
        self.ids.iter().any(|id| id == region)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ListenerError {
    #[error("no document context is available for pointer listeners")]
    NoDocument,
}

type Handler = Rc<RefCell<dyn FnMut(&PointerDown<'_>)>>;

struct Registered {
    id: u64,
    handler: Handler,
}

#[derive(Default)]
struct HubInner {
    listeners: RefCell<Vec<Registered>>,
    next_id: Cell<u64>,
}

#[derive(Clone)]
pub struct PointerEventHub {
    inner: Option<Rc<HubInner>>,
}

impl PointerEventHub {
    pub fn new() -> Self {
        Self {
            inner: Some(Rc::new(HubInner::default())),
        }
    }

    /// A hub with no document behind it, as during server rendering or when
    /// the shell failed to attach its document listener. Every `listen`
    /// call fails with [`ListenerError::NoDocument`].
    pub fn unavailable() -> Self {
        Self { inner: None }
    }

    pub fn is_available(&self) -> bool {
        self.inner.is_some()
    }

    pub fn listen(
        &self,
        handler: impl FnMut(&PointerDown<'_>) + 'static,
    ) -> Result<ListenerGuard, ListenerError> {
        let inner = self.inner.as_ref().ok_or(ListenerError::NoDocument)?;
        let id = inner.next_id.get().saturating_add(1);
        inner.next_id.set(id);
        let handler: Handler = Rc::new(RefCell::new(handler));
        inner.listeners.borrow_mut().push(Registered { id, handler });
        Ok(ListenerGuard {
            hub: Rc::downgrade(inner),
            id,
        })
    }

    /// Delivers `event` to every registered listener and returns how many
    /// received it. Listeners removed by an earlier handler in the same
    /// dispatch are skipped.
    pub fn dispatch(&self, event: &PointerDown<'_>) -> usize {
        let Some(inner) = &self.inner else {
            return 0;
        };
        let snapshot: Vec<(u64, Handler)> = inner
            .listeners
            .borrow()
            .iter()
            .map(|registered| (registered.id, Rc::clone(&registered.handler)))
            .collect();

        let mut delivered = 0;
        for (id, handler) in snapshot {
            let still_registered = inner
                .listeners
                .borrow()
                .iter()
                .any(|registered| registered.id == id);
            if !still_registered {
                continue;
            }
            if let Ok(mut handler) = handler.try_borrow_mut() {
                (&mut *handler)(event);
                delivered += 1;
            }
        }
        delivered
    }

    pub fn listener_count(&self) -> usize {
        self.inner
            .as_ref()
            .map_or(0, |inner| inner.listeners.borrow().len())
    }
}

impl Default for PointerEventHub {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PointerEventHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PointerEventHub")
            .field("available", &self.is_available())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Registration handle. The listener stays registered exactly as long as the
/// guard is alive.
#[must_use = "dropping the guard deregisters the listener"]
pub struct ListenerGuard {
    hub: Weak<HubInner>,
    id: u64,
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.listeners
                .borrow_mut()
                .retain(|registered| registered.id != self.id);
        }
    }
}

impl fmt::Debug for ListenerGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerGuard")
            .field("id", &self.id)
            .finish()
    }
}
