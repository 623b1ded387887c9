//! Observable single-writer cells.
//!
//! A cell is created as a `(CellWriter, CellReader)` pair. The writer is not
//! `Clone`, so whoever holds it is the only component able to change the
//! value; readers can be cloned freely and subscribe to changes.
//! Subscribers run synchronously, in registration order, on every change.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

type Callback<T> = Rc<RefCell<dyn FnMut(&T)>>;

struct Subscriber<T> {
    id: u64,
    callback: Callback<T>,
}

struct Shared<T> {
    value: RefCell<T>,
    subscribers: RefCell<Vec<Subscriber<T>>>,
    next_id: Cell<u64>,
}

impl<T> Shared<T> {
    fn remove(&self, id: u64) {
        self.subscribers
            .borrow_mut()
            .retain(|subscriber| subscriber.id != id);
    }
}

pub fn reactive_cell<T>(initial: T) -> (CellWriter<T>, CellReader<T>)
where
    T: Clone + PartialEq + 'static,
{
    let shared = Rc::new(Shared {
        value: RefCell::new(initial),
        subscribers: RefCell::new(Vec::new()),
        next_id: Cell::new(1),
    });
    (
        CellWriter {
            shared: Rc::clone(&shared),
        },
        CellReader { shared },
    )
}

pub struct CellWriter<T> {
    shared: Rc<Shared<T>>,
}

impl<T> CellWriter<T>
where
    T: Clone + PartialEq + 'static,
{
    pub fn get(&self) -> T {
        self.shared.value.borrow().clone()
    }

    /// Replaces the value and notifies subscribers. Returns `false` (and
    /// notifies nobody) when the new value equals the current one.
    pub fn set(&self, value: T) -> bool {
        {
            let mut current = self.shared.value.borrow_mut();
            if *current == value {
                return false;
            }
            *current = value.clone();
        }

        let callbacks: Vec<Callback<T>> = self
            .shared
            .subscribers
            .borrow()
            .iter()
            .map(|subscriber| Rc::clone(&subscriber.callback))
            .collect();

        for callback in callbacks {
            // A subscriber that writes back into the cell it is observing
            // would re-enter itself; the nested notification skips it.
            if let Ok(mut callback) = callback.try_borrow_mut() {
                (&mut *callback)(&value);
            } else {
                tracing::debug!("skipping re-entrant cell subscriber");
            }
        }
        true
    }

    pub fn reader(&self) -> CellReader<T> {
        CellReader {
            shared: Rc::clone(&self.shared),
        }
    }

    /// Drops every subscriber. Used as a teardown hook between tests and
    /// when a shell is torn down.
    pub fn clear_subscribers(&self) {
        self.shared.subscribers.borrow_mut().clear();
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.subscribers.borrow().len()
    }
}

impl<T: fmt::Debug> fmt::Debug for CellWriter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellWriter")
            .field("value", &*self.shared.value.borrow())
            .finish_non_exhaustive()
    }
}

pub struct CellReader<T> {
    shared: Rc<Shared<T>>,
}

impl<T> Clone for CellReader<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<T> CellReader<T>
where
    T: Clone + PartialEq + 'static,
{
    pub fn get(&self) -> T {
        self.shared.value.borrow().clone()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.shared.value.borrow())
    }

    pub fn subscribe(&self, callback: impl FnMut(&T) + 'static) -> Subscription {
        let id = self.shared.next_id.get();
        self.shared.next_id.set(id.saturating_add(1));
        let callback: Callback<T> = Rc::new(RefCell::new(callback));
        self.shared
            .subscribers
            .borrow_mut()
            .push(Subscriber { id, callback });

        let weak: Weak<Shared<T>> = Rc::downgrade(&self.shared);
        Subscription::new(move || {
            if let Some(shared) = weak.upgrade() {
                shared.remove(id);
            }
        })
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.subscribers.borrow().len()
    }
}

impl<T: fmt::Debug> fmt::Debug for CellReader<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellReader")
            .field("value", &*self.shared.value.borrow())
            .finish_non_exhaustive()
    }
}

/// Handle returned by [`CellReader::subscribe`]. Dropping it unsubscribes.
#[must_use = "dropping a subscription unsubscribes immediately"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub(crate) fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    pub fn cancel(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}
