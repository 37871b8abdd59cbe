//! Network reachability, published to any number of subscribers.
//!
//! The platform path monitor lives on its own thread and reports through
//! [`ConnectivityMonitor::updater`]; subscribers are always called on the main
//! queue. Notifications are edge-triggered: repeating the current state is a
//! no-op.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use log::info;

use crate::runtime::{MainQueue, Notifier};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityChange {
    Connected,
    Disconnected,
}

type Listener = Rc<dyn Fn(ConnectivityChange)>;

struct MonitorInner {
    connected: Cell<bool>,
    listeners: RefCell<Vec<(u64, Listener)>>,
    next_id: Cell<u64>,
}

#[derive(Clone)]
pub struct ConnectivityMonitor {
    inner: Rc<MonitorInner>,
}

/// Keeps a listener registered. Dropping it unsubscribes.
pub struct Subscription {
    monitor: Weak<MonitorInner>,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.monitor.upgrade() {
            inner.listeners.borrow_mut().retain(|(id, _)| *id != self.id);
        }
    }
}

impl ConnectivityMonitor {
    pub fn new(connected: bool) -> Self {
        Self {
            inner: Rc::new(MonitorInner {
                connected: Cell::new(connected),
                listeners: RefCell::new(Vec::new()),
                next_id: Cell::new(1),
            }),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.inner.connected.get()
    }

    pub fn subscribe(&self, listener: impl Fn(ConnectivityChange) + 'static) -> Subscription {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner
            .listeners
            .borrow_mut()
            .push((id, Rc::new(listener)));
        Subscription {
            monitor: Rc::downgrade(&self.inner),
            id,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    /// Record the current path state, notifying listeners on a change.
    pub fn set_connected(&self, connected: bool) {
        if self.inner.connected.replace(connected) == connected {
            return;
        }
        let change = if connected {
            ConnectivityChange::Connected
        } else {
            ConnectivityChange::Disconnected
        };
        info!("[Connectivity] {:?}", change);

        // Listeners may unsubscribe (or subscribe) while being notified.
        let snapshot: Vec<(u64, Listener)> = self.inner.listeners.borrow().clone();
        for (id, listener) in snapshot {
            let still_subscribed = self
                .inner
                .listeners
                .borrow()
                .iter()
                .any(|(current, _)| *current == id);
            if still_subscribed {
                listener(change);
            }
        }
    }

    /// `Send` handle for a platform path monitor running off the main thread.
    pub fn updater(&self, queue: &MainQueue) -> Notifier<bool> {
        let monitor = self.clone();
        queue.notifier(move |connected: bool| monitor.set_connected(connected))
    }
}
