//! # Navigation
//!
//! Headless presentation surface and the routers that drive it.
//!
//! - [`Window`]: what is on screen (root content, navigation stacks, one
//!   modal layer) and the appearance/removal notifications it emits
//! - [`Router`]: present/dismiss a [`Screen`] without the caller knowing the
//!   presentation style
//! - [`Delegate`]/[`DelegateHandle`]: typed screen-to-coordinator events,
//!   always delivered on a later main-queue turn

pub mod router;
pub mod window;

pub use router::{
    DismissCallbacks, ModalRouter, NavigationRouter, OnDismissed, RootRouter, Router,
    RouterFactory, WindowRouterFactory,
};
pub use window::{StackId, Window};

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, warn};

use crate::runtime::MainQueue;

static NEXT_SCREEN_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a presented screen. Never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScreenId(u64);

impl ScreenId {
    pub fn next() -> Self {
        ScreenId(NEXT_SCREEN_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneKind {
    Launch,
    Goals,
    Error,
    Profile,
    Workout,
}

/// Lifecycle hooks called by the [`Window`] on the main queue.
pub trait ScreenController {
    fn did_appear(&mut self) {}
    fn did_disappear(&mut self) {}
}

/// A presentable screen: identity, kind and its controller.
#[derive(Clone)]
pub struct Screen {
    id: ScreenId,
    kind: SceneKind,
    controller: Rc<RefCell<dyn ScreenController>>,
}

impl Screen {
    pub fn new(kind: SceneKind, controller: Rc<RefCell<dyn ScreenController>>) -> Self {
        Self {
            id: ScreenId::next(),
            kind,
            controller,
        }
    }

    pub fn id(&self) -> ScreenId {
        self.id
    }

    pub fn kind(&self) -> SceneKind {
        self.kind
    }

    pub(crate) fn appear(&self) {
        match self.controller.try_borrow_mut() {
            Ok(mut controller) => controller.did_appear(),
            Err(_) => warn!("[Screen] {:?} {:?} busy, did_appear skipped", self.kind, self.id),
        }
    }

    pub(crate) fn disappear(&self) {
        match self.controller.try_borrow_mut() {
            Ok(mut controller) => controller.did_disappear(),
            Err(_) => warn!("[Screen] {:?} {:?} busy, did_disappear skipped", self.kind, self.id),
        }
    }
}

impl fmt::Debug for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Screen")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish()
    }
}

// ============================================================================
// Delegates
// ============================================================================

/// Receiver for one screen's events.
pub trait Delegate<E> {
    fn handle(&self, event: E);
}

/// Weak, queue-deferred link from a screen to its delegate.
pub struct DelegateHandle<E> {
    queue: MainQueue,
    target: Option<Weak<dyn Delegate<E>>>,
}

impl<E> Clone for DelegateHandle<E> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            target: self.target.clone(),
        }
    }
}

impl<E: fmt::Debug + 'static> DelegateHandle<E> {
    pub fn new(queue: MainQueue, target: Weak<dyn Delegate<E>>) -> Self {
        Self {
            queue,
            target: Some(target),
        }
    }

    /// Handle whose events go nowhere.
    pub fn detached(queue: MainQueue) -> Self {
        Self {
            queue,
            target: None,
        }
    }

    /// Deliver `event` on the next main-queue turn, if the delegate still exists.
    pub fn send(&self, event: E) {
        let Some(target) = self.target.clone() else {
            debug!("[Delegate] No delegate for {:?}", event);
            return;
        };
        self.queue.post(move || match target.upgrade() {
            Some(delegate) => delegate.handle(event),
            None => debug!("[Delegate] Delegate released, dropping {:?}", event),
        });
    }
}
