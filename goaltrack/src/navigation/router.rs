//! Routers: one `{present, dismiss}` capability over three presentation styles.
//!
//! | router               | present                                | dismiss                        |
//! |----------------------|----------------------------------------|--------------------------------|
//! | [`RootRouter`]       | replaces the window content            | no-op                          |
//! | [`ModalRouter`]      | first shows a modal stack, then pushes | closes the whole modal stack   |
//! | [`NavigationRouter`] | pushes                                 | pops back to the recorded root |
//!
//! `on_dismissed` callbacks fire when the window reports the screen removed
//! from the router's stack, so user back-navigation is covered too. They run
//! on a later main-queue turn and at most once per screen.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, info, warn};

use super::window::{StackId, Window};
use super::{Screen, ScreenId};

/// Called once when a presented screen leaves its router's stack.
pub type OnDismissed = Box<dyn FnOnce()>;

pub trait Router {
    fn present(&self, screen: Screen, animated: bool, on_dismissed: Option<OnDismissed>);
    fn dismiss(&self, animated: bool);

    fn present_screen(&self, screen: Screen, animated: bool) {
        self.present(screen, animated, None);
    }
}

/// Registered `on_dismissed` callbacks keyed by screen.
#[derive(Default)]
pub struct DismissCallbacks {
    callbacks: RefCell<HashMap<ScreenId, OnDismissed>>,
}

impl DismissCallbacks {
    pub fn register(&self, screen: ScreenId, callback: Option<OnDismissed>) {
        if let Some(callback) = callback {
            self.callbacks.borrow_mut().insert(screen, callback);
        }
    }

    /// Run and forget the callback for `screen`. Returns whether one ran.
    pub fn fire(&self, screen: ScreenId) -> bool {
        let callback = self.callbacks.borrow_mut().remove(&screen);
        match callback {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.callbacks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn observe(window: &Window, stack: StackId, callbacks: &Rc<DismissCallbacks>) {
    let callbacks = Rc::clone(callbacks);
    window.observe_stack(stack, move |screen| {
        callbacks.fire(screen.id());
    });
}

// ============================================================================
// Root
// ============================================================================

/// Replaces the whole window content. Cannot be dismissed.
pub struct RootRouter {
    window: Window,
}

impl RootRouter {
    pub fn new(window: &Window) -> Self {
        Self {
            window: window.clone(),
        }
    }
}

impl Router for RootRouter {
    fn present(&self, screen: Screen, _animated: bool, on_dismissed: Option<OnDismissed>) {
        if on_dismissed.is_some() {
            debug!("[RootRouter] Root screens are never dismissed, callback dropped");
        }
        self.window.set_root(screen);
    }

    fn dismiss(&self, _animated: bool) {}
}

// ============================================================================
// Navigation
// ============================================================================

/// Pushes onto a persistent stack; dismiss returns to the recorded root.
pub struct NavigationRouter {
    window: Window,
    stack: StackId,
    root: Option<ScreenId>,
    callbacks: Rc<DismissCallbacks>,
}

impl NavigationRouter {
    /// New empty stack installed as the window content. No recorded root.
    pub fn new(window: &Window) -> Self {
        let stack = window.create_stack();
        window.set_root_stack(stack);
        Self::with_stack(window, stack)
    }

    /// Drive an existing stack; its current bottom screen is the root.
    pub fn with_stack(window: &Window, stack: StackId) -> Self {
        let root = window.stack_ids(stack).first().copied();
        let callbacks = Rc::new(DismissCallbacks::default());
        observe(window, stack, &callbacks);
        Self {
            window: window.clone(),
            stack,
            root,
            callbacks,
        }
    }

    pub fn stack(&self) -> StackId {
        self.stack
    }

    /// User-initiated back navigation.
    pub fn pop(&self, _animated: bool) -> Option<Screen> {
        self.window.pop(self.stack)
    }
}

impl Router for NavigationRouter {
    fn present(&self, screen: Screen, _animated: bool, on_dismissed: Option<OnDismissed>) {
        self.callbacks.register(screen.id(), on_dismissed);
        self.window.push(self.stack, screen);
    }

    fn dismiss(&self, _animated: bool) {
        match self.root {
            Some(root) => {
                // The root stays in the stack, so the window never reports it.
                let callbacks = Rc::clone(&self.callbacks);
                self.window.queue().post(move || {
                    callbacks.fire(root);
                });
                self.window.pop_to(self.stack, root);
            }
            None => {
                self.window.pop_to_root(self.stack);
            }
        }
    }
}

// ============================================================================
// Modal
// ============================================================================

/// Presents a stack modally over `parent`; dismiss closes the whole stack.
pub struct ModalRouter {
    window: Window,
    parent: ScreenId,
    stack: StackId,
    callbacks: Rc<DismissCallbacks>,
}

impl ModalRouter {
    pub fn new(window: &Window, parent: &Screen) -> Self {
        let stack = window.create_stack();
        let callbacks = Rc::new(DismissCallbacks::default());
        observe(window, stack, &callbacks);
        Self {
            window: window.clone(),
            parent: parent.id(),
            stack,
            callbacks,
        }
    }

    pub fn stack(&self) -> StackId {
        self.stack
    }

    fn is_presented(&self) -> bool {
        self.window.presented_stack() == Some(self.stack)
    }
}

impl Router for ModalRouter {
    fn present(&self, screen: Screen, _animated: bool, on_dismissed: Option<OnDismissed>) {
        let (id, kind) = (screen.id(), screen.kind());
        self.callbacks.register(id, on_dismissed);
        let shown = if self.is_presented() {
            self.window.push(self.stack, screen)
        } else {
            info!("[ModalRouter] Presenting {:?} modally", kind);
            self.window.replace_stack(self.stack, vec![screen])
                && self.window.present(self.parent, self.stack)
        };
        if !shown {
            // Never shown counts as dismissed, so owners waiting on the
            // callback are released.
            warn!("[ModalRouter] {:?} could not be presented", kind);
            self.window.replace_stack(self.stack, Vec::new());
            let callbacks = Rc::clone(&self.callbacks);
            self.window.queue().post(move || {
                callbacks.fire(id);
            });
        }
    }

    fn dismiss(&self, _animated: bool) {
        if !self.window.dismiss_presented(self.stack) {
            debug!("[ModalRouter] Nothing presented, dismiss ignored");
        }
    }
}

// ============================================================================
// Factory
// ============================================================================

/// Source of routers for the coordinator. Replaceable in tests.
pub trait RouterFactory {
    fn navigation(&self) -> Rc<dyn Router>;
    fn modal(&self, parent: &Screen) -> Rc<dyn Router>;
}

pub struct WindowRouterFactory {
    window: Window,
}

impl WindowRouterFactory {
    pub fn new(window: &Window) -> Self {
        Self {
            window: window.clone(),
        }
    }
}

impl RouterFactory for WindowRouterFactory {
    fn navigation(&self) -> Rc<dyn Router> {
        Rc::new(NavigationRouter::new(&self.window))
    }

    fn modal(&self, parent: &Screen) -> Rc<dyn Router> {
        Rc::new(ModalRouter::new(&self.window, parent))
    }
}
