//! Headless window: root content, navigation stacks and one modal layer.
//!
//! Mutations update the model immediately. The resulting notifications are
//! posted as a single main-queue task per mutation, in this order:
//!
//! 1. the previously visible screen gets `did_disappear`
//! 2. every screen removed from an observed stack is reported to that stack's
//!    observers
//! 3. the newly visible screen gets `did_appear`

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, warn};

use super::{SceneKind, Screen, ScreenId};
use crate::runtime::MainQueue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StackId(u64);

type RemovalObserver = Rc<dyn Fn(&Screen)>;

enum RootContent {
    Empty,
    Screen(Screen),
    Stack(StackId),
}

struct Presented {
    parent: ScreenId,
    stack: StackId,
}

struct WindowState {
    root: RootContent,
    stacks: HashMap<StackId, Vec<Screen>>,
    observers: HashMap<StackId, Vec<RemovalObserver>>,
    presented: Option<Presented>,
    /// Visible screen as of the last commit.
    visible: Option<Screen>,
    next_stack: u64,
    presentations: usize,
}

impl WindowState {
    fn compute_visible(&self) -> Option<Screen> {
        if let Some(presented) = &self.presented {
            if let Some(top) = self.stacks.get(&presented.stack).and_then(|s| s.last()) {
                return Some(top.clone());
            }
        }
        match &self.root {
            RootContent::Empty => None,
            RootContent::Screen(screen) => Some(screen.clone()),
            RootContent::Stack(stack) => self.stacks.get(stack).and_then(|s| s.last()).cloned(),
        }
    }

    /// Screens in the root content, the ones a modal may be parented on.
    fn in_root(&self, id: ScreenId) -> bool {
        match &self.root {
            RootContent::Empty => false,
            RootContent::Screen(screen) => screen.id() == id,
            RootContent::Stack(stack) => self
                .stacks
                .get(stack)
                .is_some_and(|screens| screens.iter().any(|s| s.id() == id)),
        }
    }

    /// Forget the root and modal layer entirely.
    fn clear_root(&mut self) {
        if let RootContent::Stack(stack) = std::mem::replace(&mut self.root, RootContent::Empty) {
            self.stacks.remove(&stack);
            self.observers.remove(&stack);
        }
        if let Some(presented) = self.presented.take() {
            self.stacks.remove(&presented.stack);
            self.observers.remove(&presented.stack);
        }
    }
}

/// Shared handle to the window. Clones refer to the same window.
#[derive(Clone)]
pub struct Window {
    queue: MainQueue,
    state: Rc<RefCell<WindowState>>,
}

impl Window {
    pub fn new(queue: MainQueue) -> Self {
        Self {
            queue,
            state: Rc::new(RefCell::new(WindowState {
                root: RootContent::Empty,
                stacks: HashMap::new(),
                observers: HashMap::new(),
                presented: None,
                visible: None,
                next_stack: 1,
                presentations: 0,
            })),
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn queue(&self) -> &MainQueue {
        &self.queue
    }

    /// Topmost visible screen.
    pub fn visible(&self) -> Option<Screen> {
        self.state.borrow().compute_visible()
    }

    pub fn visible_kind(&self) -> Option<SceneKind> {
        self.visible().map(|s| s.kind())
    }

    pub fn stack(&self, stack: StackId) -> Vec<Screen> {
        self.state
            .borrow()
            .stacks
            .get(&stack)
            .cloned()
            .unwrap_or_default()
    }

    pub fn stack_ids(&self, stack: StackId) -> Vec<ScreenId> {
        self.stack(stack).iter().map(Screen::id).collect()
    }

    pub fn root_stack(&self) -> Option<StackId> {
        match self.state.borrow().root {
            RootContent::Stack(stack) => Some(stack),
            _ => None,
        }
    }

    pub fn root_screen(&self) -> Option<Screen> {
        match &self.state.borrow().root {
            RootContent::Screen(screen) => Some(screen.clone()),
            _ => None,
        }
    }

    pub fn presented_stack(&self) -> Option<StackId> {
        self.state.borrow().presented.as_ref().map(|p| p.stack)
    }

    pub fn presented_parent(&self) -> Option<ScreenId> {
        self.state.borrow().presented.as_ref().map(|p| p.parent)
    }

    /// Number of successful modal presentations so far.
    pub fn presentations(&self) -> usize {
        self.state.borrow().presentations
    }

    // ========================================================================
    // Stacks
    // ========================================================================

    pub fn create_stack(&self) -> StackId {
        let mut state = self.state.borrow_mut();
        let stack = StackId(state.next_stack);
        state.next_stack += 1;
        state.stacks.insert(stack, Vec::new());
        stack
    }

    /// Report screens removed from `stack` to `observer`.
    pub fn observe_stack(&self, stack: StackId, observer: impl Fn(&Screen) + 'static) {
        self.state
            .borrow_mut()
            .observers
            .entry(stack)
            .or_default()
            .push(Rc::new(observer));
    }

    pub fn push(&self, stack: StackId, screen: Screen) -> bool {
        {
            let mut state = self.state.borrow_mut();
            let Some(screens) = state.stacks.get_mut(&stack) else {
                warn!("[Window] Push onto unknown stack {:?}", stack);
                return false;
            };
            debug!("[Window] Push {:?} onto {:?}", screen.kind(), stack);
            screens.push(screen);
        }
        self.commit(Vec::new());
        true
    }

    /// Pop the top screen. The bottom screen is never popped.
    pub fn pop(&self, stack: StackId) -> Option<Screen> {
        let popped = {
            let mut state = self.state.borrow_mut();
            let screens = state.stacks.get_mut(&stack)?;
            if screens.len() < 2 {
                return None;
            }
            screens.pop()?
        };
        self.commit(vec![(stack, popped.clone())]);
        Some(popped)
    }

    /// Pop everything above `target`. Returns the removed screens, top first.
    pub fn pop_to(&self, stack: StackId, target: ScreenId) -> Vec<Screen> {
        let removed = {
            let mut state = self.state.borrow_mut();
            let Some(screens) = state.stacks.get_mut(&stack) else {
                return Vec::new();
            };
            let Some(index) = screens.iter().position(|s| s.id() == target) else {
                warn!("[Window] {:?} is not in {:?}", target, stack);
                return Vec::new();
            };
            let mut removed = screens.split_off(index + 1);
            removed.reverse();
            removed
        };
        if !removed.is_empty() {
            self.commit(removed.iter().map(|s| (stack, s.clone())).collect());
        }
        removed
    }

    pub fn pop_to_root(&self, stack: StackId) -> Vec<Screen> {
        let bottom = self
            .state
            .borrow()
            .stacks
            .get(&stack)
            .and_then(|s| s.first())
            .map(Screen::id);
        match bottom {
            Some(bottom) => self.pop_to(stack, bottom),
            None => Vec::new(),
        }
    }

    /// Swap the stack's content. Screens not kept are reported as removed.
    pub fn replace_stack(&self, stack: StackId, screens: Vec<Screen>) -> bool {
        let removed = {
            let mut state = self.state.borrow_mut();
            let Some(current) = state.stacks.get_mut(&stack) else {
                warn!("[Window] Replace unknown stack {:?}", stack);
                return false;
            };
            let old = std::mem::replace(current, screens);
            let kept: Vec<ScreenId> = current.iter().map(Screen::id).collect();
            old.into_iter()
                .rev()
                .filter(|s| !kept.contains(&s.id()))
                .map(|s| (stack, s))
                .collect()
        };
        self.commit(removed);
        true
    }

    /// Pop the topmost stack: the modal one if shown, else the root stack.
    pub fn back(&self) -> Option<Screen> {
        let stack = self
            .presented_stack()
            .or_else(|| self.root_stack())?;
        self.pop(stack)
    }

    // ========================================================================
    // Root and modal layer
    // ========================================================================

    /// Show a single screen as the whole window content.
    pub fn set_root(&self, screen: Screen) {
        {
            let mut state = self.state.borrow_mut();
            debug!("[Window] Root screen {:?}", screen.kind());
            state.clear_root();
            state.root = RootContent::Screen(screen);
        }
        self.commit(Vec::new());
    }

    /// Show a navigation stack as the whole window content.
    pub fn set_root_stack(&self, stack: StackId) -> bool {
        {
            let mut state = self.state.borrow_mut();
            if !state.stacks.contains_key(&stack) {
                warn!("[Window] Unknown root stack {:?}", stack);
                return false;
            }
            if matches!(state.root, RootContent::Stack(current) if current == stack) {
                return true;
            }
            // Keep the new stack alive through clear_root.
            let screens = state.stacks.remove(&stack).unwrap_or_default();
            let observers = state.observers.remove(&stack);
            state.clear_root();
            state.stacks.insert(stack, screens);
            if let Some(observers) = observers {
                state.observers.insert(stack, observers);
            }
            debug!("[Window] Root stack {:?}", stack);
            state.root = RootContent::Stack(stack);
        }
        self.commit(Vec::new());
        true
    }

    /// Present `stack` modally over `parent`, which must be in the root content.
    pub fn present(&self, parent: ScreenId, stack: StackId) -> bool {
        {
            let mut state = self.state.borrow_mut();
            if state.presented.is_some() {
                warn!("[Window] Already presenting, ignoring {:?}", stack);
                return false;
            }
            if !state.in_root(parent) {
                warn!("[Window] Parent {:?} is not on screen", parent);
                return false;
            }
            if state.stacks.get(&stack).map_or(true, |s| s.is_empty()) {
                warn!("[Window] Refusing to present empty stack {:?}", stack);
                return false;
            }
            debug!("[Window] Present {:?} over {:?}", stack, parent);
            state.presented = Some(Presented { parent, stack });
            state.presentations += 1;
        }
        self.commit(Vec::new());
        true
    }

    /// Close the modal layer if it shows `stack`. Its screens are removed.
    pub fn dismiss_presented(&self, stack: StackId) -> bool {
        let removed = {
            let mut state = self.state.borrow_mut();
            if state.presented.as_ref().map(|p| p.stack) != Some(stack) {
                return false;
            }
            state.presented = None;
            let mut screens = state
                .stacks
                .get_mut(&stack)
                .map(std::mem::take)
                .unwrap_or_default();
            screens.reverse();
            debug!("[Window] Dismiss {:?} ({} screens)", stack, screens.len());
            screens
        };
        self.commit(removed.into_iter().map(|s| (stack, s)).collect());
        true
    }

    fn commit(&self, removed: Vec<(StackId, Screen)>) {
        let (old_visible, new_visible, notifications) = {
            let mut state = self.state.borrow_mut();
            let new_visible = state.compute_visible();
            let old_visible = std::mem::replace(&mut state.visible, new_visible.clone());
            let notifications: Vec<(RemovalObserver, Screen)> = removed
                .into_iter()
                .flat_map(|(stack, screen)| {
                    state
                        .observers
                        .get(&stack)
                        .into_iter()
                        .flatten()
                        .map(move |observer| (Rc::clone(observer), screen.clone()))
                        .collect::<Vec<_>>()
                })
                .collect();
            (old_visible, new_visible, notifications)
        };

        let changed = old_visible.as_ref().map(Screen::id) != new_visible.as_ref().map(Screen::id);
        if !changed && notifications.is_empty() {
            return;
        }
        self.queue.post(move || {
            if changed {
                if let Some(old) = &old_visible {
                    old.disappear();
                }
            }
            for (observer, screen) in &notifications {
                observer(screen);
            }
            if changed {
                if let Some(new) = &new_visible {
                    new.appear();
                }
            }
        });
    }
}
