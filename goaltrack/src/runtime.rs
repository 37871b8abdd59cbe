//! # Main queue
//!
//! Single-threaded task queue standing in for the UI run loop.
//!
//! Everything that touches screens, routers or the coordinator runs on the
//! thread that owns the [`MainQueue`]. Background work (network, health
//! queries, location, connectivity) reports back through a [`Completion`] or
//! [`Notifier`], both `Send`, whose continuations run on a later turn of the
//! queue. Screen state is `Rc`/`RefCell` based, so the compiler rejects any
//! attempt to touch it from a background thread directly.
//!
//! One [`MainQueue::turn`] runs the tasks that were queued when the turn
//! began, then delivers every result that arrived from other threads. Tasks
//! posted during a turn wait for the next one.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use log::{trace, warn};

/// Upper bound for [`MainQueue::run_until_idle`].
const MAX_IDLE_TURNS: usize = 10_000;

type Task = Box<dyn FnOnce()>;
type Payload = Box<dyn Any + Send>;

enum Continuation {
    Once(Box<dyn FnOnce(Payload)>),
    Repeat(Rc<RefCell<dyn FnMut(Payload)>>),
}

enum Inbound {
    Deliver(u64, Payload),
    Release(u64),
}

struct QueueInner {
    tasks: RefCell<VecDeque<Task>>,
    continuations: RefCell<HashMap<u64, Continuation>>,
    next_id: Cell<u64>,
    running: Cell<bool>,
    sender: Sender<Inbound>,
    receiver: Receiver<Inbound>,
}

/// Handle to the UI-thread queue. Clones share the same queue.
#[derive(Clone)]
pub struct MainQueue {
    inner: Rc<QueueInner>,
}

impl Default for MainQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl MainQueue {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            inner: Rc::new(QueueInner {
                tasks: RefCell::new(VecDeque::new()),
                continuations: RefCell::new(HashMap::new()),
                next_id: Cell::new(1),
                running: Cell::new(false),
                sender,
                receiver,
            }),
        }
    }

    /// Schedule `task` for the next turn.
    pub fn post(&self, task: impl FnOnce() + 'static) {
        self.inner.tasks.borrow_mut().push_back(Box::new(task));
    }

    /// Number of tasks waiting for the next turn.
    pub fn pending(&self) -> usize {
        self.inner.tasks.borrow().len()
    }

    /// Register a one-shot continuation and hand out its `Send` trigger.
    pub fn completion<T, F>(&self, on_complete: F) -> Completion<T>
    where
        T: Send + 'static,
        F: FnOnce(T) + 'static,
    {
        let id = self.register(Continuation::Once(Box::new(move |payload: Payload| {
            match payload.downcast::<T>() {
                Ok(value) => on_complete(*value),
                Err(_) => warn!("[MainQueue] Completion received a value of the wrong type"),
            }
        })));
        Completion {
            id,
            sender: Some(self.inner.sender.clone()),
            _value: PhantomData,
        }
    }

    /// Register a repeating continuation. It is released once every clone of
    /// the returned notifier has been dropped.
    pub fn notifier<T, F>(&self, mut on_value: F) -> Notifier<T>
    where
        T: Send + 'static,
        F: FnMut(T) + 'static,
    {
        let handler: Rc<RefCell<dyn FnMut(Payload)>> =
            Rc::new(RefCell::new(move |payload: Payload| {
                match payload.downcast::<T>() {
                    Ok(value) => on_value(*value),
                    Err(_) => warn!("[MainQueue] Notifier received a value of the wrong type"),
                }
            }));
        let id = self.register(Continuation::Repeat(handler));
        Notifier {
            token: Arc::new(NotifierToken {
                id,
                sender: Mutex::new(self.inner.sender.clone()),
            }),
            _value: PhantomData,
        }
    }

    /// Number of continuations still waiting for a value.
    pub fn outstanding(&self) -> usize {
        self.inner.continuations.borrow().len()
    }

    fn register(&self, continuation: Continuation) -> u64 {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner
            .continuations
            .borrow_mut()
            .insert(id, continuation);
        id
    }

    /// Run one turn. Returns how many tasks and deliveries were processed.
    pub fn turn(&self) -> usize {
        if self.inner.running.replace(true) {
            warn!("[MainQueue] Nested turn ignored");
            return 0;
        }
        let _guard = TurnGuard(&self.inner.running);

        let batch: Vec<Task> = self.inner.tasks.borrow_mut().drain(..).collect();
        let mut processed = batch.len();
        for task in batch {
            task();
        }

        while let Ok(message) = self.inner.receiver.try_recv() {
            processed += 1;
            self.dispatch(message);
        }
        processed
    }

    /// Turn until nothing is left to do. Returns the number of turns taken.
    pub fn run_until_idle(&self) -> usize {
        for turns in 0..MAX_IDLE_TURNS {
            if self.turn() == 0 {
                return turns;
            }
        }
        warn!(
            "[MainQueue] Still busy after {} turns, giving up",
            MAX_IDLE_TURNS
        );
        MAX_IDLE_TURNS
    }

    fn dispatch(&self, message: Inbound) {
        match message {
            Inbound::Deliver(id, payload) => {
                let entry = self.inner.continuations.borrow_mut().remove(&id);
                match entry {
                    Some(Continuation::Once(callback)) => callback(payload),
                    Some(Continuation::Repeat(handler)) => {
                        self.inner
                            .continuations
                            .borrow_mut()
                            .insert(id, Continuation::Repeat(Rc::clone(&handler)));
                        match handler.try_borrow_mut() {
                            Ok(mut callback) => (&mut *callback)(payload),
                            Err(_) => warn!("[MainQueue] Notifier {} re-entered, value dropped", id),
                        }
                    }
                    None => trace!("[MainQueue] Dropping value for released continuation {}", id),
                }
            }
            Inbound::Release(id) => {
                self.inner.continuations.borrow_mut().remove(&id);
            }
        }
    }
}

struct TurnGuard<'a>(&'a Cell<bool>);

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

// ============================================================================
// Completion / Notifier
// ============================================================================

/// One-shot result channel back to the main queue.
///
/// Dropping it without calling [`Completion::complete`] releases the
/// continuation on the next turn.
pub struct Completion<T> {
    id: u64,
    sender: Option<Sender<Inbound>>,
    _value: PhantomData<fn(T)>,
}

impl<T: Send + 'static> Completion<T> {
    pub fn complete(mut self, value: T) {
        if let Some(sender) = self.sender.take() {
            if sender.send(Inbound::Deliver(self.id, Box::new(value))).is_err() {
                trace!("[MainQueue] Queue gone, completion {} dropped", self.id);
            }
        }
    }
}

impl<T> Drop for Completion<T> {
    fn drop(&mut self) {
        if let Some(sender) = self.sender.take() {
            let _ = sender.send(Inbound::Release(self.id));
        }
    }
}

struct NotifierToken {
    id: u64,
    sender: Mutex<Sender<Inbound>>,
}

impl Drop for NotifierToken {
    fn drop(&mut self) {
        if let Ok(sender) = self.sender.lock() {
            let _ = sender.send(Inbound::Release(self.id));
        }
    }
}

/// Repeating value channel back to the main queue.
pub struct Notifier<T> {
    token: Arc<NotifierToken>,
    _value: PhantomData<fn(T)>,
}

impl<T> Clone for Notifier<T> {
    fn clone(&self) -> Self {
        Self {
            token: Arc::clone(&self.token),
            _value: PhantomData,
        }
    }
}

impl<T: Send + 'static> Notifier<T> {
    pub fn notify(&self, value: T) {
        let sent = match self.token.sender.lock() {
            Ok(sender) => sender
                .send(Inbound::Deliver(self.token.id, Box::new(value)))
                .is_ok(),
            Err(_) => false,
        };
        if !sent {
            trace!("[MainQueue] Queue gone, notification {} dropped", self.token.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_posted_tasks_run_next_turn() {
        let queue = MainQueue::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let l = log.clone();
        let q = queue.clone();
        queue.post(move || {
            l.borrow_mut().push(1);
            let l2 = l.clone();
            q.post(move || l2.borrow_mut().push(2));
        });

        assert_eq!(queue.turn(), 1);
        assert_eq!(*log.borrow(), vec![1]);
        assert_eq!(queue.turn(), 1);
        assert_eq!(*log.borrow(), vec![1, 2]);
        assert_eq!(queue.turn(), 0);
    }

    #[test]
    fn test_completion_from_background_thread() {
        let queue = MainQueue::new();
        let result = Rc::new(Cell::new(0));
        let r = result.clone();
        let completion = queue.completion(move |value: u32| r.set(value));

        thread::spawn(move || completion.complete(42))
            .join()
            .unwrap();

        assert_eq!(result.get(), 0);
        queue.run_until_idle();
        assert_eq!(result.get(), 42);
        assert_eq!(queue.outstanding(), 0);
    }

    #[test]
    fn test_dropped_completion_releases_continuation() {
        let queue = MainQueue::new();
        let completion = queue.completion(|_: ()| {});
        assert_eq!(queue.outstanding(), 1);
        drop(completion);
        queue.run_until_idle();
        assert_eq!(queue.outstanding(), 0);
    }

    #[test]
    fn test_notifier_repeats_until_dropped() {
        let queue = MainQueue::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let notifier = queue.notifier(move |value: f64| s.borrow_mut().push(value));
        let other = notifier.clone();

        notifier.notify(1.0);
        other.notify(2.0);
        queue.turn();
        assert_eq!(*seen.borrow(), vec![1.0, 2.0]);

        drop(notifier);
        other.notify(3.0);
        queue.turn();
        assert_eq!(queue.outstanding(), 1);

        drop(other);
        queue.turn();
        assert_eq!(queue.outstanding(), 0);
        assert_eq!(seen.borrow().len(), 3);
    }

    #[test]
    fn test_nested_turn_is_ignored() {
        let queue = MainQueue::new();
        let q = queue.clone();
        let nested = Rc::new(Cell::new(usize::MAX));
        let n = nested.clone();
        queue.post(move || n.set(q.turn()));
        queue.turn();
        assert_eq!(nested.get(), 0);
    }
}
