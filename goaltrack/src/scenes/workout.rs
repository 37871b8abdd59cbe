//! Workout screen: runs one [`WorkoutSession`] for a catalog item.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::{debug, info, warn};

use crate::model::{format_elapsed, ActivityKind, Item, SessionState, Workout, WorkoutSession};
use crate::navigation::{DelegateHandle, ScreenController};
use crate::services::{Services, TimerToken, TrackingToken};

#[derive(Debug, Clone, PartialEq)]
pub enum WorkoutEvent {
    Finished { item: Item, workout: Workout },
    Cancelled,
}

/// The item being worked towards and its session.
#[derive(Debug, Clone)]
pub struct WorkoutViewModel {
    item: Item,
    session: WorkoutSession,
}

impl WorkoutViewModel {
    pub fn new(item: Item) -> Self {
        Self {
            item,
            session: WorkoutSession::new(),
        }
    }

    pub fn item(&self) -> &Item {
        &self.item
    }

    pub fn session(&self) -> &WorkoutSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut WorkoutSession {
        &mut self.session
    }

    pub fn activity(&self) -> ActivityKind {
        self.item.kind.workout_activity()
    }

    pub fn tracks_distance(&self) -> bool {
        self.item.kind.is_distance()
    }
}

pub struct WorkoutScreen {
    me: Weak<RefCell<WorkoutScreen>>,
    services: Services,
    delegate: DelegateHandle<WorkoutEvent>,
    view_model: WorkoutViewModel,
    elapsed_label: String,
    timer: Option<TimerToken>,
    tracking: Option<TrackingToken>,
}

impl WorkoutScreen {
    pub fn new(
        services: Services,
        delegate: DelegateHandle<WorkoutEvent>,
        view_model: WorkoutViewModel,
    ) -> Rc<RefCell<Self>> {
        Rc::new_cyclic(|me| {
            RefCell::new(Self {
                me: me.clone(),
                services,
                delegate,
                view_model,
                elapsed_label: format_elapsed(chrono::Duration::zero()),
                timer: None,
                tracking: None,
            })
        })
    }

    pub fn view_model(&self) -> &WorkoutViewModel {
        &self.view_model
    }

    /// `HH:MM:SS` since the session started.
    pub fn elapsed_label(&self) -> &str {
        &self.elapsed_label
    }

    pub fn is_ticking(&self) -> bool {
        self.timer.is_some()
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking.is_some()
    }

    fn begin(&mut self) {
        let now = self.services.clock.now();
        if let Err(e) = self.view_model.session.start_at(now) {
            warn!("[WorkoutScreen] {}", e);
            return;
        }
        info!(
            "[WorkoutScreen] Started {} workout for '{}'",
            self.view_model.item.kind, self.view_model.item.title
        );
        self.tick();

        let me = self.me.clone();
        let ticks = self.services.queue.notifier(move |()| {
            if let Some(screen) = me.upgrade() {
                screen.borrow_mut().tick();
            }
        });
        self.timer = Some(
            self.services
                .ticker
                .schedule(self.services.config.tick_interval(), ticks),
        );

        if self.view_model.tracks_distance() {
            let me = self.me.clone();
            let updates = self.services.queue.notifier(move |meters: f64| {
                if let Some(screen) = me.upgrade() {
                    screen.borrow_mut().view_model.session.update_distance(meters);
                }
            });
            self.tracking = Some(self.services.location.start_updates(updates));
        }
    }

    /// Refresh the elapsed-time label.
    pub fn tick(&mut self) {
        let now = self.services.clock.now();
        self.elapsed_label = format_elapsed(self.view_model.session.elapsed(now));
    }

    fn stop_updates(&mut self) {
        if let Some(timer) = self.timer.take() {
            self.services.ticker.invalidate(timer);
        }
        if let Some(tracking) = self.tracking.take() {
            self.services.location.stop_updates(tracking);
        }
    }

    /// User finished: close the session and hand the workout over.
    pub fn finish(&mut self) {
        self.stop_updates();
        let now = self.services.clock.now();
        if let Err(e) = self.view_model.session.end_at(now, None) {
            warn!("[WorkoutScreen] {}", e);
            return;
        }
        self.tick();
        match self.view_model.session.complete_workout() {
            Some(workout) => {
                info!(
                    "[WorkoutScreen] Finished: {}s, {:.0}m, {:.1} kcal",
                    workout.duration().num_seconds(),
                    workout.distance(),
                    workout.energy_burned()
                );
                self.delegate.send(WorkoutEvent::Finished {
                    item: self.view_model.item.clone(),
                    workout,
                });
            }
            None => warn!("[WorkoutScreen] Session ended without a workout"),
        }
    }

    /// User abandoned the workout; nothing is saved.
    pub fn cancel(&mut self) {
        self.stop_updates();
        self.view_model.session.clear();
        self.delegate.send(WorkoutEvent::Cancelled);
    }
}

impl ScreenController for WorkoutScreen {
    fn did_appear(&mut self) {
        if self.view_model.session.state() == SessionState::NotStarted {
            self.begin();
        } else {
            debug!("[WorkoutScreen] Reappeared, session {}", self.view_model.session.state());
        }
    }

    fn did_disappear(&mut self) {
        self.stop_updates();
    }
}
