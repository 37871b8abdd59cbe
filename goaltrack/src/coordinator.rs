//! # Home coordinator
//!
//! Single decision point mapping screen events to the next screen and router.
//!
//! ```text
//! start ──> Launch (root router)
//!   ShowGoals ──> Goals (navigation router, stack root)
//!     ShowError ──> Error (modal router over Goals)
//!       Dismiss ──> modal closed next turn, navigation router restored
//!     ShowProfile ──> Profile (push)
//!     StartWorkout ──> Workout (push)
//!       Finished ──> save to health store, back to Goals
//! ```
//!
//! Screens hold only a weak, queue-deferred [`DelegateHandle`] to the
//! coordinator; every event is handled on a later main-queue turn.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::{debug, info, warn};

use crate::error::Result;
use crate::model::{Goal, Item};
use crate::navigation::{
    Delegate, DelegateHandle, OnDismissed, Router, RouterFactory, SceneKind, Screen,
};
use crate::scenes::{
    ErrorContent, ErrorEvent, ErrorScreen, GoalsEvent, GoalsScreen, LaunchEvent, LaunchScreen,
    ProfileEvent, ProfileScreen, WorkoutEvent, WorkoutScreen, WorkoutViewModel,
};
use crate::services::Services;

struct GoalsSlot {
    screen: Screen,
    controller: Rc<RefCell<GoalsScreen>>,
}

struct ErrorSlot {
    router: Rc<dyn Router>,
    controller: Rc<RefCell<ErrorScreen>>,
}

pub struct HomeCoordinator {
    me: Weak<HomeCoordinator>,
    services: Services,
    routers: Rc<dyn RouterFactory>,
    router: RefCell<Rc<dyn Router>>,
    /// Router to restore once the error screen is gone.
    home_router: RefCell<Option<Rc<dyn Router>>>,
    goals: RefCell<Option<GoalsSlot>>,
    error: RefCell<Option<ErrorSlot>>,
    profile: RefCell<Option<Rc<RefCell<ProfileScreen>>>>,
    workout: RefCell<Option<Rc<RefCell<WorkoutScreen>>>>,
}

impl HomeCoordinator {
    pub fn new(
        services: Services,
        root_router: Rc<dyn Router>,
        routers: Rc<dyn RouterFactory>,
    ) -> Rc<Self> {
        Rc::new_cyclic(|me| Self {
            me: me.clone(),
            services,
            routers,
            router: RefCell::new(root_router),
            home_router: RefCell::new(None),
            goals: RefCell::new(None),
            error: RefCell::new(None),
            profile: RefCell::new(None),
            workout: RefCell::new(None),
        })
    }

    /// Present the launch screen on the root router.
    pub fn start(&self) {
        info!("[Coordinator] Starting");
        if self.services.config.reset_store_on_launch {
            match self.services.store.delete_all() {
                Ok(()) => info!("[Coordinator] Cleared persisted goals"),
                Err(e) => warn!("[Coordinator] Failed to clear persisted goals: {}", e),
            }
        }
        let launch = LaunchScreen::new(
            self.services.queue.clone(),
            self.services.health.clone(),
            self.delegate(),
        );
        let screen = Screen::new(SceneKind::Launch, Rc::new(RefCell::new(launch)));
        self.current_router().present(screen, false, None);
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn current_router(&self) -> Rc<dyn Router> {
        Rc::clone(&self.router.borrow())
    }

    pub fn goals_screen(&self) -> Option<Rc<RefCell<GoalsScreen>>> {
        self.goals.borrow().as_ref().map(|slot| slot.controller.clone())
    }

    pub fn error_screen(&self) -> Option<Rc<RefCell<ErrorScreen>>> {
        self.error.borrow().as_ref().map(|slot| slot.controller.clone())
    }

    pub fn profile_screen(&self) -> Option<Rc<RefCell<ProfileScreen>>> {
        self.profile.borrow().clone()
    }

    pub fn workout_screen(&self) -> Option<Rc<RefCell<WorkoutScreen>>> {
        self.workout.borrow().clone()
    }

    pub fn is_showing_error(&self) -> bool {
        self.error.borrow().is_some()
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    fn delegate<E: std::fmt::Debug + 'static>(&self) -> DelegateHandle<E>
    where
        HomeCoordinator: Delegate<E>,
    {
        let me: Weak<dyn Delegate<E>> = self.me.clone();
        DelegateHandle::new(self.services.queue.clone(), me)
    }

    fn animated(&self) -> bool {
        self.services.config.animate_transitions
    }

    /// Run `f` on the coordinator if it still exists.
    fn callback(&self, f: impl FnOnce(&HomeCoordinator) + 'static) -> OnDismissed {
        let me = self.me.clone();
        Box::new(move || match me.upgrade() {
            Some(coordinator) => f(&coordinator),
            None => debug!("[Coordinator] Released before dismiss callback"),
        })
    }

    fn show_goals(&self) {
        let cached = match self.services.store.load_persisted() {
            Ok(cached) => cached,
            Err(e) => {
                warn!("[Coordinator] Failed to load persisted goals: {}", e);
                None
            }
        };
        info!(
            "[Coordinator] Showing goals ({} cached)",
            cached.as_ref().map_or(0, |g: &Goal| g.items.len())
        );

        let controller = GoalsScreen::new(self.services.clone(), self.delegate(), cached);
        let screen = Screen::new(SceneKind::Goals, controller.clone());

        let navigation = self.routers.navigation();
        *self.router.borrow_mut() = navigation.clone();
        *self.home_router.borrow_mut() = Some(navigation.clone());
        *self.goals.borrow_mut() = Some(GoalsSlot {
            screen: screen.clone(),
            controller,
        });
        navigation.present(screen, self.animated(), None);
    }

    fn show_error(&self, content: ErrorContent) {
        if self.error.borrow().is_some() {
            debug!("[Coordinator] Error already shown, ignoring {:?}", content.details);
            return;
        }
        let Some(parent) = self.goals.borrow().as_ref().map(|slot| slot.screen.clone()) else {
            warn!("[Coordinator] No goals screen to present an error over");
            return;
        };
        info!("[Coordinator] Showing error: {}", content.details);

        let controller = Rc::new(RefCell::new(ErrorScreen::new(
            content,
            self.services.connectivity.clone(),
            self.delegate(),
        )));
        let screen = Screen::new(SceneKind::Error, controller.clone());
        let modal = self.routers.modal(&parent);

        *self.router.borrow_mut() = modal.clone();
        *self.error.borrow_mut() = Some(ErrorSlot {
            router: modal.clone(),
            controller,
        });
        let on_dismissed = self.callback(|coordinator| coordinator.error_dismissed());
        modal.present(screen, self.animated(), Some(on_dismissed));
    }

    fn error_dismissed(&self) {
        info!("[Coordinator] Error dismissed, restoring home router");
        self.error.borrow_mut().take();
        if let Some(home) = self.home_router.borrow().clone() {
            *self.router.borrow_mut() = home;
        }
    }

    fn show_profile(&self) {
        let controller = ProfileScreen::new(self.services.clone(), self.delegate());
        let screen = Screen::new(SceneKind::Profile, controller.clone());
        *self.profile.borrow_mut() = Some(controller);
        let on_dismissed = self.callback(|coordinator| {
            coordinator.profile.borrow_mut().take();
        });
        self.current_router()
            .present(screen, self.animated(), Some(on_dismissed));
    }

    fn start_workout(&self, item: Item) {
        info!("[Coordinator] Starting workout for '{}'", item.id);
        let controller = WorkoutScreen::new(
            self.services.clone(),
            self.delegate(),
            WorkoutViewModel::new(item),
        );
        let screen = Screen::new(SceneKind::Workout, controller.clone());
        *self.workout.borrow_mut() = Some(controller);
        let on_dismissed = self.callback(|coordinator| {
            coordinator.workout.borrow_mut().take();
        });
        self.current_router()
            .present(screen, self.animated(), Some(on_dismissed));
    }
}

impl Delegate<LaunchEvent> for HomeCoordinator {
    fn handle(&self, event: LaunchEvent) {
        match event {
            LaunchEvent::ShowGoals => self.show_goals(),
        }
    }
}

impl Delegate<GoalsEvent> for HomeCoordinator {
    fn handle(&self, event: GoalsEvent) {
        match event {
            GoalsEvent::ShowError(content) => self.show_error(content),
            GoalsEvent::ShowProfile => self.show_profile(),
            GoalsEvent::StartWorkout(item) => self.start_workout(item),
        }
    }
}

impl Delegate<ErrorEvent> for HomeCoordinator {
    fn handle(&self, event: ErrorEvent) {
        match event {
            ErrorEvent::Dismiss => {
                let Some(router) = self.error.borrow().as_ref().map(|slot| slot.router.clone())
                else {
                    debug!("[Coordinator] No error shown, dismiss ignored");
                    return;
                };
                // Leave the current turn before tearing the modal down.
                let animated = self.animated();
                self.services.queue.post(move || router.dismiss(animated));
            }
        }
    }
}

impl Delegate<ProfileEvent> for HomeCoordinator {
    fn handle(&self, event: ProfileEvent) {
        match event {
            ProfileEvent::Close => self.current_router().dismiss(self.animated()),
        }
    }
}

impl Delegate<WorkoutEvent> for HomeCoordinator {
    fn handle(&self, event: WorkoutEvent) {
        match event {
            WorkoutEvent::Finished { item, workout } => {
                let activity = item.kind.workout_activity();
                let title = item.title;
                self.services.health.save_workout(
                    activity,
                    workout,
                    self.services
                        .queue
                        .completion(move |result: Result<()>| match result {
                            Ok(()) => info!("[Coordinator] Saved workout for '{}'", title),
                            Err(e) => warn!("[Coordinator] Failed to save workout: {}", e),
                        }),
                );
                self.current_router().dismiss(self.animated());
            }
            WorkoutEvent::Cancelled => {
                info!("[Coordinator] Workout cancelled");
                self.current_router().dismiss(self.animated());
            }
        }
    }
}
