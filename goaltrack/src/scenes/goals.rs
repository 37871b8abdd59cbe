//! Goals list: catalog, today's progress and reward totals.
//!
//! On appearance the screen refreshes today's health totals and then decides
//! where the catalog comes from:
//!
//! - connected: fetch, replace and persist
//! - offline with a cached catalog: show it and fetch once the network returns
//! - offline with nothing cached: ask the coordinator for the error screen

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::{debug, info, warn};

use super::error_view::ErrorContent;
use crate::connectivity::{ConnectivityChange, Subscription};
use crate::error::Result;
use crate::model::{ActivityKind, DailyProgress, Goal, Item};
use crate::navigation::{DelegateHandle, ScreenController};
use crate::services::Services;

#[derive(Debug, Clone, PartialEq)]
pub enum GoalsEvent {
    ShowError(ErrorContent),
    ShowProfile,
    StartWorkout(Item),
}

/// Display configuration for one catalog item.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalCard {
    pub item: Item,
    pub progress_today: f64,
    /// Fraction of the goal reached, 0..=1.
    pub ratio: f64,
    pub reward_granted: bool,
    pub goal_label: String,
}

impl GoalCard {
    pub fn configure(item: &Item, progress_today: f64) -> Self {
        Self {
            item: item.clone(),
            progress_today,
            ratio: item.completion_ratio(progress_today),
            reward_granted: item.reward.is_some() && item.is_achieved(progress_today),
            goal_label: item.goal_label(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GoalsViewModel {
    goal: Option<Goal>,
    progress: DailyProgress,
    loading: bool,
}

impl GoalsViewModel {
    pub fn new(cached: Option<Goal>) -> Self {
        Self {
            goal: cached,
            ..Default::default()
        }
    }

    pub fn goal(&self) -> Option<&Goal> {
        self.goal.as_ref()
    }

    pub fn has_goals(&self) -> bool {
        self.goal.as_ref().is_some_and(|g| !g.is_empty())
    }

    pub fn progress(&self) -> &DailyProgress {
        &self.progress
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn cards(&self) -> Vec<GoalCard> {
        self.goal
            .iter()
            .flat_map(|goal| goal.items.iter())
            .map(|item| GoalCard::configure(item, self.progress.for_type(item.kind)))
            .collect()
    }

    pub fn points_today(&self) -> u32 {
        self.goal
            .as_ref()
            .map_or(0, |goal| goal.points_today(&self.progress))
    }

    pub fn item(&self, id: &str) -> Option<&Item> {
        self.goal.as_ref().and_then(|goal| goal.item(id))
    }
}

pub struct GoalsScreen {
    me: Weak<RefCell<GoalsScreen>>,
    services: Services,
    delegate: DelegateHandle<GoalsEvent>,
    view_model: GoalsViewModel,
    reconnect: Option<Subscription>,
    fetches: usize,
}

impl GoalsScreen {
    pub fn new(
        services: Services,
        delegate: DelegateHandle<GoalsEvent>,
        cached: Option<Goal>,
    ) -> Rc<RefCell<Self>> {
        Rc::new_cyclic(|me| {
            RefCell::new(Self {
                me: me.clone(),
                services,
                delegate,
                view_model: GoalsViewModel::new(cached),
                reconnect: None,
                fetches: 0,
            })
        })
    }

    pub fn view_model(&self) -> &GoalsViewModel {
        &self.view_model
    }

    pub fn cards(&self) -> Vec<GoalCard> {
        self.view_model.cards()
    }

    pub fn points_today(&self) -> u32 {
        self.view_model.points_today()
    }

    /// Number of catalog fetches started.
    pub fn fetch_count(&self) -> usize {
        self.fetches
    }

    pub fn is_waiting_for_connection(&self) -> bool {
        self.reconnect.is_some()
    }

    /// User picked an item: start a workout for it.
    pub fn select_item(&self, id: &str) -> bool {
        match self.view_model.item(id) {
            Some(item) => {
                self.delegate.send(GoalsEvent::StartWorkout(item.clone()));
                true
            }
            None => {
                warn!("[GoalsScreen] No item with id {}", id);
                false
            }
        }
    }

    pub fn show_profile(&self) {
        self.delegate.send(GoalsEvent::ShowProfile);
    }

    // ========================================================================
    // Catalog
    // ========================================================================

    fn fetch_goals(&mut self) {
        self.view_model.loading = true;
        self.fetches += 1;
        info!("[GoalsScreen] Fetching goals (attempt {})", self.fetches);

        let me = self.me.clone();
        let done = self.services.queue.completion(move |result: Result<Goal>| {
            let Some(screen) = me.upgrade() else {
                debug!("[GoalsScreen] Screen released, dropping fetch result");
                return;
            };
            screen.borrow_mut().apply_fetch(result);
        });
        self.services.goals.fetch_goals(done);
    }

    fn apply_fetch(&mut self, result: Result<Goal>) {
        self.view_model.loading = false;
        match result {
            Ok(goal) => {
                info!("[GoalsScreen] Fetched {} goals", goal.items.len());
                if let Err(e) = self.services.store.persist(&goal) {
                    warn!("[GoalsScreen] Failed to persist goals: {}", e);
                }
                self.view_model.goal = Some(goal);
            }
            // Cached data, if any, stays on screen.
            Err(e) => warn!("[GoalsScreen] Goal fetch failed: {}", e),
        }
    }

    fn wait_for_connection(&mut self) {
        if self.reconnect.is_some() {
            return;
        }
        info!("[GoalsScreen] Offline, showing cached goals until reconnect");
        let me = self.me.clone();
        self.reconnect = Some(self.services.connectivity.subscribe(move |change| {
            if change != ConnectivityChange::Connected {
                return;
            }
            let Some(strong) = me.upgrade() else {
                return;
            };
            let Ok(mut screen) = strong.try_borrow_mut() else {
                warn!("[GoalsScreen] Busy on reconnect, fetch skipped");
                return;
            };
            screen.reconnect = None;
            screen.fetch_goals();
        }));
    }

    // ========================================================================
    // Health
    // ========================================================================

    fn refresh_progress(&self) {
        let queue = &self.services.queue;
        let health = &self.services.health;

        let me = self.me.clone();
        health.steps_today(queue.completion(move |result: Result<f64>| {
            with_screen(&me, "steps", result, |screen, steps| {
                screen.view_model.progress.steps = Some(steps)
            })
        }));

        for activity in [ActivityKind::Walking, ActivityKind::Running] {
            let me = self.me.clone();
            health.distance_today(
                activity,
                queue.completion(move |result: Result<f64>| {
                    with_screen(&me, "distance", result, |screen, meters| {
                        screen.view_model.progress.set_distance(activity, meters)
                    })
                }),
            );
        }
    }
}

fn with_screen(
    me: &Weak<RefCell<GoalsScreen>>,
    metric: &str,
    result: Result<f64>,
    apply: impl FnOnce(&mut GoalsScreen, f64),
) {
    let value = match result {
        Ok(value) => value,
        Err(e) => {
            warn!("[GoalsScreen] Failed to read {} today: {}", metric, e);
            return;
        }
    };
    match me.upgrade() {
        Some(screen) => apply(&mut screen.borrow_mut(), value),
        None => debug!("[GoalsScreen] Screen released, dropping {} result", metric),
    }
}

impl ScreenController for GoalsScreen {
    fn did_appear(&mut self) {
        self.refresh_progress();

        if self.services.connectivity.is_connected() {
            self.fetch_goals();
        } else if self.view_model.has_goals() {
            self.wait_for_connection();
        } else {
            warn!("[GoalsScreen] Offline with no cached goals");
            self.delegate
                .send(GoalsEvent::ShowError(self.services.config.offline_error.clone()));
        }
    }
}
