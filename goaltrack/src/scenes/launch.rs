//! First screen: request health access, then hand over to the goals list.

use std::rc::Rc;

use log::{info, warn};

use crate::navigation::{DelegateHandle, ScreenController};
use crate::runtime::MainQueue;
use crate::services::HealthStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchEvent {
    ShowGoals,
}

pub struct LaunchScreen {
    queue: MainQueue,
    health: Rc<dyn HealthStore>,
    delegate: DelegateHandle<LaunchEvent>,
    launched: bool,
}

impl LaunchScreen {
    pub fn new(
        queue: MainQueue,
        health: Rc<dyn HealthStore>,
        delegate: DelegateHandle<LaunchEvent>,
    ) -> Self {
        Self {
            queue,
            health,
            delegate,
            launched: false,
        }
    }
}

impl ScreenController for LaunchScreen {
    fn did_appear(&mut self) {
        if self.launched {
            return;
        }
        self.launched = true;

        // Goals do not wait for the answer; denied access just means zero progress.
        self.health
            .authorize(self.queue.completion(|result| match result {
                Ok(true) => info!("[LaunchScreen] Health data access granted"),
                Ok(false) => warn!("[LaunchScreen] Health data access denied"),
                Err(e) => warn!("[LaunchScreen] Health authorization failed: {}", e),
            }));
        self.delegate.send(LaunchEvent::ShowGoals);
    }
}
