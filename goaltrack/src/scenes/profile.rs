//! Health profile screen with body-mass-index saving.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::{info, warn};

use crate::error::Result;
use crate::model::HealthProfile;
use crate::navigation::{DelegateHandle, ScreenController};
use crate::services::Services;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileEvent {
    Close,
}

pub struct ProfileScreen {
    me: Weak<RefCell<ProfileScreen>>,
    services: Services,
    delegate: DelegateHandle<ProfileEvent>,
    profile: Option<HealthProfile>,
    alert: Option<String>,
    requested: bool,
}

impl ProfileScreen {
    pub fn new(services: Services, delegate: DelegateHandle<ProfileEvent>) -> Rc<RefCell<Self>> {
        Rc::new_cyclic(|me| {
            RefCell::new(Self {
                me: me.clone(),
                services,
                delegate,
                profile: None,
                alert: None,
                requested: false,
            })
        })
    }

    pub fn profile(&self) -> Option<&HealthProfile> {
        self.profile.as_ref()
    }

    /// Last error worth telling the user about.
    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    pub fn body_mass_index(&self) -> Option<f64> {
        self.profile.as_ref().and_then(HealthProfile::body_mass_index)
    }

    pub fn save_body_mass_index(&mut self) {
        let bmi = match self
            .profile
            .clone()
            .unwrap_or_default()
            .require_body_mass_index()
        {
            Ok(bmi) => bmi,
            Err(e) => {
                warn!("[ProfileScreen] {}", e);
                self.alert = Some(e.to_string());
                return;
            }
        };

        let me = self.me.clone();
        let now = self.services.clock.now();
        self.services.health.save_body_mass_index(
            bmi,
            now,
            self.services.queue.completion(move |result: Result<()>| {
                let message = match result {
                    Ok(()) => {
                        info!("[ProfileScreen] Saved BMI {:.1}", bmi);
                        None
                    }
                    Err(e) => {
                        warn!("[ProfileScreen] Failed to save BMI: {}", e);
                        Some(e.to_string())
                    }
                };
                if let Some(screen) = me.upgrade() {
                    screen.borrow_mut().alert = message;
                }
            }),
        );
    }

    pub fn close(&self) {
        self.delegate.send(ProfileEvent::Close);
    }
}

impl ScreenController for ProfileScreen {
    fn did_appear(&mut self) {
        if self.requested {
            return;
        }
        self.requested = true;

        let me = self.me.clone();
        self.services
            .health
            .load_profile(self.services.queue.completion(move |result: Result<HealthProfile>| {
                let Some(strong) = me.upgrade() else {
                    return;
                };
                let mut screen = strong.borrow_mut();
                match result {
                    Ok(profile) => screen.profile = Some(profile),
                    Err(e) => {
                        warn!("[ProfileScreen] Failed to load profile: {}", e);
                        screen.alert = Some(e.to_string());
                    }
                }
            }));
    }
}
