//! Interrupting error screen. Asks to be dismissed once the network is back.

use serde::{Deserialize, Serialize};

use log::info;

use crate::connectivity::{ConnectivityChange, ConnectivityMonitor, Subscription};
use crate::navigation::{DelegateHandle, ScreenController};

/// What the error screen shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorContent {
    pub emoji: String,
    pub title: String,
    pub details: String,
}

impl Default for ErrorContent {
    fn default() -> Self {
        Self {
            emoji: "🤔".to_string(),
            title: "Ooops".to_string(),
            details: "Something went wrong".to_string(),
        }
    }
}

impl ErrorContent {
    /// No connection and nothing cached.
    pub fn offline() -> Self {
        Self {
            emoji: "😱".to_string(),
            title: "Ooops".to_string(),
            details: "Please connect to the internet and try again.".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorEvent {
    Dismiss,
}

pub struct ErrorScreen {
    content: ErrorContent,
    connectivity: ConnectivityMonitor,
    delegate: DelegateHandle<ErrorEvent>,
    subscription: Option<Subscription>,
}

impl ErrorScreen {
    pub fn new(
        content: ErrorContent,
        connectivity: ConnectivityMonitor,
        delegate: DelegateHandle<ErrorEvent>,
    ) -> Self {
        Self {
            content,
            connectivity,
            delegate,
            subscription: None,
        }
    }

    pub fn content(&self) -> &ErrorContent {
        &self.content
    }

    pub fn is_watching_connectivity(&self) -> bool {
        self.subscription.is_some()
    }
}

impl ScreenController for ErrorScreen {
    fn did_appear(&mut self) {
        // Connection may have come back before the screen made it on screen.
        if self.connectivity.is_connected() {
            info!("[ErrorScreen] Already connected, dismissing");
            self.delegate.send(ErrorEvent::Dismiss);
            return;
        }
        if self.subscription.is_none() {
            let delegate = self.delegate.clone();
            self.subscription = Some(self.connectivity.subscribe(move |change| {
                if change == ConnectivityChange::Connected {
                    info!("[ErrorScreen] Connection restored");
                    delegate.send(ErrorEvent::Dismiss);
                }
            }));
        }
    }

    fn did_disappear(&mut self) {
        self.subscription = None;
    }
}
