//! HTTP client for the remote goal catalog.
//!
//! One GET per fetch, no retry. Completions are delivered from a tokio worker
//! thread and land on the main queue like any other collaborator result.

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::runtime::Runtime;

use goaltrack::{Completion, Goal, GoalService, GoalTrackError, Result};

pub const DEFAULT_BASE_URL: &str = "https://thebigachallenge.appspot.com/_ah/api/myApi/v1/";
pub const DEFAULT_GOALS_PATH: &str = "goals";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Where to fetch the catalog from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub goals_path: String,
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            goals_path: DEFAULT_GOALS_PATH.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| GoalTrackError::Config {
            message: e.to_string(),
        })?;
        if config.timeout_secs == 0 {
            return Err(GoalTrackError::Config {
                message: "timeout_secs must be positive".to_string(),
            });
        }
        Ok(config)
    }

    /// Full catalog URL. Exactly one slash between base and path.
    pub fn goals_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.goals_path.trim_start_matches('/')
        )
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn build_client(&self) -> Result<Client> {
        Client::builder()
            .timeout(self.timeout())
            .build()
            .map_err(|e| GoalTrackError::Http {
                message: format!("Failed to create HTTP client: {}", e),
                status: None,
            })
    }
}

fn build_runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .map_err(|e| GoalTrackError::Http {
            message: format!("Failed to create runtime: {}", e),
            status: None,
        })
}

fn transport_error(e: reqwest::Error) -> GoalTrackError {
    if e.is_decode() {
        GoalTrackError::Decode {
            message: e.to_string(),
        }
    } else {
        GoalTrackError::Http {
            message: e.to_string(),
            status: e.status().map(|s| s.as_u16()),
        }
    }
}

/// GET the catalog at `url` and decode it.
pub async fn request_goals(client: &Client, url: &str) -> Result<Goal> {
    let start = Instant::now();
    let resp = client.get(url).send().await.map_err(transport_error)?;

    let status = resp.status();
    if !status.is_success() {
        warn!("[GoalFetcher] {} returned HTTP {}", url, status);
        return Err(GoalTrackError::Http {
            message: format!("HTTP {}", status),
            status: Some(status.as_u16()),
        });
    }

    let goal: Goal = resp.json().await.map_err(transport_error)?;
    goal.validate()?;
    debug!(
        "[GoalFetcher] {} items in {} ms",
        goal.items.len(),
        start.elapsed().as_millis()
    );
    Ok(goal)
}

/// [`GoalService`] backed by reqwest on a private tokio runtime.
pub struct GoalFetcher {
    client: Client,
    config: ClientConfig,
    runtime: Arc<Runtime>,
}

impl GoalFetcher {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = config.build_client()?;
        let runtime = build_runtime()?;
        info!("[GoalFetcher] Fetching from {}", config.goals_url());
        Ok(Self {
            client,
            config,
            runtime: Arc::new(runtime),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Fetch on the calling thread. Must not be called from inside a tokio runtime.
    pub fn fetch_blocking(&self) -> Result<Goal> {
        self.runtime
            .block_on(request_goals(&self.client, &self.config.goals_url()))
    }
}

impl GoalService for GoalFetcher {
    fn fetch_goals(&self, done: Completion<Result<Goal>>) {
        let client = self.client.clone();
        let url = self.config.goals_url();
        self.runtime.spawn(async move {
            let result = request_goals(&client, &url).await;
            if let Err(e) = &result {
                warn!("[GoalFetcher] Fetch failed: {}", e);
            }
            done.complete(result);
        });
    }
}

/// One-shot fetch with a throwaway client, for FFI callers.
pub fn fetch_goals_blocking(config: &ClientConfig) -> Result<Goal> {
    GoalFetcher::new(config.clone())?.fetch_blocking()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use goaltrack::MainQueue;
    use mockito::{Mock, Server, ServerGuard};
    use std::cell::RefCell;
    use std::rc::Rc;

    pub(crate) const BODY: &str = r#"{"items": [
        {"id": "1", "title": "Steps", "description": "", "type": "step", "goal": 500,
         "reward": {"trophy": "silver_medal", "points": 3}}
    ]}"#;

    /// Mock `GET /api/goals` answering `status` with `body`.
    pub(crate) fn mock_goals(server: &mut ServerGuard, status: usize, body: &str) -> Mock {
        server
            .mock("GET", "/api/goals")
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create()
    }

    pub(crate) fn config_for(server: &ServerGuard) -> ClientConfig {
        ClientConfig {
            base_url: format!("{}/api/", server.url()),
            timeout_secs: 5,
            ..ClientConfig::default()
        }
    }

    #[test]
    fn test_default_url() {
        assert_eq!(
            ClientConfig::default().goals_url(),
            "https://thebigachallenge.appspot.com/_ah/api/myApi/v1/goals"
        );
    }

    #[test]
    fn test_url_join_single_slash() {
        let config = ClientConfig {
            base_url: "http://host/v1".to_string(),
            goals_path: "/goals".to_string(),
            ..ClientConfig::default()
        };
        assert_eq!(config.goals_url(), "http://host/v1/goals");
    }

    #[test]
    fn test_config_from_json() {
        let config = ClientConfig::from_json(r#"{"base_url": "http://localhost:8080/"}"#).unwrap();
        assert_eq!(config.goals_path, "goals");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(matches!(
            ClientConfig::from_json(r#"{"timeout_secs": 0}"#),
            Err(GoalTrackError::Config { .. })
        ));
    }

    #[tokio::test]
    async fn test_request_goals_decodes_catalog() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/goals")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(BODY)
            .create_async()
            .await;

        let config = config_for(&server);
        let client = config.build_client().unwrap();
        let goal = request_goals(&client, &config.goals_url()).await.unwrap();
        mock.assert_async().await;
        assert_eq!(goal.items.len(), 1);
        assert_eq!(goal.items[0].goal, 500);
    }

    #[test]
    fn test_non_success_status() {
        let mut server = Server::new();
        let mock = mock_goals(&mut server, 503, "{}");
        let err = fetch_goals_blocking(&config_for(&server)).unwrap_err();
        mock.assert();
        assert_eq!(
            err,
            GoalTrackError::Http {
                message: "HTTP 503 Service Unavailable".to_string(),
                status: Some(503),
            }
        );
    }

    #[test]
    fn test_invalid_catalog_is_rejected() {
        let mut server = Server::new();
        let _mock = mock_goals(&mut server, 200, r#"{"items": [{"id": "x"}]}"#);
        let err = fetch_goals_blocking(&config_for(&server)).unwrap_err();
        assert!(matches!(err, GoalTrackError::Decode { .. }));
    }

    #[test]
    fn test_fetch_completes_on_main_queue() {
        let mut server = Server::new();
        let mock = mock_goals(&mut server, 200, BODY);
        let queue = MainQueue::new();
        let fetcher = GoalFetcher::new(config_for(&server)).unwrap();
        let received = Rc::new(RefCell::new(None));

        let slot = received.clone();
        fetcher.fetch_goals(queue.completion(move |result: Result<Goal>| {
            *slot.borrow_mut() = Some(result);
        }));

        let deadline = Instant::now() + Duration::from_secs(5);
        while received.borrow().is_none() && Instant::now() < deadline {
            queue.turn();
            std::thread::sleep(Duration::from_millis(10));
        }
        let result = received.borrow_mut().take().expect("completion delivered");
        assert_eq!(result.unwrap().items[0].id, "1");
        mock.assert();
    }
}
