// Application configuration.
//
// Environment variables with development defaults. Provider API keys are not
// read here; `Provider::validate_api_key` looks them up when a summary is
// requested.

use std::{path::PathBuf, time::Duration};

use crate::{paths::get_root_data_dir, provider::Provider};

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the upload/status backend.
    pub backend_url: String,
    /// Period between status requests, within 2..=5 seconds.
    pub poll_interval: Duration,
    /// Root of the local object and document stores.
    pub data_dir: PathBuf,
    pub provider: Provider,
    /// Signed-in user, if any.
    pub user: Option<String>,
    /// Log filter directive (e.g. `warn`, `reelnote_core=debug`).
    pub log_filter: String,
}

impl AppConfig {
    /// | Variable | Default |
    /// |---|---|
    /// | `REELNOTE_BACKEND_URL` | `http://localhost:8000` |
    /// | `REELNOTE_POLL_SECS` | `5` |
    /// | `REELNOTE_DATA_DIR` | platform data dir + `reelnote` |
    /// | `REELNOTE_PROVIDER` | `openrouter` |
    /// | `REELNOTE_USER` | *(none)* |
    /// | `REELNOTE_LOG` | `warn` |
    pub fn from_env() -> Self {
        Self::from_env_fn(|key| std::env::var(key))
    }

    fn from_env_fn<F>(env: F) -> Self
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let backend_url = env("REELNOTE_BACKEND_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| DEFAULT_BACKEND_URL.into());

        let poll_interval = env("REELNOTE_POLL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(MAX_POLL_INTERVAL)
            .clamp(MIN_POLL_INTERVAL, MAX_POLL_INTERVAL);

        let data_dir = env("REELNOTE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| get_root_data_dir());

        let provider = env("REELNOTE_PROVIDER")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();

        let user = env("REELNOTE_USER")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let log_filter = env("REELNOTE_LOG").unwrap_or_else(|_| "warn".into());

        Self {
            backend_url,
            poll_interval,
            data_dir,
            provider,
            user,
            log_filter,
        }
    }
}
