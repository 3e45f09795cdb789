use std::env;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::Client;

/// Fallback identity used when no pages URL is configured.
const PROJECT_URL: &str = "https://gitlab.com/guardianproject/jitsi-monitor";

/// All HTTP fetches share this timeout.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Runtime configuration, resolved once from the environment.
///
/// The CI_* variables mirror what the GitLab CI environment provides; outside
/// CI everything falls back to local defaults and the run still works, it
/// just starts with an empty history.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Base URL where past reports are published (`CI_PAGES_URL`). Gates
    /// history seeding and doubles as the identifying user-agent.
    pub pages_url: Option<String>,
    /// Project path shown in the HTML header (`CI_PROJECT_PATH`).
    pub project_path: Option<String>,
    /// Repository URL linked from the HTML footer (`CI_PROJECT_URL`).
    pub project_url: Option<String>,
    /// User-agent sent with every request.
    pub user_agent: String,
    /// Seed document listing the source-list pages.
    pub seed_path: PathBuf,
    /// Directory where report.json and index.html are written.
    pub output_dir: PathBuf,
}

impl MonitorConfig {
    pub fn from_env() -> Self {
        let pages_url = env::var("CI_PAGES_URL").ok();
        let user_agent = pages_url
            .clone()
            .unwrap_or_else(|| PROJECT_URL.to_string());

        MonitorConfig {
            pages_url,
            project_path: env::var("CI_PROJECT_PATH").ok(),
            project_url: env::var("CI_PROJECT_URL").ok(),
            user_agent,
            seed_path: env::var("SEED_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("README.md")),
            output_dir: env::var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("public")),
        }
    }

    /// URL of the previously published history, when publishing is configured.
    pub fn history_url(&self) -> Option<String> {
        self.pages_url
            .as_ref()
            .map(|base| format!("{}/report.json", base.trim_end_matches('/')))
    }
}

/// Build the shared HTTP client used for every fetch in the run.
pub fn build_client(config: &MonitorConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(HTTP_TIMEOUT)
        .user_agent(&config.user_agent)
        .build()
}
