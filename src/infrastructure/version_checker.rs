//! Update check
//!
//! One POST per run to `<stats_url>/api/version-check/<project>` carrying a
//! random install id kept in the user's app-data directory. The check runs
//! on a detached task; the menu loop polls the result without waiting and
//! every failure is dropped silently.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

pub const PROJECT_ID: &str = "flexman";
pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");
const CHECK_TIMEOUT: Duration = Duration::from_secs(10);
const INSTALL_FILE_NAME: &str = "version.json";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VersionInfo {
    #[serde(default)]
    pub update_available: bool,
    #[serde(default)]
    pub latest_version: Option<String>,
    #[serde(default)]
    pub changelog: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VersionCheckRequest {
    pub install_id: String,
    pub version: String,
    pub os_info: String,
    pub arch: String,
    pub user_agent: String,
}

impl VersionCheckRequest {
    pub fn new(install_id: &str) -> Self {
        Self {
            install_id: install_id.to_string(),
            version: CURRENT_VERSION.to_string(),
            os_info: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            user_agent: user_agent(),
        }
    }
}

fn user_agent() -> String {
    format!("flexman/{}", CURRENT_VERSION)
}

/// Install id persisted as `{"install_id": "..."}`; other keys are kept
pub struct InstallIdStore {
    path: PathBuf,
}

impl InstallIdStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `%LOCALAPPDATA%\flexman` on Windows, `~/.flexman` elsewhere
    pub fn default_location() -> Option<Self> {
        let dir = if cfg!(windows) {
            std::env::var_os("LOCALAPPDATA").map(|d| PathBuf::from(d).join("flexman"))
        } else {
            std::env::var_os("HOME").map(|d| PathBuf::from(d).join(".flexman"))
        }?;
        Some(Self::new(dir.join(INSTALL_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Existing id, or a fresh UUID v4 that is written back best-effort
    pub fn load_or_create(&self) -> String {
        let mut document = std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|text| serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(&text).ok())
            .unwrap_or_default();

        if let Some(id) = document.get("install_id").and_then(|v| v.as_str()) {
            if !id.is_empty() {
                return id.to_string();
            }
        }

        let id = uuid::Uuid::new_v4().to_string();
        document.insert("install_id".to_string(), serde_json::Value::String(id.clone()));
        if let Err(e) = self.write(&document) {
            tracing::debug!("Could not persist install id to {}: {}", self.path.display(), e);
        }
        id
    }

    fn write(&self, document: &serde_json::Map<String, serde_json::Value>) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(document)?;
        std::fs::write(&self.path, text)
    }
}

pub struct VersionChecker {
    client: Client,
    stats_url: String,
    install_id: String,
}

impl VersionChecker {
    pub fn new(stats_url: &str, install_id: String) -> Option<Self> {
        let client = Client::builder()
            .timeout(CHECK_TIMEOUT)
            .user_agent(user_agent())
            .build()
            .ok()?;
        Some(Self {
            client,
            stats_url: stats_url.trim_end_matches('/').to_string(),
            install_id,
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/version-check/{}", self.stats_url, PROJECT_ID)
    }

    /// One check; `None` on any failure
    pub async fn check(&self) -> Option<VersionInfo> {
        let response = self
            .client
            .post(self.endpoint())
            .json(&VersionCheckRequest::new(&self.install_id))
            .send()
            .await
            .map_err(|e| tracing::debug!("Version check failed: {}", e))
            .ok()?;

        if !response.status().is_success() {
            tracing::debug!("Version check returned HTTP {}", response.status());
            return None;
        }

        response
            .json::<VersionInfo>()
            .await
            .map_err(|e| tracing::debug!("Version check response unreadable: {}", e))
            .ok()
    }

    /// Run the check on a detached task
    pub fn spawn(self) -> UpdateNotice {
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            if let Some(info) = self.check().await {
                // Receiver gone means the program is already on its way out
                let _ = tx.send(info);
            }
        });
        UpdateNotice::new(rx)
    }
}

/// Non-blocking handle on a pending update check
pub struct UpdateNotice {
    receiver: Option<oneshot::Receiver<VersionInfo>>,
}

impl UpdateNotice {
    pub fn new(receiver: oneshot::Receiver<VersionInfo>) -> Self {
        Self {
            receiver: Some(receiver),
        }
    }

    /// A notice that never fires, for when the check is disabled
    pub fn disabled() -> Self {
        Self { receiver: None }
    }

    /// Take the result if it has arrived and offers an update.
    ///
    /// Returns `Some` at most once over the notice's lifetime.
    pub fn poll(&mut self) -> Option<VersionInfo> {
        let receiver = self.receiver.as_mut()?;
        match receiver.try_recv() {
            Ok(info) => {
                self.receiver = None;
                info.update_available.then_some(info)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => {
                self.receiver = None;
                None
            }
        }
    }
}

pub fn format_notice(info: &VersionInfo) -> String {
    let rule = "=".repeat(50);
    let mut lines = vec![
        rule.clone(),
        "A new version is available".to_string(),
        format!("Current version: {}", CURRENT_VERSION),
        format!(
            "Latest version:  {}",
            info.latest_version.as_deref().unwrap_or("unknown")
        ),
        format!(
            "Changes: {}",
            info.changelog.as_deref().unwrap_or("version update")
        ),
    ];
    if let Some(url) = info.download_url.as_deref().filter(|u| !u.is_empty()) {
        lines.push(format!("Download: {}", url));
    }
    lines.push(rule);
    lines.join("\n")
}
