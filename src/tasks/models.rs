//! Core task types shared by the registry, presenter and flows

use serde::{Deserialize, Deserializer};
use std::fmt;

/// Steam application id the operations target
pub type AppId = u32;

/// The three kinds of long-running backend operations.
///
/// The registry keeps exactly one slot per category, so two operations of the
/// same category can never run side by side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskCategory {
    Game,
    Fix,
    Bypass,
}

impl TaskCategory {
    /// All categories in dock order
    pub const ALL: [TaskCategory; 3] = [TaskCategory::Game, TaskCategory::Fix, TaskCategory::Bypass];

    /// Key used by the backend in `GetActiveDownloads`
    pub fn key(self) -> &'static str {
        match self {
            TaskCategory::Game => "game",
            TaskCategory::Fix => "fix",
            TaskCategory::Bypass => "bypass",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "game" => Some(TaskCategory::Game),
            "fix" => Some(TaskCategory::Fix),
            "bypass" => Some(TaskCategory::Bypass),
            _ => None,
        }
    }

    /// Human label used in the busy notice
    pub fn busy_label(self) -> &'static str {
        match self {
            TaskCategory::Game => "game download",
            TaskCategory::Fix => "fix",
            TaskCategory::Bypass => "bypass",
        }
    }

    /// Notice shown when a second subject is started while the category is occupied
    pub fn busy_notice(self) -> String {
        format!(
            "Download in progress. Please wait for the current {} to finish.",
            self.busy_label()
        )
    }

    pub fn dock_title(self) -> &'static str {
        match self {
            TaskCategory::Game => "Game Download",
            TaskCategory::Fix => "Online Fix",
            TaskCategory::Bypass => "Bypass",
        }
    }

    pub fn dock_icon(self) -> &'static str {
        match self {
            TaskCategory::Game => "fa-download",
            TaskCategory::Fix => "fa-wrench",
            TaskCategory::Bypass => "fa-shield-halved",
        }
    }
}

impl fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Minimized,
}

/// Coarse status reported by the backend for one operation.
///
/// Statuses the client has no special handling for (`queued`, `checking`, ...)
/// are kept verbatim in `Other` so they can still be displayed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum TaskStatus {
    Downloading,
    Extracting,
    Removing,
    Done,
    Failed,
    Other(String),
}

impl TaskStatus {
    /// `done` and `failed` end an operation; nothing is polled after them
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Failed)
    }

    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Downloading => "downloading",
            TaskStatus::Extracting => "extracting",
            TaskStatus::Removing => "removing",
            TaskStatus::Done => "done",
            TaskStatus::Failed => "failed",
            TaskStatus::Other(raw) => raw,
        }
    }
}

impl From<String> for TaskStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "downloading" => TaskStatus::Downloading,
            "extracting" => TaskStatus::Extracting,
            "removing" => TaskStatus::Removing,
            "done" => TaskStatus::Done,
            "failed" => TaskStatus::Failed,
            _ => TaskStatus::Other(raw),
        }
    }
}

impl From<&str> for TaskStatus {
    fn from(raw: &str) -> Self {
        TaskStatus::from(raw.to_string())
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extra information the backend attaches to a finished bypass
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GameInfo {
    #[serde(default)]
    pub work_on: Option<String>,
    #[serde(default)]
    pub launcher: Option<String>,
}

/// Polled status object for a single operation.
///
/// Byte counters are kept as floats because the backend serializes whatever
/// its downloader reports, including `null` and fractional values.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendTaskState {
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub bytes_read: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub total_bytes: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub progress: Option<String>,
    #[serde(default)]
    pub game_info: Option<GameInfo>,
}

impl BackendTaskState {
    pub fn with_status(status: impl Into<TaskStatus>) -> Self {
        Self {
            status: Some(status.into()),
            ..Self::default()
        }
    }

    pub fn downloading(bytes_read: f64, total_bytes: f64) -> Self {
        Self {
            status: Some(TaskStatus::Downloading),
            bytes_read: Some(bytes_read),
            total_bytes: Some(total_bytes),
            ..Self::default()
        }
    }

    pub fn done() -> Self {
        Self::with_status(TaskStatus::Done)
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: Some(TaskStatus::Failed),
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.as_ref().is_some_and(TaskStatus::is_terminal)
    }
}

/// Accepts numbers, numeric strings and `null`; anything else becomes `None`
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}
