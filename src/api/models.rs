//! Response shapes of the plugin backend
//!
//! Every method answers with an object carrying `success` plus either the
//! payload fields or an `error` string. Some endpoints return the JSON
//! document as a string, so payloads are normalized before decoding.

use super::constants::GENERIC_FAILURE;
use super::error::RpcError;
use crate::tasks::models::{AppId, BackendTaskState, TaskCategory};
use log::{debug, warn};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Parse string-wrapped JSON; pass objects through unchanged
pub fn normalize(payload: Value) -> Result<Value, RpcError> {
    match payload {
        Value::String(text) => serde_json::from_str(&text).map_err(|e| RpcError::Decode(e.to_string())),
        other => Ok(other),
    }
}

/// Check the `success` envelope and decode the payload
pub fn decode<T: DeserializeOwned>(payload: Value) -> Result<T, RpcError> {
    let payload = normalize(payload)?;

    let success = payload.get("success").and_then(Value::as_bool).unwrap_or(false);
    if !success {
        let message = payload
            .get("error")
            .and_then(Value::as_str)
            .filter(|message| !message.is_empty())
            .unwrap_or(GENERIC_FAILURE);
        return Err(RpcError::Application(message.to_string()));
    }

    serde_json::from_value(payload).map_err(|e| RpcError::Decode(e.to_string()))
}

/// Acknowledgement without payload
pub type Ack = IgnoredAny;

/// One entry of the active-operations report
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ActiveEntry {
    #[serde(deserialize_with = "lenient_appid")]
    pub appid: AppId,
    #[serde(default, deserialize_with = "lenient_state")]
    pub state: Option<BackendTaskState>,
}

/// Active operations per category.
///
/// Entries that cannot be read are dropped one by one so a single bad item
/// never hides the others.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ActiveGroups {
    #[serde(default, deserialize_with = "lenient_entries")]
    pub game: Vec<ActiveEntry>,
    #[serde(default, deserialize_with = "lenient_entries")]
    pub fix: Vec<ActiveEntry>,
    #[serde(default, deserialize_with = "lenient_entries")]
    pub bypass: Vec<ActiveEntry>,
}

impl ActiveGroups {
    pub fn entries(&self, category: TaskCategory) -> &[ActiveEntry] {
        match category {
            TaskCategory::Game => &self.game,
            TaskCategory::Fix => &self.fix,
            TaskCategory::Bypass => &self.bypass,
        }
    }

    /// All `(category, subject)` pairs in category order
    pub fn operations(&self) -> Vec<(TaskCategory, AppId)> {
        TaskCategory::ALL
            .into_iter()
            .flat_map(|category| self.entries(category).iter().map(move |entry| (category, entry.appid)))
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActiveDownloadsResponse {
    #[serde(default, deserialize_with = "lenient_groups")]
    pub active: ActiveGroups,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RestartRequiredResponse {
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FoundResponse {
    #[serde(default)]
    pub exists: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub state: BackendTaskState,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallPathResponse {
    #[serde(default)]
    pub install_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfoResponse {
    #[serde(default)]
    pub is_logged_in: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyLicenseResponse {
    #[serde(default)]
    pub valid: bool,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

fn lenient_entries<'de, D>(deserializer: D) -> Result<Vec<ActiveEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        Value::Null => return Ok(Vec::new()),
        other => {
            warn!("Ignoring active-operations group that is not a list: {}", other);
            return Ok(Vec::new());
        }
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<ActiveEntry>(item.clone()) {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!("Dropping unreadable active operation {}: {}", item, err);
                None
            }
        })
        .collect())
}

fn lenient_groups<'de, D>(deserializer: D) -> Result<ActiveGroups, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value.clone()).unwrap_or_else(|err| {
        warn!("Ignoring unreadable active-operations report {}: {}", value, err);
        ActiveGroups::default()
    }))
}

/// A malformed state keeps the entry; only the state is discarded
fn lenient_state<'de, D>(deserializer: D) -> Result<Option<BackendTaskState>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    Ok(serde_json::from_value(value)
        .map_err(|err| debug!("Ignoring unreadable operation state: {}", err))
        .ok())
}

/// Subject ids arrive as numbers or numeric strings
fn lenient_appid<'de, D>(deserializer: D) -> Result<AppId, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .and_then(|id| AppId::try_from(id).ok())
            .ok_or_else(|| serde::de::Error::custom(format!("invalid appid {}", n))),
        Value::String(s) => s
            .trim()
            .parse::<AppId>()
            .map_err(|_| serde::de::Error::custom(format!("invalid appid '{}'", s))),
        other => Err(serde::de::Error::custom(format!("invalid appid {}", other))),
    }
}
