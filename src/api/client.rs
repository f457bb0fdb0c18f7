use super::constants::{fix, methods};
use super::error::RpcError;
use super::models::{
    self, Ack, ActiveDownloadsResponse, ActiveGroups, FoundResponse, InstallPathResponse,
    RestartRequiredResponse, SessionInfoResponse, StatusResponse, VerifyLicenseResponse,
};
use super::resilience::{ResilienceConfig, RetryPolicy, RpcLogger};
use super::transport::Backend;
use crate::tasks::flow::FlowKind;
use crate::tasks::models::{AppId, BackendTaskState, TaskCategory};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use std::sync::Arc;

/// Shown when the backend cannot locate a game folder
pub const INSTALL_PATH_MISSING: &str = "Game install path not found";

/// Typed client for the SteamLord plugin backend (cheap to clone)
#[derive(Clone)]
pub struct SteamLordClient {
    backend: Arc<dyn Backend>,
    retry: RetryPolicy,
    logger: RpcLogger,
}

impl SteamLordClient {
    pub fn new(backend: Arc<dyn Backend>, config: ResilienceConfig) -> Self {
        Self {
            backend,
            retry: RetryPolicy::new(config.retry),
            logger: RpcLogger::new(config.monitoring),
        }
    }

    /// Single call, no retry. Every method accepts `contentScriptQuery`.
    pub async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, RpcError> {
        let mut params = match params {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        params.insert("contentScriptQuery".to_string(), Value::String(String::new()));
        let params = Value::Object(params);

        let context = self.logger.start_call(method, &params);
        let result = match self.backend.call(method, params).await {
            Ok(payload) => models::decode(payload),
            Err(err) => Err(err),
        };

        let failure = result.as_ref().err().map(ToString::to_string);
        self.logger.complete_call(&context, failure.as_deref());
        result
    }

    /// Call wrapped in the retry policy; only transport errors are retried
    pub async fn call_with_retry<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, RpcError> {
        self.retry.execute(|| self.call(method, params.clone())).await
    }

    pub async fn active_operations(&self) -> Result<ActiveGroups, RpcError> {
        let response: ActiveDownloadsResponse = self.call(methods::ACTIVE_DOWNLOADS, Value::Null).await?;
        Ok(response.active)
    }

    pub async fn is_restart_required(&self) -> Result<bool, RpcError> {
        let response: RestartRequiredResponse = self.call(methods::IS_RESTART_REQUIRED, Value::Null).await?;
        Ok(response.required)
    }

    pub async fn set_restart_required(&self) -> Result<(), RpcError> {
        self.call::<Ack>(methods::SET_RESTART_REQUIRED, Value::Null).await?;
        Ok(())
    }

    pub async fn restart_steam(&self) -> Result<(), RpcError> {
        self.call::<Ack>(methods::RESTART_STEAM, Value::Null).await?;
        Ok(())
    }

    /// Whether the backend already has `subject` for `category`
    pub async fn subject_exists(&self, category: TaskCategory, subject: AppId) -> Result<bool, RpcError> {
        let method = match category {
            TaskCategory::Game => methods::GAME_FOUND,
            TaskCategory::Fix => methods::FIX_FOUND,
            TaskCategory::Bypass => methods::BYPASS_FOUND,
        };
        let response: FoundResponse = self.call_with_retry(method, json!({ "appid": subject })).await?;
        Ok(response.exists)
    }

    pub async fn install_path(&self, subject: AppId) -> Result<String, RpcError> {
        let response: InstallPathResponse = self
            .call(methods::GAME_INSTALL_PATH, json!({ "appid": subject }))
            .await?;
        response
            .install_path
            .filter(|path| !path.is_empty())
            .ok_or_else(|| RpcError::Application(INSTALL_PATH_MISSING.to_string()))
    }

    /// Kick off the backend action for `kind`
    pub async fn start(
        &self,
        kind: FlowKind,
        subject: AppId,
        install_path: Option<&str>,
        game_name: &str,
    ) -> Result<(), RpcError> {
        let params = match kind {
            FlowKind::AddGame => json!({ "appid": subject }),
            FlowKind::ApplyFix => json!({
                "appid": subject,
                "downloadUrl": fix::DOWNLOAD_URL,
                "installPath": install_path.unwrap_or_default(),
                "fixType": fix::FIX_TYPE,
                "gameName": game_name,
            }),
            FlowKind::RemoveFix | FlowKind::ApplyBypass | FlowKind::RemoveBypass => json!({
                "appid": subject,
                "installPath": install_path.unwrap_or_default(),
            }),
        };
        self.call::<Ack>(kind.start_method(), params).await?;
        Ok(())
    }

    pub async fn task_status(&self, kind: FlowKind, subject: AppId) -> Result<BackendTaskState, RpcError> {
        let response: StatusResponse = self.call(kind.status_method(), json!({ "appid": subject })).await?;
        Ok(response.state)
    }

    pub async fn delete_game(&self, subject: AppId) -> Result<(), RpcError> {
        self.call::<Ack>(methods::DELETE_GAME, json!({ "appid": subject })).await?;
        Ok(())
    }

    pub async fn session_logged_in(&self) -> Result<bool, RpcError> {
        let response: SessionInfoResponse = self.call(methods::SESSION_INFO, Value::Null).await?;
        Ok(response.is_logged_in)
    }

    pub async fn verify_license(&self) -> Result<VerifyLicenseResponse, RpcError> {
        self.call(methods::VERIFY_LICENSE, Value::Null).await
    }
}
