//! Shared test harness: a scripted in-memory backend and a manager wired to a
//! recording surface

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use steamlord_taskman::api::{Backend, ResilienceConfig, RpcError, SteamLordClient};
use steamlord_taskman::config::TimingConfig;
use steamlord_taskman::tasks::{BackendTaskState, TaskManager};
use steamlord_taskman::ui::RecordingSurface;

type Reply = Result<Value, RpcError>;

#[derive(Default)]
struct Script {
    sticky: HashMap<String, Reply>,
    queued: HashMap<String, VecDeque<Reply>>,
    calls: Vec<(String, Value)>,
}

/// Backend answering from a per-method script.
///
/// One-shot replies queued with [`ScriptedBackend::push`] are used first, then
/// the sticky reply set with [`ScriptedBackend::respond`]. Methods without a
/// script fail with a transport error, like an unreachable backend.
#[derive(Default)]
pub struct ScriptedBackend {
    script: Mutex<Script>,
}

impl ScriptedBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap()
    }

    pub fn respond(&self, method: &str, payload: Value) {
        self.lock().sticky.insert(method.to_string(), Ok(payload));
    }

    pub fn fail(&self, method: &str, error: RpcError) {
        self.lock().sticky.insert(method.to_string(), Err(error));
    }

    pub fn push(&self, method: &str, reply: Reply) {
        self.lock().queued.entry(method.to_string()).or_default().push_back(reply);
    }

    /// Sticky `{success, state}` answer for a status endpoint
    pub fn status(&self, method: &str, state: Value) {
        self.respond(method, json!({ "success": true, "state": state }));
    }

    pub fn calls(&self, method: &str) -> Vec<Value> {
        self.lock()
            .calls
            .iter()
            .filter(|(name, _)| name == method)
            .map(|(_, params)| params.clone())
            .collect()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.calls(method).len()
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let mut script = self.lock();
        script.calls.push((method.to_string(), params));

        if let Some(reply) = script.queued.get_mut(method).and_then(VecDeque::pop_front) {
            return reply;
        }
        script
            .sticky
            .get(method)
            .cloned()
            .unwrap_or_else(|| Err(RpcError::Transport(format!("no script for {}", method))))
    }
}

pub fn ok() -> Value {
    json!({ "success": true })
}

pub fn failure(error: &str) -> Value {
    json!({ "success": false, "error": error })
}

pub fn downloading(bytes_read: u64, total_bytes: u64) -> Value {
    json!({ "status": "downloading", "bytesRead": bytes_read, "totalBytes": total_bytes })
}

pub fn done() -> Value {
    json!({ "status": "done" })
}

pub fn failed(error: &str) -> Value {
    json!({ "status": "failed", "error": error })
}

pub fn state(value: Value) -> BackendTaskState {
    serde_json::from_value(value).unwrap()
}

pub struct Harness {
    pub manager: Arc<TaskManager>,
    pub backend: Arc<ScriptedBackend>,
    pub surface: Arc<RecordingSurface>,
}

/// Licensed manager without retries
pub fn harness() -> Harness {
    harness_with(ResilienceConfig::disabled())
}

pub fn harness_with(resilience: ResilienceConfig) -> Harness {
    let harness = unlicensed_harness_with(resilience);
    harness.manager.license().complete(true);
    harness
}

/// Manager whose license check never reports back
pub fn unlicensed_harness() -> Harness {
    unlicensed_harness_with(ResilienceConfig::disabled())
}

fn unlicensed_harness_with(resilience: ResilienceConfig) -> Harness {
    let backend = ScriptedBackend::new();
    let surface = Arc::new(RecordingSurface::new());
    let client = SteamLordClient::new(backend.clone(), resilience);
    let manager = TaskManager::new(client, surface.clone(), TimingConfig::default());

    Harness {
        manager,
        backend,
        surface,
    }
}
