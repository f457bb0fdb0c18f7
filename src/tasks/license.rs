//! License gate for user-initiated actions

use crate::api::SteamLordClient;
use log::{debug, info, warn};
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

/// Shown when an action is refused because activation failed
pub const ACTIVATION_REQUIRED: &str = "Activation required to use this feature";

const PENDING: u8 = 0;
const VALID: u8 = 1;
const INVALID: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseOutcome {
    Pending,
    Valid,
    Invalid,
}

/// Outcome of the startup license check, shared by every gated action
#[derive(Debug, Default)]
pub struct LicenseGate {
    state: AtomicU8,
}

impl LicenseGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gate that is already decided (tests, offline use)
    pub fn settled(valid: bool) -> Self {
        let gate = Self::new();
        gate.complete(valid);
        gate
    }

    pub fn complete(&self, valid: bool) {
        self.state.store(if valid { VALID } else { INVALID }, Ordering::SeqCst);
    }

    pub fn outcome(&self) -> LicenseOutcome {
        match self.state.load(Ordering::SeqCst) {
            VALID => LicenseOutcome::Valid,
            INVALID => LicenseOutcome::Invalid,
            _ => LicenseOutcome::Pending,
        }
    }

    /// Wait for the check in `step` increments for at most `timeout`.
    ///
    /// A check still pending after the timeout admits the action; the backend
    /// refuses unlicensed calls on its own.
    pub async fn admit(&self, timeout: Duration, step: Duration) -> bool {
        let step = step.max(Duration::from_millis(1));
        let mut waited = Duration::ZERO;

        loop {
            match self.outcome() {
                LicenseOutcome::Valid => return true,
                LicenseOutcome::Invalid => return false,
                LicenseOutcome::Pending if waited >= timeout => {
                    debug!("License check still pending after {:?}, proceeding", waited);
                    return true;
                }
                LicenseOutcome::Pending => {
                    tokio::time::sleep(step).await;
                    waited += step;
                }
            }
        }
    }
}

/// Session lookup followed by server-side verification
pub async fn check_license(client: &SteamLordClient) -> bool {
    match client.session_logged_in().await {
        Ok(true) => {}
        Ok(false) => {
            info!("No active session, license not valid");
            return false;
        }
        Err(err) => {
            warn!("License check error: {}", err);
            return false;
        }
    }

    match client.verify_license().await {
        Ok(response) if response.valid => {
            info!("License verified for {}", response.email.as_deref().unwrap_or("unknown account"));
            true
        }
        Ok(response) => {
            warn!(
                "License verification failed: {}",
                response.error.as_deref().unwrap_or("Unknown")
            );
            false
        }
        Err(err) => {
            warn!("License check error: {}", err);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_settled_gate_answers_immediately() {
        assert!(LicenseGate::settled(true).admit(Duration::from_secs(5), Duration::from_millis(100)).await);
        assert!(!LicenseGate::settled(false).admit(Duration::from_secs(5), Duration::from_millis(100)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_gate_is_optimistic_after_timeout() {
        let gate = LicenseGate::new();
        let started = tokio::time::Instant::now();

        assert!(gate.admit(Duration::from_secs(5), Duration::from_millis(100)).await);
        assert!(started.elapsed() >= Duration::from_secs(5));
        assert_eq!(gate.outcome(), LicenseOutcome::Pending);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_late_outcome() {
        let gate = Arc::new(LicenseGate::new());
        let setter = gate.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(750)).await;
            setter.complete(false);
        });

        let started = tokio::time::Instant::now();
        assert!(!gate.admit(Duration::from_secs(5), Duration::from_millis(100)).await);
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
