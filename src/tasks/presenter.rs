//! Maps polled backend state to what a modal should show
//!
//! Everything here is pure: the same state and flow always produce the same
//! [`RenderInstruction`].

use super::flow::{FlowKind, FlowSpec};
use super::models::{BackendTaskState, TaskStatus};
use crate::ui::ModalAction;

/// Totals at or below this are treated as "not reported yet"
pub const SANE_TOTAL_FLOOR: f64 = 1000.0;

/// Error fragments that mean the user hit a plan limit
pub const UPSELL_MARKERS: [&str; 3] = ["Upgrade Now", "Premium", "Locked"];

pub const SUPPORT_URL: &str = "https://discord.gg/Uk9MzzHjcr";

const FIX_UPDATE_NOTE: &str = "Important: Some online fixes may stop working after a game update. \
If the game doesn't launch or work properly after applying this fix, the fix files likely need updating. \
Please remove the fix and submit a request on our Discord server - we'll update it for you!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detail {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderBody {
    /// Labeled progress bar
    Progress { label: String, percent: u8 },
    /// Single status line
    Status(String),
    Success {
        title: String,
        note: Option<String>,
        details: Vec<Detail>,
    },
    Failure(String),
    /// Failure caused by a plan limit; links to the support community instead
    Upsell { message: String, url: &'static str },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderInstruction {
    pub body: RenderBody,
    pub actions: Vec<ModalAction>,
    pub terminal: bool,
}

impl RenderInstruction {
    fn running(body: RenderBody) -> Self {
        Self {
            body,
            actions: vec![ModalAction::Hide],
            terminal: false,
        }
    }

    fn finished(body: RenderBody, actions: Vec<ModalAction>) -> Self {
        Self {
            body,
            actions,
            terminal: true,
        }
    }

    pub fn percent(&self) -> Option<u8> {
        match self.body {
            RenderBody::Progress { percent, .. } => Some(percent),
            _ => None,
        }
    }

    pub fn offers(&self, action: ModalAction) -> bool {
        self.actions.contains(&action)
    }
}

/// Download percentage, pinned to 0 while the total is missing or implausibly small
pub fn percent(bytes_read: Option<f64>, total_bytes: Option<f64>) -> u8 {
    match (bytes_read, total_bytes) {
        (Some(read), Some(total)) if total > SANE_TOTAL_FLOOR && read.is_finite() => {
            (read / total * 100.0).floor().clamp(0.0, 100.0) as u8
        }
        _ => 0,
    }
}

pub fn is_upsell(message: &str) -> bool {
    UPSELL_MARKERS.iter().any(|marker| message.contains(marker))
}

fn game_name(spec: &FlowSpec) -> &str {
    if spec.display_name.is_empty() {
        "game"
    } else {
        &spec.display_name
    }
}

fn downloading_label(spec: &FlowSpec) -> String {
    match spec.kind {
        FlowKind::AddGame => format!("Adding {}...", game_name(spec)),
        FlowKind::ApplyFix => format!("Downloading {} Fix...", spec.display_name),
        FlowKind::ApplyBypass | FlowKind::RemoveBypass => {
            format!("Downloading {} Bypass...", spec.display_name)
        }
        FlowKind::RemoveFix => "Working...".to_string(),
    }
}

fn idle_line(spec: &FlowSpec) -> String {
    match spec.kind {
        FlowKind::AddGame => format!("Adding {}...", game_name(spec)),
        FlowKind::ApplyFix => format!("Downloading {} Fix...", spec.display_name),
        _ => "Working...".to_string(),
    }
}

/// What a freshly opened (or reopened) modal shows before the first poll
pub fn initial(spec: &FlowSpec) -> RenderInstruction {
    RenderInstruction::running(RenderBody::Status(idle_line(spec)))
}

/// Success prompt offering an immediate Steam restart or the banner
pub fn restart_prompt(title: impl Into<String>) -> RenderInstruction {
    RenderInstruction::finished(
        RenderBody::Success {
            title: title.into(),
            note: None,
            details: Vec::new(),
        },
        vec![ModalAction::RestartNow, ModalAction::RestartLater],
    )
}

pub fn present(state: &BackendTaskState, spec: &FlowSpec) -> RenderInstruction {
    let Some(status) = &state.status else {
        return initial(spec);
    };

    match status {
        TaskStatus::Downloading => RenderInstruction::running(RenderBody::Progress {
            label: downloading_label(spec),
            percent: percent(state.bytes_read, state.total_bytes),
        }),
        TaskStatus::Done => present_success(state, spec),
        TaskStatus::Failed => present_failure(state, spec),
        other if spec.kind == FlowKind::AddGame => RenderInstruction::running(RenderBody::Status(
            format!("Adding {}... ({})", game_name(spec), other),
        )),
        TaskStatus::Extracting => RenderInstruction::running(RenderBody::Status(
            state.progress.clone().unwrap_or_else(|| "Extracting...".to_string()),
        )),
        TaskStatus::Removing => RenderInstruction::running(RenderBody::Status(
            state.progress.clone().unwrap_or_else(|| "Removing...".to_string()),
        )),
        TaskStatus::Other(_) => initial(spec),
    }
}

fn present_success(state: &BackendTaskState, spec: &FlowSpec) -> RenderInstruction {
    let close = vec![ModalAction::Close];
    match spec.kind {
        FlowKind::AddGame => restart_prompt("Game Has Been Added Successfully"),
        FlowKind::ApplyFix => RenderInstruction::finished(
            RenderBody::Success {
                title: "Fix Added Successfully!".to_string(),
                note: Some(FIX_UPDATE_NOTE.to_string()),
                details: Vec::new(),
            },
            close,
        ),
        FlowKind::ApplyBypass => {
            let details = state
                .game_info
                .as_ref()
                .map(|info| {
                    let mut details = vec![Detail {
                        label: "Run From",
                        value: info.work_on.clone().unwrap_or_else(|| "Steam".to_string()),
                    }];
                    if let Some(launcher) = info.launcher.as_deref().filter(|l| !l.is_empty() && *l != "None") {
                        details.push(Detail {
                            label: "Requires",
                            value: launcher.to_string(),
                        });
                    }
                    details
                })
                .unwrap_or_default();

            RenderInstruction::finished(
                RenderBody::Success {
                    title: "Bypass Added Successfully!".to_string(),
                    note: None,
                    details,
                },
                close,
            )
        }
        FlowKind::RemoveFix | FlowKind::RemoveBypass => RenderInstruction::finished(
            RenderBody::Success {
                title: "Done! Verifying game files...".to_string(),
                note: None,
                details: Vec::new(),
            },
            close,
        ),
    }
}

fn present_failure(state: &BackendTaskState, spec: &FlowSpec) -> RenderInstruction {
    let error = state.error.as_deref().filter(|e| !e.is_empty());
    let message = match spec.kind {
        FlowKind::AddGame => error.unwrap_or("Unknown error").to_string(),
        _ => format!("Failed: {}", error.unwrap_or("Unknown")),
    };

    let body = if is_upsell(&message) {
        RenderBody::Upsell {
            message,
            url: SUPPORT_URL,
        }
    } else {
        RenderBody::Failure(message)
    };

    RenderInstruction::finished(body, vec![ModalAction::Close])
}
