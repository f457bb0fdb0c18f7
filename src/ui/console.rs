//! Terminal rendering of modals, notices and the dock

use super::{ModalAction, ModalId, Surface};
use crate::tasks::dock::DockView;
use crate::tasks::presenter::{RenderBody, RenderInstruction};
use colored::*;
use log::debug;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

const BAR_WIDTH: usize = 30;

/// A choice the user still has to make, answered outside the surface call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsolePrompt {
    Modal { id: ModalId, actions: Vec<ModalAction> },
    RestartBanner,
}

#[derive(Default)]
struct ConsoleState {
    /// Last line printed per open modal, to avoid repeating unchanged polls
    open: HashMap<ModalId, String>,
    last_dock: Option<DockView>,
    pending: Vec<ConsolePrompt>,
}

/// Prints every surface call as a line of colored terminal output
#[derive(Default)]
pub struct ConsoleSurface {
    state: Mutex<ConsoleState>,
}

impl ConsoleSurface {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ConsoleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Choices queued since the last call, oldest first
    pub fn take_prompts(&self) -> Vec<ConsolePrompt> {
        std::mem::take(&mut self.state().pending)
    }

    /// Drop the banner choice; the banner line stays as the reminder
    pub fn defer_banner(&self) {
        self.state().pending.retain(|prompt| *prompt != ConsolePrompt::RestartBanner);
    }

    fn print_if_changed(state: &mut ConsoleState, id: ModalId, content: &RenderInstruction) {
        let line = render_line(id, content);
        if state.open.get(&id) != Some(&line) {
            println!("{}", line);
            state.open.insert(id, line);
        }
        Self::queue_choice(state, id, content);
    }

    /// Terminal modals that offer more than Close wait for an answer
    fn queue_choice(state: &mut ConsoleState, id: ModalId, content: &RenderInstruction) {
        let offers_choice = content.actions.iter().any(|action| *action != ModalAction::Close);
        if !content.terminal || !offers_choice {
            return;
        }

        state
            .pending
            .retain(|prompt| !matches!(prompt, ConsolePrompt::Modal { id: queued, .. } if *queued == id));
        state.pending.push(ConsolePrompt::Modal {
            id,
            actions: content.actions.clone(),
        });
    }
}

pub fn progress_bar(percent: u8) -> String {
    let filled = BAR_WIDTH * usize::from(percent.min(100)) / 100;
    format!("[{}{}] {:>3}%", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled), percent)
}

fn render_line(id: ModalId, content: &RenderInstruction) -> String {
    let prefix = format!("[{} {}]", id.category, id.subject).dimmed();
    let body = match &content.body {
        RenderBody::Progress { label, percent } => format!("{} {}", label, progress_bar(*percent).cyan()),
        RenderBody::Status(line) => line.clone(),
        RenderBody::Success { title, note, details } => {
            let mut text = format!("{} {}", "✓".bright_green().bold(), title.bright_green().bold());
            for detail in details {
                text.push_str(&format!("\n    {}: {}", detail.label.bold(), detail.value));
            }
            if let Some(note) = note {
                text.push_str(&format!("\n    {}", note.dimmed()));
            }
            text
        }
        RenderBody::Failure(message) => format!("{} {}", "✗".bright_red().bold(), message.bright_red()),
        RenderBody::Upsell { message, url } => format!(
            "{} {}\n    {}",
            "⚠️".bright_yellow(),
            message.bright_yellow(),
            format!("Join the community: {}", url).dimmed()
        ),
    };

    if content.terminal && !content.actions.is_empty() {
        let actions: Vec<&str> = content.actions.iter().map(|action| action.label()).collect();
        format!("{} {}  {}", prefix, body, format!("({})", actions.join(" / ")).dimmed())
    } else {
        format!("{} {}", prefix, body)
    }
}

fn render_dock_line(dock: &DockView) -> String {
    if !dock.is_visible() {
        return format!("{}", "Dock: empty".dimmed());
    }

    let items: Vec<String> = dock
        .items
        .iter()
        .map(|item| format!("{} ({})", item.title, item.subject))
        .collect();
    format!("{} {}", "Dock:".bold(), items.join(" | ").bright_blue())
}

impl Surface for ConsoleSurface {
    fn open_modal(&self, id: ModalId, content: &RenderInstruction) {
        let mut state = self.state();
        state.open.remove(&id);
        Self::print_if_changed(&mut state, id, content);
    }

    fn update_modal(&self, id: ModalId, content: &RenderInstruction) -> bool {
        let mut state = self.state();
        if !state.open.contains_key(&id) {
            return false;
        }
        Self::print_if_changed(&mut state, id, content);
        true
    }

    fn close_modal(&self, id: ModalId) {
        let mut state = self.state();
        state.open.remove(&id);
        state
            .pending
            .retain(|prompt| !matches!(prompt, ConsolePrompt::Modal { id: queued, .. } if *queued == id));
    }

    fn notice(&self, message: &str) {
        println!("{} {}", "ℹ".bright_blue().bold(), message);
    }

    fn alert(&self, message: &str) {
        eprintln!("{} {}", "✗".bright_red().bold(), message.bright_red());
    }

    fn render_dock(&self, dock: &DockView) {
        let mut state = self.state();
        if state.last_dock.as_ref() == Some(dock) {
            return;
        }
        println!("{}", render_dock_line(dock));
        state.last_dock = Some(dock.clone());
    }

    fn show_restart_banner(&self) {
        println!(
            "{} {}",
            "⟳".bright_yellow().bold(),
            "Steam needs a restart to apply changes. Run 'steamlord-taskman restart' when ready.".bright_yellow()
        );
        let mut state = self.state();
        if !state.pending.contains(&ConsolePrompt::RestartBanner) {
            state.pending.push(ConsolePrompt::RestartBanner);
        }
    }

    fn ensure_injected(&self) {
        debug!("Nothing to inject on the console");
    }

    fn open_url(&self, url: &str) {
        println!("{} {}", "Open:".bold(), url.underline());
    }
}
