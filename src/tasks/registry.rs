//! Single-flight task registry
//!
//! Holds at most one slot per [`TaskCategory`], drives the
//! visible/minimized state machine and remembers recently finished
//! operations so reconciliation does not resurrect them while the backend
//! catches up.
//!
//! ```text
//! Idle --start_task--> Visible --minimize--> Minimized --restore--> Visible
//! Visible/Minimized --finish_task--> Idle (+ ignore entry)
//! occupied --start_task(other subject)--> unchanged (busy notice)
//! ```

use super::dock::{self, DockView};
use super::flow::FlowSpec;
use super::models::{AppId, TaskCategory, Visibility};
use crate::ui::Surface;
use log::{debug, info, warn};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// How long a finished operation suppresses re-adoption
pub const DEFAULT_IGNORE_WINDOW: Duration = Duration::from_secs(30);

/// Soft cap on remembered finished operations
pub const DEFAULT_IGNORE_CAPACITY: usize = 20;

/// How to bring a minimized operation back on screen.
///
/// Both variants carry the flow to reconstruct; the dispatch on the flow kind
/// happens in `TaskManager::restore`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreAction {
    /// A flow is still polling this slot; only its modal has to be reopened
    Reopen(FlowSpec),
    /// Nothing polls this slot locally (adopted from the backend); start a new flow
    Relaunch(FlowSpec),
}

impl RestoreAction {
    pub fn spec(&self) -> &FlowSpec {
        match self {
            RestoreAction::Reopen(spec) | RestoreAction::Relaunch(spec) => spec,
        }
    }
}

/// The registry's record of the in-flight operation of one category
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSlot {
    pub category: TaskCategory,
    pub subject: AppId,
    pub visibility: Visibility,
    restore: Option<RestoreAction>,
}

impl TaskSlot {
    fn visible(category: TaskCategory, subject: AppId) -> Self {
        Self {
            category,
            subject,
            visibility: Visibility::Visible,
            restore: None,
        }
    }

    pub fn is_minimized(&self) -> bool {
        self.visibility == Visibility::Minimized
    }

    pub fn restore_action(&self) -> Option<&RestoreAction> {
        self.restore.as_ref()
    }
}

#[derive(Debug, Clone, Copy)]
struct IgnoreEntry {
    category: TaskCategory,
    subject: AppId,
    finished_at: Instant,
}

/// Bounded list of finished operations, oldest evicted first.
///
/// Entries are never pruned by age; an old entry simply stops matching.
#[derive(Debug)]
struct IgnoreRing {
    entries: VecDeque<IgnoreEntry>,
    capacity: usize,
    window: Duration,
}

impl IgnoreRing {
    fn new(capacity: usize, window: Duration) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
            window,
        }
    }

    fn push(&mut self, entry: IgnoreEntry) {
        self.entries.push_back(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    fn suppresses(&self, category: TaskCategory, subject: AppId, now: Instant) -> bool {
        self.entries.iter().any(|entry| {
            entry.category == category
                && entry.subject == subject
                && now.saturating_duration_since(entry.finished_at) < self.window
        })
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Tunables for the ignore ring
#[derive(Debug, Clone, Copy)]
pub struct RegistrySettings {
    pub ignore_window: Duration,
    pub ignore_capacity: usize,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            ignore_window: DEFAULT_IGNORE_WINDOW,
            ignore_capacity: DEFAULT_IGNORE_CAPACITY,
        }
    }
}

/// One slot per category plus the ignore ring.
///
/// Every mutating operation re-renders the dock on the attached surface.
pub struct TaskSlotRegistry {
    slots: HashMap<TaskCategory, TaskSlot>,
    ignored: IgnoreRing,
    surface: Arc<dyn Surface>,
}

impl TaskSlotRegistry {
    pub fn new(surface: Arc<dyn Surface>) -> Self {
        Self::with_settings(surface, RegistrySettings::default())
    }

    pub fn with_settings(surface: Arc<dyn Surface>, settings: RegistrySettings) -> Self {
        Self {
            slots: HashMap::new(),
            ignored: IgnoreRing::new(settings.ignore_capacity, settings.ignore_window),
            surface,
        }
    }

    /// Reserve (or resume) the slot for `category`.
    ///
    /// Returns false and shows the busy notice when another subject occupies
    /// the category. `on_start` runs for both a fresh reservation and a resume.
    pub fn start_task<F: FnOnce()>(&mut self, category: TaskCategory, subject: AppId, on_start: F) -> bool {
        match self.slots.get_mut(&category) {
            Some(slot) if slot.subject == subject => {
                debug!("Resuming {} task for app {}", category, subject);
                slot.visibility = Visibility::Visible;
                on_start();
            }
            Some(slot) => {
                info!(
                    "Rejected {} task for app {}: app {} is still running",
                    category, subject, slot.subject
                );
                self.surface.notice(&category.busy_notice());
                return false;
            }
            None => {
                info!("Starting {} task for app {}", category, subject);
                self.slots.insert(category, TaskSlot::visible(category, subject));
                on_start();
            }
        }

        self.render_dock();
        true
    }

    /// Release the slot and remember it in the ignore ring
    pub fn finish_task(&mut self, category: TaskCategory) -> Option<TaskSlot> {
        self.finish_task_at(category, Instant::now())
    }

    pub fn finish_task_at(&mut self, category: TaskCategory, now: Instant) -> Option<TaskSlot> {
        let finished = self.slots.remove(&category);
        if let Some(slot) = &finished {
            info!("Finished {} task for app {}", category, slot.subject);
            self.ignored.push(IgnoreEntry {
                category,
                subject: slot.subject,
                finished_at: now,
            });
        }
        self.render_dock();
        finished
    }

    /// Minimize the slot if it still belongs to `subject`
    pub fn minimize(&mut self, category: TaskCategory, subject: AppId, restore: RestoreAction) -> bool {
        match self.slots.get_mut(&category) {
            Some(slot) if slot.subject == subject => {
                debug!("Minimizing {} task for app {}", category, subject);
                slot.visibility = Visibility::Minimized;
                slot.restore = Some(restore);
            }
            _ => {
                debug!("Ignoring minimize of {} task for app {}: slot moved on", category, subject);
                return false;
            }
        }

        self.render_dock();
        true
    }

    /// Make a minimized slot visible again.
    ///
    /// Hands the stored restore action to the caller, who runs it exactly
    /// once; a second call without another `minimize` returns `None`.
    pub fn restore(&mut self, category: TaskCategory) -> Option<RestoreAction> {
        let action = match self.slots.get_mut(&category) {
            Some(slot) if slot.is_minimized() => {
                debug!("Restoring {} task for app {}", category, slot.subject);
                slot.visibility = Visibility::Visible;
                slot.restore.take()
            }
            _ => return None,
        };

        self.render_dock();
        action
    }

    /// True if `(category, subject)` finished locally within the ignore window
    pub fn should_ignore(&self, category: TaskCategory, subject: AppId) -> bool {
        self.should_ignore_at(category, subject, Instant::now())
    }

    pub fn should_ignore_at(&self, category: TaskCategory, subject: AppId, now: Instant) -> bool {
        self.ignored.suppresses(category, subject, now)
    }

    /// Fold a backend-reported active operation into the registry as minimized.
    ///
    /// Skipped when the registry already tracks that subject for the category
    /// or when the subject finished locally a moment ago. A slot held by a
    /// different subject is replaced.
    pub fn adopt(&mut self, category: TaskCategory, subject: AppId, restore: RestoreAction) -> bool {
        self.adopt_at(category, subject, restore, Instant::now())
    }

    pub fn adopt_at(&mut self, category: TaskCategory, subject: AppId, restore: RestoreAction, now: Instant) -> bool {
        if self.is_tracking(category, subject) {
            return false;
        }
        if self.should_ignore_at(category, subject, now) {
            debug!("Not adopting {} task for app {}: finished recently", category, subject);
            return false;
        }

        if let Some(previous) = self.slots.get(&category) {
            warn!(
                "Backend reports {} task for app {} while app {} is tracked locally; adopting backend state",
                category, subject, previous.subject
            );
        } else {
            info!("Adopting active {} task for app {} as minimized", category, subject);
        }

        self.slots.insert(
            category,
            TaskSlot {
                category,
                subject,
                visibility: Visibility::Minimized,
                restore: Some(restore),
            },
        );
        self.render_dock();
        true
    }

    pub fn slot(&self, category: TaskCategory) -> Option<&TaskSlot> {
        self.slots.get(&category)
    }

    pub fn is_tracking(&self, category: TaskCategory, subject: AppId) -> bool {
        self.slots.get(&category).is_some_and(|slot| slot.subject == subject)
    }

    pub fn is_idle(&self, category: TaskCategory) -> bool {
        !self.slots.contains_key(&category)
    }

    /// Slots in dock order
    pub fn slots(&self) -> impl Iterator<Item = &TaskSlot> {
        TaskCategory::ALL.into_iter().filter_map(|category| self.slots.get(&category))
    }

    pub fn ignored_len(&self) -> usize {
        self.ignored.len()
    }

    pub fn dock_view(&self) -> DockView {
        dock::render(self)
    }

    pub fn render_dock(&self) {
        self.surface.render_dock(&self.dock_view());
    }
}
