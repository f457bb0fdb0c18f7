use std::sync::atomic::{AtomicBool, Ordering};

/// Tracks whether the "restart Steam" banner is already up.
///
/// The banner is raised at most once per process.
#[derive(Debug, Default)]
pub struct RestartBanner {
    raised: AtomicBool,
}

impl RestartBanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// True only for the first caller
    pub fn raise(&self) -> bool {
        !self.raised.swap(true, Ordering::SeqCst)
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }
}
