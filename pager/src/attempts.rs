/// Counts consecutive attempts for the page currently being fetched.
///
/// The counter is bumped before every fetch (the first one included), cleared on success and
/// never decremented on failure.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AttemptTracker {
    count: u32,
}

impl AttemptTracker {
    pub const fn new() -> Self {
        Self { count: 0 }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn begin_attempt(&mut self) {
        self.count = self.count.saturating_add(1);
    }

    pub fn on_success(&mut self) {
        self.count = 0;
    }

    pub fn has_reached_ceiling(&self, max_attempts: u32) -> bool {
        self.count >= max_attempts
    }
}
