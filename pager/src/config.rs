use crate::{OptionsError, RootMargin};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_THRESHOLD: f32 = 0.5;
pub const DEFAULT_INITIAL_PAGE: u64 = 1;

/// The plain-data part of [`crate::PagerOptions`].
///
/// Useful when limits come from a settings file: with `feature = "serde"` every field is
/// optional on input and falls back to its default.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct PagerConfig {
    pub initial_page: u64,
    pub max_attempts: u32,
    pub max_page: Option<u64>,
    pub threshold: f32,
    pub root_margin: RootMargin,
    /// Pause after each attempt, in milliseconds. `0` disables the pause.
    pub timeout_ms: u64,
}

impl Default for PagerConfig {
    fn default() -> Self {
        Self {
            initial_page: DEFAULT_INITIAL_PAGE,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            max_page: None,
            threshold: DEFAULT_THRESHOLD,
            root_margin: RootMargin::ZERO,
            timeout_ms: 0,
        }
    }
}

impl PagerConfig {
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.max_attempts == 0 {
            return Err(OptionsError::ZeroMaxAttempts);
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(OptionsError::ThresholdOutOfRange(self.threshold));
        }
        Ok(())
    }
}
