use thiserror::Error;

/// Rejected pager configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptionsError {
    #[error("max_attempts must be at least 1")]
    ZeroMaxAttempts,
    #[error("threshold must be within [0, 1], got {0}")]
    ThresholdOutOfRange(f32),
    #[error("invalid root margin: {0}")]
    InvalidRootMargin(#[from] RootMarginError),
}

/// A root margin string that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RootMarginError {
    #[error("expected 1 to 4 margin components, got {0}")]
    ComponentCount(usize),
    #[error("`{0}` is not a pixel or percentage length")]
    InvalidLength(String),
}
