use std::fmt;
use std::sync::Arc;

use pager::RootMargin;

/// One visibility report for an observed target.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VisibilityEntry {
    pub is_intersecting: bool,
    pub intersection_ratio: f32,
}

impl VisibilityEntry {
    pub fn visible() -> Self {
        Self {
            is_intersecting: true,
            intersection_ratio: 1.0,
        }
    }

    pub fn hidden() -> Self {
        Self {
            is_intersecting: false,
            intersection_ratio: 0.0,
        }
    }
}

/// Options handed to the visibility capability on attach.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObserveOptions {
    pub threshold: f32,
    pub root_margin: RootMargin,
}

impl Default for ObserveOptions {
    fn default() -> Self {
        Self {
            threshold: pager::DEFAULT_THRESHOLD,
            root_margin: RootMargin::ZERO,
        }
    }
}

/// Callback invoked by a capability with a batch of visibility reports.
pub type OnIntersect = Arc<dyn Fn(&[VisibilityEntry]) + Send + Sync>;

/// The external visibility-detection capability (an intersection observer).
///
/// Implementations report visibility changes of `target` through `on_intersect` until the
/// returned [`Detach`] is consumed or dropped. After detachment `on_intersect` must not be called
/// again.
pub trait VisibilityObserver<S>: Send + Sync {
    fn attach(&self, target: &S, options: &ObserveOptions, on_intersect: OnIntersect) -> Detach;
}

/// Stops an observation when consumed or dropped.
#[must_use = "dropping a Detach stops the observation immediately"]
pub struct Detach {
    f: Option<Box<dyn FnOnce() + Send>>,
}

impl Detach {
    pub fn new(f: impl FnOnce() + Send + 'static) -> Self {
        Self {
            f: Some(Box::new(f)),
        }
    }

    /// A handle for capabilities that need no cleanup.
    pub fn noop() -> Self {
        Self { f: None }
    }

    pub fn detach(mut self) {
        self.run();
    }

    fn run(&mut self) {
        if let Some(f) = self.f.take() {
            f();
        }
    }
}

impl Drop for Detach {
    fn drop(&mut self) {
        self.run();
    }
}

impl fmt::Debug for Detach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Detach")
            .field("pending", &self.f.is_some())
            .finish()
    }
}
