/// Argument passed to a `fetch_more` function in [`crate::CursorMode::ExternalFlag`] mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PageRequest {
    pub page: u64,
}

/// A page returned by a `fetch_more` function in [`crate::CursorMode::ExternalFlag`] mode.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PageResponse<T> {
    pub data: Vec<T>,
}

impl<T> From<Vec<T>> for PageResponse<T> {
    fn from(data: Vec<T>) -> Self {
        Self { data }
    }
}

/// Why a call to `Pager::advance` did not start a fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SkipReason {
    /// A fetch is already in flight.
    Loading,
    /// The `load_more` / `has_next_page` signal is off.
    Gated,
    /// The page was already fetched successfully; waiting for the cursor to move.
    PageAlreadyLoaded(u64),
    /// The current page used up its attempt budget.
    AttemptsExhausted { attempts: u32 },
    /// The current page is past the configured `max_page`.
    PastMaxPage { page: u64, max_page: u64 },
    /// The pager was torn down.
    TornDown,
}

/// What a call to `Pager::advance` ended up doing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AdvanceOutcome {
    Skipped(SkipReason),
    /// `received` new records arrived; `total` is the accumulated length after deduplication.
    Loaded {
        page: u64,
        received: usize,
        total: usize,
    },
    /// The fetch failed; `exhausted` is set when this failure used up the attempt budget.
    Failed {
        page: u64,
        attempts: u32,
        exhausted: bool,
    },
    /// The fetch finished after teardown and its result was dropped.
    Discarded { page: u64 },
}

impl AdvanceOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }
}

/// Guard-relevant view of the pager state.
///
/// Both `Pager::advance` and the visibility adapter evaluate the same guards, so a trigger is
/// only attached while a fetch could actually start.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Guards {
    pub load_more: bool,
    pub loading: bool,
    pub page: u64,
    /// Always `None` in [`crate::CursorMode::ExternalFlag`] mode.
    pub last_completed_page: Option<u64>,
    pub attempts: u32,
    pub max_attempts: u32,
    pub max_page: Option<u64>,
}

impl Guards {
    pub fn blocked_reason(&self) -> Option<SkipReason> {
        if self.loading {
            return Some(SkipReason::Loading);
        }
        if !self.load_more {
            return Some(SkipReason::Gated);
        }
        if self.last_completed_page == Some(self.page) {
            return Some(SkipReason::PageAlreadyLoaded(self.page));
        }
        if self.attempts >= self.max_attempts {
            return Some(SkipReason::AttemptsExhausted {
                attempts: self.attempts,
            });
        }
        match self.max_page {
            Some(max_page) if self.page > max_page => Some(SkipReason::PastMaxPage {
                page: self.page,
                max_page,
            }),
            _ => None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.blocked_reason().is_none()
    }
}
