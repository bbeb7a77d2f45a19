//! A headless incremental-loading controller.
//!
//! For visibility-driven triggering (sentinel elements, observers), see the `pager-adapter` crate.
//!
//! This crate focuses on the state machine behind "load more as the user scrolls" lists:
//! deciding when the next page may be requested, bounded per-page retries with an optional pause
//! between attempts, fallback records on failure, and deduplicated accumulation of results.
//!
//! It is UI-agnostic. A display layer is expected to provide:
//! - an async page fetch function
//! - the `load_more` signal (is there more to fetch?)
//! - a trigger that calls [`Pager::advance`] (typically when a sentinel becomes visible)
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

mod attempts;
mod config;
mod dedupe;
mod error;
#[cfg(feature = "json")]
mod json;
mod key;
mod margin;
mod options;
mod pager;
mod state;
mod types;


pub use attempts::AttemptTracker;
pub use config::{DEFAULT_INITIAL_PAGE, DEFAULT_MAX_ATTEMPTS, DEFAULT_THRESHOLD, PagerConfig};
pub use dedupe::{dedupe, dedupe_by};
pub use error::{OptionsError, RootMarginError};
#[cfg(feature = "json")]
pub use json::JsonKey;
pub use key::{IdKey, IdKeyFn, IdPresenceFn};
pub use margin::{MarginLength, RootMargin};
pub use options::{
    CursorMode, FetchMore, OnChangeCallback, OnLoadMore, PagerOptions, TerminalCallback,
};
pub use pager::Pager;
pub use state::{Phase, Settlement, Snapshot};
pub use types::{AdvanceOutcome, Guards, PageRequest, PageResponse, SkipReason};

#[doc(hidden)]
pub use key::IdentityKey;
