use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::config::{DEFAULT_INITIAL_PAGE, DEFAULT_MAX_ATTEMPTS, DEFAULT_THRESHOLD};
use crate::{IdKey, OptionsError, PageRequest, PageResponse, PagerConfig, RootMargin, Snapshot};

/// A callback fired once when a terminal condition (max attempts, max page) is reached.
pub type TerminalCallback = Arc<dyn Fn() + Send + Sync>;

/// A callback fired with the new snapshot after every pager state transition.
pub type OnChangeCallback<T, E> = Arc<dyn Fn(&Snapshot<T, E>) + Send + Sync>;

/// Fetches a page by index (`onLoadMore(page)`).
pub type OnLoadMore<T, E> = Arc<dyn Fn(u64) -> BoxFuture<'static, Result<Vec<T>, E>> + Send + Sync>;

/// Fetches a page from a request object (`fetchMore({ page })`).
pub type FetchMore<T, E> =
    Arc<dyn Fn(PageRequest) -> BoxFuture<'static, Result<PageResponse<T>, E>> + Send + Sync>;

/// How the pager tracks its position and asks for pages.
pub enum CursorMode<T, E> {
    /// Page index driven by the `load_more` signal, with "last completed page" bookkeeping so
    /// the same page is never fetched twice in a row.
    PageIndex(OnLoadMore<T, E>),
    /// Page index paired with an externally supplied `has_next_page` flag. No last-completed
    /// bookkeeping is kept.
    ExternalFlag(FetchMore<T, E>),
}

impl<T, E> CursorMode<T, E> {
    pub fn is_page_index(&self) -> bool {
        matches!(self, Self::PageIndex(_))
    }
}

impl<T, E> Clone for CursorMode<T, E> {
    fn clone(&self) -> Self {
        match self {
            Self::PageIndex(f) => Self::PageIndex(Arc::clone(f)),
            Self::ExternalFlag(f) => Self::ExternalFlag(Arc::clone(f)),
        }
    }
}

impl<T, E> core::fmt::Debug for CursorMode<T, E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::PageIndex(_) => f.write_str("PageIndex(..)"),
            Self::ExternalFlag(_) => f.write_str("ExternalFlag(..)"),
        }
    }
}

/// Configuration for [`crate::Pager`].
///
/// Options are fixed for the lifetime of a pager; to reconfigure, build a new one. Callbacks are
/// stored in `Arc`s so cloning is cheap apart from the seed/fallback vectors.
pub struct PagerOptions<T, E, K = String> {
    pub mode: CursorMode<T, E>,
    /// Initial `load_more` / `has_next_page` signal.
    pub load_more: bool,
    pub id_key: Option<IdKey<T, K>>,
    pub initial_data: Vec<T>,
    pub initial_page: u64,

    /// Passed through to the visibility capability.
    pub threshold: f32,
    /// Passed through to the visibility capability.
    pub root_margin: RootMargin,

    /// Attempts allowed per page before the pager stops retrying it.
    pub max_attempts: u32,
    /// Pause after each attempt (while attempts remain), in milliseconds.
    pub timeout_ms: u64,
    pub max_page: Option<u64>,

    /// Appended to the accumulated items whenever a fetch fails.
    pub fallback_data: Vec<T>,

    pub on_max_attempts_reached: Option<TerminalCallback>,
    pub on_max_page_reached: Option<TerminalCallback>,
    pub on_change: Option<OnChangeCallback<T, E>>,
}

impl<T: Clone, E, K> Clone for PagerOptions<T, E, K> {
    fn clone(&self) -> Self {
        Self {
            mode: self.mode.clone(),
            load_more: self.load_more,
            id_key: self.id_key.clone(),
            initial_data: self.initial_data.clone(),
            initial_page: self.initial_page,
            threshold: self.threshold,
            root_margin: self.root_margin,
            max_attempts: self.max_attempts,
            timeout_ms: self.timeout_ms,
            max_page: self.max_page,
            fallback_data: self.fallback_data.clone(),
            on_max_attempts_reached: self.on_max_attempts_reached.clone(),
            on_max_page_reached: self.on_max_page_reached.clone(),
            on_change: self.on_change.clone(),
        }
    }
}

impl<T, E> PagerOptions<T, E, String> {
    /// Creates options for a page-index driven pager.
    ///
    /// `on_load_more(page)` resolves to the records of `page`. Fetching starts enabled
    /// (`load_more = true`); use [`Self::with_load_more`] to start gated.
    pub fn new<F, Fut>(on_load_more: F) -> Self
    where
        F: Fn(u64) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<T>, E>> + Send + 'static,
    {
        Self::with_mode(CursorMode::PageIndex(Arc::new(move |page| {
            on_load_more(page).boxed()
        })))
    }

    /// Creates options for a pager driven by an external `has_next_page` flag.
    ///
    /// `fetch_more(PageRequest { page })` resolves to `PageResponse { data }`.
    pub fn new_external_flag<F, Fut>(has_next_page: bool, fetch_more: F) -> Self
    where
        F: Fn(PageRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<PageResponse<T>, E>> + Send + 'static,
    {
        Self::with_mode(CursorMode::ExternalFlag(Arc::new(move |req| {
            fetch_more(req).boxed()
        })))
        .with_load_more(has_next_page)
    }

    pub fn with_mode(mode: CursorMode<T, E>) -> Self {
        Self {
            mode,
            load_more: true,
            id_key: None,
            initial_data: Vec::new(),
            initial_page: DEFAULT_INITIAL_PAGE,
            threshold: DEFAULT_THRESHOLD,
            root_margin: RootMargin::ZERO,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            timeout_ms: 0,
            max_page: None,
            fallback_data: Vec::new(),
            on_max_attempts_reached: None,
            on_max_page_reached: None,
            on_change: None,
        }
    }
}

impl<T, E, K> PagerOptions<T, E, K> {
    /// Sets the identity accessor used to deduplicate records (changes the key type).
    pub fn with_id_key<K2>(self, id_key: IdKey<T, K2>) -> PagerOptions<T, E, K2> {
        PagerOptions {
            mode: self.mode,
            load_more: self.load_more,
            id_key: Some(id_key),
            initial_data: self.initial_data,
            initial_page: self.initial_page,
            threshold: self.threshold,
            root_margin: self.root_margin,
            max_attempts: self.max_attempts,
            timeout_ms: self.timeout_ms,
            max_page: self.max_page,
            fallback_data: self.fallback_data,
            on_max_attempts_reached: self.on_max_attempts_reached,
            on_max_page_reached: self.on_max_page_reached,
            on_change: self.on_change,
        }
    }

    pub fn with_load_more(mut self, load_more: bool) -> Self {
        self.load_more = load_more;
        self
    }

    pub fn with_initial_data(mut self, initial_data: Vec<T>) -> Self {
        self.initial_data = initial_data;
        self
    }

    pub fn with_initial_page(mut self, initial_page: u64) -> Self {
        self.initial_page = initial_page;
        self
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_root_margin(mut self, root_margin: RootMargin) -> Self {
        self.root_margin = root_margin;
        self
    }

    /// Parses and sets the root margin (e.g. `"0px 0px 200px 0px"`).
    pub fn try_with_root_margin(mut self, root_margin: &str) -> Result<Self, OptionsError> {
        self.root_margin = root_margin.parse()?;
        Ok(self)
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_max_page(mut self, max_page: Option<u64>) -> Self {
        self.max_page = max_page;
        self
    }

    pub fn with_fallback_data(mut self, fallback_data: Vec<T>) -> Self {
        self.fallback_data = fallback_data;
        self
    }

    pub fn with_on_max_attempts_reached(
        mut self,
        on_max_attempts_reached: Option<impl Fn() + Send + Sync + 'static>,
    ) -> Self {
        self.on_max_attempts_reached = on_max_attempts_reached.map(|f| Arc::new(f) as _);
        self
    }

    pub fn with_on_max_page_reached(
        mut self,
        on_max_page_reached: Option<impl Fn() + Send + Sync + 'static>,
    ) -> Self {
        self.on_max_page_reached = on_max_page_reached.map(|f| Arc::new(f) as _);
        self
    }

    pub fn with_on_change(
        mut self,
        on_change: Option<impl Fn(&Snapshot<T, E>) + Send + Sync + 'static>,
    ) -> Self {
        self.on_change = on_change.map(|f| Arc::new(f) as _);
        self
    }

    /// Applies every field of a [`PagerConfig`].
    pub fn with_config(mut self, config: PagerConfig) -> Self {
        self.initial_page = config.initial_page;
        self.max_attempts = config.max_attempts;
        self.max_page = config.max_page;
        self.threshold = config.threshold;
        self.root_margin = config.root_margin;
        self.timeout_ms = config.timeout_ms;
        self
    }

    /// The plain-data part of these options.
    pub fn config(&self) -> PagerConfig {
        PagerConfig {
            initial_page: self.initial_page,
            max_attempts: self.max_attempts,
            max_page: self.max_page,
            threshold: self.threshold,
            root_margin: self.root_margin,
            timeout_ms: self.timeout_ms,
        }
    }

    pub fn validate(&self) -> Result<(), OptionsError> {
        self.config().validate()
    }
}

impl<T, E, K> core::fmt::Debug for PagerOptions<T, E, K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PagerOptions")
            .field("mode", &self.mode)
            .field("load_more", &self.load_more)
            .field("id_key", &self.id_key.is_some())
            .field("initial_data_len", &self.initial_data.len())
            .field("initial_page", &self.initial_page)
            .field("threshold", &self.threshold)
            .field("root_margin", &self.root_margin)
            .field("max_attempts", &self.max_attempts)
            .field("timeout_ms", &self.timeout_ms)
            .field("max_page", &self.max_page)
            .field("fallback_data_len", &self.fallback_data.len())
            .finish_non_exhaustive()
    }
}
