use std::mem;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::attempts::AttemptTracker;
use crate::key::IdentityKey;
use crate::{
    AdvanceOutcome, CursorMode, Guards, OnChangeCallback, OptionsError, PageRequest, PagerOptions,
    Phase, Settlement, SkipReason, Snapshot, dedupe,
};

struct State<T, E> {
    items: Vec<T>,
    page: u64,
    phase: Phase,
    error: Option<E>,
    load_more: bool,
    attempts: AttemptTracker,
    last_completed_page: Option<u64>,
    mounted: bool,
    on_change: Option<OnChangeCallback<T, E>>,
}

struct Shared<T, E, K> {
    options: PagerOptions<T, E, K>,
    state: Mutex<State<T, E>>,
}

/// A headless incremental-loading controller.
///
/// The pager owns the accumulated records, the page cursor and the loading/error state, and runs
/// at most one fetch at a time. It does not observe anything by itself: something (usually the
/// visibility adapter in `pager-adapter`) calls [`Pager::advance`] when more content is wanted.
///
/// `Pager` is a cheap handle; clones share the same state. The internal lock is only held for
/// short synchronous sections, never across a fetch or while user callbacks run.
pub struct Pager<T, E, K = String> {
    shared: Arc<Shared<T, E, K>>,
}

impl<T, E, K> Clone for Pager<T, E, K> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T, E, K> core::fmt::Debug for Pager<T, E, K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("Pager")
            .field("options", &self.shared.options)
            .field("items_len", &state.items.len())
            .field("page", &state.page)
            .field("phase", &state.phase)
            .field("load_more", &state.load_more)
            .field("attempts", &state.attempts.count())
            .field("last_completed_page", &state.last_completed_page)
            .field("mounted", &state.mounted)
            .finish_non_exhaustive()
    }
}

impl<T, E, K> Pager<T, E, K> {
    pub fn is_mounted(&self) -> bool {
        self.shared.state.lock().mounted
    }

    /// Unmounts the pager. Later `advance` calls are skipped and a fetch still in flight has its
    /// result dropped without touching the state or firing callbacks.
    pub fn teardown(&self) {
        let mut state = self.shared.state.lock();
        if state.mounted {
            pdebug!(page = state.page, "teardown");
        }
        state.mounted = false;
        state.on_change = None;
    }
}

impl<T, E, K> Pager<T, E, K>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
    K: IdentityKey + Send + Sync + 'static,
{
    /// Creates a mounted pager seeded from `initial_data` / `initial_page`.
    ///
    /// The seed is deduplicated right away when an identity key is configured.
    pub fn new(mut options: PagerOptions<T, E, K>) -> Result<Self, OptionsError> {
        options.validate()?;
        pdebug!(
            mode = ?options.mode,
            initial_page = options.initial_page,
            max_attempts = options.max_attempts,
            max_page = ?options.max_page,
            timeout_ms = options.timeout_ms,
            "Pager::new"
        );

        let items = dedupe(mem::take(&mut options.initial_data), options.id_key.as_ref());
        let last_completed_page = if options.mode.is_page_index() {
            options.initial_page.checked_sub(1)
        } else {
            None
        };
        let state = State {
            items,
            page: options.initial_page,
            phase: Phase::Idle,
            error: None,
            load_more: options.load_more,
            attempts: AttemptTracker::new(),
            last_completed_page,
            mounted: true,
            on_change: options.on_change.clone(),
        };
        Ok(Self {
            shared: Arc::new(Shared {
                options,
                state: Mutex::new(state),
            }),
        })
    }

    pub fn options(&self) -> &PagerOptions<T, E, K> {
        &self.shared.options
    }

    pub fn snapshot(&self) -> Snapshot<T, E> {
        snapshot_of(&self.shared.state.lock())
    }

    pub fn items(&self) -> Vec<T> {
        self.shared.state.lock().items.clone()
    }

    pub fn len(&self) -> usize {
        self.shared.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn page(&self) -> u64 {
        self.shared.state.lock().page
    }

    pub fn phase(&self) -> Phase {
        self.shared.state.lock().phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase().is_loading()
    }

    pub fn error(&self) -> Option<E> {
        self.shared.state.lock().error.clone()
    }

    pub fn attempts(&self) -> u32 {
        self.shared.state.lock().attempts.count()
    }

    pub fn last_completed_page(&self) -> Option<u64> {
        self.shared.state.lock().last_completed_page
    }

    pub fn load_more(&self) -> bool {
        self.shared.state.lock().load_more
    }

    /// Updates the `load_more` signal. A change is published like any other transition.
    pub fn set_load_more(&self, load_more: bool) {
        {
            let mut state = self.shared.state.lock();
            if state.load_more == load_more || !state.mounted {
                return;
            }
            state.load_more = load_more;
        }
        ptrace!(load_more, "set_load_more");
        self.publish();
    }

    /// Same as [`Self::set_load_more`], named after the external-flag API.
    pub fn set_has_next_page(&self, has_next_page: bool) {
        self.set_load_more(has_next_page);
    }

    /// Replaces the snapshot subscriber.
    pub fn set_on_change(
        &self,
        on_change: Option<impl Fn(&Snapshot<T, E>) + Send + Sync + 'static>,
    ) {
        self.shared.state.lock().on_change = on_change.map(|f| Arc::new(f) as _);
    }

    pub fn guards(&self) -> Guards {
        self.guards_of(&self.shared.state.lock())
    }

    /// Why `advance` would currently be a no-op, if it would be.
    pub fn blocked_reason(&self) -> Option<SkipReason> {
        let state = self.shared.state.lock();
        if !state.mounted {
            return Some(SkipReason::TornDown);
        }
        self.guards_of(&state).blocked_reason()
    }

    /// Fetches the current page if every guard allows it.
    ///
    /// Guards are checked and the pager is switched to loading in one step, before the first
    /// suspension point, so concurrent calls start at most one fetch. Fetch errors are recorded in
    /// the snapshot and never returned.
    pub async fn advance(&self) -> AdvanceOutcome {
        let page = match self.begin() {
            Ok(page) => page,
            Err(reason) => return AdvanceOutcome::Skipped(reason),
        };

        let result = match &self.shared.options.mode {
            CursorMode::PageIndex(on_load_more) => on_load_more(page).await,
            CursorMode::ExternalFlag(fetch_more) => {
                fetch_more(PageRequest { page }).await.map(|res| res.data)
            }
        };

        let Some((outcome, pause)) = self.settle(page, result) else {
            pdebug!(page, "fetch finished after teardown; result dropped");
            return AdvanceOutcome::Discarded { page };
        };

        if pause {
            tokio::time::sleep(Duration::from_millis(self.shared.options.timeout_ms)).await;
        }
        self.finish(&outcome);
        outcome
    }

    fn begin(&self) -> Result<u64, SkipReason> {
        let page = {
            let mut state = self.shared.state.lock();
            if !state.mounted {
                return Err(SkipReason::TornDown);
            }
            if let Some(reason) = self.guards_of(&state).blocked_reason() {
                ptrace!(?reason, page = state.page, "advance skipped");
                return Err(reason);
            }
            state.phase = Phase::Loading;
            state.attempts.begin_attempt();
            pdebug!(
                page = state.page,
                attempt = state.attempts.count(),
                "fetching page"
            );
            state.page
        };
        self.publish();
        Ok(page)
    }

    /// Applies a fetch result. Returns `None` when the pager was torn down meanwhile, otherwise
    /// the outcome and whether to pause before leaving the loading phase.
    fn settle(&self, page: u64, result: Result<Vec<T>, E>) -> Option<(AdvanceOutcome, bool)> {
        let options = &self.shared.options;
        let mut max_page_reached = false;
        let mut max_attempts_reached = false;

        let (outcome, pause) = {
            let mut state = self.shared.state.lock();
            if !state.mounted {
                return None;
            }

            let outcome = match result {
                Ok(batch) => {
                    let received = batch.len();
                    let mut merged = mem::take(&mut state.items);
                    merged.extend(batch);
                    state.items = dedupe(merged, options.id_key.as_ref());
                    if options.mode.is_page_index() {
                        state.last_completed_page = Some(page);
                    }
                    state.page = page.saturating_add(1);
                    state.attempts.on_success();

                    // Compares the page that was just fetched, not the new cursor.
                    max_page_reached = options.max_page.is_some_and(|max| page > max);

                    pdebug!(page, received, total = state.items.len(), "page loaded");
                    AdvanceOutcome::Loaded {
                        page,
                        received,
                        total: state.items.len(),
                    }
                }
                Err(error) => {
                    let attempts = state.attempts.count();
                    max_attempts_reached = state.attempts.has_reached_ceiling(options.max_attempts);
                    state.error = Some(error);
                    state.items.extend(options.fallback_data.iter().cloned());

                    pwarn!(
                        page,
                        attempts,
                        max_attempts = options.max_attempts,
                        "page fetch failed"
                    );
                    AdvanceOutcome::Failed {
                        page,
                        attempts,
                        exhausted: max_attempts_reached,
                    }
                }
            };

            let pause = options.timeout_ms > 0
                && !state.attempts.has_reached_ceiling(options.max_attempts);
            (outcome, pause)
        };

        if max_attempts_reached {
            pwarn!(page, "max attempts reached");
            if let Some(cb) = &options.on_max_attempts_reached {
                cb();
            }
        }
        if max_page_reached {
            pwarn!(page, max_page = ?options.max_page, "max page reached");
            if let Some(cb) = &options.on_max_page_reached {
                cb();
            }
        }

        self.publish();
        Some((outcome, pause))
    }

    fn finish(&self, outcome: &AdvanceOutcome) {
        {
            let mut state = self.shared.state.lock();
            if !state.mounted {
                return;
            }
            state.phase = Phase::Settled(match outcome {
                AdvanceOutcome::Failed { .. } => Settlement::Error,
                _ => Settlement::Success,
            });
        }
        self.publish();
    }

    fn guards_of(&self, state: &State<T, E>) -> Guards {
        Guards {
            load_more: state.load_more,
            loading: state.phase.is_loading(),
            page: state.page,
            last_completed_page: state.last_completed_page,
            attempts: state.attempts.count(),
            max_attempts: self.shared.options.max_attempts,
            max_page: self.shared.options.max_page,
        }
    }

    fn publish(&self) {
        let (snapshot, on_change) = {
            let state = self.shared.state.lock();
            if !state.mounted {
                return;
            }
            let Some(on_change) = state.on_change.clone() else {
                return;
            };
            (snapshot_of(&state), on_change)
        };
        on_change(&snapshot);
    }
}

fn snapshot_of<T: Clone, E: Clone>(state: &State<T, E>) -> Snapshot<T, E> {
    Snapshot {
        items: state.items.clone(),
        page: state.page,
        loading: state.phase.is_loading(),
        error: state.error.clone(),
        load_more: state.load_more,
    }
}
