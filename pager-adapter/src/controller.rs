use std::sync::Arc;

use pager::{AdvanceOutcome, IdentityKey, OptionsError, Pager, PagerOptions, Snapshot};
use parking_lot::Mutex;
use tokio::runtime::Handle;

use crate::{
    IdleReason, ObserveOptions, Reconciled, SentinelRef, VisibilityObserver, VisibilityTrigger,
};

/// The surface a display layer reads: the pager snapshot plus the sentinel handle.
#[derive(Clone, Debug)]
pub struct View<T, E, S> {
    pub page: u64,
    pub data: Vec<T>,
    pub error: Option<E>,
    pub loading: bool,
    pub load_more: bool,
    /// Fill this with the sentinel rendered after the list.
    pub load_more_ref: SentinelRef<S>,
}

struct Inner<T, E, K, S> {
    pager: Pager<T, E, K>,
    sentinel: SentinelRef<S>,
    trigger: Mutex<VisibilityTrigger<S>>,
    observe: ObserveOptions,
}

impl<T, E, K, S> Inner<T, E, K, S>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
    K: IdentityKey + Send + Sync + 'static,
    S: Clone + PartialEq + Send + Sync + 'static,
{
    fn reconcile(&self) -> Reconciled {
        // Guards are read under the trigger lock so concurrent reconciles cannot attach with
        // stale values.
        let mut trigger = self.trigger.lock();
        if !self.pager.is_mounted() {
            trigger.teardown();
            return Reconciled::Idle(IdleReason::TornDown);
        }
        let guards = self.pager.guards();
        let target = self.sentinel.get();
        trigger.reconcile(guards, self.observe, target.as_ref())
    }

    fn teardown(&self) {
        self.trigger.lock().teardown();
        self.pager.teardown();
    }
}

impl<T, E, K, S> Drop for Inner<T, E, K, S> {
    fn drop(&mut self) {
        self.trigger.get_mut().teardown();
        self.pager.teardown();
    }
}

/// A framework-neutral binding of a [`Pager`] to a visibility capability.
///
/// This type does not hold any UI objects. It plays the role of an infinite-scroll hook:
/// - the display layer mounts its sentinel with [`Controller::mount_sentinel`]
/// - every pager snapshot update re-runs [`Controller::reconcile`]
/// - each visible report from the capability spawns one `Pager::advance` on the runtime
///
/// Dropping the last clone (or calling [`Controller::teardown`]) detaches the observer and
/// tears the pager down; a fetch still in flight then completes without touching any state.
pub struct Controller<T, E, K = String, S = u64> {
    inner: Arc<Inner<T, E, K, S>>,
}

impl<T, E, K, S> Clone for Controller<T, E, K, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, E, K, S> Controller<T, E, K, S>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
    K: IdentityKey + Send + Sync + 'static,
    S: Clone + PartialEq + Send + Sync + 'static,
{
    /// Builds the pager and wires it to `observer`. Fetches are spawned on `runtime`.
    ///
    /// An `on_change` set in `options` keeps receiving every snapshot.
    pub fn new(
        options: PagerOptions<T, E, K>,
        observer: impl VisibilityObserver<S> + 'static,
        runtime: Handle,
    ) -> Result<Self, OptionsError> {
        let user_on_change = options.on_change.clone();
        let observe = ObserveOptions {
            threshold: options.threshold,
            root_margin: options.root_margin,
        };
        let pager = Pager::new(options)?;

        let trigger = VisibilityTrigger::new(Arc::new(observer), {
            let pager = pager.clone();
            move || {
                let pager = pager.clone();
                runtime.spawn(async move {
                    let outcome = pager.advance().await;
                    if matches!(outcome, AdvanceOutcome::Failed { exhausted: true, .. }) {
                        awarn!("retries exhausted; observation stays detached");
                    }
                    atrace!(?outcome, "advance finished");
                });
            }
        });

        let inner = Arc::new(Inner {
            pager: pager.clone(),
            sentinel: SentinelRef::new(),
            trigger: Mutex::new(trigger),
            observe,
        });

        let weak = Arc::downgrade(&inner);
        pager.set_on_change(Some(move |snapshot: &Snapshot<T, E>| {
            if let Some(cb) = &user_on_change {
                cb(snapshot);
            }
            if let Some(inner) = weak.upgrade() {
                inner.reconcile();
            }
        }));

        Ok(Self { inner })
    }

    pub fn pager(&self) -> &Pager<T, E, K> {
        &self.inner.pager
    }

    pub fn view(&self) -> View<T, E, S> {
        let snapshot = self.inner.pager.snapshot();
        View {
            page: snapshot.page,
            data: snapshot.items,
            error: snapshot.error,
            loading: snapshot.loading,
            load_more: snapshot.load_more,
            load_more_ref: self.inner.sentinel.clone(),
        }
    }

    pub fn load_more_ref(&self) -> SentinelRef<S> {
        self.inner.sentinel.clone()
    }

    pub fn observe_options(&self) -> ObserveOptions {
        self.inner.observe
    }

    /// Stores the sentinel and starts observing it if the guards allow.
    pub fn mount_sentinel(&self, target: S) -> Reconciled {
        self.inner.sentinel.set(Some(target));
        self.inner.reconcile()
    }

    pub fn unmount_sentinel(&self) -> Reconciled {
        self.inner.sentinel.set(None);
        self.inner.reconcile()
    }

    /// Updates the `load_more` / `has_next_page` signal; the observation follows.
    pub fn set_load_more(&self, load_more: bool) {
        self.inner.pager.set_load_more(load_more);
    }

    /// Re-evaluates the observation against the current pager state.
    ///
    /// Runs automatically after every snapshot update; call it yourself after filling
    /// [`Self::load_more_ref`] directly.
    pub fn reconcile(&self) -> Reconciled {
        self.inner.reconcile()
    }

    pub fn is_observing(&self) -> bool {
        self.inner.trigger.lock().is_observing()
    }

    pub fn teardown(&self) {
        self.inner.teardown();
    }
}

impl<T, E, K, S: core::fmt::Debug> core::fmt::Debug for Controller<T, E, K, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Controller")
            .field("pager", &self.inner.pager)
            .field("sentinel", &self.inner.sentinel)
            .field("observe", &self.inner.observe)
            .finish_non_exhaustive()
    }
}
