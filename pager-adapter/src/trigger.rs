use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use pager::{Guards, SkipReason};

use crate::{Detach, ObserveOptions, OnIntersect, VisibilityEntry, VisibilityObserver};

/// What a call to [`VisibilityTrigger::reconcile`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reconciled {
    /// Guards, options and target are unchanged; the current observation stays.
    Unchanged,
    /// A new observation was attached (any previous one was detached first).
    Attached,
    /// The previous observation (if any) was dropped and nothing was attached.
    Idle(IdleReason),
}

/// Why the trigger is not observing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdleReason {
    NoSentinel,
    Blocked(SkipReason),
    TornDown,
}

#[derive(Clone, Debug, PartialEq)]
struct AttachKey<S> {
    guards: Guards,
    options: ObserveOptions,
    target: S,
}

struct Attachment<S> {
    key: AttachKey<S>,
    live: Arc<AtomicBool>,
    detach: Detach,
}

impl<S> Attachment<S> {
    fn detach(self) {
        self.live.store(false, Ordering::Release);
        self.detach.detach();
    }
}

/// Wraps a [`VisibilityObserver`] and calls a trigger when the sentinel becomes visible.
///
/// The trigger only observes while the pager guards are open, and re-attaches whenever any
/// guard input, observe option or the sentinel itself changes, so an observation never fires
/// with outdated guard values. Reports arriving through a detached observation are ignored.
pub struct VisibilityTrigger<S> {
    observer: Arc<dyn VisibilityObserver<S>>,
    on_trigger: Arc<dyn Fn() + Send + Sync>,
    attached: Option<Attachment<S>>,
    torn_down: bool,
}

impl<S: Clone + PartialEq> VisibilityTrigger<S> {
    pub fn new(
        observer: Arc<dyn VisibilityObserver<S>>,
        on_trigger: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        Self {
            observer,
            on_trigger: Arc::new(on_trigger),
            attached: None,
            torn_down: false,
        }
    }

    /// Brings the observation in line with the latest guards.
    ///
    /// Call this after every pager snapshot update and whenever the sentinel changes.
    pub fn reconcile(
        &mut self,
        guards: Guards,
        options: ObserveOptions,
        target: Option<&S>,
    ) -> Reconciled {
        if self.torn_down {
            return Reconciled::Idle(IdleReason::TornDown);
        }

        let wanted = match (target, guards.blocked_reason()) {
            (None, _) => Err(IdleReason::NoSentinel),
            (Some(_), Some(reason)) => Err(IdleReason::Blocked(reason)),
            (Some(target), None) => Ok(AttachKey {
                guards,
                options,
                target: target.clone(),
            }),
        };

        if let (Some(current), Ok(key)) = (&self.attached, &wanted) {
            if current.key == *key {
                return Reconciled::Unchanged;
            }
        }

        if let Some(previous) = self.attached.take() {
            atrace!(page = previous.key.guards.page, "detach observation");
            previous.detach();
        }

        let key = match wanted {
            Ok(key) => key,
            Err(reason) => {
                atrace!(?reason, "not observing");
                return Reconciled::Idle(reason);
            }
        };

        let live = Arc::new(AtomicBool::new(true));
        let on_intersect: OnIntersect = {
            let live = Arc::clone(&live);
            let on_trigger = Arc::clone(&self.on_trigger);
            Arc::new(move |entries: &[VisibilityEntry]| {
                if !live.load(Ordering::Acquire) {
                    return;
                }
                // Only the first report of a batch counts.
                if entries.first().is_some_and(|e| e.is_intersecting) {
                    on_trigger();
                }
            })
        };

        atrace!(
            page = key.guards.page,
            threshold = key.options.threshold,
            "attach observation"
        );
        // The capability may report synchronously from inside `attach`.
        let detach = self.observer.attach(&key.target, &key.options, on_intersect);
        self.attached = Some(Attachment { key, live, detach });
        Reconciled::Attached
    }
}

impl<S> VisibilityTrigger<S> {
    pub fn is_observing(&self) -> bool {
        self.attached.is_some()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Stops observing for good; later `reconcile` calls do nothing.
    pub fn teardown(&mut self) {
        if let Some(previous) = self.attached.take() {
            previous.detach();
        }
        if !self.torn_down {
            adebug!("visibility trigger torn down");
        }
        self.torn_down = true;
    }
}

impl<S> Drop for VisibilityTrigger<S> {
    fn drop(&mut self) {
        if let Some(previous) = self.attached.take() {
            previous.detach();
        }
    }
}
