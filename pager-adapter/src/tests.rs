use crate::*;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use pager::{Guards, IdKey, PageResponse, PagerOptions, RootMargin, SkipReason};
use parking_lot::Mutex;
use tokio::runtime::Handle;

type Calls = Arc<AtomicUsize>;

fn open_guards(page: u64) -> Guards {
    Guards {
        load_more: true,
        loading: false,
        page,
        last_completed_page: page.checked_sub(1),
        attempts: 0,
        max_attempts: 3,
        max_page: None,
    }
}

fn counting_trigger(observer: &ManualObserver<u64>) -> (Calls, VisibilityTrigger<u64>) {
    let hits = Calls::default();
    let trigger = VisibilityTrigger::new(Arc::new(observer.clone()), {
        let hits = Arc::clone(&hits);
        move || {
            hits.fetch_add(1, Ordering::SeqCst);
        }
    });
    (hits, trigger)
}

/// Keeps every callback it was handed, even after detachment.
#[derive(Clone, Default)]
struct Recording {
    callbacks: Arc<Mutex<Vec<OnIntersect>>>,
}

impl Recording {
    fn callback(&self, index: usize) -> OnIntersect {
        Arc::clone(&self.callbacks.lock()[index])
    }
}

impl VisibilityObserver<u64> for Recording {
    fn attach(
        &self,
        _target: &u64,
        _options: &ObserveOptions,
        on_intersect: OnIntersect,
    ) -> Detach {
        self.callbacks.lock().push(on_intersect);
        Detach::noop()
    }
}

fn numbered_pages(per_page: u64) -> (Calls, PagerOptions<u64, &'static str>) {
    let calls = Calls::default();
    let opts = PagerOptions::new({
        let calls = Arc::clone(&calls);
        move |page: u64| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Ok(((page - 1) * per_page..page * per_page).collect()) }
        }
    });
    (calls, opts)
}

async fn run_until(mut done: impl FnMut() -> bool) {
    for _ in 0..10_000 {
        if done() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}

async fn drain() {
    for _ in 0..200 {
        tokio::task::yield_now().await;
    }
}

#[test]
fn trigger_needs_sentinel_and_open_guards() {
    let observer = ManualObserver::new();
    let (hits, mut trigger) = counting_trigger(&observer);
    let opts = ObserveOptions::default();

    assert_eq!(
        trigger.reconcile(open_guards(1), opts, None),
        Reconciled::Idle(IdleReason::NoSentinel)
    );
    let gated = Guards {
        load_more: false,
        ..open_guards(1)
    };
    assert_eq!(
        trigger.reconcile(gated, opts, Some(&7)),
        Reconciled::Idle(IdleReason::Blocked(SkipReason::Gated))
    );
    assert_eq!(observer.observation_count(), 0);

    assert_eq!(
        trigger.reconcile(open_guards(1), opts, Some(&7)),
        Reconciled::Attached
    );
    assert!(trigger.is_observing());
    assert_eq!(observer.observation_count(), 1);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[test]
fn trigger_reattaches_only_when_inputs_change() {
    let observer = ManualObserver::new();
    observer.set_visible(&7, true);
    let (hits, mut trigger) = counting_trigger(&observer);
    let opts = ObserveOptions::default();

    assert_eq!(
        trigger.reconcile(open_guards(1), opts, Some(&7)),
        Reconciled::Attached
    );
    // A fresh observation of a visible target reports right away.
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    assert_eq!(
        trigger.reconcile(open_guards(1), opts, Some(&7)),
        Reconciled::Unchanged
    );
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    assert_eq!(
        trigger.reconcile(open_guards(2), opts, Some(&7)),
        Reconciled::Attached
    );
    assert_eq!(observer.observation_count(), 1);
    assert_eq!(hits.load(Ordering::SeqCst), 2);

    let wider = ObserveOptions {
        threshold: 0.25,
        root_margin: "0px 0px 200px".parse().unwrap(),
    };
    assert_eq!(
        trigger.reconcile(open_guards(2), wider, Some(&7)),
        Reconciled::Attached
    );
    assert_eq!(observer.observed_with(&7), vec![wider]);

    let loading = Guards {
        loading: true,
        ..open_guards(2)
    };
    assert_eq!(
        trigger.reconcile(loading, wider, Some(&7)),
        Reconciled::Idle(IdleReason::Blocked(SkipReason::Loading))
    );
    assert_eq!(observer.observation_count(), 0);
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[test]
fn trigger_follows_visibility_changes() {
    let observer = ManualObserver::new();
    let (hits, mut trigger) = counting_trigger(&observer);
    trigger.reconcile(open_guards(1), ObserveOptions::default(), Some(&3));

    observer.set_visible(&4, true);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
    observer.set_visible(&3, true);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    observer.set_visible(&3, false);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    observer.set_visible(&3, true);
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[test]
fn only_the_first_entry_of_a_batch_counts() {
    let recording = Recording::default();
    let hits = Calls::default();
    let mut trigger = VisibilityTrigger::new(Arc::new(recording.clone()), {
        let hits = Arc::clone(&hits);
        move || {
            hits.fetch_add(1, Ordering::SeqCst);
        }
    });
    trigger.reconcile(open_guards(1), ObserveOptions::default(), Some(&1));
    let cb = recording.callback(0);

    cb(&[]);
    cb(&[VisibilityEntry::hidden(), VisibilityEntry::visible()]);
    assert_eq!(hits.load(Ordering::SeqCst), 0);

    cb(&[VisibilityEntry::visible(), VisibilityEntry::hidden()]);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn detached_observations_are_ignored() {
    let recording = Recording::default();
    let hits = Calls::default();
    let mut trigger = VisibilityTrigger::new(Arc::new(recording.clone()), {
        let hits = Arc::clone(&hits);
        move || {
            hits.fetch_add(1, Ordering::SeqCst);
        }
    });
    trigger.reconcile(open_guards(1), ObserveOptions::default(), Some(&1));
    trigger.reconcile(open_guards(2), ObserveOptions::default(), Some(&1));
    let stale = recording.callback(0);
    let current = recording.callback(1);

    stale(&[VisibilityEntry::visible()]);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
    current(&[VisibilityEntry::visible()]);
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    trigger.teardown();
    current(&[VisibilityEntry::visible()]);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(
        trigger.reconcile(open_guards(3), ObserveOptions::default(), Some(&1)),
        Reconciled::Idle(IdleReason::TornDown)
    );
    assert!(trigger.is_torn_down());
}

#[test]
fn dropping_the_trigger_detaches() {
    let observer = ManualObserver::new();
    let (_hits, mut trigger) = counting_trigger(&observer);
    trigger.reconcile(open_guards(1), ObserveOptions::default(), Some(&1));
    assert_eq!(observer.observation_count(), 1);
    drop(trigger);
    assert_eq!(observer.observation_count(), 0);
}

#[test]
fn sentinel_ref_shares_its_slot() {
    let a = SentinelRef::new();
    let b = a.clone();
    assert!(!a.is_mounted());
    assert_eq!(b.set(Some(5_u64)), None);
    assert_eq!(a.get(), Some(5));
    assert_eq!(a.set(None), Some(5));
    assert!(!b.is_mounted());
}

#[test]
fn detach_runs_once() {
    let runs = Calls::default();
    let detach = Detach::new({
        let runs = Arc::clone(&runs);
        move || {
            runs.fetch_add(1, Ordering::SeqCst);
        }
    });
    detach.detach();
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    drop(Detach::new({
        let runs = Arc::clone(&runs);
        move || {
            runs.fetch_add(1, Ordering::SeqCst);
        }
    }));
    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn controller_loads_until_max_page() {
    let observer = ManualObserver::new();
    observer.set_visible(&1, true);
    let (calls, opts) = numbered_pages(10);
    let controller =
        Controller::new(opts.with_max_page(Some(10)), observer.clone(), Handle::current()).unwrap();

    assert_eq!(controller.mount_sentinel(1), Reconciled::Attached);
    run_until(|| controller.pager().page() == 11 && !controller.pager().is_loading()).await;
    drain().await;

    let view = controller.view();
    assert_eq!(calls.load(Ordering::SeqCst), 10);
    assert_eq!(view.data, (0..100).collect::<Vec<u64>>());
    assert_eq!(view.page, 11);
    assert!(!view.loading);
    assert!(view.error.is_none());
    assert_eq!(view.load_more_ref.get(), Some(1));
    assert!(!controller.is_observing());
    assert_eq!(observer.observation_count(), 0);
    assert_eq!(
        controller.reconcile(),
        Reconciled::Idle(IdleReason::Blocked(SkipReason::PastMaxPage {
            page: 11,
            max_page: 10
        }))
    );
}

#[tokio::test]
async fn controller_waits_for_the_gate() {
    let observer = ManualObserver::new();
    observer.set_visible(&1, true);
    let (calls, opts) = numbered_pages(10);
    let controller = Controller::new(
        opts.with_load_more(false).with_max_page(Some(2)),
        observer.clone(),
        Handle::current(),
    )
    .unwrap();

    assert_eq!(
        controller.mount_sentinel(1),
        Reconciled::Idle(IdleReason::Blocked(SkipReason::Gated))
    );
    drain().await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    controller.set_load_more(true);
    run_until(|| controller.pager().page() == 3 && !controller.pager().is_loading()).await;
    drain().await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(controller.pager().len(), 20);
}

#[tokio::test]
async fn controller_fetches_when_sentinel_becomes_visible() {
    let observer = ManualObserver::new();
    let (calls, opts) = numbered_pages(5);
    let controller =
        Controller::new(opts.with_max_page(Some(1)), observer.clone(), Handle::current()).unwrap();

    assert_eq!(controller.reconcile(), Reconciled::Idle(IdleReason::NoSentinel));
    controller.mount_sentinel(9);
    drain().await;
    assert!(controller.is_observing());
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    observer.set_visible(&9, true);
    run_until(|| controller.pager().page() == 2 && !controller.pager().is_loading()).await;
    drain().await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(controller.pager().items(), vec![0, 1, 2, 3, 4]);

    assert_eq!(
        controller.unmount_sentinel(),
        Reconciled::Idle(IdleReason::NoSentinel)
    );
}

#[tokio::test]
async fn controller_stops_retrying_at_the_ceiling() {
    let observer = ManualObserver::new();
    observer.set_visible(&1, true);
    let calls = Calls::default();
    let exhausted = Calls::default();
    let opts = PagerOptions::new({
        let calls = Arc::clone(&calls);
        move |_page: u64| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Err::<Vec<u64>, _>("Failed to fetch") }
        }
    })
    .with_on_max_attempts_reached(Some({
        let exhausted = Arc::clone(&exhausted);
        move || {
            exhausted.fetch_add(1, Ordering::SeqCst);
        }
    }));
    let controller = Controller::new(opts, observer.clone(), Handle::current()).unwrap();

    controller.mount_sentinel(1);
    run_until(|| controller.pager().attempts() == 3 && !controller.pager().is_loading()).await;
    drain().await;

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(exhausted.load(Ordering::SeqCst), 1);
    assert_eq!(controller.view().error, Some("Failed to fetch"));
    assert_eq!(controller.view().page, 1);
    assert!(!controller.is_observing());
}

#[tokio::test]
async fn controller_follows_external_flag() {
    let observer = ManualObserver::new();
    observer.set_visible(&1, true);
    let calls = Calls::default();
    let opts = PagerOptions::new_external_flag(true, {
        let calls = Arc::clone(&calls);
        move |req: pager::PageRequest| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Ok::<_, &'static str>(PageResponse::from(vec![req.page * 100])) }
        }
    })
    .with_id_key(IdKey::new(|v: &u64| Some(*v)));
    let controller = Controller::new(opts, observer.clone(), Handle::current()).unwrap();

    controller.mount_sentinel(1);
    run_until(|| calls.load(Ordering::SeqCst) >= 3).await;
    controller.pager().set_has_next_page(false);
    let stopped_at = calls.load(Ordering::SeqCst);
    drain().await;

    assert_eq!(calls.load(Ordering::SeqCst), stopped_at);
    assert!(!controller.is_observing());
    let items = controller.pager().items();
    assert_eq!(items.len(), stopped_at);
    assert_eq!(items[..3], [100, 200, 300]);
}

#[tokio::test]
async fn controller_keeps_user_on_change() {
    let observer = ManualObserver::new();
    observer.set_visible(&1, true);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let (_calls, opts) = numbered_pages(2);
    let opts = opts.with_max_page(Some(1)).with_on_change(Some({
        let seen = Arc::clone(&seen);
        move |s: &pager::Snapshot<u64, &'static str>| seen.lock().push((s.items.len(), s.loading))
    }));
    let controller = Controller::new(opts, observer, Handle::current()).unwrap();

    controller.mount_sentinel(1);
    run_until(|| controller.pager().page() == 2 && !controller.pager().is_loading()).await;

    assert_eq!(*seen.lock(), vec![(0, true), (2, true), (2, false)]);
}

#[tokio::test]
async fn teardown_detaches_and_stops_fetching() {
    let observer = ManualObserver::new();
    let (calls, opts) = numbered_pages(10);
    let controller = Controller::new(opts, observer.clone(), Handle::current()).unwrap();

    controller.mount_sentinel(1);
    assert_eq!(observer.observation_count(), 1);
    controller.teardown();
    assert_eq!(observer.observation_count(), 0);
    assert!(!controller.pager().is_mounted());

    observer.set_visible(&1, true);
    drain().await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(controller.reconcile(), Reconciled::Idle(IdleReason::TornDown));
}

#[tokio::test]
async fn dropping_the_controller_detaches() {
    let observer = ManualObserver::new();
    let (_calls, opts) = numbered_pages(10);
    let controller = Controller::new(opts, observer.clone(), Handle::current()).unwrap();
    let pager = controller.pager().clone();

    controller.mount_sentinel(1);
    assert_eq!(observer.observation_count(), 1);
    drop(controller);
    assert_eq!(observer.observation_count(), 0);
    assert!(!pager.is_mounted());
}

#[tokio::test(start_paused = true)]
async fn late_result_after_teardown_is_dropped() {
    let observer = ManualObserver::new();
    observer.set_visible(&1, true);
    let changes = Calls::default();
    let opts = PagerOptions::new(|page: u64| async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        Ok::<_, &'static str>(vec![page])
    })
    .with_on_change(Some({
        let changes = Arc::clone(&changes);
        move |_: &pager::Snapshot<u64, &'static str>| {
            changes.fetch_add(1, Ordering::SeqCst);
        }
    }));
    let controller = Controller::new(opts, observer, Handle::current()).unwrap();

    controller.mount_sentinel(1);
    run_until(|| controller.pager().is_loading()).await;
    let before = changes.load(Ordering::SeqCst);
    controller.teardown();

    tokio::time::sleep(Duration::from_secs(1)).await;
    drain().await;

    assert_eq!(changes.load(Ordering::SeqCst), before);
    assert!(controller.pager().is_empty());
    assert_eq!(controller.pager().page(), 1);
}

#[test]
fn observe_options_come_from_pager_options() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let (_calls, opts) = numbered_pages(1);
    let opts = opts
        .with_threshold(0.1)
        .try_with_root_margin("0px 0px 300px 0px")
        .unwrap();
    let controller: Controller<u64, &'static str> =
        Controller::new(opts, ManualObserver::new(), runtime.handle().clone()).unwrap();

    assert_eq!(
        controller.observe_options(),
        ObserveOptions {
            threshold: 0.1,
            root_margin: "0 0 300px".parse::<RootMargin>().unwrap(),
        }
    );
}
