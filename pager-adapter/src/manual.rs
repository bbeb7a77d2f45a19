use std::sync::Arc;

use parking_lot::Mutex;

use crate::{Detach, ObserveOptions, OnIntersect, VisibilityEntry, VisibilityObserver};

struct Observation<S> {
    id: u64,
    target: S,
    options: ObserveOptions,
    on_intersect: OnIntersect,
}

struct ManualState<S> {
    next_id: u64,
    observations: Vec<Observation<S>>,
    visible: Vec<S>,
}

/// A visibility capability driven from code.
///
/// Useful for TUI/immediate-mode adapters that already know which rows are on screen (e.g. from
/// a virtualizer's visible range), and for tests. Like a browser intersection observer, a fresh
/// observation reports the target's current state right away.
pub struct ManualObserver<S> {
    state: Arc<Mutex<ManualState<S>>>,
}

impl<S> Clone for ManualObserver<S> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<S> Default for ManualObserver<S> {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(ManualState {
                next_id: 0,
                observations: Vec::new(),
                visible: Vec::new(),
            })),
        }
    }
}

impl<S: Clone + PartialEq + Send + 'static> ManualObserver<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `target` as visible (or not) and reports the change to its observers.
    pub fn set_visible(&self, target: &S, visible: bool) {
        let callbacks: Vec<OnIntersect> = {
            let mut state = self.state.lock();
            let was_visible = state.visible.contains(target);
            if was_visible == visible {
                return;
            }
            if visible {
                state.visible.push(target.clone());
            } else {
                state.visible.retain(|t| t != target);
            }
            state
                .observations
                .iter()
                .filter(|o| o.target == *target)
                .map(|o| Arc::clone(&o.on_intersect))
                .collect()
        };

        let entry = if visible {
            VisibilityEntry::visible()
        } else {
            VisibilityEntry::hidden()
        };
        for cb in callbacks {
            cb(&[entry]);
        }
    }

    pub fn is_visible(&self, target: &S) -> bool {
        self.state.lock().visible.contains(target)
    }

    /// Number of live observations.
    pub fn observation_count(&self) -> usize {
        self.state.lock().observations.len()
    }

    /// Options of the live observations of `target`.
    pub fn observed_with(&self, target: &S) -> Vec<ObserveOptions> {
        self.state
            .lock()
            .observations
            .iter()
            .filter(|o| o.target == *target)
            .map(|o| o.options)
            .collect()
    }
}

impl<S: Clone + PartialEq + Send + 'static> VisibilityObserver<S> for ManualObserver<S> {
    fn attach(&self, target: &S, options: &ObserveOptions, on_intersect: OnIntersect) -> Detach {
        let (id, entry) = {
            let mut state = self.state.lock();
            let id = state.next_id;
            state.next_id = state.next_id.wrapping_add(1);
            state.observations.push(Observation {
                id,
                target: target.clone(),
                options: *options,
                on_intersect: Arc::clone(&on_intersect),
            });
            let entry = if state.visible.contains(target) {
                VisibilityEntry::visible()
            } else {
                VisibilityEntry::hidden()
            };
            (id, entry)
        };

        on_intersect(&[entry]);

        let state = Arc::clone(&self.state);
        Detach::new(move || {
            state.lock().observations.retain(|o| o.id != id);
        })
    }
}
