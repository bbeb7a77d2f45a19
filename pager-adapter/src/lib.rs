//! Adapter utilities for the `pager` crate.
//!
//! The `pager` crate is UI-agnostic and only decides *whether* a page may be fetched. This crate
//! provides the framework-neutral glue that decides *when*:
//!
//! - A narrow [`VisibilityObserver`] interface over whatever reports sentinel visibility
//! - [`VisibilityTrigger`], which keeps exactly one observation alive while fetching is allowed
//! - [`Controller`], a hook-like binding of a pager, a sentinel handle and a trigger
//! - [`ManualObserver`], a capability driven from code (TUIs, tests)
//!
//! This crate is intentionally framework-agnostic (no DOM/egui/ratatui bindings).
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

mod controller;
mod manual;
mod sentinel;
mod trigger;
mod visibility;

#[cfg(test)]
mod tests;

pub use controller::{Controller, View};
pub use manual::ManualObserver;
pub use sentinel::SentinelRef;
pub use trigger::{IdleReason, Reconciled, VisibilityTrigger};
pub use visibility::{Detach, ObserveOptions, OnIntersect, VisibilityEntry, VisibilityObserver};
