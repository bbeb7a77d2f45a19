/// How the last fetch settled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Settlement {
    Success,
    Error,
}

/// Lifecycle phase of a pager.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Settled(Settlement),
}

impl Phase {
    pub fn is_loading(self) -> bool {
        matches!(self, Self::Loading)
    }
}

/// The state published to the display layer after every transition.
///
/// With `feature = "serde"`, this type implements `Serialize`/`Deserialize`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Snapshot<T, E> {
    pub items: Vec<T>,
    pub page: u64,
    pub loading: bool,
    pub error: Option<E>,
    /// The current `load_more` / `has_next_page` signal.
    pub load_more: bool,
}
