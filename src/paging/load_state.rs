//! Per-direction load states and the coarse UI state derived from them.

use serde::Serialize;

use crate::sources::SourceError;

/// Load state of one direction (refresh, append or prepend).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    NotLoading,
    Loading,
    Error(SourceError),
}

impl LoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, LoadState::Error(_))
    }

    /// The failure cause, if this direction failed
    pub fn error(&self) -> Option<&SourceError> {
        match self {
            LoadState::Error(err) => Some(err),
            _ => None,
        }
    }
}

/// Which end of the list a load works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Replace everything, starting over
    Refresh,
    /// Grow the end of the list
    Append,
    /// Grow the start of the list
    Prepend,
}

/// The three independent load states a pager tracks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadStates {
    pub refresh: LoadState,
    pub append: LoadState,
    pub prepend: LoadState,
}

impl LoadStates {
    pub fn get(&self, direction: Direction) -> &LoadState {
        match direction {
            Direction::Refresh => &self.refresh,
            Direction::Append => &self.append,
            Direction::Prepend => &self.prepend,
        }
    }

    pub fn get_mut(&mut self, direction: Direction) -> &mut LoadState {
        match direction {
            Direction::Refresh => &mut self.refresh,
            Direction::Append => &mut self.append,
            Direction::Prepend => &mut self.prepend,
        }
    }

    /// Whether any direction has a load in flight
    pub fn is_loading(&self) -> bool {
        self.refresh.is_loading() || self.append.is_loading() || self.prepend.is_loading()
    }
}

/// Coarse state shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UiState {
    /// Nothing has been requested yet
    Idle,
    Loading,
    Success,
    Error,
    Empty,
}

impl UiState {
    pub fn as_str(&self) -> &'static str {
        match self {
            UiState::Idle => "idle",
            UiState::Loading => "loading",
            UiState::Success => "success",
            UiState::Error => "error",
            UiState::Empty => "empty",
        }
    }
}

impl std::fmt::Display for UiState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derive the UI state from the refresh state and the number of loaded items.
///
/// `refresh` is `None` until the first refresh has been issued, which yields
/// [`UiState::Idle`]. After that the first matching rule wins:
///
/// 1. refresh in flight: `Loading`, even when stale items are shown
/// 2. no items: `Empty`, even when the last refresh failed
/// 3. refresh failed: `Error`
/// 4. otherwise `Success`
///
/// Append and prepend failures never change the result.
pub fn reduce(refresh: Option<&LoadState>, item_count: usize) -> UiState {
    let Some(refresh) = refresh else {
        return UiState::Idle;
    };

    if refresh.is_loading() {
        UiState::Loading
    } else if item_count == 0 {
        UiState::Empty
    } else if refresh.is_error() {
        UiState::Error
    } else {
        UiState::Success
    }
}
