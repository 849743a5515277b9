//! The paging engine.
//!
//! - [`PageSource`]: one listing; loads a page, deduplicates and maps it, and
//!   computes the neighbouring page keys
//! - [`Pager`]: a consumer-scoped cache of pages exposed as one growing list
//! - [`reduce`]: the coarse [`UiState`] derived from the pager's load states
//! - [`QueryController`]: debounced search text driving a pager

mod dedup;
mod load_state;
mod page_source;
mod pager;
mod query;

pub use dedup::dedupe;
pub use load_state::{reduce, Direction, LoadState, LoadStates, UiState};
pub use page_source::{LoadParams, LoadResult, PageSource, PagingState};
pub use pager::{LoadOutcome, Pager, PagerConfig, PagingSnapshot};
pub use query::{QueryController, QueryPhase, SourceFactory, DEFAULT_DEBOUNCE};
