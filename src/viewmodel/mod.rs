//! Presentation state sitting between the store/API client and a front end.
//!
//! Each view-model owns clones of the handles it needs and exposes plain
//! fields (results, last error message, busy flag). Operations never return
//! errors; failures are turned into a message in `error`.

mod archive;
mod articles;
mod filters;
mod headlines;
mod search;

pub use archive::ArchiveViewModel;
pub use articles::{ArticlesViewModel, SAVE_FAILURE_MESSAGE, SAVE_SUCCESS_MESSAGE};
pub use filters::{FiltersViewModel, EMPTY_INPUT_MESSAGE};
pub use headlines::HeadlinesViewModel;
pub use search::{SearchViewModel, NO_RESULTS_MESSAGE};
