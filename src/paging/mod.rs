//! Incremental paged list synchronization.
//!
//! Scroll or refresh → [`Debouncer`] → [`Pagination`](pagination::Pagination) decides whether to
//! fetch → [`PageFetcher`] → [`merge`] folds the page in.

pub mod debounce;
pub mod fetcher;
pub mod list;
pub mod merge;
pub mod pagination;

pub use debounce::Debouncer;
pub use fetcher::PageFetcher;
pub use list::PagedList;
pub use pagination::{Applied, FetchTicket, Phase};
