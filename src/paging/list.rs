use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::fetcher::PageFetcher;
use super::pagination::{Applied, FetchTicket, Pagination};
use crate::error::Result;
use crate::types::{Identified, Page};

/// A paged list bound to its fetcher and to the lifetime of whatever shows it.
///
/// Fetches run on tokio and report back through the caller's action channel.
/// Once the list is closed, reset, or dropped, fetches still out are
/// cancelled and report nothing.
pub struct PagedList<T> {
    pagination: Pagination<T>,
    fetcher: Arc<dyn PageFetcher<T>>,
    lifetime: CancellationToken,
}

impl<T> std::fmt::Debug for PagedList<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagedList").finish_non_exhaustive()
    }
}

impl<T: Identified + Send + 'static> PagedList<T> {
    pub fn new(fetcher: Arc<dyn PageFetcher<T>>, page_size: u32) -> Self {
        Self {
            pagination: Pagination::new(page_size),
            fetcher,
            lifetime: CancellationToken::new(),
        }
    }

    pub fn state(&self) -> &Pagination<T> {
        &self.pagination
    }

    pub fn items(&self) -> &[T] {
        self.pagination.items()
    }

    /// Fetch page 1 in the background. Returns false if a fetch is already out.
    pub fn refresh<A, W>(&mut self, tx: &mpsc::UnboundedSender<A>, wrap: W) -> bool
    where
        A: Send + 'static,
        W: FnOnce(FetchTicket, Result<Page<T>>) -> A + Send + 'static,
    {
        match self.pagination.begin_refresh() {
            Some(ticket) => {
                self.spawn(ticket, tx.clone(), wrap);
                true
            }
            None => false,
        }
    }

    /// Fetch the next page in the background, if the guards allow it.
    pub fn load_more<A, W>(&mut self, tx: &mpsc::UnboundedSender<A>, wrap: W) -> bool
    where
        A: Send + 'static,
        W: FnOnce(FetchTicket, Result<Page<T>>) -> A + Send + 'static,
    {
        match self.pagination.begin_load_more() {
            Some(ticket) => {
                self.spawn(ticket, tx.clone(), wrap);
                true
            }
            None => false,
        }
    }

    fn spawn<A, W>(&self, ticket: FetchTicket, tx: mpsc::UnboundedSender<A>, wrap: W)
    where
        A: Send + 'static,
        W: FnOnce(FetchTicket, Result<Page<T>>) -> A + Send + 'static,
    {
        let fetcher = Arc::clone(&self.fetcher);
        let cancel = self.lifetime.clone();
        debug!(page = ticket.page, generation = ticket.generation, "dispatching page fetch");

        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(page = ticket.page, "page fetch cancelled");
                }
                result = fetcher.fetch_page(ticket.page, ticket.page_size) => {
                    if !cancel.is_cancelled() {
                        tx.send(wrap(ticket, result)).ok();
                    }
                }
            }
        });
    }

    /// Fetch page 1 and apply it in place, without a channel.
    pub async fn refresh_now(&mut self) -> Option<Applied> {
        let ticket = self.pagination.begin_refresh()?;
        Some(self.run_now(ticket).await)
    }

    /// Fetch the next page and apply it in place, without a channel.
    pub async fn load_more_now(&mut self) -> Option<Applied> {
        let ticket = self.pagination.begin_load_more()?;
        Some(self.run_now(ticket).await)
    }

    async fn run_now(&mut self, ticket: FetchTicket) -> Applied {
        let result = self.fetcher.fetch_page(ticket.page, ticket.page_size).await;
        self.pagination.apply(ticket, result)
    }

    /// Apply a result delivered through the action channel.
    pub fn settle(&mut self, ticket: FetchTicket, result: Result<Page<T>>) -> Applied {
        self.pagination.apply(ticket, result)
    }

    /// Start over: cancel what is in flight and forget what was loaded.
    pub fn reset(&mut self) {
        self.lifetime.cancel();
        self.lifetime = CancellationToken::new();
        self.pagination.reset();
    }

    /// Same as [`reset`](Self::reset), with a new source, e.g. a new search query.
    pub fn reset_with(&mut self, fetcher: Arc<dyn PageFetcher<T>>) {
        self.fetcher = fetcher;
        self.reset();
    }

    /// The owner is going away; nothing still in flight will be delivered.
    pub fn close(&mut self) {
        self.lifetime.cancel();
    }

    #[cfg(test)]
    pub fn is_closed(&self) -> bool {
        self.lifetime.is_cancelled()
    }

    /// Is `index` within `threshold` rows of the last loaded item?
    pub fn near_end(&self, index: usize, threshold: usize) -> bool {
        let len = self.pagination.len();
        len > 0 && index + threshold + 1 >= len
    }

    pub fn remove(&mut self, id: &T::Id) -> Option<T> {
        self.pagination.remove(id)
    }

    pub fn replace(&mut self, item: T) -> bool {
        self.pagination.replace(item)
    }
}

impl<T> Drop for PagedList<T> {
    fn drop(&mut self) {
        self.lifetime.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paging::pagination::Phase;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::Semaphore;

    #[derive(Debug, Clone, PartialEq)]
    struct Row(u32);

    impl Identified for Row {
        type Id = u32;

        fn id(&self) -> u32 {
            self.0
        }
    }

    /// Serves scripted pages; optionally holds each fetch until a permit is added.
    #[derive(Default)]
    struct Scripted {
        pages: Mutex<Vec<Vec<u32>>>,
        calls: AtomicUsize,
        gate: Option<Arc<Semaphore>>,
    }

    impl Scripted {
        fn new(pages: Vec<Vec<u32>>) -> Self {
            Self {
                pages: Mutex::new(pages),
                ..Default::default()
            }
        }

        fn gated(pages: Vec<Vec<u32>>, gate: Arc<Semaphore>) -> Self {
            Self {
                gate: Some(gate),
                ..Self::new(pages)
            }
        }
    }

    #[async_trait]
    impl PageFetcher<Row> for Scripted {
        async fn fetch_page(&self, page: u32, _page_size: u32) -> Result<Page<Row>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                if let Ok(permit) = gate.acquire().await {
                    permit.forget();
                }
            }
            let pages = self.pages.lock().unwrap();
            let ids = pages.get(page as usize - 1).cloned().unwrap_or_default();
            Ok(Page::ok(ids.into_iter().map(Row).collect()))
        }
    }

    type Delivered = (FetchTicket, Result<Page<Row>>);

    fn ids(list: &PagedList<Row>) -> Vec<u32> {
        list.items().iter().map(|r| r.0).collect()
    }

    #[tokio::test]
    async fn refresh_and_load_more_through_channel() {
        let fetcher = Arc::new(Scripted::new(vec![
            (1..=10).collect(),
            (8..=17).collect(),
        ]));
        let mut list = PagedList::new(fetcher.clone(), 10);
        let (tx, mut rx) = mpsc::unbounded_channel::<Delivered>();

        assert!(list.refresh(&tx, |t, r| (t, r)));
        let (ticket, result) = rx.recv().await.unwrap();
        assert_eq!(list.settle(ticket, result), Applied::Loaded { added: 10 });

        assert!(list.load_more(&tx, |t, r| (t, r)));
        let (ticket, result) = rx.recv().await.unwrap();
        assert_eq!(ticket.page, 2);
        list.settle(ticket, result);

        assert_eq!(ids(&list), (1..=17).collect::<Vec<_>>());
        assert!(list.state().has_more());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn repeated_triggers_while_in_flight_dispatch_once() {
        let gate = Arc::new(Semaphore::new(0));
        let fetcher = Arc::new(Scripted::gated(vec![(1..=10).collect()], gate.clone()));
        let mut list = PagedList::new(fetcher.clone(), 10);
        let (tx, mut rx) = mpsc::unbounded_channel::<Delivered>();

        assert!(list.refresh(&tx, |t, r| (t, r)));
        for _ in 0..5 {
            assert!(!list.refresh(&tx, |t, r| (t, r)));
            assert!(!list.load_more(&tx, |t, r| (t, r)));
        }

        gate.add_permits(1);
        let (ticket, result) = rx.recv().await.unwrap();
        list.settle(ticket, result);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(list.state().phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn closed_list_receives_nothing() {
        let gate = Arc::new(Semaphore::new(0));
        let fetcher = Arc::new(Scripted::gated(vec![vec![1, 2]], gate.clone()));
        let mut list = PagedList::new(fetcher, 10);
        let (tx, mut rx) = mpsc::unbounded_channel::<Delivered>();

        list.refresh(&tx, |t, r| (t, r));
        list.close();
        assert!(list.is_closed());
        gate.add_permits(1);
        drop(tx);

        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn reset_drops_in_flight_page() {
        let gate = Arc::new(Semaphore::new(0));
        let fetcher = Arc::new(Scripted::gated(vec![vec![1, 2]], gate.clone()));
        let mut list = PagedList::new(fetcher, 10);
        let (tx, mut rx) = mpsc::unbounded_channel::<Delivered>();

        list.refresh(&tx, |t, r| (t, r));
        let old_generation = list.state().generation();
        list.reset();
        assert_eq!(list.state().generation(), old_generation + 1);

        // a fresh refresh is allowed right away
        assert!(list.refresh(&tx, |t, r| (t, r)));
        gate.add_permits(2);
        let (ticket, result) = rx.recv().await.unwrap();
        assert_eq!(ticket.generation, old_generation + 1);
        assert!(matches!(list.settle(ticket, result), Applied::Loaded { .. }));
    }

    #[tokio::test]
    async fn awaited_api_walks_all_pages() {
        let fetcher = Arc::new(Scripted::new(vec![
            vec![1, 2, 3],
            vec![4, 5, 6],
            vec![7],
        ]));
        let mut list = PagedList::new(fetcher, 3);

        list.refresh_now().await;
        while list.load_more_now().await.is_some() {}

        assert_eq!(ids(&list), (1..=7).collect::<Vec<_>>());
        assert!(!list.state().has_more());
        assert_eq!(list.state().current_page(), 3);
    }

    #[tokio::test]
    async fn reset_with_swaps_source() {
        let first = Arc::new(Scripted::new(vec![vec![1, 2]]));
        let second = Arc::new(Scripted::new(vec![vec![9]]));
        let mut list = PagedList::new(first, 10);
        list.refresh_now().await;
        assert_eq!(ids(&list), vec![1, 2]);

        list.reset_with(second);
        assert!(list.items().is_empty());
        list.refresh_now().await;
        assert_eq!(ids(&list), vec![9]);
    }

    #[test]
    fn near_end_threshold() {
        let fetcher = Arc::new(Scripted::default());
        let mut list: PagedList<Row> = PagedList::new(fetcher, 10);
        assert!(!list.near_end(0, 3));

        let ticket = list.pagination.begin_refresh().unwrap();
        list.settle(ticket, Ok(Page::ok((1..=10).map(Row).collect())));
        assert!(!list.near_end(5, 3));
        assert!(list.near_end(6, 3));
        assert!(list.near_end(9, 0));
        assert!(!list.near_end(8, 0));
    }
}
