//! Paged list state: what has been loaded, what page comes next, and whether
//! a fetch is currently out.
//!
//! Only one fetch is ever in flight. Callers ask for a [`FetchTicket`], run
//! the fetch however they like, and hand the result back through
//! [`Pagination::apply`]. Tickets from an earlier generation (the list was
//! reset or its owner went away) are discarded on arrival.

use tracing::{debug, warn};

use super::merge::merge;
use crate::error::Result;
use crate::types::{Identified, Page};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    FetchingInitial,
    FetchingMore,
    Error,
}

/// Permission to run exactly one fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub page: u32,
    pub page_size: u32,
    pub generation: u64,
}

impl FetchTicket {
    pub fn is_reset(&self) -> bool {
        self.page == 1
    }
}

/// What happened when a settled fetch was applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    Loaded { added: usize },
    NoData,
    Failed(String),
    Stale,
}

#[derive(Debug, Clone)]
pub struct Pagination<T> {
    items: Vec<T>,
    current_page: u32,
    page_size: u32,
    has_more: bool,
    phase: Phase,
    error: Option<String>,
    notice: Option<String>,
    generation: u64,
}

impl<T: Identified> Pagination<T> {
    pub fn new(page_size: u32) -> Self {
        Self {
            items: Vec::new(),
            current_page: 1,
            page_size: page_size.max(1),
            has_more: true,
            phase: Phase::Idle,
            error: None,
            notice: None,
            generation: 0,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_fetching(&self) -> bool {
        matches!(self.phase, Phase::FetchingInitial | Phase::FetchingMore)
    }

    pub fn is_refreshing(&self) -> bool {
        self.phase == Phase::FetchingInitial
    }

    /// Last transport error, cleared by the next successful fetch
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Message from a soft "nothing found" answer
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    #[cfg(test)]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start a page-1 fetch. Refused while another fetch is out.
    pub fn begin_refresh(&mut self) -> Option<FetchTicket> {
        if self.is_fetching() {
            debug!(generation = self.generation, "refresh ignored, fetch in flight");
            return None;
        }
        self.phase = Phase::FetchingInitial;
        Some(self.ticket(1))
    }

    /// Start fetching the page after `current_page`, if there is one.
    pub fn begin_load_more(&mut self) -> Option<FetchTicket> {
        if self.phase != Phase::Idle || !self.has_more {
            return None;
        }
        self.phase = Phase::FetchingMore;
        Some(self.ticket(self.current_page + 1))
    }

    fn ticket(&self, page: u32) -> FetchTicket {
        FetchTicket {
            page,
            page_size: self.page_size,
            generation: self.generation,
        }
    }

    /// Settle the in-flight fetch described by `ticket`.
    pub fn apply(&mut self, ticket: FetchTicket, result: Result<Page<T>>) -> Applied {
        if ticket.generation != self.generation || !self.is_fetching() {
            debug!(
                page = ticket.page,
                ticket_generation = ticket.generation,
                generation = self.generation,
                "discarding stale page"
            );
            return Applied::Stale;
        }

        match result {
            Ok(page) if page.success => {
                let no_more = page.no_more;
                let merged = merge(
                    std::mem::take(&mut self.items),
                    page.items,
                    ticket.is_reset(),
                );
                self.has_more = !no_more
                    && merged.added > 0
                    && merged.raw_len == self.page_size as usize;
                if merged.is_overlap_only() {
                    debug!(page = ticket.page, "page held only known items");
                }
                self.items = merged.items;
                self.current_page = ticket.page;
                self.error = None;
                self.notice = None;
                self.phase = Phase::Idle;
                Applied::Loaded {
                    added: merged.added,
                }
            }
            Ok(page) => {
                if ticket.is_reset() {
                    self.items.clear();
                    self.current_page = 1;
                }
                self.has_more = false;
                self.error = None;
                self.notice = page.message;
                self.phase = Phase::Idle;
                Applied::NoData
            }
            Err(e) => {
                let message = e.to_string();
                warn!(page = ticket.page, error = %message, "page fetch failed");
                self.has_more = false;
                self.error = Some(message.clone());
                self.phase = Phase::Error;
                Applied::Failed(message)
            }
        }
    }

    /// Forget everything, e.g. when the list now belongs to a different user.
    /// Fetches already out will come back stale.
    pub fn reset(&mut self) {
        self.items.clear();
        self.current_page = 1;
        self.has_more = true;
        self.phase = Phase::Idle;
        self.error = None;
        self.notice = None;
        self.generation += 1;
    }

    /// Drop one item locally, e.g. after it was deleted on the server.
    pub fn remove(&mut self, id: &T::Id) -> Option<T> {
        let index = self.items.iter().position(|item| &item.id() == id)?;
        Some(self.items.remove(index))
    }

    /// Replace one item in place, keeping its position.
    pub fn replace(&mut self, item: T) -> bool {
        let id = item.id();
        match self.items.iter_mut().find(|existing| existing.id() == id) {
            Some(slot) => {
                *slot = item;
                true
            }
            None => false,
        }
    }
}
