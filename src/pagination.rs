//! Cursor-based paging over the round listing.
//!
//! The API only pages forward: each response carries the cursor of the page
//! after it. To step back, the client remembers every cursor it has already
//! resolved in a [`CursorChain`], indexed by page number.

use tracing::debug;

use crate::api::ApiClient;
use crate::error::{GooseError, Result};
use crate::protocol::Cursor;
use crate::rounds::{annotate_rounds_now, PhasedRound};

/// Append-only list of resolved cursors; entry `n` fetches page `n`.
///
/// Page 0 is always reachable with no cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorChain {
    cursors: Vec<Option<Cursor>>,
}

impl CursorChain {
    pub fn new() -> Self {
        Self {
            cursors: vec![None],
        }
    }

    /// The cursor for `page`, or `None` if that page has not been reached.
    ///
    /// The inner `None` is the first page, which is fetched without a cursor.
    pub fn cursor_for(&self, page: usize) -> Option<Option<&str>> {
        self.cursors.get(page).map(Option::as_deref)
    }

    /// Record what loading `page` revealed about the page after it.
    ///
    /// Only extends the chain; cursors already recorded are never replaced.
    /// Returns `true` when a new page became reachable.
    pub fn record(&mut self, page: usize, next_cursor: Option<&str>) -> bool {
        match next_cursor {
            Some(cursor) if page + 1 == self.cursors.len() => {
                self.cursors.push(Some(cursor.to_string()));
                true
            }
            _ => false,
        }
    }

    /// Number of pages whose cursor is known.
    pub fn known_pages(&self) -> usize {
        self.cursors.len()
    }
}

impl Default for CursorChain {
    fn default() -> Self {
        Self::new()
    }
}

/// Number of page links to offer while viewing `current`.
///
/// The server never reports a total, so only one page past the current one
/// is advertised while more exist.
pub fn page_count(current: usize, has_more: bool) -> usize {
    if has_more {
        current + 2
    } else {
        current + 1
    }
}

/// One loaded listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundsListing {
    /// Zero-based page index.
    pub page: usize,
    pub rounds: Vec<PhasedRound>,
    pub has_more: bool,
}

impl RoundsListing {
    pub fn page_count(&self) -> usize {
        page_count(self.page, self.has_more)
    }

    /// Whether page navigation should be shown at all.
    pub fn is_paginated(&self) -> bool {
        (self.has_more || self.page > 0) && !self.rounds.is_empty()
    }
}

/// Walks the round listing with a [`CursorChain`].
#[derive(Debug)]
pub struct RoundPager {
    api: ApiClient,
    page_size: u32,
    chain: CursorChain,
    current: Option<RoundsListing>,
}

impl RoundPager {
    pub fn new(api: ApiClient, page_size: u32) -> Self {
        Self {
            api,
            page_size: page_size.max(1),
            chain: CursorChain::new(),
            current: None,
        }
    }

    /// Load `page` using its recorded cursor.
    ///
    /// # Errors
    ///
    /// [`GooseError::UnknownPage`] when `page` is beyond the last resolved
    /// cursor; otherwise any API error. A failed load keeps the previous page.
    pub async fn goto(&mut self, page: usize) -> Result<&RoundsListing> {
        let cursor = self
            .chain
            .cursor_for(page)
            .ok_or(GooseError::UnknownPage { page })?
            .map(str::to_string);

        debug!(page, cursor = ?cursor, "loading rounds page");
        let response = self
            .api
            .list_rounds(cursor.as_deref(), self.page_size)
            .await?;

        let has_more = response.pagination.has_more;
        if has_more {
            self.chain
                .record(page, response.pagination.next_cursor.as_deref());
        }

        Ok(self.current.insert(RoundsListing {
            page,
            rounds: annotate_rounds_now(response.data),
            has_more,
        }))
    }

    /// Load the first page.
    pub async fn first(&mut self) -> Result<&RoundsListing> {
        self.goto(0).await
    }

    /// Load the page after the current one.
    pub async fn next(&mut self) -> Result<&RoundsListing> {
        let page = self.current_page().map_or(0, |page| page + 1);
        self.goto(page).await
    }

    /// Load the page before the current one.
    pub async fn previous(&mut self) -> Result<&RoundsListing> {
        match self.current_page() {
            Some(page) if page > 0 => self.goto(page - 1).await,
            _ => Err(GooseError::UnknownPage { page: 0 }),
        }
    }

    /// Re-fetch the current page (or the first page if none is loaded).
    pub async fn reload(&mut self) -> Result<&RoundsListing> {
        let page = self.current_page().unwrap_or(0);
        self.goto(page).await
    }

    pub fn current(&self) -> Option<&RoundsListing> {
        self.current.as_ref()
    }

    pub fn current_page(&self) -> Option<usize> {
        self.current.as_ref().map(|listing| listing.page)
    }

    pub fn chain(&self) -> &CursorChain {
        &self.chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_page_needs_no_cursor() {
        let chain = CursorChain::new();
        assert_eq!(chain.cursor_for(0), Some(None));
        assert_eq!(chain.cursor_for(1), None);
    }

    #[test]
    fn chain_extends_one_page_at_a_time() {
        let mut chain = CursorChain::new();
        assert!(!chain.record(1, Some("too-far")));
        assert!(chain.record(0, Some("abc")));
        assert!(chain.record(1, Some("def")));
        assert_eq!(chain.cursor_for(1), Some(Some("abc")));
        assert_eq!(chain.cursor_for(2), Some(Some("def")));
        assert_eq!(chain.known_pages(), 3);
    }

    #[test]
    fn recorded_cursors_are_never_replaced() {
        let mut chain = CursorChain::new();
        chain.record(0, Some("abc"));
        assert!(!chain.record(0, Some("other")));
        assert_eq!(chain.cursor_for(1), Some(Some("abc")));
        assert_eq!(chain.cursor_for(0), Some(None));
    }

    #[test]
    fn last_page_adds_nothing() {
        let mut chain = CursorChain::new();
        assert!(!chain.record(0, None));
        assert_eq!(chain.known_pages(), 1);
    }

    #[test]
    fn page_count_advertises_one_more_page() {
        assert_eq!(page_count(0, true), 2);
        assert_eq!(page_count(0, false), 1);
        assert_eq!(page_count(3, true), 5);
    }
}
