//! Pagination over authorized subjects
//!
//! Source pages are walked in order and only authorized items are kept,
//! so a result page may draw from several source pages. When the result
//! fills up in the middle of a source page, the position after the last
//! consumed item is reported as the offset at which the next request
//! resumes.

use crate::error::{CollectionError, Result};
use tracing::debug;
use warden_core::{Authorizable, Manager, Protectable};

/// Where to start reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Source page to start from, 1-based
    pub page: usize,

    /// Items per page
    pub per_page: usize,

    /// Items of the first page to skip
    pub offset: usize,
}

impl PageRequest {
    pub fn new(page: usize, per_page: usize) -> Self {
        Self {
            page,
            per_page,
            offset: 0,
        }
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }
}

/// A page of authorized items
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorizedPage<T> {
    /// Authorized items, at most `per_page`
    pub items: Vec<T>,

    /// Source page the walk stopped on
    pub current_page: usize,

    /// Resume position within `current_page` when it was cut short
    pub offset: Option<usize>,

    /// Source page the next request starts from
    pub next_page: Option<usize>,

    /// Items per page of the request
    pub per_page: usize,
}

impl<T> AuthorizedPage<T> {
    /// Request for the following page, if the source has more items
    pub fn next_request(&self) -> Option<PageRequest> {
        self.next_page.map(|page| PageRequest {
            page,
            per_page: self.per_page,
            offset: self.offset.unwrap_or(0),
        })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Collect up to `per_page` items that `actor` may perform `action` on
pub fn authorized_paginate<'i, T: Protectable>(
    manager: &Manager,
    actor: &dyn Authorizable,
    action: &str,
    items: &'i [T],
    request: PageRequest,
) -> Result<AuthorizedPage<&'i T>> {
    if request.page == 0 {
        return Err(CollectionError::InvalidPage);
    }
    if request.per_page == 0 {
        return Err(CollectionError::InvalidPerPage);
    }

    let per_page = request.per_page;
    let query = manager.actor(actor);
    let mut collected = Vec::with_capacity(per_page);
    let mut page = request.page;
    let mut skip = request.offset;

    loop {
        let start = (page - 1).saturating_mul(per_page).min(items.len());
        let end = start.saturating_add(per_page).min(items.len());
        let source = &items[start..end];
        let has_more = end < items.len();

        let mut consumed = None;
        for (position, item) in source.iter().enumerate().skip(skip) {
            if query.can(action, item)? {
                collected.push(item);
                if collected.len() == per_page {
                    consumed = Some(position + 1);
                    break;
                }
            }
        }

        // Page full, or nothing left to read
        if consumed.is_some() || !has_more {
            let offset = consumed.filter(|&position| position < source.len());
            let next_page = match offset {
                Some(_) => Some(page),
                None if has_more => Some(page + 1),
                None => None,
            };

            debug!(
                actor = %actor.actor_id(),
                action = %action,
                from_page = request.page,
                current_page = page,
                collected = collected.len(),
                "Authorized page collected"
            );
            return Ok(AuthorizedPage {
                items: collected,
                current_page: page,
                offset,
                next_page,
                per_page,
            });
        }

        page += 1;
        skip = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_request_carries_offset() {
        let page: AuthorizedPage<()> = AuthorizedPage {
            items: Vec::new(),
            current_page: 2,
            offset: Some(3),
            next_page: Some(2),
            per_page: 5,
        };
        assert_eq!(page.next_request(), Some(PageRequest::new(2, 5).with_offset(3)));
    }

    #[test]
    fn test_last_page_has_no_next_request() {
        let page: AuthorizedPage<()> = AuthorizedPage {
            items: vec![()],
            current_page: 3,
            offset: None,
            next_page: None,
            per_page: 5,
        };
        assert!(page.next_request().is_none());
        assert_eq!(page.len(), 1);
    }
}
