//! # Warden Collections
//!
//! Authorization over collections of subjects.
//!
//! - [`filter_authorized`]: keep the subjects an actor may act on, by
//!   action or by registered policy label
//! - [`authorized_paginate`]: fill pages with authorized subjects only,
//!   remembering where the next page resumes
//!
//! Both go through the actor's decision cache, so repeated subjects are
//! evaluated once.

#![deny(unsafe_code)]

pub mod error;
pub mod filter;
pub mod pagination;

// Re-exports
pub use error::{CollectionError, Result};
pub use filter::{filter_authorized, Filter, OnlyAuthorized};
pub use pagination::{authorized_paginate, AuthorizedPage, PageRequest};
