//! Viewed/unread bookkeeping and badge-count aggregation.
//!
//! The [`ledger`] tracks which records the current user has opened; the
//! [`counts`] aggregator derives per-form and per-category total/unread
//! numbers from the ledger plus collection counts, and maintains them
//! incrementally after create/delete/view events. Badge failures are
//! cosmetic by contract: nothing here may block the list or CRUD operation
//! it annotates.

pub mod counts;
pub mod ledger;

pub use counts::{BadgeAggregator, BadgeCount, CategoryTotals};
pub use ledger::ViewedLedger;
