//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Repeat detection over a listing-ordered file set
//! - Resolution of every copy sharing a repeated digest
//! - Orchestration of listing, hashing and grouping

pub mod finder;
pub mod groups;

pub use finder::{DuplicateFinder, FinderConfig, FinderError, ScanResult, ScanSummary};
pub use groups::{find_repeats, group_by_digest, resolve, DigestGroup};
