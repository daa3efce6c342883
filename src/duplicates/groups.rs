//! Duplicate grouping over a hashed file set.
//!
//! # Overview
//!
//! Grouping runs in two passes over the complete, listing-ordered FileSet:
//!
//! 1. [`find_repeats`] walks the records left to right with a set of digests
//!    already seen. A record whose digest is already in the set is a repeat;
//!    the first occurrence of each digest is not.
//! 2. [`resolve`] collects every digest that appeared in the repeats and
//!    selects *all* records of the full set carrying one of them, the first
//!    occurrences included.
//!
//! The net result is that every copy of a repeated digest is selected and no
//! copy is singled out as the one to keep. Which record counts as "first" in
//! pass 1 depends on directory listing order, which is filesystem specific.
//!
//! # Example
//!
//! ```
//! use dupsweep::duplicates::{find_repeats, resolve};
//! use dupsweep::scanner::FileRecord;
//!
//! let files = vec![
//!     FileRecord::new("a.txt", "11"),
//!     FileRecord::new("b.txt", "11"),
//!     FileRecord::new("c.txt", "22"),
//! ];
//!
//! let repeats = find_repeats(&files);
//! assert_eq!(repeats.len(), 1);
//!
//! let duplicates = resolve(&files, &repeats);
//! let names: Vec<_> = duplicates.iter().map(|r| r.name.as_str()).collect();
//! assert_eq!(names, ["a.txt", "b.txt"]);
//! ```

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::scanner::FileRecord;

/// Select every record whose digest was already seen earlier in `files`.
///
/// For a digest that occurs `k` times the output holds `k - 1` of its
/// records: all but the first in listing order.
#[must_use]
pub fn find_repeats(files: &[FileRecord]) -> Vec<FileRecord> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(files.len());

    let repeats: Vec<FileRecord> = files
        .iter()
        .filter(|record| !seen.insert(record.digest.as_str()))
        .cloned()
        .collect();

    log::debug!(
        "{} of {} records repeat an earlier digest",
        repeats.len(),
        files.len()
    );
    repeats
}

/// Select every record of `full` whose digest appears in `repeats`.
///
/// Records come back in the order of `full`, so the first occurrences that
/// [`find_repeats`] left out are recovered in place.
#[must_use]
pub fn resolve(full: &[FileRecord], repeats: &[FileRecord]) -> Vec<FileRecord> {
    let repeated: HashSet<&str> = repeats.iter().map(|r| r.digest.as_str()).collect();

    let duplicates: Vec<FileRecord> = full
        .iter()
        .filter(|record| repeated.contains(record.digest.as_str()))
        .cloned()
        .collect();

    log::debug!(
        "{} distinct repeated digests cover {} records",
        repeated.len(),
        duplicates.len()
    );
    duplicates
}

/// All records that share one digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DigestGroup {
    /// Shared content digest (hex)
    pub digest: String,
    /// File names carrying this digest, in listing order
    pub names: Vec<String>,
}

impl DigestGroup {
    /// Number of copies in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Group records by digest, keeping first-seen order for groups and names.
///
/// Used for reporting; the selection itself is done by [`resolve`].
#[must_use]
pub fn group_by_digest(records: &[FileRecord]) -> Vec<DigestGroup> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<DigestGroup> = Vec::new();

    for record in records {
        match index.get(record.digest.as_str()) {
            Some(&i) => groups[i].names.push(record.name.clone()),
            None => {
                index.insert(record.digest.as_str(), groups.len());
                groups.push(DigestGroup {
                    digest: record.digest.clone(),
                    names: vec![record.name.clone()],
                });
            }
        }
    }

    groups
}
