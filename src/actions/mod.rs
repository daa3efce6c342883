//! File actions module.
//!
//! This module provides the filesystem mutations of a sweep: creating the
//! quarantine directory and relocating duplicates into it.
//!
//! ```no_run
//! use dupsweep::actions::{ensure_destination, move_batch, TransferConfig};
//! use dupsweep::scanner::FileRecord;
//! use std::path::Path;
//!
//! let origin = Path::new("/photos");
//! let dest = origin.join("duplicates");
//! let records = vec![FileRecord::new("a.jpg", "00")];
//!
//! ensure_destination(&dest).unwrap();
//! let result = move_batch(&records, origin, &dest, &TransferConfig::default());
//! println!("{}", result.summary());
//! ```

pub mod transfer;

// Re-export commonly used types
pub use transfer::{
    ensure_destination, move_batch, move_file, BatchTransferResult, TransferConfig,
    TransferError, TransferFailure, TransferMethod, TransferResult,
};
