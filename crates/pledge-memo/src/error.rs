// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Memo errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MemoError {
    /// The default key derivation could not encode the argument.
    #[error("failed to derive cache key: {0}")]
    Key(#[from] serde_json::Error),
}
