// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Cache key derivation.

use serde::Serialize;

use crate::error::MemoError;

/// Turns an argument into a cache key. Equal keys share one cache entry.
pub trait KeyFn<A: ?Sized> {
    fn key(&self, args: &A) -> Result<String, MemoError>;
}

/// Default key: compact `serde_json` encoding of the argument.
///
/// Structural and stable for anything whose `Serialize` output is
/// ordered (tuples, structs, `Vec`, `BTreeMap`). `HashMap` iteration order
/// is not stable, so hash maps should be keyed with a custom `KeyFn`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonKey;

impl<A> KeyFn<A> for JsonKey
where
    A: Serialize + ?Sized,
{
    fn key(&self, args: &A) -> Result<String, MemoError> {
        Ok(serde_json::to_string(args)?)
    }
}

impl<A, F> KeyFn<A> for F
where
    A: ?Sized,
    F: Fn(&A) -> String,
{
    fn key(&self, args: &A) -> Result<String, MemoError> {
        Ok(self(args))
    }
}
