// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Memoization cache.
//!
//! Wraps a function of one argument (use a tuple for several) and caches
//! results by a string key derived from the argument. The default key is
//! the argument's `serde_json` encoding; any `Fn(&A) -> String` can be
//! used instead.

pub mod error;
pub mod key;

use std::cell::RefCell;
use std::collections::HashMap;
use std::marker::PhantomData;

use serde::Serialize;

pub use error::MemoError;
pub use key::{JsonKey, KeyFn};

pub struct Memo<A: ?Sized, V, F, K = JsonKey> {
    func: F,
    key: K,
    cache: RefCell<HashMap<String, V>>,
    _args: PhantomData<fn(&A)>,
}

impl<A, V, F> Memo<A, V, F, JsonKey>
where
    A: Serialize + ?Sized,
    V: Clone,
    F: Fn(&A) -> V,
{
    /// Memoize `func`, keyed by the JSON encoding of its argument.
    pub fn new(func: F) -> Self {
        Self::with_key(func, JsonKey)
    }
}

impl<A, V, F, K> Memo<A, V, F, K>
where
    A: ?Sized,
    V: Clone,
    F: Fn(&A) -> V,
    K: KeyFn<A>,
{
    pub fn with_key(func: F, key: K) -> Self {
        Self {
            func,
            key,
            cache: RefCell::new(HashMap::new()),
            _args: PhantomData,
        }
    }

    /// Cached result for `args`, computing and storing it on a miss.
    pub fn apply(&self, args: &A) -> Result<V, MemoError> {
        let key = self.key.key(args)?;
        let cached = self.cache.borrow().get(&key).cloned();
        if let Some(value) = cached {
            tracing::trace!(%key, "memo hit");
            return Ok(value);
        }

        tracing::trace!(%key, "memo miss");
        // No borrow held while `func` runs.
        let value = (self.func)(args);
        self.cache.borrow_mut().insert(key, value.clone());
        Ok(value)
    }

    pub fn has(&self, args: &A) -> Result<bool, MemoError> {
        let key = self.key.key(args)?;
        Ok(self.cache.borrow().contains_key(&key))
    }

    /// Forget the entry for `args`. Returns whether there was one.
    pub fn delete(&self, args: &A) -> Result<bool, MemoError> {
        let key = self.key.key(args)?;
        Ok(self.cache.borrow_mut().remove(&key).is_some())
    }

    pub fn clear(&self) {
        self.cache.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::BTreeMap;

    #[test]
    fn computes_once_per_key() {
        let calls = Cell::new(0);
        let memo = Memo::new(|&(a, b): &(i32, i32)| {
            calls.set(calls.get() + 1);
            a + b
        });

        assert_eq!(memo.apply(&(1, 2)).unwrap(), 3);
        assert_eq!(memo.apply(&(1, 2)).unwrap(), 3);
        assert_eq!(calls.get(), 1);

        assert_eq!(memo.apply(&(2, 1)).unwrap(), 3);
        assert_eq!(calls.get(), 2);
        assert_eq!(memo.len(), 2);
    }

    #[test]
    fn has_delete_clear() {
        let memo = Memo::new(|s: &str| s.len());
        assert!(!memo.has("abc").unwrap());
        memo.apply("abc").unwrap();
        memo.apply("de").unwrap();
        assert!(memo.has("abc").unwrap());

        assert!(memo.delete("abc").unwrap());
        assert!(!memo.delete("abc").unwrap());
        assert!(!memo.has("abc").unwrap());
        assert!(memo.has("de").unwrap());

        memo.clear();
        assert!(memo.is_empty());
    }

    #[test]
    fn delete_forces_recompute() {
        let calls = Cell::new(0);
        let memo = Memo::new(|n: &u64| {
            calls.set(calls.get() + 1);
            n * 2
        });
        memo.apply(&4).unwrap();
        memo.delete(&4).unwrap();
        memo.apply(&4).unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn custom_key_groups_arguments() {
        let calls = Cell::new(0);
        // Case-insensitive cache.
        let memo = Memo::with_key(
            |s: &String| {
                calls.set(calls.get() + 1);
                s.to_uppercase()
            },
            |s: &String| s.to_lowercase(),
        );

        assert_eq!(memo.apply(&"Hello".to_string()).unwrap(), "HELLO");
        assert_eq!(memo.apply(&"hELLO".to_string()).unwrap(), "HELLO");
        assert_eq!(calls.get(), 1);
        assert!(memo.has(&"HELLO".to_string()).unwrap());
    }

    #[test]
    fn default_key_is_structural() {
        let memo = Memo::new(|m: &BTreeMap<String, i32>| m.values().sum::<i32>());
        let mut a = BTreeMap::new();
        a.insert("x".to_string(), 1);
        a.insert("y".to_string(), 2);
        let b = a.clone();

        memo.apply(&a).unwrap();
        assert!(memo.has(&b).unwrap());
    }

    #[test]
    fn unencodable_argument_is_an_error() {
        // JSON object keys must be strings.
        let memo = Memo::new(|m: &HashMap<(i32, i32), i32>| m.len());
        let mut m = HashMap::new();
        m.insert((1, 2), 3);
        assert!(matches!(memo.apply(&m), Err(MemoError::Key(_))));
        assert!(memo.is_empty());
    }
}
