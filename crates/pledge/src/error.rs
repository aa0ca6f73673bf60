// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Aggregate failure for `any`.

use std::fmt;

/// Every input of an `any` rejected. Reasons are kept in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateError<E> {
    pub errors: Vec<E>,
}

impl<E> AggregateError<E> {
    pub fn new(errors: Vec<E>) -> Self {
        Self { errors }
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_errors(self) -> Vec<E> {
        self.errors
    }
}

impl<E> fmt::Display for AggregateError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "all {} futures were rejected", self.errors.len())
    }
}

impl<E: fmt::Debug> std::error::Error for AggregateError<E> {}
