// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Future lifecycle state and settled outcomes.

/// Where a future is in its lifecycle. Leaves `Pending` at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Pending,
    Fulfilled,
    Rejected,
}

impl State {
    pub fn is_settled(self) -> bool {
        self != State::Pending
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            State::Pending => write!(f, "pending"),
            State::Fulfilled => write!(f, "fulfilled"),
            State::Rejected => write!(f, "rejected"),
        }
    }
}

/// A settled future's result.
///
/// Also the per-input record produced by `all_settled`. With the `serde`
/// feature it serializes as `{"status": "fulfilled", "value": ..}` or
/// `{"status": "rejected", "reason": ..}`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "status", rename_all = "lowercase"))]
pub enum Outcome<T, E> {
    Fulfilled { value: T },
    Rejected { reason: E },
}

impl<T, E> Outcome<T, E> {
    pub fn state(&self) -> State {
        match self {
            Outcome::Fulfilled { .. } => State::Fulfilled,
            Outcome::Rejected { .. } => State::Rejected,
        }
    }

    pub fn is_fulfilled(&self) -> bool {
        matches!(self, Outcome::Fulfilled { .. })
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Outcome::Rejected { .. })
    }

    pub fn into_result(self) -> Result<T, E> {
        match self {
            Outcome::Fulfilled { value } => Ok(value),
            Outcome::Rejected { reason } => Err(reason),
        }
    }
}

impl<T, E> From<Result<T, E>> for Outcome<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Outcome::Fulfilled { value },
            Err(reason) => Outcome::Rejected { reason },
        }
    }
}
