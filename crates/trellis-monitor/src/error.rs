use std::thread::ThreadId;

use thiserror::Error;

/// Mismatched acquire/release on a [`Monitor`](crate::Monitor).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LockStateError {
    #[error("read lock released while not held by thread {thread:?}")]
    ReadNotHeld { thread: ThreadId },

    #[error("write lock released by thread {thread:?}, which does not own it")]
    WriteNotOwned { thread: ThreadId },
}

pub type Result<T> = std::result::Result<T, LockStateError>;
