//! # trellis-monitor
//!
//! Reentrant reader-writer monitor shared by every Trellis store.
//!
//! ## Roles
//!
//! ```text
//!            acquire_read            acquire_write
//!   any thread ──────────► READ ───────────────────► WRITE (one thread)
//!                           ▲   read counts suspended   │
//!                           └───────── restored ◄───────┘
//! ```
//!
//! - Any number of threads may hold the read role; each thread's count is
//!   reentrant.
//! - One thread at a time holds the write role; it is reentrant too, and the
//!   writer may keep taking read regions while it writes.
//! - A reader that asks for the write role has its own read counts set aside
//!   while it waits, so it never waits on itself.
//!
//! Writers are not protected from starvation: a continuous stream of
//! overlapping readers from other threads can hold a writer off forever.
//!
//! [`Store`] pairs a [`Monitor`] with the data it protects.

mod error;
mod monitor;
mod store;

pub use error::{LockStateError, Result};
pub use monitor::{Monitor, ReadGuard, WriteGuard};
pub use store::Store;
