//! # trellis-state
//!
//! Thread-safe, path-addressable configuration tree.
//!
//! ```text
//! root ── Record ── "optimizer" ── Map ── "lr" ── Float
//!                └─ "concepts"  ── List ── 0 ── Record ...
//! ```
//!
//! Paths are dot-separated (`"concepts.0.enabled"`). Lookups that miss are
//! reported as absent rather than as failures, because UI code routinely
//! probes optional fields.

mod container;
mod error;
mod path;
pub mod presets;
mod value;

pub use container::StateContainer;
pub use error::{PathError, PathErrorKind, Result, StateError};
pub use path::KeyPath;
pub use value::{Record, Scalar, Value};
