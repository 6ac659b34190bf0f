//! # trellis-mask
//!
//! Binary mask editing with a compact undo/redo history.
//!
//! A [`MaskHistory`] owns the working mask and a list of 1-bit packed
//! snapshots. One thread paints while others render the current mask; all
//! access goes through a reentrant reader-writer monitor, so a stroke and its
//! commit can be made atomic to readers.

mod error;
mod history;
mod ops;
mod raster;
pub mod snapshot;

pub use error::{MaskError, Result};
pub use history::{MaskHistory, DEFAULT_PAINT_VALUE};
pub use ops::{Point, RasterOps, SoftwareRaster};
pub use raster::Raster;
pub use snapshot::PackedSnapshot;
