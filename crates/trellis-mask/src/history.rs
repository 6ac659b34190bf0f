//! Undo/redo history for one binary mask.

use trellis_config::{log_mask_debug, log_mask_info};
use trellis_monitor::Store;

use crate::error::{MaskError, Result};
use crate::ops::{Point, RasterOps, SoftwareRaster};
use crate::raster::Raster;
use crate::snapshot::PackedSnapshot;

/// Value written by fills, strokes and deletion unless configured otherwise.
pub const DEFAULT_PAINT_VALUE: u8 = 255;

#[derive(Debug)]
struct Session {
    /// Never empty; `ptr` indexes the entry `current` was last committed as.
    buffer: Vec<PackedSnapshot>,
    ptr: usize,
    current: Raster,
    original: Raster,
}

impl Session {
    fn new(mask: Raster) -> Self {
        Self {
            buffer: vec![PackedSnapshot::pack(&mask)],
            ptr: 0,
            current: mask.clone(),
            original: mask,
        }
    }
}

/// Edit history of a mask being painted by one thread and rendered by others.
///
/// `current` is the working mask. Edits change it in place; [`commit`](Self::commit)
/// records it as a packed snapshot, discarding any redo tail. Undo and redo
/// move the cursor and restore the mask from the snapshot, with set cells
/// restored as the paint value.
pub struct MaskHistory {
    store: Store<Option<Session>>,
    ops: Box<dyn RasterOps>,
    paint_value: u8,
}

impl Default for MaskHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MaskHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaskHistory")
            .field("paint_value", &self.paint_value)
            .field("len", &self.len())
            .field("ptr", &self.ptr())
            .finish_non_exhaustive()
    }
}

impl MaskHistory {
    pub fn new() -> Self {
        Self::with_ops(SoftwareRaster)
    }

    pub fn with_ops(ops: impl RasterOps + 'static) -> Self {
        Self {
            store: Store::new(None),
            ops: Box::new(ops),
            paint_value: DEFAULT_PAINT_VALUE,
        }
    }

    pub fn with_paint_value(mut self, value: u8) -> Self {
        self.paint_value = value;
        self
    }

    pub fn paint_value(&self) -> u8 {
        self.paint_value
    }

    /// Start a new session on `mask`, dropping any previous history.
    pub fn load(&self, mask: Raster) {
        let (width, height) = mask.dimensions();
        self.store.write(|slot| *slot = Some(Session::new(mask)));
        log_mask_info!("Mask loaded", width = width, height = height);
    }

    /// Paint a stroke from `from` to `to` with a round brush of `radius`.
    ///
    /// The stroke is a line `2 * radius + 1` wide capped by filled circles at
    /// both ends. With `commit`, the result is recorded before the write
    /// region is released.
    pub fn paint_stroke(
        &self,
        from: Point,
        to: Point,
        radius: u32,
        color: u8,
        commit: bool,
    ) -> Result<()> {
        let _region = self.store.write_region();
        self.edit(|ops, mask| {
            ops.draw_line(mask, from, to, color, radius.saturating_mul(2).saturating_add(1));
            ops.draw_circle(mask, from, radius, color, true);
            if to != from {
                ops.draw_circle(mask, to, radius, color, true);
            }
        })?;
        if commit {
            self.commit()?;
        }
        Ok(())
    }

    /// Flood fill from `seed`. Does not commit.
    pub fn fill(&self, seed: Point, color: u8) -> Result<()> {
        self.edit(|ops, mask| ops.flood_fill(mask, seed, color))
    }

    /// Record the working mask as the newest history entry.
    pub fn commit(&self) -> Result<()> {
        self.store.write(|slot| {
            let session = slot.as_mut().ok_or(MaskError::NotLoaded)?;
            session.buffer.truncate(session.ptr + 1);
            session.buffer.push(PackedSnapshot::pack(&session.current));
            session.ptr += 1;
            log_mask_debug!(
                "Mask committed",
                ptr = session.ptr,
                entries = session.buffer.len()
            );
            Ok(())
        })
    }

    /// Step back one entry. Returns whether the cursor moved.
    pub fn undo(&self) -> bool {
        self.step(|ptr, _| ptr.checked_sub(1))
    }

    /// Step forward one entry. Returns whether the cursor moved.
    pub fn redo(&self) -> bool {
        self.step(|ptr, len| (ptr + 1 < len).then_some(ptr + 1))
    }

    /// Restore the original mask and make it the only history entry.
    pub fn clear_history(&self) -> Result<()> {
        self.store.write(|slot| {
            let session = slot.as_mut().ok_or(MaskError::NotLoaded)?;
            session.current = session.original.clone();
            session.buffer = vec![PackedSnapshot::pack(&session.original)];
            session.ptr = 0;
            Ok(())
        })?;
        log_mask_debug!("Mask history cleared");
        Ok(())
    }

    /// Fill the whole working mask with the paint value. Does not commit.
    pub fn delete_mask(&self) -> Result<()> {
        let value = self.paint_value;
        self.edit(|_, mask| mask.fill(value))
    }

    /// Copy of the working mask.
    pub fn current_mask(&self) -> Option<Raster> {
        self.store
            .read(|slot| slot.as_ref().map(|s| s.current.clone()))
    }

    /// Run `f` on a copy of the working mask while holding a read region.
    ///
    /// No edit from another thread lands while `f` runs. `f` may call back
    /// into the history, including edits and commits on this thread.
    pub fn with_current_mask<R>(&self, f: impl FnOnce(&Raster) -> R) -> Option<R> {
        let _region = self.store.read_region();
        let mask = self.current_mask()?;
        Some(f(&mask))
    }

    pub fn original_mask(&self) -> Option<Raster> {
        self.store
            .read(|slot| slot.as_ref().map(|s| s.original.clone()))
    }

    /// History entry `index`, if any.
    pub fn snapshot(&self, index: usize) -> Option<PackedSnapshot> {
        self.store
            .read(|slot| slot.as_ref().and_then(|s| s.buffer.get(index).cloned()))
    }

    pub fn ptr(&self) -> usize {
        self.store.read(|slot| slot.as_ref().map_or(0, |s| s.ptr))
    }

    /// Number of history entries; 0 before the first load.
    pub fn len(&self) -> usize {
        self.store.read(|slot| slot.as_ref().map_or(0, |s| s.buffer.len()))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_loaded(&self) -> bool {
        self.store.read(|slot| slot.is_some())
    }

    /// `(width, height)` of the loaded mask.
    pub fn dimensions(&self) -> Option<(usize, usize)> {
        self.store
            .read(|slot| slot.as_ref().map(|s| s.original.dimensions()))
    }

    pub fn can_undo(&self) -> bool {
        self.store.read(|slot| slot.as_ref().is_some_and(|s| s.ptr > 0))
    }

    pub fn can_redo(&self) -> bool {
        self.store
            .read(|slot| slot.as_ref().is_some_and(|s| s.ptr + 1 < s.buffer.len()))
    }

    /// Bytes held by packed history entries.
    pub fn history_bytes(&self) -> usize {
        self.store.read(|slot| {
            slot.as_ref()
                .map_or(0, |s| s.buffer.iter().map(PackedSnapshot::byte_len).sum())
        })
    }

    fn edit(&self, f: impl FnOnce(&dyn RasterOps, &mut Raster)) -> Result<()> {
        let ops = &*self.ops;
        self.store.write(|slot| {
            let session = slot.as_mut().ok_or(MaskError::NotLoaded)?;
            f(ops, &mut session.current);
            Ok(())
        })
    }

    fn step(&self, next: impl FnOnce(usize, usize) -> Option<usize>) -> bool {
        let on = self.paint_value;
        self.store.write(|slot| {
            let Some(session) = slot.as_mut() else {
                return false;
            };
            let Some(ptr) = next(session.ptr, session.buffer.len()) else {
                return false;
            };
            session.ptr = ptr;
            session.current = session.buffer[ptr].unpack_with(on);
            log_mask_debug!("Mask history moved", ptr = ptr);
            true
        })
    }
}
