use std::collections::HashMap;
use std::marker::PhantomData;
use std::thread::{self, ThreadId};

use parking_lot::{Condvar, Mutex, MutexGuard};
use trellis_config::{log_monitor_error, log_monitor_trace};

use crate::error::{LockStateError, Result};

/// Book-keeping behind the monitor.
///
/// `gate_owner`/`gate_depth` model a mutex that is reentrant per thread: every
/// operation passes through it, and a writer keeps holding it for the whole
/// write session. Threads other than the gate owner wait on the condvar.
#[derive(Debug, Default)]
struct MonitorState {
    gate_owner: Option<ThreadId>,
    gate_depth: usize,
    writer: Option<ThreadId>,
    writer_depth: usize,
    readers: HashMap<ThreadId, usize>,
}

/// Reentrant reader-writer monitor.
///
/// All four operations pass through one per-thread reentrant gate. A writer
/// holds the gate until its outermost `release_write`, which is what keeps
/// other threads out while letting the writer itself re-enter through both
/// `acquire_read` and `acquire_write`.
#[derive(Debug, Default)]
pub struct Monitor {
    state: Mutex<MonitorState>,
    cond: Condvar,
}

impl Monitor {
    pub fn new() -> Self {
        Self::default()
    }

    fn enter(&self, state: &mut MutexGuard<'_, MonitorState>, me: ThreadId) {
        loop {
            match state.gate_owner {
                None => {
                    state.gate_owner = Some(me);
                    state.gate_depth = 1;
                    return;
                }
                Some(owner) if owner == me => {
                    state.gate_depth += 1;
                    return;
                }
                Some(_) => self.cond.wait(state),
            }
        }
    }

    fn exit(&self, state: &mut MutexGuard<'_, MonitorState>) {
        state.gate_depth -= 1;
        if state.gate_depth == 0 {
            state.gate_owner = None;
            self.cond.notify_all();
        }
    }

    /// Fully give up the gate, wait for a notification, then take the gate back
    /// at the same depth.
    fn wait_releasing_gate(&self, state: &mut MutexGuard<'_, MonitorState>, me: ThreadId) {
        let depth = state.gate_depth;
        state.gate_owner = None;
        state.gate_depth = 0;
        self.cond.notify_all();
        self.cond.wait(state);

        while state.gate_owner.is_some() {
            self.cond.wait(state);
        }
        state.gate_owner = Some(me);
        state.gate_depth = depth;
    }

    /// Take one read count for the calling thread.
    ///
    /// Blocks while another thread holds the write role.
    pub fn acquire_read(&self) {
        let me = thread::current().id();
        let mut state = self.state.lock();
        self.enter(&mut state, me);
        *state.readers.entry(me).or_insert(0) += 1;
        self.exit(&mut state);
    }

    /// Drop one read count of the calling thread.
    pub fn release_read(&self) -> Result<()> {
        let me = thread::current().id();
        let mut state = self.state.lock();
        self.enter(&mut state, me);

        let outcome = match state.readers.get_mut(&me) {
            None => Err(LockStateError::ReadNotHeld { thread: me }),
            Some(count) if *count == 1 => {
                state.readers.remove(&me);
                Ok(())
            }
            Some(count) => {
                *count -= 1;
                Ok(())
            }
        };

        self.exit(&mut state);
        outcome
    }

    /// Take the write role for the calling thread.
    ///
    /// Reentrant for the current writer. A caller holding read counts has
    /// them suspended while it waits for the other readers to drain and
    /// restored once it owns the write role.
    pub fn acquire_write(&self) {
        let me = thread::current().id();
        let mut state = self.state.lock();
        self.enter(&mut state, me);

        if state.writer == Some(me) {
            state.writer_depth += 1;
            return;
        }

        let suspended = state.readers.remove(&me).unwrap_or(0);
        while !state.readers.is_empty() {
            log_monitor_trace!(
                "Writer waiting for readers",
                readers = state.readers.len()
            );
            self.wait_releasing_gate(&mut state, me);
        }

        state.writer = Some(me);
        state.writer_depth = 1;
        if suspended > 0 {
            state.readers.insert(me, suspended);
        }
        // The gate stays held until the matching outermost `release_write`.
    }

    /// Drop one level of the calling thread's write role.
    pub fn release_write(&self) -> Result<()> {
        let me = thread::current().id();
        let mut state = self.state.lock();

        if state.writer != Some(me) {
            return Err(LockStateError::WriteNotOwned { thread: me });
        }

        state.writer_depth -= 1;
        if state.writer_depth == 0 {
            state.writer = None;
        }
        self.exit(&mut state);
        Ok(())
    }

    /// Enter a read region; released when the guard drops.
    pub fn read(&self) -> ReadGuard<'_> {
        self.acquire_read();
        ReadGuard {
            monitor: self,
            _not_send: PhantomData,
        }
    }

    /// Enter a write region; released when the guard drops.
    pub fn write(&self) -> WriteGuard<'_> {
        self.acquire_write();
        WriteGuard {
            monitor: self,
            _not_send: PhantomData,
        }
    }

    /// Whether the calling thread currently owns the write role.
    pub fn is_write_held_by_current(&self) -> bool {
        self.state.lock().writer == Some(thread::current().id())
    }

    /// Number of read counts held by the calling thread.
    pub fn read_depth_of_current(&self) -> usize {
        let me = thread::current().id();
        self.state.lock().readers.get(&me).copied().unwrap_or(0)
    }

    /// Number of distinct threads holding the read role.
    pub fn reader_count(&self) -> usize {
        self.state.lock().readers.len()
    }
}

/// RAII read region. Must be dropped on the thread that created it.
#[must_use = "the read region ends as soon as the guard is dropped"]
pub struct ReadGuard<'a> {
    monitor: &'a Monitor,
    _not_send: PhantomData<*const ()>,
}

impl Drop for ReadGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.monitor.release_read() {
            log_monitor_error!("Read region release failed", error = tracing::field::display(&e));
        }
    }
}

/// RAII write region. Must be dropped on the thread that created it.
#[must_use = "the write region ends as soon as the guard is dropped"]
pub struct WriteGuard<'a> {
    monitor: &'a Monitor,
    _not_send: PhantomData<*const ()>,
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.monitor.release_write() {
            log_monitor_error!("Write region release failed", error = tracing::field::display(&e));
        }
    }
}
