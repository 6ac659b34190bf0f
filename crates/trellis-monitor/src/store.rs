use std::fmt;

use parking_lot::{ReentrantMutex, ReentrantMutexGuard, RwLock};

use crate::monitor::{Monitor, ReadGuard, WriteGuard};

/// Data guarded by a [`Monitor`].
///
/// The monitor decides who may touch the data; the inner `RwLock` only hands
/// out the references and is never contended across threads, because the
/// monitor has already serialized writers against everyone else.
///
/// [`read`](Self::read) and [`write`](Self::write) run their closure with the
/// data borrowed, so the closure must not call back into the same store;
/// doing so panics like a double `RefCell` borrow. [`inspect`](Self::inspect)
/// and [`update`](Self::update) hand the closure a copy instead and hold only
/// the monitor region, so it may call anything on the store. Several
/// operations can also be grouped under a [`read_region`](Self::read_region)
/// or [`write_region`](Self::write_region).
pub struct Store<T> {
    monitor: Monitor,
    exclusive: ReentrantMutex<()>,
    data: RwLock<T>,
}

impl<T> Store<T> {
    pub fn new(data: T) -> Self {
        Self {
            monitor: Monitor::new(),
            exclusive: ReentrantMutex::new(()),
            data: RwLock::new(data),
        }
    }

    /// Run `f` against the data inside a read region.
    ///
    /// # Panics
    ///
    /// If called from inside a [`write`](Self::write) closure on this store.
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let _region = self.monitor.read();
        // With the read role held no other thread can be writing, so a
        // failure here is this thread re-entering from a `write` closure.
        let Some(data) = self.data.try_read_recursive() else {
            panic!("Store::read called from inside a Store::write closure");
        };
        f(&data)
    }

    /// Run `f` against the data inside a write region.
    ///
    /// # Panics
    ///
    /// If called from inside a [`read`](Self::read) or [`write`](Self::write)
    /// closure on this store.
    pub fn write<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let _region = self.monitor.write();
        // Other threads have drained; only this thread can still hold the data.
        let Some(mut data) = self.data.try_write() else {
            panic!("Store::write called from inside a Store::read or Store::write closure");
        };
        f(&mut data)
    }

    /// Hold a read region across several operations.
    pub fn read_region(&self) -> ReadGuard<'_> {
        self.monitor.read()
    }

    /// Hold a write region across several operations.
    pub fn write_region(&self) -> WriteGuard<'_> {
        self.monitor.write()
    }

    /// Per-instance reentrant mutex, independent of the read/write roles.
    ///
    /// Serializes every thread that asks for it against every other, whatever
    /// they intend to do. Prefer the read/write regions.
    pub fn exclusive(&self) -> ReentrantMutexGuard<'_, ()> {
        self.exclusive.lock()
    }

    pub fn monitor(&self) -> &Monitor {
        &self.monitor
    }

    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

impl<T: Clone> Store<T> {
    /// Run `f` on a copy of the data inside a read region.
    ///
    /// No data borrow is held while `f` runs, so `f` may read or write the
    /// store itself.
    pub fn inspect<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let _region = self.monitor.read();
        let copy = self.read(T::clone);
        f(&copy)
    }

    /// Run `f` on a copy of the data inside a write region, then store the
    /// copy.
    ///
    /// Other threads see either the old data or the whole edit. Calls `f`
    /// makes back into the store see the data as it was before `f` started,
    /// and writes made that way are replaced by the copy when `f` returns.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let _region = self.monitor.write();
        let mut copy = self.read(T::clone);
        let result = f(&mut copy);
        self.write(|data| *data = copy);
        result
    }
}

impl<T: Default> Default for Store<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.read(|data| f.debug_struct("Store").field("data", data).finish())
    }
}
