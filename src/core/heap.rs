use std::cell::Cell;

use crate::core::string;

/// Live-heap accounting. The object graph itself is reference-counted;
/// these counters back `meminfo()` and let `gc()` report what it pruned.
#[derive(Clone, Copy, Debug, Default)]
pub struct MemInfo {
    pub heap_size: usize,
    pub free_bytes: usize,
}

thread_local! {
    static LIVE_OBJECTS: Cell<usize> = const { Cell::new(0) };
    static INITIALIZED: Cell<bool> = const { Cell::new(false) };
}

pub(crate) fn note_object_created() {
    LIVE_OBJECTS.with(|c| c.set(c.get() + 1));
}

pub(crate) fn note_object_dropped() {
    LIVE_OBJECTS.with(|c| c.set(c.get().saturating_sub(1)));
}

pub fn live_objects() -> usize {
    LIVE_OBJECTS.with(|c| c.get())
}

/// Idempotent runtime initialization: seeds the interned-atom table.
pub fn init() {
    INITIALIZED.with(|flag| {
        if !flag.get() {
            string::seed_atoms();
            flag.set(true);
            log::debug!("runtime initialized");
        }
    });
}

/// Reclaims what the reference-counted heap cannot free on its own: dead
/// intern-table entries.
pub fn gc() {
    let pruned = string::prune_interned();
    log::debug!("gc: pruned {pruned} interned strings, {} objects live", live_objects());
}

pub fn meminfo() -> MemInfo {
    let object_bytes = live_objects() * std::mem::size_of::<crate::core::JSObject>();
    let string_bytes = string::intern_live_count() * std::mem::size_of::<usize>() * 4;
    MemInfo {
        heap_size: object_bytes + string_bytes,
        free_bytes: string::intern_dead_bytes(),
    }
}
