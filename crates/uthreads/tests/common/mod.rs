//! Shared pieces for the scheduler test binaries.
//!
//! Cross-thread observations go through lock-free slots: a preempted
//! thread holding a mutex would deadlock the whole rotation, so nothing
//! here takes one.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

pub const MAX_EVENTS: usize = 32;

#[allow(clippy::declare_interior_mutable_const)]
const ZERO: AtomicU32 = AtomicU32::new(0);
static EVENTS: [AtomicU32; MAX_EVENTS] = [ZERO; MAX_EVENTS];
static CURSOR: AtomicUsize = AtomicUsize::new(0);

/// Append a value to the global event log.
pub fn record(value: u32) {
    let slot = CURSOR.fetch_add(1, Ordering::SeqCst);
    if slot < MAX_EVENTS {
        EVENTS[slot].store(value, Ordering::SeqCst);
    }
}

pub fn recorded() -> usize {
    CURSOR.load(Ordering::SeqCst).min(MAX_EVENTS)
}

pub fn event(index: usize) -> u32 {
    EVENTS[index].load(Ordering::SeqCst)
}

/// Spend a little user CPU time so the virtual timer advances.
pub fn burn() {
    for _ in 0..4096 {
        std::hint::spin_loop();
    }
}

/// Check without unwinding: a panic mid-rotation would race the timer.
pub fn expect(condition: bool, what: &str) {
    if !condition {
        eprintln!("scenario check failed: {what}");
        std::process::exit(2);
    }
}

/// Total quanta must equal the per-thread sum over `tids`; retried around
/// ticks that land between the two readings.
pub fn check_quantum_accounting(tids: &[i32]) {
    loop {
        let before = uthreads::get_total_quantums();
        let sum: i32 = tids.iter().map(|&tid| uthreads::get_quantums(tid)).sum();
        if uthreads::get_total_quantums() == before {
            expect(sum == before, "total quanta equal the per-thread sum");
            return;
        }
    }
}
