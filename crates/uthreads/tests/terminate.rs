//! Self-termination hands the CPU to the next ready thread and never
//! returns; released tids are handed out again lowest-first.

mod common;

use std::sync::atomic::{AtomicU32, Ordering};

use common::{burn, expect};

static PHASE: AtomicU32 = AtomicU32::new(0);

fn self_terminator() {
    PHASE.store(1, Ordering::SeqCst);
    uthreads::terminate(uthreads::get_tid());
    // Unreachable: the call above must not return.
    PHASE.store(99, Ordering::SeqCst);
}

fn spinner() {
    loop {
        burn();
    }
}

fn main() {
    expect(uthreads::init(30_000) == 0, "init");
    expect(uthreads::spawn(self_terminator) == 1, "spawn t1");
    expect(uthreads::spawn(spinner) == 2, "spawn t2");
    expect(uthreads::spawn(spinner) == 3, "spawn t3");

    // Killing a queued thread frees its tid for the next spawn.
    expect(uthreads::terminate(2) == 0, "terminate a ready thread");
    expect(uthreads::spawn(spinner) == 2, "tid 2 is reused");

    expect(uthreads::get_quantums(1) == 0, "t1 has not run yet");
    while uthreads::get_quantums(1) != -1 {
        burn();
    }
    expect(
        PHASE.load(Ordering::SeqCst) == 1,
        "terminate(self) must not return",
    );
    expect(uthreads::terminate(1) == -1, "dead tid is rejected");
    expect(uthreads::get_quantums(1) == -1, "dead tid reports -1");

    // The freed tid is the lowest again.
    expect(uthreads::spawn(spinner) == 1, "tid 1 is reused");

    uthreads::terminate(0);
}
