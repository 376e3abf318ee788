//! The error table: every invalid call returns -1 and mutates nothing.
//! The quantum is far beyond the test's runtime, so no preemption ever
//! fires and the bookkeeping stays exactly as the calls left it.

mod common;

use common::expect;

fn noop() {}

fn main() {
    // Nothing works before init.
    expect(uthreads::spawn(noop) == -1, "spawn before init");
    expect(uthreads::block(1) == -1, "block before init");
    expect(uthreads::resume(1) == -1, "resume before init");
    expect(uthreads::sleep(1) == -1, "sleep before init");
    expect(uthreads::terminate(0) == -1, "terminate before init");
    expect(uthreads::get_tid() == -1, "get_tid before init");
    expect(uthreads::get_total_quantums() == -1, "totals before init");
    expect(uthreads::get_quantums(0) == -1, "quantums before init");

    expect(uthreads::init(0) == -1, "zero quantum rejected");
    expect(uthreads::init(-3) == -1, "negative quantum rejected");
    expect(uthreads::init(10_000_000) == 0, "init");

    // The calling context is thread 0, one quantum in.
    expect(uthreads::get_tid() == 0, "main is tid 0");
    expect(uthreads::get_total_quantums() == 1, "init charges the first quantum");
    expect(uthreads::get_quantums(0) == 1, "tid 0 owns that quantum");

    // Range and existence checks.
    expect(uthreads::block(0) == -1, "main cannot be blocked");
    expect(uthreads::block(-1) == -1, "negative tid");
    expect(uthreads::block(uthreads::MAX_THREAD_NUM as i32) == -1, "tid past the range");
    expect(uthreads::block(7) == -1, "unknown tid");
    expect(uthreads::resume(-2) == -1, "negative tid");
    expect(uthreads::resume(100) == -1, "tid past the range");
    expect(uthreads::resume(55) == -1, "unknown tid");
    expect(uthreads::sleep(0) == -1, "zero sleep rejected");
    expect(uthreads::sleep(-7) == -1, "negative sleep rejected");
    expect(uthreads::sleep(5) == -1, "main cannot sleep");
    expect(uthreads::terminate(-1) == -1, "negative tid");
    expect(uthreads::terminate(100) == -1, "tid past the range");
    expect(uthreads::terminate(9) == -1, "unknown tid");
    expect(uthreads::get_quantums(-1) == -1, "negative tid");
    expect(uthreads::get_quantums(100) == -1, "tid past the range");
    expect(uthreads::get_quantums(42) == -1, "unknown tid");

    // Fill the whole tid space, lowest-first.
    for wanted in 1..uthreads::MAX_THREAD_NUM as i32 {
        expect(uthreads::spawn(noop) == wanted, "tids are handed out in order");
    }
    expect(uthreads::spawn(noop) == -1, "tid space exhausted");
    expect(uthreads::terminate(42) == 0, "terminate a queued thread");
    expect(uthreads::spawn(noop) == 42, "freed tid is the lowest again");

    // Queue bookkeeping without any dispatch.
    expect(uthreads::block(9) == 0, "block a ready thread");
    expect(uthreads::block(9) == 0, "blocking twice is fine");
    expect(uthreads::resume(9) == 0, "resume");
    expect(uthreads::resume(9) == 0, "resume is idempotent");
    expect(uthreads::get_quantums(9) == 0, "never dispatched, no quanta");

    common::check_quantum_accounting(&[0]);
    uthreads::terminate(0);
}
