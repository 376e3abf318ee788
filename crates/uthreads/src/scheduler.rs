use core::ptr;

use log::trace;

use crate::context::{Context, SaveOutcome};
use crate::signals;
use crate::ThreadTable;

/// Why the dispatcher was entered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Reason {
    Init,
    Block,
    Sleep,
    Terminate,
    /// Timer-driven.
    Preempt,
}

/// Scheduling-signal handler. Delivery masks the signal, so the registry
/// can be mutated here without taking the guard again.
pub(crate) extern "C" fn timer_tick(_signal: libc::c_int) {
    if let Some(lib) = unsafe { crate::table_mut() } {
        dispatch(lib, Reason::Preempt);
    }
}

/// Save the running thread, file it according to `reason`, and hand the
/// CPU to the head of the ready queue.
///
/// Returns in two cases only: a preemption (or init) tick that finds the
/// ready queue empty, and the eventual resumption of the thread saved
/// here. Every other path switches stacks and never comes back to this
/// frame.
pub(crate) fn dispatch(lib: &mut ThreadTable, reason: Reason) {
    let running = lib.running;
    let outcome = lib
        .registry
        .tcb_mut(running)
        .expect("running thread is registered")
        .context
        .save();
    if outcome == SaveOutcome::Resumed {
        // Just switched back in. The borrow taken before the switch went
        // stale while other threads ran; reap through a fresh one.
        if let Some(lib) = unsafe { crate::table_mut() } {
            lib.zombie = None;
        }
        return;
    }

    match reason {
        Reason::Sleep => lib.registry.mark_sleeping(running),
        // The caller already filed the thread as blocked.
        Reason::Block => {}
        Reason::Terminate => {
            let dead = lib
                .registry
                .remove(running)
                .expect("terminating thread is registered");
            // Still executing on the dead thread's stack; the next thread
            // to run frees it.
            lib.zombie = Some(dead);
        }
        Reason::Init | Reason::Preempt => {
            if lib.registry.ready_is_empty() {
                // Nobody to switch to: charge the quantum to the running
                // thread and keep going. The periodic timer rearms itself.
                lib.total_quantums += 1;
                lib.registry
                    .tcb_mut(running)
                    .expect("running thread is registered")
                    .quantums += 1;
                lib.registry.age_sleepers();
                return;
            }
            lib.registry.push_ready(running);
        }
    }

    switch_to_next(lib)
}

fn switch_to_next(lib: &mut ThreadTable) -> ! {
    let next = lib
        .registry
        .pop_ready()
        .expect("a runnable thread always exists at a switch");
    trace!("dispatch: {} -> {}", lib.running, next);
    lib.running = next;
    lib.total_quantums += 1;
    let tcb = lib.registry.tcb_mut(next).expect("ready tid is registered");
    tcb.quantums += 1;
    lib.registry.age_sleepers();
    // A full quantum for the incoming thread.
    signals::arm_timer(lib.quantum_usecs);

    let context: *const Context = &lib.registry.tcb(next).expect("ready tid is registered").context;
    unsafe { (*context).jump() }
}

/// First frame of every spawned thread.
pub(crate) extern "C" fn thread_start() -> ! {
    let entry = {
        let lib = unsafe { crate::table_mut() }.expect("a running thread implies a live table");
        lib.zombie = None;
        lib.registry
            .tcb(lib.running)
            .expect("running thread is registered")
            .entry
            .expect("spawned thread has an entry")
    };
    // A fresh thread starts with the empty mask it was created under.
    let empty = signals::empty_sigset();
    if unsafe { libc::sigprocmask(libc::SIG_SETMASK, &empty, ptr::null_mut()) } == -1 {
        crate::system_failure("sigprocmask");
    }

    entry();

    // The entry function fell off its end; the thread is done.
    let tid = crate::get_tid();
    crate::terminate(tid);
    unreachable!("terminated thread kept running");
}
