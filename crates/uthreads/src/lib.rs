//! Many user-level threads on one kernel thread.
//!
//! A periodic virtual-time signal drives round-robin preemption; switching
//! is a saved-register jump between per-thread stacks. Every public entry
//! point masks the scheduling signal for its duration, returns 0 (or a
//! tid) on success and -1 after printing a `thread library error:` line on
//! stderr. Unrecoverable OS failures print a `system error:` line, release
//! every thread and end the process with status 1.

use core::cell::UnsafeCell;

use log::debug;

mod context;
mod error;
mod registry;
mod scheduler;
mod signals;
mod tcb;

pub use error::ThreadError;
pub use registry::MAX_THREAD_NUM;
pub use tcb::{ThreadEntry, Tid, STACK_SIZE};

use registry::Registry;
use scheduler::Reason;
use signals::SignalGuard;
use tcb::Tcb;

/// Minimal wrapper to store non-`Sync` state in a static.
///
/// Safety: callers must serialize access; here the scheduling-signal mask
/// is that serialization.
struct Global<T> {
    inner: UnsafeCell<T>,
}

impl<T> Global<T> {
    const fn new(value: T) -> Self {
        Self {
            inner: UnsafeCell::new(value),
        }
    }

    /// # Safety
    /// Callers must hold the scheduling signal masked, or be the handler.
    unsafe fn get_mut(&self) -> &mut T {
        unsafe { &mut *self.inner.get() }
    }
}

unsafe impl<T> Sync for Global<T> {}

static TABLE: Global<Option<ThreadTable>> = Global::new(None);

/// Process-wide library state behind the public entry points.
pub(crate) struct ThreadTable {
    pub(crate) registry: Registry,
    pub(crate) running: Tid,
    pub(crate) total_quantums: u32,
    pub(crate) quantum_usecs: i32,
    /// TCB of a self-terminated thread, kept alive until the next thread
    /// is off its stack.
    pub(crate) zombie: Option<Box<Tcb>>,
}

impl ThreadTable {
    fn new(quantum_usecs: i32) -> Self {
        Self {
            registry: Registry::new(),
            running: 0,
            total_quantums: 0,
            quantum_usecs,
            zombie: None,
        }
    }
}

/// # Safety
/// See [`Global::get_mut`].
pub(crate) unsafe fn table_mut() -> Option<&'static mut ThreadTable> {
    unsafe { TABLE.get_mut().as_mut() }
}

fn table() -> Result<&'static mut ThreadTable, ThreadError> {
    // Public entry points hold the guard around this.
    unsafe { table_mut() }.ok_or(ThreadError::NotInitialized)
}

/// An OS facility failed underneath the library: release every thread and
/// end the process.
pub(crate) fn system_failure(what: &str) -> ! {
    eprintln!("system error: {what} has failed");
    if let Some(mut table) = unsafe { TABLE.get_mut() }.take() {
        // The stack this call runs on must stay alive through exit.
        if let Some(own) = table.registry.remove(table.running) {
            std::mem::forget(own);
        }
    }
    std::process::exit(1);
}

fn fail(err: ThreadError) -> i32 {
    eprintln!("thread library error: {err}");
    -1
}

fn check_tid_range(tid: i32) -> Result<Tid, ThreadError> {
    if tid < 0 || tid >= MAX_THREAD_NUM as i32 {
        return Err(ThreadError::TidOutOfRange);
    }
    Ok(tid as Tid)
}

/// Initialize the library and start the quantum timer. The caller becomes
/// thread 0, already mid-quantum: the total and its own count start at 1.
pub fn init(quantum_usecs: i32) -> i32 {
    let _guard = SignalGuard::block();
    if quantum_usecs <= 0 {
        return fail(ThreadError::NonPositiveQuantum);
    }
    unsafe {
        *TABLE.get_mut() = Some(ThreadTable::new(quantum_usecs));
    }
    let lib = unsafe { table_mut() }.expect("table was just installed");
    scheduler::dispatch(lib, Reason::Init);
    signals::install_handler(scheduler::timer_tick);
    signals::arm_timer(quantum_usecs);
    debug!("thread library up, quantum = {}us", quantum_usecs);
    0
}

/// Create a thread that will run `entry`, at the tail of the ready queue.
/// Returns the new tid: the smallest one free.
pub fn spawn(entry: ThreadEntry) -> i32 {
    let _guard = SignalGuard::block();
    match spawn_impl(entry) {
        Ok(tid) => tid as i32,
        Err(err) => fail(err),
    }
}

fn spawn_impl(entry: ThreadEntry) -> Result<Tid, ThreadError> {
    let lib = table()?;
    let tid = lib.registry.lowest_free().ok_or(ThreadError::TidsExhausted)?;
    lib.registry.admit(Box::new(Tcb::fresh(tid, entry)));
    Ok(tid)
}

/// Terminate `tid`. Terminating thread 0 tears the library down and exits
/// the process with status 0; a thread terminating itself never returns.
pub fn terminate(tid: i32) -> i32 {
    let _guard = SignalGuard::block();
    match terminate_impl(tid) {
        Ok(()) => 0,
        Err(err) => fail(err),
    }
}

fn terminate_impl(tid: i32) -> Result<(), ThreadError> {
    let lib = table()?;
    let tid = check_tid_range(tid)?;
    if !lib.registry.contains(tid) {
        return Err(ThreadError::NoSuchThread);
    }
    if tid == 0 {
        signals::teardown();
        if let Some(mut table) = unsafe { TABLE.get_mut() }.take() {
            // Keep the stack this call runs on alive through exit.
            if let Some(own) = table.registry.remove(table.running) {
                std::mem::forget(own);
            }
        }
        std::process::exit(0);
    }
    if tid == lib.running {
        scheduler::dispatch(lib, Reason::Terminate);
        unreachable!("terminated thread kept running");
    }
    lib.registry.remove(tid);
    Ok(())
}

/// Move `tid` into the blocked set. Blocking the running thread dispatches
/// the next ready one; blocking thread 0 is refused.
pub fn block(tid: i32) -> i32 {
    let _guard = SignalGuard::block();
    match block_impl(tid) {
        Ok(()) => 0,
        Err(err) => fail(err),
    }
}

fn block_impl(tid: i32) -> Result<(), ThreadError> {
    let lib = table()?;
    let tid = check_tid_range(tid)?;
    if tid == 0 {
        return Err(ThreadError::CannotBlockMain);
    }
    if !lib.registry.contains(tid) {
        return Err(ThreadError::NoSuchThread);
    }
    lib.registry.set_blocked(tid);
    if tid == lib.running {
        scheduler::dispatch(lib, Reason::Block);
    } else {
        lib.registry.remove_from_ready(tid);
    }
    Ok(())
}

/// Clear `tid`'s blocked state. Queues the thread only if it is not
/// sleeping, not already queued and not running; resuming an unblocked
/// thread changes nothing.
pub fn resume(tid: i32) -> i32 {
    let _guard = SignalGuard::block();
    match resume_impl(tid) {
        Ok(()) => 0,
        Err(err) => fail(err),
    }
}

fn resume_impl(tid: i32) -> Result<(), ThreadError> {
    let lib = table()?;
    let tid = check_tid_range(tid)?;
    if !lib.registry.contains(tid) {
        return Err(ThreadError::NoSuchThread);
    }
    lib.registry.clear_blocked(tid);
    if tid != lib.running && !lib.registry.is_sleeping(tid) && !lib.registry.ready_contains(tid) {
        lib.registry.push_ready(tid);
    }
    Ok(())
}

/// Put the running thread to sleep for `num_quantums` ticks and dispatch
/// the next ready thread. Thread 0 may not sleep.
pub fn sleep(num_quantums: i32) -> i32 {
    let _guard = SignalGuard::block();
    match sleep_impl(num_quantums) {
        Ok(()) => 0,
        Err(err) => fail(err),
    }
}

fn sleep_impl(num_quantums: i32) -> Result<(), ThreadError> {
    let lib = table()?;
    if num_quantums <= 0 {
        return Err(ThreadError::NonPositiveSleep);
    }
    if lib.running == 0 {
        return Err(ThreadError::CannotSleepMain);
    }
    let running = lib.running;
    lib.registry
        .tcb_mut(running)
        .expect("running thread is registered")
        .sleep_remaining = num_quantums as u32;
    scheduler::dispatch(lib, Reason::Sleep);
    Ok(())
}

/// Tid of the calling thread.
pub fn get_tid() -> i32 {
    let _guard = SignalGuard::block();
    match table() {
        Ok(lib) => lib.running as i32,
        Err(err) => fail(err),
    }
}

/// Quanta elapsed since `init`, the init quantum included.
pub fn get_total_quantums() -> i32 {
    let _guard = SignalGuard::block();
    match table() {
        Ok(lib) => lib.total_quantums as i32,
        Err(err) => fail(err),
    }
}

/// Quanta `tid` has run for, or -1 for an invalid or unknown tid.
pub fn get_quantums(tid: i32) -> i32 {
    let _guard = SignalGuard::block();
    match get_quantums_impl(tid) {
        Ok(count) => count as i32,
        Err(err) => fail(err),
    }
}

fn get_quantums_impl(tid: i32) -> Result<u32, ThreadError> {
    let lib = table()?;
    let tid = check_tid_range(tid)?;
    let tcb = lib.registry.tcb(tid).ok_or(ThreadError::NoSuchThread)?;
    Ok(tcb.quantums)
}
