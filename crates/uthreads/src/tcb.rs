use crate::context::Context;
use crate::scheduler;

pub type Tid = u32;

/// Entry function of a spawned thread. A thread whose entry returns is
/// terminated as if it had terminated itself.
pub type ThreadEntry = fn();

/// Bytes of stack owned by each spawned thread.
pub const STACK_SIZE: usize = 16 * 1024;

/// Thread control block. The initial thread (tid 0) runs on the process
/// stack and owns none of its own.
#[derive(Debug)]
pub(crate) struct Tcb {
    pub(crate) tid: Tid,
    /// Quanta this thread has been dispatched for.
    pub(crate) quantums: u32,
    /// Sleep ticks left; meaningful only while in the sleeping set.
    pub(crate) sleep_remaining: u32,
    pub(crate) entry: Option<ThreadEntry>,
    pub(crate) context: Context,
    #[allow(dead_code)] // owned for its lifetime, touched only through the context
    stack: Option<Box<[u8]>>,
}

impl Tcb {
    pub(crate) fn main() -> Self {
        Self {
            tid: 0,
            quantums: 0,
            sleep_remaining: 0,
            entry: None,
            context: Context::main(),
            stack: None,
        }
    }

    pub(crate) fn fresh(tid: Tid, entry: ThreadEntry) -> Self {
        let mut stack = vec![0u8; STACK_SIZE].into_boxed_slice();
        let context = Context::for_entry(scheduler::thread_start, &mut stack);
        Self {
            tid,
            quantums: 0,
            sleep_remaining: 0,
            entry: Some(entry),
            context,
            stack: Some(stack),
        }
    }
}
