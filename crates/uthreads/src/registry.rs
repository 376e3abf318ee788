use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::tcb::{Tcb, Tid};

/// Highest number of concurrently live threads, the initial one included.
pub const MAX_THREAD_NUM: usize = 100;

/// All thread bookkeeping: the tid map, the FIFO ready queue, the sleeping
/// and blocked sets, and the pool of free tids.
///
/// A tid is free exactly when no TCB is registered for it; tid 0 belongs to
/// the initial thread and never enters the pool. Blocked is orthogonal to
/// sleeping: a thread can be both, and waking from sleep while blocked
/// leaves it parked until resumed.
#[derive(Debug)]
pub(crate) struct Registry {
    threads: BTreeMap<Tid, Box<Tcb>>,
    ready: VecDeque<Tid>,
    sleeping: BTreeSet<Tid>,
    blocked: BTreeSet<Tid>,
    free: BTreeSet<Tid>,
}

impl Registry {
    /// Fresh registry with the initial thread registered and every other
    /// tid free.
    pub(crate) fn new() -> Self {
        let mut threads = BTreeMap::new();
        threads.insert(0, Box::new(Tcb::main()));
        Self {
            threads,
            ready: VecDeque::with_capacity(MAX_THREAD_NUM),
            sleeping: BTreeSet::new(),
            blocked: BTreeSet::new(),
            free: (1..MAX_THREAD_NUM as Tid).collect(),
        }
    }

    pub(crate) fn lowest_free(&self) -> Option<Tid> {
        self.free.iter().next().copied()
    }

    pub(crate) fn contains(&self, tid: Tid) -> bool {
        self.threads.contains_key(&tid)
    }

    pub(crate) fn tcb(&self, tid: Tid) -> Option<&Tcb> {
        self.threads.get(&tid).map(|b| &**b)
    }

    pub(crate) fn tcb_mut(&mut self, tid: Tid) -> Option<&mut Tcb> {
        self.threads.get_mut(&tid).map(|b| &mut **b)
    }

    /// Register a spawned thread and queue it at the ready tail.
    pub(crate) fn admit(&mut self, tcb: Box<Tcb>) {
        let tid = tcb.tid;
        self.free.remove(&tid);
        self.threads.insert(tid, tcb);
        self.ready.push_back(tid);
    }

    /// Unregister `tid` from every structure and hand back its TCB. The
    /// tid returns to the free pool.
    pub(crate) fn remove(&mut self, tid: Tid) -> Option<Box<Tcb>> {
        let tcb = self.threads.remove(&tid)?;
        self.free.insert(tid);
        self.blocked.remove(&tid);
        self.sleeping.remove(&tid);
        self.remove_from_ready(tid);
        Some(tcb)
    }

    pub(crate) fn push_ready(&mut self, tid: Tid) {
        self.ready.push_back(tid);
    }

    pub(crate) fn pop_ready(&mut self) -> Option<Tid> {
        self.ready.pop_front()
    }

    pub(crate) fn ready_is_empty(&self) -> bool {
        self.ready.is_empty()
    }

    pub(crate) fn ready_contains(&self, tid: Tid) -> bool {
        self.ready.contains(&tid)
    }

    pub(crate) fn remove_from_ready(&mut self, tid: Tid) {
        self.ready.retain(|&t| t != tid);
    }

    pub(crate) fn mark_sleeping(&mut self, tid: Tid) {
        self.sleeping.insert(tid);
    }

    pub(crate) fn is_sleeping(&self, tid: Tid) -> bool {
        self.sleeping.contains(&tid)
    }

    pub(crate) fn set_blocked(&mut self, tid: Tid) {
        self.blocked.insert(tid);
    }

    pub(crate) fn clear_blocked(&mut self, tid: Tid) {
        self.blocked.remove(&tid);
    }

    /// One sleep tick for every sleeping thread. A thread reaching zero
    /// leaves the sleeping set; unless blocked it joins the ready tail,
    /// after everything already queued.
    pub(crate) fn age_sleepers(&mut self) {
        let sleepers: Vec<Tid> = self.sleeping.iter().copied().collect();
        for tid in sleepers {
            let tcb = self
                .threads
                .get_mut(&tid)
                .expect("sleeping tid is registered");
            tcb.sleep_remaining -= 1;
            if tcb.sleep_remaining == 0 {
                self.sleeping.remove(&tid);
                if !self.blocked.contains(&tid) {
                    self.ready.push_back(tid);
                }
            }
        }
    }
}
