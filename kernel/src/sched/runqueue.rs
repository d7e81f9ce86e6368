//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 就绪队列
//!
//! 每个优先级一条 FIFO 链表，数值越小优先级越高。
//! 只有 READY 状态的进程在队列中，正在运行的进程不在队列中。

use crate::config::{MAX_PRIORITY, SENTINEL_PRIORITY};
use crate::process::list::{ListHead, ListKind};
use crate::process::task::{Proc, ProcStatus};

/// 优先级级数（含哨兵优先级）
pub const PRIORITY_LEVELS: usize = (SENTINEL_PRIORITY - MAX_PRIORITY + 1) as usize;

/// 就绪队列
pub struct RunQueue {
    queues: [ListHead; PRIORITY_LEVELS],
}

impl Default for RunQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl RunQueue {
    pub const fn new() -> Self {
        Self { queues: [ListHead::new(); PRIORITY_LEVELS] }
    }

    #[inline]
    fn level(priority: i32) -> usize {
        (priority - MAX_PRIORITY) as usize
    }

    /// 加入所属优先级队列的尾部
    pub fn enqueue<C>(&mut self, procs: &mut [Proc<C>], idx: usize) -> bool {
        let level = Self::level(procs[idx].priority);
        self.queues[level].add_tail(procs, ListKind::Ready, idx)
    }

    /// 从所属优先级队列中删除，不在队列中时返回 false
    pub fn dequeue<C>(&mut self, procs: &mut [Proc<C>], idx: usize) -> bool {
        let level = Self::level(procs[idx].priority);
        self.queues[level].del(procs, ListKind::Ready, idx)
    }

    /// 优先级最高的就绪进程，不出队
    ///
    /// 队首状态不是 READY 的过期项被直接摘除
    pub fn peek<C>(&mut self, procs: &mut [Proc<C>]) -> Option<usize> {
        for queue in self.queues.iter_mut() {
            while let Some(first) = queue.first() {
                if procs[first].status == ProcStatus::Ready {
                    return Some(first);
                }
                log::warn!("runqueue: dropping stale entry pid {} ({})",
                    procs[first].pid, procs[first].status);
                queue.del(procs, ListKind::Ready, first);
            }
        }
        None
    }

    /// 某一优先级队列的内容
    pub fn queue<C>(&self, procs: &[Proc<C>], priority: i32) -> alloc::vec::Vec<usize> {
        self.queues[Self::level(priority)].iter(procs, ListKind::Ready).collect()
    }

    /// 队列中的进程总数
    pub fn len<C>(&self, procs: &[Proc<C>]) -> usize {
        self.queues.iter().map(|q| q.len(procs, ListKind::Ready)).sum()
    }
}
