//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 进程表与 PID 管理
//!
//! - 固定 MAX_PROC 个槽位，PID 落在 `pid % MAX_PROC` 号槽位
//! - PID 从上一次分配处向后扫描，跳过被占用的槽位
//! - PID 单调递增，槽位被 join 回收后才会被新 PID 复用

use alloc::vec;
use alloc::vec::Vec;
use core::ops::{Index, IndexMut};

use super::list::{ListHead, ListKind};
use super::task::{Proc, ProcStatus};
use super::Pid;
use crate::config::{MAX_PROC, SENTINEL_PID};
use crate::errno::Errno;

/// 进程表
pub struct ProcTable<C> {
    procs: Vec<Proc<C>>,
    /// 下一个候选 PID
    next_pid: Pid,
}

impl<C> Default for ProcTable<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> ProcTable<C> {
    pub fn new() -> Self {
        Self {
            procs: (0..MAX_PROC).map(|_| Proc::empty()).collect(),
            next_pid: SENTINEL_PID,
        }
    }

    /// PID 对应的槽位
    #[inline]
    pub fn slot_of(pid: Pid) -> usize {
        pid as usize % MAX_PROC
    }

    /// 分配 PID 和空闲槽位
    ///
    /// 槽位仍为 UNUSED，由调用者填充
    pub fn alloc_slot(&mut self) -> Result<(Pid, usize), Errno> {
        for _ in 0..MAX_PROC {
            let pid = self.next_pid;
            self.next_pid = self.next_pid.wrapping_add(1);
            if pid == 0 {
                continue;
            }

            let slot = Self::slot_of(pid);
            if self.procs[slot].status == ProcStatus::Unused {
                return Ok((pid, slot));
            }
        }
        Err(Errno::TableFull)
    }

    /// 查找 PID 所在槽位
    pub fn find(&self, pid: Pid) -> Option<usize> {
        let slot = Self::slot_of(pid);
        let proc = &self.procs[slot];
        (proc.status != ProcStatus::Unused && proc.pid == pid).then_some(slot)
    }

    /// 回收槽位，释放栈和上下文
    ///
    /// 尚未被 join 的已退出子进程再也没有父进程可以回收它们，一并释放
    pub fn release(&mut self, slot: usize) {
        let mut pending = vec![slot];
        while let Some(slot) = pending.pop() {
            while let Some(orphan) = self.pop_from_list(slot, ListKind::QuitChildren) {
                self.procs[orphan].parent = None;
                pending.push(orphan);
            }
            self.procs[slot] = Proc::empty();
        }
    }

    /// 全部槽位
    pub fn procs(&self) -> &[Proc<C>] {
        &self.procs
    }

    pub fn procs_mut(&mut self) -> &mut [Proc<C>] {
        &mut self.procs
    }

    /// 占用中的槽位数
    pub fn used(&self) -> usize {
        self.procs.iter().filter(|p| p.status != ProcStatus::Unused).count()
    }

    /// 把 `idx` 加到 `owner` 持有的 `kind` 链表尾部
    pub fn add_to_list(&mut self, owner: usize, kind: ListKind, idx: usize) -> bool {
        self.with_head(owner, kind, |head, procs| head.add_tail(procs, kind, idx))
    }

    /// 把 `idx` 从 `owner` 持有的 `kind` 链表中删除，不在链表上时返回 false
    pub fn remove_from_list(&mut self, owner: usize, kind: ListKind, idx: usize) -> bool {
        self.with_head(owner, kind, |head, procs| head.del(procs, kind, idx))
    }

    /// 取出 `owner` 持有的 `kind` 链表的第一个节点
    pub fn pop_from_list(&mut self, owner: usize, kind: ListKind) -> Option<usize> {
        self.with_head(owner, kind, |head, procs| head.pop_front(procs, kind))
    }

    /// `owner` 持有的 `kind` 链表内容
    pub fn list(&self, owner: usize, kind: ListKind) -> Vec<usize> {
        match self.procs[owner].head(kind) {
            Some(head) => head.iter(&self.procs, kind).collect(),
            None => Vec::new(),
        }
    }

    /// 链表头存放在 PCB 内，先取出副本再操作，避免同时借用
    fn with_head<R>(
        &mut self,
        owner: usize,
        kind: ListKind,
        f: impl FnOnce(&mut ListHead, &mut [Proc<C>]) -> R,
    ) -> R {
        let mut head = self.procs[owner].head(kind).unwrap_or_default();
        let ret = f(&mut head, &mut self.procs);
        self.procs[owner].set_head(kind, head);
        ret
    }
}

impl<C> Index<usize> for ProcTable<C> {
    type Output = Proc<C>;

    fn index(&self, slot: usize) -> &Proc<C> {
        &self.procs[slot]
    }
}

impl<C> IndexMut<usize> for ProcTable<C> {
    fn index_mut(&mut self, slot: usize) -> &mut Proc<C> {
        &mut self.procs[slot]
    }
}
