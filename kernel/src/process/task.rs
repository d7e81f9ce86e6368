//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 进程控制块 (Process Control Block)
//!
//! 对应 Linux 的 `struct task_struct`，但只保留协作式调度需要的字段：
//! 身份、调度状态、执行资源、四种链表关系和退出数据。

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use super::list::{ListHead, ListKind, ListLink, ListNode, LIST_KINDS};
use super::Pid;
use crate::config::MIN_BLOCK_STATUS;

/// 进程状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcStatus {
    /// 空闲槽位
    Unused,
    /// 在就绪队列中
    Ready,
    /// 正在运行
    Running,
    /// 通过 blockMe 阻塞，携带调用者给出的原因码（> MIN_BLOCK_STATUS）
    Blocked(i32),
    /// 等待子进程退出
    JoinBlocked,
    /// 等待被 zap 的进程退出
    ZapBlocked,
    /// 已退出，等待父进程 join
    Quit,
}

impl ProcStatus {
    /// 数值状态码，blockMe 状态即其原因码
    pub const fn code(self) -> i32 {
        match self {
            ProcStatus::Unused => 0,
            ProcStatus::Ready => 1,
            ProcStatus::Running => 2,
            ProcStatus::Quit => 3,
            ProcStatus::JoinBlocked => 4,
            ProcStatus::ZapBlocked => 5,
            ProcStatus::Blocked(reason) => reason,
        }
    }

    /// 是否为 blockMe 阻塞
    pub const fn is_block_me(self) -> bool {
        matches!(self, ProcStatus::Blocked(reason) if reason > MIN_BLOCK_STATUS)
    }

    /// 存活：已占用且尚未退出
    pub const fn is_alive(self) -> bool {
        !matches!(self, ProcStatus::Unused | ProcStatus::Quit)
    }
}

impl fmt::Display for ProcStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcStatus::Unused => f.write_str("UNUSED"),
            ProcStatus::Ready => f.write_str("READY"),
            ProcStatus::Running => f.write_str("RUNNING"),
            ProcStatus::Blocked(reason) => write!(f, "{}", reason),
            ProcStatus::JoinBlocked => f.write_str("JOIN_BLOCKED"),
            ProcStatus::ZapBlocked => f.write_str("ZAP_BLOCKED"),
            ProcStatus::Quit => f.write_str("QUIT"),
        }
    }
}

/// 进程控制块
pub struct Proc<C> {
    pub pid: Pid,
    pub name: String,
    pub start_arg: String,
    /// 进程栈，槽位回收时释放
    pub stack: Vec<u8>,
    /// 保存的执行上下文
    pub context: Option<C>,
    pub priority: i32,
    pub status: ProcStatus,
    pub exit_status: i32,
    /// 被其他进程 zap 过，一经设置不再清除
    pub zapped: bool,

    /// 父进程槽位
    pub parent: Option<usize>,
    /// 父进程 PID，父进程槽位回收后仍用于展示
    pub parent_pid: Option<Pid>,
    /// 存活子进程
    pub children: ListHead,
    /// 已退出、尚未 join 的子进程
    pub quit_children: ListHead,
    /// 等待本进程退出的 zap 调用者
    pub zappers: ListHead,
    /// 本进程在各种链表中的链接
    links: [ListLink; LIST_KINDS],

    /// 累计 CPU 时间（微秒）
    pub cpu_time_us: u64,
    /// 最近一次被调度的时间（微秒）
    pub start_time_us: u64,
}

impl<C> Proc<C> {
    /// 空闲槽位
    pub const fn empty() -> Self {
        Self {
            pid: 0,
            name: String::new(),
            start_arg: String::new(),
            stack: Vec::new(),
            context: None,
            priority: 0,
            status: ProcStatus::Unused,
            exit_status: 0,
            zapped: false,
            parent: None,
            parent_pid: None,
            children: ListHead::new(),
            quit_children: ListHead::new(),
            zappers: ListHead::new(),
            links: [ListLink::new(); LIST_KINDS],
            cpu_time_us: 0,
            start_time_us: 0,
        }
    }

    /// 本进程持有的链表头
    ///
    /// 就绪队列头不在 PCB 中，传入 `ListKind::Ready` 返回 None
    pub fn head(&self, kind: ListKind) -> Option<ListHead> {
        match kind {
            ListKind::Ready => None,
            ListKind::Children => Some(self.children),
            ListKind::QuitChildren => Some(self.quit_children),
            ListKind::Zappers => Some(self.zappers),
        }
    }

    pub fn set_head(&mut self, kind: ListKind, head: ListHead) {
        match kind {
            ListKind::Ready => {}
            ListKind::Children => self.children = head,
            ListKind::QuitChildren => self.quit_children = head,
            ListKind::Zappers => self.zappers = head,
        }
    }
}

impl<C> ListNode for Proc<C> {
    fn link(&self, kind: ListKind) -> &ListLink {
        &self.links[kind as usize]
    }

    fn link_mut(&mut self, kind: ListKind) -> &mut ListLink {
        &mut self.links[kind as usize]
    }
}
