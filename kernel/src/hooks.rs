//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 进程生命周期观测钩子
//!
//! 内核在 fork / 上下文切换 / quit 时调用，只做通知，不消费返回值。
//! 外部记账（例如后续阶段的统计）实现 [`ProcHooks`] 并通过
//! `Kernel::with_hooks` 注入。

use crate::process::Pid;

/// 生命周期钩子
pub trait ProcHooks: Send + Sync {
    /// 新进程已加入就绪队列
    fn on_fork(&self, _pid: Pid) {}

    /// 即将从 `old` 切换到 `new`，首次调度或前一进程已退出时 `old` 为 None
    fn on_switch(&self, _old: Option<Pid>, _new: Pid) {}

    /// 进程已进入 QUIT 状态
    fn on_quit(&self, _pid: Pid) {}
}

/// 空钩子
pub struct NoHooks;

impl ProcHooks for NoHooks {}
