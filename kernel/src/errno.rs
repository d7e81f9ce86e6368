//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 可恢复错误代码定义
//!
//! 进程接口返回 `Result<_, Errno>`。判别值沿用 include/uapi/asm-generic/errno.h
//! 中最接近的含义；`legacy_code()` 给出经典 phase1 接口的 -1/-2 返回约定。
//!
//! 不可恢复的内核不变量破坏（例如 quit 时仍有存活子进程）不走这里，
//! 统一由 `Kernel::fatal()` 停机。

use core::fmt;

/// 可恢复错误代码
///
/// 使用方法：
/// ```rust
/// use psched::errno::Errno;
///
/// let err = Errno::NoChildren;
/// assert_eq!(err.as_neg_i32(), -10);
/// assert_eq!(err.legacy_code(), -2);
/// ```
#[repr(i32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Errno {
    /// 被 zap (EINTR, 4)
    ///
    /// join / zap / blockMe / unblockProc 期间调用者被其他进程 zap
    Zapped = 4,

    /// 没有可 join 的子进程 (ECHILD, 10)
    NoChildren = 10,

    /// 进程表已满 (EAGAIN, 11)
    TableFull = 11,

    /// 栈小于最小值 (ENOMEM, 12)
    StackTooSmall = 12,

    /// 参数非法 (EINVAL, 22)
    ///
    /// 空进程名、优先级越界
    InvalidArgument = 22,

    /// 目标进程不存在或未被 blockMe 阻塞 (ESRCH, 3)
    NotBlocked = 3,
}

impl Errno {
    /// 获取错误代码的正数值（用于比较）
    #[inline]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// 获取错误代码的负数值（用于系统调用返回）
    #[inline]
    pub const fn as_neg_i32(self) -> i32 {
        -(self as i32)
    }

    /// 经典 phase1 接口的返回值
    ///
    /// - fork: 参数非法 / 表满 -1，栈过小 -2
    /// - join: 被 zap -1，无子进程 -2
    /// - unblockProc: 被 zap -1，目标不可唤醒 -2
    pub const fn legacy_code(self) -> i32 {
        match self {
            Errno::Zapped | Errno::TableFull | Errno::InvalidArgument => -1,
            Errno::NoChildren | Errno::StackTooSmall | Errno::NotBlocked => -2,
        }
    }

    /// 错误描述
    pub const fn description(self) -> &'static str {
        match self {
            Errno::Zapped => "process was zapped",
            Errno::NoChildren => "no children to join",
            Errno::TableFull => "process table full",
            Errno::StackTooSmall => "stack size too small",
            Errno::InvalidArgument => "invalid argument",
            Errno::NotBlocked => "process not blocked by blockMe",
        }
    }
}

impl fmt::Display for Errno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description(), self.as_neg_i32())
    }
}
