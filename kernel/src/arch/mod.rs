//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 机器抽象层
//!
//! 调度核心不直接触碰寄存器，而是通过 [`Machine`] 使用宿主环境提供的原语：
//! - 上下文初始化 / 切换 / 装载
//! - 处理器状态字 (PSR)：内核态位、中断使能位
//! - 时钟中断处理函数注册、等待中断
//! - 控制台输出、停机
//!
//! 当前提供的实现：
//! - **host** - 宿主机线程模拟（`std` 特性），用于测试与模拟运行

pub mod irq;
pub mod psr;

#[cfg(any(test, feature = "std"))]
pub mod host;

pub use irq::InterruptGuard;
pub use psr::Psr;

use alloc::boxed::Box;
use core::fmt;

/// 上下文入口
///
/// 新进程的上下文首次被装载时执行，内核总是传入 launch 跳板
pub type Entry = Box<dyn FnOnce() + Send + 'static>;

/// 时钟中断处理函数
pub type ClockHandler = Box<dyn Fn() + Send + Sync + 'static>;

/// 宿主环境原语
///
/// 对应 USLOSS 一类模拟器提供给 phase1 内核的接口
pub trait Machine: Send + Sync + 'static {
    /// 保存的执行上下文句柄，内核从不检查其内容
    type Context: Clone + Send + 'static;

    /// 在 `stack` 上初始化上下文，首次运行时执行 `entry`
    fn init_context(&self, stack: &mut [u8], entry: Entry) -> Self::Context;

    /// 保存当前执行状态到 `old` 并切换到 `new`
    ///
    /// `old` 再次被切换回来时返回
    fn switch_context(&self, old: &Self::Context, new: &Self::Context);

    /// 不保存当前状态，直接装载 `new`
    ///
    /// 用于首次调度以及前一个进程已经 quit 的情况
    fn load_context(&self, new: &Self::Context) -> !;

    /// 读取处理器状态字
    fn psr_get(&self) -> Psr;

    /// 写入处理器状态字
    fn psr_set(&self, psr: Psr);

    /// 注册时钟中断处理函数
    fn install_clock_handler(&self, handler: ClockHandler);

    /// 等待下一个中断
    fn wait_int(&self);

    /// 当前时间（微秒）
    fn now_us(&self) -> u64;

    /// 控制台输出一行
    fn console(&self, args: fmt::Arguments<'_>);

    /// 停机，`status` 为 0 表示正常结束
    fn halt(&self, status: i32) -> !;
}
