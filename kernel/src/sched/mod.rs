//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 调度器模块
//!
//! 单处理器、按优先级的协作式调度：
//! - `sched`: 调度器上下文、调度入口、时间片
//! - `runqueue`: 每个优先级一条就绪队列
//! - `sentinel`: 哨兵进程与死锁检查

pub mod runqueue;
pub mod sched;
pub mod sentinel;

pub use sched::{Kernel, SchedState};
