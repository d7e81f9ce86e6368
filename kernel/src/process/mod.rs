//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 进程管理模块
//!
//! - `task`: 进程控制块
//! - `list`: 侵入式索引链表
//! - `table`: 进程表与 PID 分配
//! - `fork`: 进程创建与 launch 跳板
//! - `exit`: quit / join
//! - `zap`: zap / blockMe / unblockProc
//! - `dump`: 进程表快照

pub mod dump;
pub mod exit;
pub mod fork;
pub mod list;
pub mod table;
pub mod task;
pub mod zap;

pub use dump::ProcInfo;
pub use task::{Proc, ProcStatus};

/// 进程 ID
pub type Pid = u32;
