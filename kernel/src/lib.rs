//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! psched: 单处理器、按优先级的协作式进程调度内核
//!
//! 提供进程创建 (fork)、退出与回收 (quit / join)、zap、blockMe / unblockProc，
//! 以及在没有其他进程可运行时检测死锁的哨兵进程。
//!
//! 底层机器通过 [`Machine`] 注入；启用 `std` 特性时提供宿主机线程模拟后端
//! [`HostMachine`]。
//!
//! ```no_run
//! use psched::{HostMachine, Kernel};
//!
//! let machine = HostMachine::new();
//! let kernel = Kernel::new(machine.clone());
//! let status = machine.boot(move || {
//!     kernel.startup(|k, _| {
//!         let child = k.fork("worker", |_, _| 42, "", psched::config::MIN_STACK, 3).unwrap();
//!         let mut code = 0;
//!         assert_eq!(k.join(&mut code), Ok(child));
//!         assert_eq!(code, 42);
//!         0
//!     });
//! });
//! assert_eq!(status, 0);
//! ```

#![cfg_attr(not(any(test, feature = "std")), no_std)]

extern crate alloc;
extern crate log;

pub mod arch;
pub mod config;
pub mod errno;
pub mod hooks;
pub mod process;
pub mod sched;

#[cfg(any(test, feature = "std"))]
pub mod logk;

#[cfg(test)]
mod tests;

pub use arch::{Machine, Psr};
pub use errno::Errno;
pub use hooks::{NoHooks, ProcHooks};
pub use process::{Pid, ProcInfo, ProcStatus};
pub use sched::Kernel;

#[cfg(any(test, feature = "std"))]
pub use arch::host::HostMachine;
