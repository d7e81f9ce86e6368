//! 场景测试
//!
//! 每个测试在新的 `HostMachine` 上启动一个内核，start1 的闭包即测试主体。
//! 进程内的断言失败会让机器以 PANIC_STATUS 停机，并由 `boot` 重新抛出。
//!
//! 运行测试：
//! ```bash
//! cargo test --package psched
//! ```

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use spin::Mutex;

use crate::arch::host::HostMachine;
use crate::hooks::ProcHooks;
use crate::process::Pid;
use crate::sched::Kernel;

pub mod fork;
pub mod scheduler;

/// 测试中使用的内核类型
pub type K = Kernel<HostMachine>;

/// 启动内核运行 `start1`，返回停机状态和机器
pub fn run<F>(start1: F) -> (i32, HostMachine)
where
    F: FnOnce(&K, &str) -> i32 + Send + 'static,
{
    crate::logk::init();
    let machine = HostMachine::new();
    let kernel = Kernel::new(machine.clone());
    let status = machine.boot(move || {
        kernel.startup(start1);
    });
    (status, machine)
}

/// 启动带钩子的内核
pub fn run_with_hooks<F, H>(hooks: H, start1: F) -> (i32, HostMachine)
where
    F: FnOnce(&K, &str) -> i32 + Send + 'static,
    H: ProcHooks + 'static,
{
    crate::logk::init();
    let machine = HostMachine::new();
    let kernel = Kernel::with_hooks(machine.clone(), hooks);
    let status = machine.boot(move || {
        kernel.startup(start1);
    });
    (status, machine)
}

/// 跨进程记录事件顺序
#[derive(Clone, Default)]
pub struct Trace(Arc<Mutex<Vec<String>>>);

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().clone()
    }
}

/// 启动参数中的 PID
pub fn arg_pid(arg: &str) -> Pid {
    arg.parse().unwrap()
}

/// 控制台输出中是否有包含 `needle` 的行
pub fn console_has(machine: &HostMachine, needle: &str) -> bool {
    machine.console_output().iter().any(|line| line.contains(needle))
}
