//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 进程表快照

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use super::list::ListKind;
use super::task::ProcStatus;
use super::Pid;
use crate::arch::{InterruptGuard, Machine};
use crate::sched::Kernel;

/// 一个进程的诊断信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcInfo {
    pub pid: Pid,
    /// 没有父进程时为 None
    pub parent_pid: Option<Pid>,
    pub priority: i32,
    pub status: ProcStatus,
    /// 存活子进程数
    pub kids: usize,
    /// 累计 CPU 时间（毫秒）
    pub cpu_time_ms: u64,
    pub name: String,
}

impl<M: Machine> Kernel<M> {
    /// 打印进程表并返回快照，只包含已占用的槽位
    pub fn dump_processes(&self) -> Vec<ProcInfo> {
        let infos: Vec<ProcInfo> = {
            let _irq = InterruptGuard::new(self.machine());
            let state = self.lock();
            let table = &state.table;
            let infos = table
                .procs()
                .iter()
                .enumerate()
                .filter(|(_, p)| p.status != ProcStatus::Unused)
                .map(|(slot, p)| ProcInfo {
                    pid: p.pid,
                    parent_pid: p.parent_pid,
                    priority: p.priority,
                    status: p.status,
                    kids: table.list(slot, ListKind::Children).len(),
                    cpu_time_ms: p.cpu_time_us / 1000,
                    name: p.name.clone(),
                })
                .collect();
            infos
        };

        self.machine().console(format_args!(
            "{:>5} {:>6} {:>8} {:>13} {:>5} {:>8}  {}",
            "PID", "Parent", "Priority", "Status", "#Kids", "CPUtime", "Name"
        ));
        for info in &infos {
            let parent = info.parent_pid.map_or(-1, i64::from);
            self.machine().console(format_args!(
                "{:>5} {:>6} {:>8} {:>13} {:>5} {:>8}  {}",
                info.pid,
                parent,
                info.priority,
                info.status.to_string(),
                info.kids,
                info.cpu_time_ms,
                info.name
            ));
        }

        infos
    }
}
