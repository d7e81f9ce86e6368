//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 哨兵进程
//!
//! 优先级低于所有用户进程，没有其他进程就绪时运行，保证调度器总能选到进程。
//! 每轮先做死锁检查，再等待下一个中断。

use crate::arch::Machine;
use crate::config::MAX_IDLE_WAITS;
use crate::process::task::ProcStatus;

use super::Kernel;

/// 哨兵进程入口
pub(crate) fn sentinel<M: Machine>(kernel: &Kernel<M>, _arg: &str) -> i32 {
    loop {
        kernel.check_deadlock();
        kernel.machine().wait_int();
    }
}

impl<M: Machine> Kernel<M> {
    /// 死锁检查
    ///
    /// - 除哨兵外没有存活进程：正常停机
    /// - 所有存活进程都在等待 join / zap：死锁，错误停机
    /// - 否则还有 blockMe 阻塞的进程，可能被中断唤醒，继续等待；
    ///   连续空等超过 MAX_IDLE_WAITS 次同样判定为死锁
    pub(crate) fn check_deadlock(&self) {
        let (alive, waiting, idle_waits) = {
            let mut state = self.lock();
            let me = self.current_slot(&state);

            let mut alive = 0usize;
            let mut waiting = 0usize;
            for (slot, proc) in state.table.procs().iter().enumerate() {
                if slot == me || !proc.status.is_alive() {
                    continue;
                }
                alive += 1;
                if matches!(proc.status, ProcStatus::JoinBlocked | ProcStatus::ZapBlocked) {
                    waiting += 1;
                }
            }

            state.idle_waits += 1;
            (alive, waiting, state.idle_waits)
        };

        if alive == 0 {
            log::info!("check_deadlock(): all processes completed");
            self.machine().console(format_args!("All processes completed."));
            self.machine().halt(0);
        }

        if alive == waiting {
            log::error!("check_deadlock(): {} processes blocked forever", alive);
            self.machine().console(format_args!(
                "check_deadlock(): deadlock, {} processes blocked forever. Halting...",
                alive
            ));
            self.machine().halt(1);
        }

        if idle_waits > MAX_IDLE_WAITS {
            log::error!("check_deadlock(): no process released after {} idle waits", MAX_IDLE_WAITS);
            self.machine().console(format_args!(
                "check_deadlock(): deadlock, {} blocked processes never released. Halting...",
                alive
            ));
            self.machine().halt(1);
        }
    }
}
