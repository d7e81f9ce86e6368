//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! zap 与 blockMe / unblockProc
//!
//! zap 是协作式的：目标进程只被打上标记，调用者阻塞到目标自己 quit 为止。
//! 被 zap 的进程在下一次阻塞调用返回时通过 Err(Zapped) 得知。

use super::list::ListKind;
use super::task::ProcStatus;
use super::Pid;
use crate::arch::{InterruptGuard, Machine};
use crate::config::MIN_BLOCK_STATUS;
use crate::errno::Errno;
use crate::sched::Kernel;

impl<M: Machine> Kernel<M> {
    /// zap 进程 `pid` 并等待它退出
    ///
    /// 目标已退出时立即返回。zap 自己或不存在的进程是致命错误。
    pub fn zap(&self, pid: Pid) -> Result<(), Errno> {
        self.check_kernel_mode("zap");

        {
            let _irq = InterruptGuard::new(self.machine());
            let mut guard = self.lock();
            let state = &mut *guard;
            let cur = self.current_slot(state);
            let me = state.table[cur].pid;

            if me == pid {
                drop(guard);
                self.fatal(format_args!("zap(): process {} tried to zap itself. Halting...", pid));
            }

            let Some(target) = state.table.find(pid) else {
                drop(guard);
                self.fatal(format_args!(
                    "zap(): process {} tried to zap nonexistent process {}. Halting...", me, pid
                ));
            };

            if state.table[target].status == ProcStatus::Quit {
                return Ok(());
            }

            state.table[target].zapped = true;
            state.table.add_to_list(target, ListKind::Zappers, cur);
            state.table[cur].status = ProcStatus::ZapBlocked;
            log::debug!("zap(): process {} zapped {}", me, pid);
        }
        self.schedule();

        if self.is_zapped() {
            return Err(Errno::Zapped);
        }
        Ok(())
    }

    /// 当前进程是否被 zap
    pub fn is_zapped(&self) -> bool {
        let state = self.lock();
        state.table[self.current_slot(&state)].zapped
    }

    /// 阻塞当前进程，直到被 unblock_proc 唤醒
    ///
    /// `status` 必须大于 MIN_BLOCK_STATUS，否则停机
    pub fn block_me(&self, status: i32) -> Result<(), Errno> {
        self.check_kernel_mode("block_me");

        if status <= MIN_BLOCK_STATUS {
            self.fatal(format_args!(
                "block_me(): status {} must be greater than {}. Halting...", status, MIN_BLOCK_STATUS
            ));
        }

        {
            let _irq = InterruptGuard::new(self.machine());
            let mut state = self.lock();
            let cur = self.current_slot(&state);
            state.table[cur].status = ProcStatus::Blocked(status);
            log::debug!("block_me(): process {} blocked ({})", state.table[cur].pid, status);
        }
        self.schedule();

        if self.is_zapped() {
            return Err(Errno::Zapped);
        }
        Ok(())
    }

    /// 唤醒通过 block_me 阻塞的进程
    ///
    /// # 返回
    /// - Err(NotBlocked): 进程不存在、是调用者自己或没有被 block_me 阻塞
    /// - Err(Zapped): 调用者已被 zap
    pub fn unblock_proc(&self, pid: Pid) -> Result<(), Errno> {
        self.check_kernel_mode("unblock_proc");

        {
            let _irq = InterruptGuard::new(self.machine());
            let mut guard = self.lock();
            let state = &mut *guard;
            let cur = self.current_slot(state);

            let target = state
                .table
                .find(pid)
                .filter(|&t| t != cur && state.table[t].status.is_block_me());
            let Some(target) = target else {
                return Err(Errno::NotBlocked);
            };
            if state.table[cur].zapped {
                return Err(Errno::Zapped);
            }

            state.table[target].status = ProcStatus::Ready;
            state.rq.enqueue(state.table.procs_mut(), target);
            log::debug!("unblock_proc(): process {} unblocked {}", state.table[cur].pid, pid);
        }
        self.schedule();

        Ok(())
    }
}
