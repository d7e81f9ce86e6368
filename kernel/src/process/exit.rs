//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 进程退出与回收
//!
//! 对应 Linux 的 do_exit() / do_wait()：
//! - quit: 进入 QUIT 状态，从父进程的 children 移到 quit_children，
//!   唤醒 join 中的父进程和所有 zap 等待者
//! - join: 按退出顺序回收子进程，没有已退出子进程时阻塞重试

use super::list::ListKind;
use super::task::ProcStatus;
use super::Pid;
use crate::arch::{InterruptGuard, Machine};
use crate::errno::Errno;
use crate::sched::Kernel;

impl<M: Machine> Kernel<M> {
    /// 终止当前进程
    ///
    /// 仍有存活子进程时停机。不返回。
    pub fn quit(&self, status: i32) -> ! {
        self.check_kernel_mode("quit");

        let pid = {
            let _irq = InterruptGuard::new(self.machine());
            let mut guard = self.lock();
            let state = &mut *guard;
            let cur = self.current_slot(state);
            let pid = state.table[cur].pid;

            if !state.table[cur].children.is_empty() {
                drop(guard);
                self.fatal(format_args!(
                    "quit(): process {} has active children. Halting...", pid
                ));
            }

            state.table[cur].status = ProcStatus::Quit;
            state.table[cur].exit_status = status;

            if let Some(parent) = state.table[cur].parent {
                state.table.remove_from_list(parent, ListKind::Children, cur);
                state.table.add_to_list(parent, ListKind::QuitChildren, cur);
                if state.table[parent].status == ProcStatus::JoinBlocked {
                    state.table[parent].status = ProcStatus::Ready;
                    state.rq.enqueue(state.table.procs_mut(), parent);
                }
            }

            while let Some(zapper) = state.table.pop_from_list(cur, ListKind::Zappers) {
                if state.table[zapper].status == ProcStatus::ZapBlocked {
                    state.table[zapper].status = ProcStatus::Ready;
                    state.rq.enqueue(state.table.procs_mut(), zapper);
                }
            }
            pid
        };

        log::debug!("quit(): process {} exited with status {}", pid, status);
        self.hooks().on_quit(pid);
        self.schedule();

        self.fatal(format_args!("quit(): process {} was scheduled again", pid))
    }

    /// 等待一个子进程退出并回收
    ///
    /// # 参数
    /// - `status`: 写入被回收子进程的退出状态
    ///
    /// # 返回
    /// - Ok(pid): 被回收子进程的 PID
    /// - Err(NoChildren): 没有存活或已退出的子进程
    /// - Err(Zapped): 调用者已被 zap（子进程仍被回收，`status` 仍被写入）
    pub fn join(&self, status: &mut i32) -> Result<Pid, Errno> {
        self.check_kernel_mode("join");

        loop {
            {
                let _irq = InterruptGuard::new(self.machine());
                let mut guard = self.lock();
                let state = &mut *guard;
                let cur = self.current_slot(state);

                if state.table[cur].children.is_empty() && state.table[cur].quit_children.is_empty() {
                    return Err(Errno::NoChildren);
                }

                if let Some(child) = state.table.pop_from_list(cur, ListKind::QuitChildren) {
                    let pid = state.table[child].pid;
                    *status = state.table[child].exit_status;
                    state.table.release(child);
                    log::debug!("join(): process {} reaped child {} (status {})",
                        state.table[cur].pid, pid, *status);

                    if state.table[cur].zapped {
                        return Err(Errno::Zapped);
                    }
                    return Ok(pid);
                }

                state.table[cur].status = ProcStatus::JoinBlocked;
            }
            self.schedule();
        }
    }
}
