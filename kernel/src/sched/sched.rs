//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 调度器核心
//!
//! 对应 Linux kernel/sched/core.c 中 schedule() -> __schedule() -> context_switch()
//! 的路径，但只有一个处理器、不可抢占：
//! - 进程表、就绪队列和当前进程都在 [`Kernel`] 中，由一把自旋锁保护
//! - 临界区外层总是先关中断 ([`InterruptGuard`])
//! - 上下文切换前必须释放锁

use alloc::boxed::Box;
use alloc::sync::{Arc, Weak};
use core::fmt;
use spin::{Mutex, MutexGuard};

use crate::arch::{InterruptGuard, Machine, Psr};
use crate::config::{
    MIN_STACK, SENTINEL_PID, SENTINEL_PRIORITY, START1_PRIORITY, START1_STACK, TIME_SLICE_US,
};
use crate::hooks::{NoHooks, ProcHooks};
use crate::process::table::ProcTable;
use crate::process::task::ProcStatus;
use crate::process::Pid;

use super::runqueue::RunQueue;
use super::sentinel::sentinel;

/// 调度器状态
pub struct SchedState<C> {
    pub table: ProcTable<C>,
    pub rq: RunQueue,
    /// 当前进程槽位，首次调度前为 None
    pub current: Option<usize>,
    /// 哨兵连续空等中断次数
    pub idle_waits: u32,
}

impl<C> SchedState<C> {
    fn new() -> Self {
        Self {
            table: ProcTable::new(),
            rq: RunQueue::new(),
            current: None,
            idle_waits: 0,
        }
    }
}

/// 调度器上下文
///
/// 所有进程接口都是它的方法。每个进程的入口持有一个 `Arc<Kernel>`，
/// 启动内核的线程被切走后内核仍然存活。
pub struct Kernel<M: Machine> {
    this: Weak<Kernel<M>>,
    machine: M,
    hooks: Box<dyn ProcHooks>,
    state: Mutex<SchedState<M::Context>>,
}

impl<M: Machine> Kernel<M> {
    /// 创建内核
    pub fn new(machine: M) -> Arc<Self> {
        Self::with_hooks(machine, NoHooks)
    }

    /// 创建内核并注入生命周期钩子
    pub fn with_hooks<H: ProcHooks + 'static>(machine: M, hooks: H) -> Arc<Self> {
        Arc::new_cyclic(|this| Kernel {
            this: this.clone(),
            machine,
            hooks: Box::new(hooks),
            state: Mutex::new(SchedState::new()),
        })
    }

    /// 底层机器
    pub fn machine(&self) -> &M {
        &self.machine
    }

    pub(crate) fn weak(&self) -> Weak<Kernel<M>> {
        self.this.clone()
    }

    pub(crate) fn hooks(&self) -> &dyn ProcHooks {
        self.hooks.as_ref()
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, SchedState<M::Context>> {
        self.state.lock()
    }

    /// 启动
    ///
    /// 注册时钟中断处理函数，创建哨兵进程（不调度），再创建 start1 并调度。
    /// 不返回：之后的执行全部发生在进程上下文中。
    pub fn startup<F>(&self, start1: F) -> !
    where
        F: FnOnce(&Kernel<M>, &str) -> i32 + Send + 'static,
    {
        self.check_kernel_mode("startup");

        let this = self.weak();
        self.machine.install_clock_handler(Box::new(move || {
            if let Some(kernel) = this.upgrade() {
                kernel.clock_handler();
            }
        }));

        log::info!("startup(): creating sentinel");
        if let Err(e) = self.fork_inner("sentinel", sentinel::<M>, "", MIN_STACK, SENTINEL_PRIORITY) {
            self.fatal(format_args!("startup(): fork of sentinel returned error: {}", e));
        }

        log::info!("startup(): creating start1");
        if let Err(e) = self.fork_inner("start1", start1, "", START1_STACK, START1_PRIORITY) {
            self.fatal(format_args!("startup(): fork of start1 returned error: {}", e));
        }

        self.schedule();

        self.fatal(format_args!("startup(): should not have returned"))
    }

    /// 调度器 (dispatcher)
    ///
    /// 选出优先级最高的就绪进程并切换过去：
    /// - 当前进程仍在运行且没有更高优先级的就绪进程时，不切换
    /// - 被抢占的运行进程回到自己优先级队列的尾部
    /// - 前一个进程已退出或首次调度时，不保存上下文
    ///
    /// 调用者不能持有调度锁。在被切换回来时返回。
    pub fn schedule(&self) {
        let _irq = InterruptGuard::new(&self.machine);
        let mut guard = self.lock();
        let state = &mut *guard;
        let now = self.machine.now_us();
        let prev = state.current;

        let Some(next) = state.rq.peek(state.table.procs_mut()) else {
            if prev.is_some_and(|p| state.table[p].status == ProcStatus::Running) {
                return;
            }
            drop(guard);
            self.fatal(format_args!("schedule(): no process ready to run"));
        };

        if let Some(p) = prev {
            let running = state.table[p].status == ProcStatus::Running;
            if running && state.table[p].priority <= state.table[next].priority {
                return;
            }
        }

        state.rq.dequeue(state.table.procs_mut(), next);
        if state.table[next].pid != SENTINEL_PID {
            state.idle_waits = 0;
        }

        // CPU 时间记账
        if let Some(p) = prev {
            let outgoing = &mut state.table[p];
            outgoing.cpu_time_us += now.saturating_sub(outgoing.start_time_us);
            if outgoing.status == ProcStatus::Running && p != next {
                outgoing.status = ProcStatus::Ready;
                state.rq.enqueue(state.table.procs_mut(), p);
            }
        }

        let incoming = &mut state.table[next];
        incoming.status = ProcStatus::Running;
        incoming.start_time_us = now;
        let next_pid = incoming.pid;
        let Some(next_ctx) = incoming.context.clone() else {
            drop(guard);
            self.fatal(format_args!("schedule(): process {} has no context", next_pid));
        };
        state.current = Some(next);

        if prev == Some(next) {
            return;
        }

        let prev_ctx = prev.and_then(|p| {
            let outgoing = &state.table[p];
            if outgoing.status == ProcStatus::Quit {
                None
            } else {
                outgoing.context.clone().map(|ctx| (outgoing.pid, ctx))
            }
        });
        drop(guard);

        log::debug!("schedule(): {:?} -> {}", prev_ctx.as_ref().map(|(pid, _)| *pid), next_pid);
        self.hooks.on_switch(prev_ctx.as_ref().map(|(pid, _)| *pid), next_pid);

        match prev_ctx {
            Some((_, ctx)) => self.machine.switch_context(&ctx, &next_ctx),
            None => self.machine.load_context(&next_ctx),
        }
    }

    /// 致命错误：记录日志、输出到控制台后停机
    pub fn fatal(&self, args: fmt::Arguments<'_>) -> ! {
        log::error!("{}", args);
        self.machine.console(args);
        self.machine.halt(1)
    }

    /// 确认处于内核态，否则停机
    pub(crate) fn check_kernel_mode(&self, caller: &str) {
        if !self.machine.psr_get().contains(Psr::CURRENT_MODE) {
            let pid = {
                let state = self.lock();
                state.current.map(|slot| state.table[slot].pid)
            };
            self.fatal(format_args!(
                "{}(): called while in user mode, by process {:?}. Halting...",
                caller, pid
            ));
        }
    }

    /// 当前进程槽位
    ///
    /// 只能在进程上下文中调用，首次调度前调用即停机
    pub(crate) fn current_slot(&self, state: &SchedState<M::Context>) -> usize {
        match state.current {
            Some(slot) => slot,
            None => self.fatal(format_args!("no current process")),
        }
    }

    /// 当前进程 PID
    pub fn get_pid(&self) -> Pid {
        let state = self.lock();
        let slot = self.current_slot(&state);
        state.table[slot].pid
    }

    /// 当前进程已使用的 CPU 时间（毫秒），包括正在运行的这一段
    pub fn read_time(&self) -> u64 {
        let now = self.machine.now_us();
        let state = self.lock();
        let proc = &state.table[self.current_slot(&state)];
        (proc.cpu_time_us + now.saturating_sub(proc.start_time_us)) / 1000
    }

    /// 当前进程本次被调度的时间（微秒）
    pub fn read_cur_start_time(&self) -> u64 {
        let state = self.lock();
        state.table[self.current_slot(&state)].start_time_us
    }

    /// 时间片检查
    ///
    /// 当前进程连续运行满 TIME_SLICE_US 后回到队尾，让同优先级的进程运行
    pub fn time_slice(&self) {
        let now = self.machine.now_us();
        {
            let _irq = InterruptGuard::new(&self.machine);
            let mut guard = self.lock();
            let state = &mut *guard;
            let Some(cur) = state.current else {
                return;
            };

            let proc = &mut state.table[cur];
            if proc.status != ProcStatus::Running
                || now.saturating_sub(proc.start_time_us) < TIME_SLICE_US
            {
                return;
            }
            log::debug!("time_slice(): pid {} used up its slice", proc.pid);
            proc.status = ProcStatus::Ready;
            state.rq.enqueue(state.table.procs_mut(), cur);
        }
        self.schedule();
    }

    /// 时钟中断处理函数
    pub fn clock_handler(&self) {
        self.time_slice();
    }
}
