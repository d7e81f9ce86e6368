//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 进程创建 (fork) 实现
//!
//! 流程:
//! 1. 检查栈大小、优先级和进程名
//! 2. 分配 PID 和进程表槽位，再检查名字和参数长度
//! 3. 分配栈，初始化从 launch 开始执行的上下文
//! 4. 挂到父进程的 children 链表，加入就绪队列
//! 5. 除哨兵外立即调度，新进程优先级更高时马上运行

use alloc::boxed::Box;
use alloc::string::ToString;
use alloc::vec;

use super::list::ListKind;
use super::task::ProcStatus;
use super::Pid;
use crate::arch::{InterruptGuard, Machine, Psr};
use crate::config::{MAX_ARG, MAX_NAME, MAX_PRIORITY, MIN_PRIORITY, MIN_STACK};
use crate::errno::Errno;
use crate::sched::Kernel;

impl<M: Machine> Kernel<M> {
    /// 创建子进程
    ///
    /// # 参数
    /// - `name`: 进程名，不能为空
    /// - `func`: 进程入口，返回值作为退出状态
    /// - `arg`: 传给 `func` 的启动参数
    /// - `stack_size`: 栈大小，不小于 MIN_STACK
    /// - `priority`: MAX_PRIORITY..=MIN_PRIORITY
    ///
    /// # 返回
    /// - Ok(pid): 子进程 PID
    /// - Err(InvalidArgument): 空进程名或优先级越界
    /// - Err(StackTooSmall): 栈过小
    /// - Err(TableFull): 进程表已满
    ///
    /// 名字或参数超长是致命错误
    pub fn fork<F>(
        &self,
        name: &str,
        func: F,
        arg: &str,
        stack_size: usize,
        priority: i32,
    ) -> Result<Pid, Errno>
    where
        F: FnOnce(&Kernel<M>, &str) -> i32 + Send + 'static,
    {
        self.check_kernel_mode("fork");

        if stack_size < MIN_STACK {
            log::debug!("fork(): stack size {} below minimum {}", stack_size, MIN_STACK);
            return Err(Errno::StackTooSmall);
        }
        if !(MAX_PRIORITY..=MIN_PRIORITY).contains(&priority) {
            log::debug!("fork(): priority {} out of range", priority);
            return Err(Errno::InvalidArgument);
        }

        let pid = self.fork_inner(name, func, arg, stack_size, priority)?;
        self.schedule();
        Ok(pid)
    }

    /// 创建进程但不调度
    ///
    /// 哨兵和 start1 由 startup 直接调用，不受用户优先级范围限制
    pub(crate) fn fork_inner<F>(
        &self,
        name: &str,
        func: F,
        arg: &str,
        stack_size: usize,
        priority: i32,
    ) -> Result<Pid, Errno>
    where
        F: FnOnce(&Kernel<M>, &str) -> i32 + Send + 'static,
    {
        if stack_size < MIN_STACK {
            log::debug!("fork(): stack size {} below minimum {}", stack_size, MIN_STACK);
            return Err(Errno::StackTooSmall);
        }
        if name.is_empty() {
            log::debug!("fork(): empty process name");
            return Err(Errno::InvalidArgument);
        }

        // 进程入口持有内核的强引用，直到进程退出
        let Some(kernel) = self.weak().upgrade() else {
            self.fatal(format_args!("fork(): kernel is being torn down"));
        };

        let pid = {
            let _irq = InterruptGuard::new(self.machine());
            let mut guard = self.lock();
            let state = &mut *guard;

            // 名字和参数长度在分配槽位之后检查
            let (pid, slot) = state.table.alloc_slot()?;
            if name.len() >= MAX_NAME - 1 {
                drop(guard);
                self.fatal(format_args!("fork(): process name is too long. Halting..."));
            }
            if arg.len() >= MAX_ARG - 1 {
                drop(guard);
                self.fatal(format_args!("fork(): argument too long. Halting..."));
            }

            let mut stack = vec![0u8; stack_size];
            let context = self.machine().init_context(&mut stack, Box::new(move || {
                kernel.launch(func);
            }));

            let parent = state.current;
            let parent_pid = parent.map(|p| state.table[p].pid);

            let proc = &mut state.table[slot];
            proc.pid = pid;
            proc.name = name.to_string();
            proc.start_arg = arg.to_string();
            proc.stack = stack;
            proc.context = Some(context);
            proc.priority = priority;
            proc.status = ProcStatus::Ready;
            proc.exit_status = 0;
            proc.zapped = false;
            proc.parent = parent;
            proc.parent_pid = parent_pid;
            proc.cpu_time_us = 0;
            proc.start_time_us = 0;

            if let Some(p) = parent {
                state.table.add_to_list(p, ListKind::Children, slot);
            }
            state.rq.enqueue(state.table.procs_mut(), slot);
            pid
        };

        log::debug!("fork(): created '{}' pid {} priority {}", name, pid, priority);
        self.hooks().on_fork(pid);
        Ok(pid)
    }

    /// 所有进程上下文的入口
    ///
    /// 打开中断，执行进程入口，返回值交给 quit
    pub(crate) fn launch<F>(&self, func: F) -> !
    where
        F: FnOnce(&Kernel<M>, &str) -> i32,
    {
        let arg = {
            let state = self.lock();
            let slot = self.current_slot(&state);
            state.table[slot].start_arg.clone()
        };

        log::debug!("launch(): starting process {}", self.get_pid());
        let psr = self.machine().psr_get();
        self.machine().psr_set(psr | Psr::CURRENT_INT);

        let status = func(self, &arg);
        self.quit(status)
    }
}
