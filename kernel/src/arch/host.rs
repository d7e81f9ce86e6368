//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 宿主机模拟后端
//!
//! 每个进程上下文对应一个操作系统线程，线程之间通过"接力棒"
//! (Mutex<bool> + Condvar) 交接执行权，任意时刻只有一个线程在执行
//! 内核或进程代码，从而在宿主机上复现单处理器协作式调度。
//!
//! - `switch_context`: 交出接力棒，阻塞直到被切换回来
//! - `load_context` / `halt`: 交出接力棒后以私有载荷 unwind 结束当前线程
//!   （`resume_unwind` 不触发 panic hook）
//! - 时钟为虚拟微秒时钟，`wait_int` 推进一个时钟周期并投递时钟中断

use std::any::Any;
use std::boxed::Box;
use std::cell::Cell;
use std::format;
use std::panic::{self, AssertUnwindSafe};
use std::string::String;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, Weak};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use std::vec::Vec;

use super::{ClockHandler, Entry, Machine, Psr};
use crate::config::CLOCK_TICK_US;

/// 宿主线程的最小栈，低于此值时按此值创建线程
const HOST_MIN_THREAD_STACK: usize = 512 * 1024;

/// 等待接力棒 / 停机时的轮询间隔
const WAIT_POLL: Duration = Duration::from_millis(10);

/// 系统必须在此时间内停机
const BOOT_TIMEOUT: Duration = Duration::from_secs(60);

/// 进程线程内发生真正 panic 时的停机状态
pub const PANIC_STATUS: i32 = 101;

/// 系统未按时停机时的停机状态
pub const WATCHDOG_STATUS: i32 = 102;

/// 线程让出执行权时使用的 unwind 载荷
struct Detach;

thread_local! {
    /// 当前线程已交出执行权，unwind 期间对 PSR 的写入被忽略
    static DETACHING: Cell<bool> = const { Cell::new(false) };
}

/// 加锁，忽略中毒
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct ContextInner {
    id: usize,
    stack_size: usize,
    /// 首次装载时执行的入口，执行后为 None
    entry: Mutex<Option<Entry>>,
    /// 接力棒
    turn: Mutex<bool>,
    cv: Condvar,
    /// 切出时保存的 PSR
    psr: AtomicU32,
}

/// 宿主机上的执行上下文句柄
#[derive(Clone)]
pub struct HostContext {
    inner: Arc<ContextInner>,
}

impl HostContext {
    /// 上下文编号（按创建顺序）
    pub fn id(&self) -> usize {
        self.inner.id
    }
}

struct Shared {
    psr: AtomicU32,
    clock_us: AtomicU64,
    next_id: AtomicUsize,
    halted: AtomicBool,
    halt_status: Mutex<Option<i32>>,
    halt_cv: Condvar,
    contexts: Mutex<Vec<Weak<ContextInner>>>,
    threads: Mutex<Vec<JoinHandle<()>>>,
    clock_handler: Mutex<Option<Arc<dyn Fn() + Send + Sync>>>,
    console: Mutex<Vec<String>>,
    panic: Mutex<Option<Box<dyn Any + Send>>>,
}

/// 宿主机模拟机器
#[derive(Clone)]
pub struct HostMachine {
    shared: Arc<Shared>,
}

impl Default for HostMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl HostMachine {
    /// 创建机器：内核态、中断关闭、时钟为 0
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                psr: AtomicU32::new(Psr::CURRENT_MODE.bits()),
                clock_us: AtomicU64::new(0),
                next_id: AtomicUsize::new(0),
                halted: AtomicBool::new(false),
                halt_status: Mutex::new(None),
                halt_cv: Condvar::new(),
                contexts: Mutex::new(Vec::new()),
                threads: Mutex::new(Vec::new()),
                clock_handler: Mutex::new(None),
                console: Mutex::new(Vec::new()),
                panic: Mutex::new(None),
            }),
        }
    }

    /// 在当前线程上运行 `f`（通常是 `Kernel::startup`），直到系统停机
    ///
    /// 返回停机状态。进程线程中发生的 panic 会在这里重新抛出。
    pub fn boot<F: FnOnce()>(&self, f: F) -> i32 {
        let result = panic::catch_unwind(AssertUnwindSafe(f));
        DETACHING.with(|d| d.set(false));
        if let Err(payload) = result {
            if !payload.is::<Detach>() {
                panic::resume_unwind(payload);
            }
        }

        let status = self.wait_halt();

        // 停机后所有进程线程都会从接力棒等待中退出
        loop {
            let handles: Vec<JoinHandle<()>> = lock(&self.shared.threads).drain(..).collect();
            if handles.is_empty() {
                break;
            }
            for handle in handles {
                let _ = handle.join();
            }
        }

        if let Some(payload) = lock(&self.shared.panic).take() {
            panic::resume_unwind(payload);
        }

        status
    }

    /// 推进虚拟时钟
    pub fn advance_clock(&self, us: u64) {
        self.shared.clock_us.fetch_add(us, Ordering::SeqCst);
    }

    /// 推进一个时钟周期，中断使能时投递时钟中断
    pub fn tick(&self) {
        self.advance_clock(CLOCK_TICK_US);

        if !self.psr_get().interrupts_enabled() {
            return;
        }

        // 调用处理函数时不能持有锁：处理函数可能切换上下文
        let handler = lock(&self.shared.clock_handler).clone();
        if let Some(handler) = handler {
            handler();
        }
    }

    /// 控制台输出记录
    pub fn console_output(&self) -> Vec<String> {
        lock(&self.shared.console).clone()
    }

    /// 停机状态，尚未停机时为 None
    pub fn halt_status(&self) -> Option<i32> {
        *lock(&self.shared.halt_status)
    }

    fn is_halted(&self) -> bool {
        self.shared.halted.load(Ordering::SeqCst)
    }

    fn detach(&self) -> ! {
        DETACHING.with(|d| d.set(true));
        panic::resume_unwind(Box::new(Detach))
    }

    fn set_halted(&self, status: i32) {
        {
            let mut halt_status = lock(&self.shared.halt_status);
            if halt_status.is_none() {
                *halt_status = Some(status);
            }
        }
        self.shared.halted.store(true, Ordering::SeqCst);
        self.shared.halt_cv.notify_all();

        let contexts: Vec<Arc<ContextInner>> = lock(&self.shared.contexts)
            .iter()
            .filter_map(Weak::upgrade)
            .collect();
        for ctx in contexts {
            // 从未运行过的入口持有内核引用，停机时丢弃
            let entry = lock(&ctx.entry).take();
            drop(entry);

            let _turn = lock(&ctx.turn);
            ctx.cv.notify_all();
        }
    }

    fn wait_halt(&self) -> i32 {
        let deadline = Instant::now() + BOOT_TIMEOUT;
        let mut status = lock(&self.shared.halt_status);
        loop {
            if let Some(status) = *status {
                return status;
            }
            if Instant::now() >= deadline {
                drop(status);
                log::error!("host: system did not halt within {:?}", BOOT_TIMEOUT);
                self.set_halted(WATCHDOG_STATUS);
                return self.halt_status().unwrap_or(WATCHDOG_STATUS);
            }
            status = match self.shared.halt_cv.wait_timeout(status, WAIT_POLL) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
    }

    /// 把执行权交给 `ctx`
    fn resume(&self, ctx: &Arc<ContextInner>) {
        if self.is_halted() {
            self.detach();
        }

        self.shared.psr.store(ctx.psr.load(Ordering::SeqCst), Ordering::SeqCst);

        let entry = lock(&ctx.entry).take();
        match entry {
            Some(entry) => self.spawn(ctx, entry),
            None => {
                let mut turn = lock(&ctx.turn);
                *turn = true;
                ctx.cv.notify_one();
            }
        }
    }

    fn spawn(&self, ctx: &Arc<ContextInner>, entry: Entry) {
        let machine = self.clone();
        let builder = thread::Builder::new()
            .name(format!("proc-ctx-{}", ctx.id))
            .stack_size(ctx.stack_size.max(HOST_MIN_THREAD_STACK));

        match builder.spawn(move || machine.run_entry(entry)) {
            Ok(handle) => lock(&self.shared.threads).push(handle),
            Err(e) => {
                log::error!("host: failed to spawn context {}: {}", ctx.id, e);
                self.halt(1);
            }
        }
    }

    fn run_entry(&self, entry: Entry) {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(entry)) {
            if !payload.is::<Detach>() {
                {
                    let mut slot = lock(&self.shared.panic);
                    if slot.is_none() {
                        *slot = Some(payload);
                    }
                }
                self.set_halted(PANIC_STATUS);
            }
        }
    }

    /// 阻塞直到拿到 `ctx` 的接力棒
    fn wait_turn(&self, ctx: &ContextInner) {
        let mut turn = lock(&ctx.turn);
        loop {
            if self.is_halted() {
                drop(turn);
                self.detach();
            }
            if *turn {
                *turn = false;
                return;
            }
            turn = match ctx.cv.wait_timeout(turn, WAIT_POLL) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
    }
}

impl Machine for HostMachine {
    type Context = HostContext;

    fn init_context(&self, stack: &mut [u8], entry: Entry) -> HostContext {
        let inner = Arc::new(ContextInner {
            id: self.shared.next_id.fetch_add(1, Ordering::SeqCst),
            stack_size: stack.len(),
            entry: Mutex::new(Some(entry)),
            turn: Mutex::new(false),
            cv: Condvar::new(),
            // 新上下文从内核态、中断关闭开始，由 launch 打开中断
            psr: AtomicU32::new(Psr::CURRENT_MODE.bits()),
        });

        let mut contexts = lock(&self.shared.contexts);
        contexts.retain(|ctx| ctx.strong_count() > 0);
        contexts.push(Arc::downgrade(&inner));

        HostContext { inner }
    }

    fn switch_context(&self, old: &HostContext, new: &HostContext) {
        old.inner.psr.store(self.shared.psr.load(Ordering::SeqCst), Ordering::SeqCst);
        self.resume(&new.inner);
        self.wait_turn(&old.inner);
    }

    fn load_context(&self, new: &HostContext) -> ! {
        // 新上下文开始执行后，本线程 unwind 时不能再改动 PSR
        DETACHING.with(|d| d.set(true));
        self.resume(&new.inner);
        self.detach()
    }

    fn psr_get(&self) -> Psr {
        Psr::from_bits_truncate(self.shared.psr.load(Ordering::SeqCst))
    }

    fn psr_set(&self, psr: Psr) {
        if DETACHING.with(Cell::get) {
            return;
        }
        self.shared.psr.store(psr.bits(), Ordering::SeqCst);
    }

    fn install_clock_handler(&self, handler: ClockHandler) {
        *lock(&self.shared.clock_handler) = Some(Arc::from(handler));
    }

    fn wait_int(&self) {
        if self.is_halted() {
            self.detach();
        }
        self.tick();
    }

    fn now_us(&self) -> u64 {
        self.shared.clock_us.load(Ordering::SeqCst)
    }

    fn console(&self, args: core::fmt::Arguments<'_>) {
        let line = format!("{}", args);
        std::println!("{}", line);
        lock(&self.shared.console).push(line);
    }

    fn halt(&self, status: i32) -> ! {
        DETACHING.with(|d| d.set(true));
        self.set_halted(status);
        self.detach()
    }
}
