//! 调度器测试
//!
//! 优先级顺序、同优先级轮转、时间记账、生命周期钩子

use alloc::sync::Weak;
use alloc::vec::Vec;
use spin::Mutex;

use super::{run, run_with_hooks, Trace, K};
use crate::arch::host::HostMachine;
use crate::arch::Machine;
use crate::config::{MIN_STACK, SENTINEL_PID, TIME_SLICE_US};
use crate::hooks::ProcHooks;
use crate::process::Pid;
use crate::sched::Kernel;

#[test]
fn test_priority_order() {
    let trace = Trace::new();
    let t = trace.clone();
    let (status, _) = run(move |k, _| {
        for (name, priority) in [("A", 4), ("B", 2), ("C", 4)] {
            let tc = t.clone();
            k.fork(name, move |_, _| {
                tc.push(name);
                0
            }, "", MIN_STACK, priority).unwrap();
        }

        let mut code = 0;
        for _ in 0..3 {
            k.join(&mut code).unwrap();
        }
        0
    });

    assert_eq!(status, 0);
    assert_eq!(trace.events(), vec!["B", "A", "C"]);
}

#[test]
fn test_round_robin_same_priority() {
    let trace = Trace::new();
    let t = trace.clone();
    let (status, _) = run(move |k, _| {
        for name in ["A", "B"] {
            let tc = t.clone();
            k.fork(name, move |k, _| {
                for _ in 0..3 {
                    tc.push(name);
                    k.machine().advance_clock(TIME_SLICE_US);
                    k.time_slice();
                }
                0
            }, "", MIN_STACK, 3).unwrap();
        }

        let mut code = 0;
        k.join(&mut code).unwrap();
        k.join(&mut code).unwrap();
        0
    });

    assert_eq!(status, 0);
    assert_eq!(trace.events(), vec!["A", "B", "A", "B", "A", "B"]);
}

#[test]
fn test_time_slice_not_expired_keeps_running() {
    let trace = Trace::new();
    let t = trace.clone();
    let (status, _) = run(move |k, _| {
        for name in ["A", "B"] {
            let tc = t.clone();
            k.fork(name, move |k, _| {
                tc.push(alloc::format!("{}1", name));
                k.machine().advance_clock(TIME_SLICE_US / 2);
                k.time_slice();
                tc.push(alloc::format!("{}2", name));
                0
            }, "", MIN_STACK, 3).unwrap();
        }

        let mut code = 0;
        k.join(&mut code).unwrap();
        k.join(&mut code).unwrap();
        0
    });

    assert_eq!(status, 0);
    assert_eq!(trace.events(), vec!["A1", "A2", "B1", "B2"]);
}

#[test]
fn test_get_pid_and_times() {
    let (status, _) = run(|k, _| {
        assert_eq!(k.get_pid(), SENTINEL_PID + 1);
        assert!(!k.is_zapped());

        let start = k.read_cur_start_time();
        k.machine().advance_clock(5_000);
        assert_eq!(k.read_time(), 5);
        assert_eq!(k.read_cur_start_time(), start);

        let child = k.fork("timed", |k, _| {
            k.machine().advance_clock(3_000);
            k.read_time() as i32
        }, "", MIN_STACK, 3).unwrap();
        let mut code = 0;
        assert_eq!(k.join(&mut code), Ok(child));
        assert_eq!(code, 3);

        // 被 join 阻塞期间不计入 CPU 时间
        assert_eq!(k.read_time(), 5);
        0
    });
    assert_eq!(status, 0);
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    Fork(Pid),
    Switch(Option<Pid>, Pid),
    Quit(Pid),
}

struct Recorder(alloc::sync::Arc<Mutex<Vec<Event>>>);

impl ProcHooks for Recorder {
    fn on_fork(&self, pid: Pid) {
        self.0.lock().push(Event::Fork(pid));
    }

    fn on_switch(&self, old: Option<Pid>, new: Pid) {
        self.0.lock().push(Event::Switch(old, new));
    }

    fn on_quit(&self, pid: Pid) {
        self.0.lock().push(Event::Quit(pid));
    }
}

#[test]
fn test_hooks_order() {
    let events = alloc::sync::Arc::new(Mutex::new(Vec::new()));
    let (status, _) = run_with_hooks(Recorder(events.clone()), |k, _| {
        let child = k.fork("child", |_, _| 0, "", MIN_STACK, 3).unwrap();
        let mut code = 0;
        k.join(&mut code).unwrap();
        assert_eq!(child, 3);
        0
    });

    assert_eq!(status, 0);
    assert_eq!(
        *events.lock(),
        vec![
            Event::Fork(1),
            Event::Fork(2),
            Event::Switch(None, 2),
            Event::Fork(3),
            Event::Switch(Some(2), 3),
            Event::Quit(3),
            Event::Switch(None, 2),
            Event::Quit(2),
            Event::Switch(None, 1),
        ]
    );
}

#[test]
fn test_clock_interrupt_rotates_processes() {
    let trace = Trace::new();
    let t = trace.clone();
    let (status, _) = run(move |k, _| {
        for name in ["A", "B"] {
            let tc = t.clone();
            k.fork(name, move |k, _| {
                for _ in 0..2 {
                    tc.push(name);
                    // 每次 tick 推进一个时钟周期，满一个时间片后由时钟中断轮转
                    let machine: &HostMachine = k.machine();
                    let before = k.read_cur_start_time();
                    while k.read_cur_start_time() == before {
                        machine.tick();
                    }
                }
                0
            }, "", MIN_STACK, 3).unwrap();
        }

        let mut code = 0;
        k.join(&mut code).unwrap();
        k.join(&mut code).unwrap();
        0
    });

    assert_eq!(status, 0);
    assert_eq!(trace.events(), vec!["A", "B", "A", "B"]);
}

#[test]
fn test_processes_keep_kernel_alive() {
    crate::logk::init();
    let machine = HostMachine::new();
    let handle: alloc::sync::Arc<Mutex<Option<Weak<K>>>> = Default::default();

    let boot_machine = machine.clone();
    let slot = handle.clone();
    let status = machine.boot(move || {
        // 唯一的强引用在启动线程上，首次调度后该线程即被切走
        let kernel = Kernel::new(boot_machine);
        *slot.lock() = Some(alloc::sync::Arc::downgrade(&kernel));
        kernel.startup(|k, _| {
            let child = k.fork("child", |_, _| 4, "", MIN_STACK, 5).unwrap();
            k.fork("never", |_, _| 0, "", MIN_STACK, 5).unwrap();
            let mut code = 0;
            assert_eq!(k.join(&mut code), Ok(child));
            assert_eq!(code, 4);
            k.machine().halt(0)
        });
    });

    assert_eq!(status, 0);
    assert!(machine.console_output().is_empty());

    // 停机后包括从未运行的进程入口在内，所有引用都已释放
    let weak = handle.lock().take();
    assert!(weak.is_some_and(|w| w.upgrade().is_none()));
}
