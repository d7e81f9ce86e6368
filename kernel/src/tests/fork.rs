//! fork() 测试
//!
//! 进程创建、参数检查、PID 分配

use alloc::collections::BTreeSet;
use alloc::vec::Vec;

use super::{run, Trace};
use crate::config::{MAX_PRIORITY, MIN_PRIORITY, MIN_STACK, SENTINEL_PID, SENTINEL_PRIORITY};
use crate::errno::Errno;

#[test]
fn test_fork_and_join_exit_status() {
    let result = Trace::new();
    let r = result.clone();
    let (status, machine) = run(move |k, _| {
        let child = k.fork("worker", |_, _| 42, "", MIN_STACK, 3).unwrap();
        let mut code = 0;
        let joined = k.join(&mut code);
        r.push(alloc::format!("{:?} {}", joined.map(|pid| pid == child), code));
        assert_eq!(child, SENTINEL_PID + 2);
        0
    });

    assert_eq!(status, 0);
    assert_eq!(result.events(), vec!["Ok(true) 42"]);
    assert!(super::console_has(&machine, "All processes completed."));
}

#[test]
fn test_fork_passes_argument() {
    let trace = Trace::new();
    let t = trace.clone();
    let (status, _) = run(move |k, _| {
        let t2 = t.clone();
        k.fork("echo", move |_, arg| {
            t2.push(arg);
            arg.len() as i32
        }, "hello", MIN_STACK, 2).unwrap();
        let mut code = 0;
        k.join(&mut code).unwrap();
        assert_eq!(code, 5);
        0
    });

    assert_eq!(status, 0);
    assert_eq!(trace.events(), vec!["hello"]);
}

#[test]
fn test_fork_invalid_arguments() {
    let (status, _) = run(|k, _| {
        assert_eq!(k.fork("", |_, _| 0, "", MIN_STACK, 3), Err(Errno::InvalidArgument));
        assert_eq!(k.fork("p", |_, _| 0, "", MIN_STACK, MAX_PRIORITY - 1), Err(Errno::InvalidArgument));
        assert_eq!(k.fork("p", |_, _| 0, "", MIN_STACK, MIN_PRIORITY + 1), Err(Errno::InvalidArgument));
        assert_eq!(k.fork("p", |_, _| 0, "", MIN_STACK, SENTINEL_PRIORITY), Err(Errno::InvalidArgument));
        assert_eq!(k.fork("p", |_, _| 0, "", MIN_STACK - 1, 3), Err(Errno::StackTooSmall));
        // 栈大小先于优先级检查
        assert_eq!(k.fork("p", |_, _| 0, "", MIN_STACK - 1, MIN_PRIORITY + 1), Err(Errno::StackTooSmall));

        // 失败的 fork 不留下子进程
        let mut code = 0;
        assert_eq!(k.join(&mut code), Err(Errno::NoChildren));
        0
    });
    assert_eq!(status, 0);
}

#[test]
fn test_pids_unique_and_increasing() {
    let pids = Trace::new();
    let p = pids.clone();
    let (status, _) = run(move |k, _| {
        let mut last = k.get_pid();
        for _ in 0..60 {
            let child = k.fork("child", |_, _| 0, "", MIN_STACK, 3).unwrap();
            assert!(child > last);
            last = child;

            let mut code = -1;
            assert_eq!(k.join(&mut code), Ok(child));
            assert_eq!(code, 0);
            p.push(alloc::format!("{}", child));
        }
        0
    });

    assert_eq!(status, 0);
    let events = pids.events();
    assert_eq!(events.len(), 60);
    let unique: BTreeSet<_> = events.iter().collect();
    assert_eq!(unique.len(), 60);
}

#[test]
fn test_fork_higher_priority_runs_first() {
    let trace = Trace::new();
    let t = trace.clone();
    let (status, _) = run(move |k, _| {
        let t1 = t.clone();
        k.fork("middle", move |k, _| {
            let t2 = t1.clone();
            k.fork("high", move |_, _| {
                t2.push("high");
                0
            }, "", MIN_STACK, 2).unwrap();
            t1.push("middle after fork");
            let mut code = 0;
            k.join(&mut code).unwrap();
            0
        }, "", MIN_STACK, 4).unwrap();

        let mut code = 0;
        k.join(&mut code).unwrap();
        0
    });

    assert_eq!(status, 0);
    assert_eq!(trace.events(), vec!["high", "middle after fork"]);
}

#[test]
fn test_fork_table_full() {
    let (status, _) = run(|k, _| {
        // 哨兵和 start1 已占用两个槽位
        let mut children = Vec::new();
        for _ in 0..crate::config::MAX_PROC - 2 {
            children.push(k.fork("filler", |_, _| 1, "", MIN_STACK, MIN_PRIORITY).unwrap());
        }
        assert_eq!(k.fork("extra", |_, _| 1, "", MIN_STACK, MIN_PRIORITY), Err(Errno::TableFull));

        // 按退出顺序回收
        for expected in children {
            let mut code = 0;
            assert_eq!(k.join(&mut code), Ok(expected));
            assert_eq!(code, 1);
        }

        // 回收后槽位可复用
        let again = k.fork("again", |_, _| 2, "", MIN_STACK, 3);
        assert!(again.is_ok());
        let mut code = 0;
        assert_eq!(k.join(&mut code), again);
        0
    });
    assert_eq!(status, 0);
}
