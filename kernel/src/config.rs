//! psched 内核配置（自动生成）
//!
//! 此文件由 build.rs 根据 Kernel.toml 自动生成，请勿手动修改

// ============================================================
// 基本信息
// ============================================================

/// 内核名称
pub const KERNEL_NAME: &str = "psched";

/// 内核版本
pub const KERNEL_VERSION: &str = "0.1.0";

// ============================================================
// 进程表配置
// ============================================================

/// 进程表槽位数
pub const MAX_PROC: usize = 50;

/// 进程名缓冲区长度
pub const MAX_NAME: usize = 50;

/// 启动参数缓冲区长度
pub const MAX_ARG: usize = 100;

/// 最小栈大小（字节）
pub const MIN_STACK: usize = 81920;

// ============================================================
// 优先级配置
// ============================================================

/// 最高优先级（数值最小）
pub const MAX_PRIORITY: i32 = 1;

/// 最低用户优先级
pub const MIN_PRIORITY: i32 = 5;

/// 哨兵进程优先级，低于所有用户进程
pub const SENTINEL_PRIORITY: i32 = MIN_PRIORITY + 1;

/// 哨兵进程 PID
pub const SENTINEL_PID: u32 = 1;

/// start1 进程优先级
pub const START1_PRIORITY: i32 = MAX_PRIORITY;

/// start1 进程栈大小
pub const START1_STACK: usize = 2 * MIN_STACK;

// ============================================================
// 调度器配置
// ============================================================

/// 时间片（微秒）
pub const TIME_SLICE_US: u64 = 80000;

/// 时钟中断间隔（微秒）
pub const CLOCK_TICK_US: u64 = 20000;

// ============================================================
// 阻塞与哨兵配置
// ============================================================

/// blockMe 状态码下界（不含），之下的值保留给内核状态
pub const MIN_BLOCK_STATUS: i32 = 10;

/// 哨兵连续空等中断次数上限
pub const MAX_IDLE_WAITS: u32 = 100;

// ============================================================
// 调试配置
// ============================================================

/// 日志级别
pub const LOG_LEVEL: &str = "warn";
