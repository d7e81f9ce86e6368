//! psched 构建脚本
//!
//! 这个脚本在编译前运行，负责：
//! 1. 解析 Kernel.toml 配置文件
//! 2. 生成 src/config.rs 配置常量
//!
//! Kernel.toml 缺失或缺少某一项时使用默认值

use std::env;
use std::fs;
use std::path::PathBuf;

/// 读取 `[section] key` 整数项
fn get_int(config: &toml::Value, section: &str, key: &str, default: i64) -> i64 {
    config.get(section)
        .and_then(|s| s.get(key))
        .and_then(|v| v.as_integer())
        .unwrap_or(default)
}

/// 读取 `[section] key` 字符串项
fn get_str<'a>(config: &'a toml::Value, section: &str, key: &str, default: &'a str) -> &'a str {
    config.get(section)
        .and_then(|s| s.get(key))
        .and_then(|v| v.as_str())
        .unwrap_or(default)
}

fn main() {
    println!("cargo:rerun-if-changed=../Kernel.toml");
    println!("cargo:rerun-if-changed=build.rs");

    let config_content = fs::read_to_string("../Kernel.toml").unwrap_or_default();

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            println!("cargo:warning=Kernel.toml 解析失败，使用默认配置: {}", e);
            toml::Value::Table(toml::map::Map::new())
        }
    };

    generate_config_code(&config);
}

fn generate_config_code(config: &toml::Value) {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());

    let kernel_name = get_str(config, "general", "name", "psched");
    let kernel_version = get_str(config, "general", "version", "0.1.0");

    let max_proc = get_int(config, "process", "max_proc", 50);
    let max_name = get_int(config, "process", "max_name", 50);
    let max_arg = get_int(config, "process", "max_arg", 100);
    let min_stack = get_int(config, "process", "min_stack", 80 * 1024);

    let max_priority = get_int(config, "priority", "max_priority", 1);
    let min_priority = get_int(config, "priority", "min_priority", 5);

    let time_slice_us = get_int(config, "scheduler", "time_slice_us", 80_000);
    let clock_tick_us = get_int(config, "scheduler", "clock_tick_us", 20_000);

    let min_block_status = get_int(config, "block", "min_block_status", 10);
    let max_idle_waits = get_int(config, "sentinel", "max_idle_waits", 100);

    let log_level = get_str(config, "debug", "log_level", "warn");

    let config_header = format!(
        r#"//! psched 内核配置（自动生成）
//!
//! 此文件由 build.rs 根据 Kernel.toml 自动生成，请勿手动修改

// ============================================================
// 基本信息
// ============================================================

/// 内核名称
pub const KERNEL_NAME: &str = "{kernel_name}";

/// 内核版本
pub const KERNEL_VERSION: &str = "{kernel_version}";

// ============================================================
// 进程表配置
// ============================================================

/// 进程表槽位数
pub const MAX_PROC: usize = {max_proc};

/// 进程名缓冲区长度
pub const MAX_NAME: usize = {max_name};

/// 启动参数缓冲区长度
pub const MAX_ARG: usize = {max_arg};

/// 最小栈大小（字节）
pub const MIN_STACK: usize = {min_stack};

// ============================================================
// 优先级配置
// ============================================================

/// 最高优先级（数值最小）
pub const MAX_PRIORITY: i32 = {max_priority};

/// 最低用户优先级
pub const MIN_PRIORITY: i32 = {min_priority};

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
pub const TIME_SLICE_US: u64 = {time_slice_us};

/// 时钟中断间隔（微秒）
pub const CLOCK_TICK_US: u64 = {clock_tick_us};

// ============================================================
// 阻塞与哨兵配置
// ============================================================

/// blockMe 状态码下界（不含），之下的值保留给内核状态
pub const MIN_BLOCK_STATUS: i32 = {min_block_status};

/// 哨兵连续空等中断次数上限
pub const MAX_IDLE_WAITS: u32 = {max_idle_waits};

// ============================================================
// 调试配置
// ============================================================

/// 日志级别
pub const LOG_LEVEL: &str = "{log_level}";
"#
    );

    let config_file = manifest_dir.join("src").join("config.rs");

    // 只有内容变化时才写入，避免每次编译都更新文件时间戳
    let existing_content = fs::read_to_string(&config_file).unwrap_or_default();
    if existing_content != config_header {
        fs::write(&config_file, &config_header)
            .expect("写入配置文件失败");
    }
}
