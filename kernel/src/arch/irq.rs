//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 中断屏蔽
//!
//! 对应 Linux 的 local_irq_save()/local_irq_restore()

use super::{Machine, Psr};

/// 中断保护 RAII 守卫
///
/// 在作用域内禁用中断，离开时恢复进入前的中断使能位
pub struct InterruptGuard<'a, M: Machine> {
    machine: &'a M,
    flags: Psr,
}

impl<'a, M: Machine> InterruptGuard<'a, M> {
    /// 禁用中断并创建守卫
    ///
    /// 保存 PSR，清除 CURRENT_INT 位
    #[inline]
    pub fn new(machine: &'a M) -> Self {
        let flags = machine.psr_get();
        machine.psr_set(flags - Psr::CURRENT_INT);
        InterruptGuard { machine, flags }
    }
}

impl<M: Machine> Drop for InterruptGuard<'_, M> {
    /// 恢复中断状态
    ///
    /// 只恢复中断位，守卫期间发生的模式变化保持不变
    #[inline]
    fn drop(&mut self) {
        let psr = self.machine.psr_get();
        if self.flags.interrupts_enabled() {
            self.machine.psr_set(psr | Psr::CURRENT_INT);
        } else {
            self.machine.psr_set(psr - Psr::CURRENT_INT);
        }
    }
}
