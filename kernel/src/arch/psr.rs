//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 处理器状态字 (Processor Status Register)
//!
//! 低 4 位的布局与 USLOSS 的 psrBits 一致：
//! - bit 0: 当前模式（1 = 内核态）
//! - bit 1: 当前中断使能
//! - bit 2: 前一模式
//! - bit 3: 前一中断使能

use bitflags::bitflags;

bitflags! {
    /// PSR 标志位
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Psr: u32 {
        const CURRENT_MODE = 0x1;
        const CURRENT_INT  = 0x2;
        const PREV_MODE    = 0x4;
        const PREV_INT     = 0x8;
    }
}

impl Psr {
    /// 是否处于内核态
    #[inline]
    pub fn in_kernel_mode(self) -> bool {
        self.contains(Psr::CURRENT_MODE)
    }

    /// 中断是否使能
    #[inline]
    pub fn interrupts_enabled(self) -> bool {
        self.contains(Psr::CURRENT_INT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_psr_bits() {
        let psr = Psr::CURRENT_MODE | Psr::CURRENT_INT;
        assert!(psr.in_kernel_mode());
        assert!(psr.interrupts_enabled());
        assert_eq!(psr.bits(), 0x3);

        let user = psr - Psr::CURRENT_MODE;
        assert!(!user.in_kernel_mode());
        assert!(user.interrupts_enabled());
    }

    #[test]
    fn test_psr_truncate() {
        let psr = Psr::from_bits_truncate(0xff);
        assert_eq!(psr, Psr::all());
    }
}
