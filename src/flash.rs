//! Flash memory wait states
//!
//! The flash interface needs extra wait cycles on reads once the system clock
//! is raised; [`crate::crm::CFGR::freeze`] programs them through [`Psr`]
//! before switching the clock.

use crate::pac::{flash, FLASH};

/// Extension trait that constrains the `FLASH` peripheral
pub trait FlashExt {
    /// Constrains the `FLASH` peripheral to play nicely with the other abstractions
    fn constrain(self) -> Parts;
}

impl FlashExt for FLASH {
    fn constrain(self) -> Parts {
        Parts { psr: Psr { _0: () } }
    }
}

/// Constrained FLASH peripheral
pub struct Parts {
    pub psr: Psr,
}

/// Opaque performance select register
pub struct Psr {
    _0: (),
}

impl Psr {
    pub(crate) fn psr(&mut self) -> &flash::RegisterBlock {
        unsafe { &*FLASH::ptr() }
    }

    /// Programs the wait cycles appropriate for `sysclk_hz`.
    pub(crate) fn set_wait_cycles(&mut self, sysclk_hz: u32) {
        let cycles = wait_cycles(sysclk_hz);
        self.psr()
            .psr
            .modify(|w| flash::psr::WTCYC.insert(w, cycles));
    }
}

/// Wait cycles required for a given system clock, in 32 MHz steps up to the
/// 180 MHz maximum.
pub const fn wait_cycles(sysclk_hz: u32) -> u32 {
    match sysclk_hz {
        0..=32_000_000 => 0,
        32_000_001..=64_000_000 => 1,
        64_000_001..=96_000_000 => 2,
        96_000_001..=128_000_000 => 3,
        128_000_001..=160_000_000 => 4,
        _ => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::wait_cycles;

    #[test]
    fn wait_cycles_step_at_32mhz_boundaries() {
        assert_eq!(wait_cycles(8_000_000), 0);
        assert_eq!(wait_cycles(32_000_000), 0);
        assert_eq!(wait_cycles(32_000_001), 1);
        assert_eq!(wait_cycles(64_000_000), 1);
        assert_eq!(wait_cycles(96_000_000), 2);
        assert_eq!(wait_cycles(128_000_000), 3);
        assert_eq!(wait_cycles(160_000_000), 4);
        assert_eq!(wait_cycles(180_000_000), 5);
    }
}
