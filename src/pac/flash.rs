//! Flash memory interface registers.
//!
//! Base address `0x4002_2000`. Only the performance select register is
//! programmed by this HAL, to set the wait cycles before raising the system
//! clock.

use super::{Field, RWRegister};

#[repr(C)]
pub struct RegisterBlock {
    /// Performance select register, offset 0x00.
    pub psr: RWRegister<u32>,
}

impl RegisterBlock {
    /// A block in ordinary memory with the register at its reset value,
    /// for unit tests.
    pub const fn new() -> Self {
        Self {
            psr: RWRegister::new(0),
        }
    }
}

/// Fields of `psr`.
pub mod psr {
    use super::Field;

    /// Wait cycles inserted on flash reads.
    pub const WTCYC: Field = Field::new(0, 3);
}
