//! Power control (PWC) registers.
//!
//! Base address `0x4000_7000`. Only the LDO output-voltage word is
//! described; the HAL touches it when raising the core clock beyond the
//! range the default regulator output is rated for.

use super::{Field, RWRegister};

#[repr(C)]
pub struct RegisterBlock {
    /// Power control register, offset 0x00.
    pub ctrl: RWRegister<u32>,
    /// Power control/status register, offset 0x04.
    pub ctrlsts: RWRegister<u32>,
    _reserved0: [u32; 2],
    /// LDO output voltage register, offset 0x10.
    pub ldoov: RWRegister<u32>,
}

impl RegisterBlock {
    /// A block in ordinary memory with every register at its reset value,
    /// for unit tests.
    pub const fn new() -> Self {
        Self {
            ctrl: RWRegister::new(0),
            ctrlsts: RWRegister::new(0),
            _reserved0: [0; 2],
            ldoov: RWRegister::new(0),
        }
    }
}

/// Fields of `ldoov`.
pub mod ldoov {
    use super::Field;

    /// LDO output voltage select.
    pub const LDOOVSEL: Field = Field::new(0, 3);

    /// Encoding for the 1.3 V output, required for the top clock range.
    pub const SEL_1V3: u32 = 0b111;
}
