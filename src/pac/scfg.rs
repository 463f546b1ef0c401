//! System configuration controller (SCFG) registers.
//!
//! Base address `0x4001_0000`. The layout is bit-exact: `cfg1` carries the
//! memory-map selection, the infrared source/polarity pair and all DMA
//! request remap bits; `cfg2` the CAN timestamp source; the four `exintc`
//! words route the 16 external interrupt lines (one 4-bit nibble per line);
//! `iocfg` latches the NRST pin remap status.

use super::{Field, RORegister, RWRegister};

#[repr(C)]
pub struct RegisterBlock {
    /// Configuration register 1, offset 0x00.
    pub cfg1: RWRegister<u32>,
    /// Configuration register 2, offset 0x04.
    pub cfg2: RWRegister<u32>,
    /// External interrupt line routing, offsets 0x08..=0x14.
    ///
    /// `exintc[n]` routes lines `4*n..4*n+3`, one nibble each.
    pub exintc: [RWRegister<u32>; 4],
    /// I/O configuration register, offset 0x18.
    pub iocfg: RORegister<u32>,
}

impl RegisterBlock {
    /// A block holding the power-on-reset value of every register.
    ///
    /// The SCFG resets to all-zero words. Intended for unit tests that run
    /// the driver against ordinary memory.
    pub const fn new() -> Self {
        Self {
            cfg1: RWRegister::new(0),
            cfg2: RWRegister::new(0),
            exintc: [
                RWRegister::new(0),
                RWRegister::new(0),
                RWRegister::new(0),
                RWRegister::new(0),
            ],
            iocfg: RORegister::new(0),
        }
    }
}

/// Fields of `cfg1`.
pub mod cfg1 {
    use super::Field;

    pub const MEM_MAP_SEL: Field = Field::new(0, 2);
    pub const PA11_12_RMP: Field = Field::new(4, 1);
    pub const IR_POL: Field = Field::new(5, 1);
    pub const IR_SRC_SEL: Field = Field::new(6, 2);
    pub const ADC_DMA_RMP: Field = Field::new(8, 1);
    pub const USART1_TX_DMA_RMP: Field = Field::new(9, 1);
    pub const USART1_RX_DMA_RMP: Field = Field::new(10, 1);
    pub const TMR16_DMA_RMP: Field = Field::new(11, 1);
    pub const TMR17_DMA_RMP: Field = Field::new(12, 1);
    pub const TMR16_DMA_RMP2: Field = Field::new(13, 1);
    pub const TMR17_DMA_RMP2: Field = Field::new(14, 1);
    pub const SPI2_DMA_RMP: Field = Field::new(24, 1);
    pub const USART2_DMA_RMP: Field = Field::new(25, 1);
    pub const I2C1_DMA_RMP: Field = Field::new(27, 1);
    pub const TMR1_DMA_RMP: Field = Field::new(28, 1);
    pub const TMR3_DMA_RMP: Field = Field::new(30, 1);
}

/// Fields of `cfg2`.
pub mod cfg2 {
    use super::Field;

    pub const CAN1_TST_SEL: Field = Field::new(24, 1);
}

/// Fields of `iocfg`.
pub mod iocfg {
    use super::Field;

    pub const NRST_RMP: Field = Field::new(0, 1);
}

/// The nibble of an `exintc` word holding routing slot `slot` (0..=3).
pub const fn exint(slot: u32) -> Field {
    Field::new(4 * slot, 4)
}
