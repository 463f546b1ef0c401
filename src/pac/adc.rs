//! Analog-to-digital converter (ADC) registers.
//!
//! Base address `0x4001_2400`.

use super::{Field, RWRegister};

#[repr(C)]
pub struct RegisterBlock {
    /// Status register, offset 0x00.
    ///
    /// Flag bits are cleared by writing zero to them.
    pub sts: RWRegister<u32>,
    /// Control register 1, offset 0x04.
    pub ctrl1: RWRegister<u32>,
    /// Control register 2, offset 0x08.
    pub ctrl2: RWRegister<u32>,
    /// Sampling time register 1 (channels 10..=17), offset 0x0C.
    pub spt1: RWRegister<u32>,
    /// Sampling time register 2 (channels 0..=9), offset 0x10.
    pub spt2: RWRegister<u32>,
    _reserved0: [u32; 6],
    /// Ordinary sequence register 1, offset 0x2C.
    pub osq1: RWRegister<u32>,
    /// Ordinary sequence register 2, offset 0x30.
    pub osq2: RWRegister<u32>,
    /// Ordinary sequence register 3, offset 0x34.
    pub osq3: RWRegister<u32>,
    _reserved1: [u32; 5],
    /// Ordinary data register, offset 0x4C.
    pub odt: RWRegister<u32>,
}

impl RegisterBlock {
    /// A block in ordinary memory with every register at its reset value,
    /// for unit tests.
    pub const fn new() -> Self {
        Self {
            sts: RWRegister::new(0),
            ctrl1: RWRegister::new(0),
            ctrl2: RWRegister::new(0),
            spt1: RWRegister::new(0),
            spt2: RWRegister::new(0),
            _reserved0: [0; 6],
            osq1: RWRegister::new(0),
            osq2: RWRegister::new(0),
            osq3: RWRegister::new(0),
            _reserved1: [0; 5],
            odt: RWRegister::new(0),
        }
    }
}

/// Fields of `sts`.
pub mod sts {
    use super::Field;

    /// Voltage monitoring out of range.
    pub const VMOR: Field = Field::new(0, 1);
    /// Ordinary channel conversion end.
    pub const OCCE: Field = Field::new(1, 1);
    /// Ordinary channel conversion start.
    pub const OCCS: Field = Field::new(3, 1);
    /// Ordinary channel conversion overflow.
    pub const OCCO: Field = Field::new(4, 1);
    /// ADC ready to accept conversion requests.
    pub const RDY: Field = Field::new(5, 1);
    /// Transfer (conversion) failure.
    pub const TCF: Field = Field::new(6, 1);
}

/// Fields of `ctrl1`.
pub mod ctrl1 {
    use super::Field;

    /// Ordinary channel conversion end interrupt enable.
    pub const OCCEIEN: Field = Field::new(5, 1);
    /// Sequence (scan) mode enable.
    pub const SQEN: Field = Field::new(8, 1);
    /// Conversion failure interrupt enable.
    pub const TCFIEN: Field = Field::new(9, 1);
    /// Overflow interrupt enable.
    pub const OCCOIEN: Field = Field::new(26, 1);
}

/// Fields of `ctrl2`.
pub mod ctrl2 {
    use super::Field;

    /// A/D converter enable.
    pub const ADCEN: Field = Field::new(0, 1);
    /// Repeat (continuous) conversion mode.
    pub const RPEN: Field = Field::new(1, 1);
    /// Calibration start; hardware clears it when calibration completes.
    pub const ADCAL: Field = Field::new(2, 1);
    /// Calibration initialization; hardware clears it when done.
    pub const ADCALINIT: Field = Field::new(3, 1);
    /// DMA request enable for the ordinary group.
    pub const OCDMAEN: Field = Field::new(8, 1);
    /// Data alignment: 0 right, 1 left.
    pub const DTALIGN: Field = Field::new(11, 1);
    /// Ordinary group trigger select; `0b111` is the software trigger.
    pub const OCTESEL: Field = Field::new(17, 3);
    /// Ordinary group external trigger enable.
    pub const OCTEN: Field = Field::new(20, 1);
    /// Ordinary group software trigger.
    pub const OCSWTRG: Field = Field::new(22, 1);
    /// Internal temperature sensor and V_INTRV channel enable.
    pub const ITSRVEN: Field = Field::new(23, 1);
}

/// Fields of `osq1`.
pub mod osq1 {
    use super::Field;

    /// Ordinary conversion sequence length minus one.
    pub const OCLEN: Field = Field::new(20, 4);
}

/// Fields of `odt`.
pub mod odt {
    use super::Field;

    /// Ordinary conversion data.
    pub const ODT: Field = Field::new(0, 16);
}

/// Sampling-time slot for `channel` inside `spt1`/`spt2` (3 bits each).
///
/// Channels 0..=9 live in `spt2`, 10..=17 in `spt1`.
pub const fn spt(channel: u32) -> Field {
    Field::new(3 * (channel % 10), 3)
}

/// Ordinary-sequence slot for 1-based sequence position `pos` inside
/// `osq3` (positions 1..=6), `osq2` (7..=12) or `osq1` (13..=16), 5 bits each.
pub const fn osn(pos: u32) -> Field {
    Field::new(5 * ((pos - 1) % 6), 5)
}
