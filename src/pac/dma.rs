//! DMA controller registers.
//!
//! Base address `0x4002_0000`. Seven channels, each a 20-byte block of five
//! words starting at offset 0x08. The shared `sts`/`clr` words carry one
//! 4-bit flag nibble per channel.

use super::{Field, RWRegister};

#[repr(C)]
pub struct RegisterBlock {
    /// Interrupt status register, offset 0x00.
    pub sts: RWRegister<u32>,
    /// Interrupt flag clear register, offset 0x04.
    pub clr: RWRegister<u32>,
    /// The seven channels, offsets 0x08 + 0x14 * n.
    pub channel: [Channel; 7],
}

/// One DMA channel.
#[repr(C)]
pub struct Channel {
    /// Channel control register.
    pub ctrl: RWRegister<u32>,
    /// Remaining transfer count.
    pub dtcnt: RWRegister<u32>,
    /// Peripheral address.
    pub paddr: RWRegister<u32>,
    /// Memory address.
    pub maddr: RWRegister<u32>,
    _reserved: u32,
}

impl RegisterBlock {
    /// A block in ordinary memory with every register at its reset value,
    /// for unit tests.
    pub const fn new() -> Self {
        const CH: Channel = Channel::new();
        Self {
            sts: RWRegister::new(0),
            clr: RWRegister::new(0),
            channel: [CH; 7],
        }
    }
}

impl Channel {
    pub const fn new() -> Self {
        Self {
            ctrl: RWRegister::new(0),
            dtcnt: RWRegister::new(0),
            paddr: RWRegister::new(0),
            maddr: RWRegister::new(0),
            _reserved: 0,
        }
    }
}

/// Fields of a channel `ctrl` word.
pub mod ctrl {
    use super::Field;

    /// Channel enable.
    pub const CHEN: Field = Field::new(0, 1);
    /// Full data transfer interrupt enable.
    pub const FDTIEN: Field = Field::new(1, 1);
    /// Half data transfer interrupt enable.
    pub const HDTIEN: Field = Field::new(2, 1);
    /// Data transfer error interrupt enable.
    pub const DTERRIEN: Field = Field::new(3, 1);
    /// Transfer direction: 0 peripheral-to-memory, 1 memory-to-peripheral.
    pub const DTD: Field = Field::new(4, 1);
    /// Loop (circular) mode.
    pub const LM: Field = Field::new(5, 1);
    /// Peripheral address increment.
    pub const PINCM: Field = Field::new(6, 1);
    /// Memory address increment.
    pub const MINCM: Field = Field::new(7, 1);
    /// Peripheral data width: 0 byte, 1 half-word, 2 word.
    pub const PWIDTH: Field = Field::new(8, 2);
    /// Memory data width, same encoding.
    pub const MWIDTH: Field = Field::new(10, 2);
    /// Channel priority.
    pub const CHPL: Field = Field::new(12, 2);
    /// Memory-to-memory mode.
    pub const M2M: Field = Field::new(14, 1);
}

/// Per-channel flag bits inside the `sts`/`clr` nibble for 0-based
/// channel `index`.
pub mod flag {
    use super::Field;

    /// Global flag (any event on the channel).
    pub const fn gf(index: u32) -> Field {
        Field::new(4 * index, 1)
    }

    /// Full data transfer flag.
    pub const fn fdtf(index: u32) -> Field {
        Field::new(4 * index + 1, 1)
    }

    /// Half data transfer flag.
    pub const fn hdtf(index: u32) -> Field {
        Field::new(4 * index + 2, 1)
    }

    /// Data transfer error flag.
    pub const fn dterrf(index: u32) -> Field {
        Field::new(4 * index + 3, 1)
    }
}
