//! Clock and reset management (CRM) registers.
//!
//! Base address `0x4002_1000`. Only the subset the HAL programs is
//! described: oscillator/PLL control, the system clock configuration word,
//! the peripheral enable/reset words for the AHB/APB1/APB2 buses, and the
//! auto-step control in `misc2`.

use super::{Field, RWRegister};

#[repr(C)]
pub struct RegisterBlock {
    /// Clock control register, offset 0x00.
    pub ctrl: RWRegister<u32>,
    /// Clock configuration register, offset 0x04.
    pub cfg: RWRegister<u32>,
    /// Clock interrupt register, offset 0x08. Not programmed by this HAL;
    /// present so the following words sit at their hardware offsets.
    pub clkint: RWRegister<u32>,
    /// APB2 peripheral reset register, offset 0x0C.
    pub apb2rst: RWRegister<u32>,
    /// APB1 peripheral reset register, offset 0x10.
    pub apb1rst: RWRegister<u32>,
    /// AHB peripheral clock enable register, offset 0x14.
    pub ahben: RWRegister<u32>,
    /// APB2 peripheral clock enable register, offset 0x18.
    pub apb2en: RWRegister<u32>,
    /// APB1 peripheral clock enable register, offset 0x1C.
    pub apb1en: RWRegister<u32>,
    _reserved0: [u32; 4],
    /// Miscellaneous register 1, offset 0x30. Not programmed by this HAL;
    /// present so `misc2` sits at its hardware offset.
    pub misc1: RWRegister<u32>,
    /// Miscellaneous register 2, offset 0x34.
    pub misc2: RWRegister<u32>,
}

impl RegisterBlock {
    /// A block in ordinary memory with every register at its reset value,
    /// for unit tests.
    pub const fn new() -> Self {
        Self {
            // HICK on and stable out of reset.
            ctrl: RWRegister::new(0x0000_0003),
            cfg: RWRegister::new(0),
            clkint: RWRegister::new(0),
            apb2rst: RWRegister::new(0),
            apb1rst: RWRegister::new(0),
            ahben: RWRegister::new(0),
            apb2en: RWRegister::new(0),
            apb1en: RWRegister::new(0),
            _reserved0: [0; 4],
            misc1: RWRegister::new(0),
            misc2: RWRegister::new(0),
        }
    }
}

/// Fields of `ctrl`.
pub mod ctrl {
    use super::Field;

    /// High-speed internal oscillator enable.
    pub const HICKEN: Field = Field::new(0, 1);
    /// High-speed internal oscillator stable.
    pub const HICKSTBL: Field = Field::new(1, 1);
    /// High-speed external crystal enable.
    pub const HEXTEN: Field = Field::new(16, 1);
    /// High-speed external crystal stable.
    pub const HEXTSTBL: Field = Field::new(17, 1);
    /// PLL enable.
    pub const PLLEN: Field = Field::new(24, 1);
    /// PLL stable.
    pub const PLLSTBL: Field = Field::new(25, 1);
}

/// Fields of `cfg`.
pub mod cfg {
    use super::Field;

    /// System clock source select: 0 HICK, 1 HEXT, 2 PLL.
    pub const SCLKSEL: Field = Field::new(0, 2);
    /// System clock source status, same encoding as `SCLKSEL`.
    pub const SCLKSTS: Field = Field::new(2, 2);
    /// AHB divider, `0b0111 + n` encodings as on the F4 family.
    pub const AHBDIV: Field = Field::new(4, 4);
    /// APB1 divider.
    pub const APB1DIV: Field = Field::new(8, 3);
    /// APB2 divider.
    pub const APB2DIV: Field = Field::new(11, 3);
    /// ADC clock divider from HCLK: /2, /4, /6, /8.
    pub const ADCDIV: Field = Field::new(14, 2);
    /// PLL reference: 0 HICK/2, 1 HEXT (optionally /2, see `PLLHEXTDIV`).
    pub const PLLRCS: Field = Field::new(16, 1);
    /// Divide HEXT by two before the PLL.
    pub const PLLHEXTDIV: Field = Field::new(17, 1);
    /// PLL multiplier, low four bits of `mult - 2`.
    pub const PLLMULT_L: Field = Field::new(18, 4);
    /// APB3 divider.
    pub const APB3DIV: Field = Field::new(22, 3);
    /// PLL multiplier, high two bits of `mult - 2`.
    pub const PLLMULT_H: Field = Field::new(29, 2);
}

/// Fields of `ahben`.
pub mod ahben {
    use super::Field;

    pub const DMA1EN: Field = Field::new(0, 1);
}

/// Fields of `apb2en` (the reset word `apb2rst` uses the same positions).
pub mod apb2 {
    use super::Field;

    pub const SCFGEN: Field = Field::new(0, 1);
    pub const ADC1EN: Field = Field::new(9, 1);
    pub const TMR1EN: Field = Field::new(11, 1);
    pub const USART1EN: Field = Field::new(14, 1);
    pub const TMR16EN: Field = Field::new(17, 1);
    pub const TMR17EN: Field = Field::new(18, 1);
}

/// Fields of `apb1en` (the reset word `apb1rst` uses the same positions).
pub mod apb1 {
    use super::Field;

    pub const TMR3EN: Field = Field::new(1, 1);
    pub const SPI2EN: Field = Field::new(14, 1);
    pub const USART2EN: Field = Field::new(17, 1);
    pub const I2C1EN: Field = Field::new(21, 1);
    pub const CAN1EN: Field = Field::new(25, 1);
    pub const PWCEN: Field = Field::new(28, 1);
}

/// Fields of `misc2`.
pub mod misc2 {
    use super::Field;

    /// Auto-step mode: `0b11` enables stepped system clock switching,
    /// `0b00` disables it.
    pub const AUTO_STEP_EN: Field = Field::new(4, 2);
}
