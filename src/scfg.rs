//! # System Configuration Controller
//!
//! The SCFG block collects the chip-level routing knobs: boot memory mapping,
//! infrared output composition, DMA request remapping, external interrupt
//! line routing and the CAN timestamp source. Everything here is a thin,
//! bit-exact layer over the `cfg1`/`cfg2`/`exintc` words.

use core::ops::Deref;

use crate::crm::{Enable, Reset, APB2};
use crate::pac::{scfg, SCFG};

pub trait ScfgExt {
    /// Enables the SCFG clock, pulses its reset and wraps the peripheral.
    fn constrain(self, apb2: &mut APB2) -> Scfg;
}

impl ScfgExt for SCFG {
    fn constrain(self, apb2: &mut APB2) -> Scfg {
        SCFG::enable(apb2);
        SCFG::reset(apb2);
        Scfg { rb: self }
    }
}

/// Constrained SCFG peripheral
///
/// ```rust,no_run
/// use at32f426_hal::{pac, prelude::*};
/// let dp = pac::Peripherals::take().unwrap();
/// let mut crm = dp.CRM.constrain();
/// let mut scfg = dp.SCFG.constrain(&mut crm.apb2);
/// ```
pub struct Scfg<S = SCFG> {
    rb: S,
}

impl Scfg {
    /// Pulses the SCFG reset, returning every register to its power-on value.
    pub fn reset(&mut self, apb2: &mut APB2) {
        SCFG::reset(apb2);
    }
}

/// Memory mapped to address zero after boot.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MemMap {
    /// Main flash memory.
    MainFlash = 0,
    /// Boot loader memory.
    BootMemory = 1,
    /// Internal SRAM.
    InternalSram = 3,
}

/// Signal source composed onto the infrared output.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IrSource {
    Tmr16 = 0,
    Usart1 = 1,
    Usart2 = 2,
}

/// Polarity of the infrared output.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IrPolarity {
    /// Output used as-is.
    NoAffect = 0,
    /// Output inverted.
    Reverse = 1,
}

/// CAN peripherals with a selectable timestamp counter.
///
/// The family carries a single CAN; routing requests to any other instance is
/// unrepresentable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CanInstance {
    Can1,
}

/// Counter feeding the CAN timestamp field.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CanTimestampSource {
    Tmr3 = 0,
    Tmr4 = 1,
}

/// Function of the NRST pin, latched by hardware from the user option bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NrstPin {
    /// External reset input.
    Nrst,
    /// Remapped to the PF2 GPIO.
    Pf2,
}

/// GPIO port routed onto an external interrupt line.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ExintPort {
    PA = 0,
    PB = 1,
    PC = 2,
    PF = 5,
}

bitflags::bitflags! {
    /// DMA request remap bits of `cfg1`.
    ///
    /// Any combination is applied in a single read-modify-write through
    /// [`Scfg::dma_remap`].
    pub struct DmaRemap: u32 {
        const ADC1 = 1 << 8;
        const USART1_TX = 1 << 9;
        const USART1_RX = 1 << 10;
        const TMR16 = 1 << 11;
        const TMR17 = 1 << 12;
        /// Secondary TMR16 routing.
        const TMR16_ALT = 1 << 13;
        /// Secondary TMR17 routing.
        const TMR17_ALT = 1 << 14;
        const SPI2 = 1 << 24;
        const USART2 = 1 << 25;
        const I2C1 = 1 << 27;
        const TMR1 = 1 << 28;
        const TMR3 = 1 << 30;
    }
}

impl<S: Deref<Target = scfg::RegisterBlock>> Scfg<S> {
    /// The memory currently mapped to address zero.
    pub fn mem_map(&self) -> MemMap {
        match scfg::cfg1::MEM_MAP_SEL.read(self.rb.cfg1.read()) {
            0 => MemMap::MainFlash,
            1 => MemMap::BootMemory,
            _ => MemMap::InternalSram,
        }
    }

    /// Maps `map` to address zero.
    pub fn set_mem_map(&mut self, map: MemMap) {
        self.rb
            .cfg1
            .modify(|w| scfg::cfg1::MEM_MAP_SEL.insert(w, map as u32));
    }

    /// Selects the signal composed onto the infrared output and its polarity,
    /// in one register update.
    pub fn ir_config(&mut self, source: IrSource, polarity: IrPolarity) {
        self.rb.cfg1.modify(|w| {
            let w = scfg::cfg1::IR_SRC_SEL.insert(w, source as u32);
            scfg::cfg1::IR_POL.insert(w, polarity as u32)
        });
    }

    /// Selects the counter feeding the timestamp field of `can`.
    pub fn can_timestamp_source(&mut self, can: CanInstance, source: CanTimestampSource) {
        match can {
            CanInstance::Can1 => self
                .rb
                .cfg2
                .modify(|w| scfg::cfg2::CAN1_TST_SEL.insert(w, source as u32)),
        }
    }

    /// Current function of the NRST pin.
    pub fn nrst_pin(&self) -> NrstPin {
        if scfg::iocfg::NRST_RMP.read(self.rb.iocfg.read()) != 0 {
            NrstPin::Pf2
        } else {
            NrstPin::Nrst
        }
    }

    /// Routes `port` onto external interrupt line `line`.
    ///
    /// Each of the four `exintc` words carries four 4-bit routing nibbles.
    /// Lines beyond the 16 routed ones are ignored, like writes to reserved
    /// bits.
    pub fn exint_line_config(&mut self, port: ExintPort, line: u8) {
        if line > 15 {
            return;
        }
        let reg = usize::from(line / 4);
        let slot = scfg::exint(u32::from(line % 4));
        self.rb.exintc[reg].modify(|w| slot.insert(w, port as u32));
    }

    /// Sets or clears every remap in `remap`, in one read-modify-write.
    pub fn dma_remap(&mut self, remap: DmaRemap, enable: bool) {
        self.rb.cfg1.modify(|w| {
            if enable {
                w | remap.bits()
            } else {
                w & !remap.bits()
            }
        });
    }

    /// The DMA request remaps currently in force.
    pub fn dma_remaps(&self) -> DmaRemap {
        DmaRemap::from_bits_truncate(self.rb.cfg1.read())
    }
}

macro_rules! remap {
    ($(
        $(#[$doc:meta])*
        $fn_name:ident: $FIELD:path;
    )+) => {
        impl<S: Deref<Target = scfg::RegisterBlock>> Scfg<S> {
            $(
                $(#[$doc])*
                pub fn $fn_name(&mut self, on: bool) {
                    self.rb.cfg1.modify(|w| $FIELD.insert(w, on as u32));
                }
            )+
        }
    };
}

remap! {
    /// Moves the PA11/PA12 functions onto the PA9/PA10 pins.
    pa11_pa12_remap: scfg::cfg1::PA11_12_RMP;
    adc_dma_remap: scfg::cfg1::ADC_DMA_RMP;
    usart1_tx_dma_remap: scfg::cfg1::USART1_TX_DMA_RMP;
    usart1_rx_dma_remap: scfg::cfg1::USART1_RX_DMA_RMP;
    tmr16_dma_remap: scfg::cfg1::TMR16_DMA_RMP;
    tmr17_dma_remap: scfg::cfg1::TMR17_DMA_RMP;
    /// Secondary TMR16 routing.
    tmr16_dma_remap2: scfg::cfg1::TMR16_DMA_RMP2;
    /// Secondary TMR17 routing.
    tmr17_dma_remap2: scfg::cfg1::TMR17_DMA_RMP2;
    spi2_dma_remap: scfg::cfg1::SPI2_DMA_RMP;
    usart2_dma_remap: scfg::cfg1::USART2_DMA_RMP;
    i2c1_dma_remap: scfg::cfg1::I2C1_DMA_RMP;
    tmr1_dma_remap: scfg::cfg1::TMR1_DMA_RMP;
    tmr3_dma_remap: scfg::cfg1::TMR3_DMA_RMP;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pac::scfg::RegisterBlock;
    use crate::pac::{RORegister, RWRegister};

    #[test]
    fn exint_routing_touches_one_nibble() {
        let regs = RegisterBlock::new();
        let mut scfg = Scfg { rb: &regs };

        scfg.exint_line_config(ExintPort::PB, 5);

        assert_eq!(regs.exintc[0].read(), 0);
        // line 5 is the second nibble of the second word
        assert_eq!(regs.exintc[1].read(), 0x0000_0010);
        assert_eq!(regs.exintc[2].read(), 0);
        assert_eq!(regs.exintc[3].read(), 0);
    }

    #[test]
    fn exint_routing_replaces_an_earlier_route() {
        let regs = RegisterBlock::new();
        let mut scfg = Scfg { rb: &regs };

        scfg.exint_line_config(ExintPort::PF, 0);
        assert_eq!(regs.exintc[0].read(), 0x0000_0005);

        scfg.exint_line_config(ExintPort::PA, 0);
        assert_eq!(regs.exintc[0].read(), 0x0000_0000);
    }

    #[test]
    fn exint_lines_beyond_fifteen_are_ignored() {
        let regs = RegisterBlock::new();
        let mut scfg = Scfg { rb: &regs };

        scfg.exint_line_config(ExintPort::PC, 16);
        scfg.exint_line_config(ExintPort::PC, 255);

        for word in &regs.exintc {
            assert_eq!(word.read(), 0);
        }
    }

    #[test]
    fn mem_map_round_trips_and_reserved_reads_as_sram() {
        let regs = RegisterBlock::new();
        let mut scfg = Scfg { rb: &regs };

        assert_eq!(scfg.mem_map(), MemMap::MainFlash);

        scfg.set_mem_map(MemMap::BootMemory);
        assert_eq!(scfg.mem_map(), MemMap::BootMemory);

        scfg.set_mem_map(MemMap::InternalSram);
        assert_eq!(scfg.mem_map(), MemMap::InternalSram);

        // the hardware can latch the reserved encoding 2
        regs.cfg1.write(2);
        assert_eq!(scfg.mem_map(), MemMap::InternalSram);
    }

    #[test]
    fn ir_config_writes_source_and_polarity_together() {
        let regs = RegisterBlock::new();
        let mut scfg = Scfg { rb: &regs };

        scfg.ir_config(IrSource::Usart2, IrPolarity::Reverse);
        assert_eq!(regs.cfg1.read(), 0x0000_00A0);

        scfg.ir_config(IrSource::Tmr16, IrPolarity::NoAffect);
        assert_eq!(regs.cfg1.read(), 0);
    }

    #[test]
    fn can_timestamp_source_is_cfg2_bit_24() {
        let regs = RegisterBlock::new();
        let mut scfg = Scfg { rb: &regs };

        scfg.can_timestamp_source(CanInstance::Can1, CanTimestampSource::Tmr4);
        assert_eq!(regs.cfg2.read(), 0x0100_0000);

        scfg.can_timestamp_source(CanInstance::Can1, CanTimestampSource::Tmr3);
        assert_eq!(regs.cfg2.read(), 0);
    }

    #[test]
    fn dma_remap_applies_the_whole_mask_at_once() {
        let regs = RegisterBlock::new();
        let mut scfg = Scfg { rb: &regs };

        scfg.set_mem_map(MemMap::BootMemory);
        scfg.dma_remap(DmaRemap::ADC1 | DmaRemap::SPI2, true);

        assert_eq!(scfg.dma_remaps(), DmaRemap::ADC1 | DmaRemap::SPI2);
        // unrelated cfg1 bits survive
        assert_eq!(scfg.mem_map(), MemMap::BootMemory);

        // enabling again is idempotent
        scfg.dma_remap(DmaRemap::ADC1, true);
        assert_eq!(scfg.dma_remaps(), DmaRemap::ADC1 | DmaRemap::SPI2);

        scfg.dma_remap(DmaRemap::SPI2, false);
        assert_eq!(scfg.dma_remaps(), DmaRemap::ADC1);
    }

    #[test]
    fn single_remap_setters_drive_their_bit() {
        let regs = RegisterBlock::new();
        let mut scfg = Scfg { rb: &regs };

        scfg.pa11_pa12_remap(true);
        assert_eq!(regs.cfg1.read(), 0x0000_0010);

        scfg.tmr3_dma_remap(true);
        assert_eq!(regs.cfg1.read(), 0x4000_0010);

        scfg.pa11_pa12_remap(false);
        assert_eq!(regs.cfg1.read(), 0x4000_0000);
    }

    #[test]
    fn nrst_pin_reports_the_latched_remap() {
        let regs = RegisterBlock::new();
        let scfg = Scfg { rb: &regs };
        assert_eq!(scfg.nrst_pin(), NrstPin::Nrst);

        let remapped = RegisterBlock {
            cfg1: RWRegister::new(0),
            cfg2: RWRegister::new(0),
            exintc: [
                RWRegister::new(0),
                RWRegister::new(0),
                RWRegister::new(0),
                RWRegister::new(0),
            ],
            iocfg: RORegister::new(1),
        };
        let scfg = Scfg { rb: &remapped };
        assert_eq!(scfg.nrst_pin(), NrstPin::Pf2);
    }
}
