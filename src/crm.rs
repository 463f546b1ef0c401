//! # Clock and Reset Management
//!
//! The `CRM` peripheral drives the clock tree: HICK or HEXT feed the PLL,
//! the PLL (or either oscillator directly) feeds SYSCLK, and the AHB/APB
//! dividers derive the bus clocks from it. [`CFGR`] selects target
//! frequencies, [`CFGR::freeze`] programs the hardware and returns the frozen
//! [`Clocks`].

use crate::flash::Psr;
use crate::pac::{crm, pwc, RWRegister, CRM, PWC};
use crate::poll::{self, Timeout, Wait};
use crate::time::Hertz;

mod enable;

/// Extension trait that constrains the `CRM` peripheral
pub trait CrmExt {
    /// Constrains the `CRM` peripheral so it plays nicely with the other abstractions
    fn constrain(self) -> Crm;
}

impl CrmExt for CRM {
    fn constrain(self) -> Crm {
        Crm {
            ahb: AHB { _0: () },
            apb1: APB1 { _0: () },
            apb2: APB2 { _0: () },
            cfgr: CFGR::default(),
        }
    }
}

/// Constrained CRM peripheral
///
/// ```rust,no_run
/// use at32f426_hal::{pac, prelude::*};
/// let dp = pac::Peripherals::take().unwrap();
/// let mut crm = dp.CRM.constrain();
/// ```
pub struct Crm {
    pub ahb: AHB,
    pub apb1: APB1,
    pub apb2: APB2,
    pub cfgr: CFGR,
}

/// AMBA High-performance Bus (AHB) registers
pub struct AHB {
    _0: (),
}

impl AHB {
    pub(crate) fn enr(&mut self) -> &RWRegister<u32> {
        unsafe { &(*CRM::ptr()).ahben }
    }
}

/// Advanced Peripheral Bus 1 (APB1) registers
pub struct APB1 {
    _0: (),
}

impl APB1 {
    pub(crate) fn enr(&mut self) -> &RWRegister<u32> {
        unsafe { &(*CRM::ptr()).apb1en }
    }

    pub(crate) fn rstr(&mut self) -> &RWRegister<u32> {
        unsafe { &(*CRM::ptr()).apb1rst }
    }
}

/// Advanced Peripheral Bus 2 (APB2) registers
pub struct APB2 {
    _0: (),
}

impl APB2 {
    pub(crate) fn enr(&mut self) -> &RWRegister<u32> {
        unsafe { &(*CRM::ptr()).apb2en }
    }

    pub(crate) fn rstr(&mut self) -> &RWRegister<u32> {
        unsafe { &(*CRM::ptr()).apb2rst }
    }
}

/// Bus associated to peripheral
pub trait CrmBus: crate::Sealed {
    /// Bus type;
    type Bus;
}

/// Enable/disable peripheral
pub trait Enable: CrmBus {
    fn enable(bus: &mut Self::Bus);
    fn disable(bus: &mut Self::Bus);
}

/// Reset peripheral
pub trait Reset: CrmBus {
    fn reset(bus: &mut Self::Bus);
}

const HICK: u32 = 8_000_000; // Hz

/// Whether `sysclk_hz` needs the LDO output raised to 1.3 V.
///
/// The default regulator output carries the core up to 120 MHz; the
/// 120..=180 MHz range needs the boosted setting.
pub(crate) const fn ldo_boost_needed(sysclk_hz: u32) -> bool {
    sysclk_hz > 120_000_000
}

/// Clock configuration builder
///
/// Used to configure the frequencies of the clocks present in the processor.
///
/// After setting all frequencies, call the [freeze](#method.freeze) function to
/// apply the configuration.
///
/// **NOTE**: It is not guaranteed that the exact frequencies selected will be
/// used, only frequencies close to it.
#[derive(Debug, Default, PartialEq)]
pub struct CFGR {
    hext: Option<u32>,
    hclk: Option<u32>,
    pclk1: Option<u32>,
    pclk2: Option<u32>,
    pclk3: Option<u32>,
    sysclk: Option<u32>,
    adcclk: Option<u32>,
}

impl CFGR {
    /// Uses HEXT (external crystal) instead of HICK (internal RC oscillator) as the clock source.
    /// Will result in a hang if an external crystal is not connected or it fails to start,
    /// unless [`try_freeze`](Self::try_freeze) is used with a bounded wait.
    /// The frequency specified must be the frequency of the external crystal.
    #[inline(always)]
    pub fn use_hext<F>(mut self, freq: F) -> Self
    where
        F: Into<Hertz>,
    {
        self.hext = Some(freq.into().0);
        self
    }

    /// Sets the desired frequency for the HCLK clock
    #[inline(always)]
    pub fn hclk<F>(mut self, freq: F) -> Self
    where
        F: Into<Hertz>,
    {
        self.hclk = Some(freq.into().0);
        self
    }

    /// Sets the desired frequency for the PCLK1 clock
    #[inline(always)]
    pub fn pclk1<F>(mut self, freq: F) -> Self
    where
        F: Into<Hertz>,
    {
        self.pclk1 = Some(freq.into().0);
        self
    }

    /// Sets the desired frequency for the PCLK2 clock
    #[inline(always)]
    pub fn pclk2<F>(mut self, freq: F) -> Self
    where
        F: Into<Hertz>,
    {
        self.pclk2 = Some(freq.into().0);
        self
    }

    /// Sets the desired frequency for the PCLK3 clock
    #[inline(always)]
    pub fn pclk3<F>(mut self, freq: F) -> Self
    where
        F: Into<Hertz>,
    {
        self.pclk3 = Some(freq.into().0);
        self
    }

    /// Sets the desired frequency for the SYSCLK clock
    #[inline(always)]
    pub fn sysclk<F>(mut self, freq: F) -> Self
    where
        F: Into<Hertz>,
    {
        self.sysclk = Some(freq.into().0);
        self
    }

    /// Sets the desired frequency for the ADCCLK clock
    #[inline(always)]
    pub fn adcclk<F>(mut self, freq: F) -> Self
    where
        F: Into<Hertz>,
    {
        self.adcclk = Some(freq.into().0);
        self
    }

    /// Applies the clock configuration and returns a `Clocks` struct that signifies that the
    /// clocks are frozen, and contains the frequencies used. After this function is called,
    /// the clocks can not change.
    ///
    /// Usage:
    ///
    /// ```rust,no_run
    /// use at32f426_hal::{pac, prelude::*};
    /// let dp = pac::Peripherals::take().unwrap();
    /// let mut flash = dp.FLASH.constrain();
    /// let crm = dp.CRM.constrain();
    /// let clocks = crm.cfgr.freeze(&mut flash.psr);
    /// ```
    pub fn freeze(self, psr: &mut Psr) -> Clocks {
        let cfg = Config::from_cfgr(self);
        match Self::_freeze_with_config(cfg, psr, Wait::Forever) {
            Ok(clocks) => clocks,
            // An unbounded wait only returns once the flags are up
            Err(Timeout) => unreachable!(),
        }
    }

    /// Like [`freeze`](Self::freeze), but polls each hardware handshake
    /// (oscillator stable, PLL stable, clock switch done) under the given
    /// bound instead of spinning forever.
    pub fn try_freeze(self, psr: &mut Psr, wait: Wait) -> Result<Clocks, Timeout> {
        let cfg = Config::from_cfgr(self);
        Self::_freeze_with_config(cfg, psr, wait)
    }

    fn _freeze_with_config(cfg: Config, psr: &mut Psr, wait: Wait) -> Result<Clocks, Timeout> {
        let clocks = cfg.get_clocks();

        // flash wait states must match the target SYSCLK before the switch
        psr.set_wait_cycles(clocks.sysclk.0);

        let crm = unsafe { &*CRM::ptr() };

        if ldo_boost_needed(clocks.sysclk.0) {
            // the default LDO output is not rated for the top clock range;
            // raise it to 1.3 V before the switch
            crm.apb1en.modify(|w| crm::apb1::PWCEN.insert(w, 1));
            cortex_m::asm::dsb();
            let pwc = unsafe { &*PWC::ptr() };
            pwc.ldoov
                .modify(|w| pwc::ldoov::LDOOVSEL.insert(w, pwc::ldoov::SEL_1V3));
        }

        if cfg.hext.is_some() {
            // enable HEXT and wait for it to be stable
            crm.ctrl.modify(|w| crm::ctrl::HEXTEN.insert(w, 1));
            poll::spin_until(wait, || crm::ctrl::HEXTSTBL.read(crm.ctrl.read()) != 0)?;
        } else {
            // HICK comes up with the chip; re-assert it in case it was gated
            crm.ctrl.modify(|w| crm::ctrl::HICKEN.insert(w, 1));
            poll::spin_until(wait, || crm::ctrl::HICKSTBL.read(crm.ctrl.read()) != 0)?;
        }

        crm.cfg.modify(|w| {
            let w = crm::cfg::AHBDIV.insert(w, cfg.ahbdiv as u32);
            let w = crm::cfg::APB1DIV.insert(w, cfg.apb1div as u32);
            let w = crm::cfg::APB2DIV.insert(w, cfg.apb2div as u32);
            let w = crm::cfg::APB3DIV.insert(w, cfg.apb3div as u32);
            crm::cfg::ADCDIV.insert(w, cfg.adcdiv as u32)
        });

        if let Some(mult) = cfg.pllmult {
            // the encoded multiplier is split across a low/high field pair
            crm.cfg.modify(|w| {
                let src = cfg.hext.is_some() as u32;
                let w = crm::cfg::PLLRCS.insert(w, src);
                let w = crm::cfg::PLLHEXTDIV.insert(w, src);
                let w = crm::cfg::PLLMULT_L.insert(w, (mult & 0xF) as u32);
                crm::cfg::PLLMULT_H.insert(w, (mult >> 4) as u32)
            });

            crm.ctrl.modify(|w| crm::ctrl::PLLEN.insert(w, 1));
            poll::spin_until(wait, || crm::ctrl::PLLSTBL.read(crm.ctrl.read()) != 0)?;
        }

        let target = if cfg.pllmult.is_some() {
            0b10 // PLL
        } else if cfg.hext.is_some() {
            0b01 // HEXT
        } else {
            0b00 // HICK
        };

        // step the system clock through intermediate frequencies while switching
        crm.misc2
            .modify(|w| crm::misc2::AUTO_STEP_EN.insert(w, 0b11));
        crm.cfg.modify(|w| crm::cfg::SCLKSEL.insert(w, target));
        poll::spin_until(wait, || crm::cfg::SCLKSTS.read(crm.cfg.read()) == target)?;
        crm.misc2
            .modify(|w| crm::misc2::AUTO_STEP_EN.insert(w, 0b00));

        Ok(clocks)
    }
}

/// Frozen clock frequencies
///
/// The existence of this value indicates that the clock configuration can no longer be changed.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Clocks {
    hclk: Hertz,
    pclk1: Hertz,
    pclk2: Hertz,
    pclk3: Hertz,
    sysclk: Hertz,
    adcclk: Hertz,
}

impl Clocks {
    /// Returns the frequency of the AHB
    pub const fn hclk(&self) -> Hertz {
        self.hclk
    }

    /// Returns the frequency of the APB1
    pub const fn pclk1(&self) -> Hertz {
        self.pclk1
    }

    /// Returns the frequency of the APB2
    pub const fn pclk2(&self) -> Hertz {
        self.pclk2
    }

    /// Returns the frequency of the APB3
    pub const fn pclk3(&self) -> Hertz {
        self.pclk3
    }

    /// Returns the system (core) frequency
    pub const fn sysclk(&self) -> Hertz {
        self.sysclk
    }

    /// Returns the adc clock frequency
    pub const fn adcclk(&self) -> Hertz {
        self.adcclk
    }
}

/// AHB divider
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AhbDiv {
    /// SYSCLK not divided
    DIV1 = 7,
    /// SYSCLK divided by 2
    DIV2 = 8,
    /// SYSCLK divided by 4
    DIV4 = 9,
    /// SYSCLK divided by 8
    DIV8 = 10,
    /// SYSCLK divided by 16
    DIV16 = 11,
    /// SYSCLK divided by 64
    DIV64 = 12,
    /// SYSCLK divided by 128
    DIV128 = 13,
    /// SYSCLK divided by 256
    DIV256 = 14,
    /// SYSCLK divided by 512
    DIV512 = 15,
}

/// APB divider
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApbDiv {
    /// HCLK not divided
    DIV1 = 3,
    /// HCLK divided by 2
    DIV2 = 4,
    /// HCLK divided by 4
    DIV4 = 5,
    /// HCLK divided by 8
    DIV8 = 6,
    /// HCLK divided by 16
    DIV16 = 7,
}

/// ADC clock divider, from PCLK2
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdcDiv {
    /// PCLK2 divided by 2
    DIV2 = 0,
    /// PCLK2 divided by 4
    DIV4 = 1,
    /// PCLK2 divided by 6
    DIV6 = 2,
    /// PCLK2 divided by 8
    DIV8 = 3,
}

/// Resolved divider/multiplier settings, decoupled from the hardware so the
/// frequency arithmetic is host-testable.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    pub hext: Option<u32>,
    /// PLL multiplier, encoded as `mult - 2`; `None` runs SYSCLK straight
    /// off the selected oscillator.
    pub pllmult: Option<u8>,
    pub ahbdiv: AhbDiv,
    pub apb1div: ApbDiv,
    pub apb2div: ApbDiv,
    pub apb3div: ApbDiv,
    pub adcdiv: AdcDiv,
}

impl Config {
    pub const fn from_cfgr(cfgr: CFGR) -> Self {
        let hext = cfgr.hext;
        // the PLL reference is always the oscillator halved
        let pllsrcclk = (if let Some(hext) = hext { hext } else { HICK }) / 2;

        let pllmult = if let Some(sysclk) = cfgr.sysclk {
            sysclk / pllsrcclk
        } else {
            1
        };

        let (pllmult_bits, sysclk) = if pllmult <= 1 {
            (None, if let Some(hext) = hext { hext } else { HICK })
        } else {
            let pllmult = match pllmult {
                2..=64 => pllmult,
                _ => 64,
            };
            (Some((pllmult - 2) as u8), pllsrcclk * pllmult)
        };

        let ahbdiv = if let Some(hclk) = cfgr.hclk {
            match sysclk / hclk {
                0..=1 => AhbDiv::DIV1,
                2 => AhbDiv::DIV2,
                3..=5 => AhbDiv::DIV4,
                6..=11 => AhbDiv::DIV8,
                12..=39 => AhbDiv::DIV16,
                40..=95 => AhbDiv::DIV64,
                96..=191 => AhbDiv::DIV128,
                192..=383 => AhbDiv::DIV256,
                _ => AhbDiv::DIV512,
            }
        } else {
            AhbDiv::DIV1
        };

        let hclk = if ahbdiv as u8 >= 0b1100 {
            sysclk / (1 << (ahbdiv as u8 - 0b0110))
        } else {
            sysclk / (1 << (ahbdiv as u8 - 0b0111))
        };

        let pclk1 = if let Some(pclk1) = cfgr.pclk1 {
            pclk1
        } else {
            hclk
        };
        let apb1div = match (hclk + pclk1 - 1) / pclk1 {
            0 | 1 => ApbDiv::DIV1,
            2 => ApbDiv::DIV2,
            3..=5 => ApbDiv::DIV4,
            6..=11 => ApbDiv::DIV8,
            _ => ApbDiv::DIV16,
        };

        let pclk2 = if let Some(pclk2) = cfgr.pclk2 {
            pclk2
        } else {
            hclk
        };
        let apb2div = match (hclk + pclk2 - 1) / pclk2 {
            0 | 1 => ApbDiv::DIV1,
            2 => ApbDiv::DIV2,
            3..=5 => ApbDiv::DIV4,
            6..=11 => ApbDiv::DIV8,
            _ => ApbDiv::DIV16,
        };
        let pclk2 = hclk / (1 << (apb2div as u8 - 0b011));

        // APB3 is capped at half the core clock
        let pclk3 = if let Some(pclk3) = cfgr.pclk3 {
            pclk3
        } else if hclk < 90_000_000 {
            hclk
        } else {
            90_000_000
        };
        let apb3div = match (hclk + pclk3 - 1) / pclk3 {
            0 | 1 => ApbDiv::DIV1,
            2 => ApbDiv::DIV2,
            3..=5 => ApbDiv::DIV4,
            6..=11 => ApbDiv::DIV8,
            _ => ApbDiv::DIV16,
        };

        let adcdiv = if let Some(adcclk) = cfgr.adcclk {
            match pclk2 / adcclk {
                0..=2 => AdcDiv::DIV2,
                3..=4 => AdcDiv::DIV4,
                5..=7 => AdcDiv::DIV6,
                _ => AdcDiv::DIV8,
            }
        } else {
            AdcDiv::DIV8
        };

        Self {
            hext,
            pllmult: pllmult_bits,
            ahbdiv,
            apb1div,
            apb2div,
            apb3div,
            adcdiv,
        }
    }

    pub fn get_clocks(&self) -> Clocks {
        let sysclk = if let Some(pllmult_bits) = self.pllmult {
            let pllsrcclk = (if let Some(hext) = self.hext { hext } else { HICK }) / 2;
            pllsrcclk * (pllmult_bits as u32 + 2)
        } else if let Some(hext) = self.hext {
            hext
        } else {
            HICK
        };

        let hclk = if self.ahbdiv as u8 >= 0b1100 {
            sysclk / (1 << (self.ahbdiv as u8 - 0b0110))
        } else {
            sysclk / (1 << (self.ahbdiv as u8 - 0b0111))
        };

        let pclk1 = hclk / (1 << (self.apb1div as u8 - 0b011));
        let pclk2 = hclk / (1 << (self.apb2div as u8 - 0b011));
        let pclk3 = hclk / (1 << (self.apb3div as u8 - 0b011));

        let adcdiv = (self.adcdiv as u32 + 1) << 1;
        let adcclk = pclk2 / adcdiv;

        assert!(
            sysclk <= 180_000_000
                && hclk <= 180_000_000
                && pclk1 <= 180_000_000
                && pclk2 <= 180_000_000
                && pclk3 <= 90_000_000
                && adcclk <= 30_000_000
        );

        Clocks {
            hclk: Hertz(hclk),
            pclk1: Hertz(pclk1),
            pclk2: Hertz(pclk2),
            pclk3: Hertz(pclk3),
            sysclk: Hertz(sysclk),
            adcclk: Hertz(adcclk),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::U32Ext;

    #[test]
    fn crm_config_180mhz_from_hext() {
        let cfgr = CFGR::default()
            .use_hext(8.mhz())
            .sysclk(180.mhz())
            .pclk3(45.mhz());

        let config = Config::from_cfgr(cfgr);
        let config_expected = Config {
            hext: Some(8_000_000),
            // 8 MHz / 2 * 45 = 180 MHz, encoded as 45 - 2
            pllmult: Some(43),
            ahbdiv: AhbDiv::DIV1,
            apb1div: ApbDiv::DIV1,
            apb2div: ApbDiv::DIV1,
            apb3div: ApbDiv::DIV4,
            adcdiv: AdcDiv::DIV8,
        };
        assert_eq!(config, config_expected);

        let clocks = config.get_clocks();
        assert_eq!(clocks.sysclk(), Hertz(180_000_000));
        assert_eq!(clocks.hclk(), Hertz(180_000_000));
        assert_eq!(clocks.pclk1(), Hertz(180_000_000));
        assert_eq!(clocks.pclk2(), Hertz(180_000_000));
        assert_eq!(clocks.pclk3(), Hertz(45_000_000));
        assert_eq!(clocks.adcclk(), Hertz(22_500_000));
    }

    #[test]
    fn crm_config_default_runs_on_hick() {
        let config = Config::from_cfgr(CFGR::default());
        assert_eq!(config.hext, None);
        assert_eq!(config.pllmult, None);

        let clocks = config.get_clocks();
        assert_eq!(clocks.sysclk(), Hertz(8_000_000));
        assert_eq!(clocks.hclk(), Hertz(8_000_000));
        assert_eq!(clocks.pclk3(), Hertz(8_000_000));
        assert_eq!(clocks.adcclk(), Hertz(1_000_000));
    }

    #[test]
    fn crm_config_encodes_the_pll_multiplier() {
        let cfgr = CFGR::default().use_hext(8.mhz()).sysclk(172.mhz());
        let config = Config::from_cfgr(cfgr);
        // 172 / 4 = 43, encoded as 43 - 2
        assert_eq!(config.pllmult, Some(41));

        let clocks = config.get_clocks();
        assert_eq!(clocks.sysclk(), Hertz(172_000_000));
    }

    #[test]
    fn ldo_boost_covers_only_the_top_clock_range() {
        assert!(!ldo_boost_needed(8_000_000));
        assert!(!ldo_boost_needed(120_000_000));
        assert!(ldo_boost_needed(120_000_001));
        assert!(ldo_boost_needed(180_000_000));
    }

    #[test]
    fn crm_config_divides_the_buses_down() {
        let cfgr = CFGR::default()
            .use_hext(8.mhz())
            .sysclk(180.mhz())
            .hclk(90.mhz())
            .pclk1(45.mhz())
            .adcclk(12.mhz());
        let config = Config::from_cfgr(cfgr);
        assert_eq!(config.ahbdiv, AhbDiv::DIV2);
        assert_eq!(config.apb1div, ApbDiv::DIV2);
        // 90 MHz / 12 MHz rounds down to ratio 7, served by the /6 divider
        assert_eq!(config.adcdiv, AdcDiv::DIV6);

        let clocks = config.get_clocks();
        assert_eq!(clocks.hclk(), Hertz(90_000_000));
        assert_eq!(clocks.pclk1(), Hertz(45_000_000));
        assert_eq!(clocks.adcclk(), Hertz(15_000_000));
    }
}
