//! HAL for the AT32F422/426 family of microcontrollers
//!
//! This is an implementation of the [`embedded-hal`] traits for the AT32F422
//! and AT32F426 family, built on a hand-written register model of the SCFG,
//! CRM, ADC, DMA and FLASH peripherals.
//!
//! [`embedded-hal`]: https://crates.io/crates/embedded-hal
//!
//! # Usage
//!
//! ```rust,no_run
//! use at32f426_hal::{pac, prelude::*};
//!
//! let dp = pac::Peripherals::take().unwrap();
//!
//! let mut flash = dp.FLASH.constrain();
//! let mut crm = dp.CRM.constrain();
//!
//! // Run the core at 180 MHz off an 8 MHz crystal
//! let clocks = crm
//!     .cfgr
//!     .use_hext(8.mhz())
//!     .sysclk(180.mhz())
//!     .pclk1(90.mhz())
//!     .freeze(&mut flash.psr);
//!
//! let mut scfg = dp.SCFG.constrain(&mut crm.apb2);
//! scfg.adc_dma_remap(true);
//!
//! let dma_ch1 = dp.DMA1.split(&mut crm.ahb).1;
//! let adc = at32f426_hal::adc::Adc::adc1(dp.ADC1, &mut crm.apb2, clocks);
//! # let _ = (dma_ch1, adc);
//! ```

#![no_std]

pub use embedded_hal as hal;

pub mod pac;

pub mod adc;
pub mod crm;
pub mod dma;
pub mod flash;
pub mod poll;
pub mod prelude;
pub mod scfg;
pub mod time;

mod sealed {
    pub trait Sealed {}
}
pub(crate) use sealed::Sealed;
