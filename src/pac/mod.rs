//! # Register-level access to the AT32F422/426
//!
//! No peripheral access crate exists for this family, so the registers the
//! HAL touches are described here directly: one module per peripheral with a
//! `#[repr(C)]` register block of volatile cells, a fixed base address behind
//! a zero-sized singleton type, and [`Field`] descriptors for the named
//! bit-fields of each register word.
//!
//! A register word has two views. The raw view is [`RWRegister::read`] /
//! [`RWRegister::write`], which replace the whole word. The field view is
//! `reg.modify(|w| FIELD.insert(w, value))`, a single read-modify-write that
//! only touches the bits belonging to `FIELD`; reserved bits are carried
//! through untouched.

use core::marker::PhantomData;
use core::ops::Deref;

use vcell::VolatileCell;

pub mod adc;
pub mod crm;
pub mod dma;
pub mod flash;
pub mod pwc;
pub mod scfg;

/// A read-write register word.
#[repr(transparent)]
pub struct RWRegister<T: Copy> {
    register: VolatileCell<T>,
}

impl<T: Copy> RWRegister<T> {
    /// Creates a register word holding `value`.
    ///
    /// Only useful for building register blocks in ordinary memory, e.g. in
    /// unit tests; the hardware blocks live at their fixed bus addresses.
    pub const fn new(value: T) -> Self {
        Self {
            register: VolatileCell::new(value),
        }
    }

    /// Reads the whole word.
    #[inline(always)]
    pub fn read(&self) -> T {
        self.register.get()
    }

    /// Replaces the whole word.
    #[inline(always)]
    pub fn write(&self, value: T) {
        self.register.set(value)
    }

    /// Read-modify-write of the whole word.
    #[inline(always)]
    pub fn modify<F: FnOnce(T) -> T>(&self, f: F) {
        self.register.set(f(self.register.get()))
    }
}

/// A read-only register word (latched hardware status).
///
/// There is no write half; writing such a word is a contract violation on the
/// hardware and is unrepresentable here.
#[repr(transparent)]
pub struct RORegister<T: Copy> {
    register: VolatileCell<T>,
}

impl<T: Copy> RORegister<T> {
    pub const fn new(value: T) -> Self {
        Self {
            register: VolatileCell::new(value),
        }
    }

    /// Reads the whole word.
    #[inline(always)]
    pub fn read(&self) -> T {
        self.register.get()
    }
}

/// A named, contiguous bit-field of a 32-bit register word.
///
/// All arithmetic is pure shift/mask over plain words, so the same code paths
/// run against hardware registers and against in-memory fakes. `insert`
/// silently truncates the value to the field width — out-of-range values are
/// masked, not rejected, matching what the bus does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Field {
    offset: u32,
    width: u32,
}

impl Field {
    pub const fn new(offset: u32, width: u32) -> Self {
        Self { offset, width }
    }

    /// The in-word mask covering this field.
    pub const fn mask(self) -> u32 {
        (((1u64 << self.width) - 1) as u32) << self.offset
    }

    /// Extracts this field from `word`, right-aligned to bit 0.
    pub const fn read(self, word: u32) -> u32 {
        (word & self.mask()) >> self.offset
    }

    /// Returns `word` with this field replaced by `value`.
    ///
    /// Bits of `value` beyond the field width are dropped; every bit outside
    /// the field is preserved.
    pub const fn insert(self, word: u32, value: u32) -> u32 {
        (word & !self.mask()) | ((value << self.offset) & self.mask())
    }
}

macro_rules! periph {
    ($(
        $(#[$doc:meta])*
        $NAME:ident: ($block:path, $addr:literal),
    )+) => {
        $(
            $(#[$doc])*
            pub struct $NAME {
                _marker: PhantomData<*const ()>,
            }

            unsafe impl Send for $NAME {}

            impl $NAME {
                /// Fixed bus address of the register block.
                pub const PTR: *const $block = $addr as *const _;

                #[inline(always)]
                pub const fn ptr() -> *const $block {
                    Self::PTR
                }
            }

            impl Deref for $NAME {
                type Target = $block;

                #[inline(always)]
                fn deref(&self) -> &Self::Target {
                    unsafe { &*Self::PTR }
                }
            }
        )+

        /// All device peripherals known to this HAL.
        #[allow(non_snake_case)]
        pub struct Peripherals {
            $(pub $NAME: $NAME,)+
        }

        static mut DEVICE_PERIPHERALS: bool = false;

        impl Peripherals {
            /// Returns the peripheral singletons the first time it is called.
            pub fn take() -> Option<Self> {
                cortex_m::interrupt::free(|_| {
                    if unsafe { DEVICE_PERIPHERALS } {
                        None
                    } else {
                        Some(unsafe { Peripherals::steal() })
                    }
                })
            }

            /// Unchecked version of [`Peripherals::take`].
            ///
            /// # Safety
            ///
            /// Creates a second set of handles to the same hardware; the
            /// caller is responsible for not using both concurrently.
            pub unsafe fn steal() -> Self {
                DEVICE_PERIPHERALS = true;
                Peripherals {
                    $($NAME: $NAME { _marker: PhantomData },)+
                }
            }
        }
    };
}

periph! {
    /// System configuration controller.
    SCFG: (scfg::RegisterBlock, 0x4001_0000),
    /// Clock and reset management.
    CRM: (crm::RegisterBlock, 0x4002_1000),
    /// Analog-to-digital converter.
    ADC1: (adc::RegisterBlock, 0x4001_2400),
    /// DMA controller.
    DMA1: (dma::RegisterBlock, 0x4002_0000),
    /// Flash memory interface.
    FLASH: (flash::RegisterBlock, 0x4002_2000),
    /// Power control.
    PWC: (pwc::RegisterBlock, 0x4000_7000),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_mask_covers_exactly_the_field() {
        assert_eq!(Field::new(0, 2).mask(), 0x0000_0003);
        assert_eq!(Field::new(6, 2).mask(), 0x0000_00C0);
        assert_eq!(Field::new(24, 1).mask(), 0x0100_0000);
        assert_eq!(Field::new(0, 32).mask(), 0xFFFF_FFFF);
    }

    #[test]
    fn insert_then_read_round_trips_modulo_width() {
        let f = Field::new(6, 2);
        for v in 0..16u32 {
            let word = f.insert(0xDEAD_BEEF, v);
            assert_eq!(f.read(word), v & 0b11);
        }
    }

    #[test]
    fn insert_preserves_unrelated_bits() {
        let f = Field::new(8, 4);
        let before = 0xA5A5_A5A5;
        let after = f.insert(before, 0x7);
        assert_eq!(after & !f.mask(), before & !f.mask());
        assert_eq!(f.read(after), 0x7);
    }

    #[test]
    fn rw_register_modify_is_read_modify_write() {
        let reg = RWRegister::new(0x0000_FF00u32);
        reg.modify(|w| w | 1);
        assert_eq!(reg.read(), 0x0000_FF01);
    }
}
