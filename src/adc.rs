//! # API for the Analog to Digital converter
//!
//! One-shot conversions through [`embedded_hal::adc::OneShot`], the internal
//! temperature sensor and reference voltage channels, and a continuous
//! DMA pipeline with recovery from conversion faults.

use core::marker::PhantomData;
use core::ops::Deref;
use core::sync::atomic::{self, Ordering};

use cortex_m::asm::delay;
use embedded_dma::WriteBuffer;
use embedded_hal::adc::{Channel, OneShot};

use crate::crm::{Clocks, Enable, Reset, APB2};
use crate::dma::{dma1::C1, CircBuffer, Receive, RxDma, Transfer, TransferPayload, W};
use crate::pac::{adc, dma, ADC1};

/// Continuous mode
pub struct Continuous;

/// ADC configuration
pub struct Adc<ADC> {
    rb: ADC,
    sample_time: SampleTime,
    align: Align,
    clocks: Clocks,
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[allow(non_camel_case_types)]
/// ADC sampling time
///
/// Options for the sampling time, each is T + 0.5 ADC clock cycles.
pub enum SampleTime {
    /// 1.5 cycles sampling time
    T_1,
    /// 7.5 cycles sampling time
    T_7,
    /// 13.5 cycles sampling time
    T_13,
    /// 28.5 cycles sampling time
    T_28,
    /// 41.5 cycles sampling time
    T_41,
    /// 55.5 cycles sampling time
    T_55,
    /// 71.5 cycles sampling time
    T_71,
    /// 239.5 cycles sampling time
    T_239,
}

impl Default for SampleTime {
    /// Get the default sample time (currently 28.5 cycles)
    fn default() -> Self {
        SampleTime::T_28
    }
}

impl From<SampleTime> for u8 {
    fn from(val: SampleTime) -> Self {
        use SampleTime::*;
        match val {
            T_1 => 0,
            T_7 => 1,
            T_13 => 2,
            T_28 => 3,
            T_41 => 4,
            T_55 => 5,
            T_71 => 6,
            T_239 => 7,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
/// ADC data register alignment
pub enum Align {
    /// Right alignment of output data
    Right,
    /// Left alignment of output data
    Left,
}

impl Default for Align {
    /// Default: right alignment
    fn default() -> Self {
        Align::Right
    }
}

impl From<Align> for bool {
    fn from(val: Align) -> Self {
        match val {
            Align::Right => false,
            Align::Left => true,
        }
    }
}

/// Internal temperature sensor, channel 16
pub struct TempSensor;

/// Internal reference voltage V_INTRV, channel 17
pub struct VoltRef;

impl Channel<ADC1> for TempSensor {
    type ID = u8;

    fn channel() -> u8 {
        16
    }
}

impl Channel<ADC1> for VoltRef {
    type ID = u8;

    fn channel() -> u8 {
        17
    }
}

/// A fault latched by the conversion engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FaultEvent {
    /// A regular conversion failed mid-flight.
    ConversionFail,
    /// A result was produced before the previous one was collected.
    Overflow,
}

impl FaultEvent {
    fn flag(self) -> crate::pac::Field {
        match self {
            FaultEvent::ConversionFail => adc::sts::TCF,
            FaultEvent::Overflow => adc::sts::OCCO,
        }
    }
}

/// Stored ADC config can be restored using the `Adc::restore_cfg` method
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub struct StoredConfig(SampleTime, Align);

impl Adc<ADC1> {
    /// Init a new Adc
    ///
    /// Sets all configurable parameters to one-shot defaults,
    /// performs a boot-time calibration.
    pub fn adc1(adc: ADC1, apb2: &mut APB2, clocks: Clocks) -> Self {
        let mut s = Self {
            rb: adc,
            sample_time: SampleTime::default(),
            align: Align::default(),
            clocks,
        };
        ADC1::enable(apb2);
        s.power_down();
        ADC1::reset(apb2);
        s.setup_oneshot();
        s.power_up();
        s.calibrate();
        s
    }

    /// Powers down the ADC, disables the ADC clock and releases the ADC peripheral
    pub fn release(mut self, apb2: &mut APB2) -> ADC1 {
        self.power_down();
        ADC1::disable(apb2);
        self.rb
    }

    fn read_aux(&mut self, chan: u8) -> u16 {
        let itsrv_off = if adc::ctrl2::ITSRVEN.read(self.rb.ctrl2.read()) == 0 {
            self.rb
                .ctrl2
                .modify(|w| adc::ctrl2::ITSRVEN.insert(w, 1));

            // the sensor needs to stabilize after powering; approximately
            // 10us, considering 1.25 instructions per cycle
            delay(self.clocks.sysclk().0 / 80_000);
            true
        } else {
            false
        };

        let val = self.convert(chan);

        if itsrv_off {
            self.rb
                .ctrl2
                .modify(|w| adc::ctrl2::ITSRVEN.insert(w, 0));
        }

        val
    }

    /// Measures the internal temperature sensor on channel 16, in °C.
    ///
    /// The sensor tracks temperature variations well but its offset varies
    /// from chip to chip; treat the absolute value with care.
    pub fn read_temp(&mut self) -> i32 {
        let prev_cfg = self.save_cfg();

        // the sensor wants a long sampling window
        self.set_sample_time(SampleTime::T_239);
        let raw = self.read_aux(16u8);

        self.restore_cfg(prev_cfg);

        temp_from_raw(raw)
    }

    /// Reads the internal reference voltage V_INTRV on channel 17.
    pub fn read_vintrv(&mut self) -> u16 {
        self.read_aux(17u8)
    }
}

/// Converts a raw sample of the internal temperature channel to °C.
///
/// The sensor reads 1.28 V at 25 °C with a 4.25 mV/°C slope, measured
/// against the 3.3 V reference with 12-bit resolution.
pub const fn temp_from_raw(raw: u16) -> i32 {
    let v_sense_mv = raw as i32 * 3300 / 4095;
    (v_sense_mv - 1280) * 100 / 425 + 25
}

impl<ADC: Deref<Target = adc::RegisterBlock>> Adc<ADC> {
    /// Save current ADC config
    pub fn save_cfg(&mut self) -> StoredConfig {
        StoredConfig(self.sample_time, self.align)
    }

    /// Restore saved ADC config
    pub fn restore_cfg(&mut self, cfg: StoredConfig) {
        self.sample_time = cfg.0;
        self.align = cfg.1;
    }

    /// Reset the ADC config to default, return existing config
    pub fn default_cfg(&mut self) -> StoredConfig {
        let cfg = self.save_cfg();
        self.sample_time = SampleTime::default();
        self.align = Align::default();
        cfg
    }

    /// Set ADC sampling time
    ///
    /// Options can be found in [SampleTime](crate::adc::SampleTime).
    pub fn set_sample_time(&mut self, t_samp: SampleTime) {
        self.sample_time = t_samp;
    }

    /// Set the Adc result alignment
    ///
    /// Options can be found in [Align](crate::adc::Align).
    pub fn set_align(&mut self, align: Align) {
        self.align = align;
    }

    /// Returns the largest possible sample value for the current settings
    pub fn max_sample(&self) -> u16 {
        match self.align {
            Align::Left => u16::MAX,
            Align::Right => (1 << 12) - 1,
        }
    }

    fn power_up(&mut self) {
        self.rb.ctrl2.modify(|w| adc::ctrl2::ADCEN.insert(w, 1));

        // stabilization time after power-up; approximately 1us, considering
        // 1.25 instructions per cycle
        delay(self.clocks.sysclk().0 / 800_000);

        while adc::sts::RDY.read(self.rb.sts.read()) == 0 {}
    }

    fn power_down(&mut self) {
        self.rb.ctrl2.modify(|w| adc::ctrl2::ADCEN.insert(w, 0));
    }

    fn calibrate(&mut self) {
        // initialize, then run; the hardware clears each bit when done
        self.rb
            .ctrl2
            .modify(|w| adc::ctrl2::ADCALINIT.insert(w, 1));
        while adc::ctrl2::ADCALINIT.read(self.rb.ctrl2.read()) != 0 {}

        self.rb.ctrl2.modify(|w| adc::ctrl2::ADCAL.insert(w, 1));
        while adc::ctrl2::ADCAL.read(self.rb.ctrl2.read()) != 0 {}
    }

    fn setup_oneshot(&mut self) {
        self.rb.ctrl2.modify(|w| {
            let w = adc::ctrl2::RPEN.insert(w, 0);
            let w = adc::ctrl2::OCTEN.insert(w, 1);
            adc::ctrl2::OCTESEL.insert(w, 0b111)
        });

        self.rb.ctrl1.modify(|w| adc::ctrl1::SQEN.insert(w, 0));

        self.rb.osq1.modify(|w| adc::osq1::OCLEN.insert(w, 0));
    }

    fn set_channel_sample_time(&mut self, chan: u8, sample_time: SampleTime) {
        let sample_time = u32::from(u8::from(sample_time));
        match chan {
            0..=9 => self
                .rb
                .spt2
                .modify(|w| adc::spt(u32::from(chan)).insert(w, sample_time)),
            10..=17 => self
                .rb
                .spt1
                .modify(|w| adc::spt(u32::from(chan)).insert(w, sample_time)),
            _ => unreachable!(),
        }
    }

    /// Programs the ordinary conversion sequence.
    ///
    /// Up to 16 channels convert in slice order once triggered; entries
    /// beyond the sixteenth are dropped. An empty slice leaves the sequence
    /// registers untouched.
    pub fn set_regular_sequence(&mut self, channels: &[u8]) {
        let len = channels.len();
        if len == 0 {
            return;
        }
        let bits = channels
            .iter()
            .take(6)
            .enumerate()
            .fold(0u32, |s, (i, c)| s | ((*c as u32) << (i * 5)));
        self.rb.osq3.write(bits);
        if len > 6 {
            let bits = channels
                .iter()
                .skip(6)
                .take(6)
                .enumerate()
                .fold(0u32, |s, (i, c)| s | ((*c as u32) << (i * 5)));
            self.rb.osq2.write(bits);
        }
        if len > 12 {
            let bits = channels
                .iter()
                .skip(12)
                .take(4)
                .enumerate()
                .fold(0u32, |s, (i, c)| s | ((*c as u32) << (i * 5)));
            self.rb.osq1.write(bits);
        }
        self.rb
            .osq1
            .modify(|w| adc::osq1::OCLEN.insert(w, (len - 1) as u32));
    }

    fn convert(&mut self, chan: u8) -> u16 {
        self.rb
            .ctrl2
            .modify(|w| adc::ctrl2::DTALIGN.insert(w, bool::from(self.align) as u32));
        self.set_channel_sample_time(chan, self.sample_time);
        self.rb
            .osq3
            .modify(|w| adc::osn(1).insert(w, u32::from(chan)));

        // software-trigger the regular sequence and wait for the result
        self.rb.ctrl2.modify(|w| adc::ctrl2::OCSWTRG.insert(w, 1));
        while adc::ctrl2::OCSWTRG.read(self.rb.ctrl2.read()) != 0 {}
        while adc::sts::OCCE.read(self.rb.sts.read()) == 0 {}

        adc::odt::ODT.read(self.rb.odt.read()) as u16
    }
}

impl<WORD, PIN> OneShot<ADC1, WORD, PIN> for Adc<ADC1>
where
    WORD: From<u16>,
    PIN: Channel<ADC1, ID = u8>,
{
    type Error = ();

    fn read(&mut self, _pin: &mut PIN) -> nb::Result<WORD, Self::Error> {
        let res = self.convert(PIN::channel());
        Ok(res.into())
    }
}

pub struct AdcPayload<PINS, MODE> {
    adc: Adc<ADC1>,
    pins: PINS,
    _mode: PhantomData<MODE>,
}

pub type AdcDma<PINS, MODE> = RxDma<AdcPayload<PINS, MODE>, C1>;

impl<PINS, MODE> Receive for AdcDma<PINS, MODE> {
    type RxChannel = C1;
    type TransmittedWord = u16;
}

impl<PINS> TransferPayload for AdcDma<PINS, Continuous> {
    fn start(&mut self) {
        self.channel.start();
        self.payload
            .adc
            .rb
            .ctrl2
            .modify(|w| adc::ctrl2::RPEN.insert(w, 1));
        self.payload
            .adc
            .rb
            .ctrl2
            .modify(|w| adc::ctrl2::OCSWTRG.insert(w, 1));
    }
    fn stop(&mut self) {
        self.channel.stop();
        self.payload
            .adc
            .rb
            .ctrl2
            .modify(|w| adc::ctrl2::RPEN.insert(w, 0));
    }
}

impl Adc<ADC1> {
    pub fn with_dma<PIN>(mut self, pins: PIN, dma_ch: C1) -> AdcDma<PIN, Continuous>
    where
        PIN: Channel<ADC1, ID = u8>,
    {
        // the internal channels sit behind their own enable
        if PIN::channel() >= 16 {
            self.rb
                .ctrl2
                .modify(|w| adc::ctrl2::ITSRVEN.insert(w, 1));
            delay(self.clocks.sysclk().0 / 80_000);
        }

        self.rb
            .ctrl2
            .modify(|w| adc::ctrl2::DTALIGN.insert(w, bool::from(self.align) as u32));
        self.set_channel_sample_time(PIN::channel(), self.sample_time);
        self.rb
            .osq3
            .modify(|w| adc::osn(1).insert(w, u32::from(PIN::channel())));
        self.rb
            .ctrl2
            .modify(|w| adc::ctrl2::OCDMAEN.insert(w, 1));

        let payload = AdcPayload {
            adc: self,
            pins,
            _mode: PhantomData,
        };
        RxDma {
            payload,
            channel: dma_ch,
        }
    }
}

impl<PINS> AdcDma<PINS, Continuous>
where
    Self: TransferPayload,
{
    pub fn split(mut self) -> (Adc<ADC1>, PINS, C1) {
        self.stop();

        let AdcDma { payload, channel } = self;
        payload
            .adc
            .rb
            .ctrl2
            .modify(|w| adc::ctrl2::OCDMAEN.insert(w, 0));

        (payload.adc, payload.pins, channel)
    }

    /// Enables the conversion-fail and overflow interrupts.
    pub fn listen_faults(&mut self) {
        self.payload.adc.rb.ctrl1.modify(|w| {
            let w = adc::ctrl1::TCFIEN.insert(w, 1);
            adc::ctrl1::OCCOIEN.insert(w, 1)
        });
    }

    /// Disables the conversion-fail and overflow interrupts.
    pub fn unlisten_faults(&mut self) {
        self.payload.adc.rb.ctrl1.modify(|w| {
            let w = adc::ctrl1::TCFIEN.insert(w, 0);
            adc::ctrl1::OCCOIEN.insert(w, 0)
        });
    }

    /// The latched fault, if any. Conversion failure is reported ahead of
    /// overflow when both are pending.
    pub fn pending_fault(&self) -> Option<FaultEvent> {
        let sts = self.payload.adc.rb.sts.read();
        if adc::sts::TCF.read(sts) != 0 {
            Some(FaultEvent::ConversionFail)
        } else if adc::sts::OCCO.read(sts) != 0 {
            Some(FaultEvent::Overflow)
        } else {
            None
        }
    }

    /// Restarts the pipeline after `fault`, rearming the channel for
    /// `transfer_len` data units.
    ///
    /// The sequence is the same for either fault cause: acknowledge the
    /// fault, quiesce converter and channel, clear the stale full-transfer
    /// flag, reload the counter and bring both back up.
    pub fn recover(&mut self, fault: FaultEvent, transfer_len: usize) {
        let rb = &self.payload.adc.rb;

        // flags acknowledge by writing zero to their bit
        rb.sts.write(!fault.flag().mask());

        rb.ctrl2.modify(|w| adc::ctrl2::ADCEN.insert(w, 0));
        self.channel.stop();

        self.channel.clear_flag(dma::flag::fdtf(0));
        self.channel.set_transfer_length(transfer_len);

        self.channel.start();
        self.payload
            .adc
            .rb
            .ctrl2
            .modify(|w| adc::ctrl2::ADCEN.insert(w, 1));
    }
}

impl<B, PINS, MODE> crate::dma::CircReadDma<B, u16> for AdcDma<PINS, MODE>
where
    Self: TransferPayload,
    &'static mut [B; 2]: WriteBuffer<Word = u16>,
    B: 'static,
{
    fn circ_read(mut self, mut buffer: &'static mut [B; 2]) -> CircBuffer<B, Self> {
        // NOTE(unsafe) We own the buffer now and we won't call other `&mut` on it
        // until the end of the transfer.
        let (ptr, len) = unsafe { buffer.write_buffer() };
        self.channel.set_peripheral_address(
            unsafe { &(*ADC1::ptr()).odt as *const _ as u32 },
            false,
        );
        self.channel.set_memory_address(ptr as u32, true);
        self.channel.set_transfer_length(len);

        atomic::compiler_fence(Ordering::Release);

        self.channel.ch().ctrl.modify(|w| {
            let w = dma::ctrl::M2M.insert(w, 0);
            let w = dma::ctrl::CHPL.insert(w, 0b01);
            let w = dma::ctrl::MWIDTH.insert(w, 0b01);
            let w = dma::ctrl::PWIDTH.insert(w, 0b01);
            let w = dma::ctrl::LM.insert(w, 1);
            dma::ctrl::DTD.insert(w, 0)
        });

        self.start();

        CircBuffer::new(buffer, self)
    }
}

impl<B, PINS, MODE> crate::dma::ReadDma<B, u16> for AdcDma<PINS, MODE>
where
    Self: TransferPayload,
    B: WriteBuffer<Word = u16>,
{
    fn read(mut self, mut buffer: B) -> Transfer<W, B, Self> {
        // NOTE(unsafe) We own the buffer now and we won't call other `&mut` on it
        // until the end of the transfer.
        let (ptr, len) = unsafe { buffer.write_buffer() };
        self.channel.set_peripheral_address(
            unsafe { &(*ADC1::ptr()).odt as *const _ as u32 },
            false,
        );
        self.channel.set_memory_address(ptr as u32, true);
        self.channel.set_transfer_length(len);

        atomic::compiler_fence(Ordering::Release);
        self.channel.ch().ctrl.modify(|w| {
            let w = dma::ctrl::M2M.insert(w, 0);
            let w = dma::ctrl::CHPL.insert(w, 0b01);
            let w = dma::ctrl::MWIDTH.insert(w, 0b01);
            let w = dma::ctrl::PWIDTH.insert(w, 0b01);
            let w = dma::ctrl::LM.insert(w, 0);
            dma::ctrl::DTD.insert(w, 0)
        });
        self.start();

        Transfer::w(buffer, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crm::{Config, CFGR};
    use crate::pac::adc::RegisterBlock;

    fn test_adc(rb: &RegisterBlock) -> Adc<&RegisterBlock> {
        Adc {
            rb,
            sample_time: SampleTime::default(),
            align: Align::default(),
            clocks: Config::from_cfgr(CFGR::default()).get_clocks(),
        }
    }

    #[test]
    fn temp_formula_matches_the_sensor_characteristics() {
        // 1.28 V reads back as 25 °C
        assert_eq!(temp_from_raw(1589), 25);
        // grounded input saturates low
        assert_eq!(temp_from_raw(0), -276);
        // lower voltage reads colder
        assert!(temp_from_raw(1400) < temp_from_raw(1589));
    }

    #[test]
    fn sample_time_lands_in_the_right_word() {
        let regs = RegisterBlock::new();
        let mut adc = test_adc(&regs);

        adc.set_channel_sample_time(3, SampleTime::T_239);
        assert_eq!(regs.spt2.read(), 0b111 << 9);
        assert_eq!(regs.spt1.read(), 0);

        adc.set_channel_sample_time(16, SampleTime::T_41);
        assert_eq!(regs.spt1.read(), 0b100 << 18);
    }

    #[test]
    fn short_sequences_program_length_and_slots() {
        let regs = RegisterBlock::new();
        let mut adc = test_adc(&regs);

        adc.set_regular_sequence(&[16, 2, 5]);
        assert_eq!(regs.osq3.read(), 16 | (2 << 5) | (5 << 10));
        // length is stored as count minus one
        assert_eq!(regs.osq1.read(), 2 << 20);
    }

    #[test]
    fn empty_sequence_leaves_the_registers_alone() {
        let regs = RegisterBlock::new();
        let mut adc = test_adc(&regs);

        adc.set_regular_sequence(&[]);
        assert_eq!(regs.osq1.read(), 0);
        assert_eq!(regs.osq2.read(), 0);
        assert_eq!(regs.osq3.read(), 0);
    }

    #[test]
    fn long_sequences_spill_into_the_other_words() {
        let regs = RegisterBlock::new();
        let mut adc = test_adc(&regs);

        let channels: [u8; 13] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12];
        adc.set_regular_sequence(&channels);

        assert_eq!(regs.osq2.read(), 6 | (7 << 5) | (8 << 10) | (9 << 15) | (10 << 20) | (11 << 25));
        assert_eq!(regs.osq1.read(), 12 | (12 << 20));
    }

    #[test]
    fn oneshot_setup_selects_the_software_trigger() {
        let regs = RegisterBlock::new();
        let mut adc = test_adc(&regs);

        adc.setup_oneshot();
        let ctrl2 = regs.ctrl2.read();
        assert_eq!(adc::ctrl2::OCTESEL.read(ctrl2), 0b111);
        assert_eq!(adc::ctrl2::OCTEN.read(ctrl2), 1);
        assert_eq!(adc::ctrl2::RPEN.read(ctrl2), 0);
    }
}
