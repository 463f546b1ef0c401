//! # Direct Memory Access
#![allow(dead_code)]

use core::{
    marker::PhantomData,
    sync::atomic::{compiler_fence, Ordering},
};
use embedded_dma::WriteBuffer;

use crate::crm::AHB;

#[derive(Debug)]
#[non_exhaustive]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    Overrun,
}

pub enum Event {
    HalfTransfer,
    TransferComplete,
}

#[derive(Clone, Copy, PartialEq)]
pub enum Half {
    First,
    Second,
}

pub struct CircBuffer<BUFFER, PAYLOAD>
where
    BUFFER: 'static,
{
    buffer: &'static mut [BUFFER; 2],
    payload: PAYLOAD,
    readable_half: Half,
}

impl<BUFFER, PAYLOAD> CircBuffer<BUFFER, PAYLOAD>
where
    &'static mut [BUFFER; 2]: WriteBuffer,
    BUFFER: 'static,
{
    pub(crate) fn new(buf: &'static mut [BUFFER; 2], payload: PAYLOAD) -> Self {
        CircBuffer {
            buffer: buf,
            payload,
            readable_half: Half::Second,
        }
    }
}

pub trait DmaExt {
    type Channels;

    fn split(self, ahb: &mut AHB) -> Self::Channels;
}

pub trait TransferPayload {
    fn start(&mut self);
    fn stop(&mut self);
}

pub struct Transfer<MODE, BUFFER, PAYLOAD>
where
    PAYLOAD: TransferPayload,
{
    _mode: PhantomData<MODE>,
    buffer: BUFFER,
    payload: PAYLOAD,
}

impl<BUFFER, PAYLOAD> Transfer<W, BUFFER, PAYLOAD>
where
    PAYLOAD: TransferPayload,
{
    pub(crate) fn w(buffer: BUFFER, payload: PAYLOAD) -> Self {
        Transfer {
            _mode: PhantomData,
            buffer,
            payload,
        }
    }
}

impl<MODE, BUFFER, PAYLOAD> Drop for Transfer<MODE, BUFFER, PAYLOAD>
where
    PAYLOAD: TransferPayload,
{
    fn drop(&mut self) {
        self.payload.stop();
        compiler_fence(Ordering::SeqCst);
    }
}

/// Peripheral-to-memory transfer
pub struct W;

pub mod dma1 {
    use core::{
        mem, ptr,
        sync::atomic::{self, Ordering},
    };

    use crate::crm::{Enable, AHB};
    use crate::dma::{
        CircBuffer, DmaExt, Error, Event, Half, RxDma, Transfer, TransferPayload, W,
    };
    use crate::pac::{dma, Field, RWRegister, DMA1};

    #[allow(clippy::manual_non_exhaustive)]
    pub struct Channels((), pub C1, pub C2, pub C3, pub C4, pub C5, pub C6, pub C7);

    macro_rules! dma_channels {
        ($($CX:ident: $idx:literal,)+) => {
            $(
                /// A singleton with exclusive access to the registers of one
                /// DMA1 channel
                pub struct $CX { _0: () }

                impl $CX {
                    const IDX: u32 = $idx;

                    pub fn ch(&mut self) -> &dma::Channel {
                        unsafe { &(*DMA1::ptr()).channel[Self::IDX as usize] }
                    }

                    /// Associated peripheral `address`
                    ///
                    /// `inc` indicates whether the address is incremented after
                    /// every transferred unit
                    pub fn set_peripheral_address(&mut self, address: u32, inc: bool) {
                        self.ch().paddr.write(address);
                        self.ch()
                            .ctrl
                            .modify(|w| dma::ctrl::PINCM.insert(w, inc as u32));
                    }

                    /// `address` where from/to data will be read/write
                    ///
                    /// `inc` indicates whether the address is incremented after
                    /// every transferred unit
                    pub fn set_memory_address(&mut self, address: u32, inc: bool) {
                        self.ch().maddr.write(address);
                        self.ch()
                            .ctrl
                            .modify(|w| dma::ctrl::MINCM.insert(w, inc as u32));
                    }

                    /// Number of data units to transfer
                    pub fn set_transfer_length(&mut self, len: usize) {
                        assert!(len <= u16::MAX as usize);
                        self.ch().dtcnt.write(len as u32);
                    }

                    /// Starts the DMA transfer
                    pub fn start(&mut self) {
                        self.ch().ctrl.modify(|w| dma::ctrl::CHEN.insert(w, 1));
                    }

                    /// Stops the DMA transfer
                    pub fn stop(&mut self) {
                        self.clear_flag(dma::flag::gf(Self::IDX));
                        self.ch().ctrl.modify(|w| dma::ctrl::CHEN.insert(w, 0));
                    }

                    /// Returns `true` if there's a transfer in progress
                    pub fn in_progress(&self) -> bool {
                        dma::flag::fdtf(Self::IDX).read(self.sts()) == 0
                    }

                    pub fn listen(&mut self, event: Event) {
                        match event {
                            Event::HalfTransfer => {
                                self.ch().ctrl.modify(|w| dma::ctrl::HDTIEN.insert(w, 1))
                            }
                            Event::TransferComplete => {
                                self.ch().ctrl.modify(|w| dma::ctrl::FDTIEN.insert(w, 1))
                            }
                        }
                    }

                    pub fn unlisten(&mut self, event: Event) {
                        match event {
                            Event::HalfTransfer => {
                                self.ch().ctrl.modify(|w| dma::ctrl::HDTIEN.insert(w, 0))
                            }
                            Event::TransferComplete => {
                                self.ch().ctrl.modify(|w| dma::ctrl::FDTIEN.insert(w, 0))
                            }
                        }
                    }

                    pub fn sts(&self) -> u32 {
                        // NOTE(unsafe) atomic read with no side effects
                        unsafe { (*DMA1::ptr()).sts.read() }
                    }

                    pub fn clr(&self) -> &RWRegister<u32> {
                        unsafe { &(*DMA1::ptr()).clr }
                    }

                    /// Clears `flag` by writing one to its clear bit
                    pub(crate) fn clear_flag(&self, flag: Field) {
                        self.clr().write(flag.mask());
                    }

                    pub fn get_dtcnt(&self) -> u32 {
                        // NOTE(unsafe) atomic read with no side effects
                        unsafe { &(*DMA1::ptr()) }.channel[Self::IDX as usize]
                            .dtcnt
                            .read()
                    }
                }

                impl<B, PAYLOAD> CircBuffer<B, RxDma<PAYLOAD, $CX>>
                where
                    RxDma<PAYLOAD, $CX>: TransferPayload,
                {
                    /// Peeks into the readable half of the buffer
                    pub fn peek<R, F>(&mut self, f: F) -> Result<R, Error>
                    where
                        F: FnOnce(&B, Half) -> R,
                    {
                        let half_being_read = self.readable_half()?;

                        let buf = match half_being_read {
                            Half::First => &self.buffer[0],
                            Half::Second => &self.buffer[1],
                        };

                        let ret = f(buf, half_being_read);

                        let sts = self.payload.channel.sts();
                        let first_half_is_done = dma::flag::hdtf($CX::IDX).read(sts) != 0;
                        let second_half_is_done = dma::flag::fdtf($CX::IDX).read(sts) != 0;

                        if (half_being_read == Half::First && second_half_is_done)
                            || (half_being_read == Half::Second && first_half_is_done)
                        {
                            Err(Error::Overrun)
                        } else {
                            Ok(ret)
                        }
                    }

                    /// Returns the `Half` of the buffer that can be read
                    pub fn readable_half(&mut self) -> Result<Half, Error> {
                        let sts = self.payload.channel.sts();
                        let first_half_is_done = dma::flag::hdtf($CX::IDX).read(sts) != 0;
                        let second_half_is_done = dma::flag::fdtf($CX::IDX).read(sts) != 0;

                        if first_half_is_done && second_half_is_done {
                            return Err(Error::Overrun);
                        }

                        let last_read_half = self.readable_half;

                        Ok(match last_read_half {
                            Half::First => {
                                if second_half_is_done {
                                    self.payload
                                        .channel
                                        .clear_flag(dma::flag::fdtf($CX::IDX));

                                    self.readable_half = Half::Second;
                                    Half::Second
                                } else {
                                    last_read_half
                                }
                            }
                            Half::Second => {
                                if first_half_is_done {
                                    self.payload
                                        .channel
                                        .clear_flag(dma::flag::hdtf($CX::IDX));

                                    self.readable_half = Half::First;
                                    Half::First
                                } else {
                                    last_read_half
                                }
                            }
                        })
                    }

                    /// Stops the transfer and returns the underlying buffer and RxDma
                    pub fn stop(mut self) -> (&'static mut [B; 2], RxDma<PAYLOAD, $CX>) {
                        self.payload.stop();

                        (self.buffer, self.payload)
                    }
                }

                impl<BUFFER, PAYLOAD, MODE> Transfer<MODE, BUFFER, RxDma<PAYLOAD, $CX>>
                where
                    RxDma<PAYLOAD, $CX>: TransferPayload,
                {
                    pub fn is_done(&self) -> bool {
                        !self.payload.channel.in_progress()
                    }

                    pub fn wait(mut self) -> (BUFFER, RxDma<PAYLOAD, $CX>) {
                        while !self.is_done() {}

                        atomic::compiler_fence(Ordering::Acquire);

                        self.payload.stop();

                        // we need a read here to make the Acquire fence effective
                        // we do *not* need this if `dma.stop` does a RMW operation
                        unsafe {
                            ptr::read_volatile(&0);
                        }

                        // we need a fence here for the same reason we need one in `Transfer.wait`
                        atomic::compiler_fence(Ordering::Acquire);

                        // `Transfer` needs to have a `Drop` implementation, because we accept
                        // managed buffers that can free their memory on drop. Because of that
                        // we can't move out of the `Transfer`'s fields, so we use `ptr::read`
                        // and `mem::forget`.
                        //
                        // NOTE(unsafe) There is no panic branch between getting the resources
                        // and forgetting `self`.
                        unsafe {
                            let buffer = ptr::read(&self.buffer);
                            let payload = ptr::read(&self.payload);
                            mem::forget(self);
                            (buffer, payload)
                        }
                    }
                }

                impl<BUFFER, PAYLOAD> Transfer<W, BUFFER, RxDma<PAYLOAD, $CX>>
                where
                    RxDma<PAYLOAD, $CX>: TransferPayload,
                {
                    pub fn peek<T>(&self) -> &[T]
                    where
                        BUFFER: AsRef<[T]>,
                    {
                        let pending = self.payload.channel.get_dtcnt() as usize;

                        let slice = self.buffer.as_ref();
                        let capacity = slice.len();

                        &slice[..(capacity - pending)]
                    }
                }
            )+

            impl DmaExt for DMA1 {
                type Channels = Channels;

                fn split(self, ahb: &mut AHB) -> Channels {
                    DMA1::enable(ahb);

                    // reset the channel control words (stops all on-going transfers)
                    for ch in self.channel.iter() {
                        ch.ctrl.write(0);
                    }

                    Channels((), $($CX { _0: () }),+)
                }
            }
        }
    }

    dma_channels! {
        C1: 0,
        C2: 1,
        C3: 2,
        C4: 3,
        C5: 4,
        C6: 5,
        C7: 6,
    }
}

/// DMA Receiver
pub struct RxDma<PAYLOAD, RXCH> {
    pub(crate) payload: PAYLOAD,
    pub channel: RXCH,
}

pub trait Receive {
    type RxChannel;
    type TransmittedWord;
}

/// Trait for circular DMA readings from peripheral to memory.
pub trait CircReadDma<B, RS>: Receive
where
    &'static mut [B; 2]: WriteBuffer<Word = RS>,
    B: 'static,
    Self: core::marker::Sized,
{
    fn circ_read(self, buffer: &'static mut [B; 2]) -> CircBuffer<B, Self>;
}

/// Trait for DMA readings from peripheral to memory.
pub trait ReadDma<B, RS>: Receive
where
    B: WriteBuffer<Word = RS>,
    Self: core::marker::Sized + TransferPayload,
{
    fn read(self, buffer: B) -> Transfer<W, B, Self>;
}

#[cfg(test)]
mod tests {
    use crate::pac::dma::flag;

    #[test]
    fn channel_flags_pack_into_nibbles() {
        assert_eq!(flag::gf(0).mask(), 0x0000_0001);
        assert_eq!(flag::fdtf(0).mask(), 0x0000_0002);
        assert_eq!(flag::hdtf(2).mask(), 0x0000_0400);
        assert_eq!(flag::dterrf(6).mask(), 0x0800_0000);
    }
}
