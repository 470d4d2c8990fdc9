//! Non-blocking serial transport
//!
//! The link engine is polled once per scheduling cycle and must never wait
//! on the wire. A [`ComPort`] therefore reports "nothing right now" as
//! `Ok(0)` instead of blocking, in both directions.

use embedded_io::{ErrorType, Read, ReadReady, Write, WriteReady};

/// Byte transport used by the link engine
pub trait ComPort {
    /// Error type for transport operations
    type Error;

    /// Read whatever is available, up to `buf.len()` bytes
    ///
    /// Returns `Ok(0)` when no data is currently available.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Write as many bytes of `data` as the transport accepts right now
    ///
    /// May accept fewer bytes than offered, including zero.
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;
}

impl<T: ComPort + ?Sized> ComPort for &mut T {
    type Error = T::Error;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        T::read(self, buf)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        T::write(self, data)
    }
}

/// Adapter for a full-duplex `embedded-io` device
///
/// Readiness is checked before every transfer so that the underlying
/// blocking `read`/`write` calls never wait.
pub struct IoPort<T> {
    inner: T,
}

impl<T> IoPort<T> {
    /// Wrap a device
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Get a reference to the wrapped device
    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Get a mutable reference to the wrapped device
    pub fn inner_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Unwrap the device
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T> ComPort for IoPort<T>
where
    T: Read + ReadReady + Write + WriteReady,
{
    type Error = <T as ErrorType>::Error;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() || !self.inner.read_ready()? {
            return Ok(0);
        }
        self.inner.read(buf)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        if data.is_empty() || !self.inner.write_ready()? {
            return Ok(0);
        }
        self.inner.write(data)
    }
}

/// Error from a [`SplitPort`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ComError<R, W> {
    /// Receive half failed
    Rx(R),
    /// Transmit half failed
    Tx(W),
}

/// Adapter for a device split into separate RX and TX halves
///
/// Only the receive half is readiness-checked; the transmit half only needs
/// plain `Write`. A buffered transmit half's `write` returns as soon as any
/// bytes fit in its queue but waits while the queue is full. The caller
/// must keep the queue from filling by writing no faster than the line
/// drains it, for example by capping the engine's drain chunk at
/// [`UartConfig::bytes_per_interval`](crate::UartConfig::bytes_per_interval)
/// for its cycle period.
pub struct SplitPort<R, W> {
    rx: R,
    tx: W,
}

impl<R, W> SplitPort<R, W> {
    /// Combine two halves into one port
    pub fn new(rx: R, tx: W) -> Self {
        Self { rx, tx }
    }

    /// Split back into the two halves
    pub fn into_parts(self) -> (R, W) {
        (self.rx, self.tx)
    }
}

impl<R, W> ComPort for SplitPort<R, W>
where
    R: Read + ReadReady,
    W: Write,
{
    type Error = ComError<R::Error, W::Error>;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() || !self.rx.read_ready().map_err(ComError::Rx)? {
            return Ok(0);
        }
        self.rx.read(buf).map_err(ComError::Rx)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        if data.is_empty() {
            return Ok(0);
        }
        self.tx.write(data).map_err(ComError::Tx)
    }
}
