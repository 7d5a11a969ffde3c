//! The narrow bus interface the driver talks through.

use core::fmt::Debug;

/// Byte-level access to a peripheral on a two-wire bus.
///
/// `open` and `close` bracket every batch of transfers the driver issues. Buses that
/// stay open for their whole lifetime can leave both as the default no-op.
pub trait Transport {
    type Error: Debug;

    /// Acquire the bus.
    fn open(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Release the bus. Called exactly once for every successful [`Transport::open`].
    fn close(&mut self) {}

    /// Write a single byte to the peripheral at `address`.
    fn write(&mut self, address: u8, value: u8) -> Result<(), Self::Error>;

    /// Write `register` to the peripheral at `address`, then read `buffer.len()` bytes back.
    fn read(&mut self, address: u8, register: u8, buffer: &mut [u8]) -> Result<(), Self::Error>;
}

/// An open bus, closed again when dropped.
pub struct Session<'a, T: Transport> {
    bus: &'a mut T,
}

impl<'a, T: Transport> Session<'a, T> {
    /// Opens `bus`. If opening fails there is nothing to close.
    pub fn open(bus: &'a mut T) -> Result<Self, T::Error> {
        bus.open()?;
        Ok(Self { bus })
    }

    pub fn write(&mut self, address: u8, value: u8) -> Result<(), T::Error> {
        self.bus.write(address, value)
    }

    pub fn read(&mut self, address: u8, register: u8, buffer: &mut [u8]) -> Result<(), T::Error> {
        self.bus.read(address, register, buffer)
    }
}

impl<T: Transport> Drop for Session<'_, T> {
    fn drop(&mut self) {
        self.bus.close();
    }
}
