//! [`Transport`] over any `embedded-hal` I2C bus.

use embedded_hal::i2c::I2c;

use crate::transport::Transport;

/// Wraps an [`I2c`] implementation, which is already open for as long as it is owned.
pub struct HalBus<I2C> {
    i2c: I2C,
}

impl<I2C: I2c> HalBus<I2C> {
    pub fn new(i2c: I2C) -> Self {
        i2c.into()
    }

    /// Give back the I2C bus
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c> From<I2C> for HalBus<I2C> {
    fn from(i2c: I2C) -> Self {
        Self { i2c }
    }
}

impl<I2C: I2c> Transport for HalBus<I2C> {
    type Error = I2C::Error;

    fn write(&mut self, address: u8, value: u8) -> Result<(), Self::Error> {
        self.i2c.write(address, &[value])
    }

    fn read(&mut self, address: u8, register: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
        // Writing the selector byte rewrites the configuration register on this device family.
        self.i2c.write(address, &[register])?;
        self.i2c.read(address, buffer)
    }
}
