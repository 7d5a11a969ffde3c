//! [`Transport`] over the Linux I2C character device, via `rppal`.

use log::trace;
use mcp342x::Transport;
use rppal::i2c::I2c;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PiBusError {
    #[error(transparent)]
    I2c(#[from] rppal::i2c::Error),
    #[error("I2C bus used while closed")]
    Closed,
    #[error("short transfer: {actual} of {expected} bytes")]
    Short { expected: usize, actual: usize },
}

/// Opens `/dev/i2c-N` for each session and closes it again afterwards.
pub struct PiBus {
    bus: u8,
    i2c: Option<I2c>,
}

impl PiBus {
    pub fn new(bus: u8) -> Self {
        Self { bus, i2c: None }
    }

    fn addressed(&mut self, address: u8) -> Result<&mut I2c, PiBusError> {
        let i2c = self.i2c.as_mut().ok_or(PiBusError::Closed)?;
        i2c.set_slave_address(u16::from(address))?;
        Ok(i2c)
    }
}

fn complete(expected: usize, actual: usize) -> Result<(), PiBusError> {
    if actual == expected {
        Ok(())
    } else {
        Err(PiBusError::Short { expected, actual })
    }
}

impl Transport for PiBus {
    type Error = PiBusError;

    fn open(&mut self) -> Result<(), Self::Error> {
        trace!("opening /dev/i2c-{}", self.bus);
        self.i2c = Some(I2c::with_bus(self.bus)?);
        Ok(())
    }

    fn close(&mut self) {
        // Dropping the handle closes the device file.
        self.i2c = None;
    }

    fn write(&mut self, address: u8, value: u8) -> Result<(), Self::Error> {
        let written = self.addressed(address)?.write(&[value])?;
        complete(1, written)
    }

    fn read(&mut self, address: u8, register: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
        let i2c = self.addressed(address)?;
        complete(1, i2c.write(&[register])?)?;
        complete(buffer.len(), i2c.read(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfers_need_an_open_bus() {
        let mut bus = PiBus::new(1);

        assert!(matches!(bus.write(0x68, 0x9C), Err(PiBusError::Closed)));
        assert!(matches!(
            bus.read(0x68, 0x9C, &mut [0; 4]),
            Err(PiBusError::Closed)
        ));
    }

    #[test]
    fn short_transfers_are_errors() {
        assert!(complete(4, 4).is_ok());
        assert!(matches!(
            complete(4, 3),
            Err(PiBusError::Short {
                expected: 4,
                actual: 3
            })
        ));
    }
}
