//! A software MCP3424 for running the reader without hardware.

use std::time::Instant;

use log::trace;
use mcp342x::{Channel, ControlRegister, ConversionMode, Resolution, Transport};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SimulatorError {
    #[error("no device acknowledged address {0:#04x}")]
    Nack(u8),
}

/// Responds like an MCP3424 at a single address. Each channel sees the voltage produced by
/// the signal function, evaluated at the seconds elapsed since the device was created.
pub struct SimulatedAdc {
    address: u8,
    config: ControlRegister,
    latency: u32,
    pending: u32,
    signal: fn(Channel, f64) -> f64,
    started: Instant,
}

/// A slow sine per channel, with amplitude and frequency rising with the channel number.
fn sine(channel: Channel, seconds: f64) -> f64 {
    let n = f64::from(channel.number());
    0.25 * n * (seconds * n).sin()
}

impl SimulatedAdc {
    /// `latency` is the number of status polls a one-shot conversion stays busy for.
    pub fn new(address: u8, latency: u32) -> Self {
        Self {
            address,
            config: ControlRegister::default(),
            latency,
            pending: 0,
            signal: sine,
            started: Instant::now(),
        }
    }

    pub fn with_signal(mut self, signal: fn(Channel, f64) -> f64) -> Self {
        self.signal = signal;
        self
    }

    fn acknowledge(&self, address: u8) -> Result<(), SimulatorError> {
        if address == self.address {
            Ok(())
        } else {
            Err(SimulatorError::Nack(address))
        }
    }

    fn configure(&mut self, value: u8) {
        let config = ControlRegister::from_bits(value);

        if config.mode() == ConversionMode::OneShot && config.ready() {
            trace!("simulated conversion started on channel {}", config.channel().number());
            self.pending = self.latency;
        }

        self.config = config;
    }

    /// Output register contents: data bytes in two's complement, then the status byte.
    fn output(&mut self) -> [u8; 4] {
        let busy = self.pending > 0;
        self.pending = self.pending.saturating_sub(1);

        let status = (self.config.bits() & 0b0111_1111) | if busy { 0b1000_0000 } else { 0 };

        let resolution = self.config.resolution();
        let lsb = resolution.lsb() / self.config.gain().divisor();
        let limit = 1i32 << resolution.sign_bit();

        let volts = (self.signal)(self.config.channel(), self.started.elapsed().as_secs_f64());
        let code = ((volts / lsb).round() as i32).clamp(-limit, limit - 1);
        let [_, upper, high, low] = code.to_be_bytes();

        match resolution {
            Resolution::Bits18 => [upper, high, low, status],
            _ => [high, low, status, status],
        }
    }
}

impl Transport for SimulatedAdc {
    type Error = SimulatorError;

    fn write(&mut self, address: u8, value: u8) -> Result<(), Self::Error> {
        self.acknowledge(address)?;
        self.configure(value);
        Ok(())
    }

    fn read(&mut self, address: u8, register: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
        self.acknowledge(address)?;
        self.configure(register);

        let output = self.output();
        let len = buffer.len().min(output.len());
        buffer[..len].copy_from_slice(&output[..len]);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcp342x::{Gain, Mcp3424, POLL_LIMIT};

    const ADDRESS: u8 = 0x68;

    fn assert_near(actual: f64, expected: f64, tolerance: f64) {
        assert!(
            (actual - expected).abs() <= tolerance,
            "expected {expected} V, got {actual} V"
        );
    }

    #[test]
    fn reads_back_channel_voltages() {
        let device = SimulatedAdc::new(ADDRESS, 0).with_signal(|channel, _| {
            0.1 * f64::from(channel.number())
        });
        let mut adc = Mcp3424::new(device, ADDRESS, Resolution::Bits18).unwrap();

        for channel in Channel::all() {
            let expected = 0.1 * f64::from(channel.number());
            assert_near(adc.read_voltage(channel).unwrap(), expected, 1e-5);
        }
    }

    #[test]
    fn negative_input_survives_sign_handling() {
        let device = SimulatedAdc::new(ADDRESS, 0).with_signal(|_, _| -0.5);
        let mut adc = Mcp3424::new(device, ADDRESS, Resolution::Bits18).unwrap();

        assert_near(adc.read_voltage(Channel::One).unwrap(), -0.5, 1e-5);
        assert!(adc.last_sign_bit());

        adc.set_bit_rate(Resolution::Bits12).unwrap();
        adc.set_pga(Gain::X2).unwrap();
        assert_near(adc.read_voltage(Channel::Three).unwrap(), -0.5, 1e-3);
    }

    #[test]
    fn one_shot_waits_for_conversion() {
        let device = SimulatedAdc::new(ADDRESS, 5).with_signal(|_, _| 1.0);
        let mut adc = Mcp3424::new(device, ADDRESS, Resolution::Bits16).unwrap();
        adc.set_conversion_mode(ConversionMode::OneShot).unwrap();

        assert_near(adc.read_voltage(Channel::Two).unwrap(), 1.0, 1e-4);
    }

    #[test]
    fn slow_conversion_times_out() {
        let device = SimulatedAdc::new(ADDRESS, POLL_LIMIT + 1).with_signal(|_, _| 1.0);
        let mut adc = Mcp3424::new(device, ADDRESS, Resolution::Bits12).unwrap();
        adc.set_conversion_mode(ConversionMode::OneShot).unwrap();

        assert_eq!(adc.read_sample(Channel::One), Ok(None));
        assert_eq!(adc.read_raw(Channel::One), Ok(0));
    }

    #[test]
    fn wrong_address_is_not_acknowledged() {
        let device = SimulatedAdc::new(ADDRESS, 0);

        assert!(matches!(
            Mcp3424::new(device, 0x69, Resolution::Bits18),
            Err(mcp342x::Error::Transport(SimulatorError::Nack(0x69)))
        ));
    }
}
