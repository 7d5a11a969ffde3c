//! Provides a driver for a Microchip MCP3424 4-channel delta-sigma ADC over I2C.
//!
//! The driver talks to the bus through the narrow [`Transport`] trait. With the `hal` feature
//! (on by default) any `embedded-hal` I2C bus can be used through [`HalBus`].

#![cfg_attr(not(test), no_std)]
#![forbid(unsafe_code)]

pub mod config;
mod error;
#[cfg(feature = "hal")]
pub mod hal;
mod mcp3424;
pub mod transport;

pub use config::{Channel, ControlRegister, ConversionMode, Gain, Resolution};
pub use error::{Error, RegisterError};
#[cfg(feature = "hal")]
pub use hal::HalBus;
pub use mcp3424::{Mcp3424, POLL_LIMIT};
pub use transport::Transport;

/// Full scale reference voltage of the device.
const REFERENCE_VOLTAGE: f64 = 2.048;

/// A decoded conversion result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    /// Data bits at the configured resolution, with the sign bit cleared.
    pub raw: i32,
    /// Whether the sign bit was set.
    pub sign: bool,
}

impl Sample {
    /// Convert to volts for the resolution and gain the sample was taken with.
    pub fn voltage(&self, resolution: Resolution, gain: Gain) -> f64 {
        to_voltage(self.raw, self.sign, resolution.lsb(), gain.divisor())
    }
}

/// Samples with the sign bit set are treated as near-zero noise and offset by half the
/// reference range rather than read as two's complement.
pub(crate) fn to_voltage(raw: i32, sign: bool, lsb: f64, divisor: f64) -> f64 {
    let volts = f64::from(raw) * (lsb / divisor);

    if sign {
        volts - REFERENCE_VOLTAGE / (divisor * 2.0)
    } else {
        volts
    }
}

/// Internal method for combining the data bytes returned by the device.
/// `bytes` must hold the data bytes for `resolution`; anything after them is ignored.
pub(crate) fn decode(resolution: Resolution, bytes: &[u8]) -> Sample {
    let high = i32::from(bytes[0]);
    let middle = i32::from(bytes[1]);

    let raw = match resolution {
        Resolution::Bits18 => ((high & 0b11) << 16) | (middle << 8) | i32::from(bytes[2]),
        Resolution::Bits16 => (high << 8) | middle,
        Resolution::Bits14 => ((high & 0b0011_1111) << 8) | middle,
        Resolution::Bits12 => ((high & 0b0000_1111) << 8) | middle,
    };

    let sign = 1 << resolution.sign_bit();

    Sample {
        raw: raw & !sign,
        sign: raw & sign != 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_volts(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected} V, got {actual} V"
        );
    }

    #[test]
    fn decode_without_sign() {
        let cases = [
            (Resolution::Bits18, [0x01, 0x86, 0xA0], 100_000),
            (Resolution::Bits18, [0xFD, 0xFF, 0xFF], 0x1_FFFF),
            (Resolution::Bits16, [0x7F, 0xFF, 0x00], 0x7FFF),
            (Resolution::Bits14, [0xDF, 0x42, 0x00], 0x1F42),
            (Resolution::Bits12, [0xF7, 0x42, 0x00], 0x742),
        ];

        for (resolution, bytes, raw) in cases {
            let sample = decode(resolution, &bytes);
            assert_eq!(sample, Sample { raw, sign: false }, "{resolution:?}");
        }
    }

    #[test]
    fn decode_clears_sign_bit() {
        let cases = [
            (Resolution::Bits18, [0x02, 0x00, 0x00], 0),
            (Resolution::Bits18, [0x03, 0x00, 0x05], 0x1_0005),
            (Resolution::Bits16, [0x80, 0x01, 0x00], 1),
            (Resolution::Bits14, [0xFF, 0x10, 0x00], 0x1F10),
            (Resolution::Bits12, [0xF9, 0x23, 0x00], 0x123),
        ];

        for (resolution, bytes, raw) in cases {
            let sample = decode(resolution, &bytes);
            assert_eq!(sample, Sample { raw, sign: true }, "{resolution:?}");
        }
    }

    #[test]
    fn voltage_of_positive_sample() {
        let sample = Sample {
            raw: 100_000,
            sign: false,
        };

        assert_volts(sample.voltage(Resolution::Bits18, Gain::X1), 1.5625);
        assert_volts(sample.voltage(Resolution::Bits18, Gain::X8), 0.1953125);
    }

    #[test]
    fn voltage_of_signed_sample_is_offset() {
        let sample = Sample { raw: 0, sign: true };
        assert_volts(sample.voltage(Resolution::Bits18, Gain::X1), -2.048);

        let sample = Sample { raw: 2048, sign: true };
        assert_volts(sample.voltage(Resolution::Bits12, Gain::X2), 0.0);
    }
}
