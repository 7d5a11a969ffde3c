//! Control register layout and the closed set of values that can be encoded into it.
//!
//! The MCP342x has a single 8-bit configuration register:
//!
//! | Bit | 7     | 6 - 5   | 4    | 3 - 2      | 1 - 0 |
//! | --- | :---: | :-----: | :--: | :--------: | :---: |
//! |     | RDY   | Channel | Mode | Resolution | Gain  |

use crate::error::RegisterError;

const GAIN_FIELD: u8 = 0;
const RESOLUTION_FIELD: u8 = 2;
const MODE_BIT: u8 = 4;
const CHANNEL_FIELD: u8 = 5;
const READY_BIT: u8 = 7;

/// Register value after power-on: ready bit set, continuous, 18 bit, gain x1, channel 1.
pub const DEFAULT_REGISTER: u8 = 0b1001_1100;

/// Sets (`value == 1`) or clears (`value == 0`) the bit at `position` within `byte`.
///
/// Any other `value`, or a `position` past bit 7, is rejected rather than silently mis-encoded.
pub fn update_bit(byte: u8, position: u8, value: u8) -> Result<u8, RegisterError> {
    if position > 7 {
        return Err(RegisterError::InvalidArgument { position, value });
    }

    match value {
        0 => Ok(byte & !(1 << position)),
        1 => Ok(byte | (1 << position)),
        _ => Err(RegisterError::InvalidArgument { position, value }),
    }
}

/// Writes a 2 bit field whose low bit sits at `low`.
fn update_field(byte: u8, low: u8, field: u8) -> Result<u8, RegisterError> {
    let byte = update_bit(byte, low, field & 1)?;
    update_bit(byte, low + 1, (field >> 1) & 1)
}

fn field(byte: u8, low: u8) -> u8 {
    (byte >> low) & 0b11
}

/// Input channel of an MCP3424.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Channel {
    One = 1,
    Two = 2,
    Three = 3,
    Four = 4,
}

impl Channel {
    /// Iterate over all channels.
    pub fn all() -> impl Iterator<Item = Self> {
        [Self::One, Self::Two, Self::Three, Self::Four].into_iter()
    }

    /// Channel number as printed on the datasheet, 1 to 4.
    pub fn number(self) -> u8 {
        self as u8
    }

    fn field(self) -> u8 {
        self as u8 - 1
    }

    fn from_field(field: u8) -> Self {
        match field {
            0 => Self::One,
            1 => Self::Two,
            2 => Self::Three,
            _ => Self::Four,
        }
    }
}

impl TryFrom<u8> for Channel {
    type Error = RegisterError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            3 => Ok(Self::Three),
            4 => Ok(Self::Four),
            _ => Err(RegisterError::OutOfRange { field: "channel", value }),
        }
    }
}

/// Programmable gain amplifier setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Gain {
    X1 = 1,
    X2 = 2,
    X4 = 4,
    X8 = 8,
}

impl Gain {
    pub fn number(self) -> u8 {
        self as u8
    }

    /// Denominator applied to the LSB voltage for this gain.
    ///
    /// Note this is half the amplifier gain, not the gain itself.
    pub fn divisor(self) -> f64 {
        match self {
            Self::X1 => 0.5,
            Self::X2 => 1.0,
            Self::X4 => 2.0,
            Self::X8 => 4.0,
        }
    }

    fn field(self) -> u8 {
        match self {
            Self::X1 => 0b00,
            Self::X2 => 0b01,
            Self::X4 => 0b10,
            Self::X8 => 0b11,
        }
    }

    fn from_field(field: u8) -> Self {
        match field {
            0b00 => Self::X1,
            0b01 => Self::X2,
            0b10 => Self::X4,
            _ => Self::X8,
        }
    }
}

impl TryFrom<u8> for Gain {
    type Error = RegisterError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::X1),
            2 => Ok(Self::X2),
            4 => Ok(Self::X4),
            8 => Ok(Self::X8),
            _ => Err(RegisterError::OutOfRange { field: "gain", value }),
        }
    }
}

/// Sample resolution. Higher resolutions convert more slowly:
/// 12 bit (240 SPS), 14 bit (60 SPS), 16 bit (15 SPS), 18 bit (3.75 SPS).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Resolution {
    Bits12 = 12,
    Bits14 = 14,
    Bits16 = 16,
    Bits18 = 18,
}

impl Resolution {
    pub fn bits(self) -> u8 {
        self as u8
    }

    /// Volts per raw count, before gain division.
    pub fn lsb(self) -> f64 {
        match self {
            Self::Bits12 => 0.0005,
            Self::Bits14 => 0.000125,
            Self::Bits16 => 0.00003125,
            Self::Bits18 => 0.0000078125,
        }
    }

    /// Position of the sign bit within the composed raw value.
    pub fn sign_bit(self) -> u8 {
        self as u8 - 1
    }

    /// Bytes returned by the device per read: data bytes followed by the status byte.
    pub fn read_len(self) -> usize {
        match self {
            Self::Bits18 => 4,
            _ => 3,
        }
    }

    fn field(self) -> u8 {
        match self {
            Self::Bits12 => 0b00,
            Self::Bits14 => 0b01,
            Self::Bits16 => 0b10,
            Self::Bits18 => 0b11,
        }
    }

    fn from_field(field: u8) -> Self {
        match field {
            0b00 => Self::Bits12,
            0b01 => Self::Bits14,
            0b10 => Self::Bits16,
            _ => Self::Bits18,
        }
    }
}

impl TryFrom<u8> for Resolution {
    type Error = RegisterError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            12 => Ok(Self::Bits12),
            14 => Ok(Self::Bits14),
            16 => Ok(Self::Bits16),
            18 => Ok(Self::Bits18),
            _ => Err(RegisterError::OutOfRange { field: "bitrate", value }),
        }
    }
}

/// Conversion triggering policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ConversionMode {
    /// A conversion is started by writing the ready bit before each read.
    OneShot = 0,
    /// The device free-runs and the latest result is polled.
    Continuous = 1,
}

impl TryFrom<u8> for ConversionMode {
    type Error = RegisterError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::OneShot),
            1 => Ok(Self::Continuous),
            _ => Err(RegisterError::OutOfRange { field: "conversion mode", value }),
        }
    }
}

/// Shadow copy of the device configuration register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlRegister(u8);

impl Default for ControlRegister {
    fn default() -> Self {
        Self(DEFAULT_REGISTER)
    }
}

impl ControlRegister {
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub fn with_channel(self, channel: Channel) -> Result<Self, RegisterError> {
        update_field(self.0, CHANNEL_FIELD, channel.field()).map(Self)
    }

    pub fn with_gain(self, gain: Gain) -> Result<Self, RegisterError> {
        update_field(self.0, GAIN_FIELD, gain.field()).map(Self)
    }

    pub fn with_resolution(self, resolution: Resolution) -> Result<Self, RegisterError> {
        update_field(self.0, RESOLUTION_FIELD, resolution.field()).map(Self)
    }

    pub fn with_mode(self, mode: ConversionMode) -> Result<Self, RegisterError> {
        update_bit(self.0, MODE_BIT, mode as u8).map(Self)
    }

    /// Sets or clears the ready/trigger bit.
    pub fn with_ready(self, ready: bool) -> Result<Self, RegisterError> {
        update_bit(self.0, READY_BIT, u8::from(ready)).map(Self)
    }

    pub fn channel(self) -> Channel {
        Channel::from_field(field(self.0, CHANNEL_FIELD))
    }

    pub fn gain(self) -> Gain {
        Gain::from_field(field(self.0, GAIN_FIELD))
    }

    pub fn resolution(self) -> Resolution {
        Resolution::from_field(field(self.0, RESOLUTION_FIELD))
    }

    pub fn mode(self) -> ConversionMode {
        if self.0 & (1 << MODE_BIT) == 0 {
            ConversionMode::OneShot
        } else {
            ConversionMode::Continuous
        }
    }

    /// In a status byte read back from the device, `true` means a conversion is still in progress.
    pub fn ready(self) -> bool {
        self.0 & (1 << READY_BIT) != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_bit_sets_and_clears() {
        assert_eq!(update_bit(0b0000_0000, 3, 1), Ok(0b0000_1000));
        assert_eq!(update_bit(0b1111_1111, 0, 0), Ok(0b1111_1110));
        assert_eq!(update_bit(0b1000_0000, 7, 1), Ok(0b1000_0000));
    }

    #[test]
    fn update_bit_rejects_non_binary_values() {
        assert_eq!(
            update_bit(0, 2, 2),
            Err(RegisterError::InvalidArgument { position: 2, value: 2 })
        );
        assert_eq!(
            update_bit(0, 8, 1),
            Err(RegisterError::InvalidArgument { position: 8, value: 1 })
        );
    }

    #[test]
    fn gain_encoding() {
        let cases = [
            (1, 0b00, 0.5),
            (2, 0b01, 1.0),
            (4, 0b10, 2.0),
            (8, 0b11, 4.0),
        ];

        for (number, bits, divisor) in cases {
            let gain = Gain::try_from(number).unwrap();
            let register = ControlRegister::default().with_gain(gain).unwrap();

            assert_eq!(register.bits() & 0b11, bits, "gain x{number}");
            assert_eq!(register.bits() & !0b11, DEFAULT_REGISTER & !0b11);
            assert_eq!(register.gain(), gain);
            assert_eq!(gain.divisor(), divisor);
        }
    }

    #[test]
    fn resolution_encoding() {
        let cases = [
            (12, 0b00, 0.0005),
            (14, 0b01, 0.000125),
            (16, 0b10, 0.00003125),
            (18, 0b11, 0.0000078125),
        ];

        for (number, bits, lsb) in cases {
            let resolution = Resolution::try_from(number).unwrap();
            let register = ControlRegister::default().with_resolution(resolution).unwrap();

            assert_eq!((register.bits() >> 2) & 0b11, bits, "{number} bit");
            assert_eq!(register.resolution(), resolution);
            assert_eq!(resolution.lsb(), lsb);
        }

        assert_eq!(Resolution::Bits18.read_len(), 4);
        assert_eq!(Resolution::Bits12.read_len(), 3);
        assert_eq!(Resolution::Bits14.sign_bit(), 13);
    }

    #[test]
    fn channel_encoding() {
        let cases = [(1, 0b00), (2, 0b01), (3, 0b10), (4, 0b11)];

        for (number, bits) in cases {
            let channel = Channel::try_from(number).unwrap();
            let register = ControlRegister::default().with_channel(channel).unwrap();

            assert_eq!((register.bits() >> 5) & 0b11, bits, "channel {number}");
            assert_eq!(register.channel(), channel);
            assert_eq!(channel.number(), number);
        }

        assert_eq!(Channel::all().count(), 4);
    }

    #[test]
    fn mode_and_ready_bits() {
        let register = ControlRegister::default()
            .with_mode(ConversionMode::OneShot)
            .unwrap();
        assert_eq!(register.bits(), 0b1000_1100);
        assert_eq!(register.mode(), ConversionMode::OneShot);

        let register = register.with_ready(false).unwrap();
        assert_eq!(register.bits(), 0b0000_1100);
        assert!(!register.ready());
    }

    #[test]
    fn default_register() {
        let register = ControlRegister::default();

        assert_eq!(register.channel(), Channel::One);
        assert_eq!(register.gain(), Gain::X1);
        assert_eq!(register.resolution(), Resolution::Bits18);
        assert_eq!(register.mode(), ConversionMode::Continuous);
        assert!(register.ready());
    }

    #[test]
    fn rejects_values_outside_enumerations() {
        assert_eq!(
            Channel::try_from(0),
            Err(RegisterError::OutOfRange { field: "channel", value: 0 })
        );
        assert_eq!(
            Channel::try_from(5),
            Err(RegisterError::OutOfRange { field: "channel", value: 5 })
        );
        assert!(Gain::try_from(3).is_err());
        assert!(Gain::try_from(16).is_err());
        assert!(Resolution::try_from(10).is_err());
        assert!(Resolution::try_from(17).is_err());
        assert!(ConversionMode::try_from(2).is_err());
    }
}
