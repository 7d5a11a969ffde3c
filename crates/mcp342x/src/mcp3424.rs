use log::{debug, trace, warn};

use crate::config::{Channel, ControlRegister, ConversionMode, Gain, Resolution};
use crate::error::{Error, RegisterError};
use crate::transport::{Session, Transport};
use crate::{decode, to_voltage, Sample};

/// Status polls issued before a read is abandoned.
pub const POLL_LIMIT: u32 = 1000;

/// MCP3424 driver
///
/// Holds a shadow copy of the device's configuration register. Gain and resolution changes
/// are written through to the device immediately; channel and conversion mode changes reach
/// the device with the next read.
pub struct Mcp3424<T> {
    bus: T,
    address: u8,
    register: ControlRegister,
    channel: Channel,
    resolution: Resolution,
    mode: ConversionMode,
    gain: Gain,
    lsb: f64,
    divisor: f64,
    last_sign_bit: bool,
}

fn check_address(address: u8) -> Result<u8, RegisterError> {
    if address > 0x7F {
        return Err(RegisterError::OutOfRange {
            field: "address",
            value: address,
        });
    }

    Ok(address)
}

impl<T: Transport> Mcp3424<T> {
    /// Creates a new driver for the device at the 7-bit `address`, writing the initial
    /// configuration (gain x1, continuous, channel 1) at the given resolution.
    pub fn new(bus: T, address: u8, resolution: Resolution) -> Result<Self, Error<T::Error>> {
        let address = check_address(address)?;
        let register = ControlRegister::default();

        let mut adc = Self {
            bus,
            address,
            register,
            channel: register.channel(),
            resolution: register.resolution(),
            mode: register.mode(),
            gain: register.gain(),
            lsb: register.resolution().lsb(),
            divisor: register.gain().divisor(),
            last_sign_bit: false,
        };

        adc.set_bit_rate(resolution)?;

        Ok(adc)
    }

    /// Rebind the device address, then apply gain, channel, resolution and mode in that order.
    pub fn set_config_values(
        &mut self,
        address: u8,
        channel: Channel,
        resolution: Resolution,
        gain: Gain,
        mode: ConversionMode,
    ) -> Result<(), Error<T::Error>> {
        self.address = check_address(address)?;
        self.set_pga(gain)?;
        self.set_channel(channel)?;
        self.set_bit_rate(resolution)?;
        self.set_conversion_mode(mode)?;
        Ok(())
    }

    /// Programmable gain amplifier selection. Written to the device immediately.
    pub fn set_pga(&mut self, gain: Gain) -> Result<(), Error<T::Error>> {
        let register = self.register.with_gain(gain)?;
        self.write_register(register)?;

        self.register = register;
        self.gain = gain;
        self.divisor = gain.divisor();

        Ok(())
    }

    /// Sample resolution selection. Written to the device immediately.
    pub fn set_bit_rate(&mut self, resolution: Resolution) -> Result<(), Error<T::Error>> {
        let register = self.register.with_resolution(resolution)?;
        self.write_register(register)?;

        self.register = register;
        self.resolution = resolution;
        self.lsb = resolution.lsb();

        Ok(())
    }

    /// Conversion mode selection. Only the shadow register changes until the next read.
    pub fn set_conversion_mode(&mut self, mode: ConversionMode) -> Result<(), RegisterError> {
        self.register = self.register.with_mode(mode)?;
        self.mode = mode;
        Ok(())
    }

    /// Select the input channel in the shadow register. Returns `false` if it was already selected.
    ///
    /// Nothing is written here; the channel bits reach the device with the next read.
    pub fn set_channel(&mut self, channel: Channel) -> Result<bool, RegisterError> {
        if channel == self.channel {
            return Ok(false);
        }

        self.register = self.register.with_channel(channel)?;
        self.channel = channel;

        Ok(true)
    }

    /// Read a channel and return the raw value at the configured resolution.
    ///
    /// If the device does not report a finished conversion within [`POLL_LIMIT`] polls,
    /// `0` is returned. Use [`Mcp3424::read_sample`] to tell the two apart.
    pub fn read_raw(&mut self, channel: Channel) -> Result<i32, Error<T::Error>> {
        Ok(self.read_sample(channel)?.map_or(0, |sample| sample.raw))
    }

    /// Read a channel and return its voltage.
    pub fn read_voltage(&mut self, channel: Channel) -> Result<f64, Error<T::Error>> {
        let raw = self.read_raw(channel)?;
        Ok(to_voltage(raw, self.last_sign_bit, self.lsb, self.divisor))
    }

    /// Read a channel, returning `None` if the conversion did not finish within [`POLL_LIMIT`] polls.
    pub fn read_sample(&mut self, channel: Channel) -> Result<Option<Sample>, Error<T::Error>> {
        self.last_sign_bit = false;
        self.set_channel(channel)?;
        self.check_shadow()?;

        let address = self.address;
        let resolution = self.resolution;
        let mut selector = self.register;

        let mut session = Session::open(&mut self.bus).map_err(Error::Transport)?;

        if let ConversionMode::OneShot = self.mode {
            let trigger = selector.with_ready(true)?;
            debug!("triggering conversion on channel {}", channel.number());
            session
                .write(address, trigger.bits())
                .map_err(Error::Transport)?;

            // The device clears its ready bit itself; don't retrigger while polling.
            selector = trigger.with_ready(false)?;
        }

        let mut buffer = [0u8; 4];
        let buffer = &mut buffer[..resolution.read_len()];
        let mut polls = 0;

        loop {
            session
                .read(address, selector.bits(), buffer)
                .map_err(Error::Transport)?;
            polls += 1;

            let status = ControlRegister::from_bits(buffer[buffer.len() - 1]);
            if !status.ready() {
                break;
            }

            if polls >= POLL_LIMIT {
                warn!(
                    "channel {} not ready after {} polls, reading as 0",
                    channel.number(),
                    polls
                );
                return Ok(None);
            }
        }

        drop(session);
        trace!("conversion ready after {polls} polls: {buffer:02x?}");

        let sample = decode(resolution, buffer);
        self.last_sign_bit = sample.sign;

        Ok(Some(sample))
    }

    /// Give back the bus
    pub fn release(self) -> T {
        self.bus
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn register(&self) -> ControlRegister {
        self.register
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn gain(&self) -> Gain {
        self.gain
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn conversion_mode(&self) -> ConversionMode {
        self.mode
    }

    /// Volts per raw count at the current resolution, before gain division.
    pub fn lsb(&self) -> f64 {
        self.lsb
    }

    pub fn gain_divisor(&self) -> f64 {
        self.divisor
    }

    /// Whether the sign bit was set in the most recent read.
    pub fn last_sign_bit(&self) -> bool {
        self.last_sign_bit
    }

    fn write_register(&mut self, register: ControlRegister) -> Result<(), Error<T::Error>> {
        debug!(
            "writing config {:#010b} to device {:#04x}",
            register.bits(),
            self.address
        );

        let mut session = Session::open(&mut self.bus).map_err(Error::Transport)?;
        session
            .write(self.address, register.bits())
            .map_err(Error::Transport)
    }

    fn check_shadow(&self) -> Result<(), RegisterError> {
        let register = self.register;

        if register.channel() != self.channel
            || register.resolution() != self.resolution
            || register.gain() != self.gain
            || register.mode() != self.mode
        {
            return Err(RegisterError::InvalidState {
                register: register.bits(),
            });
        }

        Ok(())
    }
}
