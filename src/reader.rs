//! Sampling options shared by the binaries, and the loop that reads the device.

use std::thread;
use std::time::Duration;

use clap::Args;
use log::{info, warn};
use mcp342x::{Channel, ConversionMode, Gain, Mcp3424, Resolution, Transport};

#[derive(Args, Debug, Clone)]
pub struct Sampling {
    /// Channels to read, 1 to 4
    #[arg(
        short,
        long,
        env = "MCP3424_CHANNELS",
        value_delimiter = ',',
        default_values_t = vec![1u8, 2, 3, 4]
    )]
    pub channels: Vec<u8>,

    /// Resolution in bits: 12, 14, 16 or 18
    #[arg(short, long, env = "MCP3424_BITRATE", default_value_t = 18)]
    pub bitrate: u8,

    /// Amplifier gain: 1, 2, 4 or 8
    #[arg(short, long, env = "MCP3424_GAIN", default_value_t = 1)]
    pub gain: u8,

    /// Conversion mode: 0 = one-shot, 1 = continuous
    #[arg(short, long, env = "MCP3424_MODE", default_value_t = 1)]
    pub mode: u8,

    /// Rounds over all channels before exiting, 0 to run forever
    #[arg(short = 'n', long, env = "MCP3424_COUNT", default_value_t = 0)]
    pub count: u64,

    /// Pause between rounds in milliseconds
    #[arg(short, long, env = "MCP3424_INTERVAL_MS", default_value_t = 500)]
    pub interval_ms: u64,
}

/// Validated [`Sampling`].
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub channels: Vec<Channel>,
    pub resolution: Resolution,
    pub gain: Gain,
    pub mode: ConversionMode,
    pub rounds: Option<u64>,
    pub interval: Duration,
}

impl Sampling {
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let channels = self
            .channels
            .iter()
            .map(|&channel| Channel::try_from(channel))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Settings {
            channels,
            resolution: Resolution::try_from(self.bitrate)?,
            gain: Gain::try_from(self.gain)?,
            mode: ConversionMode::try_from(self.mode)?,
            rounds: (self.count > 0).then_some(self.count),
            interval: Duration::from_millis(self.interval_ms),
        })
    }
}

/// Apply `settings` to an already constructed driver and log readings until the rounds run out.
pub fn run<T>(adc: &mut Mcp3424<T>, settings: &Settings) -> anyhow::Result<()>
where
    T: Transport,
    T::Error: Send + Sync + 'static,
{
    adc.set_pga(settings.gain)?;
    adc.set_conversion_mode(settings.mode)?;

    info!(
        "sampling {:?} at {} bit, gain x{}, {:?} mode",
        settings.channels,
        adc.resolution().bits(),
        adc.gain().number(),
        adc.conversion_mode()
    );

    let mut round = 0;

    while settings.rounds.map_or(true, |rounds| round < rounds) {
        for &channel in &settings.channels {
            match adc.read_sample(channel)? {
                Some(sample) => info!(
                    "channel {}: {:.6} V (raw {})",
                    channel.number(),
                    sample.voltage(adc.resolution(), adc.gain()),
                    sample.raw
                ),
                None => warn!("channel {}: conversion timed out", channel.number()),
            }
        }

        round += 1;
        thread::sleep(settings.interval);
    }

    Ok(())
}
