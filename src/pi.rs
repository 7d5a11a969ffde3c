//! Sample an MCP3424 on a Raspberry Pi I2C bus.

mod raspberry_pi;
mod reader;

use std::num::ParseIntError;

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::info;
use mcp342x::Mcp3424;

use raspberry_pi::PiBus;
use reader::Sampling;

#[derive(Parser, Debug)]
#[command(about = "Sample an MCP3424 over the Raspberry Pi I2C bus")]
struct Cli {
    /// I2C bus number, as in /dev/i2c-N
    #[arg(long, env = "MCP3424_BUS", default_value_t = 1)]
    bus: u8,

    /// 7-bit device address, decimal or 0x-prefixed hex
    #[arg(short, long, env = "MCP3424_ADDRESS", default_value = "0x68", value_parser = parse_address)]
    address: u8,

    #[command(flatten)]
    sampling: Sampling,
}

fn parse_address(text: &str) -> Result<u8, ParseIntError> {
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => text.parse(),
    }
}

fn main() -> Result<(), anyhow::Error> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let settings = cli.sampling.settings()?;

    info!("using /dev/i2c-{} at {:#04x}", cli.bus, cli.address);

    let mut adc = Mcp3424::new(PiBus::new(cli.bus), cli.address, settings.resolution)
        .with_context(|| {
            format!(
                "failed to configure MCP3424 at {:#04x} on /dev/i2c-{}",
                cli.address, cli.bus
            )
        })?;

    reader::run(&mut adc, &settings)
}
