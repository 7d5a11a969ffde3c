//! Sample a simulated MCP3424, no hardware required.

mod reader;
mod simulator;

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use mcp342x::Mcp3424;

use reader::Sampling;
use simulator::SimulatedAdc;

/// Address the simulated device answers on.
const SIMULATED_ADDRESS: u8 = 0x68;

#[derive(Parser, Debug)]
#[command(about = "Sample a simulated MCP3424")]
struct Cli {
    #[command(flatten)]
    sampling: Sampling,

    /// Status polls a one-shot conversion stays busy for
    #[arg(long, env = "MCP3424_SIM_LATENCY", default_value_t = 3)]
    latency: u32,
}

fn main() -> Result<(), anyhow::Error> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let settings = cli.sampling.settings()?;

    let device = SimulatedAdc::new(SIMULATED_ADDRESS, cli.latency);

    let mut adc = Mcp3424::new(device, SIMULATED_ADDRESS, settings.resolution)
        .context("failed to configure the simulated MCP3424")?;

    reader::run(&mut adc, &settings)
}
