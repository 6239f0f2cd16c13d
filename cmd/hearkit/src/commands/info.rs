//! Model info command.

use clap::Args;
use hearkit::ModelConfig;
use serde::Serialize;

use super::{get_model_config, output_json};
use crate::Cli;

/// Print the effective model configuration.
#[derive(Args)]
pub struct InfoCommand {}

#[derive(Debug, Serialize)]
struct ModelInfo {
    #[serde(flatten)]
    config: ModelConfig,
    frame_size: usize,
    num_bins: usize,
    frame_seconds: f64,
}

impl InfoCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let config = get_model_config(cli)?;
        let info = ModelInfo {
            frame_size: config.n_fft,
            num_bins: config.num_bins(),
            frame_seconds: config.n_fft as f64 / config.sample_rate as f64,
            config,
        };
        output_json(&info, cli.output.as_deref())
    }
}
