// gramian_sim/src/cli.rs

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// gramian-sim: empirical observability Gramians of a rendered rigid object.
///
/// Every subcommand reads the same scenario file and writes its results (Gramian
/// batches, measures, search results) as JSON under the output directory.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Scenario TOML file. Built-in defaults are used when omitted.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory the results are written to.
    #[arg(short, long, default_value = "output")]
    pub output: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Gramian of the configured object pose, also printed as a LaTeX matrix.
    Example,
    /// Search camera viewpoints on a sphere around the object.
    BestViews,
    /// Search semicircular camera paths over the object.
    Trajectories,
    /// Integrated Gramian of a tumbling cube seen from a fixed camera.
    Dynamic,
    /// Gramian of the configured pose over a logarithmic range of perturbation sizes.
    EpsilonSweep,
}

impl Command {
    /// File-name friendly name, matching the command-line spelling.
    pub fn name(self) -> &'static str {
        match self {
            Command::Example => "example",
            Command::BestViews => "best-views",
            Command::Trajectories => "trajectories",
            Command::Dynamic => "dynamic",
            Command::EpsilonSweep => "epsilon-sweep",
        }
    }
}
