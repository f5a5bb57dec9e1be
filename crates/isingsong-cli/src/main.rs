//! CLI for isingsong — render a coupled oscillator network to audio and read
//! its spin energy.

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "isingsong")]
#[command(about = "isingsong — sonify a noisy Kuramoto network and score its Ising energy")]
#[command(version = isingsong_core::VERSION)]
struct Cli {
    /// Log debug output (progress, parameter draws)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the simulation, write a 16-bit mono WAV, print spins and energy
    Render {
        #[command(flatten)]
        sim: commands::SimArgs,

        /// Output WAV path
        #[arg(long, short, default_value = "thx_ising_sound.wav")]
        output: String,

        /// Write a JSON run report (config, spins, energy, waveform analysis)
        #[arg(long)]
        report: Option<String>,
    },

    /// Print the drawn frequencies, phases and coupling matrix without integrating
    Params {
        #[command(flatten)]
        sim: commands::SimArgs,

        /// Print as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Commands::Render {
            sim,
            output,
            report,
        } => commands::render::run(&sim, &output, report.as_deref()),
        Commands::Params { sim, json } => commands::params::run(&sim, json),
    }
}
