use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "railsight")]
#[command(
    author,
    version,
    about = "Serve a train image classifier over HTTP"
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file path
    #[arg(
        short,
        long,
        global = true,
        env = "RAILSIGHT_CONFIG",
        default_value = "railsight.yaml"
    )]
    pub config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch and load the model, then serve HTTP requests
    Serve {
        /// Listen address (overrides server.address)
        #[arg(short, long)]
        address: Option<String>,

        /// Listen port (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Exit with an error if the model cannot be loaded
        #[arg(long)]
        fail_fast: bool,
    },

    /// Fetch the artifact and load the model, then exit
    Load,

    /// Classify a local image file
    Predict {
        /// Image to classify
        image: PathBuf,
    },
}
