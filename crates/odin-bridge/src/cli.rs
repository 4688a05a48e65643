//! CLI argument definitions using clap derive macros.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Expose an odin control server as a tree of pollable attributes
#[derive(Parser, Debug)]
#[command(name = "odin-bridge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (default: <config dir>/odin-bridge/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Control server host
    #[arg(long, global = true, env = "ODIN_BRIDGE_HOST")]
    pub host: Option<String>,

    /// Control server port
    #[arg(long, global = true, env = "ODIN_BRIDGE_PORT")]
    pub port: Option<u16>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Discover the server and print the control tree
    Tree,

    /// Write one attribute, e.g. `put FP.frames 10`
    Put {
        /// Dot-separated node path and attribute name
        attribute: String,
        /// Value as JSON; anything unparsable is sent as a string
        value: String,
    },

    /// Discover, then poll every attribute until interrupted
    Run(RunArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Attribute to report periodically (repeatable)
    #[arg(long = "watch", value_name = "ATTRIBUTE")]
    pub watch: Vec<String>,

    /// Seconds between reports of watched attributes
    #[arg(long, default_value_t = 5)]
    pub report_secs: u64,
}
