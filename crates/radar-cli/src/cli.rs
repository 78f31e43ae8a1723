use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "radar")]
#[command(about = "See what's happening on campus right now")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to the config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List live hotspots
    #[command(alias = "ls")]
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Report a hotspot at your current position
    Report {
        /// Latitude (falls back to the configured default)
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,
        /// Longitude (falls back to the configured default)
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,
        /// Name for the new hotspot
        #[arg(short, long)]
        label: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Follow hotspots as they appear and expire
    Watch {
        /// Stop after this many seconds (runs until Ctrl-C when omitted)
        #[arg(long)]
        seconds: Option<u64>,
    },
    /// List pre-fetched campus events
    Events {
        /// Catalog file (defaults to the configured catalog)
        #[arg(long, value_name = "PATH")]
        path: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Inspect CLI configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the resolved configuration
    Show,
    /// Print the config file location
    Path,
    /// Update values in the config file
    Set(ConfigSetArgs),
}

#[derive(Args, Debug, Default)]
pub struct ConfigSetArgs {
    /// Supabase project URL
    #[arg(long)]
    pub supabase_url: Option<String>,
    /// Supabase anon key
    #[arg(long)]
    pub supabase_anon_key: Option<String>,
    /// Hotspot table name
    #[arg(long)]
    pub hotspot_table: Option<String>,
    /// Minutes a hotspot stays visible
    #[arg(long)]
    pub ttl_minutes: Option<u64>,
    /// Default latitude for `report`
    #[arg(long, requires = "default_longitude", allow_hyphen_values = true)]
    pub default_latitude: Option<f64>,
    /// Default longitude for `report`
    #[arg(long, requires = "default_latitude", allow_hyphen_values = true)]
    pub default_longitude: Option<f64>,
    /// Event catalog file
    #[arg(long, value_name = "PATH")]
    pub event_catalog: Option<PathBuf>,
}
