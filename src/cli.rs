use clap::{Parser, Subcommand};
use url::Url;

#[derive(Debug, Parser)]
#[command(
    name = "regdiag",
    version,
    about = "Diagnostics toolkit for the valorizaciones registry backend"
)]
pub struct Cli {
    /// Raise the log filter to debug.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the minimal debug HTTP server.
    Serve,

    /// Reachability checks against external services.
    Probe {
        #[command(subcommand)]
        target: ProbeTarget,
    },

    /// Inspect or initialize the Turso (libsql-over-HTTP) database.
    Turso {
        #[command(subcommand)]
        action: TursoAction,
    },

    /// Inspect or initialize the Neon (managed Postgres) database.
    Neon {
        #[command(subcommand)]
        action: NeonAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum ProbeTarget {
    /// Probe the government portals the scraper depends on.
    Sites,

    /// Smoke-test the deployed backend API.
    Backend {
        /// Base URL of the deployed backend (defaults to `BACKEND_URL`).
        #[arg(long)]
        base_url: Option<Url>,
    },
}

#[derive(Debug, Subcommand)]
pub enum TursoAction {
    /// Create the empresas table and its indexes.
    Init,

    /// List the tables present in the database.
    Tables,

    /// Round trip: SELECT 1, probe insert, row count.
    Smoke,
}

#[derive(Debug, Subcommand)]
pub enum NeonAction {
    /// Print the column layout of a table.
    Schema {
        #[arg(long, default_value = "empresas")]
        table: String,
    },

    /// Create the mef_cache table and verify it with a cached round trip.
    Migrate,

    /// Insert-and-delete round trip on empresas.
    Smoke,
}
