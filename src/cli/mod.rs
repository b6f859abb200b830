pub mod commands;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "catalog")]
#[command(about = "Recipe catalog - multi-criteria recipe search", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the search API server
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "PORT")]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long, env = "HOST")]
        host: Option<String>,
    },

    /// Run database migrations
    Migrate,

    /// Search recipes in the local database
    Search(SearchArgs),
}

/// Search flags; values are validated the same way as API query parameters
#[derive(Args, Debug, Default)]
pub struct SearchArgs {
    /// Title substring
    #[arg(short, long)]
    pub search: Option<String>,

    /// Comma-separated category ids (any of)
    #[arg(long)]
    pub categories: Option<String>,

    /// Comma-separated allergy ids to exclude
    #[arg(long)]
    pub allergies: Option<String>,

    /// Maximum preparation time in minutes
    #[arg(long)]
    pub max_prep_time: Option<String>,

    /// Minimum number of servings
    #[arg(long)]
    pub min_servings: Option<String>,

    /// Ingredient name substring
    #[arg(short, long)]
    pub ingredient: Option<String>,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}
