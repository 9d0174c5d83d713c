//! Fieldcanon CLI - canonicalize and truncate templated field values.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod input;
mod output;

use commands::{canonicalize, classify, truncate};

#[derive(Parser)]
#[command(name = "fieldcanon")]
#[command(about = "Canonicalize and truncate templated field values")]
struct Cli {
    /// Log debug output to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serialize a JSON value the way a templated field is stored
    Canonicalize {
        /// Input JSON file (or stdin if not provided)
        input: Option<String>,
        /// Field name used for redaction
        #[arg(long, default_value = "value")]
        field: String,
        /// Maximum rendered length (default: from configuration)
        #[arg(long, allow_negative_numbers = true)]
        max_length: Option<i64>,
        /// Configuration file with a [core] section
        #[arg(long)]
        config: Option<String>,
        /// Secret value to mask in truncated output (repeatable)
        #[arg(long = "mask")]
        masks: Vec<String>,
        /// Print the field report alongside the value
        #[arg(long)]
        report: bool,
        /// Print the SHA-256 digest of the serialized field
        #[arg(long)]
        digest: bool,
    },
    /// Truncate raw text behind the truncation notice
    Truncate {
        /// Input text file (or stdin if not provided)
        input: Option<String>,
        /// Maximum length of the result
        #[arg(long, allow_negative_numbers = true)]
        max_length: i64,
    },
    /// Report whether an import path names a built-in class
    Classify {
        /// Dotted import path
        import_path: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = if verbose {
        EnvFilter::new(default_level)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Canonicalize {
            input,
            field,
            max_length,
            config,
            masks,
            report,
            digest,
        } => canonicalize::run(canonicalize::Options {
            input,
            field,
            max_length,
            config,
            masks,
            report,
            digest,
        }),
        Commands::Truncate { input, max_length } => truncate::run(input, max_length),
        Commands::Classify { import_path, json } => classify::run(import_path, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
