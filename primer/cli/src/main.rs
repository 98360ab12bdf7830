//! Primer CLI - pick the integration examples that fit a project

use clap::{Args, Parser, Subcommand};
use primer_lib::{
    Manifest, PrimerConfig, TruncationPolicy, detect, filter_entries, prime, render_markdown,
    select_with_options,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod output;

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "primer", version)]
#[command(
    about = "Select integration examples that match a project's dependencies",
    long_about = None
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', action = clap::ArgAction::Count, global = true)]
    log_verbosity: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    /// Corpus root directory (repeatable; overrides PRIMER_CORPUS_DIR)
    #[arg(long = "corpus", value_name = "DIR", global = true)]
    corpus: Vec<PathBuf>,

    /// Descriptor table in TOML (overrides PRIMER_DESCRIPTORS)
    #[arg(long, value_name = "FILE", global = true)]
    descriptors: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the entries in the corpus
    List {
        /// Glob patterns over entry ids (e.g. "convex/*", "*/auth-*")
        #[arg(value_name = "FILTER")]
        filters: Vec<String>,

        /// Only show these integrations (repeatable: -i convex -i svelte)
        #[arg(short = 'i', long = "integration", value_name = "ID")]
        integrations: Vec<String>,

        /// Output as JSON instead of terminal format
        #[arg(long)]
        json: bool,
    },

    /// Print the content of one entry
    Show {
        /// Entry id, e.g. convex/schema
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Show which integrations a project uses
    Detect {
        #[command(flatten)]
        project: ProjectArgs,

        /// Output as JSON instead of terminal format
        #[arg(long)]
        json: bool,
    },

    /// Build the example bundle for a project
    Bundle {
        #[command(flatten)]
        project: ProjectArgs,

        /// Maximum number of entries
        #[arg(long, value_name = "N")]
        max_entries: Option<usize>,

        /// Maximum total content size in bytes
        #[arg(long, value_name = "N")]
        max_bytes: Option<usize>,

        /// What to do when the budget is exceeded: drop-lowest-priority or fail
        #[arg(long, value_name = "POLICY")]
        policy: Option<TruncationPolicy>,

        /// Leave out entries written for a different version than the project's
        #[arg(long)]
        exclude_mismatch: bool,

        /// Output as JSON instead of markdown
        #[arg(long)]
        json: bool,
    },
}

/// Where to read the project's dependencies from.
#[derive(Args)]
struct ProjectArgs {
    /// Project directory with a package.json and/or Cargo.toml [default: .]
    #[arg(long, value_name = "DIR", conflicts_with = "manifest")]
    project: Option<PathBuf>,

    /// JSON file mapping dependency names to declared versions
    #[arg(long, value_name = "FILE")]
    manifest: Option<PathBuf>,
}

impl ProjectArgs {
    fn load(&self) -> primer_lib::Result<Manifest> {
        match (&self.manifest, &self.project) {
            (Some(file), _) => Manifest::from_json_file(file),
            (None, Some(dir)) => Manifest::from_project_dir(dir),
            (None, None) => Manifest::from_project_dir(Path::new(".")),
        }
    }
}

fn init_tracing(verbose: u8, json: bool) {
    // RUST_LOG wins over -v
    let base_filter = match std::env::var("RUST_LOG") {
        Ok(filter) => filter,
        Err(_) => match verbose {
            0 => "warn".to_string(),
            1 => "warn,primer_lib=info".to_string(),
            2 => "info,primer_lib=debug".to_string(),
            _ => "debug,primer_lib=trace".to_string(),
        },
    };

    let filter = EnvFilter::try_new(&base_filter).unwrap_or_else(|_| EnvFilter::new("warn"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_file(verbose >= 3)
                    .with_line_number(verbose >= 3)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
    }
}

/// Environment first, then command-line overrides.
fn load_config(corpus: Vec<PathBuf>, descriptors: Option<PathBuf>) -> PrimerConfig {
    let mut config = PrimerConfig::from_env();
    if !corpus.is_empty() {
        config.corpus_dirs = corpus;
    }
    if let Some(path) = descriptors {
        config.descriptors_path = Some(path);
    }
    config
}

fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.log_verbosity, cli.log_json);

    let config = load_config(cli.corpus, cli.descriptors);

    let result = match cli.command {
        Commands::List {
            filters,
            integrations,
            json,
        } => run_list(&config, &filters, &integrations, json),
        Commands::Show { id } => run_show(&config, &id),
        Commands::Detect { project, json } => run_detect(&config, &project, json),
        Commands::Bundle {
            project,
            max_entries,
            max_bytes,
            policy,
            exclude_mismatch,
            json,
        } => {
            let mut config = config;
            if let Some(max) = max_entries {
                config.budget.max_entries = Some(max);
            }
            if let Some(max) = max_bytes {
                config.budget.max_bytes = Some(max);
            }
            if let Some(policy) = policy {
                config.budget.truncation_policy = policy;
            }
            if exclude_mismatch {
                config.budget.exclude_version_mismatch = true;
            }
            run_bundle(&config, &project, json)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run_list(
    config: &PrimerConfig,
    filters: &[String],
    integrations: &[String],
    json: bool,
) -> CliResult {
    let store = config.load_store()?;
    let entries = filter_entries(store.iter(), filters, integrations)?;

    if json {
        println!("{}", output::entries_json(&entries)?);
    } else if entries.is_empty() {
        eprintln!("No entries found");
    } else {
        println!("{}", output::format_entries(&entries));
    }
    Ok(())
}

fn run_show(config: &PrimerConfig, id: &str) -> CliResult {
    let store = config.load_store()?;
    match store.get(id) {
        Some(entry) => {
            print!("{}", entry.content);
            Ok(())
        }
        None => Err(format!("No entry with id '{id}'").into()),
    }
}

fn run_detect(config: &PrimerConfig, project: &ProjectArgs, json: bool) -> CliResult {
    let manifest = project.load()?;
    let signature = detect(&manifest);
    if signature.is_empty_manifest() {
        eprintln!("The project declares no dependencies");
    }

    let store = config.load_store()?;
    let descriptors = config.load_descriptors()?;
    let selection = select_with_options(&signature, &store, &descriptors, &config.select);

    if json {
        println!("{}", serde_json::to_string_pretty(&selection.matched_integrations)?);
    } else {
        println!("{}", output::format_matches(&selection));
    }
    Ok(())
}

fn run_bundle(config: &PrimerConfig, project: &ProjectArgs, json: bool) -> CliResult {
    let manifest = project.load()?;
    let bundle = prime(config, &manifest)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&bundle)?);
    } else {
        print!("{}", render_markdown(&bundle));
    }
    Ok(())
}
