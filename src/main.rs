//! RSB packaging CLI
//!
//! Entry point for the `rsb-pkg` command-line tool.

use clap::{Args, Parser, Subcommand};
use rsb_pkg::backend::{self, Backend};
use rsb_pkg::config::{BuildParams, EffectiveParams};
use rsb_pkg::pipeline::{self, PipelineResult};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "rsb-pkg")]
#[command(about = "Select RSB buildsets, materialize jobs and generate packaging files", version)]
struct Cli {
    /// Project top directory
    #[arg(long, global = true, default_value = ".")]
    top: PathBuf,

    /// Parameters file (default: <top>/rsb-pkg.toml when present)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the selected buildsets
    List {
        #[command(flatten)]
        build: BuildArgs,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Materialize and print a job per selected buildset
    Jobs {
        #[command(flatten)]
        build: BuildArgs,

        /// Simulate every build
        #[arg(long)]
        dry_run: bool,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Generate packaging files for every selected buildset
    Package {
        #[command(flatten)]
        build: BuildArgs,

        /// Packaging backend (default: chosen by host system)
        #[arg(long)]
        backend: Option<String>,

        /// Template file (default: the backend's template under --top)
        #[arg(long)]
        template: Option<PathBuf>,

        /// Spec macro override, repeatable
        #[arg(short = 'D', value_name = "KEY=VALUE")]
        define: Vec<String>,
    },

    /// Check parameters, filter and override files without building anything
    Check {
        #[command(flatten)]
        build: BuildArgs,
    },
}

/// Flags shared by every subcommand
#[derive(Args)]
struct BuildArgs {
    /// Regex selecting buildsets, matched from the start of the id
    #[arg(long)]
    builds: Option<String>,

    /// Install prefix
    #[arg(long)]
    prefix: Option<String>,

    /// Release series compared by `version` predicates
    #[arg(long)]
    revision: Option<String>,

    /// Version string passed to packaging backends
    #[arg(long = "rsb-version")]
    rsb_version: Option<String>,

    /// Mark the packages as released
    #[arg(long)]
    released: bool,

    /// Spec parameter file (INI), relative to --top
    #[arg(long)]
    spec_config: Option<PathBuf>,

    /// Do not install into the prefix
    #[arg(long)]
    no_install: bool,
}

impl BuildArgs {
    /// Parameters layer holding only the flags actually given
    fn to_overrides(&self) -> Map<String, Value> {
        let mut map = Map::new();
        if let Some(ref builds) = self.builds {
            map.insert("build_filter".to_string(), Value::from(builds.as_str()));
        }
        if let Some(ref prefix) = self.prefix {
            map.insert("prefix".to_string(), Value::from(prefix.as_str()));
        }
        if let Some(ref revision) = self.revision {
            map.insert("revision".to_string(), Value::from(revision.as_str()));
        }
        if let Some(ref version) = self.rsb_version {
            map.insert("version".to_string(), Value::from(version.as_str()));
        }
        if self.released {
            map.insert("released".to_string(), Value::Bool(true));
        }
        if let Some(ref path) = self.spec_config {
            map.insert(
                "spec_config".to_string(),
                Value::from(path.to_string_lossy().to_string()),
            );
        }
        if self.no_install {
            map.insert("no_install".to_string(), Value::Bool(true));
        }
        map
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match &cli.command {
        Commands::List { build, json } => {
            load_params(&cli, build.to_overrides()).and_then(|params| run_list(&params, *json))
        }
        Commands::Jobs {
            build,
            dry_run,
            json,
        } => {
            let mut overrides = build.to_overrides();
            if *dry_run {
                overrides.insert("dry_run".to_string(), Value::Bool(true));
            }
            load_params(&cli, overrides).and_then(|params| run_jobs(&params, *json))
        }
        Commands::Package {
            build,
            backend,
            template,
            define,
        } => {
            let mut overrides = build.to_overrides();
            if !define.is_empty() {
                overrides.insert("spec_overrides".to_string(), Value::from(define.clone()));
            }
            load_params(&cli, overrides).and_then(|params| {
                run_package(&params, backend.as_deref(), template.clone())
            })
        }
        Commands::Check { build } => {
            load_params(&cli, build.to_overrides()).and_then(|params| run_check(&params))
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(e.exit_code());
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn load_params(cli: &Cli, overrides: Map<String, Value>) -> PipelineResult<BuildParams> {
    let effective =
        EffectiveParams::build(&cli.top, cli.config.as_deref(), Some(Value::Object(overrides)))?;
    tracing::debug!(sources = effective.sources.len(), top = %effective.params.top.display(), "parameters loaded");
    Ok(effective.params)
}

fn run_list(params: &BuildParams, json: bool) -> PipelineResult<()> {
    let resolution = pipeline::resolve(params)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&resolution)?);
        return Ok(());
    }

    if resolution.selected.is_empty() {
        println!("No buildsets selected.");
        return Ok(());
    }
    for entry in &resolution.selected {
        let mut flags = Vec::new();
        if entry.dry_run {
            flags.push("dry-run");
        }
        if !entry.good {
            flags.push("not-good");
        }
        if flags.is_empty() {
            println!("{}", entry.id);
        } else {
            println!("{} [{}]", entry.id, flags.join(", "));
        }
    }
    Ok(())
}

fn run_jobs(params: &BuildParams, json: bool) -> PipelineResult<()> {
    let resolution = pipeline::resolve(params)?;
    let jobs = pipeline::materialize_all(params, &resolution.selected)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&jobs)?);
        return Ok(());
    }

    for job in &jobs {
        println!("{}", job.buildset);
        println!("  Descriptor: {}", job.descriptor_path.display());
        println!("  Log: {}", job.log_path.display());
        println!("  Archive: {}", job.archive_path.display());
        println!("  Dry run: {}", job.dry_run);
        println!("  Run: {}", job.run_command().join(" "));
        println!("  Package: {}", job.package_command().join(" "));
    }
    Ok(())
}

fn run_package(
    params: &BuildParams,
    backend_name: Option<&str>,
    template: Option<PathBuf>,
) -> PipelineResult<()> {
    let backend: Box<dyn Backend> = match backend_name {
        Some(name) => backend::backend_by_name(name)?,
        None => backend::backend_for_host()?,
    };
    tracing::info!(backend = backend.name(), "{}", backend.description());

    let written = pipeline::package(params, backend.as_ref(), template.as_deref())?;
    for path in &written {
        println!("{}", path.display());
    }
    Ok(())
}

fn run_check(params: &BuildParams) -> PipelineResult<()> {
    let resolution = pipeline::check(params)?;

    println!("Configuration valid: {}", params.top.display());
    println!();
    println!("  Discovered buildsets: {}", resolution.discovered.len());
    println!("  Override files: {}", resolution.override_sources.len());
    println!("  Selected buildsets: {}", resolution.selected.len());
    if let Some(filter) = params.build_filter() {
        println!("  Filter: {}", filter);
    }
    Ok(())
}
