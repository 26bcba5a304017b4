use albumist::{assemble, config, render};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Shared flags for commands that run a collection.
#[derive(clap::Args, Clone)]
struct CollectArgs {
    /// Directories of photos to process
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Output directory
    #[arg(long, default_value = "dist")]
    output: PathBuf,

    /// Site config file (defaults apply when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Process `<image>.json` metadata sidecars
    #[arg(long)]
    sidecars: bool,
}

#[derive(Parser)]
#[command(name = "albumist")]
#[command(about = "Static site generator for hierarchical photo albums")]
#[command(long_about = "\
Static site generator for hierarchical photo albums

Your filesystem is the data source: every directory of JPEGs becomes an
album, every ancestor directory becomes a virtual album aggregating its
descendants, and embedded IPTC keywords drive favorites and tag
pseudo-albums. A bounded \"recent\" stream tops it off.

Metadata sources per photo:
  Capture data:  EXIF (date taken, camera, lens, exposure)
  Title/tags:    IPTC (ObjectName, Keywords) as written by Lightroom et al.
  Overrides:     optional <photo>.json sidecars (--sidecars)

Run 'albumist gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Collect, validate, and render the site
    Build(CollectArgs),
    /// Collect and validate without writing any pages
    Check(CollectArgs),
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Build(args) => {
            let config = load(&args)?;
            let mut assembly = assemble::collect(&config)?;
            let warnings = report_validation(&mut assembly, &config);
            render::render(&config, &assembly)?;
            println!(
                "==> {} images, {} albums, {} warnings",
                assembly.images.len(),
                assembly.albums.len(),
                warnings
            );
            println!("==> Site generated at {}", config.out_dir.display());
        }
        Command::Check(args) => {
            let config = load(&args)?;
            let mut assembly = assemble::collect(&config)?;
            let warnings = report_validation(&mut assembly, &config);
            println!(
                "==> {} images, {} albums, {} hierarchy albums, {} warnings",
                assembly.images.len(),
                assembly.albums.len(),
                assembly.hier_albums.len(),
                warnings
            );
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn load(args: &CollectArgs) -> Result<config::Config, config::ConfigError> {
    let site = config::load_site_config(args.config.as_deref())?;
    Ok(config::Config {
        in_dirs: args.input.clone(),
        out_dir: args.output.clone(),
        process_sidecars: args.sidecars,
        site,
    })
}

fn report_validation(
    assembly: &mut albumist::types::Assembly,
    config: &config::Config,
) -> usize {
    let errors = assemble::validate(assembly, &config.site.limits);
    for err in &errors {
        warn!("validation: {err}");
    }
    errors.len()
}
