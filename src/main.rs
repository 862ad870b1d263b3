use amch::codec::Format;
use amch::commands::{self, ConfigOptions};
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

/// amch - AllMyChanges command line client
///
/// Keep the packages you track on allmychanges.com in sync with a local list,
/// and tag the versions you deploy.
///
/// Commands that change anything need an OAuth token, given with --token or
/// the AMCH_TOKEN environment variable, or stored in the settings file.
///
/// Examples:
///   amch add python/django                           # Track django, choosing its source
///   amch add python/six/https://github.com/benjaminp/six
///   amch import --input packages.yaml --format yaml
///   amch tag python/django 1.8.10 production
#[derive(Parser, Debug)]
#[command(author, version = env!("AMCH_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// OAuth token (also via AMCH_TOKEN)
    #[arg(long, env = "AMCH_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// API base URL (defaults to https://allmychanges.com/v1)
    #[arg(long = "base-url", env = "AMCH_BASE_URL", value_name = "URL", global = true)]
    pub base_url: Option<String>,

    /// Settings file (defaults to <config dir>/amch/config.toml)
    #[arg(long, env = "AMCH_CONFIG", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Log requests and decisions
    #[arg(long, env = "AMCH_DEBUG", global = true)]
    pub debug: bool,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Track one or more packages
    Add(AddArgs),

    /// Track the packages listed in a file and apply their tags
    Import(ImportArgs),

    /// Write the tracked packages to a file
    Export(ExportArgs),

    /// Bind a tag to a version of a project
    Tag(TagArgs),

    /// List tags and the versions they are bound to
    Tags(TagsArgs),

    /// List the versions of a project with their tags
    Versions(VersionsArgs),

    /// Search the directory for packages
    Search(SearchArgs),

    /// Stop tracking one or more packages
    Untrack(UntrackArgs),
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// Packages in the format "namespace/name" or "namespace/name/source"
    #[arg(value_name = "NAMESPACE/NAME[/SOURCE]", required = true)]
    pub packages: Vec<String>,

    /// Replace a package's source when it differs from the given one
    #[arg(long)]
    pub update_source: bool,
}

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// File to read (defaults to standard input)
    #[arg(long, short, value_name = "FILE")]
    pub input: Option<PathBuf>,

    #[arg(long, short, value_enum, default_value_t = Format::Json)]
    pub format: Format,

    /// Replace a package's source when it differs from the file
    #[arg(long)]
    pub update_source: bool,
}

#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    /// File to write (defaults to standard output)
    #[arg(long, short, value_name = "FILE")]
    pub output: Option<PathBuf>,

    #[arg(long, short, value_enum, default_value_t = Format::Json)]
    pub format: Format,
}

#[derive(clap::Args, Debug)]
pub struct TagArgs {
    /// Project as "namespace/name" or "name"
    pub project: String,
    pub version: String,
    pub tag: String,
}

#[derive(clap::Args, Debug)]
pub struct TagsArgs {
    /// Only show tags whose whole name matches this regular expression
    #[arg(long, value_name = "REGEX")]
    pub filter: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct VersionsArgs {
    /// Project as "namespace/name" or "name"
    pub project: String,
}

#[derive(clap::Args, Debug)]
pub struct SearchArgs {
    /// "namespace/name", or a single word matched as namespace or name
    pub query: String,
}

#[derive(clap::Args, Debug)]
pub struct UntrackArgs {
    /// Packages in the format "namespace/name"
    #[arg(value_name = "NAMESPACE/NAME", required = true)]
    pub packages: Vec<String>,
}

impl Cli {
    fn config_options(&self) -> ConfigOptions {
        ConfigOptions {
            token: self.token.clone(),
            base_url: self.base_url.clone(),
            config_file: self.config.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_filter = if cli.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let options = cli.config_options();
    let runtime = amch::runtime::RealRuntime;

    match cli.command {
        Commands::Add(args) => {
            commands::add(runtime, &options, &args.packages, args.update_source).await?
        }
        Commands::Import(args) => {
            commands::import(
                runtime,
                &options,
                args.input.as_deref(),
                args.format,
                args.update_source,
            )
            .await?
        }
        Commands::Export(args) => {
            commands::export(runtime, &options, args.output.as_deref(), args.format).await?
        }
        Commands::Tag(args) => {
            commands::tag(runtime, &options, &args.project, &args.version, &args.tag).await?
        }
        Commands::Tags(args) => commands::tags(runtime, &options, args.filter.as_deref()).await?,
        Commands::Versions(args) => commands::versions(runtime, &options, &args.project).await?,
        Commands::Search(args) => commands::search(runtime, &options, &args.query).await?,
        Commands::Untrack(args) => commands::untrack(runtime, &options, &args.packages).await?,
    }
    Ok(())
}
