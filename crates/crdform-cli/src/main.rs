//! crdform CLI - drive the Kubernetes CRD provider from the command line

use clap::{Args, Parser, Subcommand, ValueEnum};
use crdform_kube::{ProviderConfig, TypeKind};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod commands;
mod display;
mod error;
mod exit_codes;
mod input;

use error::{CliError, Result};

#[derive(Parser)]
#[command(name = "crdform")]
#[command(author = "crdform Contributors")]
#[command(version)]
#[command(about = "Manage Kubernetes custom resources through typed provider schemas", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    provider: ProviderArgs,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

/// Provider configuration flags, layered over the configuration file
#[derive(Args, Debug, Default)]
struct ProviderArgs {
    /// Provider configuration file (YAML or JSON)
    #[arg(long = "provider-config", env = "CRDFORM_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Kubeconfig file, or a path list merged like `KUBECONFIG`
    #[arg(long, env = "KUBECONFIG", global = true)]
    kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use
    #[arg(long, global = true)]
    context: Option<String>,

    /// Never contact the cluster
    #[arg(long, env = "CRDFORM_OFFLINE", global = true)]
    offline: bool,

    /// Default field manager for server-side apply
    #[arg(long, global = true)]
    field_manager: Option<String>,

    /// Force server-side apply conflicts by default (`--force-conflicts=false` to disable)
    #[arg(
        long,
        global = true,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    force_conflicts: Option<bool>,

    /// Seconds to wait for `wait_for` conditions
    #[arg(long, global = true)]
    wait_timeout: Option<u64>,
}

impl ProviderArgs {
    fn load(&self) -> Result<ProviderConfig> {
        let mut config = match &self.config {
            Some(path) => ProviderConfig::from_file(path)?,
            None => ProviderConfig::default(),
        };
        if let Some(kubeconfig) = &self.kubeconfig {
            config.kubeconfig = Some(kubeconfig.clone());
        }
        if let Some(context) = &self.context {
            config.context = Some(context.clone());
        }
        if self.offline {
            config.offline = true;
        }
        if let Some(field_manager) = &self.field_manager {
            config.field_manager = field_manager.clone();
        }
        if let Some(force) = self.force_conflicts {
            config.force_conflicts = force;
        }
        if let Some(timeout) = self.wait_timeout {
            config.wait_timeout_secs = timeout;
        }
        debug!(?config, "provider configuration");
        Ok(config)
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum KindArg {
    Resource,
    DataSource,
    Manifest,
}

impl From<KindArg> for TypeKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Resource => TypeKind::Resource,
            KindArg::DataSource => TypeKind::DataSource,
            KindArg::Manifest => TypeKind::Manifest,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect registered types
    Schema {
        #[command(subcommand)]
        command: SchemaCommands,
    },

    /// Check every registered schema for implementation errors
    Validate {
        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Render a manifest to YAML without contacting the cluster
    Render {
        /// Manifest type name (ends in `_manifest`)
        type_name: String,

        /// Configuration file (YAML or JSON)
        #[arg(short = 'f', long = "file")]
        file: PathBuf,

        /// Print the full state as JSON instead of the YAML document
        #[arg(long)]
        state: bool,
    },

    /// Create or update a resource with server-side apply
    Apply {
        /// Resource type name
        type_name: String,

        /// Configuration file (YAML or JSON)
        #[arg(short = 'f', long = "file")]
        file: PathBuf,

        /// Prior state from an earlier apply; updates instead of creating
        #[arg(long)]
        state: Option<PathBuf>,

        /// Only validate and plan; do not contact the cluster
        #[arg(long)]
        dry_run: bool,
    },

    /// Refresh a resource state from the cluster
    Read {
        /// Resource type name
        type_name: String,

        /// State file written by apply or import
        #[arg(long)]
        state: PathBuf,
    },

    /// Delete a resource
    Delete {
        /// Resource type name
        type_name: String,

        /// State file written by apply or import
        #[arg(long)]
        state: PathBuf,
    },

    /// Import an existing object as `<namespace>/<name>`
    Import {
        /// Resource type name
        type_name: String,

        /// Import identifier
        id: String,
    },

    /// Read an object through the data source
    Get {
        /// Data source type name
        type_name: String,

        /// Configuration file with `metadata.name` and `metadata.namespace`
        #[arg(short = 'f', long = "file")]
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum SchemaCommands {
    /// List registered type names
    List {
        /// Only list one kind
        #[arg(long, value_enum)]
        kind: Option<KindArg>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the attribute tree of a type
    Show {
        /// Type name
        type_name: String,

        /// Which surface the type name refers to
        #[arg(long, value_enum, default_value = "resource")]
        kind: KindArg,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("crdform=debug,crdform_kube=debug,crdform_core=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn block_on<F: std::future::Future<Output = Result<()>>>(future: F) -> Result<()> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CliError::internal(format!("failed to start async runtime: {}", e)))?
        .block_on(future)
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Schema { command } => match command {
            SchemaCommands::List { kind, json } => commands::schema::list(kind.map(Into::into), json),
            SchemaCommands::Show {
                type_name,
                kind,
                json,
            } => commands::schema::show(&type_name, kind.into(), json),
        },

        Commands::Validate { json } => commands::validate::run(json),

        Commands::Render {
            type_name,
            file,
            state,
        } => commands::render::run(&type_name, &file, state),

        Commands::Apply {
            type_name,
            file,
            state,
            dry_run,
        } => {
            let config = cli.provider.load()?;
            block_on(commands::resource::apply(
                &config,
                &type_name,
                &file,
                state.as_deref(),
                dry_run,
            ))
        }

        Commands::Read { type_name, state } => {
            let config = cli.provider.load()?;
            block_on(commands::resource::read(&config, &type_name, &state))
        }

        Commands::Delete { type_name, state } => {
            let config = cli.provider.load()?;
            block_on(commands::resource::delete(&config, &type_name, &state))
        }

        Commands::Import { type_name, id } => {
            let config = cli.provider.load()?;
            block_on(commands::resource::import(&config, &type_name, &id))
        }

        Commands::Get { type_name, file } => {
            let config = cli.provider.load()?;
            block_on(commands::data_source::get(&config, &type_name, &file))
        }
    }
}

fn main() {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    if let Err(err) = run(cli) {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn provider_args(args: &[&str]) -> ProviderArgs {
        let mut argv = vec!["crdform"];
        argv.extend_from_slice(args);
        argv.extend_from_slice(&["schema", "list"]);
        Cli::try_parse_from(argv).unwrap().provider
    }

    fn provider_file(dir: &TempDir, content: &str) -> String {
        let path = dir.path().join("provider.yaml");
        fs::write(&path, content).unwrap();
        path.to_string_lossy().to_string()
    }

    #[test]
    fn test_force_conflicts_flag_overrides_file() {
        let dir = TempDir::new().unwrap();
        let file = provider_file(&dir, "force_conflicts: true\n");

        let config = provider_args(&["--provider-config", &file]).load().unwrap();
        assert!(config.force_conflicts);

        let config = provider_args(&["--provider-config", &file, "--force-conflicts=false"])
            .load()
            .unwrap();
        assert!(!config.force_conflicts);
    }

    #[test]
    fn test_force_conflicts_bare_flag() {
        let config = provider_args(&["--force-conflicts"]).load().unwrap();
        assert!(config.force_conflicts);

        let config = provider_args(&[]).load().unwrap();
        assert!(!config.force_conflicts);
    }

    #[test]
    fn test_kubeconfig_path_list_passed_through() {
        let config = provider_args(&["--kubeconfig", "/tmp/a.yaml:/tmp/b.yaml"])
            .load()
            .unwrap();
        assert_eq!(
            config.kubeconfig.as_deref(),
            Some(std::path::Path::new("/tmp/a.yaml:/tmp/b.yaml"))
        );
    }
}
