//! Meshpack CLI - render service mesh application installs locally

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod exit_codes;
mod util;

use commands::SelectionArgs;
use commands::template::TemplateOptions;
use error::CliError;

#[derive(Parser)]
#[command(name = "meshpack")]
#[command(author = "Meshpack Contributors")]
#[command(version)]
#[command(about = "Render service mesh application installs from versioned application specs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the install resources of an application version
    Template {
        /// Release name
        name: String,

        #[command(flatten)]
        selection: SelectionArgs,

        /// User values file(s) to merge
        #[arg(short = 'f', long = "values")]
        values: Vec<PathBuf>,

        /// Target namespace
        #[arg(short, long, default_value = "default", env = "MESHPACK_NAMESPACE")]
        namespace: String,

        /// Mesh the application is installed into
        #[arg(long, env = "MESHPACK_MESH")]
        mesh: Option<String>,

        /// Namespace of the mesh (defaults to the mesh name)
        #[arg(long)]
        mesh_namespace: Option<String>,

        /// Keep resources that lack the version's required labels
        #[arg(long)]
        no_filter: bool,

        /// Print the coalesced values document to stderr
        #[arg(long)]
        show_values: bool,
    },

    /// Validate layer selections and parameters against an application version
    Validate {
        #[command(flatten)]
        selection: SelectionArgs,
    },
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(command: Commands) -> error::Result<()> {
    match command {
        Commands::Template {
            name,
            selection,
            values,
            namespace,
            mesh,
            mesh_namespace,
            no_filter,
            show_values,
        } => {
            commands::template::run(TemplateOptions {
                name,
                selection,
                values_files: values,
                namespace,
                mesh,
                mesh_namespace,
                no_filter,
                show_values,
            })
            .await
        }

        Commands::Validate { selection } => commands::validate::run(&selection),
    }
}

fn main() {
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    let result = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime.block_on(run(cli.command)),
        Err(e) => Err(CliError::Other {
            message: format!("failed to start async runtime: {}", e),
        }),
    };

    if let Err(err) = result {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}
