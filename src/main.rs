use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use build_session::config::SessionConfig;
use build_session::models::SourcemapPolicy;
use build_session::{host, BuildSession};

#[derive(Parser)]
#[command(name = "bsess")]
#[command(about = "Incremental build sessions for multi-project source trees")]
struct Cli {
    #[command(flatten)]
    session: SessionArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Overrides for values otherwise read from BUILD_SESSION_* variables
#[derive(Args)]
struct SessionArgs {
    /// Root that output paths are computed relative to
    #[arg(long, global = true)]
    workspace_root: Option<PathBuf>,

    /// Directory compiled output is written under
    #[arg(long, global = true)]
    work_dir: Option<PathBuf>,

    /// Manifest file name to search for
    #[arg(long, global = true)]
    manifest: Option<String>,

    /// Source map policy: none, inline, external or linked
    #[arg(long, global = true)]
    sourcemap: Option<SourcemapPolicy>,

    /// Compiler program
    #[arg(long, global = true)]
    compiler: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve JSON requests on stdin (default)
    Serve,
    /// Compile files and print their output paths
    Compile {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Compile a file and print its compilation group
    Group { file: PathBuf },
}

/// Initialize tracing with output to stderr
///
/// Every subcommand prints its results on stdout.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "build_session=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(args: SessionArgs) -> anyhow::Result<SessionConfig> {
    let mut config = SessionConfig::from_env()?;

    if let Some(root) = args.workspace_root {
        config.workspace_root = root;
    }
    if let Some(dir) = args.work_dir {
        config.work_dir = dir;
    }
    if let Some(manifest) = args.manifest {
        config.manifest_name = manifest;
    }
    if let Some(policy) = args.sourcemap {
        config.sourcemap = policy;
    }
    if let Some(compiler) = args.compiler {
        config.compiler = compiler;
    }

    let cwd = std::env::current_dir()?;
    Ok(config.absolutize(&cwd))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing();

    let config = load_config(cli.session)?;
    tracing::debug!(?config, "loaded configuration");
    let cwd = std::env::current_dir()?;
    let session = BuildSession::from_config(&config);

    match cli.command {
        None | Some(Commands::Serve) => {
            host::run_stdio(session).await?;
        }
        Some(Commands::Compile { files }) => {
            for file in files {
                let output = session.compile(&cwd.join(file)).await?;
                println!("{}", output.display());
            }
            session.stop().await;
        }
        Some(Commands::Group { file }) => {
            let file = cwd.join(file);
            session.compile(&file).await?;
            if let Some(group) = session.file_group(&file) {
                for entry in group.iter() {
                    println!("{} -> {}", entry.source.display(), entry.output.display());
                }
            }
            session.stop().await;
        }
    }

    Ok(())
}
