use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use plantree::config::ServerConfig;
use plantree::models::NodeStatus;
use plantree::status::StatusEngine;
use plantree::{api, db, tree_render};

#[derive(Parser)]
#[command(name = "plantree")]
#[command(about = "Hierarchical project planning with derived status rollups")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Port for HTTP API (overrides PLANTREE_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print a workspace's node tree with statuses
    Tree {
        /// Workspace UUID
        workspace_id: Uuid,
    },
    /// Set a node's status by hand and re-derive its ancestors
    Status {
        /// Node UUID
        node_id: Uuid,
        /// One of idea, planned, in_progress, mvp, testing, complete, archived
        #[arg(value_parser = parse_status)]
        status: NodeStatus,
    },
}

fn parse_status(s: &str) -> Result<NodeStatus, String> {
    NodeStatus::from_str(s).ok_or_else(|| format!("unknown status '{s}'"))
}

/// Initialize tracing to stderr so command output on stdout stays clean
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "plantree=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn open_database(config: &ServerConfig) -> anyhow::Result<db::Database> {
    let db = match &config.db_path {
        Some(path) => db::Database::open(path.clone())?,
        None => db::Database::open_default()?,
    };
    db.migrate()?;
    Ok(db)
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let db = open_database(&config)?;
    let app = api::create_router_with_config(db, &config);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", config.port)).await?;
    tracing::info!("plantree server listening on http://127.0.0.1:{}", config.port);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut config = ServerConfig::from_env()?;

    match cli.command {
        Some(Commands::Serve { port }) => {
            if let Some(port) = port {
                config.port = port;
            }
            serve(config).await?;
        }
        Some(Commands::Tree { workspace_id }) => {
            let db = open_database(&config)?;
            let workspace = db
                .get_workspace(workspace_id)?
                .ok_or_else(|| anyhow::anyhow!("Workspace not found: {}", workspace_id))?;
            println!("{}", workspace.name);
            print!("{}", tree_render::render_tree(&db.get_node_tree(workspace_id)?));
        }
        Some(Commands::Status { node_id, status }) => {
            let db = open_database(&config)?;
            db.get_node(node_id)?
                .ok_or_else(|| anyhow::anyhow!("Node not found: {}", node_id))?;
            StatusEngine::new(&db).update_status_with_propagation(node_id, status)?;

            let progress = StatusEngine::new(&db).get_progress(node_id)?;
            println!(
                "{} -> {} ({}/{} critical children complete)",
                node_id, status, progress.complete, progress.total
            );
        }
        None => serve(config).await?,
    }

    Ok(())
}
