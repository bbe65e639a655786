//! CLI parser and command dispatch.

mod auth;
mod documents;
mod helpers;
mod workspace;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use helpers::AppContext;

#[derive(Parser)]
#[command(name = "docsight")]
#[command(about = "Client for the docsight AI document-analysis service")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Store an API token and verify it
    Login {
        /// Bearer token issued by the backend
        #[arg(long)]
        token: String,
    },

    /// Forget the stored API token
    Logout,

    /// Show the authenticated user
    Whoami,

    /// Show or set the preferred report language
    Language {
        /// Language tag to set (e.g. "de", "en"); omit to show
        language: Option<String>,
    },

    /// Upload a document for analysis
    Upload {
        /// File to upload
        file: PathBuf,
        /// Workspace to upload into
        #[arg(short, long)]
        workspace: Option<i64>,
        /// Follow processing until it finishes
        #[arg(long)]
        watch: bool,
    },

    /// List documents
    List {
        /// Restrict to one workspace
        #[arg(short, long)]
        workspace: Option<i64>,
    },

    /// Show a document's current status
    Status {
        /// Document id
        id: i64,
    },

    /// Follow a document's status until processing finishes
    Watch {
        /// Document id
        id: i64,
    },

    /// Show the generated report for a completed document
    Report {
        /// Document id
        document_id: i64,
    },

    /// Rename a document
    Rename {
        /// Document id
        id: i64,
        /// New display name
        name: String,
    },

    /// Delete a document
    Delete {
        /// Document id
        id: i64,
    },

    /// Manage workspaces and their members
    Workspace {
        #[command(subcommand)]
        command: WorkspaceCommands,
    },
}

#[derive(Subcommand)]
enum WorkspaceCommands {
    /// List workspaces (current one marked with *)
    List,
    /// Create a team workspace
    Create { name: String },
    /// Rename a team workspace
    Rename { id: i64, name: String },
    /// Delete a team workspace
    Delete { id: i64 },
    /// List members of a workspace
    Members { id: i64 },
    /// Invite a member by email
    AddMember { id: i64, email: String },
    /// Remove a member
    RemoveMember { id: i64, member_id: i64 },
}

/// Parse arguments and run the selected command.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let ctx = AppContext::build(cli.config.as_deref())?;

    match cli.command {
        Commands::Login { token } => auth::login(&ctx, &token).await,
        Commands::Logout => {
            auth::logout(&ctx);
            Ok(())
        }
        Commands::Whoami => auth::whoami(&ctx).await,
        Commands::Language { language } => {
            auth::language(&ctx, language.as_deref());
            Ok(())
        }
        Commands::Upload {
            file,
            workspace,
            watch,
        } => documents::upload(&ctx, &file, workspace, watch).await,
        Commands::List { workspace } => documents::list(&ctx, workspace).await,
        Commands::Status { id } => documents::status(&ctx, id).await,
        Commands::Watch { id } => documents::watch(&ctx, id).await,
        Commands::Report { document_id } => documents::report(&ctx, document_id).await,
        Commands::Rename { id, name } => documents::rename(&ctx, id, &name).await,
        Commands::Delete { id } => documents::delete(&ctx, id).await,
        Commands::Workspace { command } => match command {
            WorkspaceCommands::List => workspace::list(&ctx).await,
            WorkspaceCommands::Create { name } => workspace::create(&ctx, &name).await,
            WorkspaceCommands::Rename { id, name } => {
                workspace::rename(&ctx, id, &name).await
            }
            WorkspaceCommands::Delete { id } => workspace::delete(&ctx, id).await,
            WorkspaceCommands::Members { id } => workspace::members(&ctx, id).await,
            WorkspaceCommands::AddMember { id, email } => {
                workspace::add_member(&ctx, id, &email).await
            }
            WorkspaceCommands::RemoveMember { id, member_id } => {
                workspace::remove_member(&ctx, id, member_id).await
            }
        },
    }
}
