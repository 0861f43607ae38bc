use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::app_state::AppState;
use crate::client::{ApiClient, SessionFile};
use crate::config_loader::load_config;
use crate::session_role::SessionRoleCache;
use crate::web::build_router;

/// Recruitment CRM server and command-line client
#[derive(Parser)]
#[command(name = "recruit_crm", version, about = "Recruitment CRM service and client")]
pub struct Cli {
    /// Base URL of a running server, for client commands
    #[arg(long, global = true, default_value = "http://127.0.0.1:8080")]
    pub api_url: String,

    /// Where the client keeps its session (defaults to the user data dir)
    #[arg(long, global = true)]
    pub session_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the HTTP API
    Serve {
        /// Overrides `bind_addr` from the configuration
        #[arg(long)]
        bind: Option<String>,
    },

    /// Sign in and store the session locally
    Signin {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
        /// Current TOTP code, when MFA is enabled
        #[arg(long)]
        mfa_code: Option<String>,
    },

    /// End the stored session
    Signout,

    /// Show the signed-in user's role and capabilities
    Whoami,

    /// Check whether the signed-in user may open a page
    CanAccess {
        /// Page id, e.g. recruitment or activity-logs
        page: String,
    },

    /// List recruits visible to the signed-in user
    Recruits {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        position: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        sort: Option<String>,
        #[arg(long)]
        dir: Option<String>,
        #[arg(long)]
        page: Option<usize>,
        #[arg(long)]
        page_size: Option<usize>,
    },

    /// Download activity logs as CSV
    ExportLogs {
        #[arg(short, long, default_value = "activity-logs.csv")]
        output: PathBuf,
        #[arg(long)]
        search: Option<String>,
    },
}

fn session_file(cli_path: &Option<PathBuf>) -> anyhow::Result<SessionFile> {
    match cli_path {
        Some(path) => Ok(SessionFile::new(path.clone())),
        None => SessionFile::default_location().context("locating session file"),
    }
}

fn push_param(params: &mut Vec<(String, String)>, key: &str, value: Option<String>) {
    if let Some(value) = value {
        params.push((key.to_string(), value));
    }
}

pub async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { bind } => serve(bind).await,
        command => run_client(command, &cli.api_url, &cli.session_file).await,
    }
}

async fn run_client(command: Commands, api_url: &str, session_path: &Option<PathBuf>) -> anyhow::Result<()> {
    let file = session_file(session_path)?;
    let mut client = ApiClient::new(api_url, file.load()?);

    match command {
        Commands::Serve { .. } => anyhow::bail!("serve is not a client command"),
        Commands::Signin {
            email,
            password,
            mfa_code,
        } => {
            let session = client
                .signin(&email, &password, mfa_code.as_deref())
                .await
                .context("sign-in failed")?;
            file.save(&session)?;
            println!("Signed in as {} (session expires {})", session.email, session.expires_at);
        }
        Commands::Signout => {
            client.signout().await.context("sign-out failed")?;
            file.clear()?;
            println!("Signed out");
        }
        Commands::Whoami => {
            let caps = client.capabilities().await.context("not signed in?")?;
            println!("user:      {}", caps.user_id);
            println!("role:      {}", caps.role);
            let pages: Vec<&str> = caps.pages.iter().map(|p| p.as_str()).collect();
            println!("pages:     {}", pages.join(", "));
            let positions: Vec<&str> = caps.visible_positions.iter().map(|p| p.as_str()).collect();
            println!("positions: {}", positions.join(", "));
        }
        Commands::CanAccess { page } => {
            let mut cache = SessionRoleCache::new();
            let allowed = cache.can_access_page_id(&client, &page).await;
            let role = cache.cached().map(|r| r.to_string()).unwrap_or_else(|| "unresolved".into());
            println!("{page}: {} (role {role})", if allowed { "allowed" } else { "denied" });
        }
        Commands::Recruits {
            search,
            position,
            status,
            sort,
            dir,
            page,
            page_size,
        } => {
            let mut params = Vec::new();
            push_param(&mut params, "search", search);
            push_param(&mut params, "position", position);
            push_param(&mut params, "status", status);
            push_param(&mut params, "sort", sort);
            push_param(&mut params, "dir", dir);
            push_param(&mut params, "page", page.map(|p| p.to_string()));
            push_param(&mut params, "pageSize", page_size.map(|p| p.to_string()));

            let recruits = client.recruits(&params).await.context("listing recruits")?;
            if recruits.is_empty() {
                println!("No recruits visible.");
            }
            for r in recruits {
                println!(
                    "{:>6}  {:<24} {:<22} {:<11} {}",
                    r.id,
                    r.full_name,
                    r.position_applied_for,
                    r.status.as_str(),
                    r.created_at.format("%Y-%m-%d")
                );
            }
        }
        Commands::ExportLogs { output, search } => {
            let mut params = Vec::new();
            push_param(&mut params, "search", search);
            let bytes = client
                .export_activity_csv(&params)
                .await
                .context("exporting activity logs")?;
            std::fs::write(&output, &bytes)
                .with_context(|| format!("writing {}", output.display()))?;
            println!("Wrote {} bytes to {}", bytes.len(), output.display());
        }
    }
    Ok(())
}

async fn serve(bind: Option<String>) -> anyhow::Result<()> {
    let mut config = load_config().context("loading configuration")?;
    if let Some(bind) = bind {
        config.bind_addr = bind;
    }
    let addr = config.socket_addr().context("parsing bind address")?;

    let state = Arc::new(AppState::open(&config).context("opening data store")?);
    let app = build_router(state, &config.cors_origins);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, data_dir = %config.data_dir, "recruitment CRM listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("received terminate signal, shutting down"),
    }
}
