mod cli;
mod context;
mod demo;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, Format, PackageCommands};
use context::AppContext;
use parcelbase_auth::{GuardDecision, RouteGuard, SessionManager, SessionOptions};
use parcelbase_core::Role;
use parcelbase_service::{AuditLogFilters, PackageFilters};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // .env is optional; real deployments use the environment directly.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = parcelbase_config::AppConfig::load(cli.config.as_deref())?;
    let context = AppContext::build(&config, cli.demo).await?;

    match &cli.command {
        Commands::Packages { command } => match command {
            PackageCommands::List {
                status,
                priority,
                search,
            } => {
                let filters = PackageFilters {
                    status: *status,
                    priority: *priority,
                    search: search.clone(),
                    ..Default::default()
                };
                let packages = context.packages.list(&filters).await?;
                match cli.format {
                    Format::Table => output::print_packages(&packages),
                    Format::Json => output::print_json(&packages)?,
                }
            }
            PackageCommands::Get { id } => {
                let package = context.packages.get(id).await?;
                output::print_json(&package)?;
            }
        },
        Commands::Users => {
            let users = context.users.list().await?;
            match cli.format {
                Format::Table => output::print_profiles(&users),
                Format::Json => output::print_json(&users)?,
            }
        }
        Commands::Documents { package_id } => {
            let documents = context.documents.list_for_package(package_id).await?;
            match cli.format {
                Format::Table => output::print_documents(&documents),
                Format::Json => output::print_json(&documents)?,
            }
        }
        Commands::Audit { table } => {
            let filters = AuditLogFilters {
                table_name: table.clone(),
                ..Default::default()
            };
            let entries = context.audit.list(&filters).await?;
            match cli.format {
                Format::Table => output::print_audit_logs(&entries),
                Format::Json => output::print_json(&entries)?,
            }
        }
        Commands::Check => {
            if context.connection.check().await {
                println!("backend reachable");
            } else {
                println!("backend unreachable");
                std::process::exit(1);
            }
        }
        Commands::Export => {
            let export = context.settings.export_all().await?;
            output::print_value(&export)?;
        }
        Commands::Whoami => {
            whoami(&context).await?;
        }
    }

    Ok(())
}

/// Demo-mode session walkthrough: sign in synthetically and show what the
/// route guards would decide.
async fn whoami(context: &AppContext) -> Result<()> {
    let Some(auth) = &context.auth else {
        anyhow::bail!(
            "interactive sessions belong to the web application; \
             run with --demo to inspect the demo session"
        );
    };

    let manager = SessionManager::start(
        context::demo_auth(auth),
        context.store.clone(),
        SessionOptions::default(),
    );
    manager.wait_until_ready().await;
    manager.demo_login();

    let snapshot = manager.snapshot();
    let Some(profile) = snapshot.profile.as_ref() else {
        anyhow::bail!("demo login did not produce a profile");
    };
    println!("signed in as {} ({})", profile.email, profile.role);

    let mut receiver = manager.subscribe();
    for (page, guard) in [
        ("dashboard", RouteGuard::new()),
        ("users", RouteGuard::with_roles([Role::Admin])),
        ("packages", RouteGuard::with_roles([Role::Admin, Role::Editor])),
    ] {
        let decision = guard.resolve(&mut receiver).await;
        let verdict = match decision {
            GuardDecision::Allow => "allowed".to_string(),
            GuardDecision::Redirect(target) => format!("redirected to {target}"),
            GuardDecision::Pending => "pending".to_string(),
        };
        println!("  {page}: {verdict}");
    }
    Ok(())
}
