//! clubctl - inspect club roles, navigation and sessions
//!
//! Every command runs against the seeded in-memory directory, so the demo
//! accounts (`admin@club.test`, `coach@club.test`, ...) are always available.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use club_access::{can_access, default_section, menu_for, MenuItem, Navigator, Profile, Role, Section, TeamId, View};
use club_session::{
    demo_profiles, demo_teams, ClubConfig, ClubShell, MemoryDirectory, MemoryTeams,
    SessionProvider, Team, DEMO_PASSWORD,
};
use serde::Serialize;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// clubctl - club manager access inspector
#[derive(Parser, Debug)]
#[command(name = "clubctl")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the sidebar menu of a role
    Menu {
        /// Role tag (admin, coach, player, coordinator, parent, director)
        role: Role,
    },

    /// Resolve a requested section tag for a role
    Resolve {
        /// Role tag
        role: Role,

        /// Requested section tag
        section: String,
    },

    /// Check whether a demo account may act on a team
    Access {
        /// Account email
        #[arg(long)]
        email: String,

        /// Team id
        #[arg(long)]
        team: String,
    },

    /// Sign in to the demo directory and walk a navigation path
    Session {
        /// Account email
        #[arg(long)]
        email: String,

        /// Account password
        #[arg(long, default_value = DEMO_PASSWORD)]
        password: String,

        /// Section tags to request, in order
        #[arg(long = "navigate", value_name = "SECTION")]
        navigate: Vec<String>,
    },

    /// List the teams a demo account may see
    Teams {
        /// Account email
        #[arg(long)]
        email: String,

        /// Filter on team name or age group
        #[arg(long)]
        search: Option<String>,
    },
}

#[derive(Debug, Serialize)]
struct MenuReport {
    role: Role,
    default_section: Section,
    items: Vec<MenuItem>,
}

#[derive(Debug, Serialize)]
struct AccessReport {
    email: String,
    role: Role,
    team: TeamId,
    allowed: bool,
}

#[derive(Debug, Serialize)]
struct NavigationStep {
    requested: String,
    landed: Option<Section>,
}

#[derive(Debug, Serialize)]
struct SessionReport {
    email: String,
    full_name: String,
    role: Role,
    steps: Vec<NavigationStep>,
    view: View,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ClubConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => ClubConfig::default(),
    };
    init_tracing(&config.log_filter);

    match cli.command {
        Commands::Menu { role } => {
            let report = menu_report(role);
            emit(cli.json, &report, || render_menu(&report))
        }
        Commands::Resolve { role, section } => {
            let landed = resolve_tag(role, &section);
            emit(cli.json, &landed, || landed.to_string())
        }
        Commands::Access { email, team } => {
            let profile = find_profile(&email)?;
            let team = TeamId::new(team);
            let report = AccessReport {
                allowed: can_access(&profile, &team),
                email,
                role: profile.role,
                team,
            };
            emit(cli.json, &report, || {
                let verdict = if report.allowed { "allowed" } else { "denied" };
                format!("{} ({}) on {}: {verdict}", report.email, report.role, report.team)
            })
        }
        Commands::Session {
            email,
            password,
            navigate,
        } => {
            let report = run_session(&config, &email, &password, &navigate).await?;
            emit(cli.json, &report, || render_session(&report))
        }
        Commands::Teams { email, search } => {
            let teams = run_teams(&config, &email, search.as_deref()).await?;
            emit(cli.json, &teams, || render_teams(&teams))
        }
    }
}

/// `RUST_LOG` wins over the configured filter
fn init_tracing(configured: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(configured))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn emit<T: Serialize>(json: bool, value: &T, text: impl FnOnce() -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", text());
    }
    Ok(())
}

fn menu_report(role: Role) -> MenuReport {
    MenuReport {
        role,
        default_section: default_section(role),
        items: menu_for(role),
    }
}

fn resolve_tag(role: Role, tag: &str) -> Section {
    let mut navigator = Navigator::new();
    let landing = navigator.authenticate(role);
    navigator.navigate_tag(tag).unwrap_or(landing)
}

fn find_profile(email: &str) -> Result<Profile> {
    let email = email.trim().to_lowercase();
    demo_profiles()
        .into_iter()
        .find(|profile| profile.email == email)
        .with_context(|| format!("no demo account for {email}"))
}

fn demo_provider(config: &ClubConfig) -> Arc<SessionProvider> {
    let directory = Arc::new(MemoryDirectory::demo(&config.session));
    Arc::new(SessionProvider::new(
        directory.clone(),
        directory,
        config.session.clone(),
    ))
}

async fn run_session(
    config: &ClubConfig,
    email: &str,
    password: &str,
    path: &[String],
) -> Result<SessionReport> {
    let provider = demo_provider(config);
    let shell = ClubShell::new(Arc::clone(&provider));

    let profile = provider
        .sign_in(email, password)
        .await
        .with_context(|| format!("sign-in as {email} failed"))?;

    let steps = path
        .iter()
        .map(|tag| NavigationStep {
            requested: tag.clone(),
            landed: shell.navigate_tag(tag),
        })
        .collect();
    let view = shell.view();
    provider.sign_out().await;

    Ok(SessionReport {
        email: profile.email.clone(),
        full_name: profile.full_name.clone(),
        role: profile.role,
        steps,
        view,
    })
}

async fn run_teams(config: &ClubConfig, email: &str, search: Option<&str>) -> Result<Vec<Team>> {
    let provider = demo_provider(config);
    let shell = ClubShell::new(Arc::clone(&provider));
    provider
        .sign_in(email, DEMO_PASSWORD)
        .await
        .with_context(|| format!("sign-in as {email} failed"))?;

    let store = Arc::new(MemoryTeams::with_teams(demo_teams()));
    let teams = shell.teams(store)?.list(search).await?;
    provider.sign_out().await;
    Ok(teams)
}

fn render_menu(report: &MenuReport) -> String {
    let mut out = format!("Menu for {}", report.role);
    for item in &report.items {
        let marker = if item.section == report.default_section { "*" } else { " " };
        out.push_str(&format!("\n {marker} {:<12} {}", item.section, item.label));
    }
    out
}

fn render_view(view: &View) -> String {
    match view {
        View::SignIn => "[sign in]".to_string(),
        View::Suspended => "[loading]".to_string(),
        View::Section { section, title, .. } => format!("[{section}] {title}"),
    }
}

fn render_session(report: &SessionReport) -> String {
    let mut out = format!(
        "Signed in as {} <{}> ({})",
        report.full_name, report.email, report.role
    );
    for step in &report.steps {
        let landed = step
            .landed
            .map_or_else(|| "-".to_string(), |section| section.to_string());
        out.push_str(&format!("\n  {} -> {landed}", step.requested));
    }
    out.push_str(&format!("\nView: {}", render_view(&report.view)));
    out
}

fn render_teams(teams: &[Team]) -> String {
    if teams.is_empty() {
        return "No teams".to_string();
    }
    teams
        .iter()
        .map(|team| format!("{:<8} {:<12} {}", team.id, team.name, team.age_group))
        .collect::<Vec<_>>()
        .join("\n")
}
