//! Shotlog CLI
//!
//! Command-line interface for Shotlog:
//! - Set up the data directory and config
//! - Manage profiles and projectiles
//! - Record and review sessions
//! - Read from a chronograph or watch it into a session

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use shotlog::config::{self, Config, LoggingConfig};
use shotlog::domain::{ProfileCategory, StatisticsReport};
use shotlog::service::{
    CatalogService, ChronoBridge, NewProfile, NewProjectile, PollOutcome, ServiceError,
    SessionService, SessionView,
};
use shotlog::storage::DataLayout;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "shotlog")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Muzzle-velocity session logger")]
#[command(long_about = "Shotlog records chronograph readings into sessions.\nEach session freezes the equipment it was shot with and reports velocity statistics.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search the usual locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the data directory
    Init,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print the effective configuration instead
        #[arg(long)]
        effective: bool,
    },

    /// Manage equipment profiles
    #[command(subcommand)]
    Profile(ProfileCommand),

    /// Manage projectiles
    #[command(subcommand)]
    Projectile(ProjectileCommand),

    /// Record and review sessions
    #[command(subcommand)]
    Session(SessionCommand),

    /// Talk to the chronograph
    #[command(subcommand)]
    Chrono(ChronoCommand),
}

#[derive(Subcommand)]
pub enum ProfileCommand {
    /// Add a profile
    Add {
        name: String,
        /// air_rifle, air_pistol, bow or firearm
        #[arg(long, default_value = "air_rifle")]
        category: String,
        #[arg(long)]
        barrel_mm: f64,
        #[arg(long)]
        trigger_g: f64,
        #[arg(long)]
        sight_height_mm: f64,
        /// Barrel twist rate (mm per turn)
        #[arg(long)]
        twist_mm: Option<f64>,
    },
    /// List profiles
    List,
}

#[derive(Subcommand)]
pub enum ProjectileCommand {
    /// Add a projectile
    Add {
        name: String,
        #[arg(long)]
        weight_g: f64,
        /// Ballistic coefficient
        #[arg(long, default_value = "0")]
        bc: f64,
    },
    /// List projectiles
    List,
    /// Update the ballistic coefficient
    SetBc { id: String, bc: f64 },
}

#[derive(Subcommand)]
pub enum SessionCommand {
    /// Start a session
    New {
        profile_id: String,
        projectile_id: String,
        /// Ambient temperature in °C
        #[arg(long, allow_negative_numbers = true)]
        temp: Option<f64>,
        #[arg(long)]
        note: Option<String>,
    },
    /// Show a session with its shots
    Show { id: String },
    /// List sessions, newest first
    List,
    /// Record a velocity in m/s
    Shot { id: String, velocity: f64 },
    /// Mark a shot as a bad reading
    Invalidate {
        id: String,
        #[arg(allow_negative_numbers = true)]
        index: i64,
    },
    /// Undo an invalidation
    Validate {
        id: String,
        #[arg(allow_negative_numbers = true)]
        index: i64,
    },
    /// Replace the note (empty clears it)
    Note { id: String, text: String },
    /// Set the temperature in °C (omit to clear)
    Temp {
        id: String,
        #[arg(allow_negative_numbers = true)]
        celsius: Option<f64>,
    },
    /// Show statistics
    Stats { id: String },
    /// Delete a session
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum ChronoCommand {
    /// Take a single reading
    Read,
    /// Record readings into a session until Ctrl-C
    Watch {
        session_id: String,
        /// Poll interval in milliseconds
        #[arg(long, default_value = "250", value_parser = clap::value_parser!(u64).range(1..))]
        interval_ms: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };

    init_tracing(&config.logging);

    match cli.command {
        Commands::Init => {
            let layout = config
                .storage
                .init_layout()
                .context("Failed to create data directory")?;
            println!("Data directory ready at {}", layout.root().display());
        }

        Commands::Config { output, effective } => {
            let content = if effective {
                toml::to_string_pretty(&config)?
            } else {
                config::generate_default_config()
            };

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &content)?;
                    println!("Config written to {:?}", path);
                }
                None => print!("{}", content),
            }
        }

        Commands::Profile(command) => {
            let catalog = CatalogService::open(&open_layout(&config)?);
            run_profile(&catalog, command, cli.json)?;
        }

        Commands::Projectile(command) => {
            let catalog = CatalogService::open(&open_layout(&config)?);
            run_projectile(&catalog, command, cli.json)?;
        }

        Commands::Session(command) => {
            let sessions = SessionService::open(&open_layout(&config)?);
            run_session(&sessions, command, cli.json)?;
        }

        Commands::Chrono(command) => {
            let sessions = SessionService::open(&open_layout(&config)?);
            run_chrono(&config, sessions, command, cli.json).await?;
        }
    }

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("shotlog={}", logging.level)));

    // Logs go to stderr so command output stays clean
    let (json, pretty) = if logging.is_json() {
        (
            Some(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)),
            None,
        )
    } else {
        (
            None,
            Some(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
        )
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(pretty)
        .init();
}

fn open_layout(config: &Config) -> anyhow::Result<DataLayout> {
    let layout = config.storage.layout();
    if !layout.is_initialized() {
        bail!(
            "No data directory at {}. Run `shotlog init` first.",
            layout.root().display()
        );
    }
    Ok(layout)
}

fn run_profile(catalog: &CatalogService, command: ProfileCommand, json: bool) -> anyhow::Result<()> {
    match command {
        ProfileCommand::Add {
            name,
            category,
            barrel_mm,
            trigger_g,
            sight_height_mm,
            twist_mm,
        } => {
            let category: ProfileCategory = category.parse()?;
            let mut profile = catalog.create_profile(NewProfile {
                name,
                category,
                barrel_length_mm: barrel_mm,
                trigger_weight_g: trigger_g,
                sight_height_mm,
            })?;
            if let Some(twist) = twist_mm {
                profile = catalog.set_twist_rate(&profile.id, twist)?;
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&profile)?);
            } else {
                println!("Created profile {} ({})", profile.name, profile.id);
            }
        }
        ProfileCommand::List => {
            let profiles = catalog.list_profiles()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&profiles)?);
            } else if profiles.is_empty() {
                println!("No profiles yet.");
                println!();
                println!("Create your first profile with:");
                println!("  shotlog profile add \"My rifle\" --barrel-mm 450 --trigger-g 1500 --sight-height-mm 50");
            } else {
                println!("{:<24} {:<12} {:<28} {}", "Name", "Category", "Optic", "ID");
                println!("{}", "-".repeat(100));
                for profile in profiles {
                    let optic = profile
                        .optic
                        .as_ref()
                        .map(|o| o.model_name.as_str())
                        .unwrap_or("-");
                    println!(
                        "{:<24} {:<12} {:<28} {}",
                        profile.name,
                        profile.category.as_str(),
                        optic,
                        profile.id
                    );
                }
            }
        }
    }
    Ok(())
}

fn run_projectile(
    catalog: &CatalogService,
    command: ProjectileCommand,
    json: bool,
) -> anyhow::Result<()> {
    match command {
        ProjectileCommand::Add { name, weight_g, bc } => {
            let projectile = catalog.create_projectile(NewProjectile { name, weight_g, bc })?;
            if json {
                println!("{}", serde_json::to_string_pretty(&projectile)?);
            } else {
                println!("Created projectile {} ({})", projectile, projectile.id);
            }
        }
        ProjectileCommand::List => {
            let projectiles = catalog.list_projectiles()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&projectiles)?);
            } else if projectiles.is_empty() {
                println!("No projectiles yet.");
            } else {
                println!("{:<24} {:<10} {:<8} {}", "Name", "Weight", "BC", "ID");
                println!("{}", "-".repeat(80));
                for p in projectiles {
                    println!(
                        "{:<24} {:<10} {:<8.3} {}",
                        p.name,
                        p.weight.to_string(),
                        p.bc,
                        p.id
                    );
                }
            }
        }
        ProjectileCommand::SetBc { id, bc } => {
            let projectile = catalog.update_bc(&id, bc)?;
            println!("Updated {}", projectile);
        }
    }
    Ok(())
}

fn run_session(sessions: &SessionService, command: SessionCommand, json: bool) -> anyhow::Result<()> {
    match command {
        SessionCommand::New {
            profile_id,
            projectile_id,
            temp,
            note,
        } => {
            let view = sessions.create_session(&profile_id, &projectile_id, temp, note.as_deref())?;
            if json {
                print_json(&view)?;
            } else {
                println!("Started session {}", view.id);
            }
        }
        SessionCommand::Show { id } => {
            let view = sessions.load_session(&id)?;
            print_view(&view, json)?;
        }
        SessionCommand::List => {
            let summaries = sessions.list_sessions()?;
            if json {
                print_json(&summaries)?;
            } else if summaries.is_empty() {
                println!("No sessions yet.");
            } else {
                println!(
                    "{:<17} {:<20} {:<20} {:>7} {:>10}  {}",
                    "Created", "Profile", "Projectile", "Shots", "Avg m/s", "ID"
                );
                println!("{}", "-".repeat(120));
                for s in summaries {
                    let avg = s
                        .avg_velocity_mps
                        .map(|v| format!("{:.2}", v))
                        .unwrap_or_else(|| "-".to_string());
                    println!(
                        "{:<17} {:<20} {:<20} {:>3}/{:<3} {:>10}  {}",
                        s.created_at.format("%Y-%m-%d %H:%M"),
                        s.profile_name,
                        s.projectile_name,
                        s.valid_shot_count,
                        s.shot_count,
                        avg,
                        s.id
                    );
                }
            }
        }
        SessionCommand::Shot { id, velocity } => {
            let view = sessions.record_shot(&id, velocity)?;
            print_update(&view, json)?;
        }
        SessionCommand::Invalidate { id, index } => {
            let view = sessions.mark_shot_invalid(&id, index)?;
            print_update(&view, json)?;
        }
        SessionCommand::Validate { id, index } => {
            let view = sessions.mark_shot_valid(&id, index)?;
            print_update(&view, json)?;
        }
        SessionCommand::Note { id, text } => {
            let view = sessions.update_note(&id, &text)?;
            print_update(&view, json)?;
        }
        SessionCommand::Temp { id, celsius } => {
            let view = sessions.set_temperature(&id, celsius)?;
            print_update(&view, json)?;
        }
        SessionCommand::Stats { id } => {
            let stats = sessions.get_statistics(&id)?;
            if json {
                print_json(&stats)?;
            } else {
                print_stats(&stats);
            }
        }
        SessionCommand::Delete { id } => {
            sessions.delete_session(&id)?;
            println!("Deleted session {}", id);
        }
    }
    Ok(())
}

async fn run_chrono(
    config: &Config,
    sessions: SessionService,
    command: ChronoCommand,
    json: bool,
) -> anyhow::Result<()> {
    match command {
        ChronoCommand::Read => {
            let bridge = ChronoBridge::from_config(config.chrono.clone(), sessions);
            let result = bridge.read_once().await;
            bridge.shutdown().await;
            let velocity = result?;
            println!("{:.2} m/s", velocity);
        }
        ChronoCommand::Watch {
            session_id,
            interval_ms,
        } => {
            // Watching is an explicit request to record
            let mut chrono = config.chrono.clone();
            chrono.enabled = true;
            chrono.auto_record = true;

            let bridge = ChronoBridge::from_config(chrono, sessions);
            let interval = Duration::from_millis(interval_ms);
            eprintln!("Watching chronograph, press Ctrl-C to stop");
            let result = watch(&bridge, &session_id, interval, json, tokio::signal::ctrl_c()).await;
            bridge.shutdown().await;
            result?;
        }
    }
    Ok(())
}

/// Poll the bridge until `shutdown` completes; data errors are reported and
/// polling goes on
///
/// `shutdown` is polled across every tick and also interrupts a poll in
/// progress.
async fn watch<F: Future>(
    bridge: &ChronoBridge,
    session_id: &str,
    interval: Duration,
    json: bool,
    shutdown: F,
) -> anyhow::Result<()> {
    let mut ticker = tokio::time::interval(interval);
    tokio::pin!(shutdown);

    loop {
        let result = tokio::select! {
            _ = &mut shutdown => break,
            result = async {
                ticker.tick().await;
                bridge.poll_and_record(session_id).await
            } => result,
        };

        match result {
            Ok(PollOutcome::Recorded { velocity_mps, session }) => {
                if json {
                    println!("{}", serde_json::to_string(&session.statistics)?);
                } else {
                    println!(
                        "#{:<3} {:.2} m/s   {}",
                        session.shots.len(),
                        velocity_mps,
                        session.statistics
                    );
                }
            }
            Ok(PollOutcome::NotRecorded) => {}
            Err(ServiceError::Chrono(e)) => {
                tracing::warn!("Chrono read failed: {}", e);
            }
            Err(e) => return Err(e.into()),
        }
    }

    eprintln!("Stopping");
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_update(view: &SessionView, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(view);
    }
    println!("{}", view.statistics);
    Ok(())
}

fn print_view(view: &SessionView, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(view);
    }

    println!("Session {}", view.id);
    println!("  Created:    {}", view.created_at.format("%Y-%m-%d %H:%M"));
    println!("  Profile:    {}", view.profile_snapshot.name);
    println!(
        "  Projectile: {} ({:.3} g, BC {:.3})",
        view.projectile_snapshot.name,
        view.projectile_snapshot.weight.grams(),
        view.projectile_snapshot.bc
    );
    if let Some(t) = view.temperature_celsius {
        println!("  Temp:       {:.1} °C", t);
    }
    if let Some(note) = &view.note {
        println!("  Note:       {}", note);
    }
    println!();

    if view.shots.is_empty() {
        println!("No shots recorded.");
        return Ok(());
    }

    println!("{:>4}  {:<12}  {:>10}  {:>9}", "#", "Time", "m/s", "J");
    for shot in &view.shots {
        println!(
            "{:>4}  {:<12}  {:>10.2}  {:>9.2}{}",
            shot.index,
            shot.timestamp.format("%H:%M:%S%.3f"),
            shot.velocity_mps,
            shot.energy_joules,
            if shot.valid { "" } else { "  (invalid)" }
        );
    }
    println!();
    print_stats(&view.statistics);
    Ok(())
}

fn print_stats(stats: &StatisticsReport) {
    println!(
        "Shots:    {} valid of {}",
        stats.valid_shot_count, stats.total_shot_count
    );
    if stats.valid_shot_count == 0 {
        return;
    }
    println!("Average:  {:.2} m/s", stats.avg_velocity_mps);
    println!("Min/Max:  {:.2} / {:.2} m/s", stats.min_velocity_mps, stats.max_velocity_mps);
    println!("ES:       {:.2} m/s", stats.extreme_spread);
    println!("SD:       {:.2} m/s", stats.standard_deviation);
    println!("Energy:   {:.2} J", stats.avg_energy_joules);
}
