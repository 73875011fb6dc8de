//! Command-line front end.
//!
//! Parses arguments with clap, wires the config, local storage, connection
//! holder and coach together, and prints results. Everything below the
//! presentation layer lives in the library modules; this file only formats.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use log::debug;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::coach::{Coach, Conversation, GeminiClient, Topic};
use crate::config::Config;
use crate::connection::{ConnectionManager, EnvDefaults};
use crate::constants::{
    AVATAR_MAX_BYTES, ERROR_NOT_CONFIGURED, SUCCESS_AVATAR_UPDATED, SUCCESS_CONFIG_CLEARED, SUCCESS_CONFIG_SAVED,
    SUCCESS_LOGGED_OUT, SUCCESS_WORKOUT_SAVED,
};
use crate::data::{AvatarFile, DataService};
use crate::logger::Logger;
use crate::models::{Exercise, User, Workout, WorkoutSet};
use crate::stats::{dashboard_stats, format_volume_k, recent_activity, FEED_SIZE};
use crate::storage::{LocalStorage, SettingsStore};
use crate::utils::datetime::format_with;

#[derive(Parser)]
#[command(
    name = "fittrack",
    version,
    about = "Workout tracker with an AI coach",
    long_about = "Log workouts to your Supabase project, review your stats, and ask a Gemini-powered coach for plans and feedback."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file override
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Backend connection settings
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },

    /// Create an account
    Register {
        #[arg(long)]
        email: String,
        /// Display name
        #[arg(long)]
        name: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },

    /// Sign in
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Sign out
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Workout history and logging
    Workouts {
        #[command(subcommand)]
        action: WorkoutsCommand,
    },

    /// Dashboard statistics
    Stats,

    /// Ask the AI coach
    Coach {
        #[command(subcommand)]
        action: CoachCommand,
    },

    /// Upload a new avatar image
    Avatar {
        /// Image file to upload
        path: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the resolved configuration
    Show,
    /// Save the Supabase project URL and anon key
    Set { url: String, key: String },
    /// Remove saved Supabase credentials
    Clear,
    /// Write a default configuration file
    Init {
        /// Destination (defaults to the user config directory)
        path: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum WorkoutsCommand {
    /// List workouts, newest first
    List {
        /// Include other users' workouts
        #[arg(long)]
        all: bool,
    },
    /// Log a workout
    Log {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        notes: String,
        /// Exercise and sets, e.g. "Squat:5x135,5x185" (repeatable)
        #[arg(long = "exercise", short = 'e')]
        exercises: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum CoachCommand {
    /// Generate a workout plan
    Plan {
        /// What you want to train
        #[arg(required = true)]
        prompt: Vec<String>,
    },
    /// Analyze your recent workouts
    Analyze,
    /// Suggest exercises for a muscle group
    Suggest { muscle_group: String },
    /// Interactive chat
    Chat,
}

/// Parse `NAME:REPSxWEIGHT,REPSxWEIGHT,...` into an exercise with completed sets.
pub fn parse_exercise_spec(spec: &str) -> Result<Exercise> {
    let (name, sets) = spec
        .split_once(':')
        .ok_or_else(|| anyhow!("Exercise '{}' must look like NAME:REPSxWEIGHT,...", spec))?;
    let name = name.trim();
    if name.is_empty() {
        bail!("Exercise '{}' has no name", spec);
    }

    let sets = sets
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|set| {
            let (reps, weight) = set
                .split_once(['x', 'X'])
                .ok_or_else(|| anyhow!("Set '{}' must look like REPSxWEIGHT", set))?;
            let reps: u32 = reps
                .trim()
                .parse()
                .with_context(|| format!("Invalid reps in set '{set}'"))?;
            let weight: f64 = weight
                .trim()
                .parse()
                .with_context(|| format!("Invalid weight in set '{set}'"))?;
            if !weight.is_finite() || weight < 0.0 {
                bail!("Invalid weight in set '{}'", set);
            }
            Ok(WorkoutSet::new(reps, weight, true))
        })
        .collect::<Result<Vec<_>>>()?;

    if sets.is_empty() {
        bail!("Exercise '{}' has no sets", name);
    }
    Ok(Exercise::with_sets(name, sets))
}

/// Render a weight without a trailing `.0`
pub fn format_weight(weight: f64) -> String {
    if weight.fract() == 0.0 {
        format!("{weight:.0}")
    } else {
        format!("{weight}")
    }
}

struct App {
    config: Config,
    connection: ConnectionManager,
    coach: Coach,
}

impl App {
    async fn data(&self) -> DataService {
        self.connection
            .data_service()
            .await
            .with_avatar_bucket(self.config.backend.avatar_bucket.clone())
    }

    async fn require_configured(&self) -> Result<bool> {
        if self.connection.is_configured().await? {
            Ok(true)
        } else {
            println!("{}", ERROR_NOT_CONFIGURED);
            Ok(false)
        }
    }

    async fn require_user(&self, data: &DataService) -> Result<User> {
        data.restore_session()
            .await?
            .ok_or_else(|| anyhow!("Not logged in. Run `fittrack login` first."))
    }

    fn date(&self, workout: &Workout) -> String {
        format_with(&workout.date, &self.config.display.date_format)
    }

    fn print_workout(&self, workout: &Workout) {
        let unit = &self.config.display.weight_unit;
        println!(
            "{}  {}  by {}  ({} exercises, {} {})",
            self.date(workout),
            workout.name,
            workout.user_name,
            workout.exercises.len(),
            format_weight(workout.volume()),
            unit
        );
        for exercise in &workout.exercises {
            let sets: Vec<String> = exercise
                .sets
                .iter()
                .map(|s| format!("{}x{}", s.reps, format_weight(s.weight)))
                .collect();
            println!("    - {}: {}", exercise.name, sets.join(", "));
        }
        if !workout.notes.is_empty() {
            println!("    notes: {}", workout.notes);
        }
    }
}

/// Run the CLI.
pub async fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::load()?,
    };
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }

    let logger = Logger::from_config(&config.logging)?;
    logger.init()?;

    let settings: Arc<dyn SettingsStore> = match config.database_path() {
        Some(path) => Arc::new(LocalStorage::open(&path).await?),
        None => Arc::new(LocalStorage::in_memory().await?),
    };
    let env = EnvDefaults::from_config(&config);
    let model = GeminiClient::from_config(&config.coach, env.gemini_api_key.as_deref());
    let coach = Coach::new(Arc::new(model)).with_history_window(config.coach.history_window);
    let connection = ConnectionManager::new(settings, env).await?;

    let app = App {
        config,
        connection,
        coach,
    };
    debug!("CLI initialized");

    match cli.command {
        Command::Config { action } => config_command(&app, action).await,
        Command::Register {
            email,
            name,
            username,
            password,
        } => {
            if !app.require_configured().await? {
                return Ok(());
            }
            let user = app.data().await.register(&email, &name, &username, &password).await?;
            println!("✅ Welcome, {} (@{})", user.first_name(), user.username);
            Ok(())
        }
        Command::Login { email, password } => {
            if !app.require_configured().await? {
                return Ok(());
            }
            let user = app.data().await.login(&email, &password).await?;
            println!("✅ Welcome back, {}", user.first_name());
            Ok(())
        }
        Command::Logout => {
            if !app.require_configured().await? {
                return Ok(());
            }
            app.data().await.logout().await?;
            println!("{}", SUCCESS_LOGGED_OUT);
            Ok(())
        }
        Command::Whoami => {
            if !app.require_configured().await? {
                return Ok(());
            }
            match app.data().await.restore_session().await? {
                Some(user) => {
                    println!("{} (@{})", user.name, user.username);
                    println!("id:     {}", user.id);
                    println!("avatar: {}", user.avatar);
                    println!("joined: {}", format_with(&user.joined_date, &app.config.display.date_format));
                }
                None => println!("Not logged in."),
            }
            Ok(())
        }
        Command::Workouts { action } => workouts_command(&app, action).await,
        Command::Stats => stats_command(&app).await,
        Command::Coach { action } => coach_command(&app, action).await,
        Command::Avatar { path } => {
            if !app.require_configured().await? {
                return Ok(());
            }
            let file = AvatarFile::from_path(&path)?;
            file.check_image(AVATAR_MAX_BYTES)?;
            let user = app.data().await.upload_avatar(file).await?;
            println!("{}: {}", SUCCESS_AVATAR_UPDATED, user.avatar);
            Ok(())
        }
    }
}

async fn config_command(app: &App, action: ConfigCommand) -> Result<()> {
    match action {
        ConfigCommand::Show => {
            let credentials = app.connection.resolve_credentials().await?;
            let backend = app.connection.current().await;
            println!("backend:    {} ({})", backend.backend_type(), backend.endpoint());
            match credentials {
                Some(c) => println!("url:        {}", c.url),
                None => println!("url:        (not set)"),
            }
            println!("configured: {}", app.connection.is_configured().await?);
            println!("coach:      {}", app.coach.model_name());
            println!(
                "coach key:  {}",
                if app.connection.env().gemini_api_key.is_some() { "set" } else { "missing" }
            );
            Ok(())
        }
        ConfigCommand::Set { url, key } => {
            if url.trim().is_empty() || key.trim().is_empty() {
                bail!("Both URL and Key are required");
            }
            app.connection.save_config(&url, &key).await?;
            println!("{}", SUCCESS_CONFIG_SAVED);
            Ok(())
        }
        ConfigCommand::Clear => {
            app.connection.clear_config().await?;
            println!("{}", SUCCESS_CONFIG_CLEARED);
            Ok(())
        }
        ConfigCommand::Init { path } => {
            let path = match path {
                Some(path) => path,
                None => Config::get_default_config_path()?,
            };
            Config::generate_default_config(path)
        }
    }
}

async fn workouts_command(app: &App, action: WorkoutsCommand) -> Result<()> {
    if !app.require_configured().await? {
        return Ok(());
    }
    let data = app.data().await;
    let user = app.require_user(&data).await?;

    match action {
        WorkoutsCommand::List { all } => {
            let workouts = if all {
                data.list_workouts().await?
            } else {
                data.list_user_workouts(&user.id).await?
            };
            if workouts.is_empty() {
                println!("No workouts yet. Start tracking today!");
            }
            for workout in &workouts {
                app.print_workout(workout);
            }
            Ok(())
        }
        WorkoutsCommand::Log { name, notes, exercises } => {
            let mut workout = Workout::draft(&user, name, notes);
            for spec in &exercises {
                workout.add_exercise(parse_exercise_spec(spec)?);
            }
            workout.validate()?;

            data.save_workout(&workout).await?;
            println!("{}: {} ({} sets)", SUCCESS_WORKOUT_SAVED, workout.name, workout.set_count());
            Ok(())
        }
    }
}

async fn stats_command(app: &App) -> Result<()> {
    if !app.require_configured().await? {
        return Ok(());
    }
    let data = app.data().await;
    let user = app.require_user(&data).await?;
    let workouts = data.list_workouts().await?;
    let stats = dashboard_stats(&workouts, &user.id);
    let unit = &app.config.display.weight_unit;

    println!("Welcome back, {}", user.first_name());
    println!();
    println!("Total workouts: {}", stats.total_workouts);
    println!("Volume lifted:  {} {}", format_volume_k(stats.total_volume), unit);
    match &stats.last_session {
        Some(last) => println!(
            "Last session:   {} ({})",
            last.name,
            format_with(&last.date, &app.config.display.date_format)
        ),
        None => println!("Last session:   No workouts yet"),
    }

    if !stats.chart.is_empty() {
        println!();
        println!("Volume, last {} sessions:", stats.chart.len());
        let max = stats.chart.iter().map(|p| p.volume).fold(0.0_f64, f64::max);
        for point in &stats.chart {
            let width = if max > 0.0 { (point.volume / max * 30.0).round() as usize } else { 0 };
            println!("  {:>6} {} {}", point.label, "█".repeat(width), format_weight(point.volume));
        }
    }

    let feed = recent_activity(&workouts, FEED_SIZE);
    if !feed.is_empty() {
        println!();
        println!("Recent activity:");
        for entry in feed {
            println!(
                "  {} did {} ({} exercises) on {}",
                entry.owner,
                entry.workout_name,
                entry.exercise_count,
                format_with(&entry.date, &app.config.display.date_format)
            );
        }
    }
    Ok(())
}

async fn user_workouts(app: &App) -> Result<Option<Vec<Workout>>> {
    if !app.require_configured().await? {
        return Ok(None);
    }
    let data = app.data().await;
    let user = app.require_user(&data).await?;
    Ok(Some(data.list_user_workouts(&user.id).await?))
}

async fn coach_command(app: &App, action: CoachCommand) -> Result<()> {
    match action {
        CoachCommand::Plan { prompt } => {
            let reply = app.coach.generate_plan(&prompt.join(" ")).await;
            println!("{}", reply.display_text(Topic::Plan));
        }
        CoachCommand::Analyze => {
            let Some(workouts) = user_workouts(app).await? else {
                return Ok(());
            };
            let reply = app.coach.analyze_history(&workouts).await;
            println!("{}", reply.display_text(Topic::Analysis));
        }
        CoachCommand::Suggest { muscle_group } => {
            let suggestions = app.coach.suggest_exercises(&muscle_group).await;
            if suggestions.is_empty() {
                println!("No suggestions available right now.");
            }
            for (i, name) in suggestions.iter().enumerate() {
                println!("{}. {}", i + 1, name);
            }
        }
        CoachCommand::Chat => {
            let workouts = user_workouts(app).await?.unwrap_or_default();
            chat(app, &workouts).await?;
        }
    }
    Ok(())
}

async fn chat(app: &App, workouts: &[Workout]) -> Result<()> {
    let mut conversation = Conversation::new();
    if let Some(greeting) = conversation.messages().first() {
        println!("coach> {}", greeting.text);
    }
    println!("Try: {}", Conversation::suggestion_chips().join(" | "));
    println!("(type `exit` to quit)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        stdout.write_all(b"you> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if matches!(line.trim(), "exit" | "quit") {
            break;
        }
        if let Some(reply) = conversation.send(&app.coach, &line, workouts).await {
            println!("coach> {}", reply.text);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_exercise_spec() {
        let exercise = parse_exercise_spec("Squat:5x135,5x185").unwrap();
        assert_eq!(exercise.name, "Squat");
        let sets: Vec<(u32, f64, bool)> = exercise.sets.iter().map(|s| (s.reps, s.weight, s.completed)).collect();
        assert_eq!(sets, vec![(5, 135.0, true), (5, 185.0, true)]);
    }

    #[test]
    fn parses_fractional_weights_and_spaces() {
        let exercise = parse_exercise_spec(" Bench Press : 8 x 62.5 , 6X70 ").unwrap();
        assert_eq!(exercise.name, "Bench Press");
        assert_eq!(exercise.sets[0].weight, 62.5);
        assert_eq!(exercise.sets[1].reps, 6);
    }

    #[test]
    fn rejects_malformed_specs() {
        assert!(parse_exercise_spec("Squat").is_err());
        assert!(parse_exercise_spec(":5x100").is_err());
        assert!(parse_exercise_spec("Squat:").is_err());
        assert!(parse_exercise_spec("Squat:five x 100").is_err());
        assert!(parse_exercise_spec("Squat:5x-10").is_err());
    }

    #[test]
    fn weights_drop_trailing_zero() {
        assert_eq!(format_weight(135.0), "135");
        assert_eq!(format_weight(62.5), "62.5");
    }

    #[test]
    fn log_command_collects_repeated_exercises() {
        let cli = Cli::try_parse_from([
            "fittrack",
            "workouts",
            "log",
            "--name",
            "Leg Day",
            "-e",
            "Squat:5x135",
            "--exercise",
            "Lunge:10x40",
        ])
        .unwrap();
        match cli.command {
            Command::Workouts {
                action: WorkoutsCommand::Log { name, exercises, notes },
            } => {
                assert_eq!(name, "Leg Day");
                assert_eq!(notes, "");
                assert_eq!(exercises.len(), 2);
            }
            _ => panic!("expected workouts log"),
        }
    }
}
