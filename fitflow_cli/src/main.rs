use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use fitflow_core::achievements::AchievementInputs;
use fitflow_core::bioimpedance::MeasurementDraft;
use fitflow_core::nutrition::{DailyGoals, MealType};
use fitflow_core::progress::{body_report, nutrition_report, workout_report, ProgressEntry};
use fitflow_core::trainer::{StudentDraft, StudentStatus};
use fitflow_core::*;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "fitflow")]
#[command(about = "Workout sessions, nutrition and progress tracking", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage workout templates
    #[command(subcommand)]
    Templates(TemplateCommand),

    /// Run the active workout session
    #[command(subcommand)]
    Workout(WorkoutCommand),

    /// Show finished workouts, newest first
    History {
        /// Only the last N days
        #[arg(long)]
        days: Option<i64>,
    },

    /// Food search and meal logging
    #[command(subcommand)]
    Food(FoodCommand),

    /// Recompute and list achievements
    Achievements,

    /// Body weight log and period summaries
    #[command(subcommand)]
    Progress(ProgressCommand),

    /// Bioimpedance measurements
    #[command(subcommand)]
    Bio(BioCommand),

    /// Trainer mode: student roster
    #[command(subcommand)]
    Students(StudentCommand),

    /// User settings
    #[command(subcommand)]
    Settings(SettingsCommand),

    /// Summarize workouts, nutrition and weight over a period
    Report {
        /// Period length in days, ending now
        #[arg(long, default_value_t = 30)]
        days: i64,

        /// Output format (text, csv)
        #[arg(long, default_value = "text")]
        format: String,

        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum TemplateCommand {
    /// List all templates
    List,
    /// Show one template with its exercises
    Show { id: String },
    /// Create a template from library exercises
    Create {
        #[arg(long)]
        name: String,

        #[arg(long, default_value = "Custom")]
        category: String,

        #[arg(long, default_value = "Intermediate")]
        difficulty: String,

        #[arg(long, default_value = "45 min")]
        duration: String,

        #[arg(long)]
        description: Option<String>,

        /// Exercise as `library-id:sets:reps:rest`, e.g. `1:4:8-10:90s`
        #[arg(long = "exercise", required = true)]
        exercises: Vec<String>,
    },
    /// Delete a template
    Delete { id: String },
}

#[derive(Subcommand)]
enum WorkoutCommand {
    /// Start a workout from a template
    Start { template_id: String },
    /// Log a set for the current exercise
    Set {
        reps: u32,

        /// Weight in kg
        #[arg(long)]
        weight: Option<f64>,
    },
    /// Start the rest countdown for the current exercise
    Rest {
        /// Count down in the foreground until the rest is over
        #[arg(long)]
        wait: bool,
    },
    /// End the rest countdown early
    SkipRest,
    /// Move on to the next exercise
    Next,
    /// Finish the workout and record it
    End,
    /// Drop the workout without recording it
    Discard,
    /// Show the active workout
    Status,
}

#[derive(Subcommand)]
enum FoodCommand {
    /// Search the food database by name or category
    Search {
        #[arg(default_value = "")]
        query: String,
    },
    /// Log a portion of food
    Add {
        food_id: String,
        grams: f64,

        /// breakfast, lunch, snack or dinner
        #[arg(long)]
        meal: MealType,
    },
    /// Remove a logged item
    Remove { item_id: String },
    /// Today's totals against the daily goals
    Totals {
        #[arg(long)]
        meal: Option<MealType>,

        /// Day to total (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[derive(Subcommand)]
enum ProgressCommand {
    /// Record a weigh-in
    Add {
        weight: f64,

        #[arg(long)]
        body_fat: Option<f64>,

        #[arg(long)]
        muscle: Option<f64>,
    },
    /// Summaries for a time window (7d, 30d, 90d, 1y, all)
    Summary {
        #[arg(long, default_value = "30d")]
        filter: TimeFilter,
    },
}

#[derive(Subcommand)]
enum BioCommand {
    /// Record a measurement
    Add {
        #[arg(long)]
        student: String,

        #[arg(long)]
        weight: f64,

        /// Height in cm
        #[arg(long)]
        height: f64,

        /// Body fat percentage
        #[arg(long)]
        fat: f64,

        /// Muscle mass in kg
        #[arg(long)]
        muscle: f64,

        #[arg(long)]
        notes: Option<String>,
    },
    /// Compare a student's two latest measurements
    Trend { student: String },
}

#[derive(Subcommand)]
enum StudentCommand {
    /// List students
    List,
    /// Add a student
    Add {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long, default_value = "Basic")]
        plan: String,

        /// active, inactive or pending
        #[arg(long, default_value = "pending")]
        status: StudentStatus,
    },
    /// Remove a student
    Remove { id: String },
    /// Set a student's progress percentage
    Progress { id: String, percent: u8 },
}

#[derive(Subcommand)]
enum SettingsCommand {
    /// Print current settings
    Show,
    /// Switch trainer mode on or off
    ToggleTrainer,
    /// Restore default settings
    Reset,
    /// Export settings as JSON
    Export {
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

/// Rings the terminal bell on workout cues
struct BellCues;

impl CueSink for BellCues {
    fn play(&mut self, cue: Cue) {
        tracing::debug!("Cue {:?}", cue);
        eprint!("\x07");
        let _ = io::stderr().flush();
    }
}

fn main() -> Result<()> {
    // Initialize logging
    fitflow_core::logging::init();

    let cli = Cli::parse();

    // Built-in reference data must be consistent before anything uses it
    get_default_catalog().ensure_valid()?;

    // Determine data directory
    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let mut store = JsonDirStore::new(&data_dir);

    match cli.command {
        Commands::Templates(cmd) => cmd_templates(&mut store, cmd),
        Commands::Workout(cmd) => cmd_workout(store, cmd, &config),
        Commands::History { days } => cmd_history(&store, days),
        Commands::Food(cmd) => cmd_food(&mut store, cmd, &config),
        Commands::Achievements => cmd_achievements(&mut store, &config),
        Commands::Progress(cmd) => cmd_progress(&mut store, cmd, &config),
        Commands::Bio(cmd) => cmd_bio(&mut store, cmd, &config),
        Commands::Students(cmd) => cmd_students(&mut store, cmd),
        Commands::Settings(cmd) => cmd_settings(&mut store, cmd),
        Commands::Report {
            days,
            format,
            output,
        } => cmd_report(&store, days, &format, output.as_deref(), &config),
    }
}

fn nutrition_log(store: &JsonDirStore, config: &Config) -> NutritionLog {
    NutritionLog::load_or(store, DailyGoals::from(config.nutrition.clone()))
}

// ============================================================================
// Templates
// ============================================================================

fn parse_exercise_spec(spec: &str) -> Result<TemplateExercise> {
    let parts: Vec<&str> = spec.split(':').collect();
    let [id, sets, reps, rest] = parts.as_slice() else {
        return Err(Error::Validation(format!(
            "exercise '{}' must look like id:sets:reps:rest",
            spec
        )));
    };

    let exercise = get_default_catalog()
        .find_exercise(id)
        .cloned()
        .ok_or_else(|| Error::Validation(format!("unknown exercise id '{}'", id)))?;
    let sets: u32 = sets
        .parse()
        .map_err(|_| Error::Validation(format!("invalid set count '{}'", sets)))?;
    let rest = parse_rest_seconds(rest)
        .ok_or_else(|| Error::Validation(format!("invalid rest '{}'", rest)))?;

    Ok(TemplateExercise::new(exercise, sets, *reps, rest))
}

fn cmd_templates(store: &mut JsonDirStore, cmd: TemplateCommand) -> Result<()> {
    match cmd {
        TemplateCommand::List => {
            let library = TemplateLibrary::load(store);
            if library.is_empty() {
                println!("No templates.");
            }
            for t in library.iter() {
                println!(
                    "{}  {}  [{} · {} · {}]  {} exercises",
                    t.id,
                    t.name,
                    t.category,
                    t.difficulty,
                    t.duration,
                    t.exercises.len()
                );
            }
        }
        TemplateCommand::Show { id } => {
            let library = TemplateLibrary::load(store);
            let template = library
                .get(&id)
                .ok_or_else(|| Error::Validation(format!("no template with id '{}'", id)))?;
            println!("{} ({})", template.name, template.duration);
            if let Some(ref description) = template.description {
                println!("  {}", description);
            }
            for (i, ex) in template.exercises.iter().enumerate() {
                println!(
                    "  {}. {}  {} x {}  rest {}",
                    i + 1,
                    ex.name(),
                    ex.sets,
                    ex.reps,
                    format_time(ex.rest_seconds)
                );
            }
        }
        TemplateCommand::Create {
            name,
            category,
            difficulty,
            duration,
            description,
            exercises,
        } => {
            let exercises = exercises
                .iter()
                .map(|s| parse_exercise_spec(s))
                .collect::<Result<Vec<_>>>()?;
            let draft = TemplateDraft {
                name,
                category,
                difficulty,
                duration,
                description,
                exercises,
            };
            let id = TemplateLibrary::update(store, |library| {
                library.create(draft).map(|t| t.id.clone())
            })?;
            println!("✓ Created template {}", id);
        }
        TemplateCommand::Delete { id } => {
            let removed = TemplateLibrary::update(store, |library| Ok(library.delete(&id)))?;
            if removed {
                println!("✓ Deleted template {}", id);
            } else {
                println!("No template with id {}", id);
            }
        }
    }
    Ok(())
}

// ============================================================================
// Workout
// ============================================================================

fn cmd_workout(store: JsonDirStore, cmd: WorkoutCommand, config: &Config) -> Result<()> {
    let mut controller =
        WorkoutController::open(store).with_default_rest(config.workout.default_rest_seconds);
    if config.workout.cue_bell {
        controller = controller.with_cues(BellCues);
    }

    match cmd {
        WorkoutCommand::Start { template_id } => {
            let library = TemplateLibrary::load(controller.store());
            let template = library.get(&template_id).cloned().ok_or_else(|| {
                Error::Validation(format!("no template with id '{}'", template_id))
            })?;
            controller.start_workout(&template)?;
            println!("✓ Started {}", template.name);
            display_session(&controller);
        }
        WorkoutCommand::Set { reps, weight } => {
            if controller.timer_state().is_resting {
                println!("Resting ({} left). Skip the rest to log a set.", controller.rest_display());
                return Ok(());
            }
            controller.complete_set(reps, weight)?;
            display_session(&controller);
        }
        WorkoutCommand::Rest { wait } => {
            controller.start_rest()?;
            if !wait {
                display_session(&controller);
                return Ok(());
            }
            while controller.timer_state().is_resting {
                print!("\r  Rest {} ", controller.rest_display());
                io::stdout().flush()?;
                thread::sleep(Duration::from_secs(1));
                if controller.tick()? == Some(TimerEvent::RestComplete) {
                    break;
                }
            }
            println!("\r  Rest over!   ");
            display_session(&controller);
        }
        WorkoutCommand::SkipRest => {
            controller.skip_rest()?;
            display_session(&controller);
        }
        WorkoutCommand::Next => {
            if controller.is_last_exercise() {
                println!("Last exercise. Use `fitflow workout end` to finish.");
            }
            controller.next_exercise()?;
            display_session(&controller);
        }
        WorkoutCommand::End => match controller.end_workout()? {
            Some(summary) => {
                println!("✓ Workout complete: {}", summary.name);
                println!("  Duration: {} min", summary.duration_minutes);
                println!("  Sets: {}", summary.completed_sets);
                println!("  Reps: {}", summary.total_reps);
                let mut store = controller.into_store();
                report_unlocks(&mut store, config)?;
            }
            None => println!("No active workout."),
        },
        WorkoutCommand::Discard => {
            if controller.discard_workout()? {
                println!("✓ Workout discarded");
            } else {
                println!("No active workout.");
            }
        }
        WorkoutCommand::Status => display_session(&controller),
    }
    Ok(())
}

fn display_session(controller: &WorkoutController<JsonDirStore>) {
    let Some(session) = controller.session() else {
        println!("No active workout.");
        return;
    };

    println!();
    println!("  {}  ({} elapsed)", session.template.name, controller.elapsed_display());
    if let Some(ex) = controller.current_exercise() {
        println!(
            "  Exercise {}/{}: {}",
            session.current_exercise_index + 1,
            session.template.exercises.len(),
            ex.name()
        );
        let done = session.current_set.saturating_sub(1);
        println!("  Sets: {}/{}  target {} reps", done, ex.sets, ex.reps);
        if controller.is_exercise_complete() {
            println!("  → All sets done");
        }
    }
    if session.is_resting() {
        println!("  Resting: {} left", controller.rest_display());
    }
    println!("  Total reps: {}", session.total_reps());
    println!();
}

// ============================================================================
// History, food, achievements
// ============================================================================

fn cmd_history(store: &JsonDirStore, days: Option<i64>) -> Result<()> {
    let history = WorkoutHistory::load(store);
    let workouts: Vec<&CompletedWorkout> = match days {
        Some(days) => history.recent(days, Utc::now()),
        None => history.entries().iter().collect(),
    };

    if workouts.is_empty() {
        println!("No workouts recorded.");
        return Ok(());
    }
    for w in workouts {
        println!(
            "{}  {}  {} min  {} sets  {} reps",
            w.date.format("%Y-%m-%d %H:%M"),
            w.name,
            w.duration_minutes,
            w.completed_sets,
            w.total_reps
        );
    }
    Ok(())
}

fn cmd_food(store: &mut JsonDirStore, cmd: FoodCommand, config: &Config) -> Result<()> {
    match cmd {
        FoodCommand::Search { query } => {
            let foods = search_foods(&query);
            if foods.is_empty() {
                println!("No foods match '{}'", query);
            }
            for f in foods {
                println!(
                    "{}  {} ({})  {} kcal  P {}  C {}  F {}  per 100g",
                    f.id,
                    f.name,
                    f.category,
                    f.calories_per_100g,
                    f.protein_per_100g,
                    f.carbs_per_100g,
                    f.fat_per_100g
                );
            }
        }
        FoodCommand::Add {
            food_id,
            grams,
            meal,
        } => {
            let food = get_default_catalog()
                .find_food(&food_id)
                .cloned()
                .ok_or_else(|| Error::Validation(format!("unknown food id '{}'", food_id)))?;
            let name = food.name.clone();
            let mut log = nutrition_log(store, config);
            let id = log.add_item(food, grams, meal, Utc::now())?;
            log.save(store)?;
            println!("✓ Logged {}g of {} for {} ({})", grams, name, meal, id);
            report_unlocks(store, config)?;
        }
        FoodCommand::Remove { item_id } => {
            let mut log = nutrition_log(store, config);
            if log.remove_item(&item_id) {
                log.save(store)?;
                println!("✓ Removed {}", item_id);
            } else {
                println!("No logged item with id {}", item_id);
            }
        }
        FoodCommand::Totals { meal, date } => {
            let log = nutrition_log(store, config);
            let day = date.unwrap_or_else(|| Utc::now().date_naive());
            let totals = match meal {
                Some(meal) => log.totals_by_meal(day, meal),
                None => log.daily_totals(day),
            };
            let goals = log.daily_goals;
            println!("{}{}", day, meal.map(|m| format!(" ({})", m)).unwrap_or_default());
            println!("  Calories: {} / {} kcal", totals.calories, goals.calories);
            println!("  Protein:  {} / {} g", totals.protein, goals.protein);
            println!("  Carbs:    {} / {} g", totals.carbs, goals.carbs);
            println!("  Fat:      {} / {} g", totals.fat, goals.fat);
        }
    }
    Ok(())
}

/// Re-evaluate achievements and announce new unlocks
fn report_unlocks(store: &mut JsonDirStore, config: &Config) -> Result<AchievementBoard> {
    let history = WorkoutHistory::load(store);
    let nutrition = nutrition_log(store, config);
    let body = BodyProgress::load(store);

    let mut board = AchievementBoard::load(store);
    let inputs = AchievementInputs {
        history: &history,
        nutrition: &nutrition,
        body: &body,
    };
    for a in board.evaluate(&inputs, Utc::now()) {
        println!("🏆 Achievement unlocked: {}", a.title);
    }
    board.save(store)?;
    Ok(board)
}

fn cmd_achievements(store: &mut JsonDirStore, config: &Config) -> Result<()> {
    let board = report_unlocks(store, config)?;
    for a in board.achievements() {
        let mark = if a.is_unlocked() { "✓" } else { " " };
        println!(
            "[{}] {}  {}  ({}/{})",
            mark, a.title, a.description, a.progress, a.max_progress
        );
    }
    let summary = board.summary();
    println!(
        "\n{}/{} unlocked ({:.0}%)",
        summary.unlocked, summary.total, summary.percentage
    );
    Ok(())
}

// ============================================================================
// Progress and bioimpedance
// ============================================================================

fn cmd_progress(store: &mut JsonDirStore, cmd: ProgressCommand, config: &Config) -> Result<()> {
    match cmd {
        ProgressCommand::Add {
            weight,
            body_fat,
            muscle,
        } => {
            let mut progress = BodyProgress::load(store);
            progress.add(ProgressEntry {
                date: Utc::now(),
                weight,
                body_fat,
                muscle,
                measurements: None,
            })?;
            progress.save(store)?;
            println!("✓ Recorded {} kg", weight);
            report_unlocks(store, config)?;
        }
        ProgressCommand::Summary { filter } => {
            let now = Utc::now();
            let body = body_report(&BodyProgress::load(store), filter, now);
            let workouts = workout_report(&WorkoutHistory::load(store), filter, now);
            let nutrition = nutrition_report(&nutrition_log(store, config), filter, now);

            println!("Body: {} entries, change {:+.1} kg", body.total_entries, body.weight_change);
            if let Some(avg) = body.avg_weight {
                println!("  Average weight: {:.1} kg", avg);
            }
            println!(
                "Workouts: {} ({} min, {} reps)",
                workouts.total_workouts, workouts.total_duration_minutes, workouts.total_reps
            );
            if let Some(avg) = workouts.avg_duration_minutes {
                println!("  Average duration: {:.0} min", avg);
            }
            println!("Nutrition: {} days logged", nutrition.total_days);
            if let (Some(kcal), Some(protein)) = (nutrition.avg_calories, nutrition.avg_protein) {
                println!("  Average: {:.0} kcal, {:.0} g protein", kcal, protein);
            }
        }
    }
    Ok(())
}

fn cmd_bio(store: &mut JsonDirStore, cmd: BioCommand, config: &Config) -> Result<()> {
    match cmd {
        BioCommand::Add {
            student,
            weight,
            height,
            fat,
            muscle,
            notes,
        } => {
            let mut records = BioimpedanceRecords::load(store);
            let id = records.add_measurement(MeasurementDraft {
                student_id: student.clone(),
                date: Utc::now(),
                weight,
                height,
                body_fat_percentage: fat,
                muscle_mass: muscle,
                notes,
                ..Default::default()
            })?;
            records.save(store)?;
            if let Some(m) = records.latest(&student) {
                println!("✓ Recorded measurement {} (BMI {:.1})", id, m.bmi);
            }
        }
        BioCommand::Trend { student } => {
            let records = BioimpedanceRecords::load(store);
            let Some(progress) = records.progress_with(&student, &config.trends) else {
                println!("No measurements for student {}", student);
                return Ok(());
            };
            let c = &progress.changes;
            println!("Trend: {}", progress.trend);
            println!("  Weight:   {:+.1} kg", c.weight);
            println!("  Body fat: {:+.1} %", c.body_fat);
            println!("  Muscle:   {:+.1} kg", c.muscle_mass);
        }
    }
    Ok(())
}

// ============================================================================
// Trainer mode and settings
// ============================================================================

fn cmd_students(store: &mut JsonDirStore, cmd: StudentCommand) -> Result<()> {
    let mut roster = Roster::load(store);
    match cmd {
        StudentCommand::List => {
            for s in roster.students() {
                println!("{}  {}  {}  {}  {}%", s.id, s.name, s.plan, s.status, s.progress);
            }
            let stats = roster.stats();
            println!("{} students, {} active", stats.total_students, stats.active_students);
            return Ok(());
        }
        StudentCommand::Add {
            name,
            email,
            plan,
            status,
        } => {
            let id = roster.add_student(StudentDraft {
                name,
                email,
                phone: None,
                age: None,
                plan,
                status,
                join_date: Utc::now().date_naive(),
            })?;
            println!("✓ Added student {}", id);
        }
        StudentCommand::Remove { id } => {
            if roster.remove_student(&id) {
                println!("✓ Removed student {}", id);
            } else {
                println!("No student with id {}", id);
            }
        }
        StudentCommand::Progress { id, percent } => {
            roster.update_progress(&id, percent)?;
            println!("✓ Progress updated");
        }
    }
    roster.save(store)
}

fn cmd_settings(store: &mut JsonDirStore, cmd: SettingsCommand) -> Result<()> {
    let mut settings = Settings::load(store);
    match cmd {
        SettingsCommand::Show => {
            println!("{}", settings.export_json(Utc::now())?);
            return Ok(());
        }
        SettingsCommand::ToggleTrainer => {
            let on = settings.toggle_trainer_mode();
            println!("Trainer mode {}", if on { "on" } else { "off" });
        }
        SettingsCommand::Reset => {
            settings.reset_to_defaults();
            println!("✓ Settings reset");
        }
        SettingsCommand::Export { output } => {
            let json = settings.export_json(Utc::now())?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!("✓ Exported settings to {}", path.display());
                }
                None => println!("{}", json),
            }
            return Ok(());
        }
    }
    settings.save(store)
}

// ============================================================================
// Report
// ============================================================================

fn cmd_report(
    store: &JsonDirStore,
    days: i64,
    format: &str,
    output: Option<&Path>,
    config: &Config,
) -> Result<()> {
    let period = ReportPeriod::last_days(days, Utc::now());
    let report = ReportData::build(
        period,
        &WorkoutHistory::load(store),
        &nutrition_log(store, config),
        &BodyProgress::load(store),
    );

    match (format.to_lowercase().as_str(), output) {
        ("csv", Some(path)) => {
            let file = std::fs::File::create(path)?;
            report.write_csv(file)?;
            println!("✓ Wrote {} workouts to {}", report.workouts.len(), path.display());
        }
        ("csv", None) => report.write_csv(io::stdout().lock())?,
        ("text", Some(path)) => {
            std::fs::write(path, report.render_text())?;
            println!("✓ Wrote report to {}", path.display());
        }
        ("text", None) => print!("{}", report.render_text()),
        (other, _) => {
            return Err(Error::Validation(format!(
                "unknown report format '{}' (expected text or csv)",
                other
            )))
        }
    }
    Ok(())
}
