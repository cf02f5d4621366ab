//! Terminal host for the Lumen reminder widget.
//!
//! # Responsibility
//! - Drive core use-cases (create, list, complete, clear, program selection)
//!   from the command line.
//! - Run the cooperative widget loop in a terminal with an ASCII canvas and
//!   printed notifications.

use std::path::PathBuf;
use std::thread;
use std::time::Duration as StdDuration;

use chrono::Utc;
use clap::{Parser, Subcommand};
use miette::{miette, IntoDiagnostic, Result};

use lumen_core::db::open_db;
use lumen_core::notify::dispatcher::format_due_label;
use lumen_core::{
    default_time_of_day, init_logging_from_config, Clock, FrameUniforms, GraphicsContext, Outbox,
    OutboxBatch, Permission, ReminderEngine, ReminderStore, ReminderWidget, SoftwareCanvas,
    SqliteReminderStore, SystemClock, Vec2, VisualProgramId, WidgetConfig,
};

#[derive(Parser)]
#[command(name = "lumen", version, about = "Ambient reminder widget")]
struct Cli {
    /// Database file (overrides LUMEN_DB_PATH).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a reminder at a local time of day.
    Add {
        /// 24-hour time, e.g. 14:30. Past times roll to tomorrow.
        /// Defaults to the next quarter hour.
        #[arg(long)]
        at: Option<String>,
        /// Reminder text.
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },

    /// List reminders.
    List {
        /// Include completed reminders.
        #[arg(long)]
        all: bool,
    },

    /// Mark a reminder complete.
    Done {
        id: String,
    },

    /// Remove every incomplete reminder.
    Clear,

    /// Show or change the visual program (1-4).
    Shader {
        program: Option<u32>,
    },

    /// Render one frame of the selected program as ASCII.
    Preview {
        #[arg(long, default_value = "48")]
        width: u32,
        #[arg(long, default_value = "24")]
        height: u32,
        /// Shader time in seconds.
        #[arg(long, default_value = "0.0")]
        time: f32,
    },

    /// Run the widget loop, printing notifications as they fire.
    Watch {
        /// Stop after this many ticks.
        #[arg(long)]
        ticks: Option<u64>,
        /// Milliseconds between ticks.
        #[arg(long, default_value = "250")]
        tick_ms: u64,
        /// Notification permission: granted, denied or undetermined.
        #[arg(long, default_value = "granted")]
        permission: String,
        /// Redraw the ASCII canvas every tick.
        #[arg(long)]
        draw: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = WidgetConfig::from_env();
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    config.validate().into_diagnostic()?;
    init_logging_from_config(&config).map_err(|err| miette!("logging init failed: {err}"))?;

    let conn = open_db(&config.db_path).into_diagnostic()?;
    let store = SqliteReminderStore::new(&conn);

    match cli.command {
        Commands::Add { at, message } => {
            let mut engine = ReminderEngine::load(store, SystemClock).into_diagnostic()?;
            let time = at.unwrap_or_else(|| {
                default_time_of_day(engine.clock().now_local())
                    .format("%H:%M")
                    .to_string()
            });
            let reminder = engine
                .create_at_time_of_day(message.join(" "), time.as_str())
                .into_diagnostic()?;
            let offset = *engine.clock().now_local().offset();
            println!(
                "Reminder set: {} at {} (id {})",
                reminder.message,
                format_due_label(&reminder, &offset),
                reminder.id
            );
        }

        Commands::List { all } => {
            let engine = ReminderEngine::load(store, SystemClock).into_diagnostic()?;
            let offset = *engine.clock().now_local().offset();
            let shown = engine
                .reminders()
                .iter()
                .filter(|reminder| all || reminder.is_active())
                .collect::<Vec<_>>();
            if shown.is_empty() {
                println!("No reminders.");
            }
            for reminder in shown {
                let state = if reminder.completed {
                    "done"
                } else if reminder.notified {
                    "due"
                } else {
                    "open"
                };
                println!(
                    "{:>15}  {}  {:<4}  {}",
                    reminder.id,
                    format_due_label(reminder, &offset),
                    state,
                    reminder.message
                );
            }
            if engine.has_upcoming(config.upcoming_window_minutes) {
                println!(
                    "Something is due within {} minutes.",
                    config.upcoming_window_minutes
                );
            }
        }

        Commands::Done { id } => {
            let mut engine = ReminderEngine::load(store, SystemClock).into_diagnostic()?;
            if engine.complete(id.as_str()).into_diagnostic()? {
                println!("Completed {id}.");
            } else {
                return Err(miette!("no active reminder with id {id}"));
            }
        }

        Commands::Clear => {
            let mut engine = ReminderEngine::load(store, SystemClock).into_diagnostic()?;
            let removed = engine.clear_incomplete().into_diagnostic()?;
            println!("Cleared {removed} reminder(s).");
        }

        Commands::Shader { program } => match program {
            Some(number) => {
                let program = VisualProgramId::from_number(number)
                    .ok_or_else(|| miette!("unknown program {number}; expected 1-4"))?;
                store.save_selected_program(program).into_diagnostic()?;
                println!("Selected {} ({}).", program.number(), program.name());
            }
            None => {
                let selected = store
                    .load_selected_program()
                    .into_diagnostic()?
                    .unwrap_or_default();
                for program in VisualProgramId::ALL {
                    let marker = if program == selected { '*' } else { ' ' };
                    println!("{marker} {} {}", program.number(), program.name());
                }
            }
        },

        Commands::Preview {
            width,
            height,
            time,
        } => {
            let engine = ReminderEngine::load(&store, SystemClock).into_diagnostic()?;
            let program = store
                .load_selected_program()
                .into_diagnostic()?
                .unwrap_or_default();
            let mut canvas = SoftwareCanvas::new(width, height);
            canvas.build_pipeline(&program.program()).into_diagnostic()?;
            let uniforms = FrameUniforms {
                time,
                pointer: Vec2::CENTER,
                has_active: engine.has_active(),
                has_upcoming: engine.has_upcoming(config.upcoming_window_minutes),
            };
            canvas.draw(&uniforms).into_diagnostic()?;
            print!("{}", canvas.ascii_preview());
        }

        Commands::Watch {
            ticks,
            tick_ms,
            permission,
            draw,
        } => {
            let outbox = Outbox::new(Permission::parse(permission.as_str()));
            let canvas = SoftwareCanvas::new(48, 24);
            let mut widget = ReminderWidget::start(store, SystemClock, outbox, Some(canvas), &config);
            let mut tick = 0_u64;
            loop {
                let now = Utc::now();
                widget.tick(now);
                widget.render_frame(now);
                print_batch(&widget.platform_mut().drain());
                if draw {
                    if let Some(canvas) = widget.render().context() {
                        print!("\x1b[H\x1b[2J{}", canvas.ascii_preview());
                    }
                }

                tick += 1;
                if ticks.is_some_and(|limit| tick >= limit) {
                    break;
                }
                thread::sleep(StdDuration::from_millis(tick_ms));
            }
        }
    }

    Ok(())
}

fn print_batch(batch: &OutboxBatch) {
    for cue in &batch.cues {
        println!("[cue] {}", cue.as_str());
    }
    for toast in &batch.toasts {
        match &toast.description {
            Some(description) => println!("[toast] {}: {}", toast.title, description),
            None => println!("[toast] {}", toast.title),
        }
    }
    for id in &batch.dismissed_toasts {
        println!("[dismiss] {id}");
    }
    for notification in &batch.system {
        println!("[system] {}: {}", notification.title, notification.body);
    }
    if batch.permission_requested {
        println!("[permission] notification permission requested");
    }
}
