use anyhow::{bail, Context as _, Result};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use elevan::api::{ApiError, ChatRequest, MediaFormat};
use elevan::app::App;
use elevan::config::Config;
use elevan::logging;
use elevan::routes::Route;
use elevan::screens::command::{download_deck, submit_link};
use elevan::screens::courses::filter_courses;
use elevan::screens::Context;

#[derive(Parser)]
#[command(name = "elevan")]
#[command(about = "Generate courses, lessons and quizzes from a source link")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Screen to open the TUI on, e.g. /upload or /test/<course>
    #[arg(long, value_name = "PATH")]
    open: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with email and password
    Login {
        /// Account email (prompted for when omitted)
        email: Option<String>,
    },

    /// Forget the cached session
    Logout,

    /// Show who is signed in
    Whoami,

    /// List your courses
    Courses {
        /// Only show courses whose name or source contains this text
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Delete a course and everything generated for it
    DeleteCourse {
        course_id: String,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Create a course from a source link
    Create { link: String },

    /// Ask the course assistant a question
    Chat { course_id: String, message: String },

    /// Save a course's lesson deck
    Download {
        course_id: String,

        /// pptx or pdf
        #[arg(short, long, default_value = "pptx")]
        format: MediaFormat,
    },

    /// Show your latest quiz score for a course
    Score { course_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (needed for logging setup)
    let config = Config::load(cli.config.as_deref())?;

    // File logging for the TUI, stderr otherwise
    let is_tui_mode = cli.command.is_none();
    let logging_handle = logging::init_logging(&config, is_tui_mode, cli.debug)?;

    let Some(command) = cli.command else {
        return run_tui(config, cli.open.as_deref(), logging_handle.log_file_path).await;
    };

    let ctx = Context::from_config(&config)?;
    match command {
        Commands::Login { email } => cmd_login(&ctx, email).await?,
        Commands::Logout => {
            ctx.session.sign_out().await;
            println!("Signed out");
        }
        Commands::Whoami => cmd_whoami(&ctx).await,
        Commands::Courses { search } => cmd_courses(&ctx, search.as_deref()).await?,
        Commands::DeleteCourse { course_id, yes } => {
            cmd_delete_course(&ctx, &course_id, yes).await?;
        }
        Commands::Create { link } => {
            let auth = require_session(&ctx).await?;
            let course_id = submit_link(ctx.backend.as_ref(), &auth, &link).await?;
            println!("Created course {}", course_id);
            println!("Continue with: elevan --open /gen/instruct/{}", course_id);
        }
        Commands::Chat { course_id, message } => cmd_chat(&ctx, course_id, message).await?,
        Commands::Download { course_id, format } => {
            let path = download_deck(&ctx, &course_id, format).await?;
            println!("Saved {}", path.display());
        }
        Commands::Score { course_id } => cmd_score(&ctx, &course_id).await?,
    }

    Ok(())
}

async fn run_tui(config: Config, open: Option<&str>, log_file_path: Option<PathBuf>) -> Result<()> {
    let start = match open {
        Some(path) => Route::parse(path).with_context(|| format!("Unknown screen: {}", path))?,
        None => Route::Courses,
    };

    let mut app = App::from_config(config, start)?;
    let result = app.run().await;

    // Print log file path on exit if logs were written
    if let Some(log_path) = log_file_path {
        if log_path.metadata().is_ok_and(|m| m.len() > 0) {
            eprintln!("Session log: {}", log_path.display());
        }
    }

    result
}

/// Fail early with a hint instead of letting the backend reject the call
async fn require_session(ctx: &Context) -> Result<elevan::api::AuthContext> {
    let snapshot = ctx.session.ensure_fresh().await;
    if !snapshot.is_signed_in() {
        bail!("Not signed in. Run 'elevan login' first.");
    }
    Ok(snapshot.auth())
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

async fn cmd_login(ctx: &Context, email: Option<String>) -> Result<()> {
    let email = match email {
        Some(email) => email,
        None => prompt("Email: ")?,
    };
    let password = prompt("Password: ")?;
    if email.is_empty() || password.is_empty() {
        bail!("Email and password are required");
    }

    let snapshot = ctx
        .session
        .sign_in(&email, &password)
        .await
        .context("Sign-in failed")?;
    println!(
        "Signed in as {} ({})",
        snapshot.email.as_deref().unwrap_or(&email),
        plan_label(snapshot.is_paid_user)
    );
    Ok(())
}

async fn cmd_whoami(ctx: &Context) {
    let snapshot = ctx.session.ensure_fresh().await;
    match (&snapshot.email, snapshot.is_signed_in()) {
        (Some(email), true) => println!("{} ({})", email, plan_label(snapshot.is_paid_user)),
        _ => println!("Not signed in"),
    }
}

fn plan_label(is_paid_user: bool) -> &'static str {
    if is_paid_user {
        "Pro"
    } else {
        "Free"
    }
}

async fn cmd_courses(ctx: &Context, search: Option<&str>) -> Result<()> {
    let auth = require_session(ctx).await?;
    let courses = ctx.backend.list_courses(&auth).await?;
    let courses = filter_courses(&courses, search.unwrap_or_default());

    if courses.is_empty() {
        println!("No courses");
        return Ok(());
    }

    println!("Courses ({})", courses.len());
    println!("{}", "─".repeat(60));
    for course in &courses {
        println!(
            "{:<24} {:>3}q  {}",
            course.course_id, course.total_questions, course.name
        );
        if !course.source.is_empty() {
            println!("{:<24}       {}", "", course.source);
        }
    }
    Ok(())
}

async fn cmd_delete_course(ctx: &Context, course_id: &str, skip_confirm: bool) -> Result<()> {
    let auth = require_session(ctx).await?;

    if !skip_confirm {
        let answer = prompt(&format!("Delete course {}? [y/N] ", course_id))?;
        if !answer.eq_ignore_ascii_case("y") {
            println!("Cancelled");
            return Ok(());
        }
    }

    ctx.backend.delete_course(&auth, course_id).await?;
    println!("Deleted course {}", course_id);
    Ok(())
}

async fn cmd_chat(ctx: &Context, course_id: String, message: String) -> Result<()> {
    let snapshot = ctx.session.ensure_fresh().await;
    let Some(user_id) = snapshot.user_id.clone() else {
        return Err(ApiError::NotSignedIn.into());
    };
    let request = ChatRequest {
        course_id,
        message,
        user_id,
    };

    let mut stream = ctx.backend.chat(&snapshot.auth(), &request).await?;
    let mut stdout = io::stdout();
    while let Some(delta) = stream.next_delta().await {
        let text = delta?;
        stdout.write_all(text.as_bytes())?;
        stdout.flush()?;
    }
    writeln!(stdout)?;
    Ok(())
}

async fn cmd_score(ctx: &Context, course_id: &str) -> Result<()> {
    let auth = require_session(ctx).await?;
    match ctx.backend.get_score(&auth, course_id).await? {
        Some(score) => {
            println!("Attempted: {}", score.attempted());
            println!("Correct:   {}", score.correct_score);
            println!("Incorrect: {}", score.incorrect_score);
            println!("Score:     {}%", score.percentage());
        }
        None => println!("No score recorded for {}", course_id),
    }
    Ok(())
}
