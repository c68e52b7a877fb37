//! `TaskDesk`: terminal client for a REST task-management backend.
//!
//! Without a subcommand the interactive task screen opens. Configuration
//! via CLI flags, environment variables, or config file
//! (`~/.config/taskdesk/config.toml`).
//!
//! ```bash
//! # Log in, then open the task screen
//! cargo run --bin taskdesk -- login --email alice@example.com
//! cargo run --bin taskdesk
//!
//! # One-shot actions
//! cargo run --bin taskdesk -- todo add "Buy milk" --priority high
//!
//! # Demo data, no backend
//! cargo run --bin taskdesk -- --offline
//! ```

use std::io;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{NaiveDate, Utc};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;

use taskdesk::admin::{self, AdminResource};
use taskdesk::api::{HttpApi, InMemoryApi, SESSION_EXPIRED, TodoApi};
use taskdesk::app::{Action, App};
use taskdesk::auth::{self, Landing};
use taskdesk::cli::{AdminCommand, Command, TodoCommand};
use taskdesk::config::{CliArgs, ClientConfig};
use taskdesk::dashboard;
use taskdesk::feedback::FeedbackForm;
use taskdesk::notify::{Level, Notice, Notifier};
use taskdesk::session::{Session, SessionContext};
use taskdesk::tasks::{SyncOutcome, TaskDraft, TaskError, TaskFilter, TaskStats, TodoManager};
use taskdesk::ui;
use taskdesk_proto::task::{Priority, TaskId, TaskRecord, TaskStatus};
use taskdesk_proto::user::{Role, User};

/// Error text printed before exiting with a failure status.
type CommandResult = Result<(), String>;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = CliArgs::parse();

    // Load and resolve configuration (CLI args > env > config file > defaults).
    let config = match ClientConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config: {e}");
            ClientConfig::default()
        }
    };

    // Logs go to a file, never stdout, since ratatui owns the terminal.
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());
    tracing::info!(api = %config.api_url, offline = cli.offline, "taskdesk starting");

    let command = cli.command.clone().unwrap_or(Command::Todo { action: None });
    let result = if cli.offline {
        run_offline(command, &config).await
    } else {
        run_online(command, &config).await
    };

    tracing::info!(ok = result.is_ok(), "taskdesk exiting");
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize file-based logging.
///
/// Returns a [`WorkerGuard`] that must be held until shutdown to ensure all
/// buffered log entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("taskdesk.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

async fn run_online(command: Command, config: &ClientConfig) -> CommandResult {
    let session = open_session(config);
    let api = HttpApi::new(config.api_url.clone(), config.request_timeout, session.clone())
        .map_err(|e| format!("Cannot reach backend: {e}"))?;

    match command {
        Command::Login { email, password } => {
            let landing = auth::login(&api, &session, &email, &password)
                .await
                .map_err(|e| e.user_message("Login failed"))?;
            println!("Logged in.");
            print_landing(landing);
            Ok(())
        }
        Command::Register {
            name,
            email,
            password,
        } => {
            let landing = auth::register(&api, &session, &name, &email, &password)
                .await
                .map_err(|e| e.user_message("Registration failed"))?;
            match landing {
                Some(landing) => {
                    println!("Account created.");
                    print_landing(landing);
                }
                None => println!("Account created. Please log in."),
            }
            Ok(())
        }
        Command::Logout => {
            let message = auth::logout(&session).map_err(|e| e.user_message("Logout failed"))?;
            println!("{message}");
            Ok(())
        }
        Command::Dashboard => show_dashboard(&api, &session).await,
        Command::Feedback {
            message,
            rating,
            name,
            email,
            age,
        } => {
            let mut form = FeedbackForm::new(&session);
            if (name.is_some() || email.is_some()) && form.is_identity_locked() {
                println!("Using name and email of the logged-in account.");
            }
            if let Some(name) = name {
                form.set_name(&name);
            }
            if let Some(email) = email {
                form.set_email(&email);
            }
            form.set_age(age);
            form.set_message(&message);
            form.set_rating(rating);
            let done = form.submit(&api).await.map_err(|e| e.user_message())?;
            println!("{done}");
            Ok(())
        }
        Command::Admin { action } => run_admin(&api, &session, action).await,
        command => {
            let (notices, rx) = Notifier::channel(config.notice_buffer);
            let manager = TodoManager::new(Arc::new(api), session, notices)
                .with_policy(config.text_policy);
            run_tasks(command, manager, rx, config).await
        }
    }
}

async fn run_offline(command: Command, config: &ClientConfig) -> CommandResult {
    let session = SessionContext::with_session(Session::new("offline", Some(demo_user())));
    let (notices, rx) = Notifier::channel(config.notice_buffer);
    let api = Arc::new(InMemoryApi::with_records(demo_records()));
    let manager = TodoManager::new(api, session, notices).with_policy(config.text_policy);
    run_tasks(command, manager, rx, config).await
}

/// Commands that only need the task backend.
async fn run_tasks<A>(
    command: Command,
    manager: TodoManager<A>,
    mut notices: mpsc::Receiver<Notice>,
    config: &ClientConfig,
) -> CommandResult
where
    A: TodoApi + 'static,
{
    match command {
        Command::Todo { action: None } => run_tui(manager, notices, config).await,
        Command::Todo {
            action: Some(action),
        } => run_todo(&manager, &mut notices, action, &config.ui.date_format).await,
        Command::Profile => {
            let profile = dashboard::profile(manager.api(), manager.session())
                .await
                .map_err(|e| e.user_message("Failed to load profile"))?;
            if let Some(user) = &profile.user {
                println!("{} <{}> ({})", user.name, user.email, role_label(user.role));
            }
            print_stats(&profile.stats);
            Ok(())
        }
        Command::Filter {
            status,
            priority,
            search,
            from,
            to,
            by,
        } => {
            let filter = TaskFilter {
                status,
                priority,
                search: search.unwrap_or_default(),
                from,
                to,
                date_field: by.unwrap_or(config.ui.filter_date_field),
            };
            report(&mut notices, manager.refresh().await)?;
            let records = manager.store().snapshot();
            let visible = filter.apply(&records);
            print_records(visible.iter().copied(), &config.ui.date_format);
            print_stats(&TaskStats::from_records(visible));
            Ok(())
        }
        other => Err(format!(
            "{} needs the backend; run it without --offline",
            command_name(&other)
        )),
    }
}

const fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Login { .. } => "login",
        Command::Register { .. } => "register",
        Command::Logout => "logout",
        Command::Todo { .. } => "todo",
        Command::Dashboard => "dashboard",
        Command::Profile => "profile",
        Command::Feedback { .. } => "feedback",
        Command::Admin { .. } => "admin",
        Command::Filter { .. } => "filter",
    }
}

fn open_session(config: &ClientConfig) -> SessionContext {
    let path = match config.session_file.clone() {
        Some(path) => path,
        None => match SessionContext::default_path() {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(error = %e, "no session location, session will not persist");
                return SessionContext::in_memory();
            }
        },
    };
    SessionContext::load(&path).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not read session file");
        eprintln!("Warning: {e}");
        SessionContext::in_memory()
    })
}

// ---------------------------------------------------------------------------
// Screens
// ---------------------------------------------------------------------------

async fn show_dashboard(api: &HttpApi, session: &SessionContext) -> CommandResult {
    if !session.is_active() {
        return Err("Please log in to view dashboard".to_string());
    }
    let board = dashboard::load(api, session).await;
    if let Some(name) = &board.name {
        println!("Welcome back, {name}!");
    }
    println!(
        "Total: {}  Pending: {}  Completed: {}",
        board.stats.total, board.stats.pending, board.stats.completed
    );
    board.error.map_or(Ok(()), Err)
}

async fn run_admin(api: &HttpApi, session: &SessionContext, action: AdminCommand) -> CommandResult {
    if !session.user().is_some_and(|u| u.is_admin()) {
        return Err("Access denied. Admin accounts only.".to_string());
    }
    let (resource, id) = match action {
        AdminCommand::Show => {
            let data = admin::load(api)
                .await
                .map_err(|_| admin::LOAD_FAILED.to_string())?;
            print_admin(&data);
            return Ok(());
        }
        AdminCommand::DeleteUser { id } => (AdminResource::User, id),
        AdminCommand::DeleteTodo { id } => (AdminResource::Todo, id),
        AdminCommand::DeleteFeedback { id } => (AdminResource::Feedback, id),
    };
    let data = admin::delete_and_reload(api, resource, &id)
        .await
        .map_err(|_| admin::delete_failed_message(resource))?;
    println!("{}", admin::deleted_message(resource));
    print_admin(&data);
    Ok(())
}

async fn run_todo<A: TodoApi>(
    manager: &TodoManager<A>,
    notices: &mut mpsc::Receiver<Notice>,
    action: TodoCommand,
    date_format: &str,
) -> CommandResult {
    report(notices, manager.refresh().await)?;
    let result = match action {
        TodoCommand::List => {
            print_records(manager.store().snapshot().iter(), date_format);
            return Ok(());
        }
        TodoCommand::Add {
            text,
            priority,
            due,
        } => {
            let draft = TaskDraft {
                text,
                priority,
                due_date: due,
            };
            manager.add(draft).await
        }
        TodoCommand::Edit {
            id,
            text,
            priority,
            due,
        } => {
            let draft = TaskDraft {
                text,
                priority,
                due_date: due,
            };
            manager.edit(&TaskId::server(id), draft).await
        }
        TodoCommand::Rm { id } => manager.delete(&TaskId::server(id)).await,
        TodoCommand::Done { id } => {
            manager
                .set_status(&TaskId::server(id), TaskStatus::Completed)
                .await
        }
        TodoCommand::Undo { id } => {
            manager
                .set_status(&TaskId::server(id), TaskStatus::Pending)
                .await
        }
        TodoCommand::CompleteAll => manager.complete_all().await,
        TodoCommand::ClearCompleted => manager.clear_completed().await,
    };
    report(notices, result)
}

/// Prints success notices and turns a failure into its message.
fn report(
    notices: &mut mpsc::Receiver<Notice>,
    result: Result<SyncOutcome, TaskError>,
) -> CommandResult {
    while let Ok(notice) = notices.try_recv() {
        if notice.level != Level::Error {
            println!("{}", notice.text);
        }
    }
    match result {
        Ok(SyncOutcome::Confirmed | SyncOutcome::Discarded) => Ok(()),
        Ok(SyncOutcome::RolledBack { message, .. }) => Err(message),
        Ok(SyncOutcome::SessionExpired) => Err(format!("{SESSION_EXPIRED} Run `taskdesk login`.")),
        Err(e) => Err(e.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Task screen
// ---------------------------------------------------------------------------

async fn run_tui<A>(
    manager: TodoManager<A>,
    notices: mpsc::Receiver<Notice>,
    config: &ClientConfig,
) -> CommandResult
where
    A: TodoApi + 'static,
{
    let io_err = |e: io::Error| format!("Terminal error: {e}");

    enable_raw_mode().map_err(io_err)?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).map_err(io_err)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).map_err(io_err)?;

    let result = event_loop(&mut terminal, &manager, notices, config).await;

    // Results still in flight are discarded.
    manager.store().close();

    disable_raw_mode().map_err(io_err)?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen).map_err(io_err)?;
    terminal.show_cursor().map_err(io_err)?;

    if result.map_err(io_err)? {
        return Err(format!("{SESSION_EXPIRED} Run `taskdesk login`."));
    }
    Ok(())
}

/// Runs until the user quits. Returns `true` if the session expired.
async fn event_loop<A>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    manager: &TodoManager<A>,
    mut notices: mpsc::Receiver<Notice>,
    config: &ClientConfig,
) -> io::Result<bool>
where
    A: TodoApi + 'static,
{
    let mut app = App::new(config.ui.clone());
    let (done_tx, mut done_rx) = mpsc::channel(config.notice_buffer);
    spawn_action(manager, Action::Refresh, done_tx.clone());

    loop {
        // Step 1: Draw from the current snapshot.
        let records = manager.store().snapshot();
        app.clamp_selection(&records);
        terminal.draw(|frame| ui::draw(frame, &app, &records))?;

        // Step 2: Drain notices and finished operations (non-blocking).
        while let Ok(notice) = notices.try_recv() {
            app.push_notice(notice);
        }
        while let Ok(result) = done_rx.try_recv() {
            app.apply_result(result);
        }
        app.tick(Instant::now());

        // Step 3: Poll for input without blocking the runtime, so spawned
        // requests keep making progress.
        if event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
                && let Some(action) = app.handle_key_event(key, &records)
            {
                spawn_action(manager, action, done_tx.clone());
            }
        } else {
            tokio::time::sleep(config.poll_timeout).await;
        }

        if app.should_quit {
            return Ok(app.session_expired);
        }
    }
}

fn spawn_action<A>(
    manager: &TodoManager<A>,
    action: Action,
    done: mpsc::Sender<Result<SyncOutcome, TaskError>>,
) where
    A: TodoApi + 'static,
{
    let manager = manager.clone();
    tokio::spawn(async move {
        let result = match action {
            Action::Add(draft) => manager.add(draft).await,
            Action::Edit(id, draft) => manager.edit(&id, draft).await,
            Action::Delete(id) => manager.delete(&id).await,
            Action::Toggle(id) => manager.toggle(&id).await,
            Action::CompleteAll => manager.complete_all().await,
            Action::ClearCompleted => manager.clear_completed().await,
            Action::Refresh => manager.refresh().await,
        };
        if done.send(result).await.is_err() {
            tracing::debug!("screen closed before the result arrived");
        }
    });
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn print_landing(landing: Landing) {
    match landing {
        Landing::Admin => println!("Admin account: see `taskdesk admin show`."),
        Landing::Dashboard => println!("See `taskdesk dashboard` or open `taskdesk todo`."),
    }
}

fn print_records<'a>(records: impl IntoIterator<Item = &'a TaskRecord>, date_format: &str) {
    let mut any = false;
    for record in records {
        any = true;
        let check = if record.status.is_completed() { "[x]" } else { "[ ]" };
        let mut line = format!("{check} {:<26} {}", record.id.to_string(), record.text);
        if let Some(priority) = record.priority {
            line.push_str(&format!("  ({priority})"));
        }
        if let Some(due) = record.due_date {
            line.push_str(&format!("  due {}", due.format(date_format)));
        }
        println!("{line}");
    }
    if !any {
        println!("No tasks.");
    }
}

fn print_stats(stats: &TaskStats) {
    println!(
        "{} total, {} active, {} completed ({}% done)",
        stats.total, stats.active, stats.completed, stats.progress
    );
}

fn print_admin(data: &admin::AdminData) {
    let s = &data.stats;
    println!(
        "Users: {}  Todos: {} ({} pending, {} completed)  Feedback: {}",
        s.total_users, s.total_todos, s.pending_todos, s.completed_todos, s.total_feedback
    );
    println!("\nUsers:");
    for user in &data.users {
        println!("  {:<26} {} <{}> ({})", user.id, user.name, user.email, role_label(user.role));
    }
    println!("\nFeedback:");
    for entry in &data.feedback {
        println!("  {:<26} {} ({}/5): {}", entry.id, entry.name, entry.rating, entry.message);
    }
    println!("\nRecent activity:");
    for todo in data.recent_activity() {
        let owner = todo.user.as_ref().map_or("unknown", |u| u.name.as_str());
        println!(
            "  {:<26} {} by {owner} ({})",
            todo.task.id.to_string(),
            todo.task.text,
            todo.task.status
        );
    }
}

const fn role_label(role: Role) -> &'static str {
    match role {
        Role::Admin => "admin",
        Role::User => "user",
    }
}

// ---------------------------------------------------------------------------
// Offline demo data
// ---------------------------------------------------------------------------

fn demo_user() -> User {
    User {
        id: "offline".to_string(),
        name: "Demo".to_string(),
        email: "demo@taskdesk.local".to_string(),
        role: Role::User,
        created_at: None,
    }
}

fn demo_records() -> Vec<TaskRecord> {
    let now = Utc::now();
    let demo = [
        (
            "demo-4",
            "Review pull requests",
            TaskStatus::Pending,
            Some(Priority::High),
            NaiveDate::from_ymd_opt(2026, 11, 2),
        ),
        ("demo-3", "Renew passport", TaskStatus::Pending, Some(Priority::Medium), None),
        ("demo-2", "Buy groceries", TaskStatus::Completed, Some(Priority::Low), None),
        ("demo-1", "Call the plumber", TaskStatus::Pending, None, None),
    ];
    demo.into_iter()
        .map(|(id, text, status, priority, due_date)| TaskRecord {
            id: TaskId::server(id),
            text: text.to_string(),
            status,
            priority,
            due_date,
            created_at: now,
        })
        .collect()
}
