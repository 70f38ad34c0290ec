use board_cli::cli::{Cli, Command, collect_overrides, split_command_line, split_tags};
use board_core::board_api::{BoardStore, Location};
use board_core::config::{self, Config, Palette, merge_overrides, palette_for_theme};
use board_core::error::AppError;
use board_core::model::{Activity, Board, Column, Priority, Task, TaskDraft, TaskUpdate};
use board_core::session::{self, DurableScope, SessionGate, TransientScope};
use board_core::storage::{JsonFileStore, json_store};
use board_core::view::{PriorityFilter, ViewQuery, board_view, derive_view};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use std::io::{self, Write};
use tabled::settings::Style;
use tabled::{Table, Tabled};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, UtcOffset};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const FALLBACK_COLUMN: &str = "todo";
const RESET_PROMPT: &str = "Are you sure you want to reset the board? This cannot be undone.";

struct App {
    config: Config,
    store: BoardStore<JsonFileStore>,
    gate: SessionGate,
}

impl App {
    fn open() -> Result<Self, AppError> {
        let loaded = config::load_config_with_fallback();
        if let Some(err) = loaded.error {
            eprintln!("WARNING: using default config: {err}");
        }
        let config = loaded.config;

        let store_path = json_store::store_path(config.board_path.as_deref())?;
        let session_path = session::session_path(config.session_path.as_deref())?;
        tracing::debug!(store = %store_path.display(), session = %session_path.display(), "opening board");

        Ok(Self {
            store: BoardStore::open(JsonFileStore::new(store_path)),
            gate: SessionGate::new(
                Box::new(DurableScope::new(session_path)),
                Box::new(TransientScope::new()),
            ),
            config,
        })
    }
}

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Priority")]
    priority: Priority,
    #[tabled(rename = "Due")]
    due: String,
    #[tabled(rename = "Tags")]
    tags: String,
}

impl TaskRow {
    fn new(task: &Task, today: Date) -> Self {
        let due = match (task.due_date.as_deref(), task.due()) {
            (Some(raw), Some(date)) if date < today => format!("{raw} (overdue)"),
            (Some(raw), _) => raw.to_string(),
            (None, _) => "-".to_string(),
        };
        Self {
            id: task.id.clone(),
            title: task.title.clone(),
            priority: task.priority,
            due,
            tags: task.tags.join(", "),
        }
    }
}

fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

fn local_today() -> Date {
    OffsetDateTime::now_utc().to_offset(local_offset()).date()
}

fn format_timestamp(raw: &str) -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]");
    OffsetDateTime::parse(raw, &Rfc3339)
        .ok()
        .and_then(|at| at.to_offset(local_offset()).format(format).ok())
        .unwrap_or_else(|| raw.to_string())
}

fn lookup<'a>(board: &'a Board, id: &str) -> Result<&'a Task, AppError> {
    board
        .task(id)
        .ok_or_else(|| AppError::invalid_input("task not found"))
}

fn print_task(json: bool, verb: &str, task: &Task) -> Result<(), AppError> {
    if json {
        println!("{}", serde_json::to_string(task)?);
    } else {
        println!("{verb} task: {} ({})", task.title, task.id);
    }
    Ok(())
}

fn print_columns(
    columns: &[(&Column, Vec<&Task>)],
    palette: &Palette,
    json: bool,
) -> Result<(), AppError> {
    if json {
        let mut payload = Vec::with_capacity(columns.len());
        for (column, tasks) in columns {
            payload.push(serde_json::json!({
                "id": column.id,
                "title": column.title,
                "tasks": tasks,
            }));
        }
        println!("{}", serde_json::Value::Array(payload));
        return Ok(());
    }

    let today = local_today();
    for (column, tasks) in columns {
        println!(
            "{}",
            palette.heading(&format!("{} ({})", column.title, tasks.len()))
        );
        if tasks.is_empty() {
            println!("{}", palette.muted("  (empty)"));
        } else {
            let rows: Vec<TaskRow> = tasks.iter().map(|task| TaskRow::new(task, today)).collect();
            println!("{}", Table::new(rows).with(Style::rounded()));
        }
        println!();
    }
    Ok(())
}

fn print_task_details(board: &Board, task: &Task, palette: &Palette, json: bool) -> Result<(), AppError> {
    let column = board
        .locate(&task.id)
        .and_then(|(column_id, _)| board.column(column_id));

    if json {
        let mut value = serde_json::to_value(task)?;
        value["column"] = serde_json::json!(column.map(|column| column.id.as_str()));
        println!("{value}");
        return Ok(());
    }

    println!("{}", palette.heading(&task.title));
    println!("  id:          {}", task.id);
    println!(
        "  column:      {}",
        column.map(|column| column.title.as_str()).unwrap_or("-")
    );
    println!("  priority:    {}", task.priority);
    println!("  due:         {}", task.due_date.as_deref().unwrap_or("-"));
    println!("  tags:        {}", task.tags.join(", "));
    println!("  created:     {}", format_timestamp(&task.created_at));
    if let Some(description) = task.description.as_deref() {
        println!();
        println!("  {description}");
    }
    Ok(())
}

fn print_activity(entries: &[Activity], palette: &Palette, json: bool) -> Result<(), AppError> {
    if json {
        println!("{}", serde_json::to_string(entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("{}", palette.muted("No activity yet"));
    }
    for entry in entries {
        println!(
            "{}  {}",
            palette.muted(&format_timestamp(&entry.timestamp)),
            entry.summary()
        );
    }
    Ok(())
}

fn parse_priority(raw: Option<String>) -> Result<Option<Priority>, AppError> {
    raw.map(|value| value.parse::<Priority>()).transpose()
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

fn run_command(
    app: &mut App,
    cli: Cli,
    confirm: &mut dyn FnMut(&str) -> bool,
) -> Result<(), AppError> {
    let overrides = collect_overrides(&cli.config_override).map_err(AppError::invalid_input)?;
    let config = merge_overrides(&app.config, &overrides);
    let palette = palette_for_theme(config.theme.as_deref());
    let json = cli.json;

    if !cli.command.is_public() {
        app.gate.require_user()?;
    }

    match cli.command {
        Command::Login {
            email,
            password,
            remember,
        } => {
            let user = app.gate.authenticate(&email, &password, remember)?;
            if json {
                println!("{}", serde_json::to_string(&user)?);
            } else {
                println!("Signed in as {} <{}>", user.name, user.email);
            }
        }
        Command::Logout => {
            app.gate.end_session()?;
            if json {
                println!("{}", serde_json::json!({ "signed_in": false }));
            } else {
                println!("Signed out");
            }
        }
        Command::Whoami => {
            let user = app.gate.require_user()?;
            if json {
                println!("{}", serde_json::to_string(&user)?);
            } else {
                println!("{} <{}> ({})", user.name, user.email, user.role);
            }
        }
        Command::Add {
            title,
            column,
            description,
            priority,
            due,
            tags,
        } => {
            let title = match title {
                Some(value) if !value.trim().is_empty() => value,
                _ => return Err(AppError::invalid_input("title is required")),
            };
            let column = column
                .or(config.default_column)
                .unwrap_or_else(|| FALLBACK_COLUMN.to_string());
            let draft = TaskDraft {
                title,
                description,
                priority: parse_priority(priority)?.unwrap_or_default(),
                due_date: due,
                tags: tags.as_deref().map(split_tags).unwrap_or_default(),
            };

            let id = app.store.add_task(draft, &column)?;
            print_task(json, "Added", lookup(app.store.board(), &id)?)?;
        }
        Command::Edit {
            id,
            title,
            description,
            clear_description,
            priority,
            due,
            clear_due,
            tags,
        } => {
            let updates = TaskUpdate {
                title,
                description: if clear_description {
                    Some(None)
                } else {
                    description.map(Some)
                },
                priority: parse_priority(priority)?,
                due_date: if clear_due { Some(None) } else { due.map(Some) },
                tags: tags.as_deref().map(split_tags),
            };
            if updates.is_empty() {
                return Err(AppError::invalid_input("nothing to change"));
            }

            app.store.update_task(&id, updates)?;
            print_task(json, "Updated", lookup(app.store.board(), &id)?)?;
        }
        Command::Delete { id, column } => {
            let column = match column {
                Some(column) => column,
                None => app
                    .store
                    .board()
                    .locate(&id)
                    .map(|(column_id, _)| column_id.to_string())
                    .ok_or_else(|| AppError::invalid_input("task not found"))?,
            };
            let removed = app.store.board().task(&id).cloned();

            app.store.delete_task(&id, &column)?;
            match removed {
                Some(task) => print_task(json, "Deleted", &task)?,
                None if json => println!("{}", serde_json::json!({ "id": id })),
                None => println!("Deleted task: {id}"),
            }
        }
        Command::Move { id, column, index } => {
            let board = app.store.board();
            let (from, from_index) = board
                .locate(&id)
                .map(|(column_id, position)| (column_id.to_string(), position))
                .ok_or_else(|| AppError::invalid_input("task not found"))?;
            let target_len = board
                .column(&column)
                .map(|target| target.task_ids.len())
                .ok_or_else(|| AppError::invalid_input(format!("column '{column}' not found")))?;
            let end = if from == column {
                target_len.saturating_sub(1)
            } else {
                target_len
            };

            let changed = app.store.move_task(
                Location::new(from, from_index),
                Some(Location::new(column.as_str(), index.unwrap_or(end))),
                &id,
            )?;

            let board = app.store.board();
            let task = lookup(board, &id)?;
            let title = board
                .column(&column)
                .map(|target| target.title.as_str())
                .unwrap_or(column.as_str());
            if json {
                let mut value = serde_json::to_value(task)?;
                value["column"] = serde_json::json!(column);
                value["changed"] = serde_json::json!(changed);
                println!("{value}");
            } else if changed {
                println!("Moved task: {} ({}) to {}", task.title, task.id, title);
            } else {
                println!("Task already in place: {} ({})", task.title, task.id);
            }
        }
        Command::Reset { yes } => {
            let confirmed = yes || confirm(RESET_PROMPT);
            if confirmed {
                app.store.reset_board()?;
            }
            if json {
                println!("{}", serde_json::json!({ "reset": confirmed }));
            } else if confirmed {
                println!("Board reset");
            } else {
                println!("Reset cancelled");
            }
        }
        Command::List {
            column,
            search,
            priority,
            sort_due,
        } => {
            let query = ViewQuery {
                search_text: search,
                priority: priority.parse::<PriorityFilter>()?,
                sort_by_due_date: sort_due,
            };
            let board = app.store.board();
            let columns = match column {
                Some(column_id) => {
                    let column = board.column(&column_id).ok_or_else(|| {
                        AppError::invalid_input(format!("column '{column_id}' not found"))
                    })?;
                    vec![(column, derive_view(board, &column_id, &query))]
                }
                None => board_view(board, &query),
            };
            print_columns(&columns, &palette, json)?;
        }
        Command::Show { id } => {
            let board = app.store.board();
            print_task_details(board, lookup(board, &id)?, &palette, json)?;
        }
        Command::Log { limit } => {
            let log = &app.store.board().activity_log;
            let shown = &log[..limit.unwrap_or(log.len()).min(log.len())];
            print_activity(shown, &palette, json)?;
        }
    }

    Ok(())
}

fn confirm_on_stdin(prompt: &str) -> bool {
    print!("{prompt} [y/N] ");
    let _ = io::stdout().flush();

    let mut answer = String::new();
    match io::stdin().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}

fn run_interactive(app: &mut App) -> Result<(), AppError> {
    let mut input = String::new();

    loop {
        input.clear();
        // no lock held across commands; `reset` reads its answer from stdin too
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        let args = match split_command_line(line) {
            Ok(args) => args,
            Err(message) => {
                eprintln!("ERROR: {}", AppError::invalid_input(message));
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("taskboard".to_string());
        argv.extend(args);

        let cli = match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                println!("{err}");
                continue;
            }
            Err(err) => {
                eprintln!("ERROR: {}", normalize_parse_error(err));
                continue;
            }
        };

        if let Err(err) = run_command(app, cli, &mut confirm_on_stdin) {
            eprintln!("ERROR: {}", err);
        }
    }

    Ok(())
}

fn init_tracing() {
    // off unless RUST_LOG asks for it
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|raw| {
            let raw = raw.trim();
            if raw.is_empty() {
                return None;
            }
            EnvFilter::try_new(raw).ok()
        })
        .unwrap_or_else(|| EnvFilter::new("off"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn open_app() -> App {
    match App::open() {
        Ok(app) => app,
        Err(err) => {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
    }
}

fn main() {
    init_tracing();

    let mut args = std::env::args_os();
    args.next();
    if args.next().is_none() {
        let mut app = open_app();
        if let Err(err) = run_interactive(&mut app) {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
        return;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => {
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    let mut app = open_app();
    if let Err(err) = run_command(&mut app, cli, &mut confirm_on_stdin) {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
