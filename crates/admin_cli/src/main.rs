use std::{error::Error, io::Write, path::PathBuf};

use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};
use engine::{Engine, EngineError, NewUser, Role, SnapshotFormat};
use migration::MigratorTrait;

#[derive(Parser, Debug)]
#[command(name = "pharmacy_admin")]
#[command(about = "Admin utilities for the pharmacy backend (users, backups)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./pharmacy.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    /// Write every business table to a file.
    Backup(BackupArgs),
    /// Replace every business table with the content of a backup file.
    Restore(RestoreArgs),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create(UserCreateArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    username: String,
    /// `admin` or `staff`.
    #[arg(long, default_value = "staff")]
    role: String,
    #[arg(long)]
    real_name: Option<String>,
    #[arg(long)]
    phone: Option<String>,
}

#[derive(Args, Debug)]
struct BackupArgs {
    /// `json` or `sql`.
    #[arg(long, default_value = "json")]
    format: String,
    #[arg(long)]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct RestoreArgs {
    #[arg(long)]
    input: PathBuf,
    /// `json` or `sql`; guessed from the file extension when omitted.
    #[arg(long)]
    format: Option<String>,
}

fn restore_format(args: &RestoreArgs) -> Result<SnapshotFormat, EngineError> {
    match args.format.as_deref() {
        Some(format) => SnapshotFormat::try_from(format),
        None => match args.input.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("sql") => Ok(SnapshotFormat::Sql),
            _ => Ok(SnapshotFormat::Json),
        },
    }
}

struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> Result<Self, Box<dyn Error + Send + Sync>> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn prompt_password(prompt: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
    let _raw = RawModeGuard::enter()?;

    let mut out = std::io::stderr();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(prompt)
    )?;
    out.flush()?;

    let mut buf = String::new();
    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };

        match code {
            KeyCode::Enter => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                break;
            }
            KeyCode::Backspace => {
                if buf.pop().is_some() {
                    execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
                    out.flush()?;
                }
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                return Err("interrupted".into());
            }
            KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
                buf.push(ch);
                execute!(out, Print("*"))?;
                out.flush()?;
            }
            _ => {}
        }
    }

    Ok(buf)
}

fn prompt_password_twice() -> Result<String, Box<dyn Error + Send + Sync>> {
    let mut out = std::io::stderr();
    for _ in 0..3 {
        let first = prompt_password("Password: ")?;
        if first.is_empty() {
            execute!(
                out,
                cursor::MoveToColumn(0),
                terminal::Clear(ClearType::CurrentLine),
                Print("Password must not be empty.\r\n")
            )?;
            continue;
        }

        let second = prompt_password("Confirm password: ")?;
        if first == second {
            return Ok(first);
        }

        execute!(
            out,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine),
            Print("Passwords do not match. Try again.\r\n")
        )?;
    }

    Err("too many attempts".into())
}

async fn connect_engine(database_url: &str) -> Result<Engine, Box<dyn Error + Send + Sync>> {
    let db = engine::database::open(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(Engine::builder().database(db).build().await?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let engine = connect_engine(&cli.database_url).await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::Create(args),
        }) => {
            let role = match Role::try_from(args.role.as_str()) {
                Ok(role) => role,
                Err(err) => {
                    eprintln!("{err}");
                    std::process::exit(2);
                }
            };
            let password = prompt_password_twice()?;

            let mut cmd = NewUser::new(args.username, password).role(role);
            cmd.real_name = args.real_name;
            cmd.phone = args.phone;
            match engine.create_user(cmd).await {
                Ok(user) => println!("created user: {} ({})", user.username, user.role.as_str()),
                Err(EngineError::ExistingKey(username)) => {
                    eprintln!("user already exists: {username}");
                    std::process::exit(1);
                }
                Err(err) => return Err(err.into()),
            }
        }
        Command::Backup(args) => {
            let format = SnapshotFormat::try_from(args.format.as_str())?;
            let body = engine.export(format).await?;
            std::fs::write(&args.output, body)?;
            println!("backup written to {}", args.output.display());
        }
        Command::Restore(args) => {
            let format = restore_format(&args)?;
            let body = std::fs::read_to_string(&args.input)?;
            match format {
                SnapshotFormat::Json => engine.restore_json(&body).await?,
                SnapshotFormat::Sql => engine.restore_sql(&body).await?,
            }
            println!("restored from {}", args.input.display());
        }
    }

    Ok(())
}
