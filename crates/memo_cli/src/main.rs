//! `memo` command-line entry point.
//!
//! # Responsibility
//! - Map flags and `MEMO_*` variables onto a store configuration.
//! - Run one command against a memo session and flush before exiting.
//! - Report failures on stderr with a non-zero exit status.

mod cli;
mod prompt;

use clap::Parser;
use cli::{Cli, Command};
use log::{error, info};
use memo_core::config::build_repository;
use memo_core::{
    default_log_level, encode, init_logging, MemoRepository, MemoService, MemoServiceError,
    SessionStatus, StoreError,
};
use prompt::PromptPicker;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::{self, Write};
use std::process::ExitCode;

#[derive(Debug)]
enum CliError {
    /// The backend could not be built.
    Store(StoreError),
    /// A session operation failed.
    Session(MemoServiceError),
    /// A mutating command ran without a storage location.
    LocationRequired,
    Output(io::Error),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Session(err) => write!(f, "{err}"),
            Self::LocationRequired => {
                write!(f, "no storage location selected; pass --dir or answer the prompt")
            }
            Self::Output(err) => write!(f, "failed to write output: {err}"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Session(err) => Some(err),
            Self::Output(err) => Some(err),
            Self::LocationRequired => None,
        }
    }
}

impl From<StoreError> for CliError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<MemoServiceError> for CliError {
    fn from(value: MemoServiceError) -> Self {
        Self::Session(value)
    }
}

impl From<io::Error> for CliError {
    fn from(value: io::Error) -> Self {
        Self::Output(value)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_ref() {
        if let Err(err) = init_logging(default_log_level(), log_dir) {
            eprintln!("warning: logging disabled: {err}");
        }
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_command module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let config = cli.store_config();
    let repo = build_repository(&config, Box::new(PromptPicker::stdio()))?;
    let mut service = MemoService::with_quiet_period(repo, config.flush_quiet_period);

    if service.open()? == SessionStatus::NeedLocation && !service.select_location()? {
        if !cli.is_read_only() {
            return Err(CliError::LocationRequired);
        }
        eprintln!("note: no storage location selected; these memos are not saved");
    }

    let mut stdout = io::stdout().lock();
    execute(&mut service, &cli.command, &mut stdout)?;
    let written = service.flush_now()?;
    info!("event=cli_command module=cli status=ok flushed={written}");
    Ok(())
}

fn execute<R, W>(
    service: &mut MemoService<R>,
    command: &Command,
    out: &mut W,
) -> Result<(), CliError>
where
    R: MemoRepository,
    W: Write,
{
    match command {
        Command::List => {
            for memo in service.memos() {
                writeln!(
                    out,
                    "{:>3}  {}  {}",
                    memo.order,
                    memo.id,
                    memo.title.replace(['\n', '\r'], " ")
                )?;
            }
        }
        Command::Show { id } => {
            let memo = service
                .get(id)
                .ok_or_else(|| MemoServiceError::MemoNotFound(id.clone()))?;
            writeln!(out, "{}", encode(memo))?;
        }
        Command::Add { title, body } => {
            let memo = service.add_memo(title.clone(), body.as_str())?;
            writeln!(out, "{}", memo.id)?;
        }
        Command::Edit { id, title, body } => {
            let memo = service.patch_memo(id, title.clone(), body.clone())?;
            writeln!(out, "{}", memo.id)?;
        }
        Command::Delete { id } => {
            let memo = service.delete_memo(id)?;
            writeln!(out, "deleted {}", memo.id)?;
        }
        Command::Move { from, to } => {
            service.reorder(*from, *to)?;
            writeln!(out, "moved {from} -> {to}")?;
        }
        Command::ImportLegacy => {
            let imported = service.import_legacy()?;
            writeln!(out, "imported {imported} memo(s)")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{execute, CliError};
    use crate::cli::Command;
    use memo_core::{ErrorKind, MemoService, SqliteBlobBackend, StoreMemoRepository};

    fn service() -> MemoService<StoreMemoRepository<SqliteBlobBackend>> {
        let repo = StoreMemoRepository::new(SqliteBlobBackend::open_in_memory().unwrap());
        let mut service = MemoService::new(repo);
        service.open().unwrap();
        service
    }

    fn run(
        service: &mut MemoService<StoreMemoRepository<SqliteBlobBackend>>,
        command: Command,
    ) -> String {
        let mut out = Vec::new();
        execute(service, &command, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn list_prints_one_line_per_memo_in_order() {
        let mut service = service();
        let listing = run(&mut service, Command::List);
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("new memo 1"));
        assert!(lines[1].starts_with("  1  "));
    }

    #[test]
    fn add_edit_and_move_update_the_session() {
        let mut service = service();
        let id = run(
            &mut service,
            Command::Add {
                title: Some("groceries".to_string()),
                body: "milk".to_string(),
            },
        );
        let id = id.trim().to_string();

        run(
            &mut service,
            Command::Edit {
                id: id.clone(),
                title: None,
                body: Some("milk, eggs".to_string()),
            },
        );
        run(&mut service, Command::Move { from: 2, to: 0 });

        let memo = &service.memos()[0];
        assert_eq!(memo.id, id);
        assert_eq!(memo.title, "groceries");
        assert_eq!(memo.body, "milk, eggs");
    }

    #[test]
    fn show_unknown_id_is_not_found() {
        let mut service = service();
        let err = execute(
            &mut service,
            &Command::Show {
                id: "missing".to_string(),
            },
            &mut Vec::new(),
        )
        .unwrap_err();
        match err {
            CliError::Session(err) => assert_eq!(err.kind(), ErrorKind::NotFound),
            other => panic!("unexpected error: {other}"),
        }
    }
}
