mod cli;
mod commands;
mod error;
mod output;
mod prompt;

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use clap::Parser;
use optwatch_core::{load_settings, DataPaths, Notice, Settings, Workspace};
use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::commands::{Flow, Session, Sources};
use crate::error::CliError;
use crate::prompt::StdinPrompt;

const PROMPT: &str = "opt> ";

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    let mut stdout = io::stdout();

    let paths = DataPaths::new(&cli.data_dir);
    if paths.prepare()? {
        output::notice(&mut stdout, &Notice::DataDirCreated(paths.root.clone()))?;
    }
    let settings = load_settings(&paths)?;
    init_tracing(&settings);

    let today = OffsetDateTime::now_utc().date();
    let sources = if cli.mock {
        Sources::Mock { today }
    } else {
        Sources::Live {
            timeout_ms: cli.timeout_ms,
        }
    };
    let chain = sources.chain_source(&settings);
    tracing::info!(source = chain.name(), %today, "opening workspace");

    let (workspace, notices) = Workspace::open(paths, settings, chain.as_ref(), today).await?;
    output::notices(&mut stdout, &notices)?;

    let mut session = Session::new(workspace, chain, sources.dividend_source(), Box::new(StdinPrompt))
        .with_sources(sources);

    if cli.command.is_empty() {
        repl(&mut session, &mut stdout).await?;
    } else {
        session.execute(&cli.command.join(" "), &mut stdout).await?;
    }

    session.shutdown(&mut stdout)?;
    stdout.flush()?;
    Ok(())
}

async fn repl(session: &mut Session, stdout: &mut io::Stdout) -> io::Result<()> {
    let mut line = String::new();
    loop {
        write!(stdout, "{PROMPT}")?;
        stdout.flush()?;

        line.clear();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            writeln!(stdout)?;
            break;
        }
        if session.execute(&line, stdout).await? == Flow::Exit {
            break;
        }
    }
    writeln!(stdout, "quitting...")
}

fn init_tracing(settings: &Settings) {
    let fallback = if settings.debug() { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
