use std::io::{self, Write};

use optwatch_core::{FetchEvent, InstrumentMode};

use super::Session;
use crate::output;

/// Writes streamed events, keeping the first write failure.
struct EventWriter<'a> {
    out: &'a mut dyn Write,
    verbose: bool,
    failure: Option<io::Error>,
}

impl<'a> EventWriter<'a> {
    fn new(out: &'a mut dyn Write, verbose: bool) -> Self {
        Self {
            out,
            verbose,
            failure: None,
        }
    }

    fn write(&mut self, event: FetchEvent) {
        if self.failure.is_some() {
            return;
        }
        let outcome = match &event {
            FetchEvent::Notice(notice) => output::notice(self.out, notice),
            FetchEvent::Chain(report) => output::chain_report(self.out, report, self.verbose),
        };
        if let Err(error) = outcome {
            self.failure = Some(error);
        }
    }

    fn finish(self) -> io::Result<()> {
        match self.failure {
            Some(error) => Err(error),
            None => self.out.flush(),
        }
    }
}

pub(super) async fn run(
    session: &mut Session,
    targets: &[String],
    mode: InstrumentMode,
    out: &mut dyn Write,
) -> io::Result<()> {
    let verbose = session.workspace.settings().debug();
    let mut writer = EventWriter::new(out, verbose);
    let summary = session
        .fetcher
        .fetch(&mut session.workspace, targets, mode, false, |event| writer.write(event))
        .await;
    tracing::debug!(?summary, %mode, "fetch command finished");
    writer.finish()
}

pub(super) async fn report(session: &mut Session, out: &mut dyn Write) -> io::Result<()> {
    let verbose = session.workspace.settings().debug();
    let mut writer = EventWriter::new(out, verbose);
    let outcome = session
        .fetcher
        .daily_report(&mut session.workspace, |event| writer.write(event))
        .await;
    match outcome {
        Ok(summary) => {
            tracing::debug!(?summary, "daily report finished");
            writer.finish()
        }
        Err(error) => {
            tracing::warn!(%error, "daily watchlist unavailable");
            writer.finish()?;
            writeln!(out, "could not fetch the daily watchlist: {}", error.message())
        }
    }
}
