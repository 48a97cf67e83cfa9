use std::io::{self, Write};

use super::Session;
use crate::output;

pub(super) async fn run(session: &Session, limit: Option<usize>, out: &mut dyn Write) -> io::Result<()> {
    let today = session.workspace.today();
    match session.dividends.upcoming_dividends(today).await {
        Ok(mut dividends) => {
            if let Some(limit) = limit {
                dividends.truncate(limit);
            }
            tracing::debug!(count = dividends.len(), "printing dividends");
            output::dividends(out, &dividends)
        }
        Err(error) => {
            tracing::warn!(%error, "dividend calendar unavailable");
            writeln!(out, "could not fetch dividends: {}", error.message())
        }
    }
}
