use std::io::{self, Write};

use optwatch_core::Notice;

use super::Session;
use crate::output;

pub(super) fn list(session: &Session, names: &[String], out: &mut dyn Write) -> io::Result<()> {
    for row in session.workspace.front_months(names) {
        match row {
            Ok((ticker, month)) => output::front_month(out, &ticker, month)?,
            Err(notice) => output::notice(out, &notice)?,
        }
    }
    Ok(())
}

pub(super) async fn refresh(session: &mut Session, out: &mut dyn Write) -> io::Result<()> {
    output::notice(out, &Notice::RefreshingMonths)?;
    let notices = session
        .workspace
        .refresh_months(session.fetcher.source())
        .await;
    output::notices(out, &notices)
}
