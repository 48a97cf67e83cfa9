use std::io::{self, Write};

use super::Session;
use crate::output;

pub(super) fn create(session: &mut Session, names: &[String], out: &mut dyn Write) -> io::Result<()> {
    let notices = session.workspace.lists_mut().create(names);
    output::notices(out, &notices)
}

pub(super) fn delete(session: &mut Session, names: &[String], out: &mut dyn Write) -> io::Result<()> {
    let notices = session
        .workspace
        .lists_mut()
        .delete(names, &mut *session.prompt);
    output::notices(out, &notices)
}

pub(super) fn add(
    session: &mut Session,
    list: Option<&str>,
    tickers: &[String],
    out: &mut dyn Write,
) -> io::Result<()> {
    let Some(list) = list else {
        return writeln!(out, "No valid list specified");
    };
    let notices = session.workspace.lists_mut().add(list, tickers);
    output::notices(out, &notices)?;
    echo(session, list, out)
}

pub(super) fn remove(
    session: &mut Session,
    list: Option<&str>,
    tickers: &[String],
    out: &mut dyn Write,
) -> io::Result<()> {
    let Some(list) = list else {
        return writeln!(out, "No valid list specified");
    };
    let notices = session.workspace.lists_mut().remove(list, tickers);
    output::notices(out, &notices)?;
    echo(session, list, out)
}

pub(super) fn print(session: &Session, names: &[String], out: &mut dyn Write) -> io::Result<()> {
    for rendered in session.workspace.lists().render_many(names) {
        match rendered {
            Ok(line) => writeln!(out, "{line}")?,
            Err(notice) => output::notice(out, &notice)?,
        }
    }
    Ok(())
}

fn echo(session: &Session, list: &str, out: &mut dyn Write) -> io::Result<()> {
    match session.workspace.lists().render(list) {
        Some(line) => writeln!(out, "{line}"),
        None => Ok(()),
    }
}
