use std::io::{self, Write};

use optwatch_core::SettingKey;

use super::Session;
use crate::output;

pub(super) fn print(session: &Session, out: &mut dyn Write) -> io::Result<()> {
    output::settings(out, session.workspace.settings())
}

pub(super) fn set(session: &mut Session, args: &[String], out: &mut dyn Write) -> io::Result<()> {
    let [key, value] = args else {
        return writeln!(out, "Requires both key and value");
    };
    match session.workspace.set_setting(key, value) {
        Ok((key, saved)) => {
            if key == SettingKey::Login {
                session.rebuild_chain_source();
            }
            if let Some(notice) = saved {
                output::notice(out, &notice)?;
            }
            Ok(())
        }
        Err(error) => writeln!(out, "{error}"),
    }
}

pub(super) fn save(session: &mut Session, out: &mut dyn Write) -> io::Result<()> {
    let notices = session.workspace.save_all();
    output::notices(out, &notices)
}
