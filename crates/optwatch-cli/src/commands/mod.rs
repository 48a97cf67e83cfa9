//! Line-oriented command dispatcher.
//!
//! | Command | Handler |
//! |---------|---------|
//! | `fetch`, `options`, `spreads`, `calendar`, `$TICKER ...` | [`fetch`] |
//! | `report`, `daily` | [`fetch`] |
//! | `create`, `delete`, `add`, `remove`, `list` | [`lists`] |
//! | `list_months`, `refresh` | [`months`] |
//! | `dividends` | [`dividends`] |
//! | `settings`, `set`, `save` | [`settings`] |

mod dividends;
mod fetch;
mod help;
mod lists;
mod months;
mod settings;

use std::io::{self, Write};
use std::sync::Arc;

use optwatch_core::adapters::{MockChainSource, MockDividendSource, NasdaqDividendSource, YahooChainSource};
use optwatch_core::{
    ChainSource, DividendSource, Fetcher, InstrumentMode, Prompt, Settings, Workspace, TICKER_SIGIL,
};
use time::Date;

/// Splits arguments on any mix of whitespace and commas.
pub fn split_arguments(input: &str) -> Vec<String> {
    input
        .split(|ch: char| ch.is_whitespace() || ch == ',')
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Empty,
    Help,
    Fetch {
        mode: InstrumentMode,
        targets: Vec<String>,
    },
    Report,
    Create(Vec<String>),
    Delete(Vec<String>),
    Add {
        list: Option<String>,
        tickers: Vec<String>,
    },
    Remove {
        list: Option<String>,
        tickers: Vec<String>,
    },
    List(Vec<String>),
    ListMonths(Vec<String>),
    Refresh,
    Dividends(Option<usize>),
    Settings,
    Set(Vec<String>),
    Save,
    Exit,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        if line.starts_with(TICKER_SIGIL) {
            return Self::Fetch {
                mode: InstrumentMode::ALL,
                targets: split_arguments(line),
            };
        }

        let (keyword, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let args = split_arguments(rest);
        let fetch = |mode| Self::Fetch {
            mode,
            targets: split_arguments(rest),
        };

        match keyword {
            "help" => Self::Help,
            "fetch" => fetch(InstrumentMode::ALL),
            "options" => fetch(InstrumentMode::OPTIONS),
            "spreads" => fetch(InstrumentMode::SPREADS),
            "calendar" => fetch(InstrumentMode::CALENDAR),
            "report" | "daily" => Self::Report,
            "create" => Self::Create(args),
            "delete" => Self::Delete(args),
            "add" | "remove" => {
                let mut args = args.into_iter();
                let list = args.next();
                let tickers = args.collect();
                if keyword == "add" {
                    Self::Add { list, tickers }
                } else {
                    Self::Remove { list, tickers }
                }
            }
            "list" => Self::List(args),
            "list_months" => Self::ListMonths(args),
            "refresh" => Self::Refresh,
            "dividends" => Self::Dividends(args.first().and_then(|count| count.parse().ok())),
            "settings" => Self::Settings,
            "set" => Self::Set(args),
            "save" => Self::Save,
            "exit" | "quit" => Self::Exit,
            _ => Self::Unknown(line.to_owned()),
        }
    }
}

/// Whether the session keeps reading commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// How collaborators are built; rebuilt when the session credential changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sources {
    Mock { today: Date },
    Live { timeout_ms: u64 },
}

impl Sources {
    pub fn chain_source(self, settings: &Settings) -> Arc<dyn ChainSource> {
        match self {
            Self::Mock { today } => Arc::new(MockChainSource::synthetic(today)),
            Self::Live { timeout_ms } => Arc::new(
                YahooChainSource::with_reqwest(settings.login().map(str::to_owned))
                    .with_timeout_ms(timeout_ms),
            ),
        }
    }

    pub fn dividend_source(self) -> Arc<dyn DividendSource> {
        match self {
            Self::Mock { .. } => Arc::new(MockDividendSource::sample()),
            Self::Live { timeout_ms } => {
                Arc::new(NasdaqDividendSource::with_reqwest().with_timeout_ms(timeout_ms))
            }
        }
    }
}

/// Loaded workspace plus the collaborators commands run against.
pub struct Session {
    workspace: Workspace,
    sources: Option<Sources>,
    fetcher: Fetcher,
    dividends: Arc<dyn DividendSource>,
    prompt: Box<dyn Prompt>,
}

impl Session {
    pub fn new(
        workspace: Workspace,
        chain: Arc<dyn ChainSource>,
        dividends: Arc<dyn DividendSource>,
        prompt: Box<dyn Prompt>,
    ) -> Self {
        Self {
            workspace,
            sources: None,
            fetcher: Fetcher::new(chain),
            dividends,
            prompt,
        }
    }

    /// Rebuilds the chain source from `sources` whenever the credential changes.
    pub fn with_sources(mut self, sources: Sources) -> Self {
        self.sources = Some(sources);
        self
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    fn rebuild_chain_source(&mut self) {
        if let Some(sources) = self.sources {
            self.fetcher = Fetcher::new(sources.chain_source(self.workspace.settings()));
            tracing::debug!("rebuilt chain source after credential change");
        }
    }

    /// Parses and runs one line.
    pub async fn execute(&mut self, line: &str, out: &mut dyn Write) -> io::Result<Flow> {
        let command = Command::parse(line);
        tracing::debug!(?command, "dispatching");

        match command {
            Command::Empty => {}
            Command::Help => help::run(out)?,
            Command::Fetch { mode, targets } => fetch::run(self, &targets, mode, out).await?,
            Command::Report => fetch::report(self, out).await?,
            Command::Create(names) => lists::create(self, &names, out)?,
            Command::Delete(names) => lists::delete(self, &names, out)?,
            Command::Add { list, tickers } => lists::add(self, list.as_deref(), &tickers, out)?,
            Command::Remove { list, tickers } => {
                lists::remove(self, list.as_deref(), &tickers, out)?;
            }
            Command::List(names) => lists::print(self, &names, out)?,
            Command::ListMonths(names) => months::list(self, &names, out)?,
            Command::Refresh => months::refresh(self, out).await?,
            Command::Dividends(limit) => dividends::run(self, limit, out).await?,
            Command::Settings => settings::print(self, out)?,
            Command::Set(args) => settings::set(self, &args, out)?,
            Command::Save => settings::save(self, out)?,
            Command::Exit => return Ok(Flow::Exit),
            Command::Unknown(line) => writeln!(out, "Unknown command: {line}")?,
        }
        Ok(Flow::Continue)
    }

    /// Writes every dirty store and reports failures.
    pub fn shutdown(&mut self, out: &mut dyn Write) -> io::Result<()> {
        crate::output::notices(out, &self.workspace.flush_dirty())
    }
}

#[cfg(test)]
mod tests {
    use optwatch_core::adapters::MockDividendSource;
    use optwatch_core::{DataPaths, MonthCode, ScriptedPrompt, Ticker};
    use time::macros::date;
    use time::Duration;

    use super::*;

    const TODAY: Date = date!(2026 - 10 - 14);

    fn ticker(raw: &str) -> Ticker {
        Ticker::parse(raw).expect("ticker")
    }

    fn session(dir: &std::path::Path, chain: Arc<MockChainSource>, answers: &[&str]) -> Session {
        let paths = DataPaths::new(dir);
        let workspace = Workspace::empty(paths, Settings::default(), TODAY);
        Session::new(
            workspace,
            chain,
            Arc::new(MockDividendSource::sample()),
            Box::new(ScriptedPrompt::new(answers.iter().copied())),
        )
    }

    async fn run(session: &mut Session, line: &str) -> String {
        let mut out = Vec::new();
        session.execute(line, &mut out).await.expect("write");
        String::from_utf8(out).expect("utf8")
    }

    #[test]
    fn arguments_split_on_commas_and_spaces() {
        assert_eq!(split_arguments(" TECH,$aapl  msft,,"), ["TECH", "$aapl", "msft"]);
    }

    #[test]
    fn sigil_line_is_an_implicit_fetch() {
        assert_eq!(
            Command::parse("$AAPL, TECH"),
            Command::Fetch {
                mode: InstrumentMode::ALL,
                targets: vec![String::from("$AAPL"), String::from("TECH")],
            }
        );
    }

    #[test]
    fn keywords_map_to_commands() {
        assert_eq!(
            Command::parse("spreads"),
            Command::Fetch {
                mode: InstrumentMode::SPREADS,
                targets: Vec::new(),
            }
        );
        assert_eq!(
            Command::parse("add TECH $GOOGL"),
            Command::Add {
                list: Some(String::from("TECH")),
                tickers: vec![String::from("$GOOGL")],
            }
        );
        assert_eq!(Command::parse("dividends 3"), Command::Dividends(Some(3)));
        assert_eq!(Command::parse("dividends lots"), Command::Dividends(None));
        assert_eq!(Command::parse("quit"), Command::Exit);
        assert_eq!(Command::parse("   "), Command::Empty);
        assert_eq!(
            Command::parse("frobnicate now"),
            Command::Unknown(String::from("frobnicate now"))
        );
    }

    #[tokio::test]
    async fn list_scenario_reports_each_step() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut session = session(temp.path(), Arc::new(MockChainSource::new()), &[]);

        run(&mut session, "create TECH").await;
        assert_eq!(run(&mut session, "add TECH aapl msft").await, "TECH: AAPL, MSFT\n");
        assert_eq!(run(&mut session, "create TECH").await, "TECH already exists\n");
        assert_eq!(run(&mut session, "add TECH $GOOGL").await, "TECH: AAPL, GOOGL, MSFT\n");
        assert_eq!(run(&mut session, "remove TECH MSFT").await, "TECH: AAPL, GOOGL\n");
        assert_eq!(
            run(&mut session, "remove TECH MSFT").await,
            "MSFT not in list\nTECH: AAPL, GOOGL\n"
        );
        assert_eq!(run(&mut session, "add NOPE X").await, "No valid list specified\n");
    }

    #[tokio::test]
    async fn unknown_command_has_no_side_effects() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut session = session(temp.path(), Arc::new(MockChainSource::new()), &[]);
        assert_eq!(run(&mut session, "grow TECH").await, "Unknown command: grow TECH\n");
        assert!(!session.workspace().is_dirty());
    }

    #[tokio::test]
    async fn set_validates_and_saves_immediately() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut session = session(temp.path(), Arc::new(MockChainSource::new()), &[]);

        assert_eq!(run(&mut session, "set PRINT_ALL").await, "Requires both key and value\n");
        assert_eq!(run(&mut session, "set COLOR red").await, "COLOR is not a valid setting\n");
        assert!(run(&mut session, "set MIN_TIME_DIFFERENCE soon")
            .await
            .contains("expects an integer"));

        assert_eq!(run(&mut session, "set MIN_TIME_DIFFERENCE 9").await, "");
        assert!(!session.workspace().settings().is_dirty());
        let saved = std::fs::read_to_string(temp.path().join("settings.csv")).expect("saved");
        assert!(saved.contains("MIN_TIME_DIFFERENCE,9"));
    }

    #[tokio::test]
    async fn delete_asks_before_dropping_a_populated_list() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut session = session(temp.path(), Arc::new(MockChainSource::new()), &["maybe", "n"]);
        run(&mut session, "create TECH").await;
        run(&mut session, "add TECH AAPL").await;

        run(&mut session, "delete TECH").await;
        assert!(session.workspace().lists().contains("TECH"));
    }

    #[tokio::test]
    async fn dividends_are_truncated_to_the_requested_count() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut session = session(temp.path(), Arc::new(MockChainSource::new()), &[]);
        let text = run(&mut session, "dividends 2").await;
        assert_eq!(text.lines().filter(|line| !line.is_empty()).count(), 2);
        assert!(text.starts_with("Coca-Cola Company (The) (KO): 10/15/2026 0.51/2.04 (3.01%)\n"));

        let all = run(&mut session, "dividends x").await;
        assert_eq!(all.lines().filter(|line| !line.is_empty()).count(), 4);
    }

    #[tokio::test]
    async fn fetch_of_unknown_ticker_prints_the_box() {
        let temp = tempfile::tempdir().expect("tempdir");
        let chain = Arc::new(MockChainSource::new());
        let mut session = session(temp.path(), chain.clone(), &[]);

        let text = run(&mut session, "$ZZZZ").await;
        assert!(text.contains("| ZZZZ is not a valid stock ticker |"));
        assert!(chain.calls().option_chains.is_empty());
    }

    #[tokio::test]
    async fn calendar_only_fetch_prints_nothing_but_rolls_months() {
        let temp = tempfile::tempdir().expect("tempdir");
        let chain = Arc::new(MockChainSource::new());
        chain.set_months(
            &ticker("AAPL"),
            vec![
                MonthCode::new(TODAY + Duration::days(2)),
                MonthCode::new(TODAY + Duration::days(37)),
            ],
        );
        let mut session = session(temp.path(), chain.clone(), &[]);

        assert_eq!(run(&mut session, "calendar $AAPL").await, "");
        assert!(chain.calls().option_chains.is_empty());
        assert_eq!(
            session.workspace().months().front_month(&ticker("AAPL")),
            Some(MonthCode::new(TODAY + Duration::days(37)))
        );
    }

    #[tokio::test]
    async fn exit_stops_the_session() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut session = session(temp.path(), Arc::new(MockChainSource::new()), &[]);
        let mut out = Vec::new();
        assert_eq!(session.execute("exit", &mut out).await.expect("write"), Flow::Exit);
    }
}
