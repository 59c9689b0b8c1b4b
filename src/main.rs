mod app;
mod calendar;
mod config;
mod coordinator;
mod help;
mod jumpto;
mod source;
mod theme;
use crate::app::App;
use crate::config::{parse_ymd, ymd, Config};
use crate::coordinator::RequestCoordinator;
use crate::source::SimulatedSource;
use anyhow::Context;
use flexi_logger::{FileSpec, Logger, LoggerHandle};
use lexopt::{Arg, Parser, ValueExt};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use time::{Date, OffsetDateTime};

const DEFAULT_LOG_LEVEL: &str = if cfg!(debug_assertions) {
    "debug"
} else {
    "info"
};

#[derive(Clone, Debug, Eq, PartialEq)]
enum Command {
    Run(Config),
    Help,
    Version,
}

impl Command {
    fn from_parser(mut parser: Parser) -> Result<Command, lexopt::Error> {
        let mut config = Config::default();
        let mut highlights = Vec::new();
        while let Some(arg) = parser.next()? {
            match arg {
                Arg::Short('h') | Arg::Long("help") => return Ok(Command::Help),
                Arg::Short('V') | Arg::Long("version") => return Ok(Command::Version),
                Arg::Short('d') | Arg::Long("delay") => {
                    config.delay = Duration::from_millis(parser.value()?.parse()?);
                }
                Arg::Short('H') | Arg::Long("highlight") => {
                    highlights.push(parse_date(parser.value()?.string()?)?);
                }
                Arg::Short('F') | Arg::Long("fail") => {
                    config.failing.push(parse_date(parser.value()?.string()?)?);
                }
                Arg::Short('l') | Arg::Long("log-file") => {
                    config.log_file = Some(parser.value()?.into());
                }
                Arg::Value(value) if config.date.is_none() => {
                    config.date = Some(parse_date(value.string()?)?);
                }
                _ => return Err(arg.unexpected()),
            }
        }
        if !highlights.is_empty() {
            config.highlights = highlights;
        }
        Ok(Command::Run(config))
    }

    fn run(self) -> anyhow::Result<()> {
        match self {
            Command::Run(config) => {
                // Must happen before any other threads are started
                let today = OffsetDateTime::now_local()
                    .context("failed to determine local date")?
                    .date();
                let _logger = init_logging(config.log_file.as_deref())?;
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .context("failed to start async runtime")?;
                if let Some(date) = runtime.block_on(run_calendar(config, today))? {
                    println!("{}", ymd(date));
                }
                Ok(())
            }
            Command::Help => {
                println!("Usage: daypin [OPTIONS] [YYYY-MM-DD]");
                println!();
                println!("Terminal month calendar pinning dates fetched from a backend");
                println!();
                println!("Options:");
                println!("  -d, --delay <MS>          Latency of the simulated backend [default: 500]");
                println!("  -H, --highlight <DATE>    Date for the backend to report as highlighted;");
                println!("                            may be given multiple times");
                println!("  -F, --fail <DATE>         Make the simulated backend fail for the month");
                println!("                            containing DATE; may be given multiple times");
                println!("  -l, --log-file <PATH>     Write logs to the given file");
                println!("  -h, --help                Display this help message and exit");
                println!("  -V, --version             Show the program version and exit");
                Ok(())
            }
            Command::Version => {
                println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
                Ok(())
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    Command::from_parser(Parser::from_env())?.run()
}

async fn run_calendar(config: Config, today: Date) -> anyhow::Result<Option<Date>> {
    let initial = config.date.unwrap_or(today);
    log::info!(
        "Starting at {} with a {}ms simulated backend",
        ymd(initial),
        config.delay.as_millis()
    );
    let source = SimulatedSource::new(config.delay, config.highlights)
        .failing(config.failing);
    let (coordinator, completions) = RequestCoordinator::new(Arc::new(source), initial);
    let app = App::new(coordinator, completions, today);
    let mut terminal = ratatui::init();
    if let Err(e) = terminal.hide_cursor() {
        ratatui::restore();
        return Err(e).context("failed to hide cursor");
    }
    let r = app.run(terminal).await;
    ratatui::restore();
    r
}

// The terminal belongs to the calendar, so nothing is logged unless a log file
// is given.
fn init_logging(log_file: Option<&Path>) -> anyhow::Result<Option<LoggerHandle>> {
    let Some(path) = log_file else {
        return Ok(None);
    };
    let handle = Logger::try_with_env_or_str(DEFAULT_LOG_LEVEL)?
        .log_to_file(FileSpec::try_from(path)?)
        .start()
        .context("failed to start logger")?;
    Ok(Some(handle))
}

fn parse_date(value: String) -> Result<Date, lexopt::Error> {
    match parse_ymd(&value) {
        Ok(d) => Ok(d),
        Err(e) => Err(lexopt::Error::ParsingFailed {
            value,
            error: Box::new(e),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_HIGHLIGHTS;
    use std::path::PathBuf;
    use time::macros::date;

    fn parse(args: &[&str]) -> Result<Command, lexopt::Error> {
        Command::from_parser(Parser::from_args(args))
    }

    #[test]
    fn test_defaults() {
        assert_eq!(parse(&[]).unwrap(), Command::Run(Config::default()));
    }

    #[test]
    fn test_full() {
        let cmd = parse(&[
            "--delay=50",
            "-H",
            "2024-04-01",
            "--highlight",
            "2024-04-02",
            "--fail=2024-05-01",
            "-l",
            "daypin.log",
            "2024-04-10",
        ])
        .unwrap();
        assert_eq!(
            cmd,
            Command::Run(Config {
                date: Some(date!(2024 - 04 - 10)),
                delay: Duration::from_millis(50),
                highlights: vec![date!(2024 - 04 - 01), date!(2024 - 04 - 02)],
                failing: vec![date!(2024 - 05 - 01)],
                log_file: Some(PathBuf::from("daypin.log")),
            })
        );
    }

    #[test]
    fn test_date_only() {
        let Command::Run(config) = parse(&["2024-03-01"]).unwrap() else {
            panic!("expected a run command");
        };
        assert_eq!(config.date, Some(date!(2024 - 03 - 01)));
        assert_eq!(config.highlights, DEFAULT_HIGHLIGHTS);
    }

    #[test]
    fn test_help_wins() {
        assert_eq!(parse(&["2024-03-01", "--help"]).unwrap(), Command::Help);
        assert_eq!(parse(&["-V"]).unwrap(), Command::Version);
    }

    #[test]
    fn test_bad_args() {
        assert!(parse(&["2024-13-01"]).is_err());
        assert!(parse(&["2024-03-01", "2024-03-02"]).is_err());
        assert!(parse(&["--delay", "soon"]).is_err());
        assert!(parse(&["--highlight"]).is_err());
        assert!(parse(&["--frobnicate"]).is_err());
    }
}
