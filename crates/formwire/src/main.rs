#![forbid(unsafe_code)]

//! `formwire` command-line runner.
//!
//! Loads an HTML page, binds every behavior, replays scripted actions and
//! prints the resulting markup.
//!
//! ```text
//! formwire run plea.html -H "Refresh: 3600" -a "click #plea_guilty" -a unload
//! formwire behaviors
//! ```

use std::error::Error as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::rc::Rc;

use clap::{Parser, Subcommand, ValueEnum};
use formwire::prelude::*;
use formwire::runtime::RecordingAnalytics;
use formwire::{Error, LogConfig, LogFormat, Result, Script, init_tracing};

#[derive(Parser)]
#[command(name = "formwire", version, about = "Run form behaviors against an HTML page")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log output format.
    #[arg(long, value_enum, default_value = "compact", global = true)]
    log_format: LogFormatArg,
}

#[derive(Subcommand)]
enum Command {
    /// Bootstrap a page, replay actions and print the markup.
    Run(RunArgs),
    /// List behavior names accepted by `disabled_behaviors`.
    Behaviors,
}

#[derive(Parser)]
struct RunArgs {
    /// HTML file to load.
    #[arg(value_name = "PAGE")]
    page: PathBuf,

    /// Runtime configuration (.toml or .json).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Response header, as `Name: value`. Repeatable.
    #[arg(short = 'H', long = "header", value_name = "HEADER")]
    headers: Vec<String>,

    /// Action script, one action per line.
    #[arg(short, long, value_name = "FILE")]
    script: Option<PathBuf>,

    /// Single action, run after the script. Repeatable.
    #[arg(short, long = "action", value_name = "ACTION")]
    actions: Vec<String>,

    /// Page clock start, in Unix seconds (default: now).
    #[arg(long, value_name = "SECONDS")]
    now: Option<u64>,

    /// Record analytics events and print them.
    #[arg(long)]
    analytics: bool,

    /// Do not print the final markup.
    #[arg(long)]
    no_markup: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormatArg {
    Compact,
    Pretty,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Compact => Self::Compact,
            LogFormatArg::Pretty => Self::Pretty,
            LogFormatArg::Json => Self::Json,
        }
    }
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.display().to_string(),
        source,
    })
}

fn parse_header(raw: &str) -> Result<(String, String)> {
    raw.split_once(':')
        .map(|(name, value)| (name.trim().to_owned(), value.trim().to_owned()))
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| Error::Header(raw.to_owned()))
}

fn run(args: &RunArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => RuntimeConfig::load(path)?,
        None => RuntimeConfig::default(),
    };
    let doc = Document::parse(&read(&args.page)?)?;

    let mut env = config.environment();
    for raw in &args.headers {
        let (name, value) = parse_header(raw)?;
        env = env.with_header(name, value);
    }
    let sink = args.analytics.then(|| Rc::new(RecordingAnalytics::new()));
    if let Some(sink) = &sink {
        env = env.with_analytics(sink.clone());
    }

    let clock = Rc::new(match args.now {
        Some(secs) => ManualClock::at_unix(secs),
        None => ManualClock::new(web_time::SystemTime::now()),
    });
    let mut page = Page::new(doc, env, clock.clone());
    let (_registry, report) = formwire::bootstrap(&mut page, &config)?;
    for failure in &report.failed {
        eprintln!("not bound: {} ({})", failure.behavior, failure.error);
    }

    let mut script = match &args.script {
        Some(path) => Script::parse(&read(path)?)?,
        None => Script::default(),
    };
    if !args.actions.is_empty() {
        let extra = Script::parse(&args.actions.join("\n"))?;
        let mut actions = script.actions().to_vec();
        actions.extend_from_slice(extra.actions());
        script = Script::from_actions(actions);
    }
    let outcomes = script.run(&mut page, &clock)?;
    for (action, outcome) in script.actions().iter().zip(&outcomes) {
        eprintln!("{action:?}: {outcome}");
    }
    for navigation in page.navigations() {
        eprintln!("navigation: {navigation:?}");
    }
    if let Some(sink) = &sink {
        for event in sink.events() {
            eprintln!(
                "analytics: {} / {} / {}",
                event.category, event.action, event.label
            );
        }
    }
    if !args.no_markup {
        println!("{}", page.document().to_html());
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let log = LogConfig::from_verbosity(cli.verbose).with_format(cli.log_format.into());
    if let Err(err) = init_tracing(&log) {
        eprintln!("warning: {err}");
    }

    let result = match &cli.command {
        Command::Run(args) => run(args),
        Command::Behaviors => {
            for name in formwire::behaviors::BEHAVIOR_NAMES {
                println!("{name}");
            }
            Ok(())
        }
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            let mut source = err.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}
