use std::panic;

use hn_daily::Outcome;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const HELP: &str = "HN-Daily - Pick today's Hacker News links from the terminal.

Usage: hn-daily [--help | --version]

  --version, -V        Show version and exit
  --help,    -h        Show this help message

Scrapes the Hacker News front page and lets you choose which links to open.
Select a link with its key (0-9, a-z); pressing it again cycles the state:
green opens the site, yellow opens the comments, plain leaves it alone.

  j, Space   scroll down        k   scroll up
  g          jump to top        G   jump to bottom
  q, Enter   open the selected links
  Ctrl-C     quit without opening anything

The tool runs once per day. The last run date is kept in ~/.hacker_news.";

fn main() {
    if handle_cli_flags() {
        return;
    }

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = hn_daily::ui::restore_if_acquired();
        original_hook(panic_info);
    }));

    match hn_daily::run() {
        Ok(outcome @ Outcome::AlreadyRanToday) => {
            if let Some(message) = outcome.message() {
                println!("{message}");
            }
        }
        Ok(outcome) => {
            if let Some(message) = outcome.message() {
                eprintln!("{message}");
            }
        }
        Err(err) => {
            eprintln!("error: {err:?}");
            std::process::exit(1);
        }
    }
}

fn handle_cli_flags() -> bool {
    let mut saw_flag = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("HN-Daily {}", hn_daily::VERSION);
                saw_flag = true;
            }
            "--help" | "-h" => {
                println!("{HELP}");
                saw_flag = true;
            }
            _ => {}
        }
    }
    saw_flag
}
