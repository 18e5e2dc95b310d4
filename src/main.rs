#[cfg(not(any(tarpaulin, coverage)))]
use clap::Parser;
#[cfg(not(any(tarpaulin, coverage)))]
use std::io::Write;
#[cfg(not(any(tarpaulin, coverage)))]
const BLUE: &str = "\x1b[94m";
#[cfg(not(any(tarpaulin, coverage)))]
const RESET: &str = "\x1b[0m";

#[cfg(not(any(tarpaulin, coverage)))]
fn main() {
    let cli = covref::Cli::parse();
    env_logger::Builder::new()
        .format(|buf, record| {
            if record.level() == log::Level::Error {
                writeln!(buf, "{}Error:{} {}", BLUE, RESET, record.args())
            } else {
                writeln!(buf, "{}", record.args())
            }
        })
        .filter(None, covref::log_level(&cli))
        .parse_env("COVREF_LOG")
        .init();

    match covref::execute_cli(cli) {
        Ok(outcome) => std::process::exit(outcome.exit_code()),
        Err(e) => {
            eprintln!("{}Error:{} {}", BLUE, RESET, e);
            std::process::exit(1);
        }
    }
}

#[cfg(any(tarpaulin, coverage))]
fn main() {}
