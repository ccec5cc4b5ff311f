use clap::Parser as _;
use daikin_brp_tools::commands;
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};

#[derive(clap::Parser)]
#[clap(version, about, author)]
enum Commands {
    Attributes(commands::attributes::Args),
    State(commands::state::Args),
    Plan(commands::plan::Args),
}

fn end<E: std::error::Error>(r: Result<(), E>) {
    std::process::exit(match r {
        Ok(_) => 0,
        Err(e) => {
            eprintln!("error: {e}");
            let mut cause = e.source();
            while let Some(e) = cause {
                eprintln!("  because: {e}");
                cause = e.source();
            }
            1
        }
    });
}

fn main() {
    let filter_description = std::env::var("DAIKIN_BRP_TOOLS_LOG").unwrap_or_else(|_| "error".to_string());
    let filter = filter_description
        .parse::<tracing_subscriber::filter::targets::Targets>()
        .expect("parse DAIKIN_BRP_TOOLS_LOG filter");
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
    match Commands::parse() {
        Commands::Attributes(args) => end(commands::attributes::run(args)),
        Commands::State(args) => end(commands::state::run(args)),
        Commands::Plan(args) => end(commands::plan::run(args)),
    }
}
