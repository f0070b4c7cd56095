use std::process;

use clap::Parser;
use sepolint::{run_and_output, Args};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    let args = Args::parse();

    let default_filter = if args.verbose { "sepolint=debug" } else { "sepolint=warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match args.load_config_file_and_into_config() {
        Ok(config) => config,
        Err(error) => {
            println!("sepolint: {error}");
            process::exit(2);
        }
    };

    process::exit(run_and_output(config).code());
}
