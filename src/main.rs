use anyhow::Result;
use bootline::{activity::ActivityRules, cli::Cli, render, session::Session, source::CommandSource};
use clap::Parser;
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.debug);

    let config = args.config();
    config.validate()?;

    let rules = match &args.activities {
        Some(path) => ActivityRules::from_file(path)?,
        None => ActivityRules::default_rules()?,
    };

    let mut source = CommandSource::new(&args.command)?;
    let colour = render::use_colour(config.force_colour);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    Session::new(config, &rules)
        .with_colour(colour)
        .run(&mut source, &mut out)?;
    out.flush()?;

    Ok(())
}
