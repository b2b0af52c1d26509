use anyhow::Result;
use arbre::{app, cli};
use clap::Parser;

fn main() -> Result<()> {
    let args = cli::Args::parse();
    init_logging(args.verbose);

    // Handle shell completion generation
    if let Some(shell) = args.completions {
        cli::generate_completions(shell);
        return Ok(());
    }

    let app = app::App::new(args)?;
    app.run()?;

    Ok(())
}

/// Log to stderr; `RUST_LOG` takes precedence over `-v`
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}
