use clap::Parser;
use idea_factory::cli::commands::Cli;
use idea_factory::cli::handlers;
use tracing_subscriber::EnvFilter;

fn main() {
    // Diagnostics go to stderr so stdout stays clean for --json.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();

    let cli = Cli::parse();
    if let Err(e) = handlers::dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
