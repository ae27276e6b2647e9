//! `roadmap` command-line front end

mod cli;
mod commands;
mod items_file;

use tracing_subscriber::EnvFilter;

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli::build().get_matches();
    let config = commands::load_config(&matches)?;
    init_tracing(&config.log_level);

    let output = commands::run(&matches, config).await?;
    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}
