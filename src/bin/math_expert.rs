use clap::Parser;
use mathexpert::cli::{execute, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = execute(cli).await {
        mathexpert::init_logger();
        log::error!("Command execution failed: {}", err);
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}
