use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = infraharvest::cli::Cli::parse();
    if let Err(e) = infraharvest::cmd::dispatch(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
