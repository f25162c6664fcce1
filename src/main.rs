use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = cors_proxy::cli::Cli::parse();
    if let Err(e) = cors_proxy::cmd::dispatch(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
