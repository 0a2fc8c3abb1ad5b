use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = hookfan::cli::Cli::parse();
    if let Err(e) = hookfan::cmd::dispatch(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
