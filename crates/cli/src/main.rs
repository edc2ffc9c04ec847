use clap::Parser;

#[tokio::main]
async fn main() {
    // Missing .env is fine, variables may come from the environment itself
    let _ = dotenvy::dotenv();

    if let Err(err) = groovyswap_cli::run(groovyswap_cli::args::Cli::parse()).await {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}
