use clap::Parser;
use keepalive::cli::{
    handle_config_check, handle_config_init, handle_once, Cli, Commands, ConfigCommands,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => keepalive::cli::run::run_pinger(args).await,
        Commands::Once(args) => match handle_once(&args).await {
            Ok(true) => Ok(()),
            Ok(false) => std::process::exit(1),
            Err(e) => Err(e),
        },
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Init(args) => handle_config_init(&args),
            ConfigCommands::Check(args) => handle_config_check(&args).map(|rendered| {
                print!("{}", rendered);
            }),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
