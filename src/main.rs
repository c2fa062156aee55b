use clap::Parser;
use dispatch::cli::{
    handle_completions, handle_config_init, handle_config_validate, handle_dispositions, replay,
    Cli, Commands, ConfigCommands,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve(args) => dispatch::cli::serve::run_serve(args).await,
        Commands::Replay(args) => match replay::handle_replay(&args).await {
            Ok(output) => {
                println!("{}", output);
                Ok(())
            }
            Err(e) => Err(e),
        },
        Commands::Dispositions(args) => match handle_dispositions(&args) {
            Ok(output) => {
                println!("{}", output);
                Ok(())
            }
            Err(e) => Err(e),
        },
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Init(args) => handle_config_init(&args),
            ConfigCommands::Validate(args) => match handle_config_validate(&args) {
                Ok(msg) => {
                    println!("{}", msg);
                    Ok(())
                }
                Err(e) => Err(e),
            },
        },
        Commands::Completions(args) => match handle_completions(&args) {
            Ok(script) => {
                print!("{}", script);
                Ok(())
            }
            Err(e) => Err(e),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
