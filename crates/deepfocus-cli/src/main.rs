use clap::{CommandFactory, Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "deepfocus-cli", version, about = "DeepFocus CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Skill tree queries
    Tree {
        #[command(subcommand)]
        action: commands::tree::TreeAction,
    },
    /// Progress state and completion history
    Progress {
        #[command(subcommand)]
        action: commands::progress::ProgressAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Quiz generation
    Quiz {
        #[command(subcommand)]
        action: commands::quiz::QuizAction,
    },
    /// Run a full simulated node attempt
    Session {
        #[command(subcommand)]
        action: commands::session::SessionAction,
    },
    /// Generate shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Tree { action } => commands::tree::run(action),
        Commands::Progress { action } => commands::progress::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Quiz { action } => commands::quiz::run(action),
        Commands::Session { action } => commands::session::run(action),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
