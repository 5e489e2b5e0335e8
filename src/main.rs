use anyhow::Result;
use clap::{Parser, Subcommand};

use gitshield::cli::{handle_resume_actions, handle_run, GlobalArgs, ResumeActionsArgs, RunArgs};
use gitshield::config::Action;
use gitshield::logging::{self, LogFormat};

#[derive(Parser)]
#[command(
    name = "gitshield",
    author = "Kaylee Beyene",
    version,
    about = "Encrypted, OTP-gated offsite backup and restore for git repositories",
    long_about = "gitshield mirrors a git repository into a compressed, password-encrypted \
                  archive and uploads it to an offsite vault. Restores are released only \
                  after a one-time password is confirmed, and GitHub Actions can be \
                  suspended while the restored history is pushed back."
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Back up the repository in the working directory
    Backup(RunArgs),

    /// Restore a backup version into the working directory and push it
    Restore(RunArgs),

    /// Run the action selected by `--action` (GitHub Actions entry point)
    Run {
        /// backup or restore
        #[arg(long, env = "INPUT_ACTION")]
        action: Action,

        #[command(flatten)]
        args: RunArgs,
    },

    /// Re-enable GitHub Actions after an interrupted restore
    ResumeActions(ResumeActionsArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(cli.global.log_format.unwrap_or_else(LogFormat::detect));

    let succeeded = match cli.command {
        Commands::Backup(args) => handle_run(&cli.global, Action::Backup, args)?,
        Commands::Restore(args) => handle_run(&cli.global, Action::Restore, args)?,
        Commands::Run { action, args } => handle_run(&cli.global, action, args)?,
        Commands::ResumeActions(args) => handle_resume_actions(&cli.global, args)?,
    };

    if !succeeded {
        std::process::exit(1);
    }

    Ok(())
}
