//! Custody CLI - Main entry point

use anyhow::Context;
use custody_core::{Address, Amount, Payload, TxId};
use custody_rpc::{commands, AppContext};
use custody_wallet::{AdminAction, WalletConfig};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "custody")]
#[command(about = "Custody - multi-party transaction authorization", long_about = None)]
struct Cli {
    /// Data directory path
    #[arg(short, long, env = "CUSTODY_DATA_DIR", default_value = "./data")]
    data: PathBuf,

    /// Identity issuing the command (0x-prefixed hex)
    #[arg(short, long, global = true)]
    caller: Option<Address>,

    /// Log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new wallet from a JSON config file
    Init {
        /// Path to the wallet config
        #[arg(long)]
        config: PathBuf,
    },

    /// Print the address derived from a label
    Address { label: String },

    /// Submit a transaction (auto-confirmed by the caller)
    Submit {
        destination: Address,
        value: Amount,
        /// Call data as hex
        #[arg(long, default_value = "0x")]
        payload: Payload,
    },

    /// Submit an administrative action as a self-call
    Propose {
        #[command(subcommand)]
        action: AdminCommand,
    },

    Confirm { id: TxId },

    Revoke { id: TxId },

    Execute { id: TxId },

    /// Confirm several transactions (all or nothing)
    BatchConfirm {
        #[arg(required = true)]
        ids: Vec<TxId>,
    },

    /// Execute several transactions (all or nothing)
    BatchExecute {
        #[arg(required = true)]
        ids: Vec<TxId>,
    },

    /// Apply an administrative action directly
    Admin {
        #[command(subcommand)]
        action: AdminCommand,
    },

    Pause,

    Unpause,

    /// Credit value to the wallet
    Deposit { value: Amount },

    /// Show wallet summary
    Status,

    /// Show one transaction
    Tx { id: TxId },

    /// List transactions
    List {
        #[arg(long, default_value = "0")]
        from: TxId,
        /// Exclusive upper bound (default: all)
        #[arg(long)]
        to: Option<TxId>,
        #[arg(long)]
        pending: bool,
        #[arg(long)]
        executed: bool,
    },

    /// Show the journal timeline of a transaction
    History { id: TxId },

    /// Show the most recent journal records
    Log {
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Audit the journal (verify hash chain and replay)
    Audit,
}

#[derive(Subcommand)]
enum AdminCommand {
    AddOwner { owner: Address },
    RemoveOwner { owner: Address },
    ReplaceOwner { old: Address, new: Address },
    ChangeRequirement { required: usize },
    AddGuardian { guardian: Address },
    RemoveGuardian { guardian: Address },
    /// 0 disables the cap
    SetDailyLimit { limit: Amount },
    /// 0 disables the cap
    SetWeeklyLimit { limit: Amount },
    SetTimeLock { seconds: u64 },
}

impl From<AdminCommand> for AdminAction {
    fn from(command: AdminCommand) -> Self {
        match command {
            AdminCommand::AddOwner { owner } => AdminAction::AddOwner { owner },
            AdminCommand::RemoveOwner { owner } => AdminAction::RemoveOwner { owner },
            AdminCommand::ReplaceOwner { old, new } => AdminAction::ReplaceOwner { old, new },
            AdminCommand::ChangeRequirement { required } => AdminAction::ChangeRequirement { required },
            AdminCommand::AddGuardian { guardian } => AdminAction::AddGuardian { guardian },
            AdminCommand::RemoveGuardian { guardian } => AdminAction::RemoveGuardian { guardian },
            AdminCommand::SetDailyLimit { limit } => AdminAction::SetDailyLimit { limit },
            AdminCommand::SetWeeklyLimit { limit } => AdminAction::SetWeeklyLimit { limit },
            AdminCommand::SetTimeLock { seconds } => AdminAction::SetTimeLockPeriod { period_secs: seconds },
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let caller = || cli.caller.context("--caller is required for this command");

    match cli.command {
        Commands::Init { config } => {
            let config = WalletConfig::from_file(&config)
                .with_context(|| format!("Failed to load config from {}", config.display()))?;
            let ctx = AppContext::init(&cli.data, &config)?;
            println!(
                "✅ Wallet initialized in {} ({}-of-{})",
                ctx.data_path().display(),
                config.required,
                config.owners.len()
            );
            println!("   Address: {}", config.address);
            return Ok(());
        }
        Commands::Address { label } => {
            println!("{}", Address::derive(&label));
            return Ok(());
        }
        _ => {}
    }

    let ctx = AppContext::open(&cli.data)?;

    match cli.command {
        Commands::Init { .. } | Commands::Address { .. } => {}

        Commands::Submit {
            destination,
            value,
            payload,
        } => commands::submit(&ctx, caller()?, destination, value, payload)?,

        Commands::Propose { action } => commands::propose(&ctx, caller()?, action.into())?,

        Commands::Confirm { id } => commands::confirm(&ctx, caller()?, id)?,

        Commands::Revoke { id } => commands::revoke(&ctx, caller()?, id)?,

        Commands::Execute { id } => commands::execute(&ctx, caller()?, id)?,

        Commands::BatchConfirm { ids } => commands::batch_confirm(&ctx, caller()?, &ids)?,

        Commands::BatchExecute { ids } => commands::batch_execute(&ctx, caller()?, &ids)?,

        Commands::Admin { action } => commands::admin(&ctx, caller()?, action.into())?,

        Commands::Pause => commands::pause(&ctx, caller()?)?,

        Commands::Unpause => commands::unpause(&ctx, caller()?)?,

        Commands::Deposit { value } => commands::deposit(&ctx, caller()?, value)?,

        Commands::Status => commands::status(&ctx)?,

        Commands::Tx { id } => commands::show(&ctx, id)?,

        Commands::List {
            from,
            to,
            pending,
            executed,
        } => {
            // No filter flag means everything
            let (pending, executed) = if pending || executed {
                (pending, executed)
            } else {
                (true, true)
            };
            commands::list(&ctx, from, to, pending, executed)?
        }

        Commands::History { id } => commands::history(&ctx, id)?,

        Commands::Log { limit } => commands::log(&ctx, limit)?,

        Commands::Audit => commands::audit(&ctx)?,
    }

    Ok(())
}
