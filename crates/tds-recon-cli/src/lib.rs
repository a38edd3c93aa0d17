mod config;
mod show;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args as ClapArgs, CommandFactory as _, Parser, Subcommand};
use tds_recon::reconcile::{ReconcileConfig, ReconcileOptions};

use crate::config::Config;

const DEFAULT_OUTPUT: &str = "TDS_Reconciliation.xlsx";

#[derive(Parser)]
#[command(
    name = "tds-recon",
    about = "Reconcile Form 26AS tax deductions against a Tally ledger export"
)]
#[command(disable_help_subcommand = true)]
struct Args {
    #[command(flatten)]
    inputs: InputArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(ClapArgs)]
struct InputArgs {
    /// Password protected zip archive holding the 26AS text report
    #[arg(short, long)]
    statement: PathBuf,

    /// Tally ledger export (.xlsx)
    #[arg(short, long)]
    ledger: PathBuf,

    /// Archive password, overrides the config file
    #[arg(long)]
    password: Option<String>,

    /// Config file. Defaults to tds-recon.toml or .tds-recon.toml in the working directory
    #[arg(long)]
    config: Option<PathBuf>,
}

impl InputArgs {
    fn options(&self) -> Result<ReconcileOptions> {
        let config = match &self.config {
            Some(path) => Config::load_from_file(path)?,
            None => Config::find_and_load()?.unwrap_or_default(),
        };

        let mut options = ReconcileOptions::default();
        config.apply(&mut options);
        if let Some(password) = &self.password {
            options.password = password.clone();
        }
        Ok(options)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Write the reconciliation workbook (default)
    Report {
        /// Output workbook path
        #[arg(short, long, default_value = DEFAULT_OUTPUT)]
        output: PathBuf,
    },
    /// Print the unmatched and differing rows and exit without writing anything
    Diff,
}

pub fn run(args: impl IntoIterator<Item = String>) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tds_recon=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    clap_complete::CompleteEnv::with_factory(Args::command).complete();

    let args = Args::parse_from(args);
    let options = args.inputs.options()?;
    let config = ReconcileConfig::new(args.inputs.statement, args.inputs.ledger, options);

    let command = args.command.unwrap_or(Commands::Report {
        output: PathBuf::from(DEFAULT_OUTPUT),
    });
    match command {
        Commands::Report { output } => show::write_report(&config, &output),
        Commands::Diff => show::show_diff(&config),
    }
}
