use crate::commands::{
    run_apply, run_facilities, run_history, run_quote, ApplyArgs, HistoryArgs, QuoteArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use loan_desk::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Loan Desk",
    about = "Quote, submit and review loan applications from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// List the facilities in the configured catalog
    Facilities,
    /// Price a loan without submitting an application
    Quote(QuoteArgs),
    /// Fill in and submit an application, resuming any saved draft
    Apply(ApplyArgs),
    /// Show previously submitted applications
    History(HistoryArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Facilities => run_facilities(),
        Command::Quote(args) => run_quote(args),
        Command::Apply(args) => run_apply(args),
        Command::History(args) => run_history(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::HistoryFormat;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["loan-desk-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn parses_quote_flags() {
        let cli = Cli::try_parse_from([
            "loan-desk-api",
            "quote",
            "--facility",
            "car-loan",
            "--amount",
            "150000000",
            "--months",
            "18",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Quote(args)) => {
                assert_eq!(args.facility, "car-loan");
                assert_eq!(args.amount, "150000000");
                assert_eq!(args.months, "18");
            }
            other => panic!("expected quote command, got {other:?}"),
        }
    }

    #[test]
    fn history_format_defaults_to_table() {
        let cli = Cli::try_parse_from(["loan-desk-api", "history"]).expect("parses");
        match cli.command {
            Some(Command::History(args)) => assert_eq!(args.format, HistoryFormat::Table),
            other => panic!("expected history command, got {other:?}"),
        }

        let cli = Cli::try_parse_from(["loan-desk-api", "history", "--format", "csv"])
            .expect("parses");
        assert!(matches!(
            cli.command,
            Some(Command::History(HistoryArgs {
                format: HistoryFormat::Csv
            }))
        ));
    }
}
