use crate::demo::{run_demo, run_pricing, DemoArgs, PricingArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use rentgate::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Rentgate",
    about = "Run and demonstrate the subscription-gated rental marketplace",
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
    /// Print the subscription price list
    Pricing(PricingArgs),
    /// Walk a landlord and a renter through the marketplace in memory
    Demo(DemoArgs),
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
        Command::Pricing(args) => run_pricing(args),
        Command::Demo(args) => run_demo(args).await,
    }
}
