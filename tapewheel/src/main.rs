use std::process;

use clap::{CommandFactory, Parser};
use tapewheel::cli::Args;
use tapewheel::context::RunContext;
use tapewheel::error::exit_code;
use tapewheel::notifier::{Notifier, Sendmail};
use tapewheel::ping::IcmpProber;
use tapewheel::scheduler::Scheduler;
use tapewheel::sink::MtControl;
use tapewheel::transport::{ProcessShell, SshShell};
use tapewheel::{logging, Result};
use tracing::error;

#[tokio::main]
async fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // clap already renders the message; the manager owns the code.
            let _ = e.print();
            let code = if e.use_stderr() {
                exit_code::CLI_ARGS
            } else {
                exit_code::OK
            };
            process::exit(code);
        }
    };

    if args.usage {
        let _ = Args::command().print_help();
        process::exit(exit_code::OK);
    }

    let color = logging::color_enabled(args.no_color);
    logging::init(args.verbose, args.quiet, color);

    if let Err(e) = run(args, color).await {
        error!("{}", e);
        #[cfg(feature = "colored-output")]
        if color {
            use colored::Colorize;
            eprintln!("{} {}", "Error:".red().bold(), e);
            process::exit(e.exit_code());
        }
        eprintln!("Error: {}", e);
        process::exit(e.exit_code());
    }
}

async fn run(args: Args, color: bool) -> Result<()> {
    let ctx = RunContext::from_args(&args, color);

    let remote = SshShell::default();
    let local = ProcessShell;
    let prober = IcmpProber::default();
    let mail = Sendmail::default();
    let notifier = Notifier::new(&local, &mail);
    let tape = MtControl::new(&local);

    let scheduler = Scheduler::new(&ctx, &remote, &prober, &tape, &notifier);
    let report = scheduler.run().await?;
    for line in report.summary().lines() {
        tracing::info!("{}", line);
    }
    scheduler.aggregate(&report)
}
