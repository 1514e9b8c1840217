use clap::Parser;

mod commands;
mod output;

use commands::deploy::{self, DeployArgs, DeployOutput};
use stackdeploy::executor::ProcessRunner;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "stackdeploy")]
#[command(version = VERSION)]
#[command(override_usage = "stackdeploy [OPTIONS] <stack_name> <artifact_bucket> [secret_token]")]
#[command(about = "Cross-compile the bot, package it, and deploy its CloudFormation stack")]
#[command(
    after_help = "AWS credentials are taken from the AWS CLI's usual sources \
                  (AWS_ACCESS_KEY_ID/AWS_SECRET_ACCESS_KEY, AWS_PROFILE, ~/.aws/config). \
                  AWS_REGION or AWS_DEFAULT_REGION selects the region unless --region is given."
)]
struct Cli {
    #[command(flatten)]
    deploy: DeployArgs,

    /// Print a JSON envelope instead of plain text
    #[arg(long)]
    json: bool,
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let json = cli.json;

    let dir = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            let err = stackdeploy::Error::internal_io(
                e.to_string(),
                Some("resolve working directory".to_string()),
            );
            return finish::<()>(Err(err), json, |_| None);
        }
    };

    let result = deploy::run(cli.deploy, &dir, &ProcessRunner);

    finish(result, json, |data| match data {
        DeployOutput::Report(report) if report.dry_run => None,
        DeployOutput::Report(report) => Some(report.webhook_url.clone().unwrap_or_default()),
        DeployOutput::Settings(settings) => serde_json::to_string_pretty(settings).ok(),
    })
}

/// Print the result and convert it to a process exit code. `plain` picks the
/// stdout line for a successful plain-text run.
fn finish<T: serde::Serialize>(
    result: stackdeploy::Result<T>,
    json: bool,
    plain: impl Fn(&T) -> Option<String>,
) -> std::process::ExitCode {
    let exit_code = match &result {
        Ok(_) => 0,
        Err(err) => output::exit_code_for_error(err),
    };

    let printed = if json {
        output::print_json_result(&result)
    } else {
        match &result {
            Ok(data) => match plain(data) {
                Some(line) => output::print_line(&line),
                None => Ok(()),
            },
            Err(err) => {
                output::print_error(err);
                Ok(())
            }
        }
    };

    if let Err(err) = printed {
        output::print_error(&err);
        return std::process::ExitCode::from(1);
    }

    std::process::ExitCode::from(output::exit_code_to_u8(exit_code))
}
