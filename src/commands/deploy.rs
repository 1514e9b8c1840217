use clap::Args;
use serde::Serialize;
use std::path::{Path, PathBuf};

use stackdeploy::defaults::{self, DeploySettings, SettingsOverrides};
use stackdeploy::deploy::{self, DeployOptions, DeployReport, DeployRequest};
use stackdeploy::executor::CommandRunner;

use crate::commands::CmdResult;

#[derive(Args, Debug, Default)]
pub struct DeployArgs {
    /// CloudFormation stack to create or update
    #[arg(required_unless_present = "print_config")]
    pub stack_name: Option<String>,

    /// S3 bucket that receives packaged assets
    #[arg(required_unless_present = "print_config")]
    pub artifact_bucket: Option<String>,

    /// Value for the stack's secret parameter (omit to keep the current value)
    #[arg(allow_hyphen_values = true)]
    pub secret_token: Option<String>,

    /// Arguments after the secret are accepted and ignored
    #[arg(hide = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub extra: Vec<String>,

    /// Config file (defaults to ./stackdeploy.json when present)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// AWS region passed to every aws call
    #[arg(long)]
    pub region: Option<String>,

    /// AWS named profile passed to every aws call
    #[arg(long)]
    pub profile: Option<String>,

    /// Rust target triple to build for
    #[arg(long)]
    pub target: Option<String>,

    /// Binary to build and stage as the bootstrap entrypoint
    #[arg(long)]
    pub bin: Option<String>,

    /// Template to package
    #[arg(long, value_name = "PATH")]
    pub template: Option<String>,

    /// Print the steps without running them
    #[arg(long)]
    pub dry_run: bool,

    /// Suppress command traces
    #[arg(long, short)]
    pub quiet: bool,

    /// Print the resolved settings and exit
    #[arg(long, conflicts_with_all = ["stack_name", "artifact_bucket", "secret_token", "dry_run"])]
    pub print_config: bool,
}

impl DeployArgs {
    fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            target: self.target.clone(),
            bin: self.bin.clone(),
            template: self.template.clone(),
            region: self.region.clone(),
            profile: self.profile.clone(),
        }
    }

    /// Validate positional arguments before anything else runs.
    pub fn request(&self) -> CmdResult<DeployRequest> {
        DeployRequest::new(
            self.stack_name.clone().unwrap_or_default(),
            self.artifact_bucket.clone().unwrap_or_default(),
            self.secret_token.clone(),
        )
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum DeployOutput {
    Report(DeployReport),
    Settings(DeploySettings),
}

pub fn run(args: DeployArgs, dir: &Path, runner: &dyn CommandRunner) -> CmdResult<DeployOutput> {
    if args.print_config {
        let settings = defaults::load(args.config.as_deref(), dir, args.overrides())?;
        return Ok(DeployOutput::Settings(settings));
    }

    let request = args.request()?;
    let settings = defaults::load(args.config.as_deref(), dir, args.overrides())?;

    let options = DeployOptions {
        dry_run: args.dry_run,
        quiet: args.quiet,
    };

    deploy::run(&request, &settings, runner, options).map(DeployOutput::Report)
}
