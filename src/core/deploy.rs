use serde::Serialize;
use std::path::PathBuf;

use crate::build;
use crate::defaults::DeploySettings;
use crate::error::{Error, Result, StepFailedDetails};
use crate::executor::{CommandRunner, Invocation};
use crate::paths;
use crate::stack;

// === Request ===

/// Positional arguments of a deploy. The secret is opaque and never printed.
#[derive(Clone)]
pub struct DeployRequest {
    pub stack_name: String,
    pub artifact_bucket: String,
    pub secret_token: Option<String>,
}

impl std::fmt::Debug for DeployRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeployRequest")
            .field("stack_name", &self.stack_name)
            .field("artifact_bucket", &self.artifact_bucket)
            .field("secret_token", &self.secret_token.as_ref().map(|_| "****"))
            .finish()
    }
}

impl DeployRequest {
    /// Validate the required arguments. Nothing external has run yet when
    /// this fails.
    pub fn new(
        stack_name: impl Into<String>,
        artifact_bucket: impl Into<String>,
        secret_token: Option<String>,
    ) -> Result<Self> {
        let stack_name = stack_name.into();
        let artifact_bucket = artifact_bucket.into();

        let missing: Vec<String> = [
            ("stack_name", &stack_name),
            ("artifact_bucket", &artifact_bucket),
        ]
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name.to_string())
        .collect();

        if !missing.is_empty() {
            return Err(Error::validation_missing_argument(missing)
                .with_hint("Usage: stackdeploy <stack_name> <artifact_bucket> [secret_token]"));
        }

        Ok(Self {
            stack_name,
            artifact_bucket,
            secret_token,
        })
    }
}

// === Plan ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Target,
    Build,
    Stage,
    Package,
    Deploy,
    Output,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Target => "target",
            Step::Build => "build",
            Step::Stage => "stage",
            Step::Package => "package",
            Step::Deploy => "deploy",
            Step::Output => "output",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepAction {
    /// External program. `capture` collects stdout instead of passing it through.
    Run { invocation: Invocation, capture: bool },
    /// Local copy of the build output to its bootstrap name.
    Stage { source: PathBuf, dest: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedStep {
    pub step: Step,
    pub action: StepAction,
}

impl PlannedStep {
    fn run(step: Step, invocation: Invocation) -> Self {
        Self {
            step,
            action: StepAction::Run {
                invocation,
                capture: false,
            },
        }
    }

    /// Redacted command line for traces and reports.
    pub fn display(&self) -> String {
        match &self.action {
            StepAction::Run { invocation, .. } => invocation.display(),
            StepAction::Stage { source, dest } => build::stage_display(source, dest),
        }
    }
}

/// Build the ordered steps of a deploy. Exactly one deploy invocation is
/// planned, chosen by whether a secret was supplied.
pub fn plan(request: &DeployRequest, settings: &DeploySettings) -> Vec<PlannedStep> {
    vec![
        PlannedStep::run(Step::Target, build::target_add(settings)),
        PlannedStep::run(Step::Build, build::cargo_build(settings)),
        PlannedStep {
            step: Step::Stage,
            action: StepAction::Stage {
                source: paths::build_output(settings),
                dest: paths::staged_bootstrap(settings),
            },
        },
        PlannedStep::run(
            Step::Package,
            stack::package(settings, &request.artifact_bucket),
        ),
        PlannedStep::run(
            Step::Deploy,
            stack::deploy(
                settings,
                &request.stack_name,
                request.secret_token.as_deref(),
            ),
        ),
        PlannedStep {
            step: Step::Output,
            action: StepAction::Run {
                invocation: stack::describe_output(settings, &request.stack_name),
                capture: true,
            },
        },
    ]
}

// === Run ===

#[derive(Debug, Clone, Copy, Default)]
pub struct DeployOptions {
    /// Trace steps without executing anything.
    pub dry_run: bool,
    /// Suppress the `+ command` traces.
    pub quiet: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepReport {
    pub step: Step,
    pub command: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployReport {
    pub stack_name: String,
    pub secret_supplied: bool,
    pub dry_run: bool,
    pub steps: Vec<StepReport>,
    pub webhook_url: Option<String>,
}

/// Run every planned step in order, stopping at the first failure.
pub fn run(
    request: &DeployRequest,
    settings: &DeploySettings,
    runner: &dyn CommandRunner,
    options: DeployOptions,
) -> Result<DeployReport> {
    let mut report = DeployReport {
        stack_name: request.stack_name.clone(),
        secret_supplied: request.secret_token.is_some(),
        dry_run: options.dry_run,
        steps: Vec::new(),
        webhook_url: None,
    };

    for planned in plan(request, settings) {
        let command = planned.display();
        if !options.quiet {
            eprintln!("[deploy] + {}", command);
        }

        if !options.dry_run {
            let stdout = execute_step(&planned, runner)?;
            if planned.step == Step::Output {
                report.webhook_url = stack::parse_output_value(&stdout);
                if report.webhook_url.is_none() {
                    log_status!(
                        "deploy",
                        "Stack '{}' has no output named '{}'",
                        request.stack_name,
                        settings.output_key
                    );
                }
            }
        }

        report.steps.push(StepReport {
            step: planned.step,
            command,
        });
    }

    Ok(report)
}

/// Execute one step, returning its captured stdout.
fn execute_step(planned: &PlannedStep, runner: &dyn CommandRunner) -> Result<String> {
    match &planned.action {
        StepAction::Stage { source, dest } => {
            build::stage_artifact(source, dest)?;
            Ok(String::new())
        }
        StepAction::Run {
            invocation,
            capture,
        } => {
            let output = runner.run(invocation, *capture);
            if output.success {
                return Ok(output.stdout);
            }

            let err = Error::deploy_step_failed(StepFailedDetails {
                step: planned.step.as_str().to_string(),
                command: invocation.display(),
                exit_code: output.exit_code,
                stderr: output.stderr.trim().to_string(),
            });

            Err(match planned.step {
                Step::Target | Step::Build => {
                    err.with_hint("Check that rustup and cargo are installed and on PATH")
                }
                Step::Package | Step::Deploy | Step::Output => err.with_hint(
                    "Check that the AWS CLI is installed and credentials are configured",
                ),
                Step::Stage => err,
            })
        }
    }
}
