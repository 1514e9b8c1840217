// External command execution. Every step of a deploy goes through a
// `CommandRunner` so the orchestration can be exercised without the real tools.

use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::utils::shell;

/// One external program call, fully described before it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
    /// Indices into `args` that must never be printed.
    pub secret_args: Vec<usize>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            secret_args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append an argument that is masked in every rendering of this call.
    pub fn secret_arg(mut self, arg: impl Into<String>) -> Self {
        self.secret_args.push(self.args.len());
        self.args.push(arg.into());
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Redacted command line suitable for traces, reports and errors.
    pub fn display(&self) -> String {
        shell::render_command(&self.program, &self.args, &self.secret_args)
    }

    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn spawn_failed(error: impl std::fmt::Display) -> Self {
        Self {
            stdout: String::new(),
            stderr: format!("Command error: {}", error),
            success: false,
            exit_code: -1,
        }
    }
}

/// Runs invocations. `capture` requests stdout to be collected rather than
/// passed through to the terminal.
pub trait CommandRunner {
    fn run(&self, invocation: &Invocation, capture: bool) -> CommandOutput;
}

/// Executes programs directly, without a shell.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&self, invocation: &Invocation, capture: bool) -> CommandOutput {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args);

        if let Some(dir) = &invocation.current_dir {
            cmd.current_dir(dir);
        }

        cmd.stdin(Stdio::null());

        if capture {
            return match cmd.output() {
                Ok(out) => CommandOutput {
                    stdout: String::from_utf8_lossy(&out.stdout).to_string(),
                    stderr: String::from_utf8_lossy(&out.stderr).to_string(),
                    success: out.status.success(),
                    exit_code: out.status.code().unwrap_or(-1),
                },
                Err(e) => CommandOutput::spawn_failed(e),
            };
        }

        // Tool output goes to our stderr so stdout carries only the result.
        cmd.stdout(std::io::stderr());
        cmd.stderr(Stdio::inherit());

        match cmd.status() {
            Ok(status) => CommandOutput {
                stdout: String::new(),
                stderr: String::new(),
                success: status.success(),
                exit_code: status.code().unwrap_or(-1),
            },
            Err(e) => CommandOutput::spawn_failed(e),
        }
    }
}
