//! Subprocess execution.
//!
//! Runs plugin scripts and package-manager commands, either fully buffered
//! ([`capture`]) or line by line as output arrives ([`stream`]).

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Command as ProcessCommand, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use crate::plugin::SubCommand;

/// Result of executing a command.
#[derive(Debug)]
pub struct ExecutionResult {
    /// Exit status of the command
    pub status: ExitStatus,

    /// Standard output
    pub stdout: String,

    /// Standard error
    pub stderr: String,

    /// Time taken to execute
    pub duration: Duration,
}

impl ExecutionResult {
    /// Check if the command succeeded (exit code 0).
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Get the exit code.
    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }

    /// Error detail for a failed run: trimmed stderr, or the exit status when
    /// stderr was empty.
    pub fn failure_message(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        match self.code() {
            Some(code) => format!("Command exited with status {code}"),
            None => "Command terminated by signal".to_string(),
        }
    }
}

/// Runs staged plugin scripts with a sub-command.
#[derive(Debug, Clone)]
pub struct ScriptExecutor {
    shell: String,
}

impl Default for ScriptExecutor {
    fn default() -> Self {
        Self::new("bash")
    }
}

impl ScriptExecutor {
    /// Create an executor that runs scripts through `shell`.
    pub fn new(shell: impl Into<String>) -> Self {
        Self { shell: shell.into() }
    }

    /// Interpreter used for scripts.
    pub fn shell(&self) -> &str {
        &self.shell
    }

    /// Build the process for `<shell> <script> <subcommand>`.
    ///
    /// The child inherits the current environment with `env` layered on top.
    pub fn command(
        &self,
        script: &Path,
        sub: SubCommand,
        env: &HashMap<String, String>,
    ) -> ProcessCommand {
        let mut cmd = ProcessCommand::new(&self.shell);
        cmd.arg(script).arg(sub.as_arg());
        cmd.envs(env);
        cmd
    }

    /// Run a script with both streams buffered.
    pub fn run_captured(
        &self,
        script: &Path,
        sub: SubCommand,
        env: &HashMap<String, String>,
    ) -> std::io::Result<ExecutionResult> {
        tracing::debug!(script = %script.display(), sub = %sub, "Running script (captured)");
        capture(&mut self.command(script, sub, env))
    }

    /// Run a script, forwarding each non-blank output line to `on_line`.
    pub fn run_streamed<F>(
        &self,
        script: &Path,
        sub: SubCommand,
        env: &HashMap<String, String>,
        on_line: F,
    ) -> std::io::Result<ExecutionResult>
    where
        F: Fn(&str, bool) + Sync, // (line, is_stderr)
    {
        tracing::debug!(script = %script.display(), sub = %sub, "Running script (streamed)");
        stream(&mut self.command(script, sub, env), on_line)
    }
}

/// Run a prepared command with stdout and stderr fully buffered.
pub fn capture(cmd: &mut ProcessCommand) -> std::io::Result<ExecutionResult> {
    let start = Instant::now();

    let output = cmd.stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped()).output()?;

    Ok(ExecutionResult {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        duration: start.elapsed(),
    })
}

/// Run a prepared command with streaming output.
///
/// Stdout and stderr are drained on two scoped threads that both finish
/// before the exit status is collected. Blank lines are not forwarded.
pub fn stream<F>(cmd: &mut ProcessCommand, on_line: F) -> std::io::Result<ExecutionResult>
where
    F: Fn(&str, bool) + Sync,
{
    let start = Instant::now();

    let mut child =
        cmd.stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped()).spawn()?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let on_line = &on_line;

    let (stdout_lines, stderr_lines) = std::thread::scope(|scope| {
        let out = scope.spawn(move || drain(stdout, false, on_line));
        let err = scope.spawn(move || drain(stderr, true, on_line));
        (out.join().unwrap_or_default(), err.join().unwrap_or_default())
    });

    let status = child.wait()?;

    Ok(ExecutionResult {
        status,
        stdout: stdout_lines.join("\n"),
        stderr: stderr_lines.join("\n"),
        duration: start.elapsed(),
    })
}

fn drain<R, F>(pipe: Option<R>, is_stderr: bool, on_line: &F) -> Vec<String>
where
    R: Read,
    F: Fn(&str, bool),
{
    let mut lines = Vec::new();
    let Some(pipe) = pipe else {
        return lines;
    };

    // The pipe is read to EOF so the child never sees SIGPIPE.
    let mut reader = BufReader::new(pipe);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\n', '\r']);
                if !line.trim().is_empty() {
                    on_line(line, is_stderr);
                }
                lines.push(line.to_string());
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => {
                tracing::debug!(error = %e, is_stderr, "Pipe read failed, discarding the rest");
                let _ = std::io::copy(&mut reader, &mut std::io::sink());
                break;
            }
        }
    }
    lines
}

/// Run `cmd` through `sh -c` and return its trimmed stdout.
///
/// Any failure (spawn error, non-zero exit, empty output) yields `None`.
pub fn probe(cmd: &str) -> Option<String> {
    let result = capture(ProcessCommand::new("sh").arg("-c").arg(cmd)).ok()?;
    if !result.success() {
        tracing::debug!(cmd, code = ?result.code(), "Default probe failed");
        return None;
    }
    let value = result.stdout.trim();
    (!value.is_empty()).then(|| value.to_string())
}
