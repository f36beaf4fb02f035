use crate::error::{GfillError, Result};
use crate::util::display_command;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// One external command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub stdin: Option<String>,
    /// Capture stdout instead of inheriting the terminal.
    pub capture: bool,
    /// Safe to execute under dry-run (queries that never mutate anything).
    pub read_only: bool,
}

impl CommandSpec {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            env: Vec::new(),
            stdin: None,
            capture: false,
            read_only: false,
        }
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.env.push((key.to_string(), value.to_string()));
        self
    }

    pub fn stdin(mut self, input: &str) -> Self {
        self.stdin = Some(input.to_string());
        self
    }

    pub fn capture(mut self) -> Self {
        self.capture = true;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self.capture = true;
        self
    }

    pub fn display(&self) -> String {
        display_command(&self.program, &self.args)
    }
}

/// Executes external commands. Implementations decide what dry-run means.
pub trait CommandRunner {
    /// Run `spec` and return its trimmed stdout (empty unless captured).
    fn run(&mut self, spec: &CommandSpec) -> Result<String>;

    fn dry_run(&self) -> bool;
}

/// Runs commands with `std::process::Command` inside the repository directory.
pub struct ProcessRunner {
    cwd: PathBuf,
    dry_run: bool,
    echo_to_stderr: bool,
}

impl ProcessRunner {
    pub fn new<P: AsRef<Path>>(cwd: P, dry_run: bool) -> Self {
        Self {
            cwd: cwd.as_ref().to_path_buf(),
            dry_run,
            echo_to_stderr: false,
        }
    }

    /// Echo commands, and route the output of uncaptured commands, to stderr.
    /// Stdout then carries nothing but what the caller prints (JSON output).
    pub fn echo_to_stderr(mut self, yes: bool) -> Self {
        self.echo_to_stderr = yes;
        self
    }

    fn echo(&self, line: &str) {
        if self.echo_to_stderr {
            eprintln!("{line}");
        } else {
            println!("{line}");
        }
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&mut self, spec: &CommandSpec) -> Result<String> {
        let shown = spec.display();
        if !spec.read_only {
            self.echo(&format!("$ {shown}"));
            if self.dry_run {
                self.echo("[dry-run] command skipped");
                return Ok(String::new());
            }
        }
        debug!(command = %shown, env = ?spec.env, "spawning");

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args).current_dir(&self.cwd);
        for (key, value) in &spec.env {
            cmd.env(key, value);
        }
        cmd.stdin(if spec.stdin.is_some() { Stdio::piped() } else { Stdio::inherit() });
        if spec.capture {
            cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        } else if self.echo_to_stderr {
            cmd.stdout(Stdio::from(std::io::stderr()));
        }

        let spawn_err = |source| GfillError::Spawn { command: shown.clone(), source };
        let mut child = cmd.spawn().map_err(spawn_err)?;
        if let (Some(input), Some(mut pipe)) = (spec.stdin.as_deref(), child.stdin.take()) {
            pipe.write_all(input.as_bytes())?;
        }
        let output = child.wait_with_output().map_err(spawn_err)?;

        if !output.status.success() {
            return Err(GfillError::CommandFailed {
                command: shown,
                code: output.status.code().unwrap_or(1),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        info!(command = %shown, "command succeeded");
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn dry_run(&self) -> bool {
        self.dry_run
    }
}

/// Records every command and replies with canned stdout, for tests.
#[cfg(test)]
pub(crate) struct ScriptedRunner {
    pub dry_run: bool,
    pub commands: Vec<CommandSpec>,
    replies: Vec<(String, Result<String>)>,
}

#[cfg(test)]
impl ScriptedRunner {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            commands: Vec::new(),
            replies: Vec::new(),
        }
    }

    /// Reply to the next command whose display form starts with `prefix`.
    pub fn reply(mut self, prefix: &str, stdout: &str) -> Self {
        self.replies.push((prefix.to_string(), Ok(stdout.to_string())));
        self
    }

    pub fn fail(mut self, prefix: &str, code: i32) -> Self {
        self.replies.push((
            prefix.to_string(),
            Err(GfillError::CommandFailed {
                command: prefix.to_string(),
                code,
                stderr: String::new(),
            }),
        ));
        self
    }

    pub fn lines(&self) -> Vec<String> {
        self.commands.iter().map(CommandSpec::display).collect()
    }
}

#[cfg(test)]
impl CommandRunner for ScriptedRunner {
    fn run(&mut self, spec: &CommandSpec) -> Result<String> {
        let shown = spec.display();
        self.commands.push(spec.clone());
        if self.dry_run && !spec.read_only {
            return Ok(String::new());
        }
        match self.replies.iter().position(|(prefix, _)| shown.starts_with(prefix.as_str())) {
            Some(i) => self.replies.remove(i).1,
            None => Ok(String::new()),
        }
    }

    fn dry_run(&self) -> bool {
        self.dry_run
    }
}
