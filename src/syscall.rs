// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! External process execution.
//!
//! Every OS utility that prefer drives (`dockutil`, `rsync`, `zip`, `defaults`,
//! `mdls`, `duti`, `launchctl`) is invoked through the [`Syscall`] trait. The
//! host implementation spawns a real process and captures its output. Tests
//! substitute [`FakeSyscall`] to record invocations and script their results.

use std::{
    cell::RefCell,
    collections::VecDeque,
    ffi::{OsStr, OsString},
    fmt::{Display, Formatter, Result as FmtResult},
    path::PathBuf,
    process::Command,
};
use tracing::{debug, instrument};

/// One external command to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: OsString,
    pub args: Vec<OsString>,
    pub cwd: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<OsString>>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.cwd = Some(path.into());
        self
    }

    /// Arguments as lossy strings, mostly useful for assertions.
    pub fn arg_strings(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }
}

impl Display for Invocation {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(&self.program.to_string_lossy())?;
        for arg in &self.args {
            let arg = arg.to_string_lossy();
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(fmt, " {arg:?}")?;
            } else {
                write!(fmt, " {arg}")?;
            }
        }

        Ok(())
    }
}

/// Exit status and captured output of a finished command.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyscallOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl SyscallOutput {
    /// Successful output with given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed output with given exit code and stderr.
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Turn unsuccessful exit into [`SyscallError::Failed`].
    ///
    /// The error message carries stderr, or stdout when stderr is empty.
    pub fn check(self, invocation: &Invocation) -> Result<Self> {
        if self.success() {
            return Ok(self);
        }

        let message = if self.stderr.trim().is_empty() {
            chomp(&self.stdout)
        } else {
            chomp(&self.stderr)
        };

        Err(SyscallError::Failed {
            command: invocation.to_string(),
            code: self.code,
            message,
        })
    }
}

/// Run external commands.
pub trait Syscall {
    /// Run command to completion, and capture its output.
    ///
    /// Unsuccessful exit status is not an error here. Callers decide through
    /// [`SyscallOutput::check`].
    ///
    /// # Errors
    ///
    /// - Return [`SyscallError::Spawn`] if the command cannot be started.
    fn call(&self, invocation: &Invocation) -> Result<SyscallOutput>;

    /// Run command, and fail on unsuccessful exit status.
    fn call_checked(&self, invocation: &Invocation) -> Result<SyscallOutput> {
        self.call(invocation)?.check(invocation)
    }
}

/// Run commands on the host through [`std::process::Command`].
#[derive(Debug, Default, Clone, Copy)]
pub struct HostSyscall;

impl Syscall for HostSyscall {
    #[instrument(skip(self, invocation), fields(command = %invocation), level = "debug")]
    fn call(&self, invocation: &Invocation) -> Result<SyscallOutput> {
        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args);
        if let Some(cwd) = &invocation.cwd {
            command.current_dir(cwd);
        }

        let output = command.output().map_err(|source| SyscallError::Spawn {
            source,
            program: invocation.program.clone(),
        })?;

        let output = SyscallOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(output.stdout.as_slice()).into_owned(),
            stderr: String::from_utf8_lossy(output.stderr.as_slice()).into_owned(),
        };
        debug!("exit code {:?}", output.code);

        Ok(output)
    }
}

/// Record invocations, and answer them with scripted outputs.
///
/// Outputs are handed out in order of registration. Once the script runs dry
/// every call succeeds with empty output.
#[derive(Debug, Default)]
pub struct FakeSyscall {
    calls: RefCell<Vec<Invocation>>,
    script: RefCell<VecDeque<(Option<OsString>, SyscallOutput)>>,
}

impl FakeSyscall {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue output for next call of any program.
    pub fn respond(self, output: SyscallOutput) -> Self {
        self.script.borrow_mut().push_back((None, output));
        self
    }

    /// Queue output for next call of given program.
    ///
    /// Calls of other programs do not consume it.
    pub fn respond_to(self, program: impl AsRef<OsStr>, output: SyscallOutput) -> Self {
        self.script
            .borrow_mut()
            .push_back((Some(program.as_ref().to_owned()), output));
        self
    }

    /// All invocations made so far.
    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.borrow().clone()
    }

    /// Invocations of one program.
    pub fn calls_to(&self, program: impl AsRef<OsStr>) -> Vec<Invocation> {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.program == program.as_ref())
            .cloned()
            .collect()
    }
}

impl Syscall for FakeSyscall {
    fn call(&self, invocation: &Invocation) -> Result<SyscallOutput> {
        self.calls.borrow_mut().push(invocation.clone());

        let mut script = self.script.borrow_mut();
        let position = script.iter().position(|(program, _)| match program {
            Some(program) => *program == invocation.program,
            None => true,
        });

        Ok(position
            .and_then(|index| script.remove(index))
            .map(|(_, output)| output)
            .unwrap_or_else(|| SyscallOutput::ok("")))
    }
}

// INVARIANT: Chomp trailing newlines.
fn chomp(message: &str) -> String {
    message.trim_end_matches(['\r', '\n']).to_string()
}


/// External command error types.
#[derive(Debug, thiserror::Error)]
pub enum SyscallError {
    /// Command could not be started at all.
    #[error("failed to run {program:?}")]
    Spawn {
        #[source]
        source: std::io::Error,
        program: OsString,
    },

    /// Command ran, but exited unsuccessfully.
    #[error("command `{command}` failed with exit code {code:?}: {message}")]
    Failed {
        command: String,
        code: Option<i32>,
        message: String,
    },
}

/// Friendly result alias :3
pub type Result<T, E = SyscallError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn invocation_display_quotes_spaces() {
        let call = Invocation::new("dockutil")
            .args(["--add", "/Applications/Adobe Photoshop 2023.app", "--type", ""]);

        assert_eq!(
            call.to_string(),
            r#"dockutil --add "/Applications/Adobe Photoshop 2023.app" --type """#
        );
    }

    #[test]
    fn check_prefers_stderr_over_stdout() {
        let call = Invocation::new("duti");
        let output = SyscallOutput {
            code: Some(1),
            stdout: "ignored\n".into(),
            stderr: "bad uti\n".into(),
        };

        let error = output.check(&call).unwrap_err();
        assert_eq!(
            error.to_string(),
            "command `duti` failed with exit code Some(1): bad uti"
        );
    }

    #[test]
    fn check_falls_back_to_stdout() {
        let call = Invocation::new("defaults");
        let error = SyscallOutput {
            code: Some(4),
            stdout: "domain missing\n".into(),
            stderr: String::new(),
        }
        .check(&call)
        .unwrap_err();

        assert!(error.to_string().ends_with("domain missing"));
    }

    #[test]
    fn fake_syscall_scripts_by_program() -> anyhow::Result<()> {
        let fake = FakeSyscall::new()
            .respond_to("mdls", SyscallOutput::ok("com.adobe.Photoshop"))
            .respond(SyscallOutput::failed(2, "nope"));

        let duti = fake.call(&Invocation::new("duti"))?;
        let mdls = fake.call(&Invocation::new("mdls"))?;
        let other = fake.call(&Invocation::new("zip"))?;

        assert_eq!(duti, SyscallOutput::failed(2, "nope"));
        assert_eq!(mdls.stdout, "com.adobe.Photoshop");
        assert!(other.success());
        assert_eq!(fake.calls().len(), 3);
        assert_eq!(fake.calls_to("mdls").len(), 1);

        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn host_syscall_captures_output() -> anyhow::Result<()> {
        let output = HostSyscall.call(&Invocation::new("sh").args(["-c", "echo hi; exit 3"]))?;

        assert_eq!(output.code, Some(3));
        assert_eq!(output.stdout, "hi\n");

        Ok(())
    }
}
