//! Remote command executor over OpenSSH
//!
//! One session per command. Authentication comes from the ambient ssh
//! configuration (agent, keys, `~/.ssh/config`); `BatchMode` keeps ssh from
//! prompting.

use std::process::Command;
use std::time::Duration;

use crate::domain::entities::ServerDefinition;
use crate::domain::ports::{ExecError, RemoteExecutor};
use crate::domain::value_objects::{CancelToken, OutputKind, OutputSink};
use crate::infrastructure::process::{run_streaming, ProcessError};

use super::shell_quote;

/// ssh reports its own failures (connection, auth) with this status
const SSH_ERROR_STATUS: i32 = 255;

#[derive(Debug, Clone)]
pub struct SshExecutor {
    program: String,
    connect_timeout: u32,
    timeout: Option<Duration>,
}

impl Default for SshExecutor {
    fn default() -> Self {
        Self {
            program: "ssh".to_string(),
            connect_timeout: 30,
            timeout: None,
        }
    }
}

impl SshExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn build_args(&self, server: &ServerDefinition, command: &str) -> Vec<String> {
        vec![
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.connect_timeout),
            "-l".to_string(),
            server.user.clone(),
            server.host.clone(),
            format!("cd {} && {}", shell_quote(&server.webroot), command),
        ]
    }
}

impl RemoteExecutor for SshExecutor {
    fn run(
        &self,
        server: &ServerDefinition,
        command: &str,
        output: &dyn OutputSink,
        cancel: &CancelToken,
    ) -> Result<(), ExecError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.build_args(server, command));

        let outcome = run_streaming(&mut cmd, self.timeout, cancel, |_, line| {
            output.emit(OutputKind::Remote, line)
        });

        match outcome {
            Ok(finished) if finished.status.success() => Ok(()),
            Ok(finished) if finished.status.code() == Some(SSH_ERROR_STATUS) => {
                let message = finished.stderr.trim();
                Err(ExecError::Connection(if message.is_empty() {
                    format!("{} exited with status {}", self.program, SSH_ERROR_STATUS)
                } else {
                    message.to_string()
                }))
            }
            Ok(finished) => Err(ExecError::Failed {
                code: finished.status.code(),
                stderr: finished.stderr,
            }),
            Err(ProcessError::TimedOut) => Err(ExecError::TimedOut {
                timeout: self.timeout.unwrap_or_default(),
            }),
            Err(ProcessError::Cancelled) => Err(ExecError::Cancelled),
            Err(err @ ProcessError::Spawn { .. }) | Err(err @ ProcessError::Io(_)) => {
                Err(ExecError::Connection(err.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::NoopOutput;

    #[test]
    fn args_change_into_webroot_first() {
        let server = ServerDefinition::new("example.com", "deploy", "/var/www/my site");
        let args = SshExecutor::new().build_args(&server, "php artisan migrate");

        assert_eq!(
            args,
            vec![
                "-o",
                "BatchMode=yes",
                "-o",
                "ConnectTimeout=30",
                "-l",
                "deploy",
                "example.com",
                "cd '/var/www/my site' && php artisan migrate",
            ]
        );
    }

    #[test]
    fn missing_client_is_a_connection_failure() {
        let server = ServerDefinition::new("example.com", "deploy", "/var/www");
        let err = SshExecutor::new()
            .with_program("beam-test-no-such-ssh")
            .run(&server, "true", &NoopOutput, &CancelToken::new())
            .unwrap_err();
        assert!(matches!(err, ExecError::Connection(_)));
    }

    #[cfg(unix)]
    #[test]
    fn status_255_is_a_connection_failure() {
        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("fake-ssh");
        std::fs::write(&fake, "#!/bin/sh\necho 'Connection refused' >&2\nexit 255\n").unwrap();
        make_executable(&fake);

        let server = ServerDefinition::new("example.com", "deploy", "/var/www");
        let err = SshExecutor::new()
            .with_program(fake.display().to_string())
            .run(&server, "true", &NoopOutput, &CancelToken::new())
            .unwrap_err();
        assert!(matches!(err, ExecError::Connection(ref m) if m == "Connection refused"));
    }

    #[cfg(unix)]
    #[test]
    fn remote_output_is_tagged_remote() {
        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("fake-ssh");
        std::fs::write(&fake, "#!/bin/sh\necho deployed\necho warning >&2\n").unwrap();
        make_executable(&fake);

        let lines = std::cell::RefCell::new(Vec::new());
        let sink = |kind: OutputKind, line: &str| lines.borrow_mut().push((kind, line.to_string()));
        let server = ServerDefinition::new("example.com", "deploy", "/var/www");
        SshExecutor::new()
            .with_program(fake.display().to_string())
            .run(&server, "true", &sink, &CancelToken::new())
            .unwrap();

        let lines = lines.borrow();
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|(kind, _)| *kind == OutputKind::Remote));
    }

    #[cfg(unix)]
    #[test]
    fn missing_webroot_skips_the_command() {
        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("fake-ssh");
        std::fs::write(&fake, "#!/bin/sh\nfor last; do :; done\nexec sh -c \"$last\"\n").unwrap();
        make_executable(&fake);

        let lines = std::cell::RefCell::new(Vec::new());
        let sink = |_: OutputKind, line: &str| lines.borrow_mut().push(line.to_string());
        let webroot = dir.path().join("no-such-webroot");
        let server = ServerDefinition::new("example.com", "deploy", webroot.display().to_string());
        let err = SshExecutor::new()
            .with_program(fake.display().to_string())
            .run(&server, "echo ran", &sink, &CancelToken::new())
            .unwrap_err();

        assert!(matches!(err, ExecError::Failed { .. }));
        assert!(!lines.borrow().iter().any(|line| line == "ran"));
    }

    #[cfg(unix)]
    fn make_executable(path: &std::path::Path) {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }
}
