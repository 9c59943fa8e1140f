//! Local command executor

use std::path::Path;
use std::process::Command;
use std::time::Duration;

use crate::domain::ports::{ExecError, LocalExecutor};
use crate::domain::value_objects::{CancelToken, OutputKind, OutputSink};
use crate::infrastructure::process::{run_streaming, ProcessError, Stream};

/// Runs commands with `sh -c` (`cmd /C` on Windows)
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor;

impl ProcessExecutor {
    fn shell(command: &str) -> Command {
        #[cfg(windows)]
        {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(command);
            cmd
        }
        #[cfg(not(windows))]
        {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(command);
            cmd
        }
    }
}

impl LocalExecutor for ProcessExecutor {
    fn run(
        &self,
        command: &str,
        cwd: &Path,
        timeout: Duration,
        output: &dyn OutputSink,
        cancel: &CancelToken,
    ) -> Result<(), ExecError> {
        let mut cmd = Self::shell(command);
        cmd.current_dir(cwd);

        let outcome = run_streaming(&mut cmd, Some(timeout), cancel, |stream, line| {
            let kind = match stream {
                Stream::Stdout => OutputKind::Out,
                Stream::Stderr => OutputKind::Err,
            };
            output.emit(kind, line);
        });

        match outcome {
            Ok(finished) if finished.status.success() => Ok(()),
            Ok(finished) => Err(ExecError::Failed {
                code: finished.status.code(),
                stderr: finished.stderr,
            }),
            Err(ProcessError::TimedOut) => Err(ExecError::TimedOut { timeout }),
            Err(ProcessError::Cancelled) => Err(ExecError::Cancelled),
            Err(ProcessError::Spawn { source, .. }) | Err(ProcessError::Io(source)) => {
                Err(ExecError::Spawn(source))
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::domain::value_objects::NoopOutput;
    use std::cell::RefCell;
    use tempfile::tempdir;

    const TIMEOUT: Duration = Duration::from_secs(10);

    #[test]
    fn echo_is_streamed_to_the_sink() {
        let dir = tempdir().unwrap();
        let lines = RefCell::new(Vec::new());
        let sink = |kind: OutputKind, line: &str| lines.borrow_mut().push((kind, line.to_string()));

        ProcessExecutor
            .run("echo hi", dir.path(), TIMEOUT, &sink, &CancelToken::new())
            .unwrap();

        assert_eq!(*lines.borrow(), vec![(OutputKind::Out, "hi".to_string())]);
    }

    #[test]
    fn runs_in_the_given_directory() {
        let dir = tempdir().unwrap();
        ProcessExecutor
            .run(
                "touch marker",
                dir.path(),
                TIMEOUT,
                &NoopOutput,
                &CancelToken::new(),
            )
            .unwrap();
        assert!(dir.path().join("marker").exists());
    }

    #[test]
    fn failure_carries_code_and_stderr() {
        let dir = tempdir().unwrap();
        let err = ProcessExecutor
            .run(
                "echo broken >&2; exit 3",
                dir.path(),
                TIMEOUT,
                &NoopOutput,
                &CancelToken::new(),
            )
            .unwrap_err();

        match err {
            ExecError::Failed { code, stderr } => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr.trim(), "broken");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn slow_command_times_out() {
        let dir = tempdir().unwrap();
        let err = ProcessExecutor
            .run(
                "sleep 5",
                dir.path(),
                Duration::from_millis(200),
                &NoopOutput,
                &CancelToken::new(),
            )
            .unwrap_err();
        assert!(matches!(err, ExecError::TimedOut { .. }));
    }

    #[test]
    fn cancelled_token_kills_the_command() {
        let dir = tempdir().unwrap();
        let cancel = CancelToken::new().with_timeout(Duration::from_millis(100));
        let err = ProcessExecutor
            .run(
                "sleep 5",
                dir.path(),
                TIMEOUT,
                &NoopOutput,
                &cancel,
            )
            .unwrap_err();
        assert!(matches!(err, ExecError::Cancelled));
    }
}
