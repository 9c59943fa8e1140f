//! Streaming subprocess runner
//!
//! Reader threads only forward lines over a channel; the calling thread
//! delivers them to the handler in arrival order and watches the child for
//! exit, timeout and cancellation.

use std::io::{BufRead, BufReader, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::domain::value_objects::CancelToken;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How long output is still collected after the child exits, when something
/// it started in the background keeps the pipes open
const EXIT_GRACE: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// A child that ran to completion (successfully or not)
#[derive(Debug)]
pub struct Finished {
    pub status: ExitStatus,
    /// Everything the child wrote to stderr
    pub stderr: String,
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("timed out")]
    TimedOut,

    #[error("cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Run `command`, passing each output line to `on_line` as it arrives
///
/// The child is killed when `timeout` elapses or `cancel` trips.
pub fn run_streaming(
    command: &mut Command,
    timeout: Option<Duration>,
    cancel: &CancelToken,
    mut on_line: impl FnMut(Stream, &str),
) -> Result<Finished, ProcessError> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = command.spawn().map_err(|source| ProcessError::Spawn {
        program: command.get_program().to_string_lossy().into_owned(),
        source,
    })?;

    let (tx, rx) = mpsc::channel();
    let mut readers = Vec::new();
    if let Some(stdout) = child.stdout.take() {
        readers.push(spawn_reader(stdout, Stream::Stdout, tx.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(spawn_reader(stderr, Stream::Stderr, tx.clone()));
    }
    drop(tx);

    let started = Instant::now();
    let mut stderr = String::new();
    let mut drained = false;
    let mut exit: Option<(ExitStatus, Instant)> = None;

    loop {
        if drained {
            thread::sleep(POLL_INTERVAL);
        } else {
            match rx.recv_timeout(POLL_INTERVAL) {
                Ok((stream, line)) => {
                    if stream == Stream::Stderr {
                        stderr.push_str(&line);
                        stderr.push('\n');
                    }
                    on_line(stream, &line);
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => drained = true,
            }
        }

        if exit.is_none() {
            exit = child.try_wait()?.map(|status| (status, Instant::now()));
        }
        if let Some((status, exited_at)) = exit {
            if drained {
                for reader in readers {
                    let _ = reader.join();
                }
                return Ok(Finished { status, stderr });
            }
            // Readers blocked on a pipe held by a grandchild are left detached.
            if exited_at.elapsed() >= EXIT_GRACE {
                return Ok(Finished { status, stderr });
            }
            continue;
        }

        if cancel.is_cancelled() {
            stop(&mut child);
            return Err(ProcessError::Cancelled);
        }
        if timeout.is_some_and(|limit| started.elapsed() >= limit) {
            stop(&mut child);
            return Err(ProcessError::TimedOut);
        }
    }
}

fn spawn_reader<R>(source: R, stream: Stream, tx: Sender<(Stream, String)>) -> JoinHandle<()>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut reader = BufReader::new(source);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    let line = line.trim_end_matches(['\n', '\r']).to_string();
                    if tx.send((stream, line)).is_err() {
                        break;
                    }
                }
            }
        }
    })
}

/// Kill and reap; reader threads end once the pipes close
fn stop(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}
