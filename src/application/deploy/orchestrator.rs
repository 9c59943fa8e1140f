//! Deploy Orchestrator
//!
//! Drives one deploy run:
//! 1. Setup: pick collaborators, resolve the branch, validate locking rules
//! 2. Prepare: export the branch next to the source tree (once per run)
//! 3. Run command buckets and the transfer in fixed order
//!
//! All collaborators are ports; defaults come from a `CapabilityFactory`.

use std::fs::{self, OpenOptions};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::config::BeamConfig;
use crate::domain::entities::{CommandDefinition, DeploymentResult, ServerDefinition};
use crate::domain::ports::{
    CapabilityFactory, DeployEvent, DeployEventSink, ExecError, LocalExecutor, NoopEventSink,
    RemoteExecutor, SourceProvider, TransferEngine, TransferError, TransferRequest,
    DEFAULT_COMMAND_TIMEOUT,
};
use crate::domain::value_objects::{CancelToken, Location, OutputSink, Stage};
use crate::error::{BeamError, BeamResult, SetupError};

use crate::application::options::RunOptions;

/// Whether the local path holds an export for the current options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preparation {
    Unprepared,
    Prepared,
}

/// Options plus the collaborators they were validated against
struct Resolved {
    options: RunOptions,
    source: Box<dyn SourceProvider>,
    transfer: Box<dyn TransferEngine>,
}

/// Builder for [`DeployOrchestrator`]
pub struct DeployOrchestratorBuilder {
    config: BeamConfig,
    factory: Box<dyn CapabilityFactory>,
    source: Option<Box<dyn SourceProvider>>,
    transfer: Option<Box<dyn TransferEngine>>,
    local: Option<Box<dyn LocalExecutor>>,
    remote: Option<Box<dyn RemoteExecutor>>,
    events: Arc<dyn DeployEventSink>,
    cancel: CancelToken,
    command_timeout: Duration,
}

impl DeployOrchestratorBuilder {
    pub fn source_provider(mut self, source: Box<dyn SourceProvider>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn transfer_engine(mut self, transfer: Box<dyn TransferEngine>) -> Self {
        self.transfer = Some(transfer);
        self
    }

    pub fn local_executor(mut self, local: Box<dyn LocalExecutor>) -> Self {
        self.local = Some(local);
        self
    }

    pub fn remote_executor(mut self, remote: Box<dyn RemoteExecutor>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn events(mut self, events: Arc<dyn DeployEventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Timeout for each local command (default 300 seconds)
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Run setup with `options` and return the ready orchestrator
    pub fn build(self, options: RunOptions) -> BeamResult<DeployOrchestrator> {
        let resolved = resolve(
            &self.config,
            self.factory.as_ref(),
            options,
            self.source,
            self.transfer,
        )?;

        let local = self
            .local
            .unwrap_or_else(|| self.factory.local_executor());
        let remote = self
            .remote
            .unwrap_or_else(|| self.factory.remote_executor());

        let orchestrator = DeployOrchestrator {
            config: self.config,
            factory: self.factory,
            local,
            remote,
            resolved,
            preparation: Preparation::Unprepared,
            events: self.events,
            cancel: self.cancel,
            command_timeout: self.command_timeout,
        };
        orchestrator.emit_setup_completed();
        Ok(orchestrator)
    }
}

/// Sequences preparation, command buckets and the transfer for one server
pub struct DeployOrchestrator {
    config: BeamConfig,
    factory: Box<dyn CapabilityFactory>,
    local: Box<dyn LocalExecutor>,
    remote: Box<dyn RemoteExecutor>,
    resolved: Resolved,
    preparation: Preparation,
    events: Arc<dyn DeployEventSink>,
    cancel: CancelToken,
    command_timeout: Duration,
}

impl DeployOrchestrator {
    pub fn builder(config: BeamConfig, factory: Box<dyn CapabilityFactory>) -> DeployOrchestratorBuilder {
        DeployOrchestratorBuilder {
            config,
            factory,
            source: None,
            transfer: None,
            local: None,
            remote: None,
            events: Arc::new(NoopEventSink),
            cancel: CancelToken::new(),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    /// Re-run setup with new options
    ///
    /// On failure the previous options, collaborators and preparation state
    /// are kept as they were. The export is reused unless the branch, source
    /// directory or export directory changed.
    pub fn setup(
        &mut self,
        options: RunOptions,
        source: Option<Box<dyn SourceProvider>>,
        transfer: Option<Box<dyn TransferEngine>>,
    ) -> BeamResult<()> {
        let resolved = resolve(&self.config, self.factory.as_ref(), options, source, transfer)?;

        let previous = &self.resolved.options;
        let next = &resolved.options;
        if previous.branch != next.branch
            || previous.srcdir != next.srcdir
            || previous.export_dir != next.export_dir
        {
            self.preparation = Preparation::Unprepared;
        }

        self.resolved = resolved;
        self.emit_setup_completed();
        Ok(())
    }

    pub fn options(&self) -> &RunOptions {
        &self.resolved.options
    }

    pub fn config(&self) -> &BeamConfig {
        &self.config
    }

    pub fn preparation(&self) -> Preparation {
        self.preparation
    }

    pub fn is_prepared(&self) -> bool {
        self.preparation == Preparation::Prepared
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// The server the options target
    pub fn server(&self) -> BeamResult<&ServerDefinition> {
        self.resolved.options.server(&self.config)
    }

    /// Local side of the transfer: the working copy, or the export directory
    /// next to it
    pub fn local_path(&self) -> PathBuf {
        let options = &self.resolved.options;
        if options.working_copy {
            options.srcdir.clone()
        } else {
            parent_dir(&options.srcdir).join(&options.export_dir)
        }
    }

    /// Remote root for the server, with the extra path appended
    pub fn remote_path(&self) -> BeamResult<String> {
        let base = self.resolved.transfer.remote_path(self.server()?);
        Ok(self.combined_path(&base))
    }

    fn combined_path(&self, base: &str) -> String {
        match &self.resolved.options.path {
            Some(path) => format!("{}/{}", base, path),
            None => base.to_string(),
        }
    }

    /// Full deploy: prepare, pre commands, transfer, post commands
    pub fn run(
        &mut self,
        deployment_output: &dyn OutputSink,
        command_output: &dyn OutputSink,
    ) -> BeamResult<DeploymentResult> {
        self.check_cancelled()?;
        self.prepare_if_needed(command_output)?;
        self.run_commands(Stage::PreRemote, command_output)?;

        let result = self.transfer(deployment_output, false)?;

        self.run_commands(Stage::PostLocal, command_output)?;
        self.run_commands(Stage::PostRemote, command_output)?;

        self.emit_completed(&result, self.resolved.options.dry_run);
        Ok(result)
    }

    /// What a deploy would change, without changing it
    ///
    /// Prepares the local path like `run` does, then transfers in dry-run mode.
    /// No remote or post commands run.
    pub fn changed_files(
        &mut self,
        deployment_output: &dyn OutputSink,
        command_output: &dyn OutputSink,
    ) -> BeamResult<DeploymentResult> {
        self.check_cancelled()?;
        self.prepare_if_needed(command_output)?;

        let result = self.transfer(deployment_output, true)?;
        self.emit_completed(&result, true);
        Ok(result)
    }

    fn prepare_if_needed(&mut self, command_output: &dyn OutputSink) -> BeamResult<()> {
        if self.preparation == Preparation::Unprepared && !self.resolved.options.working_copy {
            self.prepare_local_path()?;
            self.run_commands(Stage::PreLocal, command_output)?;
        }
        Ok(())
    }

    fn prepare_local_path(&mut self) -> BeamResult<()> {
        let branch = self
            .resolved
            .options
            .branch
            .clone()
            .ok_or_else(|| BeamError::InvalidArgument("no branch resolved for export".to_string()))?;
        let local_path = self.local_path();

        if self.server()?.is_locked_remote() {
            self.check_cancelled()?;
            self.resolved.source.update_branch(&branch)?;
        }

        self.check_cancelled()?;
        self.resolved.source.export(&branch, &local_path)?;
        self.preparation = Preparation::Prepared;

        self.events.on_event(DeployEvent::Prepared { branch, local_path });
        Ok(())
    }

    fn run_commands(&self, stage: Stage, output: &dyn OutputSink) -> BeamResult<()> {
        let commands: Vec<&CommandDefinition> = self.config.commands_for(stage).collect();
        if commands.is_empty() {
            return Ok(());
        }

        self.events.on_event(DeployEvent::PhaseStarted {
            stage,
            command_count: commands.len(),
        });

        let server = self.server()?;
        let cwd = self.local_path();
        let detailed = self.events.wants_detailed_events();

        for command in commands {
            self.check_cancelled()?;
            if detailed {
                self.events.on_event(DeployEvent::CommandStarted {
                    stage,
                    command: command.command.clone(),
                });
            }

            let outcome = match command.location {
                Location::Local => self.local.run(
                    &command.command,
                    &cwd,
                    self.command_timeout,
                    output,
                    &self.cancel,
                ),
                Location::Remote => self.remote.run(server, &command.command, output, &self.cancel),
            };
            outcome.map_err(|err| exec_error(stage, &command.command, server, err))?;

            if detailed {
                self.events.on_event(DeployEvent::CommandFinished {
                    stage,
                    command: command.command.clone(),
                });
            }
        }
        Ok(())
    }

    fn transfer(&self, output: &dyn OutputSink, force_dry_run: bool) -> BeamResult<DeploymentResult> {
        self.check_cancelled()?;

        let options = &self.resolved.options;
        let server = self.server()?;
        let local_path = self.local_path();

        let mut flags = options.transfer_flags();
        if force_dry_run {
            flags.dry_run = true;
        }

        let local = self.combined_path(&local_path.display().to_string());
        let remote = self.remote_path()?;
        let (source, destination) = if options.direction.is_up() {
            (local, remote)
        } else {
            (remote, local)
        };
        self.events.on_event(DeployEvent::TransferStarted {
            engine: self.resolved.transfer.name(),
            source,
            destination,
            dry_run: flags.dry_run,
        });

        let request = TransferRequest {
            direction: options.direction,
            local_path: &local_path,
            server,
            path: options.path.as_deref(),
            excludes_file: &options.excludes_file,
            flags,
        };

        self.resolved
            .transfer
            .deploy(&request, output, &self.cancel)
            .map_err(|err| match err {
                TransferError::Cancelled => BeamError::Cancelled,
                other => BeamError::TransferFailed {
                    message: other.to_string(),
                },
            })
    }

    fn check_cancelled(&self) -> BeamResult<()> {
        if self.cancel.is_cancelled() {
            Err(BeamError::Cancelled)
        } else {
            Ok(())
        }
    }

    fn emit_setup_completed(&self) {
        let options = &self.resolved.options;
        self.events.on_event(DeployEvent::SetupCompleted {
            remote: options.remote.clone(),
            direction: options.direction,
            branch: options.branch.clone(),
            working_copy: options.working_copy,
        });
    }

    fn emit_completed(&self, result: &DeploymentResult, dry_run: bool) {
        self.events.on_event(DeployEvent::Completed {
            dry_run,
            total: result.len(),
            summary: result
                .summary()
                .into_iter()
                .map(|(kind, count)| (kind.to_string(), count))
                .collect(),
        });
    }
}

/// Pick collaborators, resolve the branch and validate, without touching
/// any orchestrator state
fn resolve(
    config: &BeamConfig,
    factory: &dyn CapabilityFactory,
    mut options: RunOptions,
    source: Option<Box<dyn SourceProvider>>,
    transfer: Option<Box<dyn TransferEngine>>,
) -> BeamResult<Resolved> {
    let source = source.unwrap_or_else(|| factory.source_provider(&options.srcdir));
    let transfer = transfer.unwrap_or_else(|| factory.transfer_engine());
    let server = options.server(config)?;

    if !options.working_copy {
        if !source.exists() {
            return Err(SetupError::NoVersionControl {
                path: options.srcdir.clone(),
            }
            .into());
        }

        if options.branch.is_none() {
            let branch = match server.locked_branch() {
                Some(locked) => locked.to_string(),
                None => source.current_branch().map_err(SetupError::from)?,
            };
            options.branch = Some(branch);
        }
    }

    validate(&options, server, source.as_ref())?;

    Ok(Resolved {
        options,
        source,
        transfer,
    })
}

/// Locking and environment rules; the first failure wins
fn validate(
    options: &RunOptions,
    server: &ServerDefinition,
    source: &dyn SourceProvider,
) -> Result<(), SetupError> {
    if let Some(branch) = &options.branch {
        if let Some(locked) = server.locked_branch() {
            if locked != branch {
                return Err(SetupError::BranchLockMismatch {
                    branch: branch.clone(),
                    locked: locked.to_string(),
                });
            }
        }

        let available = source.available_branches()?;
        if !available.contains(branch) {
            return Err(SetupError::UnknownBranch {
                branch: branch.clone(),
                available,
            });
        }
    }

    if options.working_copy && server.is_locked_remote() {
        return Err(SetupError::WorkingCopyIncompatibleWithRemoteLock {
            locked: server.locked_branch().unwrap_or_default().to_string(),
        });
    }

    if !options.working_copy {
        let parent = parent_dir(&options.srcdir);
        let local_path = absolute(&parent.join(&options.export_dir));
        let srcdir = absolute(&options.srcdir);
        if local_path.starts_with(&srcdir) || srcdir.starts_with(&local_path) {
            return Err(SetupError::LocalPathOverlapsSource { local_path, srcdir });
        }
        if !is_writable_dir(&parent) {
            return Err(SetupError::LocalPathNotWritable { path: parent });
        }
    }

    Ok(())
}

/// Absolute, lexically normalized form of `path`
///
/// The export is replaced wholesale, so it is compared against srcdir
/// without following symlinks or requiring either path to exist.
fn absolute(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Directory that holds the source tree
///
/// `.` for a bare relative name; `<srcdir>/..` when the path ends in `.` or `..`.
fn parent_dir(srcdir: &Path) -> PathBuf {
    if srcdir.file_name().is_none() {
        return srcdir.join("..");
    }
    srcdir
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn is_writable_dir(dir: &Path) -> bool {
    if !dir.is_dir() {
        return false;
    }
    let marker = dir.join(format!(".beam-write-check-{}", std::process::id()));
    match OpenOptions::new().write(true).create_new(true).open(&marker) {
        Ok(file) => {
            drop(file);
            let _ = fs::remove_file(&marker);
            true
        }
        Err(_) => false,
    }
}

fn exec_error(stage: Stage, command: &str, server: &ServerDefinition, err: ExecError) -> BeamError {
    match err {
        ExecError::Failed { code, stderr } => BeamError::CommandFailed {
            stage,
            command: command.to_string(),
            code,
            stderr,
        },
        ExecError::TimedOut { timeout } => BeamError::CommandTimedOut {
            stage,
            command: command.to_string(),
            timeout,
        },
        ExecError::Connection(message) => BeamError::RemoteConnectionFailed {
            stage,
            host: server.host.clone(),
            message,
        },
        ExecError::Cancelled => BeamError::Cancelled,
        ExecError::Spawn(source) => BeamError::CommandFailed {
            stage,
            command: command.to_string(),
            code: None,
            stderr: source.to_string(),
        },
    }
}

#[cfg(test)]
mod path_tests {
    use super::*;

    #[test]
    fn parent_dir_of_named_and_dot_paths() {
        assert_eq!(parent_dir(Path::new("/srv/repo")), PathBuf::from("/srv"));
        assert_eq!(parent_dir(Path::new("repo")), PathBuf::from("."));
        assert_eq!(parent_dir(Path::new(".")), PathBuf::from("./.."));
    }

    #[test]
    fn absolute_folds_dot_components() {
        assert_eq!(
            absolute(Path::new("/srv/repo/./../repo/_temp")),
            PathBuf::from("/srv/repo/_temp")
        );
        assert_eq!(absolute(Path::new("/../srv")), PathBuf::from("/srv"));
        let cwd = std::env::current_dir().unwrap();
        let expected = cwd.parent().unwrap_or(cwd.as_path()).to_path_buf();
        assert_eq!(absolute(Path::new("./..")), expected);
    }
}
