//! Rsync transfer engine
//!
//! Runs `rsync -e ssh --itemize-changes` and turns each itemized line into a
//! result entry. Everything else rsync prints is forwarded to the output sink.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::domain::entities::{
    ChangeReason, DeploymentResult, FileType, ResultEntry, ServerDefinition, UpdateKind,
};
use crate::domain::ports::{TransferEngine, TransferError, TransferRequest};
use crate::domain::value_objects::{CancelToken, OutputKind, OutputSink};
use crate::infrastructure::process::{run_streaming, ProcessError, Stream};

/// rsync's exit status when it was interrupted by a signal
const RSYNC_SIGNAL_STATUS: i32 = 20;

#[derive(Debug, Clone)]
pub struct RsyncTransfer {
    program: String,
}

impl Default for RsyncTransfer {
    fn default() -> Self {
        Self {
            program: "rsync".to_string(),
        }
    }
}

impl RsyncTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn endpoints(&self, request: &TransferRequest<'_>) -> (String, String) {
        let local = match request.path {
            Some(path) => request.local_path.join(path),
            None => request.local_path.to_path_buf(),
        };
        let local = with_trailing_slash(&local.display().to_string());

        let mut remote = self.remote_path(request.server);
        if let Some(path) = request.path {
            remote = format!("{}/{}", remote.trim_end_matches('/'), path);
        }
        let remote = with_trailing_slash(&remote);

        if request.direction.is_up() {
            (local, remote)
        } else {
            (remote, local)
        }
    }
}

/// Arguments for one rsync invocation
pub fn build_args(
    request: &TransferRequest<'_>,
    source: &str,
    destination: &str,
    exclude_from: Option<&Path>,
) -> Vec<String> {
    let flags = request.flags;
    let mut args = vec![
        "-e".to_string(),
        "ssh".to_string(),
        "--itemize-changes".to_string(),
    ];
    args.push(if flags.archive { "--archive" } else { "--recursive" }.to_string());
    if flags.compress {
        args.push("--compress".to_string());
    }
    if flags.checksum {
        args.push("--checksum".to_string());
    }
    if flags.delete {
        args.push("--delete".to_string());
    }
    if flags.delay_updates {
        args.push("--delay-updates".to_string());
    }
    if flags.dry_run {
        args.push("--dry-run".to_string());
    }
    if let Some(excludes) = exclude_from {
        args.push(format!("--exclude-from={}", excludes.display()));
    }
    args.push(source.to_string());
    args.push(destination.to_string());
    args
}

impl TransferEngine for RsyncTransfer {
    fn name(&self) -> &'static str {
        "rsync"
    }

    fn remote_path(&self, server: &ServerDefinition) -> String {
        format!("{}:{}", server.destination(), server.webroot)
    }

    fn deploy(
        &self,
        request: &TransferRequest<'_>,
        output: &dyn OutputSink,
        cancel: &CancelToken,
    ) -> Result<DeploymentResult, TransferError> {
        let (source, destination) = self.endpoints(request);
        let excludes: PathBuf = request.local_path.join(request.excludes_file);
        let exclude_from = excludes.is_file().then_some(excludes.as_path());

        let mut cmd = Command::new(&self.program);
        cmd.args(build_args(request, &source, &destination, exclude_from));

        let mut entries = Vec::new();
        let outcome = run_streaming(&mut cmd, None, cancel, |stream, line| match stream {
            Stream::Stdout => match parse_itemized_line(line) {
                Some(entry) => entries.push(entry),
                None => output.emit(OutputKind::Out, line),
            },
            Stream::Stderr => output.emit(OutputKind::Err, line),
        });

        match outcome {
            Ok(finished) if finished.status.success() => Ok(DeploymentResult::new(entries)),
            Ok(finished) if finished.status.code() == Some(RSYNC_SIGNAL_STATUS) => {
                Err(TransferError::Cancelled)
            }
            Ok(_) if cancel.is_cancelled() => Err(TransferError::Cancelled),
            Ok(finished) => {
                let stderr = finished.stderr.trim();
                Err(TransferError::Failed(match finished.status.code() {
                    Some(code) if stderr.is_empty() => {
                        format!("rsync exited with status {}", code)
                    }
                    Some(code) => format!("rsync exited with status {}: {}", code, stderr),
                    None => format!("rsync was terminated: {}", stderr),
                }))
            }
            Err(ProcessError::Cancelled) | Err(ProcessError::TimedOut) => {
                Err(TransferError::Cancelled)
            }
            Err(ProcessError::Spawn { source, .. }) => Err(TransferError::Unavailable(format!(
                "{} ({})",
                self.program, source
            ))),
            Err(ProcessError::Io(err)) => Err(TransferError::Failed(err.to_string())),
        }
    }
}

fn with_trailing_slash(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{}/", path)
    }
}

/// Parse one line of `--itemize-changes` output
///
/// Returns `None` for lines that aren't itemized changes (progress, summary).
pub fn parse_itemized_line(line: &str) -> Option<ResultEntry> {
    if let Some(rest) = line.strip_prefix("*deleting") {
        let path = rest.trim_start();
        if path.is_empty() {
            return None;
        }
        return Some(ResultEntry::new(UpdateKind::Deleted, path));
    }

    let (flags, path) = line.split_once(' ')?;
    let path = path.trim_start();
    let mut chars = flags.chars();

    let update = match chars.next()? {
        '<' => UpdateKind::Sent,
        '>' => UpdateKind::Received,
        'c' => UpdateKind::Created,
        'h' => UpdateKind::Link,
        '.' => UpdateKind::Attributes,
        _ => return None,
    };
    let file_type = match chars.next()? {
        'f' => FileType::File,
        'd' => FileType::Directory,
        'L' => FileType::Symlink,
        'D' => FileType::Device,
        'S' => FileType::Special,
        _ => return None,
    };
    if path.is_empty() {
        return None;
    }

    let attributes: Vec<char> = chars.collect();
    let reasons = if attributes.iter().all(|c| *c == '+') {
        Vec::new()
    } else {
        attribute_reasons(&attributes)
    };

    let path = match (update, file_type) {
        (UpdateKind::Link, _) => path.split(" => ").next().unwrap_or(path),
        (_, FileType::Symlink) => path.split(" -> ").next().unwrap_or(path),
        _ => path,
    };

    Some(
        ResultEntry::new(update, path)
            .with_file_type(file_type)
            .with_reasons(reasons),
    )
}

/// Attribute columns `cstpoguax`; the `u` column carries no reason
fn attribute_reasons(columns: &[char]) -> Vec<ChangeReason> {
    const COLUMNS: [(usize, &[char], ChangeReason); 8] = [
        (0, &['c'], ChangeReason::Checksum),
        (1, &['s'], ChangeReason::Size),
        (2, &['t', 'T'], ChangeReason::Time),
        (3, &['p'], ChangeReason::Permissions),
        (4, &['o'], ChangeReason::Owner),
        (5, &['g'], ChangeReason::Group),
        (7, &['a'], ChangeReason::Acl),
        (8, &['x'], ChangeReason::Xattr),
    ];

    COLUMNS
        .iter()
        .filter(|(index, marks, _)| columns.get(*index).is_some_and(|c| marks.contains(c)))
        .map(|(_, _, reason)| *reason)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::TransferFlags;
    use crate::domain::value_objects::Direction;

    fn server() -> ServerDefinition {
        ServerDefinition::new("example.com", "deploy", "/var/www")
    }

    fn request<'a>(
        direction: Direction,
        local: &'a Path,
        server: &'a ServerDefinition,
        path: Option<&'a str>,
        flags: TransferFlags,
    ) -> TransferRequest<'a> {
        TransferRequest {
            direction,
            local_path: local,
            server,
            path,
            excludes_file: ".beam-excludes",
            flags,
        }
    }

    #[test]
    fn default_flags_command_line() {
        let server = server();
        let req = request(
            Direction::Up,
            Path::new("/srv/_temp"),
            &server,
            None,
            TransferFlags::default(),
        );
        let (source, destination) = RsyncTransfer::new().endpoints(&req);
        let args = build_args(&req, &source, &destination, None);

        insta::assert_snapshot!(
            args.join(" "),
            @"-e ssh --itemize-changes --archive --compress --checksum --delay-updates /srv/_temp/ deploy@example.com:/var/www/"
        );
    }

    #[test]
    fn all_optional_flags_command_line() {
        let server = server();
        let flags = TransferFlags {
            dry_run: true,
            checksum: false,
            delete: true,
            archive: false,
            compress: false,
            delay_updates: false,
        };
        let req = request(
            Direction::Up,
            Path::new("/srv/_temp"),
            &server,
            Some("assets/css"),
            flags,
        );
        let (source, destination) = RsyncTransfer::new().endpoints(&req);
        let args = build_args(
            &req,
            &source,
            &destination,
            Some(Path::new("/srv/_temp/.beam-excludes")),
        );

        insta::assert_snapshot!(
            args.join(" "),
            @"-e ssh --itemize-changes --recursive --delete --dry-run --exclude-from=/srv/_temp/.beam-excludes /srv/_temp/assets/css/ deploy@example.com:/var/www/assets/css/"
        );
    }

    #[test]
    fn down_swaps_source_and_destination() {
        let server = server();
        let req = request(
            Direction::Down,
            Path::new("/srv/app"),
            &server,
            None,
            TransferFlags::default(),
        );
        let (source, destination) = RsyncTransfer::new().endpoints(&req);
        assert_eq!(source, "deploy@example.com:/var/www/");
        assert_eq!(destination, "/srv/app/");
    }

    #[test]
    fn parses_sent_file_with_reasons() {
        let entry = parse_itemized_line("<f.st...... src/index.php").unwrap();
        assert_eq!(entry.update, UpdateKind::Sent);
        assert_eq!(entry.path, "src/index.php");
        assert_eq!(entry.file_type, Some(FileType::File));
        assert_eq!(entry.reasons, vec![ChangeReason::Size, ChangeReason::Time]);
        assert!(!entry.is_new());
    }

    #[test]
    fn parses_new_file() {
        let entry = parse_itemized_line(">f+++++++++ logs/today.log").unwrap();
        assert_eq!(entry.update, UpdateKind::Received);
        assert!(entry.reasons.is_empty());
        assert!(entry.is_new());
    }

    #[test]
    fn parses_created_directory_and_attribute_change() {
        let created = parse_itemized_line("cd+++++++++ assets/").unwrap();
        assert_eq!(created.update, UpdateKind::Created);
        assert_eq!(created.file_type, Some(FileType::Directory));

        let touched = parse_itemized_line(".d..t.og... ./").unwrap();
        assert_eq!(touched.update, UpdateKind::Attributes);
        assert_eq!(
            touched.reasons,
            vec![ChangeReason::Time, ChangeReason::Owner, ChangeReason::Group]
        );
    }

    #[test]
    fn parses_deletions() {
        let entry = parse_itemized_line("*deleting   old/file.txt").unwrap();
        assert_eq!(entry.update, UpdateKind::Deleted);
        assert_eq!(entry.path, "old/file.txt");
        assert_eq!(entry.file_type, None);
    }

    #[test]
    fn strips_link_targets() {
        let symlink = parse_itemized_line("cL+++++++++ current -> releases/42").unwrap();
        assert_eq!(symlink.path, "current");
        assert_eq!(symlink.file_type, Some(FileType::Symlink));

        let hardlink = parse_itemized_line("hf+++++++++ copy.txt => original.txt").unwrap();
        assert_eq!(hardlink.update, UpdateKind::Link);
        assert_eq!(hardlink.path, "copy.txt");
    }

    #[test]
    fn checksum_and_acl_columns() {
        let entry = parse_itemized_line("<fc......ax config.php").unwrap();
        assert_eq!(
            entry.reasons,
            vec![ChangeReason::Checksum, ChangeReason::Acl, ChangeReason::Xattr]
        );
    }

    #[test]
    fn ignores_non_itemized_lines() {
        for line in [
            "sending incremental file list",
            "sent 1,234 bytes  received 56 bytes  2,580.00 bytes/sec",
            "total size is 10,000  speedup is 7.75 (DRY RUN)",
            "created directory /var/www",
            "",
            "*deleting",
        ] {
            assert_eq!(parse_itemized_line(line), None, "line {line:?}");
        }
    }

    #[test]
    fn missing_rsync_is_unavailable() {
        let server = server();
        let dir = tempfile::tempdir().unwrap();
        let req = request(
            Direction::Up,
            dir.path(),
            &server,
            None,
            TransferFlags::default(),
        );
        let err = RsyncTransfer::new()
            .with_program("beam-test-no-such-rsync")
            .deploy(&req, &crate::domain::value_objects::NoopOutput, &CancelToken::new())
            .unwrap_err();
        assert!(matches!(err, TransferError::Unavailable(_)));
    }

    #[cfg(unix)]
    #[test]
    fn itemized_output_becomes_the_result() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("fake-rsync");
        std::fs::write(
            &fake,
            "#!/bin/sh\necho 'sending incremental file list'\necho '<f+++++++++ index.php'\necho '*deleting   old.txt'\n",
        )
        .unwrap();
        std::fs::set_permissions(&fake, std::fs::Permissions::from_mode(0o755)).unwrap();

        let server = server();
        let req = request(
            Direction::Up,
            dir.path(),
            &server,
            None,
            TransferFlags::default(),
        );
        let forwarded = std::cell::RefCell::new(Vec::new());
        let sink = |_: OutputKind, line: &str| forwarded.borrow_mut().push(line.to_string());

        let result = RsyncTransfer::new()
            .with_program(fake.display().to_string())
            .deploy(&req, &sink, &CancelToken::new())
            .unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result.count_of(UpdateKind::Sent), 1);
        assert_eq!(result.count_of(UpdateKind::Deleted), 1);
        assert_eq!(*forwarded.borrow(), vec!["sending incremental file list"]);
    }
}
