//! Branch name helpers
//!
//! Remote-tracking branches are listed by the VCS as `remotes/<remote>/<name>`.

pub const REMOTE_PREFIX: &str = "remotes/";

/// Returns true if the branch names a remote-tracking ref
pub fn is_remote_branch(branch: &str) -> bool {
    branch.starts_with(REMOTE_PREFIX)
}

/// The remote a remote-tracking branch belongs to (`remotes/origin/main` → `origin`)
pub fn remote_name(branch: &str) -> Option<&str> {
    let rest = branch.strip_prefix(REMOTE_PREFIX)?;
    let (remote, name) = rest.split_once('/')?;
    if remote.is_empty() || name.is_empty() {
        return None;
    }
    Some(remote)
}
