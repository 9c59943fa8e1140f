//! Command executors
//!
//! - `ProcessExecutor` - local commands through the platform shell
//! - `SshExecutor` - remote commands through the OpenSSH client

mod local;
mod ssh;

pub use local::ProcessExecutor;
pub use ssh::SshExecutor;

/// Single-quote a value for a POSIX shell
pub(crate) fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shell_quote_escapes_single_quotes() {
        assert_eq!(shell_quote("/var/www"), "'/var/www'");
        assert_eq!(shell_quote("it's"), "'it'\\''s'");
    }
}
