//! Version control providers

mod git;

pub use git::{parse_branch_list, GitSourceProvider};
