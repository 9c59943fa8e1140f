//! Transfer engines

mod rsync;

pub use rsync::{build_args, parse_itemized_line, RsyncTransfer};
