//! Command implementations

pub mod calc;
pub mod completions;
pub mod explain;
pub mod init;
pub mod list;
pub mod new;
pub mod validate;
