//! CLI subcommand implementations for the lectern binary.

pub mod install_cmd;
pub mod list_cmd;
pub mod read_cmd;
pub mod setup_cmd;
pub mod status_cmd;
pub mod uninstall_cmd;
