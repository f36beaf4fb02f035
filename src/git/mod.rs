pub mod commands;
pub mod repo;
pub mod runner;

pub use commands::Git;
pub use repo::{ensure_executable, GitRepo};
pub use runner::{CommandRunner, CommandSpec, ProcessRunner};
