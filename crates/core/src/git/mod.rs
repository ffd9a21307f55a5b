//! Local git operations for gitconflict.

pub mod local;
pub mod mock;
pub mod runner;

pub use local::LocalRepo;
pub use runner::{CommandOutput, CommandRunner, SystemCommandRunner};
