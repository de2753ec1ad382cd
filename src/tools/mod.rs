pub mod execution;

pub use execution::{CommandOutcome, CommandRequest, CommandRunner, ShellCommandRunner};
