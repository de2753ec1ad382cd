use crate::cli::Command;
use std::env;

/// Execution contexts that influence how logging is routed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutionContext {
    /// One-shot commands such as `apidocs convert`.
    LocalDev,
    /// Long-running docs server.
    Server,
    /// Scripted runs that should be quiet on the console.
    Quiet,
}

impl ExecutionContext {
    /// Returns `true` when console sinks should be disabled.
    pub fn disables_console(self) -> bool {
        matches!(self, ExecutionContext::Quiet)
    }
}

/// Derive the active execution context from a parsed CLI command plus overrides.
pub fn detect_context(command: &Command) -> ExecutionContext {
    if quiet_override_enabled() {
        return ExecutionContext::Quiet;
    }

    match command {
        Command::Convert(_) => ExecutionContext::LocalDev,
        Command::Serve(_) => ExecutionContext::Server,
    }
}

fn quiet_override_enabled() -> bool {
    env::var("APIDOCS_QUIET")
        .map(|value| value.trim() == "1")
        .unwrap_or(false)
}
