use apidocs::cli::{Args, Command};
use apidocs::logging::{self, ConsoleOutput};
use clap::Parser;
use std::env;
use std::fs;
use tempfile::tempdir;
use tracing::info;

// Installs the global subscriber, so this binary holds a single test.
#[test]
fn convert_logs_to_workspace_file() {
    env::remove_var("APIDOCS_QUIET");
    env::remove_var("APIDOCS_LOG_DIR");
    env::remove_var("APIDOCS_LOG_CONSOLE");
    env::remove_var("RUST_LOG");
    let workspace = tempdir().unwrap();
    let config_dir = workspace.path().join(".apidocs").join("config");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(
        config_dir.join("logging.toml"),
        "[logging]\ndefault_level = \"debug\"\nconsole_output = \"none\"\n",
    )
    .unwrap();

    let args = Args::parse_from([
        "apidocs",
        "convert",
        workspace.path().to_str().unwrap(),
        "--no-fallback",
    ]);
    assert!(matches!(args.command, Command::Convert(_)));

    let guard = logging::init(&args.command).unwrap();
    info!("convert integration event");

    assert_eq!(guard.console_output(), ConsoleOutput::None);
    let log_path = guard.log_file_path().to_path_buf();
    assert_eq!(
        log_path,
        workspace.path().join(".apidocs").join("logs").join("apidocs.log")
    );
    drop(guard);

    let contents = fs::read_to_string(log_path).unwrap();
    assert!(contents.contains("convert integration event"));

    assert!(logging::init(&args.command).is_err());
}
