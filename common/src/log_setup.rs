use flexi_logger::{
    Cleanup, Criterion, Duplicate, FileSpec, FlexiLoggerError, Logger, LoggerHandle, Naming,
};

/// Console echo of the file log. A single stream, so every record shows up
/// on the terminal exactly once.
const CONSOLE_ECHO: Duplicate = Duplicate::All;

fn logger(base_level: &str) -> Result<Logger, FlexiLoggerError> {
    Ok(Logger::try_with_str(base_level)?
        .log_to_file(
            FileSpec::default()
                .directory("logs")
                .basename("generator"),
        )
        .duplicate_to_stdout(CONSOLE_ECHO)
        .rotate(
            Criterion::Size(1024 * 1024), //1MB
            Naming::Timestamps,
            Cleanup::KeepLogFiles(5),
        ))
}

/// Starts the global logger: rotating files under `logs/`, everything echoed
/// to stdout.
///
/// The returned handle must be kept alive for the lifetime of the program,
/// dropping it flushes and shuts the file writer down.
pub fn setup_logging(base_level: &str) -> LoggerHandle {
    logger(base_level)
        .unwrap_or_else(|e| panic!("Invalid log specification {base_level:?}: {e}"))
        .start()
        .unwrap_or_else(|e| panic!("Logger initialization failed with {e}"))
}
