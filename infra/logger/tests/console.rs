use warren_logger::{ConsoleFormat, LevelFilter, Logger};

#[test]
fn console_logger_writes_no_files() {
    let logger = Logger::builder()
        .name("warren-console")
        .level(LevelFilter::DEBUG)
        .directive("warren_kernel=trace")
        .console(ConsoleFormat::Json)
        .init()
        .expect("logger should initialize");

    assert_eq!(logger.name(), "warren-console");
    assert!(!logger.writes_files());
}
