use std::fs;
use std::time::Duration;
use tempfile::tempdir;
use warren_logger::{FileOutput, LevelFilter, Logger, Rotation};

#[test]
fn json_file_output_is_written() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempdir()?;
    let log_dir = tmp_dir.path().join("nested").join("logs");

    let logger = Logger::builder()
        .name("warren-file")
        .level(LevelFilter::INFO)
        .without_console()
        .file(FileOutput::new(&log_dir).rotation(Rotation::NEVER).max_files(2).json(true))
        .init()?;
    assert!(logger.writes_files());

    tracing::info!(collection = "images", "Route table compiled");
    tracing::debug!("filtered out");

    std::thread::sleep(Duration::from_millis(30));
    drop(logger);

    let log_file = fs::read_dir(&log_dir)?
        .flatten()
        .map(|entry| entry.path())
        .find(|path| path.extension().and_then(|ext| ext.to_str()) == Some("log"))
        .expect("log file should be created");

    let content = fs::read_to_string(log_file)?;
    let first = content.lines().next().expect("at least one record");
    assert!(first.starts_with('{') && first.ends_with('}'), "not a JSON record: {first}");
    assert!(first.contains("Route table compiled"));
    assert!(first.contains("\"collection\":\"images\""));
    assert!(!content.contains("filtered out"));

    Ok(())
}
