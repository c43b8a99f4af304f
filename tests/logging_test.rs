use anyhow::Result;
use roster_sync::logging::init_logging_in;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_last_event_reaches_file_when_guard_drops() -> Result<()> {
    let dir = tempdir()?;
    let guard = init_logging_in(dir.path());

    tracing::error!("One or more bucket operations failed");
    drop(guard);

    let mut contents = String::new();
    for entry in fs::read_dir(dir.path())? {
        let path = entry?.path();
        if path.is_file() {
            contents.push_str(&fs::read_to_string(&path)?);
        }
    }
    assert!(contents.contains("One or more bucket operations failed"));
    assert!(contents.contains("\"level\":\"ERROR\""));
    Ok(())
}
