use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::Context;
use tempfile::NamedTempFile;

use crate::model::{Config, Schedule};

/// Load and parse a JSON configuration file.
pub fn load_config<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
    let path = path.as_ref();
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let config: Config = serde_json::from_slice(&data)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(config)
}

/// Serialise the schedule next to the exports, atomically.
pub fn write_schedule_json<P: AsRef<Path>>(path: P, schedule: &Schedule) -> anyhow::Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_vec_pretty(schedule)?;
    let mut tmp = NamedTempFile::new_in(path.parent().unwrap_or_else(|| Path::new(".")))
        .with_context(|| "creating temp file")?;
    tmp.write_all(&json)?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).with_context(|| "atomic rename")?;
    Ok(())
}
