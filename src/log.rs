use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

use chrono::Utc;
use huffpress::Summary;
use serde::Serialize;

#[derive(Serialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub action: String,
    pub input: String,
    pub output: String,
    #[serde(flatten)]
    pub summary: Summary,
}

impl LogEntry {
    pub fn new(action: &str, input: &Path, output: &Path, summary: Summary) -> Self {
        LogEntry {
            timestamp: Utc::now().to_rfc3339(),
            action: action.to_string(),
            input: input.display().to_string(),
            output: output.display().to_string(),
            summary,
        }
    }
}

/// Append one JSON line describing a finished command to `log`.
pub fn log_action(log: &Path, entry: &LogEntry) -> io::Result<()> {
    let json = serde_json::to_string(entry).map_err(io::Error::other)?;

    let mut file = OpenOptions::new().create(true).append(true).open(log)?;

    writeln!(file, "{}", json)
}
