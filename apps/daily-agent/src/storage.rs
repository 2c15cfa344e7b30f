use chrono::Local;
use llm_client::BoxError;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Strip characters that are unsafe in filenames on common filesystems.
pub fn sanitize_filename(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|'))
        .collect::<String>()
        .trim()
        .to_string()
}

fn now_stamp() -> String {
    Local::now().format("%Y-%m-%d_%H-%M-%S").to_string()
}

/// Write the article as a timestamped markdown file, creating the output
/// directory if missing. Returns the written path.
pub fn save_markdown(title: &str, content: &str, outdir: &Path) -> Result<PathBuf, BoxError> {
    fs::create_dir_all(outdir)?;
    let fname = format!("{}_{}.md", now_stamp(), sanitize_filename(title));
    let path = outdir.join(fname);
    fs::write(&path, content)?;
    Ok(path)
}

/// Append one JSON line to the per-day run log. Returns the log path.
pub fn append_run_log<T: Serialize>(record: &T, logdir: &Path) -> Result<PathBuf, BoxError> {
    fs::create_dir_all(logdir)?;
    let path = logdir.join(format!("{}.jsonl", Local::now().format("%Y-%m-%d")));

    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    writeln!(file, "{}", serde_json::to_string(record)?)?;
    Ok(path)
}
