//! Filtered line reading for small text files (sound lists, ini files)

use std::path::Path;
use tokio::fs;

/// Lines of `text` accepted by `filter`, without line endings
pub fn copy_lines<F>(text: &str, mut filter: F) -> Vec<String>
where
    F: FnMut(&str) -> bool,
{
    text.lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| filter(*line))
        .map(str::to_string)
        .collect()
}

/// Read `path` and keep the lines accepted by `filter`
pub async fn read_lines<P, F>(path: P, filter: F) -> std::io::Result<Vec<String>>
where
    P: AsRef<Path>,
    F: FnMut(&str) -> bool,
{
    let text = fs::read_to_string(path).await?;
    Ok(copy_lines(&text, filter))
}

/// Skips blank lines and `#` / `;` comments
pub fn skip_comments(line: &str) -> bool {
    let line = line.trim_start();
    !(line.is_empty() || line.starts_with('#') || line.starts_with(';'))
}
