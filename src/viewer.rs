use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

const VIEWER_MAX_LINES: usize = 2000;
const VIEWER_MAX_BYTES: usize = 512 * 1024;

// Content for the built-in read-only viewer overlay.
pub struct ViewerContent {
    pub title: String,
    pub body: String,
    pub truncated: bool,
}

pub fn read_viewer_content(path: &Path) -> Result<ViewerContent> {
    let title = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut reader = BufReader::new(file);
    let mut lines = Vec::new();
    let mut bytes_read = 0usize;
    let mut truncated = false;

    loop {
        if lines.len() >= VIEWER_MAX_LINES || bytes_read >= VIEWER_MAX_BYTES {
            truncated = true;
            break;
        }
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) => break,
            Ok(n) => {
                bytes_read = bytes_read.saturating_add(n);
                lines.push(line.trim_end_matches(['\r', '\n']).to_string());
            }
            Err(_) => {
                return Ok(ViewerContent {
                    title,
                    body: "<binary or unreadable file>".to_string(),
                    truncated: false,
                });
            }
        }
    }

    Ok(ViewerContent {
        title,
        body: lines.join("\n"),
        truncated,
    })
}
