use anyhow::{Context, Result};
use std::path::Path;
use std::process::Command;
use tracing::debug;

// Extension associations for the launcher. Anything unlisted goes through
// the platform opener instead.
pub fn resolve_command_for_ext(ext: &str) -> Option<&'static str> {
    let program = match ext {
        "wmv" | "mpeg" | "mpg" | "avi" | "asf" => "mplayer",
        "pdf" | "ps" => "evince",
        "jpg" | "jpeg" | "png" | "bmp" | "xpm" | "gif" => "gqview",
        "rar" | "zip" | "gz" | "tar" => "file-roller",
        "txt" => "gvim",
        _ => return None,
    };
    Some(program)
}

// Spawn and forget: the launched program's fate is not ours to watch.
pub fn launch_associated(path: &Path) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase());
    let Some(program) = ext.as_deref().and_then(resolve_command_for_ext) else {
        return open_with_default(path);
    };

    debug!(program, path = %path.display(), "launching associated program");
    Command::new(program)
        .arg(path)
        .spawn()
        .with_context(|| format!("failed to launch {} for {}", program, path.display()))?;
    Ok(())
}

pub fn launch_editor(editor: &str, path: &Path) -> Result<()> {
    debug!(editor, path = %path.display(), "launching editor");
    Command::new(editor)
        .arg(path)
        .spawn()
        .with_context(|| format!("failed to start editor {} for {}", editor, path.display()))?;
    Ok(())
}

pub fn open_with_default(path: &Path) -> Result<()> {
    #[cfg(target_os = "windows")]
    {
        Command::new("cmd")
            .args(["/C", "start", "", &path.to_string_lossy()])
            .spawn()
            .with_context(|| format!("failed to open {}", path.display()))?;
        return Ok(());
    }
    #[cfg(target_os = "macos")]
    {
        Command::new("open")
            .arg(path)
            .spawn()
            .with_context(|| format!("failed to open {}", path.display()))?;
        return Ok(());
    }
    #[cfg(all(unix, not(target_os = "macos")))]
    {
        Command::new("xdg-open")
            .arg(path)
            .spawn()
            .with_context(|| format!("failed to open {}", path.display()))?;
        return Ok(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_extensions_resolve_to_their_programs() {
        assert_eq!(resolve_command_for_ext("pdf"), Some("evince"));
        assert_eq!(resolve_command_for_ext("avi"), Some("mplayer"));
        assert_eq!(resolve_command_for_ext("png"), Some("gqview"));
        assert_eq!(resolve_command_for_ext("zip"), Some("file-roller"));
        assert_eq!(resolve_command_for_ext("txt"), Some("gvim"));
    }

    #[test]
    fn unknown_extensions_have_no_association() {
        assert_eq!(resolve_command_for_ext("xyz"), None);
        assert_eq!(resolve_command_for_ext(""), None);
    }

    #[test]
    fn missing_editor_binary_reports_an_error() {
        let err = launch_editor(
            "duopane-no-such-editor-binary",
            Path::new("/tmp/whatever.txt"),
        )
        .expect_err("spawn must fail");
        assert!(err.to_string().contains("failed to start editor"));
    }
}
