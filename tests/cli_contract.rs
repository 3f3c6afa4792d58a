use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn test_root(name: &str) -> PathBuf {
    let nonce = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    std::env::temp_dir().join(format!("duopane-cli-{name}-{nonce}"))
}

fn bin_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_duopane"))
}

#[test]
fn cli_prints_the_arranged_listing() {
    let root = test_root("listing");
    fs::create_dir_all(root.join("docs")).expect("create docs");
    fs::create_dir_all(root.join("art")).expect("create art");
    fs::write(root.join("beta.txt"), "b").expect("write beta");
    fs::write(root.join("alpha.txt"), "a").expect("write alpha");
    fs::write(root.join(".hidden"), "h").expect("write hidden");

    let output = Command::new(bin_path())
        .args(["--cli", root.to_string_lossy().as_ref()])
        .output()
        .expect("run cli");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, vec!["..", "art", "docs", "alpha.txt", "beta.txt"]);

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn cli_flat_listing_reaches_nested_files() {
    let root = test_root("flat");
    fs::create_dir_all(root.join("a/b")).expect("create nested");
    fs::write(root.join("a/b/deep.txt"), "d").expect("write deep");
    fs::write(root.join("top.txt"), "t").expect("write top");

    let output = Command::new(bin_path())
        .args(["--cli", "--flat", root.to_string_lossy().as_ref()])
        .output()
        .expect("run cli");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.lines().any(|line| line == "deep.txt"));
    assert!(stdout.lines().any(|line| line == "top.txt"));
    // Directories never show in the flattened listing.
    assert!(!stdout.lines().any(|line| line == "a"));

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn cli_returns_non_zero_when_root_does_not_exist() {
    let missing = test_root("missing");
    let output = Command::new(bin_path())
        .args(["--cli", missing.to_string_lossy().as_ref()])
        .output()
        .expect("run cli");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to canonicalize root"));
}
