use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::grid::VisualItem;
use crate::search;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStyle {
    Default,
    Folder,
}

// One entry of the pane listing: the filesystem-facing fields plus the
// layout fields the grid assigns. Layout offsets are absolute within the
// full-width text lines.
#[derive(Debug, Clone)]
pub struct Entry {
    pub file_name: String,
    pub path: PathBuf,
    pub is_dir: bool,
    pub is_hidden: bool,
    pub style: ItemStyle,
    pub coords: (usize, usize),
    pub start_char_on_line: usize,
    pub start_byte_on_line: usize,
    pub visible_part: String,
    pub visual: Option<VisualItem>,
}

impl Entry {
    pub fn new(file_name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            file_name: file_name.into(),
            path: path.into(),
            is_dir: false,
            is_hidden: false,
            style: ItemStyle::Default,
            coords: (0, 0),
            start_char_on_line: 0,
            start_byte_on_line: 0,
            visible_part: String::new(),
            visual: None,
        }
    }

    // `path` is the directory that contains the entry.
    pub fn full_path(&self) -> PathBuf {
        self.path.join(&self.file_name)
    }
}

pub fn home_dir() -> PathBuf {
    #[cfg(windows)]
    {
        if let Some(base) = std::env::var_os("USERPROFILE") {
            return PathBuf::from(base);
        }
    }
    #[cfg(not(windows))]
    {
        if let Some(base) = std::env::var_os("HOME") {
            return PathBuf::from(base);
        }
    }
    PathBuf::from(".")
}

pub fn collect_entries(dir: &Path, flat: bool) -> Result<Vec<Entry>> {
    if flat {
        return collect_flat(dir);
    }

    let read = fs::read_dir(dir).with_context(|| format!("failed to list {}", dir.display()))?;
    let mut out = Vec::new();
    for entry in read {
        let entry =
            entry.with_context(|| format!("failed to read an entry of {}", dir.display()))?;
        let name = entry.file_name().to_string_lossy().to_string();
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);

        let mut item = Entry::new(name, dir);
        if is_dir {
            item.is_dir = true;
            item.style = ItemStyle::Folder;
        }
        if item.file_name.starts_with('.') {
            item.is_hidden = true;
        }
        out.push(item);
    }
    Ok(out)
}

// The flattened view lists files from the whole subtree; directories are
// only traversed, never shown.
fn collect_flat(root: &Path) -> Result<Vec<Entry>> {
    let mut out = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(false)
        .min_depth(1)
        .into_iter()
        .flatten()
    {
        if entry.file_type().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        let parent = entry
            .path()
            .parent()
            .unwrap_or(root)
            .to_path_buf();
        let mut item = Entry::new(name, parent);
        if item.file_name.starts_with('.') {
            item.is_hidden = true;
        }
        out.push(item);
    }
    Ok(out)
}

// Narrows the listing to names containing the needle. Replaced wholesale on
// every search, never mutated in place.
#[derive(Debug, Clone)]
pub struct NameFilter {
    needle: String,
}

impl NameFilter {
    pub fn new(needle: impl Into<String>) -> Self {
        Self {
            needle: needle.into(),
        }
    }

    pub fn matches(&self, item: &Entry) -> bool {
        search::matches(&item.file_name, &self.needle)
    }
}

// Display order: "..", then directories by name, then files by name. Hidden
// entries drop out unless asked for; the synthetic parent entry is exempt
// from both the filter and the hidden rule and is absent at the fs root.
pub fn arrange_for_display(
    entries: Vec<Entry>,
    dir: &Path,
    show_hidden: bool,
    filter: Option<&NameFilter>,
) -> Vec<Entry> {
    let (mut dirs, mut files): (Vec<Entry>, Vec<Entry>) =
        entries.into_iter().partition(|e| e.is_dir);
    dirs.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    files.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    let mut out = Vec::with_capacity(dirs.len() + files.len() + 1);
    if dir.parent().is_some() {
        let mut dot_dot = Entry::new("..", dir);
        dot_dot.is_dir = true;
        dot_dot.style = ItemStyle::Folder;
        out.push(dot_dot);
    }

    for item in dirs.into_iter().chain(files) {
        if item.is_hidden && !show_hidden {
            continue;
        }
        if let Some(filter) = filter {
            if !filter.matches(&item) {
                continue;
            }
        }
        out.push(item);
    }
    out
}

pub struct PaneModel {
    pub working_dir: PathBuf,
    pub flat_view: bool,
    pub show_hidden: bool,
    pub view_filter: Option<NameFilter>,
    pub items: Vec<Entry>,
}

impl Default for PaneModel {
    fn default() -> Self {
        Self::new()
    }
}

impl PaneModel {
    pub fn new() -> Self {
        Self {
            working_dir: home_dir(),
            flat_view: false,
            show_hidden: false,
            view_filter: None,
            items: Vec::new(),
        }
    }

    pub fn set_dir_filter(&mut self, needle: &str) {
        self.view_filter = if needle.is_empty() {
            None
        } else {
            Some(NameFilter::new(needle))
        };
    }

    // Re-lists `dir`. On failure the previous items and working dir stay.
    pub fn fill_by_working_dir(&mut self, dir: &Path) -> Result<()> {
        let collected = collect_entries(dir, self.flat_view)?;
        let dir = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
        self.items = arrange_for_display(
            collected,
            &dir,
            self.show_hidden,
            self.view_filter.as_ref(),
        );
        self.working_dir = dir;
        debug!(
            dir = %self.working_dir.display(),
            items = self.items.len(),
            "filled pane listing"
        );
        Ok(())
    }

    pub fn index_by_name(&self, name: &str) -> usize {
        self.items
            .iter()
            .position(|item| item.file_name == name)
            .unwrap_or(0)
    }

    // Moves to the parent directory and returns the index to select: the
    // directory just left. Leaving a flattened view only unflattens.
    pub fn updir(&mut self) -> Result<usize> {
        if self.flat_view {
            self.flat_view = false;
            let dir = self.working_dir.clone();
            if let Err(err) = self.fill_by_working_dir(&dir) {
                self.flat_view = true;
                return Err(err);
            }
            return Ok(0);
        }

        self.set_dir_filter("");
        let Some(parent) = self.working_dir.parent().map(Path::to_path_buf) else {
            return Ok(0);
        };
        let old_name = self
            .working_dir
            .file_name()
            .map(|name| name.to_string_lossy().to_string());
        self.fill_by_working_dir(&parent)?;
        Ok(old_name.map(|name| self.index_by_name(&name)).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn test_root(name: &str) -> PathBuf {
        let nonce = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        std::env::temp_dir().join(format!("duopane-listing-{name}-{nonce}"))
    }

    fn seed_tree(root: &Path) {
        fs::create_dir_all(root.join("docs")).expect("create docs");
        fs::create_dir_all(root.join("art")).expect("create art");
        fs::write(root.join("beta.txt"), "b").expect("write beta");
        fs::write(root.join("alpha.txt"), "a").expect("write alpha");
        fs::write(root.join(".hidden"), "h").expect("write hidden");
    }

    #[test]
    fn arranged_listing_starts_with_dot_dot_then_dirs_then_files() {
        let root = test_root("order");
        seed_tree(&root);

        let entries = collect_entries(&root, false).expect("collect");
        let arranged = arrange_for_display(entries, &root, false, None);
        let names: Vec<&str> = arranged.iter().map(|e| e.file_name.as_str()).collect();
        assert_eq!(names, vec!["..", "art", "docs", "alpha.txt", "beta.txt"]);
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn hidden_entries_drop_out_unless_requested() {
        let root = test_root("hidden");
        seed_tree(&root);

        let entries = collect_entries(&root, false).expect("collect");
        let arranged = arrange_for_display(entries, &root, true, None);
        assert!(arranged.iter().any(|e| e.file_name == ".hidden"));
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn directories_carry_the_folder_style() {
        let root = test_root("style");
        seed_tree(&root);

        let entries = collect_entries(&root, false).expect("collect");
        let arranged = arrange_for_display(entries, &root, false, None);
        for item in &arranged {
            if item.is_dir {
                assert_eq!(item.style, ItemStyle::Folder);
            } else {
                assert_eq!(item.style, ItemStyle::Default);
            }
        }
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn dot_dot_is_absent_at_the_filesystem_root() {
        let arranged = arrange_for_display(Vec::new(), Path::new("/"), false, None);
        assert!(arranged.is_empty());
    }

    #[test]
    fn name_filter_narrows_but_keeps_dot_dot() {
        let root = test_root("filter");
        seed_tree(&root);

        let entries = collect_entries(&root, false).expect("collect");
        let filter = NameFilter::new("alpha");
        let arranged = arrange_for_display(entries, &root, false, Some(&filter));
        let names: Vec<&str> = arranged.iter().map(|e| e.file_name.as_str()).collect();
        assert_eq!(names, vec!["..", "alpha.txt"]);
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn flat_collection_lists_nested_files_only() {
        let root = test_root("flat");
        fs::create_dir_all(root.join("a/b")).expect("create nested");
        fs::write(root.join("top.txt"), "t").expect("write top");
        fs::write(root.join("a/b/deep.txt"), "d").expect("write deep");

        let entries = collect_entries(&root, true).expect("collect flat");
        let names: Vec<&str> = entries.iter().map(|e| e.file_name.as_str()).collect();
        assert!(names.contains(&"top.txt"));
        assert!(names.contains(&"deep.txt"));
        assert!(!entries.iter().any(|e| e.is_dir));
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn flat_entries_remember_their_containing_directory() {
        let root = test_root("flat-path");
        fs::create_dir_all(root.join("inner")).expect("create inner");
        fs::write(root.join("inner/leaf.txt"), "x").expect("write leaf");

        let entries = collect_entries(&root, true).expect("collect flat");
        let leaf = entries
            .iter()
            .find(|e| e.file_name == "leaf.txt")
            .expect("leaf listed");
        assert!(leaf.full_path().ends_with("inner/leaf.txt"));
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn fill_failure_leaves_the_model_untouched() {
        let root = test_root("fill-fail");
        seed_tree(&root);

        let mut model = PaneModel::new();
        model.fill_by_working_dir(&root).expect("fill");
        let before = model.items.len();
        let missing = root.join("no_such_subdir");

        assert!(model.fill_by_working_dir(&missing).is_err());
        assert_eq!(model.items.len(), before);
        assert_eq!(model.working_dir, root.canonicalize().expect("canon"));
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn updir_selects_the_directory_just_left() {
        let root = test_root("updir");
        seed_tree(&root);

        let mut model = PaneModel::new();
        model
            .fill_by_working_dir(&root.join("docs"))
            .expect("fill child");
        let index = model.updir().expect("updir");
        assert_eq!(model.items[index].file_name, "docs");
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn updir_from_flat_view_only_unflattens() {
        let root = test_root("updir-flat");
        seed_tree(&root);

        let mut model = PaneModel::new();
        model.flat_view = true;
        model.fill_by_working_dir(&root).expect("fill flat");
        let index = model.updir().expect("updir");
        assert_eq!(index, 0);
        assert!(!model.flat_view);
        assert_eq!(model.working_dir, root.canonicalize().expect("canon"));
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn index_by_name_defaults_to_zero_for_missing_names() {
        let mut model = PaneModel::new();
        model.items = vec![Entry::new("a", "/tmp"), Entry::new("b", "/tmp")];
        assert_eq!(model.index_by_name("b"), 1);
        assert_eq!(model.index_by_name("gone"), 0);
    }

    #[test]
    fn set_dir_filter_replaces_the_predicate_wholesale() {
        let mut model = PaneModel::new();
        model.set_dir_filter("abc");
        assert!(model.view_filter.is_some());
        model.set_dir_filter("");
        assert!(model.view_filter.is_none());
    }
}
