use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::actions;
use crate::grid::{self, ViewWindow};
use crate::history::LocationHistory;
use crate::listing::{home_dir, Entry, ItemStyle, PaneModel};
use crate::motion;
use crate::search;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleId {
    Folder,
    SearchHighlight,
    Selection,
}

// A styling run over the pane's visible text, addressed in bytes, the way
// the render surface wants it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleRun {
    pub start: usize,
    pub len: usize,
    pub style: StyleId,
}

// The view half of a pane: viewport state plus everything derived from the
// last display pass (visible text, projections, styling runs).
pub struct PaneView {
    pub window: ViewWindow,
    pub chars_per_col: usize,
    pub num_full_columns: usize,
    full_lines: Vec<String>,
    pub sublines: Vec<String>,
    pub text: String,
    pub style_runs: Vec<StyleRun>,
    pub selection: Option<StyleRun>,
}

impl Default for PaneView {
    fn default() -> Self {
        Self::new()
    }
}

impl PaneView {
    pub fn new() -> Self {
        Self {
            window: ViewWindow::new(0, 1),
            chars_per_col: 0,
            num_full_columns: 0,
            full_lines: Vec::new(),
            sublines: Vec::new(),
            text: String::new(),
            style_runs: Vec::new(),
            selection: None,
        }
    }

    pub fn initialize(&mut self, width_chars: usize, height_rows: usize, num_columns: usize) {
        self.window = ViewWindow::new(width_chars, height_rows);
        self.window.num_columns = num_columns.max(1);
        self.chars_per_col = width_chars / self.window.num_columns;
    }

    // Re-derives everything visible. With `construct_full_lines` the layout
    // is rebuilt from scratch and the scroll position starts over; without
    // it only the viewport extraction and projections run.
    pub fn update_display(&mut self, items: &mut [Entry], construct_full_lines: bool) {
        if construct_full_lines {
            let layout = grid::layout_items(items, self.chars_per_col, self.window.height);
            self.full_lines = layout.lines;
            self.num_full_columns = layout.num_full_columns;
            self.window.left = 0;
        }

        self.sublines = grid::extract_visible_sublines(&self.full_lines, &self.window);
        for item in items.iter_mut() {
            let line = self
                .sublines
                .get(item.coords.1)
                .map(String::as_str)
                .unwrap_or("");
            item.visual = grid::project_item(item, &self.window, line);
        }
        self.text = self.sublines.join("\n");
        self.selection = None;
    }

    // Byte offset of the item's visible cell within the whole pane text.
    pub fn item_start_byte(&self, item: &Entry) -> usize {
        let row = item.coords.1;
        let mut sum = 0usize;
        for line in self.sublines.iter().take(row) {
            sum += line.len() + 1; // the newline joining the sublines
        }
        sum + item
            .visual
            .as_ref()
            .map(|visual| visual.start_byte_on_line)
            .unwrap_or(0)
    }

    pub fn apply_default_styles(&mut self, items: &[Entry]) {
        self.style_runs.clear();
        for item in items {
            let Some(visual) = item.visual.as_ref() else {
                continue;
            };
            if item.style == ItemStyle::Folder {
                let start = self.item_start_byte(item);
                self.style_runs.push(StyleRun {
                    start,
                    len: visual.vis_len_in_bytes,
                    style: StyleId::Folder,
                });
            }
        }
    }

    pub fn highlight_search_matches(&mut self, items: &[Entry], query: &str) {
        self.apply_default_styles(items);
        if query.is_empty() {
            return;
        }
        let query_chars = query.chars().count();

        for item in items {
            let Some(visual) = item.visual.as_ref() else {
                continue;
            };
            let Some(mut offset) = search::match_offset(&item.file_name, query) else {
                continue;
            };
            // The match is found in the full name but highlighted on the
            // clipped cell; a match past the visible end pins to the front.
            if offset + query_chars > visual.vis_len_in_chars {
                offset = 0;
            }

            let line = self
                .sublines
                .get(item.coords.1)
                .map(String::as_str)
                .unwrap_or("");
            let visible: String = line
                .chars()
                .skip(visual.start_char_on_line)
                .take(visual.vis_len_in_chars)
                .collect();

            let offset = offset.min(visual.vis_len_in_chars);
            let span = query_chars.min(visual.vis_len_in_chars - offset);
            if span == 0 {
                continue;
            }
            let start_byte = grid::byte_len_of_chars(&visible, offset);
            let end_byte = grid::byte_len_of_chars(&visible, offset + span);
            let start = self.item_start_byte(item) + start_byte;
            self.style_runs.push(StyleRun {
                start,
                len: end_byte - start_byte,
                style: StyleId::SearchHighlight,
            });
        }
    }

    pub fn set_selection_on_item(&mut self, item: Option<&Entry>) {
        self.selection = item.and_then(|item| {
            let visual = item.visual.as_ref()?;
            if visual.vis_len_in_bytes == 0 {
                return None;
            }
            Some(StyleRun {
                start: self.item_start_byte(item),
                len: visual.vis_len_in_bytes,
                style: StyleId::Selection,
            })
        });
    }

    pub fn move_item_into_view(&mut self, items: &mut [Entry], index: usize) {
        if index >= items.len() {
            return;
        }
        let moved = grid::move_into_view(&items[index], &mut self.window);
        if moved {
            self.update_display(items, false);
        }
    }
}

pub struct Pane {
    pub model: PaneModel,
    pub view: PaneView,
    pub history: LocationHistory,
    pub selected: usize,
    pub search_str: String,
    pub search_match: Option<usize>,
}

impl Default for Pane {
    fn default() -> Self {
        Self::new()
    }
}

impl Pane {
    pub fn new() -> Self {
        Self {
            model: PaneModel::new(),
            view: PaneView::new(),
            history: LocationHistory::new(),
            selected: 0,
            search_str: String::new(),
            search_match: None,
        }
    }

    fn num_items(&self) -> usize {
        self.model.items.len()
    }

    pub fn current_entry(&self) -> Option<&Entry> {
        self.model.items.get(self.selected)
    }

    pub fn initialize_view(&mut self, width_chars: usize, height_rows: usize, num_columns: usize) {
        self.view.initialize(width_chars, height_rows, num_columns);
        self.rebuild_view();
    }

    fn rebuild_view(&mut self) {
        self.view.update_display(&mut self.model.items, true);
        let query = self.search_str.clone();
        self.view.highlight_search_matches(&self.model.items, &query);
        self.settle_selection();
    }

    // Clamp the selection, scroll it into view if it is clipped or outside,
    // and mark it for the render surface.
    pub fn settle_selection(&mut self) {
        if self.num_items() == 0 {
            self.selected = 0;
            self.view.set_selection_on_item(None);
            return;
        }
        if self.selected >= self.num_items() {
            self.selected = self.num_items() - 1;
        }

        let fully_visible = self.model.items[self.selected]
            .visual
            .as_ref()
            .map(|visual| visual.fully_in_view)
            .unwrap_or(false);
        if !fully_visible {
            self.view
                .move_item_into_view(&mut self.model.items, self.selected);
            let query = self.search_str.clone();
            self.view.highlight_search_matches(&self.model.items, &query);
        }
        self.view
            .set_selection_on_item(self.model.items.get(self.selected));
    }

    pub fn move_selection_down(&mut self) {
        self.selected = motion::down(self.selected, self.num_items());
        self.settle_selection();
    }

    pub fn move_selection_up(&mut self) {
        self.selected = motion::up(self.selected, self.num_items());
        self.settle_selection();
    }

    pub fn move_selection_left(&mut self) {
        self.selected = motion::left(self.selected, self.num_items(), self.view.window.height);
        self.settle_selection();
    }

    pub fn move_selection_right(&mut self) {
        self.selected = motion::right(self.selected, self.num_items(), self.view.window.height);
        self.settle_selection();
    }

    pub fn move_selection_first(&mut self) {
        self.selected = 0;
        self.settle_selection();
    }

    pub fn move_selection_last(&mut self) {
        self.selected = motion::last(self.num_items());
        self.settle_selection();
    }

    fn change_dir_filtered(&mut self, path: &Path, needle: &str) -> Result<()> {
        let previous = self.model.view_filter.take();
        self.model.set_dir_filter(needle);
        if let Err(err) = self.model.fill_by_working_dir(path) {
            self.model.view_filter = previous;
            return Err(err);
        }
        self.selected = 0;
        self.history.push(self.model.working_dir.clone());
        debug!(dir = %self.model.working_dir.display(), "changed directory");
        self.rebuild_view();
        Ok(())
    }

    pub fn change_dir(&mut self, path: &Path) -> Result<()> {
        self.change_dir_filtered(path, "")
    }

    pub fn downdir(&mut self, name: &str) -> Result<()> {
        let target = self.model.working_dir.join(name);
        self.change_dir(&target)
    }

    pub fn updir(&mut self) -> Result<()> {
        let index = self.model.updir()?;
        self.selected = index;
        self.history.push(self.model.working_dir.clone());
        self.rebuild_view();
        Ok(())
    }

    pub fn go_home(&mut self) -> Result<()> {
        self.change_dir(&home_dir())
    }

    pub fn enter(&mut self) -> Result<()> {
        let Some(entry) = self.current_entry() else {
            return Ok(());
        };
        let name = entry.file_name.clone();
        let is_dir = entry.is_dir;
        let full_path = entry.full_path();

        if is_dir {
            if name == ".." {
                self.updir()
            } else {
                self.downdir(&name)
            }
        } else {
            actions::launch_associated(&full_path)
        }
    }

    // Re-lists the working directory. The selection follows the previously
    // selected name, not its old index.
    pub fn refresh(&mut self) -> Result<()> {
        let keep = self.current_entry().map(|entry| entry.file_name.clone());
        let dir = self.model.working_dir.clone();
        self.change_dir(&dir)?;
        if let Some(name) = keep {
            self.selected = self.model.index_by_name(&name);
        }
        self.settle_selection();
        Ok(())
    }

    pub fn flatten_directory(&mut self) -> Result<()> {
        self.model.flat_view = true;
        let dir = self.model.working_dir.clone();
        if let Err(err) = self.change_dir(&dir) {
            self.model.flat_view = false;
            return Err(err);
        }
        Ok(())
    }

    pub fn toggle_hidden(&mut self) -> Result<()> {
        self.model.show_hidden = !self.model.show_hidden;
        self.refresh()
    }

    pub fn start_inc_search(&mut self) {
        self.search_str.clear();
        self.search_match = None;
    }

    // One keystroke of the incremental search: find, reveal, highlight.
    pub fn incremental_search(&mut self, needle: &str) {
        self.search_str = needle.to_string();
        self.search_match = search::next_match(&self.model.items, &self.search_str, self.selected);
        if let Some(index) = self.search_match {
            self.view.move_item_into_view(&mut self.model.items, index);
        }
        let query = self.search_str.clone();
        self.view.highlight_search_matches(&self.model.items, &query);
    }

    pub fn accept_search(&mut self) {
        if let Some(index) = self.search_match {
            self.selected = index;
        }
        self.settle_selection();
    }

    pub fn cancel_search(&mut self) {
        self.search_str.clear();
        self.search_match = None;
        self.view.apply_default_styles(&self.model.items);
        self.settle_selection();
    }

    pub fn next_match(&mut self) {
        if let Some(index) =
            search::next_match(&self.model.items, &self.search_str, self.selected + 1)
        {
            self.search_match = Some(index);
            self.selected = index;
        }
        self.settle_selection();
    }

    // Ctrl+Enter in the search line: narrow the listing to the matches.
    pub fn filter_to_search_matches(&mut self) -> Result<()> {
        let dir = self.model.working_dir.clone();
        let needle = self.search_str.clone();
        self.change_dir_filtered(&dir, &needle)
    }

    pub fn history_back(&mut self) -> Result<()> {
        self.history.back();
        match self.history.current().map(Path::to_path_buf) {
            Some(path) => self.revisit(&path),
            None => Ok(()),
        }
    }

    pub fn history_forth(&mut self) -> Result<()> {
        self.history.forth();
        match self.history.current().map(Path::to_path_buf) {
            Some(path) => self.revisit(&path),
            None => Ok(()),
        }
    }

    // Like change_dir, but leaves the history position alone.
    fn revisit(&mut self, path: &Path) -> Result<()> {
        let previous = self.model.view_filter.take();
        if let Err(err) = self.model.fill_by_working_dir(path) {
            self.model.view_filter = previous;
            return Err(err);
        }
        self.selected = 0;
        self.rebuild_view();
        Ok(())
    }

    // Status bar text; the '..' pseudo-entry is excluded from the count.
    pub fn selection_info(&self) -> String {
        match self.current_entry() {
            Some(item) => format!(
                "[Folder view]: {}    {} item(s) -- '{}' in {}",
                self.model.working_dir.display(),
                self.num_items().saturating_sub(1),
                item.file_name,
                item.path.display()
            ),
            None => format!("[Folder view]: {}", self.model.working_dir.display()),
        }
    }
}
