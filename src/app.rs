use eframe::egui;
use std::fs;
use std::path::PathBuf;
use tracing::warn;

use crate::actions;
use crate::config::{resolve_color, AppConfig};
use crate::keymap::{Action, Keymap};
use crate::pane::{Pane, StyleId, StyleRun};
use crate::viewer::{self, ViewerContent};

pub fn configure_egui_fonts(ctx: &egui::Context) {
    let mut fonts = egui::FontDefinitions::default();

    // The grid renders filenames in the monospace family; without a CJK
    // fallback those names come out as boxes.
    if let Some(font_bytes) = load_cjk_font_bytes() {
        let font_name = "cjk_fallback".to_string();
        fonts
            .font_data
            .insert(font_name.clone(), egui::FontData::from_owned(font_bytes));
        if let Some(family) = fonts.families.get_mut(&egui::FontFamily::Monospace) {
            family.push(font_name.clone());
        }
        if let Some(family) = fonts.families.get_mut(&egui::FontFamily::Proportional) {
            family.push(font_name);
        }
    }

    ctx.set_fonts(fonts);
}

fn load_cjk_font_bytes() -> Option<Vec<u8>> {
    let mut candidates: Vec<&str> = Vec::new();

    #[cfg(windows)]
    {
        candidates.extend([
            r"C:\Windows\Fonts\meiryo.ttc",
            r"C:\Windows\Fonts\msgothic.ttc",
            r"C:\Windows\Fonts\MSYH.TTC",
        ]);
    }

    #[cfg(target_os = "macos")]
    {
        candidates.extend([
            "/System/Library/Fonts/Hiragino Sans GB.ttc",
            "/System/Library/Fonts/STHeiti Light.ttc",
        ]);
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    {
        candidates.extend([
            "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
            "/usr/share/fonts/truetype/noto/NotoSansCJK-Regular.ttc",
            "/usr/share/fonts/opentype/noto/NotoSansJP-Regular.otf",
        ]);
    }

    candidates.into_iter().find_map(|path| fs::read(path).ok())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SplitMode {
    Vertical,
    Horizontal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActiveSide {
    Left,
    Right,
}

pub struct DuopaneApp {
    config: AppConfig,
    keymap: Keymap,
    left: Pane,
    right: Pane,
    active: ActiveSide,
    split_mode: SplitMode,
    command_buffer: String,
    command_active: bool,
    status_text: String,
    viewer: Option<ViewerContent>,
    focus_command_requested: bool,
    last_geometry: Option<(usize, usize, usize)>,
}

impl DuopaneApp {
    pub fn new(config: AppConfig, keymap: Keymap, left_dir: PathBuf, right_dir: PathBuf) -> Self {
        let mut app = Self {
            config,
            keymap,
            left: Pane::new(),
            right: Pane::new(),
            active: ActiveSide::Left,
            split_mode: SplitMode::Vertical,
            command_buffer: String::new(),
            command_active: false,
            status_text: String::new(),
            viewer: None,
            focus_command_requested: false,
            last_geometry: None,
        };
        if let Err(err) = app.left.change_dir(&left_dir) {
            app.status_text = err.to_string();
        }
        if let Err(err) = app.right.change_dir(&right_dir) {
            app.status_text = err.to_string();
        }
        if app.status_text.is_empty() {
            app.refresh_status_line();
        }
        app
    }

    fn active_pane_mut(&mut self) -> &mut Pane {
        match self.active {
            ActiveSide::Left => &mut self.left,
            ActiveSide::Right => &mut self.right,
        }
    }

    fn active_pane(&self) -> &Pane {
        match self.active {
            ActiveSide::Left => &self.left,
            ActiveSide::Right => &self.right,
        }
    }

    fn num_columns(&self) -> usize {
        match self.split_mode {
            SplitMode::Vertical => self.config.general.columns_vertical,
            SplitMode::Horizontal => self.config.general.columns_horizontal,
        }
    }

    fn refresh_status_line(&mut self) {
        self.status_text = self.active_pane().selection_info();
    }

    fn run_action(&mut self, action: Action, ctx: &egui::Context) {
        let result = match action {
            Action::Quit => {
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                Ok(())
            }
            Action::SwitchPane => {
                self.active = match self.active {
                    ActiveSide::Left => ActiveSide::Right,
                    ActiveSide::Right => ActiveSide::Left,
                };
                Ok(())
            }
            Action::SwitchSplittingMode => {
                self.split_mode = match self.split_mode {
                    SplitMode::Vertical => SplitMode::Horizontal,
                    SplitMode::Horizontal => SplitMode::Vertical,
                };
                // Geometry changes take effect on the next frame.
                self.last_geometry = None;
                Ok(())
            }
            Action::StartIncSearch => {
                self.command_buffer = "/".to_string();
                self.command_active = true;
                self.focus_command_requested = true;
                self.active_pane_mut().start_inc_search();
                Ok(())
            }
            Action::StartViewer => self.open_viewer(),
            Action::StartEditor => self.open_editor(),
            Action::Enter => self.active_pane_mut().enter(),
            Action::Updir => self.active_pane_mut().updir(),
            Action::GoHome => self.active_pane_mut().go_home(),
            Action::Refresh => self.active_pane_mut().refresh(),
            Action::FlattenDirectory => self.active_pane_mut().flatten_directory(),
            Action::ToggleHidden => self.active_pane_mut().toggle_hidden(),
            Action::HistoryBack => self.active_pane_mut().history_back(),
            Action::HistoryForth => self.active_pane_mut().history_forth(),
            Action::NextMatch => {
                self.active_pane_mut().next_match();
                Ok(())
            }
            Action::MoveSelectionDown => {
                self.active_pane_mut().move_selection_down();
                Ok(())
            }
            Action::MoveSelectionUp => {
                self.active_pane_mut().move_selection_up();
                Ok(())
            }
            Action::MoveSelectionLeft => {
                self.active_pane_mut().move_selection_left();
                Ok(())
            }
            Action::MoveSelectionRight => {
                self.active_pane_mut().move_selection_right();
                Ok(())
            }
            Action::MoveSelectionFirst => {
                self.active_pane_mut().move_selection_first();
                Ok(())
            }
            Action::MoveSelectionLast => {
                self.active_pane_mut().move_selection_last();
                Ok(())
            }
        };

        match result {
            Ok(()) => self.refresh_status_line(),
            Err(err) => {
                warn!(error = %err, "action failed");
                self.status_text = err.to_string();
            }
        }
    }

    fn open_viewer(&mut self) -> anyhow::Result<()> {
        let Some(entry) = self.active_pane().current_entry() else {
            return Ok(());
        };
        if entry.is_dir {
            return Ok(());
        }
        let content = viewer::read_viewer_content(&entry.full_path())?;
        self.viewer = Some(content);
        Ok(())
    }

    fn open_editor(&mut self) -> anyhow::Result<()> {
        let Some(entry) = self.active_pane().current_entry() else {
            return Ok(());
        };
        let path = entry.full_path();
        actions::launch_editor(&self.config.general.editor, &path)
    }

    fn handle_pane_keys(&mut self, ctx: &egui::Context) {
        let events = ctx.input(|i| i.events.clone());
        let mut pending = Vec::new();
        for event in &events {
            if let egui::Event::Key {
                key,
                pressed: true,
                modifiers,
                ..
            } = event
            {
                if let Some(action) = self.keymap.lookup(*key, *modifiers) {
                    pending.push(action);
                }
            }
        }
        for action in pending {
            self.run_action(action, ctx);
        }
    }

    // The search line keeps its leading '/'. Enter accepts, Ctrl+Enter
    // filters the listing to the matches, Escape (or erasing the '/')
    // cancels.
    fn handle_command_keys(&mut self, ctx: &egui::Context) {
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.finish_search(true);
            return;
        }
        if ctx.input(|i| i.key_pressed(egui::Key::Enter)) {
            let filter = ctx.input(|i| i.modifiers.ctrl || i.modifiers.command);
            if filter {
                if let Err(err) = self.active_pane_mut().filter_to_search_matches() {
                    self.status_text = err.to_string();
                }
            } else {
                self.active_pane_mut().accept_search();
            }
            self.finish_search(false);
        }
    }

    fn finish_search(&mut self, cancelled: bool) {
        if cancelled {
            self.active_pane_mut().cancel_search();
        }
        self.command_active = false;
        self.command_buffer.clear();
        self.refresh_status_line();
    }

    fn on_command_changed(&mut self) {
        if !self.command_active {
            return;
        }
        match self.command_buffer.strip_prefix('/') {
            Some(needle) => {
                let needle = needle.to_string();
                self.active_pane_mut().incremental_search(&needle);
            }
            // The '/' itself was erased.
            None => self.finish_search(true),
        }
    }

    fn sync_geometry(&mut self, ctx: &egui::Context, pane_size: egui::Vec2) {
        let font_id = egui::FontId::monospace(self.config.general.font_size);
        let (char_width, row_height) =
            ctx.fonts(|f| (f.glyph_width(&font_id, 'a'), f.row_height(&font_id)));
        if char_width <= 0.0 || row_height <= 0.0 {
            return;
        }

        let width_chars = (pane_size.x / char_width).floor() as usize;
        let height_rows = ((pane_size.y / row_height).floor() as usize).max(1);
        let geometry = (width_chars, height_rows, self.num_columns());
        if self.last_geometry == Some(geometry) {
            return;
        }
        self.last_geometry = Some(geometry);
        self.left
            .initialize_view(width_chars, height_rows, geometry.2);
        self.right
            .initialize_view(width_chars, height_rows, geometry.2);
    }

    fn pane_layout_job(&self, pane: &Pane, is_active: bool) -> egui::text::LayoutJob {
        build_layout_job(
            &pane.view.text,
            &pane.view.style_runs,
            pane.view.selection,
            &self.config,
            is_active,
        )
    }

    fn show_viewer(&mut self, ctx: &egui::Context) {
        let Some(content) = &self.viewer else {
            return;
        };
        let mut open = true;
        let title = if content.truncated {
            format!("{} (truncated)", content.title)
        } else {
            content.title.clone()
        };
        let body = content.body.clone();
        egui::Window::new(title)
            .open(&mut open)
            .default_size(egui::vec2(640.0, 480.0))
            .show(ctx, |ui| {
                egui::ScrollArea::both().show(ui, |ui| {
                    ui.add(
                        egui::Label::new(egui::RichText::new(body).monospace())
                            .wrap_mode(egui::TextWrapMode::Extend),
                    );
                });
            });
        if !open {
            self.viewer = None;
        }
    }
}

// Turns byte-addressed style runs into contiguous layout sections. Later
// concerns win where runs overlap: selection over search over folder.
fn build_layout_job(
    text: &str,
    runs: &[StyleRun],
    selection: Option<StyleRun>,
    config: &AppConfig,
    is_active: bool,
) -> egui::text::LayoutJob {
    use egui::text::{LayoutJob, LayoutSection, TextFormat};

    let theme = &config.theme;
    let font_id = egui::FontId::monospace(config.general.font_size);

    let format_for = |style: Option<StyleId>| -> TextFormat {
        let mut format = TextFormat {
            font_id: font_id.clone(),
            color: resolve_color(&theme.default_text),
            ..Default::default()
        };
        match style {
            None => {}
            Some(StyleId::Folder) => {
                format.color = resolve_color(&theme.folder);
            }
            Some(StyleId::SearchHighlight) => {
                format.color = resolve_color(&theme.search_highlight_fore);
                format.background = resolve_color(&theme.search_highlight_back);
            }
            Some(StyleId::Selection) => {
                format.color = resolve_color(&theme.selection_fore);
                format.background = if is_active {
                    resolve_color(&theme.selection_back)
                } else {
                    resolve_color(&theme.selection_inactive)
                };
            }
        }
        format
    };

    let len = text.len();
    let mut bounds = vec![0, len];
    for run in runs.iter().chain(selection.iter()) {
        bounds.push(run.start.min(len));
        bounds.push((run.start + run.len).min(len));
    }
    bounds.sort_unstable();
    bounds.dedup();

    let covers = |run: &StyleRun, at: usize| at >= run.start && at < run.start + run.len;
    let style_at = |at: usize| -> Option<StyleId> {
        if let Some(sel) = selection {
            if covers(&sel, at) {
                return Some(StyleId::Selection);
            }
        }
        if let Some(run) = runs
            .iter()
            .find(|run| run.style == StyleId::SearchHighlight && covers(run, at))
        {
            return Some(run.style);
        }
        runs.iter().find(|run| covers(run, at)).map(|run| run.style)
    };

    let mut sections = Vec::new();
    for pair in bounds.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        if start >= end {
            continue;
        }
        sections.push(LayoutSection {
            leading_space: 0.0,
            byte_range: start..end,
            format: format_for(style_at(start)),
        });
    }

    LayoutJob {
        text: text.to_string(),
        sections,
        break_on_newline: true,
        ..Default::default()
    }
}

impl eframe::App for DuopaneApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.viewer.is_some() {
            if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
                self.viewer = None;
            }
        } else if self.command_active {
            self.handle_command_keys(ctx);
        } else if !ctx.wants_keyboard_input() {
            self.handle_pane_keys(ctx);
        }

        egui::TopBottomPanel::bottom("status-bar")
            .resizable(false)
            .exact_height(24.0)
            .show(ctx, |ui| {
                ui.add(egui::Label::new(&self.status_text).truncate());
            });

        egui::TopBottomPanel::bottom("command-line")
            .resizable(false)
            .show(ctx, |ui| {
                let command_id = ui.make_persistent_id("command-input");
                let output = egui::TextEdit::singleline(&mut self.command_buffer)
                    .id(command_id)
                    .desired_width(f32::INFINITY)
                    .font(egui::TextStyle::Monospace)
                    .hint_text("/ starts incremental search")
                    .show(ui);
                if self.focus_command_requested {
                    output.response.request_focus();
                    self.focus_command_requested = false;
                }
                if output.response.changed() {
                    self.on_command_changed();
                }
                if !self.command_active && output.response.has_focus() {
                    output.response.surrender_focus();
                }
            });

        let background = resolve_color(&self.config.theme.background);
        egui::CentralPanel::default()
            .frame(egui::Frame::central_panel(&ctx.style()).fill(background))
            .show(ctx, |ui| {
                let available = ui.available_size();
                let pane_size = match self.split_mode {
                    SplitMode::Vertical => egui::vec2(available.x / 2.0, available.y),
                    SplitMode::Horizontal => egui::vec2(available.x, available.y / 2.0),
                };
                self.sync_geometry(ctx, pane_size);

                let left_job = self.pane_layout_job(&self.left, self.active == ActiveSide::Left);
                let right_job =
                    self.pane_layout_job(&self.right, self.active == ActiveSide::Right);

                let mut clicked: Option<ActiveSide> = None;
                let mut add_pane = |ui: &mut egui::Ui,
                                    job: egui::text::LayoutJob,
                                    side: ActiveSide| {
                    let response = ui.add(
                        egui::Label::new(job)
                            .wrap_mode(egui::TextWrapMode::Extend)
                            .sense(egui::Sense::click()),
                    );
                    if response.clicked() {
                        clicked = Some(side);
                    }
                };

                match self.split_mode {
                    SplitMode::Vertical => {
                        ui.columns(2, |columns| {
                            add_pane(&mut columns[0], left_job, ActiveSide::Left);
                            add_pane(&mut columns[1], right_job, ActiveSide::Right);
                        });
                    }
                    SplitMode::Horizontal => {
                        ui.allocate_ui(pane_size, |ui| {
                            add_pane(ui, left_job, ActiveSide::Left);
                        });
                        ui.separator();
                        ui.allocate_ui(ui.available_size(), |ui| {
                            add_pane(ui, right_job, ActiveSide::Right);
                        });
                    }
                }

                if let Some(side) = clicked {
                    self.active = side;
                    self.refresh_status_line();
                }
            });

        self.show_viewer(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::Keymap;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn test_root(name: &str) -> PathBuf {
        let nonce = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        std::env::temp_dir().join(format!("duopane-app-{name}-{nonce}"))
    }

    fn test_app(root: &std::path::Path) -> DuopaneApp {
        let keymap = Keymap::load(None).expect("default keymap");
        DuopaneApp::new(
            AppConfig::default(),
            keymap,
            root.to_path_buf(),
            root.to_path_buf(),
        )
    }

    #[test]
    fn new_app_lists_both_panes() {
        let root = test_root("new");
        fs::create_dir_all(&root).expect("create root");
        fs::write(root.join("a.txt"), "x").expect("write file");

        let app = test_app(&root);
        assert!(!app.left.model.items.is_empty());
        assert!(!app.right.model.items.is_empty());
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn command_change_routes_to_incremental_search() {
        let root = test_root("command");
        fs::create_dir_all(&root).expect("create root");
        fs::write(root.join("match_me.txt"), "x").expect("write file");

        let mut app = test_app(&root);
        app.command_active = true;
        app.command_buffer = "/match".to_string();
        app.on_command_changed();

        assert_eq!(app.active_pane().search_str, "match");
        assert!(app.active_pane().search_match.is_some());
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn erasing_the_slash_cancels_the_search() {
        let root = test_root("cancel");
        fs::create_dir_all(&root).expect("create root");

        let mut app = test_app(&root);
        app.command_active = true;
        app.command_buffer = String::new();
        app.on_command_changed();

        assert!(!app.command_active);
        assert!(app.active_pane().search_str.is_empty());
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn layout_sections_cover_the_whole_text_in_order() {
        let text = "folder1  folder2  file3";
        let runs = vec![
            StyleRun {
                start: 0,
                len: 7,
                style: StyleId::Folder,
            },
            StyleRun {
                start: 9,
                len: 7,
                style: StyleId::Folder,
            },
        ];
        let selection = Some(StyleRun {
            start: 9,
            len: 7,
            style: StyleId::Selection,
        });

        let job = build_layout_job(text, &runs, selection, &AppConfig::default(), true);
        assert_eq!(job.text, text);
        let mut cursor = 0;
        for section in &job.sections {
            assert_eq!(section.byte_range.start, cursor);
            cursor = section.byte_range.end;
        }
        assert_eq!(cursor, text.len());
    }

    #[test]
    fn selection_wins_over_overlapping_runs() {
        let text = "abcdef";
        let runs = vec![StyleRun {
            start: 0,
            len: 6,
            style: StyleId::Folder,
        }];
        let selection = Some(StyleRun {
            start: 2,
            len: 2,
            style: StyleId::Selection,
        });

        let config = AppConfig::default();
        let job = build_layout_job(text, &runs, selection, &config, true);
        let selected = job
            .sections
            .iter()
            .find(|s| s.byte_range == (2..4))
            .expect("selection section");
        assert_eq!(
            selected.format.background,
            resolve_color(&config.theme.selection_back)
        );
    }

    #[test]
    fn inactive_pane_uses_the_inactive_selection_color() {
        let text = "abcdef";
        let selection = Some(StyleRun {
            start: 0,
            len: 3,
            style: StyleId::Selection,
        });

        let config = AppConfig::default();
        let job = build_layout_job(text, &[], selection, &config, false);
        let selected = job
            .sections
            .iter()
            .find(|s| s.byte_range == (0..3))
            .expect("selection section");
        assert_eq!(
            selected.format.background,
            resolve_color(&config.theme.selection_inactive)
        );
    }
}
