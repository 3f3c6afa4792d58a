use anyhow::{bail, Context, Result};
use eframe::egui::{Key, Modifiers};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

// The closed set of bindable commands. Config names are the snake_case
// variants used in DEFAULT_KEYS below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Enter,
    Updir,
    GoHome,
    Refresh,
    FlattenDirectory,
    ToggleHidden,
    SwitchPane,
    SwitchSplittingMode,
    MoveSelectionDown,
    MoveSelectionUp,
    MoveSelectionLeft,
    MoveSelectionRight,
    MoveSelectionFirst,
    MoveSelectionLast,
    StartIncSearch,
    NextMatch,
    StartEditor,
    StartViewer,
    HistoryBack,
    HistoryForth,
}

impl Action {
    pub fn from_name(name: &str) -> Option<Action> {
        let action = match name {
            "quit" => Action::Quit,
            "enter" => Action::Enter,
            "updir" => Action::Updir,
            "go_home" => Action::GoHome,
            "refresh" => Action::Refresh,
            "flatten_directory" => Action::FlattenDirectory,
            "toggle_hidden" => Action::ToggleHidden,
            "switch_pane" => Action::SwitchPane,
            "switch_splitting_mode" => Action::SwitchSplittingMode,
            "move_selection_down" => Action::MoveSelectionDown,
            "move_selection_up" => Action::MoveSelectionUp,
            "move_selection_left" => Action::MoveSelectionLeft,
            "move_selection_right" => Action::MoveSelectionRight,
            "move_selection_first" => Action::MoveSelectionFirst,
            "move_selection_last" => Action::MoveSelectionLast,
            "start_inc_search" => Action::StartIncSearch,
            "next_match" => Action::NextMatch,
            "start_editor" => Action::StartEditor,
            "start_viewer" => Action::StartViewer,
            "history_back" => Action::HistoryBack,
            "history_forth" => Action::HistoryForth,
            _ => return None,
        };
        Some(action)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyChord {
    pub key: Key,
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
}

pub const DEFAULT_KEYS: &str = "\
# command: binding, binding ...
quit: q
enter: enter
updir: backspace, u
go_home: ~
refresh: C-r
flatten_directory: C-f
toggle_hidden: C-h
switch_pane: tab
switch_splitting_mode: C-t
move_selection_down: j, down
move_selection_up: k, up
move_selection_left: h, left
move_selection_right: l, right
move_selection_first: g, 0, home
move_selection_last: G, 9, end
start_inc_search: /
next_match: n
start_editor: e
start_viewer: v
history_back: C-o
history_forth: C-i
";

#[derive(Debug)]
pub struct Keymap {
    bindings: HashMap<KeyChord, Action>,
}

impl Keymap {
    // No file means the built-in table; a user file replaces it wholesale.
    pub fn load(path: Option<&Path>) -> Result<Keymap> {
        match path {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("failed to read key bindings {}", path.display()))?;
                Self::parse(&text)
            }
            None => Self::parse(DEFAULT_KEYS),
        }
    }

    // Every command name and binding is validated here; a bad line fails the
    // whole load instead of being skipped silently.
    pub fn parse(text: &str) -> Result<Keymap> {
        let mut bindings = HashMap::new();
        for (line_index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((command, specs)) = line.split_once(':') else {
                bail!(
                    "key binding line {} has no ':' separator: '{}'",
                    line_index + 1,
                    line
                );
            };
            let command = command.trim();
            let Some(action) = Action::from_name(command) else {
                bail!("key binding error: no such command \"{}\"", command);
            };
            for spec in specs.split(',') {
                let spec = spec.trim();
                let chord = parse_key_spec(spec).with_context(|| {
                    format!("failed to parse binding '{}' for command {}", spec, command)
                })?;
                bindings.insert(chord, action);
            }
        }
        Ok(Keymap { bindings })
    }

    pub fn lookup(&self, key: Key, modifiers: Modifiers) -> Option<Action> {
        let chord = KeyChord {
            key,
            ctrl: modifiers.ctrl || modifiers.command,
            alt: modifiers.alt,
            shift: modifiers.shift,
        };
        self.bindings.get(&chord).copied()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

fn parse_key_spec(spec: &str) -> Result<KeyChord> {
    if let Some(rest) = spec.strip_prefix("C-") {
        let mut chord = parse_key_spec(rest)?;
        chord.ctrl = true;
        return Ok(chord);
    }
    if let Some(rest) = spec.strip_prefix("S-") {
        let mut chord = parse_key_spec(rest)?;
        chord.shift = true;
        return Ok(chord);
    }
    for prefix in ["A-", "M-"] {
        if let Some(rest) = spec.strip_prefix(prefix) {
            let mut chord = parse_key_spec(rest)?;
            chord.alt = true;
            return Ok(chord);
        }
    }

    let mut chars = spec.chars();
    if let (Some(single), None) = (chars.next(), chars.next()) {
        if let Some((key, shift)) = key_for_char(single) {
            return Ok(KeyChord {
                key,
                ctrl: false,
                alt: false,
                shift,
            });
        }
        bail!("failed to parse key '{}'", spec);
    }

    let lower = spec.to_ascii_lowercase();
    let named = match lower.as_str() {
        "esc" | "escape" => Some(Key::Escape),
        "space" => Some(Key::Space),
        "tab" => Some(Key::Tab),
        "enter" | "return" => Some(Key::Enter),
        "backspace" => Some(Key::Backspace),
        "delete" | "del" => Some(Key::Delete),
        "insert" => Some(Key::Insert),
        "home" => Some(Key::Home),
        "end" => Some(Key::End),
        "pageup" => Some(Key::PageUp),
        "pagedown" => Some(Key::PageDown),
        "up" => Some(Key::ArrowUp),
        "down" => Some(Key::ArrowDown),
        "left" => Some(Key::ArrowLeft),
        "right" => Some(Key::ArrowRight),
        _ => None,
    };
    if let Some(key) = named {
        return Ok(KeyChord {
            key,
            ctrl: false,
            alt: false,
            shift: false,
        });
    }

    if let Some(number) = lower.strip_prefix('f') {
        let key = number.parse::<u8>().ok().and_then(function_key);
        if let Some(key) = key {
            return Ok(KeyChord {
                key,
                ctrl: false,
                alt: false,
                shift: false,
            });
        }
    }

    bail!("failed to parse event '{}'", spec)
}

fn key_for_char(c: char) -> Option<(Key, bool)> {
    let plain = |key| Some((key, false));
    let shifted = |key| Some((key, true));
    match c {
        'a' | 'A' => Some((Key::A, c.is_ascii_uppercase())),
        'b' | 'B' => Some((Key::B, c.is_ascii_uppercase())),
        'c' | 'C' => Some((Key::C, c.is_ascii_uppercase())),
        'd' | 'D' => Some((Key::D, c.is_ascii_uppercase())),
        'e' | 'E' => Some((Key::E, c.is_ascii_uppercase())),
        'f' | 'F' => Some((Key::F, c.is_ascii_uppercase())),
        'g' | 'G' => Some((Key::G, c.is_ascii_uppercase())),
        'h' | 'H' => Some((Key::H, c.is_ascii_uppercase())),
        'i' | 'I' => Some((Key::I, c.is_ascii_uppercase())),
        'j' | 'J' => Some((Key::J, c.is_ascii_uppercase())),
        'k' | 'K' => Some((Key::K, c.is_ascii_uppercase())),
        'l' | 'L' => Some((Key::L, c.is_ascii_uppercase())),
        'm' | 'M' => Some((Key::M, c.is_ascii_uppercase())),
        'n' | 'N' => Some((Key::N, c.is_ascii_uppercase())),
        'o' | 'O' => Some((Key::O, c.is_ascii_uppercase())),
        'p' | 'P' => Some((Key::P, c.is_ascii_uppercase())),
        'q' | 'Q' => Some((Key::Q, c.is_ascii_uppercase())),
        'r' | 'R' => Some((Key::R, c.is_ascii_uppercase())),
        's' | 'S' => Some((Key::S, c.is_ascii_uppercase())),
        't' | 'T' => Some((Key::T, c.is_ascii_uppercase())),
        'u' | 'U' => Some((Key::U, c.is_ascii_uppercase())),
        'v' | 'V' => Some((Key::V, c.is_ascii_uppercase())),
        'w' | 'W' => Some((Key::W, c.is_ascii_uppercase())),
        'x' | 'X' => Some((Key::X, c.is_ascii_uppercase())),
        'y' | 'Y' => Some((Key::Y, c.is_ascii_uppercase())),
        'z' | 'Z' => Some((Key::Z, c.is_ascii_uppercase())),
        '0' => plain(Key::Num0),
        '1' => plain(Key::Num1),
        '2' => plain(Key::Num2),
        '3' => plain(Key::Num3),
        '4' => plain(Key::Num4),
        '5' => plain(Key::Num5),
        '6' => plain(Key::Num6),
        '7' => plain(Key::Num7),
        '8' => plain(Key::Num8),
        '9' => plain(Key::Num9),
        '`' => plain(Key::Backtick),
        '-' => plain(Key::Minus),
        '=' => plain(Key::Equals),
        '[' => plain(Key::OpenBracket),
        ']' => plain(Key::CloseBracket),
        '\\' => plain(Key::Backslash),
        ';' => plain(Key::Semicolon),
        '\'' => plain(Key::Quote),
        ',' => plain(Key::Comma),
        '.' => plain(Key::Period),
        '/' => plain(Key::Slash),
        '~' => shifted(Key::Backtick),
        '!' => shifted(Key::Num1),
        '@' => shifted(Key::Num2),
        '#' => shifted(Key::Num3),
        '$' => shifted(Key::Num4),
        '%' => shifted(Key::Num5),
        '^' => shifted(Key::Num6),
        '&' => shifted(Key::Num7),
        '*' => shifted(Key::Num8),
        '(' => shifted(Key::Num9),
        ')' => shifted(Key::Num0),
        '_' => shifted(Key::Minus),
        '+' => plain(Key::Plus),
        '{' => shifted(Key::OpenBracket),
        '}' => shifted(Key::CloseBracket),
        '|' => plain(Key::Pipe),
        ':' => plain(Key::Colon),
        '"' => shifted(Key::Quote),
        '<' => shifted(Key::Comma),
        '>' => shifted(Key::Period),
        '?' => plain(Key::Questionmark),
        _ => None,
    }
}

fn function_key(number: u8) -> Option<Key> {
    let key = match number {
        1 => Key::F1,
        2 => Key::F2,
        3 => Key::F3,
        4 => Key::F4,
        5 => Key::F5,
        6 => Key::F6,
        7 => Key::F7,
        8 => Key::F8,
        9 => Key::F9,
        10 => Key::F10,
        11 => Key::F11,
        12 => Key::F12,
        13 => Key::F13,
        14 => Key::F14,
        15 => Key::F15,
        16 => Key::F16,
        17 => Key::F17,
        18 => Key::F18,
        19 => Key::F19,
        20 => Key::F20,
        21 => Key::F21,
        22 => Key::F22,
        23 => Key::F23,
        24 => Key::F24,
        _ => return None,
    };
    Some(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_mods() -> Modifiers {
        Modifiers::default()
    }

    #[test]
    fn default_table_parses_and_binds_motion_keys() {
        let keymap = Keymap::parse(DEFAULT_KEYS).expect("default keys");
        assert!(!keymap.is_empty());
        assert_eq!(
            keymap.lookup(Key::J, no_mods()),
            Some(Action::MoveSelectionDown)
        );
        assert_eq!(
            keymap.lookup(Key::ArrowUp, no_mods()),
            Some(Action::MoveSelectionUp)
        );
        assert_eq!(keymap.lookup(Key::Slash, no_mods()), Some(Action::StartIncSearch));
    }

    #[test]
    fn uppercase_letter_requires_shift() {
        let keymap = Keymap::parse("move_selection_last: G\n").expect("parse");
        let shift = Modifiers {
            shift: true,
            ..Default::default()
        };
        assert_eq!(
            keymap.lookup(Key::G, shift),
            Some(Action::MoveSelectionLast)
        );
        assert_eq!(keymap.lookup(Key::G, no_mods()), None);
    }

    #[test]
    fn control_chords_parse() {
        let keymap = Keymap::parse("refresh: C-r\n").expect("parse");
        let ctrl = Modifiers {
            ctrl: true,
            ..Default::default()
        };
        assert_eq!(keymap.lookup(Key::R, ctrl), Some(Action::Refresh));
        assert_eq!(keymap.lookup(Key::R, no_mods()), None);
    }

    #[test]
    fn stacked_modifier_prefixes_parse() {
        let chord = parse_key_spec("C-S-x").expect("parse");
        assert!(chord.ctrl);
        assert!(chord.shift);
        assert_eq!(chord.key, Key::X);
    }

    #[test]
    fn named_and_function_keys_parse() {
        assert_eq!(parse_key_spec("esc").expect("esc").key, Key::Escape);
        assert_eq!(parse_key_spec("enter").expect("enter").key, Key::Enter);
        assert_eq!(parse_key_spec("f5").expect("f5").key, Key::F5);
        assert_eq!(parse_key_spec("f24").expect("f24").key, Key::F24);
    }

    #[test]
    fn unknown_command_fails_the_load() {
        let err = Keymap::parse("no_such_command: x\n").expect_err("must fail");
        assert!(err.to_string().contains("no such command"));
    }

    #[test]
    fn unparsable_binding_fails_the_load() {
        assert!(Keymap::parse("quit: f99\n").is_err());
        assert!(Keymap::parse("quit: wibble\n").is_err());
    }

    #[test]
    fn line_without_separator_fails_the_load() {
        assert!(Keymap::parse("quit q\n").is_err());
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let keymap = Keymap::parse("# nothing here\n\nquit: q\n").expect("parse");
        assert_eq!(keymap.len(), 1);
    }

    #[test]
    fn command_modifier_counts_as_control() {
        let keymap = Keymap::parse("refresh: C-r\n").expect("parse");
        let command = Modifiers {
            command: true,
            ..Default::default()
        };
        assert_eq!(keymap.lookup(Key::R, command), Some(Action::Refresh));
    }

    #[test]
    fn every_action_name_round_trips() {
        for name in [
            "quit",
            "enter",
            "updir",
            "go_home",
            "refresh",
            "flatten_directory",
            "toggle_hidden",
            "switch_pane",
            "switch_splitting_mode",
            "move_selection_down",
            "move_selection_up",
            "move_selection_left",
            "move_selection_right",
            "move_selection_first",
            "move_selection_last",
            "start_inc_search",
            "next_match",
            "start_editor",
            "start_viewer",
            "history_back",
            "history_forth",
        ] {
            assert!(Action::from_name(name).is_some(), "missing action {name}");
        }
    }
}
