use crate::listing::Entry;

const NUM_DOTS: usize = 3;

// All widths and offsets in this module are measured in characters unless a
// name says bytes. The render surface styles by byte, so both are tracked.

pub fn justify(text: &str, width: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= width {
        let mut out: String = chars.iter().collect();
        out.extend(std::iter::repeat(' ').take(width - chars.len()));
        return out;
    }

    let (root, ext) = split_extension(&chars);
    let mut new_width = width.saturating_sub(NUM_DOTS);
    if !ext.is_empty() {
        new_width = new_width.saturating_sub(ext.len());
    }

    let mut half_width_ceil;
    let half_width_floor;
    let ext_top;
    if new_width <= 5 {
        // 5 = len("a...b")
        half_width_ceil = 1;
        half_width_floor = 1;
        ext_top = width.saturating_sub(half_width_ceil + half_width_floor + NUM_DOTS);
    } else {
        half_width_ceil = new_width / 2 + new_width % 2;
        half_width_floor = new_width / 2;
        ext_top = ext.len();
    }

    if ext_top > ext.len() {
        half_width_ceil += ext_top - ext.len();
    }

    let mut out = String::with_capacity(width);
    out.extend(root.iter().take(half_width_ceil));
    out.extend(std::iter::repeat('.').take(NUM_DOTS));
    out.extend(root.iter().skip(root.len().saturating_sub(half_width_floor)));
    out.extend(ext.iter().take(ext_top));

    // Very narrow cells can overshoot the head/tail split; the cell width wins.
    let mut cells: Vec<char> = out.chars().collect();
    cells.truncate(width);
    while cells.len() < width {
        cells.push(' ');
    }
    cells.into_iter().collect()
}

fn split_extension(chars: &[char]) -> (&[char], &[char]) {
    let Some(dot) = chars.iter().rposition(|c| *c == '.') else {
        return (chars, &[]);
    };
    // Leading dots are part of the name, not an extension.
    if chars[..dot].iter().all(|c| *c == '.') {
        return (chars, &[]);
    }
    chars.split_at(dot)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewWindow {
    pub width: usize,
    pub height: usize,
    pub left: usize,
    pub num_columns: usize,
}

impl ViewWindow {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height: height.max(1),
            left: 0,
            num_columns: 0,
        }
    }

    pub fn right(&self) -> usize {
        self.left + self.width
    }

    // Only handles the horizontal dimension.
    pub fn char_in_view(&self, char_pos: usize) -> bool {
        char_pos >= self.left && char_pos < self.right()
    }
}

// The visible clip of one laid-out item. Offsets are relative to the visible
// subline the item sits on; byte variants exist because the render surface
// addresses styling by byte and names may be multi-byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisualItem {
    pub start_char_on_line: usize,
    pub vis_len_in_chars: usize,
    pub start_byte_on_line: usize,
    pub vis_len_in_bytes: usize,
    pub fully_in_view: bool,
}

pub struct GridLayout {
    pub lines: Vec<String>,
    pub num_full_columns: usize,
}

// Column-major layout into one logical full-width line per row. Mutates the
// entries in place with their coordinates, offsets and justified cell text.
pub fn layout_items(
    items: &mut [Entry],
    chars_per_col: usize,
    rows_per_column: usize,
) -> GridLayout {
    let height = rows_per_column.max(1);
    let num_full_columns = items.len() / height;
    let cell_width = chars_per_col.saturating_sub(1);

    let mut lines: Vec<String> = vec![String::new(); height];
    let mut line_chars = vec![0usize; height];

    let mut row = 0usize;
    let mut column = 0usize;
    for item in items.iter_mut() {
        let mut visible_part = justify(&item.file_name, cell_width);
        visible_part.push(' ');

        item.coords = (column, row);
        item.start_char_on_line = line_chars[row];
        item.start_byte_on_line = lines[row].len();

        line_chars[row] += visible_part.chars().count();
        lines[row].push_str(&visible_part);
        item.visible_part = visible_part;

        row += 1;
        if row > height - 1 {
            row = 0;
            column += 1;
        }
    }

    GridLayout {
        lines,
        num_full_columns,
    }
}

// Clips every full line to the window and pads the ragged tail with spaces,
// so each subline is exactly window.width characters.
pub fn extract_visible_sublines(lines: &[String], window: &ViewWindow) -> Vec<String> {
    lines
        .iter()
        .map(|line| {
            let mut sub: String = line
                .chars()
                .skip(window.left)
                .take(window.width)
                .collect();
            let missing = window.width.saturating_sub(sub.chars().count());
            sub.extend(std::iter::repeat(' ').take(missing));
            sub
        })
        .collect()
}

pub fn byte_len_of_chars(text: &str, num_chars: usize) -> usize {
    text.char_indices()
        .nth(num_chars)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len())
}

// `visible_line` is the already-clipped subline the item sits on; byte
// offsets are computed against it, not against the full logical line.
pub fn project_item(item: &Entry, window: &ViewWindow, visible_line: &str) -> Option<VisualItem> {
    let len_chars = item.visible_part.chars().count();
    let start = item.start_char_on_line;
    let end = start + len_chars;
    if !window.char_in_view(start) && !window.char_in_view(end) {
        return None;
    }

    let rel_start = start as isize - window.left as isize;
    let rel_end = rel_start + len_chars as isize;

    // Partially visible, clipped on the left:
    if rel_start < 0 && rel_end >= 0 {
        let vis_chars = rel_end as usize;
        let tail: String = item
            .visible_part
            .chars()
            .skip(len_chars - vis_chars)
            .collect();
        return Some(VisualItem {
            start_char_on_line: 0,
            vis_len_in_chars: vis_chars,
            start_byte_on_line: 0,
            vis_len_in_bytes: tail.len(),
            fully_in_view: false,
        });
    }

    let start_char = rel_start as usize;

    // Partially visible, clipped on the right:
    if rel_end >= window.width as isize && rel_start < window.width as isize {
        let vis_chars = window.width - start_char;
        let head: String = item.visible_part.chars().take(vis_chars).collect();
        return Some(VisualItem {
            start_char_on_line: start_char,
            vis_len_in_chars: vis_chars,
            start_byte_on_line: byte_len_of_chars(visible_line, start_char),
            vis_len_in_bytes: head.len(),
            fully_in_view: false,
        });
    }

    // Fully in view:
    Some(VisualItem {
        start_char_on_line: start_char,
        vis_len_in_chars: len_chars,
        start_byte_on_line: byte_len_of_chars(visible_line, start_char),
        vis_len_in_bytes: item.visible_part.len(),
        fully_in_view: true,
    })
}

// Scrolls the window the minimal amount that reveals the item. Returns false
// when the item was already fully inside the window, in which case nothing
// needs to be redrawn.
pub fn move_into_view(item: &Entry, window: &mut ViewWindow) -> bool {
    let start = item.start_char_on_line;
    let end = start + item.visible_part.chars().count();

    if start < window.left {
        window.left = start;
    } else if end > window.right() {
        window.left = end - window.width;
    } else {
        return false;
    }
    true
}
