use crate::listing::Entry;

// ASCII characters compare case-insensitively, everything else exactly.
fn chars_equal(a: char, b: char) -> bool {
    if a.is_ascii() && b.is_ascii() {
        a.eq_ignore_ascii_case(&b)
    } else {
        a == b
    }
}

// Character offset of the first case-insensitive occurrence of `query` in
// `name`. The empty query matches at offset 0.
pub fn match_offset(name: &str, query: &str) -> Option<usize> {
    let q: Vec<char> = query.chars().collect();
    if q.is_empty() {
        return Some(0);
    }
    let text: Vec<char> = name.chars().collect();
    if q.len() > text.len() {
        return None;
    }
    for start in 0..=text.len() - q.len() {
        if q.iter()
            .enumerate()
            .all(|(offset, qc)| chars_equal(text[start + offset], *qc))
        {
            return Some(start);
        }
    }
    None
}

pub fn matches(name: &str, query: &str) -> bool {
    match_offset(name, query).is_some()
}

// Scans [from_index, len) then wraps to [0, from_index). A start position
// past the end restarts from the top. None means no item matched at all;
// callers leave the selection where it was in that case.
pub fn next_match(items: &[Entry], query: &str, from_index: usize) -> Option<usize> {
    if items.is_empty() {
        return None;
    }
    let start = if from_index >= items.len() {
        0
    } else {
        from_index
    };
    (start..items.len())
        .chain(0..start)
        .find(|&i| matches(&items[i].file_name, query))
}
