// Selection movement over the column-major grid. Indices are positions in
// the flat item list; `rows_per_column` is the grid height. Every operation
// returns 0 for an empty list instead of touching the arithmetic.

pub fn down(index: usize, num_items: usize) -> usize {
    if num_items == 0 {
        return 0;
    }
    let next = index + 1;
    if next >= num_items {
        0
    } else {
        next
    }
}

pub fn up(index: usize, num_items: usize) -> usize {
    if num_items == 0 {
        return 0;
    }
    if index == 0 {
        num_items - 1
    } else {
        index - 1
    }
}

pub fn right(index: usize, num_items: usize, rows_per_column: usize) -> usize {
    if num_items == 0 {
        return 0;
    }
    let height = rows_per_column.max(1);
    let mut next = index + height;
    if next > num_items {
        // Wrap into the next row of the first column. The last column may be
        // ragged, so this is not the same as wrapping to index 0.
        next -= height;
        next = next % height + 1;
    }
    if next == num_items {
        0
    } else {
        next
    }
}

pub fn left(index: usize, num_items: usize, rows_per_column: usize) -> usize {
    if num_items == 0 {
        return 0;
    }
    let height = rows_per_column.max(1);

    let next = match index.checked_sub(height) {
        Some(next) => next as isize,
        None => {
            // Recompute from the ragged boundary: the landing column is the
            // last one, unless this row position does not exist there.
            let num_full_lines = num_items % height;
            let num_full_columns = num_items / height;
            let mut bottom_right_index = (height * (num_full_columns + 1)) as isize - 1;
            if index % height > num_full_lines {
                bottom_right_index = (height * num_full_columns) as isize - 1;
            }
            index as isize - height as isize + bottom_right_index
        }
    };

    if next < 0 {
        num_items - 1
    } else {
        next as usize
    }
}

pub fn last(num_items: usize) -> usize {
    num_items.saturating_sub(1)
}
