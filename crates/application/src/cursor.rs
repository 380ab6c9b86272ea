//! Keyboard-cursor movement over the active item collection.

use homedeck_core::{PanelId, SelectionCursor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

/// Column count inferred from rendered tile tops: tiles sharing the first
/// tile's row (within `tolerance`) are one row's worth of columns.
pub fn infer_columns(tops: &[u16], tolerance: u16) -> usize {
    let Some(&first) = tops.first() else {
        return 1;
    };
    let mut columns = 0;
    for &top in tops {
        if top.abs_diff(first) <= tolerance {
            columns += 1;
        } else {
            break;
        }
    }
    columns.max(1)
}

/// One cursor move over `len` items laid out in `columns`, clamped to
/// `[0, len - 1]` in every direction.
pub fn step(index: usize, direction: Direction, len: usize, columns: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let last = len - 1;
    let columns = columns.max(1);
    let moved = match direction {
        Direction::Left => index.saturating_sub(1),
        Direction::Right => index.saturating_add(1),
        Direction::Up => index.saturating_sub(columns),
        Direction::Down => index.saturating_add(columns),
    };
    moved.min(last)
}

/// The side panel is a single row, so vertical input only clamps there.
pub fn move_cursor(
    cursor: SelectionCursor,
    direction: Direction,
    len: usize,
    columns: usize,
) -> SelectionCursor {
    let index = match (cursor.panel, direction) {
        (PanelId::SidePanel, Direction::Up | Direction::Down) => {
            cursor.index.min(len.saturating_sub(1))
        }
        (PanelId::SidePanel, _) => step(cursor.index, direction, len, len.max(1)),
        (PanelId::PrimaryGrid, _) => step(cursor.index, direction, len, columns),
    };
    SelectionCursor {
        panel: cursor.panel,
        index,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_come_from_matching_first_row_tops() {
        assert_eq!(infer_columns(&[10, 10, 10, 30, 30, 30, 50], 2), 3);
        assert_eq!(infer_columns(&[10, 11, 12, 30], 2), 3);
        assert_eq!(infer_columns(&[10, 10, 10], 2), 3);
        assert_eq!(infer_columns(&[], 2), 1);
    }

    #[test]
    fn left_at_zero_stays_at_zero() {
        assert_eq!(step(0, Direction::Left, 7, 3), 0);
    }

    #[test]
    fn right_at_last_stays_at_last() {
        assert_eq!(step(6, Direction::Right, 7, 3), 6);
    }

    #[test]
    fn down_past_the_last_row_clamps_to_the_last_index() {
        // 7 items in 3 inferred columns: the last row is partial.
        assert_eq!(step(5, Direction::Down, 7, 3), 6);
        assert_eq!(step(6, Direction::Down, 7, 3), 6);
        assert_eq!(step(1, Direction::Down, 7, 3), 4);
    }

    #[test]
    fn up_within_the_first_row_clamps_to_zero() {
        assert_eq!(step(1, Direction::Up, 7, 3), 0);
        assert_eq!(step(4, Direction::Up, 7, 3), 1);
    }

    #[test]
    fn side_panel_ignores_vertical_movement() {
        let cursor = SelectionCursor {
            panel: PanelId::SidePanel,
            index: 2,
        };
        let moved = move_cursor(cursor, Direction::Down, 5, 3);
        assert_eq!(moved.index, 2);
        let moved = move_cursor(cursor, Direction::Right, 5, 3);
        assert_eq!(moved.index, 3);
    }

    #[test]
    fn empty_collection_pins_the_cursor_at_zero() {
        assert_eq!(step(3, Direction::Right, 0, 3), 0);
    }
}
