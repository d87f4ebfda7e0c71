//! Which question (and, for listening, which section) is on screen.

/// Address of the displayed question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub section: usize,
    pub item: usize,
}

/// Outcome of a `next`/`previous` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorMove {
    Moved(Position),
    /// `previous` at the first question; position unchanged.
    AtStart,
    /// `next` at the last question; position unchanged.
    Complete,
}

/// Bounded cursor over one or more groups of questions.
///
/// Always points at an existing question. Empty groups are never entered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationCursor {
    groups: Vec<usize>,
    position: Position,
}

impl NavigationCursor {
    /// Cursor over a flat list of `len` questions. `None` when `len` is zero.
    #[must_use]
    pub fn flat(len: usize) -> Option<Self> {
        Self::sectioned(&[len])
    }

    /// Cursor over sections of the given lengths. `None` when every section is empty.
    #[must_use]
    pub fn sectioned(lengths: &[usize]) -> Option<Self> {
        let first = lengths.iter().position(|len| *len > 0)?;
        Some(Self {
            groups: lengths.to_vec(),
            position: Position {
                section: first,
                item: 0,
            },
        })
    }

    #[must_use]
    pub fn position(&self) -> Position {
        self.position
    }

    /// Index into the flattened question list.
    #[must_use]
    pub fn global_index(&self) -> usize {
        self.groups[..self.position.section].iter().sum::<usize>() + self.position.item
    }

    /// Total number of questions across groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.iter().sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.global_index() + 1 == self.len()
    }

    pub fn next(&mut self) -> CursorMove {
        let Position { section, item } = self.position;
        if item + 1 < self.groups[section] {
            self.position.item += 1;
            return CursorMove::Moved(self.position);
        }
        match (section + 1..self.groups.len()).find(|s| self.groups[*s] > 0) {
            Some(next_section) => {
                self.position = Position {
                    section: next_section,
                    item: 0,
                };
                CursorMove::Moved(self.position)
            }
            None => CursorMove::Complete,
        }
    }

    pub fn previous(&mut self) -> CursorMove {
        let Position { section, item } = self.position;
        if item > 0 {
            self.position.item -= 1;
            return CursorMove::Moved(self.position);
        }
        match (0..section).rev().find(|s| self.groups[*s] > 0) {
            Some(prev_section) => {
                self.position = Position {
                    section: prev_section,
                    item: self.groups[prev_section] - 1,
                };
                CursorMove::Moved(self.position)
            }
            None => CursorMove::AtStart,
        }
    }

    /// Jump to `(section, item)`; `section` defaults to the first group.
    ///
    /// Out-of-range requests leave the cursor untouched and return `false`.
    pub fn set_position(&mut self, section: Option<usize>, item: usize) -> bool {
        let section = section.unwrap_or(0);
        match self.groups.get(section) {
            Some(len) if item < *len => {
                self.position = Position { section, item };
                true
            }
            _ => false,
        }
    }

    /// Back to the first question.
    pub fn rewind(&mut self) {
        if let Some(first) = self.groups.iter().position(|len| *len > 0) {
            self.position = Position {
                section: first,
                item: 0,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_reaches_last_then_signals_complete() {
        let n = 5;
        let mut cursor = NavigationCursor::flat(n).unwrap();
        for _ in 0..n - 1 {
            assert!(matches!(cursor.next(), CursorMove::Moved(_)));
        }
        assert_eq!(cursor.global_index(), n - 1);
        assert!(cursor.is_last());
        assert_eq!(cursor.next(), CursorMove::Complete);
        assert_eq!(cursor.global_index(), n - 1);
    }

    #[test]
    fn previous_clamps_at_zero() {
        let mut cursor = NavigationCursor::flat(3).unwrap();
        assert_eq!(cursor.previous(), CursorMove::AtStart);
        assert_eq!(cursor.position(), Position::default());
    }

    #[test]
    fn crosses_sections_and_skips_empty_ones() {
        let mut cursor = NavigationCursor::sectioned(&[0, 2, 0, 1]).unwrap();
        assert_eq!(cursor.position(), Position { section: 1, item: 0 });
        assert_eq!(cursor.next(), CursorMove::Moved(Position { section: 1, item: 1 }));
        assert_eq!(cursor.next(), CursorMove::Moved(Position { section: 3, item: 0 }));
        assert_eq!(cursor.global_index(), 2);
        assert_eq!(cursor.next(), CursorMove::Complete);

        assert_eq!(cursor.previous(), CursorMove::Moved(Position { section: 1, item: 1 }));
        assert_eq!(cursor.previous(), CursorMove::Moved(Position { section: 1, item: 0 }));
        assert_eq!(cursor.previous(), CursorMove::AtStart);
    }

    #[test]
    fn out_of_range_set_position_is_ignored() {
        let mut cursor = NavigationCursor::sectioned(&[2, 3]).unwrap();
        assert!(cursor.set_position(Some(1), 2));
        assert!(!cursor.set_position(Some(1), 3));
        assert!(!cursor.set_position(Some(5), 0));
        assert_eq!(cursor.position(), Position { section: 1, item: 2 });
        assert_eq!(cursor.global_index(), 4);
    }

    #[test]
    fn set_position_without_section_targets_first_group() {
        let mut cursor = NavigationCursor::flat(4).unwrap();
        assert!(cursor.set_position(None, 3));
        assert_eq!(cursor.global_index(), 3);
        cursor.rewind();
        assert_eq!(cursor.global_index(), 0);
    }

    #[test]
    fn all_empty_groups_yield_no_cursor() {
        assert!(NavigationCursor::flat(0).is_none());
        assert!(NavigationCursor::sectioned(&[0, 0]).is_none());
    }
}
