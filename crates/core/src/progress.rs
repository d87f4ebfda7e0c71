use crate::model::percent;

/// Aggregated view of attempt progress, useful for a progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub percent: u32,
}

impl AttemptProgress {
    #[must_use]
    pub fn new(total: usize, answered: usize) -> Self {
        let answered = answered.min(total);
        Self {
            total,
            answered,
            remaining: total - answered,
            percent: percent(saturate(answered), saturate(total)),
        }
    }
}

/// Shape of a lesson: how many items each nested section holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LessonOutline {
    sections: Vec<usize>,
}

impl LessonOutline {
    #[must_use]
    pub fn new(sections: Vec<usize>) -> Self {
        Self { sections }
    }

    #[must_use]
    pub fn total_items(&self) -> usize {
        self.sections.iter().sum()
    }

    /// Flattened index of `(section, item)`, if it exists.
    #[must_use]
    pub fn global_index(&self, section: usize, item: usize) -> Option<usize> {
        let len = *self.sections.get(section)?;
        if item >= len {
            return None;
        }
        Some(self.sections[..section].iter().sum::<usize>() + item)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LessonProgress {
    pub completed: usize,
    pub total: usize,
    pub percent: u32,
}

/// Progress through a lesson given the furthest position reached.
///
/// Every item whose global index is `<= current` counts as completed, whether
/// or not its content was ever opened: moving past an item credits it.
#[must_use]
pub fn lesson_progress(outline: &LessonOutline, current: Option<usize>) -> LessonProgress {
    let total = outline.total_items();
    let completed = current.map_or(0, |index| (index + 1).min(total));
    LessonProgress {
        completed,
        total,
        percent: percent(saturate(completed), saturate(total)),
    }
}

fn saturate(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
