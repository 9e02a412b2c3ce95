use crate::tracking::AggregateRecord;

use super::format::format_entry;

pub const ENTRIES_PER_PAGE: usize = 11;

/// Input that moves a session between pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    First,
    Previous,
    Next,
    Last,
    Stop,
}

/// Pre-rendered report pages. Always contains at least one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pages {
    title: String,
    bodies: Vec<String>,
}

impl Pages {
    /// Returns `None` when there is nothing to show.
    pub fn new(title: impl Into<String>, bodies: Vec<String>) -> Option<Self> {
        if bodies.is_empty() {
            return None;
        }
        Some(Self {
            title: title.into(),
            bodies,
        })
    }

    /// Sorts records from the longest to the shortest and splits their lines into pages.
    pub fn from_records(title: impl Into<String>, records: &[AggregateRecord]) -> Option<Self> {
        let mut records = records.iter().collect::<Vec<_>>();
        records.sort_by(|a, b| b.total_units.cmp(&a.total_units));

        let bodies = records
            .chunks(ENTRIES_PER_PAGE)
            .map(|chunk| {
                chunk
                    .iter()
                    .map(|record| format_entry(record) + "\n")
                    .collect::<String>()
            })
            .collect();
        Self::new(title, bodies)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn body(&self, index: usize) -> Option<&str> {
        self.bodies.get(index).map(String::as_str)
    }

    /// Full content of a page: title, entries and the page counter.
    pub fn render(&self, index: usize) -> String {
        let index = index.min(self.len() - 1);
        format!(
            "{}\n{}Page {}/{}",
            self.title,
            self.bodies[index],
            index + 1,
            self.len()
        )
    }
}

/// Position inside [Pages]. Navigating past either end does nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    index: usize,
    len: usize,
}

impl PageCursor {
    pub fn new(len: usize) -> Self {
        Self { index: 0, len }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Moves the cursor. Returns the new page if it changed.
    pub fn navigate(&mut self, navigation: Navigation) -> Option<usize> {
        let last = self.len.saturating_sub(1);
        let target = match navigation {
            Navigation::First => 0,
            Navigation::Previous => self.index.saturating_sub(1),
            Navigation::Next => (self.index + 1).min(last),
            Navigation::Last => last,
            Navigation::Stop => self.index,
        };
        if target == self.index {
            None
        } else {
            self.index = target;
            Some(target)
        }
    }
}
