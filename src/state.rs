use crate::dates::{CanonicalDate, DateRange, RangeShortcut};
use crate::nav::{PlaygroundPage, Route};
use std::collections::BTreeSet;
use tracing::debug;

/// Sidebar key of the top-level playground list.
pub const PLAYGROUNDS_SECTION: &str = "playgrounds";

/// Everything the dashboard remembers between views: which playground is
/// open, the selected date range and which sidebar sections are expanded.
/// Owned by the caller and passed by reference to whatever renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiState {
    pub current_playground: Option<String>,
    pub current_page: Option<PlaygroundPage>,
    pub date_range: DateRange,
    expanded: BTreeSet<String>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            current_playground: None,
            current_page: None,
            date_range: DateRange::default(),
            expanded: BTreeSet::from([PLAYGROUNDS_SECTION.to_string()]),
        }
    }
}

impl UiState {
    pub fn set_current_playground(&mut self, name: impl Into<String>, page: PlaygroundPage) {
        let name = name.into();
        debug!(playground = %name, page = %page, "Switching playground");
        self.expanded.insert(name.clone());
        self.current_playground = Some(name);
        self.current_page = Some(page);
    }

    pub fn clear_playground(&mut self) {
        self.current_playground = None;
        self.current_page = None;
    }

    pub fn set_date_range(&mut self, range: DateRange) {
        self.date_range = range;
    }

    pub fn apply_shortcut(&mut self, shortcut: RangeShortcut, now: &CanonicalDate) {
        debug!(shortcut = %shortcut, "Applying date range shortcut");
        self.date_range = shortcut.range(now);
    }

    /// Flips a sidebar section; returns whether it is now expanded.
    pub fn toggle_section(&mut self, key: &str) -> bool {
        if self.expanded.remove(key) {
            false
        } else {
            self.expanded.insert(key.to_string());
            true
        }
    }

    pub fn is_expanded(&self, key: &str) -> bool {
        self.expanded.contains(key)
    }

    pub fn route(&self) -> Route {
        match (&self.current_playground, self.current_page) {
            (Some(name), Some(page)) => Route::playground(name.clone(), page),
            _ => Route::Playgrounds,
        }
    }

    /// Follows navigation. The date range is left alone.
    pub fn sync_with_route(&mut self, route: &Route) {
        match route {
            Route::Playgrounds => self.clear_playground(),
            Route::Playground { name, page } => self.set_current_playground(name.clone(), *page),
        }
    }
}
