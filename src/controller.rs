//! Linear navigation over a fixed sequence of views.

use crate::view::ViewConfig;

/// Ordered views with a cursor. Navigation stops at both ends.
#[derive(Debug, Clone)]
pub struct ViewController {
    views: Vec<ViewConfig>,
    index: usize,
}

impl ViewController {
    pub fn new(views: Vec<ViewConfig>) -> Self {
        Self { views, index: 0 }
    }

    /// The four built-in climate views in presentation order.
    pub fn climate() -> Self {
        Self::new(ViewConfig::builtin())
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn views(&self) -> &[ViewConfig] {
        &self.views
    }

    pub fn current(&self) -> Option<&ViewConfig> {
        self.views.get(self.index)
    }

    pub fn can_advance(&self) -> bool {
        self.index + 1 < self.views.len()
    }

    pub fn can_retreat(&self) -> bool {
        self.index > 0
    }

    /// Move to the next view. Returns `false` (and stays) on the last one.
    pub fn advance(&mut self) -> bool {
        if !self.can_advance() {
            return false;
        }
        self.index += 1;
        true
    }

    /// Move to the previous view. Returns `false` (and stays) on the first one.
    pub fn retreat(&mut self) -> bool {
        if !self.can_retreat() {
            return false;
        }
        self.index -= 1;
        true
    }

    /// Jump straight to a view, e.g. from the CLI. Out-of-range indices are ignored.
    pub fn jump(&mut self, index: usize) -> bool {
        if index >= self.views.len() {
            return false;
        }
        self.index = index;
        true
    }
}
