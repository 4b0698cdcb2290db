//! Editable in/out selection over a loaded buffer

/// A selection is two optional time bounds in seconds. The cleared state
/// is `{None, None}`, which is distinct from a zero-width selection at 0.
///
/// Setters are permissive (handles are dragged freely); validity against
/// a buffer is enforced where the selection is consumed, and `bounds`
/// orders the endpoints so drag direction does not matter.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClipSelection {
    start: Option<f64>,
    end: Option<f64>,
}

impl ClipSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_start(&mut self, seconds: f64) {
        self.start = Some(seconds);
    }

    pub fn set_end(&mut self, seconds: f64) {
        self.end = Some(seconds);
    }

    pub fn set(&mut self, start_seconds: f64, end_seconds: f64) {
        self.start = Some(start_seconds);
        self.end = Some(end_seconds);
    }

    pub fn clear(&mut self) {
        self.start = None;
        self.end = None;
    }

    pub fn start(&self) -> Option<f64> {
        self.start
    }

    pub fn end(&self) -> Option<f64> {
        self.end
    }

    /// Both handles placed?
    pub fn is_complete(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }

    /// Ordered `(start, end)` when the selection is complete.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        match (self.start, self.end) {
            (Some(a), Some(b)) => Some((a.min(b), a.max(b))),
            _ => None,
        }
    }

    /// Selected span in seconds, when complete.
    pub fn duration(&self) -> Option<f64> {
        self.bounds().map(|(start, end)| end - start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleared_is_distinct_from_zero() {
        let mut selection = ClipSelection::new();
        assert!(!selection.is_complete());
        assert_eq!(selection.bounds(), None);

        selection.set(0.0, 0.0);
        assert!(selection.is_complete());
        assert_eq!(selection.bounds(), Some((0.0, 0.0)));

        selection.clear();
        assert!(!selection.is_complete());
        assert_eq!(selection.start(), None);
        assert_eq!(selection.end(), None);
    }

    #[test]
    fn test_single_handle_is_incomplete() {
        let mut selection = ClipSelection::new();
        selection.set_start(1.0);
        assert!(!selection.is_complete());
        assert_eq!(selection.bounds(), None);
    }

    #[test]
    fn test_bounds_order_endpoints() {
        let mut selection = ClipSelection::new();
        selection.set_start(5.0);
        selection.set_end(2.0);
        assert_eq!(selection.bounds(), Some((2.0, 5.0)));
        assert_eq!(selection.duration(), Some(3.0));
    }
}
