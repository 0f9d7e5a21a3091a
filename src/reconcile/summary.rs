use std::fmt;

/// Counters collected over one sync run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub removed: usize,
    pub created: usize,
    pub tags_updated: usize,
    pub ignored: usize,
    pub skipped_groups: usize,
    pub failures: usize,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} removed, {} retagged, {} ignored, {} skipped group(s), {} failure(s)",
            self.created,
            self.removed,
            self.tags_updated,
            self.ignored,
            self.skipped_groups,
            self.failures
        )
    }
}
