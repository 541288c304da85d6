//! List query parameters and pagination

use serde::{Deserialize, Serialize};

/// Which records a list includes, by soft-delete state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    #[default]
    Active,
    Deleted,
    All,
}

impl RecordStatus {
    pub fn includes(&self, deleted: bool) -> bool {
        match self {
            RecordStatus::Active => !deleted,
            RecordStatus::Deleted => deleted,
            RecordStatus::All => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Page metadata returned with every list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub total_pages: usize,
}

impl Pagination {
    /// `page` is 1-based; `limit` must be non-zero.
    pub fn new(page: usize, limit: usize, total: usize) -> Self {
        Self {
            page,
            limit,
            total,
            total_pages: total.div_ceil(limit),
        }
    }

    /// Index range of this page within the full result set.
    pub fn range(&self) -> std::ops::Range<usize> {
        let start = (self.page - 1).saturating_mul(self.limit).min(self.total);
        let end = start.saturating_add(self.limit).min(self.total);
        start..end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages_is_ceiling() {
        assert_eq!(Pagination::new(1, 20, 0).total_pages, 0);
        assert_eq!(Pagination::new(1, 20, 20).total_pages, 1);
        assert_eq!(Pagination::new(1, 20, 21).total_pages, 2);
        assert_eq!(Pagination::new(1, 3, 10).total_pages, 4);
    }

    #[test]
    fn test_range_clamps_to_total() {
        assert_eq!(Pagination::new(2, 3, 10).range(), 3..6);
        assert_eq!(Pagination::new(4, 3, 10).range(), 9..10);
        assert_eq!(Pagination::new(9, 3, 10).range(), 10..10);
    }

    #[test]
    fn test_status_filter() {
        assert!(RecordStatus::Active.includes(false));
        assert!(!RecordStatus::Active.includes(true));
        assert!(RecordStatus::Deleted.includes(true));
        assert!(RecordStatus::All.includes(true) && RecordStatus::All.includes(false));
    }
}
