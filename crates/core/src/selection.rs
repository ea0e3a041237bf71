//! Page selection set for the preview grid.
//!
//! Only pages that have a rendered thumbnail can be selected. The selection
//! changes through explicit toggle / select-all / deselect-all actions and is
//! cleared whenever the grid is replaced.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageSelection {
    available: BTreeSet<u32>,
    selected: BTreeSet<u32>,
}

impl PageSelection {
    /// Selection over a freshly rendered grid, nothing selected.
    pub fn with_pages(pages: impl IntoIterator<Item = u32>) -> Self {
        Self {
            available: pages.into_iter().collect(),
            selected: BTreeSet::new(),
        }
    }

    /// Drop both the grid and the selection.
    pub fn clear(&mut self) {
        self.available.clear();
        self.selected.clear();
    }

    /// Flip one page. Returns the new state; pages outside the grid stay unselected.
    pub fn toggle(&mut self, page: u32) -> bool {
        if !self.available.contains(&page) {
            return false;
        }

        if self.selected.remove(&page) {
            false
        } else {
            self.selected.insert(page);
            true
        }
    }

    pub fn select_all(&mut self) {
        self.selected = self.available.clone();
    }

    pub fn deselect_all(&mut self) {
        self.selected.clear();
    }

    pub fn is_selected(&self, page: u32) -> bool {
        self.selected.contains(&page)
    }

    pub fn is_available(&self, page: u32) -> bool {
        self.available.contains(&page)
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    pub fn available_count(&self) -> usize {
        self.available.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Parts of `pages` with no thumbnail in the grid.
    pub fn unknown_pages(&self, pages: &PageList) -> PageList {
        pages.missing_from(&self.available)
    }

    /// Replace the selection with the grid pages covered by `pages`.
    pub fn select_only(&mut self, pages: &PageList) {
        self.selected = self
            .available
            .iter()
            .copied()
            .filter(|p| pages.contains(*p))
            .collect();
    }

    /// Selected pages, ascending.
    pub fn selected(&self) -> Vec<u32> {
        self.selected.iter().copied().collect()
    }

    /// Comma-joined page numbers for the `selected_pages` form field.
    pub fn form_value(&self) -> String {
        join_pages(&self.selected())
    }
}

pub fn join_pages(pages: &[u32]) -> String {
    pages
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PageListError {
    #[error("Invalid page number: {0}")]
    InvalidPage(String),
    #[error("Invalid page range: {0}")]
    InvalidRange(String),
}

/// Ranges listed before the rest is summarised
const MAX_LISTED_RANGES: usize = 10;

/// Page numbers kept as sorted, merged inclusive ranges.
///
/// Ranges are never expanded, so `1-4000000000` costs one entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageList {
    ranges: Vec<(u32, u32)>,
}

impl PageList {
    pub fn from_pages(pages: impl IntoIterator<Item = u32>) -> Self {
        Self::from_ranges(pages.into_iter().map(|p| (p, p)))
    }

    fn from_ranges(ranges: impl IntoIterator<Item = (u32, u32)>) -> Self {
        let mut ranges: Vec<(u32, u32)> = ranges.into_iter().collect();
        ranges.sort_unstable();

        let mut merged: Vec<(u32, u32)> = Vec::with_capacity(ranges.len());
        for (start, end) in ranges {
            match merged.last_mut() {
                Some(last) if start <= last.1.saturating_add(1) => last.1 = last.1.max(end),
                _ => merged.push((start, end)),
            }
        }

        Self { ranges: merged }
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Number of pages covered.
    pub fn len(&self) -> u64 {
        self.ranges
            .iter()
            .map(|(start, end)| u64::from(end - start) + 1)
            .sum()
    }

    pub fn contains(&self, page: u32) -> bool {
        self.ranges
            .binary_search_by(|&(start, end)| {
                if end < page {
                    std::cmp::Ordering::Less
                } else if start > page {
                    std::cmp::Ordering::Greater
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .is_ok()
    }

    /// The gaps between `pages` inside each range. Walks `pages`, not the ranges.
    pub fn missing_from(&self, pages: &BTreeSet<u32>) -> PageList {
        let mut missing = Vec::new();

        for &(start, end) in &self.ranges {
            let mut next = u64::from(start);
            for &page in pages.range(start..=end) {
                if u64::from(page) > next {
                    missing.push((next as u32, page - 1));
                }
                next = u64::from(page) + 1;
            }
            if next <= u64::from(end) {
                missing.push((next as u32, end));
            }
        }

        Self { ranges: missing }
    }
}

impl fmt::Display for PageList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (start, end)) in self.ranges.iter().take(MAX_LISTED_RANGES).enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            if start == end {
                write!(f, "{start}")?;
            } else {
                write!(f, "{start}-{end}")?;
            }
        }

        let rest = self.ranges.len().saturating_sub(MAX_LISTED_RANGES);
        if rest > 0 {
            write!(f, " (+{rest} more)")?;
        }
        Ok(())
    }
}

/// Parse a page list such as `"1,3,5-8"`.
///
/// Pages are 1-based; whitespace around items is ignored and empty items are
/// skipped.
pub fn parse_page_list(input: &str) -> Result<PageList, PageListError> {
    let mut ranges = Vec::new();

    for item in input.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match item.split_once('-') {
            Some((start, end)) => {
                let start = parse_page(start.trim())
                    .map_err(|_| PageListError::InvalidRange(item.to_string()))?;
                let end = parse_page(end.trim())
                    .map_err(|_| PageListError::InvalidRange(item.to_string()))?;
                if start > end {
                    return Err(PageListError::InvalidRange(item.to_string()));
                }
                ranges.push((start, end));
            }
            None => {
                let page = parse_page(item)?;
                ranges.push((page, page));
            }
        }
    }

    Ok(PageList::from_ranges(ranges))
}

fn parse_page(s: &str) -> Result<u32, PageListError> {
    match s.parse::<u32>() {
        Ok(0) | Err(_) => Err(PageListError::InvalidPage(s.to_string())),
        Ok(page) => Ok(page),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_page() {
        let mut selection = PageSelection::with_pages([1, 2, 3]);

        assert!(selection.toggle(2));
        assert!(selection.is_selected(2));
        assert_eq!(selection.selected_count(), 1);

        assert!(!selection.toggle(2));
        assert!(!selection.is_selected(2));
        assert_eq!(selection.selected_count(), 0);
    }

    #[test]
    fn test_toggle_unknown_page_is_ignored() {
        let mut selection = PageSelection::with_pages([1, 2]);

        assert!(!selection.toggle(7));
        assert!(selection.is_empty());
    }

    #[test]
    fn test_select_all_and_deselect_all() {
        let mut selection = PageSelection::with_pages([4, 1, 9]);

        selection.select_all();
        assert_eq!(selection.selected(), vec![1, 4, 9]);
        assert_eq!(selection.form_value(), "1,4,9");

        selection.deselect_all();
        assert!(selection.is_empty());
        assert_eq!(selection.available_count(), 3);
    }

    #[test]
    fn test_clear_drops_grid() {
        let mut selection = PageSelection::with_pages([1, 2]);
        selection.select_all();

        selection.clear();

        assert_eq!(selection.available_count(), 0);
        assert!(selection.is_empty());
        assert!(!selection.toggle(1));
    }

    #[test]
    fn test_parse_page_list() {
        let pages = parse_page_list("1,3,5-8").unwrap();
        assert_eq!(pages, PageList::from_pages([1, 3, 5, 6, 7, 8]));
        assert_eq!(pages.to_string(), "1,3,5-8");
        assert_eq!(pages.len(), 6);

        assert_eq!(parse_page_list(" 2 , 2, 1 ").unwrap().to_string(), "1-2");
        assert_eq!(parse_page_list("4-4").unwrap().to_string(), "4");
        assert_eq!(parse_page_list("3-6,1-4").unwrap().to_string(), "1-6");
        assert!(parse_page_list("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_huge_range_stays_compact() {
        let pages = parse_page_list("1-4000000000").unwrap();

        assert_eq!(pages.len(), 4_000_000_000);
        assert!(pages.contains(3_999_999_999));
        assert!(!pages.contains(4_000_000_001));
        assert_eq!(pages.to_string(), "1-4000000000");
    }

    #[test]
    fn test_unknown_pages_against_grid() {
        let mut selection = PageSelection::with_pages([1, 2, 3, 5]);

        let unknown = selection.unknown_pages(&parse_page_list("2-4294967295").unwrap());
        assert_eq!(unknown.to_string(), "4,6-4294967295");

        let pages = parse_page_list("1-3,5").unwrap();
        assert!(selection.unknown_pages(&pages).is_empty());
        selection.select_only(&pages);
        assert_eq!(selection.selected(), vec![1, 2, 3, 5]);
    }

    #[test]
    fn test_long_page_list_is_summarised() {
        let pages = PageList::from_pages((1..=40).map(|p| p * 2));

        assert_eq!(
            pages.to_string(),
            "2,4,6,8,10,12,14,16,18,20 (+30 more)"
        );
    }

    #[test]
    fn test_parse_page_list_errors() {
        assert_eq!(
            parse_page_list("0"),
            Err(PageListError::InvalidPage("0".to_string()))
        );
        assert_eq!(
            parse_page_list("a,2"),
            Err(PageListError::InvalidPage("a".to_string()))
        );
        assert_eq!(
            parse_page_list("8-5"),
            Err(PageListError::InvalidRange("8-5".to_string()))
        );
        assert_eq!(
            parse_page_list("3-x"),
            Err(PageListError::InvalidRange("3-x".to_string()))
        );
    }
}
