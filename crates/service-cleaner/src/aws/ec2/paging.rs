//! Accumulates converted records across DescribeX result pages

use service_cleaner_common::ResourceKind;
use tracing::{debug, warn};

/// Converted records gathered page by page for one kind in one region.
///
/// Records the conversion rejects (no identifier) are counted and logged
/// rather than silently dropped.
pub(super) struct PageCollector<'a, T> {
    kind: ResourceKind,
    region: &'a str,
    pages: usize,
    dropped: usize,
    items: Vec<T>,
}

impl<'a, T> PageCollector<'a, T> {
    pub(super) fn new(kind: ResourceKind, region: &'a str) -> Self {
        Self {
            kind,
            region,
            pages: 0,
            dropped: 0,
            items: Vec::new(),
        }
    }

    /// Convert and append one page, preserving provider order
    pub(super) fn extend<'p, S: 'p>(
        &mut self,
        page: impl IntoIterator<Item = &'p S>,
        convert: impl Fn(&S) -> Option<T>,
    ) {
        self.pages += 1;
        for raw in page {
            match convert(raw) {
                Some(item) => self.items.push(item),
                None => {
                    self.dropped += 1;
                    warn!(
                        kind = %self.kind,
                        region = %self.region,
                        page = self.pages,
                        "Skipping record without an identifier"
                    );
                }
            }
        }
    }

    #[cfg(test)]
    pub(super) fn dropped(&self) -> usize {
        self.dropped
    }

    pub(super) fn finish(self) -> Vec<T> {
        debug!(
            kind = %self.kind,
            region = %self.region,
            pages = self.pages,
            count = self.items.len(),
            dropped = self.dropped,
            "Listed resources"
        );
        self.items
    }
}
