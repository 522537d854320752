//! Active-list builder: which entries of a bank get drawn, in what order.
//!
//! Linked boards chain entries through a link field; ring boards simply walk
//! forward from the starting link. Either way the hardware stops as soon as
//! it comes back to an entry it has already processed, so garbage tables
//! (self-links, cycles) terminate instead of hanging.

use super::mask::FieldMask;
use super::table::ObjectTable;
use crate::logging::{log, LogCategory, LogLevel};

/// Most entries a single bank can hold.
pub const MAX_PER_BANK: usize = 1024;

/// How the builder moves from one entry to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Traversal {
    pub linked: bool,
    pub link_mask: FieldMask,
    /// Stop after this many objects
    pub max_objects: usize,
}

/// Cached list of table indices for the last starting link.
#[derive(Debug, Clone)]
pub struct ActiveList {
    indices: Vec<usize>,
    visited: Vec<bool>,
    last_link: Option<u16>,
    builds: u64,
}

impl ActiveList {
    pub fn new(entries_per_bank: usize) -> Self {
        Self {
            indices: Vec::with_capacity(entries_per_bank),
            visited: vec![false; entries_per_bank],
            last_link: None,
            builds: 0,
        }
    }

    /// Forget the cached list; the next `prepare` rebuilds.
    #[inline]
    pub fn invalidate(&mut self) {
        self.last_link = None;
    }

    /// Make the list for `link` current. Returns true if it had to be rebuilt.
    pub fn prepare(&mut self, table: &ObjectTable, bank: usize, link: u16, traversal: &Traversal) -> bool {
        if self.last_link == Some(link) {
            return false;
        }
        self.build(table, bank, link, traversal);
        self.last_link = Some(link);
        true
    }

    fn build(&mut self, table: &ObjectTable, bank: usize, start: u16, traversal: &Traversal) {
        let per_bank = self.visited.len();
        let base = bank * per_bank;
        self.indices.clear();
        self.visited.fill(false);

        let mut link = start as usize % per_bank;
        for _ in 0..traversal.max_objects {
            if self.visited[link] {
                break;
            }
            self.visited[link] = true;
            self.indices.push(base + link);

            let next = if traversal.linked {
                traversal.link_mask.extract(table.entry(base + link)) as usize
            } else {
                (link + 1) & traversal.link_mask.mask() as usize
            };
            link = next % per_bank;
        }

        self.builds += 1;
        log(LogCategory::ActiveList, LogLevel::Trace, || {
            format!(
                "Bank {} link {}: {} objects (build #{})",
                bank,
                start,
                self.indices.len(),
                self.builds
            )
        });
    }

    /// Table indices in list order.
    pub fn entries(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn last_link(&self) -> Option<u16> {
        self.last_link
    }

    /// Number of times the list has been rebuilt
    pub fn builds(&self) -> u64 {
        self.builds
    }
}
