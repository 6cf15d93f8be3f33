//! A read-only view over the whole database file, sliced into fixed-size
//! pages. Shared by every component downstream of the file header: the page
//! classifier, cell decoder, overflow follower, scavenger and b-tree
//! walker all take a `&FileView` instead of re-deriving page size / usable
//! size / page count arithmetic locally.
//!
//! A forensic reader has no use for demand paging into a `HashMap` keyed by
//! page number — it is going to visit every page anyway — so this is a
//! single contiguous buffer with cheap slicing.

pub struct FileView<'a> {
    pub data: &'a [u8],
    pub page_size: u32,
    pub reserved_tail: u8,
    pub declared_page_count: u32,
}

impl<'a> FileView<'a> {
    pub fn usable_size(&self) -> u32 {
        self.page_size - self.reserved_tail as u32
    }

    /// Page count implied by the file's length, used as a fallback when the
    /// header's declared count is 0 (old SQLite versions left it unset).
    pub fn page_count_by_len(&self) -> u32 {
        (self.data.len() as u32) / self.page_size
    }

    pub fn effective_page_count(&self) -> u32 {
        if self.declared_page_count > 0 {
            self.declared_page_count
        } else {
            self.page_count_by_len()
        }
    }

    /// Returns the raw bytes of page `page_num` (1-based), or `None` if the
    /// page is out of range or the file is truncated mid-page.
    pub fn page_bytes(&self, page_num: u32) -> Option<&'a [u8]> {
        if page_num == 0 {
            return None;
        }
        let start = (page_num as u64 - 1) * self.page_size as u64;
        let end = start + self.page_size as u64;
        if end > self.data.len() as u64 {
            return None;
        }
        Some(&self.data[start as usize..end as usize])
    }

    /// The byte offset, within a page, where the b-tree page header begins:
    /// 100 on page 1 (past the file header), 0 everywhere else.
    pub fn btree_header_offset(page_num: u32) -> usize {
        if page_num == 1 {
            100
        } else {
            0
        }
    }
}
