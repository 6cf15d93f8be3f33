//! Follows an overflow-page chain and concatenates the payload fragments it
//! carries.
//!
//! Recovering an overflowing blob is in scope here, unlike a plain query
//! engine that can afford to leave spilled payloads unimplemented. Every
//! overflow page begins with a
//! 4-byte big-endian next-page pointer (0 terminates the chain) followed by
//! `usable_size - 4` bytes of payload. This never trusts the chain: a
//! cycle, an out-of-range page number, or a page past the end of the file
//! stops the walk and marks the result truncated rather than looping or
//! indexing out of bounds.

use crate::byte_reader::read_u32;
use crate::file_view::FileView;
use std::collections::HashSet;

pub struct OverflowResult {
    pub bytes: Vec<u8>,
    /// True if the chain ended before `residual_len` bytes were recovered —
    /// a broken link, a cycle, or simply running out of file.
    pub truncated: bool,
    pub pages_visited: Vec<u32>,
}

/// Follows the overflow chain starting at `first_page`, accumulating up to
/// `residual_len` bytes of payload.
pub fn follow(view: &FileView, first_page: u32, residual_len: usize) -> OverflowResult {
    let mut bytes = Vec::with_capacity(residual_len);
    let mut pages_visited = Vec::new();
    let mut seen = HashSet::new();
    let mut truncated = false;
    let mut current = first_page;
    let usable = view.usable_size();
    let page_count = view.effective_page_count();

    while current != 0 && bytes.len() < residual_len {
        if current > page_count || !seen.insert(current) {
            truncated = true;
            break;
        }
        let page = match view.page_bytes(current) {
            Some(p) => p,
            None => {
                truncated = true;
                break;
            }
        };
        let next = match read_u32(page, 0) {
            Some(n) => n,
            None => {
                truncated = true;
                break;
            }
        };
        pages_visited.push(current);

        let want = (residual_len - bytes.len()).min(usable.saturating_sub(4) as usize);
        let available = page.len().saturating_sub(4);
        let take = want.min(available);
        bytes.extend_from_slice(&page[4..4 + take]);
        if take < want {
            truncated = true;
            break;
        }
        current = next;
    }

    OverflowResult {
        bytes,
        truncated,
        pages_visited,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_file(page_size: u32, pages: &[(u32, &[u8])]) -> Vec<u8> {
        let max_page = pages.iter().map(|(n, _)| *n).max().unwrap_or(0);
        let mut data = vec![0u8; (max_page as usize) * page_size as usize];
        for (num, payload) in pages {
            let base = ((*num - 1) * page_size) as usize;
            data[base..base + payload.len()].copy_from_slice(payload);
        }
        data
    }

    #[test]
    fn follows_two_page_chain_and_stops_at_zero() {
        let page_size = 16u32;
        let mut p1 = vec![0u8; 16];
        p1[0..4].copy_from_slice(&2u32.to_be_bytes());
        p1[4..16].copy_from_slice(b"0123456789AB");
        let mut p2 = vec![0u8; 16];
        p2[0..4].copy_from_slice(&0u32.to_be_bytes());
        p2[4..8].copy_from_slice(b"CDEF");

        let data = make_file(page_size, &[(1, &p1), (2, &p2)]);
        let view = FileView {
            data: &data,
            page_size,
            reserved_tail: 0,
            declared_page_count: 2,
        };
        let result = follow(&view, 1, 16);
        assert!(!result.truncated);
        assert_eq!(result.bytes, b"0123456789ABCDEF");
        assert_eq!(result.pages_visited, vec![1, 2]);
    }

    #[test]
    fn stops_on_out_of_range_page_without_panicking() {
        let page_size = 16u32;
        let mut p1 = vec![0u8; 16];
        p1[0..4].copy_from_slice(&99u32.to_be_bytes());
        let data = make_file(page_size, &[(1, &p1)]);
        let view = FileView {
            data: &data,
            page_size,
            reserved_tail: 0,
            declared_page_count: 1,
        };
        let result = follow(&view, 1, 100);
        assert!(result.truncated);
        assert_eq!(result.pages_visited, vec![1]);
    }

    #[test]
    fn stops_on_cycle_without_looping_forever() {
        let page_size = 16u32;
        let mut p1 = vec![0u8; 16];
        p1[0..4].copy_from_slice(&2u32.to_be_bytes());
        let mut p2 = vec![0u8; 16];
        p2[0..4].copy_from_slice(&1u32.to_be_bytes());
        let data = make_file(page_size, &[(1, &p1), (2, &p2)]);
        let view = FileView {
            data: &data,
            page_size,
            reserved_tail: 0,
            declared_page_count: 2,
        };
        let result = follow(&view, 1, 1000);
        assert!(result.truncated);
        assert_eq!(result.pages_visited.len(), 2);
    }

    #[test]
    fn stops_when_residual_len_satisfied_before_terminator() {
        let page_size = 16u32;
        let mut p1 = vec![0u8; 16];
        p1[0..4].copy_from_slice(&2u32.to_be_bytes());
        p1[4..16].copy_from_slice(b"0123456789AB");
        let mut p2 = vec![0u8; 16];
        p2[0..4].copy_from_slice(&3u32.to_be_bytes());
        let data = make_file(page_size, &[(1, &p1), (2, &p2)]);
        let view = FileView {
            data: &data,
            page_size,
            reserved_tail: 0,
            declared_page_count: 2,
        };
        let result = follow(&view, 1, 5);
        assert!(!result.truncated);
        assert_eq!(result.bytes, b"01234");
        assert_eq!(result.pages_visited, vec![1]);
    }
}
