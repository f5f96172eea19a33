// CrashWatch - core/span.rs
//
// Locating and cutting sentinel blocks out of event-log content.
// Core layer: pure functions, byte offsets throughout.
//
// Removal works on raw bytes so that records around the sentinel keep their
// exact bytes, including any that are not valid UTF-8.
//
// Search rules:
//   - The session marker is found with a forward scan; the FIRST match wins.
//     Ids are written once per session, so under append-only operation the
//     first match is the session's own sentinel.
//   - The owning block starts at the nearest open delimiter BEFORE the match.
//   - The block ends at the first close delimiter AFTER the match, extended
//     over any CR/LF immediately following it so no blank line is left.

use crate::core::model::SessionId;
use crate::util::constants::{BLOCK_CLOSE, BLOCK_OPEN, SENTINEL_MARKER_PREFIX};
use crate::util::error::Delimiter;
use std::ops::Range;

/// Outcome of searching for a session's sentinel block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockSearch {
    /// Byte range to remove, trailing line terminators included.
    Found(Range<usize>),
    /// The session marker does not occur in the content.
    MarkerAbsent,
    /// The marker occurs but the enclosing block is missing a delimiter.
    Damaged(Delimiter),
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn rfind_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).rposition(|w| w == needle)
}

/// Locate the sentinel block belonging to `session` in `content`.
pub fn locate_sentinel_block(content: &[u8], session: &SessionId) -> BlockSearch {
    let marker = session.marker();
    let Some(marker_at) = find_bytes(content, marker.as_bytes()) else {
        return BlockSearch::MarkerAbsent;
    };

    let Some(start) = rfind_bytes(&content[..marker_at], BLOCK_OPEN.as_bytes()) else {
        return BlockSearch::Damaged(Delimiter::Open);
    };

    let after_marker = marker_at + marker.len();
    let Some(close_rel) = find_bytes(&content[after_marker..], BLOCK_CLOSE.as_bytes()) else {
        return BlockSearch::Damaged(Delimiter::Close);
    };

    let close_end = after_marker + close_rel + BLOCK_CLOSE.len();
    let end = close_end
        + content[close_end..]
            .iter()
            .take_while(|b| **b == b'\r' || **b == b'\n')
            .count();

    BlockSearch::Found(start..end)
}

/// Return `content` with the half-open byte range `[start, end)` removed.
///
/// Offsets past the end are clamped; an inverted or empty range leaves the
/// content unchanged.
pub fn delete_range(content: &[u8], start: usize, end: usize) -> Vec<u8> {
    let end = end.min(content.len());
    if start >= end {
        return content.to_vec();
    }

    let mut out = Vec::with_capacity(content.len() - (end - start));
    out.extend_from_slice(&content[..start]);
    out.extend_from_slice(&content[end..]);
    out
}

/// True if `content` holds a sentinel marker for any session.
pub fn contains_any_sentinel(content: &str) -> bool {
    content.contains(SENTINEL_MARKER_PREFIX)
}

/// Every session id whose marker occurs in `content`, in file order.
///
/// An id that occurs more than once is reported once per occurrence so a
/// reused id remains visible to the caller.
pub fn sentinel_sessions(content: &str) -> Vec<SessionId> {
    content
        .match_indices(SENTINEL_MARKER_PREFIX)
        .filter_map(|(at, prefix)| SessionId::parse_prefix(&content[at + prefix.len()..]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{Record, RecordContext};
    use crate::core::record::format_record;
    use chrono::NaiveDate;

    fn sentinel_block(id: &str) -> String {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        format_record(&Record::sentinel(
            "alice",
            ts,
            &SessionId::from(id),
            RecordContext::default(),
        ))
    }

    fn found(content: &[u8], id: &str) -> Range<usize> {
        match locate_sentinel_block(content, &SessionId::from(id)) {
            BlockSearch::Found(range) => range,
            other => panic!("expected Found for {id}, got {other:?}"),
        }
    }

    #[test]
    fn test_locates_whole_block_including_blank_line() {
        let block = sentinel_block("abc12345");
        let content = format!("before\n{block}after\n");

        let range = found(content.as_bytes(), "abc12345");
        assert_eq!(&content.as_bytes()[range.clone()], block.as_bytes());
        assert_eq!(
            delete_range(content.as_bytes(), range.start, range.end),
            b"before\nafter\n"
        );
    }

    #[test]
    fn test_only_target_block_is_removed() {
        let a = sentinel_block("aaaa1111");
        let b = sentinel_block("bbbb2222");
        let content = format!("{a}{b}").into_bytes();

        let range = found(&content, "aaaa1111");
        assert_eq!(delete_range(&content, range.start, range.end), b.as_bytes());

        let range = found(&content, "bbbb2222");
        assert_eq!(delete_range(&content, range.start, range.end), a.as_bytes());
    }

    #[test]
    fn test_crlf_terminators_are_consumed() {
        let block = sentinel_block("abc12345").replace('\n', "\r\n");
        let content = format!("{block}tail").into_bytes();
        let range = found(&content, "abc12345");
        assert_eq!(delete_range(&content, range.start, range.end), b"tail");
    }

    #[test]
    fn test_invalid_utf8_around_block_is_kept_verbatim() {
        let mut content = b"legacy \xC3\x28 bytes\n".to_vec();
        content.extend_from_slice(sentinel_block("abc12345").as_bytes());
        content.extend_from_slice(b"tail \xFF\n");

        let range = found(&content, "abc12345");
        assert_eq!(
            delete_range(&content, range.start, range.end),
            b"legacy \xC3\x28 bytes\ntail \xFF\n"
        );
    }

    #[test]
    fn test_marker_absent() {
        assert_eq!(
            locate_sentinel_block(b"", &SessionId::from("abc12345")),
            BlockSearch::MarkerAbsent
        );
        let other = sentinel_block("ffff0000");
        assert_eq!(
            locate_sentinel_block(other.as_bytes(), &SessionId::from("abc12345")),
            BlockSearch::MarkerAbsent
        );
    }

    #[test]
    fn test_missing_delimiters_are_reported() {
        let bare = "Message: Spontaneous shutdown - Sessão ID: abc12345\n";
        assert_eq!(
            locate_sentinel_block(bare.as_bytes(), &SessionId::from("abc12345")),
            BlockSearch::Damaged(Delimiter::Open)
        );

        let unterminated = format!("{BLOCK_OPEN}\n{bare}");
        assert_eq!(
            locate_sentinel_block(unterminated.as_bytes(), &SessionId::from("abc12345")),
            BlockSearch::Damaged(Delimiter::Close)
        );
    }

    #[test]
    fn test_first_match_wins_when_marker_appears_in_earlier_block() {
        // The id text inside an unrelated earlier record anchors removal to
        // that record: forward first-match is the documented behaviour.
        let ts = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        let decoy = format_record(&Record::error(
            "mallory",
            ts,
            "Note",
            "quoted: Spontaneous shutdown - Sessão ID: abc12345",
            RecordContext::default(),
        ));
        let real = sentinel_block("abc12345");
        let content = format!("{decoy}{real}").into_bytes();

        let range = found(&content, "abc12345");
        assert_eq!(delete_range(&content, range.start, range.end), real.as_bytes());
    }

    #[test]
    fn test_marker_absent_once_block_is_gone() {
        let content = format!("x\n{}y\n", sentinel_block("abc12345")).into_bytes();
        let range = found(&content, "abc12345");
        let once = delete_range(&content, range.start, range.end);
        assert_eq!(
            locate_sentinel_block(&once, &SessionId::from("abc12345")),
            BlockSearch::MarkerAbsent
        );
    }

    #[test]
    fn test_delete_range_bounds_handling() {
        assert_eq!(delete_range(b"abcdef", 2, 4), b"abef");
        assert_eq!(delete_range(b"abcdef", 2, 100), b"ab");
        assert_eq!(delete_range(b"abcdef", 4, 2), b"abcdef");
        assert_eq!(delete_range(b"abcdef", 3, 3), b"abcdef");
        assert_eq!(delete_range(b"", 0, 5), b"");
    }

    #[test]
    fn test_sentinel_sessions_in_file_order() {
        let content = format!(
            "{}{}",
            sentinel_block("bbbb2222"),
            sentinel_block("aaaa1111")
        );
        assert!(contains_any_sentinel(&content));
        assert_eq!(
            sentinel_sessions(&content),
            vec![SessionId::from("bbbb2222"), SessionId::from("aaaa1111")]
        );
        assert!(!contains_any_sentinel("nothing here"));
        assert!(sentinel_sessions("nothing here").is_empty());
    }
}
