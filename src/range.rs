//! Page range expressions
//!
//! Turns user input like `"1,3-5"` into zero-based page indices. Numbers in
//! the expression are 1-based; the returned indices are 0-based.

use crate::error::RangeError;

/// Parse a page range expression into zero-based page indices
///
/// Supported tokens, separated by commas:
/// - `"3"` → `[2]`
/// - `"3-5"` → `[2, 3, 4]`
///
/// Order and repetition are preserved: `"3,1,1"` → `[2, 0, 0]`.
/// Whitespace around tokens and around the hyphen is ignored.
///
/// Single numbers beyond `page_count` are returned as-is so the caller can
/// decide whether to drop them (split does). A range that runs past the end
/// of the document is truncated at the last page, or to its first number when
/// it starts past the end, which is equivalent after out-of-bounds filtering
/// and keeps `"1-999999999"` from allocating.
///
/// Errors:
/// - empty or non-numeric token → [`RangeError::Malformed`]
/// - `"5-3"` → [`RangeError::InvalidRange`]
/// - page `0` → [`RangeError::OutOfBounds`] (there is no page before the first)
pub fn parse(expr: &str, page_count: usize) -> Result<Vec<usize>, RangeError> {
    let mut indices = Vec::new();

    for token in expr.split(',') {
        let token = token.trim();
        if token.is_empty() {
            return Err(RangeError::Malformed { token: token.to_string() });
        }

        if let Some((start, end)) = token.split_once('-') {
            let start = parse_page_number(start, token, page_count)?;
            let end = parse_page_number(end, token, page_count)?;

            if start > end {
                return Err(RangeError::InvalidRange { start, end });
            }

            let last = end.min(page_count.max(start));
            indices.extend((start..=last).map(|page| page - 1));
        } else {
            let page = parse_page_number(token, token, page_count)?;
            indices.push(page - 1);
        }
    }

    Ok(indices)
}

/// Parse an expression and reject any index outside the document
pub fn parse_strict(expr: &str, page_count: usize) -> Result<Vec<usize>, RangeError> {
    let indices = parse(expr, page_count)?;
    if let Some(&index) = indices.iter().find(|&&index| index >= page_count) {
        return Err(RangeError::OutOfBounds { page: index + 1, page_count });
    }
    Ok(indices)
}

/// Keep only indices that address an existing page, preserving order
pub fn in_bounds(indices: &[usize], page_count: usize) -> Vec<usize> {
    indices.iter().copied().filter(|&index| index < page_count).collect()
}

/// Translate 1-based page numbers into 0-based indices, skipping anything
/// that does not address a page (`<= 0` or `> page_count`)
pub fn from_page_numbers(pages: &[i64], page_count: usize) -> Vec<usize> {
    pages
        .iter()
        .filter(|&&page| page >= 1 && (page as u64) <= page_count as u64)
        .map(|&page| (page - 1) as usize)
        .collect()
}

fn parse_page_number(part: &str, token: &str, page_count: usize) -> Result<usize, RangeError> {
    let part = part.trim();
    // Reject signs and anything else `usize::from_str` would tolerate
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RangeError::Malformed { token: token.to_string() });
    }

    let page: usize = part
        .parse()
        .map_err(|_| RangeError::Malformed { token: token.to_string() })?;

    if page == 0 {
        return Err(RangeError::OutOfBounds { page, page_count });
    }

    Ok(page)
}
