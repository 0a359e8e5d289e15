use lattice_http::ServeError;

/// Parses a `Range` header against a resource of `content_length` bytes.
///
/// Returns the requested span as `[start, end)` with `end` exclusive, so the
/// served length is `end - start`. Supported forms are `bytes=a-b`,
/// `bytes=a-` and the suffix form `bytes=-n`; an explicit end is clamped to
/// the resource size. Anything malformed or unreachable is
/// `RangeNotSatisfiable`. Multi-range requests are not supported.
pub fn parse_byte_range(header: &str, content_length: u64) -> Result<(u64, u64), ServeError> {
    let err = || ServeError::range_not_satisfiable(header);

    let ranges = header.trim().strip_prefix("bytes=").ok_or_else(err)?;
    if ranges.contains(',') {
        return Err(err());
    }

    let (start_text, end_text) = ranges.split_once('-').ok_or_else(err)?;

    let (start, end) = if start_text.is_empty() {
        // suffix form: the last n bytes
        let n: u64 = end_text.parse().map_err(|_| err())?;
        (content_length.saturating_sub(n), content_length)
    } else {
        let start: u64 = start_text.parse().map_err(|_| err())?;
        let end = if end_text.is_empty() {
            content_length
        } else {
            let inclusive_end: u64 = end_text.parse().map_err(|_| err())?;
            inclusive_end.saturating_add(1).min(content_length)
        };
        (start, end)
    };

    if start >= end || start >= content_length {
        return Err(err());
    }

    Ok((start, end))
}
