//! Receiver status line parser
//!
//! Status datagrams are ASCII `"$<paramId>,<paramValue>"`, optionally
//! followed by trailing bytes (newline, padding) which are ignored.

/// Returns `(param_id, param_value)` or `None` for malformed lines
pub fn parse_status_line(data: &[u8]) -> Option<(i32, i32)> {
    let rest = data.strip_prefix(b"$")?;
    let (id, rest) = scan_int(rest)?;
    let rest = rest.strip_prefix(b",")?;
    let (value, _) = scan_int(rest)?;
    Some((id, value))
}

/// Leading whitespace, optional sign, at least one digit
fn scan_int(data: &[u8]) -> Option<(i32, &[u8])> {
    let start = data.iter().position(|b| !b.is_ascii_whitespace())?;
    let data = &data[start..];
    let sign_len = usize::from(matches!(data.first(), Some(b'-' | b'+')));
    let digits = data[sign_len..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count();
    if digits == 0 {
        return None;
    }
    let end = sign_len + digits;
    let text = std::str::from_utf8(&data[..end]).ok()?;
    Some((text.parse().ok()?, &data[end..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_pair() {
        assert_eq!(parse_status_line(b"$12,150"), Some((12, 150)));
    }

    #[test]
    fn tolerates_whitespace_and_trailer() {
        assert_eq!(parse_status_line(b"$ 12, 150\n"), Some((12, 150)));
        assert_eq!(parse_status_line(b"$1,-3\0\0"), Some((1, -3)));
    }

    #[test]
    fn rejects_malformed() {
        assert_eq!(parse_status_line(b""), None);
        assert_eq!(parse_status_line(b"12,150"), None);
        assert_eq!(parse_status_line(b"$12"), None);
        assert_eq!(parse_status_line(b"$12,"), None);
        assert_eq!(parse_status_line(b"$x,1"), None);
        assert_eq!(parse_status_line(b"$99999999999,1"), None);
    }
}
