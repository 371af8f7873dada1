use super::layout;

/// Read the declared payload length from a `display=LLL` header.
///
/// Returns `None` unless the buffer starts with `display=` followed by three
/// ASCII digits whose value is non-zero. A zero length leaves the token to
/// the terminator rule.
///
/// # Examples
/// This helper is part of an internal module, so the example is marked as
/// text example.
/// ```text
/// use rotel_core::protocol::reader::read_display_length;
///
/// assert_eq!(read_display_length(b"display=010"), Some(10));
/// assert_eq!(read_display_length(b"display=000"), None);
/// assert_eq!(read_display_length(b"display=01"), None);
/// ```
pub fn read_display_length(buffer: &[u8]) -> Option<usize> {
    if buffer.len() < layout::DISPLAY_HEADER_LEN || !buffer.starts_with(layout::DISPLAY_PREFIX) {
        return None;
    }
    let digits = &buffer[layout::DISPLAY_LENGTH_RANGE];
    if !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let declared = digits
        .iter()
        .fold(0usize, |acc, digit| acc * 10 + usize::from(digit - b'0'));
    if declared == 0 { None } else { Some(declared) }
}

/// Split a terminated token on its first `=`.
///
/// The value is `None` when the token carries no separator.
pub fn split_token(token: &[u8]) -> (&[u8], Option<&[u8]>) {
    match token.iter().position(|&byte| byte == layout::SEPARATOR) {
        Some(index) => (&token[..index], Some(&token[index + 1..])),
        None => (token, None),
    }
}

pub fn lossy_string(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
