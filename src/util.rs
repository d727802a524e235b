//! Small utility helpers used across modules.

/// Decode HTML entities (`&quot;`, `&#039;`, `&eacute;`, ...) into plain text.
/// The trivia provider encodes every text field this way by default.
pub fn decode_entities(s: &str) -> String {
  html_escape::decode_html_entities(s).into_owned()
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge response payloads. Cuts on a char boundary.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut end = max;
  while !s.is_char_boundary(end) {
    end -= 1;
  }
  format!("{}… ({} bytes total)", &s[..end], s.len())
}
