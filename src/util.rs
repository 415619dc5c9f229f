//! Small utility helpers used across modules.

/// Truncate to at most `max` bytes, backing off to the previous char boundary.
pub fn truncate_on_boundary(s: &str, max: usize) -> &str {
  if s.len() <= max {
    return s;
  }
  let mut end = max;
  while !s.is_char_boundary(end) {
    end -= 1;
  }
  &s[..end]
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with whole response bodies.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    s.to_string()
  } else {
    format!("{}… ({} bytes total)", truncate_on_boundary(s, max), s.len())
  }
}

/// Cap text at `max_chars` characters, appending a marker when something was cut.
pub fn cap_chars(s: &str, max_chars: usize) -> String {
  match s.char_indices().nth(max_chars) {
    None => s.to_string(),
    Some((idx, _)) => format!("{}\n[... truncated]", &s[..idx]),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn truncation_respects_multibyte_chars() {
    let s = "añoñ";
    // 'ñ' is two bytes; cutting at 2 would split it
    assert_eq!(truncate_on_boundary(s, 2), "a");
    assert_eq!(truncate_on_boundary(s, 3), "añ");
    assert_eq!(truncate_on_boundary(s, 100), s);
  }

  #[test]
  fn trunc_for_log_reports_size() {
    let out = trunc_for_log("abcdefgh", 3);
    assert!(out.starts_with("abc…"));
    assert!(out.contains("8 bytes total"));
  }

  #[test]
  fn cap_chars_counts_chars_not_bytes() {
    assert_eq!(cap_chars("ñññ", 3), "ñññ");
    let capped = cap_chars("ñññ", 2);
    assert!(capped.starts_with("ññ\n"));
    assert!(capped.ends_with("[... truncated]"));
  }
}
