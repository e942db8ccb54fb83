/// Helpers for normalising console input before it is sent as an RCON
/// command.
pub mod command {
  /// Trim trailing carriage-return and line-feed characters from raw input.
  ///
  /// Empty or whitespace-only input yields `None`, signalling that nothing
  /// should be dispatched. Embedded NUL bytes are rejected as well because
  /// they would terminate the control packet early.
  ///
  /// # Examples
  ///
  /// ```
  /// use dpquery::util::command::sanitize;
  ///
  /// assert_eq!(sanitize("sv maplist\n"), Some("sv maplist".to_string()));
  /// assert_eq!(sanitize("\n\n"), None);
  /// ```
  #[must_use]
  pub fn sanitize(raw: &str) -> Option<String> {
    let trimmed = raw.trim_matches(['\r', '\n']);
    if trimmed.trim().is_empty() || trimmed.contains('\0') {
      None
    } else {
      Some(trimmed.to_string())
    }
  }

  /// Whether the input asks the interactive prompt to end.
  ///
  /// Only the local `exit` verb counts; `quit` is a real server command and
  /// is forwarded.
  #[must_use]
  pub fn is_exit_command(raw: &str) -> bool {
    matches!(
      sanitize(raw)
        .as_deref()
        .map(|cmd| cmd.trim().eq_ignore_ascii_case("exit")),
      Some(true)
    )
  }
}

/// Byte-transparent conversion between wire bytes and `String`.
///
/// Server replies carry raw 8-bit bytes (markup control codes, extended font
/// glyphs). Mapping every byte to the `char` with the same code point keeps
/// them intact through `&str` based parsing.
pub mod latin1 {
  /// Decode bytes one-to-one into `char`s `U+0000..=U+00FF`.
  #[must_use]
  pub fn decode(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
  }

  /// Encode text back to bytes. Characters outside `U+0000..=U+00FF`
  /// become `?`.
  #[must_use]
  pub fn encode(text: &str) -> Vec<u8> {
    text
      .chars()
      .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
      .collect()
  }
}
