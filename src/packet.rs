//! Connectionless control packet framing.
//!
//! Every out-of-band datagram starts with four `0xFF` bytes. Requests end
//! with a NUL; `print` replies carry the literal `print\n` after the marker.

use crate::util::latin1;

/// Marker that opens every connectionless datagram.
pub const CONTROL_PREFIX: [u8; 4] = [0xFF; 4];

/// Header the server puts in front of textual replies.
pub const PRINT_PREFIX: &[u8] = b"\xFF\xFF\xFF\xFFprint\n";

/// Frame `command` as a single control datagram.
#[must_use]
pub fn encode(command: &str) -> Vec<u8> {
  let body = latin1::encode(command);
  let mut datagram = Vec::with_capacity(CONTROL_PREFIX.len() + body.len() + 1);
  datagram.extend_from_slice(&CONTROL_PREFIX);
  datagram.extend_from_slice(&body);
  datagram.push(0);
  datagram
}

/// Remove the `print` header if present, leaving other payloads untouched.
#[must_use]
pub fn strip_print(reply: &[u8]) -> &[u8] {
  reply.strip_prefix(PRINT_PREFIX).unwrap_or(reply)
}

/// Strip the `print` header and decode the payload as text.
#[must_use]
pub fn decode_print(reply: &[u8]) -> String {
  latin1::decode(strip_print(reply))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn encode_wraps_command() {
    assert_eq!(encode("status"), b"\xFF\xFF\xFF\xFFstatus\0");
  }

  #[test]
  fn print_header_round_trip() {
    let payload = "\\mapname\\arenaball\n0 204 \"JoeJoe\"\n";
    let framed = encode(payload);
    let body = &framed[CONTROL_PREFIX.len()..framed.len() - 1];

    let mut reply = PRINT_PREFIX.to_vec();
    reply.extend_from_slice(body);

    assert_eq!(decode_print(&reply), payload);
  }

  #[test]
  fn unprefixed_reply_is_unchanged() {
    assert_eq!(strip_print(b"hello"), b"hello");
    // marker without the print keyword
    assert_eq!(
      strip_print(b"\xFF\xFF\xFF\xFFchallenge 123"),
      b"\xFF\xFF\xFF\xFFchallenge 123"
    );
  }
}
