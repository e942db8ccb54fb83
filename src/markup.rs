//! Player name markup ("funname") codec.
//!
//! Names may embed four control bytes: end-format, underline, italics and
//! color. A color byte is always followed by one color-index byte. All other
//! bytes come from the game font and are mapped to a printable ASCII
//! approximation.

use std::fmt::Write as _;

use crate::util::latin1;

pub const END_FORMAT: u8 = 133;
pub const UNDERLINE: u8 = 134;
pub const ITALICS: u8 = 135;
pub const COLOR: u8 = 136;

/// Game font byte to ASCII.
const CHAR_REMAP: &[u8; 256] = b"\
  \0---_*t.N-\n#.>**\
  []@@@@@@<>.-*---\
  \x20!\"#$%&'()*+,-./\
  0123456789:;<=>?\
  @ABCDEFGHIJKLMNO\
  PQRSTUVWXYZ[\\]^_\
  `abcdefghijklmno\
  pqrstuvwxyz{|}~<\
  (=)^!OUICCR#?>**\
  []@@@@@@<>*X*---\
  \x20!\"#$%&'()*+,-./\
  0123456789:;<=>?\
  @ABCDEFGHIJKLMNO\
  PQRSTUVWXYZ[\\]^_\
  `ABCDEFGHIJKLMNO\
  PQRSTUVWXYZ{|}~<";

/// Hex colors addressed by `index byte - 32`. Blank entries have no visible
/// color; the last slot (index byte `0xFF`) is unassigned.
const PALETTE: [&str; 224] = [
  "663A4D", "AA7356", "", "E2B171", "CF8254", "AC6245", "8E4A33", "C1C126",
  "9C9C17", "588B7F", "B99736", "8E6F22", "7D5A2A", "C08FFF", "9453EA", "6E21D3",
  "242424", "343434", "4C4C4C", "656565", "818181", "9A9A9B", "B7B7B6", "D4D4D4",
  "EEEDED", "FFFFFF", "2E344B", "", "A8B8C6", "061E5B", "590806", "FFFFB4",
  "F87A63", "FD1B05", "FD5C05", "FD8505", "FDBC05", "FAEF05", "D2FD05", "9DFD05",
  "67FD05", "31FD05", "08FD11", "05FD45", "05FD7B", "05FDB0", "05FCE6", "05DEFD",
  "05A8FD", "0572FD", "053CFD", "0B0DFD", "3A05FD", "", "7005FD", "A505FD",
  "DB05FD", "FC05E8", "FD05B3", "", "98B4AA", "", "2B6B5B", "035245",
  "FE4321", "77302A", "77452A", "77522A", "77632A", "77732A", "6A772A", "5A772A",
  "48772A", "38772A", "2B772D", "2A773E", "2A774E", "2A7760", "2A7770", "2A6E77",
  "2A5D77", "2A4C77", "2A3B77", "2B2B77", "3A2A77", "4B2A77", "5C2A77", "6D2A77",
  "772A71", "772A61", "772A4F", "FFFD95", "F89FE8", "FEA791", "96CBFD", "F0CAB0",
  "B49C85", "C3C383", "95BC55", "00DF93", "00B8D7", "8188A3", "DA24F7", "FF4BA0",
  "", "FFB104", "7CFF78", "557DFE", "FEFF62", "E06FC8", "F66E5C", "69ADFC",
  "DCB08D", "987A5C", "ABAA60", "7AA433", "00BB79", "0099B4", "6C7390", "C100E2",
  "ED1179", "FF9000", "2FFF38", "2A4CFD", "EADB1D", "C250A4", "E75643", "4590FA",
  "B47D60", "7E5E3C", "847E38", "537F0F", "009661", "007D91", "535B79", "A100C1",
  "C3005B", "F96800", "00E005", "0000FF", "D1B813", "993D80", "C42821", "2972F9",
  "926043", "704C28", "656028", "385F0C", "007147", "005C6C", "424A69", "7A0098",
  "89003E", "C1440C", "009124", "00007E", "AE8113", "6C2758", "841C18", "2653DE",
  "6C4F2A", "5C3E1E", "484D1D", "244A0F", "005534", "00414A", "2F3756", "4C0065",
  "580023", "7A2A06", "016219", "00004A", "9B6C00", "521D46", "5A1715", "1A318B",
  "E75A00", "F26C00", "F78100", "FC9B00", "FEB200", "FFC900", "FFDE13", "",
  "FFEC1D", "FFF929", "FFFF3E", "FFFF7C", "FFFFB2", "FFFFDB", "FFFFF7", "14235F",
  "B57170", "B59070", "B5AB70", "A6B570", "8BB570", "70B570", "70B57C", "70B59A",
  "6CB1AE", "709EB5", "7080B5", "7070B5", "8670B5", "A370B5", "B46EAD", "B57094",
  "663A3A", "664B3A", "665D3A", "5A663A", "46663A", "3A663A", "3A663D", "3A6651",
  "386261", "3A5366", "3A4066", "3A3A66", "443A66", "583A66", "643A5F", "",
];

/// Which formatting toggles [`to_html`] renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HtmlOptions {
  pub color: bool,
  pub italics: bool,
  pub underline: bool,
}

impl Default for HtmlOptions {
  fn default() -> Self {
    Self {
      color: true,
      italics: true,
      underline: true,
    }
  }
}

/// Palette entry for a color-index byte.
///
/// `None` means the byte has no slot at all (below 32). `Some("")` is a slot
/// without a visible color.
#[must_use]
pub fn palette_color(index: u8) -> Option<&'static str> {
  index
    .checked_sub(32)
    .and_then(|slot| PALETTE.get(usize::from(slot)))
    .copied()
}

/// Strip all formatting and map the name to plain ASCII.
#[must_use]
pub fn clean(text: &str) -> String {
  clean_with(text, false)
}

/// Map the name to ASCII, optionally keeping the formatting control bytes
/// (and the color-index byte after each color code) verbatim.
#[must_use]
pub fn clean_with(text: &str, keep_formatting: bool) -> String {
  latin1::decode(&clean_bytes(&latin1::encode(text), keep_formatting))
}

fn clean_bytes(raw: &[u8], keep_formatting: bool) -> Vec<u8> {
  let mut out = Vec::with_capacity(raw.len());
  let mut bytes = raw.iter().copied();

  while let Some(byte) = bytes.next() {
    match byte {
      COLOR => {
        let index = bytes.next();
        if keep_formatting {
          out.push(COLOR);
          out.extend(index);
        }
      }
      ITALICS | UNDERLINE | END_FORMAT => {
        if keep_formatting {
          out.push(byte);
        }
      }
      other => out.push(CHAR_REMAP[usize::from(other)]),
    }
  }

  out
}

/// Render a name as HTML with its colors, italics and underlines.
///
/// Text is escaped; the index byte after a color code is not text and is
/// never escaped or re-read as a control byte. Every opened element is
/// closed at the end, innermost first.
#[must_use]
pub fn to_html(text: &str, options: HtmlOptions) -> String {
  let cleaned = clean_bytes(&latin1::encode(text), true);
  let mut out = String::with_capacity(cleaned.len() * 2);
  let mut closers: Vec<&'static str> = Vec::new();
  let mut bytes = cleaned.iter().copied();

  while let Some(byte) = bytes.next() {
    match byte {
      COLOR => {
        let hex = bytes
          .next()
          .and_then(palette_color)
          .filter(|hex| !hex.is_empty());
        if let (true, Some(hex)) = (options.color, hex) {
          let _ = write!(out, "<span style=\"color: #{hex}\">");
          closers.push("</span>");
        }
      }
      ITALICS => {
        if options.italics {
          out.push_str("<em>");
          closers.push("</em>");
        }
      }
      UNDERLINE => {
        if options.underline {
          out.push_str("<span style=\"text-decoration: underline\">");
          closers.push("</span>");
        }
      }
      END_FORMAT => {}
      other => push_escaped(&mut out, other),
    }
  }

  for closer in closers.iter().rev() {
    out.push_str(closer);
  }
  out
}

fn push_escaped(out: &mut String, byte: u8) {
  match byte {
    b'&' => out.push_str("&amp;"),
    b'<' => out.push_str("&lt;"),
    b'>' => out.push_str("&gt;"),
    b'"' => out.push_str("&quot;"),
    b'\'' => out.push_str("&#39;"),
    other => out.push(char::from(other)),
  }
}
