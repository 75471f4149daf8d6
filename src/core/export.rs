//! Export target naming.

use std::path::{Path, PathBuf};

use getrandom::fill as fill_random;

use super::error::{Error, ErrorKind};

const EXPORT_PREFIX: &str = "SlicerBridge_";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InterchangeFormat {
    Step,
}

impl InterchangeFormat {
    pub fn extension(self) -> &'static str {
        match self {
            InterchangeFormat::Step => "step",
        }
    }

    /// Extensions a source file may carry to count as this format already.
    pub fn accepts_extension(self, ext: &str) -> bool {
        match self {
            InterchangeFormat::Step => {
                ext.eq_ignore_ascii_case("step") || ext.eq_ignore_ascii_case("stp")
            }
        }
    }
}

/// Builds `<dir>/SlicerBridge_<32 hex chars>.<ext>`.
///
/// Nothing is created on disk; 128 random bits keep concurrent invocations
/// from colliding.
pub fn allocate_export_path(dir: &Path, format: InterchangeFormat) -> Result<PathBuf, Error> {
    let mut bytes = [0u8; 16];
    fill_random(&mut bytes).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message(format!("failed to generate export file name: {err}"))
    })?;
    let name = format!("{EXPORT_PREFIX}{}.{}", hex_encode(&bytes), format.extension());
    Ok(dir.join(name))
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(nibble_hex(byte >> 4));
        out.push(nibble_hex(byte & 0x0f));
    }
    out
}

fn nibble_hex(nibble: u8) -> char {
    match nibble {
        0..=9 => char::from(b'0' + nibble),
        _ => char::from(b'a' + (nibble - 10)),
    }
}

#[cfg(test)]
mod tests {
    use super::{InterchangeFormat, allocate_export_path, hex_encode};
    use std::path::Path;

    #[test]
    fn export_paths_are_unique_and_typed() {
        let dir = Path::new("/tmp");
        let a = allocate_export_path(dir, InterchangeFormat::Step).expect("a");
        let b = allocate_export_path(dir, InterchangeFormat::Step).expect("b");
        assert_ne!(a, b);
        assert_eq!(a.parent(), Some(dir));
        assert_eq!(a.extension().and_then(|e| e.to_str()), Some("step"));
        let stem = a.file_stem().and_then(|s| s.to_str()).expect("stem");
        assert!(stem.starts_with("SlicerBridge_"));
        assert_eq!(stem.len(), "SlicerBridge_".len() + 32);
    }

    #[test]
    fn step_accepts_both_spellings() {
        assert!(InterchangeFormat::Step.accepts_extension("STP"));
        assert!(InterchangeFormat::Step.accepts_extension("step"));
        assert!(!InterchangeFormat::Step.accepts_extension("stl"));
    }

    #[test]
    fn hex_is_lowercase() {
        assert_eq!(hex_encode(&[0x00, 0xab, 0x7f]), "00ab7f");
    }
}
