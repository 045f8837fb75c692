//! Short sequential file identifiers (`A1`..`Z99`, wrapping back to `A1`).
//!
//! The counter lives in a small state file under the storage root and is
//! advanced read-modify-write in place. That is only safe with a single
//! writer; the deployment runs one process, which is the stated operating
//! constraint. Any I/O failure yields the `ERR00` sentinel instead of an
//! error, and callers treat the sentinel as a hard failure of the upload.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::error;

/// Returned instead of an id when the counter cannot be read or advanced.
pub const FAILURE_SENTINEL: &str = "ERR00";

/// Stateful short-id source. Injected into app state; the in-memory
/// variant keeps tests deterministic.
pub struct ShortIdGenerator {
    inner: Mutex<Backend>,
}

enum Backend {
    File { path: PathBuf },
    Memory { current: Option<String> },
}

impl ShortIdGenerator {
    /// Counter persisted at `path`. The file is created on first advance.
    pub fn file_backed(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: Mutex::new(Backend::File { path: path.into() }),
        }
    }

    /// Purely in-memory counter starting from a fresh (absent) state.
    pub fn in_memory() -> Self {
        Self {
            inner: Mutex::new(Backend::Memory { current: None }),
        }
    }

    /// Advances the counter and returns the new id. A missing or
    /// malformed stored value resets the sequence to `A1`. Returns
    /// [`FAILURE_SENTINEL`] if the state file cannot be read or written.
    pub fn next_id(&self) -> String {
        let mut inner = match self.inner.lock() {
            Ok(guard) => guard,
            Err(_) => {
                error!("short-id counter lock poisoned");
                return FAILURE_SENTINEL.to_string();
            }
        };
        match &mut *inner {
            Backend::File { path } => {
                let current = match std::fs::read_to_string(&*path) {
                    Ok(raw) => Some(raw),
                    Err(e) if e.kind() == ErrorKind::NotFound => None,
                    Err(e) => {
                        error!(path = %path.display(), error = %e, "short-id counter read failed");
                        return FAILURE_SENTINEL.to_string();
                    }
                };
                let next = advance(current.as_deref());
                if let Err(e) = std::fs::write(&*path, &next) {
                    error!(path = %path.display(), error = %e, "short-id counter write failed");
                    return FAILURE_SENTINEL.to_string();
                }
                next
            }
            Backend::Memory { current } => {
                let next = advance(current.as_deref());
                *current = Some(next.clone());
                next
            }
        }
    }
}

fn advance(current: Option<&str>) -> String {
    match current.and_then(parse_counter) {
        None => "A1".to_string(),
        Some((letter, 99)) => {
            let next_letter = if letter == 'Z' {
                'A'
            } else {
                (letter as u8 + 1) as char
            };
            format!("{next_letter}1")
        }
        Some((letter, number)) => format!("{letter}{}", number + 1),
    }
}

fn parse_counter(raw: &str) -> Option<(char, u8)> {
    let trimmed = raw.trim();
    let mut chars = trimmed.chars();
    let letter = chars.next().filter(char::is_ascii_uppercase)?;
    let digits = chars.as_str();
    if digits.is_empty() || digits.len() > 2 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let number: u8 = digits.parse().ok()?;
    (1..=99).contains(&number).then_some((letter, number))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_starts_at_a1() {
        let gen = ShortIdGenerator::in_memory();
        assert_eq!(gen.next_id(), "A1");
        assert_eq!(gen.next_id(), "A2");
    }

    #[test]
    fn sequence_rolls_letter_after_99() {
        let gen = ShortIdGenerator::in_memory();
        let mut last = String::new();
        for _ in 0..99 {
            last = gen.next_id();
        }
        assert_eq!(last, "A99");
        assert_eq!(gen.next_id(), "B1");
    }

    #[test]
    fn z99_wraps_to_a1() {
        assert_eq!(advance(Some("Z99")), "A1");
    }

    #[test]
    fn malformed_state_resets_to_a1() {
        assert_eq!(advance(Some("")), "A1");
        assert_eq!(advance(Some("garbage")), "A1");
        assert_eq!(advance(Some("a7")), "A1");
        assert_eq!(advance(Some("A0")), "A1");
        assert_eq!(advance(Some("A100")), "A1");
    }

    #[test]
    fn file_backed_counter_persists_between_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file_id_counter.txt");

        let gen = ShortIdGenerator::file_backed(&path);
        assert_eq!(gen.next_id(), "A1");
        assert_eq!(gen.next_id(), "A2");
        drop(gen);

        let reopened = ShortIdGenerator::file_backed(&path);
        assert_eq!(reopened.next_id(), "A3");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "A3");
    }

    #[test]
    fn unwritable_path_returns_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-subdir").join("counter.txt");
        let gen = ShortIdGenerator::file_backed(path);
        assert_eq!(gen.next_id(), FAILURE_SENTINEL);
    }
}
