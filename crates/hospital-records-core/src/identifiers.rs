//! Human-readable identifiers (`PAT-2024-0042`, `BILL-2024-0007`).
//!
//! Format: `{PREFIX}-{YYYY}-{NNNN}` with a random zero-padded suffix. Candidates
//! are checked against existing rows before use, and the schema's UNIQUE
//! constraint rejects anything that races past the check.

use log::warn;
use thiserror::Error;

use crate::db::DbError;

/// Number of distinct suffixes per prefix and year.
pub const SUFFIX_SPACE: u32 = 10_000;

#[derive(Error, Debug)]
pub enum IdentifierError {
    #[error("No free {prefix} identifier after {attempts} attempts")]
    Exhausted { prefix: String, attempts: u32 },

    #[error(transparent)]
    Database(#[from] DbError),
}

/// Render an identifier.
pub fn format_identifier(prefix: &str, year: i32, suffix: u32) -> String {
    format!("{}-{:04}-{:04}", prefix, year, suffix % SUFFIX_SPACE)
}

/// Split an identifier back into year and suffix if it has the given prefix.
pub fn parse_identifier(id: &str, prefix: &str) -> Option<(i32, u32)> {
    let rest = id.strip_prefix(prefix)?.strip_prefix('-')?;
    let (year, suffix) = rest.split_once('-')?;
    if year.len() != 4 || suffix.len() != 4 {
        return None;
    }
    if !year.bytes().all(|b| b.is_ascii_digit()) || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((year.parse().ok()?, suffix.parse().ok()?))
}

/// A random suffix below [`SUFFIX_SPACE`], drawn from a v4 UUID.
pub fn random_suffix() -> u32 {
    (uuid::Uuid::new_v4().as_u128() % SUFFIX_SPACE as u128) as u32
}

/// Generate an identifier that `exists` reports as free.
pub fn generate_unique<F>(
    prefix: &str,
    year: i32,
    max_attempts: u32,
    exists: F,
) -> Result<String, IdentifierError>
where
    F: FnMut(&str) -> Result<bool, DbError>,
{
    generate_unique_with(prefix, year, max_attempts, exists, random_suffix)
}

/// [`generate_unique`] with an explicit suffix source.
pub fn generate_unique_with<F, R>(
    prefix: &str,
    year: i32,
    max_attempts: u32,
    mut exists: F,
    mut next_suffix: R,
) -> Result<String, IdentifierError>
where
    F: FnMut(&str) -> Result<bool, DbError>,
    R: FnMut() -> u32,
{
    for attempt in 1..=max_attempts {
        let candidate = format_identifier(prefix, year, next_suffix());
        if !exists(&candidate)? {
            return Ok(candidate);
        }
        warn!(
            "Identifier {} already taken (attempt {}/{})",
            candidate, attempt, max_attempts
        );
    }
    Err(IdentifierError::Exhausted {
        prefix: prefix.to_string(),
        attempts: max_attempts,
    })
}
