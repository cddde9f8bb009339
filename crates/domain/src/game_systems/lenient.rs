//! Tolerant field deserializers for authored stat blocks.
//!
//! Source documents are hand-edited across many system versions, so a field
//! that is usually a number may turn up as a numeric string, an object, or
//! `null`. These helpers turn anything unreadable into the field's default
//! instead of failing the whole stat block.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient<T> {
    Parsed(T),
    Ignored(IgnoredAny),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberLike {
    Number(f64),
    Text(String),
    Other(IgnoredAny),
}

/// Deserialize `T`, falling back to `T::default()` on a shape mismatch.
pub(crate) fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(match Lenient::<T>::deserialize(deserializer)? {
        Lenient::Parsed(value) => value,
        Lenient::Ignored(_) => T::default(),
    })
}

/// A number, or a string holding one.
pub(crate) fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<NumberLike>::deserialize(deserializer)? {
        Some(NumberLike::Number(n)) => Some(n),
        Some(NumberLike::Text(s)) => s.trim().parse().ok(),
        Some(NumberLike::Other(_)) | None => None,
    })
}

/// A non-empty string.
pub(crate) fn string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(or_default::<D, Option<String>>(deserializer)?.filter(|s| !s.is_empty()))
}
