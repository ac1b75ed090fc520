//! Bounded text for persisted fields
//!
//! Values longer than the capacity are cut at the last UTF-8 character
//! boundary that fits, never rejected.

use core::fmt;
use core::ops::Deref;

use heapless::String;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

/// A string holding at most `N` bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundedText<const N: usize>(String<N>);

impl<const N: usize> BoundedText<N> {
    /// Maximum length in bytes
    pub const CAPACITY: usize = N;

    /// Create an empty text
    pub const fn new() -> Self {
        Self(String::new())
    }

    /// Create a text from `value`, cutting it to the capacity if needed.
    pub fn truncating(value: &str) -> Self {
        let mut end = value.len().min(N);
        while !value.is_char_boundary(end) {
            end -= 1;
        }
        let mut inner = String::new();
        // `end <= N`, so the push always fits.
        inner.push_str(&value[..end]).ok();
        Self(inner)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl<const N: usize> Deref for BoundedText<N> {
    type Target = str;

    fn deref(&self) -> &str {
        self.as_str()
    }
}

impl<const N: usize> From<&str> for BoundedText<N> {
    fn from(value: &str) -> Self {
        Self::truncating(value)
    }
}

impl<const N: usize> PartialEq<str> for BoundedText<N> {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl<const N: usize> PartialEq<&str> for BoundedText<N> {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl<const N: usize> fmt::Display for BoundedText<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<const N: usize> Serialize for BoundedText<N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de, const N: usize> Deserialize<'de> for BoundedText<N> {
    /// `null` reads as empty text, strings are truncated to capacity.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_option(NullableTextVisitor::<N>)
    }
}

struct NullableTextVisitor<const N: usize>;

impl<'de, const N: usize> Visitor<'de> for NullableTextVisitor<N> {
    type Value = BoundedText<N>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string or null")
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(BoundedText::new())
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(BoundedText::new())
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_str(TextVisitor::<N>)
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        Ok(BoundedText::truncating(value))
    }
}

struct TextVisitor<const N: usize>;

impl<const N: usize> Visitor<'_> for TextVisitor<N> {
    type Value = BoundedText<N>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        Ok(BoundedText::truncating(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_on_char_boundary() {
        // "é" is two bytes; a 3 byte capacity cannot hold "aéé" (5 bytes).
        let text = BoundedText::<3>::truncating("aéé");
        assert_eq!(text, "aé");
    }

}
