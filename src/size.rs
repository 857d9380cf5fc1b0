use super::{
    cursor::{Reader, Writer},
    error::Error,
    numbers::u32,
};
use std::{fmt, sync::Arc};
use tracing::debug;

/// Integer codec viewed through `usize`: item counts, byte lengths, option
/// discriminants and enum ordinals are all written through it.
pub trait PrefixSerializer: Send + Sync {
    fn prefix_description(&self) -> &str;

    fn prefix_fixed_size(&self) -> Option<usize>;

    fn prefix_max_size(&self) -> Option<usize>;

    fn serialize_usize(&self, value: usize) -> Result<Vec<u8>, Error>;

    fn deserialize_usize(&self, bytes: &[u8], offset: usize) -> Result<(usize, usize), Error>;
}

/// How a repeated structure knows its item count.
#[derive(Clone)]
pub enum Size {
    /// Count written before the items.
    Prefix(Arc<dyn PrefixSerializer>),
    /// Exactly this many items, nothing written.
    Fixed(usize),
    /// As many items as the rest of the buffer holds.
    Remainder,
}

/// What a codec with a natural empty value does with an empty buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EmptyBuffer {
    /// Decode the empty value without consuming anything.
    #[default]
    Tolerant,
    /// Fail with [`Error::EmptyBuffer`].
    Strict,
}

impl Size {
    pub fn prefix(serializer: impl PrefixSerializer + 'static) -> Self {
        Self::Prefix(Arc::new(serializer))
    }

    pub fn description(&self) -> String {
        match self {
            Self::Prefix(prefix) => prefix.prefix_description().to_string(),
            Self::Fixed(n) => n.to_string(),
            Self::Remainder => "remainder".to_string(),
        }
    }

    /// Fixed size of `self` worth of items of `item_fixed_size` bytes each.
    pub(crate) fn fixed_size(&self, item_fixed_size: Option<usize>) -> Option<usize> {
        match self {
            Self::Fixed(0) => Some(0),
            Self::Fixed(n) => item_fixed_size?.checked_mul(*n),
            Self::Prefix(prefix) if item_fixed_size == Some(0) => prefix.prefix_fixed_size(),
            Self::Prefix(_) | Self::Remainder => None,
        }
    }

    pub(crate) fn max_size(&self, item_max_size: Option<usize>) -> Option<usize> {
        match self {
            Self::Fixed(0) => Some(0),
            Self::Fixed(n) => item_max_size?.checked_mul(*n),
            Self::Prefix(prefix) if item_max_size == Some(0) => prefix.prefix_max_size(),
            Self::Prefix(_) | Self::Remainder => None,
        }
    }

    /// Rejects policies that cannot be decoded with the given items.
    pub(crate) fn check_items(
        &self,
        item_fixed_size: Option<usize>,
        serializer: &str,
    ) -> Result<(), Error> {
        match (self, item_fixed_size) {
            (Self::Remainder, None) => Err(Error::expected_fixed_size(format!(
                "serializers of \"remainder\" size must have fixed-size items, {serializer} does not"
            ))),
            (Self::Remainder, Some(0)) => Err(Error::expected_fixed_size(format!(
                "serializers of \"remainder\" size cannot hold zero-sized items ({serializer})"
            ))),
            _ => Ok(()),
        }
    }

    /// Whether an empty buffer can stand for "no items" under this policy.
    pub(crate) fn allows_empty(&self) -> bool {
        !matches!(self, Self::Fixed(n) if *n > 0)
    }

    /// Writes the count prefix, or checks the count against a fixed size.
    pub(crate) fn write_count(
        &self,
        out: &mut Writer,
        count: usize,
        serializer: &str,
    ) -> Result<(), Error> {
        match self {
            Self::Prefix(prefix) => {
                out.write(&prefix.serialize_usize(count)?);
                Ok(())
            }
            Self::Fixed(n) if *n != count => Err(Error::InvalidNumberOfItems {
                serializer: serializer.to_string(),
                expected: *n,
                actual: count,
            }),
            Self::Fixed(_) | Self::Remainder => Ok(()),
        }
    }

    /// Reads or computes the number of items to decode.
    pub(crate) fn read_count(
        &self,
        buf: &mut Reader<'_>,
        item_fixed_size: Option<usize>,
        serializer: &str,
    ) -> Result<usize, Error> {
        match self {
            Self::Prefix(prefix) => buf.decode_prefix(prefix.as_ref()),
            Self::Fixed(n) => Ok(*n),
            Self::Remainder => {
                let item_size = item_fixed_size
                    .filter(|&size| size > 0)
                    .ok_or_else(|| Error::expected_fixed_size(serializer.to_string()))?;
                let available = buf.remaining().len();
                if available % item_size != 0 {
                    debug!(
                        serializer,
                        available, item_size, "ignoring remainder bytes that do not fill an item"
                    );
                }
                Ok(available / item_size)
            }
        }
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::prefix(u32())
    }
}

impl From<usize> for Size {
    fn from(n: usize) -> Self {
        Self::Fixed(n)
    }
}

impl fmt::Debug for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prefix(prefix) => f.debug_tuple("Prefix").field(&prefix.prefix_description()).finish(),
            Self::Fixed(n) => f.debug_tuple("Fixed").field(n).finish(),
            Self::Remainder => f.write_str("Remainder"),
        }
    }
}

impl EmptyBuffer {
    /// Returns `true` when the caller should produce its empty value instead
    /// of reading from `remaining`.
    pub(crate) fn take_empty(self, remaining: &[u8], serializer: &str) -> Result<bool, Error> {
        if !remaining.is_empty() {
            return Ok(false);
        }
        match self {
            Self::Tolerant => {
                debug!(serializer, "decoding empty buffer as empty value");
                Ok(true)
            }
            Self::Strict => Err(Error::empty_buffer(serializer)),
        }
    }
}

/// Adds up sizes, `None` as soon as one is unknown.
pub(crate) fn sum_sizes(sizes: impl IntoIterator<Item = Option<usize>>) -> Option<usize> {
    sizes
        .into_iter()
        .try_fold(0_usize, |acc, size| acc.checked_add(size?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numbers::u8;

    #[test]
    fn size_arithmetic() {
        let prefixed = Size::default();
        assert_eq!(prefixed.description(), "u32(le)");
        assert_eq!(prefixed.fixed_size(Some(2)), None);
        assert_eq!(prefixed.fixed_size(Some(0)), Some(4));
        assert_eq!(prefixed.max_size(Some(2)), None);

        let fixed = Size::from(3);
        assert_eq!(fixed.description(), "3");
        assert_eq!(fixed.fixed_size(Some(2)), Some(6));
        assert_eq!(fixed.fixed_size(None), None);
        assert_eq!(fixed.max_size(Some(5)), Some(15));
        assert_eq!(Size::Fixed(0).fixed_size(None), Some(0));

        assert_eq!(Size::Remainder.description(), "remainder");
        assert_eq!(Size::Remainder.fixed_size(Some(1)), None);
    }

    #[test]
    fn remainder_needs_fixed_items() {
        assert!(Size::Remainder.check_items(Some(2), "x").is_ok());
        assert!(matches!(
            Size::Remainder.check_items(None, "x"),
            Err(Error::InvalidComposition(_))
        ));
        assert!(matches!(
            Size::Remainder.check_items(Some(0), "x"),
            Err(Error::InvalidComposition(_))
        ));
        assert!(Size::Fixed(2).check_items(None, "x").is_ok());
    }

    #[test]
    fn counts() {
        let mut out = Writer::default();
        Size::prefix(u8()).write_count(&mut out, 3, "x").unwrap();
        assert_eq!(out.buf, [3]);
        assert_eq!(
            Size::Fixed(2).write_count(&mut out, 3, "x"),
            Err(Error::InvalidNumberOfItems {
                serializer: "x".into(),
                expected: 2,
                actual: 3
            })
        );

        // remainder truncates to whole items
        let mut buf = Reader::new(&[1, 2, 3, 4, 5], 0);
        assert_eq!(Size::Remainder.read_count(&mut buf, Some(2), "x"), Ok(2));
    }

    #[test]
    fn empty_policy() {
        assert_eq!(EmptyBuffer::Tolerant.take_empty(&[], "x"), Ok(true));
        assert_eq!(EmptyBuffer::Tolerant.take_empty(&[0], "x"), Ok(false));
        assert_eq!(EmptyBuffer::Strict.take_empty(&[0], "x"), Ok(false));
        assert_eq!(
            EmptyBuffer::Strict.take_empty(&[], "x"),
            Err(Error::empty_buffer("x"))
        );
    }

    #[test]
    fn sums() {
        assert_eq!(sum_sizes([Some(1), Some(2)]), Some(3));
        assert_eq!(sum_sizes([Some(1), None]), None);
        assert_eq!(sum_sizes([]), Some(0));
    }
}
