use super::{
    cursor::{Reader, Writer},
    error::Error,
    size::{sum_sizes, EmptyBuffer, Size},
    Serializer,
};
use indexmap::{IndexMap, IndexSet};
use std::hash::Hash;

/// Options shared by `array`, `set` and `map`.
#[derive(Clone, Debug, Default)]
pub struct ArrayLikeOptions {
    pub size: Size,
    pub description: Option<String>,
    pub empty_buffer: EmptyBuffer,
}

impl ArrayLikeOptions {
    pub fn size(mut self, size: impl Into<Size>) -> Self {
        self.size = size.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn empty_buffer(mut self, empty_buffer: EmptyBuffer) -> Self {
        self.empty_buffer = empty_buffer;
        self
    }
}

/// Size policy plus the framing logic common to repeated structures.
#[derive(Clone, Debug)]
struct ArrayLike {
    size: Size,
    empty_buffer: EmptyBuffer,
    description: String,
}

impl ArrayLike {
    fn new(options: ArrayLikeOptions, default_description: impl FnOnce(&Size) -> String) -> Self {
        let ArrayLikeOptions {
            size,
            description,
            empty_buffer,
        } = options;
        let description = description.unwrap_or_else(|| default_description(&size));

        Self {
            size,
            empty_buffer,
            description,
        }
    }

    fn checked(self, item_fixed_size: Option<usize>) -> Result<Self, Error> {
        self.size.check_items(item_fixed_size, &self.description)?;
        Ok(self)
    }

    fn write<T>(
        &self,
        count: usize,
        items: impl Iterator<Item = T>,
        mut write_item: impl FnMut(&mut Writer, T) -> Result<(), Error>,
    ) -> Result<Vec<u8>, Error> {
        let mut out = Writer::default();
        self.size.write_count(&mut out, count, &self.description)?;
        for item in items {
            write_item(&mut out, item)?;
        }

        Ok(out.output())
    }

    fn read<T, C>(
        &self,
        bytes: &[u8],
        offset: usize,
        item_fixed_size: Option<usize>,
        mut read_item: impl FnMut(&mut Reader<'_>) -> Result<T, Error>,
    ) -> Result<(C, usize), Error>
    where
        C: FromIterator<T>,
    {
        let mut buf = Reader::new(bytes, offset);
        if self.size.allows_empty()
            && self.size.fixed_size(item_fixed_size).is_none()
            && self
                .empty_buffer
                .take_empty(buf.remaining(), &self.description)?
        {
            return Ok((std::iter::empty::<T>().collect(), offset));
        }

        let count = self
            .size
            .read_count(&mut buf, item_fixed_size, &self.description)?;
        let items = (0..count)
            .map(|_| read_item(&mut buf))
            .collect::<Result<C, Error>>()?;

        Ok((items, buf.position()))
    }
}

/// Sequence of items under a size policy.
#[derive(Clone, Debug)]
pub struct ArraySerializer<S> {
    item: S,
    layout: ArrayLike,
}

/// `u32`-prefixed array of `item`.
pub fn array<S: Serializer>(item: S) -> ArraySerializer<S> {
    let layout = ArrayLike::new(ArrayLikeOptions::default(), |size| {
        format!("array({}; {})", item.description(), size.description())
    });
    ArraySerializer { item, layout }
}

pub fn array_with<S: Serializer>(
    item: S,
    options: ArrayLikeOptions,
) -> Result<ArraySerializer<S>, Error> {
    let layout = ArrayLike::new(options, |size| {
        format!("array({}; {})", item.description(), size.description())
    })
    .checked(item.fixed_size())?;

    Ok(ArraySerializer { item, layout })
}

impl<S: Serializer> Serializer for ArraySerializer<S> {
    type Input = Vec<S::Input>;
    type Output = Vec<S::Output>;

    fn description(&self) -> &str {
        &self.layout.description
    }

    fn fixed_size(&self) -> Option<usize> {
        self.layout.size.fixed_size(self.item.fixed_size())
    }

    fn max_size(&self) -> Option<usize> {
        self.layout.size.max_size(self.item.max_size())
    }

    fn serialize(&self, value: &Vec<S::Input>) -> Result<Vec<u8>, Error> {
        self.layout
            .write(value.len(), value.iter(), |out, item| {
                out.encode(&self.item, item)
            })
    }

    fn deserialize(&self, bytes: &[u8], offset: usize) -> Result<(Vec<S::Output>, usize), Error> {
        self.layout
            .read(bytes, offset, self.item.fixed_size(), |buf| {
                buf.decode(&self.item)
            })
    }
}

/// Set of unique items under a size policy, kept in insertion order.
#[derive(Clone, Debug)]
pub struct SetSerializer<S> {
    item: S,
    layout: ArrayLike,
}

/// `u32`-prefixed set of `item`.
pub fn set<S: Serializer>(item: S) -> SetSerializer<S> {
    let layout = ArrayLike::new(ArrayLikeOptions::default(), |size| {
        format!("set({}; {})", item.description(), size.description())
    });
    SetSerializer { item, layout }
}

pub fn set_with<S: Serializer>(
    item: S,
    options: ArrayLikeOptions,
) -> Result<SetSerializer<S>, Error> {
    let layout = ArrayLike::new(options, |size| {
        format!("set({}; {})", item.description(), size.description())
    })
    .checked(item.fixed_size())?;

    Ok(SetSerializer { item, layout })
}

impl<S> Serializer for SetSerializer<S>
where
    S: Serializer,
    S::Output: Hash + Eq,
{
    type Input = IndexSet<S::Input>;
    type Output = IndexSet<S::Output>;

    fn description(&self) -> &str {
        &self.layout.description
    }

    fn fixed_size(&self) -> Option<usize> {
        self.layout.size.fixed_size(self.item.fixed_size())
    }

    fn max_size(&self) -> Option<usize> {
        self.layout.size.max_size(self.item.max_size())
    }

    fn serialize(&self, value: &IndexSet<S::Input>) -> Result<Vec<u8>, Error> {
        self.layout
            .write(value.len(), value.iter(), |out, item| {
                out.encode(&self.item, item)
            })
    }

    fn deserialize(
        &self,
        bytes: &[u8],
        offset: usize,
    ) -> Result<(IndexSet<S::Output>, usize), Error> {
        self.layout
            .read(bytes, offset, self.item.fixed_size(), |buf| {
                buf.decode(&self.item)
            })
    }
}

/// Map under a size policy, kept in insertion order. A duplicate key in the
/// input keeps its first position and takes the last value.
#[derive(Clone, Debug)]
pub struct MapSerializer<K, V> {
    key: K,
    value: V,
    layout: ArrayLike,
}

fn map_description(key: &str, value: &str, size: &Size) -> String {
    format!("map({key}, {value}; {})", size.description())
}

/// `u32`-prefixed map from `key` to `value`.
pub fn map<K: Serializer, V: Serializer>(key: K, value: V) -> MapSerializer<K, V> {
    let layout = ArrayLike::new(ArrayLikeOptions::default(), |size| {
        map_description(key.description(), value.description(), size)
    });
    MapSerializer { key, value, layout }
}

pub fn map_with<K: Serializer, V: Serializer>(
    key: K,
    value: V,
    options: ArrayLikeOptions,
) -> Result<MapSerializer<K, V>, Error> {
    let layout = ArrayLike::new(options, |size| {
        map_description(key.description(), value.description(), size)
    })
    .checked(sum_sizes([key.fixed_size(), value.fixed_size()]))?;

    Ok(MapSerializer { key, value, layout })
}

impl<K: Serializer, V: Serializer> MapSerializer<K, V> {
    fn entry_fixed_size(&self) -> Option<usize> {
        sum_sizes([self.key.fixed_size(), self.value.fixed_size()])
    }
}

impl<K, V> Serializer for MapSerializer<K, V>
where
    K: Serializer,
    V: Serializer,
    K::Output: Hash + Eq,
{
    type Input = IndexMap<K::Input, V::Input>;
    type Output = IndexMap<K::Output, V::Output>;

    fn description(&self) -> &str {
        &self.layout.description
    }

    fn fixed_size(&self) -> Option<usize> {
        self.layout.size.fixed_size(self.entry_fixed_size())
    }

    fn max_size(&self) -> Option<usize> {
        self.layout
            .size
            .max_size(sum_sizes([self.key.max_size(), self.value.max_size()]))
    }

    fn serialize(&self, value: &IndexMap<K::Input, V::Input>) -> Result<Vec<u8>, Error> {
        self.layout.write(value.len(), value.iter(), |out, (k, v)| {
            out.encode(&self.key, k)?;
            out.encode(&self.value, v)
        })
    }

    fn deserialize(
        &self,
        bytes: &[u8],
        offset: usize,
    ) -> Result<(IndexMap<K::Output, V::Output>, usize), Error> {
        self.layout
            .read(bytes, offset, self.entry_fixed_size(), |buf| {
                let k = buf.decode(&self.key)?;
                let v = buf.decode(&self.value)?;
                Ok((k, v))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        encodings::utf8,
        numbers::{u16, u8},
        primitives::string,
        unit,
    };
    use hex_literal::hex;

    #[test]
    fn prefixed_arrays() {
        let s = array(u8());
        assert_eq!(s.description(), "array(u8; u32(le))");
        assert_eq!(s.fixed_size(), None);
        assert_eq!(s.max_size(), None);

        let bytes = s.serialize(&vec![42, 1, 2]).unwrap();
        assert_eq!(bytes, hex!("030000002a0102"));
        assert_eq!(s.deserialize(&bytes, 0), Ok((vec![42, 1, 2], 7)));
        assert_eq!(s.serialize(&vec![]).unwrap(), hex!("00000000"));

        let short = array_with(u16(), ArrayLikeOptions::default().size(Size::prefix(u8()))).unwrap();
        assert_eq!(short.description(), "array(u16(le); u8)");
        assert_eq!(short.serialize(&vec![1, 2]).unwrap(), hex!("0201000200"));
        assert!(matches!(
            short.serialize(&vec![0; 300]),
            Err(Error::NumberOutOfRange { .. })
        ));
    }

    #[test]
    fn fixed_count_arrays() {
        let s = array_with(u8(), ArrayLikeOptions::default().size(3)).unwrap();
        assert_eq!(s.description(), "array(u8; 3)");
        assert_eq!(s.fixed_size(), Some(3));
        assert_eq!(s.max_size(), Some(3));
        assert_eq!(s.serialize(&vec![1, 2, 3]).unwrap(), hex!("010203"));
        assert_eq!(
            s.serialize(&vec![1, 2]),
            Err(Error::InvalidNumberOfItems {
                serializer: "array(u8; 3)".into(),
                expected: 3,
                actual: 2
            })
        );
        assert_eq!(s.deserialize(&hex!("01020304"), 0), Ok((vec![1, 2, 3], 3)));

        let strings = array_with(string(), ArrayLikeOptions::default().size(2)).unwrap();
        assert_eq!(strings.fixed_size(), None);

        let none = array_with(string(), ArrayLikeOptions::default().size(0)).unwrap();
        assert_eq!(none.fixed_size(), Some(0));
        assert_eq!(none.deserialize(&[], 0), Ok((vec![], 0)));
    }

    #[test]
    fn remainder_arrays() {
        let s = array_with(u16(), ArrayLikeOptions::default().size(Size::Remainder)).unwrap();
        assert_eq!(s.description(), "array(u16(le); remainder)");
        assert_eq!(s.serialize(&vec![1, 2]).unwrap(), hex!("01000200"));
        assert_eq!(s.deserialize(&hex!("ff01000200"), 1), Ok((vec![1, 2], 5)));
        // a trailing partial item is left unread
        assert_eq!(s.deserialize(&hex!("0100020003"), 0), Ok((vec![1, 2], 4)));

        assert!(matches!(
            array_with(utf8(), ArrayLikeOptions::default().size(Size::Remainder)),
            Err(Error::InvalidComposition(_))
        ));
        assert!(matches!(
            array_with(unit(), ArrayLikeOptions::default().size(Size::Remainder)),
            Err(Error::InvalidComposition(_))
        ));
    }

    #[test]
    fn empty_buffers() {
        let tolerant = array(u8());
        assert_eq!(tolerant.deserialize(&[], 0), Ok((vec![], 0)));
        assert_eq!(tolerant.deserialize(&hex!("01"), 1), Ok((vec![], 1)));

        let strict = array_with(
            u8(),
            ArrayLikeOptions::default().empty_buffer(EmptyBuffer::Strict),
        )
        .unwrap();
        assert_eq!(
            strict.deserialize(&[], 0),
            Err(Error::EmptyBuffer {
                serializer: "array(u8; u32(le))".into()
            })
        );

        let fixed = array_with(u8(), ArrayLikeOptions::default().size(2)).unwrap();
        assert!(matches!(
            fixed.deserialize(&[], 0),
            Err(Error::EmptyBuffer { .. })
        ));

        // a prefix over zero-sized items is itself a fixed layout
        let units = array(unit());
        assert_eq!(units.fixed_size(), Some(4));
        assert!(matches!(
            units.deserialize(&[], 0),
            Err(Error::EmptyBuffer { .. })
        ));
        assert_eq!(units.deserialize(&hex!("02000000"), 0), Ok((vec![(), ()], 4)));
    }

    #[test]
    fn nested() {
        let s = array(array(u8()));
        let value = vec![vec![1], vec![], vec![2, 3]];
        let bytes = s.serialize(&value).unwrap();
        assert_eq!(
            bytes,
            hex!("03000000 01000000 01 00000000 02000000 0203")
        );
        assert_eq!(s.deserialize(&bytes, 0), Ok((value, bytes.len())));
        assert!(matches!(
            s.deserialize(&bytes[..15], 0),
            Err(Error::NotEnoughBytes { .. })
        ));
    }

    #[test]
    fn sets() {
        let s = set(u8());
        assert_eq!(s.description(), "set(u8; u32(le))");
        let value = IndexSet::from([3, 1, 2]);
        let bytes = s.serialize(&value).unwrap();
        assert_eq!(bytes, hex!("03000000030102"));
        assert_eq!(s.deserialize(&bytes, 0), Ok((value, 7)));

        // entries stay in encoded order
        let unsorted = hex!("03000000 02 03 01");
        let (decoded, _) = s.deserialize(&unsorted, 0).unwrap();
        assert_eq!(decoded.iter().copied().collect::<Vec<_>>(), [2, 3, 1]);
        assert_eq!(s.serialize(&decoded).unwrap(), unsorted);

        let fixed = set_with(u8(), ArrayLikeOptions::default().size(2)).unwrap();
        assert!(matches!(
            fixed.serialize(&IndexSet::from([1])),
            Err(Error::InvalidNumberOfItems { .. })
        ));
    }

    #[test]
    fn maps() {
        let s = map(string(), u8());
        assert_eq!(s.description(), "map(string(utf8; u32(le)), u8; u32(le))");

        let value = IndexMap::from([("a".to_string(), 1), ("bc".to_string(), 2)]);
        let bytes = s.serialize(&value).unwrap();
        assert_eq!(bytes, hex!("02000000 01000000 61 01 02000000 6263 02"));
        assert_eq!(s.deserialize(&bytes, 0), Ok((value, bytes.len())));

        // later duplicates win
        let duplicated = hex!("02000000 01000000 61 01 01000000 61 05");
        assert_eq!(
            s.deserialize(&duplicated, 0),
            Ok((IndexMap::from([("a".to_string(), 5)]), duplicated.len()))
        );

        let numbers = map(u8(), u8());
        let unsorted = hex!("02000000 0214 010a");
        let (decoded, offset) = numbers.deserialize(&unsorted, 0).unwrap();
        assert_eq!(offset, unsorted.len());
        assert_eq!(decoded.keys().copied().collect::<Vec<_>>(), [2, 1]);
        assert_eq!(numbers.serialize(&decoded).unwrap(), unsorted);

        // a repeated key keeps its first position
        let repeated = hex!("03000000 0201 0102 0203");
        let (decoded, _) = numbers.deserialize(&repeated, 0).unwrap();
        assert_eq!(decoded.into_iter().collect::<Vec<_>>(), [(2, 3), (1, 2)]);

        let fixed = map_with(u8(), u16(), ArrayLikeOptions::default().size(2)).unwrap();
        assert_eq!(fixed.fixed_size(), Some(6));
        let remainder =
            map_with(u8(), u16(), ArrayLikeOptions::default().size(Size::Remainder)).unwrap();
        assert_eq!(
            remainder.deserialize(&hex!("010100020200"), 0),
            Ok((IndexMap::from([(1, 1), (2, 2)]), 6))
        );
        assert!(matches!(
            map_with(string(), u8(), ArrayLikeOptions::default().size(Size::Remainder)),
            Err(Error::InvalidComposition(_))
        ));
    }
}
