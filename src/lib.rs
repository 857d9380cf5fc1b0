//! Composable binary serializers.
//!
//! Every codec implements [`Serializer`]: it turns an `Input` value into an
//! exact byte layout and reads an `Output` value back from a buffer at a given
//! offset. Primitive codecs (numbers, radix strings, booleans, raw bytes) are
//! combined into arrays, sets, maps, structs, tuples, options and enums, and
//! adapted with [`map_serializer`], [`fix_serializer`] and
//! [`reverse_serializer`].
//!
//! ```
//! use umi_serializers::{array, u16_with, Endian, NumberOptions, Serializer};
//!
//! let be = u16_with(NumberOptions::default().endian(Endian::Big));
//! assert_eq!(be.serialize(&42).unwrap(), [0x00, 0x2a]);
//!
//! let list = array(umi_serializers::u8());
//! let bytes = list.serialize(&vec![42, 1, 2]).unwrap();
//! assert_eq!(bytes, [3, 0, 0, 0, 42, 1, 2]);
//! assert_eq!(list.deserialize(&bytes, 0).unwrap(), (vec![42, 1, 2], 7));
//! ```

mod adapters;
mod bits;
mod collections;
mod cursor;
mod encodings;
mod enums;
mod error;
mod numbers;
mod option;
mod primitives;
mod size;
mod structs;

pub use self::{
    adapters::{
        fix_serializer, fix_serializer_with, map_input, map_serializer, reverse_serializer,
        FixSerializer, MappedSerializer, ReverseSerializer,
    },
    bits::{
        bit_array, bit_array_with, BitArrayOptions, BitArraySerializer, BitReader, BitWriter,
    },
    collections::{
        array, array_with, map, map_with, set, set_with, ArrayLikeOptions, ArraySerializer,
        MapSerializer, SetSerializer,
    },
    cursor::{Reader, Writer},
    encodings::{
        base10, base16, base58, base64, base_x, base_x_reverse, utf8, Base16, Base64, BaseX,
        BaseXReverse, Utf8,
    },
    enums::{
        data_enum, scalar_enum, scalar_enum_with, DataEnumSerializer, EnumOptions, ScalarEnum,
        ScalarEnumSerializer,
    },
    error::Error,
    numbers::{
        f32, f32_with, f64, f64_with, i128, i128_with, i16, i16_with, i32, i32_with, i64,
        i64_with, i8, i8_with, short_u16, u128, u128_with, u16, u16_with, u32, u32_with, u64,
        u64_with, u8, u8_with, Endian, Integer, Number, NumberOptions, NumberSerializer,
        ShortU16Serializer,
    },
    option::{nullable, nullable_with, option, option_with, OptionOptions, OptionSerializer},
    primitives::{
        bool, bool_with, bytes, bytes_with, public_key, string, string_with, unit, BoolOptions,
        BoolSerializer, BytesOptions, BytesSerializer, PublicKey, PublicKeySerializer,
        StringOptions, StringSerializer, UnitSerializer, PUBLIC_KEY_LENGTH,
    },
    size::{EmptyBuffer, PrefixSerializer, Size},
    structs::{
        struct_of, struct_serializer, tuple, FieldList, Fields, StructSerializer, TupleItems,
        TupleSerializer,
    },
};
use auto_impl::auto_impl;
#[cfg(feature = "derive")]
pub use umi_serializers_derive::*;

/// A paired serialize/deserialize transformation between a value and its
/// byte encoding.
///
/// `Output` is what a round-trip hands back for an `Input`; for most codecs
/// the two are the same type.
#[auto_impl(&, Box, Arc)]
pub trait Serializer {
    /// Accepted by [`Serializer::serialize`].
    type Input;
    /// Produced by [`Serializer::deserialize`].
    type Output;

    /// Human-readable description, derived from composition unless overridden.
    fn description(&self) -> &str;

    /// Exact encoded length if it is the same for every value.
    fn fixed_size(&self) -> Option<usize>;

    /// Upper bound on the encoded length, if one exists.
    fn max_size(&self) -> Option<usize>;

    fn serialize(&self, value: &Self::Input) -> Result<Vec<u8>, Error>;

    /// Reads a value starting at `offset` and returns it together with the
    /// offset right after the consumed bytes.
    fn deserialize(&self, bytes: &[u8], offset: usize) -> Result<(Self::Output, usize), Error>;
}

/// Method-style spellings of the adapters.
pub trait SerializerExt: Serializer + Sized {
    /// See [`fix_serializer`].
    fn fixed(self, size: usize) -> FixSerializer<Self> {
        fix_serializer(self, size)
    }

    /// See [`reverse_serializer`].
    fn reversed(self) -> Result<ReverseSerializer<Self>, Error> {
        reverse_serializer(self)
    }

    /// See [`map_serializer`].
    fn map<I, O>(
        self,
        to_inner: impl Fn(&I) -> Self::Input + Send + Sync + 'static,
        from_inner: impl Fn(Self::Output) -> O + Send + Sync + 'static,
    ) -> MappedSerializer<Self, I, O> {
        map_serializer(self, to_inner, from_inner)
    }

    /// See [`map_input`].
    fn map_input<I>(
        self,
        to_inner: impl Fn(&I) -> Self::Input + Send + Sync + 'static,
    ) -> MappedSerializer<Self, I, Self::Output>
    where
        Self::Output: 'static,
    {
        map_input(self, to_inner)
    }
}

impl<S: Serializer> SerializerExt for S {}

/// Deserializes a whole buffer, rejecting unconsumed input.
pub fn deserialize<S>(serializer: &S, bytes: &[u8]) -> Result<S::Output, Error>
where
    S: Serializer + ?Sized,
{
    let (value, offset) = serializer.deserialize(bytes, 0)?;
    if offset < bytes.len() {
        return Err(Error::TrailingBytes {
            serializer: serializer.description().to_string(),
            remaining: bytes.len() - offset,
        });
    }

    Ok(value)
}
