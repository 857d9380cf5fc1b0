use super::{cursor::Reader, error::Error, size::PrefixSerializer, Serializer};
use arrayvec::ArrayVec;
use std::{fmt, marker::PhantomData};

/// Byte order of multi-byte numbers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Endian {
    #[default]
    Little,
    Big,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NumberOptions {
    pub endian: Endian,
    pub description: Option<String>,
}

impl NumberOptions {
    pub fn endian(mut self, endian: Endian) -> Self {
        self.endian = endian;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Fixed-width number with a native byte representation.
pub trait Number: Copy + PartialEq + fmt::Debug + fmt::Display + Send + Sync + 'static {
    const NAME: &'static str;
    const SIZE: usize;

    fn to_bytes(self, endian: Endian) -> ArrayVec<u8, 16>;

    /// `bytes` holds exactly `SIZE` bytes.
    fn from_bytes(bytes: &[u8], endian: Endian) -> Self;
}

/// Integer number with a checked conversion from wider values.
pub trait Integer: Number {
    const MIN: Self;
    const MAX: Self;

    fn try_from_i128(value: i128) -> Option<Self>;

    fn to_usize(self) -> Option<usize>;
}

macro_rules! impl_number {
    ($type:ty, $name:literal) => {
        impl Number for $type {
            const NAME: &'static str = $name;
            const SIZE: usize = std::mem::size_of::<$type>();

            #[inline]
            fn to_bytes(self, endian: Endian) -> ArrayVec<u8, 16> {
                match endian {
                    Endian::Little => self.to_le_bytes().into_iter().collect(),
                    Endian::Big => self.to_be_bytes().into_iter().collect(),
                }
            }

            #[inline]
            fn from_bytes(bytes: &[u8], endian: Endian) -> Self {
                let mut raw = [0; std::mem::size_of::<$type>()];
                raw.copy_from_slice(bytes);
                match endian {
                    Endian::Little => <$type>::from_le_bytes(raw),
                    Endian::Big => <$type>::from_be_bytes(raw),
                }
            }
        }
    };
}

macro_rules! impl_integer {
    ($type:ty, $name:literal) => {
        impl_number!($type, $name);

        impl Integer for $type {
            const MIN: Self = <$type>::MIN;
            const MAX: Self = <$type>::MAX;

            #[inline]
            fn try_from_i128(value: i128) -> Option<Self> {
                <$type>::try_from(value).ok()
            }

            #[inline]
            fn to_usize(self) -> Option<usize> {
                usize::try_from(self).ok()
            }
        }
    };
}

impl_integer!(u8, "u8");
impl_integer!(i8, "i8");
impl_integer!(u16, "u16");
impl_integer!(i16, "i16");
impl_integer!(u32, "u32");
impl_integer!(i32, "i32");
impl_integer!(u64, "u64");
impl_integer!(i64, "i64");
impl_integer!(u128, "u128");
impl_integer!(i128, "i128");
impl_number!(f32, "f32");
impl_number!(f64, "f64");

/// Fixed-width number codec.
#[derive(Clone, Debug)]
pub struct NumberSerializer<N> {
    endian: Endian,
    description: String,
    _marker: PhantomData<fn() -> N>,
}

impl<N: Number> NumberSerializer<N> {
    pub fn new(options: NumberOptions) -> Self {
        let NumberOptions {
            endian,
            description,
        } = options;
        let description = description.unwrap_or_else(|| {
            if N::SIZE > 1 {
                let suffix = match endian {
                    Endian::Little => "le",
                    Endian::Big => "be",
                };
                format!("{}({suffix})", N::NAME)
            } else {
                N::NAME.to_string()
            }
        });

        Self {
            endian,
            description,
            _marker: PhantomData,
        }
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }
}

impl<N: Integer> NumberSerializer<N> {
    /// Narrows `value` to this serializer's type.
    pub fn cast(&self, value: i128) -> Result<N, Error> {
        cast(value, &self.description)
    }
}

impl<N: Number> Serializer for NumberSerializer<N> {
    type Input = N;
    type Output = N;

    fn description(&self) -> &str {
        &self.description
    }

    fn fixed_size(&self) -> Option<usize> {
        Some(N::SIZE)
    }

    fn max_size(&self) -> Option<usize> {
        Some(N::SIZE)
    }

    fn serialize(&self, value: &N) -> Result<Vec<u8>, Error> {
        Ok(value.to_bytes(self.endian).to_vec())
    }

    fn deserialize(&self, bytes: &[u8], offset: usize) -> Result<(N, usize), Error> {
        let mut buf = Reader::new(bytes, offset);
        let raw = buf.read(N::SIZE, &self.description)?;

        Ok((N::from_bytes(raw, self.endian), buf.position()))
    }
}

pub(crate) fn cast<N: Integer>(value: i128, serializer: &str) -> Result<N, Error> {
    N::try_from_i128(value).ok_or_else(|| Error::NumberOutOfRange {
        serializer: serializer.to_string(),
        min: N::MIN.to_string(),
        max: N::MAX.to_string(),
        value: value.to_string(),
    })
}

impl<S> PrefixSerializer for S
where
    S: Serializer + Send + Sync,
    S::Input: Integer,
    S::Output: Integer,
{
    fn prefix_description(&self) -> &str {
        self.description()
    }

    fn prefix_fixed_size(&self) -> Option<usize> {
        self.fixed_size()
    }

    fn prefix_max_size(&self) -> Option<usize> {
        self.max_size()
    }

    fn serialize_usize(&self, value: usize) -> Result<Vec<u8>, Error> {
        let wide = i128::try_from(value).map_err(|_| Error::NumberOutOfRange {
            serializer: self.description().to_string(),
            min: <S::Input as Integer>::MIN.to_string(),
            max: <S::Input as Integer>::MAX.to_string(),
            value: value.to_string(),
        })?;
        self.serialize(&cast(wide, self.description())?)
    }

    fn deserialize_usize(&self, bytes: &[u8], offset: usize) -> Result<(usize, usize), Error> {
        let (value, offset) = self.deserialize(bytes, offset)?;
        let value = value.to_usize().ok_or_else(|| Error::NumberOutOfRange {
            serializer: self.description().to_string(),
            min: "0".to_string(),
            max: usize::MAX.to_string(),
            value: value.to_string(),
        })?;

        Ok((value, offset))
    }
}

macro_rules! number_constructors {
    ($($type:ident => $with:ident),* $(,)?) => {
        $(
            #[doc = concat!("`", stringify!($type), "` codec, little endian.")]
            pub fn $type() -> NumberSerializer<$type> {
                NumberSerializer::new(NumberOptions::default())
            }

            #[doc = concat!("`", stringify!($type), "` codec with custom options.")]
            pub fn $with(options: NumberOptions) -> NumberSerializer<$type> {
                NumberSerializer::new(options)
            }
        )*
    };
}

number_constructors!(
    u8 => u8_with,
    i8 => i8_with,
    u16 => u16_with,
    i16 => i16_with,
    u32 => u32_with,
    i32 => i32_with,
    u64 => u64_with,
    i64 => i64_with,
    u128 => u128_with,
    i128 => i128_with,
    f32 => f32_with,
    f64 => f64_with,
);

/// Compact 1 to 3 byte `u16`: 7 bits per byte, low bits first, high bit set
/// while more bytes follow.
#[derive(Clone, Debug)]
pub struct ShortU16Serializer {
    description: String,
}

pub fn short_u16() -> ShortU16Serializer {
    ShortU16Serializer {
        description: "short_u16".to_string(),
    }
}

const SHORT_U16_MAX_BYTES: usize = 3;

impl Serializer for ShortU16Serializer {
    type Input = u16;
    type Output = u16;

    fn description(&self) -> &str {
        &self.description
    }

    fn fixed_size(&self) -> Option<usize> {
        None
    }

    fn max_size(&self) -> Option<usize> {
        Some(SHORT_U16_MAX_BYTES)
    }

    fn serialize(&self, value: &u16) -> Result<Vec<u8>, Error> {
        let mut out = ArrayVec::<u8, SHORT_U16_MAX_BYTES>::new();
        let mut v = *value;
        loop {
            let mut chunk = (v & 0b0111_1111) as u8;
            v >>= 7;
            if v != 0 {
                // continuation flag
                chunk |= 0b1000_0000;
            }
            out.push(chunk);
            if v == 0 {
                break;
            }
        }

        Ok(out.to_vec())
    }

    fn deserialize(&self, bytes: &[u8], offset: usize) -> Result<(u16, usize), Error> {
        let mut buf = Reader::new(bytes, offset);
        let mut v = 0_u32;
        for i in 0..SHORT_U16_MAX_BYTES {
            let chunk = match buf.read_byte(&self.description) {
                // input ends inside a multi-byte value
                Err(Error::EmptyBuffer { .. }) if i > 0 => {
                    return Err(Error::NotEnoughBytes {
                        serializer: self.description.clone(),
                        expected: i + 1,
                        actual: i,
                    })
                }
                chunk => chunk?,
            };
            v |= u32::from(chunk & 0b0111_1111) << (i * 7);
            if chunk & 0b1000_0000 == 0 {
                let v = cast(i128::from(v), &self.description)?;
                return Ok((v, buf.position()));
            }
        }

        // a fourth byte would be needed
        Err(Error::NumberOutOfRange {
            serializer: self.description.clone(),
            min: u16::MIN.to_string(),
            max: u16::MAX.to_string(),
            value: format!("{v}+"),
        })
    }
}
