use super::{
    cursor::{Reader, Writer},
    encodings::{base58, utf8, Utf8},
    error::Error,
    numbers::u8,
    size::{EmptyBuffer, PrefixSerializer, Size},
    Serializer,
};
use ::bytes::Bytes;
use derive_more::Deref;
use std::{fmt, str::FromStr, sync::Arc};

#[derive(Clone)]
pub struct BoolOptions {
    /// Integer codec holding 0 or 1. Must be fixed-size.
    pub size: Arc<dyn PrefixSerializer>,
    pub description: Option<String>,
}

impl Default for BoolOptions {
    fn default() -> Self {
        Self {
            size: Arc::new(u8()),
            description: None,
        }
    }
}

impl BoolOptions {
    pub fn size(mut self, size: impl PrefixSerializer + 'static) -> Self {
        self.size = Arc::new(size);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Clone)]
pub struct BoolSerializer {
    size: Arc<dyn PrefixSerializer>,
    fixed_size: usize,
    description: String,
}

/// One byte, `0` or `1`.
pub fn bool() -> BoolSerializer {
    let size = BoolOptions::default().size;
    BoolSerializer {
        size,
        fixed_size: 1,
        description: "bool(u8)".to_string(),
    }
}

pub fn bool_with(options: BoolOptions) -> Result<BoolSerializer, Error> {
    let BoolOptions { size, description } = options;
    let fixed_size = size.prefix_fixed_size().ok_or_else(|| {
        Error::expected_fixed_size(format!(
            "bool size {} must be fixed-size",
            size.prefix_description()
        ))
    })?;
    let description =
        description.unwrap_or_else(|| format!("bool({})", size.prefix_description()));

    Ok(BoolSerializer {
        size,
        fixed_size,
        description,
    })
}

impl fmt::Debug for BoolSerializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoolSerializer")
            .field("description", &self.description)
            .finish()
    }
}

impl Serializer for BoolSerializer {
    type Input = bool;
    type Output = bool;

    fn description(&self) -> &str {
        &self.description
    }

    fn fixed_size(&self) -> Option<usize> {
        Some(self.fixed_size)
    }

    fn max_size(&self) -> Option<usize> {
        Some(self.fixed_size)
    }

    fn serialize(&self, value: &bool) -> Result<Vec<u8>, Error> {
        self.size.serialize_usize(usize::from(*value))
    }

    fn deserialize(&self, bytes: &[u8], offset: usize) -> Result<(bool, usize), Error> {
        let mut buf = Reader::new(bytes, offset);
        let value = buf
            .decode_prefix(self.size.as_ref())
            .map_err(|e| match e {
                Error::EmptyBuffer { .. } => Error::empty_buffer(&self.description),
                e => e,
            })?;

        Ok((value != 0, buf.position()))
    }
}

/// Zero bytes, value `()`.
#[derive(Clone, Debug)]
pub struct UnitSerializer {
    description: String,
}

pub fn unit() -> UnitSerializer {
    UnitSerializer {
        description: "unit".to_string(),
    }
}

impl Serializer for UnitSerializer {
    type Input = ();
    type Output = ();

    fn description(&self) -> &str {
        &self.description
    }

    fn fixed_size(&self) -> Option<usize> {
        Some(0)
    }

    fn max_size(&self) -> Option<usize> {
        Some(0)
    }

    fn serialize(&self, _: &()) -> Result<Vec<u8>, Error> {
        Ok(Vec::new())
    }

    fn deserialize(&self, _: &[u8], offset: usize) -> Result<((), usize), Error> {
        Ok(((), offset))
    }
}

#[derive(Clone, Debug)]
pub struct BytesOptions {
    /// Byte length policy; `Remainder` unless set.
    pub size: Size,
    pub description: Option<String>,
    pub empty_buffer: EmptyBuffer,
}

impl Default for BytesOptions {
    fn default() -> Self {
        Self {
            size: Size::Remainder,
            description: None,
            empty_buffer: EmptyBuffer::default(),
        }
    }
}

impl BytesOptions {
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

/// Raw bytes under a length policy.
#[derive(Clone, Debug)]
pub struct BytesSerializer {
    size: Size,
    empty_buffer: EmptyBuffer,
    description: String,
}

pub fn bytes() -> BytesSerializer {
    bytes_with(BytesOptions::default())
}

pub fn bytes_with(options: BytesOptions) -> BytesSerializer {
    let BytesOptions {
        size,
        description,
        empty_buffer,
    } = options;
    let description = description.unwrap_or_else(|| format!("bytes({})", size.description()));

    BytesSerializer {
        size,
        empty_buffer,
        description,
    }
}

/// Byte length of a blob under `size`, when it does not depend on the data.
fn blob_size(size: &Size) -> Option<usize> {
    match size {
        Size::Fixed(n) => Some(*n),
        Size::Prefix(_) | Size::Remainder => None,
    }
}

/// Whether an empty buffer should decode as an empty blob.
fn take_empty_blob(
    size: &Size,
    empty_buffer: EmptyBuffer,
    buf: &Reader<'_>,
    serializer: &str,
) -> Result<bool, Error> {
    if !size.allows_empty() || blob_size(size) == Some(0) {
        return Ok(false);
    }
    empty_buffer.take_empty(buf.remaining(), serializer)
}

impl Serializer for BytesSerializer {
    type Input = Bytes;
    type Output = Bytes;

    fn description(&self) -> &str {
        &self.description
    }

    fn fixed_size(&self) -> Option<usize> {
        blob_size(&self.size)
    }

    fn max_size(&self) -> Option<usize> {
        blob_size(&self.size)
    }

    fn serialize(&self, value: &Bytes) -> Result<Vec<u8>, Error> {
        let mut out = Writer::for_size(self.fixed_size(), Some(value.len()));
        match &self.size {
            Size::Prefix(prefix) => {
                out.write(&prefix.serialize_usize(value.len())?);
                out.write(value);
            }
            Size::Fixed(n) => {
                out.write(value.get(..*n).unwrap_or(&value[..]));
                out.buf.resize(*n, 0);
            }
            Size::Remainder => out.write(value),
        }

        Ok(out.output())
    }

    fn deserialize(&self, bytes: &[u8], offset: usize) -> Result<(Bytes, usize), Error> {
        let mut buf = Reader::new(bytes, offset);
        if take_empty_blob(&self.size, self.empty_buffer, &buf, &self.description)? {
            return Ok((Bytes::new(), offset));
        }

        let raw = match &self.size {
            Size::Prefix(prefix) => {
                let len = buf.decode_prefix(prefix.as_ref())?;
                buf.read(len, &self.description)?
            }
            Size::Fixed(n) => buf.read(*n, &self.description)?,
            Size::Remainder => {
                let rest = buf.remaining();
                buf.read(rest.len(), &self.description)?
            }
        };

        Ok((Bytes::copy_from_slice(raw), buf.position()))
    }
}

#[derive(Clone, Debug)]
pub struct StringOptions<E = Utf8> {
    /// Byte length policy; `u32` prefix unless set.
    pub size: Size,
    pub encoding: E,
    pub description: Option<String>,
    pub empty_buffer: EmptyBuffer,
}

impl Default for StringOptions {
    fn default() -> Self {
        Self {
            size: Size::default(),
            encoding: utf8(),
            description: None,
            empty_buffer: EmptyBuffer::default(),
        }
    }
}

impl<E> StringOptions<E> {
    pub fn size(mut self, size: impl Into<Size>) -> Self {
        self.size = size.into();
        self
    }

    pub fn encoding<F>(self, encoding: F) -> StringOptions<F> {
        StringOptions {
            size: self.size,
            encoding,
            description: self.description,
            empty_buffer: self.empty_buffer,
        }
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

/// Text in some encoding, framed by a byte length policy.
#[derive(Clone, Debug)]
pub struct StringSerializer<E = Utf8> {
    size: Size,
    encoding: E,
    empty_buffer: EmptyBuffer,
    description: String,
}

/// UTF-8 string with a `u32` byte length prefix.
pub fn string() -> StringSerializer {
    string_with(StringOptions::default())
}

pub fn string_with<E>(options: StringOptions<E>) -> StringSerializer<E>
where
    E: Serializer<Input = String, Output = String>,
{
    let StringOptions {
        size,
        encoding,
        description,
        empty_buffer,
    } = options;
    let description = description.unwrap_or_else(|| {
        format!("string({}; {})", encoding.description(), size.description())
    });

    StringSerializer {
        size,
        encoding,
        empty_buffer,
        description,
    }
}

impl<E> Serializer for StringSerializer<E>
where
    E: Serializer<Input = String, Output = String>,
{
    type Input = String;
    type Output = String;

    fn description(&self) -> &str {
        &self.description
    }

    fn fixed_size(&self) -> Option<usize> {
        blob_size(&self.size)
    }

    fn max_size(&self) -> Option<usize> {
        blob_size(&self.size)
    }

    fn serialize(&self, value: &String) -> Result<Vec<u8>, Error> {
        let encoded = self.encoding.serialize(value)?;
        let mut out = Writer::for_size(self.fixed_size(), Some(encoded.len() + 4));
        match &self.size {
            Size::Prefix(prefix) => {
                out.write(&prefix.serialize_usize(encoded.len())?);
                out.write(&encoded);
            }
            Size::Fixed(n) => {
                out.write(encoded.get(..*n).unwrap_or(&encoded[..]));
                out.buf.resize(*n, 0);
            }
            Size::Remainder => out.write(&encoded),
        }

        Ok(out.output())
    }

    fn deserialize(&self, bytes: &[u8], offset: usize) -> Result<(String, usize), Error> {
        let mut buf = Reader::new(bytes, offset);
        if take_empty_blob(&self.size, self.empty_buffer, &buf, &self.description)? {
            return Ok((String::new(), offset));
        }

        let window = match &self.size {
            Size::Prefix(prefix) => {
                let len = buf.decode_prefix(prefix.as_ref())?;
                buf.read(len, &self.description)?
            }
            Size::Fixed(n) => buf.read(*n, &self.description)?,
            Size::Remainder => {
                let rest = buf.remaining();
                buf.read(rest.len(), &self.description)?
            }
        };
        let (value, _) = self.encoding.deserialize(window, 0)?;

        Ok((value, buf.position()))
    }
}

pub const PUBLIC_KEY_LENGTH: usize = 32;

/// 32-byte public key, shown and parsed as base58.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Deref)]
pub struct PublicKey([u8; PUBLIC_KEY_LENGTH]);

impl PublicKey {
    pub const fn new(bytes: [u8; PUBLIC_KEY_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn to_bytes(self) -> [u8; PUBLIC_KEY_LENGTH] {
        self.0
    }
}

impl From<[u8; PUBLIC_KEY_LENGTH]> for PublicKey {
    fn from(bytes: [u8; PUBLIC_KEY_LENGTH]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (encoded, _) = base58().deserialize(&self.0, 0).map_err(|_| fmt::Error)?;
        f.write_str(&encoded)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({self})")
    }
}

impl FromStr for PublicKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        let decoded = base58().serialize(&s.to_string())?;
        let bytes = <[u8; PUBLIC_KEY_LENGTH]>::try_from(decoded.as_slice()).map_err(|_| {
            Error::InvalidNumberOfItems {
                serializer: "publicKey".to_string(),
                expected: PUBLIC_KEY_LENGTH,
                actual: decoded.len(),
            }
        })?;

        Ok(Self(bytes))
    }
}

#[derive(Clone, Debug)]
pub struct PublicKeySerializer {
    description: String,
}

pub fn public_key() -> PublicKeySerializer {
    PublicKeySerializer {
        description: "publicKey".to_string(),
    }
}

impl Serializer for PublicKeySerializer {
    type Input = PublicKey;
    type Output = PublicKey;

    fn description(&self) -> &str {
        &self.description
    }

    fn fixed_size(&self) -> Option<usize> {
        Some(PUBLIC_KEY_LENGTH)
    }

    fn max_size(&self) -> Option<usize> {
        Some(PUBLIC_KEY_LENGTH)
    }

    fn serialize(&self, value: &PublicKey) -> Result<Vec<u8>, Error> {
        Ok(value.0.to_vec())
    }

    fn deserialize(&self, bytes: &[u8], offset: usize) -> Result<(PublicKey, usize), Error> {
        let mut buf = Reader::new(bytes, offset);
        let mut key = [0; PUBLIC_KEY_LENGTH];
        key.copy_from_slice(buf.read(PUBLIC_KEY_LENGTH, &self.description)?);

        Ok((PublicKey(key), buf.position()))
    }
}
