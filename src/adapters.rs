use super::{cursor::Reader, error::Error, Serializer};
use std::{borrow::Cow, fmt, sync::Arc};
use tracing::trace;

/// Codec whose values are converted to and from those of an inner codec.
pub struct MappedSerializer<S: Serializer, I, O> {
    inner: S,
    to_inner: Arc<dyn Fn(&I) -> S::Input + Send + Sync>,
    from_inner: Arc<dyn Fn(S::Output) -> O + Send + Sync>,
}

/// Adapts `inner` to accept `I` and produce `O`.
pub fn map_serializer<S, I, O>(
    inner: S,
    to_inner: impl Fn(&I) -> S::Input + Send + Sync + 'static,
    from_inner: impl Fn(S::Output) -> O + Send + Sync + 'static,
) -> MappedSerializer<S, I, O>
where
    S: Serializer,
{
    MappedSerializer {
        inner,
        to_inner: Arc::new(to_inner),
        from_inner: Arc::new(from_inner),
    }
}

fn identity<T>(value: T) -> T {
    value
}

/// Adapts only the accepted type of `inner`; the produced type is unchanged.
pub fn map_input<S, I>(
    inner: S,
    to_inner: impl Fn(&I) -> S::Input + Send + Sync + 'static,
) -> MappedSerializer<S, I, S::Output>
where
    S: Serializer,
    S::Output: 'static,
{
    MappedSerializer {
        inner,
        to_inner: Arc::new(to_inner),
        from_inner: Arc::new(identity::<S::Output>),
    }
}

impl<S: Serializer, I, O> MappedSerializer<S, I, O> {
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: Serializer + Clone, I, O> Clone for MappedSerializer<S, I, O> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            to_inner: self.to_inner.clone(),
            from_inner: self.from_inner.clone(),
        }
    }
}

impl<S: Serializer + fmt::Debug, I, O> fmt::Debug for MappedSerializer<S, I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappedSerializer")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl<S: Serializer, I, O> Serializer for MappedSerializer<S, I, O> {
    type Input = I;
    type Output = O;

    fn description(&self) -> &str {
        self.inner.description()
    }

    fn fixed_size(&self) -> Option<usize> {
        self.inner.fixed_size()
    }

    fn max_size(&self) -> Option<usize> {
        self.inner.max_size()
    }

    fn serialize(&self, value: &I) -> Result<Vec<u8>, Error> {
        self.inner.serialize(&(self.to_inner)(value))
    }

    fn deserialize(&self, bytes: &[u8], offset: usize) -> Result<(O, usize), Error> {
        let (value, offset) = self.inner.deserialize(bytes, offset)?;

        Ok(((self.from_inner)(value), offset))
    }
}

/// Codec forced to occupy exactly `size` bytes.
#[derive(Clone, Debug)]
pub struct FixSerializer<S> {
    inner: S,
    size: usize,
    description: String,
}

/// Truncates or zero-pads the output of `inner` to `size` bytes.
pub fn fix_serializer<S: Serializer>(inner: S, size: usize) -> FixSerializer<S> {
    fix_serializer_with(inner, size, None)
}

pub fn fix_serializer_with<S: Serializer>(
    inner: S,
    size: usize,
    description: Option<String>,
) -> FixSerializer<S> {
    let description =
        description.unwrap_or_else(|| format!("fixed({size}, {})", inner.description()));
    FixSerializer {
        inner,
        size,
        description,
    }
}

impl<S: Serializer> Serializer for FixSerializer<S> {
    type Input = S::Input;
    type Output = S::Output;

    fn description(&self) -> &str {
        &self.description
    }

    fn fixed_size(&self) -> Option<usize> {
        Some(self.size)
    }

    fn max_size(&self) -> Option<usize> {
        Some(self.size)
    }

    fn serialize(&self, value: &S::Input) -> Result<Vec<u8>, Error> {
        let mut bytes = self.inner.serialize(value)?;
        if bytes.len() > self.size {
            trace!(
                serializer = %self.description,
                len = bytes.len(),
                "truncating oversized encoding"
            );
        }
        bytes.resize(self.size, 0);

        Ok(bytes)
    }

    fn deserialize(&self, bytes: &[u8], offset: usize) -> Result<(S::Output, usize), Error> {
        let mut buf = Reader::new(bytes, offset);
        let window = buf.read(self.size, &self.description)?;
        // hand a fixed-size inner codec exactly the bytes it expects
        let window = match self.inner.fixed_size() {
            Some(inner_size) if inner_size != self.size => {
                let mut owned = window.to_vec();
                owned.resize(inner_size, 0);
                Cow::Owned(owned)
            }
            _ => Cow::Borrowed(window),
        };
        let (value, _) = self.inner.deserialize(&window, 0)?;

        Ok((value, buf.position()))
    }
}

/// Fixed-size codec with its byte order flipped.
#[derive(Clone, Debug)]
pub struct ReverseSerializer<S> {
    inner: S,
    size: usize,
}

/// Fails when `inner` has no fixed size.
pub fn reverse_serializer<S: Serializer>(inner: S) -> Result<ReverseSerializer<S>, Error> {
    let size = inner.fixed_size().ok_or_else(|| {
        Error::expected_fixed_size(format!(
            "cannot reverse the bytes of variable-size serializer {}",
            inner.description()
        ))
    })?;

    Ok(ReverseSerializer { inner, size })
}

impl<S: Serializer> Serializer for ReverseSerializer<S> {
    type Input = S::Input;
    type Output = S::Output;

    fn description(&self) -> &str {
        self.inner.description()
    }

    fn fixed_size(&self) -> Option<usize> {
        Some(self.size)
    }

    fn max_size(&self) -> Option<usize> {
        Some(self.size)
    }

    fn serialize(&self, value: &S::Input) -> Result<Vec<u8>, Error> {
        let mut bytes = self.inner.serialize(value)?;
        bytes.reverse();

        Ok(bytes)
    }

    fn deserialize(&self, bytes: &[u8], offset: usize) -> Result<(S::Output, usize), Error> {
        let mut buf = Reader::new(bytes, offset);
        let reversed: Vec<u8> = buf
            .read(self.size, self.inner.description())?
            .iter()
            .rev()
            .copied()
            .collect();
        let (value, _) = self.inner.deserialize(&reversed, 0)?;

        Ok((value, buf.position()))
    }
}
