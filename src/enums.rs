use super::{
    cursor::{Reader, Writer},
    error::Error,
    numbers::u8,
    primitives::unit,
    size::{sum_sizes, PrefixSerializer},
    Serializer,
};
use std::{fmt, sync::Arc};

/// A closed set of labelled values, encoded by position.
///
/// `#[derive(ScalarEnum)]` implements it for fieldless enums, labelling each
/// variant with its name.
pub trait ScalarEnum: Clone + PartialEq + fmt::Debug + 'static {
    const VARIANTS: &'static [(&'static str, Self)];
}

#[derive(Clone)]
pub struct EnumOptions {
    /// Ordinal codec.
    pub size: Arc<dyn PrefixSerializer>,
    pub description: Option<String>,
}

impl Default for EnumOptions {
    fn default() -> Self {
        Self {
            size: Arc::new(u8()),
            description: None,
        }
    }
}

impl EnumOptions {
    pub fn size(mut self, size: impl PrefixSerializer + 'static) -> Self {
        self.size = Arc::new(size);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Enum value written as its ordinal in a variant table.
#[derive(Clone)]
pub struct ScalarEnumSerializer<E> {
    variants: Vec<(String, E)>,
    size: Arc<dyn PrefixSerializer>,
    description: String,
}

/// `u8` ordinal over the variants of `E`.
pub fn scalar_enum<E: ScalarEnum>() -> ScalarEnumSerializer<E> {
    scalar_enum_with(E::VARIANTS, EnumOptions::default())
}

/// Ordinal over an explicit `(label, value)` table.
pub fn scalar_enum_with<E>(variants: &[(&str, E)], options: EnumOptions) -> ScalarEnumSerializer<E>
where
    E: Clone + PartialEq + fmt::Debug,
{
    let EnumOptions { size, description } = options;
    let variants: Vec<(String, E)> = variants
        .iter()
        .map(|(label, value)| (label.to_string(), value.clone()))
        .collect();
    let description = description.unwrap_or_else(|| {
        let labels: Vec<&str> = variants.iter().map(|(label, _)| label.as_str()).collect();
        format!("enum({}; {})", labels.join(", "), size.prefix_description())
    });

    ScalarEnumSerializer {
        variants,
        size,
        description,
    }
}

impl<E> ScalarEnumSerializer<E>
where
    E: Clone + PartialEq + fmt::Debug,
{
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.variants.iter().map(|(label, _)| label.as_str())
    }

    pub fn label(&self, value: &E) -> Option<&str> {
        self.variants
            .iter()
            .find(|(_, v)| v == value)
            .map(|(label, _)| label.as_str())
    }

    /// Looks a variant up by label, or by its ordinal written in decimal.
    pub fn resolve(&self, label: &str) -> Result<E, Error> {
        self.variants
            .iter()
            .find(|(l, _)| l == label)
            .or_else(|| {
                label
                    .parse::<usize>()
                    .ok()
                    .and_then(|ordinal| self.variants.get(ordinal))
            })
            .map(|(_, value)| value.clone())
            .ok_or_else(|| self.invalid_variant(label))
    }

    /// Serializes the variant named by `label`, see [`Self::resolve`].
    pub fn serialize_label(&self, label: &str) -> Result<Vec<u8>, Error> {
        self.serialize(&self.resolve(label)?)
    }

    fn invalid_variant(&self, variant: impl fmt::Display) -> Error {
        Error::InvalidEnumVariant {
            serializer: self.description.clone(),
            variant: variant.to_string(),
            expected: self.labels().collect::<Vec<_>>().join(", "),
        }
    }
}

impl<E: fmt::Debug> fmt::Debug for ScalarEnumSerializer<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScalarEnumSerializer")
            .field("variants", &self.variants)
            .field("description", &self.description)
            .finish()
    }
}

impl<E> Serializer for ScalarEnumSerializer<E>
where
    E: Clone + PartialEq + fmt::Debug,
{
    type Input = E;
    type Output = E;

    fn description(&self) -> &str {
        &self.description
    }

    fn fixed_size(&self) -> Option<usize> {
        self.size.prefix_fixed_size()
    }

    fn max_size(&self) -> Option<usize> {
        self.size.prefix_max_size()
    }

    fn serialize(&self, value: &E) -> Result<Vec<u8>, Error> {
        let ordinal = self
            .variants
            .iter()
            .position(|(_, v)| v == value)
            .ok_or_else(|| self.invalid_variant(format!("{value:?}")))?;

        self.size.serialize_usize(ordinal)
    }

    fn deserialize(&self, bytes: &[u8], offset: usize) -> Result<(E, usize), Error> {
        let mut buf = Reader::new(bytes, offset);
        let ordinal = buf.decode_prefix(self.size.as_ref())?;
        let (_, value) = self
            .variants
            .get(ordinal)
            .ok_or_else(|| self.invalid_variant(ordinal))?;

        Ok((value.clone(), buf.position()))
    }
}

/// One arm of a data enum with its payload codec erased.
trait DataVariant<T>: Send + Sync {
    fn kind(&self) -> &str;

    fn describe(&self) -> String;

    fn fixed_size(&self) -> Option<usize>;

    fn max_size(&self) -> Option<usize>;

    /// Writes the payload and returns `true` if `value` belongs to this arm.
    fn write(&self, out: &mut Writer, value: &T) -> Result<bool, Error>;

    fn read(&self, buf: &mut Reader<'_>) -> Result<T, Error>;
}

struct Variant<S, X, B> {
    kind: String,
    codec: S,
    extract: X,
    build: B,
    unit: bool,
}

impl<T, S, X, B> DataVariant<T> for Variant<S, X, B>
where
    S: Serializer + Send + Sync,
    X: Fn(&T) -> Option<S::Input> + Send + Sync,
    B: Fn(S::Output) -> T + Send + Sync,
{
    fn kind(&self) -> &str {
        &self.kind
    }

    fn describe(&self) -> String {
        if self.unit {
            self.kind.clone()
        } else {
            format!("{}: {}", self.kind, self.codec.description())
        }
    }

    fn fixed_size(&self) -> Option<usize> {
        self.codec.fixed_size()
    }

    fn max_size(&self) -> Option<usize> {
        self.codec.max_size()
    }

    fn write(&self, out: &mut Writer, value: &T) -> Result<bool, Error> {
        match (self.extract)(value) {
            Some(payload) => {
                out.encode(&self.codec, &payload)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn read(&self, buf: &mut Reader<'_>) -> Result<T, Error> {
        Ok((self.build)(buf.decode(&self.codec)?))
    }
}

/// Tagged union: an ordinal selecting the variant, then its payload.
///
/// Variants are registered in ordinal order with [`Self::variant`] and
/// [`Self::unit_variant`].
pub struct DataEnumSerializer<T> {
    variants: Vec<Arc<dyn DataVariant<T>>>,
    prefix: Arc<dyn PrefixSerializer>,
    custom_description: Option<String>,
    description: String,
}

/// Data enum with no variants yet and a `u8` ordinal.
pub fn data_enum<T: 'static>() -> DataEnumSerializer<T> {
    DataEnumSerializer {
        variants: Vec::new(),
        prefix: Arc::new(u8()),
        custom_description: None,
        description: String::new(),
    }
    .described()
}

impl<T: 'static> DataEnumSerializer<T> {
    /// Adds a variant whose payload is `extract`ed from matching values and
    /// turned back into `T` by `build`.
    pub fn variant<S, X, B>(mut self, kind: impl Into<String>, codec: S, extract: X, build: B) -> Self
    where
        S: Serializer + Send + Sync + 'static,
        X: Fn(&T) -> Option<S::Input> + Send + Sync + 'static,
        B: Fn(S::Output) -> T + Send + Sync + 'static,
    {
        self.variants.push(Arc::new(Variant {
            kind: kind.into(),
            codec,
            extract,
            build,
            unit: false,
        }));
        self.described()
    }

    /// Adds a payload-less variant standing for `value`.
    pub fn unit_variant(mut self, kind: impl Into<String>, value: T) -> Self
    where
        T: Clone + PartialEq + Send + Sync,
    {
        let matches = value.clone();
        self.variants.push(Arc::new(Variant {
            kind: kind.into(),
            codec: unit(),
            extract: move |v: &T| (*v == matches).then_some(()),
            build: move |()| value.clone(),
            unit: true,
        }));
        self.described()
    }

    /// Replaces the `u8` ordinal codec.
    pub fn prefix(mut self, prefix: impl PrefixSerializer + 'static) -> Self {
        self.prefix = Arc::new(prefix);
        self.described()
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.custom_description = Some(description.into());
        self.described()
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.variants.iter().map(|variant| variant.kind())
    }

    fn described(mut self) -> Self {
        self.description = match &self.custom_description {
            Some(description) => description.clone(),
            None => format!(
                "dataEnum({}; {})",
                self.variants
                    .iter()
                    .map(|variant| variant.describe())
                    .collect::<Vec<_>>()
                    .join(", "),
                self.prefix.prefix_description()
            ),
        };
        self
    }

    fn invalid_variant(&self, variant: impl fmt::Display) -> Error {
        Error::InvalidEnumVariant {
            serializer: self.description.clone(),
            variant: variant.to_string(),
            expected: self.kinds().collect::<Vec<_>>().join(", "),
        }
    }
}

impl<T> Clone for DataEnumSerializer<T> {
    fn clone(&self) -> Self {
        Self {
            variants: self.variants.clone(),
            prefix: self.prefix.clone(),
            custom_description: self.custom_description.clone(),
            description: self.description.clone(),
        }
    }
}

impl<T> fmt::Debug for DataEnumSerializer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataEnumSerializer")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl<T: 'static> Serializer for DataEnumSerializer<T> {
    type Input = T;
    type Output = T;

    fn description(&self) -> &str {
        &self.description
    }

    fn fixed_size(&self) -> Option<usize> {
        let mut sizes = self.variants.iter().map(|variant| variant.fixed_size());
        let first = sizes.next()??;
        if sizes.all(|size| size == Some(first)) {
            sum_sizes([self.prefix.prefix_fixed_size(), Some(first)])
        } else {
            None
        }
    }

    fn max_size(&self) -> Option<usize> {
        let payload = self
            .variants
            .iter()
            .map(|variant| variant.max_size())
            .try_fold(0, |acc, size| size.map(|size| acc.max(size)))?;

        sum_sizes([self.prefix.prefix_max_size(), Some(payload)])
    }

    fn serialize(&self, value: &T) -> Result<Vec<u8>, Error> {
        let mut out = Writer::for_size(self.fixed_size(), self.max_size());
        for (ordinal, variant) in self.variants.iter().enumerate() {
            out.write(&self.prefix.serialize_usize(ordinal)?);
            if variant.write(&mut out, value)? {
                return Ok(out.output());
            }
            out.buf.clear();
        }

        Err(self.invalid_variant("value matching no variant"))
    }

    fn deserialize(&self, bytes: &[u8], offset: usize) -> Result<(T, usize), Error> {
        let mut buf = Reader::new(bytes, offset);
        let ordinal = buf.decode_prefix(self.prefix.as_ref())?;
        let variant = self
            .variants
            .get(ordinal)
            .ok_or_else(|| self.invalid_variant(ordinal))?;
        let value = variant.read(&mut buf)?;

        Ok((value, buf.position()))
    }
}
