use super::{
    cursor::{Reader, Writer},
    error::Error,
    numbers::u8,
    size::{sum_sizes, EmptyBuffer, PrefixSerializer},
    Serializer,
};
use std::{fmt, sync::Arc};

#[derive(Clone)]
pub struct OptionOptions {
    /// Discriminant codec: `0` for none, `1` for some.
    pub prefix: Arc<dyn PrefixSerializer>,
    /// Reserve the item's bytes, zero-filled, when there is no value.
    pub fixed: bool,
    pub description: Option<String>,
    pub empty_buffer: EmptyBuffer,
}

impl Default for OptionOptions {
    fn default() -> Self {
        Self {
            prefix: Arc::new(u8()),
            fixed: false,
            description: None,
            empty_buffer: EmptyBuffer::default(),
        }
    }
}

impl OptionOptions {
    pub fn prefix(mut self, prefix: impl PrefixSerializer + 'static) -> Self {
        self.prefix = Arc::new(prefix);
        self
    }

    pub fn fixed(mut self, fixed: bool) -> Self {
        self.fixed = fixed;
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

/// Optional value behind a presence discriminant.
#[derive(Clone)]
pub struct OptionSerializer<S> {
    item: S,
    prefix: Arc<dyn PrefixSerializer>,
    fixed: bool,
    empty_buffer: EmptyBuffer,
    description: String,
}

/// `u8` discriminant followed by the item when present.
pub fn option<S: Serializer>(item: S) -> OptionSerializer<S> {
    build("option", item, OptionOptions::default())
}

pub fn option_with<S: Serializer>(
    item: S,
    options: OptionOptions,
) -> Result<OptionSerializer<S>, Error> {
    checked(build("option", item, options))
}

/// Same layout as [`option`], for values that are nullable rather than
/// optional.
pub fn nullable<S: Serializer>(item: S) -> OptionSerializer<S> {
    build("nullable", item, OptionOptions::default())
}

pub fn nullable_with<S: Serializer>(
    item: S,
    options: OptionOptions,
) -> Result<OptionSerializer<S>, Error> {
    checked(build("nullable", item, options))
}

fn build<S: Serializer>(kind: &str, item: S, options: OptionOptions) -> OptionSerializer<S> {
    let OptionOptions {
        prefix,
        fixed,
        description,
        empty_buffer,
    } = options;
    let description = description.unwrap_or_else(|| {
        format!(
            "{kind}({}; {}{})",
            item.description(),
            if fixed { "fixed " } else { "" },
            prefix.prefix_description()
        )
    });

    OptionSerializer {
        item,
        prefix,
        fixed,
        empty_buffer,
        description,
    }
}

fn checked<S: Serializer>(option: OptionSerializer<S>) -> Result<OptionSerializer<S>, Error> {
    if option.fixed
        && (option.item.fixed_size().is_none() || option.prefix.prefix_fixed_size().is_none())
    {
        return Err(Error::expected_fixed_size(format!(
            "fixed {} requires a fixed-size item and prefix",
            option.description
        )));
    }

    Ok(option)
}

impl<S> fmt::Debug for OptionSerializer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionSerializer")
            .field("description", &self.description)
            .field("fixed", &self.fixed)
            .field("empty_buffer", &self.empty_buffer)
            .finish_non_exhaustive()
    }
}

impl<S: Serializer> Serializer for OptionSerializer<S> {
    type Input = Option<S::Input>;
    type Output = Option<S::Output>;

    fn description(&self) -> &str {
        &self.description
    }

    fn fixed_size(&self) -> Option<usize> {
        let item = self.item.fixed_size();
        if self.fixed || item == Some(0) {
            sum_sizes([self.prefix.prefix_fixed_size(), item])
        } else {
            None
        }
    }

    fn max_size(&self) -> Option<usize> {
        sum_sizes([self.prefix.prefix_max_size(), self.item.max_size()])
    }

    fn serialize(&self, value: &Option<S::Input>) -> Result<Vec<u8>, Error> {
        let mut out = Writer::for_size(self.fixed_size(), self.max_size());
        match value {
            Some(value) => {
                out.write(&self.prefix.serialize_usize(1)?);
                out.encode(&self.item, value)?;
            }
            None => {
                out.write(&self.prefix.serialize_usize(0)?);
                if self.fixed {
                    let padding = self.item.fixed_size().unwrap_or_default();
                    out.buf.resize(out.buf.len() + padding, 0);
                }
            }
        }

        Ok(out.output())
    }

    fn deserialize(
        &self,
        bytes: &[u8],
        offset: usize,
    ) -> Result<(Option<S::Output>, usize), Error> {
        let mut buf = Reader::new(bytes, offset);
        // a fixed layout is never substituted by an empty value
        if self.fixed_size().is_none()
            && self
                .empty_buffer
                .take_empty(buf.remaining(), &self.description)?
        {
            return Ok((None, offset));
        }

        let value = if buf.decode_prefix(self.prefix.as_ref())? == 0 {
            if self.fixed {
                let padding = self.item.fixed_size().unwrap_or_default();
                buf.read(padding, &self.description)?;
            }
            None
        } else {
            Some(buf.decode(&self.item)?)
        };

        Ok((value, buf.position()))
    }
}
