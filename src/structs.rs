use super::{
    adapters::{map_serializer, MappedSerializer},
    cursor::{Reader, Writer},
    error::Error,
    size::sum_sizes,
    Serializer,
};

/// Tuple of serializers, encoded back to back.
pub trait TupleItems {
    type Input;
    type Output;

    fn descriptions(&self) -> Vec<&str>;

    fn fixed_sizes(&self) -> Vec<Option<usize>>;

    fn max_sizes(&self) -> Vec<Option<usize>>;

    fn write(&self, out: &mut Writer, value: &Self::Input) -> Result<(), Error>;

    fn read(&self, buf: &mut Reader<'_>) -> Result<Self::Output, Error>;
}

/// Tuple of `(name, serializer)` pairs, encoded back to back in declaration
/// order.
pub trait FieldList {
    type Input;
    type Output;

    fn names(&self) -> Vec<&'static str>;

    fn descriptions(&self) -> Vec<&str>;

    fn fixed_sizes(&self) -> Vec<Option<usize>>;

    fn max_sizes(&self) -> Vec<Option<usize>>;

    fn write(&self, out: &mut Writer, value: &Self::Input) -> Result<(), Error>;

    fn read(&self, buf: &mut Reader<'_>) -> Result<Self::Output, Error>;
}

// Each arity gets both a positional and a named implementation.
macro_rules! impl_tuple {
    ($($name:ident $index:tt),*) => {
        impl<$($name: Serializer),*> TupleItems for ($($name,)*) {
            type Input = ($($name::Input,)*);
            type Output = ($($name::Output,)*);

            fn descriptions(&self) -> Vec<&str> {
                vec![$(self.$index.description()),*]
            }

            fn fixed_sizes(&self) -> Vec<Option<usize>> {
                vec![$(self.$index.fixed_size()),*]
            }

            fn max_sizes(&self) -> Vec<Option<usize>> {
                vec![$(self.$index.max_size()),*]
            }

            #[allow(unused_variables)]
            fn write(&self, out: &mut Writer, value: &Self::Input) -> Result<(), Error> {
                $(out.encode(&self.$index, &value.$index)?;)*
                Ok(())
            }

            #[allow(unused_variables)]
            fn read(&self, buf: &mut Reader<'_>) -> Result<Self::Output, Error> {
                Ok(($(buf.decode(&self.$index)?,)*))
            }
        }

        impl<$($name: Serializer),*> FieldList for ($((&'static str, $name),)*) {
            type Input = ($($name::Input,)*);
            type Output = ($($name::Output,)*);

            fn names(&self) -> Vec<&'static str> {
                vec![$(self.$index.0),*]
            }

            fn descriptions(&self) -> Vec<&str> {
                vec![$(self.$index.1.description()),*]
            }

            fn fixed_sizes(&self) -> Vec<Option<usize>> {
                vec![$(self.$index.1.fixed_size()),*]
            }

            fn max_sizes(&self) -> Vec<Option<usize>> {
                vec![$(self.$index.1.max_size()),*]
            }

            #[allow(unused_variables)]
            fn write(&self, out: &mut Writer, value: &Self::Input) -> Result<(), Error> {
                $(out.encode(&self.$index.1, &value.$index)?;)*
                Ok(())
            }

            #[allow(unused_variables)]
            fn read(&self, buf: &mut Reader<'_>) -> Result<Self::Output, Error> {
                Ok(($(buf.decode(&self.$index.1)?,)*))
            }
        }
    };
}

impl_tuple!();
impl_tuple!(A 0);
impl_tuple!(A 0, B 1);
impl_tuple!(A 0, B 1, C 2);
impl_tuple!(A 0, B 1, C 2, D 3);
impl_tuple!(A 0, B 1, C 2, D 3, E 4);
impl_tuple!(A 0, B 1, C 2, D 3, E 4, F 5);
impl_tuple!(A 0, B 1, C 2, D 3, E 4, F 5, G 6);
impl_tuple!(A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7);
impl_tuple!(A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7, I 8);
impl_tuple!(A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7, I 8, J 9);
impl_tuple!(A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7, I 8, J 9, K 10);
impl_tuple!(A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7, I 8, J 9, K 10, L 11);

/// Named fields encoded in declaration order.
///
/// The value type is the tuple of field values. Bytes after the last field
/// are left alone, so a struct can be read from a buffer that carries more
/// data than it declares.
#[derive(Clone, Debug)]
pub struct StructSerializer<F> {
    fields: F,
    description: String,
}

pub fn struct_serializer<F: FieldList>(fields: F) -> StructSerializer<F> {
    let description = format!(
        "struct({})",
        fields
            .names()
            .iter()
            .zip(fields.descriptions())
            .map(|(name, description)| format!("{name}: {description}"))
            .collect::<Vec<_>>()
            .join(", ")
    );

    StructSerializer {
        fields,
        description,
    }
}

impl<F> StructSerializer<F> {
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

impl<F: FieldList> Serializer for StructSerializer<F> {
    type Input = F::Input;
    type Output = F::Output;

    fn description(&self) -> &str {
        &self.description
    }

    fn fixed_size(&self) -> Option<usize> {
        sum_sizes(self.fields.fixed_sizes())
    }

    fn max_size(&self) -> Option<usize> {
        sum_sizes(self.fields.max_sizes())
    }

    fn serialize(&self, value: &F::Input) -> Result<Vec<u8>, Error> {
        let mut out = Writer::for_size(self.fixed_size(), self.max_size());
        self.fields.write(&mut out, value)?;

        Ok(out.output())
    }

    fn deserialize(&self, bytes: &[u8], offset: usize) -> Result<(F::Output, usize), Error> {
        let mut buf = Reader::new(bytes, offset);
        let value = self.fields.read(&mut buf)?;

        Ok((value, buf.position()))
    }
}

/// A struct that converts to and from the tuple of its field values.
///
/// `#[derive(Fields)]` implements it for structs whose fields are `Clone`.
pub trait Fields: Sized {
    type Tuple;

    /// Field names in declaration order.
    const NAMES: &'static [&'static str];

    fn to_fields(&self) -> Self::Tuple;

    fn from_fields(fields: Self::Tuple) -> Self;
}

/// Struct codec producing `T` directly.
///
/// Fails if the names in `fields` differ from `T::NAMES`.
pub fn struct_of<T, F>(fields: F) -> Result<MappedSerializer<StructSerializer<F>, T, T>, Error>
where
    T: Fields + 'static,
    F: FieldList<Input = T::Tuple, Output = T::Tuple>,
{
    let names = fields.names();
    if names.as_slice() != T::NAMES {
        return Err(Error::InvalidComposition(format!(
            "fields [{}] do not match struct fields [{}]",
            names.join(", "),
            T::NAMES.join(", ")
        )));
    }

    Ok(map_serializer(
        struct_serializer(fields),
        T::to_fields,
        T::from_fields,
    ))
}

/// Positional values encoded in order.
#[derive(Clone, Debug)]
pub struct TupleSerializer<T> {
    items: T,
    description: String,
}

pub fn tuple<T: TupleItems>(items: T) -> TupleSerializer<T> {
    let description = format!("tuple({})", items.descriptions().join(", "));
    TupleSerializer { items, description }
}

impl<T> TupleSerializer<T> {
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

impl<T: TupleItems> Serializer for TupleSerializer<T> {
    type Input = T::Input;
    type Output = T::Output;

    fn description(&self) -> &str {
        &self.description
    }

    fn fixed_size(&self) -> Option<usize> {
        sum_sizes(self.items.fixed_sizes())
    }

    fn max_size(&self) -> Option<usize> {
        sum_sizes(self.items.max_sizes())
    }

    fn serialize(&self, value: &T::Input) -> Result<Vec<u8>, Error> {
        let mut out = Writer::for_size(self.fixed_size(), self.max_size());
        self.items.write(&mut out, value)?;

        Ok(out.output())
    }

    fn deserialize(&self, bytes: &[u8], offset: usize) -> Result<(T::Output, usize), Error> {
        let mut buf = Reader::new(bytes, offset);
        let value = self.items.read(&mut buf)?;

        Ok((value, buf.position()))
    }
}
