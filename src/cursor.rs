use super::{error::Error, size::PrefixSerializer, Serializer};

/// Offset-tracked view over an input buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct Reader<'a> {
    pub buf: &'a [u8],
    offset: usize,
}

/// Growable output buffer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Writer {
    pub buf: Vec<u8>,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8], offset: usize) -> Self {
        Self { buf, offset }
    }

    /// Read n bytes on behalf of `serializer`.
    pub fn read(&mut self, n: usize, serializer: &str) -> Result<&'a [u8], Error> {
        let remaining = self.remaining();
        if n > 0 && remaining.is_empty() {
            return Err(Error::empty_buffer(serializer));
        }
        let res = remaining.get(..n).ok_or_else(|| Error::NotEnoughBytes {
            serializer: serializer.to_string(),
            expected: n,
            actual: remaining.len(),
        })?;
        self.offset += n;

        Ok(res)
    }

    /// Reads 1 byte.
    pub fn read_byte(&mut self, serializer: &str) -> Result<u8, Error> {
        Ok(self.read(1, serializer)?[0])
    }

    /// Runs `serializer` at the cursor and moves past what it consumed.
    pub fn decode<S>(&mut self, serializer: &S) -> Result<S::Output, Error>
    where
        S: Serializer + ?Sized,
    {
        let (value, offset) = serializer.deserialize(self.buf, self.offset)?;
        self.offset = offset;

        Ok(value)
    }

    /// Reads a count, length or discriminant through `prefix`.
    pub fn decode_prefix(&mut self, prefix: &dyn PrefixSerializer) -> Result<usize, Error> {
        let (value, offset) = prefix.deserialize_usize(self.buf, self.offset)?;
        self.offset = offset;

        Ok(value)
    }

    /// Everything after the cursor. Empty when the offset lies past the end.
    pub fn remaining(&self) -> &'a [u8] {
        self.buf.get(self.offset..).unwrap_or_default()
    }

    // Position of internal cursor.
    pub fn position(&self) -> usize {
        self.offset
    }

    // Empty returns true if the whole buffer is consumed
    pub fn empty(&self) -> bool {
        self.remaining().is_empty()
    }
}

impl Writer {
    pub fn new(buf: Vec<u8>) -> Self {
        Self { buf }
    }

    /// Pre-sizes the buffer from a serializer's size hints.
    pub fn for_size(fixed_size: Option<usize>, max_size: Option<usize>) -> Self {
        Self::new(Vec::with_capacity(fixed_size.or(max_size).unwrap_or(0)))
    }

    pub fn write(&mut self, v: &[u8]) {
        self.buf.extend_from_slice(v);
    }

    /// Appends the encoding of `value` under `serializer`.
    pub fn encode<S>(&mut self, serializer: &S, value: &S::Input) -> Result<(), Error>
    where
        S: Serializer + ?Sized,
    {
        let bytes = serializer.serialize(value)?;
        self.write(&bytes);

        Ok(())
    }

    pub fn output(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    const N: usize = 100;
    const BB: &[u8] = &hex!("0000FF0900");

    #[test]
    fn writer_reader() {
        let mut w = Writer::new(Vec::with_capacity(N / 2));
        for i in 0..N {
            w.write(&[i as u8]);
        }
        assert_eq!(N, w.buf.len());
        w.write(BB);
        assert_eq!(N + BB.len(), w.buf.len());

        let mut r = Reader::new(&w.buf, 0);
        assert!(!r.empty());
        for exp in 0..N {
            let got = r.read_byte("test").unwrap();
            assert_eq!(exp as u8, got);
        }
        assert_eq!(N, r.position());
        let got = r.read(BB.len(), "test").unwrap();
        assert_eq!(BB, got);
        assert!(r.empty());
    }

    #[test]
    fn short_reads() {
        let mut r = Reader::new(&BB[..2], 0);
        assert_eq!(
            r.read(4, "test"),
            Err(Error::NotEnoughBytes {
                serializer: "test".into(),
                expected: 4,
                actual: 2
            })
        );
        // a failed read leaves the cursor in place
        assert_eq!(r.position(), 0);

        let mut r = Reader::new(BB, BB.len() + 3);
        assert!(r.empty());
        assert_eq!(r.read_byte("test"), Err(Error::empty_buffer("test")));
        assert_eq!(r.read(0, "test"), Ok(&[][..]));
    }
}
