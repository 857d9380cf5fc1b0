use super::{cursor::Reader, error::Error, Serializer};

/// Packs values of arbitrary bit width, least significant bit first.
#[derive(Clone, Debug, PartialEq)]
pub struct BitWriter {
    bytes: Vec<u8>,
    bit_offset: usize,
}

/// Reads values packed by [`BitWriter`]. Bits past the end read as zero.
#[derive(Clone, Debug, PartialEq)]
pub struct BitReader<'a> {
    bytes: &'a [u8],
    byte_offset: usize,
    bit_offset: usize,
}

fn zero_top_byte_bits(v: usize, bits: usize) -> usize {
    let mask = 0xff_usize >> bits;
    v & mask
}

impl BitWriter {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            bit_offset: 0,
        }
    }

    #[must_use]
    fn byte_bits_free(&self) -> usize {
        8 - self.bit_offset
    }

    fn write_into_last_byte(&mut self, v: usize) {
        if let Some(last) = self.bytes.last_mut() {
            *last |= (v << self.bit_offset) as u8;
        }
    }

    /// Appends the low `bits` bits of `v`.
    pub fn write(&mut self, bits: usize, v: usize) {
        if bits == 0 {
            return;
        }
        if self.bit_offset == 0 {
            self.bytes.push(0);
        }
        let free = self.byte_bits_free();
        if bits <= free {
            self.write_into_last_byte(zero_top_byte_bits(v, 8 - bits));
            self.bit_offset = (self.bit_offset + bits) % 8;
        } else {
            // fill the current byte, carry the rest over
            self.write_into_last_byte(zero_top_byte_bits(v, self.bit_offset));
            self.bit_offset = 0;
            self.write(bits - free, v >> free);
        }
    }

    pub fn view_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl<'a> BitReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            byte_offset: 0,
            bit_offset: 0,
        }
    }

    fn byte_bits_free(&self) -> usize {
        8 - self.bit_offset
    }

    fn current_byte(&self) -> usize {
        self.bytes
            .get(self.byte_offset)
            .copied()
            .map(usize::from)
            .unwrap_or_default()
    }

    pub fn read(&mut self, bits: usize) -> usize {
        if bits == 0 {
            return 0;
        }

        let free = self.byte_bits_free();
        if bits <= free {
            let clear = 8 - (self.bit_offset + bits);
            let v = zero_top_byte_bits(self.current_byte(), clear) >> self.bit_offset;
            if bits == free {
                self.bit_offset = 0;
                self.byte_offset += 1;
            } else {
                self.bit_offset += bits;
            }
            v
        } else {
            let v = self.current_byte() >> self.bit_offset;
            self.bit_offset = 0;
            self.byte_offset += 1;
            v | (self.read(bits - free) << free)
        }
    }

    /// Bits left before the end of the buffer.
    pub fn non_read_bits(&self) -> usize {
        (self.bytes.len() * 8).saturating_sub(self.byte_offset * 8 + self.bit_offset)
    }
}

#[derive(Clone, Debug, Default)]
pub struct BitArrayOptions {
    /// Least significant bit first, with the byte order reversed.
    pub backward: bool,
    pub description: Option<String>,
}

impl BitArrayOptions {
    pub fn backward(mut self, backward: bool) -> Self {
        self.backward = backward;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Booleans packed eight to a byte into exactly `size` bytes.
///
/// Missing flags serialize as `false` and flags past `size * 8` are dropped;
/// deserializing always yields `size * 8` flags.
#[derive(Clone, Debug)]
pub struct BitArraySerializer {
    size: usize,
    backward: bool,
    description: String,
}

/// Most significant bit first.
pub fn bit_array(size: usize) -> BitArraySerializer {
    bit_array_with(size, BitArrayOptions::default())
}

pub fn bit_array_with(size: usize, options: BitArrayOptions) -> BitArraySerializer {
    let BitArrayOptions {
        backward,
        description,
    } = options;
    let description = description.unwrap_or_else(|| {
        if backward {
            format!("bitArray({size}; backward)")
        } else {
            format!("bitArray({size})")
        }
    });

    BitArraySerializer {
        size,
        backward,
        description,
    }
}

impl Serializer for BitArraySerializer {
    type Input = Vec<bool>;
    type Output = Vec<bool>;

    fn description(&self) -> &str {
        &self.description
    }

    fn fixed_size(&self) -> Option<usize> {
        Some(self.size)
    }

    fn max_size(&self) -> Option<usize> {
        Some(self.size)
    }

    fn serialize(&self, value: &Vec<bool>) -> Result<Vec<u8>, Error> {
        let mut w = BitWriter::new(Vec::with_capacity(self.size));
        for i in 0..self.size * 8 {
            let bit = value.get(i).copied().unwrap_or(false);
            w.write(1, usize::from(bit));
        }
        let mut bytes = w.into_bytes();
        if self.backward {
            bytes.reverse();
        } else {
            bytes.iter_mut().for_each(|b| *b = b.reverse_bits());
        }

        Ok(bytes)
    }

    fn deserialize(&self, bytes: &[u8], offset: usize) -> Result<(Vec<bool>, usize), Error> {
        let mut buf = Reader::new(bytes, offset);
        let mut raw = buf.read(self.size, &self.description)?.to_vec();
        if self.backward {
            raw.reverse();
        } else {
            raw.iter_mut().for_each(|b| *b = b.reverse_bits());
        }

        let mut r = BitReader::new(&raw);
        let mut flags = Vec::with_capacity(self.size * 8);
        while r.non_read_bits() > 0 {
            flags.push(r.read(1) == 1);
        }

        Ok((flags, buf.position()))
    }
}
