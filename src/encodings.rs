//! String encodings: UTF-8 and digit strings in a given radix.
//!
//! Every codec here is variable-sized and reads the whole rest of the buffer
//! on deserialize, so they are usually wrapped in [`crate::string`] or
//! [`crate::fix_serializer`] when embedded in larger layouts.

use super::{
    adapters::{map_serializer, MappedSerializer},
    cursor::Reader,
    error::Error,
    Serializer,
};

const BASE10_ALPHABET: &str = "0123456789";
const BASE16_ALPHABET: &[u8; 16] = b"0123456789abcdef";
const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";
const BASE64_ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

#[derive(Clone, Debug)]
pub struct Utf8 {
    description: String,
}

/// UTF-8 text. Decoding is lossy and drops NUL characters, so zero padding
/// added by fixed-size wrappers disappears on the way back.
pub fn utf8() -> Utf8 {
    Utf8 {
        description: "utf8".to_string(),
    }
}

impl Serializer for Utf8 {
    type Input = String;
    type Output = String;

    fn description(&self) -> &str {
        &self.description
    }

    fn fixed_size(&self) -> Option<usize> {
        None
    }

    fn max_size(&self) -> Option<usize> {
        None
    }

    fn serialize(&self, value: &String) -> Result<Vec<u8>, Error> {
        Ok(value.as_bytes().to_vec())
    }

    fn deserialize(&self, bytes: &[u8], offset: usize) -> Result<(String, usize), Error> {
        let rest = Reader::new(bytes, offset).remaining();
        let value = String::from_utf8_lossy(rest).replace('\0', "");

        Ok((value, offset + rest.len()))
    }
}

/// Maps between characters and digit values.
#[derive(Clone, Debug)]
struct Alphabet {
    chars: Vec<u8>,
    lookup: [Option<u8>; 128],
}

impl Alphabet {
    /// Builds a lookup table for an alphabet known to be valid.
    fn build(alphabet: &str) -> Self {
        let chars = alphabet.as_bytes().to_vec();
        let mut lookup = [None; 128];
        for (digit, &c) in chars.iter().enumerate() {
            lookup[usize::from(c & 0x7f)] = u8::try_from(digit).ok();
        }

        Self { chars, lookup }
    }

    fn new(alphabet: &str) -> Result<Self, Error> {
        let len = alphabet.len();
        if !(2..=256).contains(&len) {
            return Err(Error::InvalidComposition(format!(
                "alphabet must hold between 2 and 256 characters, got {len}"
            )));
        }
        if !alphabet.is_ascii() {
            return Err(Error::InvalidComposition(format!(
                "alphabet [{alphabet}] must be ASCII"
            )));
        }
        let bytes = alphabet.as_bytes();
        if bytes
            .iter()
            .enumerate()
            .any(|(i, c)| bytes[..i].contains(c))
        {
            return Err(Error::InvalidComposition(format!(
                "alphabet [{alphabet}] repeats characters"
            )));
        }

        Ok(Self::build(alphabet))
    }

    fn base(&self) -> usize {
        self.chars.len()
    }

    /// Digit values of `value`, or the error naming the offending string.
    fn digits(&self, value: &str) -> Result<Vec<u8>, Error> {
        value
            .chars()
            .map(|c| {
                u8::try_from(c)
                    .ok()
                    .and_then(|c| self.lookup.get(usize::from(c)).copied().flatten())
            })
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| Error::InvalidBaseString {
                base: self.base(),
                value: value.to_string(),
            })
    }

    fn char(&self, digit: u8) -> char {
        char::from(self.chars[usize::from(digit)])
    }
}

/// Digit string read as a big-endian number in the alphabet's radix.
#[derive(Clone, Debug)]
pub struct BaseX {
    alphabet: Alphabet,
    description: String,
}

impl BaseX {
    fn with_alphabet(alphabet: Alphabet) -> Self {
        let description = format!("base{}", alphabet.base());
        Self {
            alphabet,
            description,
        }
    }
}

/// Radix codec over a custom ASCII alphabet; the first character is zero.
pub fn base_x(alphabet: &str) -> Result<BaseX, Error> {
    Ok(BaseX::with_alphabet(Alphabet::new(alphabet)?))
}

pub fn base10() -> BaseX {
    BaseX::with_alphabet(Alphabet::build(BASE10_ALPHABET))
}

/// Bitcoin alphabet, without `0`, `O`, `I` and `l`.
pub fn base58() -> BaseX {
    BaseX::with_alphabet(Alphabet::build(BASE58_ALPHABET))
}

impl Serializer for BaseX {
    type Input = String;
    type Output = String;

    fn description(&self) -> &str {
        &self.description
    }

    fn fixed_size(&self) -> Option<usize> {
        None
    }

    fn max_size(&self) -> Option<usize> {
        None
    }

    fn serialize(&self, value: &String) -> Result<Vec<u8>, Error> {
        let digits = self.alphabet.digits(value)?;
        let base = self.alphabet.base() as u32;

        // each leading zero digit stands for one zero byte
        let zeros = digits.iter().take_while(|&&d| d == 0).count();

        // little-endian base-256 accumulator
        let mut tail: Vec<u8> = Vec::with_capacity(digits.len());
        for &digit in &digits[zeros..] {
            let mut carry = u32::from(digit);
            for byte in tail.iter_mut() {
                carry += u32::from(*byte) * base;
                *byte = carry as u8;
                carry >>= 8;
            }
            while carry > 0 {
                tail.push(carry as u8);
                carry >>= 8;
            }
        }

        let mut out = vec![0; zeros];
        out.extend(tail.iter().rev());
        Ok(out)
    }

    fn deserialize(&self, bytes: &[u8], offset: usize) -> Result<(String, usize), Error> {
        let rest = Reader::new(bytes, offset).remaining();
        let base = self.alphabet.base() as u32;

        let zeros = rest.iter().take_while(|&&b| b == 0).count();

        // little-endian accumulator of digits in the target radix
        let mut digits: Vec<u8> = Vec::with_capacity(rest.len() * 2);
        for &byte in &rest[zeros..] {
            let mut carry = u32::from(byte);
            for digit in digits.iter_mut() {
                carry += u32::from(*digit) << 8;
                *digit = (carry % base) as u8;
                carry /= base;
            }
            while carry > 0 {
                digits.push((carry % base) as u8);
                carry /= base;
            }
        }

        let value = std::iter::repeat(self.alphabet.char(0))
            .take(zeros)
            .chain(digits.iter().rev().map(|&d| self.alphabet.char(d)))
            .collect();

        Ok((value, offset + rest.len()))
    }
}

/// Lowercase hexadecimal. Input is case-insensitive and an odd number of
/// digits gets an implicit leading zero.
#[derive(Clone, Debug)]
pub struct Base16 {
    description: String,
}

pub fn base16() -> Base16 {
    Base16 {
        description: "base16".to_string(),
    }
}

impl Serializer for Base16 {
    type Input = String;
    type Output = String;

    fn description(&self) -> &str {
        &self.description
    }

    fn fixed_size(&self) -> Option<usize> {
        None
    }

    fn max_size(&self) -> Option<usize> {
        None
    }

    fn serialize(&self, value: &String) -> Result<Vec<u8>, Error> {
        let nibbles = value
            .chars()
            .map(|c| c.to_digit(16).map(|d| d as u8))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| Error::InvalidBaseString {
                base: 16,
                value: value.clone(),
            })?;

        let (head, pairs) = nibbles.split_at(nibbles.len() % 2);
        Ok(head
            .iter()
            .copied()
            .chain(pairs.chunks_exact(2).map(|pair| (pair[0] << 4) | pair[1]))
            .collect())
    }

    fn deserialize(&self, bytes: &[u8], offset: usize) -> Result<(String, usize), Error> {
        let rest = Reader::new(bytes, offset).remaining();
        let mut value = String::with_capacity(rest.len() * 2);
        for &byte in rest {
            value.push(char::from(BASE16_ALPHABET[usize::from(byte >> 4)]));
            value.push(char::from(BASE16_ALPHABET[usize::from(byte & 0x0f)]));
        }

        Ok((value, offset + rest.len()))
    }
}

/// Digit string where every character carries exactly `bits` bits, packed
/// most significant first.
#[derive(Clone, Debug)]
pub struct BaseXReverse {
    alphabet: Alphabet,
    bits: u32,
    description: String,
}

/// Bit-packing codec; `alphabet` must hold exactly `2^bits` characters.
pub fn base_x_reverse(alphabet: &str, bits: u32) -> Result<BaseXReverse, Error> {
    if !(1..=8).contains(&bits) || alphabet.len() != 1 << bits {
        return Err(Error::InvalidComposition(format!(
            "alphabet of {} characters cannot encode {bits} bits per character",
            alphabet.len()
        )));
    }

    Ok(BaseXReverse::with_alphabet(Alphabet::new(alphabet)?, bits))
}

impl BaseXReverse {
    fn with_alphabet(alphabet: Alphabet, bits: u32) -> Self {
        let description = format!("base{}", alphabet.base());
        Self {
            alphabet,
            bits,
            description,
        }
    }
}

/// Regroups a stream of `input_bits`-wide values into `output_bits`-wide ones.
fn reslice(input: &[u8], input_bits: u32, output_bits: u32, use_remainder: bool) -> Vec<u8> {
    let mut output = Vec::with_capacity(input.len() * input_bits as usize / output_bits as usize + 1);
    let mask = (1_u32 << output_bits) - 1;
    let mut acc = 0_u32;
    let mut acc_bits = 0_u32;
    for &value in input {
        acc = (acc << input_bits) | u32::from(value);
        acc_bits += input_bits;
        while acc_bits >= output_bits {
            acc_bits -= output_bits;
            output.push(((acc >> acc_bits) & mask) as u8);
        }
        acc &= (1 << acc_bits) - 1;
    }
    if use_remainder && acc_bits > 0 {
        output.push(((acc << (output_bits - acc_bits)) & mask) as u8);
    }

    output
}

impl Serializer for BaseXReverse {
    type Input = String;
    type Output = String;

    fn description(&self) -> &str {
        &self.description
    }

    fn fixed_size(&self) -> Option<usize> {
        None
    }

    fn max_size(&self) -> Option<usize> {
        None
    }

    fn serialize(&self, value: &String) -> Result<Vec<u8>, Error> {
        let digits = self.alphabet.digits(value)?;
        Ok(reslice(&digits, self.bits, 8, false))
    }

    fn deserialize(&self, bytes: &[u8], offset: usize) -> Result<(String, usize), Error> {
        let rest = Reader::new(bytes, offset).remaining();
        let value = reslice(rest, 8, self.bits, true)
            .into_iter()
            .map(|d| self.alphabet.char(d))
            .collect();

        Ok((value, offset + rest.len()))
    }
}

pub type Base64 = MappedSerializer<BaseXReverse, String, String>;

/// RFC 4648 base64; `=` padding is ignored on input and added on output.
pub fn base64() -> Base64 {
    map_serializer(
        BaseXReverse::with_alphabet(Alphabet::build(BASE64_ALPHABET), 6),
        |value: &String| value.replace('=', ""),
        |value: String| {
            let padded = value.len().div_ceil(4) * 4;
            format!("{value:=<padded$}")
        },
    )
}
