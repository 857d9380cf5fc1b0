use ::bytes::Bytes;
use hex_literal::hex;
use rand::{thread_rng, Rng};
use umi_serializers::{deserialize, *};

#[derive(Clone, Debug, PartialEq, Fields)]
struct DeriveTest {
    field_a: u32,
    field_b: u64,
    name: String,
}

#[derive(Clone, Debug, PartialEq, Fields)]
struct DeriveTupleTest(u8, Option<u16>);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ScalarEnum)]
enum Color {
    Red,
    Green,
    Blue,
}

fn derive_test_serializer() -> impl Serializer<Input = DeriveTest, Output = DeriveTest> {
    struct_of::<DeriveTest, _>((
        ("field_a", u32()),
        ("field_b", u64()),
        ("name", string()),
    ))
    .unwrap()
}

#[test]
fn fields_derive_equivalence() -> anyhow::Result<()> {
    let value = DeriveTest {
        field_a: 0x1234_5678,
        field_b: 0x1234_5678_9abc_def0,
        name: "umi".into(),
    };

    let derived = derive_test_serializer().serialize(&value)?;
    let manual = struct_serializer((
        ("field_a", u32()),
        ("field_b", u64()),
        ("name", string()),
    ))
    .serialize(&(value.field_a, value.field_b, value.name.clone()))?;
    assert_eq!(derived, manual);
    assert_eq!(
        derived,
        hex!("78563412 f0debc9a78563412 03000000 756d69")
    );
    assert_eq!(deserialize(&derive_test_serializer(), &derived)?, value);

    assert_eq!(DeriveTest::NAMES, ["field_a", "field_b", "name"]);
    Ok(())
}

#[test]
fn fields_derive_tuple_struct() -> anyhow::Result<()> {
    assert_eq!(DeriveTupleTest::NAMES, ["0", "1"]);

    let s = struct_of::<DeriveTupleTest, _>((("0", u8()), ("1", option(u16()))))?;
    let value = DeriveTupleTest(7, Some(0x0102));
    let bytes = s.serialize(&value)?;
    assert_eq!(bytes, hex!("07 01 0201"));
    assert_eq!(s.deserialize(&bytes, 0)?, (value, 4));

    assert!(matches!(
        struct_of::<DeriveTupleTest, _>((("a", u8()), ("b", option(u16())))),
        Err(Error::InvalidComposition(_))
    ));
    Ok(())
}

#[test]
fn scalar_enum_derive() -> anyhow::Result<()> {
    assert_eq!(
        Color::VARIANTS,
        [
            ("Red", Color::Red),
            ("Green", Color::Green),
            ("Blue", Color::Blue)
        ]
    );

    let s = scalar_enum::<Color>();
    assert_eq!(s.description(), "enum(Red, Green, Blue; u8)");
    assert_eq!(s.serialize(&Color::Blue)?, [2]);
    assert_eq!(s.serialize_label("Green")?, [1]);
    assert_eq!(deserialize(&s, &[0])?, Color::Red);

    let wide = scalar_enum_with(Color::VARIANTS, EnumOptions::default().size(u32()));
    assert_eq!(wide.serialize(&Color::Green)?, hex!("01000000"));
    assert!(matches!(
        wide.deserialize(&hex!("03000000"), 0),
        Err(Error::InvalidEnumVariant { .. })
    ));
    Ok(())
}

#[test]
fn numbers_endianness() {
    assert_eq!(u16().serialize(&42).unwrap(), hex!("2a00"));
    let be = u16_with(NumberOptions::default().endian(Endian::Big));
    assert_eq!(be.serialize(&42).unwrap(), hex!("002a"));
    assert_eq!(be.description(), "u16(be)");
}

#[test]
fn base16_scenario() {
    assert_eq!(base16().serialize(&"2a".to_string()).unwrap(), [0x2a]);
    assert_eq!(base16().deserialize(&[0x2a], 0), Ok(("2a".to_string(), 1)));
}

#[test]
fn array_prefix_scenario() {
    assert_eq!(
        array(u8()).serialize(&vec![42, 1, 2]).unwrap(),
        hex!("03000000 2a 01 02")
    );
}

#[test]
fn fixed_string_scenario() {
    let s = fix_serializer(utf8(), 12);
    assert_eq!(
        s.serialize(&"Hello".to_string()).unwrap(),
        hex!("48656c6c6f 00000000000000")
    );
    assert!(matches!(
        s.deserialize(b"Hello", 0),
        Err(Error::NotEnoughBytes { .. })
    ));
}

#[test]
fn option_scenario() {
    assert_eq!(option(u8()).serialize(&None).unwrap(), [0x00]);
    assert_eq!(option(u8()).serialize(&Some(5)).unwrap(), [0x01, 0x05]);
}

#[test]
fn reverse_scenario() {
    let s = reverse_serializer(fix_serializer(base16(), 2)).unwrap();
    assert_eq!(s.serialize(&"00ff".to_string()).unwrap(), [0xff, 0x00]);
    assert!(matches!(
        reverse_serializer(utf8()),
        Err(Error::InvalidComposition(_))
    ));
}

#[test]
fn cardinality() {
    let s = array_with(u8(), ArrayLikeOptions::default().size(3)).unwrap();
    assert!(matches!(
        s.serialize(&vec![1, 2]),
        Err(Error::InvalidNumberOfItems {
            expected: 3,
            actual: 2,
            ..
        })
    ));
    assert_eq!(s.serialize(&vec![1, 2, 3]).unwrap(), [1, 2, 3]);
}

#[test]
fn base58_leading_zeros() {
    let s = base58();
    let alphabet: Vec<char> = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz"
        .chars()
        .collect();
    let mut rng = thread_rng();
    for _ in 0..100 {
        // rest must not itself start with a zero digit
        let len = rng.gen_range(0..20);
        let rest: String = (0..len)
            .enumerate()
            .map(|(i, _)| {
                let from = usize::from(i == 0);
                alphabet[rng.gen_range(from..alphabet.len())]
            })
            .collect();
        let k = rng.gen_range(0..5);

        let prefixed = format!("{}{rest}", "1".repeat(k));
        let mut expected = vec![0; k];
        expected.extend(s.serialize(&rest).unwrap());
        assert_eq!(s.serialize(&prefixed).unwrap(), expected, "{prefixed}");
        assert_eq!(deserialize(&s, &expected).unwrap(), prefixed);
    }
}

#[test]
fn fixed_size_exactness() {
    let s = tuple((
        u8(),
        i64(),
        option_with(u32(), OptionOptions::default().fixed(true)).unwrap(),
        array_with(u16(), ArrayLikeOptions::default().size(3)).unwrap(),
        bool(),
        public_key(),
        string_with(StringOptions::default().size(6)),
    ));
    assert_eq!(s.fixed_size(), Some(1 + 8 + 5 + 6 + 1 + 32 + 6));
    assert_eq!(s.max_size(), s.fixed_size());

    let mut rng = thread_rng();
    for _ in 0..50 {
        let value = (
            rng.gen::<u8>(),
            rng.gen::<i64>(),
            rng.gen::<bool>().then(|| rng.gen::<u32>()),
            vec![rng.gen(), rng.gen(), rng.gen()],
            rng.gen::<bool>(),
            PublicKey::new(rng.gen()),
            "abc".to_string(),
        );
        let bytes = s.serialize(&value).unwrap();
        assert_eq!(Some(bytes.len()), s.fixed_size());
        assert_eq!(s.deserialize(&bytes, 0), Ok((value, bytes.len())));
    }
}

#[derive(Clone, Debug, PartialEq, Fields)]
struct Instruction {
    program_index: u8,
    accounts: Vec<u8>,
    data: Bytes,
}

#[derive(Clone, Debug, PartialEq, Fields)]
struct Message {
    header: (u8, u8, u8),
    account_keys: Vec<PublicKey>,
    recent_blockhash: PublicKey,
    instructions: Vec<Instruction>,
}

fn compact<S: Serializer>(item: S) -> ArraySerializer<S> {
    array_with(
        item,
        ArrayLikeOptions::default().size(Size::prefix(short_u16())),
    )
    .unwrap()
}

#[test]
fn compact_message_layout() -> anyhow::Result<()> {
    let instruction = struct_of::<Instruction, _>((
        ("program_index", u8()),
        ("accounts", compact(u8())),
        (
            "data",
            bytes_with(BytesOptions::default().size(Size::prefix(short_u16()))),
        ),
    ))?;
    let message = struct_of::<Message, _>((
        ("header", tuple((u8(), u8(), u8()))),
        ("account_keys", compact(public_key())),
        ("recent_blockhash", public_key()),
        ("instructions", compact(instruction)),
    ))?;

    let payer: PublicKey = "11111111111111111111111111111112".parse()?;
    let value = Message {
        header: (1, 0, 1),
        account_keys: vec![payer, PublicKey::default()],
        recent_blockhash: PublicKey::new([7; 32]),
        instructions: vec![Instruction {
            program_index: 1,
            accounts: vec![0],
            data: Bytes::from(vec![0xab; 130]),
        }],
    };

    let bytes = message.serialize(&value)?;
    assert_eq!(bytes.len(), 3 + 1 + 64 + 32 + 1 + (1 + 1 + 1 + 2 + 130));
    // 130 does not fit in one compact byte
    assert_eq!(bytes[bytes.len() - 132..bytes.len() - 130], hex!("8201"));
    assert_eq!(deserialize(&message, &bytes)?, value);

    let mut trailing = bytes.clone();
    trailing.push(0);
    assert_eq!(
        deserialize(&message, &trailing),
        Err(Error::TrailingBytes {
            serializer: message.description().to_string(),
            remaining: 1
        })
    );
    Ok(())
}

#[test]
fn maps_of_enums() -> anyhow::Result<()> {
    let s = map_with(
        scalar_enum::<Color>(),
        set(string()),
        ArrayLikeOptions::default().size(Size::prefix(u8())),
    )?;
    assert_eq!(
        s.description(),
        "map(enum(Red, Green, Blue; u8), set(string(utf8; u32(le)); u32(le)); u8)"
    );

    let value = indexmap::IndexMap::from([
        (
            Color::Blue,
            indexmap::IndexSet::from(["sky".to_string()]),
        ),
        (Color::Red, indexmap::IndexSet::new()),
    ]);
    let bytes = s.serialize(&value)?;
    // count, then Blue as inserted first
    assert_eq!(bytes[..2], [2, 2]);
    let (decoded, offset) = s.deserialize(&bytes, 0)?;
    assert_eq!(offset, bytes.len());
    assert_eq!(decoded.keys().collect::<Vec<_>>(), [&Color::Blue, &Color::Red]);
    assert_eq!(s.serialize(&decoded)?, bytes);
    assert_eq!(decoded, value);
    Ok(())
}
