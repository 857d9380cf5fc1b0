use criterion::*;
use umi_serializers::*;

fn bits(c: &mut Criterion) {
    for bits in 1..=9 {
        c.bench_function(&format!("{bits} bits"), |b| {
            b.iter(|| {
                const N: usize = 10_000;

                let mut writer = BitWriter::new(Vec::with_capacity((bits * N).div_ceil(8)));
                for _ in 0..N {
                    writer.write(bits, 0xff);
                }

                let mut reader = BitReader::new(writer.view_bytes());
                for _ in 0..N {
                    reader.read(bits);
                }
            })
        });
    }
}

fn radix(c: &mut Criterion) {
    let key = PublicKey::new([0xab; 32]).to_string();
    let s = base58();
    c.bench_function("base58 public key", |b| {
        b.iter(|| {
            let bytes = s.serialize(black_box(&key)).unwrap();
            s.deserialize(&bytes, 0).unwrap()
        })
    });
}

fn arrays(c: &mut Criterion) {
    let values: Vec<u64> = (0..10_000).collect();
    let s = array(u64());
    c.bench_function("array of 10000 u64", |b| {
        b.iter(|| {
            let bytes = s.serialize(black_box(&values)).unwrap();
            s.deserialize(&bytes, 0).unwrap()
        })
    });
}

criterion_group!(benches, bits, radix, arrays);
criterion_main!(benches);
