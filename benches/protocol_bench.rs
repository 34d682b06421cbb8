use criterion::{black_box, criterion_group, criterion_main, Criterion};
use radio_ack::contracts::{checksum, decode, encode_control, encode_data};
use radio_ack::{Reply, MAX_PAYLOAD_SIZE};

fn benchmark_checksum(c: &mut Criterion) {
    let payload = vec![0xa5u8; MAX_PAYLOAD_SIZE];

    c.bench_function("checksum_max_payload", |b| {
        b.iter(|| checksum(black_box(&payload)));
    });
}

fn benchmark_encode(c: &mut Criterion) {
    let payload = vec![0x5au8; MAX_PAYLOAD_SIZE];

    c.bench_function("encode_data_max_payload", |b| {
        b.iter(|| encode_data(black_box(42), black_box(&payload)));
    });

    c.bench_function("encode_ack", |b| {
        b.iter(|| encode_control(black_box(Reply::Ack), black_box(42)));
    });
}

fn benchmark_decode(c: &mut Criterion) {
    let frame = encode_data(42, &[0x33u8; MAX_PAYLOAD_SIZE]).unwrap();
    let mut corrupted = frame.clone();
    corrupted[10] ^= 0x01;

    c.bench_function("decode_max_payload", |b| {
        b.iter(|| decode(black_box(&frame)));
    });

    c.bench_function("decode_rejects_corrupted", |b| {
        b.iter(|| decode(black_box(&corrupted)));
    });
}

criterion_group!(
    benches,
    benchmark_checksum,
    benchmark_encode,
    benchmark_decode
);
criterion_main!(benches);
