//! Performance benchmarks for encoding, identification and decoding.
//!
//! Run with: cargo bench --bench codec_benchmark

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use sbom_convert::formats::{self, FormatId};
use sbom_convert::model::{
    Endpoint, Location, Package, PackageType, Relationship, RelationshipKind, Sbom, Source,
};
use std::hint::black_box;

/// Generate a document with `count` packages, each depending on the previous one.
fn generate_sbom(count: usize) -> Sbom {
    let mut builder = Sbom::builder(Source::directory("/srv/app"));
    let mut previous = None;
    for i in 0..count {
        let name = format!("component-{i}");
        let id = builder
            .add_package(
                Package::new(&name, format!("1.{}.{}", i % 10, i % 100), PackageType::Npm)
                    .with_location(Location::new(format!("/srv/app/node_modules/{name}/package.json")))
                    .with_license("MIT"),
            )
            .expect("named package");
        builder
            .add_relationship(Relationship::new(Endpoint::Root, &id, RelationshipKind::Contains))
            .expect("root edge");
        if let Some(prev) = previous.replace(id.clone()) {
            builder
                .add_relationship(Relationship::new(&prev, &id, RelationshipKind::DependsOn))
                .expect("chain edge");
        }
    }
    builder.build()
}

fn bench_encode(c: &mut Criterion) {
    let sbom = generate_sbom(1000);
    let mut group = c.benchmark_group("encode_1000");
    for id in FormatId::ALL {
        let format = formats::registry().by_id(id).expect("registered");
        group.bench_function(id.as_str(), |b| {
            b.iter(|| formats::encode_to_vec(format.as_ref(), black_box(&sbom)));
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    for size in [100, 1000] {
        let sbom = generate_sbom(size);
        for format in formats::registry().decoders() {
            let bytes = formats::encode_to_vec(format.as_ref(), &sbom).expect("encode");
            group.bench_with_input(
                BenchmarkId::new(format.identity().to_string(), size),
                &bytes,
                |b, bytes| b.iter(|| formats::decode(black_box(bytes))),
            );
        }
    }
    group.finish();
}

fn bench_identify(c: &mut Criterion) {
    let sbom = generate_sbom(1000);
    let mut group = c.benchmark_group("identify_1000");
    for format in formats::registry().decoders() {
        let bytes = formats::encode_to_vec(format.as_ref(), &sbom).expect("encode");
        group.bench_function(format.identity().to_string(), |b| {
            b.iter(|| formats::identify(black_box(&bytes)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode, bench_identify);
criterion_main!(benches);
