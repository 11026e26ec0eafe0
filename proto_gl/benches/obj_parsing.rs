use std::fmt::Write;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use proto_gl::core::assets_management::models::parse_obj_str;

/// Flat grid of `side * side` quads, two triangles each
fn grid_obj(side: usize) -> String {
    let mut source = String::new();
    for z in 0..=side {
        for x in 0..=side {
            let _ = writeln!(source, "v {} 0 {}", x, z);
            let _ = writeln!(source, "vt {} {}", x as f32 / side as f32, z as f32 / side as f32);
        }
    }
    source.push_str("vn 0 1 0\n");

    let row = side + 1;
    for z in 0..side {
        for x in 0..side {
            let a = z * row + x + 1;
            let b = a + 1;
            let c = a + row;
            let d = c + 1;
            let _ = writeln!(source, "f {a}/{a}/1 {c}/{c}/1 {b}/{b}/1");
            let _ = writeln!(source, "f {b}/{b}/1 {c}/{c}/1 {d}/{d}/1");
        }
    }
    source
}

fn obj_parsing_small_benchmark(c: &mut Criterion) {
    let source = grid_obj(10);

    let mut group = c.benchmark_group("obj-parsing-200-triangles");
    group.throughput(Throughput::Bytes(source.len() as u64));
    group.bench_function("OBJ: parse 10x10 grid", |b| {
        b.iter(|| parse_obj_str(&source).expect("Grid mesh should parse"));
    });
}

fn obj_parsing_large_benchmark(c: &mut Criterion) {
    let source = grid_obj(200);

    let mut group = c.benchmark_group("obj-parsing-80k-triangles");
    group.throughput(Throughput::Elements(2 * 200 * 200));
    group.bench_function("OBJ: parse 200x200 grid", |b| {
        b.iter(|| parse_obj_str(&source).expect("Grid mesh should parse"));
    });
}

criterion_group!(
    name = benches;
    config = Criterion::default().sample_size(50);
    targets = obj_parsing_small_benchmark, obj_parsing_large_benchmark
);
criterion_main!(benches);
