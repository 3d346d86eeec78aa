// Lookup benchmarks for the one-value-per-type stores
//
// These benchmarks compare fetching a value by type from the packed
// TypeArray (directory lookup, cached offset, unchecked offset) against the
// boxed and sparse-set stores, and measure batch versus one-by-one inserts.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sovran_typearray::{BoxedTypeMap, SparseTypeMap, TypeArray, TypeStore};

#[derive(Default)]
struct Position([f32; 3]);
#[derive(Default)]
struct Velocity([f32; 3]);
#[derive(Default)]
struct Health(u32);
#[derive(Default)]
struct Name(String);

fn populate<S: TypeStore>(store: &mut S) {
    store.insert(Position::default());
    store.insert(Velocity::default());
    store.insert(Health(100));
    store.insert(Name("bench".to_string()));
}

/// Benchmark a single lookup by type in each store.
fn bench_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("get");

    let mut array = TypeArray::new();
    populate(&mut array);
    group.bench_function("type_array", |b| {
        b.iter(|| black_box(array.get::<Health>().0))
    });

    let offset = array.offset_of::<Health>();
    group.bench_function("type_array_at", |b| {
        b.iter(|| black_box(array.get_at::<Health>(black_box(offset)).0))
    });

    // SAFETY: Health is constructed and `offset` is its recorded offset.
    group.bench_function("type_array_unchecked", |b| {
        b.iter(|| black_box(unsafe { array.get_unchecked::<Health>(black_box(offset)) }.0))
    });

    let mut boxed = BoxedTypeMap::new();
    populate(&mut boxed);
    group.bench_function("boxed", |b| b.iter(|| black_box(boxed.get::<Health>().0)));

    let mut sparse = SparseTypeMap::new();
    populate(&mut sparse);
    group.bench_function("sparse", |b| b.iter(|| black_box(sparse.get::<Health>().0)));

    group.finish();
}

/// Benchmark fetching several types at once versus one at a time.
fn bench_get_many(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_many");
    let mut array = TypeArray::new();
    populate(&mut array);

    group.bench_function("bundle", |b| {
        b.iter(|| {
            let (p, v, h, n) = array.get_many::<(Position, Velocity, Health, Name)>();
            black_box(p.0[0] + v.0[0] + h.0 as f32 + n.0.len() as f32)
        })
    });
    group.bench_function("separate", |b| {
        b.iter(|| {
            let p = array.get::<Position>();
            let v = array.get::<Velocity>();
            let h = array.get::<Health>();
            let n = array.get::<Name>();
            black_box(p.0[0] + v.0[0] + h.0 as f32 + n.0.len() as f32)
        })
    });

    group.finish();
}

/// Benchmark building a populated store from scratch.
///
/// The bundle path reserves every type in one arena growth.
fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");

    for presized in [false, true] {
        group.bench_with_input(
            BenchmarkId::new("one_by_one", presized),
            &presized,
            |b, &presized| {
                b.iter(|| {
                    let mut array = if presized {
                        TypeArray::with_capacity(128, 4)
                    } else {
                        TypeArray::new()
                    };
                    populate(&mut array);
                    black_box(array.arena_len())
                })
            },
        );
    }

    group.bench_function("bundle", |b| {
        b.iter(|| {
            let mut array = TypeArray::new();
            array.insert_bundle((
                Position::default(),
                Velocity::default(),
                Health(100),
                Name("bench".to_string()),
            ));
            black_box(array.arena_len())
        })
    });

    group.bench_function("boxed", |b| {
        b.iter(|| {
            let mut boxed = BoxedTypeMap::new();
            populate(&mut boxed);
            black_box(boxed.len())
        })
    });

    group.finish();
}

criterion_group!(benches, bench_get, bench_get_many, bench_insert);
criterion_main!(benches);
