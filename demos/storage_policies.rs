use sovran_typearray::{BoxedTypeMap, SparseTypeMap, TypeArray, TypeStore};

#[derive(Debug, Clone, PartialEq)]
struct Config {
    retries: u8,
    endpoint: String,
}

#[derive(Debug, Default)]
struct Stats {
    hits: u64,
    misses: u64,
}

/// Code written once against TypeStore
fn run_cache<S: TypeStore>(label: &str, store: &mut S) {
    store.insert(Config {
        retries: 3,
        endpoint: "https://example.com".to_string(),
    });
    store.insert(Stats::default());

    for key in 0..10u32 {
        let stats = store.get_mut::<Stats>();
        if key % 3 == 0 {
            stats.misses += 1;
        } else {
            stats.hits += 1;
        }
    }

    // Overwrite the configuration
    store.insert_or_assign(Config {
        retries: 5,
        endpoint: "https://backup.example.com".to_string(),
    });

    let stats = store.get::<Stats>();
    println!(
        "{:<8} hits={} misses={} retries={} values={}",
        label,
        stats.hits,
        stats.misses,
        store.get::<Config>().retries,
        store.len()
    );

    store.clear();
    assert!(store.is_empty());
}

/// Demonstrates the three storage policies behind one interface
fn main() {
    run_cache("packed", &mut TypeArray::new());
    run_cache("boxed", &mut BoxedTypeMap::new());
    run_cache("sparse", &mut SparseTypeMap::new());

    // Policy-specific extras
    let mut array = TypeArray::new();
    array.insert_bundle((1u8, 2u16, 3u64));
    println!(
        "packed: u8 at {}, u16 at {}, u64 at {}, {} bytes",
        array.offset_of::<u8>(),
        array.offset_of::<u16>(),
        array.offset_of::<u64>(),
        array.arena_len()
    );

    let mut sparse = SparseTypeMap::with_capacity(2);
    sparse.insert("taken".to_string());
    println!("sparse: removed {:?}", sparse.remove::<String>());
}
