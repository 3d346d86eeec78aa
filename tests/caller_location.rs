use sovran_typearray::TypeArray;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Mutex;

static LOCATION: Mutex<Option<(String, u32)>> = Mutex::new(None);

/// Runs `f`, which must panic, and returns where the panic was reported.
fn panic_location<R>(f: impl FnOnce() -> R) -> (String, u32) {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(|info| {
        if let Some(location) = info.location() {
            *LOCATION.lock().unwrap() = Some((location.file().to_string(), location.line()));
        }
    }));
    let result = panic::catch_unwind(AssertUnwindSafe(f));
    panic::set_hook(previous);
    assert!(result.is_err(), "expected a panic");
    LOCATION.lock().unwrap().take().expect("panic hook recorded no location")
}

fn assert_reported_here((file, line): (String, u32), expected_line: u32) {
    assert!(file.ends_with("caller_location.rs"), "panic reported in {}", file);
    assert_eq!(line, expected_line);
}

// The panic hook is process wide, so every case runs inside one test.
#[test]
fn test_contract_violations_point_at_the_caller() {
    let line = line!() + 1;
    let location = panic_location(|| *TypeArray::new().get::<u32>());
    assert_reported_here(location, line);

    let mut array = TypeArray::new();
    array.insert(1u32);
    let line = line!() + 1;
    let location = panic_location(|| *array.insert(2u32));
    assert_reported_here(location, line);

    let mut array = TypeArray::new();
    let line = line!() + 1;
    let location = panic_location(|| *array.insert_or_assign_bundle((1u8, 2u8)).0);
    assert_reported_here(location, line);

    let mut array = TypeArray::new();
    let line = line!() + 1;
    let location = panic_location(|| *array.assign(5u64));
    assert_reported_here(location, line);

    // Reserved but never constructed: insert_or_assign takes the assign path
    // and constructs in place rather than panicking.
    let mut array = TypeArray::new();
    array.reserve::<u64>();
    assert_eq!(*array.insert_or_assign(6u64), 6);
    assert_eq!(*array.insert_or_assign(7u64), 7);
}
