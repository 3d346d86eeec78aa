use std::fmt;

/// Errors describing misuse of a type store.
///
/// The panicking API (`insert`, `get`, `construct`, ...) treats every one of
/// these as a contract violation and panics with the message below. The
/// `try_*` methods hand them back instead.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreError {
    /// A sized type was reserved a second time
    AlreadyReserved(&'static str),
    /// The type has no reserved slot
    NotReserved(&'static str),
    /// The slot already holds a live value
    AlreadyConstructed(&'static str),
    /// No live value of the type is present
    NotConstructed(&'static str),
    /// An offset supplied by the caller does not match the recorded one
    OffsetMismatch {
        /// Name of the type looked up.
        type_name: &'static str,
        /// Offset recorded when the type was reserved.
        recorded: usize,
        /// Offset the caller passed in.
        supplied: usize,
    },
    /// The same type appears twice in one bundle
    DuplicateType(&'static str),
    /// A bundle mixes zero-sized and sized types
    MixedBundle,
    /// The arena would grow past the largest allocation the platform allows
    CapacityOverflow {
        /// Total arena length in bytes that was asked for.
        requested: usize,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StoreError::AlreadyReserved(name) => write!(f, "type `{}` is already reserved", name),
            StoreError::NotReserved(name) => write!(f, "type `{}` has not been reserved", name),
            StoreError::AlreadyConstructed(name) => {
                write!(f, "type `{}` is already constructed", name)
            }
            StoreError::NotConstructed(name) => write!(f, "type `{}` is not constructed", name),
            StoreError::OffsetMismatch {
                type_name,
                recorded,
                supplied,
            } => write!(
                f,
                "offset {} supplied for type `{}` but {} is recorded",
                supplied, type_name, recorded
            ),
            StoreError::DuplicateType(name) => {
                write!(f, "type `{}` appears more than once in the bundle", name)
            }
            StoreError::MixedBundle => {
                write!(f, "cannot insert a mix of zero-sized and sized types")
            }
            StoreError::CapacityOverflow { requested } => {
                write!(f, "arena length of {} bytes overflows the allocator", requested)
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// Unwraps a store result, panicking on a contract violation.
#[track_caller]
#[inline]
pub(crate) fn enforce<T>(result: Result<T, StoreError>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => violation(err),
    }
}

#[cold]
#[track_caller]
pub(crate) fn violation(err: StoreError) -> ! {
    panic!("contract violation: {}", err)
}
