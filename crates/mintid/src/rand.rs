use rand::Rng;

/// A source of random payload bits for ULID generation.
pub trait RandSource {
    /// Returns fresh random bits.
    fn rand(&self) -> u128;
}

/// A `RandSource` backed by the thread-local RNG.
///
/// The underlying RNG is fast, cryptographically secure, and reseeded
/// periodically. Each OS thread has its own instance, so calls from multiple
/// threads are contention-free. This type does not store the RNG itself; it
/// accesses the thread-local generator on each call, which is what makes it
/// freely shareable across threads.
#[derive(Default, Clone, Debug)]
pub struct ThreadRandom;

impl RandSource for ThreadRandom {
    fn rand(&self) -> u128 {
        rand::rng().random()
    }
}
