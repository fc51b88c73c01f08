use std::marker::PhantomData;
use std::sync::atomic::{self, Ordering};
use std::sync::{Mutex, MutexGuard};

pub type AtomicU64 = Atomic64<u64>;
pub type AtomicI64 = Atomic64<i64>;

/// A 64-bit cell written by a single owner and read by anyone.
///
/// Every access is one relaxed load or one relaxed store, so the writer never
/// pays for a read-modify-write instruction. Readers may observe a value that
/// is one update behind; this is the only consistency guarantee.
#[derive(Debug)]
pub struct Atomic64<T> {
    value: atomic::AtomicU64,
    _phantom: PhantomData<T>,
}
impl<T: Bits> Atomic64<T> {
    pub fn new(value: T) -> Self {
        Atomic64 {
            value: atomic::AtomicU64::new(value.into_bits()),
            _phantom: PhantomData,
        }
    }

    #[inline]
    pub fn get(&self) -> T {
        T::from_bits(self.value.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn set(&self, value: T) {
        self.value.store(value.into_bits(), Ordering::Relaxed);
    }

    /// Load, apply `f`, store. Not atomic with respect to other writers.
    #[inline]
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(T) -> T,
    {
        let v = self.get();
        self.set(f(v));
    }
}
impl<T: Bits> Default for Atomic64<T> {
    fn default() -> Self {
        Self::new(T::from_bits(0))
    }
}

pub trait Bits: Copy {
    fn into_bits(self) -> u64;
    fn from_bits(bits: u64) -> Self;
}
impl Bits for u64 {
    #[inline]
    fn into_bits(self) -> u64 {
        self
    }
    #[inline]
    fn from_bits(bits: u64) -> Self {
        bits
    }
}
impl Bits for i64 {
    #[inline]
    fn into_bits(self) -> u64 {
        self as u64
    }
    #[inline]
    fn from_bits(bits: u64) -> Self {
        bits as i64
    }
}

/// Locks `mutex`, recovering the guard if a previous holder panicked.
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn atomic_u64_works() {
        let value = AtomicU64::new(0);
        assert_eq!(value.get(), 0);

        value.set(123456789);
        assert_eq!(value.get(), 123456789);

        value.update(|v| v + 1);
        assert_eq!(value.get(), 123456790);

        value.set(u64::max_value());
        value.update(|v| v.wrapping_add(2));
        assert_eq!(value.get(), 1);
    }

    #[test]
    fn atomic_i64_works() {
        let value = AtomicI64::default();
        assert_eq!(value.get(), 0);

        value.update(|v| v - 5);
        assert_eq!(value.get(), -5);

        value.set(i64::min_value());
        assert_eq!(value.get(), i64::min_value());
    }
}
