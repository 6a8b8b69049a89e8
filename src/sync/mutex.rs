//! The lock around each diagnostics structure.
//!
//! `parking_lot` with the `parking_lot` feature, std otherwise. Either way
//! `lock()` cannot fail: a panic while a structure was locked (say, in a
//! strict-mode diagnostic) must not switch diagnostics off for the rest of
//! the process, so std's poisoning is ignored.

#[cfg(feature = "parking_lot")]
type Inner<T> = parking_lot::Mutex<T>;
#[cfg(feature = "parking_lot")]
pub(crate) type MutexGuard<'a, T> = parking_lot::MutexGuard<'a, T>;

#[cfg(not(feature = "parking_lot"))]
type Inner<T> = std::sync::Mutex<T>;
#[cfg(not(feature = "parking_lot"))]
pub(crate) type MutexGuard<'a, T> = std::sync::MutexGuard<'a, T>;

/// Mutual exclusion without poisoning.
#[derive(Debug, Default)]
pub(crate) struct Mutex<T>(Inner<T>);

impl<T> Mutex<T> {
    pub(crate) fn new(value: T) -> Self {
        Self(Inner::<T>::new(value))
    }

    #[cfg(feature = "parking_lot")]
    pub(crate) fn lock(&self) -> MutexGuard<'_, T> {
        self.0.lock()
    }

    #[cfg(not(feature = "parking_lot"))]
    pub(crate) fn lock(&self) -> MutexGuard<'_, T> {
        self.0.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_survives_panic_while_locked() {
        let m = std::sync::Arc::new(Mutex::new(1));
        let m2 = std::sync::Arc::clone(&m);
        let _ = std::thread::spawn(move || {
            let _guard = m2.lock();
            panic!("holder panics");
        })
        .join();

        *m.lock() += 1;
        assert_eq!(*m.lock(), 2);
    }
}
