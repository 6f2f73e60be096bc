//! Monotonic time source

/// Monotonic microsecond clock
///
/// Trigger timing and frame deadlines are measured against this clock.
pub trait Clock {
    /// Microseconds since an arbitrary fixed epoch
    fn now_us(&self) -> u64;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_us(&self) -> u64 {
        (**self).now_us()
    }
}
