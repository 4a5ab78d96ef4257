//! Progress reporting.
//!
//! The pipeline reports through the [`Thermometer`] trait so the CLI can
//! drive a progress bar while library consumers and tests plug in the no-op
//! implementation.

/// A coarse progress sink.
pub trait Thermometer {
    /// Declare the number of work units ahead.
    fn set_target(&mut self, target: u64);
    /// Report completed work units (absolute, not incremental).
    fn update(&mut self, done: u64);
    /// Remove the indicator.
    fn clear(&mut self);
}

/// A thermometer that reports nowhere.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullThermometer;

impl Thermometer for NullThermometer {
    fn set_target(&mut self, _target: u64) {}
    fn update(&mut self, _done: u64) {}
    fn clear(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_thermometer_is_silent() {
        let mut t = NullThermometer;
        t.set_target(100);
        t.update(50);
        t.clear();
    }
}
