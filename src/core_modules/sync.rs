// THEORY:
// The `sync` module provides the one primitive the whole cycle-accurate
// model is built from: a double-buffered register. Every sequential element
// is a (current, pending) pair. Combinational evaluation reads only
// `current`; the commit step copies `pending` into `current` for every
// register at once. This reproduces the hardware semantic that all flops
// update together on the clock edge, with no read-after-write hazards
// inside a cycle.
//
// An undriven register holds its value: `pending` always starts out equal
// to `current`, so committing without driving is a no-op.

/// A double-buffered synchronous register.
#[derive(Debug, Clone, Copy)]
pub struct Reg<T: Copy> {
    current: T,
    pending: T,
}

impl<T: Copy> Reg<T> {
    pub fn new(value: T) -> Self {
        Self {
            current: value,
            pending: value,
        }
    }

    /// The value committed at the last clock edge.
    pub fn get(&self) -> T {
        self.current
    }

    /// Schedules `value` to become visible at the next commit.
    pub fn drive(&mut self, value: T) {
        self.pending = value;
    }

    /// The per-cycle commit point.
    pub fn commit(&mut self) {
        self.current = self.pending;
    }

    /// Synchronous reset: both halves take `value` immediately.
    pub fn load(&mut self, value: T) {
        self.current = value;
        self.pending = value;
    }
}

impl<T: Copy + Default> Default for Reg<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driven_value_appears_only_after_commit() {
        let mut r = Reg::new(0u8);
        r.drive(7);
        assert_eq!(r.get(), 0);
        r.commit();
        assert_eq!(r.get(), 7);
    }

    #[test]
    fn undriven_register_holds() {
        let mut r = Reg::new(3u8);
        r.commit();
        r.commit();
        assert_eq!(r.get(), 3);
    }

    #[test]
    fn load_is_immediate() {
        let mut r = Reg::new(1u8);
        r.drive(2);
        r.load(0);
        r.commit();
        assert_eq!(r.get(), 0);
    }
}
