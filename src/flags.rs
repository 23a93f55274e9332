use std::cmp::Ordering;

/// Condition flags, only ever written by [`Flags::compare`].
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct Flags {
    zero: bool,
    greater: bool,
    less: bool,
}

impl Flags {
    /// Overwrite all three flags from `lhs` compared to `rhs`.
    pub fn compare(&mut self, lhs: i32, rhs: i32) {
        let ord = lhs.cmp(&rhs);
        self.zero = ord == Ordering::Equal;
        self.greater = ord == Ordering::Greater;
        self.less = ord == Ordering::Less;
    }

    pub fn zero(&self) -> bool {
        self.zero
    }

    pub fn greater(&self) -> bool {
        self.greater
    }

    pub fn less(&self) -> bool {
        self.less
    }
}
