//! Per-axis `start:stop:step` ranges.

use std::fmt::Write;

use crate::error::{DatasetError, Result};

/// A range along one axis with Python-style semantics: negative `start`/`stop` count from the
/// end, `None` means "from the beginning"/"to the end" in the direction of `step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slice {
    pub start: Option<isize>,
    pub stop: Option<isize>,
    pub step: isize,
}

impl Default for Slice {
    fn default() -> Self {
        Self::full()
    }
}

impl Slice {
    pub const fn new(start: Option<isize>, stop: Option<isize>, step: isize) -> Self {
        Self { start, stop, step }
    }

    /// The whole axis.
    pub const fn full() -> Self {
        Self::new(None, None, 1)
    }

    /// `start..stop` with unit step.
    pub const fn range(start: isize, stop: isize) -> Self {
        Self::new(Some(start), Some(stop), 1)
    }

    /// `start..stop` with the given step.
    pub const fn stepped(start: isize, stop: isize, step: isize) -> Self {
        Self::new(Some(start), Some(stop), step)
    }

    /// A single index, keeping the axis with length 1. Negative indices count from the end.
    pub const fn index(i: isize) -> Self {
        match i.checked_add(1) {
            Some(stop) if stop != 0 => Self::new(Some(i), Some(stop), 1),
            _ => Self::new(Some(i), None, 1),
        }
    }

    /// Clamp against an axis of length `len`.
    ///
    /// # Errors
    /// Returns [`DatasetError::InvalidShape`] for a zero step.
    pub fn resolve(&self, len: usize) -> Result<ResolvedSlice> {
        if self.step == 0 {
            return Err(DatasetError::InvalidShape {
                shape: vec![len as i64],
                reason: "slice step must not be zero",
            });
        }
        let n = len as isize;
        let step = self.step;
        let (start, stop) = if step > 0 {
            let start = self.start.map_or(0, |s| clamp_bound(s, n, 0, n));
            let stop = self.stop.map_or(n, |s| clamp_bound(s, n, 0, n));
            (start, stop)
        } else {
            let start = self.start.map_or(n - 1, |s| clamp_bound(s, n, -1, n - 1));
            let stop = self.stop.map_or(-1, |s| clamp_bound(s, n, -1, n - 1));
            (start, stop)
        };
        // Both bounds lie in [-1, len], so their distance fits usize.
        let span = if step > 0 { stop - start } else { start - stop };
        let count = if span > 0 {
            (span - 1) as usize / step.unsigned_abs() + 1
        } else {
            0
        };
        // A step never taken only matters for its sign; keeping it small keeps stride products
        // in range.
        let step = if count <= 1 { step.signum() } else { step };
        Ok(ResolvedSlice {
            start,
            stop,
            step,
            count,
        })
    }
}

fn clamp_bound(value: isize, len: isize, lo: isize, hi: isize) -> isize {
    let v = if value < 0 { value + len } else { value };
    v.clamp(lo, hi)
}

/// A slice clamped against a concrete axis length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedSlice {
    pub start: isize,
    pub stop: isize,
    pub step: isize,
    /// Number of selected indices.
    pub count: usize,
}

impl ResolvedSlice {
    /// The covering range of an entire axis.
    pub fn full(len: usize) -> Self {
        Self {
            start: 0,
            stop: len as isize,
            step: 1,
            count: len,
        }
    }
}

/// Render resolved slices as `start:stop:step` per axis, omitting defaults, e.g. `1:3,::2`.
pub fn create_string(shape: &[usize], slices: &[ResolvedSlice]) -> String {
    let mut out = String::new();
    for (axis, (s, &len)) in slices.iter().zip(shape.iter()).enumerate() {
        if axis > 0 {
            out.push(',');
        }
        if s.count == 1 {
            let _ = write!(out, "{}", s.start);
            continue;
        }
        let default_start = if s.step > 0 { 0 } else { len as isize - 1 };
        let default_stop = if s.step > 0 { len as isize } else { -1 };
        if s.start != default_start {
            let _ = write!(out, "{}", s.start);
        }
        out.push(':');
        if s.stop != default_stop {
            let _ = write!(out, "{}", s.stop);
        }
        if s.step != 1 {
            let _ = write!(out, ":{}", s.step);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_positive_step() {
        let r = Slice::stepped(0, 4, 2).resolve(4).unwrap();
        assert_eq!((r.start, r.stop, r.step, r.count), (0, 4, 2, 2));
        let r = Slice::range(1, 3).resolve(4).unwrap();
        assert_eq!(r.count, 2);
        let r = Slice::stepped(0, 5, 2).resolve(5).unwrap();
        assert_eq!(r.count, 3);
    }

    #[test]
    fn resolve_clamps_and_wraps() {
        let r = Slice::range(-2, 100).resolve(5).unwrap();
        assert_eq!((r.start, r.stop, r.count), (3, 5, 2));
        let r = Slice::range(3, 1).resolve(5).unwrap();
        assert_eq!(r.count, 0);
    }

    #[test]
    fn resolve_negative_step() {
        let r = Slice::new(None, None, -1).resolve(4).unwrap();
        assert_eq!((r.start, r.stop, r.count), (3, -1, 4));
        let r = Slice::new(Some(3), Some(0), -2).resolve(4).unwrap();
        assert_eq!(r.count, 2);
    }

    #[test]
    fn extreme_steps_select_one_element() {
        let r = Slice::stepped(0, 5, isize::MAX).resolve(5).unwrap();
        assert_eq!((r.start, r.count, r.step), (0, 1, 1));
        let r = Slice::new(None, None, isize::MIN).resolve(5).unwrap();
        assert_eq!((r.start, r.count, r.step), (4, 1, -1));
        let r = Slice::new(None, None, isize::MIN + 1).resolve(0).unwrap();
        assert_eq!(r.count, 0);
    }

    #[test]
    fn index_at_isize_max_selects_nothing() {
        let s = Slice::index(isize::MAX);
        assert_eq!(s.stop, None);
        assert_eq!(s.resolve(3).unwrap().count, 0);
        assert_eq!(Slice::index(-1).resolve(3).unwrap().count, 1);
    }

    #[test]
    fn zero_step_is_rejected() {
        assert!(Slice::new(None, None, 0).resolve(3).is_err());
    }

    #[test]
    fn slice_string_omits_defaults() {
        let shape = [4, 4];
        let slices = [
            Slice::range(1, 3).resolve(4).unwrap(),
            Slice::stepped(0, 4, 2).resolve(4).unwrap(),
        ];
        assert_eq!(create_string(&shape, &slices), "1:3,::2");
        let single = [Slice::index(2).resolve(4).unwrap(), ResolvedSlice::full(4)];
        assert_eq!(create_string(&shape, &single), "2,:");
    }
}
