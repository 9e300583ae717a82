//! In-place arithmetic.
//!
//! Each operation updates the receiver element by element from a scalar or from a dataset that
//! broadcasts onto the receiver's shape. Per kind:
//! - `bool` has no arithmetic; every operation returns the receiver unchanged.
//! - integers wrap; division and remainder by zero give 0.
//! - complex kinds reject `iremainder`.
//!
//! [`Dataset::residual`] compares against an operand of the same form without mutating.

use crate::{
    dataset::{Dataset, ReadableDataset, Source, generic},
    element::{BinaryOp, Element},
    error::{DatasetError, Result},
    iterator::{BroadcastIterator, IndexIterator},
    layout::Layout,
};

/// Right-hand side of an in-place operation.
pub type Operand<'a, T> = Source<'a, T>;

impl<T: Element> Dataset<T> {
    /// Buffer indices of every element in iteration order, paired with the operand value that
    /// lines up with each.
    fn operand_pairs(&self, operand: Operand<'_, T>) -> Result<(Vec<usize>, Vec<T>)> {
        let pairs = match operand {
            Source::Scalar(s) => {
                let v = T::from_scalar(s);
                let targets = self.indices();
                let rhs = vec![v; targets.len()];
                (targets, rhs)
            }
            Source::Value(v) => {
                let targets = self.indices();
                let rhs = vec![v; targets.len()];
                (targets, rhs)
            }
            Source::Dataset(src) => {
                let values = generic::read_values::<T>(src)?;
                let src_layout = Layout::contiguous(src.shape());
                let mut it = BroadcastIterator::onto(&self.layout, &src_layout)?;
                let mut targets = Vec::with_capacity(self.size());
                let mut rhs = Vec::with_capacity(self.size());
                while it.advance() {
                    targets.push(it.index());
                    rhs.push(values[it.other_index()]);
                }
                (targets, rhs)
            }
        };
        Ok(pairs)
    }

    fn apply_in_place(&mut self, op: BinaryOp, operand: Operand<'_, T>) -> Result<&mut Self> {
        if !T::ARITHMETIC {
            return Ok(self);
        }
        if T::apply(op, T::one(), T::one()).is_none() {
            return Err(DatasetError::unsupported(op.name(), T::TYPE));
        }

        let (targets, rhs) = self.operand_pairs(operand)?;
        let mut data = self.buffer.write();
        for (i, r) in targets.into_iter().zip(rhs) {
            let lhs = data[i];
            data[i] = T::apply(op, lhs, r).unwrap_or(lhs);
        }
        drop(data);
        Ok(self)
    }

    pub fn iadd(&mut self, operand: Operand<'_, T>) -> Result<&mut Self> {
        self.apply_in_place(BinaryOp::Add, operand)
    }

    pub fn isubtract(&mut self, operand: Operand<'_, T>) -> Result<&mut Self> {
        self.apply_in_place(BinaryOp::Subtract, operand)
    }

    pub fn imultiply(&mut self, operand: Operand<'_, T>) -> Result<&mut Self> {
        self.apply_in_place(BinaryOp::Multiply, operand)
    }

    pub fn idivide(&mut self, operand: Operand<'_, T>) -> Result<&mut Self> {
        self.apply_in_place(BinaryOp::Divide, operand)
    }

    pub fn iremainder(&mut self, operand: Operand<'_, T>) -> Result<&mut Self> {
        self.apply_in_place(BinaryOp::Remainder, operand)
    }

    pub fn ipower(&mut self, operand: Operand<'_, T>) -> Result<&mut Self> {
        self.apply_in_place(BinaryOp::Power, operand)
    }

    /// Weighted sum of squared differences between this dataset and `operand`.
    ///
    /// `weight` broadcasts onto this dataset's shape like the operand; without it every pair
    /// weighs 1. Complex differences contribute their squared modulus. With `ignore_nans`, pairs
    /// with a NaN on either side are skipped. `bool` datasets always give 0.
    ///
    /// # Errors
    /// - [`DatasetError::ShapeMismatch`] when the operand or the weight does not broadcast.
    /// - [`DatasetError::UnsupportedOperation`] for a complex weight.
    pub fn residual(
        &self,
        operand: Operand<'_, T>,
        weight: Option<&dyn ReadableDataset>,
        ignore_nans: bool,
    ) -> Result<f64> {
        if !T::ARITHMETIC {
            return Ok(0.0);
        }
        let (targets, rhs) = self.operand_pairs(operand)?;
        let lhs = self.gather(&targets)?;
        let weights = match weight {
            Some(w) => Some(self.broadcast_weights(w)?),
            None => None,
        };

        // Compensated summation keeps long sums of small terms accurate.
        let mut sum = 0.0f64;
        let mut carry = 0.0f64;
        for (k, (a, b)) in lhs.into_iter().zip(rhs).enumerate() {
            let (a, b) = (a.to_scalar(), b.to_scalar());
            if ignore_nans && (a.is_nan() || b.is_nan()) {
                continue;
            }
            let re = a.as_f64() - b.as_f64();
            let im = a.imag_f64() - b.imag_f64();
            let mut term = re * re + im * im;
            if let Some(w) = &weights {
                term *= w[k];
            }
            let y = term - carry;
            let t = sum + y;
            carry = (t - sum) - y;
            sum = t;
        }
        Ok(sum)
    }

    /// Weights as `f64`, one per element of this dataset in iteration order.
    fn broadcast_weights(&self, weight: &dyn ReadableDataset) -> Result<Vec<f64>> {
        if weight.data_type().is_complex() {
            return Err(DatasetError::unsupported("residual weight", weight.data_type()));
        }
        let values = generic::read_values::<f64>(weight)?;
        let target = Layout::contiguous(self.shape());
        let mut it = BroadcastIterator::onto(&target, &Layout::contiguous(weight.shape()))?;
        let mut out = Vec::with_capacity(self.size());
        while it.advance() {
            out.push(values[it.other_index()]);
        }
        Ok(out)
    }

    /// Floor every element; a no-op for kinds without a fractional part.
    pub fn ifloor(&mut self) -> &mut Self {
        if !T::ARITHMETIC {
            return self;
        }
        let indices = self.indices();
        let mut data = self.buffer.write();
        for i in indices {
            data[i] = data[i].floor();
        }
        drop(data);
        self
    }
}
