//! Element kinds.
//!
//! This module defines [`Element`], the trait every primitive stored in a
//! [`crate::dataset::Dataset`] implements. The dataset algorithms are written once against this
//! trait; each concrete kind only supplies:
//! - its [`DataType`] tag and byte width
//! - its zero/one values
//! - conversion from and to the generic [`Scalar`]
//! - a total order used for uniqueness, sorting and extrema
//! - the kernels behind in-place arithmetic
//!
//! ## Conversion
//! [`Element::from_scalar`] never fails:
//! - `bool` targets use truthiness (`value != 0`, NaN is truthy)
//! - integer targets truncate other integers (two's complement) and truncate floats toward zero,
//!   saturating at the bounds (NaN becomes 0)
//! - complex sources contribute their real part to real targets
//!
//! ## Ordering
//! Floating-point kinds order NaN above every other value and treat all NaNs as equal, so sorting
//! groups them at the high end. Complex kinds order lexicographically on `(re, im)`.

use std::cmp::Ordering;

use num_complex::{Complex32, Complex64};

use crate::{dtype::DataType, scalar::Scalar};

/// Binary in-place arithmetic operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    Power,
}

impl BinaryOp {
    pub const fn name(&self) -> &'static str {
        match self {
            BinaryOp::Add => "iadd",
            BinaryOp::Subtract => "isubtract",
            BinaryOp::Multiply => "imultiply",
            BinaryOp::Divide => "idivide",
            BinaryOp::Remainder => "iremainder",
            BinaryOp::Power => "ipower",
        }
    }
}

pub trait Element: Copy + PartialEq + std::fmt::Debug + Send + Sync + 'static {
    /// The element kind tag.
    const TYPE: DataType;

    /// Width of the little-endian encoding in bytes.
    const BYTE_WIDTH: usize;

    /// Whether in-place arithmetic changes values. Kinds without arithmetic treat every
    /// operation as a no-op.
    const ARITHMETIC: bool;

    /// Whether max/min queries are defined.
    const ORDERED: bool;

    /// Whether `sort` is defined.
    const SORTABLE: bool;

    fn zero() -> Self;

    fn one() -> Self;

    fn from_scalar(value: Scalar) -> Self;

    fn to_scalar(self) -> Scalar;

    /// Total order; see the module docs for NaN and complex handling.
    fn total_cmp(&self, other: &Self) -> Ordering;

    fn is_nan(&self) -> bool {
        false
    }

    fn is_infinite(&self) -> bool {
        false
    }

    /// Apply `op` to `(lhs, rhs)`.
    ///
    /// Returns `None` when the operation is undefined for this kind.
    fn apply(op: BinaryOp, lhs: Self, rhs: Self) -> Option<Self>;

    fn floor(self) -> Self {
        self
    }

    fn write_le(self, out: &mut Vec<u8>);

    /// Decode one element; `bytes` must be exactly [`Self::BYTE_WIDTH`] long.
    fn read_le(bytes: &[u8]) -> Self;
}

macro_rules! cast_scalar {
    ($value:expr, $ty:ty) => {
        match $value {
            Scalar::Bool(v) => v as u8 as $ty,
            Scalar::I8(v) => v as $ty,
            Scalar::I16(v) => v as $ty,
            Scalar::I32(v) => v as $ty,
            Scalar::I64(v) => v as $ty,
            Scalar::U8(v) => v as $ty,
            Scalar::U16(v) => v as $ty,
            Scalar::U32(v) => v as $ty,
            Scalar::U64(v) => v as $ty,
            Scalar::F32(v) => v as $ty,
            Scalar::F64(v) => v as $ty,
            Scalar::Complex64(v) => v.re as $ty,
            Scalar::Complex128(v) => v.re as $ty,
        }
    };
}

macro_rules! le_codec {
    ($ty:ty) => {
        fn write_le(self, out: &mut Vec<u8>) {
            out.extend_from_slice(&self.to_le_bytes());
        }

        fn read_le(bytes: &[u8]) -> Self {
            let mut raw = [0u8; std::mem::size_of::<$ty>()];
            raw.copy_from_slice(bytes);
            <$ty>::from_le_bytes(raw)
        }
    };
}

fn exponent(rhs: u64) -> u32 {
    u32::try_from(rhs).unwrap_or(u32::MAX)
}

macro_rules! impl_element_signed {
    ($ty:ty, $dtype:ident) => {
        impl Element for $ty {
            const TYPE: DataType = DataType::$dtype;
            const BYTE_WIDTH: usize = std::mem::size_of::<$ty>();
            const ARITHMETIC: bool = true;
            const ORDERED: bool = true;
            const SORTABLE: bool = true;

            fn zero() -> Self {
                0
            }

            fn one() -> Self {
                1
            }

            fn from_scalar(value: Scalar) -> Self {
                cast_scalar!(value, $ty)
            }

            fn to_scalar(self) -> Scalar {
                Scalar::$dtype(self)
            }

            fn total_cmp(&self, other: &Self) -> Ordering {
                self.cmp(other)
            }

            fn apply(op: BinaryOp, lhs: Self, rhs: Self) -> Option<Self> {
                Some(match op {
                    BinaryOp::Add => lhs.wrapping_add(rhs),
                    BinaryOp::Subtract => lhs.wrapping_sub(rhs),
                    BinaryOp::Multiply => lhs.wrapping_mul(rhs),
                    BinaryOp::Divide if rhs == 0 => 0,
                    BinaryOp::Divide => lhs.wrapping_div(rhs),
                    BinaryOp::Remainder if rhs == 0 => 0,
                    BinaryOp::Remainder => lhs.wrapping_rem(rhs),
                    BinaryOp::Power if rhs < 0 => match lhs {
                        1 => 1,
                        -1 if rhs % 2 == 0 => 1,
                        -1 => -1,
                        _ => 0,
                    },
                    BinaryOp::Power => lhs.wrapping_pow(exponent(rhs as u64)),
                })
            }

            le_codec!($ty);
        }
    };
}

macro_rules! impl_element_unsigned {
    ($ty:ty, $dtype:ident) => {
        impl Element for $ty {
            const TYPE: DataType = DataType::$dtype;
            const BYTE_WIDTH: usize = std::mem::size_of::<$ty>();
            const ARITHMETIC: bool = true;
            const ORDERED: bool = true;
            const SORTABLE: bool = true;

            fn zero() -> Self {
                0
            }

            fn one() -> Self {
                1
            }

            fn from_scalar(value: Scalar) -> Self {
                cast_scalar!(value, $ty)
            }

            fn to_scalar(self) -> Scalar {
                Scalar::$dtype(self)
            }

            fn total_cmp(&self, other: &Self) -> Ordering {
                self.cmp(other)
            }

            fn apply(op: BinaryOp, lhs: Self, rhs: Self) -> Option<Self> {
                Some(match op {
                    BinaryOp::Add => lhs.wrapping_add(rhs),
                    BinaryOp::Subtract => lhs.wrapping_sub(rhs),
                    BinaryOp::Multiply => lhs.wrapping_mul(rhs),
                    BinaryOp::Divide if rhs == 0 => 0,
                    BinaryOp::Divide => lhs / rhs,
                    BinaryOp::Remainder if rhs == 0 => 0,
                    BinaryOp::Remainder => lhs % rhs,
                    BinaryOp::Power => lhs.wrapping_pow(exponent(rhs as u64)),
                })
            }

            le_codec!($ty);
        }
    };
}

fn float_cmp<F: num_traits::Float>(a: F, b: F) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

macro_rules! impl_element_float {
    ($ty:ty, $dtype:ident) => {
        impl Element for $ty {
            const TYPE: DataType = DataType::$dtype;
            const BYTE_WIDTH: usize = std::mem::size_of::<$ty>();
            const ARITHMETIC: bool = true;
            const ORDERED: bool = true;
            const SORTABLE: bool = true;

            fn zero() -> Self {
                0.0
            }

            fn one() -> Self {
                1.0
            }

            fn from_scalar(value: Scalar) -> Self {
                cast_scalar!(value, $ty)
            }

            fn to_scalar(self) -> Scalar {
                Scalar::$dtype(self)
            }

            fn total_cmp(&self, other: &Self) -> Ordering {
                float_cmp(*self, *other)
            }

            fn is_nan(&self) -> bool {
                <$ty>::is_nan(*self)
            }

            fn is_infinite(&self) -> bool {
                <$ty>::is_infinite(*self)
            }

            fn apply(op: BinaryOp, lhs: Self, rhs: Self) -> Option<Self> {
                Some(match op {
                    BinaryOp::Add => lhs + rhs,
                    BinaryOp::Subtract => lhs - rhs,
                    BinaryOp::Multiply => lhs * rhs,
                    BinaryOp::Divide => lhs / rhs,
                    BinaryOp::Remainder => lhs % rhs,
                    BinaryOp::Power => lhs.powf(rhs),
                })
            }

            fn floor(self) -> Self {
                <$ty>::floor(self)
            }

            le_codec!($ty);
        }
    };
}

macro_rules! impl_element_complex {
    ($ty:ty, $part:ty, $dtype:ident) => {
        impl Element for $ty {
            const TYPE: DataType = DataType::$dtype;
            const BYTE_WIDTH: usize = 2 * std::mem::size_of::<$part>();
            const ARITHMETIC: bool = true;
            const ORDERED: bool = false;
            const SORTABLE: bool = false;

            fn zero() -> Self {
                <$ty>::new(0.0, 0.0)
            }

            fn one() -> Self {
                <$ty>::new(1.0, 0.0)
            }

            fn from_scalar(value: Scalar) -> Self {
                match value {
                    Scalar::Complex64(v) => <$ty>::new(v.re as $part, v.im as $part),
                    Scalar::Complex128(v) => <$ty>::new(v.re as $part, v.im as $part),
                    other => <$ty>::new(cast_scalar!(other, $part), 0.0),
                }
            }

            fn to_scalar(self) -> Scalar {
                Scalar::$dtype(self)
            }

            fn total_cmp(&self, other: &Self) -> Ordering {
                float_cmp(self.re, other.re).then_with(|| float_cmp(self.im, other.im))
            }

            fn is_nan(&self) -> bool {
                self.re.is_nan() || self.im.is_nan()
            }

            fn is_infinite(&self) -> bool {
                self.re.is_infinite() || self.im.is_infinite()
            }

            fn apply(op: BinaryOp, lhs: Self, rhs: Self) -> Option<Self> {
                match op {
                    BinaryOp::Add => Some(lhs + rhs),
                    BinaryOp::Subtract => Some(lhs - rhs),
                    BinaryOp::Multiply => Some(lhs * rhs),
                    BinaryOp::Divide => Some(lhs / rhs),
                    BinaryOp::Power => Some(lhs.powc(rhs)),
                    BinaryOp::Remainder => None,
                }
            }

            fn floor(self) -> Self {
                <$ty>::new(self.re.floor(), self.im.floor())
            }

            fn write_le(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.re.to_le_bytes());
                out.extend_from_slice(&self.im.to_le_bytes());
            }

            fn read_le(bytes: &[u8]) -> Self {
                let width = std::mem::size_of::<$part>();
                let mut re = [0u8; std::mem::size_of::<$part>()];
                let mut im = [0u8; std::mem::size_of::<$part>()];
                re.copy_from_slice(&bytes[..width]);
                im.copy_from_slice(&bytes[width..2 * width]);
                <$ty>::new(<$part>::from_le_bytes(re), <$part>::from_le_bytes(im))
            }
        }
    };
}

impl Element for bool {
    const TYPE: DataType = DataType::Bool;
    const BYTE_WIDTH: usize = 1;
    const ARITHMETIC: bool = false;
    const ORDERED: bool = true;
    const SORTABLE: bool = false;

    fn zero() -> Self {
        false
    }

    fn one() -> Self {
        true
    }

    fn from_scalar(value: Scalar) -> Self {
        value.as_bool()
    }

    fn to_scalar(self) -> Scalar {
        Scalar::Bool(self)
    }

    fn total_cmp(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }

    fn apply(_op: BinaryOp, lhs: Self, _rhs: Self) -> Option<Self> {
        Some(lhs)
    }

    fn write_le(self, out: &mut Vec<u8>) {
        out.push(self as u8);
    }

    fn read_le(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }
}

impl_element_signed!(i8, I8);
impl_element_signed!(i16, I16);
impl_element_signed!(i32, I32);
impl_element_signed!(i64, I64);
impl_element_unsigned!(u8, U8);
impl_element_unsigned!(u16, U16);
impl_element_unsigned!(u32, U32);
impl_element_unsigned!(u64, U64);
impl_element_float!(f32, F32);
impl_element_float!(f64, F64);
impl_element_complex!(Complex32, f32, Complex64);
impl_element_complex!(Complex64, f64, Complex128);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_uses_truthiness() {
        assert!(bool::from_scalar(Scalar::I32(-3)));
        assert!(!bool::from_scalar(Scalar::F64(0.0)));
        assert!(bool::from_scalar(Scalar::F64(f64::NAN)));
        assert!(bool::from_scalar(Scalar::Complex128(Complex64::new(0.0, 2.0))));
    }

    #[test]
    fn integer_narrowing_truncates() {
        assert_eq!(i8::from_scalar(Scalar::I32(300)), 44);
        assert_eq!(u8::from_scalar(Scalar::I16(-1)), 255);
        assert_eq!(i32::from_scalar(Scalar::Bool(true)), 1);
    }

    #[test]
    fn float_to_integer_saturates() {
        assert_eq!(i8::from_scalar(Scalar::F64(1000.7)), i8::MAX);
        assert_eq!(u16::from_scalar(Scalar::F32(-5.0)), 0);
        assert_eq!(i32::from_scalar(Scalar::F64(-2.9)), -2);
        assert_eq!(i64::from_scalar(Scalar::F64(f64::NAN)), 0);
    }

    #[test]
    fn complex_conversions_keep_parts() {
        let c = Complex64::from_scalar(Scalar::Complex64(Complex32::new(1.5, -2.0)));
        assert_eq!(c, Complex64::new(1.5, -2.0));
        assert_eq!(f32::from_scalar(Scalar::Complex128(Complex64::new(3.0, 4.0))), 3.0);
        assert_eq!(Complex32::from_scalar(Scalar::I8(-4)), Complex32::new(-4.0, 0.0));
    }

    #[test]
    fn float_order_groups_nans_high() {
        let mut v = vec![f64::NAN, 2.0, -1.0, f64::NAN, 0.5];
        v.sort_by(|a, b| Element::total_cmp(a, b));
        assert_eq!(&v[..3], &[-1.0, 0.5, 2.0]);
        assert!(v[3].is_nan() && v[4].is_nan());
        assert_eq!(Element::total_cmp(&0.0f64, &-0.0f64), Ordering::Equal);
    }

    #[test]
    fn integer_division_by_zero_yields_zero() {
        assert_eq!(i32::apply(BinaryOp::Divide, 7, 0), Some(0));
        assert_eq!(u8::apply(BinaryOp::Remainder, 7, 0), Some(0));
        assert_eq!(i16::apply(BinaryOp::Power, 2, -1), Some(0));
        assert_eq!(i16::apply(BinaryOp::Power, -1, -3), Some(-1));
        assert_eq!(i16::apply(BinaryOp::Power, 3, 3), Some(27));
    }

    #[test]
    fn bool_arithmetic_is_a_no_op() {
        assert_eq!(bool::apply(BinaryOp::Add, false, true), Some(false));
    }

    #[test]
    fn complex_remainder_is_undefined() {
        let one = Complex64::one();
        assert!(Complex64::apply(BinaryOp::Remainder, one, one).is_none());
    }

    #[test]
    fn le_codec_restores_values() {
        let mut out = Vec::new();
        (-7i16).write_le(&mut out);
        Complex32::new(1.0, -1.0).write_le(&mut out);
        true.write_le(&mut out);
        assert_eq!(out.len(), 2 + 8 + 1);
        assert_eq!(i16::read_le(&out[..2]), -7);
        assert_eq!(Complex32::read_le(&out[2..10]), Complex32::new(1.0, -1.0));
        assert!(bool::read_le(&out[10..]));
    }
}
