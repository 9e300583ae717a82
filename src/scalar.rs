//! Element-kind-tagged values for code that does not know a dataset's concrete element type.

use num_complex::{Complex32, Complex64};

/// A single value of any supported element kind.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Scalar {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Complex64(Complex32),
    Complex128(Complex64),
}

macro_rules! scalar_from {
    ($ty:ty, $variant:ident) => {
        impl From<$ty> for Scalar {
            fn from(value: $ty) -> Self {
                Scalar::$variant(value)
            }
        }
    };
}

scalar_from!(bool, Bool);
scalar_from!(i8, I8);
scalar_from!(i16, I16);
scalar_from!(i32, I32);
scalar_from!(i64, I64);
scalar_from!(u8, U8);
scalar_from!(u16, U16);
scalar_from!(u32, U32);
scalar_from!(u64, U64);
scalar_from!(f32, F32);
scalar_from!(f64, F64);
scalar_from!(Complex32, Complex64);
scalar_from!(Complex64, Complex128);

impl Scalar {
    /// Truthiness: any non-zero value (including NaN) is `true`.
    pub fn as_bool(&self) -> bool {
        match *self {
            Scalar::Bool(v) => v,
            Scalar::I8(v) => v != 0,
            Scalar::I16(v) => v != 0,
            Scalar::I32(v) => v != 0,
            Scalar::I64(v) => v != 0,
            Scalar::U8(v) => v != 0,
            Scalar::U16(v) => v != 0,
            Scalar::U32(v) => v != 0,
            Scalar::U64(v) => v != 0,
            Scalar::F32(v) => v != 0.0,
            Scalar::F64(v) => v != 0.0,
            Scalar::Complex64(v) => v.re != 0.0 || v.im != 0.0,
            Scalar::Complex128(v) => v.re != 0.0 || v.im != 0.0,
        }
    }

    /// Real part as `f64`; `true` is 1.
    pub fn as_f64(&self) -> f64 {
        match *self {
            Scalar::Bool(v) => v as u8 as f64,
            Scalar::I8(v) => v as f64,
            Scalar::I16(v) => v as f64,
            Scalar::I32(v) => v as f64,
            Scalar::I64(v) => v as f64,
            Scalar::U8(v) => v as f64,
            Scalar::U16(v) => v as f64,
            Scalar::U32(v) => v as f64,
            Scalar::U64(v) => v as f64,
            Scalar::F32(v) => v as f64,
            Scalar::F64(v) => v,
            Scalar::Complex64(v) => v.re as f64,
            Scalar::Complex128(v) => v.re,
        }
    }

    /// Imaginary part as `f64`; zero for real kinds.
    pub fn imag_f64(&self) -> f64 {
        match *self {
            Scalar::Complex64(v) => v.im as f64,
            Scalar::Complex128(v) => v.im,
            _ => 0.0,
        }
    }

    /// Integer payload without loss for every integer kind.
    ///
    /// Returns `None` for floating-point and complex values.
    pub fn as_integer(&self) -> Option<i128> {
        match *self {
            Scalar::Bool(v) => Some(v as i128),
            Scalar::I8(v) => Some(v as i128),
            Scalar::I16(v) => Some(v as i128),
            Scalar::I32(v) => Some(v as i128),
            Scalar::I64(v) => Some(v as i128),
            Scalar::U8(v) => Some(v as i128),
            Scalar::U16(v) => Some(v as i128),
            Scalar::U32(v) => Some(v as i128),
            Scalar::U64(v) => Some(v as i128),
            _ => None,
        }
    }

    /// Whether the value is a floating-point or complex NaN.
    pub fn is_nan(&self) -> bool {
        match *self {
            Scalar::F32(v) => v.is_nan(),
            Scalar::F64(v) => v.is_nan(),
            Scalar::Complex64(v) => v.re.is_nan() || v.im.is_nan(),
            Scalar::Complex128(v) => v.re.is_nan() || v.im.is_nan(),
            _ => false,
        }
    }
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scalar::Bool(v) => write!(f, "{v}"),
            Scalar::I8(v) => write!(f, "{v}"),
            Scalar::I16(v) => write!(f, "{v}"),
            Scalar::I32(v) => write!(f, "{v}"),
            Scalar::I64(v) => write!(f, "{v}"),
            Scalar::U8(v) => write!(f, "{v}"),
            Scalar::U16(v) => write!(f, "{v}"),
            Scalar::U32(v) => write!(f, "{v}"),
            Scalar::U64(v) => write!(f, "{v}"),
            Scalar::F32(v) => write!(f, "{v}"),
            Scalar::F64(v) => write!(f, "{v}"),
            Scalar::Complex64(v) => write!(f, "{v}"),
            Scalar::Complex128(v) => write!(f, "{v}"),
        }
    }
}
