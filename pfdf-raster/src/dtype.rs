//! Dtype tags and numpy-style casting rules for raster values.
//!
//! The in-memory `Raster::data` buffer (see [`super::raster`]) is always
//! `f64`; file-format dtypes are converted at the I/O boundary. `DType` is a
//! first-class, checked property of the metadata rather than a
//! loosely-enforced hint: every write into a raster's buffer is validated
//! against its declared dtype's casting rule.

use pfdf_common::errors::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
}

impl DType {
    pub fn is_integer(self) -> bool {
        !matches!(self, DType::Bool | DType::Float32 | DType::Float64)
    }

    pub fn is_float(self) -> bool {
        matches!(self, DType::Float32 | DType::Float64)
    }

    pub fn is_unsigned(self) -> bool {
        matches!(self, DType::UInt8 | DType::UInt16 | DType::UInt32 | DType::UInt64)
    }

    /// Default NoData value for a freshly constructed raster of this dtype:
    /// `false` for bool, `NaN` for float, the minimum representable value for
    /// signed integers, `0` for unsigned integers.
    pub fn default_nodata(self) -> f64 {
        match self {
            DType::Bool => 0.0,
            DType::Float32 => f32::NAN as f64,
            DType::Float64 => f64::NAN,
            DType::Int8 => i8::MIN as f64,
            DType::Int16 => i16::MIN as f64,
            DType::Int32 => i32::MIN as f64,
            DType::Int64 => i64::MIN as f64,
            DType::UInt8 | DType::UInt16 | DType::UInt32 | DType::UInt64 => 0.0,
        }
    }

    fn min_max(self) -> Option<(f64, f64)> {
        match self {
            DType::Bool => Some((0.0, 1.0)),
            DType::Int8 => Some((i8::MIN as f64, i8::MAX as f64)),
            DType::Int16 => Some((i16::MIN as f64, i16::MAX as f64)),
            DType::Int32 => Some((i32::MIN as f64, i32::MAX as f64)),
            DType::Int64 => Some((i64::MIN as f64, i64::MAX as f64)),
            DType::UInt8 => Some((0.0, u8::MAX as f64)),
            DType::UInt16 => Some((0.0, u16::MAX as f64)),
            DType::UInt32 => Some((0.0, u32::MAX as f64)),
            DType::UInt64 => Some((0.0, u64::MAX as f64)),
            DType::Float32 | DType::Float64 => None,
        }
    }

    /// True if `value` can be represented exactly (NaN always passes for
    /// float dtypes) by this dtype.
    pub fn represents(self, value: f64) -> bool {
        if value.is_nan() {
            return self.is_float();
        }
        match self.min_max() {
            Some((min, max)) => value >= min && value <= max && value.fract() == 0.0,
            None => true,
        }
    }
}

/// numpy-style casting safety rules, narrowest to widest.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Casting {
    /// No cast at all is allowed; dtypes must match exactly.
    No,
    /// Only byte-order changes are allowed (treated as `No` here, since this
    /// crate has no notion of endianness at the value level).
    Equiv,
    /// Casts that preserve value are allowed (e.g. int32 -> float64).
    Safe,
    /// Casts within a kind (signed/signed, float/float) are allowed even if
    /// lossy.
    SameKind,
    /// Any cast is allowed.
    Unsafe,
}

impl Casting {
    /// Checks whether `value`, logically of dtype `from`, may be cast to
    /// `to` under `self`. Does not check whether `value` fits `to`'s
    /// range — use [`DType::represents`] for that; this only checks the
    /// *rule*, matching numpy's `can_cast(from_dtype, to_dtype, casting)`
    /// semantics (kind-based, not value-based).
    pub fn allows(self, from: DType, to: DType) -> Result<()> {
        if from == to {
            return Ok(());
        }
        let ok = match self {
            Casting::No | Casting::Equiv => false,
            Casting::Safe => safe_widens(from, to),
            Casting::SameKind => same_kind(from, to) || safe_widens(from, to),
            Casting::Unsafe => true,
        };
        if ok {
            Ok(())
        } else {
            Err(Error::Dimension(format!(
                "cannot cast {:?} to {:?} under casting rule {:?}",
                from, to, self
            )))
        }
    }
}

fn kind(dtype: DType) -> &'static str {
    match dtype {
        DType::Bool => "b",
        DType::Int8 | DType::Int16 | DType::Int32 | DType::Int64 => "i",
        DType::UInt8 | DType::UInt16 | DType::UInt32 | DType::UInt64 => "u",
        DType::Float32 | DType::Float64 => "f",
    }
}

fn same_kind(from: DType, to: DType) -> bool {
    kind(from) == kind(to)
}

fn rank(dtype: DType) -> u8 {
    match dtype {
        DType::Bool => 0,
        DType::Int8 | DType::UInt8 => 1,
        DType::Int16 | DType::UInt16 => 2,
        DType::Int32 | DType::UInt32 | DType::Float32 => 3,
        DType::Int64 | DType::UInt64 | DType::Float64 => 4,
    }
}

/// A coarse, conservative "does this ever lose information" rule: widening
/// within or across kind (bool -> int -> float) is safe; anything that could
/// narrow or cross from float back to integer is not.
fn safe_widens(from: DType, to: DType) -> bool {
    if from == DType::Bool {
        return true;
    }
    if from.is_float() && to.is_integer() {
        return false;
    }
    rank(to) >= rank(from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_always_widens_safely() {
        assert!(Casting::Safe.allows(DType::Bool, DType::Int32).is_ok());
        assert!(Casting::Safe.allows(DType::Bool, DType::Float64).is_ok());
    }

    #[test]
    fn safe_rejects_float_to_int() {
        assert!(Casting::Safe.allows(DType::Float64, DType::Int32).is_err());
    }

    #[test]
    fn same_kind_allows_narrowing_within_kind() {
        assert!(Casting::SameKind.allows(DType::Int32, DType::Int8).is_ok());
        assert!(Casting::SameKind.allows(DType::Int32, DType::UInt8).is_err());
    }

    #[test]
    fn represents_checks_integer_range() {
        assert!(DType::UInt8.represents(255.0));
        assert!(!DType::UInt8.represents(256.0));
        assert!(!DType::UInt8.represents(-1.0));
        assert!(DType::Float64.represents(f64::NAN));
        assert!(!DType::Int32.represents(f64::NAN));
    }
}
