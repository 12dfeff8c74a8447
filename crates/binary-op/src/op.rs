// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The closed table of binary elementwise operations.
//!
//! [`BinaryOpKind`] is the runtime-visible tag; each tag maps to a
//! zero-sized functor implementing [`BinaryFunctor`], so kernels are
//! monomorphized per operation and the inner loops inline fully.

#[cfg(target_arch = "aarch64")]
use std::arch::aarch64::*;

/// The binary elementwise operations a layer can be configured with.
///
/// `Rsub`, `Rdiv` and `Rpow` are the argument-reversed forms of the
/// non-commutative operations; they are selected by the dispatcher when the
/// operands are swapped, and can also be configured directly.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOpKind {
    /// `x + y`
    Add,
    /// `x − y`
    Sub,
    /// `x · y`
    Mul,
    /// `x / y`
    Div,
    /// `max(x, y)`
    Max,
    /// `min(x, y)`
    Min,
    /// `x^y` (computed in f32)
    Pow,
    /// `y − x`
    Rsub,
    /// `y / x`
    Rdiv,
    /// `y^x` (computed in f32)
    Rpow,
}

impl BinaryOpKind {
    /// Parses the numeric parameter code used in layer parameter dicts.
    pub fn from_param_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Add),
            1 => Some(Self::Sub),
            2 => Some(Self::Mul),
            3 => Some(Self::Div),
            4 => Some(Self::Max),
            5 => Some(Self::Min),
            6 => Some(Self::Pow),
            7 => Some(Self::Rsub),
            8 => Some(Self::Rdiv),
            9 => Some(Self::Rpow),
            _ => None,
        }
    }

    /// Returns the numeric parameter code for this operation.
    pub fn param_code(&self) -> i32 {
        match self {
            Self::Add => 0,
            Self::Sub => 1,
            Self::Mul => 2,
            Self::Div => 3,
            Self::Max => 4,
            Self::Min => 5,
            Self::Pow => 6,
            Self::Rsub => 7,
            Self::Rdiv => 8,
            Self::Rpow => 9,
        }
    }

    /// Parses an operation from a loose string.
    ///
    /// Accepts both the canonical snake_case names and common aliases
    /// (`"plus"`, `"subtract"`, `"multiply"`, `"divide"`, `"power"`).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "add" | "plus" => Some(Self::Add),
            "sub" | "subtract" | "minus" => Some(Self::Sub),
            "mul" | "multiply" => Some(Self::Mul),
            "div" | "divide" => Some(Self::Div),
            "max" => Some(Self::Max),
            "min" => Some(Self::Min),
            "pow" | "power" => Some(Self::Pow),
            "rsub" => Some(Self::Rsub),
            "rdiv" => Some(Self::Rdiv),
            "rpow" => Some(Self::Rpow),
            _ => None,
        }
    }

    /// Returns a human-readable label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
            Self::Max => "max",
            Self::Min => "min",
            Self::Pow => "pow",
            Self::Rsub => "rsub",
            Self::Rdiv => "rdiv",
            Self::Rpow => "rpow",
        }
    }

    /// The argument-swapped counterpart of this operation.
    ///
    /// An involution: `SUB ↔ RSUB`, `DIV ↔ RDIV`, `POW ↔ RPOW`; the
    /// commutative operations map to themselves.
    pub fn reversed(&self) -> Self {
        match self {
            Self::Sub => Self::Rsub,
            Self::Div => Self::Rdiv,
            Self::Pow => Self::Rpow,
            Self::Rsub => Self::Sub,
            Self::Rdiv => Self::Div,
            Self::Rpow => Self::Pow,
            other => *other,
        }
    }

    /// Returns `true` for operations where argument order is irrelevant.
    pub fn is_commutative(&self) -> bool {
        matches!(self, Self::Add | Self::Mul | Self::Max | Self::Min)
    }

    /// Applies the operation to a single pair of values.
    ///
    /// Convenience for non-hot-path callers; the kernels go through the
    /// monomorphized functors instead.
    pub fn eval(&self, x: f32, y: f32) -> f32 {
        match self {
            Self::Add => x + y,
            Self::Sub => x - y,
            Self::Mul => x * y,
            Self::Div => x / y,
            Self::Max => x.max(y),
            Self::Min => x.min(y),
            Self::Pow => x.powf(y),
            Self::Rsub => y - x,
            Self::Rdiv => y / x,
            Self::Rpow => y.powf(x),
        }
    }
}

impl std::fmt::Display for BinaryOpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A zero-sized binary operation usable as a kernel type parameter.
///
/// `apply` is the scalar form; on `aarch64`, `apply_lane` operates on a
/// 4-wide NEON register. Both forms must agree bit-for-bit so SIMD never
/// changes results.
pub(crate) trait BinaryFunctor: Copy + Send + Sync + 'static {
    fn apply(x: f32, y: f32) -> f32;

    /// # Safety
    /// Requires NEON, which is mandatory on `aarch64`.
    #[cfg(target_arch = "aarch64")]
    unsafe fn apply_lane(x: float32x4_t, y: float32x4_t) -> float32x4_t;
}

/// Applies a scalar function to each lane of a NEON register.
///
/// Used by the operations without a native vector instruction (`pow`
/// variants), preserving the scalar f32 semantics exactly.
#[cfg(target_arch = "aarch64")]
#[inline]
unsafe fn lane_by_scalar(
    x: float32x4_t,
    y: float32x4_t,
    f: impl Fn(f32, f32) -> f32,
) -> float32x4_t {
    let mut xs = [0.0f32; 4];
    let mut ys = [0.0f32; 4];
    vst1q_f32(xs.as_mut_ptr(), x);
    vst1q_f32(ys.as_mut_ptr(), y);
    let r = [
        f(xs[0], ys[0]),
        f(xs[1], ys[1]),
        f(xs[2], ys[2]),
        f(xs[3], ys[3]),
    ];
    vld1q_f32(r.as_ptr())
}

macro_rules! functor {
    ($name:ident, |$x:ident, $y:ident| $scalar:expr, |$xl:ident, $yl:ident| $lane:expr) => {
        #[derive(Clone, Copy)]
        pub(crate) struct $name;

        impl BinaryFunctor for $name {
            #[inline(always)]
            fn apply($x: f32, $y: f32) -> f32 {
                $scalar
            }

            #[cfg(target_arch = "aarch64")]
            #[inline(always)]
            unsafe fn apply_lane($xl: float32x4_t, $yl: float32x4_t) -> float32x4_t {
                $lane
            }
        }
    };
}

functor!(OpAdd, |x, y| x + y, |x, y| vaddq_f32(x, y));
functor!(OpSub, |x, y| x - y, |x, y| vsubq_f32(x, y));
functor!(OpMul, |x, y| x * y, |x, y| vmulq_f32(x, y));
functor!(OpDiv, |x, y| x / y, |x, y| vdivq_f32(x, y));
functor!(OpMax, |x, y| f32::max(x, y), |x, y| vmaxq_f32(x, y));
functor!(OpMin, |x, y| f32::min(x, y), |x, y| vminq_f32(x, y));
functor!(OpPow, |x, y| f32::powf(x, y), |x, y| lane_by_scalar(x, y, f32::powf));
functor!(OpRsub, |x, y| y - x, |x, y| vsubq_f32(y, x));
functor!(OpRdiv, |x, y| y / x, |x, y| vdivq_f32(y, x));
functor!(OpRpow, |x, y| f32::powf(y, x), |x, y| lane_by_scalar(x, y, |a, b| {
    f32::powf(b, a)
}));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_code_roundtrip() {
        for code in 0..10 {
            let op = BinaryOpKind::from_param_code(code).unwrap();
            assert_eq!(op.param_code(), code);
        }
        assert_eq!(BinaryOpKind::from_param_code(10), None);
        assert_eq!(BinaryOpKind::from_param_code(-1), None);
    }

    #[test]
    fn test_from_str_loose() {
        assert_eq!(BinaryOpKind::from_str_loose("add"), Some(BinaryOpKind::Add));
        assert_eq!(
            BinaryOpKind::from_str_loose("Multiply"),
            Some(BinaryOpKind::Mul)
        );
        assert_eq!(
            BinaryOpKind::from_str_loose("POWER"),
            Some(BinaryOpKind::Pow)
        );
        assert_eq!(BinaryOpKind::from_str_loose("bogus"), None);
    }

    #[test]
    fn test_reversed_is_involution() {
        use BinaryOpKind::*;
        for op in [Add, Sub, Mul, Div, Max, Min, Pow, Rsub, Rdiv, Rpow] {
            assert_eq!(op.reversed().reversed(), op);
        }
        assert_eq!(Sub.reversed(), Rsub);
        assert_eq!(Rdiv.reversed(), Div);
        assert_eq!(Add.reversed(), Add);
    }

    #[test]
    fn test_commutative_set() {
        use BinaryOpKind::*;
        for op in [Add, Mul, Max, Min] {
            assert!(op.is_commutative());
        }
        for op in [Sub, Div, Pow, Rsub, Rdiv, Rpow] {
            assert!(!op.is_commutative());
        }
    }

    #[test]
    fn test_eval_semantics() {
        use BinaryOpKind::*;
        assert_eq!(Add.eval(2.0, 3.0), 5.0);
        assert_eq!(Sub.eval(2.0, 3.0), -1.0);
        assert_eq!(Rsub.eval(2.0, 3.0), 1.0);
        assert_eq!(Div.eval(1.0, 4.0), 0.25);
        assert_eq!(Rdiv.eval(4.0, 1.0), 0.25);
        assert_eq!(Max.eval(-1.0, 2.0), 2.0);
        assert_eq!(Min.eval(-1.0, 2.0), -1.0);
        assert_eq!(Pow.eval(2.0, 3.0), 8.0);
        assert_eq!(Rpow.eval(3.0, 2.0), 8.0);
    }

    #[test]
    fn test_eval_host_float_semantics() {
        use BinaryOpKind::*;
        assert!(Div.eval(1.0, 0.0).is_infinite());
        assert!(Rdiv.eval(0.0, 1.0).is_infinite());
        assert!(Pow.eval(-2.0, 0.5).is_nan());
        // f32::max ignores a NaN operand rather than propagating it.
        assert_eq!(Max.eval(f32::NAN, 1.0), 1.0);
    }

    #[test]
    fn test_functors_match_eval() {
        let cases = [(2.5, 3.5), (-1.0, 0.0), (0.5, -2.0)];
        for (x, y) in cases {
            assert_eq!(OpAdd::apply(x, y), BinaryOpKind::Add.eval(x, y));
            assert_eq!(OpSub::apply(x, y), BinaryOpKind::Sub.eval(x, y));
            assert_eq!(OpMul::apply(x, y), BinaryOpKind::Mul.eval(x, y));
            assert_eq!(OpDiv::apply(x, y), BinaryOpKind::Div.eval(x, y));
            assert_eq!(OpMax::apply(x, y), BinaryOpKind::Max.eval(x, y));
            assert_eq!(OpMin::apply(x, y), BinaryOpKind::Min.eval(x, y));
            assert_eq!(OpPow::apply(x, y), BinaryOpKind::Pow.eval(x, y));
            assert_eq!(OpRsub::apply(x, y), BinaryOpKind::Rsub.eval(x, y));
            assert_eq!(OpRdiv::apply(x, y), BinaryOpKind::Rdiv.eval(x, y));
            assert_eq!(OpRpow::apply(x, y), BinaryOpKind::Rpow.eval(x, y));
        }
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&BinaryOpKind::Rsub).unwrap();
        assert_eq!(json, "\"rsub\"");
        let back: BinaryOpKind = serde_json::from_str("\"max\"").unwrap();
        assert_eq!(back, BinaryOpKind::Max);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", BinaryOpKind::Rpow), "rpow");
    }
}
