// Copyright (c) Facebook, Inc. and its affiliates
// SPDX-License-Identifier: MIT OR Apache-2.0

use ndarray::{Array, Dimension, Zip};

/// Pointwise analytic functions (sin, cos, exp, log, sqrt, pow).
///
/// This is the capability that the free functions of this module dispatch on.
/// It is implemented by plain floats (delegating to the standard library), by
/// the AD scalars of this crate (propagating derivatives), and elementwise by
/// arrays of any of those.
pub trait Analytic: Sized {
    /// Sinus `sin(v)`.
    fn sin(&self) -> Self;

    /// Cosinus `cos(v)`.
    fn cos(&self) -> Self;

    /// Exponential `exp(v)`.
    fn exp(&self) -> Self;

    /// Natural logarithm `log(v)`.
    fn log(&self) -> Self;

    /// Square root `sqrt(v)`.
    fn sqrt(&self) -> Self;

    /// Power `v ^ p`.
    fn pow(&self, exponent: &Self) -> Self;
}

/// Sine of any operand exposing the [`Analytic`] capability.
///
/// Plain floats resolve to the standard library implementation, so numeric
/// code written against this function works unchanged outside of a
/// differentiation context.
pub fn sin<T: Analytic>(v: &T) -> T {
    v.sin()
}

/// Cosine of any operand exposing the [`Analytic`] capability.
pub fn cos<T: Analytic>(v: &T) -> T {
    v.cos()
}

/// Exponential of any operand exposing the [`Analytic`] capability.
pub fn exp<T: Analytic>(v: &T) -> T {
    v.exp()
}

/// Natural logarithm of any operand exposing the [`Analytic`] capability.
pub fn log<T: Analytic>(v: &T) -> T {
    v.log()
}

/// Square root of any operand exposing the [`Analytic`] capability.
pub fn sqrt<T: Analytic>(v: &T) -> T {
    v.sqrt()
}

macro_rules! impl_float {
    ($t:ty) => {
        impl Analytic for $t {
            #[inline]
            fn sin(&self) -> Self {
                <$t>::sin(*self)
            }

            #[inline]
            fn cos(&self) -> Self {
                <$t>::cos(*self)
            }

            #[inline]
            fn exp(&self) -> Self {
                <$t>::exp(*self)
            }

            #[inline]
            fn log(&self) -> Self {
                <$t>::ln(*self)
            }

            #[inline]
            fn sqrt(&self) -> Self {
                <$t>::sqrt(*self)
            }

            #[inline]
            fn pow(&self, exponent: &Self) -> Self {
                <$t>::powf(*self, *exponent)
            }
        }
    };
}

impl_float!(f32);
impl_float!(f64);

/// Elementwise counterparts for arrays of analytic elements.
/// Shapes of binary operands must agree; no broadcasting is introduced.
impl<T, D> Analytic for Array<T, D>
where
    T: Analytic,
    D: Dimension,
{
    fn sin(&self) -> Self {
        self.map(Analytic::sin)
    }

    fn cos(&self) -> Self {
        self.map(Analytic::cos)
    }

    fn exp(&self) -> Self {
        self.map(Analytic::exp)
    }

    fn log(&self) -> Self {
        self.map(Analytic::log)
    }

    fn sqrt(&self) -> Self {
        self.map(Analytic::sqrt)
    }

    fn pow(&self, exponent: &Self) -> Self {
        Zip::from(self).and(exponent).map_collect(|v, e| v.pow(e))
    }
}
