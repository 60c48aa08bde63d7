// Copyright (c) Facebook, Inc. and its affiliates
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{analytic::Analytic, error::Result};
use std::fmt::Debug;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// The number-like capability that differentiable programs are written
/// against: closed arithmetic, ordering by value, elementary functions, and
/// lifting of plain constants.
///
/// Implemented by plain floats, by [`Tangent`](crate::tangent::Tangent), by
/// [`Adjoint`](crate::adjoint::Adjoint), and recursively by nestings of the
/// two (a tangent of adjoints, an adjoint of tangents, and so on). Operators
/// dispatch on this capability rather than on a concrete numeric type, which
/// is what makes derivatives of derivatives compose.
pub trait Scalar:
    Analytic
    + Clone
    + Debug
    + PartialOrd
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + num::Zero
    + num::One
{
    /// Lift a plain floating-point constant. Constants carry no derivative.
    fn from_f64(value: f64) -> Self;

    /// Power by a plain constant `v ^ c`.
    ///
    /// Unlike the general [`Analytic::pow`], the derivative of this form does
    /// not involve `log(v)`, so it stays finite for non-positive bases.
    fn powc(&self, c: f64) -> Self;

    /// Absolute value `|v|`.
    ///
    /// Fails with [`Error::NotDifferentiable`](crate::error::Error) when a
    /// derivative is requested at `v = 0`.
    fn abs(&self) -> Result<Self>;
}

macro_rules! impl_float {
    ($t:ty) => {
        impl Scalar for $t {
            #[inline]
            fn from_f64(value: f64) -> Self {
                value as $t
            }

            #[inline]
            fn powc(&self, c: f64) -> Self {
                <$t>::powf(*self, c as $t)
            }

            #[inline]
            fn abs(&self) -> Result<Self> {
                Ok(<$t>::abs(*self))
            }
        }
    };
}

impl_float!(f32);
impl_float!(f64);
