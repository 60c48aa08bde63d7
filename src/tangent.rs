// Copyright (c) Facebook, Inc. and its affiliates
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    analytic::Analytic,
    error::{Error, Result},
    scalar::Scalar,
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Forward-mode dual number: a value paired with the directional derivative
/// flowing through it.
///
/// Arithmetic on tangents is closed and pure: every operation returns a fresh
/// pair, no state is shared. Combining a tangent with a plain `f64` treats
/// the number as a constant with derivative zero. The component type `N` is
/// any [`Scalar`], so tangents of adjoints (and deeper nestings) follow the
/// same rules.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Tangent<N> {
    value: N,
    derivative: N,
}

impl<N: Scalar> Tangent<N> {
    /// A tangent with an explicit derivative component.
    pub fn new(value: N, derivative: N) -> Self {
        Tangent { value, derivative }
    }

    /// A tangent carrying no derivative.
    pub fn constant(value: N) -> Self {
        Tangent {
            value,
            derivative: N::zero(),
        }
    }

    /// The primal value.
    pub fn value(&self) -> &N {
        &self.value
    }

    /// The derivative component.
    pub fn derivative(&self) -> &N {
        &self.derivative
    }

    /// Overwrite the derivative component. This is how the forward driver
    /// seeds one input direction at a time.
    pub fn set_derivative(&mut self, derivative: N) {
        self.derivative = derivative;
    }

    /// The identity operation `+v`.
    pub fn identity(&self) -> Self {
        self.clone()
    }
}

impl<N: Scalar> Add for Tangent<N> {
    type Output = Tangent<N>;

    fn add(self, rhs: Tangent<N>) -> Tangent<N> {
        Tangent::new(self.value + rhs.value, self.derivative + rhs.derivative)
    }
}

impl<N: Scalar> Sub for Tangent<N> {
    type Output = Tangent<N>;

    fn sub(self, rhs: Tangent<N>) -> Tangent<N> {
        Tangent::new(self.value - rhs.value, self.derivative - rhs.derivative)
    }
}

impl<N: Scalar> Mul for Tangent<N> {
    type Output = Tangent<N>;

    fn mul(self, rhs: Tangent<N>) -> Tangent<N> {
        let derivative =
            self.derivative * rhs.value.clone() + self.value.clone() * rhs.derivative;
        Tangent::new(self.value * rhs.value, derivative)
    }
}

impl<N: Scalar> Div for Tangent<N> {
    type Output = Tangent<N>;

    fn div(self, rhs: Tangent<N>) -> Tangent<N> {
        let value = self.value.clone() / rhs.value.clone();
        let derivative = self.derivative / rhs.value.clone()
            - self.value / (rhs.value.clone() * rhs.value) * rhs.derivative;
        Tangent::new(value, derivative)
    }
}

impl<N: Scalar> Neg for Tangent<N> {
    type Output = Tangent<N>;

    fn neg(self) -> Tangent<N> {
        Tangent::new(-self.value, -self.derivative)
    }
}

macro_rules! impl_mixed {
    ($trait:ident, $method:ident) => {
        impl<N: Scalar> $trait<f64> for Tangent<N> {
            type Output = Tangent<N>;

            fn $method(self, rhs: f64) -> Tangent<N> {
                self.$method(Tangent::constant(N::from_f64(rhs)))
            }
        }

        impl<N: Scalar> $trait<Tangent<N>> for f64 {
            type Output = Tangent<N>;

            fn $method(self, rhs: Tangent<N>) -> Tangent<N> {
                Tangent::constant(N::from_f64(self)).$method(rhs)
            }
        }
    };
}

impl_mixed!(Add, add);
impl_mixed!(Sub, sub);
impl_mixed!(Mul, mul);
impl_mixed!(Div, div);

/// Comparisons look at values only and discard derivatives.
impl<N: Scalar> PartialEq for Tangent<N> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<N: Scalar> PartialOrd for Tangent<N> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.value.partial_cmp(&other.value)
    }
}

impl<N: Scalar> PartialEq<f64> for Tangent<N> {
    fn eq(&self, other: &f64) -> bool {
        self.value == N::from_f64(*other)
    }
}

impl<N: Scalar> PartialOrd<f64> for Tangent<N> {
    fn partial_cmp(&self, other: &f64) -> Option<Ordering> {
        self.value.partial_cmp(&N::from_f64(*other))
    }
}

impl<N: Scalar> num::Zero for Tangent<N> {
    fn zero() -> Self {
        Tangent::constant(N::zero())
    }

    fn is_zero(&self) -> bool {
        self.value.is_zero()
    }
}

impl<N: Scalar> num::One for Tangent<N> {
    fn one() -> Self {
        Tangent::constant(N::one())
    }
}

impl<N: Scalar> Analytic for Tangent<N> {
    fn sin(&self) -> Self {
        Tangent::new(
            self.value.sin(),
            self.value.cos() * self.derivative.clone(),
        )
    }

    fn cos(&self) -> Self {
        Tangent::new(
            self.value.cos(),
            -self.value.sin() * self.derivative.clone(),
        )
    }

    fn exp(&self) -> Self {
        let value = self.value.exp();
        Tangent::new(value.clone(), value * self.derivative.clone())
    }

    fn log(&self) -> Self {
        Tangent::new(
            self.value.log(),
            self.derivative.clone() / self.value.clone(),
        )
    }

    fn sqrt(&self) -> Self {
        let value = self.value.sqrt();
        let derivative =
            self.derivative.clone() / (value.clone() * N::from_f64(2.0));
        Tangent::new(value, derivative)
    }

    fn pow(&self, exponent: &Self) -> Self {
        let value = self.value.pow(&exponent.value);
        let left = exponent.value.clone()
            * self.value.pow(&(exponent.value.clone() - N::one()))
            * self.derivative.clone();
        let right = value.clone() * self.value.log() * exponent.derivative.clone();
        Tangent::new(value, left + right)
    }
}

impl<N: Scalar> Scalar for Tangent<N> {
    fn from_f64(value: f64) -> Self {
        Tangent::constant(N::from_f64(value))
    }

    fn powc(&self, c: f64) -> Self {
        let derivative =
            self.value.powc(c - 1.0) * self.derivative.clone() * N::from_f64(c);
        Tangent::new(self.value.powc(c), derivative)
    }

    fn abs(&self) -> Result<Self> {
        if self.value.is_zero() {
            if self.derivative.is_zero() {
                return Ok(Tangent::constant(N::zero()));
            }
            return Err(Error::not_differentiable(func_name!()));
        }
        let value = self.value.abs()?;
        let sign = self.value.clone() / value.clone();
        Ok(Tangent::new(value, sign * self.derivative.clone()))
    }
}

impl<N: Scalar + std::fmt::Display> std::fmt::Display for Tangent<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}
