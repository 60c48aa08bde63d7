// Copyright (c) Facebook, Inc. and its affiliates
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    analytic::Analytic,
    error::{Error, Result},
    scalar::Scalar,
    tape::{NodeId, Tape},
};
use std::cmp::Ordering;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Reverse-mode scalar: a value backed by a node on a [`Tape`].
///
/// Every operation computes its result value, the local partial derivative
/// with respect to each tracked operand, and registers one node holding the
/// `(parent, partial)` pairs. Constants (from [`Adjoint::constant`] or from
/// arithmetic between constants) carry no node and are valid with any tape.
///
/// Two tracked operands of one operation must live on the same tape; mixing
/// tapes is a programmer error and panics with the
/// [`TapeMismatch`](crate::error::Error::TapeMismatch) message. The fallible
/// surfaces ([`Scalar::abs`], [`Adjoint::id`], the tape operations) report
/// errors as `Result`s.
#[derive(Clone)]
pub struct Adjoint<'t, N> {
    value: N,
    node: Option<(&'t Tape<N>, NodeId)>,
}

impl<'t, N: Scalar> Adjoint<'t, N> {
    /// A constant. Constants are not recorded and contribute no dependency.
    pub fn constant(value: N) -> Self {
        Adjoint { value, node: None }
    }

    pub(crate) fn tracked(value: N, tape: &'t Tape<N>, id: NodeId) -> Self {
        Adjoint {
            value,
            node: Some((tape, id)),
        }
    }

    /// The primal value.
    pub fn value(&self) -> &N {
        &self.value
    }

    /// Whether this scalar is an untracked constant.
    pub fn is_constant(&self) -> bool {
        self.node.is_none()
    }

    /// The id of the tape node backing this scalar.
    /// Fails for constants, which carry no derivative bookkeeping.
    pub fn id(&self) -> Result<NodeId> {
        self.node
            .map(|(_, id)| id)
            .ok_or_else(|| Error::unsupported_operation(func_name!()))
    }

    /// The adjoint accumulated for this scalar by the last backpropagation.
    /// Constants always hold a zero adjoint.
    pub fn adjoint(&self) -> Result<N> {
        match self.node {
            Some((tape, id)) => tape.adjoint(id),
            None => Ok(N::zero()),
        }
    }

    /// The identity operation `+v`, recorded with a one-element dependency
    /// list.
    pub fn identity(&self) -> Self {
        self.unary(self.value.clone(), N::one())
    }

    fn unary(&self, value: N, partial: N) -> Self {
        match self.node {
            Some((tape, id)) => {
                let result = tape.register(vec![(id, partial)]);
                Adjoint::tracked(value, tape, result)
            }
            None => Adjoint::constant(value),
        }
    }

    fn binary(&self, rhs: &Self, value: N, left: N, right: N) -> Self {
        match (self.node, rhs.node) {
            (Some((tape, i)), Some((other, j))) => {
                assert!(
                    std::ptr::eq(tape, other),
                    "{}",
                    Error::tape_mismatch(func_name!())
                );
                let result = tape.register(vec![(i, left), (j, right)]);
                Adjoint::tracked(value, tape, result)
            }
            (Some((tape, i)), None) => {
                let result = tape.register(vec![(i, left)]);
                Adjoint::tracked(value, tape, result)
            }
            (None, Some((tape, j))) => {
                let result = tape.register(vec![(j, right)]);
                Adjoint::tracked(value, tape, result)
            }
            (None, None) => Adjoint::constant(value),
        }
    }
}

impl<'t, N: Scalar> Add for Adjoint<'t, N> {
    type Output = Adjoint<'t, N>;

    fn add(self, rhs: Adjoint<'t, N>) -> Adjoint<'t, N> {
        let value = self.value.clone() + rhs.value.clone();
        self.binary(&rhs, value, N::one(), N::one())
    }
}

impl<'t, N: Scalar> Sub for Adjoint<'t, N> {
    type Output = Adjoint<'t, N>;

    fn sub(self, rhs: Adjoint<'t, N>) -> Adjoint<'t, N> {
        let value = self.value.clone() - rhs.value.clone();
        self.binary(&rhs, value, N::one(), -N::one())
    }
}

impl<'t, N: Scalar> Mul for Adjoint<'t, N> {
    type Output = Adjoint<'t, N>;

    fn mul(self, rhs: Adjoint<'t, N>) -> Adjoint<'t, N> {
        let value = self.value.clone() * rhs.value.clone();
        let left = rhs.value.clone();
        let right = self.value.clone();
        self.binary(&rhs, value, left, right)
    }
}

impl<'t, N: Scalar> Div for Adjoint<'t, N> {
    type Output = Adjoint<'t, N>;

    fn div(self, rhs: Adjoint<'t, N>) -> Adjoint<'t, N> {
        let value = self.value.clone() / rhs.value.clone();
        let left = N::one() / rhs.value.clone();
        let right = -(self.value.clone() / (rhs.value.clone() * rhs.value.clone()));
        self.binary(&rhs, value, left, right)
    }
}

impl<'t, N: Scalar> Neg for Adjoint<'t, N> {
    type Output = Adjoint<'t, N>;

    fn neg(self) -> Adjoint<'t, N> {
        self.unary(-self.value.clone(), -N::one())
    }
}

macro_rules! impl_mixed {
    ($trait:ident, $method:ident) => {
        impl<'t, N: Scalar> $trait<f64> for Adjoint<'t, N> {
            type Output = Adjoint<'t, N>;

            fn $method(self, rhs: f64) -> Adjoint<'t, N> {
                self.$method(Adjoint::constant(N::from_f64(rhs)))
            }
        }

        impl<'t, N: Scalar> $trait<Adjoint<'t, N>> for f64 {
            type Output = Adjoint<'t, N>;

            fn $method(self, rhs: Adjoint<'t, N>) -> Adjoint<'t, N> {
                Adjoint::constant(N::from_f64(self)).$method(rhs)
            }
        }
    };
}

impl_mixed!(Add, add);
impl_mixed!(Sub, sub);
impl_mixed!(Mul, mul);
impl_mixed!(Div, div);

/// Comparisons look at values only and discard derivative bookkeeping.
impl<'t, N: Scalar> PartialEq for Adjoint<'t, N> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<'t, N: Scalar> PartialOrd for Adjoint<'t, N> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.value.partial_cmp(&other.value)
    }
}

impl<'t, N: Scalar> PartialEq<f64> for Adjoint<'t, N> {
    fn eq(&self, other: &f64) -> bool {
        self.value == N::from_f64(*other)
    }
}

impl<'t, N: Scalar> PartialOrd<f64> for Adjoint<'t, N> {
    fn partial_cmp(&self, other: &f64) -> Option<Ordering> {
        self.value.partial_cmp(&N::from_f64(*other))
    }
}

impl<'t, N: Scalar> num::Zero for Adjoint<'t, N> {
    fn zero() -> Self {
        Adjoint::constant(N::zero())
    }

    fn is_zero(&self) -> bool {
        self.value.is_zero()
    }
}

impl<'t, N: Scalar> num::One for Adjoint<'t, N> {
    fn one() -> Self {
        Adjoint::constant(N::one())
    }
}

impl<'t, N: Scalar> Analytic for Adjoint<'t, N> {
    fn sin(&self) -> Self {
        self.unary(self.value.sin(), self.value.cos())
    }

    fn cos(&self) -> Self {
        self.unary(self.value.cos(), -self.value.sin())
    }

    fn exp(&self) -> Self {
        let value = self.value.exp();
        self.unary(value.clone(), value)
    }

    fn log(&self) -> Self {
        self.unary(self.value.log(), N::one() / self.value.clone())
    }

    fn sqrt(&self) -> Self {
        let value = self.value.sqrt();
        let partial = N::one() / (value.clone() * N::from_f64(2.0));
        self.unary(value, partial)
    }

    fn pow(&self, exponent: &Self) -> Self {
        let value = self.value.pow(&exponent.value);
        let left = exponent.value.clone()
            * self.value.pow(&(exponent.value.clone() - N::one()));
        let right = value.clone() * self.value.log();
        self.binary(exponent, value, left, right)
    }
}

impl<'t, N: Scalar> Scalar for Adjoint<'t, N> {
    fn from_f64(value: f64) -> Self {
        Adjoint::constant(N::from_f64(value))
    }

    fn powc(&self, c: f64) -> Self {
        let partial = self.value.powc(c - 1.0) * N::from_f64(c);
        self.unary(self.value.powc(c), partial)
    }

    fn abs(&self) -> Result<Self> {
        // The incoming adjoint is unknown until backpropagation, so a zero
        // value on a tracked scalar fails at record time.
        if self.value.is_zero() {
            if self.node.is_none() {
                return Ok(Adjoint::constant(N::zero()));
            }
            return Err(Error::not_differentiable(func_name!()));
        }
        let value = self.value.abs()?;
        let sign = self.value.clone() / value.clone();
        Ok(self.unary(value, sign))
    }
}

impl<'t, N: Scalar> std::fmt::Debug for Adjoint<'t, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Adjoint")
            .field("value", &self.value)
            .field("id", &self.node.map(|(_, id)| id))
            .finish()
    }
}

impl<'t, N: Scalar + std::fmt::Display> std::fmt::Display for Adjoint<'t, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}
