// Copyright (c) Facebook, Inc. and its affiliates
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Tangent and Adjoint Differentiation (TAD)
//!
//! This library computes exact derivatives of numerical programs by operator
//! overloading: no symbolic manipulation, no finite differences, no source
//! rewriting. A program written once against the generic [`Scalar`]
//! capability can be evaluated with plain floats, with forward-mode tangent
//! scalars, with reverse-mode adjoint scalars recording onto a tape, or with
//! nestings of the two for higher-order derivatives.
//!
//! ## Design Principles
//!
//! * The reverse-mode tape is an explicit value. Adjoint scalars reference
//! the tape that records them; there is no implicit "current tape" and no
//! global state. Nested differentiation simply uses several tapes at once.
//!
//! * The tape is a contiguous arena. Dependencies name their parents by
//! integer ids into the arena, so the computation DAG has no ownership
//! cycles and backpropagation is a backward linear scan.
//!
//! * Operators dispatch on capabilities, not on a concrete numeric type.
//! The free functions [`sin`], [`cos`], [`exp`], [`log`] and [`sqrt`] prefer
//! an operand-supplied implementation and fall back to the plain
//! floating-point one, so user formulas run unchanged outside of a
//! differentiation context.
//!
//! * Fallible operations return a [`Result`]; partially built Jacobians are
//! never returned. Floating-point `NaN` and `Inf` are not errors and
//! propagate through derivatives like through any other numerical code.
//!
//! ## Quick Start
//!
//! A differentiable program implements [`Program`] over dynamic-dimensional
//! arrays ([`ndarray::ArrayD`]); a zero-dimensional array plays the role of
//! a scalar. The wrappers [`derivative`] (forward mode), [`gradient`]
//! (reverse mode) and [`hessian`] (forward over reverse) turn a program into
//! the function that evaluates its Jacobian.
//!
//! ```
//! use tad::prelude::*;
//! use ndarray::{array, ArrayD};
//!
//! struct Norm2;
//!
//! impl Program for Norm2 {
//!     fn eval<N: Scalar>(&self, x: &ArrayD<N>) -> Result<ArrayD<N>> {
//!         let y = x[[0]].clone() * x[[0]].clone() + x[[1]].clone() * x[[1]].clone();
//!         Ok(ndarray::arr0(y).into_dyn())
//!     }
//! }
//!
//! fn main() -> Result<()> {
//!     let df = gradient(Norm2);
//!     let j = df.at(&array![3.0, 4.0].into_dyn())?;
//!     assert_eq!(j[[0]], 6.0);
//!     assert_eq!(j[[1]], 8.0);
//!     Ok(())
//! }
//! ```
//!
//! The Jacobian of `f: R^{s_x} -> R^{s_y}` has shape `s_y ++ s_x`: a scalar
//! for scalar input and output, the gradient vector for a scalar-valued
//! function of a vector, a matrix for vector input and output.
//!
//! ## Recording on a Tape by Hand
//!
//! The drivers above cover the common cases. The tape can also be operated
//! directly: lift inputs, run the computation, seed an output adjoint and
//! backpropagate.
//!
//! ```
//! use tad::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let tape = Tape::new();
//!     let a = tape.lift(1.0f64);
//!     let b = tape.lift(2.0f64);
//!     let c = a.clone() * b.clone();
//!     tape.seed(c.id()?, 1.0)?;
//!     tape.backpropagate()?;
//!     assert_eq!(a.adjoint()?, 2.0);
//!     assert_eq!(b.adjoint()?, 1.0);
//!     Ok(())
//! }
//! ```
//!
//! ## Higher-Order Differentials
//!
//! Differentiation wrappers are programs themselves, so they nest. The four
//! compositions of the two modes agree on the Hessian of a scalar-valued
//! function; [`hessian`] picks forward-over-reverse.
//!
//! ```
//! use tad::prelude::*;
//! use ndarray::{array, ArrayD};
//!
//! struct Cubic;
//!
//! impl Program for Cubic {
//!     fn eval<N: Scalar>(&self, x: &ArrayD<N>) -> Result<ArrayD<N>> {
//!         let y = x[[0]].clone() * x[[0]].clone() * x[[1]].clone();
//!         Ok(ndarray::arr0(y).into_dyn())
//!     }
//! }
//!
//! fn main() -> Result<()> {
//!     let h = hessian(Cubic).at(&array![1.0, 2.0].into_dyn())?;
//!     assert_eq!(h[[0, 0]], 4.0);
//!     assert_eq!(h[[0, 1]], 2.0);
//!     assert_eq!(h[[1, 0]], 2.0);
//!     assert_eq!(h[[1, 1]], 0.0);
//!     Ok(())
//! }
//! ```
//!
//! Nesting works because no code path assumes a value or a partial
//! derivative is a plain float: a tangent of adjoints carries adjoint
//! components, an adjoint of tangents records tangent-valued partials, and
//! all arithmetic goes through the same capability traits.
//!
//! ## Choosing a Mode
//!
//! Forward mode runs the program once per input coordinate and is preferable
//! when inputs are few. Reverse mode runs the program once, then
//! backpropagates once per output coordinate, which is the right trade-off
//! for scalar cost functions of many inputs. Both assemble the same
//! Jacobian.

/// Convenient prelude.
/// For testing and external use only.
pub mod prelude {
    pub use crate::{
        adjoint::Adjoint,
        analytic::{cos, exp, log, sin, sqrt, Analytic},
        driver::{
            derfor, derivative, derrev, forward_jacobian, gradient, hessian, reverse_jacobian,
            Forward, Program, ProgramExt, Reverse,
        },
        error::{check_equal_shapes, Error, Result},
        func_name,
        scalar::Scalar,
        tangent::Tangent,
        tape::{NodeId, Tape},
    };
}

/// Error and result types.
#[macro_use]
pub mod error;

/// Elementary math dispatch: free functions that prefer an operand-supplied
/// implementation and fall back to the plain floating-point one.
pub mod analytic;

/// The number-like capability implemented by plain floats and by both AD
/// scalar kinds.
pub mod scalar;

/// Forward-mode (tangent) scalars.
pub mod tangent;

/// The tape: append-only, order-preserving record of adjoint operations.
pub mod tape;

/// Reverse-mode (adjoint) scalars.
pub mod adjoint;

/// Jacobian drivers and the user-facing differentiation wrappers.
pub mod driver;

pub use crate::adjoint::Adjoint;
pub use crate::analytic::{cos, exp, log, sin, sqrt, Analytic};
pub use crate::driver::{
    derfor, derivative, derrev, gradient, hessian, Forward, Program, ProgramExt, Reverse,
};
pub use crate::error::{Error, Result};
pub use crate::scalar::Scalar;
pub use crate::tangent::Tangent;
pub use crate::tape::{NodeId, Tape};
