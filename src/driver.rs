// Copyright (c) Facebook, Inc. and its affiliates
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    error::{check_equal_shapes, Result},
    scalar::Scalar,
    tangent::Tangent,
    tape::Tape,
};
use ndarray::{arr0, Array1, ArrayD, IxDyn};

/// A differentiable program: ordinary numeric code written once against the
/// [`Scalar`] capabilities and evaluated with plain floats, tangents,
/// adjoints, or nestings of the two.
///
/// Inputs and outputs are dynamic-dimensional arrays; a zero-dimensional
/// array plays the role of a scalar.
pub trait Program {
    fn eval<N: Scalar>(&self, x: &ArrayD<N>) -> Result<ArrayD<N>>;
}

impl<'a, P: Program + ?Sized> Program for &'a P {
    fn eval<N: Scalar>(&self, x: &ArrayD<N>) -> Result<ArrayD<N>> {
        (**self).eval(x)
    }
}

/// Convenience entry points for evaluating a program, or a derivative of
/// one, at plain floating-point inputs.
pub trait ProgramExt: Program {
    /// Evaluate at an n-dimensional point.
    fn at(&self, x: &ArrayD<f64>) -> Result<ArrayD<f64>> {
        self.eval(x)
    }

    /// Evaluate at a single scalar, passed as a zero-dimensional array.
    fn at_scalar(&self, x: f64) -> Result<ArrayD<f64>> {
        self.eval(&arr0(x).into_dyn())
    }

    /// Evaluate at a one-dimensional sequence of scalars.
    fn at_slice(&self, x: &[f64]) -> Result<ArrayD<f64>> {
        self.eval(&Array1::from(x.to_vec()).into_dyn())
    }
}

impl<P: Program + ?Sized> ProgramExt for P {}

/// The Jacobian of `f: R^{s_x} -> R^{s_y}` has shape `s_y ++ s_x`.
fn concat_shape(outputs: &[usize], inputs: &[usize]) -> Vec<usize> {
    outputs.iter().chain(inputs.iter()).copied().collect()
}

fn seed_direction<B: Scalar>(inputs: &mut ArrayD<Tangent<B>>, index: usize, seed: B) {
    let slots = inputs
        .as_slice_mut()
        .expect("lifted inputs are freshly allocated in standard layout");
    slots[index].set_derivative(seed);
}

/// Evaluate the Jacobian of `program` at `x` by forward-mode (tangent)
/// differentiation: one evaluation of the program per input coordinate.
///
/// The driver is generic over the base scalar `B` so that it can run inside
/// another differentiation pass.
pub fn forward_jacobian<B, F>(program: &F, x: &ArrayD<B>) -> Result<ArrayD<B>>
where
    B: Scalar,
    F: Program + ?Sized,
{
    let mut inputs: ArrayD<Tangent<B>> = x.map(|v| Tangent::constant(v.clone()));
    let input_count = inputs.len();
    let input_shape = x.shape().to_vec();
    if input_count == 0 {
        let outputs = program.eval(&inputs)?;
        let shape = concat_shape(outputs.shape(), &input_shape);
        return Ok(ArrayD::from_elem(IxDyn(&shape), B::zero()));
    }
    let mut output_shape = Vec::new();
    let mut jacobian: Option<ArrayD<B>> = None;
    for i in 0..input_count {
        seed_direction(&mut inputs, i, B::one());
        let outputs = program.eval(&inputs)?;
        seed_direction(&mut inputs, i, B::zero());
        match jacobian.as_ref() {
            None => {
                output_shape = outputs.shape().to_vec();
                let shape = concat_shape(&output_shape, &input_shape);
                jacobian = Some(ArrayD::from_elem(IxDyn(&shape), B::zero()));
            }
            Some(_) => {
                check_equal_shapes(func_name!(), &[output_shape.as_slice(), outputs.shape()])?;
            }
        }
        let jacobian = jacobian.as_mut().expect("allocated on the first pass");
        let slots = jacobian
            .as_slice_mut()
            .expect("jacobians are freshly allocated in standard layout");
        for (j, output) in outputs.iter().enumerate() {
            slots[j * input_count + i] = output.derivative().clone();
        }
    }
    Ok(jacobian.expect("at least one input coordinate was seeded"))
}

/// Evaluate the Jacobian of `program` at `x` by reverse-mode (adjoint)
/// differentiation: one evaluation of the program, then one backpropagation
/// per output coordinate. The tape is reused across output seedings, with a
/// reset in between.
pub fn reverse_jacobian<B, F>(program: &F, x: &ArrayD<B>) -> Result<ArrayD<B>>
where
    B: Scalar,
    F: Program + ?Sized,
{
    let tape: Tape<B> = Tape::new();
    let inputs = x.map(|v| tape.lift(v.clone()));
    let outputs = program.eval(&inputs)?;
    let input_count = inputs.len();
    let shape = concat_shape(outputs.shape(), x.shape());
    let mut jacobian = ArrayD::from_elem(IxDyn(&shape), B::zero());
    for (j, output) in outputs.iter().enumerate() {
        if output.is_constant() {
            // Constant outputs contribute a zero row.
            continue;
        }
        tape.seed(output.id()?, B::one())?;
        tape.backpropagate()?;
        let slots = jacobian
            .as_slice_mut()
            .expect("jacobians are freshly allocated in standard layout");
        for (i, input) in inputs.iter().enumerate() {
            slots[j * input_count + i] = input.adjoint()?;
        }
        tape.reset();
    }
    Ok(jacobian)
}

/// Forward-mode differentiation of a program, as a program itself:
/// applying it evaluates the Jacobian, nesting it differentiates again.
pub struct Forward<F> {
    program: F,
}

/// Reverse-mode differentiation of a program, as a program itself:
/// applying it evaluates the Jacobian, nesting it differentiates again.
pub struct Reverse<F> {
    program: F,
}

impl<F: Program> Program for Forward<F> {
    fn eval<N: Scalar>(&self, x: &ArrayD<N>) -> Result<ArrayD<N>> {
        forward_jacobian(&self.program, x)
    }
}

impl<F: Program> Program for Reverse<F> {
    fn eval<N: Scalar>(&self, x: &ArrayD<N>) -> Result<ArrayD<N>> {
        reverse_jacobian(&self.program, x)
    }
}

/// Forward-mode differentiation: the function `x -> J(x)`.
/// One forward pass per input coordinate; preferable when the input
/// dimension is small.
pub fn derfor<F: Program>(program: F) -> Forward<F> {
    Forward { program }
}

/// Reverse-mode differentiation: the function `x -> J(x)`.
/// One forward pass plus one backpropagation per output coordinate;
/// preferable for scalar-valued cost functions.
pub fn derrev<F: Program>(program: F) -> Reverse<F> {
    Reverse { program }
}

/// The derivative of `program`, computed in forward mode.
pub fn derivative<F: Program>(program: F) -> Forward<F> {
    derfor(program)
}

/// The gradient of `program`, computed in reverse mode.
pub fn gradient<F: Program>(program: F) -> Reverse<F> {
    derrev(program)
}

/// The Hessian of `program`: forward-mode differentiation of the
/// reverse-mode gradient.
pub fn hessian<F: Program>(program: F) -> Forward<Reverse<F>> {
    derfor(derrev(program))
}
