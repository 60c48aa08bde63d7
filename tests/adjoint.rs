// Copyright (c) Facebook, Inc. and its affiliates
// SPDX-License-Identifier: MIT OR Apache-2.0

use tad::prelude::*;

fn assert_near(x: f64, y: f64) {
    assert!((x - y).abs() < 1e-12, "{} is not near {}", x, y);
}

#[test]
fn test_add() -> Result<()> {
    let tape = Tape::new();
    let a = tape.lift(1.0f64);
    let b = tape.lift(2.0f64);
    let c = a.clone() + b.clone();
    assert_near(*c.value(), 3.0);
    tape.seed(c.id()?, 1.0)?;
    tape.backpropagate()?;
    assert_near(a.adjoint()?, 1.0);
    assert_near(b.adjoint()?, 1.0);
    Ok(())
}

#[test]
fn test_sub() -> Result<()> {
    let tape = Tape::new();
    let a = tape.lift(1.0f64);
    let b = tape.lift(2.0f64);
    let c = a.clone() - b.clone();
    assert_near(*c.value(), -1.0);
    tape.seed(c.id()?, 1.0)?;
    tape.backpropagate()?;
    assert_near(a.adjoint()?, 1.0);
    assert_near(b.adjoint()?, -1.0);
    Ok(())
}

#[test]
fn test_mul() -> Result<()> {
    let tape = Tape::new();
    let a = tape.lift(1.0f64);
    let b = tape.lift(2.0f64);
    let c = a.clone() * b.clone();
    assert_near(*c.value(), 2.0);
    tape.seed(c.id()?, 1.0)?;
    tape.backpropagate()?;
    assert_near(a.adjoint()?, 2.0);
    assert_near(b.adjoint()?, 1.0);
    Ok(())
}

#[test]
fn test_div() -> Result<()> {
    let tape = Tape::new();
    let a = tape.lift(3.0f64);
    let b = tape.lift(2.0f64);
    let c = a.clone() / b.clone();
    assert_near(*c.value(), 1.5);
    tape.seed(c.id()?, 1.0)?;
    tape.backpropagate()?;
    assert_near(a.adjoint()?, 0.5);
    assert_near(b.adjoint()?, -3.0 / 4.0);
    Ok(())
}

#[test]
fn test_neg_and_identity() -> Result<()> {
    let tape = Tape::new();
    let a = tape.lift(3.0f64);
    let c = -a.clone();
    assert_near(*c.value(), -3.0);
    tape.seed(c.id()?, 1.0)?;
    tape.backpropagate()?;
    assert_near(a.adjoint()?, -1.0);
    tape.reset();

    let c = a.identity();
    assert_near(*c.value(), 3.0);
    tape.seed(c.id()?, 1.0)?;
    tape.backpropagate()?;
    assert_near(a.adjoint()?, 1.0);
    Ok(())
}

#[test]
fn test_pow() -> Result<()> {
    let tape = Tape::new();
    let a = tape.lift(2.0f64);
    let b = tape.lift(3.0f64);
    let c = a.pow(&b);
    assert_near(*c.value(), 8.0);
    tape.seed(c.id()?, 1.0)?;
    tape.backpropagate()?;
    assert_near(a.adjoint()?, 12.0);
    assert_near(b.adjoint()?, 8.0 * 2f64.ln());
    Ok(())
}

#[test]
fn test_pow_with_constant_base() -> Result<()> {
    // d(c^a) = c^a log(c)
    let tape = Tape::new();
    let x = tape.lift(3.0f64);
    let c = Adjoint::constant(2.0).pow(&x);
    assert_near(*c.value(), 8.0);
    tape.seed(c.id()?, 1.0)?;
    tape.backpropagate()?;
    assert_near(x.adjoint()?, 8.0 * 2f64.ln());
    Ok(())
}

#[test]
fn test_powc_negative_base() -> Result<()> {
    let tape = Tape::new();
    let a = tape.lift(-2.0f64);
    let c = a.powc(2.0);
    assert_near(*c.value(), 4.0);
    tape.seed(c.id()?, 1.0)?;
    tape.backpropagate()?;
    assert_near(a.adjoint()?, -4.0);
    Ok(())
}

#[test]
fn test_elementary_functions() -> Result<()> {
    let tape = Tape::new();
    let x = tape.lift(0.7f64);

    let c = sin(&x);
    assert_near(*c.value(), 0.7f64.sin());
    tape.seed(c.id()?, 1.0)?;
    tape.backpropagate()?;
    assert_near(x.adjoint()?, 0.7f64.cos());
    tape.reset();

    let c = exp(&x);
    tape.seed(c.id()?, 1.0)?;
    tape.backpropagate()?;
    assert_near(x.adjoint()?, 0.7f64.exp());
    tape.reset();

    let c = log(&x);
    tape.seed(c.id()?, 1.0)?;
    tape.backpropagate()?;
    assert_near(x.adjoint()?, 1.0 / 0.7);
    tape.reset();

    let c = sqrt(&x);
    tape.seed(c.id()?, 1.0)?;
    tape.backpropagate()?;
    assert_near(x.adjoint()?, 1.0 / (2.0 * 0.7f64.sqrt()));
    Ok(())
}

#[test]
fn test_seed_direction_scales_adjoints() -> Result<()> {
    let tape = Tape::new();
    let a = tape.lift(1.0f64);
    let b = tape.lift(2.0f64);
    let c = a.clone() * b.clone();
    let direction = 1.7;
    tape.seed(c.id()?, direction)?;
    tape.backpropagate()?;
    assert_near(a.adjoint()?, 2.0 * direction);
    assert_near(b.adjoint()?, 1.0 * direction);
    Ok(())
}

#[test]
fn test_fanout_accumulates() -> Result<()> {
    // The same node used twice receives two contributions.
    let tape = Tape::new();
    let x = tape.lift(3.0f64);
    let y = x.clone() * x.clone();
    tape.seed(y.id()?, 1.0)?;
    tape.backpropagate()?;
    assert_near(x.adjoint()?, 6.0);
    Ok(())
}

#[test]
fn test_gradient_by_hand() -> Result<()> {
    // f(x, y) = sin(x) * y - x at (1, 3).
    let tape = Tape::new();
    let x = tape.lift(1.0f64);
    let y = tape.lift(3.0f64);
    let f = sin(&x) * y.clone() - x.clone();
    tape.seed(f.id()?, 1.0)?;
    tape.backpropagate()?;
    assert_near(x.adjoint()?, 1f64.cos() * 3.0 - 1.0);
    assert_near(y.adjoint()?, 1f64.sin());
    Ok(())
}

#[test]
fn test_reset_is_idempotent() -> Result<()> {
    let tape = Tape::new();
    let a = tape.lift(3.0f64);
    let b = tape.lift(2.0f64);
    let c = a.clone() / b.clone();
    tape.seed(c.id()?, 1.0)?;
    tape.backpropagate()?;
    let first = (a.adjoint()?, b.adjoint()?);

    tape.reset();
    assert_near(a.adjoint()?, 0.0);
    assert_near(b.adjoint()?, 0.0);

    tape.seed(c.id()?, 1.0)?;
    tape.backpropagate()?;
    assert_near(a.adjoint()?, first.0);
    assert_near(b.adjoint()?, first.1);
    Ok(())
}

#[test]
fn test_constants_stay_off_the_tape() -> Result<()> {
    let tape = Tape::new();
    let a = tape.lift(2.0f64);
    let before = tape.len();
    let c = a.clone() * 3.0;
    assert_eq!(tape.len(), before + 1);
    assert_near(*c.value(), 6.0);

    // Arithmetic between constants records nothing.
    let k = Adjoint::constant(2.0f64) * Adjoint::constant(4.0);
    assert!(k.is_constant());
    assert_near(*k.value(), 8.0);
    assert_eq!(tape.len(), before + 1);

    tape.seed(c.id()?, 1.0)?;
    tape.backpropagate()?;
    assert_near(a.adjoint()?, 3.0);
    Ok(())
}

#[test]
fn test_mixed_constant_both_orders() -> Result<()> {
    let tape = Tape::new();
    let x = tape.lift(4.0f64);
    let c = 2.0 / x.clone();
    assert_near(*c.value(), 0.5);
    tape.seed(c.id()?, 1.0)?;
    tape.backpropagate()?;
    assert_near(x.adjoint()?, -2.0 / 16.0);
    tape.reset();

    let c = 2.0 - x.clone();
    tape.seed(c.id()?, 1.0)?;
    tape.backpropagate()?;
    assert_near(x.adjoint()?, -1.0);
    Ok(())
}

#[test]
fn test_constant_id_is_unsupported() {
    let k = Adjoint::constant(1.0f64);
    match k.id() {
        Err(Error::UnsupportedOperation { .. }) => (),
        other => panic!("unexpected result: {:?}", other),
    }
    assert_near(k.adjoint().unwrap(), 0.0);
}

#[test]
fn test_foreign_id_is_a_tape_mismatch() -> Result<()> {
    let tape = Tape::new();
    let other = Tape::new();
    let a = tape.lift(1.0f64);
    let _ = other.lift(1.0f64);
    match other.seed(a.id()?, 1.0) {
        Err(Error::TapeMismatch { .. }) => (),
        result => panic!("unexpected result: {:?}", result),
    }
    match other.adjoint(a.id()?) {
        Err(Error::TapeMismatch { .. }) => Ok(()),
        result => panic!("unexpected result: {:?}", result),
    }
}

#[test]
#[should_panic]
fn test_crossing_tapes_in_an_operator_panics() {
    let tape = Tape::new();
    let other = Tape::new();
    let a = tape.lift(1.0f64);
    let b = other.lift(2.0f64);
    let _ = a + b;
}

#[test]
fn test_abs() -> Result<()> {
    let tape = Tape::new();
    let x = tape.lift(-2.0f64);
    let c = x.abs()?;
    assert_near(*c.value(), 2.0);
    tape.seed(c.id()?, 1.0)?;
    tape.backpropagate()?;
    assert_near(x.adjoint()?, -1.0);

    let zero = tape.lift(0.0f64);
    match zero.abs() {
        Err(Error::NotDifferentiable { .. }) => (),
        other => panic!("unexpected result: {:?}", other),
    }

    // Constants carry no derivative, so their kink is harmless.
    let k = Adjoint::constant(0.0f64).abs()?;
    assert!(k.is_constant());
    Ok(())
}

#[test]
fn test_comparisons_discard_bookkeeping() {
    let tape = Tape::new();
    let a = tape.lift(1.0f64);
    let b = tape.lift(2.0f64);
    assert!(a < b);
    assert!(b >= a);
    assert_eq!(a, Adjoint::constant(1.0));
    assert!(a < 1.5);
    assert!(b > 1.5);
    assert_eq!(b, 2.0);
}
