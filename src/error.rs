// Copyright (c) Facebook, Inc. and its affiliates
// SPDX-License-Identifier: MIT OR Apache-2.0

use backtrace::Backtrace;
use std::fmt::Debug;
use thiserror::Error;

/// Default error type for the crate.
#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("Derivative requested at a non-differentiable point in {name}\n{trace}")]
    NotDifferentiable { name: String, trace: String },
    #[error("Operands of {name} are recorded on different tapes\n{trace}")]
    TapeMismatch { name: String, trace: String },
    #[error("Incompatible shapes for {name}: {shapes}\n{trace}")]
    ShapeMismatch {
        name: String,
        shapes: String,
        trace: String,
    },
    #[error("Operation {name} is not supported by this operand\n{trace}")]
    UnsupportedOperation { name: String, trace: String },
}

/// Default result type for the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Computes the name of the current function.
// https://stackoverflow.com/questions/38088067/equivalent-of-func-or-function-in-rust
#[macro_export]
macro_rules! func_name {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        &name[..name.len() - 3]
    }};
}

impl Error {
    fn backtrace() -> String {
        if std::env::var("RUST_BACKTRACE").is_ok() {
            format!("{:?}", Backtrace::new())
        } else {
            String::new()
        }
    }

    /// Report a derivative that does not exist at the evaluation point.
    pub fn not_differentiable(name: &str) -> Self {
        Error::NotDifferentiable {
            name: name.to_string(),
            trace: Self::backtrace(),
        }
    }

    /// Report operands recorded on different tapes.
    pub fn tape_mismatch(name: &str) -> Self {
        Error::TapeMismatch {
            name: name.to_string(),
            trace: Self::backtrace(),
        }
    }

    /// Report incompatible shapes.
    pub fn shape_mismatch<S>(name: &str, shapes: S) -> Self
    where
        S: Debug,
    {
        Error::ShapeMismatch {
            name: name.to_string(),
            shapes: format!("{:?}", shapes),
            trace: Self::backtrace(),
        }
    }

    /// Report an operation the operand cannot support.
    pub fn unsupported_operation(name: &str) -> Self {
        Error::UnsupportedOperation {
            name: name.to_string(),
            trace: Self::backtrace(),
        }
    }
}

/// Check that all the given shapes are equal.
pub fn check_equal_shapes(name: &str, shapes: &[&[usize]]) -> Result<Vec<usize>> {
    let mut it = shapes.iter();
    if let Some(first) = it.next() {
        if it.all(|x| x == first) {
            Ok(first.to_vec())
        } else {
            Err(Error::shape_mismatch(name, shapes))
        }
    } else {
        Err(Error::shape_mismatch(name, shapes))
    }
}
