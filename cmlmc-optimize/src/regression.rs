use cmlmc_traits::Real;
use itertools::izip;
use log::debug;
use nalgebra::{DMatrix, DVector};
use numeric_literals::replace_float_literals;
use std::error::Error;
use std::fmt;
use std::fmt::Display;

/// Slope and intercept of a straight line `y = slope * x + intercept`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LinearFit<T> {
    pub slope: T,
    pub intercept: T,
}

/// A power law `y = coefficient * x^exponent`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PowerLawFit<T> {
    pub coefficient: T,
    pub exponent: T,
}

impl<T: Real> PowerLawFit<T> {
    pub fn evaluate(&self, x: T) -> T {
        self.coefficient * x.powf(self.exponent)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RegressionError {
    /// The number of abscissae and ordinates differ.
    LengthMismatch { abscissae: usize, ordinates: usize },
    /// The abscissa at the given index is not strictly positive and finite.
    NonPositiveAbscissa { index: usize },
    /// The ordinate at the given index is not strictly positive and finite.
    NonPositiveOrdinate { index: usize },
    /// The data contains fewer than two distinct abscissae, so the line is underdetermined.
    InsufficientData { distinct_points: usize },
}

impl Display for RegressionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            &RegressionError::LengthMismatch { abscissae, ordinates } => {
                write!(
                    f,
                    "Number of abscissae ({}) does not match number of ordinates ({}).",
                    abscissae, ordinates
                )
            }
            &RegressionError::NonPositiveAbscissa { index } => {
                write!(f, "Abscissa at index {} is not strictly positive.", index)
            }
            &RegressionError::NonPositiveOrdinate { index } => {
                write!(f, "Ordinate at index {} is not strictly positive.", index)
            }
            &RegressionError::InsufficientData { distinct_points } => {
                write!(
                    f,
                    "Need at least 2 distinct abscissae for a linear fit, got {}.",
                    distinct_points
                )
            }
        }
    }
}

impl Error for RegressionError {}

fn count_distinct<T: Real>(values: &[T]) -> usize {
    let mut distinct: Vec<T> = Vec::with_capacity(values.len());
    for &v in values {
        if !distinct.contains(&v) {
            distinct.push(v);
        }
    }
    distinct.len()
}

/// Ordinary least-squares fit of a straight line through the points `(x_i, y_i)`.
///
/// The fit is computed from the normal equations of the `n x 2` design matrix `[x 1]`.
pub fn fit_line<T: Real>(x: &[T], y: &[T]) -> Result<LinearFit<T>, RegressionError> {
    if x.len() != y.len() {
        return Err(RegressionError::LengthMismatch {
            abscissae: x.len(),
            ordinates: y.len(),
        });
    }

    let distinct_points = count_distinct(x);
    if distinct_points < 2 {
        return Err(RegressionError::InsufficientData { distinct_points });
    }

    let n = x.len();
    let design = DMatrix::from_fn(n, 2, |i, j| if j == 0 { x[i] } else { T::one() });
    let rhs = DVector::from_column_slice(y);

    let normal_matrix = design.tr_mul(&design);
    let normal_rhs = design.tr_mul(&rhs);
    // Abscissae that differ only by rounding can still produce a singular system
    let solution = normal_matrix
        .lu()
        .solve(&normal_rhs)
        .ok_or(RegressionError::InsufficientData { distinct_points: 1 })?;

    Ok(LinearFit {
        slope: solution[0],
        intercept: solution[1],
    })
}

/// Fits a power law `y = C * x^e` by a least-squares line through `(log2 x, log2 y)`.
///
/// The slope of the line is the exponent `e`, and the coefficient is `C = 2^intercept`.
/// All abscissae and ordinates must be strictly positive.
#[replace_float_literals(T::from_f64(literal).unwrap())]
pub fn fit_power_law<T: Real>(x: &[T], y: &[T]) -> Result<PowerLawFit<T>, RegressionError> {
    if x.len() != y.len() {
        return Err(RegressionError::LengthMismatch {
            abscissae: x.len(),
            ordinates: y.len(),
        });
    }

    let mut log_x = Vec::with_capacity(x.len());
    let mut log_y = Vec::with_capacity(y.len());
    for (index, &x_i, &y_i) in izip!(0.., x, y) {
        if !(x_i > 0.0) || !x_i.is_finite() {
            return Err(RegressionError::NonPositiveAbscissa { index });
        }
        if !(y_i > 0.0) || !y_i.is_finite() {
            return Err(RegressionError::NonPositiveOrdinate { index });
        }
        log_x.push(x_i.log2());
        log_y.push(y_i.log2());
    }

    let line = fit_line(&log_x, &log_y)?;
    debug!(
        "Power law fit in log2 space: slope {:?}, intercept {:?}",
        line.slope, line.intercept
    );

    Ok(PowerLawFit {
        coefficient: (2.0).powf(line.intercept),
        exponent: line.slope,
    })
}
