use cmlmc_optimize::regression::*;
use matrixcompare::assert_scalar_eq;
use proptest::prelude::*;

#[test]
fn fit_line_recovers_exact_line() {
    let x = [1.0, 2.0, 3.0, 4.0];
    let y: Vec<f64> = x.iter().map(|x| 3.0 * x - 2.0).collect();
    let fit = fit_line(&x, &y).unwrap();
    assert_scalar_eq!(fit.slope, 3.0, comp = abs, tol = 1e-12);
    assert_scalar_eq!(fit.intercept, -2.0, comp = abs, tol = 1e-12);
}

#[test]
fn fit_line_least_squares_of_noisy_points() {
    // Points symmetric around the line y = x, so the least-squares line is y = x
    let x = [0.0, 0.0, 1.0, 1.0];
    let y = [-1.0, 1.0, 0.0, 2.0];
    let fit = fit_line(&x, &y).unwrap();
    assert_scalar_eq!(fit.slope, 1.0, comp = abs, tol = 1e-12);
    assert_scalar_eq!(fit.intercept, 0.0, comp = abs, tol = 1e-12);
}

#[test]
fn fit_line_requires_two_distinct_abscissae() {
    assert_eq!(
        fit_line(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0]),
        Err(RegressionError::InsufficientData { distinct_points: 1 })
    );
    assert_eq!(
        fit_line::<f64>(&[], &[]),
        Err(RegressionError::InsufficientData { distinct_points: 0 })
    );
}

#[test]
fn fit_line_rejects_length_mismatch() {
    assert_eq!(
        fit_line(&[1.0, 2.0], &[1.0]),
        Err(RegressionError::LengthMismatch {
            abscissae: 2,
            ordinates: 1
        })
    );
}

#[test]
fn fit_power_law_rejects_non_positive_values() {
    let x = [25.0, 100.0, 400.0];
    assert_eq!(
        fit_power_law(&x, &[1.0, 0.0, 0.5]),
        Err(RegressionError::NonPositiveOrdinate { index: 1 })
    );
    assert_eq!(
        fit_power_law(&x, &[1.0, 0.5, -0.25]),
        Err(RegressionError::NonPositiveOrdinate { index: 2 })
    );
    assert_eq!(
        fit_power_law(&[0.0, 1.0], &[1.0, 1.0]),
        Err(RegressionError::NonPositiveAbscissa { index: 0 })
    );
    assert_eq!(
        fit_power_law(&[1.0, 2.0], &[f64::NAN, 1.0]),
        Err(RegressionError::NonPositiveOrdinate { index: 0 })
    );
}

#[test]
fn fit_power_law_with_two_points_is_exact() {
    // 0.5 = C * 100^e and 0.25 = C * 400^e gives e = -1/2 and C = 5
    let fit = fit_power_law(&[100.0, 400.0], &[0.5, 0.25]).unwrap();
    assert_scalar_eq!(fit.exponent, -0.5, comp = abs, tol = 1e-12);
    assert_scalar_eq!(fit.coefficient, 5.0, comp = abs, tol = 1e-12);
    assert_scalar_eq!(fit.evaluate(100.0), 0.5, comp = abs, tol = 1e-12);
}

proptest! {
    #[test]
    fn fit_power_law_recovers_noise_free_power_law(
        coefficient in 1e-3 .. 1e3f64,
        exponent in -3.0 .. 3.0f64,
        num_points in 2 .. 8usize,
    ) {
        let x: Vec<f64> = (0..num_points).map(|l| (5.0 * 2.0f64.powi(l as i32)).powi(2)).collect();
        let y: Vec<f64> = x.iter().map(|x| coefficient * x.powf(exponent)).collect();
        let fit = fit_power_law(&x, &y).unwrap();
        prop_assert!((fit.exponent - exponent).abs() <= 1e-8);
        prop_assert!((fit.coefficient - coefficient).abs() <= 1e-8 * coefficient);
    }
}
