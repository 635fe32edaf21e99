use cmlmc::allocation::{allocate_samples, optimal_sample_counts};
use cmlmc::rates::RateModel;
use proptest::prelude::*;

const NUM_DOFS: [f64; 5] = [25.0, 100.0, 400.0, 1600.0, 6400.0];
const BAYES: [f64; 2] = [0.05, 0.01];

fn rates() -> RateModel {
    RateModel {
        c_alpha: 1.0,
        alpha: 0.5,
        c_beta: 1.0,
        beta: 1.0,
        c_cost: 1.0,
        gamma: 1.0,
    }
}

#[test]
fn optimal_counts_closed_form() {
    // 400 * sqrt(V_l / C_l) * (sqrt(1.25) + 1) = [37.89, 8.47]
    let counts = optimal_sample_counts(1, &BAYES, &rates(), 0.5, 0.1, &NUM_DOFS, 1.0);
    assert_eq!(counts, vec![38, 9]);
}

#[test]
fn small_increases_are_raised_to_minimum_batch() {
    let allocation = allocate_samples(1, &BAYES, &rates(), 0.5, 0.1, &NUM_DOFS, 1.0, &[30, 5], 6);
    assert_eq!(allocation.previous, vec![30, 5]);
    assert_eq!(allocation.delta, vec![8, 6]);
    assert_eq!(allocation.counts, vec![38, 11]);
    assert_eq!(allocation.total_new_samples(), 14);
}

#[test]
fn counts_never_decrease() {
    let allocation = allocate_samples(1, &BAYES, &rates(), 0.5, 0.1, &NUM_DOFS, 1.0, &[40, 9], 6);
    assert_eq!(allocation.delta, vec![0, 0]);
    assert_eq!(allocation.counts, vec![40, 9]);
}

#[test]
fn new_level_is_activated() {
    let allocation = allocate_samples(1, &BAYES, &rates(), 0.5, 0.1, &NUM_DOFS, 1.0, &[100], 6);
    assert_eq!(allocation.previous, vec![100, 0]);
    assert_eq!(allocation.delta, vec![0, 9]);

    // Optimal count of the new level is below the minimum batch
    let allocation = allocate_samples(1, &[0.05, 1e-6], &rates(), 0.5, 0.1, &NUM_DOFS, 1.0, &[100], 6);
    assert_eq!(allocation.delta, vec![0, 6]);
}

proptest! {
    #[test]
    fn allocation_is_monotone_with_minimum_batch(
        current in prop::collection::vec(0 .. 200usize, 0 .. 5),
        bayes in prop::collection::vec(1e-6 .. 1.0f64, 5),
        theta in 0.05 .. 0.95f64,
        tolerance in 0.01 .. 0.5f64,
        l_opt in 0 .. 5usize,
        min_batch in 1 .. 10usize,
    ) {
        let allocation =
            allocate_samples(l_opt, &bayes, &rates(), theta, tolerance, &NUM_DOFS, 1.0, &current, min_batch);

        prop_assert_eq!(allocation.counts.len(), l_opt + 1);
        for level in 0 ..= l_opt {
            let previous = current.get(level).copied().unwrap_or(0);
            prop_assert_eq!(allocation.previous[level], previous);
            prop_assert!(allocation.counts[level] >= previous);
            prop_assert_eq!(allocation.counts[level], previous + allocation.delta[level]);
            prop_assert!(allocation.delta[level] == 0 || allocation.delta[level] >= min_batch);
            if previous == 0 {
                prop_assert!(allocation.delta[level] >= min_batch);
            }
        }
    }
}
