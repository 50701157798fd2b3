//! Tests for DRBM exact inference
//!
//! The closed forms are checked against brute-force enumeration over all
//! hidden spin configurations, plus the structural identities they imply.

use drbm_core::{DrbmError, InitConfig};
use drbm_models::{enumerate_moments, ConditionalEbm, DrbmModel, Matrix, ParamSet};

const TOL: f64 = 1e-10;

fn assert_close(a: f64, b: f64, tol: f64, what: &str) {
    assert!(
        (a - b).abs() <= tol * (1.0 + a.abs().max(b.abs())),
        "{}: {} vs {}",
        what,
        a,
        b
    );
}

/// A model with every parameter set to a distinct, non-trivial value.
fn random_model(xsize: usize, hsize: usize, ysize: usize, seed: u64) -> DrbmModel {
    let mut model = DrbmModel::new(xsize, hsize, ysize).expect("create model");
    model.randomize(&InitConfig {
        random: true,
        seed,
        weight_scale: 0.5,
    });
    for (j, b) in model.bias_h_mut().iter_mut().enumerate() {
        *b = 0.1 * (j as f64) - 0.15;
    }
    for (k, c) in model.bias_y_mut().iter_mut().enumerate() {
        *c = 0.2 * (k as f64).sin();
    }
    let x: Vec<f64> = (0..xsize).map(|i| ((i as f64) * 0.7).cos()).collect();
    model.set_input(&x).expect("set input");
    model
}

#[test]
fn test_closed_forms_match_enumeration() {
    for (xsize, hsize, ysize, seed) in [(2, 1, 2, 1), (3, 3, 2, 2), (2, 4, 3, 3), (4, 5, 4, 4)] {
        let model = random_model(xsize, hsize, ysize, seed);
        let exact = enumerate_moments(&model).expect("enumerate");
        let z = model.partition_div_2h();

        assert_close(model.partition_constant(), exact.partition, TOL, "partition");

        for k in 0..ysize {
            let p = model.expected_value_y_given_z(k, z).unwrap();
            assert_close(p, exact.label_probs[k], TOL, "p(y|x)");
        }
        let moments = model.moments();
        let scaled = moments.partition_div_2h * 2f64.powi(hsize as i32);
        assert_close(scaled, exact.partition, TOL, "moments z");
        for j in 0..hsize {
            assert_close(moments.hidden_means[j], exact.hidden_means[j], TOL, "moments E[h_j]");
            let h = model.expected_value_h_given_z(j, z).unwrap();
            assert_close(h, exact.hidden_means[j], TOL, "E[h_j]");
            for k in 0..ysize {
                let hy = model.expected_value_hy_given_z(j, k, z).unwrap();
                assert_close(hy, exact.hidden_label_means[j][k], TOL, "E[h_j y_k]");
            }
        }
    }
}

#[test]
fn test_no_hidden_units_reduces_to_softmax() {
    let mut model = DrbmModel::new(3, 0, 3).unwrap();
    model.bias_y_mut().copy_from_slice(&[0.5, -1.0, 2.0]);
    model.set_input(&[4.0, -2.0, 1.0]).unwrap();

    let expected_z: f64 = [0.5f64, -1.0, 2.0].iter().map(|c| c.exp()).sum();
    assert_close(model.partition_div_2h(), expected_z, TOL, "z");
    assert_close(model.partition_constant(), expected_z, TOL, "Z with H = 0");

    for (k, c) in [0.5f64, -1.0, 2.0].iter().enumerate() {
        let softmax = c.exp() / expected_z;
        assert_close(model.expected_value_y(k).unwrap(), softmax, TOL, "softmax");
    }
}

#[test]
fn test_label_probabilities_sum_to_one() {
    for seed in 0..5 {
        let model = random_model(4, 6, 5, seed);
        let z = model.partition_div_2h();
        let total: f64 = (0..5)
            .map(|k| model.expected_value_y_given_z(k, z).unwrap())
            .sum();
        assert_close(total, 1.0, 1e-12, "Σ p(y|x)");
    }
}

#[test]
fn test_hidden_expectation_bounded() {
    for seed in 0..5 {
        let mut model = random_model(3, 4, 3, seed);
        model.bias_h_mut().copy_from_slice(&[3.0, -3.0, 0.5, 8.0]);
        let z = model.partition_div_2h();
        for j in 0..4 {
            let h = model.expected_value_h_given_z(j, z).unwrap();
            assert!((-1.0..=1.0).contains(&h), "E[h_{}] = {} out of bounds", j, h);
        }
    }
}

#[test]
fn test_xh_expectation_factorizes_exactly() {
    let model = random_model(3, 3, 2, 11);
    let z = model.partition_div_2h();
    for i in 0..3 {
        for j in 0..3 {
            let xh = model.expected_value_xh_given_z(i, j, z).unwrap();
            let h = model.expected_value_h_given_z(j, z).unwrap();
            assert_eq!(xh, model.input()[i] * h);
        }
    }
}

#[test]
fn test_hidden_label_expectations_sum_to_hidden_mean() {
    let model = random_model(2, 3, 4, 5);
    let z = model.partition_div_2h();
    for j in 0..3 {
        let total: f64 = (0..4)
            .map(|k| model.expected_value_hy_given_z(j, k, z).unwrap())
            .sum();
        assert_close(total, model.expected_value_h_given_z(j, z).unwrap(), TOL, "Σ_k E[h y]");
    }
}

#[test]
fn test_zero_parameters_give_uniform_labels() {
    for ysize in 1..6 {
        let mut model = DrbmModel::new(3, 2, ysize).unwrap();
        model.set_input(&[10.0, -3.0, 0.25]).unwrap();
        for k in 0..ysize {
            assert_close(
                model.expected_value_y(k).unwrap(),
                1.0 / ysize as f64,
                1e-15,
                "uniform",
            );
        }
    }
}

#[test]
fn test_zero_model_scenario() {
    let mut model = DrbmModel::new(2, 1, 2).unwrap();
    model.set_input(&[1.0, -1.0]).unwrap();

    assert_eq!(model.cond_prob_y(0).unwrap(), 0.5);
    assert_eq!(model.cond_prob_y(1).unwrap(), 0.5);
    assert_eq!(model.expected_value_h(0).unwrap(), 0.0);
    assert_eq!(model.partition_div_2h(), 2.0);
    assert_eq!(model.partition_constant(), 4.0);
}

#[test]
fn test_repeated_queries_are_identical() {
    let model = random_model(3, 4, 3, 21);
    let z = model.partition_div_2h();
    assert_eq!(z, model.partition_div_2h());
    for k in 0..3 {
        assert_eq!(model.cond_prob_y(k).unwrap(), model.cond_prob_y(k).unwrap());
        assert_eq!(model.expected_value_y(k).unwrap(), model.expected_value_y(k).unwrap());
    }
    for j in 0..4 {
        assert_eq!(model.expected_value_h(j).unwrap(), model.expected_value_h(j).unwrap());
        assert_eq!(
            model.expected_value_hy(j, 1).unwrap(),
            model.expected_value_hy(j, 1).unwrap()
        );
        assert_eq!(
            model.expected_value_xh(2, j).unwrap(),
            model.expected_value_xh(2, j).unwrap()
        );
    }
}

#[test]
fn test_cond_prob_equals_expected_label() {
    let model = random_model(2, 3, 3, 8);
    for k in 0..3 {
        assert_eq!(model.cond_prob_y(k).unwrap(), model.expected_value_y(k).unwrap());
    }
}

#[test]
fn test_partition_tracks_parameter_changes() {
    let mut model = random_model(2, 2, 2, 3);
    let before = model.partition_div_2h();
    model.bias_y_mut()[0] += 1.0;
    let after = model.partition_div_2h();
    assert!(after > before, "raising a label bias must raise z");

    model.set_input(&[0.0, 0.0]).unwrap();
    assert_ne!(model.partition_div_2h(), after);
}

#[test]
fn test_energy_by_hand() {
    let mut model = DrbmModel::new(2, 2, 2).unwrap();
    model
        .set_params(ParamSet::new(
            vec![0.5, -0.5],
            vec![0.25, 0.0],
            Matrix::from_rows(&[vec![1.0, 0.0], vec![0.0, 2.0]]).unwrap(),
            Matrix::from_rows(&[vec![0.1, 0.2], vec![0.3, 0.4]]).unwrap(),
        ))
        .unwrap();
    model.set_input(&[1.0, 1.0]).unwrap();

    // -(c_0 + h_0 (b_0 + V_00 + W_00) + h_1 (b_1 + V_10 + W_11))
    // = -(0.25 + 1.6 - 1.8)
    let e = model.energy(&[1.0, -1.0], 0).unwrap();
    assert_close(e, -0.05, 1e-12, "energy");
}

#[test]
fn test_energy_rejects_bad_shapes() {
    let model = DrbmModel::new(2, 2, 2).unwrap();
    assert!(matches!(
        model.energy(&[1.0], 0),
        Err(DrbmError::InvalidDimension { .. })
    ));
    assert!(matches!(
        model.energy(&[1.0, 1.0], 2),
        Err(DrbmError::IndexOutOfRange { .. })
    ));
}

#[test]
fn test_predict_sets_input_and_picks_argmax() {
    let mut model = DrbmModel::new(1, 1, 2).unwrap();
    // Positive input pushes toward label 1, negative toward label 0
    model.weight_xh_mut()[(0, 0)] = 2.0;
    model
        .weight_hy_mut()
        .copy_from(&Matrix::from_rows(&[vec![-1.0, 1.0]]).unwrap())
        .unwrap();
    assert_eq!(model.predict(&[1.0]).unwrap(), 1);
    assert_eq!(model.input(), &[1.0]);
    assert_eq!(model.predict(&[-1.0]).unwrap(), 0);
    assert!(model.predict(&[1.0, 2.0]).is_err());
}

#[test]
fn test_set_params_checks_shape() {
    let mut model = DrbmModel::new(2, 3, 2).unwrap();
    let other = DrbmModel::new(2, 2, 2).unwrap();
    assert!(matches!(
        model.set_params(other.params().clone()),
        Err(DrbmError::InvalidDimension { .. })
    ));
}

#[test]
fn test_resizing_only_through_checked_replacement() {
    let mut model = DrbmModel::new(2, 2, 2).unwrap();
    let wide = ParamSet::new(
        vec![0.0; 2],
        vec![0.0; 2],
        Matrix::from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap(),
        Matrix::zeros(2, 2),
    );
    assert!(matches!(
        model.set_params(wide),
        Err(DrbmError::InvalidDimension { .. })
    ));
    assert!(model
        .weight_xh_mut()
        .copy_from(&Matrix::from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap())
        .is_err());
    assert_eq!(model.local_field(1, 0).unwrap(), 0.0);

    model.bias_h_mut()[1] = 0.5;
    assert_eq!(model.bias_h().len(), 2);
    assert_close(model.local_field(1, 0).unwrap(), 0.5, 1e-15, "mu_10");
    assert_close(model.cond_prob_y(0).unwrap(), 0.5, 1e-15, "p(y=0)");
}
