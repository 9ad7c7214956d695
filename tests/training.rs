//! End-to-end training scenarios.

use histboost::metrics::{roc_auc_score, Metric};
use histboost::{BoosterConfig, DataMatrix, GradientBooster, Task};
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

/// Random regression matrix with a linear signal plus noise.
fn regression_data(n_rows: usize, n_cols: usize, seed: u64) -> DataMatrix {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut features = Vec::with_capacity(n_rows * n_cols);
    let mut labels = Vec::with_capacity(n_rows);
    for _ in 0..n_rows {
        let mut signal = 0.0_f32;
        for col in 0..n_cols {
            let v: f32 = rng.random::<f32>() * 2.0 - 1.0;
            features.push(v);
            if col < 3 {
                signal += v * (col + 1) as f32;
            }
        }
        labels.push(signal + rng.random::<f32>() * 0.1);
    }
    DataMatrix::new(features, labels, n_rows, n_cols).unwrap()
}

/// `y = 1 iff x0 * x1 > 0` with a given label-noise rate.
fn quadrant_data(n_rows: usize, noise: f32, seed: u64) -> DataMatrix {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut features = Vec::with_capacity(n_rows * 2);
    let mut labels = Vec::with_capacity(n_rows);
    for _ in 0..n_rows {
        let x0: f32 = rng.random::<f32>() * 2.0 - 1.0;
        let x1: f32 = rng.random::<f32>() * 2.0 - 1.0;
        features.push(x0);
        features.push(x1);
        let mut y = if x0 * x1 > 0.0 { 1.0 } else { 0.0 };
        if rng.random::<f32>() < noise {
            y = 1.0 - y;
        }
        labels.push(y);
    }
    DataMatrix::new(features, labels, n_rows, 2).unwrap()
}

#[test]
fn test_training_is_deterministic() {
    let data = regression_data(1000, 10, 3);
    let config = BoosterConfig {
        n_rounds: 10,
        subsample: 0.7,
        seed: 42,
        n_threads: 4,
        ..Default::default()
    };

    let mut first = GradientBooster::new(config.clone()).unwrap();
    first.fit(&data).unwrap();
    let mut second = GradientBooster::new(config).unwrap();
    second.fit(&data).unwrap();

    assert_eq!(first.base_score, second.base_score);
    assert_eq!(first.json_dump().unwrap(), second.json_dump().unwrap());
}

#[test]
fn test_thread_count_does_not_change_the_model() {
    let data = regression_data(500, 6, 11);
    let mut dumps = Vec::new();
    for n_threads in [1, 4] {
        let config = BoosterConfig {
            n_rounds: 8,
            subsample: 0.8,
            seed: 7,
            n_threads,
            ..Default::default()
        };
        let mut model = GradientBooster::new(config).unwrap();
        model.fit(&data).unwrap();
        dumps.push(model.json_dump().unwrap());
    }
    assert_eq!(dumps[0], dumps[1]);
}

#[test]
fn test_binary_end_to_end_auc() {
    let train = quadrant_data(1000, 0.1, 1);
    let test = quadrant_data(200, 0.0, 2);

    let config = BoosterConfig {
        task: Task::Binary,
        metric: Metric::AUC,
        n_rounds: 50,
        learning_rate: 0.1,
        max_depth: 4,
        min_data_in_leaf: 5,
        ..Default::default()
    };
    let mut model = GradientBooster::new(config).unwrap();
    model.fit(&train).unwrap();

    let preds = model.predict(&test).unwrap();
    let auc = roc_auc_score(test.labels(), &preds);
    assert!(auc >= 0.85, "AUC {} below 0.85", auc);
}

#[test]
fn test_save_load_predict_equality() {
    let data = regression_data(300, 5, 17);
    let config = BoosterConfig {
        n_rounds: 12,
        subsample: 0.9,
        seed: 5,
        ..Default::default()
    };
    let mut model = GradientBooster::new(config).unwrap();
    model.fit(&data).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");
    model.save_booster(&path).unwrap();
    let loaded = GradientBooster::load_booster(&path).unwrap();

    // Structural equality of the persisted form.
    assert_eq!(loaded.json_dump().unwrap(), model.json_dump().unwrap());

    // Prediction equality within 1e-6.
    let a = model.predict(&data).unwrap();
    let b = loaded.predict(&data).unwrap();
    for (x, y) in a.iter().zip(&b) {
        assert!((x - y).abs() <= 1e-6, "{} vs {}", x, y);
    }
}

#[test]
fn test_xgboost_round_trip_predicts_identically() {
    let train = quadrant_data(400, 0.05, 9);
    let config = BoosterConfig {
        task: Task::Binary,
        metric: Metric::LogLoss,
        n_rounds: 10,
        min_data_in_leaf: 5,
        ..Default::default()
    };
    let mut model = GradientBooster::new(config).unwrap();
    model.fit(&train).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.xgb.json");
    model.save_xgboost_booster(&path).unwrap();
    let loaded = GradientBooster::load_xgboost_booster(&path).unwrap();

    assert_eq!(loaded.trees.len(), model.trees.len());
    assert_eq!(loaded.config.task, Task::Binary);
    let a = model.predict(&train).unwrap();
    let b = loaded.predict(&train).unwrap();
    for (x, y) in a.iter().zip(&b) {
        assert!((x - y).abs() <= 1e-6);
    }
}

#[test]
fn test_single_tree_equivalence() {
    // With one round and unit learning rate the ensemble is exactly the
    // base score plus the tree.
    let data = regression_data(200, 4, 23);
    let config = BoosterConfig {
        n_rounds: 1,
        learning_rate: 1.0,
        min_data_in_leaf: 5,
        ..Default::default()
    };
    let mut model = GradientBooster::new(config).unwrap();
    model.fit(&data).unwrap();
    assert_eq!(model.trees.len(), 1);

    let preds = model.predict(&data).unwrap();
    for row in 0..data.n_rows() {
        let expected = model.base_score + model.trees[0].predict_row(data.get_row(row));
        assert!((preds[row] - expected).abs() <= 1e-6);
    }
}

#[test]
fn test_max_depth_is_respected() {
    let data = regression_data(500, 5, 31);
    for max_depth in [1, 3, 6] {
        let config = BoosterConfig {
            n_rounds: 5,
            max_depth,
            min_data_in_leaf: 1,
            ..Default::default()
        };
        let mut model = GradientBooster::new(config).unwrap();
        model.fit(&data).unwrap();
        for tree in &model.trees {
            assert!(tree.depth() <= max_depth);
        }
    }
}

#[test]
fn test_zero_variance_feature_is_never_split() {
    // Feature 1 is constant; no tree may reference it.
    let mut rng = StdRng::seed_from_u64(13);
    let n_rows = 300;
    let mut features = Vec::with_capacity(n_rows * 2);
    let mut labels = Vec::with_capacity(n_rows);
    for _ in 0..n_rows {
        let x: f32 = rng.random::<f32>();
        features.push(x);
        features.push(7.5);
        labels.push(x * 3.0);
    }
    let data = DataMatrix::new(features, labels, n_rows, 2).unwrap();

    let config = BoosterConfig {
        n_rounds: 10,
        min_data_in_leaf: 5,
        ..Default::default()
    };
    let mut model = GradientBooster::new(config).unwrap();
    model.fit(&data).unwrap();
    for tree in &model.trees {
        for node in &tree.nodes {
            if !node.is_leaf {
                assert_eq!(node.split_feature, 0);
            }
        }
    }
}

#[test]
fn test_missing_values_route_right_end_to_end() {
    // Train on clean data, then corrupt a feature with NaN: the prediction
    // must match the all-larger-than-threshold (right side) prediction.
    let data = regression_data(200, 3, 41);
    let config = BoosterConfig {
        n_rounds: 5,
        min_data_in_leaf: 5,
        ..Default::default()
    };
    let mut model = GradientBooster::new(config).unwrap();
    model.fit(&data).unwrap();

    let missing_row = vec![f32::NAN, f32::NAN, f32::NAN];
    let far_right = vec![f32::MAX, f32::MAX, f32::MAX];
    assert_eq!(
        model.predict_row(&missing_row).unwrap(),
        model.predict_row(&far_right).unwrap()
    );
}
