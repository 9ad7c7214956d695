//! The gradient booster: training loop, prediction, cross-validation.

use crate::binning::BinnedMatrix;
use crate::config::{BoosterConfig, Task};
use crate::data::DataMatrix;
use crate::errors::HistBoostError;
use crate::metrics::metric_callable;
use crate::sampler::{RandomSampler, Sampler};
use crate::tree::Tree;
use crate::utils::sigmoid;
use log::info;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use rayon::ThreadPool;
use std::time::Instant;

/// An additive ensemble of regression trees over a scalar base score.
#[derive(Debug, Clone)]
pub struct GradientBooster {
    pub config: BoosterConfig,
    pub base_score: f32,
    pub trees: Vec<Tree>,
}

impl GradientBooster {
    /// Create an untrained booster, rejecting out-of-range options up
    /// front.
    pub fn new(config: BoosterConfig) -> Result<Self, HistBoostError> {
        config.validate()?;
        Ok(GradientBooster {
            config,
            base_score: 0.0,
            trees: Vec::new(),
        })
    }

    fn build_pool(&self) -> ThreadPool {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.resolved_threads())
            .build()
            .expect("failed to build thread pool")
    }

    /// Fit the ensemble to a labelled matrix.
    pub fn fit(&mut self, data: &DataMatrix) -> Result<(), HistBoostError> {
        if data.n_rows() == 0 {
            return Err(HistBoostError::EmptyDataset("rows".to_string()));
        }
        if data.n_cols() == 0 {
            return Err(HistBoostError::EmptyDataset("columns".to_string()));
        }
        if !data.has_labels() {
            return Err(HistBoostError::MissingLabels);
        }

        let start = Instant::now();
        let pool = self.build_pool();
        let binned = BinnedMatrix::create_bins(data, self.config.n_bins)?;
        let objective = self.config.task.objective();
        let y = data.labels();

        self.trees.clear();
        self.trees.reserve(self.config.n_rounds);
        self.base_score = objective.initial_value(y);

        let mut yhat = vec![self.base_score; data.n_rows()];
        let mut grad = vec![0.0_f32; data.n_rows()];
        let mut hess = vec![0.0_f32; data.n_rows()];
        pool.install(|| objective.gradient(y, &yhat, &mut grad, &mut hess));

        // One RNG stream for the whole run; rounds draw from it in order.
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut sampler = RandomSampler::new(self.config.subsample);
        let all_rows: Vec<u32> = (0..data.n_rows() as u32).collect();

        let metric_fn = metric_callable(self.config.metric);

        for round in 0..self.config.n_rounds {
            let rows = if self.config.subsample < 1.0 {
                sampler.sample(&mut rng, &all_rows).0
            } else {
                all_rows.clone()
            };

            let mut tree = Tree::new();
            tree.fit(data, &binned, &grad, &hess, rows, &self.config, &pool);

            // Every row receives the new tree's contribution, sampled or
            // not.
            let contributions = tree.predict(data, &pool);
            for (yhat_, contrib) in yhat.iter_mut().zip(&contributions) {
                *yhat_ += self.config.learning_rate * contrib;
            }

            pool.install(|| objective.gradient(y, &yhat, &mut grad, &mut hess));

            let eval = metric_fn(y, &yhat);
            info!("round {}: {} = {}", round, self.config.metric, eval);

            self.trees.push(tree);
        }

        info!(
            "Finished training a booster with {} trees in {:.2} seconds.",
            self.trees.len(),
            start.elapsed().as_secs_f32()
        );
        Ok(())
    }

    /// Raw ensemble scores, before any link function.
    fn predict_raw(&self, data: &DataMatrix, pool: &ThreadPool) -> Vec<f32> {
        pool.install(|| {
            (0..data.n_rows())
                .into_par_iter()
                .map(|row| self.predict_row_raw(data.get_row(row)))
                .collect()
        })
    }

    #[inline]
    fn predict_row_raw(&self, row: &[f32]) -> f32 {
        let mut score = self.base_score;
        for tree in &self.trees {
            score += self.config.learning_rate * tree.predict_row(row);
        }
        score
    }

    /// Predict a batch of rows. Binary tasks return probabilities,
    /// regression returns raw scores.
    pub fn predict(&self, data: &DataMatrix) -> Result<Vec<f32>, HistBoostError> {
        if self.trees.is_empty() {
            return Err(HistBoostError::UntrainedModel);
        }
        let pool = self.build_pool();
        let mut preds = self.predict_raw(data, &pool);
        if self.config.task == Task::Binary {
            preds.iter_mut().for_each(|p| *p = sigmoid(*p));
        }
        Ok(preds)
    }

    /// Predict a single row. The slice must hold one value per training
    /// feature, missing entries as NaN.
    pub fn predict_row(&self, row: &[f32]) -> Result<f32, HistBoostError> {
        if self.trees.is_empty() {
            return Err(HistBoostError::UntrainedModel);
        }
        let raw = self.predict_row_raw(row);
        Ok(match self.config.task {
            Task::Binary => sigmoid(raw),
            Task::Regression => raw,
        })
    }

    /// Highest feature index referenced by any tree, plus one. Rows passed
    /// to [`GradientBooster::predict_row`] must be at least this long.
    pub fn n_required_features(&self) -> usize {
        self.trees
            .iter()
            .flat_map(|tree| tree.nodes.iter())
            .filter(|node| !node.is_leaf)
            .map(|node| node.split_feature + 1)
            .max()
            .unwrap_or(0)
    }

    /// K-fold cross-validation: per-round metric values averaged over the
    /// held-out folds.
    pub fn cv(&self, data: &DataMatrix, n_folds: usize) -> Result<Vec<f32>, HistBoostError> {
        if !data.has_labels() {
            return Err(HistBoostError::MissingLabels);
        }
        if n_folds < 2 {
            return Err(HistBoostError::invalid_parameter("n_folds", "an integer >= 2", n_folds));
        }
        if data.n_rows() < n_folds {
            return Err(HistBoostError::invalid_parameter(
                "n_folds",
                &format!("at most the number of rows ({})", data.n_rows()),
                n_folds,
            ));
        }

        let mut indices: Vec<usize> = (0..data.n_rows()).collect();
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        indices.shuffle(&mut rng);

        let mut fold_indices: Vec<Vec<usize>> = vec![Vec::new(); n_folds];
        for (i, idx) in indices.iter().enumerate() {
            fold_indices[i % n_folds].push(*idx);
        }

        let metric_fn = metric_callable(self.config.metric);
        let pool = self.build_pool();
        let mut mean_metrics = vec![0.0_f32; self.config.n_rounds];

        for fold in 0..n_folds {
            let test_rows = &fold_indices[fold];
            let train_rows: Vec<usize> = (0..n_folds)
                .filter(|f| *f != fold)
                .flat_map(|f| fold_indices[f].iter().copied())
                .collect();

            let train = gather_rows(data, &train_rows)?;
            let test = gather_rows(data, test_rows)?;

            let mut fold_model = GradientBooster::new(self.config.clone())?;
            fold_model.fit(&train)?;

            // Accumulate tree by tree, evaluating the ensemble prefix
            // after every round.
            let mut preds = vec![fold_model.base_score; test.n_rows()];
            for (round, tree) in fold_model.trees.iter().enumerate() {
                let contributions = tree.predict(&test, &pool);
                for (p, contrib) in preds.iter_mut().zip(&contributions) {
                    *p += self.config.learning_rate * contrib;
                }
                mean_metrics[round] += metric_fn(test.labels(), &preds) / n_folds as f32;
            }
            info!("fold {}: finished", fold);
        }

        Ok(mean_metrics)
    }
}

/// Copy a subset of rows (and their labels) into a new matrix.
fn gather_rows(data: &DataMatrix, rows: &[usize]) -> Result<DataMatrix, HistBoostError> {
    let mut features = Vec::with_capacity(rows.len() * data.n_cols());
    let mut labels = Vec::with_capacity(rows.len());
    for &row in rows {
        features.extend_from_slice(data.get_row(row));
        labels.push(data.labels()[row]);
    }
    DataMatrix::new(features, labels, rows.len(), data.n_cols())
}
