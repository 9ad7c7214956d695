//! # histboost
//!
//! `histboost` is a histogram-based Gradient Boosting Decision Tree (GBDT)
//! learner. It fits an additive ensemble of regression trees to a squared
//! error (regression) or logistic (binary classification) objective using
//! second-order Newton steps, with split finding performed over pre-binned
//! features.
//!
//! ## Key properties
//!
//! * **Histogram training**: features are quantised once into one-byte bin
//!   codes; split finding sweeps per-bin gradient sums instead of sorted
//!   raw values.
//! * **Native missing values**: NaN cells bin into a reserved code and
//!   always follow the right child at prediction time.
//! * **Deterministic**: given a seed, thread count has no effect on the
//!   fitted trees; training twice yields byte-identical models.
//! * **Parallel**: histogram construction, split finding, prediction and
//!   gradient updates run on a [Rayon](https://docs.rs/rayon) pool sized by
//!   the `n_threads` option.
//!
//! ## Quick start
//!
//! ```rust
//! use histboost::{BoosterConfig, DataMatrix, GradientBooster};
//!
//! // Six rows, two features, a noisy step in the first feature.
//! let features = vec![
//!     1.0, 5.0, // row 0
//!     2.0, 4.0, // row 1
//!     3.0, 3.0, // row 2
//!     4.0, 2.0, // row 3
//!     5.0, 1.0, // row 4
//!     6.0, 0.0, // row 5
//! ];
//! let labels = vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
//! let data = DataMatrix::new(features, labels, 6, 2).unwrap();
//!
//! let config = BoosterConfig {
//!     n_rounds: 10,
//!     min_data_in_leaf: 1,
//!     ..Default::default()
//! };
//! let mut model = GradientBooster::new(config).unwrap();
//! model.fit(&data).unwrap();
//!
//! let preds = model.predict(&data).unwrap();
//! assert!(preds[0] < preds[5]);
//! ```

pub mod binning;
pub mod booster;
pub mod config;
pub mod data;
pub mod errors;
pub mod histogram;
pub mod metrics;
pub mod node;
pub mod objective_functions;
pub mod sampler;
pub mod serialize;
pub mod splitter;
pub mod tree;
pub mod utils;

pub use booster::GradientBooster;
pub use config::{BoosterConfig, Task};
pub use data::DataMatrix;
pub use errors::HistBoostError;
pub use metrics::Metric;
