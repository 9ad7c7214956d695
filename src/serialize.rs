//! Model persistence.
//!
//! Two on-disk formats, both JSON:
//!
//! * the native format, `{config, base_score, trees}`, where every tree is
//!   a `nodes` array of leaf records `{nodeid, leaf}` and internal records
//!   `{nodeid, split, split_condition, yes, no, missing}` with
//!   `missing == no` (missing values always follow the right child);
//! * an XGBoost-compatible wrapper that nests the same tree list inside
//!   `learner.gradient_booster.model.trees`.
//!
//! Node ids are breadth-first renumberings of the flat array; loading
//! resolves ids through a map, so any id assignment round-trips.

use crate::booster::GradientBooster;
use crate::config::{BoosterConfig, Task};
use crate::errors::HistBoostError;
use crate::node::TreeNode;
use crate::tree::Tree;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::Path;

fn tree_to_json(tree: &Tree) -> Value {
    if tree.nodes.is_empty() {
        return json!({ "nodes": [] });
    }

    // Assign XGBoost-style ids breadth first from the root.
    let mut node_map: HashMap<usize, u32> = HashMap::with_capacity(tree.nodes.len());
    let mut queue = VecDeque::from([0usize]);
    let mut next_id = 0u32;
    while let Some(idx) = queue.pop_front() {
        node_map.insert(idx, next_id);
        next_id += 1;
        let node = &tree.nodes[idx];
        if !node.is_leaf {
            queue.push_back(node.left_child);
            queue.push_back(node.right_child);
        }
    }

    let nodes: Vec<Value> = tree
        .nodes
        .iter()
        .enumerate()
        .map(|(idx, node)| {
            if node.is_leaf {
                json!({
                    "nodeid": node_map[&idx],
                    "leaf": node.weight_value,
                })
            } else {
                json!({
                    "nodeid": node_map[&idx],
                    "split": node.split_feature,
                    "split_condition": node.split_value,
                    "yes": node_map[&node.left_child],
                    "no": node_map[&node.right_child],
                    "missing": node_map[&node.right_child],
                })
            }
        })
        .collect();

    json!({ "nodes": nodes })
}

fn tree_from_json(value: &Value) -> Result<Tree, HistBoostError> {
    let nodes_json = value
        .get("nodes")
        .ok_or_else(|| HistBoostError::FormatError("tree is missing 'nodes'".to_string()))?
        .as_array()
        .ok_or_else(|| HistBoostError::FormatError("tree 'nodes' is not an array".to_string()))?;

    // First pass maps external node ids to positions in the array.
    let mut node_map: HashMap<u64, usize> = HashMap::with_capacity(nodes_json.len());
    for node_json in nodes_json {
        let id = node_json
            .get("nodeid")
            .and_then(Value::as_u64)
            .ok_or_else(|| HistBoostError::FormatError("node is missing 'nodeid'".to_string()))?;
        let next = node_map.len();
        node_map.insert(id, next);
    }

    let resolve = |id: u64| {
        node_map
            .get(&id)
            .copied()
            .ok_or_else(|| HistBoostError::FormatError(format!("tree references undefined node id {}", id)))
    };

    let mut nodes = vec![TreeNode::new_leaf(0.0); nodes_json.len()];
    for node_json in nodes_json {
        let id = node_json.get("nodeid").and_then(Value::as_u64).unwrap();
        let idx = node_map[&id];
        if let Some(leaf) = node_json.get("leaf") {
            let weight = leaf
                .as_f64()
                .ok_or_else(|| HistBoostError::FormatError("leaf value is not a number".to_string()))?;
            nodes[idx] = TreeNode::new_leaf(weight as f32);
        } else {
            let split = node_json
                .get("split")
                .and_then(Value::as_u64)
                .ok_or_else(|| HistBoostError::FormatError("internal node is missing 'split'".to_string()))?;
            let condition = node_json
                .get("split_condition")
                .and_then(Value::as_f64)
                .ok_or_else(|| HistBoostError::FormatError("internal node is missing 'split_condition'".to_string()))?;
            let yes = node_json
                .get("yes")
                .and_then(Value::as_u64)
                .ok_or_else(|| HistBoostError::FormatError("internal node is missing 'yes'".to_string()))?;
            let no = node_json
                .get("no")
                .and_then(Value::as_u64)
                .ok_or_else(|| HistBoostError::FormatError("internal node is missing 'no'".to_string()))?;
            nodes[idx] = TreeNode::new_parent(split as usize, condition as f32, 0.0, resolve(yes)?, resolve(no)?);
        }
    }
    Ok(Tree { nodes })
}

fn trees_from_json(value: &Value, what: &str) -> Result<Vec<Tree>, HistBoostError> {
    value
        .as_array()
        .ok_or_else(|| HistBoostError::FormatError(format!("'{}' is not an array", what)))?
        .iter()
        .map(tree_from_json)
        .collect()
}

impl GradientBooster {
    /// The native JSON document.
    pub fn to_json(&self) -> Value {
        let trees: Vec<Value> = self.trees.iter().map(tree_to_json).collect();
        json!({
            "config": serde_json::to_value(&self.config).expect("config serialization cannot fail"),
            "base_score": self.base_score,
            "trees": trees,
        })
    }

    /// Pretty-printed native document, the format written by
    /// [`GradientBooster::save_booster`].
    pub fn json_dump(&self) -> Result<String, HistBoostError> {
        serde_json::to_string_pretty(&self.to_json()).map_err(|e| HistBoostError::FormatError(e.to_string()))
    }

    /// Parse a native document.
    pub fn from_json(json_str: &str) -> Result<Self, HistBoostError> {
        let value: Value =
            serde_json::from_str(json_str).map_err(|e| HistBoostError::FormatError(e.to_string()))?;
        let config_json = value
            .get("config")
            .ok_or_else(|| HistBoostError::FormatError("document is missing 'config'".to_string()))?;
        let config: BoosterConfig = serde_json::from_value(config_json.clone())
            .map_err(|e| HistBoostError::FormatError(format!("invalid 'config': {}", e)))?;
        let trees_json = value
            .get("trees")
            .ok_or_else(|| HistBoostError::FormatError("document is missing 'trees'".to_string()))?;
        let trees = trees_from_json(trees_json, "trees")?;
        // Documents written by older tools may omit the base score.
        let base_score = value.get("base_score").and_then(Value::as_f64).unwrap_or(0.0) as f32;

        let mut booster = GradientBooster::new(config)?;
        booster.base_score = base_score;
        booster.trees = trees;
        Ok(booster)
    }

    /// Save the native document to a file.
    pub fn save_booster<P: AsRef<Path>>(&self, path: P) -> Result<(), HistBoostError> {
        let json = self.json_dump()?;
        fs::write(path.as_ref(), json)
            .map_err(|e| HistBoostError::IoError(path.as_ref().display().to_string(), e.to_string()))
    }

    /// Load a native document from a file.
    pub fn load_booster<P: AsRef<Path>>(path: P) -> Result<Self, HistBoostError> {
        let json_str = fs::read_to_string(path.as_ref())
            .map_err(|e| HistBoostError::IoError(path.as_ref().display().to_string(), e.to_string()))?;
        Self::from_json(&json_str)
    }

    /// The XGBoost-compatible document.
    pub fn to_xgboost_json(&self) -> Value {
        let objective = match self.config.task {
            Task::Binary => "binary:logistic",
            Task::Regression => "reg:squarederror",
        };
        let trees: Vec<Value> = self.trees.iter().map(tree_to_json).collect();
        json!({
            "learner": {
                "attributes": {
                    "best_iteration": self.config.n_rounds.to_string(),
                },
                "gradient_booster": {
                    "model": {
                        "gbtree_model_param": { "num_trees": self.trees.len() },
                        "trees": trees,
                    },
                    "name": "gbtree",
                },
                "learner_model_param": {
                    "objective": objective,
                    "base_score": self.base_score,
                    "eta": self.config.learning_rate,
                    "max_depth": self.config.max_depth,
                    "min_child_weight": self.config.min_child_weight,
                    "lambda": self.config.reg_lambda,
                    "subsample": self.config.subsample,
                    "colsample_bytree": self.config.colsample,
                },
                "name": "generic",
                "version": "1.0.0",
            }
        })
    }

    /// Build a booster from an XGBoost document. The tree-array length
    /// decides the round count; the `best_iteration` attribute is ignored.
    pub fn from_xgboost_json(value: &Value) -> Result<Self, HistBoostError> {
        let learner = value
            .get("learner")
            .ok_or_else(|| HistBoostError::FormatError("document is missing 'learner'".to_string()))?;
        let params = learner
            .get("learner_model_param")
            .ok_or_else(|| HistBoostError::FormatError("document is missing 'learner_model_param'".to_string()))?;

        let objective = params
            .get("objective")
            .and_then(Value::as_str)
            .ok_or_else(|| HistBoostError::FormatError("document is missing 'objective'".to_string()))?;
        let task = if objective == "binary:logistic" {
            Task::Binary
        } else {
            Task::Regression
        };

        let trees_json = learner
            .get("gradient_booster")
            .and_then(|g| g.get("model"))
            .and_then(|m| m.get("trees"))
            .ok_or_else(|| {
                HistBoostError::FormatError("document is missing 'gradient_booster.model.trees'".to_string())
            })?;
        let trees = trees_from_json(trees_json, "trees")?;

        let defaults = BoosterConfig::default();
        let get_f32 = |key: &str, fallback: f32| params.get(key).and_then(Value::as_f64).map(|v| v as f32).unwrap_or(fallback);
        let config = BoosterConfig {
            task,
            n_rounds: trees.len().max(1),
            learning_rate: get_f32("eta", defaults.learning_rate),
            max_depth: params
                .get("max_depth")
                .and_then(Value::as_u64)
                .map(|v| v as usize)
                .unwrap_or(defaults.max_depth),
            min_child_weight: get_f32("min_child_weight", defaults.min_child_weight),
            reg_lambda: get_f32("lambda", defaults.reg_lambda),
            subsample: get_f32("subsample", defaults.subsample),
            colsample: get_f32("colsample_bytree", defaults.colsample),
            metric: task.objective().default_metric(),
            ..defaults
        };
        let base_score = params.get("base_score").and_then(Value::as_f64).unwrap_or(0.0) as f32;

        let mut booster = GradientBooster::new(config)?;
        booster.base_score = base_score;
        booster.trees = trees;
        Ok(booster)
    }

    /// Save the XGBoost document to a file.
    pub fn save_xgboost_booster<P: AsRef<Path>>(&self, path: P) -> Result<(), HistBoostError> {
        let json = serde_json::to_string_pretty(&self.to_xgboost_json())
            .map_err(|e| HistBoostError::FormatError(e.to_string()))?;
        fs::write(path.as_ref(), json)
            .map_err(|e| HistBoostError::IoError(path.as_ref().display().to_string(), e.to_string()))
    }

    /// Load an XGBoost document from a file.
    pub fn load_xgboost_booster<P: AsRef<Path>>(path: P) -> Result<Self, HistBoostError> {
        let json_str = fs::read_to_string(path.as_ref())
            .map_err(|e| HistBoostError::IoError(path.as_ref().display().to_string(), e.to_string()))?;
        let value: Value =
            serde_json::from_str(&json_str).map_err(|e| HistBoostError::FormatError(e.to_string()))?;
        Self::from_xgboost_json(&value)
    }
}
