use serde::{Deserialize, Serialize};
use std::fmt;

/// One record of the flat tree array. Node 0 is the root and children
/// always sit at larger indices than their parent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNode {
    pub is_leaf: bool,
    pub split_feature: usize,
    pub split_value: f32,
    pub split_gain: f32,
    pub left_child: usize,
    pub right_child: usize,
    pub weight_value: f32,
}

impl TreeNode {
    pub fn new_leaf(weight_value: f32) -> Self {
        TreeNode {
            is_leaf: true,
            split_feature: 0,
            split_value: 0.0,
            split_gain: 0.0,
            left_child: 0,
            right_child: 0,
            weight_value,
        }
    }

    pub fn new_parent(
        split_feature: usize,
        split_value: f32,
        split_gain: f32,
        left_child: usize,
        right_child: usize,
    ) -> Self {
        TreeNode {
            is_leaf: false,
            split_feature,
            split_value,
            split_gain,
            left_child,
            right_child,
            weight_value: 0.0,
        }
    }

    /// Index of the child a value travels to. Missing values always go
    /// right.
    #[inline]
    pub fn get_child_idx(&self, value: f32) -> usize {
        if value.is_nan() || value > self.split_value {
            self.right_child
        } else {
            self.left_child
        }
    }
}

impl fmt::Display for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_leaf {
            write!(f, "leaf={}", self.weight_value)
        } else {
            write!(
                f,
                "[f{} <= {}] yes={},no={},missing={},gain={}",
                self.split_feature, self.split_value, self.left_child, self.right_child, self.right_child, self.split_gain
            )
        }
    }
}
