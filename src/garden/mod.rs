mod grove;
mod shop;

pub use shop::buy;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const DEFAULT_TREES: [&str; 3] = ["Oak", "Pine", "Acacia"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeState {
    pub stage: u8,
    pub image: String,
}

impl TreeState {
    pub fn seedling(tree: &str) -> Self {
        Self {
            stage: 0,
            image: format!("{}_seedling.png", tree.to_lowercase()),
        }
    }
}

/// Cosmetic tree state bought and grown with game currency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Garden {
    pub purchased: BTreeMap<String, bool>,
    pub tree_states: BTreeMap<String, TreeState>,
    pub tree_type: String,
    pub can_plant: bool,
    pub trees_planted: u32,
    pub message: String,
}

impl Default for Garden {
    fn default() -> Self {
        Self {
            purchased: DEFAULT_TREES
                .iter()
                .map(|t| (t.to_string(), false))
                .collect(),
            tree_states: BTreeMap::new(),
            tree_type: String::new(),
            can_plant: true,
            trees_planted: 0,
            message: String::new(),
        }
    }
}

impl Garden {
    pub fn owned(&self) -> Vec<&str> {
        self.purchased
            .iter()
            .filter(|(_, bought)| **bought)
            .map(|(tree, _)| tree.as_str())
            .collect()
    }

    pub fn is_owned(&self, tree: &str) -> bool {
        self.purchased.get(tree).copied().unwrap_or(false)
    }

    /// Records a purchase and seeds the tree's growth state.
    pub fn add_purchase(&mut self, tree: &str) {
        self.purchased.insert(tree.to_string(), true);
        self.tree_states
            .entry(tree.to_string())
            .or_insert_with(|| TreeState::seedling(tree));
    }
}
