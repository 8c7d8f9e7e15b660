use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::SessionState;
use crate::garden::{Garden, TreeState, DEFAULT_TREES};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid save data: {0}")]
    Json(#[from] serde_json::Error),
}

/// Older saves stored purchases as a plain list of tree names.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PurchasedTrees {
    Map(BTreeMap<String, bool>),
    List(Vec<String>),
}

impl Default for PurchasedTrees {
    fn default() -> Self {
        PurchasedTrees::Map(BTreeMap::new())
    }
}

impl PurchasedTrees {
    fn into_map(self) -> BTreeMap<String, bool> {
        match self {
            PurchasedTrees::Map(map) => map,
            PurchasedTrees::List(list) => list.into_iter().map(|t| (t, true)).collect(),
        }
    }
}

fn default_level() -> i64 {
    1
}

fn default_can_plant() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct SaveFileIn {
    #[serde(default)]
    coins: i64,
    #[serde(default)]
    hunt_score: i64,
    #[serde(default = "default_level")]
    level: i64,
    #[serde(default)]
    purchased_trees: PurchasedTrees,
    #[serde(default)]
    tree_states: BTreeMap<String, TreeState>,
    #[serde(default)]
    tree_type: String,
    #[serde(default = "default_can_plant")]
    can_plant: bool,
    #[serde(default)]
    trees_planted: u32,
}

#[derive(Debug, Serialize)]
struct SaveFileOut<'a> {
    coins: u64,
    hunt_score: u64,
    level: u32,
    purchased_trees: &'a BTreeMap<String, bool>,
    tree_states: &'a BTreeMap<String, TreeState>,
    tree_type: &'a str,
    can_plant: bool,
    trees_planted: u32,
}

#[derive(Debug, Clone)]
pub struct SaveStore {
    path: PathBuf,
}

impl SaveStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Missing or unreadable saves fall back to a fresh game.
    pub fn load(&self) -> (SessionState, Garden) {
        match self.try_load() {
            Ok(state) => {
                tracing::info!(path = %self.path.display(), "save data loaded");
                state
            }
            Err(StorageError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "no save data, starting fresh");
                (SessionState::default(), Garden::default())
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "save data unreadable, starting fresh");
                (SessionState::default(), Garden::default())
            }
        }
    }

    fn try_load(&self) -> Result<(SessionState, Garden), StorageError> {
        let content = std::fs::read_to_string(&self.path)?;
        let data: SaveFileIn = serde_json::from_str(&content)?;

        let session = SessionState {
            score: data.hunt_score.max(0) as u64,
            coins: data.coins.max(0) as u64,
            level: data.level.clamp(1, u32::MAX as i64) as u32,
            ..SessionState::default()
        };

        let mut purchased = data.purchased_trees.into_map();
        for tree in DEFAULT_TREES {
            purchased.entry(tree.to_string()).or_insert(false);
        }

        let mut garden = Garden {
            purchased,
            tree_states: data.tree_states,
            tree_type: data.tree_type,
            can_plant: data.can_plant,
            trees_planted: data.trees_planted,
            message: String::new(),
        };

        let owned: Vec<String> = garden.owned().iter().map(|t| t.to_string()).collect();
        for tree in owned {
            garden
                .tree_states
                .entry(tree.clone())
                .or_insert_with(|| TreeState::seedling(&tree));
        }

        Ok((session, garden))
    }

    pub fn save(&self, session: &SessionState, garden: &Garden) -> Result<(), StorageError> {
        let out = SaveFileOut {
            coins: session.coins,
            hunt_score: session.score,
            level: session.level.max(1),
            purchased_trees: &garden.purchased,
            tree_states: &garden.tree_states,
            tree_type: &garden.tree_type,
            can_plant: garden.can_plant,
            trees_planted: garden.trees_planted,
        };

        let json = serde_json::to_string_pretty(&out)?;
        let temp = temp_path_for(&self.path);
        std::fs::write(&temp, json)?;
        std::fs::rename(&temp, &self.path)?;

        tracing::debug!(path = %self.path.display(), coins = session.coins, "save data written");
        Ok(())
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut temp = path.to_path_buf();
    temp.set_extension("json.tmp");
    temp
}
