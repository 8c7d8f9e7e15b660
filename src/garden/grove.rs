use super::{Garden, TreeState};

const PLANTING_COST: u64 = 50;
const YOUNG_TREE_SCORE: u64 = 5000;
const MATURE_TREE_SCORE: u64 = 10000;

pub fn stage_name(stage: u8) -> &'static str {
    match stage {
        0 => "Seedling",
        1 => "Young Tree",
        2 => "Mature Tree",
        _ => "Unknown",
    }
}

impl Garden {
    fn planted_state(&self) -> Option<&TreeState> {
        if self.can_plant || self.tree_type.is_empty() {
            return None;
        }
        self.tree_states.get(&self.tree_type)
    }

    pub fn status(&self) -> &'static str {
        self.planted_state()
            .map(|s| stage_name(s.stage))
            .unwrap_or("None")
    }

    pub fn image(&self) -> &str {
        self.planted_state().map(|s| s.image.as_str()).unwrap_or("")
    }

    /// Returns true when coins were spent.
    pub fn plant(&mut self, coins: &mut u64) -> bool {
        if !self.can_plant {
            self.message = "You already planted a tree!".to_string();
            return false;
        }

        if self.tree_type.is_empty() {
            self.message = "No tree type selected!".to_string();
            return false;
        }

        if *coins < PLANTING_COST {
            self.message = "Not enough coins to plant a tree!".to_string();
            return false;
        }

        *coins -= PLANTING_COST;
        self.trees_planted += 1;
        self.tree_states
            .insert(self.tree_type.clone(), TreeState::seedling(&self.tree_type));
        self.can_plant = false;
        self.message = format!("{} tree planted successfully!", self.tree_type);
        tracing::info!(tree = %self.tree_type, planted = self.trees_planted, "tree planted");
        true
    }

    pub fn switch_tree(&mut self) {
        let owned = self.owned();
        if owned.is_empty() {
            self.message = "You need to purchase a tree first!".to_string();
            return;
        }

        let next = match owned.iter().position(|t| *t == self.tree_type) {
            Some(idx) => owned[(idx + 1) % owned.len()],
            None => owned[0],
        }
        .to_string();

        self.message = format!("Switched to {next} tree!");
        self.tree_type = next;
    }

    /// Promotes the planted tree when the free-roam score crosses a
    /// threshold. Returns true when the stage changed.
    pub fn grow(&mut self, score: u64) -> bool {
        if self.can_plant || self.tree_type.is_empty() {
            return false;
        }

        let tree = self.tree_type.clone();
        let stage = self
            .tree_states
            .get(&tree)
            .map(|s| s.stage)
            .unwrap_or(0);

        let (stage, suffix, message) = match stage {
            0 if score >= YOUNG_TREE_SCORE => (
                1,
                "mid",
                format!("{tree} Seedling has grown into a Young Tree!"),
            ),
            1 if score >= MATURE_TREE_SCORE => (
                2,
                "full",
                format!("{tree} Young Tree has grown into a Mature Tree!"),
            ),
            _ => return false,
        };

        self.tree_states.insert(
            tree.clone(),
            TreeState {
                stage,
                image: format!("{}_{suffix}.png", tree.to_lowercase()),
            },
        );
        self.message = message;
        tracing::info!(tree = %tree, stage = stage_name(stage), "tree grew");
        true
    }

    pub fn reset(&mut self) {
        self.can_plant = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn garden_with(trees: &[&str]) -> Garden {
        let mut garden = Garden::default();
        for tree in trees {
            garden.add_purchase(tree);
        }
        garden
    }

    #[test]
    fn test_plant_requires_selection_and_coins() {
        let mut garden = garden_with(&["Oak"]);
        let mut coins = 40;

        assert!(!garden.plant(&mut coins));
        assert_eq!(garden.message, "No tree type selected!");

        garden.switch_tree();
        assert_eq!(garden.tree_type, "Oak");
        assert!(!garden.plant(&mut coins));
        assert_eq!(garden.message, "Not enough coins to plant a tree!");

        coins = 70;
        assert!(garden.plant(&mut coins));
        assert_eq!(coins, 20);
        assert_eq!(garden.trees_planted, 1);
        assert_eq!(garden.status(), "Seedling");
        assert_eq!(garden.image(), "oak_seedling.png");

        assert!(!garden.plant(&mut coins));
        assert_eq!(garden.message, "You already planted a tree!");
    }

    #[test]
    fn test_switch_cycles_owned_trees() {
        let mut garden = Garden::default();
        garden.switch_tree();
        assert_eq!(garden.message, "You need to purchase a tree first!");

        let mut garden = garden_with(&["Pine", "Oak"]);
        garden.switch_tree();
        let first = garden.tree_type.clone();
        garden.switch_tree();
        assert_ne!(garden.tree_type, first);
        garden.switch_tree();
        assert_eq!(garden.tree_type, first);
        assert_eq!(garden.message, format!("Switched to {first} tree!"));
    }

    #[test]
    fn test_grow_through_stages() {
        let mut garden = garden_with(&["Pine"]);
        let mut coins = 50;
        garden.switch_tree();
        garden.plant(&mut coins);

        assert!(!garden.grow(4999));
        assert!(garden.grow(9999));
        assert_eq!(garden.status(), "Young Tree");
        assert_eq!(garden.image(), "pine_mid.png");

        assert!(garden.grow(10_000));
        assert_eq!(garden.status(), "Mature Tree");
        assert_eq!(garden.image(), "pine_full.png");
        assert!(!garden.grow(1_000_000));
    }

    #[test]
    fn test_grow_ignored_when_nothing_planted() {
        let mut garden = garden_with(&["Oak"]);
        assert!(!garden.grow(20_000));
    }

    #[test]
    fn test_reset_allows_planting_again() {
        let mut garden = garden_with(&["Oak"]);
        let mut coins = 100;
        garden.switch_tree();
        garden.plant(&mut coins);
        garden.reset();
        assert!(garden.can_plant);
        assert_eq!(garden.status(), "None");
        assert!(garden.plant(&mut coins));
        assert_eq!(garden.trees_planted, 2);
    }
}
