use super::Garden;

const PRICES: [(&str, u64); 2] = [("Oak", 100), ("Pine", 150)];

fn price(tree: &str) -> Option<u64> {
    PRICES
        .iter()
        .find(|(name, _)| *name == tree)
        .map(|(_, price)| *price)
}

/// Returns true when coins were spent.
pub fn buy(garden: &mut Garden, coins: &mut u64, tree: &str) -> bool {
    if garden.is_owned(tree) {
        garden.message = format!("You already purchased {tree} tree.");
        return false;
    }

    let Some(price) = price(tree) else {
        garden.message = format!("{tree} is not for sale!");
        return false;
    };

    if *coins < price {
        garden.message = format!("Not enough coins to buy {tree}!");
        return false;
    }

    *coins -= price;
    garden.add_purchase(tree);
    garden.message = format!("Successfully purchased {tree} tree!");
    tracing::info!(tree = %tree, price, coins = *coins, "tree purchased");
    true
}
