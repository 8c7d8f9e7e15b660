use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Recyclable,
    NonRecyclable,
    Hazardous,
    Biodegradable,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Recyclable => "recyclable",
            Category::NonRecyclable => "non-recyclable",
            Category::Hazardous => "hazardous",
            Category::Biodegradable => "biodegradable",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "recyclable" => Ok(Category::Recyclable),
            "non-recyclable" => Ok(Category::NonRecyclable),
            "hazardous" => Ok(Category::Hazardous),
            "biodegradable" => Ok(Category::Biodegradable),
            _ => Err(UnknownCategory(s.to_string())),
        }
    }
}

const FREE_ROAM_RECYCLABLE: [&str; 25] = [
    "aluminium foil",
    "clear plastic bottle",
    "corrugated carton",
    "drink can",
    "drink carton",
    "food can",
    "glass",
    "glass bottle",
    "glass jar",
    "magazine paper",
    "meal carton",
    "metal",
    "metal bottle cap",
    "metal lid",
    "normal paper",
    "other carton",
    "paper",
    "paper bag",
    "paper cup",
    "plastic bottle cap",
    "plastic lid",
    "pop tab",
    "scrap metal",
    "toilet tube",
    "wrapping paper",
];

const FREE_ROAM_NON_RECYCLABLE: [&str; 34] = [
    "aerosol",
    "aluminium blister pack",
    "battery",
    "broken glass",
    "cigarette",
    "crisp packet",
    "disposable food container",
    "disposable plastic cup",
    "egg carton",
    "foam cup",
    "foam food container",
    "food waste",
    "garbage bag",
    "glass cup",
    "other plastic",
    "other plastic bottle",
    "other plastic wrapper",
    "paper straw",
    "plastic",
    "plastic film",
    "plastic glooves",
    "plastic straw",
    "plastic utensils",
    "rope - strings",
    "shoe",
    "single-use carrier bag",
    "six pack rings",
    "spread tub",
    "squeezable tube",
    "styrofoam piece",
    "tissues",
    "tupperware",
    "unlabeled litter",
    "waste",
];

const MISSION_ENTRIES: [(&str, Category); 20] = [
    ("clear plastic bottle", Category::Recyclable),
    ("glass bottle", Category::Recyclable),
    ("drink can", Category::Recyclable),
    ("food can", Category::Recyclable),
    ("paper", Category::Recyclable),
    ("cardboard", Category::Recyclable),
    ("glass jar", Category::Recyclable),
    ("metal lid", Category::Recyclable),
    ("plastic film", Category::NonRecyclable),
    ("plastic utensils", Category::NonRecyclable),
    ("crisp packet", Category::NonRecyclable),
    ("wrapper", Category::NonRecyclable),
    ("foam cup", Category::NonRecyclable),
    ("styrofoam piece", Category::NonRecyclable),
    ("battery", Category::Hazardous),
    ("electronic waste", Category::Hazardous),
    ("food waste", Category::Biodegradable),
    ("biodegradable", Category::Biodegradable),
    ("mixed waste", Category::NonRecyclable),
    ("unlabeled litter", Category::NonRecyclable),
];

/// Detected label to ground-truth category, keyed case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct ClassificationTable {
    entries: HashMap<String, Category>,
}

impl ClassificationTable {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Category)>,
        S: AsRef<str>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(label, category)| (label.as_ref().to_lowercase(), category))
                .collect(),
        }
    }

    pub fn free_roam() -> Self {
        let recyclable = FREE_ROAM_RECYCLABLE
            .iter()
            .map(|label| (*label, Category::Recyclable));
        let other = FREE_ROAM_NON_RECYCLABLE
            .iter()
            .map(|label| (*label, Category::NonRecyclable));
        Self::new(recyclable.chain(other))
    }

    pub fn mission() -> Self {
        Self::new(MISSION_ENTRIES)
    }

    pub fn lookup(&self, label: &str) -> Option<Category> {
        self.entries.get(&label.to_lowercase()).copied()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.lookup(label).is_some()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
