//! Core data model types for adaptest.
//!
//! These are the fundamental types the whole system uses to represent
//! items, IRT parameters, responses, and ability estimates. Item content
//! (stem, options, key) is opaque to selection and scoring; only identity
//! and taxonomy tags matter there.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Unique identifier for an item in the bank.
///
/// A single key type used everywhere items are looked up, so parameter
/// tables, histories, and exclusion sets can never disagree on key shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Categorical difficulty tag used by blueprint balancing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Bucket a 3PL difficulty parameter into a tag.
    pub fn from_b(b: f64) -> Self {
        if b <= -1.0 {
            Difficulty::Easy
        } else if b <= 0.5 {
            Difficulty::Medium
        } else {
            Difficulty::Hard
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty tag: {other}")),
        }
    }
}

/// An answer choice presented alongside an item stem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    /// Stable choice id ("A", "B", ...).
    pub id: String,
    /// Choice text.
    pub text: String,
}

/// A single test item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    /// Unique identifier.
    pub id: ItemId,
    /// Top-level content area (e.g. "Math").
    pub domain: String,
    /// Sub-area within the domain (e.g. "Algebra").
    pub skill: String,
    /// Categorical difficulty tag.
    pub difficulty: Difficulty,
    /// The question text.
    pub stem: String,
    /// Answer choices.
    #[serde(default)]
    pub options: Vec<Choice>,
    /// Id of the correct choice.
    pub answer_key: String,
    /// Supporting passage, if any.
    #[serde(default)]
    pub stimulus: Option<String>,
}

/// An ordered collection of items with an id index for O(1) lookup.
///
/// The bank is read-mostly and shared across sessions; it is never
/// mutated once built.
#[derive(Debug, Clone, Default)]
pub struct ItemBank {
    items: Vec<Item>,
    index: HashMap<ItemId, usize>,
}

impl ItemBank {
    /// Build a bank from an ordered list of items.
    ///
    /// If an id occurs more than once, lookups resolve to the first
    /// occurrence; validation tooling reports duplicates separately.
    pub fn new(items: Vec<Item>) -> Self {
        let mut index = HashMap::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            index.entry(item.id.clone()).or_insert(i);
        }
        Self { items, index }
    }

    pub fn get(&self, id: &ItemId) -> Option<&Item> {
        self.index.get(id).map(|&i| &self.items[i])
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Distinct skills present in the bank, sorted.
    pub fn skills(&self) -> Vec<String> {
        let mut skills: Vec<String> = self
            .items
            .iter()
            .map(|i| i.skill.clone())
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();
        skills.sort();
        skills
    }
}

impl FromIterator<Item> for ItemBank {
    fn from_iter<T: IntoIterator<Item = Item>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// 3PL item parameters: discrimination, difficulty, guessing floor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IrtParameters {
    /// Discrimination; valid when a > 0.
    pub a: f64,
    /// Difficulty location on the ability scale.
    pub b: f64,
    /// Guessing lower asymptote; valid when 0 <= c < 1.
    pub c: f64,
}

impl IrtParameters {
    pub fn new(a: f64, b: f64, c: f64) -> Self {
        Self { a, b, c }
    }

    /// Degenerate parameters carry zero information; they never error.
    pub fn is_degenerate(&self) -> bool {
        self.a <= 0.0 || !(0.0..1.0).contains(&self.c)
    }
}

/// Mapping from item id to 3PL parameters.
///
/// Missing entries are skipped by selection and scoring, not raised as
/// errors; the bank and the parameter table may legitimately diverge.
#[derive(Debug, Clone, Default)]
pub struct ParameterTable {
    entries: HashMap<ItemId, IrtParameters>,
}

impl ParameterTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: ItemId, params: IrtParameters) {
        self.entries.insert(id, params);
    }

    pub fn get(&self, id: &ItemId) -> Option<&IrtParameters> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ItemId, &IrtParameters)> {
        self.entries.iter()
    }
}

impl FromIterator<(ItemId, IrtParameters)> for ParameterTable {
    fn from_iter<T: IntoIterator<Item = (ItemId, IrtParameters)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// One administered item with its scored response, in administration order.
///
/// The full ordered history is the sufficient statistic for each MAP step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub item_id: ItemId,
    pub correct: bool,
}

impl ResponseRecord {
    pub fn new(item_id: impl Into<ItemId>, correct: bool) -> Self {
        Self {
            item_id: item_id.into(),
            correct,
        }
    }
}

/// Latent ability estimate with its standard error.
///
/// SE is infinite until enough information has accumulated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AbilityEstimate {
    pub theta: f64,
    pub se: f64,
}

impl AbilityEstimate {
    pub fn new(theta: f64, se: f64) -> Self {
        Self { theta, se }
    }

    /// True when the SE is finite and below the given threshold.
    pub fn is_precise(&self, se_threshold: f64) -> bool {
        self.se.is_finite() && self.se < se_threshold
    }
}

impl Default for AbilityEstimate {
    fn default() -> Self {
        Self {
            theta: 0.0,
            se: f64::INFINITY,
        }
    }
}
