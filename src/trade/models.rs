//! Data models for item descriptions, modifiers, and trade listings.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A semi-structured item description, as supplied by the caller.
///
/// Every field is optional: an absent field means "do not filter on this
/// attribute", never "filter on empty/zero".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemDescription {
    /// Item name, e.g. `Shavronne's Wrappings`.
    pub name: Option<String>,
    /// Base type, e.g. `Vaal Regalia`.
    pub base_type: Option<String>,
    /// Rarity as supplied. Recognized values map to [`Rarity`]; anything else
    /// is passed to the search lowercased as-is.
    pub rarity: Option<String>,
    pub item_level: Option<u32>,
    pub quality: Option<u32>,
    /// Socket link count.
    pub links: Option<u32>,
    /// Influence names; entries outside the search vocabulary are ignored.
    pub influences: Vec<String>,
    pub implicit_mods: Vec<ItemMod>,
    pub explicit_mods: Vec<ItemMod>,
}

impl ItemDescription {
    /// The recognized rarity, if the supplied string names one.
    pub fn rarity(&self) -> Option<Rarity> {
        self.rarity.as_deref().and_then(Rarity::from_name)
    }

    /// Uniques are matched by exact name rather than base type.
    pub fn is_unique(&self) -> bool {
        matches!(self.rarity(), Some(Rarity::Unique))
    }

    /// Implicit mods followed by explicit mods, in input order.
    pub fn mods(&self) -> impl Iterator<Item = &ItemMod> {
        self.implicit_mods.iter().chain(self.explicit_mods.iter())
    }
}

/// One modifier line on an item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemMod {
    /// Namespaced stat identifier, e.g. `explicit.stat_3299347043`.
    pub stat_id: Option<String>,
    /// Human-readable mod text, e.g. `+35 to maximum Life`.
    #[serde(alias = "text")]
    pub display_text: Option<String>,
}

/// Stat-id namespaces the search accepts.
const STAT_NAMESPACES: &[&str] =
    &["explicit", "implicit", "pseudo", "fractured", "crafted", "enchant"];

impl ItemMod {
    /// Creates a mod with just a stat id.
    pub fn with_id(stat_id: impl Into<String>) -> Self {
        Self { stat_id: Some(stat_id.into()), display_text: None }
    }

    /// Returns the stat id when it is well-formed (`<namespace>.<rest>` with
    /// a known namespace). A malformed or missing id is not an error; the mod
    /// is simply not filterable.
    pub fn filterable_stat_id(&self) -> Option<&str> {
        let id = self.stat_id.as_deref()?;
        let (namespace, rest) = id.split_once('.')?;
        if rest.is_empty() || !STAT_NAMESPACES.contains(&namespace) {
            return None;
        }
        Some(id)
    }
}

/// Item rarities recognized by the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Normal,
    Magic,
    Rare,
    Unique,
}

impl Rarity {
    /// Parses a rarity name case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "normal" => Some(Rarity::Normal),
            "magic" => Some(Rarity::Magic),
            "rare" => Some(Rarity::Rare),
            "unique" => Some(Rarity::Unique),
            _ => None,
        }
    }

    /// The search-API rarity token.
    pub fn token(&self) -> &'static str {
        match self {
            Rarity::Normal => "normal",
            Rarity::Magic => "magic",
            Rarity::Rare => "rare",
            Rarity::Unique => "unique",
        }
    }

    /// Returns all recognized rarities.
    pub fn all() -> &'static [Rarity] {
        &[Rarity::Normal, Rarity::Magic, Rarity::Rare, Rarity::Unique]
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

/// The fixed influence vocabulary the search understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Influence {
    Shaper,
    Elder,
    Crusader,
    Redeemer,
    Hunter,
    Warlord,
}

impl Influence {
    /// Parses an influence name case-insensitively; unknown names are simply
    /// not part of the vocabulary.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "shaper" => Some(Influence::Shaper),
            "elder" => Some(Influence::Elder),
            "crusader" => Some(Influence::Crusader),
            "redeemer" => Some(Influence::Redeemer),
            "hunter" => Some(Influence::Hunter),
            "warlord" => Some(Influence::Warlord),
            _ => None,
        }
    }

    /// Returns all recognized influences.
    pub fn all() -> &'static [Influence] {
        &[
            Influence::Shaper,
            Influence::Elder,
            Influence::Crusader,
            Influence::Redeemer,
            Influence::Hunter,
            Influence::Warlord,
        ]
    }
}

impl fmt::Display for Influence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Influence::Shaper => "Shaper",
            Influence::Elder => "Elder",
            Influence::Crusader => "Crusader",
            Influence::Redeemer => "Redeemer",
            Influence::Hunter => "Hunter",
            Influence::Warlord => "Warlord",
        };
        write!(f, "{}", name)
    }
}

/// One raw listing record from the fetch endpoint.
///
/// Upstream records carry far more than this; only the price matters here and
/// unknown fields are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingRecord {
    pub id: Option<String>,
    pub listing: Option<ListingDetails>,
}

/// Seller-side details of a listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingDetails {
    pub price: Option<ListingPrice>,
}

/// The asking price attached to a listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingPrice {
    pub amount: Option<f64>,
    pub currency: Option<String>,
}

impl ListingRecord {
    /// Creates a record priced at `amount` in `currency`.
    pub fn priced(amount: f64, currency: impl Into<String>) -> Self {
        Self {
            id: None,
            listing: Some(ListingDetails {
                price: Some(ListingPrice {
                    amount: Some(amount),
                    currency: Some(currency.into()),
                }),
            }),
        }
    }

    /// `(amount, currency)` when the listing carries a usable price.
    ///
    /// Listings without a price, with a negative or non-finite amount, or
    /// with an empty currency string are not data.
    pub fn price(&self) -> Option<(f64, &str)> {
        let price = self.listing.as_ref()?.price.as_ref()?;
        let amount = price.amount?;
        let currency = price.currency.as_deref()?;
        if currency.is_empty() || !amount.is_finite() || amount < 0.0 {
            return None;
        }
        Some((amount, currency))
    }
}
