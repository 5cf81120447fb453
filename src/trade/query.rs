//! Search-query construction: a pure translation from an item description to
//! the trade-API query document.

use crate::trade::models::{Influence, ItemDescription, Rarity};
use serde::{Deserialize, Serialize};

/// Top-level search document POSTed to the trade API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub query: QueryBody,
    pub sort: SortSpec,
}

/// The query proper: status, name/type terms, stat groups, and filter groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryBody {
    pub status: ChoiceFilter,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none", default)]
    pub item_type: Option<String>,
    /// Stat filter groups. An empty list means "no stat constraints" and the
    /// field is left off the wire entirely.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub stats: Vec<StatGroup>,
    #[serde(skip_serializing_if = "FilterGroups::is_empty", default)]
    pub filters: FilterGroups,
}

/// `{"option": "..."}` wrapper used by status and rarity filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceFilter {
    pub option: String,
}

/// `{"option": true}` wrapper used by influence flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleFilter {
    pub option: bool,
}

/// Result ordering; always cheapest-first here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortSpec {
    pub price: String,
}

/// A group of stat filters combined with AND semantics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatGroup {
    #[serde(rename = "type")]
    pub kind: String,
    pub filters: Vec<StatFilter>,
}

/// One stat constraint: a namespaced id plus optional roll bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatFilter {
    pub id: String,
    /// Unset bounds match any roll of the mod.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub value: Option<Bounds>,
}

/// Inclusive numeric bounds, each side optional.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub max: Option<f64>,
}

impl Bounds {
    /// Lower bound only.
    pub fn at_least(min: f64) -> Self {
        Self { min: Some(min), max: None }
    }
}

/// The disjoint filter groups; each is skipped on the wire when absent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterGroups {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub type_filters: Option<TypeFilters>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub misc_filters: Option<MiscFilters>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub socket_filters: Option<SocketFilters>,
}

impl FilterGroups {
    pub fn is_empty(&self) -> bool {
        self.type_filters.is_none() && self.misc_filters.is_none() && self.socket_filters.is_none()
    }
}

/// Type/rarity filter group.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TypeFilters {
    pub filters: TypeFilterValues,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TypeFilterValues {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub rarity: Option<ChoiceFilter>,
}

/// Misc filter group: item level, quality, and influence flags.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MiscFilters {
    pub filters: MiscFilterValues,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MiscFilterValues {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ilvl: Option<Bounds>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<Bounds>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shaper_item: Option<ToggleFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elder_item: Option<ToggleFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crusader_item: Option<ToggleFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redeemer_item: Option<ToggleFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hunter_item: Option<ToggleFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warlord_item: Option<ToggleFilter>,
}

impl MiscFilterValues {
    pub fn is_empty(&self) -> bool {
        self.ilvl.is_none()
            && self.quality.is_none()
            && self.shaper_item.is_none()
            && self.elder_item.is_none()
            && self.crusader_item.is_none()
            && self.redeemer_item.is_none()
            && self.hunter_item.is_none()
            && self.warlord_item.is_none()
    }
}

/// Socket filter group; only link count is constrained here.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SocketFilters {
    pub filters: SocketFilterValues,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SocketFilterValues {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub links: Option<Bounds>,
}

impl SearchQuery {
    /// True when the query carries at least one stat filter entry.
    pub fn has_stats(&self) -> bool {
        self.query.stats.iter().any(|group| !group.filters.is_empty())
    }

    /// True when the query constrains rarity.
    pub fn has_rarity(&self) -> bool {
        self.query
            .filters
            .type_filters
            .as_ref()
            .map(|t| t.filters.rarity.is_some())
            .unwrap_or(false)
    }

    /// True when the query constrains item level or socket links.
    pub fn has_bounds(&self) -> bool {
        let ilvl = self
            .query
            .filters
            .misc_filters
            .as_ref()
            .map(|m| m.filters.ilvl.is_some())
            .unwrap_or(false);
        ilvl || self.query.filters.socket_filters.is_some()
    }

    /// Copy with every stat group removed.
    pub fn without_stats(&self) -> Self {
        let mut relaxed = self.clone();
        relaxed.query.stats.clear();
        relaxed
    }

    /// Copy with the rarity filter removed.
    pub fn without_rarity(&self) -> Self {
        let mut relaxed = self.clone();
        relaxed.query.filters.type_filters = None;
        relaxed
    }

    /// Copy with the item-level and socket-link filters removed. Quality and
    /// influence flags stay.
    pub fn without_bounds(&self) -> Self {
        let mut relaxed = self.clone();
        relaxed.query.filters.socket_filters = None;
        if let Some(misc) = relaxed.query.filters.misc_filters.as_mut() {
            misc.filters.ilvl = None;
            if misc.filters.is_empty() {
                relaxed.query.filters.misc_filters = None;
            }
        }
        relaxed
    }
}

/// Builds a trade search query from an item description.
///
/// Pure and total: malformed pieces of the input degrade to a looser query,
/// never to an error.
pub fn build_query(item: &ItemDescription) -> SearchQuery {
    let mut body = QueryBody {
        status: ChoiceFilter { option: "online".to_string() },
        name: None,
        item_type: None,
        stats: Vec::new(),
        filters: FilterGroups::default(),
    };

    // Uniques are matched by exact name, optionally narrowed by base type.
    // Everything else searches by base type, falling back to the name as a
    // type term when the rarity is unknown.
    if item.is_unique() && item.name.is_some() {
        body.name = item.name.clone();
        body.item_type = item.base_type.clone();
    } else if item.base_type.is_some() {
        body.item_type = item.base_type.clone();
    } else {
        body.item_type = item.name.clone();
    }

    if let Some(rarity) = item.rarity.as_deref() {
        let token = match Rarity::from_name(rarity) {
            Some(known) => known.token().to_string(),
            None => rarity.to_lowercase(),
        };
        body.filters.type_filters = Some(TypeFilters {
            filters: TypeFilterValues { rarity: Some(ChoiceFilter { option: token }) },
        });
    }

    let mut misc = MiscFilterValues::default();
    if let Some(ilvl) = item.item_level {
        misc.ilvl = Some(Bounds::at_least(f64::from(ilvl)));
    }
    if let Some(quality) = item.quality {
        misc.quality = Some(Bounds::at_least(f64::from(quality)));
    }
    for name in &item.influences {
        let flag = Some(ToggleFilter { option: true });
        match Influence::from_name(name) {
            Some(Influence::Shaper) => misc.shaper_item = flag,
            Some(Influence::Elder) => misc.elder_item = flag,
            Some(Influence::Crusader) => misc.crusader_item = flag,
            Some(Influence::Redeemer) => misc.redeemer_item = flag,
            Some(Influence::Hunter) => misc.hunter_item = flag,
            Some(Influence::Warlord) => misc.warlord_item = flag,
            None => {}
        }
    }
    if !misc.is_empty() {
        body.filters.misc_filters = Some(MiscFilters { filters: misc });
    }

    if let Some(links) = item.links.filter(|&links| links > 0) {
        body.filters.socket_filters = Some(SocketFilters {
            filters: SocketFilterValues { links: Some(Bounds::at_least(f64::from(links))) },
        });
    }

    let mut seen: Vec<&str> = Vec::new();
    let mut stat_filters = Vec::new();
    for item_mod in item.mods() {
        let Some(id) = item_mod.filterable_stat_id() else {
            continue;
        };
        // First occurrence wins on duplicate ids.
        if seen.contains(&id) {
            continue;
        }
        seen.push(id);
        let value = item_mod.display_text.as_deref().and_then(extract_bounds);
        stat_filters.push(StatFilter { id: id.to_string(), value });
    }
    if !stat_filters.is_empty() {
        body.stats.push(StatGroup { kind: "and".to_string(), filters: stat_filters });
    }

    SearchQuery { query: body, sort: SortSpec { price: "asc".to_string() } }
}

/// Pulls up to two numbers out of a mod line: the first becomes the lower
/// bound, the second the upper bound. A line with no numbers matches any roll.
fn extract_bounds(text: &str) -> Option<Bounds> {
    let mut values: Vec<f64> = Vec::new();
    let mut current = String::new();

    for c in text.chars() {
        if values.len() == 2 {
            break;
        }
        if c.is_ascii_digit() || (c == '.' && !current.is_empty() && !current.contains('.')) {
            current.push(c);
        } else if !current.is_empty() {
            if let Ok(value) = current.trim_end_matches('.').parse() {
                values.push(value);
            }
            current.clear();
        }
    }
    if !current.is_empty() && values.len() < 2 {
        if let Ok(value) = current.trim_end_matches('.').parse() {
            values.push(value);
        }
    }

    match values.as_slice() {
        [] => None,
        [min] => Some(Bounds { min: Some(*min), max: None }),
        [min, max, ..] => Some(Bounds { min: Some(*min), max: Some(*max) }),
    }
}
