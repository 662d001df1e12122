use std::collections::BTreeMap;

use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Tagged decoding helpers
// ---------------------------------------------------------------------------

/// Parse a JSON document with no nesting limit.
///
/// Info-block trees have no depth bound, so serde_json's recursion limit is
/// lifted and the stack is grown on demand instead.
pub fn from_slice<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, serde_json::Error> {
    let mut de = serde_json::Deserializer::from_slice(bytes);
    de.disable_recursion_limit();
    let value = T::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()?;
    Ok(value)
}

pub fn from_str<T: DeserializeOwned>(text: &str) -> Result<T, serde_json::Error> {
    from_slice(text.as_bytes())
}

/// Decode a `type`-tagged document.
///
/// `null`, or an object without a `type` (or with `"type": null`), is an
/// absent value and decodes to `Ok(None)`. An unknown `type` is an error.
pub fn decode_tagged<T: DeserializeOwned>(value: Value) -> Result<Option<T>, serde_json::Error> {
    match &value {
        Value::Null => return Ok(None),
        Value::Object(map) if map.get("type").map_or(true, Value::is_null) => return Ok(None),
        _ => {}
    }
    T::deserialize(serde_stacker::Deserializer::new(value)).map(Some)
}

/// Decode a sequence of info blocks, dropping absent entries.
pub fn decode_blocks(values: Vec<Value>) -> Result<Vec<InfoBlock>, serde_json::Error> {
    let mut blocks = Vec::with_capacity(values.len());
    for value in values {
        if let Some(block) = decode_tagged(value)? {
            blocks.push(block);
        }
    }
    Ok(blocks)
}

fn deserialize_blocks<'de, D>(deserializer: D) -> Result<Vec<InfoBlock>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Value>>::deserialize(serde_stacker::Deserializer::new(deserializer))?
        .unwrap_or_default();
    decode_blocks(raw).map_err(de::Error::custom)
}

fn optional_translation<'de, D>(deserializer: D) -> Result<Option<TranslationString>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(value) => decode_tagged(value).map_err(de::Error::custom),
        None => Ok(None),
    }
}

// ---------------------------------------------------------------------------
// Translations
// ---------------------------------------------------------------------------

/// Per-language strings keyed by language code (`ru`, `en`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TranslationLines(pub BTreeMap<String, String>);

impl TranslationLines {
    pub fn get(&self, lang: &str) -> Option<&str> {
        self.0.get(lang).map(String::as_str)
    }

    /// The line for `lang`, falling back to `en`, then `ru`, then any line.
    pub fn resolve(&self, lang: &str) -> &str {
        self.get(lang)
            .or_else(|| self.get("en"))
            .or_else(|| self.get("ru"))
            .or_else(|| self.0.values().next().map(String::as_str))
            .unwrap_or("")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TranslationLines {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Either a literal string or a set of translations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TranslationString {
    Text { text: String },
    Translation { lines: TranslationLines },
}

impl TranslationString {
    pub fn text(text: impl Into<String>) -> Self {
        TranslationString::Text { text: text.into() }
    }

    pub fn resolve(&self, lang: &str) -> &str {
        match self {
            TranslationString::Text { text } => text,
            TranslationString::Translation { lines } => lines.resolve(lang),
        }
    }
}

/// Display string of a numeric block together with its colours (`RRGGBB`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedValue {
    pub value: TranslationLines,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_color: Option<String>,
}

// ---------------------------------------------------------------------------
// Info blocks
// ---------------------------------------------------------------------------

/// Damage fall-off of a weapon: full damage up to `damage_decrease_start`,
/// linear decrease to `end_damage` at `damage_decrease_end`, flat after that
/// until `max_distance`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DamageProfile {
    pub start_damage: f64,
    pub damage_decrease_start: f64,
    pub end_damage: f64,
    pub damage_decrease_end: f64,
    pub max_distance: f64,
}

impl DamageProfile {
    /// Damage at `distance` metres; `None` beyond `max_distance`.
    pub fn damage_at(&self, distance: f64) -> Option<f64> {
        if distance < 0.0 || distance > self.max_distance {
            return None;
        }
        if distance <= self.damage_decrease_start {
            return Some(self.start_damage);
        }
        if distance >= self.damage_decrease_end {
            return Some(self.end_damage);
        }
        let span = self.damage_decrease_end - self.damage_decrease_start;
        let t = (distance - self.damage_decrease_start) / span;
        Some(self.start_damage + (self.end_damage - self.start_damage) * t)
    }
}

/// One displayable attribute of an item.
///
/// `List` nests further blocks of any variant, including lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum InfoBlock {
    Text {
        #[serde(
            default,
            deserialize_with = "optional_translation",
            skip_serializing_if = "Option::is_none"
        )]
        title: Option<TranslationString>,
        text: TranslationString,
    },
    Numeric {
        name: TranslationString,
        value: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        formatted: Option<FormattedValue>,
    },
    Damage(DamageProfile),
    Range {
        name: TranslationString,
        min: f64,
        max: f64,
    },
    KeyValue {
        key: TranslationString,
        value: TranslationString,
    },
    List {
        #[serde(
            default,
            deserialize_with = "optional_translation",
            skip_serializing_if = "Option::is_none"
        )]
        title: Option<TranslationString>,
        #[serde(default, deserialize_with = "deserialize_blocks")]
        elements: Vec<InfoBlock>,
    },
    Usage {
        name: TranslationString,
    },
    Item {
        name: TranslationString,
    },
}

impl InfoBlock {
    /// Decode a single block; `Ok(None)` when the discriminant is missing.
    pub fn from_value(value: Value) -> Result<Option<InfoBlock>, serde_json::Error> {
        decode_tagged(value)
    }

    /// The wire discriminant of this block.
    pub fn kind(&self) -> &'static str {
        match self {
            InfoBlock::Text { .. } => "text",
            InfoBlock::Numeric { .. } => "numeric",
            InfoBlock::Damage(_) => "damage",
            InfoBlock::Range { .. } => "range",
            InfoBlock::KeyValue { .. } => "key-value",
            InfoBlock::List { .. } => "list",
            InfoBlock::Usage { .. } => "usage",
            InfoBlock::Item { .. } => "item",
        }
    }

    /// Number of nested list levels below this block.
    pub fn depth(&self) -> usize {
        match self {
            InfoBlock::List { elements, .. } => {
                1 + elements.iter().map(InfoBlock::depth).max().unwrap_or(0)
            }
            _ => 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemStatus {
    #[serde(default)]
    pub state: String,
}

/// Item rarity, parsed from the `color` code of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rank {
    Default,
    Newbie,
    Stalker,
    Veteran,
    Master,
    Legend,
    Other,
}

impl Rank {
    pub fn from_code(code: &str) -> Self {
        match code {
            "DEFAULT" => Rank::Default,
            "RANK_NEWBIE" => Rank::Newbie,
            "RANK_STALKER" => Rank::Stalker,
            "RANK_VETERAN" => Rank::Veteran,
            "RANK_MASTER" => Rank::Master,
            "RANK_LEGEND" => Rank::Legend,
            _ => Rank::Other,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Rank::Default => "Default",
            Rank::Newbie => "Newbie",
            Rank::Stalker => "Stalker",
            Rank::Veteran => "Veteran",
            Rank::Master => "Master",
            Rank::Legend => "Legend",
            Rank::Other => "Unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    #[serde(default)]
    pub category: String,
    pub name: TranslationString,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub status: ItemStatus,
    #[serde(default, deserialize_with = "deserialize_blocks")]
    pub info_blocks: Vec<InfoBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_path: Option<String>,
}

impl Item {
    pub fn rank(&self) -> Rank {
        Rank::from_code(&self.color)
    }

    pub fn display_name(&self, lang: &str) -> &str {
        self.name.resolve(lang)
    }
}

// ---------------------------------------------------------------------------
// Listing / repository metadata
// ---------------------------------------------------------------------------

/// One entry of the database `listing.json`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Listing {
    /// Path of the item document, relative to the database root.
    pub data: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default, deserialize_with = "optional_translation")]
    pub name: Option<TranslationString>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub status: Option<ItemStatus>,
}

/// Repository metadata from the GitHub API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RepoInfo {
    pub updated_at: String,
}
