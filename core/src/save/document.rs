//! Serde model of the save document.
//!
//! The structure mirrors the XML vocabulary exactly: player sections
//! own their record lists, so the enclosing-owner relationship the
//! extractor depends on is preserved by construction rather than
//! reconstructed with a reverse lookup.
//!
//! Required-field policy: record-level `Type`/`Turn` are modeled as
//! `Option` so a record missing one still deserializes; the extractor
//! skips and counts it instead of failing the whole document.

use quick_xml::de::from_str;
use serde::Deserialize;

use crate::error::ParseError;

/// Root of one save document.
#[derive(Debug, Default, Deserialize)]
pub struct SaveDocument {
    /// Final turn of the session.
    #[serde(rename = "@Turn", default)]
    pub turn: i64,

    #[serde(rename = "Player", default)]
    pub players: Vec<PlayerSection>,

    #[serde(rename = "City", default)]
    pub cities: Vec<CityNode>,

    #[serde(rename = "Character", default)]
    pub characters: Vec<CharacterNode>,
}

/// One player's own section. The 0-based `id` attribute is the source
/// id every contained record implicitly belongs to.
#[derive(Debug, Deserialize)]
pub struct PlayerSection {
    #[serde(rename = "@ID")]
    pub id: i64,

    #[serde(rename = "@Name", default)]
    pub name: String,

    #[serde(rename = "@Nation")]
    pub nation: Option<String>,

    #[serde(rename = "LogList", default)]
    pub log_list: LogList,

    #[serde(rename = "MemoryList", default)]
    pub memory_list: MemoryList,

    #[serde(rename = "StatList", default)]
    pub stat_list: StatList,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogList {
    #[serde(rename = "LogData", default)]
    pub records: Vec<LogRecord>,
}

/// One chronological turn-log record: required type and turn, up to
/// three positional data attributes, free-form element text.
#[derive(Debug, Deserialize)]
pub struct LogRecord {
    #[serde(rename = "@Type")]
    pub kind: Option<String>,

    #[serde(rename = "@Turn")]
    pub turn: Option<i64>,

    #[serde(rename = "@Data1")]
    pub data1: Option<String>,

    #[serde(rename = "@Data2")]
    pub data2: Option<String>,

    #[serde(rename = "@Data3")]
    pub data3: Option<String>,

    #[serde(rename = "$text")]
    pub text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MemoryList {
    #[serde(rename = "MemoryData", default)]
    pub records: Vec<MemoryRecord>,
}

/// One AI-perspective memory record. `subject` is the explicit
/// subject-player attribute some memory types carry; when absent the
/// record concerns the enclosing section's owner.
#[derive(Debug, Deserialize)]
pub struct MemoryRecord {
    #[serde(rename = "@Type")]
    pub kind: Option<String>,

    #[serde(rename = "@Turn")]
    pub turn: Option<i64>,

    /// 0-based source id of the player this memory concerns.
    #[serde(rename = "@Player")]
    pub subject: Option<i64>,

    #[serde(rename = "@Tribe")]
    pub tribe: Option<String>,

    #[serde(rename = "$text")]
    pub text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatList {
    #[serde(rename = "Stat", default)]
    pub records: Vec<StatRecord>,
}

/// One per-turn metric sample.
#[derive(Debug, Deserialize)]
pub struct StatRecord {
    #[serde(rename = "@Type")]
    pub kind: Option<String>,

    #[serde(rename = "@Turn")]
    pub turn: Option<i64>,

    #[serde(rename = "@Value", default)]
    pub value: i64,

    /// 0-based source id of the entity an opinion-style metric targets.
    #[serde(rename = "@Target")]
    pub target: Option<i64>,
}

/// A city block. `player` is the current owner, `founder` the original
/// founder; both 0-based in the source.
#[derive(Debug, Deserialize)]
pub struct CityNode {
    #[serde(rename = "@ID")]
    pub id: i64,

    #[serde(rename = "@Name", default)]
    pub name: String,

    #[serde(rename = "@Player")]
    pub player: i64,

    #[serde(rename = "@Founder")]
    pub founder: i64,

    #[serde(rename = "@FoundedTurn")]
    pub founded_turn: Option<i64>,
}

/// A ruler/character block.
#[derive(Debug, Deserialize)]
pub struct CharacterNode {
    #[serde(rename = "@ID")]
    pub id: i64,

    #[serde(rename = "@Name", default)]
    pub name: String,

    #[serde(rename = "@Player")]
    pub player: Option<i64>,

    #[serde(rename = "@Role")]
    pub role: Option<String>,
}

/// Deserialize one save document.
pub fn parse_document(xml: &str) -> Result<SaveDocument, ParseError> {
    Ok(from_str(xml)?)
}
