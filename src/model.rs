//! Meetings Document Schema
//!
//! Typed view of the input JSON. Deserializing is the validation step: a record
//! missing a required field is rejected here, before anything touches the store.

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;

// ============================================================================
// Document
// ============================================================================

/// Top-level object: meeting key -> meeting records, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeetingsDocument {
    pub groups: Vec<MeetingGroup>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeetingGroup {
    pub meeting_id: String,
    pub meetings: Vec<MeetingRecord>,
}

impl MeetingsDocument {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn meeting_count(&self) -> usize {
        self.groups.iter().map(|g| g.meetings.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl<'de> Deserialize<'de> for MeetingsDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DocumentVisitor;

        impl<'de> Visitor<'de> for DocumentVisitor {
            type Value = MeetingsDocument;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping meeting ids to lists of meetings")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut groups = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((meeting_id, meetings)) =
                    access.next_entry::<String, Vec<MeetingRecord>>()?
                {
                    groups.push(MeetingGroup { meeting_id, meetings });
                }
                Ok(MeetingsDocument { groups })
            }
        }

        deserializer.deserialize_map(DocumentVisitor)
    }
}

// ============================================================================
// Records
// ============================================================================

/// Optional fields treat an explicit `null` the same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub workgroup: String,
    #[serde(default, rename = "workgroup_id", deserialize_with = "null_as_default")]
    pub workgroup_id: String,
    pub meeting_info: MeetingInfo,
    pub agenda_items: Vec<AgendaItem>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingInfo {
    pub name: String,
    pub date: String,
    pub host: String,
    pub documenter: String,
    pub purpose: String,
    /// Comma-separated attendee names.
    pub people_present: String,
    pub working_docs: Vec<WorkingDoc>,
}

impl MeetingInfo {
    /// Attendee names split on commas and trimmed. Blank pieces are skipped;
    /// duplicates are kept and collapsed later by the graph builder.
    pub fn attendees(&self) -> Vec<&str> {
        self.people_present
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorkingDoc {
    pub title: String,
    pub link: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgendaItem {
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(deserialize_with = "null_as_default")]
    pub narrative: String,
    #[serde(deserialize_with = "null_as_default")]
    pub discussion_points: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub decision_items: Vec<DecisionItem>,
    #[serde(deserialize_with = "null_as_default")]
    pub action_items: Vec<ActionItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DecisionItem {
    #[serde(deserialize_with = "null_as_default")]
    pub decision: String,
    #[serde(deserialize_with = "null_as_default")]
    pub rationale: String,
    #[serde(deserialize_with = "null_as_default")]
    pub opposing: String,
    #[serde(deserialize_with = "null_as_default")]
    pub effect: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActionItem {
    #[serde(deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(deserialize_with = "null_as_default")]
    pub due_date: String,
    /// Items without an assignee are never written to the graph.
    pub assignee: Option<String>,
}
