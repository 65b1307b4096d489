//! Change feed types
//!
//! Every successful write to the store publishes a [`ChangeEvent`] shaped like
//! a postgres change notification: schema, table, event type, commit time and
//! the new/old row images as JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Schema name carried on every change event
pub const SCHEMA: &str = "public";

/// Tables known to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    AbandonedCarts,
    RecoveryCampaigns,
    Subscriptions,
}

impl Table {
    /// All tables, in schema creation order
    pub fn all() -> &'static [Table] {
        &[
            Table::AbandonedCarts,
            Table::RecoveryCampaigns,
            Table::Subscriptions,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Table::AbandonedCarts => "abandoned_carts",
            Table::RecoveryCampaigns => "recovery_campaigns",
            Table::Subscriptions => "subscriptions",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Table {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Table::all()
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Unknown table: {}", s))
    }
}

/// Kind of row-level change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Insert => "insert",
            ChangeKind::Update => "update",
            ChangeKind::Delete => "delete",
        }
    }
}

/// Event filter for a subscription: one kind, or `*` for all of them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChangeFilter {
    #[default]
    All,
    Only(ChangeKind),
}

impl ChangeFilter {
    pub fn matches(&self, kind: ChangeKind) -> bool {
        match self {
            ChangeFilter::All => true,
            ChangeFilter::Only(k) => *k == kind,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeFilter::All => "*",
            ChangeFilter::Only(kind) => kind.as_str(),
        }
    }
}

impl fmt::Display for ChangeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "*" | "all" => Ok(ChangeFilter::All),
            "insert" => Ok(ChangeFilter::Only(ChangeKind::Insert)),
            "update" => Ok(ChangeFilter::Only(ChangeKind::Update)),
            "delete" => Ok(ChangeFilter::Only(ChangeKind::Delete)),
            _ => Err(format!(
                "Invalid event: {}. Use insert, update, delete, or *",
                s
            )),
        }
    }
}

/// A row-level change published by the store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChangeEvent {
    pub schema: String,
    pub table: Table,
    #[serde(rename = "eventType")]
    pub event_type: ChangeKind,
    pub commit_timestamp: DateTime<Utc>,
    /// Row image after the change (null for deletes)
    pub new: serde_json::Value,
    /// Row image before the change (null for inserts)
    pub old: serde_json::Value,
}

impl ChangeEvent {
    pub fn insert(table: Table, new: serde_json::Value) -> Self {
        Self::build(table, ChangeKind::Insert, new, serde_json::Value::Null)
    }

    pub fn update(table: Table, old: serde_json::Value, new: serde_json::Value) -> Self {
        Self::build(table, ChangeKind::Update, new, old)
    }

    fn build(
        table: Table,
        event_type: ChangeKind,
        new: serde_json::Value,
        old: serde_json::Value,
    ) -> Self {
        Self {
            schema: SCHEMA.to_string(),
            table,
            event_type,
            commit_timestamp: Utc::now(),
            new,
            old,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_round_trip_names() {
        for table in Table::all() {
            assert_eq!(table.as_str().parse::<Table>().unwrap(), *table);
        }
        assert!("carts".parse::<Table>().is_err());
    }

    #[test]
    fn test_filter_matches() {
        assert!(ChangeFilter::All.matches(ChangeKind::Delete));
        let only_insert = ChangeFilter::Only(ChangeKind::Insert);
        assert!(only_insert.matches(ChangeKind::Insert));
        assert!(!only_insert.matches(ChangeKind::Update));
    }

    #[test]
    fn test_filter_parse() {
        assert_eq!("*".parse::<ChangeFilter>().unwrap(), ChangeFilter::All);
        assert_eq!(
            "UPDATE".parse::<ChangeFilter>().unwrap(),
            ChangeFilter::Only(ChangeKind::Update)
        );
        assert!("upsert".parse::<ChangeFilter>().is_err());
    }

    #[test]
    fn test_change_event_serialize() {
        let event = ChangeEvent::insert(
            Table::AbandonedCarts,
            serde_json::json!({"id": "abc", "recovered": false}),
        );
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"schema\":\"public\""));
        assert!(json.contains("\"table\":\"abandoned_carts\""));
        assert!(json.contains("\"eventType\":\"INSERT\""));
        assert!(json.contains("\"old\":null"));
    }
}
