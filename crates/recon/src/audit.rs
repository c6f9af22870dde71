//! Append-only audit ledger.
//!
//! Entries are never updated or removed once recorded; corrections are new
//! entries. Query views return newest-first.

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::model::{Actor, AuditAction, AuditEntry, EntityType};

#[derive(Debug, Default)]
pub struct AuditLedger {
    entries: Vec<AuditEntry>,
    next_seq: u64,
}

impl AuditLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one entry and return a clone of it. The original stays in the
    /// ledger and cannot be mutated through any public path.
    pub fn record(
        &mut self,
        entity_type: EntityType,
        entity_id: Uuid,
        action: AuditAction,
        old_values: Option<Value>,
        new_values: Option<Value>,
        actor: &Actor,
        remarks: Option<String>,
    ) -> AuditEntry {
        let entry = AuditEntry {
            id: Uuid::new_v4(),
            seq: self.next_seq,
            entity_type,
            entity_id,
            action,
            old_values,
            new_values,
            actor: actor.name.clone(),
            role: actor.role,
            remarks,
            timestamp: Utc::now(),
        };
        self.next_seq += 1;
        self.entries.push(entry.clone());
        entry
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Trail for one entity, newest first, bounded.
    pub fn entity_history(
        &self,
        entity_type: EntityType,
        entity_id: Uuid,
        limit: usize,
    ) -> Vec<&AuditEntry> {
        let mut out: Vec<&AuditEntry> = self
            .entries
            .iter()
            .filter(|e| e.entity_type == entity_type && e.entity_id == entity_id)
            .collect();
        out.sort_by(|a, b| b.seq.cmp(&a.seq));
        out.truncate(limit);
        out
    }

    /// Everything a named actor did, newest first, bounded.
    pub fn user_activity(&self, actor_name: &str, limit: usize) -> Vec<&AuditEntry> {
        let mut out: Vec<&AuditEntry> = self
            .entries
            .iter()
            .filter(|e| e.actor == actor_name)
            .collect();
        out.sort_by(|a, b| b.seq.cmp(&a.seq));
        out.truncate(limit);
        out
    }

    /// Most recent entries across all entities, optionally filtered by
    /// entity type and action.
    pub fn recent_changes(
        &self,
        entity_type: Option<EntityType>,
        action: Option<AuditAction>,
        limit: usize,
    ) -> Vec<&AuditEntry> {
        let mut out: Vec<&AuditEntry> = self
            .entries
            .iter()
            .filter(|e| entity_type.map_or(true, |t| e.entity_type == t))
            .filter(|e| action.map_or(true, |a| e.action == a))
            .collect();
        out.sort_by(|a, b| b.seq.cmp(&a.seq));
        out.truncate(limit);
        out
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    /// Rebuild from persisted entries; `next_seq` resumes past the highest
    /// seq seen.
    pub fn from_entries(entries: Vec<AuditEntry>) -> Self {
        let next_seq = entries.iter().map(|e| e.seq + 1).max().unwrap_or(0);
        Self { entries, next_seq }
    }
}
