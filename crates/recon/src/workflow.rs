//! Role-gated discrepancy workflow.
//!
//! The state machine is a validated edge list: each edge names a source
//! status, a target status, and the roles allowed to drive it. Missing edge
//! and missing role are distinct failures so callers can tell a broken
//! request from an authorization problem.

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::error::ReconError;
use crate::model::{Actor, AuditAction, Discrepancy, DiscrepancyStatus, EntityType, Role};
use crate::store::MemoryStore;

// ---------------------------------------------------------------------------
// Definition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct WorkflowEdge {
    pub from: DiscrepancyStatus,
    pub to: DiscrepancyStatus,
    pub roles: Vec<Role>,
}

/// The transition table. Constructed once and treated as immutable; custom
/// tables go through `new` so the validity checks always run.
#[derive(Debug, Clone)]
pub struct WorkflowDefinition {
    edges: Vec<WorkflowEdge>,
}

impl WorkflowDefinition {
    pub fn new(edges: Vec<WorkflowEdge>) -> Result<Self, ReconError> {
        for edge in &edges {
            if edge.from == edge.to {
                return Err(ReconError::ConfigValidation(format!(
                    "workflow edge '{}' -> '{}' is a self-loop",
                    edge.from, edge.to
                )));
            }
            if edge.roles.is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "workflow edge '{}' -> '{}' permits no roles",
                    edge.from, edge.to
                )));
            }
            if edge.roles.contains(&Role::System) {
                return Err(ReconError::ConfigValidation(format!(
                    "workflow edge '{}' -> '{}' must not whitelist the system role",
                    edge.from, edge.to
                )));
            }
        }
        let mut seen: Vec<(DiscrepancyStatus, DiscrepancyStatus)> = Vec::new();
        for edge in &edges {
            if seen.contains(&(edge.from, edge.to)) {
                return Err(ReconError::ConfigValidation(format!(
                    "duplicate workflow edge '{}' -> '{}'",
                    edge.from, edge.to
                )));
            }
            seen.push((edge.from, edge.to));
        }
        // Completeness: a source state the review flow can never reach from
        // `open` makes its edges dead.
        let mut reachable = vec![DiscrepancyStatus::Open];
        let mut grew = true;
        while grew {
            grew = false;
            for edge in &edges {
                if reachable.contains(&edge.from) && !reachable.contains(&edge.to) {
                    reachable.push(edge.to);
                    grew = true;
                }
            }
        }
        for edge in &edges {
            if !reachable.contains(&edge.from) {
                return Err(ReconError::ConfigValidation(format!(
                    "workflow edge '{}' -> '{}' is unreachable from 'open'",
                    edge.from, edge.to
                )));
            }
        }
        Ok(Self { edges })
    }

    /// The table used in production. Review moves are open to operators;
    /// closing a discrepancy takes a supervisor; only an admin reopens a
    /// resolved one or closes a dispute.
    pub fn standard() -> Self {
        use DiscrepancyStatus::*;
        use Role::*;
        let all = || vec![Operator, Supervisor, Admin];
        let senior = || vec![Supervisor, Admin];
        let edges = vec![
            WorkflowEdge { from: Open, to: UnderReview, roles: all() },
            WorkflowEdge { from: Open, to: Resolved, roles: senior() },
            WorkflowEdge { from: Open, to: Ignored, roles: senior() },
            WorkflowEdge { from: UnderReview, to: Open, roles: all() },
            WorkflowEdge { from: UnderReview, to: Resolved, roles: senior() },
            WorkflowEdge { from: UnderReview, to: Disputed, roles: all() },
            WorkflowEdge { from: Resolved, to: Open, roles: vec![Admin] },
            WorkflowEdge { from: Disputed, to: UnderReview, roles: senior() },
            WorkflowEdge { from: Disputed, to: Resolved, roles: vec![Admin] },
            WorkflowEdge { from: Ignored, to: Open, roles: senior() },
        ];
        // Table is static and covered by tests, so this cannot fail.
        Self::new(edges).expect("standard workflow table is valid")
    }

    /// Check one move. Edge lookup happens before the role check.
    pub fn check(
        &self,
        from: DiscrepancyStatus,
        to: DiscrepancyStatus,
        role: Role,
    ) -> Result<(), ReconError> {
        let edge = self
            .edges
            .iter()
            .find(|e| e.from == from && e.to == to)
            .ok_or(ReconError::InvalidTransition { from, to })?;
        if !edge.roles.contains(&role) {
            return Err(ReconError::RoleNotPermitted { role, from, to });
        }
        Ok(())
    }

    /// Targets reachable from `from` for `role`, with display labels.
    pub fn available(&self, from: DiscrepancyStatus, role: Role) -> Vec<TransitionOption> {
        self.edges
            .iter()
            .filter(|e| e.from == from && e.roles.contains(&role))
            .map(|e| {
                let (label, label_hindi) = status_labels(e.to);
                TransitionOption { to: e.to, label: label.into(), label_hindi: label_hindi.into() }
            })
            .collect()
    }

    pub fn edges(&self) -> &[WorkflowEdge] {
        &self.edges
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TransitionOption {
    pub to: DiscrepancyStatus,
    pub label: String,
    pub label_hindi: String,
}

pub fn status_labels(status: DiscrepancyStatus) -> (&'static str, &'static str) {
    match status {
        DiscrepancyStatus::Open => ("Open", "खुला"),
        DiscrepancyStatus::UnderReview => ("Under Review", "समीक्षाधीन"),
        DiscrepancyStatus::Resolved => ("Resolved", "सुलझाया गया"),
        DiscrepancyStatus::Disputed => ("Disputed", "विवादित"),
        DiscrepancyStatus::Ignored => ("Ignored", "नज़रअंदाज़ किया गया"),
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Outcome of a bulk move. `skipped` holds items that were rejected up
/// front (missing, no such edge, role denied); `failed` holds items where
/// the apply step itself errored.
#[derive(Debug, Default, Serialize)]
pub struct BulkOutcome {
    pub succeeded: Vec<Uuid>,
    pub skipped: Vec<(Uuid, String)>,
    pub failed: Vec<(Uuid, String)>,
}

impl BulkOutcome {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.skipped.len() + self.failed.len()
    }
}

#[derive(Debug, Clone)]
pub struct WorkflowEngine {
    definition: WorkflowDefinition,
}

impl WorkflowEngine {
    pub fn new(definition: WorkflowDefinition) -> Self {
        Self { definition }
    }

    pub fn standard() -> Self {
        Self::new(WorkflowDefinition::standard())
    }

    pub fn definition(&self) -> &WorkflowDefinition {
        &self.definition
    }

    pub fn available_transitions(
        &self,
        status: DiscrepancyStatus,
        role: Role,
    ) -> Vec<TransitionOption> {
        self.definition.available(status, role)
    }

    /// Move one discrepancy. The status change and its audit entry land
    /// together or not at all: validation happens on a copy, the store is
    /// only touched after every check passed.
    pub fn transition(
        &self,
        store: &mut MemoryStore,
        id: Uuid,
        to: DiscrepancyStatus,
        actor: &Actor,
        remarks: Option<&str>,
    ) -> Result<Discrepancy, ReconError> {
        let mut discrepancy = store
            .discrepancy(id)
            .cloned()
            .ok_or(ReconError::NotFound { entity: "discrepancy", id })?;
        let from = discrepancy.status;
        self.definition.check(from, to, actor.role)?;

        let now = Utc::now();
        discrepancy.status = to;
        discrepancy.updated_at = now;
        match to {
            DiscrepancyStatus::Resolved => {
                discrepancy.resolved_by = Some(actor.name.clone());
                discrepancy.resolved_at = Some(now);
                discrepancy.resolution_remarks = remarks.map(str::to_owned);
            }
            DiscrepancyStatus::Open if from == DiscrepancyStatus::Resolved => {
                discrepancy.resolved_by = None;
                discrepancy.resolved_at = None;
                discrepancy.resolution_remarks = None;
            }
            _ => {}
        }

        tracing::info!(
            discrepancy = %id,
            from = %from,
            to = %to,
            actor = %actor.name,
            role = %actor.role,
            "workflow transition"
        );

        store.replace_discrepancy(discrepancy.clone());
        store.ledger_mut().record(
            EntityType::Discrepancy,
            id,
            AuditAction::StatusChange,
            Some(json!({ "status": from })),
            Some(json!({ "status": to })),
            actor,
            remarks.map(str::to_owned),
        );
        Ok(discrepancy)
    }

    /// Apply the same move to many discrepancies. Items are independent: a
    /// rejected or failed item never blocks the rest.
    pub fn bulk_transition(
        &self,
        store: &mut MemoryStore,
        ids: &[Uuid],
        to: DiscrepancyStatus,
        actor: &Actor,
        remarks: Option<&str>,
    ) -> BulkOutcome {
        let mut outcome = BulkOutcome::default();
        for &id in ids {
            match self.transition(store, id, to, actor, remarks) {
                Ok(_) => outcome.succeeded.push(id),
                Err(
                    e @ (ReconError::NotFound { .. }
                    | ReconError::InvalidTransition { .. }
                    | ReconError::RoleNotPermitted { .. }),
                ) => outcome.skipped.push((id, e.to_string())),
                Err(e) => outcome.failed.push((id, e.to_string())),
            }
        }
        tracing::info!(
            to = %to,
            requested = ids.len(),
            succeeded = outcome.succeeded.len(),
            skipped = outcome.skipped.len(),
            failed = outcome.failed.len(),
            "bulk workflow transition"
        );
        outcome
    }
}
