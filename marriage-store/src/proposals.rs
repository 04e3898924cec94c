use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use marriage_common::TenantId;
use marriage_domain::{Proposal, ProposalId, ProposalStatus};

use crate::engine::Store;
use crate::error::StoreError;

fn status_to_str(status: ProposalStatus) -> &'static str {
    match status {
        ProposalStatus::Pending => "PENDING",
        ProposalStatus::Accepted => "ACCEPTED",
        ProposalStatus::Rejected => "REJECTED",
        ProposalStatus::Expired => "EXPIRED",
        ProposalStatus::Cancelled => "CANCELLED",
    }
}

fn status_from_str(s: &str) -> Result<ProposalStatus, StoreError> {
    Ok(match s {
        "PENDING" => ProposalStatus::Pending,
        "ACCEPTED" => ProposalStatus::Accepted,
        "REJECTED" => ProposalStatus::Rejected,
        "EXPIRED" => ProposalStatus::Expired,
        "CANCELLED" => ProposalStatus::Cancelled,
        other => return Err(StoreError::Corrupt(format!("unknown proposal status {other}"))),
    })
}

fn row_to_proposal(row: &Row<'_>) -> rusqlite::Result<(i64, String, u32, u32, String, DateTime<Utc>, Option<DateTime<Utc>>, DateTime<Utc>, u32, Option<DateTime<Utc>>, DateTime<Utc>, DateTime<Utc>)> {
    Ok((
        row.get("id")?,
        row.get("tenant_id")?,
        row.get::<_, i64>("proposer_id")? as u32,
        row.get::<_, i64>("target_id")? as u32,
        row.get("status")?,
        row.get("proposed_at")?,
        row.get("responded_at")?,
        row.get("expires_at")?,
        row.get::<_, i64>("rejection_count")? as u32,
        row.get("cooldown_until")?,
        row.get("created_at")?,
        row.get("updated_at")?,
    ))
}

fn assemble(tuple: (i64, String, u32, u32, String, DateTime<Utc>, Option<DateTime<Utc>>, DateTime<Utc>, u32, Option<DateTime<Utc>>, DateTime<Utc>, DateTime<Utc>)) -> Result<Proposal, StoreError> {
    let (id, tenant_id, proposer_id, target_id, status, proposed_at, responded_at, expires_at, rejection_count, cooldown_until, created_at, updated_at) = tuple;
    Ok(Proposal {
        id: ProposalId(id as u32),
        tenant_id: tenant_id.parse::<TenantId>().map_err(|e| StoreError::Corrupt(e.to_string()))?,
        proposer_id,
        target_id,
        status: status_from_str(&status)?,
        proposed_at,
        responded_at,
        expires_at,
        rejection_count,
        cooldown_until,
        created_at,
        updated_at,
    })
}

impl Store {
    /// Inserts a new proposal row, returning it with the id assigned by SQLite. Relies on the
    /// `idx_proposals_one_pending` partial unique index to reject a concurrent duplicate
    /// Pending proposal with a constraint-violation `StoreError::Sqlite`.
    pub fn create_proposal(&self, proposal: &Proposal) -> Result<Proposal, StoreError> {
        self.conn().execute(
            "INSERT INTO proposals (tenant_id, proposer_id, target_id, status, proposed_at, responded_at, expires_at, rejection_count, cooldown_until, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                proposal.tenant_id.to_string(),
                proposal.proposer_id,
                proposal.target_id,
                status_to_str(proposal.status),
                proposal.proposed_at.to_rfc3339(),
                proposal.responded_at.map(|t| t.to_rfc3339()),
                proposal.expires_at.to_rfc3339(),
                proposal.rejection_count,
                proposal.cooldown_until.map(|t| t.to_rfc3339()),
                proposal.created_at.to_rfc3339(),
                proposal.updated_at.to_rfc3339(),
            ],
        )?;
        let id = self.conn().last_insert_rowid();
        self.get_proposal(ProposalId(id as u32), proposal.tenant_id)?.ok_or(StoreError::NotFound)
    }

    pub fn update_proposal(&self, proposal: &Proposal) -> Result<(), StoreError> {
        let changed = self.conn().execute(
            "UPDATE proposals SET status = ?1, responded_at = ?2, rejection_count = ?3, cooldown_until = ?4, updated_at = ?5
             WHERE id = ?6 AND tenant_id = ?7",
            params![
                status_to_str(proposal.status),
                proposal.responded_at.map(|t| t.to_rfc3339()),
                proposal.rejection_count,
                proposal.cooldown_until.map(|t| t.to_rfc3339()),
                proposal.updated_at.to_rfc3339(),
                proposal.id.0,
                proposal.tenant_id.to_string(),
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    pub fn get_proposal(&self, id: ProposalId, tenant_id: TenantId) -> Result<Option<Proposal>, StoreError> {
        let row = self
            .conn()
            .query_row(
                "SELECT * FROM proposals WHERE id = ?1 AND tenant_id = ?2",
                params![id.0, tenant_id.to_string()],
                row_to_proposal,
            )
            .optional()?;
        row.map(assemble).transpose()
    }

    /// The Pending proposal, if any, between this exact ordered pair (concurrent-proposal check).
    pub fn find_pending_between(&self, tenant_id: TenantId, proposer_id: u32, target_id: u32) -> Result<Option<Proposal>, StoreError> {
        let row = self
            .conn()
            .query_row(
                "SELECT * FROM proposals WHERE tenant_id = ?1 AND proposer_id = ?2 AND target_id = ?3 AND status = 'PENDING'",
                params![tenant_id.to_string(), proposer_id, target_id],
                row_to_proposal,
            )
            .optional()?;
        row.map(assemble).transpose()
    }

    /// Most recent proposal sent by this proposer to anyone (global cooldown check).
    pub fn last_proposal_by_proposer(&self, tenant_id: TenantId, proposer_id: u32) -> Result<Option<Proposal>, StoreError> {
        let row = self
            .conn()
            .query_row(
                "SELECT * FROM proposals WHERE tenant_id = ?1 AND proposer_id = ?2 ORDER BY proposed_at DESC LIMIT 1",
                params![tenant_id.to_string(), proposer_id],
                row_to_proposal,
            )
            .optional()?;
        row.map(assemble).transpose()
    }

    /// Most recent proposal from this proposer to this specific target (per-target cooldown).
    pub fn last_proposal_to_target(&self, tenant_id: TenantId, proposer_id: u32, target_id: u32) -> Result<Option<Proposal>, StoreError> {
        let row = self
            .conn()
            .query_row(
                "SELECT * FROM proposals WHERE tenant_id = ?1 AND proposer_id = ?2 AND target_id = ?3 ORDER BY proposed_at DESC LIMIT 1",
                params![tenant_id.to_string(), proposer_id, target_id],
                row_to_proposal,
            )
            .optional()?;
        row.map(assemble).transpose()
    }

    /// Pending proposals where the character is proposer or target (REST `/marriage/proposals`).
    pub fn pending_proposals_for_character(&self, tenant_id: TenantId, character_id: u32) -> Result<Vec<Proposal>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT * FROM proposals WHERE tenant_id = ?1 AND status = 'PENDING' AND (proposer_id = ?2 OR target_id = ?2)
             ORDER BY proposed_at DESC",
        )?;
        let rows = stmt
            .query_map(params![tenant_id.to_string(), character_id], row_to_proposal)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(assemble).collect()
    }

    /// Pending proposals whose `expires_at` has passed, across all tenants (expiry sweeper).
    pub fn expired_pending_proposals(&self, now: DateTime<Utc>) -> Result<Vec<Proposal>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT * FROM proposals WHERE status = 'PENDING' AND expires_at < ?1")?;
        let rows = stmt
            .query_map(params![now.to_rfc3339()], row_to_proposal)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(assemble).collect()
    }

    /// All proposals between a pair, either direction, newest first (proposal history).
    pub fn proposal_history_between(&self, tenant_id: TenantId, character_a: u32, character_b: u32) -> Result<Vec<Proposal>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT * FROM proposals WHERE tenant_id = ?1
             AND ((proposer_id = ?2 AND target_id = ?3) OR (proposer_id = ?3 AND target_id = ?2))
             ORDER BY proposed_at DESC",
        )?;
        let rows = stmt
            .query_map(params![tenant_id.to_string(), character_a, character_b], row_to_proposal)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(assemble).collect()
    }

    /// Any non-terminal proposals involving the character, for `HandleCharacterDeletion`.
    pub fn non_terminal_proposals_for_character(&self, tenant_id: TenantId, character_id: u32) -> Result<Vec<Proposal>, StoreError> {
        self.pending_proposals_for_character(tenant_id, character_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn tenant() -> TenantId {
        TenantId::new(Uuid::new_v4())
    }

    #[test]
    fn create_and_fetch_roundtrip() {
        let store = Store::open_memory().unwrap();
        let tenant_id = tenant();
        let now = Utc::now();
        let proposal = Proposal::propose(ProposalId(0), tenant_id, 1, 2, now).unwrap();
        let created = store.create_proposal(&proposal).unwrap();
        let fetched = store.get_proposal(created.id, tenant_id).unwrap().unwrap();
        assert_eq!(fetched.proposer_id, 1);
        assert_eq!(fetched.target_id, 2);
        assert_eq!(fetched.status, ProposalStatus::Pending);
    }

    #[test]
    fn duplicate_pending_proposal_is_rejected_by_unique_index() {
        let store = Store::open_memory().unwrap();
        let tenant_id = tenant();
        let now = Utc::now();
        let first = Proposal::propose(ProposalId(0), tenant_id, 1, 2, now).unwrap();
        store.create_proposal(&first).unwrap();

        let second = Proposal::propose(ProposalId(0), tenant_id, 1, 2, now).unwrap();
        let err = store.create_proposal(&second).unwrap_err();
        assert!(matches!(err, StoreError::Sqlite(_)));
    }

    #[test]
    fn tenant_isolation_on_lookup() {
        let store = Store::open_memory().unwrap();
        let tenant_a = tenant();
        let tenant_b = tenant();
        let now = Utc::now();
        let proposal = Proposal::propose(ProposalId(0), tenant_a, 1, 2, now).unwrap();
        let created = store.create_proposal(&proposal).unwrap();
        assert!(store.get_proposal(created.id, tenant_b).unwrap().is_none());
    }
}
