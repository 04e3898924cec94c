use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use marriage_common::TenantId;
use marriage_domain::{Ceremony, CeremonyId, CeremonyStatus, MarriageId};

use crate::engine::Store;
use crate::error::StoreError;

fn status_to_str(status: CeremonyStatus) -> &'static str {
    match status {
        CeremonyStatus::Scheduled => "SCHEDULED",
        CeremonyStatus::Active => "ACTIVE",
        CeremonyStatus::Completed => "COMPLETED",
        CeremonyStatus::Cancelled => "CANCELLED",
        CeremonyStatus::Postponed => "POSTPONED",
    }
}

fn status_from_str(s: &str) -> Result<CeremonyStatus, StoreError> {
    Ok(match s {
        "SCHEDULED" => CeremonyStatus::Scheduled,
        "ACTIVE" => CeremonyStatus::Active,
        "COMPLETED" => CeremonyStatus::Completed,
        "CANCELLED" => CeremonyStatus::Cancelled,
        "POSTPONED" => CeremonyStatus::Postponed,
        other => return Err(StoreError::Corrupt(format!("unknown ceremony status {other}"))),
    })
}

#[allow(clippy::type_complexity)]
type CeremonyRow = (
    i64,
    String,
    i64,
    u32,
    u32,
    String,
    DateTime<Utc>,
    Option<DateTime<Utc>>,
    Option<DateTime<Utc>>,
    Option<DateTime<Utc>>,
    Option<DateTime<Utc>>,
    String,
    DateTime<Utc>,
    DateTime<Utc>,
);

fn row_to_ceremony(row: &Row<'_>) -> rusqlite::Result<CeremonyRow> {
    Ok((
        row.get("id")?,
        row.get("tenant_id")?,
        row.get("marriage_id")?,
        row.get::<_, i64>("character_id_1")? as u32,
        row.get::<_, i64>("character_id_2")? as u32,
        row.get("status")?,
        row.get("scheduled_at")?,
        row.get("started_at")?,
        row.get("completed_at")?,
        row.get("cancelled_at")?,
        row.get("postponed_at")?,
        row.get("invitees")?,
        row.get("created_at")?,
        row.get("updated_at")?,
    ))
}

fn assemble(tuple: CeremonyRow) -> Result<Ceremony, StoreError> {
    let (id, tenant_id, marriage_id, character_id_1, character_id_2, status, scheduled_at, started_at, completed_at, cancelled_at, postponed_at, invitees, created_at, updated_at) = tuple;
    Ok(Ceremony {
        id: CeremonyId(id as u32),
        tenant_id: tenant_id.parse::<TenantId>().map_err(|e| StoreError::Corrupt(e.to_string()))?,
        marriage_id: MarriageId(marriage_id as u32),
        character_id_1,
        character_id_2,
        status: status_from_str(&status)?,
        scheduled_at,
        started_at,
        completed_at,
        cancelled_at,
        postponed_at,
        invitees: serde_json::from_str(&invitees)?,
        created_at,
        updated_at,
    })
}

impl Store {
    pub fn create_ceremony(&self, ceremony: &Ceremony) -> Result<Ceremony, StoreError> {
        self.conn().execute(
            "INSERT INTO ceremonies (tenant_id, marriage_id, character_id_1, character_id_2, status, scheduled_at, started_at, completed_at, cancelled_at, postponed_at, invitees, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                ceremony.tenant_id.to_string(),
                ceremony.marriage_id.0,
                ceremony.character_id_1,
                ceremony.character_id_2,
                status_to_str(ceremony.status),
                ceremony.scheduled_at.to_rfc3339(),
                ceremony.started_at.map(|t| t.to_rfc3339()),
                ceremony.completed_at.map(|t| t.to_rfc3339()),
                ceremony.cancelled_at.map(|t| t.to_rfc3339()),
                ceremony.postponed_at.map(|t| t.to_rfc3339()),
                serde_json::to_string(&ceremony.invitees)?,
                ceremony.created_at.to_rfc3339(),
                ceremony.updated_at.to_rfc3339(),
            ],
        )?;
        let id = self.conn().last_insert_rowid();
        self.get_ceremony(CeremonyId(id as u32), ceremony.tenant_id)?.ok_or(StoreError::NotFound)
    }

    pub fn update_ceremony(&self, ceremony: &Ceremony) -> Result<(), StoreError> {
        let changed = self.conn().execute(
            "UPDATE ceremonies SET status = ?1, scheduled_at = ?2, started_at = ?3, completed_at = ?4, cancelled_at = ?5, postponed_at = ?6, invitees = ?7, updated_at = ?8
             WHERE id = ?9 AND tenant_id = ?10",
            params![
                status_to_str(ceremony.status),
                ceremony.scheduled_at.to_rfc3339(),
                ceremony.started_at.map(|t| t.to_rfc3339()),
                ceremony.completed_at.map(|t| t.to_rfc3339()),
                ceremony.cancelled_at.map(|t| t.to_rfc3339()),
                ceremony.postponed_at.map(|t| t.to_rfc3339()),
                serde_json::to_string(&ceremony.invitees)?,
                ceremony.updated_at.to_rfc3339(),
                ceremony.id.0,
                ceremony.tenant_id.to_string(),
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    pub fn get_ceremony(&self, id: CeremonyId, tenant_id: TenantId) -> Result<Option<Ceremony>, StoreError> {
        let row = self
            .conn()
            .query_row(
                "SELECT * FROM ceremonies WHERE id = ?1 AND tenant_id = ?2",
                params![id.0, tenant_id.to_string()],
                row_to_ceremony,
            )
            .optional()?;
        row.map(assemble).transpose()
    }

    /// The non-terminal ceremony linked to a marriage, if any (a marriage has at most one).
    pub fn active_ceremony_for_marriage(&self, tenant_id: TenantId, marriage_id: MarriageId) -> Result<Option<Ceremony>, StoreError> {
        let row = self
            .conn()
            .query_row(
                "SELECT * FROM ceremonies WHERE tenant_id = ?1 AND marriage_id = ?2 AND status IN ('SCHEDULED', 'ACTIVE', 'POSTPONED')",
                params![tenant_id.to_string(), marriage_id.0],
                row_to_ceremony,
            )
            .optional()?;
        row.map(assemble).transpose()
    }

    /// Active ceremonies that have sat past `DISCONNECTION_TIMEOUT` (ceremony timeout sweeper).
    pub fn stale_active_ceremonies(&self, cutoff: DateTime<Utc>) -> Result<Vec<Ceremony>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT * FROM ceremonies WHERE status = 'ACTIVE' AND started_at < ?1")?;
        let rows = stmt
            .query_map(params![cutoff.to_rfc3339()], row_to_ceremony)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(assemble).collect()
    }

    /// Upcoming (Scheduled) ceremonies, newest-scheduled first.
    pub fn upcoming_ceremonies(&self, tenant_id: TenantId) -> Result<Vec<Ceremony>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT * FROM ceremonies WHERE tenant_id = ?1 AND status = 'SCHEDULED' ORDER BY scheduled_at ASC")?;
        let rows = stmt
            .query_map(params![tenant_id.to_string()], row_to_ceremony)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(assemble).collect()
    }

    /// Active ceremonies across a tenant.
    pub fn active_ceremonies(&self, tenant_id: TenantId) -> Result<Vec<Ceremony>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT * FROM ceremonies WHERE tenant_id = ?1 AND status = 'ACTIVE'")?;
        let rows = stmt
            .query_map(params![tenant_id.to_string()], row_to_ceremony)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(assemble).collect()
    }

    /// Non-terminal ceremonies for a marriage, for `HandleCharacterDeletion` cascading cancel.
    pub fn non_terminal_ceremonies_for_marriage(&self, tenant_id: TenantId, marriage_id: MarriageId) -> Result<Vec<Ceremony>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT * FROM ceremonies WHERE tenant_id = ?1 AND marriage_id = ?2 AND status IN ('SCHEDULED', 'ACTIVE', 'POSTPONED')",
        )?;
        let rows = stmt
            .query_map(params![tenant_id.to_string(), marriage_id.0], row_to_ceremony)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(assemble).collect()
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
    fn stale_active_ceremony_detection() {
        let store = Store::open_memory().unwrap();
        let tenant_id = tenant();
        let now = Utc::now();
        let ceremony = Ceremony::schedule(CeremonyId(0), tenant_id, MarriageId(1), 1, 2, now, vec![], now)
            .unwrap()
            .start(now - chrono::Duration::minutes(10))
            .unwrap();
        store.create_ceremony(&ceremony).unwrap();
        let stale = store.stale_active_ceremonies(now - chrono::Duration::minutes(5)).unwrap();
        assert_eq!(stale.len(), 1);
    }
}
