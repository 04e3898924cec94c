use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use marriage_common::TenantId;
use marriage_domain::{Marriage, MarriageId, MarriageStatus};

use crate::engine::Store;
use crate::error::StoreError;

fn status_to_str(status: MarriageStatus) -> &'static str {
    match status {
        MarriageStatus::Proposed => "PROPOSED",
        MarriageStatus::Engaged => "ENGAGED",
        MarriageStatus::Married => "MARRIED",
        MarriageStatus::Divorced => "DIVORCED",
        MarriageStatus::Expired => "EXPIRED",
    }
}

fn status_from_str(s: &str) -> Result<MarriageStatus, StoreError> {
    Ok(match s {
        "PROPOSED" => MarriageStatus::Proposed,
        "ENGAGED" => MarriageStatus::Engaged,
        "MARRIED" => MarriageStatus::Married,
        "DIVORCED" => MarriageStatus::Divorced,
        "EXPIRED" => MarriageStatus::Expired,
        other => return Err(StoreError::Corrupt(format!("unknown marriage status {other}"))),
    })
}

type MarriageRow = (i64, String, u32, u32, String, DateTime<Utc>, Option<DateTime<Utc>>, Option<DateTime<Utc>>, Option<DateTime<Utc>>, DateTime<Utc>, DateTime<Utc>);

fn row_to_marriage(row: &Row<'_>) -> rusqlite::Result<MarriageRow> {
    Ok((
        row.get("id")?,
        row.get("tenant_id")?,
        row.get::<_, i64>("character_id_1")? as u32,
        row.get::<_, i64>("character_id_2")? as u32,
        row.get("status")?,
        row.get("proposed_at")?,
        row.get("engaged_at")?,
        row.get("married_at")?,
        row.get("divorced_at")?,
        row.get("created_at")?,
        row.get("updated_at")?,
    ))
}

fn assemble(tuple: MarriageRow) -> Result<Marriage, StoreError> {
    let (id, tenant_id, character_id_1, character_id_2, status, proposed_at, engaged_at, married_at, divorced_at, created_at, updated_at) = tuple;
    Ok(Marriage {
        id: MarriageId(id as u32),
        tenant_id: tenant_id.parse::<TenantId>().map_err(|e| StoreError::Corrupt(e.to_string()))?,
        character_id_1,
        character_id_2,
        status: status_from_str(&status)?,
        proposed_at,
        engaged_at,
        married_at,
        divorced_at,
        created_at,
        updated_at,
    })
}

impl Store {
    pub fn create_marriage(&self, marriage: &Marriage) -> Result<Marriage, StoreError> {
        self.conn().execute(
            "INSERT INTO marriages (tenant_id, character_id_1, character_id_2, status, proposed_at, engaged_at, married_at, divorced_at, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                marriage.tenant_id.to_string(),
                marriage.character_id_1,
                marriage.character_id_2,
                status_to_str(marriage.status),
                marriage.proposed_at.to_rfc3339(),
                marriage.engaged_at.map(|t| t.to_rfc3339()),
                marriage.married_at.map(|t| t.to_rfc3339()),
                marriage.divorced_at.map(|t| t.to_rfc3339()),
                marriage.created_at.to_rfc3339(),
                marriage.updated_at.to_rfc3339(),
            ],
        )?;
        let id = self.conn().last_insert_rowid();
        self.get_marriage(MarriageId(id as u32), marriage.tenant_id)?.ok_or(StoreError::NotFound)
    }

    pub fn update_marriage(&self, marriage: &Marriage) -> Result<(), StoreError> {
        let changed = self.conn().execute(
            "UPDATE marriages SET status = ?1, engaged_at = ?2, married_at = ?3, divorced_at = ?4, updated_at = ?5
             WHERE id = ?6 AND tenant_id = ?7",
            params![
                status_to_str(marriage.status),
                marriage.engaged_at.map(|t| t.to_rfc3339()),
                marriage.married_at.map(|t| t.to_rfc3339()),
                marriage.divorced_at.map(|t| t.to_rfc3339()),
                marriage.updated_at.to_rfc3339(),
                marriage.id.0,
                marriage.tenant_id.to_string(),
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    pub fn get_marriage(&self, id: MarriageId, tenant_id: TenantId) -> Result<Option<Marriage>, StoreError> {
        let row = self
            .conn()
            .query_row(
                "SELECT * FROM marriages WHERE id = ?1 AND tenant_id = ?2",
                params![id.0, tenant_id.to_string()],
                row_to_marriage,
            )
            .optional()?;
        row.map(assemble).transpose()
    }

    /// The character's current non-terminal marriage, if any (at most one per character;
    /// backs `GET /characters/{id}/marriage`).
    pub fn active_marriage_for_character(&self, tenant_id: TenantId, character_id: u32) -> Result<Option<Marriage>, StoreError> {
        let row = self
            .conn()
            .query_row(
                "SELECT * FROM marriages WHERE tenant_id = ?1 AND (character_id_1 = ?2 OR character_id_2 = ?2)
                 AND status IN ('PROPOSED', 'ENGAGED', 'MARRIED')",
                params![tenant_id.to_string(), character_id],
                row_to_marriage,
            )
            .optional()?;
        row.map(assemble).transpose()
    }

    /// All marriages involving the character, newest first (REST `/marriage/history`).
    pub fn marriage_history_for_character(&self, tenant_id: TenantId, character_id: u32) -> Result<Vec<Marriage>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT * FROM marriages WHERE tenant_id = ?1 AND (character_id_1 = ?2 OR character_id_2 = ?2)
             ORDER BY created_at DESC",
        )?;
        let rows = stmt
            .query_map(params![tenant_id.to_string(), character_id], row_to_marriage)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(assemble).collect()
    }

    /// Non-terminal marriages for a character, for `HandleCharacterDeletion`.
    pub fn non_terminal_marriages_for_character(&self, tenant_id: TenantId, character_id: u32) -> Result<Vec<Marriage>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT * FROM marriages WHERE tenant_id = ?1 AND (character_id_1 = ?2 OR character_id_2 = ?2)
             AND status IN ('PROPOSED', 'ENGAGED', 'MARRIED')",
        )?;
        let rows = stmt
            .query_map(params![tenant_id.to_string(), character_id], row_to_marriage)?
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
    fn active_marriage_lookup() {
        let store = Store::open_memory().unwrap();
        let tenant_id = tenant();
        let now = Utc::now();
        let marriage = Marriage::propose(MarriageId(0), tenant_id, 1, 2, now).unwrap();
        store.create_marriage(&marriage).unwrap();
        let active = store.active_marriage_for_character(tenant_id, 1).unwrap();
        assert!(active.is_some());
        assert!(store.active_marriage_for_character(tenant_id, 99).unwrap().is_none());
    }
}
