/// DDL for the three aggregate tables plus the partial unique index backing the
/// "at most one Pending proposal per (proposer, target, tenant)" invariant.
///
/// Fixed at compile time rather than generated from a dynamic user-defined schema: the three
/// aggregates never change shape.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS proposals (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    tenant_id TEXT NOT NULL,
    proposer_id INTEGER NOT NULL,
    target_id INTEGER NOT NULL,
    status TEXT NOT NULL,
    proposed_at TEXT NOT NULL,
    responded_at TEXT,
    expires_at TEXT NOT NULL,
    rejection_count INTEGER NOT NULL DEFAULT 0,
    cooldown_until TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_proposals_one_pending
    ON proposals (tenant_id, proposer_id, target_id)
    WHERE status = 'PENDING';

CREATE INDEX IF NOT EXISTS idx_proposals_tenant_proposer ON proposals (tenant_id, proposer_id);
CREATE INDEX IF NOT EXISTS idx_proposals_tenant_target ON proposals (tenant_id, target_id);
CREATE INDEX IF NOT EXISTS idx_proposals_expiry ON proposals (status, expires_at);

CREATE TABLE IF NOT EXISTS marriages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    tenant_id TEXT NOT NULL,
    character_id_1 INTEGER NOT NULL,
    character_id_2 INTEGER NOT NULL,
    status TEXT NOT NULL,
    proposed_at TEXT NOT NULL,
    engaged_at TEXT,
    married_at TEXT,
    divorced_at TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_marriages_tenant_char1 ON marriages (tenant_id, character_id_1);
CREATE INDEX IF NOT EXISTS idx_marriages_tenant_char2 ON marriages (tenant_id, character_id_2);
CREATE INDEX IF NOT EXISTS idx_marriages_tenant_status ON marriages (tenant_id, status);

CREATE TABLE IF NOT EXISTS ceremonies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    tenant_id TEXT NOT NULL,
    marriage_id INTEGER NOT NULL,
    character_id_1 INTEGER NOT NULL,
    character_id_2 INTEGER NOT NULL,
    status TEXT NOT NULL,
    scheduled_at TEXT NOT NULL,
    started_at TEXT,
    completed_at TEXT,
    cancelled_at TEXT,
    postponed_at TEXT,
    invitees TEXT NOT NULL DEFAULT '[]',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_ceremonies_tenant_marriage ON ceremonies (tenant_id, marriage_id);
CREATE INDEX IF NOT EXISTS idx_ceremonies_active_timeout ON ceremonies (status, started_at);
CREATE INDEX IF NOT EXISTS idx_ceremonies_tenant_status ON ceremonies (tenant_id, status);
"#;
