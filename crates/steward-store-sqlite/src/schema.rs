//! SQL schema for the Steward SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// `requests.asset_id` and `assignments.asset_id` are deliberately not
/// foreign keys: an asset may be deleted while historical requests and
/// assignments keep referring to it through their snapshot columns.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS assets (
    asset_id           TEXT PRIMARY KEY,
    name               TEXT NOT NULL,
    image              TEXT,
    kind               TEXT NOT NULL,
    total_quantity     INTEGER NOT NULL,
    available_quantity INTEGER NOT NULL,
    organization       TEXT NOT NULL,
    added_by           TEXT NOT NULL,
    created_at         TEXT NOT NULL,   -- ISO 8601 UTC; server-assigned
    CHECK (available_quantity >= 0 AND available_quantity <= total_quantity)
);

CREATE TABLE IF NOT EXISTS requests (
    request_id   TEXT PRIMARY KEY,
    asset_id     TEXT NOT NULL,
    asset_name   TEXT NOT NULL,   -- snapshot, never updated
    asset_kind   TEXT NOT NULL,   -- snapshot, never updated
    requester    TEXT NOT NULL,
    organization TEXT NOT NULL,
    note         TEXT,
    requested_at TEXT NOT NULL,
    decided_at   TEXT,
    decided_by   TEXT,
    status       TEXT NOT NULL DEFAULT 'pending'  -- 'pending' | 'approved' | 'rejected'
);

CREATE TABLE IF NOT EXISTS assignments (
    assignment_id TEXT PRIMARY KEY,
    asset_id      TEXT NOT NULL,
    asset_name    TEXT NOT NULL,   -- snapshot, never updated
    asset_kind    TEXT NOT NULL,   -- snapshot, never updated
    employee      TEXT NOT NULL,
    organization  TEXT NOT NULL,
    assigned_at   TEXT NOT NULL,
    returned_at   TEXT,
    status        TEXT NOT NULL DEFAULT 'assigned' -- 'assigned' | 'returned'
);

-- At most one affiliation per (employee, organization); rows are set
-- inactive on removal, never deleted.
CREATE TABLE IF NOT EXISTS affiliations (
    affiliation_id TEXT PRIMARY KEY,
    employee       TEXT NOT NULL,
    organization   TEXT NOT NULL,
    affiliated_at  TEXT NOT NULL,
    status         TEXT NOT NULL DEFAULT 'active', -- 'active' | 'inactive'
    UNIQUE (employee, organization)
);

CREATE INDEX IF NOT EXISTS assets_org_idx        ON assets(organization);
CREATE INDEX IF NOT EXISTS requests_org_idx      ON requests(organization);
CREATE INDEX IF NOT EXISTS requests_requester_idx ON requests(requester);
CREATE INDEX IF NOT EXISTS requests_asset_idx    ON requests(asset_id);
CREATE INDEX IF NOT EXISTS assignments_emp_idx   ON assignments(employee);
CREATE INDEX IF NOT EXISTS affiliations_org_idx  ON affiliations(organization);

PRAGMA user_version = 1;
";
