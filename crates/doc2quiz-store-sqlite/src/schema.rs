//! SQL schema for the doc2quiz SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS subjects (
    subject_id  TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    user_id     TEXT,
    created_at  TEXT NOT NULL,
    documents   TEXT NOT NULL DEFAULT '[]',  -- JSON [{document_id, filename}] in upload order
    metadata    TEXT NOT NULL DEFAULT '{}'
);

-- Documents are written before the subject that owns them, so subject_id
-- carries no foreign key. `seq` preserves insertion order.
CREATE TABLE IF NOT EXISTS documents (
    seq         INTEGER PRIMARY KEY AUTOINCREMENT,
    document_id TEXT NOT NULL UNIQUE,
    subject_id  TEXT NOT NULL,
    filename    TEXT NOT NULL,
    ocr_text    TEXT NOT NULL,
    uploaded_at TEXT NOT NULL,
    metadata    TEXT NOT NULL DEFAULT '{}'
);

CREATE TABLE IF NOT EXISTS jobs (
    job_id       TEXT PRIMARY KEY,
    subject_name TEXT NOT NULL,
    file_count   INTEGER NOT NULL,
    status       TEXT NOT NULL,   -- 'pending' | 'succeeded' | 'failed'
    subject_id   TEXT,            -- set when succeeded
    reason       TEXT,            -- set when failed
    submitted_at TEXT NOT NULL,
    finished_at  TEXT
);

CREATE INDEX IF NOT EXISTS documents_subject_idx ON documents(subject_id);
CREATE INDEX IF NOT EXISTS subjects_created_idx  ON subjects(created_at);

PRAGMA user_version = 1;
";
