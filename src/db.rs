use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::record::{CrawlRequest, CrawlResult, Metrics, Record};

const DB_PATH: &str = "data/listings.sqlite";

pub fn connect() -> Result<Connection> {
    if let Some(dir) = std::path::Path::new(DB_PATH).parent() {
        std::fs::create_dir_all(dir).context("Failed to create data directory")?;
    }
    let conn = Connection::open(DB_PATH)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS runs (
            id            INTEGER PRIMARY KEY,
            location      TEXT NOT NULL,
            search_term   TEXT NOT NULL,
            max_pages     INTEGER NOT NULL,
            enrichment    BOOLEAN NOT NULL,
            pages_visited INTEGER NOT NULL,
            extracted     INTEGER NOT NULL,
            stop_reason   TEXT NOT NULL,
            created_at    TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS records (
            id            INTEGER PRIMARY KEY,
            run_id        INTEGER NOT NULL REFERENCES runs(id),
            position      INTEGER NOT NULL,
            company_name  TEXT NOT NULL,
            phone_number  TEXT NOT NULL,
            gstin         TEXT NOT NULL,
            address       TEXT NOT NULL,
            location      TEXT NOT NULL,
            search_term   TEXT NOT NULL,
            UNIQUE(run_id, position)
        );
        CREATE INDEX IF NOT EXISTS idx_records_run ON records(run_id);
        CREATE INDEX IF NOT EXISTS idx_records_phone ON records(phone_number);
        ",
    )?;
    Ok(())
}

// ── Runs ──

/// Store a finished crawl and its records; returns the run id.
pub fn save_run(conn: &Connection, request: &CrawlRequest, result: &CrawlResult) -> Result<i64> {
    let tx = conn.unchecked_transaction()?;
    let run_id = {
        tx.execute(
            "INSERT INTO runs
             (location, search_term, max_pages, enrichment, pages_visited, extracted, stop_reason)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                request.location,
                request.search_term,
                request.max_pages,
                request.include_enrichment,
                result.pages_visited,
                result.extracted as i64,
                result.stop.to_string(),
            ],
        )?;
        let run_id = tx.last_insert_rowid();

        let mut stmt = tx.prepare(
            "INSERT INTO records
             (run_id, position, company_name, phone_number, gstin, address, location, search_term)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;
        for (i, r) in result.records.iter().enumerate() {
            stmt.execute(rusqlite::params![
                run_id, i as i64, r.company_name, r.phone_number, r.gstin, r.address,
                r.location, r.search_term,
            ])?;
        }
        run_id
    };
    tx.commit()?;
    Ok(run_id)
}

pub fn fetch_records(conn: &Connection, run_id: i64, limit: Option<usize>) -> Result<Vec<Record>> {
    let sql = format!(
        "SELECT company_name, phone_number, gstin, address, location, search_term
         FROM records WHERE run_id = ?1 ORDER BY position{}",
        match limit {
            Some(n) => format!(" LIMIT {}", n),
            None => String::new(),
        }
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([run_id], |row| {
            Ok(Record {
                company_name: row.get(0)?,
                phone_number: row.get(1)?,
                gstin: row.get(2)?,
                address: row.get(3)?,
                location: row.get(4)?,
                search_term: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Overview ──

pub struct RunRow {
    pub id: i64,
    pub location: String,
    pub search_term: String,
    pub pages_visited: u32,
    pub extracted: usize,
    pub stop_reason: String,
    pub created_at: String,
    pub metrics: Metrics,
}

pub fn fetch_runs(conn: &Connection, limit: usize) -> Result<Vec<RunRow>> {
    let sql = format!(
        "SELECT r.id, r.location, r.search_term, r.pages_visited, r.extracted, r.stop_reason,
                r.created_at,
                COUNT(c.id),
                COALESCE(SUM(c.phone_number != 'N/A'), 0),
                COALESCE(SUM(c.gstin != 'N/A'), 0),
                COALESCE(SUM(c.address != 'N/A'), 0)
         FROM runs r
         LEFT JOIN records c ON c.run_id = r.id
         GROUP BY r.id
         ORDER BY r.id DESC
         LIMIT {}",
        limit
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(RunRow {
                id: row.get(0)?,
                location: row.get(1)?,
                search_term: row.get(2)?,
                pages_visited: row.get(3)?,
                extracted: row.get(4)?,
                stop_reason: row.get(5)?,
                created_at: row.get(6)?,
                metrics: Metrics {
                    total: row.get(7)?,
                    with_phone: row.get(8)?,
                    with_gstin: row.get(9)?,
                    with_address: row.get(10)?,
                },
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn fetch_run_request(conn: &Connection, run_id: i64) -> Result<(String, String)> {
    conn.query_row(
        "SELECT location, search_term FROM runs WHERE id = ?1",
        [run_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .with_context(|| format!("No run with id {}", run_id))
}
