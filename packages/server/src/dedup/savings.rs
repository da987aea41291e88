use sea_orm::{ConnectionTrait, FromQueryResult, Statement};
use tracing::instrument;

use super::DedupError;

/// Space usage with deduplication compared to one copy per entry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SavingsReport {
    /// Bytes actually stored, every content counted once.
    pub actual_space: u64,
    /// Bytes that would be stored if each entry held its own copy.
    pub would_be_space: u64,
    /// Would-be minus actual; negative while unreferenced content is kept.
    pub space_saved: i64,
    pub savings_percentage: f64,
    /// Entries per content record.
    pub deduplication_ratio: f64,
    pub total_files: u64,
    pub total_entries: u64,
}

impl SavingsReport {
    pub fn from_totals(
        actual_space: u64,
        would_be_space: u64,
        total_files: u64,
        total_entries: u64,
    ) -> Self {
        let space_saved = would_be_space as i64 - actual_space as i64;
        let savings_percentage = if would_be_space > 0 {
            space_saved as f64 / would_be_space as f64 * 100.0
        } else {
            0.0
        };
        let deduplication_ratio = if total_files > 0 {
            total_entries as f64 / total_files as f64
        } else {
            0.0
        };

        Self {
            actual_space,
            would_be_space,
            space_saved,
            savings_percentage,
            deduplication_ratio,
            total_files,
            total_entries,
        }
    }
}

#[derive(Debug, FromQueryResult)]
struct SavingsTotals {
    actual_space: i64,
    would_be_space: i64,
    total_files: i64,
    total_entries: i64,
}

/// One aggregate pass over content LEFT JOIN per-content reference counts.
const SAVINGS_SQL: &str = r#"
SELECT
    CAST(COALESCE(SUM(c.size), 0) AS BIGINT) AS actual_space,
    CAST(COALESCE(SUM(c.size * COALESCE(r.reference_count, 0)), 0) AS BIGINT) AS would_be_space,
    CAST(COUNT(c.id) AS BIGINT) AS total_files,
    CAST(COALESCE(SUM(COALESCE(r.reference_count, 0)), 0) AS BIGINT) AS total_entries
FROM content c
LEFT JOIN (
    SELECT content_id, COUNT(*) AS reference_count
    FROM entry
    GROUP BY content_id
) r ON r.content_id = c.id
"#;

pub struct SavingsService<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> SavingsService<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    #[instrument(skip(self))]
    pub async fn compute_savings(&self) -> Result<SavingsReport, DedupError> {
        let stmt = Statement::from_string(self.conn.get_database_backend(), SAVINGS_SQL);
        let totals = SavingsTotals::find_by_statement(stmt)
            .one(self.conn)
            .await?
            .unwrap_or(SavingsTotals {
                actual_space: 0,
                would_be_space: 0,
                total_files: 0,
                total_entries: 0,
            });

        let to_u64 = |v: i64| u64::try_from(v).unwrap_or(0);
        Ok(SavingsReport::from_totals(
            to_u64(totals.actual_space),
            to_u64(totals.would_be_space),
            to_u64(totals.total_files),
            to_u64(totals.total_entries),
        ))
    }
}
