use anyhow::Result;
use rusqlite::Row;

use crate::models::{NewReport, ReportRow, ReportWarningRow};
use crate::{Database, OptionalExt};

const REPORT_SELECT: &str = "
    SELECT id, reporter_id, report_type, target_id, reason, details, status,
           is_false_report, reviewed_by, created_at, reviewed_at
    FROM reports";

impl Database {
    // -- Reports --

    pub fn insert_report(&self, report: &NewReport<'_>) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO reports (reporter_id, report_type, target_id, reason, details)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    report.reporter_id,
                    report.report_type,
                    report.target_id,
                    report.reason,
                    report.details,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_report(&self, id: i64) -> Result<Option<ReportRow>> {
        self.with_conn(|conn| {
            let sql = format!("{} WHERE id = ?1", REPORT_SELECT);
            let row = conn.query_row(&sql, [id], map_report).optional()?;
            Ok(row)
        })
    }

    /// All reports, optionally restricted to one status, oldest first.
    pub fn list_reports(&self, status: Option<&str>) -> Result<Vec<ReportRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} WHERE (?1 IS NULL OR status = ?1) ORDER BY created_at, id",
                REPORT_SELECT
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([status], map_report)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn list_reports_by_reporter(&self, reporter_id: i64) -> Result<Vec<ReportRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} WHERE reporter_id = ?1 ORDER BY created_at DESC, id DESC",
                REPORT_SELECT
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([reporter_id], map_report)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn review_report(
        &self,
        id: i64,
        status: &str,
        is_false_report: bool,
        reviewer_id: i64,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE reports
                 SET status = ?2, is_false_report = ?3, reviewed_by = ?4,
                     reviewed_at = datetime('now')
                 WHERE id = ?1",
                rusqlite::params![id, status, is_false_report, reviewer_id],
            )?;
            Ok(changed > 0)
        })
    }

    /// Claim the false-report penalty for a report. Returns true only the first
    /// time, however often the report is re-reviewed.
    pub fn mark_report_penalized(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE reports SET penalized_at = datetime('now')
                 WHERE id = ?1 AND penalized_at IS NULL",
                [id],
            )?;
            Ok(changed > 0)
        })
    }

    // -- Report warnings --

    pub fn get_report_warning(&self, user_id: i64) -> Result<Option<ReportWarningRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT user_id, warning_count, is_banned_from_reporting, ban_until
                     FROM report_warnings WHERE user_id = ?1",
                    [user_id],
                    map_warning,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Insert or overwrite the penalty record for `row.user_id`.
    pub fn save_report_warning(&self, row: &ReportWarningRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO report_warnings
                     (user_id, warning_count, is_banned_from_reporting, ban_until)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(user_id) DO UPDATE SET
                     warning_count = excluded.warning_count,
                     is_banned_from_reporting = excluded.is_banned_from_reporting,
                     ban_until = excluded.ban_until,
                     updated_at = datetime('now')",
                rusqlite::params![
                    row.user_id,
                    row.warning_count,
                    row.is_banned_from_reporting,
                    row.ban_until,
                ],
            )?;
            Ok(())
        })
    }

    /// Banned records whose `ban_until` is at or before `now` (SQLite layout).
    pub fn list_expired_report_bans(&self, now: &str) -> Result<Vec<ReportWarningRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT user_id, warning_count, is_banned_from_reporting, ban_until
                 FROM report_warnings
                 WHERE is_banned_from_reporting = 1
                   AND ban_until IS NOT NULL
                   AND ban_until <= ?1",
            )?;
            let rows = stmt
                .query_map([now], map_warning)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn map_report(row: &Row<'_>) -> rusqlite::Result<ReportRow> {
    Ok(ReportRow {
        id: row.get(0)?,
        reporter_id: row.get(1)?,
        report_type: row.get(2)?,
        target_id: row.get(3)?,
        reason: row.get(4)?,
        details: row.get(5)?,
        status: row.get(6)?,
        is_false_report: row.get(7)?,
        reviewed_by: row.get(8)?,
        created_at: row.get(9)?,
        reviewed_at: row.get(10)?,
    })
}

fn map_warning(row: &Row<'_>) -> rusqlite::Result<ReportWarningRow> {
    Ok(ReportWarningRow {
        user_id: row.get(0)?,
        warning_count: row.get(1)?,
        is_banned_from_reporting: row.get(2)?,
        ban_until: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> (Database, i64, i64) {
        let db = Database::open_in_memory().unwrap();
        let reporter = db.create_user("reporter", "hash", "user").unwrap();
        let target = db.create_user("target", "hash", "user").unwrap();
        (db, reporter, target)
    }

    #[test]
    fn report_lifecycle() {
        let (db, reporter, target) = seeded();
        let admin = db.create_user("admin", "hash", "admin").unwrap();
        let id = db
            .insert_report(&NewReport {
                reporter_id: reporter,
                report_type: "user",
                target_id: target,
                reason: "spam",
                details: Some("posts links"),
            })
            .unwrap();

        let row = db.get_report(id).unwrap().unwrap();
        assert_eq!(row.status, "pending");
        assert!(!row.is_false_report);
        assert_eq!(db.list_reports(Some("pending")).unwrap().len(), 1);

        assert!(db.review_report(id, "dismissed", true, admin).unwrap());
        let row = db.get_report(id).unwrap().unwrap();
        assert_eq!(row.status, "dismissed");
        assert!(row.is_false_report);
        assert_eq!(row.reviewed_by, Some(admin));
        assert!(row.reviewed_at.is_some());

        assert!(db.list_reports(Some("pending")).unwrap().is_empty());
        assert_eq!(db.list_reports(None).unwrap().len(), 1);
        assert_eq!(db.list_reports_by_reporter(reporter).unwrap().len(), 1);
    }

    #[test]
    fn penalty_is_claimed_once() {
        let (db, reporter, target) = seeded();
        let admin = db.create_user("admin", "hash", "admin").unwrap();
        let id = db
            .insert_report(&NewReport {
                reporter_id: reporter,
                report_type: "user",
                target_id: target,
                reason: "spam",
                details: None,
            })
            .unwrap();

        assert!(db.mark_report_penalized(id).unwrap());
        db.review_report(id, "resolved", false, admin).unwrap();
        db.review_report(id, "dismissed", true, admin).unwrap();
        assert!(!db.mark_report_penalized(id).unwrap());
        assert!(!db.mark_report_penalized(id + 1).unwrap());
    }

    #[test]
    fn rejects_unknown_report_type() {
        let (db, reporter, target) = seeded();
        let result = db.insert_report(&NewReport {
            reporter_id: reporter,
            report_type: "planet",
            target_id: target,
            reason: "spam",
            details: None,
        });
        assert!(result.is_err());
    }

    #[test]
    fn warning_upsert_overwrites() {
        let (db, reporter, _) = seeded();
        assert!(db.get_report_warning(reporter).unwrap().is_none());

        let mut row = ReportWarningRow {
            user_id: reporter,
            warning_count: 1,
            is_banned_from_reporting: false,
            ban_until: None,
        };
        db.save_report_warning(&row).unwrap();
        assert_eq!(db.get_report_warning(reporter).unwrap(), Some(row.clone()));

        row.warning_count = 3;
        row.is_banned_from_reporting = true;
        row.ban_until = Some("2030-01-01 00:00:00".into());
        db.save_report_warning(&row).unwrap();
        assert_eq!(db.get_report_warning(reporter).unwrap(), Some(row));
    }

    #[test]
    fn negative_warning_count_is_rejected() {
        let (db, reporter, _) = seeded();
        let result = db.save_report_warning(&ReportWarningRow {
            user_id: reporter,
            warning_count: -1,
            is_banned_from_reporting: false,
            ban_until: None,
        });
        assert!(result.is_err());
    }

    #[test]
    fn expired_bans_are_listed() {
        let (db, reporter, target) = seeded();
        db.save_report_warning(&ReportWarningRow {
            user_id: reporter,
            warning_count: 3,
            is_banned_from_reporting: true,
            ban_until: Some("2020-01-01 00:00:00".into()),
        })
        .unwrap();
        db.save_report_warning(&ReportWarningRow {
            user_id: target,
            warning_count: 3,
            is_banned_from_reporting: true,
            ban_until: Some("2099-01-01 00:00:00".into()),
        })
        .unwrap();

        let expired = db.list_expired_report_bans("2024-06-01 12:00:00").unwrap();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].user_id, reporter);
    }
}
