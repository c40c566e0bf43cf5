use arc_accounting_shared::storage::Result;
use arc_accounting_shared::{AccountingDb, Dimension, FilterPredicate, StatsResult};
use tracing::info;

use crate::cli::{OutputFormat, StatsArgs};
use crate::report;

pub fn list(db: &mut AccountingDb, dimension: Dimension) -> Result<String> {
    let names = db.names(dimension)?;
    info!(dimension = %dimension, count = names.len(), "Listing filter values");

    let mut out = String::new();
    for name in names {
        out.push_str(&name);
        out.push('\n');
    }
    Ok(out)
}

/// Builds a fresh predicate from the command line filters and aggregates it.
pub fn compute_stats(db: &mut AccountingDb, args: &StatsArgs) -> Result<StatsResult> {
    let mut filter = FilterPredicate::new();

    if let Some(start) = args.start_from {
        filter.submitted_after(start);
    }
    if let Some(end) = args.end_till {
        filter.ended_before(end);
    }
    db.filter_queues(&mut filter, &args.queues)?;
    db.filter_users(&mut filter, &args.users)?;
    db.filter_vos(&mut filter, &args.vos)?;
    db.filter_statuses(&mut filter, &args.statuses)?;
    db.filter_endpoint_types(&mut filter, &args.endpoint_types)?;

    db.stats(filter)
}

pub fn stats(db: &mut AccountingDb, args: &StatsArgs) -> Result<String> {
    let stats = compute_stats(db, args)?;
    Ok(match args.output {
        OutputFormat::Text => report::render_text(&stats),
        OutputFormat::Json => match report::render_json(&stats) {
            Ok(json) => json + "\n",
            Err(_) => report::render_text(&stats),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::parse_time;
    use arc_accounting_shared::ACCOUNTING_SCHEMA;
    use rusqlite::Connection;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("accounting.db");

        let conn = Connection::open(&db_path).unwrap();
        conn.execute_batch(ACCOUNTING_SCHEMA).unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO Queues (ID, Name) VALUES (1, 'grid'), (2, 'short');
            INSERT INTO Users (ID, Name) VALUES (1, '/DC=org/CN=alice');
            INSERT INTO WLCGVOs (ID, Name) VALUES (1, 'atlas');
            INSERT INTO Status (ID, Name) VALUES (1, 'completed');
            INSERT INTO Endpoints (ID, Interface, URL) VALUES
                (1, 'org.nordugrid.arcrest', 'https://ce.example.org/arex');

            INSERT INTO AAR (JobID, EndpointID, QueueID, UserID, VOID, StatusID,
                             SubmitTime, EndTime, UsedWalltime)
            VALUES
                ('job1', 1, 1, 1, 1, 1, 1704067200, 1704070800, 3600),
                ('job2', 1, 2, 1, 1, 1, 1704153600, 1704157200, 3600),
                ('job3', 1, 1, 1, 1, 1, 1704240000, 1704247200, 7200);
            "#,
        )
        .unwrap();
        (temp_dir, db_path)
    }

    #[test]
    fn test_list_queues() {
        let (_dir, path) = fixture();
        let mut db = AccountingDb::open(&path).unwrap();

        assert_eq!(list(&mut db, Dimension::Queue).unwrap(), "grid\nshort\n");
    }

    #[test]
    fn test_stats_with_filters() {
        let (_dir, path) = fixture();
        let mut db = AccountingDb::open(&path).unwrap();

        let args = StatsArgs {
            queues: vec!["grid".to_string()],
            start_from: Some(parse_time("2024-01-02").unwrap()),
            ..Default::default()
        };
        let stats = compute_stats(&mut db, &args).unwrap();

        assert_eq!(stats.count, 1);
        assert_eq!(stats.walltime, Some(7200));
        assert_eq!(stats.range_start, Some(1704240000));
    }

    #[test]
    fn test_stats_unknown_vo() {
        let (_dir, path) = fixture();
        let mut db = AccountingDb::open(&path).unwrap();

        let args = StatsArgs {
            vos: vec!["cms".to_string()],
            output: OutputFormat::Json,
            ..Default::default()
        };
        let out = stats(&mut db, &args).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();

        assert_eq!(value["count"], 0);
        assert!(value["walltime"].is_null());
    }
}
