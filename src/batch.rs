use indicatif::ProgressBar;
use tracing::{error, info};

use crate::{datatypes::ScanRecord, error::MicroFeError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchSummary {
    pub processed: usize,
    pub failed: usize,
}

/// Runs `task` over every scan in order
///
/// Without `keep_going` the first failure is returned immediately. With it,
/// failures are logged and counted and the remaining scans still run.
pub fn for_each_scan<F>(
    scans: &[ScanRecord],
    keep_going: bool,
    mut task: F,
) -> Result<BatchSummary, MicroFeError>
where
    F: FnMut(&ScanRecord) -> Result<(), MicroFeError>,
{
    let mut summary = BatchSummary::default();
    let bar = ProgressBar::new(scans.len() as u64);

    for scan in scans {
        match task(scan) {
            Ok(()) => summary.processed += 1,
            Err(err) if keep_going => {
                error!(
                    scan_id = %scan.scan_id,
                    measurement_id = %scan.measurement_id,
                    "skipping scan: {err}"
                );
                summary.failed += 1;
            }
            Err(err) => {
                bar.abandon();
                return Err(err);
            }
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    info!(
        processed = summary.processed,
        failed = summary.failed,
        "batch complete"
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan_list;

    fn scans() -> Vec<ScanRecord> {
        scan_list::parse("h\n1,1,,,82,ref\n2,1,,,82,ref\n3,1,,,82,ref\n").unwrap()
    }

    fn fail_on_two(scan: &ScanRecord) -> Result<(), MicroFeError> {
        if scan.scan_id == "2" {
            Err(MicroFeError::ReportLayout("bad".to_owned()))
        } else {
            Ok(())
        }
    }

    #[test]
    fn aborts_on_first_failure() {
        let mut visited = Vec::new();
        let result = for_each_scan(&scans(), false, |s| {
            visited.push(s.scan_id.clone());
            fail_on_two(s)
        });
        assert!(result.is_err());
        assert_eq!(visited, vec!["1", "2"]);
    }

    #[test]
    fn keep_going_counts_failures() {
        let summary = for_each_scan(&scans(), true, fail_on_two).unwrap();
        assert_eq!(
            summary,
            BatchSummary {
                processed: 2,
                failed: 1
            }
        );
    }
}
