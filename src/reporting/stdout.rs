use crate::errors::Result;
use crate::reporting::SyncReport;
use humantime::format_duration;
use std::fmt::Display;
use std::io::Write;
use std::time::Duration;

/// Prints the summary of a completed run as a small table.
pub fn print_report<W: Write>(out: &mut W, report: &SyncReport) -> Result<()> {
    let counts = report.counts;
    let keys = counts.total();

    write!(
        out,
        "\nSynced: {} keys in {}\n",
        keys,
        format_duration(report.elapsed)
    )?;

    let classified = create_table(
        "Classified",
        vec![
            ("insert", counts.inserted.to_string()),
            ("update", counts.updated.to_string()),
            ("delete", counts.deleted.to_string()),
            ("unchanged", counts.unchanged.to_string()),
        ],
    );
    let pulled = create_table(
        "Pulled",
        vec![
            ("left", report.merge.left_pulled.to_string()),
            ("right", report.merge.right_pulled.to_string()),
            ("pending", report.merge.peak_pending.to_string()),
        ],
    );
    let timing = create_table(
        "Timing",
        vec![
            ("total", format_duration(report.elapsed).to_string()),
            ("per key", format_duration(per_key(report.elapsed, keys)).to_string()),
        ],
    );

    out.write_all(classified.as_bytes())?;
    out.write_all(pulled.as_bytes())?;
    out.write_all(timing.as_bytes())?;
    out.flush()?;

    Ok(())
}

fn per_key(elapsed: Duration, keys: u64) -> Duration {
    if keys == 0 {
        return Duration::new(0, 0);
    }

    Duration::from_nanos((elapsed.as_nanos() / u128::from(keys)) as u64)
}

fn create_table<V: Display>(row_name: &str, columns: Vec<(&str, V)>) -> String {
    let test = columns
        .into_iter()
        .map(|(l, v)| humanize(l, v))
        .collect::<String>();

    format!("{:<15} ‖ {}\n", row_name, test,)
}

#[inline]
pub(crate) fn humanize<V: Display>(label: &str, value: V) -> String {
    format!("{:.<10}.{:<27}| ", label, value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::differ::MergeStats;
    use crate::sync::action::SyncCounts;

    #[test]
    fn test_humanize_pads_label_and_value() {
        assert_eq!(
            humanize("insert", 3),
            format!("insert.....{:<27}| ", "3")
        );
    }

    #[test]
    fn test_per_key() {
        assert_eq!(per_key(Duration::from_millis(10), 0), Duration::new(0, 0));
        assert_eq!(per_key(Duration::from_millis(10), 10), Duration::from_millis(1));
    }

    #[test]
    fn test_print_report() {
        let mut out = vec![];
        print_report(
            &mut out,
            &SyncReport {
                counts: SyncCounts {
                    inserted: 3,
                    updated: 2,
                    deleted: 2,
                    unchanged: 3,
                },
                merge: MergeStats {
                    left_pulled: 8,
                    right_pulled: 7,
                    emitted: 10,
                    peak_pending: 2,
                },
                elapsed: Duration::from_millis(20),
            },
        )
        .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Synced: 10 keys in 20ms"));
        assert!(text.contains(&humanize("insert", 3)));
        assert!(text.contains(&humanize("unchanged", 3)));
        assert!(text.contains(&humanize("right", 7)));
        assert!(text.contains(&humanize("per key", "2ms")));
    }
}
