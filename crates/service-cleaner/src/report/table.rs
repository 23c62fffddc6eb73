//! Console summary of a cleanup run

use super::OutcomeReporter;
use crate::record::OutcomeRecord;
use anyhow::Result;
use comfy_table::{Cell, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use service_cleaner_common::ResourceKind;
use std::collections::BTreeMap;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Counts {
    records: usize,
    errors: usize,
}

/// Counts records per kind and decision, printed as a table on finish
#[derive(Debug, Default)]
pub struct SummaryTable {
    counts: BTreeMap<(ResourceKind, &'static str), Counts>,
    dry_run: bool,
}

impl SummaryTable {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Default::default()
        }
    }

    /// Render the summary. Returns `None` when nothing was recorded.
    pub fn render(&self) -> Option<Table> {
        if self.counts.is_empty() {
            return None;
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL_CONDENSED)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("Kind"),
                Cell::new("Operation"),
                Cell::new("Resources"),
                Cell::new("Errors"),
            ]);

        for ((kind, label), counts) in &self.counts {
            table.add_row(vec![
                Cell::new(kind.section_name()),
                Cell::new(label),
                Cell::new(counts.records),
                Cell::new(if counts.errors == 0 {
                    "-".to_string()
                } else {
                    counts.errors.to_string()
                }),
            ]);
        }

        Some(table)
    }
}

impl OutcomeReporter for SummaryTable {
    fn record(&mut self, record: &OutcomeRecord) {
        let label = if record.subject.is_batch() {
            "Batch"
        } else {
            record.decision_label()
        };
        let entry = self.counts.entry((record.kind, label)).or_default();
        entry.records += 1;
        if record.error.is_some() {
            entry.errors += 1;
        }
    }

    fn finish(&mut self) -> Result<()> {
        let title = if self.dry_run {
            "=== Cleanup Summary (dry run) ==="
        } else {
            "=== Cleanup Summary ==="
        };

        match self.render() {
            Some(table) => println!("\n{title}\n\n{table}"),
            None => println!("\n{title}\n\nNo resources found."),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::ec2::{Image, Instance};
    use crate::policy::Decision;
    use crate::record::{BatchAction, CleanupError, Subject};

    fn image_record(decision: Decision, error: Option<CleanupError>) -> OutcomeRecord {
        OutcomeRecord::new(
            ResourceKind::Image,
            "us-east-1",
            Subject::Image(Image::default()),
            decision,
        )
        .with_error(error)
    }

    #[test]
    fn empty_summary_renders_nothing() {
        assert!(SummaryTable::new(true).render().is_none());
    }

    #[test]
    fn counts_by_kind_and_label() {
        let mut summary = SummaryTable::new(false);
        summary.record(&image_record(Decision::Terminate, None));
        summary.record(&image_record(
            Decision::Terminate,
            Some(CleanupError::Client {
                code: "AuthFailure".to_string(),
                message: "denied".to_string(),
            }),
        ));
        summary.record(&image_record(Decision::Keep, None));
        summary.record(&OutcomeRecord::new(
            ResourceKind::Instance,
            "us-east-1",
            Subject::Instance(Instance::default()),
            Decision::NoOp,
        ));
        summary.record(&OutcomeRecord::new(
            ResourceKind::Instance,
            "us-east-1",
            Subject::Batch {
                action: BatchAction::WaitTerminated,
                instance_ids: vec!["i-1".to_string()],
            },
            Decision::Terminate,
        ));

        assert_eq!(
            summary.counts[&(ResourceKind::Image, "Deregister")],
            Counts {
                records: 2,
                errors: 1
            }
        );
        assert_eq!(summary.counts[&(ResourceKind::Image, "Keep")].records, 1);
        assert_eq!(summary.counts[&(ResourceKind::Instance, "DoNothing")].records, 1);
        assert_eq!(summary.counts[&(ResourceKind::Instance, "Batch")].records, 1);

        let rendered = summary.render().unwrap().to_string();
        assert!(rendered.contains("Deregister"));
        assert!(rendered.contains("Images"));
    }
}
