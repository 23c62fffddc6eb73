//! Outcome report sinks
//!
//! The cleaner hands every [`OutcomeRecord`] to an [`OutcomeReporter`] as it
//! is produced. Sinks decide how to present them:
//!
//! - [`JsonReport`]: per-kind sections written to one JSON document
//! - [`SummaryTable`]: counts per kind and decision printed as a table
//! - [`MemoryReporter`]: keeps records in memory

mod json;
mod table;

pub use json::JsonReport;
pub use table::SummaryTable;

use crate::record::OutcomeRecord;
use anyhow::Result;

/// Consumer of outcome records
pub trait OutcomeReporter {
    /// Accept one record. Called once per record, in production order.
    fn record(&mut self, record: &OutcomeRecord);

    /// Flush whatever the sink buffers. Called once after the run.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<R: OutcomeReporter + ?Sized> OutcomeReporter for &mut R {
    fn record(&mut self, record: &OutcomeRecord) {
        (**self).record(record);
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }
}

impl<R: OutcomeReporter + ?Sized> OutcomeReporter for Box<R> {
    fn record(&mut self, record: &OutcomeRecord) {
        (**self).record(record);
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }
}

/// Fan-out to several sinks
#[derive(Default)]
pub struct Reporters {
    sinks: Vec<Box<dyn OutcomeReporter + Send>>,
}

impl Reporters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl OutcomeReporter + Send + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }
}

impl OutcomeReporter for Reporters {
    fn record(&mut self, record: &OutcomeRecord) {
        for sink in &mut self.sinks {
            sink.record(record);
        }
    }

    /// Finishes every sink, returning the first error.
    fn finish(&mut self) -> Result<()> {
        let mut first_err = None;
        for sink in &mut self.sinks {
            if let Err(e) = sink.finish() {
                tracing::error!(error = ?e, "Report sink failed");
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

/// In-memory sink
#[derive(Debug, Default)]
pub struct MemoryReporter {
    pub records: Vec<OutcomeRecord>,
    pub finished: bool,
}

impl OutcomeReporter for MemoryReporter {
    fn record(&mut self, record: &OutcomeRecord) {
        self.records.push(record.clone());
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::ec2::Snapshot;
    use crate::policy::Decision;
    use crate::record::Subject;
    use service_cleaner_common::ResourceKind;

    struct FailingSink;

    impl OutcomeReporter for FailingSink {
        fn record(&mut self, _record: &OutcomeRecord) {}

        fn finish(&mut self) -> Result<()> {
            anyhow::bail!("disk full")
        }
    }

    fn record() -> OutcomeRecord {
        OutcomeRecord::new(
            ResourceKind::Snapshot,
            "eu-west-1",
            Subject::Snapshot(Snapshot {
                snapshot_id: "snap-1".to_string(),
                ..Default::default()
            }),
            Decision::Terminate,
        )
    }

    #[test]
    fn memory_reporter_keeps_order() {
        let mut sink = MemoryReporter::default();
        sink.record(&record());
        sink.record(&record().with_error(None));
        sink.finish().unwrap();
        assert_eq!(sink.records.len(), 2);
        assert!(sink.finished);
    }

    #[test]
    fn fan_out_finishes_all_sinks_and_reports_failure() {
        let mut reporters = Reporters::new().with(FailingSink).with(MemoryReporter::default());
        reporters.record(&record());
        let err = reporters.finish().unwrap_err();
        assert_eq!(err.to_string(), "disk full");
    }
}
