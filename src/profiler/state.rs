use std::{io::Write, time::Duration};

use parking_lot::Mutex;

/// Cumulative time spent in one operation of one implementation type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfilingRecord {
    pub implementation: String,
    pub operation: &'static str,
    pub elapsed: Duration,
}

impl ProfilingRecord {
    pub fn key(&self) -> String {
        format!("{}#{}", self.implementation, self.operation)
    }
}

/// Aggregated profiling data, shared by every proxy a profiler hands out.
///
/// Records are kept in first-seen order so reports are stable between runs
/// that exercise operations in the same order.
#[derive(Debug, Default)]
pub struct ProfilingState {
    records: Mutex<Vec<ProfilingRecord>>,
}

impl ProfilingState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, implementation: &str, operation: &'static str, elapsed: Duration) {
        let mut records = self.records.lock();
        match records
            .iter_mut()
            .find(|r| r.implementation == implementation && r.operation == operation)
        {
            Some(record) => record.elapsed += elapsed,
            None => records.push(ProfilingRecord {
                implementation: implementation.to_string(),
                operation,
                elapsed,
            }),
        }
    }

    pub fn snapshot(&self) -> Vec<ProfilingRecord> {
        self.records.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Writes one `<type>#<operation> took <m>m <s>s <ms>ms` line per record.
    pub fn write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        // snapshot first so a slow writer never holds the lock
        for record in self.snapshot() {
            writeln!(writer, "{} took {}", record.key(), format_duration(record.elapsed))?;
        }
        Ok(())
    }
}

fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    format!(
        "{}m {}s {}ms",
        total_secs / 60,
        total_secs % 60,
        duration.subsec_millis()
    )
}
