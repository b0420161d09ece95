//! Call-timing instrumentation for arbitrary capability traits.
//!
//! A capability set is described by a [`CapabilitySet`] table listing its
//! operations and which of them are profiled. [`Profiler::wrap`] turns any
//! implementation into a [`Profiled`] proxy; the trait's impl for the proxy
//! routes every method through [`Profiled::intercept`]:
//!
//! ```ignore
//! impl<P: PageParser> PageParser for Profiled<P> {
//!     fn parse(&self, url: &str) -> Result<PageContents, FetchError> {
//!         self.intercept("parse", |parser| parser.parse(url))
//!     }
//! }
//! ```
//!
//! Durations are summed per `(implementation type, operation)` and written out
//! with [`Profiler::write_data`].

mod interceptor;
mod state;

use std::{
    fs::OpenOptions,
    io::{self, BufWriter, Write},
    path::Path,
    sync::Arc,
};

use chrono::{DateTime, Utc};

pub use interceptor::Profiled;
pub use state::{ProfilingRecord, ProfilingState};

use crate::{clock::Clock, error::ProfilerError};

/// One operation of a capability set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    pub name: &'static str,
    pub profiled: bool,
}

impl Operation {
    pub const fn profiled(name: &'static str) -> Self {
        Operation {
            name,
            profiled: true,
        }
    }

    pub const fn passthrough(name: &'static str) -> Self {
        Operation {
            name,
            profiled: false,
        }
    }
}

/// The operations a trait exposes, and which of them get timed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilitySet {
    name: &'static str,
    operations: &'static [Operation],
}

impl CapabilitySet {
    pub const fn new(name: &'static str, operations: &'static [Operation]) -> Self {
        CapabilitySet { name, operations }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn contains(&self, operation: &str) -> bool {
        self.operations.iter().any(|op| op.name == operation)
    }

    pub fn is_profiled(&self, operation: &str) -> bool {
        self.operations
            .iter()
            .any(|op| op.profiled && op.name == operation)
    }

    fn has_profiled_operations(&self) -> bool {
        self.operations.iter().any(|op| op.profiled)
    }
}

pub struct Profiler {
    clock: Arc<dyn Clock>,
    state: Arc<ProfilingState>,
    started_at: DateTime<Utc>,
}

impl Profiler {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let started_at = clock.wall_time();
        Profiler {
            clock,
            state: Arc::new(ProfilingState::new()),
            started_at,
        }
    }

    /// Wraps `delegate` in a proxy that times the profiled operations of
    /// `capabilities`.
    ///
    /// Fails with [`ProfilerError::InvalidTarget`] when the set has nothing to
    /// profile.
    pub fn wrap<T>(
        &self,
        capabilities: CapabilitySet,
        delegate: T,
    ) -> Result<Profiled<T>, ProfilerError> {
        if !capabilities.has_profiled_operations() {
            return Err(ProfilerError::InvalidTarget(capabilities.name()));
        }
        Ok(Profiled::new(
            delegate,
            capabilities,
            Arc::clone(&self.clock),
            Arc::clone(&self.state),
        ))
    }

    pub fn state(&self) -> &ProfilingState {
        &self.state
    }

    /// Writes the report: a `Run at` header, one line per profiled operation,
    /// and a trailing blank line.
    pub fn write_data<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writeln!(
            writer,
            "Run at {}",
            self.started_at.format("%a, %-d %b %Y %H:%M:%S GMT")
        )?;
        self.state.write(writer)?;
        writeln!(writer)
    }

    /// Appends the report to `path`, creating the file if needed.
    pub fn write_data_to_path(&self, path: &Path) -> io::Result<()> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = BufWriter::new(file);
        self.write_data(&mut writer)?;
        writer.flush()
    }
}
