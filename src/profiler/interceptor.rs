use std::{any::type_name, sync::Arc, time::Instant};

use super::{CapabilitySet, ProfilingState};
use crate::clock::Clock;

// pointer-like types that are looked through when naming an implementation
const TRANSPARENT_WRAPPERS: &[&str] = &[
    "alloc::sync::Arc",
    "alloc::rc::Rc",
    "alloc::boxed::Box",
    "std::sync::Arc",
    "std::rc::Rc",
    "std::boxed::Box",
    concat!(module_path!(), "::Profiled"),
];

/// A proxy around `T` that times the profiled operations of its capability
/// set.
///
/// `Profiled<T>` implements the same capability trait as `T`; each method of
/// that impl routes through [`Profiled::intercept`]. Results and errors come
/// back untouched, so callers cannot tell the proxy from the real object
/// except through the profiler's report.
pub struct Profiled<T> {
    delegate: T,
    implementation: String,
    capabilities: CapabilitySet,
    clock: Arc<dyn Clock>,
    state: Arc<ProfilingState>,
}

impl<T> Profiled<T> {
    pub(super) fn new(
        delegate: T,
        capabilities: CapabilitySet,
        clock: Arc<dyn Clock>,
        state: Arc<ProfilingState>,
    ) -> Self {
        Profiled {
            delegate,
            implementation: implementation_name(type_name::<T>()),
            capabilities,
            clock,
            state,
        }
    }

    /// Runs `call` against the delegate, timing it when `operation` is
    /// profiled in this proxy's capability set.
    pub fn intercept<R>(&self, operation: &'static str, call: impl FnOnce(&T) -> R) -> R {
        debug_assert!(
            self.capabilities.contains(operation),
            "{operation} is not part of the {} capability set",
            self.capabilities.name()
        );
        if !self.capabilities.is_profiled(operation) {
            return call(&self.delegate);
        }

        // recorded on drop, so a panicking delegate is still timed
        let _timer = CallTimer {
            clock: self.clock.as_ref(),
            state: &self.state,
            implementation: &self.implementation,
            operation,
            start: self.clock.now(),
        };
        call(&self.delegate)
    }

    /// Name the delegate's time is reported under.
    pub fn implementation(&self) -> &str {
        &self.implementation
    }
}

/// Reduces a full type name to the implementation behind it: smart pointers
/// and proxies are unwrapped and generic arguments dropped, so
/// `Arc<my::Parser>` and `my::Crawler<Profiled<my::Parser>>` become
/// `my::Parser` and `my::Crawler`.
fn implementation_name(full: &str) -> String {
    let mut name = full.trim_start_matches('&');
    while let Some(open) = name.find('<') {
        let outer = &name[..open];
        if !TRANSPARENT_WRAPPERS.contains(&outer) {
            return outer.to_string();
        }
        let inner = name[open + 1..].strip_suffix('>').unwrap_or(&name[open + 1..]);
        name = first_generic_argument(inner).trim().trim_start_matches('&');
    }
    name.to_string()
}

// `A<B, C>, D` -> `A<B, C>`
fn first_generic_argument(arguments: &str) -> &str {
    let mut depth = 0usize;
    for (i, c) in arguments.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => return &arguments[..i],
            _ => {}
        }
    }
    arguments
}

struct CallTimer<'a> {
    clock: &'a dyn Clock,
    state: &'a ProfilingState,
    implementation: &'a str,
    operation: &'static str,
    start: Instant,
}

impl Drop for CallTimer<'_> {
    fn drop(&mut self) {
        let elapsed = self.clock.now().saturating_duration_since(self.start);
        self.state.record(self.implementation, self.operation, elapsed);
    }
}
