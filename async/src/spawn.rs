/// Spawns a task into a pool inside its own `trace` span.
///
/// The span is a root span that follows from the caller's current span, so a
/// long-lived connection task does not keep its parent span open.
///
/// ```text
/// bpwire_async::spawn!(pool, "session", async { ... })
/// bpwire_async::spawn!(pool, "session", (%peer), async { ... })
/// ```
#[macro_export]
macro_rules! spawn {
    ($pool:expr, $name:literal, async $($rest:tt)*) => {{
        let span = $crate::__tracing::trace_span!(parent: None, $name);
        span.follows_from($crate::__tracing::Span::current());
        $pool.spawn($crate::__tracing::Instrument::instrument(async $($rest)*, span))
    }};

    ($pool:expr, $name:literal, ($($field:tt)*), async $($rest:tt)*) => {{
        let span = $crate::__tracing::trace_span!(parent: None, $name, $($field)*);
        span.follows_from($crate::__tracing::Span::current());
        $pool.spawn($crate::__tracing::Instrument::instrument(async $($rest)*, span))
    }};
}
