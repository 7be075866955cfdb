use strata_observability::tracing_setup::{events, spans};
use strata_observability::{classification_span, hop_span, routing_span};

#[test]
fn init_is_idempotent() {
    strata_observability::init_tracing_with_filter("debug");
    // A second install must not panic.
    strata_observability::init_tracing();
}

#[test]
fn spans_and_events_emit_without_subscriber_errors() {
    strata_observability::init_tracing_with_filter("trace");
    let span = routing_span!("show me auth dependencies", "ARCHITECTURAL");
    let _guard = span.enter();
    let _c = classification_span!("q");
    let _h = hop_span!("sq-1", 0usize);
    events::layer_failed("VECTOR", "timed out", 2_000);
    events::degradation_triggered("classifier", "schema violation", "GENERAL");
    events::hop_failed("sq-1", 1, "timeout");
    assert_eq!(spans::names::ROUTING, "strata.routing");
}
