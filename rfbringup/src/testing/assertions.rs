//! Test assertions for journals, releases and events.

use crate::events::CollectingEventSink;

/// Asserts that entries starting with each of `expected` appear in
/// `journal` in order, not necessarily contiguously.
pub fn assert_in_order(journal: &[String], expected: &[&str]) {
    let mut remaining = journal.iter();
    for entry in expected {
        assert!(
            remaining.any(|e| e.starts_with(entry)),
            "Expected '{}' in order, journal was: {:?}",
            entry,
            journal
        );
    }
}

/// Asserts that `released` is exactly `acquired` reversed.
pub fn assert_released_in_reverse(acquired: &[String], released: &[String]) {
    let expected: Vec<&String> = acquired.iter().rev().collect();
    let actual: Vec<&String> = released.iter().collect();
    assert_eq!(
        actual, expected,
        "Expected release in reverse acquisition order"
    );
}

/// Asserts that the sink received events of `types` in order.
pub fn assert_event_sequence(sink: &CollectingEventSink, types: &[&str]) {
    assert_in_order(&sink.event_types(), types);
}

/// Asserts that no event of `event_type` was received.
pub fn assert_no_event(sink: &CollectingEventSink, event_type: &str) {
    assert_eq!(
        sink.count_of(event_type),
        0,
        "Expected no '{}' events, got: {:?}",
        event_type,
        sink.event_types()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventSink;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_in_order_allows_gaps() {
        let journal = strings(&["a", "b", "c", "d"]);
        assert_in_order(&journal, &["a", "c", "d"]);
    }

    #[test]
    #[should_panic(expected = "in order")]
    fn test_in_order_rejects_swaps() {
        let journal = strings(&["a", "b", "c"]);
        assert_in_order(&journal, &["c", "a"]);
    }

    #[test]
    fn test_in_order_matches_prefixes() {
        let journal = strings(&["synth.set_rate rx 1", "synth.enable rx"]);
        assert_in_order(&journal, &["synth.set_rate", "synth.enable"]);
    }

    #[test]
    fn test_reverse_release() {
        assert_released_in_reverse(&strings(&["a", "b"]), &strings(&["b", "a"]));
    }

    #[test]
    fn test_event_sequence() {
        let sink = CollectingEventSink::new();
        sink.try_emit("stage.started", None);
        sink.try_emit("resource.acquired", None);
        sink.try_emit("stage.completed", None);

        assert_event_sequence(&sink, &["stage.started", "stage.completed"]);
        assert_no_event(&sink, "stage.failed");
    }
}
