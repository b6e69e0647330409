#![allow(unused_crate_dependencies, reason = "These are tests, not the main crate.")]

mod util;


use std::{sync::Arc, thread};

use anchored_logbook::{FacilityOptions, FacilityRegistry, TargetFileName, codes};
use anchored_logstore::MemoryStore;

use self::util::{read_lines, scratch_dir};


const PRODUCERS: usize = 4;
const MESSAGES_PER_PRODUCER: usize = 250;


/// - Spawn `PRODUCERS` threads, each submitting `MESSAGES_PER_PRODUCER` messages
/// - Join the producers, then close the facility once
/// - Confirm the destination holds exactly `PRODUCERS * MESSAGES_PER_PRODUCER` records,
///   with each producer's messages in its own submission order
#[test]
fn producers_interleave_but_never_reorder() {
    let dir = scratch_dir("producers_never_reorder");
    let mut registry = FacilityRegistry::new(MemoryStore::new(), &dir);
    registry.init("shared", FacilityOptions::new()).unwrap();

    let registry = Arc::new(registry);

    let producers = (0..PRODUCERS)
        .map(|producer| {
            thread::spawn({
                let registry = Arc::clone(&registry);
                move || {
                    for i in 0..MESSAGES_PER_PRODUCER {
                        registry
                            .log_message(
                                "shared",
                                &format!("producer-{producer} message-{i:04}"),
                                None,
                                codes::GENERIC,
                            )
                            .unwrap();
                    }
                }
            })
        })
        .collect::<Vec<_>>();

    for producer in producers {
        producer.join().unwrap();
    }

    let mut registry = Arc::try_unwrap(registry).ok().unwrap();
    registry.close("shared", false).unwrap();

    let lines = read_lines(&TargetFileName::Text { facility: "shared" }.file_path(&dir));
    assert_eq!(lines.len(), PRODUCERS * MESSAGES_PER_PRODUCER + 2);

    // Cross-producer interleaving is unspecified, but each producer's own messages must appear
    // in submission order.
    for producer in 0..PRODUCERS {
        let marker = format!("producer-{producer} ");
        let of_producer = lines
            .iter()
            .filter(|line| line.contains(&marker))
            .collect::<Vec<_>>();

        assert_eq!(of_producer.len(), MESSAGES_PER_PRODUCER);
        for (i, line) in of_producer.iter().enumerate() {
            assert!(line.ends_with(&format!("message-{i:04}")));
        }
    }
}

/// Close blocks until previously-submitted messages are fully materialized, even when the
/// producers only just finished.
#[test]
fn close_drains_everything_submitted_before_it() {
    let dir = scratch_dir("close_drains_everything");
    let mut registry = FacilityRegistry::new(MemoryStore::new(), &dir);
    registry.init("drained", FacilityOptions::new()).unwrap();

    for i in 0..1000 {
        registry.log_message("drained", &format!("burst-{i}"), None, codes::GENERIC).unwrap();
    }
    // No sleeps: the drain inside close is what guarantees completeness.
    registry.close("drained", false).unwrap();

    let lines = read_lines(&TargetFileName::Text { facility: "drained" }.file_path(&dir));
    assert_eq!(lines.len(), 1002);
}
