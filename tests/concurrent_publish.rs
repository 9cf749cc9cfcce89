//=========================================================================
// Concurrent Publish
//=========================================================================
//
// k producer threads post m events each while the router drains on the
// test thread. Every event must arrive exactly once, and each producer's
// events must arrive in the order it posted them.
//
//=========================================================================

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

use aetheric_events::prelude::*;

const PRODUCERS: usize = 4;
const PER_PRODUCER: usize = 250;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Tagged {
    producer: usize,
    seq: usize,
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn every_published_event_arrives_exactly_once() {
    init_logging();
    let total = PRODUCERS * PER_PRODUCER;
    let mut router = EventRouter::new(EventBusBuilder::new().with_capacity(total).build());

    let received = Rc::new(RefCell::new(Vec::with_capacity(total)));
    let sink = Rc::clone(&received);
    let _tagged = router.register_fn(move |e: &CustomUserEvent<Tagged>| sink.borrow_mut().push(**e));

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|producer| {
            let publisher = router.bus().publisher();
            thread::spawn(move || {
                for seq in 0..PER_PRODUCER {
                    publisher
                        .publish(CustomUserEvent::new(Tagged { producer, seq }))
                        .expect("capacity covers every producer");
                }
            })
        })
        .collect();

    // Drain concurrently with the producers.
    let deadline = Instant::now() + Duration::from_secs(10);
    while received.borrow().len() < total {
        assert!(Instant::now() < deadline, "timed out after {} events", received.borrow().len());
        if router.process_next_event() == ProcessOutcome::Empty {
            thread::yield_now();
        }
    }
    for producer in producers {
        producer.join().expect("producer thread panicked");
    }
    assert_eq!(router.process_next_event(), ProcessOutcome::Empty);

    let received = received.borrow();
    let unique: HashSet<_> = received.iter().copied().collect();
    assert_eq!(received.len(), total);
    assert_eq!(unique.len(), total, "no duplicates");

    for producer in 0..PRODUCERS {
        let seqs: Vec<_> = received
            .iter()
            .filter(|t| t.producer == producer)
            .map(|t| t.seq)
            .collect();
        assert_eq!(seqs, (0..PER_PRODUCER).collect::<Vec<_>>(), "producer {} out of order", producer);
    }
}

#[test]
fn full_queue_hands_event_back() {
    init_logging();
    let router = EventRouter::new(EventBusBuilder::new().with_capacity(1).build());
    let publisher = router.bus().publisher();

    publisher.publish(UserEvent::new(1)).unwrap();
    let rejected = thread::spawn(move || publisher.publish(UserEvent::new(2)).unwrap_err())
        .join()
        .unwrap();

    assert_eq!(rejected.reason(), PublishReason::QueueFull);
    assert_eq!(rejected.into_event().code(), 2);
}
