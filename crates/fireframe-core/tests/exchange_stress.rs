//! Concurrent stress test for the triple-buffered frame exchange.
//!
//! The producer fills each frame with its sequence number. Any frame the
//! consumer sees must be uniform (never torn) and sequence numbers must never
//! go backwards.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use fireframe_core::exchange::FrameExchange;

const FRAMES: i32 = 5_000;

#[test]
fn consumer_never_sees_a_torn_frame() {
    let exchange = Arc::new(FrameExchange::new(64, 32, 1));
    let done = Arc::new(AtomicBool::new(false));

    let producer = {
        let exchange = Arc::clone(&exchange);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            for seq in 1..=FRAMES {
                exchange.produce(|front, back| {
                    let prev = front.data()[0];
                    assert!(front.data().iter().all(|&v| v == prev), "front torn");
                    for v in back.data_mut() {
                        *v = seq;
                    }
                });
            }
            done.store(true, Ordering::Release);
        })
    };

    let consumer = {
        let exchange = Arc::clone(&exchange);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut last = 0;
            let mut observed = 0u32;
            loop {
                let finished = done.load(Ordering::Acquire);
                let seq = exchange.consume(|s| {
                    let first = s.data()[0];
                    assert!(s.data().iter().all(|&v| v == first), "torn frame {first}");
                    first
                });
                assert!(seq >= last, "went backwards from {last} to {seq}");
                if seq > last {
                    last = seq;
                    observed += 1;
                }
                if finished {
                    break;
                }
            }
            (last, observed)
        })
    };

    producer.join().expect("producer panicked");
    let (last, observed) = consumer.join().expect("consumer panicked");
    assert_eq!(last, FRAMES, "final frame must be visible after the producer stops");
    assert!(observed >= 1);
}

#[test]
fn many_consumers_serialize_on_their_side() {
    let exchange = Arc::new(FrameExchange::new(16, 8, 0));
    exchange.produce(|_, back| back.fill(42));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let exchange = Arc::clone(&exchange);
            thread::spawn(move || {
                for _ in 0..1000 {
                    exchange.consume(|s| {
                        assert!(s.data().iter().all(|&v| v == 42));
                    });
                }
            })
        })
        .collect();
    for h in handles {
        h.join().expect("consumer panicked");
    }
}
