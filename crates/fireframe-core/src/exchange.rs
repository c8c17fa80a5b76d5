#![forbid(unsafe_code)]

//! Triple-buffered frame handoff between the simulation and render workers.
//!
//! Three surfaces rotate between three roles:
//!
//! - **back**: owned by the producer, written in place each step.
//! - **ready**: the newest completed frame, held in an atomic slot.
//! - **render**: owned by the consumer, read while mapping to pixels.
//!
//! Publishing swaps back into the ready slot, marked fresh, and takes the
//! previous ready surface as the next back. Consuming a fresh slot swaps the
//! consumer's previous frame in, marked stale, and takes the newest one. A
//! stale slot is left where it is and the consumer re-reads its own frame.
//! Neither side waits for the other; a frame may be skipped or shown twice
//! but is never torn and never older than one already shown.
//!
//! The producer also keeps a shared handle to the frame it last published
//! (`front`), which the fire filter reads as its diffusion source while the
//! consumer may be reading the same frame.

use std::sync::Arc;

use crossbeam::atomic::AtomicCell;
use parking_lot::Mutex;

use crate::surface::FixedSurface;

/// Content of the ready slot. Freshness travels with the frame so both
/// change in one atomic swap.
struct Ready {
    frame: Arc<FixedSurface>,
    fresh: bool,
}

#[derive(Debug)]
struct ProducerSide {
    back: Arc<FixedSurface>,
    front: Arc<FixedSurface>,
}

/// Lock-free single-producer single-consumer frame slot.
///
/// The two mutexes only serialize callers on the same side; the producer and
/// the consumer never contend with each other.
pub struct FrameExchange {
    ready: AtomicCell<Ready>,
    producer: Mutex<ProducerSide>,
    consumer: Mutex<Arc<FixedSurface>>,
}

impl FrameExchange {
    /// Three zeroed surfaces of `width x height` plus `extra_rows`.
    pub fn new(width: usize, height: usize, extra_rows: usize) -> Self {
        let blank = || Arc::new(FixedSurface::new(width, height, extra_rows));
        let ready = blank();
        Self {
            producer: Mutex::new(ProducerSide {
                back: blank(),
                front: Arc::clone(&ready),
            }),
            ready: AtomicCell::new(Ready {
                frame: ready,
                fresh: false,
            }),
            consumer: Mutex::new(blank()),
        }
    }

    /// Replace all three surfaces. Exclusive access means neither worker can
    /// be mid-frame.
    pub fn resize(&mut self, width: usize, height: usize, extra_rows: usize) {
        tracing::debug!(width, height, extra_rows, "rebuilding frame surfaces");
        *self = Self::new(width, height, extra_rows);
    }

    /// Run one producer step and publish its result.
    ///
    /// `step` gets the last published frame and the private back surface.
    pub fn produce<R>(&self, step: impl FnOnce(&FixedSurface, &mut FixedSurface) -> R) -> R {
        let mut side = self.producer.lock();
        let ProducerSide { back, front } = &mut *side;
        // The back surface came out of the ready slot, so nobody else holds
        // it. make_mut only copies if that ever stops being true.
        let out = step(front, Arc::make_mut(back));

        let published = Arc::clone(back);
        let reclaimed = self.ready.swap(Ready {
            frame: Arc::clone(&published),
            fresh: true,
        });
        side.front = published;
        side.back = reclaimed.frame;
        out
    }

    /// Take the newest published frame, if there is one, and read it.
    /// Without a new publish the consumer's current frame is read again.
    pub fn consume<R>(&self, read: impl FnOnce(&FixedSurface) -> R) -> R {
        let mut current = self.consumer.lock();
        let taken = self.ready.swap(Ready {
            frame: Arc::clone(&current),
            fresh: false,
        });
        if taken.fresh {
            *current = taken.frame;
        } else {
            // Put the spare back. A publish may have landed in between, in
            // which case the producer now owns our old frame.
            let displaced = self.ready.swap(taken);
            if displaced.fresh {
                *current = displaced.frame;
            }
        }
        read(&current)
    }
}

impl std::fmt::Debug for FrameExchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameExchange").finish_non_exhaustive()
    }
}
