//! In-process stand-in for a simulation backend: answers the width query and
//! pushes a fresh random world every tick.

use std::thread;
use std::time::Duration;

use log::{debug, info};

use crate::backend::{BackendEvent, EventSink, Feed};
use crate::error::BackendError;
use crate::world::{Cell, WorldSnapshot};

/// Share of cells seeded alive.
const ALIVE_RATIO: f32 = 0.35;

/// Generate a pseudorandom seed for the demo PRNG.
fn generate_seed() -> Result<(u64, u64), getrandom::Error> {
    use byteorder::{ByteOrder, NativeEndian};

    let mut seed = [0_u8; 16];
    getrandom::getrandom(&mut seed)?;

    Ok((
        NativeEndian::read_u64(&seed[0..8]),
        NativeEndian::read_u64(&seed[8..16]),
    ))
}

pub fn random_snapshot(rng: &mut randomize::PCG32, width: usize) -> WorldSnapshot {
    let cells = (0..width)
        .map(|_| {
            (0..width)
                .map(|_| {
                    if randomize::f32_half_open_right(rng.next_u32()) < ALIVE_RATIO {
                        Cell::Alive
                    } else {
                        Cell::Dead
                    }
                })
                .collect()
        })
        .collect();
    WorldSnapshot::new(cells)
}

#[derive(Debug, Clone)]
pub struct DemoBackend {
    width: usize,
    tick: Duration,
}

impl DemoBackend {
    pub fn new(width: usize, tick: Duration) -> Self {
        Self { width, tick }
    }

    pub fn spawn<S: EventSink>(self, sink: S) -> Result<Feed, BackendError> {
        let mut rng: randomize::PCG32 = generate_seed()?.into();
        info!("starting demo backend, {0}x{0} every {1:?}", self.width, self.tick);

        let thread = thread::Builder::new()
            .name("demo-backend".into())
            .spawn(move || {
                if !sink.deliver(BackendEvent::WorldWidth(self.width)) {
                    return;
                }
                loop {
                    let snapshot = random_snapshot(&mut rng, self.width);
                    if !sink.deliver(BackendEvent::UpdateWorld(snapshot)) {
                        debug!("event loop gone, stopping demo backend");
                        return;
                    }
                    thread::sleep(self.tick);
                }
            })?;

        Ok(Feed {
            child: None,
            _stdin: None,
            _thread: thread,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn random_snapshots_have_requested_size() {
        let mut rng: randomize::PCG32 = (7, 11).into();
        let snapshot = random_snapshot(&mut rng, 9);
        assert_eq!(snapshot.validate(9), Ok(()));
    }

    #[test]
    fn same_seed_gives_same_world() {
        let mut a: randomize::PCG32 = (1, 2).into();
        let mut b: randomize::PCG32 = (1, 2).into();
        assert_eq!(random_snapshot(&mut a, 12), random_snapshot(&mut b, 12));
    }

    #[test]
    fn demo_answers_width_before_pushing_worlds() {
        let (tx, rx) = mpsc::channel();
        let _feed = DemoBackend::new(4, Duration::from_millis(1)).spawn(tx).unwrap();

        assert_eq!(rx.recv().unwrap(), BackendEvent::WorldWidth(4));
        match rx.recv().unwrap() {
            BackendEvent::UpdateWorld(snapshot) => assert_eq!(snapshot.validate(4), Ok(())),
            other => panic!("expected a world update, got {other:?}"),
        }
    }
}
