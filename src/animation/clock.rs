use crate::error::RenderError;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

pub const MAX_FPS: u32 = 240;

/// A refresh signal. Each call waits for the next refresh and returns the
/// time elapsed since the source started; `None` means the source is gone.
#[async_trait]
pub trait TickSource: Send {
    async fn next_tick(&mut self) -> Option<Duration>;
}

/// Fixed-rate refresh signal backed by the tokio timer. Late ticks are
/// dropped rather than replayed in a burst.
pub struct IntervalTicker {
    interval: Interval,
    origin: Instant,
}

impl IntervalTicker {
    /// Must be called from within a tokio runtime.
    pub fn new(fps: u32) -> Self {
        let fps = fps.clamp(1, MAX_FPS);
        let mut interval = time::interval(Duration::from_secs(1) / fps);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        Self {
            interval,
            origin: Instant::now(),
        }
    }
}

#[async_trait]
impl TickSource for IntervalTicker {
    async fn next_tick(&mut self) -> Option<Duration> {
        let at = self.interval.tick().await;
        Some(at.saturating_duration_since(self.origin))
    }
}

/// Replays a fixed list of timestamps, then ends. Used as a virtual clock.
#[derive(Debug, Default)]
pub struct ManualTicker {
    ticks: VecDeque<Duration>,
}

impl ManualTicker {
    pub fn new(ticks: impl IntoIterator<Item = Duration>) -> Self {
        Self {
            ticks: ticks.into_iter().collect(),
        }
    }

    /// `count` ticks spaced `period` apart, the first at `period`.
    pub fn every(period: Duration, count: u32) -> Self {
        Self::new((1..=count).map(|i| period * i))
    }

    pub fn remaining(&self) -> usize {
        self.ticks.len()
    }
}

#[async_trait]
impl TickSource for ManualTicker {
    async fn next_tick(&mut self) -> Option<Duration> {
        self.ticks.pop_front()
    }
}

/// Throttling policy: with `every(n)`, every n-th tick is dropped.
/// Values below 2 disable skipping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameSkip {
    every: u32,
}

impl FrameSkip {
    pub const NONE: FrameSkip = FrameSkip { every: 0 };

    pub fn every(n: u32) -> Self {
        Self {
            every: if n < 2 { 0 } else { n },
        }
    }

    pub fn skips(&self, tick: u64) -> bool {
        self.every >= 2 && tick % self.every as u64 == 0
    }
}

/// Shared stop latch. Once stopped, a clock never runs again.
#[derive(Debug, Clone)]
pub struct ClockHandle {
    running: Arc<AtomicBool>,
}

impl ClockHandle {
    fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub enum ClockExit {
    Stopped,
    SourceEnded,
    SurfaceLost(RenderError),
}

pub struct AnimationClock<S: TickSource> {
    source: S,
    skip: FrameSkip,
    handle: ClockHandle,
    ticks: u64,
    frames: u64,
    last_elapsed: Duration,
}

impl<S: TickSource> AnimationClock<S> {
    pub fn new(source: S, skip: FrameSkip) -> Self {
        Self {
            source,
            skip,
            handle: ClockHandle::new(),
            ticks: 0,
            frames: 0,
            last_elapsed: Duration::ZERO,
        }
    }

    pub fn handle(&self) -> ClockHandle {
        self.handle.clone()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Callbacks delivered so far, skipped ticks excluded.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Invokes `on_frame` once per non-skipped tick until the handle is
    /// stopped, the source ends, or `on_frame` fails. The running flag is
    /// checked right before every invocation, so once `stop` returns on the
    /// clock's own task no further frame is delivered. A stop issued before
    /// `start` holds, and nothing is delivered. A failing frame stops the
    /// clock instead of propagating.
    pub async fn start<F>(&mut self, mut on_frame: F) -> ClockExit
    where
        F: FnMut(Duration) -> Result<(), RenderError>,
    {
        loop {
            if !self.handle.is_running() {
                return ClockExit::Stopped;
            }

            let Some(now) = self.source.next_tick().await else {
                self.handle.stop();
                return ClockExit::SourceEnded;
            };

            if !self.handle.is_running() {
                return ClockExit::Stopped;
            }

            self.ticks += 1;
            if self.skip.skips(self.ticks) {
                continue;
            }

            let elapsed = now.max(self.last_elapsed);
            self.last_elapsed = elapsed;
            self.frames += 1;

            if let Err(e) = on_frame(elapsed) {
                self.handle.stop();
                return ClockExit::SurfaceLost(e);
            }
        }
    }
}
