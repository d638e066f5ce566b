use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{after, never, Receiver, Sender};

use crate::cache::domain::subtitle_cache::SubtitleCache;
use crate::playback::domain::caption_queue::CaptionQueue;
use crate::playback::domain::caption_renderer::CaptionRenderer;
use crate::playback::domain::playback_clock::PlaybackClock;
use crate::shared::constants::{CAPTION_CLEAR_DELAY_MS, DEFAULT_SEGMENT_DURATION_MS};
use crate::shared::source_identity::{SegmentKey, SourceIdentity};
use crate::shared::timing::round_to_boundary;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlayerEvent {
    PlayingChanged(bool),
    PositionDiscontinuity(u64),
    Ended,
}

#[derive(Clone, Debug)]
pub struct SynchronizerConfig {
    pub segment_duration_ms: u64,
    /// How long the final caption stays visible after playback ends.
    pub clear_delay_ms: u64,
}

impl Default for SynchronizerConfig {
    fn default() -> Self {
        Self {
            segment_duration_ms: DEFAULT_SEGMENT_DURATION_MS,
            clear_delay_ms: CAPTION_CLEAR_DELAY_MS,
        }
    }
}

/// Keeps cached captions aligned with the player's clock.
///
/// One control thread per synchronizer, driven by [`PlayerEvent`]s and at
/// most one pending timer at a time. The timer is a channel: replacing it
/// cancels the wait outright, so a stale wait can never fire a lookup for
/// a position the player has left.
pub struct PlaybackSynchronizer;

impl PlaybackSynchronizer {
    pub fn spawn(
        cache: Arc<dyn SubtitleCache>,
        source: SourceIdentity,
        clock: Box<dyn PlaybackClock>,
        renderer: Box<dyn CaptionRenderer>,
        config: SynchronizerConfig,
    ) -> SynchronizerHandle {
        let (events_tx, events_rx) = crossbeam_channel::unbounded();
        let thread = std::thread::spawn(move || {
            control_loop(events_rx, cache, source, clock, renderer, config);
        });
        SynchronizerHandle {
            events: Some(events_tx),
            thread: Some(thread),
        }
    }
}

/// Handle to a running synchronizer. Dropping it disconnects the event
/// channel, which shuts the control thread down and joins it; no timer
/// outlives the handle.
pub struct SynchronizerHandle {
    events: Option<Sender<PlayerEvent>>,
    thread: Option<JoinHandle<()>>,
}

impl SynchronizerHandle {
    pub fn playing_changed(&self, playing: bool) {
        self.send(PlayerEvent::PlayingChanged(playing));
    }

    pub fn position_discontinuity(&self, position_ms: u64) {
        self.send(PlayerEvent::PositionDiscontinuity(position_ms));
    }

    pub fn ended(&self) {
        self.send(PlayerEvent::Ended);
    }

    fn send(&self, event: PlayerEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }
}

impl Drop for SynchronizerHandle {
    fn drop(&mut self) {
        self.events.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// What the armed timer will do when it fires.
enum Pending {
    Nothing,
    Caption,
    Clear,
}

fn control_loop(
    events: Receiver<PlayerEvent>,
    cache: Arc<dyn SubtitleCache>,
    source: SourceIdentity,
    clock: Box<dyn PlaybackClock>,
    mut renderer: Box<dyn CaptionRenderer>,
    config: SynchronizerConfig,
) {
    let mut queue = CaptionQueue::new();
    let mut due_ms: u64 = 0;
    let mut playing = false;
    let mut timer: Receiver<Instant> = never();
    let mut pending = Pending::Nothing;

    loop {
        crossbeam_channel::select! {
            recv(events) -> event => match event {
                Err(_) => break,
                Ok(PlayerEvent::PlayingChanged(now_playing)) => {
                    playing = now_playing;
                    if playing {
                        timer = arm_caption_wait(due_ms, &*clock);
                        pending = Pending::Caption;
                    } else {
                        timer = never();
                        pending = Pending::Nothing;
                    }
                }
                Ok(PlayerEvent::PositionDiscontinuity(position_ms)) => {
                    // The next due caption is relative to the freshest
                    // position; the in-flight wait is discarded.
                    due_ms = round_to_boundary(position_ms, config.segment_duration_ms);
                    if playing {
                        timer = arm_caption_wait(due_ms, &*clock);
                        pending = Pending::Caption;
                    } else {
                        timer = never();
                        pending = Pending::Nothing;
                    }
                }
                Ok(PlayerEvent::Ended) => {
                    playing = false;
                    timer = after(Duration::from_millis(config.clear_delay_ms));
                    pending = Pending::Clear;
                }
            },
            recv(timer) -> _ => {
                timer = never();
                match pending {
                    Pending::Caption => {
                        let key = SegmentKey::new(source.clone(), due_ms);
                        show_due_caption(&*cache, &key, &mut queue, &mut *renderer);
                        due_ms = round_to_boundary(
                            due_ms + config.segment_duration_ms,
                            config.segment_duration_ms,
                        );
                        if playing {
                            timer = arm_caption_wait(due_ms, &*clock);
                        } else {
                            pending = Pending::Nothing;
                        }
                    }
                    Pending::Clear => {
                        queue.clear();
                        renderer.clear();
                        pending = Pending::Nothing;
                    }
                    Pending::Nothing => {}
                }
            }
        }
    }
}

fn arm_caption_wait(due_ms: u64, clock: &dyn PlaybackClock) -> Receiver<Instant> {
    let wait_ms = due_ms.saturating_sub(clock.position_ms());
    after(Duration::from_millis(wait_ms))
}

fn show_due_caption(
    cache: &dyn SubtitleCache,
    key: &SegmentKey,
    queue: &mut CaptionQueue,
    renderer: &mut dyn CaptionRenderer,
) {
    match cache.get(key) {
        Ok(Some(text)) => {
            queue.push(&text);
            renderer.set_cues(queue.lines());
        }
        // Absent keys are the normal sparse-batch case; skip silently.
        Ok(None) => {}
        Err(e) => log::warn!("caption lookup failed for {}ms: {e}", key.start_ms),
    }
}
