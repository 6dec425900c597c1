//! Shared playback buffer between the mixer (producer, render thread) and
//! the device callback (consumer, audio thread).
//!
//! Single producer, single consumer: the mixer only appends finalized
//! samples, the callback only reads sequentially. The mutex guards the
//! minimum critical section (the append or the copy); there is no
//! backpressure, so if the consumer falls behind the buffer simply grows.

use crate::audio_data::StereoSample;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

struct PlaybackState {
    buffer: Vec<StereoSample>,
    cursor: usize,
}

pub struct PlaybackShared {
    state: Mutex<PlaybackState>,
    offline: AtomicBool,
}

impl PlaybackShared {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(PlaybackState {
                buffer: Vec::new(),
                cursor: 0,
            }),
            offline: AtomicBool::new(false),
        }
    }

    /// High-quality offline renders keep mixing but never feed the device.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Relaxed);
    }

    pub fn is_offline(&self) -> bool {
        self.offline.load(Ordering::Relaxed)
    }

    /// Fills `out` from the read cursor. Writes silence and returns false if
    /// the buffer does not yet hold enough unconsumed samples or the system
    /// is rendering offline; underruns are silent, never blocking.
    pub fn fill(&self, out: &mut [StereoSample]) -> bool {
        if self.is_offline() {
            out.fill(StereoSample::SILENCE);
            return false;
        }
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        if state.buffer.len() < state.cursor + out.len() {
            drop(state);
            out.fill(StereoSample::SILENCE);
            return false;
        }
        let cursor = state.cursor;
        out.copy_from_slice(&state.buffer[cursor..cursor + out.len()]);
        state.cursor += out.len();
        true
    }

    /// Publishes the finalized samples for absolute sample-times
    /// `[start, start + samples.len())`. Buffer index stays equal to
    /// absolute sample-time: gaps below `start` are zero-filled and
    /// anything previously published at or past `start` is replaced, so a
    /// rewound window overwrites in place instead of appending.
    pub(crate) fn publish(&self, start: usize, samples: &[StereoSample]) {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        if state.buffer.len() > start {
            state.buffer.truncate(start);
        } else if state.buffer.len() < start {
            state.buffer.resize(start, StereoSample::SILENCE);
        }
        state.buffer.extend_from_slice(samples);
    }

    /// Snaps the read cursor to `position` (the current mix position),
    /// correcting accumulated drift.
    pub fn resync_to(&self, position: usize) {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        state.cursor = position;
    }

    /// Current read cursor in samples.
    pub fn cursor(&self) -> usize {
        match self.state.lock() {
            Ok(state) => state.cursor,
            Err(poisoned) => poisoned.into_inner().cursor,
        }
    }

    /// Total finalized samples published so far.
    pub fn len(&self) -> usize {
        match self.state.lock() {
            Ok(state) => state.buffer.len(),
            Err(poisoned) => poisoned.into_inner().buffer.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PlaybackShared {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> Vec<StereoSample> {
        (0..n).map(|i| StereoSample::new(i as i16, -(i as i16))).collect()
    }

    #[test]
    fn test_fill_copies_and_advances() {
        let shared = PlaybackShared::new();
        shared.publish(0, &ramp(8));

        let mut out = [StereoSample::SILENCE; 4];
        assert!(shared.fill(&mut out));
        assert_eq!(out[3], StereoSample::new(3, -3));
        assert!(shared.fill(&mut out));
        assert_eq!(out[0], StereoSample::new(4, -4));
        assert_eq!(shared.cursor(), 8);
    }

    #[test]
    fn test_starved_fill_is_silence() {
        let shared = PlaybackShared::new();
        shared.publish(0, &ramp(2));

        let mut out = [StereoSample::new(9, 9); 4];
        assert!(!shared.fill(&mut out));
        assert_eq!(out, [StereoSample::SILENCE; 4]);
        // nothing was consumed
        assert_eq!(shared.cursor(), 0);
    }

    #[test]
    fn test_offline_fill_is_silence() {
        let shared = PlaybackShared::new();
        shared.publish(0, &ramp(8));
        shared.set_offline(true);

        let mut out = [StereoSample::new(9, 9); 4];
        assert!(!shared.fill(&mut out));
        assert_eq!(out, [StereoSample::SILENCE; 4]);
    }

    #[test]
    fn test_publish_zero_fills_gaps() {
        let shared = PlaybackShared::new();
        shared.publish(4, &ramp(2));
        assert_eq!(shared.len(), 6);

        let mut out = [StereoSample::new(9, 9); 4];
        assert!(shared.fill(&mut out));
        assert_eq!(out, [StereoSample::SILENCE; 4]);
    }

    #[test]
    fn test_publish_replaces_from_start() {
        let shared = PlaybackShared::new();
        shared.publish(0, &ramp(8));
        shared.publish(4, &ramp(2));
        // the re-published range supersedes the old tail
        assert_eq!(shared.len(), 6);

        shared.resync_to(4);
        let mut out = [StereoSample::new(9, 9); 2];
        assert!(shared.fill(&mut out));
        assert_eq!(out[0], StereoSample::new(0, 0));
        assert_eq!(out[1], StereoSample::new(1, -1));
    }

    #[test]
    fn test_resync_moves_cursor() {
        let shared = PlaybackShared::new();
        shared.publish(0, &ramp(8));
        shared.resync_to(6);
        assert_eq!(shared.cursor(), 6);

        let mut out = [StereoSample::SILENCE; 4];
        // only 2 samples remain past the cursor
        assert!(!shared.fill(&mut out));
    }
}
