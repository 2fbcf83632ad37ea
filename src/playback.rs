//! Source-mode and live-capture state for the detector window.
//!
//! All work runs on the caller's thread. The live loop is not a thread: each
//! call to [`Session::tick`] performs one read/detect/display cycle and returns
//! when the next one should run; the UI posts it back through a
//! [`TickScheduler`]. Ticks therefore never overlap, and stopping is observed
//! by the next tick, which releases the capture device.

use crate::capture::{CaptureStream, FrameSource};
use crate::config::Settings;
use crate::detection::Detector;
use crate::error::{SessionError, SourceError};
use crate::presentation::{ControlSet, Presenter, PreviewTarget};
use image::RgbImage;
use std::path::PathBuf;
use std::time::{Duration, Instant};

pub const STATUS_READY: &str = "Detection Results will appear here.";
pub const STATUS_IMAGE_LOADED: &str = "Image loaded successfully.";
pub const STATUS_NO_IMAGE: &str = "Please load an image first.";
pub const STATUS_CAMERA_STARTED: &str = "Camera started.";
pub const STATUS_CAMERA_STOPPED: &str = "Camera stopped.";

const STATS_EVERY: u64 = 30;

/// Input source selected by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Image,
    Webcam,
}

impl Mode {
    pub fn controls(self) -> ControlSet {
        match self {
            Mode::Image => ControlSet::Image,
            Mode::Webcam => ControlSet::Webcam,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    /// Image mode, waiting on the file chooser
    Loading,
    /// Image mode, running single-shot inference
    Detecting,
    LiveRunning,
    LiveStopped,
}

/// What the scheduler should do after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Run the next tick after this delay
    Continue(Duration),
    /// The loop observed a stop request and released the device
    Released,
    /// No capture session is open
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// Device opened; the first tick must be scheduled
    Started,
    /// A stop was pending and the still-scheduled loop was kept alive
    Resumed,
    /// The loop was already running
    AlreadyRunning,
}

/// Playback state machine over a frame source, a detector and a display sink
pub struct Session<S: FrameSource, D: Detector, P: Presenter> {
    source: S,
    detector: D,
    presenter: P,

    device_index: u32,
    confidence: f32,
    tick_interval: Duration,

    mode: Mode,
    state: PlaybackState,
    still: Option<RgbImage>,

    // Present exactly while a live loop is scheduled
    capture: Option<S::Capture>,
    playing: bool,
    stats: LiveStats,
}

impl<S: FrameSource, D: Detector, P: Presenter> Session<S, D, P> {
    /// Start in Image mode with the Image controls visible
    pub fn new(source: S, detector: D, mut presenter: P, settings: &Settings) -> Self {
        presenter.set_visible_controls(ControlSet::Image);
        presenter.set_status_text(STATUS_READY);

        Self {
            source,
            detector,
            presenter,
            device_index: settings.device_index,
            confidence: settings.confidence,
            tick_interval: settings.tick_interval,
            mode: Mode::Image,
            state: PlaybackState::Idle,
            still: None,
            capture: None,
            playing: false,
            stats: LiveStats::default(),
        }
    }

    pub fn select(&mut self, mode: Mode) {
        tracing::debug!("Source selected: {:?}", mode);

        if mode == Mode::Image && self.playing {
            tracing::info!("Leaving webcam mode, live loop will stop on its next tick");
            self.playing = false;
        }

        self.mode = mode;
        self.state = match mode {
            Mode::Image => PlaybackState::Idle,
            Mode::Webcam if self.playing => PlaybackState::LiveRunning,
            Mode::Webcam => PlaybackState::LiveStopped,
        };
        self.presenter.clear_detections();
        self.presenter.set_visible_controls(mode.controls());
    }

    /// Ask `choose` for a file and make it the current still image.
    ///
    /// Returns `Ok(false)` when the chooser was cancelled. A file that fails to
    /// load leaves the previous image in place.
    pub fn load<F>(&mut self, choose: F) -> Result<bool, SessionError>
    where
        F: FnOnce() -> Option<PathBuf>,
    {
        self.require_mode(Mode::Image)?;

        self.state = PlaybackState::Loading;
        let picked = choose();
        self.state = PlaybackState::Idle;

        let Some(path) = picked else {
            tracing::debug!("File selection cancelled");
            return Ok(false);
        };

        let image = match self.source.load_still(&path) {
            Ok(image) => image,
            Err(e) => return self.fail(e.into()),
        };

        tracing::info!(
            "Loaded {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );

        let target = PreviewTarget::Input;
        self.presenter.show_preview(target, &image, target.size());
        self.presenter.set_status_text(STATUS_IMAGE_LOADED);
        self.still = Some(image);
        Ok(true)
    }

    /// Run the detector once over the loaded still image.
    ///
    /// Returns the number of objects found.
    pub fn detect(&mut self) -> Result<usize, SessionError> {
        self.require_mode(Mode::Image)?;

        let Some(still) = self.still.as_ref() else {
            return self.fail(SessionError::NoImageLoaded);
        };

        self.state = PlaybackState::Detecting;
        let result = self.detector.detect(still, self.confidence);
        self.state = PlaybackState::Idle;

        let annotated = match result {
            Ok(annotated) => annotated,
            Err(e) => return self.fail(SessionError::Detection(e)),
        };

        let found = annotated.detections.len();
        tracing::info!("Detection complete, {} object(s)", found);

        let target = PreviewTarget::Output;
        self.presenter
            .show_preview(target, &annotated.image, target.size());
        self.presenter
            .show_detections(target, annotated.image.dimensions(), &annotated.detections);
        self.presenter
            .set_status_text(&format!("Detection complete! {} object(s) found.", found));
        Ok(found)
    }

    /// Open the capture device and raise the playback flag.
    ///
    /// Only [`StartOutcome::Started`] asks for a first tick; in every other case
    /// a loop is already scheduled.
    pub fn start(&mut self) -> Result<StartOutcome, SessionError> {
        self.require_mode(Mode::Webcam)?;

        if self.playing {
            tracing::debug!("Live loop already running");
            return Ok(StartOutcome::AlreadyRunning);
        }

        let outcome = if self.capture.is_some() {
            tracing::info!("Stop was still pending, resuming live loop");
            StartOutcome::Resumed
        } else {
            match self.source.open_capture(self.device_index) {
                Ok(capture) => self.capture = Some(capture),
                Err(e) => {
                    self.state = PlaybackState::LiveStopped;
                    return self.fail(e.into());
                }
            }
            self.stats = LiveStats::default();
            tracing::info!("Live loop started on device {}", self.device_index);
            StartOutcome::Started
        };

        self.playing = true;
        self.state = PlaybackState::LiveRunning;
        self.presenter.set_status_text(STATUS_CAMERA_STARTED);
        Ok(outcome)
    }

    /// Lower the playback flag. The device is released by the next tick.
    pub fn stop(&mut self) {
        if self.playing {
            tracing::info!("Stop requested, releasing on next tick");
        }
        self.playing = false;
    }

    /// One iteration of the live loop: read, detect, display.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.playing {
            let Some(capture) = self.capture.take() else {
                return TickOutcome::Inactive;
            };
            capture.release();
            self.stats.log_summary();
            if self.mode == Mode::Webcam {
                self.state = PlaybackState::LiveStopped;
                self.presenter.set_status_text(STATUS_CAMERA_STOPPED);
            }
            return TickOutcome::Released;
        }

        let Some(capture) = self.capture.as_mut() else {
            return TickOutcome::Inactive;
        };

        let read_start = Instant::now();
        let frame = match capture.read_frame() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!("Skipping tick, frame read failed: {}", e);
                self.stats.skipped += 1;
                return TickOutcome::Continue(self.tick_interval);
            }
        };
        let read_time = read_start.elapsed();

        let detect_start = Instant::now();
        let annotated = match self.detector.detect(&frame, self.confidence) {
            Ok(annotated) => annotated,
            Err(e) => {
                tracing::warn!("Skipping tick, detection failed: {:#}", e);
                self.stats.skipped += 1;
                return TickOutcome::Continue(self.tick_interval);
            }
        };
        let detect_time = detect_start.elapsed();

        let display_start = Instant::now();
        let target = PreviewTarget::Live;
        self.presenter
            .show_preview(target, &annotated.image, target.size());
        self.presenter
            .show_detections(target, annotated.image.dimensions(), &annotated.detections);
        let display_time = display_start.elapsed();

        self.stats.record(read_time, detect_time, display_time);

        TickOutcome::Continue(self.tick_interval)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// The playback flag
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Whether a live loop still holds the capture device
    pub fn has_capture(&self) -> bool {
        self.capture.is_some()
    }

    pub fn still_image(&self) -> Option<&RgbImage> {
        self.still.as_ref()
    }

    pub fn stats(&self) -> &LiveStats {
        &self.stats
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    fn require_mode(&mut self, expected: Mode) -> Result<(), SessionError> {
        if self.mode == expected {
            Ok(())
        } else {
            self.fail(SessionError::WrongMode {
                expected,
                current: self.mode,
            })
        }
    }

    fn fail<T>(&mut self, err: SessionError) -> Result<T, SessionError> {
        tracing::warn!("{}", err);
        self.presenter.set_status_text(&status_message(&err));
        Err(err)
    }
}

/// Status line text for a failed operation
pub fn status_message(err: &SessionError) -> String {
    match err {
        SessionError::NoImageLoaded => STATUS_NO_IMAGE.to_string(),
        SessionError::WrongMode { expected, .. } => {
            format!("Select {:?} as the source first.", expected)
        }
        SessionError::Source(SourceError::Decode { path, .. }) => {
            format!("Could not read image {}.", path.display())
        }
        SessionError::Source(SourceError::UnsupportedFormat { path }) => {
            format!("{} is not a supported image file.", path.display())
        }
        SessionError::Source(SourceError::DeviceUnavailable { index, .. }) => {
            format!("Camera {} is unavailable.", index)
        }
        SessionError::Source(SourceError::EndOfStream(_)) => "No frame from camera.".to_string(),
        SessionError::Detection(e) => format!("Detection failed: {:#}", e),
    }
}

/// Timing counters for the live loop
#[derive(Debug, Default, Clone)]
pub struct LiveStats {
    frames: u64,
    skipped: u64,
    total_read_time: Duration,
    total_detect_time: Duration,
    total_display_time: Duration,
}

impl LiveStats {
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    fn record(&mut self, read: Duration, detect: Duration, display: Duration) {
        self.frames += 1;
        self.total_read_time += read;
        self.total_detect_time += detect;
        self.total_display_time += display;

        if self.frames % STATS_EVERY == 0 {
            self.log_summary();
        }
    }

    fn log_summary(&self) {
        if self.frames == 0 {
            tracing::info!("Live loop displayed no frames, skipped={}", self.skipped);
            return;
        }

        let per_frame = |total: Duration| total.as_secs_f64() * 1000.0 / self.frames as f64;
        let avg_read_ms = per_frame(self.total_read_time);
        let avg_detect_ms = per_frame(self.total_detect_time);
        let avg_display_ms = per_frame(self.total_display_time);
        let total_ms = avg_read_ms + avg_detect_ms + avg_display_ms;
        let fps = if total_ms > 0.0 { 1000.0 / total_ms } else { 0.0 };

        tracing::info!(
            "Frame {}: read={:.1}ms, detect={:.1}ms, display={:.1}ms, total={:.1}ms, fps={:.1}, skipped={}",
            self.frames,
            avg_read_ms,
            avg_detect_ms,
            avg_display_ms,
            total_ms,
            fps,
            self.skipped
        );
    }
}

/// Single pending-tick slot for the UI event loop
///
/// Holding at most one deadline means at most one live loop can be scheduled.
#[derive(Debug, Default)]
pub struct TickScheduler {
    due: Option<Instant>,
}

impl TickScheduler {
    pub fn schedule(&mut self, at: Instant) {
        self.due = Some(at);
    }

    pub fn cancel(&mut self) {
        self.due = None;
    }

    pub fn is_scheduled(&self) -> bool {
        self.due.is_some()
    }

    /// Clear and report the pending tick if its deadline has passed
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.due {
            Some(at) if at <= now => {
                self.due = None;
                true
            }
            _ => false,
        }
    }

    /// Time left before the pending tick
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.due.map(|at| at.saturating_duration_since(now))
    }

    /// Reschedule or clear according to what the last tick returned
    pub fn apply(&mut self, outcome: TickOutcome, now: Instant) {
        match outcome {
            TickOutcome::Continue(delay) => self.schedule(now + delay),
            TickOutcome::Released | TickOutcome::Inactive => self.cancel(),
        }
    }
}

/// Start the live loop, booking its first tick only when a new loop began
pub fn start_live<S, D, P>(
    session: &mut Session<S, D, P>,
    scheduler: &mut TickScheduler,
    now: Instant,
) -> Result<StartOutcome, SessionError>
where
    S: FrameSource,
    D: Detector,
    P: Presenter,
{
    let outcome = session.start()?;
    if outcome == StartOutcome::Started {
        scheduler.schedule(now);
    }
    Ok(outcome)
}

/// Run the pending tick if it is due and book the next one from `Instant::now()`
pub fn run_due_tick<S, D, P>(
    session: &mut Session<S, D, P>,
    scheduler: &mut TickScheduler,
    now: Instant,
) -> Option<TickOutcome>
where
    S: FrameSource,
    D: Detector,
    P: Presenter,
{
    if !scheduler.take_due(now) {
        return None;
    }
    let outcome = session.tick();
    // Next tick is timed from the end of this one
    scheduler.apply(outcome, Instant::now());
    Some(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduler_fires_once_when_due() {
        let mut scheduler = TickScheduler::default();
        let now = Instant::now();
        scheduler.schedule(now + Duration::from_millis(10));

        assert!(!scheduler.take_due(now));
        assert_eq!(scheduler.remaining(now), Some(Duration::from_millis(10)));

        let later = now + Duration::from_millis(10);
        assert!(scheduler.take_due(later));
        assert!(!scheduler.take_due(later));
        assert!(!scheduler.is_scheduled());
    }

    #[test]
    fn scheduler_follows_tick_outcome() {
        let mut scheduler = TickScheduler::default();
        let now = Instant::now();

        scheduler.apply(TickOutcome::Continue(Duration::from_millis(10)), now);
        assert_eq!(scheduler.remaining(now), Some(Duration::from_millis(10)));

        scheduler.apply(TickOutcome::Released, now);
        assert!(!scheduler.is_scheduled());
    }

    #[test]
    fn rescheduling_replaces_the_pending_tick() {
        let mut scheduler = TickScheduler::default();
        let now = Instant::now();
        scheduler.schedule(now);
        scheduler.schedule(now + Duration::from_secs(1));

        assert!(!scheduler.take_due(now));
    }

    #[test]
    fn stats_accumulate_per_frame() {
        let mut stats = LiveStats::default();
        stats.record(
            Duration::from_millis(2),
            Duration::from_millis(20),
            Duration::from_millis(1),
        );
        stats.skipped += 1;

        assert_eq!(stats.frames(), 1);
        assert_eq!(stats.skipped(), 1);
        assert_eq!(stats.total_detect_time, Duration::from_millis(20));
    }
}
