//! Object detection over still images and a live webcam feed, shown in a
//! desktop window.

pub mod capture;
pub mod config;
pub mod detection;
pub mod error;
pub mod playback;
pub mod presentation;
pub mod ui;

pub use config::Settings;
pub use error::{ConfigError, SessionError, SourceError};
pub use playback::{
    run_due_tick, start_live, Mode, PlaybackState, Session, StartOutcome, TickOutcome,
    TickScheduler,
};
