//! # Events Module
//!
//! Progress reporting through channels, so the CLI (or any other front end)
//! can follow an analysis without the core knowing who is listening.
//!
//! ## Event families
//! - `Analysis` - one image through the detector battery
//! - `Batch` - per-image progress of a directory run
//! - `Pipeline` - start, phase changes, completion and cancellation
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         match event {
//!             Event::Batch(BatchEvent::Progress(p)) => println!("{}/{}", p.completed, p.total),
//!             Event::Analysis(AnalysisEvent::DetectorFailed { technique, message }) => {
//!                 eprintln!("{technique}: {message}")
//!             }
//!             _ => {}
//!         }
//!     }
//! });
//!
//! pipeline.run_with_events(&sender)?;
//! ```

mod channel;
mod types;

pub use channel::{EventChannel, EventReceiver, EventSender, null_sender};
pub use types::*;
