//! # tamper-check CLI
//!
//! Command-line interface for the image tamper detector.
//!
//! ## Usage
//! ```bash
//! tamper-check analyze ~/uploads
//! tamper-check analyze receipt.jpg --disable copy_move --output json
//! ```

mod cli;

use image_tamper_detector::Result;

fn main() -> Result<()> {
    cli::run()
}
