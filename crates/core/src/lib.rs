//! servegate-core - input limits and log setup for model serving
//!
//! Two independent pieces used by inference front-ends before a request is
//! handed to a model:
//!
//! - [`checker::LimitChecker`] validates that text, audio, image sets, PDFs,
//!   videos and DICOM series fall within configured size, duration or count
//!   limits. Media decoding is delegated to pluggable [`backend`]s.
//! - [`logging::init_logging`] builds a file-backed logging handle with a
//!   fixed line format.
//!
//! # Example
//!
//! ```no_run
//! use servegate_core::{Config, FormatHint, Input, LimitChecker, Modality};
//!
//! let config = Config::load(Some("servegate.toml"))?;
//! let log = servegate_core::logging::init_logging(&config.logging)?;
//! log.install_global()?;
//!
//! let checker = LimitChecker::new();
//! let outcome = checker.check(
//!     Modality::Pdf,
//!     &Input::Path("report.pdf".into()),
//!     &config.limits,
//!     FormatHint::Auto,
//! );
//! if outcome.within_limit() != Some(true) {
//!     eprintln!("rejected: {}", outcome);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod checker;
pub mod config;
pub mod error;
pub mod input;
pub mod logging;
pub mod outcome;

pub use checker::{Capabilities, LimitChecker};
pub use config::{Config, ConfigSource, LimitsConfig, LoggingConfig};
pub use error::{Error, Result};
pub use input::{FormatHint, Input, MediaSource};
pub use logging::{init_logging, LogHandle};
pub use outcome::{CheckOutcome, Measurement, Modality};
