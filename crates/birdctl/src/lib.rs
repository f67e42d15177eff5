//! # birdctl - BIRD control channel client and output parser
//!
//! This crate talks to the BIRD routing daemon over its interactive
//! control channel (`birdc`) and turns the free-form text it returns
//! into structured fields:
//!
//! - [`client`]: command execution against the control channel
//! - [`parse`]: pure text-to-field parsers for the BIRD output dialect
//! - [`error`]: transport error types
//!
//! # Design
//!
//! BIRD's output is not a versioned machine contract, so every parser
//! degrades per field: a line that does not match yields that field's
//! default value instead of failing the whole record. Transport problems
//! (unreachable socket, timeout, non-zero exit) are the only hard errors
//! and surface as [`ControlError`].
//!
//! # Example
//!
//! ```ignore
//! use birdctl::{BirdcClient, ControlChannel, parse};
//!
//! let client = BirdcClient::new("birdc", None, std::time::Duration::from_secs(5));
//! let status = client.send("show status").await?;
//! let router_id = parse::parse_router_id(&status);
//! ```

pub mod client;
pub mod error;
pub mod parse;

pub use client::{BirdcClient, ControlChannel};
pub use error::{ControlError, ControlResult};
pub use parse::{parse_local_as, parse_peer_detail, parse_protocol_summary, parse_router_id, PeerDetail, SummaryEntry};
