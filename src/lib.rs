//! Converts structured records into message-bus payloads.
//!
//! A [`Converter`] turns each [`Record`] into an [`OutboundMessage`] whose payload is the record
//! serialized as JSON, minus the reserved `event_timestamp` field, and encoded as Latin-1. When
//! the timestamp attribute is enabled, `event_timestamp` is also read out as the message publish
//! time.
//!
//! Publishing, retries and acknowledgements are left to the caller; this crate only builds the
//! messages.

/// record model: fields, values and their JSON form
pub mod record;

/// converter configuration
pub mod config;

/// the record to message converter
pub mod converter;

/// Latin-1 payload encoding
pub mod latin1;

/// async adapters over streams and channels of records
pub mod stream;

/// error module
pub mod error;

pub use config::Config;
pub use converter::{Converter, OutboundMessage, TIMESTAMP_FIELD};
pub use error::{Error, Result};
pub use record::{FieldType, Record, Value};
