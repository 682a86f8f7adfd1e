use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::latin1;
use crate::record::{FieldType, Record};

/// Reserved record field holding the event time. It is never written into a payload.
pub const TIMESTAMP_FIELD: &str = "event_timestamp";

/// OutboundMessage is the result of [`Converter::convert`], ready to be handed to a publisher.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    /// JSON text of the record without [`TIMESTAMP_FIELD`], encoded as Latin-1.
    pub payload: Vec<u8>,
    /// Message attributes. Always empty for now.
    pub attributes: HashMap<String, String>,
    /// Publish time read from [`TIMESTAMP_FIELD`]. Only set when the converter was configured
    /// with `timestamp_attribute_enabled`; assigning it to the message is up to the publisher.
    pub publish_time: Option<DateTime<Utc>>,
}

/// Converts records into outbound messages with a JSON payload.
///
/// Only flat schemas are supported: every record field except [`TIMESTAMP_FIELD`] ends up in the
/// payload. The converter holds no mutable state and can be shared freely between threads.
#[derive(Debug, Clone, Copy)]
pub struct Converter {
    config: Config,
}

impl Converter {
    /// Creates a converter, failing with [`Error::ConfigurationError`] when the configuration
    /// does not use a flat schema.
    pub fn new(config: Config) -> Result<Self> {
        if !config.use_flat_schema {
            return Err(Error::ConfigurationError(
                "flattened schema required".to_string(),
            ));
        }
        debug!(
            timestamp_attribute_enabled = config.timestamp_attribute_enabled,
            "record converter created"
        );
        Ok(Self { config })
    }

    /// Returns the configuration the converter was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Converts one record.
    ///
    /// With `timestamp_attribute_enabled` the record must carry a timestamp typed
    /// [`TIMESTAMP_FIELD`], which becomes the message publish time. The field is dropped from the
    /// payload either way; a record without it is fine when the timestamp attribute is disabled.
    ///
    /// # Example
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use row_to_pubsub::{Config, Converter, Record};
    ///
    /// let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    /// let converter = Converter::new(Config::new().with_timestamp_attribute(true)).unwrap();
    /// let record = Record::new()
    ///     .with_field("id", 42)
    ///     .with_field("name", "alpha")
    ///     .with_field("event_timestamp", at);
    ///
    /// let message = converter.convert(record).unwrap();
    /// assert_eq!(message.payload, br#"{"id":42,"name":"alpha"}"#);
    /// assert_eq!(message.publish_time, Some(at));
    /// ```
    #[tracing::instrument(level = "trace", skip_all, fields(field_count = record.len()))]
    pub fn convert(&self, mut record: Record) -> Result<OutboundMessage> {
        let publish_time = if self.config.timestamp_attribute_enabled {
            Some(event_timestamp(&record)?)
        } else {
            None
        };

        record.remove(TIMESTAMP_FIELD);

        let json = serde_json::to_string(&record)?;

        Ok(OutboundMessage {
            payload: latin1::encode(&json),
            attributes: HashMap::new(),
            publish_time,
        })
    }

    /// Lazily converts records in order. Each record is converted independently, so a failed
    /// record does not affect the ones after it.
    pub fn convert_all<I>(&self, records: I) -> impl Iterator<Item = Result<OutboundMessage>>
    where
        I: IntoIterator<Item = Record>,
    {
        let converter = *self;
        records
            .into_iter()
            .map(move |record| converter.convert(record))
    }
}

/// Reads [`TIMESTAMP_FIELD`] from the record as an instant.
pub fn event_timestamp(record: &Record) -> Result<DateTime<Utc>> {
    let value = record
        .get(TIMESTAMP_FIELD)
        .ok_or_else(|| Error::MissingFieldError {
            field: TIMESTAMP_FIELD.to_string(),
            record_fields: record.field_names(),
        })?;

    value.as_timestamp().ok_or_else(|| Error::TypeMismatchError {
        field: TIMESTAMP_FIELD.to_string(),
        expected: FieldType::Timestamp.to_string(),
        found: value.field_type().to_string(),
        record_fields: record.field_names(),
    })
}
