//! S3 object-created notifications.
//!
//! Only the fields the pipeline reads are modelled; everything else in the
//! notification is ignored during deserialization.

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};

/// Errors raised while reading the triggering object out of an event.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("event contains no records")]
    NoRecords,

    #[error("record has an empty bucket name")]
    EmptyBucket,

    #[error("record has an empty object key")]
    EmptyKey,

    #[error("object key '{key}' is not valid UTF-8 once decoded")]
    KeyEncoding { key: String },

    #[error("malformed event: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// A storage-bucket notification as delivered by S3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<EventRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_source: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,

    pub s3: S3Entity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Entity {
    pub bucket: S3Bucket,
    pub object: S3Object,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Bucket {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Object {
    /// Key as it appears in the notification (URL-encoded, spaces as `+`)
    pub key: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// Decoded location of the object that triggered an invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectRef {
    pub bucket: String,
    pub key: String,
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

impl InboundEvent {
    /// Parse an event from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, EventError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build a single-record event. Used by the CLI and tests.
    pub fn for_object(bucket: impl Into<String>, raw_key: impl Into<String>) -> Self {
        Self {
            records: vec![EventRecord {
                event_source: Some("aws:s3".to_string()),
                event_name: Some("ObjectCreated:Put".to_string()),
                s3: S3Entity {
                    bucket: S3Bucket { name: bucket.into() },
                    object: S3Object {
                        key: raw_key.into(),
                        size: None,
                    },
                },
            }],
        }
    }

    /// Resolve the triggering object from the first record.
    ///
    /// S3 delivers one record per notification; any extra records are
    /// logged and ignored.
    pub fn object_ref(&self) -> Result<ObjectRef, EventError> {
        let record = self.records.first().ok_or(EventError::NoRecords)?;

        if self.records.len() > 1 {
            tracing::warn!(
                "Event carries {} records, only the first is processed",
                self.records.len()
            );
        }

        let bucket = record.s3.bucket.name.trim();
        if bucket.is_empty() {
            return Err(EventError::EmptyBucket);
        }

        let key = decode_object_key(&record.s3.object.key)?;
        if key.is_empty() {
            return Err(EventError::EmptyKey);
        }

        Ok(ObjectRef {
            bucket: bucket.to_string(),
            key,
        })
    }
}

/// Decode an object key as S3 encodes it in notifications.
///
/// `+` stands for a space and everything else is percent-encoded. A literal
/// `+` in the original key arrives as `%2B`, so the substitution has to
/// happen before percent-decoding.
pub fn decode_object_key(raw: &str) -> Result<String, EventError> {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(|key| key.into_owned())
        .map_err(|_| EventError::KeyEncoding {
            key: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "Records": [
            {
                "eventVersion": "2.1",
                "eventSource": "aws:s3",
                "awsRegion": "us-east-1",
                "eventName": "ObjectCreated:Put",
                "s3": {
                    "s3SchemaVersion": "1.0",
                    "bucket": { "name": "edi-inbound", "arn": "arn:aws:s3:::edi-inbound" },
                    "object": { "key": "inbound/850+test%2B1.edi", "size": 1024, "eTag": "abc" }
                }
            }
        ]
    }"#;

    #[test]
    fn test_parse_sample_event() {
        let event = InboundEvent::from_json(SAMPLE).unwrap();
        assert_eq!(event.records.len(), 1);

        let record = &event.records[0];
        assert_eq!(record.event_name.as_deref(), Some("ObjectCreated:Put"));
        assert_eq!(record.s3.object.size, Some(1024));

        let object = event.object_ref().unwrap();
        assert_eq!(object.bucket, "edi-inbound");
        assert_eq!(object.key, "inbound/850 test+1.edi");
        assert_eq!(object.to_string(), "s3://edi-inbound/inbound/850 test+1.edi");
    }

    #[test]
    fn test_decode_object_key() {
        assert_eq!(decode_object_key("plain.edi").unwrap(), "plain.edi");
        assert_eq!(decode_object_key("a+b+c").unwrap(), "a b c");
        assert_eq!(decode_object_key("caf%C3%A9.edi").unwrap(), "café.edi");
        assert_eq!(decode_object_key("dir%2Ffile").unwrap(), "dir/file");
    }

    #[test]
    fn test_decode_object_key_invalid_utf8() {
        let err = decode_object_key("bad%FF.edi").unwrap_err();
        assert!(matches!(err, EventError::KeyEncoding { .. }));
    }

    #[test]
    fn test_empty_event() {
        let event = InboundEvent::from_json(r#"{"Records": []}"#).unwrap();
        assert!(matches!(event.object_ref(), Err(EventError::NoRecords)));

        let event = InboundEvent::from_json("{}").unwrap();
        assert!(matches!(event.object_ref(), Err(EventError::NoRecords)));
    }

    #[test]
    fn test_empty_bucket_and_key() {
        let event = InboundEvent::for_object(" ", "file.edi");
        assert!(matches!(event.object_ref(), Err(EventError::EmptyBucket)));

        let event = InboundEvent::for_object("bucket", "");
        assert!(matches!(event.object_ref(), Err(EventError::EmptyKey)));
    }

    #[test]
    fn test_malformed_event() {
        let err = InboundEvent::from_json(r#"{"Records": [{"s3": {}}]}"#).unwrap_err();
        assert!(matches!(err, EventError::Malformed(_)));
    }

    #[test]
    fn test_first_record_wins() {
        let mut event = InboundEvent::for_object("first", "one.edi");
        event
            .records
            .extend(InboundEvent::for_object("second", "two.edi").records);

        let object = event.object_ref().unwrap();
        assert_eq!(object.bucket, "first");
        assert_eq!(object.key, "one.edi");
    }
}
