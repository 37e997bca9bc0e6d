//! Relay-to-client frames.

use serde_json::Value;

use super::RelayError;

/// A frame received from a relay, reduced to what publishing cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayMessage {
    /// `["OK", <event id>, <accepted>, <reason>]`
    Ok {
        event_id: String,
        accepted: bool,
        reason: String,
    },
    /// `["NOTICE", <message>]`
    Notice(String),
    /// Any other frame type, by label.
    Other(String),
}

impl RelayMessage {
    /// Parse a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Protocol`] if the frame is not a JSON array
    /// starting with a string label, or an `OK` frame is missing fields.
    pub fn parse(text: &str) -> Result<Self, RelayError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| RelayError::Protocol(e.to_string()))?;
        let items = value
            .as_array()
            .ok_or_else(|| RelayError::Protocol("frame is not an array".into()))?;
        let label = items
            .first()
            .and_then(Value::as_str)
            .ok_or_else(|| RelayError::Protocol("frame has no label".into()))?;

        match label {
            "OK" => {
                let event_id = items
                    .get(1)
                    .and_then(Value::as_str)
                    .ok_or_else(|| RelayError::Protocol("OK frame missing event id".into()))?;
                let accepted = items
                    .get(2)
                    .and_then(Value::as_bool)
                    .ok_or_else(|| RelayError::Protocol("OK frame missing status".into()))?;
                let reason = items.get(3).and_then(Value::as_str).unwrap_or_default();
                Ok(Self::Ok {
                    event_id: event_id.to_string(),
                    accepted,
                    reason: reason.to_string(),
                })
            }
            "NOTICE" => Ok(Self::Notice(
                items
                    .get(1)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            )),
            other => Ok(Self::Other(other.to_string())),
        }
    }
}
