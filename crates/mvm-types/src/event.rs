use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Key/value attribute of an [`Event`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct EventAttribute {
    pub key: String,
    pub value: String,
}

impl EventAttribute {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Structured event derived from an execution result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: String,
    pub attributes: Vec<EventAttribute>,
}

impl Event {
    pub fn new(event_type: impl Into<String>, attributes: Vec<EventAttribute>) -> Self {
        Self {
            event_type: event_type.into(),
            attributes,
        }
    }

    /// First attribute value stored under `key`.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.as_str())
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.event_type)?;
        for attr in &self.attributes {
            write!(f, " {}={}", attr.key, attr.value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_lookup_keeps_order() {
        let event = Event::new(
            "contract_status",
            vec![
                EventAttribute::new("status", "discard"),
                EventAttribute::new("major_status", "4016"),
            ],
        );
        assert_eq!(event.attribute("status"), Some("discard"));
        assert_eq!(event.attribute("missing"), None);
        assert_eq!(event.to_string(), "contract_status status=discard major_status=4016");
    }
}
