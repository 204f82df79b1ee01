use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Opaque backend identifier. Backends hand these out as either JSON numbers
/// or strings; both are kept as their textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<u64> for RecordId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Integer(i64),
    Float(f64),
    String(String),
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match NumberOrString::deserialize(deserializer)? {
            NumberOrString::Integer(val) => Self(val.to_string()),
            NumberOrString::Float(val) => Self(val.to_string()),
            NumberOrString::String(val) => Self(val),
        })
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessType {
    Incident,
    Request,
    Change,
    Approval,
}

impl ProcessType {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "INCIDENT" => Some(Self::Incident),
            "REQUEST" => Some(Self::Request),
            "CHANGE" => Some(Self::Change),
            "APPROVAL" => Some(Self::Approval),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Incident => "INCIDENT",
            Self::Request => "REQUEST",
            Self::Change => "CHANGE",
            Self::Approval => "APPROVAL",
        }
    }
}

/// Role of a state inside its definition. Values the backend sends that this
/// client does not know map to `Unknown` instead of failing the whole payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StateType {
    Start,
    #[default]
    Normal,
    End,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessDefinition {
    pub id: RecordId,
    pub key: String,
    pub name: String,
    pub process_type: ProcessType,
    pub version: u32,
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateNode {
    pub state_key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub state_type: StateType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_color: Option<String>,
}

impl StateNode {
    pub fn new(state_key: &str, name: &str, state_type: StateType) -> Self {
        Self {
            state_key: state_key.to_string(),
            name: name.to_string(),
            state_type,
            external_status: None,
            ui_color: None,
        }
    }

    /// Text shown on the node body; falls back to the key for unnamed states.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.state_key
        } else {
            &self.name
        }
    }
}

pub const DEFAULT_PRIORITY: u32 = 100;

fn default_priority() -> u32 {
    DEFAULT_PRIORITY
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub from_state_key: String,
    pub to_state_key: String,
    #[serde(default)]
    pub event_key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_priority")]
    pub priority: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_expression: Option<String>,
}

impl Transition {
    pub fn display_label(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.event_key
        } else {
            &self.name
        }
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Payload of `getDefinition`. Missing or `null` lists decode as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionDetail {
    #[serde(default)]
    pub definition: Option<ProcessDefinition>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub states: Vec<StateNode>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub transitions: Vec<Transition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDefinition {
    pub key: String,
    pub name: String,
    pub process_type: ProcessType,
    pub version: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewState {
    pub state_key: String,
    pub name: String,
    pub state_type: StateType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransition {
    pub from_state_key: String,
    pub to_state_key: String,
    pub event_key: String,
    pub name: String,
    pub priority: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_expression: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_id_accepts_numbers_and_strings() {
        let numeric: RecordId = serde_json::from_str("42").unwrap();
        let text: RecordId = serde_json::from_str("\"wf-7\"").unwrap();
        assert_eq!(numeric.as_str(), "42");
        assert_eq!(text.as_str(), "wf-7");
        assert_eq!(serde_json::to_string(&numeric).unwrap(), "\"42\"");
    }

    #[test]
    fn unknown_state_type_does_not_fail_payload() {
        let state: StateNode =
            serde_json::from_str(r#"{"stateKey":"X","name":"X","stateType":"PARKED"}"#).unwrap();
        assert_eq!(state.state_type, StateType::Unknown);
    }

    #[test]
    fn transition_priority_defaults_to_100() {
        let transition: Transition = serde_json::from_str(
            r#"{"fromStateKey":"NEW","toStateKey":"ASSIGNED","eventKey":"assign","name":"Assign"}"#,
        )
        .unwrap();
        assert_eq!(transition.priority, 100);
        assert!(transition.id.is_none());
        assert!(transition.condition_expression.is_none());
    }

    #[test]
    fn detail_tolerates_null_and_missing_lists() {
        let detail: DefinitionDetail =
            serde_json::from_str(r#"{"states":null}"#).unwrap();
        assert!(detail.states.is_empty());
        assert!(detail.transitions.is_empty());
        assert!(detail.definition.is_none());
    }

    #[test]
    fn process_type_tokens_are_case_insensitive() {
        assert_eq!(ProcessType::from_token("change"), Some(ProcessType::Change));
        assert_eq!(ProcessType::from_token("bogus"), None);
        assert_eq!(ProcessType::Approval.as_str(), "APPROVAL");
    }
}
