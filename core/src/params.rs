//! Turns per-operation arguments into the JSON object the CRM expects.
//!
//! # Design
//! Every remote call is one flat JSON object: the caller's arguments, a
//! `Function` field naming the remote operation, and the two token fields.
//! Operations differ only in whether empty arguments are dropped first, which
//! `Operation::suppresses_empty` records per variant.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::trace;

use crate::credentials::Credentials;
use crate::error::ApiError;

pub const FUNCTION_FIELD: &str = "Function";
pub const USER_CODE_FIELD: &str = "UserCode";
pub const API_TOKEN_FIELD: &str = "APIToken";

/// Raw argument maps captured with a receiver entry carry it under this key.
pub const RECEIVER_FIELD: &str = "self";

/// The remote functions this client can invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateContact,
    GetContact,
    EditContact,
    DeleteContact,
    SearchContacts,
    CreateNote,
    CreateTask,
    CreateEvent,
    AddContactToGroup,
    CreatePipeline,
    UpdatePipelineItem,
    GetPipelineReport,
    GetPipelineItemsAttachedToContact,
    GetPipelineSettings,
    GetUserInfo,
    GetCustomFields,
}

impl Operation {
    pub const ALL: [Operation; 16] = [
        Operation::CreateContact,
        Operation::GetContact,
        Operation::EditContact,
        Operation::DeleteContact,
        Operation::SearchContacts,
        Operation::CreateNote,
        Operation::CreateTask,
        Operation::CreateEvent,
        Operation::AddContactToGroup,
        Operation::CreatePipeline,
        Operation::UpdatePipelineItem,
        Operation::GetPipelineReport,
        Operation::GetPipelineItemsAttachedToContact,
        Operation::GetPipelineSettings,
        Operation::GetUserInfo,
        Operation::GetCustomFields,
    ];

    /// The value sent in the `Function` field.
    pub fn name(self) -> &'static str {
        match self {
            Operation::CreateContact => "CreateContact",
            Operation::GetContact => "GetContact",
            Operation::EditContact => "EditContact",
            Operation::DeleteContact => "DeleteContact",
            Operation::SearchContacts => "SearchContacts",
            Operation::CreateNote => "CreateNote",
            Operation::CreateTask => "CreateTask",
            Operation::CreateEvent => "CreateEvent",
            Operation::AddContactToGroup => "AddContactToGroup",
            Operation::CreatePipeline => "CreatePipeline",
            Operation::UpdatePipelineItem => "UpdatePipelineItem",
            Operation::GetPipelineReport => "GetPipelineReport",
            Operation::GetPipelineItemsAttachedToContact => "GetPipelineItemsAttachedToContact",
            Operation::GetPipelineSettings => "GetPipelineSettings",
            Operation::GetUserInfo => "GetUserInfo",
            Operation::GetCustomFields => "GetCustomFields",
        }
    }

    /// Whether empty arguments are dropped before sending.
    ///
    /// Identifier-only and lookup operations send every argument, nulls
    /// included; multi-field create/update operations drop empties.
    pub fn suppresses_empty(self) -> bool {
        matches!(
            self,
            Operation::CreateContact
                | Operation::EditContact
                | Operation::CreateTask
                | Operation::CreateEvent
                | Operation::CreatePipeline
                | Operation::UpdatePipelineItem
                | Operation::GetPipelineReport
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which values count as empty for suppress-empty operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SuppressionPolicy {
    /// Null, `false`, zero, `""`, `[]` and `{}` are all dropped.
    ///
    /// This means `NumRows: 0` or `Priority: 0` never reach the server.
    #[default]
    Falsy,
    /// Only nulls are dropped.
    NullOnly,
}

impl SuppressionPolicy {
    pub fn is_empty(self, value: &Value) -> bool {
        match self {
            SuppressionPolicy::Falsy => is_falsy(value),
            SuppressionPolicy::NullOnly => value.is_null(),
        }
    }
}

/// Truthiness of a JSON value: null, false, 0, and empty containers are falsy.
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// The JSON object sent as one request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct OperationRequest(Map<String, Value>);

impl OperationRequest {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn to_json(&self) -> Result<String, ApiError> {
        Ok(serde_json::to_string(&self.0)?)
    }
}

/// Builds `OperationRequest`s stamped with one set of credentials.
#[derive(Debug, Clone)]
pub struct ParameterBuilder {
    credentials: Credentials,
    policy: SuppressionPolicy,
}

impl ParameterBuilder {
    pub fn new(credentials: Credentials) -> Self {
        Self::with_policy(credentials, SuppressionPolicy::default())
    }

    pub fn with_policy(credentials: Credentials, policy: SuppressionPolicy) -> Self {
        Self {
            credentials,
            policy,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn policy(&self) -> SuppressionPolicy {
        self.policy
    }

    /// Build the request body for `function` from a raw argument map.
    ///
    /// A `self` entry is dropped if present. With `suppress_empty`, entries
    /// the policy considers empty are dropped. `Function`, `UserCode` and
    /// `APIToken` are always written last and overwrite caller values.
    pub fn build(
        &self,
        function: &str,
        mut args: Map<String, Value>,
        suppress_empty: bool,
    ) -> OperationRequest {
        args.remove(RECEIVER_FIELD);

        if suppress_empty {
            let policy = self.policy;
            args.retain(|_, value| !policy.is_empty(value));
        }

        args.insert(FUNCTION_FIELD.to_string(), Value::from(function));
        args.insert(
            USER_CODE_FIELD.to_string(),
            Value::from(self.credentials.user_token()),
        );
        args.insert(
            API_TOKEN_FIELD.to_string(),
            Value::from(self.credentials.api_token()),
        );

        trace!(function, fields = ?args.keys().collect::<Vec<_>>(), "built CRM parameters");
        OperationRequest(args)
    }

    /// Serialize `args` and build with the operation's own suppression mode.
    pub fn build_operation<A: Serialize + ?Sized>(
        &self,
        operation: Operation,
        args: &A,
    ) -> Result<OperationRequest, ApiError> {
        let raw = to_object(args)?;
        Ok(self.build(operation.name(), raw, operation.suppresses_empty()))
    }
}

/// Serialize a value that must come out as a JSON object.
pub(crate) fn to_object<A: Serialize + ?Sized>(args: &A) -> Result<Map<String, Value>, ApiError> {
    match serde_json::to_value(args)? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(ApiError::Serialization(format!(
            "arguments must serialize to a JSON object, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn builder() -> ParameterBuilder {
        ParameterBuilder::new(Credentials::new("<u>", "<a>"))
    }

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn get_contact_example() {
        let req = builder().build("GetContact", object(json!({"ContactId": "123"})), false);
        assert_eq!(
            req.into_value(),
            json!({
                "ContactId": "123",
                "Function": "GetContact",
                "UserCode": "<u>",
                "APIToken": "<a>"
            })
        );
    }

    #[test]
    fn create_task_example() {
        let args = json!({
            "DueDate": "2028-06-26",
            "Name": "Test",
            "Description": null,
            "ContactId": null,
            "AssignedTo": null
        });
        let req = builder().build("CreateTask", object(args), true);
        assert_eq!(
            req.into_value(),
            json!({
                "DueDate": "2028-06-26",
                "Name": "Test",
                "Function": "CreateTask",
                "UserCode": "<u>",
                "APIToken": "<a>"
            })
        );
    }

    #[test]
    fn receiver_entry_is_removed_when_present_and_ignored_when_absent() {
        let args = json!({"self": {}, "ContactId": "1"});
        let with = builder().build("GetContact", object(args), false);
        assert!(!with.contains("self"));
        assert!(with.contains("ContactId"));

        let without = builder().build("GetContact", object(json!({"ContactId": "1"})), false);
        assert_eq!(with, without);
    }

    #[test]
    fn discriminator_and_tokens_cannot_be_overridden() {
        let args = json!({
            "Function": "DeleteContact",
            "UserCode": "spoofed",
            "APIToken": "spoofed",
            "ContactId": "9"
        });
        let req = builder().build("GetContact", object(args), false);
        assert_eq!(req.get("Function"), Some(&json!("GetContact")));
        assert_eq!(req.get("UserCode"), Some(&json!("<u>")));
        assert_eq!(req.get("APIToken"), Some(&json!("<a>")));
    }

    #[test]
    fn pass_through_keeps_nulls_and_empties() {
        let args = json!({
            "SearchTerms": "Ann",
            "Sort": null,
            "NumRows": 0,
            "Page": "",
            "RecordType": {}
        });
        let req = builder().build("SearchContacts", object(args), false);
        for key in ["SearchTerms", "Sort", "NumRows", "Page", "RecordType"] {
            assert!(req.contains(key), "{key} should pass through");
        }
        assert_eq!(req.len(), 8);
    }

    #[test]
    fn falsy_policy_drops_every_falsy_kind() {
        let args = json!({
            "Null": null, "False": false, "Zero": 0, "ZeroFloat": 0.0,
            "Empty": "", "EmptyList": [], "EmptyMap": {},
            "Name": "x", "One": 1, "True": true, "List": [0], "Map": {"0": {}}
        });
        let req = builder().build("CreateEvent", object(args), true);
        for key in ["Null", "False", "Zero", "ZeroFloat", "Empty", "EmptyList", "EmptyMap"] {
            assert!(!req.contains(key), "{key} should be dropped");
        }
        assert_eq!(req.get("Name"), Some(&json!("x")));
        assert_eq!(req.get("One"), Some(&json!(1)));
        assert_eq!(req.get("True"), Some(&json!(true)));
        assert_eq!(req.get("List"), Some(&json!([0])));
        assert_eq!(req.get("Map"), Some(&json!({"0": {}})));
    }

    #[test]
    fn falsy_policy_drops_zero_num_rows() {
        // Zero is falsy: a caller asking for NumRows=0 sends nothing.
        let args = json!({"PipelineId": "p", "NumRows": 0});
        let req = builder().build("GetPipelineReport", object(args), true);
        assert!(!req.contains("NumRows"));
    }

    #[test]
    fn null_only_policy_keeps_zero_and_empty_string() {
        let b =
            ParameterBuilder::with_policy(Credentials::new("u", "a"), SuppressionPolicy::NullOnly);
        let req = b.build(
            "GetPipelineReport",
            object(json!({"PipelineId": "p", "NumRows": 0, "SortBy": "", "Page": null})),
            true,
        );
        assert_eq!(req.get("NumRows"), Some(&json!(0)));
        assert_eq!(req.get("SortBy"), Some(&json!("")));
        assert!(!req.contains("Page"));
    }

    #[test]
    fn suppression_table() {
        let suppressing: Vec<_> = Operation::ALL
            .iter()
            .filter(|op| op.suppresses_empty())
            .map(|op| op.name())
            .collect();
        assert_eq!(
            suppressing,
            vec![
                "CreateContact",
                "EditContact",
                "CreateTask",
                "CreateEvent",
                "CreatePipeline",
                "UpdatePipelineItem",
                "GetPipelineReport"
            ]
        );
        assert_eq!(Operation::ALL.len() - suppressing.len(), 9);
    }

    #[test]
    fn build_operation_rejects_non_object_arguments() {
        let err = builder().build_operation(Operation::GetUserInfo, &42).unwrap_err();
        assert!(matches!(err, ApiError::Serialization(_)));
    }

    #[test]
    fn unit_arguments_build_bare_request() {
        let req = builder().build_operation(Operation::GetUserInfo, &()).unwrap();
        let mut keys: Vec<_> = req.keys().collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["APIToken", "Function", "UserCode"]);
    }
}
