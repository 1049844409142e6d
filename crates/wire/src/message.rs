//! Request and response messages
//!
//! Optional fields are omitted from the JSON entirely when unset. That
//! carries meaning on the read side of `get`: an absent `value` field means
//! the key does not exist, while `"value":null` means the key holds JSON
//! null. Clients that don't care treat both as null.

use harbor_core::Value;
use serde::{Deserialize, Serialize};

/// One client request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Requested operation: get / set / delete / bulk_set / search /
    /// search_similar / role
    pub method: String,
    /// Key for get / set / delete
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Value for set; absence stores JSON null
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Pairs for bulk_set, as `[[key, value], ...]`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<(String, Value)>,
    /// Query text for search / search_similar
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Result limit for search_similar (default 10)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<usize>,
    /// Let the configured snapshot-skip probability apply to this mutation
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub debug_simulate_fail: bool,
}

impl Request {
    fn bare(method: &str) -> Self {
        Request {
            method: method.to_string(),
            key: None,
            value: None,
            items: Vec::new(),
            query: None,
            top_k: None,
            debug_simulate_fail: false,
        }
    }

    /// `get` request
    pub fn get(key: impl Into<String>) -> Self {
        Request {
            key: Some(key.into()),
            ..Self::bare("get")
        }
    }

    /// `set` request
    pub fn set(key: impl Into<String>, value: Value) -> Self {
        Request {
            key: Some(key.into()),
            value: Some(value),
            ..Self::bare("set")
        }
    }

    /// `delete` request
    pub fn delete(key: impl Into<String>) -> Self {
        Request {
            key: Some(key.into()),
            ..Self::bare("delete")
        }
    }

    /// `bulk_set` request
    pub fn bulk_set(items: Vec<(String, Value)>) -> Self {
        Request {
            items,
            ..Self::bare("bulk_set")
        }
    }

    /// `search` request
    pub fn search(query: impl Into<String>) -> Self {
        Request {
            query: Some(query.into()),
            ..Self::bare("search")
        }
    }

    /// `search_similar` request
    pub fn search_similar(query: impl Into<String>, top_k: usize) -> Self {
        Request {
            query: Some(query.into()),
            top_k: Some(top_k),
            ..Self::bare("search_similar")
        }
    }

    /// `role` request (cluster only)
    pub fn role() -> Self {
        Self::bare("role")
    }

    /// Opt this mutation into the snapshot-skip fault injection
    pub fn with_sim_fail(mut self, sim_fail: bool) -> Self {
        self.debug_simulate_fail = sim_fail;
        self
    }
}

/// One server response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Whether the request succeeded
    pub ok: bool,
    /// Result payload; absent on plain acknowledgements and on `get` of an
    /// absent key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Error token or message when `ok` is false
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// `role` only: whether the answering node is primary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<bool>,
    /// `role` only: the answering node's id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<u32>,
}

impl Response {
    /// Plain success acknowledgement
    pub fn ok() -> Self {
        Response {
            ok: true,
            value: None,
            error: None,
            primary: None,
            node_id: None,
        }
    }

    /// Success carrying a payload
    pub fn with_value(value: Value) -> Self {
        Response {
            value: Some(value),
            ..Self::ok()
        }
    }

    /// Success carrying a payload only when one exists
    ///
    /// `None` omits the `value` field, the `get` encoding of an absent key.
    pub fn with_optional_value(value: Option<Value>) -> Self {
        Response {
            value,
            ..Self::ok()
        }
    }

    /// Failure with an error token or message
    pub fn error(message: impl Into<String>) -> Self {
        Response {
            ok: false,
            error: Some(message.into()),
            ..Self::ok()
        }
    }

    /// `role` answer
    pub fn role(primary: bool, node_id: u32) -> Self {
        Response {
            primary: Some(primary),
            node_id: Some(node_id),
            ..Self::ok()
        }
    }

    /// The `missing key` token: a required field was omitted
    pub fn missing_key() -> Self {
        Self::error("missing key")
    }

    /// The `invalid request` token: the request line did not parse
    pub fn invalid_request() -> Self {
        Self::error("invalid request")
    }

    /// The `not primary` token: mutation sent to a secondary
    pub fn not_primary() -> Self {
        Self::error("not primary")
    }

    /// The `unknown method` token
    pub fn unknown_method(method: &str) -> Self {
        Self::error(format!("unknown method: {method}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_set_shape() {
        let req = Request::set("k", json!({"n": 1}));
        let encoded = serde_json::to_value(&req).unwrap();
        assert_eq!(
            encoded,
            json!({"method": "set", "key": "k", "value": {"n": 1}})
        );
    }

    #[test]
    fn test_request_sim_fail_flag_only_when_set() {
        let plain = serde_json::to_value(Request::delete("k")).unwrap();
        assert!(plain.get("debug_simulate_fail").is_none());

        let flagged = serde_json::to_value(Request::delete("k").with_sim_fail(true)).unwrap();
        assert_eq!(flagged["debug_simulate_fail"], json!(true));
    }

    #[test]
    fn test_request_bulk_items_shape() {
        let req = Request::bulk_set(vec![("a".to_string(), json!(1))]);
        let encoded = serde_json::to_value(&req).unwrap();
        assert_eq!(encoded["items"], json!([["a", 1]]));
    }

    #[test]
    fn test_request_parse_fills_defaults() {
        let req: Request = serde_json::from_str(r#"{"method":"bulk_set"}"#).unwrap();
        assert!(req.items.is_empty());
        assert!(!req.debug_simulate_fail);
        assert!(req.top_k.is_none());
    }

    #[test]
    fn test_request_without_method_does_not_parse() {
        assert!(serde_json::from_str::<Request>(r#"{"key":"k"}"#).is_err());
    }

    #[test]
    fn test_response_ok_omits_all_optional_fields() {
        let encoded = serde_json::to_string(&Response::ok()).unwrap();
        assert_eq!(encoded, r#"{"ok":true}"#);
    }

    #[test]
    fn test_response_absent_vs_null_value() {
        // Absent key: no value field at all.
        let absent = serde_json::to_value(Response::with_optional_value(None)).unwrap();
        assert!(absent.get("value").is_none());

        // Stored null: explicit value:null survives encoding.
        let null = serde_json::to_string(&Response::with_optional_value(Some(json!(null))))
            .unwrap();
        assert!(null.contains(r#""value":null"#));
    }

    #[test]
    fn test_response_error_tokens() {
        assert_eq!(
            Response::unknown_method("frob").error.as_deref(),
            Some("unknown method: frob")
        );
        assert_eq!(Response::not_primary().error.as_deref(), Some("not primary"));
        assert_eq!(Response::missing_key().error.as_deref(), Some("missing key"));
        assert!(!Response::invalid_request().ok);
    }

    #[test]
    fn test_response_role_shape() {
        let encoded = serde_json::to_value(Response::role(true, 0)).unwrap();
        assert_eq!(encoded, json!({"ok": true, "primary": true, "node_id": 0}));
    }
}
