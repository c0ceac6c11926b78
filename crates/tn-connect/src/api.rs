//! JSON-RPC 2.0 methods exposed to the provisioning client.

use crate::manager::ConnectManager;
use crate::request::ConfigureRequest;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tn_error::ApiError;

pub const METHOD_CONFIG: &str = "tnc_config";
pub const METHOD_CONFIGURE: &str = "configure_tnc";
pub const METHOD_REGISTRATION_URI: &str = "tnc_registration_uri";

#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Serialize)]
pub struct RpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl RpcResponse {
    fn new(id: Value, outcome: Result<Value, ApiError>) -> Self {
        let (result, error) = match outcome {
            Ok(value) => (Some(value), None),
            Err(err) => (None, Some(err)),
        };
        Self {
            jsonrpc: "2.0",
            id,
            result,
            error,
        }
    }
}

/// Run one method against `manager`.
pub fn dispatch(manager: &ConnectManager, method: &str, params: Value) -> Result<Value, ApiError> {
    match method {
        METHOD_CONFIG => to_value(manager.config()?),
        METHOD_CONFIGURE => {
            let request = configure_params(params)?;
            to_value(manager.configure(request)?)
        }
        METHOD_REGISTRATION_URI => Ok(Value::String(manager.registration_uri()?)),
        other => Err(ApiError::method_not_found(other)),
    }
}

/// `configure_tnc` takes one object, either bare or as the only positional
/// parameter.
fn configure_params(params: Value) -> Result<ConfigureRequest, ApiError> {
    let object = match params {
        Value::Array(mut items) if items.len() == 1 => items.remove(0),
        Value::Array(items) => {
            return Err(ApiError::invalid_params(format!(
                "Expected exactly one parameter, got {}",
                items.len()
            )))
        }
        other => other,
    };
    serde_json::from_value(object).map_err(|err| ApiError::invalid_params(err.to_string()))
}

fn to_value<T: Serialize>(value: T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|err| ApiError::new(-32603, err.to_string()))
}

/// Handle one request line and produce the response line (without newline).
pub fn handle_line(manager: &ConnectManager, line: &str) -> String {
    let response = match serde_json::from_str::<RpcRequest>(line) {
        Ok(request) => {
            log::debug!("API call {}", request.method);
            let outcome = dispatch(manager, &request.method, request.params);
            if let Err(err) = &outcome {
                log::info!("API call {} rejected: {}", request.method, err);
            }
            RpcResponse::new(request.id, outcome)
        }
        Err(err) => RpcResponse::new(Value::Null, Err(ApiError::parse_error(err.to_string()))),
    };
    encode(&response)
}

/// Response line for a request that could not be read at all.
pub fn error_line(err: ApiError) -> String {
    encode(&RpcResponse::new(Value::Null, Err(err)))
}

fn encode(response: &RpcResponse) -> String {
    serde_json::to_string(response).unwrap_or_else(|err| {
        format!(
            r#"{{"jsonrpc":"2.0","id":null,"error":{{"code":-32603,"message":"{}"}}}}"#,
            err
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::finalizer::RegistrationFinalizer;
    use crate::manager::SystemIdentity;
    use crate::scheduler::{BoxFuture, RecordingSpawner};
    use serde_json::json;
    use std::sync::Arc;
    use tn_hal::FakeHal;

    struct NoopFinalizer;

    impl RegistrationFinalizer for NoopFinalizer {
        fn finalize(&self) -> BoxFuture<()> {
            Box::pin(async {})
        }
    }

    fn manager() -> ConnectManager {
        ConnectManager::new(
            Arc::new(MemoryCache::default()),
            Arc::new(FakeHal::new().with_interface("eno1", &["192.0.2.4"])),
            Arc::new(NoopFinalizer),
            Arc::new(RecordingSpawner::new()),
            SystemIdentity {
                version: "25.10.0".into(),
                model: Some("TRUENAS-MINI-3.0-XL+".into()),
            },
        )
    }

    fn call(manager: &ConnectManager, request: Value) -> Value {
        serde_json::from_str(&handle_line(manager, &request.to_string())).unwrap()
    }

    #[test]
    fn unknown_method_and_garbage() {
        let m = manager();
        let reply = call(&m, json!({"jsonrpc": "2.0", "id": 1, "method": "nope"}));
        assert_eq!(reply["error"]["code"], ApiError::METHOD_NOT_FOUND);
        assert_eq!(reply["id"], 1);

        let reply: Value = serde_json::from_str(&handle_line(&m, "{oops")).unwrap();
        assert_eq!(reply["error"]["code"], ApiError::PARSE_ERROR);
        assert_eq!(reply["id"], Value::Null);
    }

    #[test]
    fn bad_params_are_einval() {
        let m = manager();
        let reply = call(
            &m,
            json!({"id": 2, "method": METHOD_CONFIGURE, "params": [{"ips": []}]}),
        );
        assert_eq!(reply["error"]["code"], 22);
        assert!(reply["error"]["message"]
            .as_str()
            .unwrap()
            .contains("enabled"));
    }

    #[test]
    fn enable_then_fetch_uri() {
        let m = manager();
        let reply = call(
            &m,
            json!({"id": 3, "method": METHOD_CONFIGURE, "params": [{"enabled": true}]}),
        );
        assert_eq!(reply["result"]["enabled"], true);
        assert_eq!(reply["result"]["interfaces_ips"], json!(["192.0.2.4"]));
        let token = reply["result"]["claim_token"].as_str().unwrap().to_string();

        let reply = call(&m, json!({"id": 4, "method": METHOD_REGISTRATION_URI}));
        let uri = reply["result"].as_str().unwrap();
        assert!(uri.contains(&format!("token={}", token)));
        assert!(uri.contains("model=MINI-3.0-XL%2B"));

        let reply = call(&m, json!({"id": 5, "method": METHOD_CONFIG, "params": []}));
        assert_eq!(reply["result"]["claim_token"], token.as_str());
    }
}
