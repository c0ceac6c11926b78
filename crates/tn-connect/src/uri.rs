//! Registration link handed to the operator.

use tn_core::connect_config::ConnectConfig;
use tn_error::{ConnectError, ConnectResult};
use url::Url;

pub const UNKNOWN_MODEL: &str = "UNKNOWN";
const MODEL_PREFIX: &str = "TRUENAS-";

/// `TRUENAS-M50` -> `M50`; missing or blank -> `UNKNOWN`.
pub fn model_identifier(model: Option<&str>) -> String {
    match model.map(str::trim).filter(|m| !m.is_empty()) {
        Some(model) => model.strip_prefix(MODEL_PREFIX).unwrap_or(model).to_string(),
        None => UNKNOWN_MODEL.to_string(),
    }
}

/// `{tnc_base_url}/system/register?version=..&model=..&system_id=..&token=..`
///
/// The base is treated as a directory whether or not it ends in `/`.
pub fn registration_uri(config: &ConnectConfig, model: &str) -> ConnectResult<String> {
    let mut base = config.tnc_base_url.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    let mut uri = base
        .join("system/register")
        .map_err(|err| ConnectError::ValidationFailed(format!("tnc_base_url: {}", err)))?;
    uri.query_pairs_mut()
        .append_pair("version", config.truenas_version.as_deref().unwrap_or_default())
        .append_pair("model", model)
        .append_pair("system_id", config.system_id.as_deref().unwrap_or_default())
        .append_pair("token", config.claim_token.as_deref().unwrap_or_default());
    Ok(uri.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_prefix_is_stripped() {
        assert_eq!(model_identifier(Some("TRUENAS-M50")), "M50");
        assert_eq!(model_identifier(Some("Standard PC (Q35)")), "Standard PC (Q35)");
        assert_eq!(model_identifier(Some("  ")), "UNKNOWN");
        assert_eq!(model_identifier(None), "UNKNOWN");
    }

    #[test]
    fn query_is_form_encoded() {
        let config = ConnectConfig {
            tnc_base_url: Url::parse("https://tnc.example.net/app/").unwrap(),
            truenas_version: Some("25.10.0".into()),
            system_id: Some("sid".into()),
            claim_token: Some("tok".into()),
            ..ConnectConfig::default()
        };
        assert_eq!(
            registration_uri(&config, "Standard PC (Q35)").unwrap(),
            "https://tnc.example.net/app/system/register?version=25.10.0&model=Standard+PC+%28Q35%29&system_id=sid&token=tok"
        );
    }

    #[test]
    fn base_without_trailing_slash_keeps_its_path() {
        let config = ConnectConfig {
            tnc_base_url: Url::parse("https://tnc.example.net/app").unwrap(),
            ..ConnectConfig::default()
        };
        let uri = registration_uri(&config, "M50").unwrap();
        assert!(
            uri.starts_with("https://tnc.example.net/app/system/register?version="),
            "{uri}"
        );

        let config = ConnectConfig {
            tnc_base_url: Url::parse("https://tnc.example.net").unwrap(),
            ..ConnectConfig::default()
        };
        assert!(registration_uri(&config, "M50")
            .unwrap()
            .starts_with("https://tnc.example.net/system/register?"));
    }
}
