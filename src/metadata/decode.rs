//! Metadata payload decoding

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::protocol::{Envelope, ProtocolError, ProtocolResult};
use crate::response::{aggregate, OperationOutcome};

use super::types::{DatabaseName, LayoutEntry, LayoutMetadata, ProductInfo, ScriptEntry};

/// Outcome of a metadata call and its value when the server reported success
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataResponse<T> {
    pub outcome: OperationOutcome,
    pub value: Option<T>,
}

fn decode_with<T>(
    envelope: &Envelope,
    extract: impl FnOnce(&Envelope) -> ProtocolResult<T>,
) -> ProtocolResult<MetadataResponse<T>> {
    let outcome = aggregate(envelope)?;
    let value = if envelope.is_ok() {
        Some(extract(envelope)?)
    } else {
        None
    };
    Ok(MetadataResponse { outcome, value })
}

fn member<T: DeserializeOwned>(envelope: &Envelope, key: &str) -> ProtocolResult<T> {
    let value = envelope
        .payload
        .get(key)
        .cloned()
        .ok_or_else(|| ProtocolError::malformed(format!("missing \"{}\"", key)))?;
    serde_json::from_value(value)
        .map_err(|e| ProtocolError::malformed(format!("bad \"{}\": {}", key, e)))
}

pub(crate) fn product_info(envelope: &Envelope) -> ProtocolResult<MetadataResponse<ProductInfo>> {
    decode_with(envelope, |env| match env.payload.get("productInfo") {
        Some(_) => member(env, "productInfo"),
        // some servers put the product fields directly in the response
        None => serde_json::from_value(Value::Object(env.payload.clone()))
            .map_err(|e| ProtocolError::malformed(format!("bad product info: {}", e))),
    })
}

pub(crate) fn databases(envelope: &Envelope) -> ProtocolResult<MetadataResponse<Vec<String>>> {
    decode_with(envelope, |env| {
        let names: Vec<DatabaseName> = member(env, "databases")?;
        Ok(names.into_iter().map(|d| d.name).collect())
    })
}

pub(crate) fn layouts(envelope: &Envelope) -> ProtocolResult<MetadataResponse<Vec<LayoutEntry>>> {
    decode_with(envelope, |env| member(env, "layouts"))
}

pub(crate) fn scripts(envelope: &Envelope) -> ProtocolResult<MetadataResponse<Vec<ScriptEntry>>> {
    decode_with(envelope, |env| member(env, "scripts"))
}

pub(crate) fn layout(envelope: &Envelope) -> ProtocolResult<MetadataResponse<LayoutMetadata>> {
    decode_with(envelope, |env| {
        serde_json::from_value(Value::Object(env.payload.clone()))
            .map_err(|e| ProtocolError::malformed(format!("bad layout metadata: {}", e)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ProtocolProfile, ServerGeneration};

    fn envelope(raw: &str) -> Envelope {
        ProtocolProfile::new(ServerGeneration::V1)
            .decode_envelope(raw)
            .unwrap()
    }

    #[test]
    fn test_product_info_both_shapes() {
        let nested = envelope(
            r#"{"messages":[{"code":"0","message":"OK"}],"response":{"productInfo":{"name":"Engine","version":"19.1"}}}"#,
        );
        assert_eq!(product_info(&nested).unwrap().value.unwrap().version, "19.1");

        let flat = envelope(
            r#"{"messages":[{"code":"0","message":"OK"}],"response":{"name":"Engine","buildDate":"11/14/2018"}}"#,
        );
        assert_eq!(
            product_info(&flat).unwrap().value.unwrap().build_date,
            "11/14/2018"
        );
    }

    #[test]
    fn test_databases() {
        let env = envelope(
            r#"{"messages":[{"code":"0","message":"OK"}],"response":{"databases":[{"name":"Shop"},{"name":"Stock"}]}}"#,
        );
        assert_eq!(databases(&env).unwrap().value.unwrap(), vec!["Shop", "Stock"]);
    }

    #[test]
    fn test_error_has_no_value() {
        let env = envelope(r#"{"messages":[{"code":"105","message":"Layout is missing"}],"response":{}}"#);
        let reply = layout(&env).unwrap();
        assert_eq!(reply.outcome.primary_error_code, 105);
        assert!(reply.value.is_none());
    }

    #[test]
    fn test_missing_member_is_malformed() {
        let env = envelope(r#"{"messages":[{"code":"0","message":"OK"}],"response":{}}"#);
        assert!(scripts(&env).unwrap_err().is_malformed());
    }
}
