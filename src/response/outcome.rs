//! Operation outcome and the error aggregator

use serde_json::{Map, Value};

use crate::protocol::{scalar_text, Envelope, ProtocolError, ProtocolResult};

/// Result of one executed operation as reported by the server.
///
/// A non-zero primary code is an application error, not a failure of the
/// call. Script-stage codes never change `is_success`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationOutcome {
    pub primary_error_code: i64,
    pub primary_error_message: String,
    pub script_before_error: i64,
    pub script_before_sort_error: i64,
    pub script_after_error: i64,
    /// Record id returned by a create
    pub new_record_id: Option<u64>,
    /// Modification id returned by a create or edit
    pub new_modification_id: Option<u64>,
}

impl OperationOutcome {
    pub fn is_success(&self) -> bool {
        self.primary_error_code == 0
    }

    pub fn has_script_errors(&self) -> bool {
        self.script_before_error != 0
            || self.script_before_sort_error != 0
            || self.script_after_error != 0
    }
}

/// Merge the primary status and the script-stage codes of an envelope.
///
/// A `recordId` or `modId` that is present but not numeric is malformed.
pub fn aggregate(envelope: &Envelope) -> ProtocolResult<OperationOutcome> {
    Ok(OperationOutcome {
        primary_error_code: envelope.code,
        primary_error_message: envelope.message.clone(),
        script_before_error: envelope.script_errors.pre_request,
        script_before_sort_error: envelope.script_errors.pre_sort,
        script_after_error: envelope.script_errors.post_request,
        new_record_id: id_member(&envelope.payload, "recordId")?,
        new_modification_id: id_member(&envelope.payload, "modId")?,
    })
}

/// Optional numeric id sent as text or number
pub(crate) fn id_member(node: &Map<String, Value>, key: &str) -> ProtocolResult<Option<u64>> {
    match node.get(key).and_then(scalar_text) {
        None => Ok(None),
        Some(text) if text.trim().is_empty() => Ok(None),
        Some(text) => text
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ProtocolError::malformed(format!("\"{}\" is not numeric: {}", key, text))),
    }
}
