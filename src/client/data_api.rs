//! Client facade
//!
//! Compiles a descriptor, attaches the caller's token, sends the request
//! through the caller's transport and builds the typed result. The client
//! holds no per-call state, so one instance may serve concurrent calls.

use std::time::Instant;

use uuid::Uuid;

use crate::compiler::{MetadataRequest, RequestCompiler, WireRequest};
use crate::config::ClientConfig;
use crate::field::FieldRef;
use crate::metadata::{
    self, LayoutEntry, LayoutMetadata, MetadataResponse, ProductInfo, ScriptEntry,
};
use crate::observability::{ClientMetrics, Logger};
use crate::protocol::{Envelope, ProtocolError, ProtocolProfile, ProtocolResult, ServerGeneration};
use crate::query::{Operation, QueryDescriptor, QueryError};
use crate::response::{
    aggregate, EmptyGroupPolicy, FoundSet, OperationOutcome, ReadResponse, ResponseGraphBuilder,
};

use super::errors::{ClientError, ClientResult};
use super::transport::{TokenSource, Transport};

/// Data API client bound to one server generation and database
pub struct DataApiClient<T, S> {
    compiler: RequestCompiler,
    builder: ResponseGraphBuilder,
    transport: T,
    tokens: S,
    metrics: ClientMetrics,
}

impl<T: Transport, S: TokenSource> DataApiClient<T, S> {
    /// Build a client from a validated config. Applies the config log level.
    pub fn new(config: &ClientConfig, transport: T, tokens: S) -> ClientResult<Self> {
        config
            .validate()
            .map_err(|e| ClientError::InvalidConfig(e.to_string()))?;
        Logger::set_min_severity(config.log_level);
        Ok(Self::with_parts(
            config.generation,
            &config.database,
            config.empty_group_policy,
            transport,
            tokens,
        ))
    }

    /// Build a client without touching the global log level
    pub fn with_parts(
        generation: ServerGeneration,
        database: &str,
        policy: EmptyGroupPolicy,
        transport: T,
        tokens: S,
    ) -> Self {
        Self {
            compiler: RequestCompiler::new(generation, database),
            builder: ResponseGraphBuilder::new(ProtocolProfile::new(generation), policy),
            transport,
            tokens,
            metrics: ClientMetrics::new(),
        }
    }

    pub fn generation(&self) -> ServerGeneration {
        self.compiler.profile().generation()
    }

    pub fn compiler(&self) -> &RequestCompiler {
        &self.compiler
    }

    pub fn metrics(&self) -> &ClientMetrics {
        &self.metrics
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run any descriptor. Writes return an empty found set.
    pub async fn execute(&self, query: &QueryDescriptor) -> ClientResult<ReadResponse> {
        let operation = query.operation();
        let call = CallLog::new(operation.as_str());
        let request = self.compiler.compile(query)?;
        let (envelope, status) = self.send(&call, request).await?;
        if operation == Operation::Find {
            let read = self
                .builder
                .build_from_envelope(&envelope)
                .map_err(|e| self.malformed(&call, status, e))?;
            self.completed(&call, &read.outcome, Some(read.found_set.len()));
            Ok(read)
        } else {
            let outcome = aggregate(&envelope).map_err(|e| self.malformed(&call, status, e))?;
            self.completed(&call, &outcome, None);
            Ok(ReadResponse {
                outcome,
                found_set: FoundSet::default(),
            })
        }
    }

    /// Run a find
    pub async fn find(&self, query: &QueryDescriptor) -> ClientResult<ReadResponse> {
        if query.operation() != Operation::Find {
            return Err(QueryError::invalid_query(format!(
                "{} is not a find",
                query.operation().as_str()
            ))
            .into());
        }
        self.execute(query).await
    }

    /// Run a create, edit or delete
    pub async fn mutate(&self, query: &QueryDescriptor) -> ClientResult<OperationOutcome> {
        if !query.operation().is_mutation() {
            return Err(QueryError::invalid_query("a find is not a mutation").into());
        }
        Ok(self.execute(query).await?.outcome)
    }

    /// Set global field values for the session
    pub async fn set_globals(
        &self,
        layout: &str,
        fields: &[FieldRef],
    ) -> ClientResult<OperationOutcome> {
        if fields.is_empty() {
            return Err(QueryError::invalid_query("no global fields to set").into());
        }
        let call = CallLog::new("globals");
        let request = self.compiler.compile_globals(layout, fields)?;
        let (envelope, status) = self.send(&call, request).await?;
        let outcome = aggregate(&envelope).map_err(|e| self.malformed(&call, status, e))?;
        self.completed(&call, &outcome, None);
        Ok(outcome)
    }

    pub async fn product_info(&self) -> ClientResult<MetadataResponse<ProductInfo>> {
        self.metadata(MetadataRequest::ProductInfo, metadata::product_info)
            .await
    }

    pub async fn databases(&self) -> ClientResult<MetadataResponse<Vec<String>>> {
        self.metadata(MetadataRequest::Databases, metadata::databases)
            .await
    }

    pub async fn layouts(&self) -> ClientResult<MetadataResponse<Vec<LayoutEntry>>> {
        self.metadata(MetadataRequest::Layouts, metadata::layouts).await
    }

    pub async fn layout_metadata(
        &self,
        layout: &str,
    ) -> ClientResult<MetadataResponse<LayoutMetadata>> {
        self.metadata(MetadataRequest::Layout(layout), metadata::layout)
            .await
    }

    pub async fn scripts(&self) -> ClientResult<MetadataResponse<Vec<ScriptEntry>>> {
        self.metadata(MetadataRequest::Scripts, metadata::scripts).await
    }

    async fn metadata<V>(
        &self,
        target: MetadataRequest<'_>,
        decode: fn(&Envelope) -> ProtocolResult<MetadataResponse<V>>,
    ) -> ClientResult<MetadataResponse<V>> {
        let call = CallLog::new("metadata");
        let request = self.compiler.compile_metadata(target)?;
        let (envelope, status) = self.send(&call, request).await?;
        let reply = decode(&envelope).map_err(|e| self.malformed(&call, status, e))?;
        self.completed(&call, &reply.outcome, None);
        Ok(reply)
    }

    /// Authorize, send and decode the envelope
    async fn send(&self, call: &CallLog, request: WireRequest) -> ClientResult<(Envelope, u16)> {
        let request = request.authorize(&self.tokens.current_bearer_token());
        let generation = self.generation().to_string();
        let method = request.method.to_string();
        let target = request.target();

        Logger::trace(
            "REQUEST_COMPILED",
            &call.fields(&[
                ("generation", generation.as_str()),
                ("method", method.as_str()),
                ("path", target.as_str()),
            ]),
        );

        self.metrics.increment_requests_sent();
        let started = Instant::now();
        let reply = match self.transport.execute(request).await {
            Ok(reply) => reply,
            Err(err) => {
                self.metrics.increment_transport_failures();
                let reason = err.to_string();
                Logger::error("TRANSPORT_FAILED", &call.fields(&[("reason", reason.as_str())]));
                return Err(err.into());
            }
        };
        let elapsed = started.elapsed().as_millis().to_string();

        let envelope = self
            .compiler
            .profile()
            .decode_envelope(&reply.body)
            .map_err(|e| self.malformed(call, reply.status, e))?;

        let status = reply.status.to_string();
        Logger::trace(
            "REPLY_RECEIVED",
            &call.fields(&[("status", status.as_str()), ("duration_ms", elapsed.as_str())]),
        );

        if envelope.script_errors.any() {
            self.metrics.increment_script_stage_errors();
            let pre_request = envelope.script_errors.pre_request.to_string();
            let pre_sort = envelope.script_errors.pre_sort.to_string();
            let post_request = envelope.script_errors.post_request.to_string();
            Logger::warn(
                "SCRIPT_STAGE_ERROR",
                &call.fields(&[
                    ("prerequest", pre_request.as_str()),
                    ("presort", pre_sort.as_str()),
                    ("postrequest", post_request.as_str()),
                ]),
            );
        }
        if !envelope.is_ok() {
            self.metrics.increment_application_errors();
        }

        Ok((envelope, reply.status))
    }

    fn malformed(&self, call: &CallLog, status: u16, err: ProtocolError) -> ClientError {
        self.metrics.increment_malformed_responses();
        let status_text = status.to_string();
        Logger::error(
            "RESPONSE_MALFORMED",
            &call.fields(&[("status", status_text.as_str()), ("reason", err.message())]),
        );
        ClientError::malformed(status, err)
    }

    fn completed(&self, call: &CallLog, outcome: &OperationOutcome, returned: Option<usize>) {
        let code = outcome.primary_error_code.to_string();
        match returned {
            Some(count) => {
                self.metrics.add_records_received(count as u64);
                let count = count.to_string();
                Logger::info(
                    "OPERATION_COMPLETED",
                    &call.fields(&[("code", code.as_str()), ("returned", count.as_str())]),
                );
            }
            None => Logger::info("OPERATION_COMPLETED", &call.fields(&[("code", code.as_str())])),
        }
    }
}

/// Identity shared by every log line of one call
struct CallLog {
    request_id: String,
    operation: &'static str,
}

impl CallLog {
    fn new(operation: &'static str) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            operation,
        }
    }

    /// Event fields prefixed with the call's `request_id` and `operation`
    fn fields<'a>(&'a self, extra: &[(&'a str, &'a str)]) -> Vec<(&'a str, &'a str)> {
        let mut fields = Vec::with_capacity(extra.len() + 2);
        fields.push(("request_id", self.request_id.as_str()));
        fields.push(("operation", self.operation));
        fields.extend_from_slice(extra);
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::{capture_log, Severity};

    #[test]
    fn test_every_call_line_carries_request_id() {
        let call = CallLog::new("find");
        let reason = "\"data\" is not an array".to_string();
        let lines = [
            capture_log(Severity::Trace, "REQUEST_COMPILED", &call.fields(&[("path", "/x")])),
            capture_log(
                Severity::Error,
                "RESPONSE_MALFORMED",
                &call.fields(&[("reason", reason.as_str())]),
            ),
            capture_log(Severity::Info, "OPERATION_COMPLETED", &call.fields(&[("code", "0")])),
        ];
        for line in &lines {
            let parsed: serde_json::Value = serde_json::from_str(line).unwrap();
            assert_eq!(parsed["request_id"], call.request_id.as_str());
            assert_eq!(parsed["operation"], "find");
        }
    }

    #[test]
    fn test_calls_get_distinct_request_ids() {
        let first = CallLog::new("globals");
        let second = CallLog::new("globals");
        assert_ne!(first.request_id, second.request_id);
        assert!(Uuid::parse_str(&first.request_id).is_ok());
    }
}
