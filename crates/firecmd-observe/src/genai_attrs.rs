//! OpenTelemetry GenAI Semantic Convention attribute values.
//!
//! `tracing` span field names must be literal, so spans spell out the
//! `gen_ai.*` keys and take their values from here.

// --- Operation name values ---

/// Agent invocation operation.
pub const OP_INVOKE_AGENT: &str = "invoke_agent";

// --- Provider name values ---

/// AWS Bedrock provider identifier.
pub const PROVIDER_AWS_BEDROCK: &str = "aws.bedrock";

/// Span name following the `"{operation} {target}"` convention,
/// e.g. `"invoke_agent FireCommandAssistant"`.
pub fn span_name(operation: &str, target: &str) -> String {
    format!("{operation} {target}")
}
