//! Error handling utilities for MCP server

use rmcp::ErrorData;
use trellis_core::PlanError;

/// Helper to convert plan errors to MCP errors
///
/// Caller mistakes (bad parameters, unknown plan ids) become `invalid_params`
/// so the client can correct the request; anything else is an internal error.
pub fn to_mcp_error(message: &str, error: &PlanError) -> ErrorData {
    let text = format!("{message}: {error}");
    if error.is_validation() || error.is_not_found() {
        ErrorData::invalid_params(text, None)
    } else {
        ErrorData::internal_error(text, None)
    }
}

#[cfg(test)]
mod tests {
    use rmcp::model::ErrorCode;

    use super::*;

    #[test]
    fn test_error_codes() {
        let err = to_mcp_error("Planning command failed", &PlanError::not_found("p1"));
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
        assert_eq!(
            err.message,
            "Planning command failed: No plan found with ID: p1"
        );

        let err = to_mcp_error("Planning command failed", &PlanError::NoActivePlan);
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);

        let err = to_mcp_error(
            "Planning command failed",
            &PlanError::Configuration {
                message: "broken".into(),
            },
        );
        assert_eq!(err.code, ErrorCode::INTERNAL_ERROR);
    }
}
