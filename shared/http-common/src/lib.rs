//! Shared HTTP utilities for the pet clinic workspace.
//!
//! Provides common response builders, escaping, and path helpers that do not
//! depend on a particular web framework.

// ============================================================================
// JSON Response Helpers (framework-agnostic)
// ============================================================================

/// Create a structured error JSON with a default message based on the code.
///
/// Returns: `{"error": {"code": "<code>", "message": "<default message>"}}`
pub fn json_err(code: &str) -> serde_json::Value {
    let message = match code {
        "not_found" => "Resource not found",
        "bad_request" => "Bad request",
        "invalid_id" => "Invalid identifier",
        "conflict" => "Resource already exists",
        "error" | "internal" => "Internal server error",
        _ => code, // Fallback to code as message for unknown codes
    };
    serde_json::json!({"error": {"code": code, "message": message}})
}

/// Create a structured error JSON with a custom message.
///
/// Returns: `{"error": {"code": "<code>", "message": "<message>"}}`
pub fn json_error_with_message(code: &str, message: &str) -> serde_json::Value {
    serde_json::json!({"error": {"code": code, "message": message}})
}

// ============================================================================
// HTML Helpers
// ============================================================================

/// Escape text for safe interpolation into HTML bodies and attribute values.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

// ============================================================================
// Paths
// ============================================================================

/// Owner details page, the landing page after a saved pet form.
pub fn owner_path(owner_id: &str) -> String {
    format!("/owners/{}", urlencoding::encode(owner_id))
}

/// Creation form for a new pet of the owner.
pub fn new_pet_path(owner_id: &str) -> String {
    format!("{}/pets/new", owner_path(owner_id))
}

/// Edit form for an existing pet of the owner.
pub fn edit_pet_path(owner_id: &str, pet_id: &str) -> String {
    format!(
        "{}/pets/{}/edit",
        owner_path(owner_id),
        urlencoding::encode(pet_id)
    )
}
