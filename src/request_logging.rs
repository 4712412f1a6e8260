/// Structured audit logging for security-relevant events
///
/// Registration, login failures, and password reset requests/consumptions
/// produce audit records so operators can reconstruct who did what. Records
/// are emitted as structured tracing events; no payload or password data is
/// ever logged.

use chrono::Utc;
use serde::Serialize;

/// A single auditable event
#[derive(Debug, Clone, Serialize)]
pub struct AuditLog {
    /// RFC 3339 timestamp of the event
    pub timestamp: String,
    /// What happened, e.g. "REGISTER_USER", "PASSWORD_RESET_CONSUME"
    pub action: String,
    /// The kind of resource acted on, e.g. "user", "course"
    pub resource_type: String,
    /// Identifier of the affected resource, when known
    pub resource_id: Option<String>,
    /// Acting user, when authenticated
    pub user_id: Option<String>,
    /// "SUCCESS" or "FAILURE"
    pub status: String,
    pub message: String,
}

impl AuditLog {
    pub fn new(action: String, resource_type: String, status: String, message: String) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            action,
            resource_type,
            resource_id: None,
            user_id: None,
            status,
            message,
        }
    }

    pub fn with_resource_id(mut self, id: String) -> Self {
        self.resource_id = Some(id);
        self
    }

    pub fn with_user_id(mut self, user_id: String) -> Self {
        self.user_id = Some(user_id);
        self
    }
}

/// Emits audit records through the tracing pipeline
pub struct AuditLogger;

impl AuditLogger {
    pub fn log(audit: &AuditLog) {
        if audit.status == "SUCCESS" {
            tracing::info!(
                target: "audit",
                action = %audit.action,
                resource_type = %audit.resource_type,
                resource_id = audit.resource_id.as_deref().unwrap_or("-"),
                user_id = audit.user_id.as_deref().unwrap_or("-"),
                status = %audit.status,
                "{}",
                audit.message
            );
        } else {
            tracing::warn!(
                target: "audit",
                action = %audit.action,
                resource_type = %audit.resource_type,
                resource_id = audit.resource_id.as_deref().unwrap_or("-"),
                user_id = audit.user_id.as_deref().unwrap_or("-"),
                status = %audit.status,
                "{}",
                audit.message
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_log_creation() {
        let audit = AuditLog::new(
            "REGISTER_USER".to_string(),
            "user".to_string(),
            "SUCCESS".to_string(),
            "User registered".to_string(),
        );

        assert_eq!(audit.action, "REGISTER_USER");
        assert_eq!(audit.resource_type, "user");
        assert!(audit.resource_id.is_none());
        assert!(audit.user_id.is_none());
    }

    #[test]
    fn test_audit_log_builders() {
        let audit = AuditLog::new(
            "PASSWORD_RESET_CONSUME".to_string(),
            "user".to_string(),
            "FAILURE".to_string(),
            "Invalid token".to_string(),
        )
        .with_resource_id("user-1".to_string())
        .with_user_id("user-1".to_string());

        assert_eq!(audit.resource_id.as_deref(), Some("user-1"));
        assert_eq!(audit.user_id.as_deref(), Some("user-1"));
    }

    #[test]
    fn test_audit_log_serializes() {
        let audit = AuditLog::new(
            "LOGIN".to_string(),
            "user".to_string(),
            "FAILURE".to_string(),
            "Invalid credentials".to_string(),
        );
        let json = serde_json::to_value(&audit).expect("Failed to serialize audit log");
        assert_eq!(json["action"], "LOGIN");
        assert_eq!(json["status"], "FAILURE");
    }
}
