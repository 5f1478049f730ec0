use std::net::IpAddr;

use poem::Request;
use uuid::Uuid;

use crate::errors::InternalError;
use crate::errors::internal::AuthorizationError;
use crate::types::db::user;
use crate::types::internal::role::Role;

/// Request context that flows through all layers
///
/// Carries the client metadata recorded with login attempts and refresh
/// tokens, and the identity attached by the access guard.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext {
    /// IP address of the client making the request
    pub ip_address: Option<IpAddr>,

    /// Raw User-Agent header
    pub user_agent: Option<String>,

    /// Unique identifier for this request (for tracing across layers)
    pub request_id: Uuid,

    /// Identity attached after successful bearer validation
    pub identity: Option<IdentityContext>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self {
            ip_address: None,
            user_agent: None,
            request_id: Uuid::new_v4(),
            identity: None,
        }
    }

    /// Build a context from the incoming HTTP request
    pub fn from_request(req: &Request) -> Self {
        Self {
            ip_address: Self::extract_ip_address(req),
            user_agent: req.header("User-Agent").map(str::to_owned),
            request_id: Uuid::new_v4(),
            identity: None,
        }
    }

    /// Extract IP address from request headers
    ///
    /// Checks X-Forwarded-For, X-Real-IP, and falls back to remote address.
    fn extract_ip_address(req: &Request) -> Option<IpAddr> {
        // Check X-Forwarded-For header (proxy/load balancer)
        if let Some(forwarded) = req.header("X-Forwarded-For") {
            if let Some(ip) = forwarded.split(',').next() {
                if let Ok(ip) = ip.trim().parse() {
                    return Some(ip);
                }
            }
        }

        // Check X-Real-IP header (nginx)
        if let Some(real_ip) = req.header("X-Real-IP") {
            if let Ok(ip) = real_ip.trim().parse() {
                return Some(ip);
            }
        }

        // Fall back to remote address
        req.remote_addr().as_socket_addr().map(|addr| addr.ip())
    }

    pub fn with_ip_address(mut self, ip_address: IpAddr) -> Self {
        self.ip_address = Some(ip_address);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_identity(mut self, identity: IdentityContext) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn ip_string(&self) -> Option<String> {
        self.ip_address.map(|ip| ip.to_string())
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Minimal identity handed to downstream modules after the access guard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityContext {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl IdentityContext {
    /// Reject callers that do not hold `role`
    pub fn require_role(&self, role: Role) -> Result<(), InternalError> {
        if self.role == role {
            Ok(())
        } else {
            Err(AuthorizationError::InsufficientRole { required: role }.into())
        }
    }
}

impl From<&user::Model> for IdentityContext {
    fn from(user: &user::Model) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
        }
    }
}

/// Public view of a user; never carries the password hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSummary {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl From<&user::Model> for UserSummary {
    fn from(user: &user::Model) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
        }
    }
}

impl From<IdentityContext> for UserSummary {
    fn from(identity: IdentityContext) -> Self {
        Self {
            id: identity.id,
            email: identity.email,
            name: identity.name,
            role: identity.role,
        }
    }
}
