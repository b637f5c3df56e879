//! Shared application state for the gateway.
//!
//! [`GatewayState`] holds the built address space and the endpoint
//! description advertised to clients. The address space is never mutated
//! after construction, so handlers read it without locking; variable
//! values behind it synchronize on their own.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use opcsim_core::config::ServerSection;
use opcsim_core::namespace::AddressSpace;
use opcsim_types::{MessageSecurityMode, SecurityPolicy};
use serde::Serialize;

/// Policy id of the anonymous user token.
pub const ANONYMOUS_TOKEN: &str = "anonymous";

/// Policy id of the user name and password token.
pub const USERNAME_TOKEN: &str = "username";

/// One advertised (security mode, policy) pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointDescription {
    /// Endpoint URL, `opc.tcp://host:port`.
    pub endpoint_url: String,
    /// Message security mode.
    pub security_mode: MessageSecurityMode,
    /// Security policy the mode applies to.
    pub security_policy: SecurityPolicy,
    /// URI of the security policy.
    pub security_policy_uri: &'static str,
    /// Accepted user identity token policy ids.
    pub user_token_policies: Vec<&'static str>,
}

/// Everything the server advertises about itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointInfo {
    /// Endpoint URL, `opc.tcp://host:port`.
    pub endpoint_url: String,
    /// Product name from the build info.
    pub product_name: String,
    /// Build number from the build info.
    pub build_number: String,
    /// Build date from the build info.
    pub build_date: NaiveDate,
    /// One entry per (policy, mode) pairing.
    pub endpoints: Vec<EndpointDescription>,
}

impl EndpointInfo {
    /// Expand the configured policies into endpoint descriptions.
    ///
    /// Each policy contributes one description per security mode it
    /// supports. The anonymous token is listed only when the server
    /// allows anonymous access.
    pub fn from_config(server: &ServerSection) -> Self {
        let endpoint_url = server.endpoint_url();
        let mut tokens = Vec::with_capacity(2);
        if server.allow_anonymous {
            tokens.push(ANONYMOUS_TOKEN);
        }
        tokens.push(USERNAME_TOKEN);

        let url = &endpoint_url;
        let tokens = &tokens;
        let endpoints = server
            .security_policies
            .iter()
            .flat_map(|policy| {
                policy.modes().iter().map(move |mode| EndpointDescription {
                    endpoint_url: url.clone(),
                    security_mode: *mode,
                    security_policy: *policy,
                    security_policy_uri: policy.uri(),
                    user_token_policies: tokens.clone(),
                })
            })
            .collect();

        Self {
            endpoint_url,
            product_name: server.build_info.product_name.clone(),
            build_number: server.build_info.build_number.clone(),
            build_date: server.build_info.build_date,
            endpoints,
        }
    }
}

/// Shared state handed to every handler.
#[derive(Debug)]
pub struct GatewayState {
    /// The built address space.
    pub address_space: Arc<AddressSpace>,
    /// Advertised endpoint description.
    pub endpoint: EndpointInfo,
    /// When the gateway state was created.
    pub started_at: DateTime<Utc>,
}

impl GatewayState {
    /// Create state serving `address_space` and advertising `endpoint`.
    pub fn new(address_space: Arc<AddressSpace>, endpoint: EndpointInfo) -> Self {
        Self {
            address_space,
            endpoint,
            started_at: Utc::now(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_policies_expand_to_three_endpoints() {
        let info = EndpointInfo::from_config(&ServerSection::default());
        assert_eq!(info.endpoint_url, "opc.tcp://0.0.0.0:4334");
        let modes: Vec<MessageSecurityMode> =
            info.endpoints.iter().map(|e| e.security_mode).collect();
        assert_eq!(
            modes,
            vec![
                MessageSecurityMode::None,
                MessageSecurityMode::Sign,
                MessageSecurityMode::SignAndEncrypt,
            ]
        );
        assert!(info
            .endpoints
            .iter()
            .all(|e| e.user_token_policies.contains(&ANONYMOUS_TOKEN)));
    }

    #[test]
    fn anonymous_token_follows_config() {
        let server = ServerSection {
            allow_anonymous: false,
            security_policies: vec![SecurityPolicy::None],
            ..ServerSection::default()
        };
        let info = EndpointInfo::from_config(&server);
        assert_eq!(info.endpoints.len(), 1);
        let only = info.endpoints.first().unwrap();
        assert_eq!(only.user_token_policies, vec![USERNAME_TOKEN]);
    }
}
