//! REST endpoint handlers for the gateway.
//!
//! All handlers dispatch to the shared [`AddressSpace`] via
//! [`GatewayState`]. Node ids travel in the path in their text form
//! (`i=1000`, `s=Temperature`, `b=1020ffab`).
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/endpoints` | Advertised endpoint descriptions |
//! | `GET` | `/api/nodes` | Browse the `Objects` folder |
//! | `GET` | `/api/nodes/:id/children` | Browse a folder |
//! | `GET` | `/api/nodes/:id` | Read a node |
//! | `PUT` | `/api/nodes/:id` | Write a variable |
//!
//! [`AddressSpace`]: opcsim_core::namespace::AddressSpace

use std::fmt::Write as _;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse};
use opcsim_core::namespace::{Namespace, NamespaceError};
use opcsim_types::{NodeId, Variant};
use tracing::debug;

use crate::error::GatewayError;
use crate::state::GatewayState;

fn parse_node_id(raw: &str) -> Result<NodeId, GatewayError> {
    Ok(raw.parse::<NodeId>()?)
}

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page with product info, endpoints, and API links.
pub async fn index(State(state): State<Arc<GatewayState>>) -> impl IntoResponse {
    let info = &state.endpoint;
    let variable_count = state.address_space.variable_count();
    let started_at = state.started_at.format("%Y-%m-%d %H:%M:%S UTC");

    let mut endpoint_rows = String::new();
    for endpoint in &info.endpoints {
        writeln!(
            endpoint_rows,
            "        <tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape_html(&endpoint.security_mode.to_string()),
            escape_html(&endpoint.security_policy_uri),
            escape_html(&endpoint.user_token_policies.join(" ")),
        )
        .ok();
    }

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>{product}</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 900px;
            margin: 0 auto;
        }}
        h1 {{ color: #58a6ff; margin-bottom: 0.25rem; }}
        .subtitle {{ color: #8b949e; margin-top: 0; }}
        table {{ border-collapse: collapse; width: 100%; }}
        td, th {{ border: 1px solid #30363d; padding: 0.4rem 0.8rem; text-align: left; }}
        a {{ color: #58a6ff; text-decoration: none; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.3rem 0; }}
        .status {{ color: #3fb950; font-weight: bold; }}
    </style>
</head>
<body>
    <h1>{product}</h1>
    <p class="subtitle">Build {build_number} ({build_date})</p>

    <p>Status: <span class="status">RUNNING</span> since {started_at}</p>
    <p>Endpoint: <code>{url}</code></p>
    <p>Variables: {variable_count}</p>

    <table>
        <tr><th>Security mode</th><th>Policy</th><th>User tokens</th></tr>
{endpoint_rows}    </table>

    <h2>API</h2>
    <ul>
        <li><a href="/api/endpoints">GET /api/endpoints</a></li>
        <li><a href="/api/nodes">GET /api/nodes</a></li>
        <li>GET /api/nodes/{{id}}/children</li>
        <li>GET /api/nodes/{{id}}</li>
        <li>PUT /api/nodes/{{id}}</li>
    </ul>
</body>
</html>"#,
        product = escape_html(&info.product_name),
        build_number = escape_html(&info.build_number),
        build_date = info.build_date,
        url = escape_html(&info.endpoint_url),
    ))
}

/// Escape text for an HTML element body or quoted attribute.
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

// ---------------------------------------------------------------------------
// GET /api/endpoints
// ---------------------------------------------------------------------------

/// Return the advertised endpoint descriptions.
pub async fn list_endpoints(State(state): State<Arc<GatewayState>>) -> impl IntoResponse {
    Json(state.endpoint.clone())
}

// ---------------------------------------------------------------------------
// GET /api/nodes, GET /api/nodes/{id}/children -- browse
// ---------------------------------------------------------------------------

/// Browse the `Objects` folder.
pub async fn browse_objects(
    State(state): State<Arc<GatewayState>>,
) -> Result<impl IntoResponse, GatewayError> {
    browse(&state, &NodeId::OBJECTS_FOLDER)
}

/// Browse the folder named in the path.
pub async fn browse_children(
    State(state): State<Arc<GatewayState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let node_id = parse_node_id(&id_str)?;
    browse(&state, &node_id)
}

fn browse(state: &GatewayState, node_id: &NodeId) -> Result<impl IntoResponse + use<>, GatewayError> {
    let references = state
        .address_space
        .browse(node_id)
        .map_err(|e| match e {
            NamespaceError::NodeNotFound(_) | NamespaceError::NotAFolder(_) => {
                GatewayError::NotFound(e.to_string())
            }
            NamespaceError::DuplicateNodeId(_) => GatewayError::Internal(e.to_string()),
        })?;

    Ok(Json(serde_json::json!({
        "nodeId": node_id,
        "count": references.len(),
        "references": references,
    })))
}

// ---------------------------------------------------------------------------
// GET /api/nodes/{id} -- read
// ---------------------------------------------------------------------------

/// Read a node: its metadata and current data value.
///
/// Accessor failures are reported in the data value's status with a
/// `200` response; only an unknown node id is an HTTP error.
pub async fn read_node(
    State(state): State<Arc<GatewayState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let node_id = parse_node_id(&id_str)?;
    let space = &state.address_space;

    if !space.contains(&node_id) {
        return Err(GatewayError::NotFound(format!("node {node_id}")));
    }

    let data_value = space.read(&node_id);
    debug!(node_id = %node_id, status = %data_value.status, "read");

    let node = match space.variable(&node_id) {
        Some(metadata) => serde_json::to_value(metadata)
            .map_err(|e| GatewayError::Internal(format!("JSON error: {e}")))?,
        None => serde_json::json!({
            "nodeId": node_id,
            "nodeClass": "Folder",
        }),
    };

    Ok(Json(serde_json::json!({
        "node": node,
        "dataValue": data_value,
    })))
}

// ---------------------------------------------------------------------------
// PUT /api/nodes/{id} -- write
// ---------------------------------------------------------------------------

/// Write a value to a variable.
///
/// The body is a variant in wire form:
/// `{"dataType": "Int32", "arrayType": "Scalar", "value": 42}`.
pub async fn write_node(
    State(state): State<Arc<GatewayState>>,
    Path(id_str): Path<String>,
    Json(value): Json<Variant>,
) -> Result<impl IntoResponse, GatewayError> {
    let node_id = parse_node_id(&id_str)?;

    let status = state.address_space.write(&node_id, value);
    if !status.is_good() {
        return Err(GatewayError::Rejected(status));
    }

    Ok(Json(serde_json::json!({
        "nodeId": node_id,
        "status": status,
    })))
}
