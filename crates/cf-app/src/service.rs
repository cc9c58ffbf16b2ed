//! Request/response service over the address space.
//!
//! Requests and responses are JSON objects, one per line on the endpoint:
//!
//! ```text
//! {"op":"read","node":"Sensors/CRA-2/PROCESS_VALUE","source_timestamp":true}
//! {"op":"write","node":"ns=1;i=50012","value":{"value":{"Double":70.0}}}
//! {"op":"browse","node":"Valves"}
//! ```
//!
//! Nodes are addressed by id (`ns=<n>;i=<v>`) or by a slash-separated browse
//! path from the Objects folder. The empty path is the Objects folder.

use cf_space::{AddressSpace, DataValue, NodeId, NumericRange, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    Read {
        node: String,
        #[serde(default)]
        range: Option<String>,
        #[serde(default)]
        source_timestamp: bool,
    },
    Write {
        node: String,
        value: DataValue,
        #[serde(default)]
        range: Option<String>,
    },
    Browse {
        node: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    pub reference: String,
    pub reference_type: String,
    pub target: String,
    pub browse_name: String,
    pub class: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Response {
    Value {
        node: String,
        value: DataValue,
    },
    Written {
        node: String,
        status: StatusCode,
    },
    References {
        node: String,
        references: Vec<ReferenceEntry>,
    },
    Error {
        status: StatusCode,
        message: String,
    },
}

impl Response {
    fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Response::Error {
            status,
            message: message.into(),
        }
    }
}

/// Resolve a node id string or browse path.
pub fn resolve_node(space: &AddressSpace, node: &str) -> Result<NodeId, StatusCode> {
    let node = node.trim();
    if node.starts_with("ns=") || node.starts_with("i=") {
        return node
            .parse::<NodeId>()
            .map_err(|_| StatusCode::BAD_NODE_ID_INVALID);
    }
    let path: Vec<&str> = node.split('/').filter(|s| !s.is_empty()).collect();
    space.resolve_path(&path)
}

fn parse_range(range: Option<&str>) -> Result<Option<NumericRange>, StatusCode> {
    range
        .map(|r| r.parse::<NumericRange>())
        .transpose()
        .map_err(|_| StatusCode::BAD_INDEX_RANGE_INVALID)
}

/// Serve one request.
pub fn handle(space: &AddressSpace, request: &Request) -> Response {
    let (node_ref, result) = match request {
        Request::Read {
            node,
            range,
            source_timestamp,
        } => (node, read(space, node, range.as_deref(), *source_timestamp)),
        Request::Write { node, value, range } => {
            (node, write(space, node, range.as_deref(), value))
        }
        Request::Browse { node } => (node, browse(space, node)),
    };
    result.unwrap_or_else(|status| {
        Response::error(status, format!("{node_ref}: {}", status.name()))
    })
}

fn read(
    space: &AddressSpace,
    node: &str,
    range: Option<&str>,
    source_timestamp: bool,
) -> Result<Response, StatusCode> {
    let id = resolve_node(space, node)?;
    let range = parse_range(range)?;
    Ok(Response::Value {
        node: id.to_string(),
        value: space.read(id, range.as_ref(), source_timestamp),
    })
}

fn write(
    space: &AddressSpace,
    node: &str,
    range: Option<&str>,
    value: &DataValue,
) -> Result<Response, StatusCode> {
    let id = resolve_node(space, node)?;
    let range = parse_range(range)?;
    let status = space.write(id, range.as_ref(), value);
    if status.is_bad() {
        debug!(node = %id, %status, "write rejected");
    }
    Ok(Response::Written {
        node: id.to_string(),
        status,
    })
}

fn browse(space: &AddressSpace, node: &str) -> Result<Response, StatusCode> {
    let id = resolve_node(space, node)?;
    let references = space
        .browse(id)?
        .into_iter()
        .map(|e| ReferenceEntry {
            reference: format!("{:?}", e.reference),
            reference_type: e.reference.type_id().to_string(),
            target: e.target.to_string(),
            browse_name: e.browse_name.name,
            class: format!("{:?}", e.class),
        })
        .collect();
    Ok(Response::References {
        node: id.to_string(),
        references,
    })
}

/// Decode a JSON request line, serve it and encode the response.
pub fn handle_line(space: &AddressSpace, line: &str) -> String {
    let response = match serde_json::from_str::<Request>(line) {
        Ok(request) => handle(space, &request),
        Err(err) => Response::error(StatusCode::BAD_INVALID_ARGUMENT, err.to_string()),
    };
    serde_json::to_string(&response).unwrap_or_else(|_| {
        format!(
            r#"{{"result":"error","status":{},"message":""}}"#,
            StatusCode::BAD_INTERNAL_ERROR.0
        )
    })
}
