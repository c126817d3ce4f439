//! etcd backend over the v2 keys HTTP API.
//!
//! A location is a URL such as `http://127.0.0.1:2379/config/app`: the
//! scheme, host and port select the etcd member, and the path is the key
//! prefix the tree is rooted at. Directories map to subtrees and keys with
//! values to leaves.
//!
//! | Operation | Request                                   |
//! |-----------|-------------------------------------------|
//! | `MKDIR`   | `PUT /v2/keys/<key>?dir=true`             |
//! | `RMDIR`   | `DELETE /v2/keys/<key>?dir=true`          |
//! | `SET`     | `PUT /v2/keys/<key>` with form `value=..` |
//! | `DEL`     | `DELETE /v2/keys/<key>`                   |

use std::time::Duration;

use async_trait::async_trait;
use esync_types::{Node, Operation, Tree, TreePath};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::{StoreError, StoreResult};
use crate::traits::TreeStore;

/// Port used when the URL does not name one.
pub const DEFAULT_PORT: u16 = 2379;

/// etcd error code for a key that does not exist.
pub const KEY_NOT_FOUND: u32 = 100;

const KEYS_API: &str = "/v2/keys";

/// Connection settings for [`EtcdTreeStore`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EtcdOptions {
    pub default_port: u16,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for EtcdOptions {
    fn default() -> Self {
        Self {
            default_port: DEFAULT_PORT,
            timeout: Duration::from_secs(30),
        }
    }
}

/// A key prefix in an etcd cluster.
#[derive(Clone, Debug)]
pub struct EtcdTreeStore {
    client: Client,
    endpoint: Url,
    prefix: String,
}

impl EtcdTreeStore {
    /// Parse `location` and build an HTTP client for it.
    pub fn connect(location: &str, options: &EtcdOptions) -> StoreResult<Self> {
        let (endpoint, prefix) = parse_location(location, options.default_port)?;
        let client = Client::builder().timeout(options.timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            prefix,
        })
    }

    /// The etcd member this store talks to, without a path.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// The key prefix, without a trailing `/` (empty for the keyspace root).
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The full etcd key an operation path refers to.
    pub fn key_for(&self, path: &TreePath) -> String {
        format!("{}{}", self.prefix, path)
    }

    /// The keys API URL for `path`. The prefix is already URL-encoded; tree
    /// names are encoded here, `%` included.
    fn keys_url(&self, path: &TreePath) -> StoreResult<Url> {
        let mut url = self.endpoint.clone();
        url.set_path(&format!("{KEYS_API}{}", self.prefix));
        url.path_segments_mut()
            .map_err(|()| StoreError::InvalidUrl {
                url: self.endpoint.to_string(),
                reason: "cannot be a base".to_owned(),
            })?
            .extend(path.segments());
        Ok(url)
    }

    fn request_for(&self, op: &Operation) -> StoreResult<RequestBuilder> {
        let url = self.keys_url(op.path())?;
        let request = match op {
            Operation::MakeDirectory(_) => self.client.put(url).query(&[("dir", "true")]),
            Operation::RemoveDirectory(_) => self.client.delete(url).query(&[("dir", "true")]),
            Operation::SetValue(path, value) => {
                let value = std::str::from_utf8(value)
                    .map_err(|_| StoreError::NonUtf8Value(path.clone()))?;
                self.client.put(url).form(&[("value", value)])
            }
            Operation::DeleteValue(_) => self.client.delete(url),
        };
        Ok(request)
    }

    async fn send(&self, request: RequestBuilder, key: &str) -> StoreResult<Response> {
        let response = request.send().await?;
        if response.status().is_success() {
            return Ok(response);
        }
        Err(error_from_response(response, key).await)
    }
}

/// Split an etcd URL into the member endpoint and the key prefix.
fn parse_location(location: &str, default_port: u16) -> StoreResult<(Url, String)> {
    let invalid = |reason: &str| StoreError::InvalidUrl {
        url: location.to_owned(),
        reason: reason.to_owned(),
    };
    let url = Url::parse(location).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host"));
    }

    let prefix = url.path().trim_end_matches('/').to_owned();
    let mut endpoint = url.clone();
    endpoint.set_path("");
    endpoint.set_query(None);
    endpoint.set_fragment(None);
    if endpoint.port().is_none() {
        endpoint
            .set_port(Some(default_port))
            .map_err(|()| invalid("cannot set port"))?;
    }
    Ok((endpoint, prefix))
}

#[derive(Debug, Deserialize)]
struct KeysResponse {
    node: EtcdNode,
}

#[derive(Debug, Deserialize)]
struct EtcdNode {
    // The keyspace root is returned without a key.
    #[serde(default)]
    key: String,
    #[serde(default)]
    dir: bool,
    value: Option<String>,
    #[serde(default)]
    nodes: Vec<EtcdNode>,
}

#[derive(Debug, Deserialize)]
struct EtcdErrorBody {
    #[serde(rename = "errorCode")]
    error_code: u32,
    message: String,
    #[serde(default)]
    cause: String,
}

/// Convert a recursive directory listing into a tree. Child keys are full
/// keys; their names are what follows the parent key.
fn tree_from_node(node: &EtcdNode) -> StoreResult<Tree> {
    let mut tree = Tree::new();
    for child in &node.nodes {
        let name = child
            .key
            .strip_prefix(node.key.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| {
                StoreError::Protocol(format!("key {} is not below {}", child.key, node.key))
            })?;
        let entry = if child.dir {
            Node::Subtree(tree_from_node(child)?)
        } else {
            Node::leaf(child.value.clone().unwrap_or_default())
        };
        tree.insert(name, entry)?;
    }
    Ok(tree)
}

async fn error_from_response(response: Response, key: &str) -> StoreError {
    let status = response.status();
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => return StoreError::Http(e),
    };
    error_from_body(status.as_u16(), &body, key)
}

/// Interpret the answer to a recursive GET of the prefix.
fn tree_from_listing(status: u16, body: &str, key: &str) -> StoreResult<Option<Tree>> {
    if !(200..300).contains(&status) {
        return match error_from_body(status, body, key) {
            StoreError::Etcd {
                code: KEY_NOT_FOUND,
                ..
            } => Ok(None),
            err => Err(err),
        };
    }
    let listing: KeysResponse = serde_json::from_str(body)
        .map_err(|e| StoreError::Protocol(format!("invalid listing for {key}: {e}")))?;
    if !listing.node.dir {
        return Err(StoreError::NotADirectory(key.to_owned()));
    }
    tree_from_node(&listing.node).map(Some)
}

fn error_from_body(status: u16, body: &str, key: &str) -> StoreError {
    match serde_json::from_str::<EtcdErrorBody>(body) {
        Ok(err) => StoreError::Etcd {
            code: err.error_code,
            message: err.message,
            key: if err.cause.is_empty() {
                key.to_owned()
            } else {
                err.cause
            },
        },
        Err(_) => StoreError::Protocol(format!("HTTP {status} for {key}: {}", body.trim())),
    }
}

#[async_trait]
impl TreeStore for EtcdTreeStore {
    async fn read_tree(&self) -> StoreResult<Option<Tree>> {
        let root = TreePath::root();
        let key = self.key_for(&root);
        let response = self
            .client
            .get(self.keys_url(&root)?)
            .query(&[("recursive", "true")])
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        let tree = tree_from_listing(status, &body, &key)?;
        debug!(
            endpoint = %self.endpoint,
            prefix = %self.prefix,
            leaves = tree.as_ref().map_or(0, Tree::leaf_count),
            "read etcd tree"
        );
        Ok(tree)
    }

    async fn apply_operation(&self, op: &Operation) -> StoreResult<()> {
        let key = self.key_for(op.path());
        let request = self.request_for(op)?;
        self.send(request, &key).await?;
        Ok(())
    }

    fn location(&self) -> String {
        self.prefix.clone()
    }
}
