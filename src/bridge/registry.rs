//! Capability registry (`bitcoinBrowser.*` namespace tree)
//!
//! The host injects direct methods into a nested namespace. The renderer shell
//! may also install fallbacks for the same paths. Every leaf carries an explicit
//! [`Installer`] marker so a shell fallback never displaces a host-installed
//! method, and installing twice leaves the same shape.

use crate::error::{BridgeError, BridgeResult};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// A callable capability exposed on the bridge
#[async_trait]
pub trait HostMethod: Send + Sync {
    async fn invoke(&self, args: Vec<Value>) -> BridgeResult<Value>;
}

/// Who installed a leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Installer {
    /// Injected by the native host
    Host,
    /// Fallback installed by the renderer shell
    Shell,
}

/// Result of an install attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed,
    Replaced,
    /// An existing leaf won; the new method was discarded
    Kept,
}

#[derive(Clone)]
struct Capability {
    method: Arc<dyn HostMethod>,
    installer: Installer,
}

#[derive(Clone)]
enum Node {
    Namespace(BTreeMap<String, Node>),
    Method(Capability),
}

fn segments(path: &str) -> BridgeResult<Vec<&str>> {
    let parts: Vec<&str> = path.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(BridgeError::InvalidInput(format!(
            "Malformed capability path '{}'",
            path
        )));
    }
    Ok(parts)
}

/// Nested namespace of host capabilities
#[derive(Default)]
pub struct CapabilityRegistry {
    root: RwLock<BTreeMap<String, Node>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create intermediate namespaces for `path`; existing ones are left alone
    pub fn ensure_namespace(&self, path: &str) -> BridgeResult<()> {
        let parts = segments(path)?;
        let mut root = self
            .root
            .write()
            .map_err(|_| BridgeError::Transport("capability registry poisoned".into()))?;

        let mut level = &mut *root;
        for part in parts {
            let node = level
                .entry(part.to_string())
                .or_insert_with(|| Node::Namespace(BTreeMap::new()));
            level = match node {
                Node::Namespace(children) => children,
                Node::Method(_) => {
                    return Err(BridgeError::InvalidInput(format!(
                        "'{}' in '{}' is a method, not a namespace",
                        part, path
                    )))
                }
            };
        }
        Ok(())
    }

    /// Install a method at `path`
    ///
    /// Host installs replace shell fallbacks and earlier host methods. Shell
    /// installs never replace an existing leaf.
    pub fn install(
        &self,
        path: &str,
        method: Arc<dyn HostMethod>,
        installer: Installer,
    ) -> BridgeResult<InstallOutcome> {
        let parts = segments(path)?;
        let (leaf, parents) = match parts.split_last() {
            Some(split) => split,
            None => return Err(BridgeError::InvalidInput("Empty capability path".into())),
        };
        if !parents.is_empty() {
            self.ensure_namespace(&parents.join("."))?;
        }

        let mut root = self
            .root
            .write()
            .map_err(|_| BridgeError::Transport("capability registry poisoned".into()))?;

        let mut level = &mut *root;
        for part in parents {
            level = match level.get_mut(*part) {
                Some(Node::Namespace(children)) => children,
                _ => {
                    return Err(BridgeError::InvalidInput(format!(
                        "Namespace '{}' missing in '{}'",
                        part, path
                    )))
                }
            };
        }

        let outcome = match level.get(*leaf) {
            None => InstallOutcome::Installed,
            Some(Node::Namespace(_)) => {
                return Err(BridgeError::InvalidInput(format!(
                    "'{}' is a namespace",
                    path
                )))
            }
            Some(Node::Method(existing)) => match (existing.installer, installer) {
                (_, Installer::Host) => InstallOutcome::Replaced,
                (_, Installer::Shell) => InstallOutcome::Kept,
            },
        };

        if outcome != InstallOutcome::Kept {
            level.insert(
                leaf.to_string(),
                Node::Method(Capability { method, installer }),
            );
        }
        log::debug!("Capability {} -> {:?} ({:?})", path, outcome, installer);
        Ok(outcome)
    }

    fn lookup(&self, path: &str) -> Option<Capability> {
        let parts = segments(path).ok()?;
        let root = self.root.read().ok()?;
        let (leaf, parents) = parts.split_last()?;

        let mut level = &*root;
        for part in parents {
            level = match level.get(*part)? {
                Node::Namespace(children) => children,
                Node::Method(_) => return None,
            };
        }
        match level.get(*leaf)? {
            Node::Method(capability) => Some(capability.clone()),
            Node::Namespace(_) => None,
        }
    }

    pub fn resolve(&self, path: &str) -> Option<Arc<dyn HostMethod>> {
        self.lookup(path).map(|c| c.method)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.lookup(path).is_some()
    }

    pub fn installer_of(&self, path: &str) -> Option<Installer> {
        self.lookup(path).map(|c| c.installer)
    }

    /// True if `path` names an existing namespace
    pub fn has_namespace(&self, path: &str) -> bool {
        let Ok(parts) = segments(path) else {
            return false;
        };
        let Ok(root) = self.root.read() else {
            return false;
        };
        let mut level = &*root;
        for part in parts {
            level = match level.get(part) {
                Some(Node::Namespace(children)) => children,
                _ => return false,
            };
        }
        true
    }

    /// Call the method at `path`, or fail with `CapabilityUnavailable`
    pub async fn call(&self, path: &str, args: Vec<Value>) -> BridgeResult<Value> {
        let method = self
            .resolve(path)
            .ok_or_else(|| BridgeError::unavailable(path))?;
        method.invoke(args).await
    }

    /// Every method path with its installer, sorted
    pub fn shape(&self) -> Vec<(String, Installer)> {
        fn walk(prefix: &str, level: &BTreeMap<String, Node>, out: &mut Vec<(String, Installer)>) {
            for (name, node) in level {
                let path = if prefix.is_empty() {
                    name.clone()
                } else {
                    format!("{}.{}", prefix, name)
                };
                match node {
                    Node::Namespace(children) => walk(&path, children, out),
                    Node::Method(c) => out.push((path, c.installer)),
                }
            }
        }

        let mut out = Vec::new();
        if let Ok(root) = self.root.read() {
            walk("", &root, &mut out);
        }
        out
    }
}

/// Method backed by a plain closure; used for host injections in-process and in tests
pub struct FnMethod<F>(pub F);

#[async_trait]
impl<F> HostMethod for FnMethod<F>
where
    F: Fn(Vec<Value>) -> BridgeResult<Value> + Send + Sync,
{
    async fn invoke(&self, args: Vec<Value>) -> BridgeResult<Value> {
        (self.0)(args)
    }
}
