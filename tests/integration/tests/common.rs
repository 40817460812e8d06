//! Common test utilities and fixtures.

use std::path::PathBuf;

use anyhow::Context;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;
use sp_protocol_saml::Settings;
use tracing_subscriber::EnvFilter;

/// Installs a test subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures").join(name)
}

/// Reads a fixture file as bytes.
pub fn fixture(name: &str) -> anyhow::Result<Vec<u8>> {
    let path = fixture_path(name);
    std::fs::read(&path).with_context(|| format!("reading fixture {}", path.display()))
}

/// Reads a base64 fixture, ignoring surrounding whitespace.
pub fn base64_fixture(name: &str) -> anyhow::Result<Vec<u8>> {
    use base64::Engine;

    let text = String::from_utf8(fixture(name)?)?;
    Ok(base64::engine::general_purpose::STANDARD.decode(text.trim())?)
}

/// Loads the shared settings fixture.
pub fn settings() -> anyhow::Result<Settings> {
    let json = String::from_utf8(fixture("settings.json")?)?;
    Ok(Settings::from_json_str(&json)?)
}

/// A parsed element with its namespace resolved.
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub namespace: Option<String>,
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub children: Vec<Node>,
}

impl Node {
    fn open(ns: ResolveResult<'_>, start: &BytesStart<'_>) -> anyhow::Result<Self> {
        let namespace = match ns {
            ResolveResult::Bound(Namespace(uri)) => Some(String::from_utf8(uri.to_vec())?),
            _ => None,
        };
        let name = String::from_utf8(start.local_name().as_ref().to_vec())?;

        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr?;
            if attr.key.as_namespace_binding().is_some() {
                continue;
            }
            let key = String::from_utf8(attr.key.as_ref().to_vec())?;
            attributes.push((key, attr.unescape_value()?.into_owned()));
        }

        Ok(Self {
            namespace,
            name,
            attributes,
            ..Self::default()
        })
    }

    /// Returns an attribute value.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns attribute names in document order.
    pub fn attr_names(&self) -> Vec<&str> {
        self.attributes.iter().map(|(key, _)| key.as_str()).collect()
    }

    /// Returns the first child with the given namespace and local name.
    pub fn child(&self, namespace: &str, name: &str) -> anyhow::Result<&Node> {
        self.children
            .iter()
            .find(|c| c.namespace.as_deref() == Some(namespace) && c.name == name)
            .with_context(|| format!("<{}> has no child {{{namespace}}}{name}", self.name))
    }

    /// Returns child local names in document order.
    pub fn child_names(&self) -> Vec<&str> {
        self.children.iter().map(|c| c.name.as_str()).collect()
    }
}

fn attach(stack: &mut [Node], root: &mut Option<Node>, node: Node) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => *root = Some(node),
    }
}

/// Parses XML into a namespace-resolved tree.
pub fn parse(xml: &str) -> anyhow::Result<Node> {
    let mut reader = NsReader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Node> = Vec::new();
    let mut root = None;
    loop {
        match reader.read_resolved_event()? {
            (ns, Event::Start(e)) => stack.push(Node::open(ns, &e)?),
            (ns, Event::Empty(e)) => {
                let node = Node::open(ns, &e)?;
                attach(&mut stack, &mut root, node);
            }
            (_, Event::Text(t)) => {
                if let Some(top) = stack.last_mut() {
                    top.text = Some(t.unescape()?.into_owned());
                }
            }
            (_, Event::End(_)) => {
                let node = stack.pop().context("unbalanced end tag")?;
                attach(&mut stack, &mut root, node);
            }
            (_, Event::Eof) => break,
            _ => {}
        }
    }
    root.context("document has no root element")
}
