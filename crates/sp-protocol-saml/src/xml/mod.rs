//! XML document construction and serialization.

mod document;

pub use document::{Element, ElementId, XmlDocument};
