//! Petits utilitaires xmltree partagés par les documents UPnP.

use xmltree::{Element, XMLNode};

/// `<name>text</name>`, texte échappé à l'écriture.
pub fn text_element(name: &str, text: impl Into<String>) -> Element {
    let mut elem = Element::new(name);
    elem.children.push(XMLNode::Text(text.into()));
    elem
}
