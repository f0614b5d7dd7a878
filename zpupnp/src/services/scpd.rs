//! Description SCPD minimale : liste des actions et table des variables.

use xmltree::{Element, EmitterConfig, XMLNode};

use super::ServiceInstance;
use crate::xml_utils::text_element;

impl ServiceInstance {
    pub fn scpd_element(&self) -> Element {
        let def = self.definition();

        let mut root = Element::new("scpd");
        root.attributes.insert(
            "xmlns".to_string(),
            "urn:schemas-upnp-org:service-1-0".to_string(),
        );

        let mut spec = Element::new("specVersion");
        spec.children
            .push(XMLNode::Element(text_element("major", "1")));
        spec.children
            .push(XMLNode::Element(text_element("minor", "0")));
        root.children.push(XMLNode::Element(spec));

        let mut names: Vec<&str> = def.actions().names().collect();
        names.sort_unstable();

        let mut action_list = Element::new("actionList");
        for name in names {
            let mut action = Element::new("action");
            action
                .children
                .push(XMLNode::Element(text_element("name", name)));

            let declared = def.actions().get(name).and_then(|a| a.arguments());
            if let Some(arguments) = declared.filter(|a| !a.is_empty()) {
                let mut argument_list = Element::new("argumentList");
                for arg in arguments {
                    let mut argument = Element::new("argument");
                    argument
                        .children
                        .push(XMLNode::Element(text_element("name", arg)));
                    argument
                        .children
                        .push(XMLNode::Element(text_element("direction", "in")));
                    argument_list.children.push(XMLNode::Element(argument));
                }
                action.children.push(XMLNode::Element(argument_list));
            }
            action_list.children.push(XMLNode::Element(action));
        }
        root.children.push(XMLNode::Element(action_list));

        let mut state_table = Element::new("serviceStateTable");
        for descriptor in def.registry().descriptors() {
            let mut variable = Element::new("stateVariable");
            variable.attributes.insert(
                "sendEvents".to_string(),
                if descriptor.evented { "yes" } else { "no" }.to_string(),
            );
            variable
                .children
                .push(XMLNode::Element(text_element("name", &descriptor.name)));
            variable
                .children
                .push(XMLNode::Element(text_element("dataType", "string")));
            state_table.children.push(XMLNode::Element(variable));
        }
        root.children.push(XMLNode::Element(state_table));

        root
    }

    pub fn scpd_xml(&self) -> Result<String, xmltree::Error> {
        let config = EmitterConfig::new()
            .write_document_declaration(true)
            .perform_indent(true)
            .indent_string("  ");

        let mut buf = Vec::new();
        self.scpd_element().write_with_config(&mut buf, config)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}
