//! SOAP Faults pour UPnP

use std::fmt;

use xmltree::{Element, XMLNode};

use super::{UPNP_CONTROL_NS, builder::write_envelope, upnp_error_description};
use crate::xml_utils::text_element;

/// Erreur UPnP renvoyée au point de contrôle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapFault {
    pub code: u16,

    /// Texte fourni par le handler, utilisé si le code n'est pas normalisé
    pub description: Option<String>,
}

impl SoapFault {
    pub fn new(code: u16) -> Self {
        Self {
            code,
            description: None,
        }
    }

    pub fn with_description(code: u16, description: impl Into<String>) -> Self {
        Self {
            code,
            description: Some(description.into()),
        }
    }

    /// Description émise : celle du registre, sinon le texte fourni,
    /// sinon "without words".
    pub fn description(&self) -> &str {
        upnp_error_description(self.code)
            .or(self.description.as_deref())
            .unwrap_or("without words")
    }

    pub fn to_xml(&self) -> Result<String, xmltree::Error> {
        encode_fault(self.code, self.description.as_deref())
    }
}

impl fmt::Display for SoapFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UPnP error {}: {}", self.code, self.description())
    }
}

impl std::error::Error for SoapFault {}

/// Construit un SOAP Fault UPnP (`s:Client` / `UPnPError`).
pub fn encode_fault(code: u16, description: Option<&str>) -> Result<String, xmltree::Error> {
    let description = upnp_error_description(code)
        .or(description)
        .unwrap_or("without words");

    let mut upnp_error = Element::new("UPnPError");
    upnp_error
        .attributes
        .insert("xmlns".to_string(), UPNP_CONTROL_NS.to_string());
    upnp_error
        .children
        .push(XMLNode::Element(text_element("errorCode", code.to_string())));
    upnp_error
        .children
        .push(XMLNode::Element(text_element("errorDescription", description)));

    let mut detail = Element::new("detail");
    detail.children.push(XMLNode::Element(upnp_error));

    let mut fault = Element::new("s:Fault");
    fault
        .children
        .push(XMLNode::Element(text_element("faultcode", "s:Client")));
    fault
        .children
        .push(XMLNode::Element(text_element("faultstring", "UPnPError")));
    fault.children.push(XMLNode::Element(detail));

    write_envelope(fault)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_uses_registry_text() {
        let xml = encode_fault(402, Some("ignored")).unwrap();
        assert!(xml.contains("<faultcode>s:Client</faultcode>"));
        assert!(xml.contains("<faultstring>UPnPError</faultstring>"));
        assert!(xml.contains("<errorCode>402</errorCode>"));
        assert!(xml.contains("<errorDescription>Invalid Args</errorDescription>"));
        assert!(xml.contains("xmlns=\"urn:schemas-upnp-org:control-1-0\""));
    }

    #[test]
    fn test_fault_unknown_code() {
        let xml = encode_fault(714, Some("Illegal MIME-type")).unwrap();
        assert!(xml.contains("<errorDescription>Illegal MIME-type</errorDescription>"));

        let xml = encode_fault(714, None).unwrap();
        assert!(xml.contains("<errorDescription>without words</errorDescription>"));
    }

    #[test]
    fn test_fault_display() {
        let fault = SoapFault::with_description(501, "helper crashed");
        assert_eq!(fault.description(), "Action Failed");
        assert_eq!(fault.to_string(), "UPnP error 501: Action Failed");
    }
}
