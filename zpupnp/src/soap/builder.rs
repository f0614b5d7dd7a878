//! Construction des réponses SOAP

use xmltree::{Element, XMLNode};

use super::{SOAP_ENCODING_STYLE, SOAP_ENVELOPE_NS, SoapValue, XSD_NS, XSI_NS, XsdType};

/// Champ de sortie d'une action.
///
/// Un champ typé porte un attribut `xsi:type` ; un champ brut est émis tel
/// quel, sans annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultField {
    pub name: String,
    pub value: String,
    pub xsd_type: Option<XsdType>,
}

impl ResultField {
    /// Champ texte brut
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            xsd_type: None,
        }
    }

    /// Champ typé (`xsi:type="xsd:..."`, booléens en `1`/`0`)
    pub fn typed(name: impl Into<String>, value: SoapValue) -> Self {
        Self {
            name: name.into(),
            value: value.to_string(),
            xsd_type: Some(value.xsd_type()),
        }
    }
}

pub(crate) fn write_envelope(body_child: Element) -> Result<String, xmltree::Error> {
    let mut body = Element::new("s:Body");
    body.children.push(XMLNode::Element(body_child));

    let mut envelope = Element::new("s:Envelope");
    envelope
        .attributes
        .insert("xmlns:s".to_string(), SOAP_ENVELOPE_NS.to_string());
    envelope
        .attributes
        .insert("s:encodingStyle".to_string(), SOAP_ENCODING_STYLE.to_string());
    envelope.children.push(XMLNode::Element(body));

    let mut buf = Vec::new();
    let config = xmltree::EmitterConfig::new()
        .write_document_declaration(true)
        .perform_indent(true)
        .indent_string("  ");
    envelope.write_with_config(&mut buf, config)?;

    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Construit la réponse SOAP d'une action.
///
/// # Arguments
///
/// * `service_urn` - URN du service (ex: "urn:schemas-upnp-org:service:AVTransport:1")
/// * `action` - Nom de l'action (ex: "GetTransportInfo")
/// * `fields` - Valeurs de retour, dans l'ordre d'émission
pub fn encode_response(
    service_urn: &str,
    action: &str,
    fields: &[ResultField],
) -> Result<String, xmltree::Error> {
    let mut response = Element::new(&format!("u:{}Response", action));
    response
        .attributes
        .insert("xmlns:u".to_string(), service_urn.to_string());

    if fields.iter().any(|f| f.xsd_type.is_some()) {
        response
            .attributes
            .insert("xmlns:xsi".to_string(), XSI_NS.to_string());
        response
            .attributes
            .insert("xmlns:xsd".to_string(), XSD_NS.to_string());
    }

    for field in fields {
        let mut child = Element::new(&field.name);
        if let Some(t) = field.xsd_type {
            child
                .attributes
                .insert("xsi:type".to_string(), t.as_str().to_string());
        }
        child.children.push(XMLNode::Text(field.value.clone()));
        response.children.push(XMLNode::Element(child));
    }

    write_envelope(response)
}
