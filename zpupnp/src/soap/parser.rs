//! Décodage des actions SOAP

use std::fmt;
use xmltree::{Element, ParserConfig, XMLNode};

/// Type déclaré d'un argument (`xsi:type`, préfixe `xsd:` retiré).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XsdType {
    String,
    Int,
    Float,
    Boolean,
}

impl XsdType {
    /// Interprète la valeur d'un attribut `xsi:type`.
    ///
    /// Seul le préfixe `xsd:` (ou `xs:`) est reconnu ; tout autre préfixe ou
    /// type inconnu donne une chaîne opaque.
    pub fn from_attribute(raw: &str) -> Self {
        let raw = raw.trim();
        let local = raw
            .strip_prefix("xsd:")
            .or_else(|| raw.strip_prefix("xs:"))
            .unwrap_or(raw);

        match local {
            "int" | "integer" => XsdType::Int,
            "float" | "double" => XsdType::Float,
            "boolean" => XsdType::Boolean,
            _ => XsdType::String,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            XsdType::String => "xsd:string",
            XsdType::Int => "xsd:int",
            XsdType::Float => "xsd:float",
            XsdType::Boolean => "xsd:boolean",
        }
    }
}

/// Valeur décodée d'un argument ou d'un champ de réponse
#[derive(Debug, Clone, PartialEq)]
pub enum SoapValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl SoapValue {
    pub fn xsd_type(&self) -> XsdType {
        match self {
            SoapValue::Int(_) => XsdType::Int,
            SoapValue::Float(_) => XsdType::Float,
            SoapValue::Bool(_) => XsdType::Boolean,
            SoapValue::Text(_) => XsdType::String,
        }
    }
}

/// Forme textuelle UPnP ; les booléens s'écrivent `1` / `0`.
impl fmt::Display for SoapValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SoapValue::Int(i) => write!(f, "{}", i),
            SoapValue::Float(x) => write!(f, "{}", x),
            SoapValue::Bool(b) => f.write_str(if *b { "1" } else { "0" }),
            SoapValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for SoapValue {
    fn from(s: &str) -> Self {
        SoapValue::Text(s.to_string())
    }
}

impl From<String> for SoapValue {
    fn from(s: String) -> Self {
        SoapValue::Text(s)
    }
}

impl From<i64> for SoapValue {
    fn from(i: i64) -> Self {
        SoapValue::Int(i)
    }
}

impl From<bool> for SoapValue {
    fn from(b: bool) -> Self {
        SoapValue::Bool(b)
    }
}

/// Texte d'argument incompatible avec son type déclaré
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("argument '{name}': '{value}' is not a valid {expected}")]
pub struct SoapValueError {
    pub name: String,
    pub value: String,
    pub expected: &'static str,
}

/// Argument brut d'une action : le texte est conservé tel quel, la
/// conversion se fait à la lecture ([`SoapArgument::decode`]).
#[derive(Debug, Clone, PartialEq)]
pub struct SoapArgument {
    pub name: String,
    pub xsd_type: XsdType,
    pub text: String,
}

impl SoapArgument {
    pub fn decode(&self) -> Result<SoapValue, SoapValueError> {
        let invalid = |expected| SoapValueError {
            name: self.name.clone(),
            value: self.text.clone(),
            expected,
        };

        match self.xsd_type {
            XsdType::String => Ok(SoapValue::Text(self.text.clone())),
            XsdType::Int => self
                .text
                .trim()
                .parse()
                .map(SoapValue::Int)
                .map_err(|_| invalid("integer")),
            XsdType::Float => self
                .text
                .trim()
                .parse()
                .map(SoapValue::Float)
                .map_err(|_| invalid("float")),
            XsdType::Boolean => match self.text.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(SoapValue::Bool(true)),
                "false" | "0" => Ok(SoapValue::Bool(false)),
                _ => Err(invalid("boolean")),
            },
        }
    }
}

/// Action UPnP extraite d'une enveloppe SOAP
#[derive(Debug, Clone)]
pub struct SoapAction {
    /// Nom local de l'action (ex: "GetZoneInfo")
    pub name: String,

    /// Namespace de l'action (ex: "urn:schemas-upnp-org:service:DeviceProperties:1")
    pub namespace: Option<String>,

    /// Arguments, dans l'ordre du document
    pub args: Vec<SoapArgument>,
}

impl SoapAction {
    /// Clé de dispatch : nom sans namespace ni préfixe, en minuscules.
    pub fn dispatch_name(&self) -> String {
        let local = match self.name.rfind('}') {
            Some(idx) => &self.name[idx + 1..],
            None => &self.name,
        };
        let local = local.rsplit(':').next().unwrap_or(local);
        local.to_lowercase()
    }

    pub fn arg(&self, name: &str) -> Option<&SoapArgument> {
        self.args.iter().find(|a| a.name == name)
    }
}

/// Requête SOAP illisible (`MalformedRequest`)
#[derive(Debug, thiserror::Error)]
pub enum SoapParseError {
    #[error("empty SOAP request")]
    EmptyBody,

    #[error("XML parse error: {0}")]
    Xml(#[from] xmltree::ParseError),

    #[error("missing SOAP Envelope")]
    MissingEnvelope,

    #[error("missing SOAP Body")]
    MissingBody,

    #[error("no action found in SOAP Body")]
    NoAction,
}

fn child_elements(elem: &Element) -> impl Iterator<Item = &Element> {
    elem.children.iter().filter_map(XMLNode::as_element)
}

fn xsi_type(elem: &Element) -> XsdType {
    elem.attributes
        .iter()
        .find(|(key, _)| {
            let key: &str = key.as_ref();
            key == "type" || key.ends_with(":type")
        })
        .map(|(_, value)| XsdType::from_attribute(value))
        .unwrap_or(XsdType::String)
}

/// Décode une requête d'action SOAP.
///
/// Le premier élément du `Body` est l'action ; chacun de ses éléments fils
/// devient un argument, typé par son éventuel attribut `xsi:type`.
pub fn decode_action(body: &[u8]) -> Result<SoapAction, SoapParseError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(SoapParseError::EmptyBody);
    }

    // les arguments faits d'espaces gardent leur texte
    let config = ParserConfig::new()
        .ignore_comments(false)
        .whitespace_to_characters(true);
    let root = Element::parse_with_config(body, config)?;
    if root.name != "Envelope" {
        return Err(SoapParseError::MissingEnvelope);
    }

    let soap_body = child_elements(&root)
        .find(|e| e.name == "Body")
        .ok_or(SoapParseError::MissingBody)?;

    let action = child_elements(soap_body)
        .next()
        .ok_or(SoapParseError::NoAction)?;

    let args = child_elements(action)
        .map(|arg| SoapArgument {
            name: arg.name.clone(),
            xsd_type: xsi_type(arg),
            text: arg.get_text().map(|t| t.into_owned()).unwrap_or_default(),
        })
        .collect();

    Ok(SoapAction {
        name: action.name.clone(),
        namespace: action.namespace.clone(),
        args,
    })
}
