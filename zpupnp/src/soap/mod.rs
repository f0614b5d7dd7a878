//! # Module SOAP - enveloppes de contrôle UPnP
//!
//! Décodage des requêtes d'action, encodage des réponses et des faults
//! selon le profil SOAP 1.1 utilisé par UPnP.
//!
//! - [`decode_action`] : extrait l'action et ses arguments typés (`xsi:type`)
//! - [`encode_response`] : `<u:{Action}Response>` dans une enveloppe `s:`
//! - [`encode_fault`] : `s:Fault` / `UPnPError` avec code et description
//!
//! ```
//! use zpupnp::soap::{decode_action, encode_response, ResultField, SoapValue};
//!
//! let body = r#"<?xml version="1.0"?>
//! <s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
//!   <s:Body>
//!     <u:GetTransportInfo xmlns:u="urn:schemas-upnp-org:service:AVTransport:1">
//!       <InstanceID>0</InstanceID>
//!     </u:GetTransportInfo>
//!   </s:Body>
//! </s:Envelope>"#;
//!
//! let action = decode_action(body.as_bytes()).unwrap();
//! assert_eq!(action.dispatch_name(), "gettransportinfo");
//!
//! let xml = encode_response(
//!     "urn:schemas-upnp-org:service:AVTransport:1",
//!     "GetTransportInfo",
//!     &[ResultField::new("CurrentSpeed", "1"), ResultField::typed("Flags", SoapValue::Int(0))],
//! )
//! .unwrap();
//! assert!(xml.contains("GetTransportInfoResponse"));
//! ```

mod builder;
mod fault;
mod parser;

pub use builder::{ResultField, encode_response};
pub use fault::{SoapFault, encode_fault};
pub use parser::{
    SoapAction, SoapArgument, SoapParseError, SoapValue, SoapValueError, XsdType, decode_action,
};

/// Namespace de l'enveloppe SOAP 1.1
pub const SOAP_ENVELOPE_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// Style d'encodage SOAP
pub const SOAP_ENCODING_STYLE: &str = "http://schemas.xmlsoap.org/soap/encoding/";

/// Namespace de l'élément `UPnPError`
pub const UPNP_CONTROL_NS: &str = "urn:schemas-upnp-org:control-1-0";

pub const XSI_NS: &str = "http://www.w3.org/1999/XMLSchema-instance";
pub const XSD_NS: &str = "http://www.w3.org/1999/XMLSchema";

/// Codes d'erreur UPnP
pub mod error_codes {
    pub const INVALID_ACTION: u16 = 401;
    pub const INVALID_ARGS: u16 = 402;
    pub const ACTION_FAILED: u16 = 501;
    pub const ARGUMENT_VALUE_INVALID: u16 = 600;
    pub const ARGUMENT_VALUE_OUT_OF_RANGE: u16 = 601;
    pub const OPTIONAL_ACTION_NOT_IMPLEMENTED: u16 = 602;
    pub const OUT_OF_MEMORY: u16 = 603;
    pub const HUMAN_INTERVENTION_REQUIRED: u16 = 604;
    pub const STRING_ARGUMENT_TOO_LONG: u16 = 605;
    pub const ACTION_NOT_AUTHORIZED: u16 = 606;
    pub const SIGNATURE_FAILURE: u16 = 607;
    pub const SIGNATURE_MISSING: u16 = 608;
    pub const NOT_ENCRYPTED: u16 = 609;
    pub const INVALID_SEQUENCE: u16 = 610;
    pub const INVALID_CONTROL_URL: u16 = 611;
    pub const NO_SUCH_SESSION: u16 = 612;
}

/// Description normalisée d'un code d'erreur UPnP.
pub fn upnp_error_description(code: u16) -> Option<&'static str> {
    use error_codes::*;

    let description = match code {
        INVALID_ACTION => "Invalid Action",
        INVALID_ARGS => "Invalid Args",
        ACTION_FAILED => "Action Failed",
        ARGUMENT_VALUE_INVALID => "Argument Value Invalid",
        ARGUMENT_VALUE_OUT_OF_RANGE => "Argument Value Out of Range",
        OPTIONAL_ACTION_NOT_IMPLEMENTED => "Optional Action Not Implemented",
        OUT_OF_MEMORY => "Out Of Memory",
        HUMAN_INTERVENTION_REQUIRED => "Human Intervention Required",
        STRING_ARGUMENT_TOO_LONG => "String Argument Too Long",
        ACTION_NOT_AUTHORIZED => "Action Not Authorized",
        SIGNATURE_FAILURE => "Signature Failure",
        SIGNATURE_MISSING => "Signature Missing",
        NOT_ENCRYPTED => "Not Encrypted",
        INVALID_SEQUENCE => "Invalid Sequence",
        INVALID_CONTROL_URL => "Invalid Control URL",
        NO_SUCH_SESSION => "No Such Session",
        _ => return None,
    };
    Some(description)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_registry() {
        assert_eq!(upnp_error_description(401), Some("Invalid Action"));
        assert_eq!(upnp_error_description(601), Some("Argument Value Out of Range"));
        assert_eq!(upnp_error_description(612), Some("No Such Session"));
        assert_eq!(upnp_error_description(718), None);
    }

    #[test]
    fn test_response_decodes_back_with_types() {
        let xml = encode_response(
            "urn:schemas-upnp-org:service:DeviceProperties:1",
            "GetZoneInfo",
            &[
                ResultField::typed("SerialNumber", SoapValue::Text("00-0E-58:3".into())),
                ResultField::typed("HTAudioIn", SoapValue::Int(-3)),
                ResultField::typed("Gain", SoapValue::Float(1.5)),
                ResultField::typed("Invisible", SoapValue::Bool(true)),
                ResultField::new("Flags", "0"),
                ResultField::typed("ZoneName", SoapValue::Text(" ".into())),
                ResultField::typed("Notes", SoapValue::Text("a<b&c\nline2".into())),
            ],
        )
        .unwrap();

        let decoded = decode_action(xml.as_bytes()).unwrap();
        assert_eq!(decoded.name, "GetZoneInfoResponse");

        let values: Vec<SoapValue> = decoded
            .args
            .iter()
            .map(|arg| arg.decode().unwrap())
            .collect();
        assert_eq!(
            values,
            vec![
                SoapValue::Text("00-0E-58:3".into()),
                SoapValue::Int(-3),
                SoapValue::Float(1.5),
                SoapValue::Bool(true),
                SoapValue::Text("0".into()),
                SoapValue::Text(" ".into()),
                SoapValue::Text("a<b&c\nline2".into()),
            ]
        );
    }
}
