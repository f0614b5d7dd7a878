//! ContentDirectory : une seule entrée, le flux `x-rincon-stream` de
//! l'entrée audio du lecteur.

use xmltree::{Element, XMLNode};
use zpupnp::actions::{Action, ActionError};
use zpupnp::services::ServiceDefinition;
use zpupnp::soap::ResultField;
use zpupnp::state_variables::VariableRegistry;
use zpupnp::xml_utils::text_element;

use super::fragment;
use crate::identity::ZoneIdentity;

const DIDL_NS: &str = "urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/";
const DC_NS: &str = "http://purl.org/dc/elements/1.1/";
const UPNP_NS: &str = "urn:schemas-upnp-org:metadata-1-0/upnp/";
const RINCON_NS: &str = "urn:schemas-rinconnetworks-com:metadata-1-0/";

/// Titre de l'entrée audio
pub const INPUT_TITLE: &str = "SonosCast";

/// Document DIDL-Lite décrivant l'entrée audio `AI:0`.
pub fn line_in_didl(sonos_id: &str) -> Element {
    let mut res = text_element("res", format!("x-rincon-stream:{}", sonos_id));
    res.attributes
        .insert("protocolInfo".into(), "x-rincon-stream:*:*:*".into());

    let mut item = Element::new("item");
    item.attributes.insert("id".into(), "AI:0".into());
    item.attributes.insert("parentID".into(), "AI:".into());
    item.attributes.insert("restricted".into(), "true".into());
    for child in [
        text_element("upnp:class", "object.item.audioItem"),
        text_element("dc:title", INPUT_TITLE),
        res,
    ] {
        item.children.push(XMLNode::Element(child));
    }

    let mut didl = Element::new("DIDL-Lite");
    didl.attributes.insert("xmlns".into(), DIDL_NS.into());
    didl.attributes.insert("xmlns:dc".into(), DC_NS.into());
    didl.attributes.insert("xmlns:upnp".into(), UPNP_NS.into());
    didl.attributes.insert("xmlns:r".into(), RINCON_NS.into());
    didl.children.push(XMLNode::Element(item));
    didl
}

pub fn definition(identity: &ZoneIdentity) -> ServiceDefinition {
    let id = identity.sonos_id();
    let didl = line_in_didl(&id);

    ServiceDefinition::new("ContentDirectory")
        .path("MediaServer/ContentDirectory")
        .variables(
            VariableRegistry::new()
                .evented("SystemUpdateID", "2")
                .evented("ContainerUpdateIDs", "AI:,1")
                .evented("ShareIndexInProgress", "0")
                .evented("ShareIndexLastError", "None")
                .evented("FavoritesUpdateID", format!("{},0", id))
                .evented("FavoritePresetsUpdateID", format!("{},0", id))
                .evented("RadioFavoritesUpdateID", format!("{},0", id))
                .evented("RadioLocationUpdateID", format!("{},39", id))
                .evented("SavedQueuesUpdateID", format!("{},3", id))
                .evented("ShareListUpdateID", format!("{},0", id)),
        )
        // ObjectID, BrowseFlag, Filter... : la réponse est toujours la même
        .action(Action::new("Browse", move |_ctx| {
            let result = fragment(&didl).map_err(|e| ActionError::failed(e.to_string()))?;
            Ok(vec![
                ResultField::new("Result", result),
                ResultField::new("NumberReturned", "1"),
                ResultField::new("TotalMatches", "1"),
                ResultField::new("UpdateID", "1"),
            ])
        }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::test_identity;
    use zpupnp::soap::SoapAction;

    #[test]
    fn test_browse_returns_line_in_item() {
        let def = definition(&test_identity());
        let mut store = def.registry().instantiate();
        let request = SoapAction {
            name: "Browse".into(),
            namespace: None,
            args: Vec::new(),
        };

        let (_, fields) = def.actions().dispatch(&request, &mut store).unwrap();
        let result = &fields[0].value;

        let didl = Element::parse(result.as_bytes()).unwrap();
        assert_eq!(didl.name, "DIDL-Lite");
        let item = didl.get_child("item").unwrap();
        assert_eq!(item.attributes.get("id").map(String::as_str), Some("AI:0"));
        assert_eq!(
            item.get_child("res").unwrap().get_text().unwrap(),
            "x-rincon-stream:RINCON_4CCC6A22568601400"
        );
        assert_eq!(fields[1].value, "1");
    }

    #[test]
    fn test_update_ids_carry_device_id() {
        let def = definition(&test_identity());
        let reg = def.registry();
        assert_eq!(
            reg.get("RadioLocationUpdateID").unwrap().default,
            "RINCON_4CCC6A22568601400,39"
        );
        assert_eq!(reg.len(), 10);
    }
}
