//! # ZoneGroupTopology
//!
//! Topologie d'un groupe à un seul membre : le lecteur lui-même, qui en est
//! le coordinateur. `ZoneGroupState` et `AvailableSoftwareUpdate` sont des
//! documents XML générés à partir de l'identité.

use xmltree::{Element, XMLNode};
use zpupnp::services::ServiceDefinition;
use zpupnp::state_variables::VariableRegistry;

use super::fragment;
use crate::identity::ZoneIdentity;

const UPDATE_NS: &str = "urn:schemas-rinconnetworks-com:update-1-0";
const UPDATE_BASE: &str = "http://update-firmware.sonos.com/firmware/Gold";

pub const MIN_COMPATIBLE_VERSION: &str = "33.0-00000";
pub const LEGACY_COMPATIBLE_VERSION: &str = "25.0-00000";
pub const BOOT_SEQ: &str = "2";

fn with_attributes(name: &str, attributes: &[(&str, String)]) -> Element {
    let mut elem = Element::new(name);
    for (key, value) in attributes {
        elem.attributes.insert(key.to_string(), value.clone());
    }
    elem
}

/// `<ZoneGroups>` : un groupe, un membre.
pub fn zone_group_state(identity: &ZoneIdentity) -> Element {
    let id = identity.sonos_id();

    let member = with_attributes(
        "ZoneGroupMember",
        &[
            ("UUID", id.clone()),
            ("Location", identity.location()),
            ("ZoneName", identity.zone_name.clone()),
            ("Icon", identity.icon.clone()),
            ("Configuration", "1".into()),
            ("SoftwareVersion", identity.firmware_version.clone()),
            ("MinCompatibleVersion", MIN_COMPATIBLE_VERSION.into()),
            ("LegacyCompatibleVersion", LEGACY_COMPATIBLE_VERSION.into()),
            ("BootSeq", BOOT_SEQ.into()),
            ("WirelessMode", "0".into()),
            ("WirelessLeafOnly", "0".into()),
            ("HasConfiguredSSID", "1".into()),
            ("ChannelFreq", "2412".into()),
            ("BehindWifiExtender", "0".into()),
            ("WifiEnabled", "1".into()),
            ("Orientation", "0".into()),
            ("RoomCalibrationState", "4".into()),
            ("SecureRegState", "2".into()),
        ],
    );

    let mut group = with_attributes(
        "ZoneGroup",
        &[("Coordinator", id.clone()), ("ID", format!("{}:0", id))],
    );
    group.children.push(XMLNode::Element(member));

    let mut groups = Element::new("ZoneGroups");
    groups.children.push(XMLNode::Element(group));
    groups
}

pub fn available_software_update(identity: &ZoneIdentity) -> Element {
    let v = &identity.firmware_version;
    let dv = &identity.display_version;

    with_attributes(
        "UpdateItem",
        &[
            ("xmlns", UPDATE_NS.into()),
            ("Type", "Software".into()),
            ("Version", v.clone()),
            (
                "UpdateURL",
                format!("{}/{}-v{}-bnyrye-GA1/^{}", UPDATE_BASE, v, dv, v),
            ),
            ("DownloadSize", "0".into()),
            (
                "ManifestURL",
                format!("{}/{}-v{}-ktwktj-SP1/update_1481660983.upm", UPDATE_BASE, v, dv),
            ),
        ],
    )
}

pub fn definition(identity: &ZoneIdentity) -> Result<ServiceDefinition, xmltree::Error> {
    let state = fragment(&zone_group_state(identity))?;
    let update = fragment(&available_software_update(identity))?;

    Ok(ServiceDefinition::new("ZoneGroupTopology").variables(
        VariableRegistry::new()
            .evented("ZoneGroupState", state)
            .evented("ThirdPartyMediaServersX", "")
            .evented("AvailableSoftwareUpdate", update)
            .evented("AlarmRunSequence", format!("{}:2:0", identity.sonos_id()))
            .evented("ZoneGroupName", "")
            .evented("ZoneGroupID", "")
            .evented("ZonePlayerUUIDsInGroup", ""),
    ))
}
