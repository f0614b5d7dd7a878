//! # DeviceProperties
//!
//! Identité de la zone (nom, icône, configuration) et caractéristiques
//! matérielles annoncées. Toutes les variables sont évènementielles.
//!
//! `SetZoneAttributes` écrit trois variables dans la même étape : les
//! abonnés ne reçoivent qu'une notification portant les trois valeurs.

use zpupnp::actions::Action;
use zpupnp::services::ServiceDefinition;
use zpupnp::soap::ResultField;
use zpupnp::state_variables::VariableRegistry;

use crate::identity::ZoneIdentity;

pub const ZONE_NAME: &str = "ZoneName";
pub const ICON: &str = "Icon";
pub const CONFIGURATION: &str = "Configuration";

pub const HARDWARE_VERSION: &str = "1.17.4.1-2";
const COPYRIGHT_INFO: &str = "© 2004-2017 Sonos, Inc. All Rights Reserved.";
pub const EXTRA_INFO: &str = "OTP: 1.1.1(1-17-4-zp5s-2.1)";

fn variables(identity: &ZoneIdentity) -> VariableRegistry {
    VariableRegistry::new()
        .evented(ZONE_NAME, identity.zone_name.as_str())
        .evented(ICON, identity.icon.as_str())
        .evented(CONFIGURATION, "1")
        .evented("Invisible", "0")
        .evented("IsZoneBridge", "0")
        .evented("WirelessMode", "0")
        .evented("WirelessLeafOnly", "0")
        .evented("HasConfiguredSSID", "1")
        .evented("ChannelFreq", "2412")
        .evented("BehindWifiExtender", "0")
        .evented("WifiEnabled", "1")
        .evented("SettingsReplicationState", "")
        .evented("SecureRegState", "2")
        .evented("ChannelMapSet", "")
        .evented("HTSatChanMapSet", "")
        .evented("HTBondedZoneCommitState", "0")
        .evented("Orientation", "0")
        .evented("LastChangedPlayState", "")
        .evented("AvailableRoomCalibration", "")
        .evented("RoomCalibrationState", "4")
        .evented("ConfigMode", "")
}

pub fn definition(identity: &ZoneIdentity) -> ServiceDefinition {
    let zone = identity.clone();

    ServiceDefinition::new("DeviceProperties")
        .variables(variables(identity))
        .action(Action::new("GetZoneInfo", move |_ctx| {
            Ok(vec![
                ResultField::new("SerialNumber", format!("{}:3", zone.mac_hyphens())),
                ResultField::new("SoftwareVersion", zone.firmware_version.as_str()),
                ResultField::new("DisplaySoftwareVersion", zone.display_version.as_str()),
                ResultField::new("HardwareVersion", HARDWARE_VERSION),
                ResultField::new("IPAddress", zone.ip.as_str()),
                ResultField::new("MACAddress", zone.mac.as_str()),
                ResultField::new("CopyrightInfo", COPYRIGHT_INFO),
                ResultField::new("ExtraInfo", EXTRA_INFO),
                ResultField::new("HTAudioIn", "0"),
                ResultField::new("Flags", "0"),
            ])
        }))
        .action(Action::new("GetZoneAttributes", |ctx| {
            Ok(vec![
                ResultField::new("CurrentZoneName", ctx.get(ZONE_NAME)?),
                ResultField::new("CurrentIcon", ctx.get(ICON)?),
                ResultField::new("CurrentConfiguration", ctx.get(CONFIGURATION)?),
            ])
        }))
        .action(
            Action::new("SetZoneAttributes", |ctx| {
                let name = ctx.text("DesiredZoneName")?;
                let icon = ctx.text("DesiredIcon")?;
                let configuration = ctx.text("DesiredConfiguration")?;

                ctx.set(ZONE_NAME, name)?;
                ctx.set(ICON, icon)?;
                ctx.set(CONFIGURATION, configuration)?;
                Ok(Vec::new())
            })
            .with_arguments(&["DesiredZoneName", "DesiredIcon", "DesiredConfiguration"]),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::test_identity;
    use zpupnp::actions::ActionError;
    use zpupnp::soap::{SoapAction, SoapArgument, XsdType};

    fn request(name: &str, args: &[(&str, &str)]) -> SoapAction {
        SoapAction {
            name: name.into(),
            namespace: None,
            args: args
                .iter()
                .map(|(n, v)| SoapArgument {
                    name: n.to_string(),
                    xsd_type: XsdType::String,
                    text: v.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_all_variables_are_evented() {
        let def = definition(&test_identity());
        assert_eq!(def.registry().len(), 21);
        assert!(def.registry().descriptors().iter().all(|d| d.evented));
        assert_eq!(def.registry().get(ZONE_NAME).unwrap().default, "Bathroom");
    }

    #[test]
    fn test_get_zone_info() {
        let def = definition(&test_identity());
        let mut store = def.registry().instantiate();

        let (_, fields) = def
            .actions()
            .dispatch(&request("getzoneinfo", &[]), &mut store)
            .unwrap();

        assert_eq!(fields[0].name, "SerialNumber");
        assert_eq!(fields[0].value, "4C-CC-6A-22-56-86:3");
        assert_eq!(fields[4].value, "10.0.0.22");
        assert_eq!(fields.len(), 10);
        assert!(!store.has_pending());
    }

    #[test]
    fn test_set_zone_attributes_writes_three_variables() {
        let def = definition(&test_identity());
        let mut store = def.registry().instantiate();

        def.actions()
            .dispatch(
                &request(
                    "SetZoneAttributes",
                    &[
                        ("DesiredZoneName", "Kitchen"),
                        ("DesiredIcon", "x-rincon-roomicon:kitchen"),
                        ("DesiredConfiguration", "2"),
                    ],
                ),
                &mut store,
            )
            .unwrap();

        assert!(store.take_pending());
        assert_eq!(store.get(ZONE_NAME).unwrap(), "Kitchen");
        assert_eq!(store.get(ICON).unwrap(), "x-rincon-roomicon:kitchen");
        assert_eq!(store.get(CONFIGURATION).unwrap(), "2");

        let (_, fields) = def
            .actions()
            .dispatch(&request("GetZoneAttributes", &[]), &mut store)
            .unwrap();
        assert_eq!(fields[0].value, "Kitchen");
    }

    #[test]
    fn test_set_zone_attributes_requires_all_arguments() {
        let def = definition(&test_identity());
        let mut store = def.registry().instantiate();

        let err = def
            .actions()
            .dispatch(
                &request("SetZoneAttributes", &[("DesiredZoneName", "Kitchen")]),
                &mut store,
            )
            .unwrap_err();
        assert!(matches!(err, ActionError::InvalidArgs(_)));
        assert_eq!(store.get(ZONE_NAME).unwrap(), "Bathroom");
    }
}
