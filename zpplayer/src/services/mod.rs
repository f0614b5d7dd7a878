//! # Services du ZonePlayer
//!
//! Un module par service Sonos, chacun exposant `definition(...)` qui
//! construit le [`ServiceDefinition`](zpupnp::services::ServiceDefinition)
//! correspondant : variables, valeurs par défaut et actions.
//!
//! | Service           | Chemin                            |
//! |-------------------|-----------------------------------|
//! | DeviceProperties  | `/DeviceProperties`               |
//! | GroupManagement   | `/GroupManagement`                |
//! | ZoneGroupTopology | `/ZoneGroupTopology`              |
//! | AudioIn           | `/AudioIn`                        |
//! | ContentDirectory  | `/MediaServer/ContentDirectory`   |
//! | AVTransport       | `/MediaRenderer/AVTransport`      |
//! | RenderingControl  | `/MediaRenderer/RenderingControl` |
//! | Queue             | `/MediaRenderer/Queue`            |

pub mod audio_in;
pub mod av_transport;
pub mod content_directory;
pub mod device_properties;
pub mod group_management;
pub mod queue;
pub mod rendering_control;
pub mod zone_group_topology;

use xmltree::{Element, EmitterConfig};

/// Fragment XML sans déclaration, tel qu'embarqué dans une variable ou un
/// argument de réponse.
pub(crate) fn fragment(elem: &Element) -> Result<String, xmltree::Error> {
    let config = EmitterConfig::new()
        .perform_indent(false)
        .write_document_declaration(false);

    let mut buf = Vec::new();
    elem.write_with_config(&mut buf, config)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
