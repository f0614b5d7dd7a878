//! # zpupnp - moteur de services UPnP
//!
//! Contrôle SOAP, variables d'état évènementielles et abonnements GENA,
//! plus les annonces SSDP et la description de device.
//!
//! ```text
//! POST /{service}/Control ─► soap::decode_action ─► actions::ActionTable
//!                                                      │
//!                               state_variables::VariableStore (set)
//!                                                      │
//!                         fin d'étape : events::build_propertyset
//!                                                      │
//!               subscriptions::Subscription::enqueue ─► NOTIFY (SEQ n)
//! ```

pub mod actions;
pub mod devices;
pub mod events;
pub mod services;
pub mod soap;
pub mod ssdp;
pub mod state_variables;
pub mod subscriptions;
pub mod upnp_server;
pub mod xml_utils;

pub use crate::upnp_server::UpnpServer;
