//! # zpplayer - le ZonePlayer émulé
//!
//! Assemble le moteur UPnP de `zpupnp` en un lecteur Sonos crédible :
//!
//! - [`ZoneIdentity`] : adresse, MAC, nom de zone, versions annoncées
//! - [`services`] : les huit services Sonos et leurs valeurs par défaut
//! - [`ZonePlayer`] : device racine et devices embarqués (MediaServer,
//!   MediaRenderer), annonce SSDP
//! - [`MediaTransport`] : processus de diffusion piloté par AudioIn

pub mod device;
pub mod identity;
pub mod services;
pub mod transport;

pub use device::ZonePlayer;
pub use identity::ZoneIdentity;
pub use transport::{MediaTransport, TransportError};
