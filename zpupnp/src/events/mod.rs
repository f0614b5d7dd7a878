//! # Évènements GENA
//!
//! Construction du document `e:propertyset` et livraison des NOTIFY.
//!
//! Chaque abonnement possède sa file bornée, vidée par une tâche dédiée
//! ([`spawn_delivery_worker`]) : les notifications d'un abonné partent dans
//! l'ordre des SEQ, les abonnés sont indépendants les uns des autres. Une
//! livraison ratée est journalisée, jamais retentée.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc::Receiver;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;
use xmltree::{Element, XMLNode};

/// Namespace des documents d'évènements UPnP
pub const EVENT_NS: &str = "urn:schemas-upnp-org:event-1-0";

/// Une notification prête à partir
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// SID sans le préfixe `uuid:`
    pub sid: String,
    pub seq: u32,
    pub callback: Url,
    pub body: Arc<str>,
}

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("subscriber answered {0}")]
    Status(u16),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Other(String),
}

/// Canal de sortie des NOTIFY
#[async_trait]
pub trait EventTransport: Send + Sync {
    async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError>;
}

/// Transport HTTP : une requête `NOTIFY` par notification.
#[derive(Debug, Clone)]
pub struct HttpEventTransport {
    client: reqwest::Client,
}

impl HttpEventTransport {
    /// Client sans proxy : les callbacks sont sur le réseau local.
    pub fn new() -> Self {
        match reqwest::Client::builder().no_proxy().build() {
            Ok(client) => Self { client },
            Err(e) => {
                warn!("⚠️ Cannot build NOTIFY client ({}), using defaults", e);
                Self {
                    client: reqwest::Client::new(),
                }
            }
        }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EventTransport for HttpEventTransport {
    async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError> {
        let method = reqwest::Method::from_bytes(b"NOTIFY")
            .map_err(|e| DeliveryError::Other(e.to_string()))?;

        let response = self
            .client
            .request(method, notification.callback.clone())
            .header("CONTENT-TYPE", r#"text/xml; charset="utf-8""#)
            .header("NT", "upnp:event")
            .header("NTS", "upnp:propchange")
            .header("SID", format!("uuid:{}", notification.sid))
            .header("SEQ", notification.seq.to_string())
            .body(notification.body.to_string())
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(DeliveryError::Status(status.as_u16()))
        }
    }
}

/// Construit le document d'évènement à partir des valeurs courantes.
///
/// Retourne `None` quand il n'y a rien à publier.
pub fn build_propertyset(values: &[(&str, &str)]) -> Result<Option<String>, xmltree::Error> {
    if values.is_empty() {
        return Ok(None);
    }

    let mut root = Element::new("e:propertyset");
    root.attributes
        .insert("xmlns:e".to_string(), EVENT_NS.to_string());

    for (name, value) in values {
        let mut variable = Element::new(name);
        variable.children.push(XMLNode::Text(value.to_string()));

        let mut property = Element::new("e:property");
        property.children.push(XMLNode::Element(variable));
        root.children.push(XMLNode::Element(property));
    }

    let mut buf = Vec::new();
    let config = xmltree::EmitterConfig::new()
        .write_document_declaration(true)
        .perform_indent(false);
    root.write_with_config(&mut buf, config)?;

    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

/// Vide la file d'un abonné, une livraison à la fois.
///
/// La tâche se termine quand l'émetteur est fermé (désabonnement ou
/// expiration) et que la file est vide.
pub fn spawn_delivery_worker(
    transport: Arc<dyn EventTransport>,
    timeout: Duration,
    mut rx: Receiver<Notification>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(notification) = rx.recv().await {
            let result = match tokio::time::timeout(timeout, transport.deliver(&notification)).await
            {
                Ok(result) => result,
                Err(_) => Err(DeliveryError::Timeout(timeout)),
            };

            match result {
                Ok(()) => debug!(
                    "📡 NOTIFY sid={} seq={} delivered to {}",
                    notification.sid, notification.seq, notification.callback
                ),
                Err(e) => warn!(
                    "❌ NOTIFY sid={} seq={} to {} failed: {}",
                    notification.sid, notification.seq, notification.callback, e
                ),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use tokio::sync::mpsc;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<u32>>,
    }

    #[async_trait]
    impl EventTransport for Recorder {
        async fn deliver(&self, n: &Notification) -> Result<(), DeliveryError> {
            self.seen.lock().push(n.seq);
            if n.seq == 1 {
                return Err(DeliveryError::Status(500));
            }
            Ok(())
        }
    }

    struct Stalled;

    #[async_trait]
    impl EventTransport for Stalled {
        async fn deliver(&self, _: &Notification) -> Result<(), DeliveryError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
    }

    fn notification(seq: u32) -> Notification {
        Notification {
            sid: "RINCON_0001_sub0000000000".into(),
            seq,
            callback: Url::parse("http://127.0.0.1:9/cb").unwrap(),
            body: Arc::from("<e:propertyset/>"),
        }
    }

    #[test]
    fn test_propertyset_layout() {
        let xml = build_propertyset(&[("ZoneName", "Kitchen"), ("Invisible", "0")])
            .unwrap()
            .unwrap();

        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains(r#"<e:propertyset xmlns:e="urn:schemas-upnp-org:event-1-0">"#));
        assert!(xml.contains("<e:property><ZoneName>Kitchen</ZoneName></e:property>"));
        let zone = xml.find("ZoneName").unwrap();
        let invisible = xml.find("Invisible").unwrap();
        assert!(zone < invisible);
    }

    #[test]
    fn test_propertyset_escapes_values() {
        let xml = build_propertyset(&[("ZoneGroupState", "<ZoneGroups/>")])
            .unwrap()
            .unwrap();
        assert!(xml.contains("&lt;ZoneGroups/>") || xml.contains("&lt;ZoneGroups/&gt;"));
    }

    #[test]
    fn test_empty_propertyset() {
        assert_eq!(build_propertyset(&[]).unwrap(), None);
    }

    #[tokio::test]
    async fn test_worker_delivers_in_order_despite_failures() {
        let recorder = Arc::new(Recorder::default());
        let (tx, rx) = mpsc::channel(8);
        let worker = spawn_delivery_worker(recorder.clone(), Duration::from_secs(1), rx);

        for seq in 0..4 {
            tx.send(notification(seq)).await.unwrap();
        }
        drop(tx);
        worker.await.unwrap();

        assert_eq!(*recorder.seen.lock(), vec![0, 1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_worker_times_out_stalled_delivery() {
        let (tx, rx) = mpsc::channel(8);
        let worker = spawn_delivery_worker(Arc::new(Stalled), Duration::from_millis(50), rx);

        tx.send(notification(0)).await.unwrap();
        tx.send(notification(1)).await.unwrap();
        drop(tx);

        tokio::time::timeout(Duration::from_secs(1), worker)
            .await
            .unwrap()
            .unwrap();
    }
}
