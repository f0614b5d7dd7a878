use std::sync::Arc;

use axum::http::StatusCode;
use chrono::Utc;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};
use url::Url;

use super::{ServiceDefinition, ServiceError};
use crate::events::build_propertyset;
use crate::soap::{SoapFault, decode_action, encode_response, error_codes};
use crate::state_variables::{StateVariableError, VariableStore};
use crate::subscriptions::{SubscriptionError, SubscriptionManager, SubscriptionSet};

/// Réponse HTTP d'une requête de contrôle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ControlResponse {
    fn fault(status: StatusCode, fault: &SoapFault) -> Self {
        match fault.to_xml() {
            Ok(body) => Self { status, body },
            Err(e) => {
                error!("❌ Failed to encode SOAP fault {}: {}", fault.code, e);
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    body: String::new(),
                }
            }
        }
    }
}

struct ServiceState {
    store: VariableStore,
    subscriptions: SubscriptionSet,
}

/// Instance vivante d'un service
pub struct ServiceInstance {
    definition: Arc<ServiceDefinition>,
    manager: Arc<SubscriptionManager>,
    state: Mutex<ServiceState>,
}

impl std::fmt::Debug for ServiceInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceInstance")
            .field("name", &self.definition.name())
            .field("path", &self.definition.base_path())
            .finish_non_exhaustive()
    }
}

impl ServiceInstance {
    pub fn new(definition: ServiceDefinition, manager: Arc<SubscriptionManager>) -> Arc<Self> {
        let store = definition.registry().instantiate();
        Arc::new(Self {
            definition: Arc::new(definition),
            manager,
            state: Mutex::new(ServiceState {
                store,
                subscriptions: SubscriptionSet::new(),
            }),
        })
    }

    pub fn name(&self) -> &str {
        self.definition.name()
    }

    pub fn definition(&self) -> &ServiceDefinition {
        &self.definition
    }

    /// Valeur courante d'une variable
    pub fn get(&self, name: &str) -> Result<String, StateVariableError> {
        self.state.lock().store.get(name).map(str::to_string)
    }

    /// Exécute une étape d'écriture hors requête de contrôle.
    ///
    /// Les écritures évènementielles de la closure donnent au plus un envoi,
    /// fait au retour de la closure, même en cas d'erreur.
    pub fn update<F, R>(&self, f: F) -> Result<R, ServiceError>
    where
        F: FnOnce(&mut VariableStore) -> Result<R, StateVariableError>,
    {
        let mut state = self.state.lock();
        let result = f(&mut state.store);
        self.flush_events(&mut state);
        Ok(result?)
    }

    /// Traite un corps SOAP de contrôle.
    ///
    /// - enveloppe illisible : 400 + fault 401
    /// - erreur UPnP : 500 + fault
    /// - succès : 200 + réponse SOAP
    pub fn handle_control(&self, body: &[u8]) -> ControlResponse {
        let request = match decode_action(body) {
            Ok(request) => request,
            Err(e) => {
                warn!("❌ Malformed SOAP request on {}: {}", self.name(), e);
                return ControlResponse::fault(
                    StatusCode::BAD_REQUEST,
                    &SoapFault::new(error_codes::INVALID_ACTION),
                );
            }
        };

        debug!(
            "🎬 {}::{} args={:?}",
            self.name(),
            request.name,
            request.args
        );

        let result = {
            let mut state = self.state.lock();
            let result = self
                .definition
                .actions()
                .dispatch(&request, &mut state.store)
                .map(|(name, fields)| (name.to_string(), fields));
            self.flush_events(&mut state);
            result
        };

        let fault = match result {
            Ok((action, fields)) => {
                match encode_response(self.definition.urn(), &action, &fields) {
                    Ok(body) => {
                        return ControlResponse {
                            status: StatusCode::OK,
                            body,
                        };
                    }
                    Err(e) => {
                        error!("❌ Failed to encode {} response: {}", action, e);
                        SoapFault::new(error_codes::ACTION_FAILED)
                    }
                }
            }
            Err(e) => {
                warn!("❌ {}::{} failed: {}", self.name(), request.name, e);
                e.to_fault()
            }
        };

        ControlResponse::fault(StatusCode::INTERNAL_SERVER_ERROR, &fault)
    }

    /// Nouvel abonnement : retourne le SID et la durée accordée.
    ///
    /// L'état évènementiel complet part immédiatement avec `SEQ: 0`.
    pub fn subscribe(&self, callback: Url, requested: Option<u64>) -> (String, u64) {
        let granted = self.manager.grant_timeout(requested);
        let now = Utc::now();

        let mut state = self.state.lock();
        state.subscriptions.sweep_expired(now);

        let initial = self.current_propertyset(&state.store);
        let subscription = self
            .manager
            .open(self.definition.name(), callback, granted, now);
        let subscription = state.subscriptions.insert(subscription);
        if let Some(body) = initial {
            subscription.enqueue(body);
        }

        info!(
            "🔒 New subscription {} on {} -> {} ({}s)",
            subscription.id(),
            self.name(),
            subscription.callback(),
            granted
        );
        (subscription.id().to_string(), granted)
    }

    /// Renouvelle un abonnement : retourne la durée accordée.
    pub fn renew(&self, sid: &str, requested: Option<u64>) -> Result<u64, SubscriptionError> {
        let granted = self.manager.grant_timeout(requested);
        self.state
            .lock()
            .subscriptions
            .renew(sid, granted, Utc::now())?;
        info!("♻️ Renewed subscription {} on {} ({}s)", sid, self.name(), granted);
        Ok(granted)
    }

    pub fn unsubscribe(&self, sid: &str) -> Result<(), SubscriptionError> {
        let mut state = self.state.lock();
        state.subscriptions.sweep_expired(Utc::now());
        state.subscriptions.remove(sid)?;
        info!("👋 Unsubscribed {} from {}", sid, self.name());
        Ok(())
    }

    pub fn sweep_expired(&self) -> usize {
        self.state.lock().subscriptions.sweep_expired(Utc::now())
    }

    pub fn subscription_count(&self) -> usize {
        self.state.lock().subscriptions.len()
    }

    fn current_propertyset(&self, store: &VariableStore) -> Option<Arc<str>> {
        match build_propertyset(&store.evented_values()) {
            Ok(body) => body.map(Arc::from),
            Err(e) => {
                error!("❌ Failed to build event body for {}: {}", self.name(), e);
                None
            }
        }
    }

    /// Envoie l'état évènementiel courant si le drapeau est levé.
    fn flush_events(&self, state: &mut ServiceState) {
        if !state.store.take_pending() {
            return;
        }

        let Some(body) = self.current_propertyset(&state.store) else {
            return;
        };

        let now = Utc::now();
        state.subscriptions.sweep_expired(now);
        for subscription in state.subscriptions.live_mut(now) {
            let seq = subscription.enqueue(body.clone());
            debug!("📡 Event {} seq={} queued", subscription.id(), seq);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{Action, ActionError};
    use crate::events::{DeliveryError, EventTransport, Notification};
    use crate::soap::ResultField;
    use crate::state_variables::VariableRegistry;
    use async_trait::async_trait;
    use std::time::Duration;

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<Notification>>,
    }

    #[async_trait]
    impl EventTransport for Recorder {
        async fn deliver(&self, n: &Notification) -> Result<(), DeliveryError> {
            self.sent.lock().push(n.clone());
            Ok(())
        }
    }

    impl Recorder {
        async fn wait_for(&self, count: usize) -> Vec<Notification> {
            for _ in 0..200 {
                if self.sent.lock().len() >= count {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            self.sent.lock().clone()
        }
    }

    fn envelope(action: &str, args: &str) -> String {
        format!(
            r#"<?xml version="1.0"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/">
  <s:Body><u:{action} xmlns:u="urn:schemas-upnp-org:service:AudioIn:1">{args}</u:{action}></s:Body>
</s:Envelope>"#
        )
    }

    fn service(recorder: Arc<Recorder>) -> Arc<ServiceInstance> {
        let manager = Arc::new(SubscriptionManager::new("RINCON_000E58000001400", recorder));
        let definition = ServiceDefinition::new("AudioIn")
            .variables(
                VariableRegistry::new()
                    .evented("AudioInputName", "SonosCast")
                    .evented("LineInConnected", "1")
                    .variable("TransportState", "STOPPED"),
            )
            .action(
                Action::new("SetAudioInputAttributes", |ctx| {
                    let name = ctx.text("DesiredName")?;
                    ctx.set("AudioInputName", name)?;
                    ctx.set("LineInConnected", "0")?;
                    Ok(Vec::new())
                })
                .with_arguments(&["DesiredName"]),
            )
            .action(Action::new("Play", |ctx| {
                ctx.set("TransportState", "PLAYING")?;
                Ok(vec![ResultField::new("State", ctx.get("TransportState")?)])
            }))
            .action(Action::new("Broken", |ctx| {
                ctx.set("AudioInputName", "half-done")?;
                Err(ActionError::failed("boom"))
            }));
        ServiceInstance::new(definition, manager)
    }

    fn callback() -> Url {
        Url::parse("http://127.0.0.1:3400/notify").unwrap()
    }

    #[tokio::test]
    async fn test_initial_event_has_evented_defaults_only() {
        let recorder = Arc::new(Recorder::default());
        let service = service(recorder.clone());

        let (sid, granted) = service.subscribe(callback(), None);
        assert_eq!(sid, "RINCON_000E58000001400_sub0000000000");
        assert_eq!(granted, 3600);

        let sent = recorder.wait_for(1).await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].seq, 0);
        assert_eq!(sent[0].sid, sid);
        assert!(sent[0].body.contains("<AudioInputName>SonosCast</AudioInputName>"));
        assert!(sent[0].body.contains("<LineInConnected>1</LineInConnected>"));
        assert!(!sent[0].body.contains("TransportState"));
    }

    #[tokio::test]
    async fn test_multiple_writes_coalesce_into_one_event() {
        let recorder = Arc::new(Recorder::default());
        let service = service(recorder.clone());
        service.subscribe(callback(), None);

        let response = service.handle_control(
            envelope("SetAudioInputAttributes", "<DesiredName>Turntable</DesiredName>").as_bytes(),
        );
        assert_eq!(response.status, StatusCode::OK);
        assert!(response.body.contains("SetAudioInputAttributesResponse"));

        let sent = recorder.wait_for(2).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        let sent_later = recorder.sent.lock().clone();
        assert_eq!(sent_later.len(), 2, "{:?}", sent);
        assert_eq!(sent_later[1].seq, 1);
        assert!(sent_later[1].body.contains("<AudioInputName>Turntable</AudioInputName>"));
        assert!(sent_later[1].body.contains("<LineInConnected>0</LineInConnected>"));
    }

    #[tokio::test]
    async fn test_non_evented_write_sends_nothing() {
        let recorder = Arc::new(Recorder::default());
        let service = service(recorder.clone());
        service.subscribe(callback(), None);
        recorder.wait_for(1).await;

        let response = service.handle_control(envelope("Play", "").as_bytes());
        assert_eq!(response.status, StatusCode::OK);
        assert!(response.body.contains("<State>PLAYING</State>"));

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(recorder.sent.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_handler_still_flushes() {
        let recorder = Arc::new(Recorder::default());
        let service = service(recorder.clone());
        service.subscribe(callback(), None);

        let response = service.handle_control(envelope("Broken", "").as_bytes());
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.body.contains("<errorCode>501</errorCode>"));
        assert!(response.body.contains("<errorDescription>Action Failed</errorDescription>"));

        let sent = recorder.wait_for(2).await;
        assert_eq!(sent.len(), 2);
        assert!(sent[1].body.contains("half-done"));
    }

    #[tokio::test]
    async fn test_control_errors() {
        let service = service(Arc::new(Recorder::default()));

        let response = service.handle_control(b"not xml");
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert!(response.body.contains("<errorCode>401</errorCode>"));

        let response = service.handle_control(envelope("Rewind", "").as_bytes());
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.body.contains("<errorDescription>Invalid Action</errorDescription>"));

        let response = service.handle_control(envelope("SetAudioInputAttributes", "").as_bytes());
        assert!(response.body.contains("<errorCode>402</errorCode>"));
    }

    #[tokio::test]
    async fn test_update_and_sequence() {
        let recorder = Arc::new(Recorder::default());
        let service = service(recorder.clone());
        service.subscribe(callback(), None);

        for i in 0..3 {
            service
                .update(|store| store.set("LineInConnected", i.to_string()))
                .unwrap();
        }
        assert!(service.update(|store| store.set("Nope", "x")).is_err());

        let sent = recorder.wait_for(4).await;
        let seqs: Vec<u32> = sent.iter().map(|n| n.seq).collect();
        assert_eq!(seqs, vec![0, 1, 2, 3]);
        assert_eq!(service.get("LineInConnected").unwrap(), "2");
    }

    #[tokio::test]
    async fn test_renew_and_unsubscribe() {
        let service = service(Arc::new(Recorder::default()));
        let (sid, _) = service.subscribe(callback(), Some(120));

        assert_eq!(service.renew(&sid, Some(600)).unwrap(), 600);
        assert_eq!(service.renew(&sid, None).unwrap(), 3600);
        assert!(service.renew("RINCON_unknown", None).is_err());

        service.unsubscribe(&sid).unwrap();
        assert!(matches!(
            service.unsubscribe(&sid),
            Err(SubscriptionError::NoSuchSubscription(_))
        ));
        assert_eq!(service.subscription_count(), 0);
    }

    #[tokio::test]
    async fn test_service_without_evented_variables_sends_nothing() {
        let recorder = Arc::new(Recorder::default());
        let manager = Arc::new(SubscriptionManager::new("RINCON_X", recorder.clone()));
        let service = ServiceInstance::new(ServiceDefinition::new("Queue"), manager);

        service.subscribe(callback(), None);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(recorder.sent.lock().is_empty());
    }
}
