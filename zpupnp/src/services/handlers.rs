//! Routes axum d'un service

use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{any, get, post},
};
use tracing::{debug, error, info};

use super::ServiceInstance;
use crate::subscriptions::GenaRequest;

const XML_CONTENT_TYPE: &str = r#"text/xml; charset="utf-8""#;

impl ServiceInstance {
    /// Routes du service : contrôle, évènements et SCPD.
    pub fn router(self: &Arc<Self>) -> Router {
        let def = self.definition();
        Router::new()
            .route(&def.control_url(), post(control_handler))
            .route(&def.event_url(), any(event_handler))
            .route(&def.scpd_url(), get(scpd_handler))
            .with_state(self.clone())
    }
}

async fn control_handler(State(instance): State<Arc<ServiceInstance>>, body: Bytes) -> Response {
    info!("📡 Control request for {}", instance.name());

    let response = instance.handle_control(&body);
    (
        response.status,
        [(header::CONTENT_TYPE, XML_CONTENT_TYPE)],
        response.body,
    )
        .into_response()
}

fn gena_headers(sid: &str, granted: u64) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let mut put = |name: &'static str, value: String| match HeaderValue::from_str(&value) {
        Ok(v) => {
            headers.insert(HeaderName::from_static(name), v);
        }
        Err(e) => error!("❌ Invalid {} header value {}: {}", name, value, e),
    };
    put("sid", format!("uuid:{}", sid));
    put("timeout", format!("Second-{}", granted));
    headers
}

async fn event_handler(
    State(instance): State<Arc<ServiceInstance>>,
    method: Method,
    headers: HeaderMap,
) -> Response {
    info!("📡 {} request for {}", method, instance.name());

    let request = match GenaRequest::from_parts(&method, &headers) {
        Ok(request) => request,
        Err(e) => {
            debug!("❌ {} on {} rejected: {}", method, instance.name(), e);
            return e.status().into_response();
        }
    };

    let result = match request {
        GenaRequest::Subscribe { callback, timeout } => {
            let (sid, granted) = instance.subscribe(callback, timeout);
            Ok(gena_headers(&sid, granted))
        }
        GenaRequest::Renew { sid, timeout } => instance
            .renew(&sid, timeout)
            .map(|granted| gena_headers(&sid, granted)),
        GenaRequest::Unsubscribe { sid } => instance.unsubscribe(&sid).map(|()| HeaderMap::new()),
    };

    match result {
        Ok(headers) => (StatusCode::OK, headers).into_response(),
        Err(e) => {
            debug!("❌ {} on {} rejected: {}", method, instance.name(), e);
            e.status().into_response()
        }
    }
}

async fn scpd_handler(State(instance): State<Arc<ServiceInstance>>) -> Response {
    match instance.scpd_xml() {
        Ok(xml) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, XML_CONTENT_TYPE)],
            xml,
        )
            .into_response(),
        Err(e) => {
            error!("❌ Failed to serialize SCPD for {}: {}", instance.name(), e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
