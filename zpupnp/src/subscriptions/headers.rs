//! Interprétation des en-têtes SUBSCRIBE / UNSUBSCRIBE

use axum::http::{HeaderMap, Method};
use url::Url;

use super::SubscriptionError;

/// Requête GENA décodée
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenaRequest {
    Subscribe {
        callback: Url,
        timeout: Option<u64>,
    },
    Renew {
        sid: String,
        timeout: Option<u64>,
    },
    Unsubscribe {
        sid: String,
    },
}

impl GenaRequest {
    pub fn from_parts(method: &Method, headers: &HeaderMap) -> Result<Self, SubscriptionError> {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let sid = header("SID").map(parse_sid);
        let nt = header("NT");
        let callback = header("CALLBACK");
        let timeout = header("TIMEOUT").and_then(parse_timeout);

        match method.as_str() {
            "SUBSCRIBE" => match sid {
                Some(_) if nt.is_some() || callback.is_some() => {
                    Err(SubscriptionError::IncompatibleHeaders)
                }
                Some(sid) => Ok(GenaRequest::Renew { sid, timeout }),
                None => {
                    if nt != Some("upnp:event") {
                        return Err(SubscriptionError::InvalidNt(
                            nt.unwrap_or_default().to_string(),
                        ));
                    }
                    let callback = parse_callback(callback.unwrap_or_default())?;
                    Ok(GenaRequest::Subscribe { callback, timeout })
                }
            },
            "UNSUBSCRIBE" => match sid {
                Some(_) if nt.is_some() || callback.is_some() => {
                    Err(SubscriptionError::IncompatibleHeaders)
                }
                Some(sid) => Ok(GenaRequest::Unsubscribe { sid }),
                None => Err(SubscriptionError::MissingSid),
            },
            other => Err(SubscriptionError::MethodNotAllowed(other.to_string())),
        }
    }
}

/// Extrait la première URL `<...>` d'un en-tête CALLBACK.
pub fn parse_callback(header: &str) -> Result<Url, SubscriptionError> {
    let invalid = || SubscriptionError::InvalidCallback(header.to_string());

    let header = header.trim();
    let start = header.find('<').ok_or_else(invalid)?;
    let len = header[start + 1..].find('>').ok_or_else(invalid)?;
    let raw = header[start + 1..start + 1 + len].trim();

    let url = Url::parse(raw).map_err(|_| invalid())?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(invalid()),
    }
}

/// `Second-1800` → `Some(1800)` ; `infinite` ou valeur illisible → `None`.
pub fn parse_timeout(header: &str) -> Option<u64> {
    let value = header.trim();
    let secs = value
        .strip_prefix("Second-")
        .or_else(|| value.strip_prefix("second-"))
        .unwrap_or(value);
    secs.parse().ok()
}

/// Retire le préfixe `uuid:` d'un en-tête SID.
pub fn parse_sid(header: &str) -> String {
    let header = header.trim();
    header.strip_prefix("uuid:").unwrap_or(header).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderName, HeaderValue};

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(
                HeaderName::from_static(k),
                HeaderValue::from_str(v).unwrap(),
            );
        }
        map
    }

    fn subscribe() -> Method {
        Method::from_bytes(b"SUBSCRIBE").unwrap()
    }

    fn unsubscribe() -> Method {
        Method::from_bytes(b"UNSUBSCRIBE").unwrap()
    }

    #[test]
    fn test_new_subscription() {
        let req = GenaRequest::from_parts(
            &subscribe(),
            &headers(&[
                ("nt", "upnp:event"),
                ("callback", "<http://192.168.1.10:3400/notify><http://other/>"),
                ("timeout", "Second-1800"),
            ]),
        )
        .unwrap();

        assert_eq!(
            req,
            GenaRequest::Subscribe {
                callback: Url::parse("http://192.168.1.10:3400/notify").unwrap(),
                timeout: Some(1800),
            }
        );
    }

    #[test]
    fn test_renewal() {
        let req = GenaRequest::from_parts(
            &subscribe(),
            &headers(&[("sid", "uuid:RINCON_X01400_sub0000000004"), ("timeout", "infinite")]),
        )
        .unwrap();
        assert_eq!(
            req,
            GenaRequest::Renew {
                sid: "RINCON_X01400_sub0000000004".into(),
                timeout: None
            }
        );
    }

    #[test]
    fn test_rejections() {
        let err = GenaRequest::from_parts(
            &subscribe(),
            &headers(&[("sid", "uuid:x"), ("nt", "upnp:event")]),
        )
        .unwrap_err();
        assert_eq!(err.status().as_u16(), 400);

        let err = GenaRequest::from_parts(&subscribe(), &headers(&[("nt", "upnp:event")]))
            .unwrap_err();
        assert!(matches!(err, SubscriptionError::InvalidCallback(_)));
        assert_eq!(err.status().as_u16(), 412);

        let err = GenaRequest::from_parts(
            &subscribe(),
            &headers(&[("nt", "ssdp:all"), ("callback", "<http://x/cb>")]),
        )
        .unwrap_err();
        assert_eq!(err.status().as_u16(), 412);

        let err = GenaRequest::from_parts(&unsubscribe(), &HeaderMap::new()).unwrap_err();
        assert_eq!(err, SubscriptionError::MissingSid);
        assert_eq!(err.status().as_u16(), 412);

        let err = GenaRequest::from_parts(&Method::GET, &HeaderMap::new()).unwrap_err();
        assert_eq!(err.status().as_u16(), 405);
    }

    #[test]
    fn test_parse_callback() {
        assert!(parse_callback("http://x/cb").is_err());
        assert!(parse_callback("<ftp://x/cb>").is_err());
        assert!(parse_callback("<not a url>").is_err());
        assert_eq!(
            parse_callback(" < http://x/cb > ").unwrap().as_str(),
            "http://x/cb"
        );
    }

    #[test]
    fn test_parse_timeout() {
        assert_eq!(parse_timeout("Second-300"), Some(300));
        assert_eq!(parse_timeout("Second-infinite"), None);
        assert_eq!(parse_timeout("infinite"), None);
        assert_eq!(parse_timeout("soon"), None);
    }
}
