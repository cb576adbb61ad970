//! HTTP request and response values exchanged with a `Transport`.
//!
//! # Design
//! Every CRM call is a POST to the same URL, so a request is just the target,
//! its headers, and a JSON body. Responses are captured as plain data and
//! handed back untouched; deciding what a status or body means is left to the
//! caller.

use std::borrow::Cow;

pub(crate) const CONTENT_TYPE_JSON: (&str, &str) = ("content-type", "application/json");

/// A POST request described as plain data.
///
/// Built by `LacrmClient::build_*` methods and executed by a `Transport`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// The remote response: status, headers, and the body bytes as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// True for 2xx statuses.
    ///
    /// DeleteContact reports success with a 500, so this is a hint only.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The body as text. Invalid UTF-8 sequences become U+FFFD.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    #[test]
    fn success_range_is_2xx() {
        assert!(response(200).is_success());
        assert!(response(204).is_success());
        assert!(!response(199).is_success());
        assert!(!response(300).is_success());
        assert!(!response(500).is_success());
    }

    #[test]
    fn text_keeps_valid_utf8_and_replaces_invalid_bytes() {
        let mut ok = response(200);
        ok.body = r#"{"Success":true}"#.as_bytes().to_vec();
        assert_eq!(ok.text(), r#"{"Success":true}"#);

        let mut latin1 = response(500);
        latin1.body = b"Fehler: \xfc\xe4".to_vec();
        assert_eq!(latin1.text(), "Fehler: \u{fffd}\u{fffd}");
        assert_eq!(latin1.body.len(), 10);
    }
}
