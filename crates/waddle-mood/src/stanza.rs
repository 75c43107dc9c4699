// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2025 Waddle Social

//! Stanza construction for mood publishing, and classification of the
//! server's answer.
//!
//! Both halves are pure functions over `minidom::Element`, so they can be
//! tested without a connection.

use minidom::Element;
use tracing::debug;

use crate::mood::{MoodPublication, NS_MOOD};

/// Client stream namespace.
pub const NS_CLIENT: &str = "jabber:client";

/// PubSub namespace (XEP-0060).
pub const NS_PUBSUB: &str = "http://jabber.org/protocol/pubsub";

/// Stanza error conditions (RFC 6120 §8.3.3).
pub const NS_STANZAS: &str = "urn:ietf:params:xml:ns:xmpp-stanzas";

/// Request id used when the caller does not assign one.
pub const MOOD_REQUEST_ID: &str = "mood1";

/// How the server answered a publish request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishStatus {
    /// `type="result"`.
    Success,
    /// `type="error"`, with the defined condition if the server sent one.
    ProtocolError { condition: Option<String> },
    /// Any other IQ type, or none at all.
    Unknown { type_: Option<String> },
}

impl PublishStatus {
    /// Whether the server accepted the publish.
    pub fn is_success(&self) -> bool {
        matches!(self, PublishStatus::Success)
    }

    /// Numeric status: 0 for success, 1 otherwise.
    pub fn code(&self) -> i32 {
        match self {
            PublishStatus::Success => 0,
            PublishStatus::ProtocolError { .. } | PublishStatus::Unknown { .. } => 1,
        }
    }
}

/// Build the PubSub publish IQ for `publication` with the default id.
pub fn build(publication: &MoodPublication) -> Element {
    build_with_id(publication, MOOD_REQUEST_ID)
}

/// Build the PubSub publish IQ for `publication` with request id `id`.
///
/// The IQ has no `to`, so the account's own PEP service receives it. The
/// `<item>` carries no id; the server assigns one.
pub fn build_with_id(publication: &MoodPublication, id: &str) -> Element {
    let mut mood = Element::builder("mood", NS_MOOD)
        .append(Element::builder(publication.mood.as_str(), NS_MOOD).build());

    if let Some(text) = publication.text.as_deref().filter(|t| !t.is_empty()) {
        mood = mood.append(
            Element::builder("text", NS_MOOD)
                .append(text.to_string())
                .build(),
        );
    }

    let item = Element::builder("item", NS_PUBSUB).append(mood.build()).build();

    let publish = Element::builder("publish", NS_PUBSUB)
        .attr("node", NS_MOOD)
        .append(item)
        .build();

    let pubsub = Element::builder("pubsub", NS_PUBSUB).append(publish).build();

    Element::builder("iq", NS_CLIENT)
        .attr("type", "set")
        .attr("id", id)
        .append(pubsub)
        .build()
}

/// Whether `elem` is the answer to the IQ with request id `id`.
///
/// Only `result` and `error` IQs are answers; a server-initiated `get` or
/// `set` that reuses the id is not.
pub fn is_response_to(elem: &Element, id: &str) -> bool {
    elem.is("iq", NS_CLIENT)
        && elem.attr("id") == Some(id)
        && matches!(elem.attr("type"), Some("result" | "error"))
}

/// Classify the server's answer to a publish request.
pub fn classify_response(elem: &Element) -> PublishStatus {
    match elem.attr("type") {
        Some("result") => PublishStatus::Success,
        Some("error") => {
            let condition = elem
                .children()
                .find(|c| c.name() == "error")
                .and_then(|error| error.children().find(|c| c.ns() == NS_STANZAS))
                .map(|c| c.name().to_string());
            debug!("Publish rejected: {:?}", condition);
            PublishStatus::ProtocolError { condition }
        }
        other => PublishStatus::Unknown {
            type_: other.map(str::to_string),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mood::Mood;

    fn publication(mood: &str, text: Option<&str>) -> MoodPublication {
        let publication = MoodPublication::new(Mood::parse(mood).unwrap());
        match text {
            Some(text) => publication.with_text(text),
            None => publication,
        }
    }

    fn mood_element(iq: &Element) -> &Element {
        iq.get_child("pubsub", NS_PUBSUB)
            .and_then(|p| p.get_child("publish", NS_PUBSUB))
            .and_then(|p| p.get_child("item", NS_PUBSUB))
            .and_then(|i| i.get_child("mood", NS_MOOD))
            .expect("mood element")
    }

    #[test]
    fn build_iq_envelope() {
        let iq = build(&publication("happy", None));
        assert!(iq.is("iq", NS_CLIENT));
        assert_eq!(iq.attr("type"), Some("set"));
        assert_eq!(iq.attr("id"), Some("mood1"));
        assert_eq!(iq.attr("to"), None);

        let publish = iq
            .get_child("pubsub", NS_PUBSUB)
            .and_then(|p| p.get_child("publish", NS_PUBSUB))
            .unwrap();
        assert_eq!(publish.attr("node"), Some(NS_MOOD));

        let item = publish.get_child("item", NS_PUBSUB).unwrap();
        assert_eq!(item.attr("id"), None);
    }

    #[test]
    fn build_without_text() {
        let iq = build(&publication("happy", None));
        let mood = mood_element(&iq);
        let children: Vec<_> = mood.children().collect();
        assert_eq!(children.len(), 1);
        assert!(children[0].is("happy", NS_MOOD));
        assert!(children[0].children().next().is_none());
        assert_eq!(children[0].text(), "");
        assert!(mood.get_child("text", NS_MOOD).is_none());
    }

    #[test]
    fn build_with_text() {
        let iq = build(&publication("happy", Some("great day")));
        let mood = mood_element(&iq);
        let names: Vec<_> = mood.children().map(|c| c.name().to_string()).collect();
        assert_eq!(names, vec!["happy", "text"]);
        assert_eq!(mood.get_child("text", NS_MOOD).unwrap().text(), "great day");
    }

    #[test]
    fn build_uses_canonical_token() {
        let iq = build(&publication("In_Awe", None));
        assert!(mood_element(&iq).get_child("in_awe", NS_MOOD).is_some());
    }

    #[test]
    fn build_escapes_text() {
        let iq = build(&publication("calm", Some("<b>&</b>")));
        let xml = String::from(&iq);
        assert!(!xml.contains("<b>"));
        let parsed: Element = xml.parse().unwrap();
        assert_eq!(mood_element(&parsed).get_child("text", NS_MOOD).unwrap().text(), "<b>&</b>");
    }

    #[test]
    fn build_with_custom_id() {
        let iq = build_with_id(&publication("sad", None), "abc");
        assert_eq!(iq.attr("id"), Some("abc"));
    }

    #[test]
    fn classify_result() {
        let elem: Element = "<iq xmlns='jabber:client' type='result' id='mood1'/>"
            .parse()
            .unwrap();
        assert_eq!(classify_response(&elem), PublishStatus::Success);
        assert_eq!(classify_response(&elem).code(), 0);
    }

    #[test]
    fn classify_error_with_condition() {
        let elem: Element = "<iq xmlns='jabber:client' type='error' id='mood1'>\
                <error type='cancel'>\
                    <feature-not-implemented xmlns='urn:ietf:params:xml:ns:xmpp-stanzas'/>\
                </error>\
            </iq>"
            .parse()
            .unwrap();
        let status = classify_response(&elem);
        assert_eq!(
            status,
            PublishStatus::ProtocolError {
                condition: Some("feature-not-implemented".into())
            }
        );
        assert_eq!(status.code(), 1);
    }

    #[test]
    fn classify_error_without_condition() {
        let elem: Element = "<iq xmlns='jabber:client' type='error' id='mood1'/>"
            .parse()
            .unwrap();
        assert_eq!(
            classify_response(&elem),
            PublishStatus::ProtocolError { condition: None }
        );
    }

    #[test]
    fn classify_unexpected_type() {
        let elem: Element = "<iq xmlns='jabber:client' type='get' id='mood1'/>"
            .parse()
            .unwrap();
        let status = classify_response(&elem);
        assert_eq!(
            status,
            PublishStatus::Unknown {
                type_: Some("get".into())
            }
        );
        assert!(!status.is_success());
        assert_eq!(status.code(), 1);
    }

    #[test]
    fn response_correlation() {
        let result: Element = "<iq xmlns='jabber:client' type='result' id='mood1'/>"
            .parse()
            .unwrap();
        let other: Element = "<iq xmlns='jabber:client' type='result' id='roster'/>"
            .parse()
            .unwrap();
        let error: Element = "<iq xmlns='jabber:client' type='error' id='mood1'/>"
            .parse()
            .unwrap();
        let server_request: Element = "<iq xmlns='jabber:client' type='get' id='mood1'/>"
            .parse()
            .unwrap();
        let server_push: Element = "<iq xmlns='jabber:client' type='set' id='mood1'/>"
            .parse()
            .unwrap();
        let message: Element = "<message xmlns='jabber:client' id='mood1'/>"
            .parse()
            .unwrap();

        assert!(is_response_to(&result, "mood1"));
        assert!(!is_response_to(&other, "mood1"));
        assert!(is_response_to(&error, "mood1"));
        assert!(!is_response_to(&server_request, "mood1"));
        assert!(!is_response_to(&server_push, "mood1"));
        assert!(!is_response_to(&message, "mood1"));
    }
}
