use chrono::Utc;
use prost::Message;
use relay_protocol::proto::{WebhookEvent, WebhookEventHeader};
use relay_protocol::{sign, verify_signature, CanonicalEvent, HeaderPair};

#[test]
fn canonical_event_survives_a_protobuf_byte_round_trip() {
    let now = Utc::now();
    let original = CanonicalEvent::new(
        "d1".to_owned(),
        br#"{"x":1}"#.to_vec(),
        vec![HeaderPair { name: "X-Github-Delivery".to_owned(), value: "d1".to_owned() }],
        now,
    );

    let wire = original.to_wire();
    let mut encoded = Vec::new();
    wire.encode(&mut encoded).unwrap();

    let decoded = WebhookEvent::decode(encoded.as_slice()).unwrap();
    let round_tripped = CanonicalEvent::from_wire(decoded, now);

    assert_eq!(round_tripped.event_id, original.event_id);
    assert_eq!(round_tripped.body, original.body);
    assert_eq!(round_tripped.headers, original.headers);
}

#[test]
fn an_empty_header_list_decodes_back_to_an_empty_vec() {
    let wire = WebhookEvent { event_id: "d2".to_owned(), body: vec![], headers: Vec::<WebhookEventHeader>::new() };
    let mut encoded = Vec::new();
    wire.encode(&mut encoded).unwrap();
    let decoded = WebhookEvent::decode(encoded.as_slice()).unwrap();
    assert!(decoded.headers.is_empty());
}

#[test]
fn a_signature_computed_here_verifies_after_crossing_the_wire() {
    let secret = b"shared-secret";
    let body = br#"{"ref":"refs/heads/main"}"#;
    let signature = sign(secret, body);

    let wire = WebhookEvent {
        event_id: "d3".to_owned(),
        body: body.to_vec(),
        headers: vec![WebhookEventHeader { name: "X-Hub-Signature-256".to_owned(), value: signature }],
    };
    let mut encoded = Vec::new();
    wire.encode(&mut encoded).unwrap();
    let decoded = WebhookEvent::decode(encoded.as_slice()).unwrap();

    let received_signature = &decoded.headers.iter().find(|h| h.name == "X-Hub-Signature-256").unwrap().value;
    assert!(verify_signature(secret, &decoded.body, received_signature).is_ok());
}
