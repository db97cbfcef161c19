//! Tests for sessions and event delivery

use super::SessionBuilder;
use crate::analytics::MemoryAnalyticsSink;
use crate::hub::Capability;
use crate::test_support::{
    client_token, configuration, credit_card_error_response, get_payment_methods_response,
    visa_credit_card_response, FixedSessionId, MockHttpClient, TOKENIZATION_KEY,
};
use crate::types::{CardBuilder, PaymentMethodNonce};
use crate::{BraintreeError, TOKENIZATION_KEY_NOT_ALLOWED};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(2);

fn visa_card() -> CardBuilder {
    CardBuilder::new()
        .with_number("4111111111111111")
        .with_expiration_date("08/20")
}

async fn wait_until(condition: impl Fn() -> bool) {
    timeout(WAIT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_invalid_authorization_fails_fast() {
    let error = SessionBuilder::new("not an authorization").unwrap_err();
    assert!(matches!(error, BraintreeError::InvalidArgument(_)));
    assert!(error.to_string().starts_with("Authorization provided is invalid"));
}

#[tokio::test]
async fn test_build_requires_configuration() {
    let error = SessionBuilder::new(TOKENIZATION_KEY)
        .unwrap()
        .build()
        .unwrap_err();
    assert!(matches!(error, BraintreeError::Config(_)));
}

#[tokio::test]
async fn test_connect_fetches_configuration() {
    let http = MockHttpClient::new(|request| {
        assert_eq!(request.method, "GET");
        assert!(request.path.ends_with("v1/configuration?configVersion=3"));
        Ok(r#"{"clientApiUrl": "https://api.example.com/client_api", "paypalEnabled": true}"#.to_string())
    })
    .into_arc();

    let session = SessionBuilder::new(TOKENIZATION_KEY)
        .unwrap()
        .with_http_client(http.clone())
        .connect()
        .await
        .unwrap();

    assert_eq!(http.call_count(), 1);
    assert_eq!(
        session.configuration().client_api_url(),
        "https://api.example.com/client_api"
    );
    assert!(!session.configuration().analytics_enabled());
    assert!(session.authorization().is_tokenization_key());
    session.close().await;
}

#[tokio::test]
async fn test_tokenize_delivers_nonce_to_listener() {
    let http = MockHttpClient::responding(201, visa_credit_card_response()).into_arc();
    let sink = MemoryAnalyticsSink::new();
    let session = SessionBuilder::new(TOKENIZATION_KEY)
        .unwrap()
        .with_http_client(http.clone())
        .with_analytics_sink(Arc::new(sink.clone()))
        .with_session_id_provider(Arc::new(FixedSessionId("session-abc")))
        .with_configuration(configuration(true))
        .build()
        .unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel::<PaymentMethodNonce>();
    session.add_nonce_created_listener(move |nonce| {
        let _ = tx.send(nonce.clone());
    });

    session.tokenize(visa_card());

    let nonce = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
    assert_eq!(nonce.as_card().unwrap().last_two(), "11");
    assert_eq!(session.session_id(), "session-abc");
    assert_eq!(http.calls()[0].json_body()["_meta"]["sessionId"], "session-abc");

    session.close().await;
    assert_eq!(sink.event_names(), vec!["card.nonce-received"]);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_event_raised_before_registration_is_delivered_once() {
    let http = MockHttpClient::responding(201, visa_credit_card_response()).into_arc();
    let session = SessionBuilder::new(TOKENIZATION_KEY)
        .unwrap()
        .with_http_client(http)
        .with_configuration(configuration(false))
        .build()
        .unwrap();

    session.tokenize(visa_card());

    let hub = session.hub().clone();
    wait_until(|| hub.has_buffered(Capability::NonceCreated)).await;

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let first = tx.clone();
    session.add_nonce_created_listener(move |nonce| {
        let _ = first.send(format!("first:{}", nonce.nonce()));
    });
    session.add_nonce_created_listener(move |nonce| {
        let _ = tx.send(format!("second:{}", nonce.nonce()));
    });

    assert_eq!(rx.try_recv().unwrap(), "first:123456-12345-12345-a-adfa");
    assert!(rx.try_recv().is_err());
    assert!(!session.hub().has_buffered(Capability::NonceCreated));
    session.close().await;
}

#[tokio::test]
async fn test_validation_failure_goes_to_error_listener() {
    let http = MockHttpClient::responding(422, credit_card_error_response()).into_arc();
    let sink = MemoryAnalyticsSink::new();
    let session = SessionBuilder::new(TOKENIZATION_KEY)
        .unwrap()
        .with_http_client(http)
        .with_analytics_sink(Arc::new(sink.clone()))
        .with_configuration(configuration(true))
        .build()
        .unwrap();

    let (nonce_tx, mut nonces) = mpsc::unbounded_channel::<String>();
    session.add_nonce_created_listener(move |nonce| {
        let _ = nonce_tx.send(nonce.nonce().to_string());
    });
    let (error_tx, mut errors) = mpsc::unbounded_channel::<Option<u16>>();
    session.add_error_listener(move |error| {
        let _ = error_tx.send(error.status_code());
    });

    session.tokenize(CardBuilder::new().with_expiration_month("01"));

    let status = timeout(WAIT, errors.recv()).await.unwrap().unwrap();
    assert_eq!(status, Some(422));

    session.close().await;
    assert!(nonces.try_recv().is_err());
    assert_eq!(sink.event_names(), vec!["card.nonce-failed"]);
}

#[tokio::test]
async fn test_fetch_existing_nonces_with_tokenization_key() {
    let http = MockHttpClient::responding(200, get_payment_methods_response()).into_arc();
    let session = SessionBuilder::new(TOKENIZATION_KEY)
        .unwrap()
        .with_http_client(http.clone())
        .with_configuration(configuration(true))
        .build()
        .unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    session.add_error_listener(move |error| {
        assert!(matches!(error, BraintreeError::Authorization(_)));
        let _ = tx.send(error.to_string());
    });

    session.fetch_existing_nonces(false);

    let message = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
    assert_eq!(message, TOKENIZATION_KEY_NOT_ALLOWED);
    assert_eq!(http.call_count(), 0);
    session.close().await;
}

#[tokio::test]
async fn test_fetch_existing_nonces_with_client_token() {
    let http = MockHttpClient::responding(200, get_payment_methods_response()).into_arc();
    let session = SessionBuilder::new(&client_token())
        .unwrap()
        .with_http_client(http.clone())
        .with_configuration(configuration(true))
        .build()
        .unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel::<Vec<String>>();
    session.add_nonces_updated_listener(move |nonces| {
        let _ = tx.send(nonces.iter().map(|n| n.type_label().to_string()).collect());
    });

    session.fetch_existing_nonces(true);

    let labels = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
    assert_eq!(labels, vec!["Visa", "PayPal", "Android Pay"]);
    assert_eq!(http.call_count(), 1);
    session.close().await;
}

#[tokio::test]
async fn test_removed_listener_leaves_event_buffered() {
    let http = MockHttpClient::responding(201, visa_credit_card_response()).into_arc();
    let session = SessionBuilder::new(TOKENIZATION_KEY)
        .unwrap()
        .with_http_client(http)
        .with_configuration(configuration(false))
        .build()
        .unwrap();

    let id = session.add_nonce_created_listener(|_| panic!("listener was removed"));
    assert_eq!(session.listener_count(Capability::NonceCreated), 1);
    assert!(session.remove_listener(id));

    session.tokenize(visa_card());

    let hub = session.hub().clone();
    wait_until(|| hub.has_buffered(Capability::NonceCreated)).await;
    session.close().await;
}

#[tokio::test]
async fn test_panicking_listener_does_not_stop_later_events() {
    let http = MockHttpClient::responding(201, visa_credit_card_response()).into_arc();
    let session = SessionBuilder::new(TOKENIZATION_KEY)
        .unwrap()
        .with_http_client(http.clone())
        .with_configuration(configuration(false))
        .build()
        .unwrap();

    let (panicked_tx, mut panicked) = mpsc::unbounded_channel::<()>();
    let id = session.add_nonce_created_listener(move |_| {
        let _ = panicked_tx.send(());
        panic!("listener failure");
    });

    session.tokenize(visa_card());
    timeout(WAIT, panicked.recv()).await.unwrap().unwrap();
    assert!(session.remove_listener(id));

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    session.add_error_listener(move |error| {
        let _ = tx.send(error.to_string());
    });

    session.fetch_existing_nonces(false);

    let message = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
    assert_eq!(message, TOKENIZATION_KEY_NOT_ALLOWED);
    assert!(!session.hub().has_buffered(Capability::Error));
    assert_eq!(http.call_count(), 1);
    session.close().await;
}

#[tokio::test]
async fn test_close_waits_for_in_flight_requests() {
    let http = MockHttpClient::responding(201, visa_credit_card_response()).into_arc();
    let session = SessionBuilder::new(TOKENIZATION_KEY)
        .unwrap()
        .with_http_client(http.clone())
        .with_configuration(configuration(false))
        .build()
        .unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    session.add_nonce_created_listener(move |nonce| {
        let _ = tx.send(nonce.nonce().to_string());
    });

    for _ in 0..3 {
        session.tokenize(visa_card());
    }
    session.close().await;

    let mut delivered = 0;
    while rx.try_recv().is_ok() {
        delivered += 1;
    }
    assert_eq!(delivered, 3);
    assert_eq!(http.call_count(), 3);
}

#[tokio::test]
async fn test_send_analytics_event_is_gated() {
    let enabled = MemoryAnalyticsSink::new();
    let session = SessionBuilder::new(TOKENIZATION_KEY)
        .unwrap()
        .with_http_client(MockHttpClient::responding(200, "{}").into_arc())
        .with_analytics_sink(Arc::new(enabled.clone()))
        .with_configuration(configuration(true))
        .build()
        .unwrap();
    session.send_analytics_event("custom.started");
    session.close().await;
    assert_eq!(enabled.event_names(), vec!["custom.started"]);

    let disabled = MemoryAnalyticsSink::new();
    let session = SessionBuilder::new(TOKENIZATION_KEY)
        .unwrap()
        .with_http_client(MockHttpClient::responding(200, "{}").into_arc())
        .with_analytics_sink(Arc::new(disabled.clone()))
        .with_configuration(configuration(false))
        .build()
        .unwrap();
    session.send_analytics_event("custom.started");
    session.close().await;
    assert!(disabled.events().is_empty());
}
