//! Card tokenization demo
//!
//! Tokenizes a card against the gateway and prints the resulting nonce.
//!
//! ```text
//! BRAINTREE_AUTHORIZATION=sandbox_xxx_merchant tokenize 4111111111111111 08/20 [cvv]
//! ```

use rust_braintree::http::HttpClientConfig;
use rust_braintree::session::SessionBuilder;
use rust_braintree::types::{CardBuilder, PaymentMethodNonce};
use std::env;
use std::time::Duration;
use tokio::sync::mpsc;

enum Outcome {
    Nonce(PaymentMethodNonce),
    Failed(String),
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let authorization = env::var("BRAINTREE_AUTHORIZATION")
        .map_err(|_| "BRAINTREE_AUTHORIZATION must be set to a client token or tokenization key")?;

    let mut args = env::args().skip(1);
    let number = args.next().unwrap_or_else(|| "4111111111111111".to_string());
    let expiration = args.next().unwrap_or_else(|| "08/20".to_string());
    let cvv = args.next();

    let session = SessionBuilder::new(&authorization)?
        .with_http_config(HttpClientConfig::new().with_timeout(Duration::from_secs(30)))
        .connect()
        .await?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let nonces = tx.clone();
    session.add_nonce_created_listener(move |nonce| {
        let _ = nonces.send(Outcome::Nonce(nonce.clone()));
    });
    session.add_error_listener(move |error| {
        let _ = tx.send(Outcome::Failed(error.to_string()));
    });

    let mut card = CardBuilder::new()
        .with_number(number)
        .with_expiration_date(expiration);
    if let Some(cvv) = cvv {
        card = card.with_cvv(cvv);
    }

    session.tokenize(card);

    let outcome = rx.recv().await;
    session.close().await;

    match outcome {
        Some(Outcome::Nonce(nonce)) => {
            println!("{} {}", nonce.type_label(), nonce.description());
            println!("{}", nonce.nonce());
            Ok(())
        }
        Some(Outcome::Failed(message)) => Err(message.into()),
        None => Err("session closed before tokenization finished".into()),
    }
}
