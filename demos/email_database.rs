//! Email Database
//!
//! This example backs a `Get`/`Set` state interface with an in-memory map.
//!
//! Key concepts:
//! - Effects with fields and distinct output types
//! - A handler that owns shared state
//! - Reporting how the scope ran
//!
//! Run with: cargo run --example email_database

use effectful::{effect, handle};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

effect! {
    /// Look up the email stored for `key`.
    pub struct Get { pub key: String } -> Option<String>;

    /// Store `value` under `key`.
    pub struct Set { pub key: String, pub value: String } -> ();
}

fn main() {
    println!("=== Email Database Example ===\n");

    let database = Arc::new(Mutex::new(HashMap::from([
        ("bob".to_string(), "bob@tum.de".to_string()),
        ("alex".to_string(), "alex.12@tum.de".to_string()),
    ])));
    let store = Arc::clone(&database);

    let scope = handle(async |cx| {
        let bob = cx.perform(Get { key: "bob".into() }).await?;
        println!("Bob's email: {bob:?}");
        let alex = cx.perform(Get { key: "alex".into() }).await?;
        println!("Alex's email: {alex:?}");
        cx.perform(Set {
            key: "sofia".into(),
            value: "sofy.best@tum.de".into(),
        })
        .await?;
        let sofia = cx.perform(Get { key: "sofia".into() }).await?;
        println!("Sofia's email: {sofia:?}");
        Ok(())
    })
    .handler(async move |effect, handler| {
        if let Some(Get { key }) = effect.downcast_ref::<Get>() {
            let email = store.lock().get(key).cloned();
            handler.resume(email).await
        } else if let Some(Set { key, value }) = effect.downcast_ref::<Set>() {
            store.lock().insert(key.clone(), value.clone());
            handler.resume(()).await
        } else {
            handler.unhandled()
        }
    })
    .build();

    let scope = match scope {
        Ok(scope) => scope,
        Err(err) => {
            println!("Could not build scope: {err}");
            return;
        }
    };

    let (result, report) = scope.run_with_report();
    println!("\nResult: {result:?}");
    println!("Handlers invoked: {}", report.handlers_invoked);
    println!("Entries stored: {}", database.lock().len());

    if let Ok(json) = report.to_json() {
        println!("\nReport:\n{json}");
    }

    println!("\n=== Example Complete ===");
}
