//! Collecting Output
//!
//! This example collects the messages printed by an inner computation into
//! a string, using an outer handler that builds the result after resuming.
//!
//! Key concepts:
//! - `handle_with_default` opens a scope that forwards every effect
//! - Forwarded effects are handled on behalf of the inner scope
//! - Each handler sees the result produced by the handlers after it
//!
//! Run with: cargo run --example collect_output

use effectful::{effect, run, Context, EffectError};

effect! {
    /// Print one message.
    pub struct Print(pub String) -> ();
}

async fn greet(cx: &mut Context) -> Result<((), String), EffectError> {
    for msg in ["A", "B", "C"] {
        cx.perform(Print(msg.to_string())).await?;
    }
    Ok(((), String::new()))
}

fn main() {
    println!("=== Collecting Output Example ===\n");

    let result = run(
        async |cx| cx.handle_with_default(async |cx| greet(cx).await),
        async |effect, handler| match effect.downcast_ref::<Print>() {
            Some(Print(msg)) => {
                let ((), rest) = handler.resume(()).await?;
                Ok(((), format!("{msg}{rest}")))
            }
            None => handler.unhandled(),
        },
    );

    match result {
        Ok(((), collected)) => println!("Collected: {collected}"),
        Err(err) => println!("Scope failed: {err}"),
    }

    println!("\n=== Example Complete ===");
}
