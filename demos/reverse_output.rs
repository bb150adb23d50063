//! Reverse Output
//!
//! This example prints messages in reverse by handling `Print` after
//! resuming the computation.
//!
//! Key concepts:
//! - Code after `resume` runs once the rest of the computation is done
//! - Handlers parked by later effects finish most recent first
//!
//! Run with: cargo run --example reverse_output

use effectful::{effect, run};

effect! {
    /// Print one line.
    pub struct Print(pub String) -> ();
}

fn main() {
    println!("=== Reverse Output Example ===\n");

    let result = run(
        async |cx| {
            for msg in ["A", "B", "C"] {
                println!("performing Print({msg})");
                cx.perform(Print(msg.to_string())).await?;
            }
            Ok(())
        },
        async |effect, handler| match effect.downcast_ref::<Print>() {
            Some(Print(msg)) => {
                handler.resume(()).await?;
                println!("{msg}");
                Ok(())
            }
            None => handler.unhandled(),
        },
    );

    match result {
        Ok(()) => println!("\n=== Example Complete ==="),
        Err(err) => println!("\nScope failed: {err}"),
    }
}
