//! Session 1: Failures - Translation and Recovery
//!
//! Run with: cargo run --example session1_failures
//!
//! This example demonstrates:
//! - Callables built from plain functions
//! - Nesting, mapping and sneaking checked failures
//! - Recovery with defaults, fallbacks and replacement selection

use fallible_core::{
    constant, Callable, Failure, Never, Outcome, RecoverExt, TranslateExt, Unchecked,
};
use thiserror::Error;

// ============================================================================
// Example Callables
// ============================================================================

#[derive(Debug, Error)]
#[error("invalid port {0:?}")]
struct InvalidPort(String);

#[derive(Debug, Error)]
#[error("configuration rejected: {0}")]
struct ConfigRejected(String);

#[derive(Debug, Error)]
#[error("use a default instead")]
struct UseDefault;

/// Parse a TCP port, declaring `InvalidPort`.
fn parse_port(raw: &str) -> Outcome<u16, InvalidPort> {
    raw.trim()
        .parse::<u16>()
        .map_err(|_| InvalidPort(raw.to_string()).into())
}

fn main() -> Result<(), Failure<Never>> {
    println!("=== Session 1: Failures ===\n");

    // -------------------------------------------------------------------------
    // Translation
    // -------------------------------------------------------------------------
    println!("1. Translation");
    println!("--------------");

    let nested = parse_port.nest();
    println!("nest(\"8080\") = {}", nested.invoke(("8080",))?);

    let err = nested.invoke(("http",)).unwrap_err();
    if let Some(Unchecked::Nested { message, .. }) = err.as_unchecked() {
        println!("nest(\"http\") failed with carrier: {}", message);
    }

    let mapped = parse_port.nest_with(|e: InvalidPort| ConfigRejected(e.to_string()));
    println!(
        "nest_with(\"-1\") = {}",
        mapped.invoke(("-1",)).unwrap_err()
    );

    let sneaked = parse_port.sneaky().invoke(("99999",)).unwrap_err();
    println!("sneaky(\"99999\") kind = {}", sneaked.kind());
    println!();

    // -------------------------------------------------------------------------
    // Recovery
    // -------------------------------------------------------------------------
    println!("2. Recovery");
    println!("-----------");

    let with_default = parse_port.or_return(80);
    println!("or_return(\"oops\") = {}", with_default.invoke(("oops",))?);

    let with_fallback =
        parse_port.fallback_to(|raw: &str| -> Outcome<u16> { Ok(raw.len() as u16) });
    println!("fallback_to(\"four\") = {}", with_fallback.invoke(("four",))?);

    let replaced = parse_port.or_throw(|| UseDefault).invoke(("x",)).unwrap_err();
    let suppressed = replaced
        .as_unchecked()
        .and_then(Unchecked::suppressed)
        .map(|cause| cause.to_string());
    println!("or_throw(\"x\") = {} (suppressed: {:?})", replaced, suppressed);

    let chosen = parse_port.recover(|failure: &Failure<InvalidPort>| {
        println!("  recover saw a {} failure", failure.kind());
        Some(constant(443))
    });
    println!("recover(\"\") = {}", chosen.invoke(("",))?);

    Ok(())
}
