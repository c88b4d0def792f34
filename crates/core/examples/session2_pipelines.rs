//! Session 2: Pipelines - Composition, Memoization and Tracing
//!
//! Run with: cargo run --example session2_pipelines
//!
//! This example demonstrates:
//! - Adapting inputs with `compose` and chaining with `and_then`
//! - Currying, tupling and reversing multi-input callables
//! - Memoizing an expensive callable
//! - Tracing a pipeline and exporting the trace as JSON

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use fallible_core::{
    of_total, Callable, ComposeExt, CompositeHook, Failure, LoggingHook, Memoize, Never, Outcome,
    RecordingHook, RecoverExt, TracedExt, TranslateExt,
};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("empty word")]
struct EmptyWord;

fn first_char(word: &str) -> Outcome<char, EmptyWord> {
    word.chars().next().ok_or(Failure::Checked(EmptyWord))
}

fn initials(a: char, b: char, c: char) -> Outcome<String, EmptyWord> {
    Ok([a, b, c].iter().collect())
}

fn slow_fib(n: u64) -> Outcome<u64> {
    thread::sleep(Duration::from_millis(5));
    let (mut a, mut b) = (0u64, 1u64);
    for _ in 0..n {
        (a, b) = (b, a.wrapping_add(b));
    }
    Ok(a)
}

fn main() -> Result<(), Failure<Never>> {
    println!("=== Session 2: Pipelines ===\n");

    // -------------------------------------------------------------------------
    // Composition
    // -------------------------------------------------------------------------
    println!("1. Composition");
    println!("--------------");

    let acronym = initials
        .compose((first_char, first_char, first_char))
        .map(|s: String| s.to_uppercase());
    let safe_acronym = acronym.or_return_with(|| "???".to_string());
    println!(
        "acronym(portable, network, graphics) = {}",
        safe_acronym.invoke(("portable", "network", "graphics"))?
    );
    println!(
        "acronym(portable, \"\", graphics) = {}",
        safe_acronym.invoke(("portable", "", "graphics"))?
    );

    let reversed = initials.reversed().or_return_with(String::new);
    println!("reversed(a, b, c) = {}", reversed.invoke(('a', 'b', 'c'))?);

    let curried = initials.curried().nest();
    let with_x = curried.invoke(('x',))?.nest();
    let with_xy = with_x.invoke(('y',))?.nest();
    println!("curried(x)(y)(z) = {}", with_xy.invoke(('z',))?);
    println!();

    // -------------------------------------------------------------------------
    // Memoization
    // -------------------------------------------------------------------------
    println!("2. Memoization");
    println!("--------------");

    let fib = slow_fib.memoized();
    for n in [40, 40, 41, 40] {
        println!("fib({}) = {}", n, fib.invoke((n,))?);
    }
    println!("cache: {:?}", fib);
    println!();

    // -------------------------------------------------------------------------
    // Tracing
    // -------------------------------------------------------------------------
    println!("3. Tracing");
    println!("----------");

    let recording = Arc::new(RecordingHook::new());
    let hook = CompositeHook::new().with(LoggingHook::verbose());
    let traced = first_char
        .and_then(of_total(|c: char| c as u32))
        .traced_with_hook("code_point", Arc::new(hook));
    let recorded = first_char.traced_with_hook("first_char", recording.clone());

    let _ = traced.invoke(("rust",));
    let _ = traced.invoke(("",));
    let _ = recorded.invoke(("ok",));

    let trace = traced.trace();
    println!("summary: {:?}", trace.summary());
    println!("recorded by hook: {}", recording.records().len());
    match trace.to_json_pretty() {
        Ok(json) => println!("{}", json),
        Err(e) => println!("could not export trace: {}", e),
    }

    Ok(())
}
