//! Traffic Light Chart
//!
//! This example demonstrates a cyclic chart bound to a plain record.
//!
//! Key concepts:
//! - Cyclic transitions declared by nesting
//! - A guard with a declared parameter
//! - A chained action that runs after the new state is written
//! - `can` and `choices` as side-effect-free dry runs
//!
//! Run with: cargo run --example traffic_light
//! Set RUST_LOG=sluice=debug to see the engine's logs.

use serde_json::json;
use sluice::builder::{state, ChartBuilder};
use sluice::{args, state_enum, Action, Args, FnCondition, FnEffect, Guard, Param};
use std::collections::HashMap;
use tracing_subscriber::EnvFilter;

state_enum! {
    enum TrafficLight {
        Red,
        Green,
        Yellow,
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Traffic Light Chart ===\n");

    let clear = Guard::leaf(
        FnCondition::new("CrossingClear", |args: &Args| {
            if args.get_as::<u32>("pedestrians") == Some(0) {
                json!(true)
            } else {
                json!("pedestrians still crossing")
            }
        })
        .param(Param::required("pedestrians")),
    )
    .unwrap();

    let announce = Action::leaf(FnEffect::new("Announce", |_: &Args| {
        println!("  (announce) light changed");
        Ok(())
    }))
    .unwrap();
    let count = Action::leaf(
        FnEffect::new("Count", |args: &Args| {
            println!("  (count) cycle {}", args.get("cycle").cloned().unwrap_or_default());
            Ok(())
        })
        .param(Param::optional("cycle", 1)),
    )
    .unwrap();

    let chart = ChartBuilder::new("TrafficLight")
        .states(TrafficLight::ALL.iter().copied())
        .declare(state(TrafficLight::Red).edges([state(TrafficLight::Green)
            .when(clear)
            .then(announce.clone() + count)
            .edges([state(TrafficLight::Yellow)
                .then(announce.clone())
                .edges([state(TrafficLight::Red).then(announce).elsewhere()])])]))
        .build()
        .unwrap();

    println!("{chart}\n");

    let mut junction: HashMap<String, Option<String>> = HashMap::new();
    let mut light = chart.bind_field(&mut junction, "north").unwrap();
    println!("Initial state: {}", light.current().unwrap());

    let busy = args!(pedestrians = 3);
    println!(
        "Can turn green with 3 pedestrians? {}",
        light.can(TrafficLight::Green, &busy).unwrap()
    );
    match light.to(TrafficLight::Green, &busy) {
        Ok(_) => println!("unexpected: turned green"),
        Err(err) => println!("Refused: {err}"),
    }

    let quiet = args!(pedestrians = 0, cycle = 1);
    println!("Choices when quiet: {:?}", light.choices(&quiet).unwrap());

    for (target, args) in [
        (TrafficLight::Green, quiet),
        (TrafficLight::Yellow, args!()),
        (TrafficLight::Red, args!()),
    ] {
        let state = light.to(target, &args).unwrap();
        println!("-> {} ({})", state, state.label());
    }

    drop(light);
    println!("\nRecord after one cycle: {junction:?}");

    println!("\n=== Example Complete ===");
}
