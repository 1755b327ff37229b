//! Permission flow demonstration.
//!
//! This example walks a host application through the engine:
//! 1. Request a mixed batch of standard and specialized authorizations
//! 2. Drain the queued launches and report results back by identity
//! 3. Request a single specialized authorization and report it without one
//! 4. Cancel and evict abandoned requests
//! 5. Inspect the lifecycle journal
//!
//! Run with: `RUST_LOG=grant_relay=debug cargo run --example permission_flow`

use std::sync::Arc;
use std::time::Duration;

use grant_relay::{
    names, AuthorizationName, CorrelationEngine, GrantTable, Launch, LaunchQueue, ManualClock,
    PlatformVersion, ProtectionLevel, SettingsDestinations,
};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("grant_relay=info")),
        )
        .init();

    println!("=== Permission Flow Example ===\n");

    let grants = Arc::new(GrantTable::new());
    for raw in [
        names::WRITE_EXTERNAL_STORAGE,
        names::READ_PHONE_STATE,
        names::READ_PHONE_NUMBERS,
    ] {
        grants.set_protection(raw, ProtectionLevel::Dangerous);
    }
    let launches = Arc::new(LaunchQueue::new());
    let clock = Arc::new(ManualClock::new(0));
    let engine = CorrelationEngine::builder(
        grants.clone(),
        Arc::new(SettingsDestinations::new(
            "kr.open.library.permissions",
            PlatformVersion(34),
        )),
        launches.clone(),
    )
    .clock(clock.clone())
    .build()
    .expect("default configuration is valid");

    // Scenario 1: a mixed batch
    println!("--- Scenario 1: Mixed Batch ---");

    let batch: Vec<AuthorizationName> = [
        names::WRITE_EXTERNAL_STORAGE,
        names::READ_PHONE_STATE,
        names::READ_PHONE_NUMBERS,
        names::SYSTEM_ALERT_WINDOW,
        names::WRITE_SETTINGS,
        names::PACKAGE_USAGE_STATS,
        names::MANAGE_EXTERNAL_STORAGE,
        names::REQUEST_IGNORE_BATTERY_OPTIMIZATIONS,
        names::SCHEDULE_EXACT_ALARM,
        names::POST_NOTIFICATIONS,
    ]
    .into_iter()
    .map(AuthorizationName::new)
    .collect();

    let id = engine.request(&batch, |denied| {
        println!("✓ Batch resolved, {} denied:", denied.len());
        for name in &denied {
            println!("    - {name}");
        }
    });
    println!("✓ Dispatched request {id}");

    let queued = launches.drain();
    for launch in &queued {
        match launch {
            Launch::Standard { names, .. } => {
                println!("  prompt for {} standard authorizations", names.len());
            }
            Launch::Special {
                name, destination, ..
            } => println!("  redirect {name} -> {destination}"),
        }
    }

    // The user grants two authorizations, then the prompt reports back.
    grants.grant(names::READ_PHONE_STATE);
    grants.grant(names::SYSTEM_ALERT_WINDOW);
    for launch in &queued {
        if let Launch::Standard { request_id, names } = launch {
            let results = names.iter().map(|name| (name.clone(), false));
            engine.resolve_batch(results, Some(request_id));
        }
    }

    // Settings screens closing afterwards find nothing left to resolve.
    for launch in &queued {
        if let Launch::Special {
            request_id, name, ..
        } = launch
        {
            engine.resolve_single_special(name, Some(request_id));
        }
    }

    // Scenario 2: a single specialized authorization without identity
    println!("\n--- Scenario 2: Single Specialized Authorization ---");

    let alarm = AuthorizationName::new(names::SCHEDULE_EXACT_ALARM);
    engine.request_single_special(&alarm, |granted| {
        println!("✓ Exact alarms granted: {granted}");
    });
    launches.drain();
    grants.grant(alarm.clone());
    engine.resolve_single_special(&alarm, None);

    // Scenario 3: cancellation and eviction
    println!("\n--- Scenario 3: Cancellation and Eviction ---");

    let cancelled = engine.request(&[AuthorizationName::new(names::READ_PHONE_NUMBERS)], |_| {
        println!("✗ cancelled callback must never run");
    });
    engine.cancel(&cancelled);
    engine.cancel(&cancelled);
    println!("✓ Cancelled {cancelled} twice, pending: {}", engine.pending_count());

    engine.request(&[AuthorizationName::new(names::WRITE_EXTERNAL_STORAGE)], |_| {
        println!("✗ evicted callback must never run");
    });
    clock.advance(Duration::from_secs(301));
    println!("✓ Evicted {} abandoned request(s)", engine.sweep());
    launches.drain();

    // Scenario 4: the journal
    println!("\n--- Scenario 4: Lifecycle Journal ---");

    for event in engine.journal().events() {
        println!("  {event}");
    }
    println!("\nPending requests: {}", engine.pending_count());
}
