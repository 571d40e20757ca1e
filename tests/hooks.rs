//! Global hooks are process-wide, so everything that installs them lives in a
//! single test.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use anonptr::{
    AnonPtr, InvalidCast,
    hooks::{Hooks, LeakedHooks, type_names::TypeNameStyle},
};

#[derive(Clone)]
struct Telemetry {
    samples: Vec<Option<f32>>,
}

#[test]
fn installed_hooks_shape_messages_and_observe_failures() {
    let handle: AnonPtr = AnonPtr::new(Telemetry {
        samples: vec![Some(1.0), None],
    });
    assert_eq!(handle.get::<&Telemetry>().unwrap().samples.len(), 2);

    // Nothing installed yet
    assert!(LeakedHooks::fetch_current_hooks().is_none());
    assert_eq!(
        handle.get::<&f32>().unwrap_err().to_string(),
        "invalid cast to `f32`: underlying object is `hooks::Telemetry`"
    );

    let failures = Arc::new(AtomicUsize::new(0));
    let seen = Arc::new(Mutex::new(Vec::new()));

    let counter = Arc::clone(&failures);
    let log = Arc::clone(&seen);
    Hooks::new()
        .type_name::<f32>("float")
        .type_name_style(TypeNameStyle::Short)
        .invalid_cast_hook(move |_: &InvalidCast| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .invalid_cast_hook(move |error: &InvalidCast| {
            log.lock().unwrap().push(error.to_string());
        })
        .install()
        .expect("no hooks were installed before");

    assert!(LeakedHooks::fetch_current_hooks().is_some());

    // Aliases win, everything else is shortened
    assert_eq!(handle.type_identity().to_string(), "Telemetry");
    assert_eq!(format!("{handle:?}"), "AnonPtr { type: Telemetry }");
    assert_eq!(handle.type_name(), "hooks::Telemetry");
    assert_eq!(
        handle.get::<&f32>().unwrap_err().to_string(),
        "invalid cast to `float`: underlying object is `Telemetry`"
    );
    assert_eq!(
        handle.cloned::<Vec<Option<f32>>>().unwrap_err().to_string(),
        "invalid cast to `Vec<Option<f32>>`: underlying object is `Telemetry`"
    );

    // Every failing access shape reports, successful ones do not
    let mut handle = handle;
    let before = failures.load(Ordering::SeqCst);
    assert!(handle.get::<*const u8>().is_err());
    assert!(handle.get_mut::<&mut u8>().is_err());
    assert!(handle.get_mut::<*mut u8>().is_err());
    assert!(handle.get::<&Telemetry>().is_ok());
    let handle = handle.take::<u8>().unwrap_err().into_inner();
    assert_eq!(failures.load(Ordering::SeqCst), before + 4);
    assert_eq!(
        seen.lock().unwrap().last().map(String::as_str),
        Some("invalid cast to `u8`: underlying object is `Telemetry`")
    );

    // A second installation is refused and hands the hooks back
    let rejected = Hooks::new().install().unwrap_err();
    assert_eq!(rejected.to_string(), "hooks are already installed globally");

    // Replacing swaps the configuration and returns the previous one
    let counted = failures.load(Ordering::SeqCst);
    let previous = rejected.0.replace().expect("hooks were installed");
    assert_eq!(
        handle.get::<&f32>().unwrap_err().to_string(),
        "invalid cast to `f32`: underlying object is `hooks::Telemetry`"
    );
    assert_eq!(failures.load(Ordering::SeqCst), counted);

    assert!(previous.replace().is_some());
    assert_eq!(
        handle.get::<&f32>().unwrap_err().to_string(),
        "invalid cast to `float`: underlying object is `Telemetry`"
    );
    assert_eq!(failures.load(Ordering::SeqCst), counted + 1);

    // Leaked hooks can be reinstalled and fetched again
    let full = Hooks::new().type_name_style(TypeNameStyle::Full).leak();
    assert!(full.replace().is_some());
    assert!(LeakedHooks::fetch_current_hooks().is_some());
    assert_eq!(
        handle.get::<&f32>().unwrap_err().to_string(),
        "invalid cast to `f32`: underlying object is `hooks::Telemetry`"
    );
}
