//! Emission basics and calling conventions.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use signal_hub::{payload, Handler, ParamSpec, Signal, SignalError, SignalHub, SignalType};

static SIGNAL: SignalType = SignalType::root("signal");
static SOMETHING_HAPPENED: SignalType = SignalType::extends("something_happened", &SIGNAL);
static PING: SignalType = SignalType::extends("ping", &SIGNAL);

// Run with RUST_LOG=signal_hub=trace to watch dispatch decisions.
fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

#[test]
fn basic_subscription_and_emit() {
    init_tracing();
    let hub = SignalHub::new();
    let events: Arc<Mutex<Vec<(String, String)>>> = Arc::new(Mutex::new(Vec::new()));

    let log = events.clone();
    hub.subscribe(
        &SOMETHING_HAPPENED,
        Handler::bald("listener", move |signal| {
            let who = signal.field("who").and_then(Value::as_str).unwrap();
            let what = signal.field("what").and_then(Value::as_str).unwrap();
            log.lock().push((who.to_string(), what.to_string()));
            Ok(())
        }),
    );

    let signal = Signal::build(&SOMETHING_HAPPENED)
        .field("who", "zdeyn")
        .field("what", "conquered")
        .finish();
    hub.emit(&signal, None).unwrap();

    assert_eq!(
        *events.lock(),
        vec![("zdeyn".to_string(), "conquered".to_string())]
    );
}

#[test]
fn multiple_subscribers_fire_in_registration_order() {
    let hub = SignalHub::new();
    let results: Arc<Mutex<Vec<(&'static str, i64)>>> = Arc::new(Mutex::new(Vec::new()));

    for name in ["a", "b"] {
        let log = results.clone();
        hub.subscribe(
            &PING,
            Handler::bald(name, move |signal| {
                let x = signal.field("x").and_then(Value::as_i64).unwrap();
                log.lock().push((name, x));
                Ok(())
            }),
        );
    }

    hub.emit(&Signal::build(&PING).field("x", 1).finish(), None)
        .unwrap();
    assert_eq!(*results.lock(), vec![("a", 1), ("b", 1)]);
}

#[test]
fn loaded_handler_receives_raw_payload_mapping() {
    let hub = SignalHub::new();
    let got: Arc<Mutex<Option<Value>>> = Arc::new(Mutex::new(None));

    let sink = got.clone();
    hub.subscribe(
        &PING,
        Handler::loaded("raw_payload", move |_signal, payload| {
            *sink.lock() = payload.map(|entries| Value::Object(entries.clone()));
            Ok(())
        }),
    );

    let extras = payload([("extra", "foo")]);
    hub.emit(&Signal::new(&PING), Some(&extras)).unwrap();

    let received = got.lock().clone().unwrap();
    assert_eq!(received["extra"], "foo");
}

#[test]
fn unpacked_handler_binds_payload_keys_and_defaults() {
    let hub = SignalHub::new();
    let got: Arc<Mutex<Vec<Value>>> = Arc::new(Mutex::new(Vec::new()));

    let sink = got.clone();
    hub.subscribe(
        &PING,
        Handler::unpacked(
            "bound",
            vec![
                ParamSpec::required("extra"),
                ParamSpec::with_default("retries", 3),
                ParamSpec::nullable("note"),
            ],
            move |_signal, values| {
                *sink.lock() = values.to_vec();
                Ok(())
            },
        ),
    );

    let extras = payload([("extra", "foo")]);
    hub.emit(&Signal::new(&PING), Some(&extras)).unwrap();

    assert_eq!(*got.lock(), vec!["foo".into(), 3.into(), Value::Null]);
}

#[test]
fn missing_required_key_names_handler_and_param() {
    let hub = SignalHub::new();
    hub.subscribe(
        &PING,
        Handler::unpacked(
            "needs_key",
            vec![ParamSpec::required("key")],
            |_signal, _values| Ok(()),
        ),
    );

    let err = hub.emit(&Signal::new(&PING), None).unwrap_err();
    assert_eq!(
        err.to_string(),
        "missing required payload key 'key' for handler 'needs_key'"
    );
}

#[test]
fn handler_error_aborts_remaining_delivery() {
    let hub = SignalHub::new();
    let second_fired = Arc::new(Mutex::new(false));

    hub.subscribe(
        &PING,
        Handler::bald("failing", |_signal| Err(SignalError::handler("boom"))),
    );
    let flag = second_fired.clone();
    hub.subscribe(
        &PING,
        Handler::bald("never_reached", move |_signal| {
            *flag.lock() = true;
            Ok(())
        }),
    );

    let err = hub.emit(&Signal::new(&PING), None).unwrap_err();
    assert_eq!(err.to_string(), "boom");
    assert!(err.handler_failure().is_some());
    assert!(!*second_fired.lock());
}

#[test]
fn emit_with_no_subscribers_is_ok() {
    let hub = SignalHub::new();
    hub.emit(&Signal::new(&PING), None).unwrap();
}

#[test]
fn same_closure_registered_twice_fires_twice() {
    let hub = SignalHub::new();
    let count = Arc::new(Mutex::new(0u32));

    // Two distinct Handler objects: two independent subscriptions, both fire.
    for _ in 0..2 {
        let tally = count.clone();
        hub.subscribe(
            &PING,
            Handler::bald("tally", move |_signal| {
                *tally.lock() += 1;
                Ok(())
            }),
        );
    }

    hub.emit(&Signal::new(&PING), None).unwrap();
    assert_eq!(*count.lock(), 2);
}

#[test]
fn lone_non_payload_param_is_extracted_not_raw() {
    let hub = SignalHub::new();
    let got: Arc<Mutex<Option<Value>>> = Arc::new(Mutex::new(None));

    let sink = got.clone();
    hub.subscribe(
        &PING,
        Handler::unpacked(
            "extract_flag",
            vec![ParamSpec::required("flag")],
            move |_signal, values| {
                *sink.lock() = Some(values[0].clone());
                Ok(())
            },
        ),
    );

    let extras = payload([("flag", true)]);
    hub.emit(&Signal::new(&PING), Some(&extras)).unwrap();
    assert_eq!(*got.lock(), Some(Value::Bool(true)));
}
