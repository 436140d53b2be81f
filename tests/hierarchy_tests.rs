//! Hierarchy-ordered delivery and per-emission deduplication.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use signal_hub::{Handler, Signal, SignalHub, SignalType};

static SIGNAL: SignalType = SignalType::root("signal");
static PARENT: SignalType = SignalType::extends("parent", &SIGNAL);
static CHILD: SignalType = SignalType::extends("child", &PARENT);
static SIBLING: SignalType = SignalType::extends("sibling", &PARENT);

fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) -> Arc<Handler>) {
    let log: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let make = {
        let log = log.clone();
        move |name: &str| {
            let log = log.clone();
            let label = name.to_string();
            Handler::bald(name, move |_signal: &Signal| {
                log.lock().push(label.clone());
                Ok(())
            })
        }
    };
    (log, make)
}

#[test]
fn parent_subscriber_receives_child_instance() {
    let hub = SignalHub::new();
    let observed: Arc<Mutex<Vec<(String, Option<i64>)>>> = Arc::new(Mutex::new(Vec::new()));

    let log = observed.clone();
    hub.subscribe(
        &PARENT,
        Handler::bald("observer", move |signal| {
            log.lock().push((
                signal.signal_type().name().to_string(),
                signal.field("x").and_then(Value::as_i64),
            ));
            Ok(())
        }),
    );

    hub.emit(&Signal::build(&CHILD).field("x", 1).finish(), None)
        .unwrap();

    // The handler sees the concrete child instance, not a parent-narrowed copy.
    assert_eq!(*observed.lock(), vec![("child".to_string(), Some(1))]);
}

#[test]
fn root_subscriber_observes_every_emission() {
    let hub = SignalHub::new();
    let (log, make) = recorder();

    hub.subscribe(&SIGNAL, make("audit"));
    hub.emit(&Signal::new(&CHILD), None).unwrap();
    hub.emit(&Signal::new(&SIBLING), None).unwrap();
    hub.emit(&Signal::new(&SIGNAL), None).unwrap();

    assert_eq!(*log.lock(), vec!["audit", "audit", "audit"]);
}

#[test]
fn shared_handler_across_levels_fires_once_per_emission() {
    let hub = SignalHub::new();
    let count = Arc::new(Mutex::new(0u32));

    let tally = count.clone();
    let handler = Handler::bald("shared", move |_signal| {
        *tally.lock() += 1;
        Ok(())
    });
    hub.subscribe(&CHILD, handler.clone());
    hub.subscribe(&PARENT, handler);

    hub.emit(&Signal::new(&CHILD), None).unwrap();
    assert_eq!(*count.lock(), 1);

    // Dedup is per emission: a parent emission reaches it again.
    hub.emit(&Signal::new(&PARENT), None).unwrap();
    assert_eq!(*count.lock(), 2);
}

#[test]
fn shared_handler_on_separate_branches_fires_per_bound_type() {
    let hub = SignalHub::new();
    let count = Arc::new(Mutex::new(0u32));

    let tally = count.clone();
    let handler = Handler::bald("shared", move |_signal| {
        *tally.lock() += 1;
        Ok(())
    });
    hub.subscribe(&CHILD, handler.clone());
    hub.subscribe(&SIBLING, handler);

    hub.emit(&Signal::new(&CHILD), None).unwrap();
    hub.emit(&Signal::new(&SIBLING), None).unwrap();
    assert_eq!(*count.lock(), 2);
}

#[test]
fn delivery_walks_derived_level_before_base() {
    let hub = SignalHub::new();
    let (log, make) = recorder();

    // Register base-level first; hierarchy order still wins over
    // registration time across levels.
    hub.subscribe(&SIGNAL, make("root"));
    hub.subscribe(&PARENT, make("parent"));
    hub.subscribe(&CHILD, make("child"));

    hub.emit(&Signal::new(&CHILD), None).unwrap();
    assert_eq!(*log.lock(), vec!["child", "parent", "root"]);
}

#[test]
fn sibling_subscriber_stays_silent() {
    let hub = SignalHub::new();
    let (log, make) = recorder();

    hub.subscribe(&SIBLING, make("sibling_only"));
    hub.emit(&Signal::new(&CHILD), None).unwrap();
    assert!(log.lock().is_empty());
}

#[test]
fn handler_may_subscribe_during_emission() {
    let hub = Arc::new(SignalHub::new());
    let (log, make) = recorder();

    let inner = make("added_mid_emission");
    let hub_ref = hub.clone();
    hub.subscribe(
        &PARENT,
        Handler::bald("adder", move |_signal| {
            hub_ref.subscribe(&SIBLING, inner.clone());
            Ok(())
        }),
    );

    // No deadlock; the new subscription lands while this emission is in
    // flight, on a branch this emission does not visit.
    hub.emit(&Signal::new(&CHILD), None).unwrap();
    assert_eq!(hub.subscription_count(&SIBLING), 1);
    assert!(log.lock().is_empty());

    hub.emit(&Signal::new(&SIBLING), None).unwrap();
    assert_eq!(*log.lock(), vec!["added_mid_emission"]);
}
