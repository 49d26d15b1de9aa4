use std::time::Duration;

use mysql_operator::backoff::{ErrorBackoff, DEFAULT_ERROR_BACKOFFS};
use mysql_operator::config::{parse_backoffs, DEFAULT_FINALIZER};
use mysql_operator::{Error, OperatorConfig};

fn secs(values: &[u64]) -> Vec<Duration> {
    values.iter().copied().map(Duration::from_secs).collect()
}

#[test]
fn default_schedule_is_ten_twenty_thirty() {
    let backoff = ErrorBackoff::default();
    assert_eq!(backoff.schedule(), secs(&DEFAULT_ERROR_BACKOFFS).as_slice());
    assert_eq!(backoff.schedule(), secs(&[10, 20, 30]).as_slice());
}

#[test]
fn delays_grow_then_hold_at_last_entry() {
    let backoff = ErrorBackoff::default();
    let delays: Vec<u64> = (0..5)
        .map(|_| backoff.next_delay("ns1/db1").as_secs())
        .collect();

    assert_eq!(delays, vec![10, 20, 30, 30, 30]);
    assert_eq!(backoff.attempts("ns1/db1"), 5);
}

#[test]
fn attempts_are_tracked_per_object() {
    let backoff = ErrorBackoff::default();
    backoff.next_delay("ns1/db1");
    backoff.next_delay("ns1/db1");

    assert_eq!(backoff.next_delay("ns2/db1"), Duration::from_secs(10));
    assert_eq!(backoff.attempts("ns1/db1"), 2);
    assert_eq!(backoff.attempts("ns2/db1"), 1);
}

#[test]
fn success_resets_the_schedule() {
    let backoff = ErrorBackoff::default();
    backoff.next_delay("ns1/db1");
    backoff.next_delay("ns1/db1");

    backoff.reset("ns1/db1");

    assert_eq!(backoff.attempts("ns1/db1"), 0);
    assert_eq!(backoff.next_delay("ns1/db1"), Duration::from_secs(10));
}

#[test]
fn forgotten_objects_are_dropped() {
    let backoff = ErrorBackoff::default();
    backoff.next_delay("ns1/db1");
    backoff.next_delay("ns1/gone");
    backoff.next_delay("ns2/gone");
    assert_eq!(backoff.tracked(), 3);

    backoff.retain(|key| key == "ns1/db1");

    assert_eq!(backoff.tracked(), 1);
    assert_eq!(backoff.attempts("ns1/db1"), 1);
    assert_eq!(backoff.attempts("ns1/gone"), 0);
}

#[test]
fn custom_schedule_is_respected() {
    let backoff = ErrorBackoff::new(secs(&[1, 5])).unwrap();
    assert_eq!(backoff.delay_for(0), Duration::from_secs(1));
    assert_eq!(backoff.delay_for(1), Duration::from_secs(5));
    assert_eq!(backoff.delay_for(100), Duration::from_secs(5));
}

#[test]
fn empty_or_zero_schedule_is_rejected() {
    assert!(matches!(
        ErrorBackoff::new(Vec::new()),
        Err(Error::InvalidConfig(_))
    ));
    assert!(matches!(
        ErrorBackoff::new(secs(&[10, 0])),
        Err(Error::InvalidConfig(_))
    ));
}

#[test]
fn backoffs_parse_from_comma_list() {
    assert_eq!(parse_backoffs("10,20,30").unwrap(), secs(&[10, 20, 30]));
    assert_eq!(parse_backoffs(" 5 , 15 ,").unwrap(), secs(&[5, 15]));
    assert!(parse_backoffs("").is_err());
    assert!(parse_backoffs("10,soon").is_err());
    assert!(parse_backoffs("-1").is_err());
}

#[test]
fn default_config_is_valid() {
    let config = OperatorConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.namespace, None);
    assert_eq!(config.finalizer, DEFAULT_FINALIZER);
    assert_eq!(config.error_backoffs, secs(&[10, 20, 30]));
    assert_eq!(config.requeue_after, None);
}

#[test]
fn builder_normalizes_empty_values() {
    let config = OperatorConfig::new()
        .namespace("")
        .requeue_after(Duration::ZERO);
    assert_eq!(config.namespace, None);
    assert_eq!(config.requeue_after, None);

    let config = OperatorConfig::new()
        .namespace("databases")
        .requeue_after(Duration::from_secs(300));
    assert_eq!(config.namespace.as_deref(), Some("databases"));
    assert_eq!(config.requeue_after, Some(Duration::from_secs(300)));
}

#[test]
fn invalid_config_is_rejected() {
    assert!(OperatorConfig::new().finalizer(" ").validate().is_err());
    assert!(OperatorConfig::new().field_manager("").validate().is_err());
    assert!(OperatorConfig::new()
        .error_backoffs(Vec::new())
        .validate()
        .is_err());
    assert!(OperatorConfig::new()
        .error_backoffs(secs(&[0]))
        .validate()
        .is_err());
}
