use super::*;

#[test]
fn new_applies_default_policy() {
    let config = RelayConfig::new("ws://relay.test/ws");
    assert_eq!(config.url, "ws://relay.test/ws");
    assert_eq!(config.token, None);
    assert_eq!(config.max_reconnect_attempts, 5);
    assert_eq!(config.reconnect_base, Duration::from_millis(1000));
    assert_eq!(config.heartbeat_interval, Duration::from_secs(30));
}

#[test]
fn builders_override_policy_fields() {
    let config = RelayConfig::new("ws://relay.test/ws")
        .with_url("wss://relay.example/ws".to_owned())
        .with_token(Some("tok-1".to_owned()))
        .with_max_reconnect_attempts(2)
        .with_reconnect_base(Duration::from_millis(25))
        .with_heartbeat_interval(Duration::from_millis(500));

    assert_eq!(config.url, "wss://relay.example/ws");
    assert_eq!(config.token.as_deref(), Some("tok-1"));
    assert_eq!(config.max_reconnect_attempts, 2);
    assert_eq!(config.reconnect_base, Duration::from_millis(25));
    assert_eq!(config.heartbeat_interval, Duration::from_millis(500));
}

#[test]
fn env_parsers_fall_back_to_defaults() {
    assert_eq!(env_u32("RELAY_TEST_UNSET_VAR_U32", 5), 5);
    assert_eq!(env_u64("RELAY_TEST_UNSET_VAR_U64", 1000), 1000);
}
