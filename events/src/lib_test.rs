use super::*;

#[test]
fn room_wire_names_round_trip() {
    for room in Room::ALL {
        assert_eq!(room.as_str().parse::<Room>().expect("room"), room);
    }
}

#[test]
fn room_rejects_unknown_name() {
    let err = "lobby".parse::<Room>().expect_err("room should be unknown");
    assert_eq!(err.0, "lobby");
}

#[test]
fn subscribe_and_unsubscribe_types_carry_room_name() {
    assert_eq!(Room::Notifications.subscribe_type(), "subscribe:notifications");
    assert_eq!(Room::Servers.unsubscribe_type(), "unsubscribe:servers");
    assert_eq!(Room::Balance.subscribe_type(), "subscribe:balance");
}

#[test]
fn event_types_route_by_prefix() {
    assert_eq!(
        Room::for_event_type("notification:new"),
        Some(Room::Notifications)
    );
    assert_eq!(Room::for_event_type("server:stats"), Some(Room::Servers));
    assert_eq!(Room::for_event_type("ticket:status"), Some(Room::Tickets));
    assert_eq!(Room::for_event_type("balance:updated"), Some(Room::Balance));
}

#[test]
fn control_and_unrouted_types_have_no_room() {
    assert_eq!(Room::for_event_type("pong"), None);
    assert_eq!(Room::for_event_type("error"), None);
    assert_eq!(Room::for_event_type("auth:success"), None);
    assert_eq!(Room::for_event_type("auth:error"), None);
    assert_eq!(Room::for_event_type("check:status"), None);
}

#[test]
fn auth_message_carries_token() {
    let msg = ClientMessage::Auth {
        token: "tok-1".to_owned(),
    };
    assert_eq!(
        msg.to_json(),
        serde_json::json!({"type": "auth", "token": "tok-1"})
    );
}

#[test]
fn subscribe_message_uses_room_scoped_type() {
    assert_eq!(
        ClientMessage::Subscribe(Room::Tickets).to_json(),
        serde_json::json!({"type": "subscribe:tickets"})
    );
    assert_eq!(
        ClientMessage::Unsubscribe(Room::Tickets).to_json(),
        serde_json::json!({"type": "unsubscribe:tickets"})
    );
}

#[test]
fn ping_message_has_bare_type() {
    assert_eq!(
        ClientMessage::Ping.to_text(),
        "{\"type\":\"ping\"}"
    );
}

#[test]
fn parses_auth_success() {
    let event = parse_event(r#"{"type":"auth:success","userId":"user-1"}"#).expect("parse");
    assert_eq!(
        event,
        ServerEvent::AuthSuccess {
            user_id: "user-1".to_owned()
        }
    );
    assert_eq!(event.room(), None);
}

#[test]
fn parses_notification_new_with_nested_payload() {
    let text = r#"{"type":"notification:new","notification":{"id":"n-1","title":"Invoice ready","read":false}}"#;
    let event = parse_event(text).expect("parse");
    let ServerEvent::NotificationNew { notification } = &event else {
        panic!("expected notification:new, got {event:?}");
    };
    assert_eq!(notification.get("title"), Some(&serde_json::json!("Invoice ready")));
    assert_eq!(event.room(), Some(Room::Notifications));
}

#[test]
fn parses_server_status_with_optional_ip() {
    let with_ip = parse_event(
        r#"{"type":"server:status","serverId":"srv-1","status":"running","ipAddress":"10.0.0.8"}"#,
    )
    .expect("parse");
    assert_eq!(
        with_ip,
        ServerEvent::ServerStatus {
            server_id: "srv-1".to_owned(),
            status: "running".to_owned(),
            ip_address: Some("10.0.0.8".to_owned()),
        }
    );

    let without_ip =
        parse_event(r#"{"type":"server:status","serverId":"srv-1","status":"provisioning"}"#)
            .expect("parse");
    assert_eq!(
        without_ip,
        ServerEvent::ServerStatus {
            server_id: "srv-1".to_owned(),
            status: "provisioning".to_owned(),
            ip_address: None,
        }
    );
}

#[test]
fn parses_balance_updated_from_integer_number() {
    let event = parse_event(r#"{"type":"balance:updated","newBalance":1500}"#).expect("parse");
    let ServerEvent::BalanceUpdated { new_balance } = event else {
        panic!("expected balance:updated");
    };
    assert!((new_balance - 1500.0).abs() < f64::EPSILON);
}

#[test]
fn parses_pong_and_suppresses_room() {
    let event = parse_event(r#"{"type":"pong"}"#).expect("parse");
    assert_eq!(event, ServerEvent::Pong);
    assert_eq!(event.room(), None);
}

#[test]
fn check_status_parses_but_routes_nowhere() {
    let event =
        parse_event(r#"{"type":"check:status","checkId":"chk-1","status":"passed"}"#).expect("parse");
    assert_eq!(event.event_type(), "check:status");
    assert_eq!(event.room(), None);
}

#[test]
fn unknown_type_becomes_unknown_event_with_payload() {
    let event = parse_event(r#"{"type":"maintenance:window","startsAt":"2026-01-01"}"#)
        .expect("parse");
    let ServerEvent::Unknown { event_type, payload } = &event else {
        panic!("expected unknown event");
    };
    assert_eq!(event_type, "maintenance:window");
    assert_eq!(payload.get("startsAt"), Some(&serde_json::json!("2026-01-01")));
    assert_eq!(event.room(), None);
}

#[test]
fn unknown_subtype_of_known_family_routes_by_prefix() {
    let event = parse_event(r#"{"type":"notification:archived","notificationId":"n-9"}"#)
        .expect("parse");
    assert!(matches!(event, ServerEvent::Unknown { .. }));
    assert_eq!(event.room(), Some(Room::Notifications));
}

#[test]
fn invalid_json_is_a_parse_error() {
    let err = parse_event("{not json").expect_err("text should fail");
    assert!(matches!(err, ParseError::Json(_)));
}

#[test]
fn missing_type_is_a_parse_error() {
    let err = parse_event(r#"{"message":"hi"}"#).expect_err("should fail");
    assert!(matches!(err, ParseError::MissingType));

    let err = parse_event(r#"{"type":7}"#).expect_err("non-string type should fail");
    assert!(matches!(err, ParseError::MissingType));
}

#[test]
fn known_type_with_malformed_payload_is_a_payload_error() {
    let err = parse_event(r#"{"type":"auth:success"}"#).expect_err("should fail");
    let ParseError::Payload { event_type, .. } = err else {
        panic!("expected payload error");
    };
    assert_eq!(event_type, "auth:success");
}

#[test]
fn event_type_matches_wire_discriminator() {
    let event = parse_event(r#"{"type":"ticket:status","ticketId":"t-1","status":"closed"}"#)
        .expect("parse");
    assert_eq!(event.event_type(), "ticket:status");
    assert_eq!(event.room(), Some(Room::Tickets));
}
