use rookery_api::address::{Address, MAX_FRAMEWORKS, MAX_MAILBOXES};

#[test]
fn test_pack_unpack_round_trip() {
    let addr = Address::new(3, 1701);
    assert_eq!(addr.framework(), 3);
    assert_eq!(addr.mailbox(), 1701);

    let raw = addr.to_raw();
    let back = Address::from_raw(raw);
    assert_eq!(back, addr);
    assert_eq!(back.framework(), 3);
    assert_eq!(back.mailbox(), 1701);
}

#[test]
fn test_extreme_components_survive_packing() {
    let addr = Address::new(MAX_FRAMEWORKS, MAX_MAILBOXES);
    assert_eq!(addr.framework(), MAX_FRAMEWORKS);
    assert_eq!(addr.mailbox(), MAX_MAILBOXES);

    let addr = Address::new(1, 0);
    assert_eq!(addr.framework(), 1);
    assert_eq!(addr.mailbox(), 0);
}

#[test]
fn test_zero_framework_denotes_receiver() {
    let receiver = Address::new(0, 42);
    assert!(receiver.is_receiver());
    assert!(!receiver.is_null());

    let framework = Address::new(7, 42);
    assert!(!framework.is_receiver());
}

#[test]
fn test_null_address() {
    assert!(Address::NULL.is_null());
    assert_eq!(Address::NULL.to_raw(), 0);
    assert!(!Address::new(0, 1).is_null());
    assert!(!Address::new(1, 0).is_null());
}

#[test]
fn test_display_shows_both_components() {
    assert_eq!(Address::new(2, 19).to_string(), "2.19");
}

#[test]
#[should_panic(expected = "framework index out of range")]
fn test_oversized_framework_component_panics() {
    Address::new(MAX_FRAMEWORKS + 1, 0);
}

#[test]
#[should_panic(expected = "mailbox index out of range")]
fn test_oversized_mailbox_component_panics() {
    Address::new(0, MAX_MAILBOXES + 1);
}
