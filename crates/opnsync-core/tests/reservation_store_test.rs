#![allow(clippy::unwrap_used)]

mod common;

use common::{FakeRouter, mac};
use opnsync_api::Method;
use opnsync_core::store::MANAGED_MARKER;
use opnsync_core::{DeviceMapping, DhcpReservation, ErrorKind, ReservationStore, SyncOptions};
use pretty_assertions::assert_eq;

fn store(router: &std::sync::Arc<FakeRouter>) -> ReservationStore<FakeRouter> {
    ReservationStore::new(std::sync::Arc::clone(router))
}

// ── CRUD ────────────────────────────────────────────────────────────

#[tokio::test]
async fn list_keeps_router_order_and_stamps_uuids() {
    let router = FakeRouter::new();
    let first = router.seed_reservation(&mac(2), "192.168.1.2", "b", "");
    let second = router.seed_reservation(&mac(1), "192.168.1.1", "a", "");

    let listed = store(&router).list(None).await.unwrap();

    let uuids: Vec<_> = listed.iter().map(|r| r.uuid.clone().unwrap()).collect();
    assert_eq!(uuids, [first, second]);
    assert_eq!(listed[0].ip, "192.168.1.2");
    assert_eq!(router.paths(), ["dhcpv4/leases/searchReservations"]);
}

#[tokio::test]
async fn list_scopes_by_interface() {
    let router = FakeRouter::new();
    router.seed_reservation(&mac(1), "192.168.1.1", "a", "");

    let on_opt1 = store(&router).list(Some("opt1")).await.unwrap();
    let on_lan = store(&router).list(Some("LAN")).await.unwrap();

    assert!(on_opt1.is_empty());
    assert_eq!(on_lan.len(), 1);
    assert_eq!(
        router.paths()[0],
        "dhcpv4/leases/searchReservations?interface=opt1"
    );
}

#[tokio::test]
async fn create_rejects_invalid_input_without_network() {
    let router = FakeRouter::new();
    let store = store(&router);

    for bad in [
        DhcpReservation::new("aa:bb:cc", "192.168.1.10", "h"),
        DhcpReservation::new(mac(1), "192.168.1.999", "h"),
        DhcpReservation::new(mac(1), "192.168.1.10", ""),
    ] {
        let err = store.create(&bad).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
    assert!(router.calls().is_empty());
}

#[tokio::test]
async fn create_wraps_record_and_sanitizes_hostname() {
    let router = FakeRouter::new();
    let mut reservation = DhcpReservation::new("aabbccddee01", "192.168.1.10", "Kitchen Plug");
    reservation.interface = "lan".into();

    let response = store(&router).create(&reservation).await.unwrap();

    assert!(response.uuid.is_some());
    let call = &router.calls()[0];
    assert_eq!(call.method, Method::Post);
    assert_eq!(call.path, "dhcpv4/leases/addReservation");
    let body = &call.body.as_ref().unwrap()["reservation"];
    assert_eq!(body["hostname"], "kitchen-plug");
    assert_eq!(body["mac"], "aa:bb:cc:dd:ee:01");
    assert_eq!(body["ipaddr"], "192.168.1.10");
    assert_eq!(body["disabled"], "0");
}

#[tokio::test]
async fn get_update_delete_round_trip() {
    let router = FakeRouter::new();
    let uuid = router.seed_reservation(&mac(1), "192.168.1.1", "a", "");
    let store = store(&router);

    let mut fetched = store.get(&uuid).await.unwrap();
    assert_eq!(fetched.uuid.as_deref(), Some(uuid.as_str()));

    fetched.ip = "192.168.1.50".into();
    store.update(&uuid, &fetched).await.unwrap();
    assert_eq!(router.reservation(&uuid).unwrap()["ipaddr"], "192.168.1.50");

    store.delete(&uuid).await.unwrap();
    assert!(router.reservation(&uuid).is_none());

    let err = store.get(&uuid).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn router_rejection_is_api_error() {
    let router = FakeRouter::new();
    let missing = uuid::Uuid::new_v4().to_string();

    let err = store(&router).delete(&missing).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Api);
}

#[tokio::test]
async fn find_by_mac_and_ip_normalize_queries() {
    let router = FakeRouter::new();
    router.seed_reservation("aa:bb:cc:dd:ee:01", "192.168.1.1", "a", "");
    router.seed_reservation("aa:bb:cc:dd:ee:02", "fd00::2", "b", "");
    let store = store(&router);

    let by_mac = store.find_by_mac("AA-BB-CC-DD-EE-02", None).await.unwrap();
    assert_eq!(by_mac.hostname, "b");

    let by_ip = store.find_by_ip("fd00:0::2", None).await.unwrap();
    assert_eq!(by_ip.hostname, "b");

    let missing = store.find_by_mac("aabbccddee09", None).await.unwrap_err();
    assert_eq!(missing.kind(), ErrorKind::NotFound);

    let invalid = store.find_by_ip("nope", None).await.unwrap_err();
    assert_eq!(invalid.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn apply_configuration_posts_reconfigure() {
    let router = FakeRouter::new();
    let response = store(&router).apply_configuration().await.unwrap();
    assert!(response.changed);
    assert_eq!(router.paths(), ["dhcpv4/service/reconfigure"]);
}

// ── sync_devices ────────────────────────────────────────────────────

#[tokio::test]
async fn sync_creates_updates_and_skips_unchanged() {
    let router = FakeRouter::new();
    let moved = router.seed_reservation(&mac(1), "192.168.1.1", "plug-1", "");
    router.seed_reservation(&mac(2), "192.168.1.2", "plug-2", "");

    let devices = vec![
        DeviceMapping::new(mac(1), "192.168.1.11").with_hostname("plug-1"),
        DeviceMapping::new(mac(2), "192.168.1.2").with_hostname("PLUG-2"),
        DeviceMapping::new(mac(3), "192.168.1.3").with_name("Garage Door"),
    ];

    let result = store(&router)
        .sync_devices(&devices, &SyncOptions::default())
        .await
        .unwrap();

    assert_eq!(result.reservations_added, 1);
    assert_eq!(result.reservations_updated, 1);
    assert!(result.success, "{:?}", result.errors);
    assert_eq!(router.reservation(&moved).unwrap()["ipaddr"], "192.168.1.11");

    let created = router
        .reservations()
        .into_iter()
        .find(|r| r["mac"] == "aa:bb:cc:dd:ee:03")
        .unwrap();
    assert_eq!(created["hostname"], "garage-door");
    assert!(created["descr"].as_str().unwrap().starts_with(MANAGED_MARKER));

    // Apply happens once, after every item mutation.
    let paths = router.paths();
    assert_eq!(paths.last().unwrap(), "dhcpv4/service/reconfigure");
    assert_eq!(paths.iter().filter(|p| p.ends_with("reconfigure")).count(), 1);
}

#[tokio::test]
async fn sync_records_invalid_devices_and_continues() {
    let router = FakeRouter::new();
    let devices = vec![
        DeviceMapping::new("not-a-mac", "192.168.1.1"),
        DeviceMapping::new(mac(2), "bad-ip"),
        DeviceMapping::new(mac(3), "192.168.1.3"),
    ];

    let result = store(&router)
        .sync_devices(&devices, &SyncOptions::default())
        .await
        .unwrap();

    assert_eq!(result.reservations_added, 1);
    assert_eq!(result.errors.len(), 2);
    assert!(!result.success);
}

#[tokio::test]
async fn sync_without_changes_does_not_apply() {
    let router = FakeRouter::new();
    router.seed_reservation(&mac(1), "192.168.1.1", "plug-1", "");
    let devices = vec![DeviceMapping::new(mac(1), "192.168.1.1").with_hostname("plug-1")];

    let result = store(&router)
        .sync_devices(&devices, &SyncOptions::default())
        .await
        .unwrap();

    assert_eq!(result.reservations_added + result.reservations_updated, 0);
    assert!(router.mutations().is_empty());
}

#[tokio::test]
async fn dry_run_counts_match_and_sends_nothing() {
    let seed = |router: &FakeRouter| {
        router.seed_reservation(&mac(1), "192.168.1.1", "plug-1", "");
        router.seed_reservation(&mac(9), "192.168.1.9", "gone", MANAGED_MARKER);
    };
    let devices = vec![
        DeviceMapping::new(mac(1), "192.168.1.21"),
        DeviceMapping::new(mac(2), "192.168.1.22"),
        DeviceMapping::new(mac(2), "192.168.1.22"),
    ];

    let dry_router = FakeRouter::new();
    seed(dry_router.as_ref());
    let live_router = FakeRouter::new();
    seed(live_router.as_ref());

    let dry_opts = SyncOptions {
        dry_run: true,
        delete_orphaned: true,
        ..SyncOptions::default()
    };
    let live_opts = SyncOptions {
        dry_run: false,
        ..dry_opts.clone()
    };

    let dry = store(&dry_router).sync_devices(&devices, &dry_opts).await.unwrap();
    let live = store(&live_router).sync_devices(&devices, &live_opts).await.unwrap();

    assert!(dry_router.mutations().is_empty());
    assert_eq!(dry.reservations_added, live.reservations_added);
    assert_eq!(dry.reservations_updated, live.reservations_updated);
    assert_eq!(dry.reservations_deleted, live.reservations_deleted);
    assert_eq!(live.reservations_added, 1);
    assert_eq!(live.reservations_updated, 1);
    assert_eq!(live.reservations_deleted, 1);
}

#[tokio::test]
async fn orphan_deletion_spares_unmanaged_reservations() {
    let router = FakeRouter::new();
    let foreign = router.seed_reservation(&mac(7), "192.168.1.7", "printer", "office printer");
    let ours = router.seed_reservation(&mac(8), "192.168.1.8", "old-plug", "[opnsync] Old Plug");

    let options = SyncOptions {
        delete_orphaned: true,
        ..SyncOptions::default()
    };
    let result = store(&router).sync_devices(&[], &options).await.unwrap();

    assert_eq!(result.reservations_deleted, 1);
    assert!(router.reservation(&foreign).is_some());
    assert!(router.reservation(&ours).is_none());
}

#[tokio::test]
async fn failed_apply_is_a_warning() {
    let router = FakeRouter::new();
    router.fail_on("dhcpv4/service/reconfigure");
    let devices = vec![DeviceMapping::new(mac(1), "192.168.1.1")];

    let result = store(&router)
        .sync_devices(&devices, &SyncOptions::default())
        .await
        .unwrap();

    assert_eq!(result.reservations_added, 1);
    assert!(result.success);
    assert_eq!(result.warnings.len(), 1);
}

#[tokio::test]
async fn sync_fails_when_listing_fails() {
    let router = FakeRouter::new();
    router.fail_on("dhcpv4/leases/searchReservations");

    let err = store(&router)
        .sync_devices(&[DeviceMapping::new(mac(1), "192.168.1.1")], &SyncOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Api);
}

#[tokio::test]
async fn new_reservations_use_default_interface() {
    let router = FakeRouter::new();
    let options = SyncOptions {
        interface: Some("opt2".into()),
        hostname_template: Some("sh-{mac4}".into()),
        ..SyncOptions::default()
    };

    store(&router)
        .sync_devices(&[DeviceMapping::new(mac(0x1f), "10.0.0.5")], &options)
        .await
        .unwrap();

    let created = &router.reservations()[0];
    assert_eq!(created["interface"], "opt2");
    assert_eq!(created["hostname"], "sh-ee1f");
}

#[tokio::test]
async fn update_keeps_interface_description_and_disabled() {
    let router = FakeRouter::new();
    let uuid = router.seed_reservation("aabbccddeeff", "192.168.1.200", "plug", "hall light");
    let devices = vec![DeviceMapping::new("AA:BB:CC:DD:EE:FF", "192.168.1.100").with_hostname("plug")];

    let result = store(&router)
        .sync_devices(&devices, &SyncOptions::default())
        .await
        .unwrap();

    assert_eq!(result.reservations_updated, 1);
    let after = router.reservation(&uuid).unwrap();
    assert_eq!(after["ipaddr"], "192.168.1.100");
    assert_eq!(after["interface"], "lan");
    assert_eq!(after["descr"], "hall light");
    assert_eq!(after["disabled"], "0");
}

#[tokio::test]
async fn updated_foreign_reservation_survives_orphan_cleanup() {
    let router = FakeRouter::new();
    let uuid = router.seed_reservation(&mac(4), "192.168.1.4", "printer", "office printer");
    let store = store(&router);

    store
        .sync_devices(
            &[DeviceMapping::new(mac(4), "192.168.1.40").with_hostname("printer")],
            &SyncOptions::default(),
        )
        .await
        .unwrap();

    let options = SyncOptions {
        delete_orphaned: true,
        ..SyncOptions::default()
    };
    let result = store.sync_devices(&[], &options).await.unwrap();

    assert_eq!(result.reservations_deleted, 0);
    assert!(router.reservation(&uuid).is_some());
}

#[tokio::test]
async fn dry_run_matches_live_for_repeated_mac() {
    let devices = vec![
        DeviceMapping::new(mac(1), "192.168.1.1"),
        DeviceMapping::new(mac(1), "192.168.1.9"),
        DeviceMapping::new(mac(1), "192.168.1.9"),
    ];

    let live_router = FakeRouter::new();
    let live = store(&live_router)
        .sync_devices(&devices, &SyncOptions::default())
        .await
        .unwrap();

    let dry_router = FakeRouter::new();
    let dry_opts = SyncOptions {
        dry_run: true,
        ..SyncOptions::default()
    };
    let dry = store(&dry_router).sync_devices(&devices, &dry_opts).await.unwrap();

    assert_eq!((live.reservations_added, live.reservations_updated), (1, 1));
    assert_eq!(
        (dry.reservations_added, dry.reservations_updated),
        (live.reservations_added, live.reservations_updated)
    );
    assert_eq!(dry.errors, live.errors);
    assert!(dry.success);
    assert!(dry_router.mutations().is_empty());
}
