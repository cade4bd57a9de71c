mod common;

use common::{FakeOlt, Script, Unit, fast_options, init_logging, unreachable_config};
use oltscope::Fleet;
use tokio_test::{assert_err, assert_ok};

#[tokio::test]
async fn test_disabled_devices_are_skipped() {
    init_logging();
    let a = FakeOlt::start(Script::default()).await;
    let b = FakeOlt::start(Script::default()).await;
    let c = FakeOlt::start(Script::default()).await;

    let fleet = Fleet::with_options(
        vec![
            a.config("olt-a").build().unwrap(),
            b.config("olt-b").enabled(false).build().unwrap(),
            c.config("olt-c").build().unwrap(),
        ],
        fast_options(),
    )
    .unwrap();

    assert_eq!(fleet.names().collect::<Vec<_>>(), vec!["olt-a", "olt-c"]);
    assert!(fleet.get("olt-b").is_none());

    assert_ok!(fleet.get_unit_info("missing").await);
    assert_eq!(b.connections(), 0);
}

#[tokio::test]
async fn test_first_match_wins() {
    init_logging();
    let a = FakeOlt::start(Script::with_units(vec![Unit::new("0/1", 1, "other")])).await;
    let b = FakeOlt::start(Script::with_units(vec![Unit::new("0/2", 4, "rogersaade")])).await;
    let c = FakeOlt::start(Script::with_units(vec![Unit::new("0/1", 9, "rogersaade")])).await;

    let fleet = Fleet::with_options(
        vec![
            a.config("olt-a").build().unwrap(),
            b.config("olt-b").build().unwrap(),
            c.config("olt-c").build().unwrap(),
        ],
        fast_options(),
    )
    .unwrap();

    let info = assert_ok!(fleet.get_unit_info("rogersaade").await).unwrap();
    assert_eq!(info.device, "olt-b");
    assert_eq!(c.connections(), 0);

    // Served from the shared cache on the second call.
    assert_ok!(fleet.get_unit_info("rogersaade").await);
    assert_eq!(b.count("show onu info"), 1);
    fleet.close().await;
}

#[tokio::test]
async fn test_unreachable_device_is_skipped() {
    init_logging();
    let b = FakeOlt::start(Script::with_units(vec![Unit::new("0/1", 2, "rogersaade")])).await;

    let fleet = Fleet::with_options(
        vec![
            unreachable_config("olt-down").await,
            b.config("olt-b").build().unwrap(),
        ],
        fast_options(),
    )
    .unwrap();

    let info = assert_ok!(fleet.get_unit_info("rogersaade").await).unwrap();
    assert_eq!(info.device, "olt-b");
}

#[tokio::test]
async fn test_all_unreachable_is_an_error() {
    init_logging();
    let fleet = Fleet::with_options(
        vec![
            unreachable_config("olt-1").await,
            unreachable_config("olt-2").await,
        ],
        fast_options(),
    )
    .unwrap();

    let err = assert_err!(fleet.get_unit_info("rogersaade").await);
    assert!(err.is_unreachable());
    assert!(err.to_string().contains("olt-2"));
}

#[tokio::test]
async fn test_duplicate_names_rejected() {
    let a = FakeOlt::start(Script::default()).await;
    let result = Fleet::new(vec![
        a.config("olt").build().unwrap(),
        a.config("olt").build().unwrap(),
    ]);
    assert!(result.is_err());
}
