//! Registry integration tests.
//!
//! Configure passes against the built-in demo drivers and a counting
//! factory wrapper: all-or-nothing replacement, name validation, lookup,
//! duplicate-usage tracking, vehicle degraded mode and deadlines.

use async_trait::async_trait;
use hems_common::config::{ConfigLoader, HemsConfig};
use hems_common::device::{
    Battery, Capabilities, Class, DeviceError, Meter, Named, Options, Vehicle,
};
use hems_registry::{
    DeviceFactory, DeviceRegistry, Factories, RegistryError, ordered, probe,
};
use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Factory wrapper counting construct calls.
struct Counting<D: ?Sized + Send + Sync + 'static> {
    inner: Arc<dyn DeviceFactory<D>>,
    calls: AtomicUsize,
}

impl<D: ?Sized + Send + Sync + 'static> Counting<D> {
    fn new(inner: Arc<dyn DeviceFactory<D>>) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<D: ?Sized + Send + Sync + 'static> DeviceFactory<D> for Counting<D> {
    async fn construct(&self, typ: &str, options: &Options) -> Result<Box<D>, DeviceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.construct(typ, options).await
    }
}

fn meter(name: &str, power: i64) -> Named {
    Named::new(name, "demo").with("power", power)
}

fn names(conf: &[Named]) -> Vec<&str> {
    conf.iter().map(|c| c.name.as_str()).collect()
}

// ─── Meters ─────────────────────────────────────────────────────────

#[tokio::test]
async fn configured_meters_are_found_by_name() {
    let factories = Factories::builtin();
    let registry = DeviceRegistry::new();

    registry
        .configure_meters(&[meter("grid", 1200), meter("pv", -3400)], factories.meter.as_ref())
        .await
        .unwrap();

    let pv = registry.meter("pv").unwrap();
    assert_eq!(pv.current_power().unwrap(), -3400.0);

    let err = registry.meter("missing").err().unwrap();
    assert!(matches!(err, RegistryError::NotFound { class: Class::Meter, .. }));
    assert_eq!(err.to_string(), "meter does not exist: missing");

    assert_eq!(names(&registry.meters_config()), vec!["grid", "pv"]);
}

#[tokio::test]
async fn duplicate_name_keeps_previous_content() {
    let factories = Factories::builtin();
    let registry = DeviceRegistry::new();

    registry
        .configure_meters(&[meter("house", 400)], factories.meter.as_ref())
        .await
        .unwrap();

    let err = registry
        .configure_meters(&[meter("grid", 1), meter("grid", 2)], factories.meter.as_ref())
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "duplicate meter name: grid already defined and must be unique"
    );
    assert_eq!(names(&registry.meters_config()), vec!["house"]);
    assert!(!registry.contains(Class::Meter, "grid"));
}

#[tokio::test]
async fn missing_name_fails_before_any_construction() {
    let factory = Counting::new(Factories::builtin().meter);
    let registry = DeviceRegistry::new();

    let conf = vec![Named::new("", "demo").with("power", 1), meter("grid", 2)];
    let err = registry.configure_meters(&conf, &factory).await.unwrap_err();

    assert!(matches!(
        err,
        RegistryError::MissingName {
            class: Class::Meter,
            position: 1
        }
    ));
    assert_eq!(err.to_string(), "cannot create meter 1: missing name");
    assert_eq!(factory.calls(), 0);
    assert!(registry.meters().is_empty());
}

#[tokio::test]
async fn repeated_name_fails_before_any_construction() {
    let factory = Counting::new(Factories::builtin().meter);
    let registry = DeviceRegistry::new();

    // the second record alone would fail in the factory
    let conf = vec![
        Named::new("grid", "default").with("power", "10"),
        Named::new("grid", "default"),
    ];
    let err = registry.configure_meters(&conf, &factory).await.unwrap_err();

    assert!(matches!(
        err,
        RegistryError::DuplicateName { class: Class::Meter, ref name } if name == "grid"
    ));
    assert_eq!(
        err.to_string(),
        "duplicate meter name: grid already defined and must be unique"
    );
    assert_eq!(factory.calls(), 0);
    assert!(registry.meters().is_empty());
}

#[tokio::test]
async fn construction_failure_names_the_device() {
    let factories = Factories::builtin();
    let registry = DeviceRegistry::new();

    let conf = vec![meter("grid", 1), Named::new("pv", "unknown")];
    let err = registry
        .configure_meters(&conf, factories.meter.as_ref())
        .await
        .unwrap_err();

    match err {
        RegistryError::ConstructionFailed { class, name, source } => {
            assert_eq!(class, Class::Meter);
            assert_eq!(name, "pv");
            assert!(source.is_config());
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(registry.meters().is_empty());
}

#[tokio::test]
async fn empty_configuration_clears_class() {
    let factories = Factories::builtin();
    let registry = DeviceRegistry::new();

    registry
        .configure_meters(&[meter("grid", 1)], factories.meter.as_ref())
        .await
        .unwrap();
    registry
        .configure_meters(&[], factories.meter.as_ref())
        .await
        .unwrap();

    assert!(registry.meters().is_empty());
    assert!(registry.meters_config().is_empty());
}

#[tokio::test]
async fn template_records_resolve_through_options() {
    let factories = Factories::builtin();
    let registry = DeviceRegistry::new();

    let conf = vec![
        Named::new("grid", "template")
            .with("template", "demo")
            .with("power", 800),
    ];
    registry
        .configure_meters(&conf, factories.meter.as_ref())
        .await
        .unwrap();

    assert_eq!(registry.meter("grid").unwrap().current_power().unwrap(), 800.0);
    // the record keeps its declared form
    assert_eq!(registry.meters_config()[0].typ, "template");
}

// ─── Duplicate usage ────────────────────────────────────────────────

#[tokio::test]
async fn tracking_is_opt_in() {
    let factories = Factories::builtin();
    let registry = DeviceRegistry::new();

    registry
        .configure_meters(&[meter("grid", 1)], factories.meter.as_ref())
        .await
        .unwrap();

    // untracked lookups repeat freely
    assert!(registry.meter("grid").is_ok());
    assert!(registry.meter("grid").is_ok());

    registry.track_visitors();
    assert!(registry.meter("grid").is_ok());
    let err = registry.meter("grid").err().unwrap();
    assert_eq!(err.to_string(), "duplicate meter usage: grid");

    // a new pass resets the visited set
    registry.track_visitors();
    assert!(registry.meter("grid").is_ok());
}

#[tokio::test]
async fn unknown_name_is_not_marked_visited() {
    let registry = DeviceRegistry::new();
    registry.track_visitors();

    assert!(matches!(
        registry.charger("wallbox").err().unwrap(),
        RegistryError::NotFound { .. }
    ));
    assert!(matches!(
        registry.charger("wallbox").err().unwrap(),
        RegistryError::NotFound { .. }
    ));
}

// ─── Chargers ───────────────────────────────────────────────────────

#[tokio::test]
async fn chargers_are_constructed_concurrently() {
    let factories = Factories::builtin();
    let registry = DeviceRegistry::new();

    let conf: Vec<Named> = (1..=4)
        .map(|i| Named::new(format!("wallbox{i}"), "demo").with("delay", 300))
        .collect();

    let start = Instant::now();
    registry
        .configure_chargers(&conf, factories.charger)
        .await
        .unwrap();

    assert!(start.elapsed() < Duration::from_millis(1000));
    assert_eq!(registry.chargers().len(), 4);
    // insertion follows completion order, lookups do not depend on it
    let all = ordered(&registry.chargers());
    assert_eq!(all.len(), 4);
}

#[tokio::test]
async fn charger_failure_keeps_previous_chargers() {
    let factories = Factories::builtin();
    let registry = DeviceRegistry::new();

    registry
        .configure_chargers(&[Named::new("wallbox", "demo")], factories.charger.clone())
        .await
        .unwrap();

    let conf = vec![
        Named::new("a", "demo"),
        Named::new("b", "demo").with("offline", true),
    ];
    let err = registry
        .configure_chargers(&conf, factories.charger)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RegistryError::ConstructionFailed {
            class: Class::Charger,
            ..
        }
    ));
    assert_eq!(names(&registry.chargers_config()), vec!["wallbox"]);
}

#[tokio::test]
async fn duplicate_charger_keeps_previous_chargers() {
    let factories = Factories::builtin();
    let factory = Arc::new(Counting::new(factories.charger.clone()));
    let registry = DeviceRegistry::new();

    registry
        .configure_chargers(&[Named::new("wallbox", "demo")], factories.charger)
        .await
        .unwrap();

    let conf = vec![Named::new("wb", "demo"), Named::new("wb", "demo")];
    let err = registry
        .configure_chargers(&conf, factory.clone())
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "duplicate charger name: wb already defined and must be unique"
    );
    assert_eq!(factory.calls(), 0);
    assert_eq!(names(&registry.chargers_config()), vec!["wallbox"]);
    assert!(registry.charger("wb").is_err());
}

#[tokio::test]
async fn construction_deadline_is_enforced() {
    let factories = Factories::builtin();
    let registry = DeviceRegistry::new().with_timeout(Some(Duration::from_millis(50)));

    let conf = vec![Named::new("slow", "demo").with("delay", 2000)];
    let err = registry
        .configure_chargers(&conf, factories.charger)
        .await
        .unwrap_err();

    match err {
        RegistryError::ConstructionFailed { source, .. } => {
            assert_eq!(source, DeviceError::Timeout(Duration::from_millis(50)));
        }
        other => panic!("unexpected error: {other}"),
    }
}

// ─── Vehicles ───────────────────────────────────────────────────────

#[tokio::test]
async fn unreachable_vehicle_runs_degraded() {
    let factories = Factories::builtin();
    let registry = DeviceRegistry::new();

    let conf = vec![
        Named::new("my car", "demo").with("soc", 55),
        Named::new("second car", "demo").with("offline", true),
    ];
    registry
        .configure_vehicles(&conf, factories.vehicle)
        .await
        .unwrap();

    let healthy = registry.vehicle("my car").unwrap();
    assert_eq!(healthy.title(), "My Car");
    assert_eq!(healthy.soc().unwrap(), 55.0);

    let degraded = registry.vehicle("second car").unwrap();
    assert_eq!(degraded.title(), "Second Car");
    assert!(matches!(
        degraded.soc().unwrap_err(),
        DeviceError::Communication(_)
    ));
    assert_eq!(registry.degraded_vehicles(), vec!["second car".to_string()]);

    let report = probe(&*degraded);
    assert_eq!(report.len(), 1);
    assert!(report.values().all(|r| r.error.is_some()));
}

#[tokio::test]
async fn invalid_vehicle_configuration_aborts_batch() {
    let factories = Factories::builtin();
    let registry = DeviceRegistry::new();

    registry
        .configure_vehicles(&[Named::new("old", "demo")], factories.vehicle.clone())
        .await
        .unwrap();

    let conf = vec![
        Named::new("car", "demo"),
        Named::new("broken", "demo").with("soc", 150),
    ];
    let err = registry
        .configure_vehicles(&conf, factories.vehicle)
        .await
        .unwrap_err();

    assert!(err.to_string().starts_with("cannot create vehicle 'broken'"));
    assert_eq!(names(&registry.vehicles_config()), vec!["old"]);
}

#[tokio::test]
async fn duplicate_vehicle_keeps_previous_vehicles() {
    let factories = Factories::builtin();
    let registry = DeviceRegistry::new();

    registry
        .configure_vehicles(&[Named::new("old", "demo")], factories.vehicle.clone())
        .await
        .unwrap();

    let conf = vec![
        Named::new("car", "demo"),
        Named::new("car", "demo").with("offline", true),
    ];
    let err = registry
        .configure_vehicles(&conf, factories.vehicle)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RegistryError::DuplicateName {
            class: Class::Vehicle,
            ..
        }
    ));
    assert_eq!(names(&registry.vehicles_config()), vec!["old"]);
    assert!(registry.degraded_vehicles().is_empty());
}

#[tokio::test]
async fn unnamed_vehicle_keeps_previous_vehicles() {
    let factories = Factories::builtin();
    let registry = DeviceRegistry::new();

    registry
        .configure_vehicles(&[Named::new("old", "demo")], factories.vehicle.clone())
        .await
        .unwrap();

    let conf = vec![Named::new("a", "demo"), Named::new("", "demo")];
    let err = registry
        .configure_vehicles(&conf, factories.vehicle)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RegistryError::MissingName {
            class: Class::Vehicle,
            position: 2
        }
    ));
    assert_eq!(err.to_string(), "cannot create vehicle 2: missing name");
    assert_eq!(names(&registry.vehicles_config()), vec!["old"]);
    assert!(!registry.contains(Class::Vehicle, "a"));
}

#[tokio::test]
async fn explicit_title_is_kept() {
    let factories = Factories::builtin();
    let registry = DeviceRegistry::new();

    let conf = vec![Named::new("car", "demo").with("title", "Family Car")];
    registry
        .configure_vehicles(&conf, factories.vehicle)
        .await
        .unwrap();

    assert_eq!(registry.vehicle("car").unwrap().title(), "Family Car");
}

// ─── Incremental add ────────────────────────────────────────────────

struct Fixed(f64);

impl Capabilities for Fixed {
    fn as_meter(&self) -> Option<&dyn Meter> {
        Some(self)
    }
}

impl Meter for Fixed {
    fn current_power(&self) -> Result<f64, DeviceError> {
        Ok(self.0)
    }
}

#[test]
fn add_then_lookup_round_trip() {
    let registry = DeviceRegistry::new();

    let conf = meter("grid", 10);
    registry.add_meter(conf.clone(), Arc::new(Fixed(10.0))).unwrap();

    assert_eq!(registry.meter("grid").unwrap().current_power().unwrap(), 10.0);
    assert_eq!(registry.config(Class::Meter), vec![conf]);

    let err = registry
        .add_meter(meter("grid", 20), Arc::new(Fixed(20.0)))
        .unwrap_err();
    assert!(matches!(err, RegistryError::DuplicateName { .. }));
    assert_eq!(registry.meter("grid").unwrap().current_power().unwrap(), 10.0);
}

// ─── Whole configuration ────────────────────────────────────────────

#[tokio::test]
async fn configure_from_config_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("hems.toml");
    fs::write(
        &path,
        r#"
construct_timeout_ms = 5000

[[meters]]
name = "grid"
type = "demo"
power = 1200

[[meters]]
name = "pv"
type = "demo"
power = "-3400"
energy = 1520.5

[[chargers]]
name = "wallbox"
type = "demo"
status = "B"
maxcurrent = 32

[[vehicles]]
name = "ioniq"
type = "demo"
capacity = 58
soc = 80
"#,
    )
    .unwrap();

    let conf = HemsConfig::load(&path).unwrap();
    conf.validate().unwrap();

    let registry = DeviceRegistry::new().with_timeout(conf.construct_timeout());
    registry
        .configure(&conf, &Factories::builtin())
        .await
        .unwrap();

    assert_eq!(registry.meters().len(), 2);
    assert_eq!(registry.chargers().len(), 1);
    assert_eq!(registry.vehicles().len(), 1);
    assert!(registry.degraded_vehicles().is_empty());

    let pv = registry.meter("pv").unwrap();
    assert_eq!(pv.current_power().unwrap(), -3400.0);
    assert_eq!(pv.as_meter_energy().unwrap().total_energy().unwrap(), 1520.5);

    let ioniq = registry.vehicle("ioniq").unwrap();
    assert_eq!(ioniq.title(), "Ioniq");
    assert_eq!(ioniq.capacity(), 58.0);
}

#[tokio::test]
async fn configure_reports_failing_class() {
    let factories = Factories::builtin();
    let registry = DeviceRegistry::new();

    let conf = HemsConfig {
        meters: vec![Named::new("grid", "demo")],
        chargers: vec![Named::new("wallbox", "demo")],
        ..Default::default()
    };

    // grid lacks the required power option
    let err = registry.configure(&conf, &factories).await.unwrap_err();
    assert!(matches!(
        err,
        RegistryError::ConstructionFailed {
            class: Class::Meter,
            ..
        }
    ));
    assert!(registry.meters().is_empty());
}
