use chrono::{NaiveDate, NaiveDateTime};

use shuttle_routes_core::catalog::{build_catalog, finalize};
use shuttle_routes_core::catalog_model::{CatalogRoute, CatalogStop, DistrictRoutes, RouteCatalog};
use shuttle_routes_core::config::CatalogConfig;
use shuttle_routes_core::contract::{Coordinates, GeocodeQuery, MockGeocoder};
use shuttle_routes_core::input::{CrawlFragment, SourceInput};
use shuttle_routes_core::repair::AutoRepair;

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap()
}

fn fragment(district: &str, text: &str) -> SourceInput {
    SourceInput::Fragment(CrawlFragment {
        district: Some(district.to_string()),
        raw_text: text.to_string(),
        source: None,
    })
}

/// A geocoder that knows a handful of stations, one of them far outside Seoul.
fn station_geocoder() -> MockGeocoder {
    let mut geocoder = MockGeocoder::new();
    geocoder
        .expect_resolve()
        .returning(|q: GeocodeQuery<'_>| match q.name {
            "영등포역 1번출구" => Some(Coordinates::new(37.5159, 126.9075)),
            "여의도역" => Some(Coordinates::new(37.5216, 126.9243)),
            "합정역" => Some(Coordinates::new(37.5495, 126.9138)),
            "망원역" => Some(Coordinates::new(37.5561, 126.9102)),
            "홍대입구역" => Some(Coordinates::new(37.5571, 126.9245)),
            "강남역" => Some(Coordinates::new(37.4979, 127.0276)),
            "역삼역" => Some(Coordinates::new(37.5007, 127.0365)),
            "부산역" => Some(Coordinates::new(35.10, 129.04)),
            _ => None,
        });
    geocoder
}

#[test]
fn tagged_span_becomes_a_published_route() {
    let config = CatalogConfig::seoul();
    let inputs = vec![fragment(
        "영등포구",
        "영등포역 1번출구\n여의도역\n운행 09:00~18:00 30분 간격",
    )];

    let outcome = build_catalog(&inputs, &station_geocoder(), &config, now()).unwrap();

    assert!(outcome.report.validation.valid, "{:?}", outcome.report.validation);
    assert_eq!(outcome.repair, None);
    let district = &outcome.document.districts[0];
    assert_eq!(district.district, "영등포구");
    let route = &district.routes[0];
    let stops: Vec<_> = route.stops.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(stops, vec!["영등포역 1번출구", "여의도역"]);
    assert_eq!(route.hours, "09:00~18:00");
    assert_eq!(route.interval, "30분");
    assert_eq!(outcome.document.updated_at, "2024-05-01");
    assert_eq!(outcome.report.generated_at, "2024-05-01 09:30:00");
    assert_eq!(outcome.report.quality.info_completeness, 100.0);
}

#[test]
fn stop_outside_seoul_is_rejected_then_repaired_away() {
    let config = CatalogConfig::seoul();
    let inputs = vec![
        fragment("마포구", "합정역, 망원역, 부산역"),
        fragment("마포구", "홍대입구역 → 부산역"),
    ];

    let outcome = build_catalog(&inputs, &station_geocoder(), &config, now()).unwrap();

    let repair = outcome.repair.expect("first validation should fail");
    assert_eq!(repair.stops_removed, 2);
    assert_eq!(repair.routes_removed, 1);
    assert!(outcome.report.validation.valid);

    let routes = &outcome.document.districts[0].routes;
    assert_eq!(routes.len(), 1);
    let stops: Vec<_> = routes[0].stops.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(stops, vec!["합정역", "망원역"]);
    for stop in &routes[0].stops {
        assert!(config.bounds.contains(stop.lat, stop.lng));
    }
}

#[test]
fn empty_input_reports_no_district_data() {
    let config = CatalogConfig::seoul();
    let geocoder = MockGeocoder::new();

    let outcome = build_catalog(&[], &geocoder, &config, now()).unwrap();

    assert!(!outcome.report.validation.valid);
    assert_eq!(outcome.report.validation.errors, vec!["no district data".to_string()]);
    assert_eq!(outcome.report.quality.overall_score, 0.0);
    assert!(outcome.document.districts.is_empty());
}

#[test]
fn route_without_schedule_is_kept_with_warnings() {
    let config = CatalogConfig::seoul();
    let inputs = vec![fragment("강남구", "강남역 → 역삼역")];

    let outcome = build_catalog(&inputs, &station_geocoder(), &config, now()).unwrap();

    let validation = &outcome.report.validation;
    assert!(validation.valid);
    assert!(validation.warnings.contains(&"[강남구 셔틀] hours missing".to_string()));
    assert!(validation.warnings.contains(&"[강남구 셔틀] interval missing".to_string()));
    assert_eq!(outcome.report.quality.total_routes, 1);
    assert_eq!(outcome.report.quality.info_completeness, 0.0);
    assert_eq!(outcome.document.districts[0].routes[0].hours, config.no_info);
}

#[test]
fn residual_errors_survive_a_single_repair_pass() {
    let config = CatalogConfig::seoul();
    let placed = |name: &str, lat: f64, lng: f64| {
        CatalogStop::new(name, Some(Coordinates::new(lat, lng)))
    };
    let mut catalog = RouteCatalog::default();
    catalog.push_route(
        "중구",
        CatalogRoute {
            name: "   ".into(),
            hours: Some("08:00~20:00".into()),
            interval: Some("20분".into()),
            stops: vec![
                placed("명동역", 37.5609, 126.9860),
                placed("을지로입구역", 37.5660, 126.9826),
                CatalogStop::new("회현역", None),
            ],
        },
    );

    let outcome = finalize(catalog, &config, now()).unwrap();

    assert!(outcome.repair.is_some());
    assert_eq!(
        outcome.report.validation.errors,
        vec!["[중구] route name missing".to_string()]
    );
    assert_eq!(outcome.document.districts[0].routes[0].name, "중구 셔틀");
    assert_eq!(outcome.document.districts[0].routes[0].stops.len(), 2);
}

#[test]
fn unnamed_district_is_dropped_by_the_repair_pass() {
    let config = CatalogConfig::seoul();
    let placed = |name: &str, lat: f64, lng: f64| {
        CatalogStop::new(name, Some(Coordinates::new(lat, lng)))
    };
    let route = |name: &str| CatalogRoute {
        name: name.into(),
        hours: Some("07:00~21:00".into()),
        interval: Some("15분".into()),
        stops: vec![
            placed("합정역", 37.5495, 126.9138),
            placed("망원역", 37.5561, 126.9102),
        ],
    };
    let catalog = RouteCatalog {
        districts: vec![
            DistrictRoutes {
                district: "".into(),
                routes: vec![route("무명 셔틀")],
            },
            DistrictRoutes {
                district: "마포구".into(),
                routes: vec![route("마포 순환")],
            },
        ],
    };

    let outcome = finalize(catalog, &config, now()).unwrap();

    let repair = outcome.repair.expect("an unnamed district triggers repair");
    assert_eq!(repair.districts_removed, 1);
    assert!(outcome.report.validation.valid, "{:?}", outcome.report.validation);
    let districts: Vec<_> = outcome
        .document
        .districts
        .iter()
        .map(|d| d.district.as_str())
        .collect();
    assert_eq!(districts, vec!["마포구"]);
}

#[test]
fn repair_is_idempotent_and_scores_stay_in_range() {
    let config = CatalogConfig::seoul();
    let inputs = vec![
        fragment("마포구", "합정역, 망원역, 부산역"),
        fragment("영등포구", "영등포역 1번출구\n여의도역\n운행 09:00~18:00 30분 간격"),
        fragment("강남구", "강남역 → 역삼역"),
    ];
    let engine = shuttle_routes_core::catalog::CatalogEngine::new(&config).unwrap();
    let (catalog, stats) = engine.geocode(engine.extract(&inputs), &station_geocoder());
    assert_eq!(stats.unresolved, 0);

    let repair = AutoRepair::new(&config);
    let (once, _) = repair.repair(catalog.clone());
    let (twice, _) = repair.repair(once.clone());
    assert_eq!(once, twice);

    let score = engine.finalize(catalog, now()).report.quality;
    assert!((0.0..=100.0).contains(&score.overall_score));
    assert_eq!(score.total_districts, 3);
    assert_eq!(score.district_coverage, 12.0);
}
