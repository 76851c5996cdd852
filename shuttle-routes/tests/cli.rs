use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::{tempdir, TempDir};

use shuttle_routes::load_config::{DATA_DIR_ENV, SOURCE_ENV};

const GEOCODED: &str = r#"{"districts": [
  {"district": "영등포구", "routes": [
    {"name": "영등포 순환", "hours": "09:00~18:00", "interval": "30분", "stops": [
      {"name": "영등포역 1번출구", "lat": 37.5156, "lng": 126.9074},
      {"name": "여의도역", "lat": 37.5216, "lng": 126.9244}
    ]}
  ]}
]}"#;

/// A data directory holding a config file and, optionally, a geocoded catalog.
fn workspace(with_catalog: bool) -> TempDir {
    let dir = tempdir().expect("Creating temp dir failed");
    let data_dir = dir.path().join("data");
    fs::create_dir_all(data_dir.join("processed")).unwrap();
    if with_catalog {
        fs::write(data_dir.join("processed/geocoded_routes.json"), GEOCODED).unwrap();
    }
    fs::write(
        dir.path().join("config.yaml"),
        format!("data_dir: {}\nsource: 테스트\n", data_dir.display()),
    )
    .expect("Writing temp config failed");
    dir
}

fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("shuttle-routes").expect("Binary exists");
    cmd.env_remove(DATA_DIR_ENV).env_remove(SOURCE_ENV);
    cmd
}

#[test]
fn run_validate_mode_publishes_catalog() {
    let dir = workspace(true);

    cmd()
        .arg("run")
        .arg("--config")
        .arg(dir.path().join("config.yaml"))
        .args(["--mode", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Pipeline completed: 1 completed, 0 failed"));

    let published: serde_json::Value =
        serde_json::from_slice(&fs::read(dir.path().join("data/shuttle_routes.json")).unwrap())
            .unwrap();
    assert_eq!(published["source"], "테스트");
    assert_eq!(published["districts"][0]["district"], "영등포구");
    assert!(dir.path().join("data/processed/validation_report.json").exists());
}

#[test]
fn run_exits_with_failure_when_a_stage_fails() {
    let dir = workspace(false);

    cmd()
        .arg("run")
        .arg("--config")
        .arg(dir.path().join("config.yaml"))
        .args(["--stages", "validate"])
        .assert()
        .code(1)
        .stdout(
            predicate::str::contains("completed_with_errors")
                .and(predicate::str::contains("geocoded_routes.json")),
        );

    assert!(dir.path().join("data/processed/pipeline_report.json").exists());
}

#[test]
fn run_rejects_unknown_stage_names() {
    let dir = workspace(false);

    cmd()
        .arg("run")
        .arg("--config")
        .arg(dir.path().join("config.yaml"))
        .args(["--skip", "crawler"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn update_mode_is_accepted_on_the_command_line() {
    use clap::Parser;
    use shuttle_routes::stages::Mode;
    use shuttle_routes::{Cli, Commands};

    let cli = Cli::try_parse_from(["shuttle-routes", "run", "--config", "c.yaml", "--mode", "update"])
        .unwrap();
    match cli.command {
        Commands::Run { mode, .. } => assert_eq!(mode, Mode::Update),
        _ => panic!("expected the run command"),
    }
}

#[test]
fn doctor_reports_ocr_capability() {
    cmd()
        .arg("doctor")
        .assert()
        .stdout(predicate::str::contains("OCR: ready").or(predicate::str::contains("OCR: missing")));
}

use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{layer::Context, Layer, Registry};

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        self.events.lock().unwrap().push(format!("{:?}", event));
    }
}

#[tokio::test]
async fn emits_trace_initialised_event() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use shuttle_routes::cli::{run, Cli, Commands};
    use shuttle_routes::stages::Mode;

    // A missing config file still gets far enough to trace startup.
    let cli = Cli {
        command: Commands::Run {
            config: std::path::PathBuf::from("dummy.yaml"),
            mode: Mode::Validate,
            stages: vec![],
            skip: vec![],
            stop_on_error: false,
        },
    };

    assert!(run(cli).await.is_err());

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
}
