//! End-to-end tests for the reactor server: JSON requests in, model tick,
//! JSON responses out.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

use cf_app::{PlantConfig, ReactorServer, Response, RunOptions, Runtime};
use cf_space::{StatusCode, Variant};

fn request(server: &ReactorServer, line: &str) -> Response {
    serde_json::from_str(&server.handle_line(line)).expect("response is valid JSON")
}

fn read_double(server: &ReactorServer, path: &str) -> f64 {
    let line = format!(r#"{{"op":"read","node":"{path}"}}"#);
    match request(server, &line) {
        Response::Value { value, .. } => match value.value {
            Some(Variant::Double(v)) => v,
            other => panic!("{path}: unexpected {other:?}"),
        },
        other => panic!("{path}: unexpected {other:?}"),
    }
}

fn write_double(server: &ReactorServer, path: &str, value: f64) -> StatusCode {
    let line = format!(
        r#"{{"op":"write","node":"{path}","value":{{"value":{{"Double":{value}}}}}}}"#
    );
    match request(server, &line) {
        Response::Written { status, .. } => status,
        other => panic!("{path}: unexpected {other:?}"),
    }
}

#[test]
fn valve_writes_reach_sensors_after_one_tick() {
    let t0 = Instant::now();
    let mut server = ReactorServer::build(&PlantConfig::default(), t0).unwrap();

    for (valve, value) in [("HC-1", 50.0), ("HC-2", 70.0), ("HC-3", 100.0)] {
        let path = format!("Valves/{valve}/MANUAL_OUTPUT");
        assert_eq!(write_double(&server, &path, value), StatusCode::GOOD);
    }
    assert_eq!(read_double(&server, "Sensors/FRA-1/PROCESS_VALUE"), 0.0);

    assert_eq!(server.run_pending(t0 + Duration::from_millis(1000)), 1);

    assert_eq!(read_double(&server, "Sensors/FRA-1/PROCESS_VALUE"), 144.0);
    assert_eq!(read_double(&server, "Sensors/TRA-1/PROCESS_VALUE"), 16.0);
    assert_eq!(read_double(&server, "Sensors/CRA-2/PROCESS_VALUE"), 0.0);
    let ca = read_double(&server, "Sensors/CRA-1/PROCESS_VALUE");
    assert!((ca - 0.357_142_857).abs() < 1e-9);
    assert_eq!(read_double(&server, "Valves/HC-2/MANUAL_OUTPUT"), 70.0);
}

#[test]
fn sensors_reject_client_writes() {
    let server = ReactorServer::build(&PlantConfig::default(), Instant::now()).unwrap();
    assert_eq!(
        write_double(&server, "Sensors/CRA-2/PROCESS_VALUE", 1.0),
        StatusCode::BAD_NOT_WRITABLE
    );
    assert_eq!(read_double(&server, "Sensors/CRA-2/PROCESS_VALUE"), 0.0);
}

#[test]
fn unknown_nodes_are_reported() {
    let server = ReactorServer::build(&PlantConfig::default(), Instant::now()).unwrap();
    match request(&server, r#"{"op":"read","node":"Sensors/XYZ/PROCESS_VALUE"}"#) {
        Response::Error { status, .. } => assert_eq!(status, StatusCode::BAD_NOT_FOUND),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn browse_reactor_folder() {
    let server = ReactorServer::build(&PlantConfig::default(), Instant::now()).unwrap();
    let Response::References { references, .. } =
        request(&server, r#"{"op":"browse","node":"Reactors/1-F"}"#)
    else {
        panic!("expected references");
    };
    assert!(references.iter().any(|r| r.browse_name == "REACTOR_VOLUME"));
}

#[test]
fn tcp_round_trip() {
    let config = PlantConfig {
        tick_period_ms: 10,
        listen: Some("127.0.0.1:0".into()),
        ..PlantConfig::default()
    };
    let mut runtime = Runtime::new(&config).unwrap();
    let addr = runtime.endpoint().unwrap().local_addr().unwrap();

    let client = std::thread::spawn(move || {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream
            .write_all(b"{\"op\":\"read\",\"node\":\"Reactors/1-F/REACTOR_VOLUME\"}\n")
            .unwrap();
        let mut line = String::new();
        BufReader::new(stream).read_line(&mut line).unwrap();
        line
    });

    let stop = AtomicBool::new(false);
    let summary = runtime.run_until(&stop, RunOptions { max_ticks: Some(50) });
    assert_eq!(summary.ticks, 50);
    assert_eq!(summary.requests, 1);

    let reply: Response = serde_json::from_str(client.join().unwrap().trim()).unwrap();
    match reply {
        Response::Value { value, .. } => assert_eq!(value.value, Some(Variant::Double(100.0))),
        other => panic!("unexpected {other:?}"),
    }
    runtime.shutdown();
}
