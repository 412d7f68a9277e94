use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use anyhow::{bail, Result};

use roadwatch::{
    AnalysisMode, AnalysisPayload, Detection, DisplaySink, FileConfig, Frame, MonitorConfig,
    MonitorSession, SourceConfig, VisionClient,
};

#[derive(Clone, Debug)]
struct CapturedRequest {
    request_line: String,
    headers: String,
    body: String,
}

/// Minimal stand-in for the vision API: answers every request with one
/// canned response and logs what it was sent. The accept thread lives
/// until the test binary exits.
struct MockVisionApi {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl MockVisionApi {
    fn spawn(status_line: &'static str, response_body: &'static str) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let addr = listener.local_addr()?;
        let requests = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&requests);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { continue };
                if let Ok(captured) = read_request(&mut stream) {
                    log.lock().unwrap().push(captured);
                }
                let _ = write_response(&mut stream, status_line, response_body);
            }
        });
        Ok(Self { addr, requests })
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

fn read_request(stream: &mut TcpStream) -> Result<CapturedRequest> {
    stream.set_read_timeout(Some(Duration::from_secs(2)))?;
    let mut buf = [0u8; 1024];
    let mut data = Vec::new();
    let header_end = loop {
        let n = stream.read(&mut buf)?;
        if n == 0 {
            bail!("connection closed before headers");
        }
        data.extend_from_slice(&buf[..n]);
        if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&data[..header_end]).to_string();
    let content_length = head
        .lines()
        .find_map(|line| {
            let (key, value) = line.split_once(':')?;
            if key.trim().eq_ignore_ascii_case("content-length") {
                value.trim().parse::<usize>().ok()
            } else {
                None
            }
        })
        .unwrap_or(0);

    while data.len() < header_end + content_length {
        let n = stream.read(&mut buf)?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);
    }

    let request_line = head.lines().next().unwrap_or("").to_string();
    let body = String::from_utf8_lossy(&data[header_end..]).to_string();
    Ok(CapturedRequest {
        request_line,
        headers: head,
        body,
    })
}

fn write_response(stream: &mut TcpStream, status_line: &str, body: &str) -> Result<()> {
    let response = format!(
        "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(response.as_bytes())?;
    Ok(())
}

/// An endpoint that accepts connections and reads requests but never
/// answers. Clients have to give up on their own timeout.
fn spawn_stalled_endpoint() -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            let _ = read_request(&mut stream);
            // Hold the socket open well past any client timeout.
            thread::sleep(Duration::from_secs(5));
        }
    });
    Ok(format!("http://{}", addr))
}

#[derive(Clone, Default)]
struct RecordingSink {
    overlays: Arc<Mutex<usize>>,
    statuses: Arc<Mutex<Vec<String>>>,
}

impl DisplaySink for RecordingSink {
    fn present_frame(&mut self, _frame: &Frame) {}

    fn overlay_changed(&mut self, _detections: &[Detection]) {
        *self.overlays.lock().unwrap() += 1;
    }

    fn status(&mut self, text: &str) {
        self.statuses.lock().unwrap().push(text.to_string());
    }
}

impl RecordingSink {
    fn statuses(&self) -> Vec<String> {
        self.statuses.lock().unwrap().clone()
    }

    fn overlay_updates(&self) -> usize {
        *self.overlays.lock().unwrap()
    }
}

fn clip_source() -> SourceConfig {
    SourceConfig::File(FileConfig {
        path: "stub://clip".to_string(),
        width: 64,
        height: 48,
    })
}

fn mock_config(api: &MockVisionApi) -> MonitorConfig {
    MonitorConfig {
        access_token: "test-token".to_string(),
        vehicle_detect_url: api.url("/vehicle_detect"),
        vehicle_recognize_url: api.url("/car"),
        people_count_url: api.url("/body_num"),
        // Sample every frame so the tests never wait for a long cadence.
        sample_interval: 1,
        ..MonitorConfig::default()
    }
}

#[test]
fn client_posts_token_and_form_encoded_image() -> Result<()> {
    let api = MockVisionApi::spawn("HTTP/1.1 200 OK", r#"{"person_num": 7}"#)?;
    let client = VisionClient::new("secret-token", Duration::from_secs(5));

    let payload = client.analyze(&api.url("/body_num"), AnalysisMode::PeopleCount, "QUJD")?;
    assert_eq!(payload, AnalysisPayload::PeopleCount(7));

    let requests = api.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert!(
        request
            .request_line
            .starts_with("POST /body_num?access_token=secret-token"),
        "unexpected request line: {}",
        request.request_line
    );
    assert!(request
        .headers
        .to_lowercase()
        .contains("application/x-www-form-urlencoded"));
    assert_eq!(request.body, "image=QUJD");
    Ok(())
}

#[test]
fn http_error_carries_mode_and_status_code() -> Result<()> {
    let api = MockVisionApi::spawn(
        "HTTP/1.1 500 Internal Server Error",
        r#"{"error_msg": "internal error"}"#,
    )?;
    let client = VisionClient::new("secret-token", Duration::from_secs(5));

    let err = client
        .analyze(
            &api.url("/vehicle_detect"),
            AnalysisMode::VehicleDetection,
            "QUJD",
        )
        .expect_err("500 should fail");
    let message = err.to_string();
    assert!(message.contains("vehicle detection"), "got: {}", message);
    assert!(message.contains("500"), "got: {}", message);
    Ok(())
}

#[test]
fn stalled_endpoint_times_out_and_carries_mode() -> Result<()> {
    let endpoint = spawn_stalled_endpoint()?;
    let client = VisionClient::new("secret-token", Duration::from_millis(300));

    let started = std::time::Instant::now();
    let err = client
        .analyze(
            &format!("{endpoint}/vehicle_detect"),
            AnalysisMode::VehicleDetection,
            "QUJD",
        )
        .expect_err("stalled endpoint should fail");
    assert!(
        started.elapsed() < Duration::from_secs(2),
        "client waited on the socket instead of timing out"
    );
    let message = err.to_string();
    assert!(message.contains("vehicle detection"), "got: {}", message);
    assert!(message.contains("request error"), "got: {}", message);
    Ok(())
}

#[test]
fn malformed_response_body_is_reported() -> Result<()> {
    let api = MockVisionApi::spawn("HTTP/1.1 200 OK", "today's soup is leek")?;
    let client = VisionClient::new("secret-token", Duration::from_secs(5));

    let err = client
        .analyze(
            &api.url("/vehicle_detect"),
            AnalysisMode::VehicleDetection,
            "QUJD",
        )
        .expect_err("non-JSON body should fail");
    assert!(err.to_string().contains("malformed"));
    Ok(())
}

#[test]
fn session_reconciles_people_count_over_http() -> Result<()> {
    let api = MockVisionApi::spawn("HTTP/1.1 200 OK", r#"{"person_num": 5}"#)?;
    let sink = RecordingSink::default();
    let mut session = MonitorSession::new(
        mock_config(&api),
        clip_source(),
        AnalysisMode::PeopleCount,
        Box::new(sink.clone()),
    );
    session.start()?;

    let expected = "people count result: 5 person(s)";
    let mut seen = false;
    for _ in 0..300 {
        session.tick();
        if sink.statuses().iter().any(|s| s == expected) {
            seen = true;
            break;
        }
        thread::sleep(Duration::from_millis(5));
    }
    assert!(seen, "people count status never surfaced");
    assert!(api.requests().iter().any(|r| r.body.starts_with("image=")));

    session.stop();
    Ok(())
}

#[test]
fn identical_vehicle_results_redraw_the_overlay_once() -> Result<()> {
    let body = r#"{"vehicle_info": [
        {"type": "car", "location": {"left": 10, "top": 20, "width": 30, "height": 40}}
    ]}"#;
    let api = MockVisionApi::spawn("HTTP/1.1 200 OK", body)?;
    let sink = RecordingSink::default();
    let mut session = MonitorSession::new(
        mock_config(&api),
        clip_source(),
        AnalysisMode::VehicleDetection,
        Box::new(sink.clone()),
    );
    session.start()?;

    for _ in 0..300 {
        session.tick();
        if api.requests().len() >= 3 {
            break;
        }
        thread::sleep(Duration::from_millis(5));
    }
    // Let the in-flight responses come back and drain.
    for _ in 0..50 {
        session.tick();
        thread::sleep(Duration::from_millis(2));
    }

    assert!(api.requests().len() >= 3);
    assert_eq!(sink.overlay_updates(), 1, "identical lists must not redraw");
    assert_eq!(session.detections().len(), 1);
    assert_eq!(session.detections()[0].category, "car");

    session.stop();
    Ok(())
}
