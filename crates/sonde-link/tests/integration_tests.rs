//! Integration tests for the sensor shell client
//!
//! These tests drive `SensorShell` end to end against a simulated shell
//! running over an in-memory link:
//! - Detection and the open/close lifecycle
//! - Analog and I2C decoding through the full query path
//! - Framing of fragmented replies
//! - Timeouts, malformed replies and buffer isolation between queries
//! - Mutual exclusion of concurrent queries

use std::io;
use std::sync::Arc;
use std::time::Duration;

use sonde_detect::{DeviceDetector, PortDescriptor};
use sonde_link::{ConnectionError, LinkConfig, PortOpener, QueryConfig, QueryError, SensorShell};
use sonde_protocol::{Channel, ParseError, SensorReading};
use sonde_sim::{spawn_virtual_shell, TapEvent, TrafficLog, TrafficTap, VirtualShell};
use tokio::io::DuplexStream;

// ============================================================================
// Helper Functions
// ============================================================================

mod helpers {
    use super::*;

    /// Opens an in-memory link to a fresh copy of a virtual shell
    pub struct VirtualOpener {
        pub shell: VirtualShell,
        pub log: TrafficLog,
        pub fail_with: Option<io::ErrorKind>,
    }

    impl PortOpener for VirtualOpener {
        type Io = TrafficTap<DuplexStream>;

        fn open(&self, _port_name: &str, config: &LinkConfig) -> io::Result<Self::Io> {
            assert_eq!(config.baud_rate(), 9600);
            if let Some(kind) = self.fail_with {
                return Err(io::Error::new(kind, "simulated open failure"));
            }
            let (host, _task) = spawn_virtual_shell(self.shell.clone());
            Ok(TrafficTap::new(host, self.log.clone()))
        }
    }

    pub type Client = SensorShell<Vec<PortDescriptor>, VirtualOpener>;

    /// Short deadlines so timeout paths finish quickly
    pub fn fast_config() -> QueryConfig {
        QueryConfig {
            timeout: Duration::from_millis(200),
            poll_interval: Duration::from_millis(2),
        }
    }

    /// A typical port list with the board in third position
    pub fn ports() -> Vec<PortDescriptor> {
        vec![
            PortDescriptor::new("/dev/ttyS0", None),
            PortDescriptor::new("/dev/ttyUSB0", Some(0x0403)),
            PortDescriptor::new("/dev/ttyACM0", Some(0x2341)),
        ]
    }

    pub fn client_with(ports: Vec<PortDescriptor>, shell: VirtualShell) -> (Client, TrafficLog) {
        let log = TrafficLog::new();
        let opener = VirtualOpener {
            shell,
            log: log.clone(),
            fail_with: None,
        };
        (SensorShell::new(ports, opener, fast_config()), log)
    }

    pub fn client(shell: VirtualShell) -> (Client, TrafficLog) {
        client_with(ports(), shell)
    }

    /// Create a client already connected to the shell
    pub async fn connected(shell: VirtualShell) -> (Client, TrafficLog) {
        let (client, log) = client(shell);
        client.detect_and_open().await.unwrap();
        (client, log)
    }

    /// Fail if a write appears while an earlier write still awaits its reply line
    pub fn assert_no_interleaving(events: &[TapEvent]) {
        let mut awaiting_reply: Option<&[u8]> = None;
        for event in events {
            match event {
                TapEvent::Write(data) => {
                    assert!(
                        awaiting_reply.is_none(),
                        "command {:?} written while reply to {:?} was outstanding",
                        String::from_utf8_lossy(data),
                        awaiting_reply.map(String::from_utf8_lossy)
                    );
                    awaiting_reply = Some(data);
                }
                TapEvent::Read(data) => {
                    if data.contains(&b'\n') {
                        awaiting_reply = None;
                    }
                }
            }
        }
    }
}

// ============================================================================
// Detection and Lifecycle Tests
// ============================================================================

mod lifecycle_tests {
    use super::*;

    #[tokio::test]
    async fn detect_and_open_picks_board_port() {
        let (client, _log) = helpers::client(VirtualShell::new("Bench"));

        let port = client.detect_and_open().await.unwrap();

        assert_eq!(port.name, "/dev/ttyACM0");
        assert!(client.is_open().await);
        assert_eq!(client.port_name().await.as_deref(), Some("/dev/ttyACM0"));
    }

    #[tokio::test]
    async fn no_device_found_is_reported() {
        let ports = vec![
            PortDescriptor::new("/dev/ttyS0", None),
            PortDescriptor::new("/dev/ttyUSB0", Some(0x0403)),
        ];
        let (client, _log) = helpers::client_with(ports, VirtualShell::new("Bench"));

        let err = client.detect_and_open().await.unwrap_err();

        assert!(matches!(
            err,
            ConnectionError::NoDeviceFound { vendor_id: 0x2341 }
        ));
        assert!(!client.is_open().await);
    }

    #[tokio::test]
    async fn detection_can_be_retried_after_board_appears() {
        let (client, _log) = helpers::client_with(Vec::new(), VirtualShell::new("Bench"));
        assert!(client.detect_and_open().await.is_err());

        // Same opener, board now listed
        let port = PortDescriptor::new("COM4", Some(0x2341));
        client.open(&port).await.unwrap();
        assert!(client.is_open().await);
    }

    #[tokio::test]
    async fn alternate_signature() {
        let ports = vec![
            PortDescriptor::new("COM3", Some(0x2341)),
            PortDescriptor::new("COM5", Some(0x2A03)),
        ];
        let (client, _log) = helpers::client_with(ports, VirtualShell::new("Bench"));
        let client = client.with_detector(DeviceDetector::with_vendor_id(0x2A03));

        assert_eq!(client.detect_and_open().await.unwrap().name, "COM5");
    }

    #[tokio::test]
    async fn open_failure_is_reported() {
        let opener = helpers::VirtualOpener {
            shell: VirtualShell::new("Bench"),
            log: TrafficLog::new(),
            fail_with: Some(io::ErrorKind::PermissionDenied),
        };
        let client = SensorShell::new(helpers::ports(), opener, helpers::fast_config());

        let err = client.detect_and_open().await.unwrap_err();

        assert!(matches!(
            err,
            ConnectionError::PortOpenFailed { ref port, .. } if port == "/dev/ttyACM0"
        ));
        assert!(!client.is_open().await);
    }

    #[tokio::test]
    async fn second_open_is_rejected() {
        let (client, _log) = helpers::connected(VirtualShell::new("Bench")).await;

        let err = client.detect_and_open().await.unwrap_err();

        assert!(matches!(err, ConnectionError::AlreadyOpen(ref p) if p == "/dev/ttyACM0"));
        assert!(client.is_open().await);
    }

    #[tokio::test]
    async fn close_twice_succeeds() {
        let (client, _log) = helpers::connected(VirtualShell::new("Bench")).await;

        client.close().await.unwrap();
        client.close().await.unwrap();
        assert!(!client.is_open().await);
    }

    #[tokio::test]
    async fn close_without_open_succeeds() {
        let (client, _log) = helpers::client(VirtualShell::new("Bench"));
        client.close().await.unwrap();
    }

    #[tokio::test]
    async fn reopen_after_close() {
        let mut shell = VirtualShell::new("Bench");
        shell.set_analog("A0", 9);
        let (client, _log) = helpers::connected(shell).await;

        client.close().await.unwrap();
        client.detect_and_open().await.unwrap();

        assert_eq!(client.query_sensor("A0").await.unwrap(), 9);
    }
}

// ============================================================================
// Query Tests
// ============================================================================

mod query_tests {
    use super::*;

    #[tokio::test]
    async fn analog_query() {
        let mut shell = VirtualShell::new("Bench");
        shell.set_analog("A0", 123);
        let (client, _log) = helpers::connected(shell).await;

        assert_eq!(client.query_sensor("A0").await.unwrap(), 123);
    }

    #[tokio::test]
    async fn i2c_query_present_device() {
        let mut shell = VirtualShell::new("Bench");
        shell.attach_i2c("i1", 3 * 256 + 232);
        let (client, _log) = helpers::connected(shell).await;

        assert_eq!(client.query_sensor("i1").await.unwrap(), 1000);

        let channel = Channel::new("i1").unwrap();
        assert_eq!(
            client.query(&channel).await.unwrap(),
            SensorReading::I2c(1000)
        );
    }

    #[tokio::test]
    async fn i2c_query_absent_device() {
        let (client, _log) = helpers::connected(VirtualShell::new("Bench")).await;

        assert_eq!(client.query_sensor("i5").await.unwrap(), -1);

        let channel = Channel::new("i5").unwrap();
        assert!(client.query(&channel).await.unwrap().is_absent());
    }

    #[tokio::test]
    async fn command_is_written_verbatim() {
        let (client, log) = helpers::connected(VirtualShell::new("Bench")).await;

        client.query_sensor("A10").await.unwrap();
        client.query_sensor("i2").await.unwrap();

        assert_eq!(log.writes(), vec![b"A10".to_vec(), b"i2".to_vec()]);
    }

    #[tokio::test]
    async fn fragmented_reply_is_framed() {
        let mut shell = VirtualShell::new("Bench");
        shell.attach_i2c("i3", 0xFFFF);
        shell.set_analog("A4", 1023);
        shell.set_fragment_size(Some(3));
        let (client, _log) = helpers::connected(shell).await;

        assert_eq!(client.query_sensor("i3").await.unwrap(), 65535);
        assert_eq!(client.query_sensor("A4").await.unwrap(), 1023);
    }

    #[tokio::test]
    async fn malformed_reply_is_parse_error() {
        let mut shell = VirtualShell::new("Bench");
        shell.set_raw_reply("A1", b"VALUE=abc\r\n".to_vec());
        let (client, _log) = helpers::connected(shell).await;

        let err = client.query_sensor("A1").await.unwrap_err();

        assert!(matches!(
            err,
            QueryError::Parse(ParseError::InvalidNumber(ref f)) if f == "abc"
        ));
    }

    #[tokio::test]
    async fn analog_reply_on_i2c_channel_is_parse_error() {
        let mut shell = VirtualShell::new("Bench");
        shell.set_raw_reply("i1", b"VALUE=1000\r\n".to_vec());
        let (client, _log) = helpers::connected(shell).await;

        assert!(matches!(
            client.query_sensor("i1").await,
            Err(QueryError::Parse(ParseError::MissingSeparator(_)))
        ));
    }

    #[tokio::test]
    async fn silent_channel_times_out() {
        let mut shell = VirtualShell::new("Bench");
        shell.set_silent("A2");
        let (client, _log) = helpers::connected(shell).await;

        let err = client.query_sensor("A2").await.unwrap_err();

        assert!(matches!(
            err,
            QueryError::ReadTimeout { ref channel, timeout_ms: 200 } if channel == "A2"
        ));
    }

    #[tokio::test]
    async fn timeout_releases_gate() {
        let mut shell = VirtualShell::new("Bench");
        shell.set_silent("A2");
        shell.set_analog("A0", 55);
        let (client, _log) = helpers::connected(shell).await;

        assert!(client.query_sensor("A2").await.is_err());
        assert_eq!(client.query_sensor("A0").await.unwrap(), 55);
    }

    #[tokio::test]
    async fn stale_bytes_do_not_reach_next_query() {
        let mut shell = VirtualShell::new("Bench");
        // Unterminated reply leaves bytes in the buffer when the query gives up
        shell.set_raw_reply("A9", b"VALUE=4".to_vec());
        shell.set_analog("A0", 12);
        let (client, _log) = helpers::connected(shell).await;

        assert!(matches!(
            client.query_sensor("A9").await,
            Err(QueryError::ReadTimeout { .. })
        ));
        assert_eq!(client.query_sensor("A0").await.unwrap(), 12);
    }

    #[tokio::test]
    async fn late_reply_is_not_taken_for_next_answer() {
        let mut shell = VirtualShell::new("Bench");
        shell.set_analog("A2", 777);
        shell.set_reply_delay("A2", Duration::from_millis(300));
        shell.set_analog("A0", 5);
        let (client, _log) = helpers::connected(shell).await;

        assert!(matches!(
            client.query_sensor("A2").await,
            Err(QueryError::ReadTimeout { .. })
        ));
        // The A2 reply lands after the deadline and before the next query
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(client.query_sensor("A0").await.unwrap(), 5);
    }

    #[tokio::test]
    async fn query_without_link_fails_write() {
        let (client, log) = helpers::client(VirtualShell::new("Bench"));

        assert!(matches!(
            client.query_sensor("A0").await,
            Err(QueryError::WriteFailed(_))
        ));
        assert!(log.events().is_empty());
    }

    #[tokio::test]
    async fn query_after_close_fails_write() {
        let (client, _log) = helpers::connected(VirtualShell::new("Bench")).await;
        client.close().await.unwrap();

        assert!(matches!(
            client.query_sensor("A0").await,
            Err(QueryError::WriteFailed(_))
        ));
    }

    #[tokio::test]
    async fn invalid_channel_is_rejected_before_writing() {
        let (client, log) = helpers::connected(VirtualShell::new("Bench")).await;

        assert!(matches!(
            client.query_sensor("").await,
            Err(QueryError::InvalidChannel(_))
        ));
        assert!(matches!(
            client.query_sensor("A0\n").await,
            Err(QueryError::InvalidChannel(_))
        ));
        assert!(log.writes().is_empty());
    }
}

// ============================================================================
// Concurrency Tests
// ============================================================================

mod concurrency_tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_queries_never_interleave() {
        let mut shell = VirtualShell::new("Bench");
        for pin in 0..8u32 {
            shell.set_analog(format!("A{}", pin), 100 + pin);
        }
        for addr in 0..4u16 {
            shell.attach_i2c(format!("i{}", addr), 1000 + addr);
        }
        // Replies arrive in pieces, widening the window for cross-talk
        shell.set_fragment_size(Some(2));
        let (client, log) = helpers::connected(shell).await;
        let client = Arc::new(client);

        let mut handles = Vec::new();
        for round in 0..3 {
            for pin in 0..8u32 {
                let client = Arc::clone(&client);
                handles.push(tokio::spawn(async move {
                    let value = client.query_sensor(&format!("A{}", pin)).await.unwrap();
                    assert_eq!(value, i64::from(100 + pin), "round {}", round);
                }));
            }
            for addr in 0..4u16 {
                let client = Arc::clone(&client);
                handles.push(tokio::spawn(async move {
                    let value = client.query_sensor(&format!("i{}", addr)).await.unwrap();
                    assert_eq!(value, i64::from(1000 + addr), "round {}", round);
                }));
            }
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let events = log.events();
        assert_eq!(log.writes().len(), 36);
        helpers::assert_no_interleaving(&events);
    }

    #[tokio::test]
    async fn cancelled_query_releases_gate() {
        let mut shell = VirtualShell::new("Bench");
        shell.set_silent("A2");
        shell.set_analog("A0", 7);
        let (client, _log) = helpers::connected(shell).await;

        // Abandon the query well before its own deadline
        let abandoned =
            tokio::time::timeout(Duration::from_millis(20), client.query_sensor("A2")).await;
        assert!(abandoned.is_err());

        assert_eq!(client.query_sensor("A0").await.unwrap(), 7);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn close_waits_for_in_flight_query() {
        let mut shell = VirtualShell::new("Bench");
        shell.set_silent("A2");
        let (client, log) = helpers::connected(shell).await;
        let client = Arc::new(client);

        let query = {
            let client = Arc::clone(&client);
            tokio::spawn(async move { client.query_sensor("A2").await })
        };
        // Let the query take the gate and write its command
        while log.writes().is_empty() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        client.close().await.unwrap();

        // The query ran to its own deadline instead of losing the link mid-read
        assert!(matches!(
            query.await.unwrap(),
            Err(QueryError::ReadTimeout { .. })
        ));
        assert!(!client.is_open().await);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn analog_round_trip(value in 0u32..=65535) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();

            let got = rt.block_on(async move {
                let mut shell = VirtualShell::new("Prop");
                shell.set_analog("A0", value);
                let (client, _log) = helpers::connected(shell).await;
                client.query_sensor("A0").await.unwrap()
            });

            prop_assert_eq!(got, i64::from(value));
        }

        #[test]
        fn i2c_round_trip(value in any::<u16>()) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();

            let got = rt.block_on(async move {
                let mut shell = VirtualShell::new("Prop");
                shell.attach_i2c("i1", value);
                shell.set_fragment_size(Some(1));
                let (client, _log) = helpers::connected(shell).await;
                client.query_sensor("i1").await.unwrap()
            });

            prop_assert_eq!(got, i64::from(value));
        }
    }
}
