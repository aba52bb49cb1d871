use chrono::{NaiveDate, NaiveDateTime};
use osc_watch::core::scheduler::{self, Clock, RunEvent, SchedulerConfig, TickSources};
use osc_watch::core::{GpuProvider, GpuSample, GpuVendor};
use osc_watch::osc::{OscArg, OscMessage, UdpOscClient};
use osc_watch::Result;
use std::net::UdpSocket;
use std::time::Duration;

struct FixedClock(NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

struct FixedGpu(u32, u32);

impl GpuProvider for FixedGpu {
    fn vendor(&self) -> GpuVendor {
        GpuVendor::Radeon
    }

    fn name(&self) -> String {
        "fixed".to_string()
    }

    fn sample(&mut self) -> Result<GpuSample> {
        Ok(GpuSample::clamped(self.0, self.1))
    }
}

fn receiver() -> (UdpSocket, u16) {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    socket
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    let port = socket.local_addr().unwrap().port();
    (socket, port)
}

fn recv(socket: &UdpSocket) -> OscMessage {
    let mut buf = [0u8; 1024];
    let (len, _) = socket.recv_from(&mut buf).unwrap();
    OscMessage::decode(&buf[..len]).unwrap()
}

fn sources(port: u16, gpu: FixedGpu) -> TickSources {
    let clock = NaiveDate::from_ymd_opt(2024, 6, 1)
        .unwrap()
        .and_hms_opt(23, 59, 30)
        .unwrap();
    TickSources {
        clock: Box::new(FixedClock(clock)),
        gpu: Box::new(gpu),
        sender: Box::new(UdpOscClient::connect("127.0.0.1", port).unwrap()),
    }
}

fn int_value(msg: &OscMessage) -> i32 {
    match msg.args.as_slice() {
        [OscArg::Int(v)] => *v,
        other => panic!("expected one int argument, got {:?}", other),
    }
}

#[test]
fn test_first_tick_sends_every_digit_in_order() {
    let (socket, port) = receiver();
    let config = SchedulerConfig::new("127.0.0.1", port, 60.0).unwrap();

    let handle = scheduler::start(config, sources(port, FixedGpu(42, 17)), None).unwrap();

    let received: Vec<(String, i32)> = (0..8)
        .map(|_| {
            let msg = recv(&socket);
            let value = int_value(&msg);
            (msg.address, value)
        })
        .collect();

    assert_eq!(
        received,
        vec![
            ("/avatar/parameters/HourTenPlace".to_string(), 2),
            ("/avatar/parameters/HourZeroPlace".to_string(), 3),
            ("/avatar/parameters/MinuteTenPlace".to_string(), 5),
            ("/avatar/parameters/MinuteZeroPlace".to_string(), 9),
            ("/avatar/parameters/GPUTenPlace".to_string(), 4),
            ("/avatar/parameters/GPUZeroPlace".to_string(), 2),
            ("/avatar/parameters/VRAMTenPlace".to_string(), 1),
            ("/avatar/parameters/VRAMZeroPlace".to_string(), 7),
        ]
    );

    handle.stop();
}

#[test]
fn test_unchanged_values_resent_every_tick_when_sync_matches_interval() {
    let (socket, port) = receiver();
    let config = SchedulerConfig::new("127.0.0.1", port, 0.05).unwrap();
    assert_eq!(config.sync_count(), 1);

    let handle = scheduler::start(config, sources(port, FixedGpu(42, 17)), None).unwrap();

    let first: Vec<OscMessage> = (0..8).map(|_| recv(&socket)).collect();
    let second: Vec<OscMessage> = (0..8).map(|_| recv(&socket)).collect();
    assert_eq!(first, second);

    handle.stop();
}

#[test]
fn test_chat_follows_parameters_and_updates_live() {
    let (socket, port) = receiver();
    let config = SchedulerConfig::new("127.0.0.1", port, 0.05)
        .unwrap()
        .with_sync_interval(3600.0)
        .unwrap();

    let handle = scheduler::start(
        config,
        sources(port, FixedGpu(0, 0)),
        Some(" first ".to_string()),
    )
    .unwrap();

    for _ in 0..8 {
        assert!(recv(&socket).address.starts_with("/avatar/parameters/"));
    }
    let chat = recv(&socket);
    assert_eq!(chat.address, "/chatbox/input");
    assert_eq!(
        chat.args,
        vec![
            OscArg::Str("first".to_string()),
            OscArg::Bool(true),
            OscArg::Bool(false)
        ]
    );

    handle.set_chat(Some("second".to_string()));

    // Digits are unchanged and far from resync, so only chat arrives now
    let mut saw_second = false;
    for _ in 0..20 {
        let msg = recv(&socket);
        assert_eq!(msg.address, "/chatbox/input");
        if msg.args.first() == Some(&OscArg::Str("second".to_string())) {
            saw_second = true;
            break;
        }
    }
    assert!(saw_second);

    handle.stop();
}

#[test]
fn test_stop_ends_transmission() {
    let (socket, port) = receiver();
    let config = SchedulerConfig::new("127.0.0.1", port, 0.05).unwrap();

    let handle = scheduler::start(config, sources(port, FixedGpu(10, 20)), None).unwrap();
    for _ in 0..8 {
        recv(&socket);
    }

    let gpu = handle.stop().unwrap();
    assert_eq!(gpu.name(), "fixed");

    // Drain anything already in flight, then expect silence
    socket
        .set_read_timeout(Some(Duration::from_millis(300)))
        .unwrap();
    let mut buf = [0u8; 1024];
    while socket.recv_from(&mut buf).is_ok() {}
    assert!(socket.recv_from(&mut buf).is_err());
}

#[test]
fn test_fatal_gpu_error_ends_run() {
    struct MissingDriver;

    impl GpuProvider for MissingDriver {
        fn vendor(&self) -> GpuVendor {
            GpuVendor::Nvidia
        }

        fn name(&self) -> String {
            "missing".to_string()
        }

        fn sample(&mut self) -> Result<GpuSample> {
            Err(osc_watch::WatchError::driver_missing("nvml not loaded"))
        }
    }

    let (socket, port) = receiver();
    let config = SchedulerConfig::new("127.0.0.1", port, 0.05).unwrap();
    let mut sources = sources(port, FixedGpu(0, 0));
    sources.gpu = Box::new(MissingDriver);

    let handle = scheduler::start(config, sources, Some("hello".to_string())).unwrap();

    let event = handle.recv_event_timeout(Duration::from_secs(5));
    assert!(matches!(event, Some(RunEvent::Fatal(ref e)) if e.is_fatal()));
    assert!(!handle.is_running());

    socket
        .set_read_timeout(Some(Duration::from_millis(200)))
        .unwrap();
    let mut buf = [0u8; 64];
    assert!(socket.recv_from(&mut buf).is_err());

    handle.stop();
}

/// Blocks inside `sample` until released, so a stop can land mid-tick.
struct GatedGpu {
    entered: std::sync::mpsc::Sender<()>,
    release: std::sync::mpsc::Receiver<()>,
}

impl GpuProvider for GatedGpu {
    fn vendor(&self) -> GpuVendor {
        GpuVendor::Nvidia
    }

    fn name(&self) -> String {
        "gated".to_string()
    }

    fn sample(&mut self) -> Result<GpuSample> {
        let _ = self.entered.send(());
        let _ = self.release.recv_timeout(Duration::from_secs(5));
        Ok(GpuSample::clamped(42, 17))
    }
}

#[test]
fn test_stop_during_tick_lets_tick_finish_then_sends_nothing() {
    use std::sync::mpsc;
    use std::thread;

    let (socket, port) = receiver();
    let config = SchedulerConfig::new("127.0.0.1", port, 0.05).unwrap();

    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let mut sources = sources(port, FixedGpu(0, 0));
    sources.gpu = Box::new(GatedGpu {
        entered: entered_tx,
        release: release_rx,
    });

    let handle = scheduler::start(config, sources, None).unwrap();
    entered_rx.recv_timeout(Duration::from_secs(5)).unwrap();

    // stop() joins the worker, so it waits for the tick in flight
    let stopper = thread::spawn(move || handle.stop());
    thread::sleep(Duration::from_millis(100));
    assert!(!stopper.is_finished());

    release_tx.send(()).unwrap();
    let gpu = stopper.join().unwrap().unwrap();
    assert_eq!(gpu.name(), "gated");

    // The started tick completed in full
    let received: Vec<i32> = (0..8).map(|_| int_value(&recv(&socket))).collect();
    assert_eq!(received, vec![2, 3, 5, 9, 4, 2, 1, 7]);

    // No second tick began
    assert!(entered_rx.try_recv().is_err());
    socket
        .set_read_timeout(Some(Duration::from_millis(300)))
        .unwrap();
    let mut buf = [0u8; 1024];
    assert!(socket.recv_from(&mut buf).is_err());
}
