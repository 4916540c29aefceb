//! End-to-end bridge scenarios over the mock transport.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use vdmx_core::protocol::constants::*;
use vdmx_core::{
    Bridge, BridgeEvent, BridgeObserver, Frame, MockTransport, SerialInputMode, SerialTransport,
    shutdown,
};

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<BridgeEvent>>,
}

impl Recorder {
    fn count(&self, pred: impl Fn(&BridgeEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| pred(e)).count()
    }
}

impl BridgeObserver for Recorder {
    fn on_event(&self, event: &BridgeEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

type TestBridge = Bridge<MockTransport, Recorder>;

fn setup() -> (Arc<MockTransport>, Arc<Recorder>, Arc<TestBridge>) {
    let mock = Arc::new(MockTransport::new());
    let recorder = Arc::new(Recorder::default());
    let bridge = Arc::new(Bridge::with_observer(
        Some(Arc::clone(&mock)),
        Arc::clone(&recorder),
    ));
    (mock, recorder, bridge)
}

fn wait_until(what: &str, cond: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn send_dmx_stops_forwarding_until_other_message() {
    let (mock, _recorder, bridge) = setup();

    bridge.on_serial_frame(&Frame::new(LABEL_SEND_DMX, vec![0; 25])).unwrap();
    assert_eq!(bridge.state().input_mode(), SerialInputMode::SendToSerialOnly);

    assert_eq!(bridge.on_network_frame(&[7; DMX_CHANNELS]).unwrap(), 0);
    assert!(mock.get_writes().is_empty());

    bridge.on_serial_frame(&Frame::new(LABEL_GET_SERIAL_NUMBER, Vec::new())).unwrap();
    assert_eq!(bridge.state().input_mode(), SerialInputMode::SendToSerialOnly);
    mock.clear_writes();

    bridge.on_serial_frame(&Frame::new(LABEL_RECV_DMX_ON_CHANGE, vec![0])).unwrap();
    assert_eq!(bridge.state().input_mode(), SerialInputMode::ReceiveFromSerial);

    assert_eq!(bridge.on_network_frame(&[7; DMX_CHANNELS]).unwrap(), 1);
    let frames = mock.written_frames();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].label, LABEL_RECV_DMX);
}

#[test]
fn get_params_reports_first_ten_user_config_bytes() {
    let (mock, _recorder, bridge) = setup();

    let user_config: Vec<u8> = (100..112).collect();
    let mut set = vec![12, 0, 30, 4, 25];
    set.extend(&user_config);
    bridge.on_serial_frame(&Frame::new(LABEL_SET_PARAMS, set)).unwrap();
    assert!(mock.get_writes().is_empty());

    bridge.on_serial_frame(&Frame::new(LABEL_GET_PARAMS, vec![10, 0])).unwrap();
    let frames = mock.written_frames();
    assert_eq!(frames.len(), 1);
    let reply = &frames[0].payload;
    assert_eq!(reply.len(), 15);
    assert_eq!(&reply[..5], &[FIRMWARE_VERSION_LSB, FIRMWARE_VERSION_MSB, 30, 4, 25]);
    assert_eq!(&reply[5..], &user_config[..10]);
}

#[test]
fn malformed_set_params_keeps_previous_values() {
    let (mock, recorder, bridge) = setup();

    bridge
        .on_serial_frame(&Frame::new(LABEL_SET_PARAMS, vec![2, 0, 50, 5, 10, 1, 2]))
        .unwrap();
    bridge
        .on_serial_frame(&Frame::new(LABEL_SET_PARAMS, vec![3, 0, 99, 99, 99, 1]))
        .unwrap();
    assert_eq!(
        recorder.count(|e| matches!(e, BridgeEvent::ParametersRejected { .. })),
        1
    );

    bridge.on_serial_frame(&Frame::new(LABEL_GET_PARAMS, vec![2, 0])).unwrap();
    assert_eq!(
        mock.written_frames()[0].payload,
        vec![FIRMWARE_VERSION_LSB, FIRMWARE_VERSION_MSB, 50, 5, 10, 1, 2]
    );
}

#[test]
fn serial_reader_answers_through_corruption() {
    let (mock, _recorder, bridge) = setup();
    let (trigger, signal) = shutdown::channel();

    let reader = {
        let bridge = Arc::clone(&bridge);
        thread::spawn(move || bridge.run_serial_reader(&signal))
    };

    // Corrupt frame (bad end marker), junk, then a valid request.
    let mut corrupt = Frame::new(LABEL_GET_PARAMS, vec![4, 0]).encode().unwrap();
    let last = corrupt.len() - 1;
    corrupt[last] = 0x00;
    mock.queue_bytes(&corrupt);
    mock.queue_bytes(&[0x12, 0x7E, 0xE7]);
    mock.queue_frame(&Frame::new(LABEL_GET_SERIAL_NUMBER, Vec::new()));

    wait_until("serial number reply", || !mock.written_frames().is_empty());
    assert_eq!(
        mock.written_frames(),
        vec![Frame::new(
            LABEL_GET_SERIAL_NUMBER,
            SERIAL_NUMBER.to_le_bytes().to_vec()
        )]
    );

    trigger.trigger();
    reader.join().unwrap().unwrap();
}

#[test]
fn serial_reader_exits_when_transport_closed() {
    let (mock, _recorder, bridge) = setup();
    let (_trigger, signal) = shutdown::channel();

    let reader = {
        let bridge = Arc::clone(&bridge);
        thread::spawn(move || bridge.run_serial_reader(&signal))
    };

    thread::sleep(Duration::from_millis(30));
    mock.close();
    reader.join().unwrap().unwrap();
    assert!(!mock.is_open());
}

#[test]
fn replies_and_dmx_never_interleave() {
    let (mock, _recorder, bridge) = setup();
    let (trigger, signal) = shutdown::channel();

    let reader = {
        let bridge = Arc::clone(&bridge);
        thread::spawn(move || bridge.run_serial_reader(&signal))
    };

    for _ in 0..50 {
        mock.queue_frame(&Frame::new(LABEL_GET_PARAMS, vec![100, 0]));
    }
    for i in 0..50u8 {
        bridge.on_network_frame(&[i; DMX_CHANNELS]).unwrap();
    }

    wait_until("all replies", || {
        mock.written_frames()
            .iter()
            .filter(|f| f.label == LABEL_GET_PARAMS)
            .count()
            == 50
    });
    trigger.trigger();
    reader.join().unwrap().unwrap();

    // Every write is exactly one well-formed frame.
    for write in mock.get_writes() {
        assert_eq!(write[0], START_OF_MESSAGE);
        assert_eq!(*write.last().unwrap(), END_OF_MESSAGE);
        let len = u16::from_le_bytes([write[2], write[3]]) as usize;
        assert_eq!(write.len(), len + FRAME_OVERHEAD);
    }
    assert_eq!(mock.written_frames().len(), 100);
}

#[test]
fn change_reporting_covers_exact_differences() {
    let (mock, _recorder, bridge) = setup();
    bridge.on_serial_frame(&Frame::new(LABEL_RECV_DMX_ON_CHANGE, vec![1])).unwrap();
    assert!(bridge.state().change_reporting());

    let mut first = [0u8; DMX_CHANNELS];
    for (i, b) in first.iter_mut().enumerate() {
        *b = (i % 200) as u8;
    }
    bridge.on_network_frame(&first).unwrap();
    mock.clear_writes();

    let mut second = first;
    let changed = [5usize, 6, 47, 48, 49, 300, 511];
    for &c in &changed {
        second[c] ^= 0xFF;
    }
    bridge.on_network_frame(&second).unwrap();

    let mut reported = Vec::new();
    for frame in mock.written_frames() {
        assert_eq!(frame.label, LABEL_RECV_DMX_CHANGE);
        let start = frame.payload[0] as usize * 8;
        let mask = &frame.payload[1..6];
        let mut values = frame.payload[6..].iter();
        for offset in 0..CHANGE_WINDOW_SLOTS {
            if mask[offset / 8] & (1 << (offset % 8)) != 0 {
                let channel = start + offset - 1;
                assert_eq!(values.next(), Some(&second[channel]));
                reported.push(channel);
            }
        }
        assert!(values.next().is_none());
    }
    reported.sort_unstable();
    assert_eq!(reported, changed);
}

#[test]
fn connectivity_events_are_edge_triggered() {
    let mock = Arc::new(MockTransport::new());
    let recorder = Arc::new(Recorder::default());
    let bridge = Arc::new(
        Bridge::with_observer(Some(Arc::clone(&mock)), Arc::clone(&recorder))
            .with_link_timeout(Duration::from_millis(60)),
    );
    let (trigger, signal) = shutdown::channel();
    let watchdog = bridge
        .spawn_watchdog(Duration::from_millis(10), signal)
        .unwrap();

    let established = |r: &Recorder| r.count(|e| matches!(e, BridgeEvent::ConnectionEstablished));
    let lost = |r: &Recorder| r.count(|e| matches!(e, BridgeEvent::ConnectionLost { .. }));

    for _ in 0..5 {
        bridge.on_network_frame(&[0; DMX_CHANNELS]).unwrap();
        thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(established(&recorder), 1);

    wait_until("link lost", || lost(&recorder) == 1);
    thread::sleep(Duration::from_millis(100));
    assert_eq!(lost(&recorder), 1);

    bridge.on_network_frame(&[0; DMX_CHANNELS]).unwrap();
    assert_eq!(established(&recorder), 2);

    trigger.trigger();
    watchdog.join();
}
