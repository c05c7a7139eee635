//! # Session Scenario Tests
//!
//! End-to-end runs of a printer session against the simulated printer, on a
//! paused tokio clock so heartbeat intervals pass instantly.

use std::time::Duration;

use etiqueta::compose::{
    BoundingRegion, CanvasItem, CanvasSnapshot, export_to_image, rotate_for_feed,
};
use etiqueta::device::SimulatedPrinter;
use etiqueta::printer::{DeviceTable, DeviceTarget};
use etiqueta::session::{
    ConnectionState, EventStream, HEARTBEAT_INTERVAL, Orchestrator, PrintJobState, PrintRequest,
    SessionEvent, SessionSnapshot,
};
use image::{Rgba, RgbaImage};
use pretty_assertions::assert_eq;
use tokio::sync::watch;

fn drain(events: &mut EventStream) -> Vec<SessionEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

fn label() -> RgbaImage {
    let canvas = CanvasSnapshot::new(300, 120)
        .with_item(CanvasItem::text(
            "name",
            8.0,
            8.0,
            RgbaImage::from_pixel(60, 16, Rgba([0, 0, 0, 255])),
        ))
        .with_region(BoundingRegion::new("label", 0.0, 0.0, 240.0, 96.0));
    let composite = export_to_image(&canvas, "label").unwrap();
    rotate_for_feed(composite.image())
}

/// Record every print-job state the session publishes.
fn record_print_jobs(
    mut rx: watch::Receiver<SessionSnapshot>,
) -> tokio::task::JoinHandle<Vec<PrintJobState>> {
    tokio::spawn(async move {
        let mut seen = vec![rx.borrow_and_update().print_job];
        while rx.changed().await.is_ok() {
            let state = rx.borrow_and_update().print_job;
            if seen.last() != Some(&state) {
                seen.push(state);
            }
        }
        seen
    })
}

#[tokio::test(start_paused = true)]
async fn connect_heartbeat_print() {
    let table = DeviceTable::built_in();
    let model = table.require("d110").unwrap();
    let (printer, probe) = SimulatedPrinter::new();
    probe.set_print_latency(Duration::from_secs(7));

    let (session, mut events) = Orchestrator::spawn(printer, HEARTBEAT_INTERVAL);
    let jobs = record_print_jobs(session.watch());

    let target = DeviceTarget::new("00:11:22:33:44:55").unwrap();
    assert!(session.connect(target).await.unwrap());

    // Heartbeats at 0s, 5s, 10s all report connected
    tokio::time::sleep(Duration::from_millis(10_500)).await;
    assert_eq!(probe.heartbeat_calls(), 3);
    let before_print = drain(&mut events);
    let beats: Vec<_> = before_print
        .iter()
        .filter(|e| matches!(e, SessionEvent::ConnectionChanged { raw: Some(_), .. }))
        .collect();
    assert_eq!(beats.len(), 3);
    assert!(beats.iter().all(|e| matches!(
        e,
        SessionEvent::ConnectionChanged {
            connected: true,
            ..
        }
    )));

    let request = PrintRequest::new(label(), 3, 1, model).unwrap();
    let calls_before = probe.heartbeat_calls();
    assert!(session.print(request).await.unwrap());

    // The 15s tick fell inside the print; it runs late, once the job is done
    assert!(probe.heartbeat_calls() <= calls_before + 1);
    assert_eq!(probe.heartbeats_during_print(), 0);
    assert_eq!(session.print_job(), PrintJobState::Idle);

    let after_print = drain(&mut events);
    assert_eq!(
        after_print.first(),
        Some(&SessionEvent::PrintCompleted { success: true })
    );

    let printed = probe.jobs();
    assert_eq!(printed.len(), 1);
    assert_eq!((printed[0].width, printed[0].height), (96, 240));

    session.shutdown().await;
    assert_eq!(
        jobs.await.unwrap(),
        vec![
            PrintJobState::Idle,
            PrintJobState::InProgress,
            PrintJobState::Idle
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn device_loss_then_reconnect() {
    let (printer, probe) = SimulatedPrinter::new();
    let (session, mut events) = Orchestrator::spawn(printer, HEARTBEAT_INTERVAL);
    let target = DeviceTarget::new("AA:BB:CC:DD:EE:FF").unwrap();

    assert!(session.connect(target.clone()).await.unwrap());
    tokio::time::sleep(Duration::from_secs(1)).await;

    probe.drop_link();
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(session.connection_state(), ConnectionState::Disconnected);
    assert_eq!(probe.disconnect_calls(), 0);

    // The user reconnects once the printer is back in range
    assert!(session.connect(target.clone()).await.unwrap());
    assert_eq!(session.snapshot().target, Some(target));
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(session.connection_state(), ConnectionState::Connected);

    let connected: Vec<bool> = drain(&mut events)
        .into_iter()
        .filter_map(|e| match e {
            SessionEvent::ConnectionChanged { connected, .. } => Some(connected),
            SessionEvent::PrintCompleted { .. } => None,
        })
        .collect();
    // connect, beat, loss, reconnect, beat
    assert_eq!(connected, vec![true, true, false, true, true]);
}

#[tokio::test(start_paused = true)]
async fn double_connect_never_corrupts_state() {
    let (printer, probe) = SimulatedPrinter::new();
    probe.set_latency(Duration::from_millis(500));
    let (session, _events) = Orchestrator::spawn(printer, HEARTBEAT_INTERVAL);
    let target = DeviceTarget::new("00:11:22:33:44:55").unwrap();

    for _ in 0..3 {
        let _ = tokio::join!(
            session.connect(target.clone()),
            session.connect(target.clone())
        );
        let state = session.connection_state();
        assert!(
            state == ConnectionState::Connected || state == ConnectionState::Disconnected,
            "unsettled state {:?}",
            state
        );
        if state == ConnectionState::Connected {
            session.disconnect().await.unwrap();
        }
    }
    assert_eq!(session.connection_state(), ConnectionState::Disconnected);
}
