use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use opple_lights_rs::{
    Availability, BlockingDriver, CommandOutcome, Fixture, FixtureConfig, Link, PollReading,
    SimulatedDriver, TransportError, Tuning, Unblocking, WriteCommand,
};

fn config() -> FixtureConfig {
    FixtureConfig::from_json(r#"{"host": "10.0.0.42", "mac": "a4:c1:38:9e:10:02", "name": "Hallway"}"#)
        .unwrap()
}

fn fast_tuning() -> Tuning {
    Tuning {
        min_poll_interval: Duration::from_millis(50),
        retry_delay: Duration::from_millis(5),
        settle_delay: Duration::from_millis(5),
        ..Tuning::default()
    }
}

#[tokio::test(start_paused = true)]
async fn outage_and_recovery_scenario() {
    let driver = Arc::new(SimulatedDriver::online(200, 3000));
    let fixture = Fixture::new(config(), Arc::clone(&driver)).unwrap();
    assert_eq!(fixture.unique_id(), "opple_a4c1389e1002");

    fixture.refresh().await;
    assert!(fixture.available());

    // three offline answers exhaust the first cycle
    driver.set_link(Link::Offline);
    tokio::time::sleep(Duration::from_secs(5)).await;
    fixture.refresh().await;
    assert_eq!(fixture.consecutive_failures(), 1);
    assert!(fixture.available());

    tokio::time::sleep(Duration::from_secs(5)).await;
    fixture.refresh().await;
    assert_eq!(fixture.consecutive_failures(), 2);
    assert!(!fixture.available());

    // offline fixtures are never written to
    assert_eq!(fixture.turn_on(Some(300), None).await, CommandOutcome::Skipped);
    assert!(driver.writes().is_empty());

    driver.set_link(Link::Up);
    driver.set_device(true, 120, 4000);
    tokio::time::sleep(Duration::from_secs(5)).await;
    fixture.refresh().await;

    let state = fixture.state();
    assert!(state.available);
    assert!(state.power_on);
    assert_eq!(state.brightness.value(), 120);
    assert_eq!(state.color_temp.kelvin(), 4000);
    assert_eq!(fixture.consecutive_failures(), 0);
    assert!(fixture.record().last_known_available);

    // back online, commands go through and are verified
    assert_eq!(
        fixture.turn_on(Some(300), None).await,
        CommandOutcome::Verified(Availability::Online)
    );
    assert_eq!(fixture.brightness().value(), 255);
}

/// A blocking fixture that fails its first polls and flags overlapping calls.
#[derive(Default)]
struct FlakyBlocking {
    failures_left: AtomicUsize,
    in_flight: AtomicBool,
    overlapped: AtomicBool,
    polls: AtomicUsize,
    writes: Mutex<Vec<WriteCommand>>,
    device: Mutex<(bool, i64, i64)>,
}

impl FlakyBlocking {
    fn enter(&self) {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            self.overlapped.store(true, Ordering::SeqCst);
        }
        std::thread::sleep(Duration::from_millis(2));
    }

    fn leave(&self) {
        self.in_flight.store(false, Ordering::SeqCst);
    }
}

impl BlockingDriver for FlakyBlocking {
    fn poll(&self) -> Result<PollReading, TransportError> {
        self.enter();
        self.polls.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        let (power, brightness, color_temp) = *self.device.lock().unwrap();
        self.leave();

        if failing {
            return Err(TransportError::MalformedReply("truncated packet".into()));
        }
        Ok(PollReading {
            online: true,
            power,
            brightness,
            color_temp,
        })
    }

    fn write(&self, command: WriteCommand) -> Result<(), TransportError> {
        self.enter();
        self.writes.lock().unwrap().push(command);
        let mut device = self.device.lock().unwrap();
        match command {
            WriteCommand::Power(on) => device.0 = on,
            WriteCommand::Brightness(b) => device.1 = i64::from(b.value()),
            WriteCommand::ColorTemp(k) => device.2 = i64::from(k.kelvin()),
        }
        drop(device);
        self.leave();
        Ok(())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn blocking_driver_retries_through_transient_errors() {
    let blocking = FlakyBlocking {
        failures_left: AtomicUsize::new(2),
        device: Mutex::new((false, 90, 3500)),
        ..FlakyBlocking::default()
    };
    let fixture = Fixture::with_tuning(config(), fast_tuning(), Unblocking::new(blocking)).unwrap();

    assert_eq!(fixture.refresh().await, Some(Availability::Online));
    assert_eq!(fixture.driver().inner().polls.load(Ordering::SeqCst), 3);
    assert_eq!(fixture.brightness().value(), 90);
    assert!(!fixture.is_on());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_callers_never_overlap_on_the_device() {
    let blocking = FlakyBlocking {
        device: Mutex::new((true, 100, 3000)),
        ..FlakyBlocking::default()
    };
    let fixture = Arc::new(
        Fixture::with_tuning(config(), fast_tuning(), Unblocking::new(blocking)).unwrap(),
    );
    fixture.refresh().await;

    let mut tasks = Vec::new();
    for i in 0..8i64 {
        let fixture = Arc::clone(&fixture);
        tasks.push(tokio::spawn(async move {
            if i % 2 == 0 {
                fixture.set_brightness(50 + i).await;
            } else {
                fixture.refresh().await;
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let driver = fixture.driver().inner();
    assert!(!driver.overlapped.load(Ordering::SeqCst));
    assert_eq!(driver.writes.lock().unwrap().len(), 4);
    assert!(fixture.available());
    assert_eq!(fixture.consecutive_failures(), 0);
}
