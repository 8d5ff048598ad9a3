// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use device_tracker::channel::ReportingChannel;
use device_tracker::db::{paths, MemoryDb};
use device_tracker::gates::{
    Availability, Capability, Notice, Notifier, PermissionAuthority, PermissionDecision,
    ServiceAvailability,
};
use device_tracker::identity::MemoryIdentityStore;
use device_tracker::location::{
    FixStream, IntervalPolicy, LocationProvider, LocationSource, SourceError,
};
use device_tracker::models::{LocationFix, RemoteRecord};
use device_tracker::services::{ActivationController, Uploader};
use futures_util::future::BoxFuture;
use futures_util::StreamExt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Provider whose fixes are pushed by the test.
#[derive(Default)]
pub struct ScriptedProvider {
    sender: Mutex<Option<mpsc::UnboundedSender<LocationFix>>>,
    pub unavailable: AtomicBool,
    pub opens: AtomicUsize,
    pub releases: AtomicUsize,
}

#[allow(dead_code)]
impl ScriptedProvider {
    /// Feed a fix into the open stream. Returns false if nothing is listening.
    pub fn emit(&self, fix: LocationFix) -> bool {
        self.sender
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|tx| tx.send(fix).is_ok())
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

impl LocationProvider for ScriptedProvider {
    fn is_available(&self) -> bool {
        !self.unavailable.load(Ordering::SeqCst)
    }

    fn open(&self, _policy: &IntervalPolicy) -> Result<FixStream, SourceError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let (tx, mut rx) = mpsc::unbounded_channel();
        *self.sender.lock().unwrap() = Some(tx);
        Ok(futures_util::stream::poll_fn(move |cx| rx.poll_recv(cx)).boxed())
    }

    fn release(&self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

/// Permission authority answered by the test, possibly later.
pub struct ScriptedPermission {
    answer: watch::Sender<Option<PermissionDecision>>,
    pub requests: AtomicUsize,
}

#[allow(dead_code)]
impl ScriptedPermission {
    pub fn new(answer: Option<PermissionDecision>) -> Self {
        Self {
            answer: watch::channel(answer).0,
            requests: AtomicUsize::new(0),
        }
    }

    pub fn answer(&self, decision: PermissionDecision) {
        self.answer.send_replace(Some(decision));
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl PermissionAuthority for ScriptedPermission {
    fn request(&self, _capability: Capability) -> BoxFuture<'_, PermissionDecision> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let mut rx = self.answer.subscribe();
        Box::pin(async move {
            let decision = *rx
                .wait_for(Option::is_some)
                .await
                .expect("permission sender dropped");
            decision.expect("checked by wait_for")
        })
    }
}

pub struct FixedAvailability {
    pub result: Availability,
    pub checks: AtomicUsize,
    /// Blocks the next check for this long, like a slow platform query.
    pub stall: Mutex<Option<Duration>>,
}

impl ServiceAvailability for FixedAvailability {
    fn check(&self) -> Availability {
        self.checks.fetch_add(1, Ordering::SeqCst);
        let stall = self.stall.lock().unwrap().take();
        if let Some(stall) = stall {
            std::thread::sleep(stall);
        }
        self.result.clone()
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

#[allow(dead_code)]
impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn count(&self, notice: &Notice) -> usize {
        self.notices().iter().filter(|n| *n == notice).count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

/// A fully wired pipeline with scripted collaborators.
#[allow(dead_code)]
pub struct Harness {
    pub controller: Arc<ActivationController>,
    pub channel: ReportingChannel,
    pub provider: Arc<ScriptedProvider>,
    pub permission: Arc<ScriptedPermission>,
    pub availability: Arc<FixedAvailability>,
    pub notifier: Arc<RecordingNotifier>,
    pub identity: Arc<MemoryIdentityStore>,
    pub db: MemoryDb,
}

/// Build a pipeline. `decision: None` leaves the permission request pending.
#[allow(dead_code)]
pub fn harness(availability: Availability, decision: Option<PermissionDecision>) -> Harness {
    let channel = ReportingChannel::default();
    let provider = Arc::new(ScriptedProvider::default());
    let permission = Arc::new(ScriptedPermission::new(decision));
    let availability = Arc::new(FixedAvailability {
        result: availability,
        checks: AtomicUsize::new(0),
        stall: Mutex::new(None),
    });
    let notifier = Arc::new(RecordingNotifier::default());
    let identity = Arc::new(MemoryIdentityStore::default());
    let db = MemoryDb::new();

    // Scripted fixes arrive back to back; keep all of them.
    let policy = IntervalPolicy {
        fastest_interval: Duration::ZERO,
        ..IntervalPolicy::default()
    };
    let source = Arc::new(LocationSource::new(provider.clone(), channel.clone()));
    let controller = Arc::new(ActivationController::new(
        source,
        policy,
        identity.clone(),
        permission.clone(),
        availability.clone(),
        notifier.clone(),
    ));

    let uploader = Arc::new(Uploader::new(identity.clone(), Arc::new(db.clone())));
    uploader.spawn(channel.subscribe());

    Harness {
        controller,
        channel,
        provider,
        permission,
        availability,
        notifier,
        identity,
        db,
    }
}

/// Wait until the current-state record satisfies `pred`.
#[allow(dead_code)]
pub async fn wait_for_record(db: &MemoryDb, pred: impl Fn(&RemoteRecord) -> bool) -> RemoteRecord {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let Some(record) = db.record(paths::MESSAGE) {
                if pred(&record) {
                    return record;
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("Timed out waiting for record")
}
