//! Shared fixture for the behavioral specs.

use devlab_adapters::FakeDriver;
use devlab_core::{DeviceId, DeviceSpec, DeviceStorage, FakeClock, SequentialTokenGen};
use devlab_engine::discovery::WalkTtl;
use devlab_engine::{BootOptions, Device, Runtime, RuntimeDeps};
use std::sync::Arc;
use std::time::Duration;

pub type LabRuntime = Runtime<FakeClock, SequentialTokenGen>;
pub type LabDevice = Device<FakeClock, SequentialTokenGen>;

/// One in-memory device lab: fake drivers, fake clock, tempdir storage.
pub struct Lab {
    pub tmp: tempfile::TempDir,
    pub clock: FakeClock,
    pub runtime: LabRuntime,
}

impl Lab {
    pub fn with_drivers(drivers: Vec<FakeDriver>, session_ttl_ms: u64) -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let clock = FakeClock::new();
        clock.set_epoch_ms(1_700_000_000_000);
        let runtime = Runtime::new(
            drivers
                .into_iter()
                .map(|d| Arc::new(d) as Arc<dyn devlab_adapters::DeviceDriver>)
                .collect(),
            RuntimeDeps {
                clock: clock.clone(),
                tokens: SequentialTokenGen::new("session"),
                storage: DeviceStorage::new(tmp.path()),
                walk_ttl: WalkTtl::none(),
            },
            session_ttl_ms,
        );
        Self { tmp, clock, runtime }
    }

    pub async fn device(&self, id: &str) -> LabDevice {
        self.runtime.discover(false, false).await.unwrap();
        self.runtime
            .get_device_with_id(&DeviceId::new(id))
            .unwrap()
    }

    /// Lock file content for a device, as written to disk.
    pub fn lock_content(&self, id: &str) -> String {
        let storage = DeviceStorage::new(self.tmp.path());
        std::fs::read_to_string(storage.lock_path(&DeviceId::new(id))).unwrap()
    }

    pub fn write_lock(&self, id: &str, content: &str) {
        let storage = DeviceStorage::new(self.tmp.path());
        let path = storage.lock_path(&DeviceId::new(id));
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }
}

/// An iOS simulator fleet with the given (udid, name, booted) rows.
pub fn ios_lab(rows: &[(&str, &str, bool)], session_ttl_ms: u64) -> (FakeDriver, Lab) {
    let driver = FakeDriver::ios_simulator();
    for (udid, name, booted) in rows {
        driver.add_device(ios_spec(udid, name, *booted));
    }
    let lab = Lab::with_drivers(vec![driver.clone()], session_ttl_ms);
    (driver, lab)
}

pub fn ios_spec(udid: &str, name: &str, booted: bool) -> DeviceSpec {
    let mut spec = devlab_core::test_support::sample_spec(udid, name);
    spec.booted = booted;
    spec
}

/// Boot options without real-time waits.
pub fn instant_boot() -> BootOptions {
    BootOptions {
        attempts: 5,
        poll_interval: Duration::ZERO,
        settle_delay: Duration::ZERO,
    }
}

/// The pid of this test process, as it appears in lock files.
pub fn self_pid() -> u32 {
    std::process::id()
}
