use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use depthview_stream::DeviceRegistry;

use crate::{Display, FrameLoop, SessionError, SessionReport, StopSignal, ViewerConfig};

/// Builds the display a new session presents to, given the device id.
pub type DisplayFactory = Box<dyn Fn(&str, &ViewerConfig) -> Box<dyn Display + Send> + Send + Sync>;

struct SessionHandle {
    stop: StopSignal,
    thread: JoinHandle<SessionReport>,
}

/// Starts and stops render sessions on behalf of a remote controller.
///
/// Sessions are replaced, never stacked: `start` stops and joins whatever is
/// running before it opens the next device, so two loops never share a
/// display.
pub struct SessionManager {
    registry: Arc<dyn DeviceRegistry>,
    display_factory: DisplayFactory,
    config: ViewerConfig,
    sessions: Mutex<HashMap<String, SessionHandle>>,
    // Held for the whole of `start` so replacements never interleave.
    start_guard: Mutex<()>,
}

impl SessionManager {
    pub fn new(registry: Arc<dyn DeviceRegistry>, display_factory: DisplayFactory, config: ViewerConfig) -> Self {
        Self {
            registry,
            display_factory,
            config,
            sessions: Mutex::new(HashMap::new()),
            start_guard: Mutex::new(()),
        }
    }

    /// Start rendering `device_id` on a new thread named `render-<device_id>`.
    ///
    /// Device lookup and the intrinsics query happen before the thread is
    /// spawned, so their failures are returned here.
    pub fn start(&self, device_id: &str) -> Result<(), SessionError> {
        let _guard = self.start_guard.lock().unwrap_or_else(PoisonError::into_inner);
        let replaced = self.stop();
        if !replaced.is_empty() {
            tracing::info!(count = replaced.len(), "replaced running session");
        }

        let source = self.registry.open(device_id)?;
        let stop = StopSignal::new();
        let mut frame_loop = FrameLoop::new(source, self.config.clone(), stop.clone())?.named(device_id);
        let mut display = (self.display_factory)(device_id, &self.config);

        let thread = std::thread::Builder::new()
            .name(format!("render-{device_id}"))
            .spawn(move || frame_loop.run(&mut display))
            .map_err(SessionError::Spawn)?;

        tracing::info!(device = device_id, "session started");
        let displaced = self
            .lock()
            .insert(device_id.to_string(), SessionHandle { stop, thread });
        if let Some(handle) = displaced {
            tracing::warn!(device = device_id, "session registered during start; stopping it");
            join_all(vec![(device_id.to_string(), handle)]);
        }
        Ok(())
    }

    /// Signal every session to stop and wait for them. No-op when idle.
    pub fn stop(&self) -> Vec<SessionReport> {
        let handles: Vec<(String, SessionHandle)> = self.lock().drain().collect();
        let reports = join_all(handles);
        if !reports.is_empty() {
            tracing::info!(count = reports.len(), "sessions stopped");
        }
        reports
    }

    /// Devices whose render loop is still running.
    pub fn active_devices(&self) -> Vec<String> {
        let mut devices: Vec<String> = self
            .lock()
            .iter()
            .filter(|(_, handle)| !handle.thread.is_finished())
            .map(|(device, _)| device.clone())
            .collect();
        devices.sort();
        devices
    }

    pub fn is_active(&self, device_id: &str) -> bool {
        self.lock()
            .get(device_id)
            .is_some_and(|handle| !handle.thread.is_finished())
    }

    pub fn devices(&self) -> Vec<String> {
        self.registry.devices()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, SessionHandle>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Signal each session and join its thread. Call without the sessions lock held.
fn join_all(handles: Vec<(String, SessionHandle)>) -> Vec<SessionReport> {
    let mut reports = Vec::with_capacity(handles.len());
    for (device, handle) in handles {
        handle.stop.stop();
        match handle.thread.join() {
            Ok(report) => reports.push(report),
            Err(_) => tracing::error!(device = %device, "render thread panicked"),
        }
    }
    reports
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DisplayProbe, HeadlessDisplay};
    use depthview_input::Key;
    use depthview_stream::{FrameSource, StreamError, SyntheticConfig, SyntheticRegistry};
    use std::sync::Barrier;
    use std::time::{Duration, Instant};

    fn registry() -> Arc<dyn DeviceRegistry> {
        Arc::new(synthetic())
    }

    fn synthetic() -> SyntheticRegistry {
        SyntheticRegistry::new(SyntheticConfig {
            width: 32,
            height: 24,
            focal: 20.0,
            color_width: 32,
            color_height: 24,
            fps: Some(200),
            ..SyntheticConfig::default()
        })
    }

    /// Registry whose devices take a while to open, like real hardware.
    struct SlowRegistry(SyntheticRegistry);

    impl DeviceRegistry for SlowRegistry {
        fn devices(&self) -> Vec<String> {
            self.0.devices()
        }

        fn open(&self, id: &str) -> Result<Box<dyn FrameSource + Send>, StreamError> {
            std::thread::sleep(Duration::from_millis(20));
            self.0.open(id)
        }
    }

    /// Factory handing out headless displays whose probes are collected in `probes`.
    fn factory(probes: Arc<Mutex<Vec<(String, DisplayProbe)>>>) -> DisplayFactory {
        Box::new(move |device: &str, _: &ViewerConfig| -> Box<dyn Display + Send> {
            let display = HeadlessDisplay::new().with_idle_wait(Duration::from_millis(1));
            probes.lock().unwrap().push((device.to_string(), display.probe()));
            Box::new(display)
        })
    }

    fn manager() -> (SessionManager, Arc<Mutex<Vec<(String, DisplayProbe)>>>) {
        let probes = Arc::new(Mutex::new(Vec::new()));
        let manager = SessionManager::new(registry(), factory(Arc::clone(&probes)), ViewerConfig::default());
        (manager, probes)
    }

    fn wait_for_frames(probe: &DisplayProbe, frames: u64) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while probe.frames_presented() < frames {
            assert!(Instant::now() < deadline, "session produced no frames");
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn stop_when_idle_is_a_no_op() {
        let (manager, _) = manager();
        assert!(manager.stop().is_empty());
        assert!(manager.active_devices().is_empty());
    }

    #[test]
    fn start_runs_until_stopped() {
        let (manager, probes) = manager();
        manager.start("synthetic").unwrap();
        assert!(manager.is_active("synthetic"));

        let probe = probes.lock().unwrap()[0].1.clone();
        wait_for_frames(&probe, 2);

        let reports = manager.stop();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].device, "synthetic");
        assert!(reports[0].frames_rendered >= 2);
        assert!(probe.is_closed());
        assert!(!manager.is_active("synthetic"));
    }

    #[test]
    fn unknown_device_fails_synchronously() {
        let (manager, probes) = manager();
        let err = manager.start("d435").unwrap_err();
        assert!(matches!(err, SessionError::Stream(StreamError::DeviceNotFound { .. })));
        assert!(probes.lock().unwrap().is_empty());
        assert!(manager.active_devices().is_empty());
    }

    #[test]
    fn second_start_replaces_the_first() {
        let (manager, probes) = manager();
        manager.start("synthetic").unwrap();
        let first = probes.lock().unwrap()[0].1.clone();
        wait_for_frames(&first, 1);

        manager.start("synthetic-rgbd").unwrap();
        assert!(first.is_closed(), "first session must end before the second starts");
        assert_eq!(manager.active_devices(), vec!["synthetic-rgbd".to_string()]);

        let second = probes.lock().unwrap()[1].1.clone();
        wait_for_frames(&second, 1);
        assert_eq!(manager.stop().len(), 1);
    }

    #[test]
    fn concurrent_starts_leave_one_session() {
        let probes = Arc::new(Mutex::new(Vec::new()));
        let manager = SessionManager::new(
            Arc::new(SlowRegistry(synthetic())),
            factory(Arc::clone(&probes)),
            ViewerConfig::default(),
        );
        let barrier = Barrier::new(2);

        std::thread::scope(|scope| {
            for _ in 0..2 {
                scope.spawn(|| {
                    barrier.wait();
                    manager.start("synthetic").unwrap();
                });
            }
        });

        let probes: Vec<DisplayProbe> = probes.lock().unwrap().iter().map(|(_, p)| p.clone()).collect();
        assert_eq!(probes.len(), 2);
        assert_eq!(probes.iter().filter(|p| p.is_closed()).count(), 1);
        assert_eq!(manager.active_devices(), vec!["synthetic".to_string()]);

        assert_eq!(manager.stop().len(), 1);
        assert!(probes.iter().all(DisplayProbe::is_closed));
        assert!(manager.active_devices().is_empty());
    }

    #[test]
    fn session_that_quits_is_no_longer_active() {
        let probes = Arc::new(Mutex::new(Vec::new()));
        let quitting: DisplayFactory = {
            let probes = Arc::clone(&probes);
            Box::new(move |device: &str, _: &ViewerConfig| -> Box<dyn Display + Send> {
                let mut display = HeadlessDisplay::new();
                display.script_idle(1).script_key(Key::Escape);
                probes.lock().unwrap().push((device.to_string(), display.probe()));
                Box::new(display)
            })
        };
        let manager = SessionManager::new(registry(), quitting, ViewerConfig::default());
        manager.start("synthetic").unwrap();

        let probe = probes.lock().unwrap()[0].1.clone();
        let deadline = Instant::now() + Duration::from_secs(10);
        while !probe.is_closed() {
            assert!(Instant::now() < deadline, "session did not quit");
            std::thread::sleep(Duration::from_millis(2));
        }
        // Closing happens just before the thread returns.
        while manager.is_active("synthetic") {
            assert!(Instant::now() < deadline, "thread did not finish");
            std::thread::sleep(Duration::from_millis(2));
        }

        let reports = manager.stop();
        assert_eq!(reports[0].frames_rendered, 2);
    }

    #[test]
    fn lists_registry_devices() {
        let (manager, _) = manager();
        assert_eq!(manager.devices(), vec!["synthetic", "synthetic-rgbd"]);
    }
}
