use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use anyhow::Result;
use colored::*;

use crate::camera::FrameSource;
use crate::channel::DataChannel;
use crate::encode;
use crate::selector::PipelineSelector;

// How long a gated worker sleeps between termination checks.
const GATE_POLL: Duration = Duration::from_millis(50);

/// Waitable boolean for the enable gate. `wait_while_clear` parks the worker
/// until the flag is set, waking periodically so a terminate request is still
/// observed while disabled.
struct Gate {
    flag: Mutex<bool>,
    cond: Condvar,
}

impl Gate {
    fn new() -> Self {
        Self {
            flag: Mutex::new(false),
            cond: Condvar::new(),
        }
    }

    fn set(&self) {
        *self.flag.lock().expect("gate lock poisoned") = true;
        self.cond.notify_all();
    }

    fn clear(&self) {
        *self.flag.lock().expect("gate lock poisoned") = false;
    }

    fn is_set(&self) -> bool {
        *self.flag.lock().expect("gate lock poisoned")
    }

    /// Returns false if `terminate` was raised while waiting.
    fn wait_while_clear(&self, terminate: &AtomicBool) -> bool {
        let mut enabled = self.flag.lock().expect("gate lock poisoned");
        while !*enabled {
            if terminate.load(Ordering::Relaxed) {
                return false;
            }
            let (guard, _) = self
                .cond
                .wait_timeout(enabled, GATE_POLL)
                .expect("gate lock poisoned");
            enabled = guard;
        }
        !terminate.load(Ordering::Relaxed)
    }
}

struct WorkerShared {
    gate: Gate,
    terminate: AtomicBool,
    heartbeat: Mutex<Instant>,
    selector: Arc<PipelineSelector>,
    data: Arc<DataChannel<f64>>,
    feed: Option<Arc<DataChannel<Vec<u8>>>>,
}

/// Worker-side configuration knobs.
#[derive(Debug, Clone, Copy)]
pub struct WorkerOptions {
    /// Fixed inter-iteration delay bounding the loop rate.
    pub cadence: Duration,
    pub jpeg_quality: u8,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self {
            cadence: Duration::from_millis(50),
            jpeg_quality: 80,
        }
    }
}

/// Owns the capture/process loop on a dedicated thread.
///
/// Lifecycle: `start` launches the thread suspended at the enable gate;
/// `enable`/`disable` toggle the gate (an in-flight frame always finishes
/// before the gate is re-checked); `shutdown` raises the cooperative
/// terminate flag and joins. Every per-frame failure is absorbed inside the
/// iteration that produced it; nothing kills the thread.
pub struct VisionWorker {
    shared: Arc<WorkerShared>,
    handle: Option<JoinHandle<()>>,
}

impl VisionWorker {
    /// Launch the worker thread. `make_source` runs on that thread, so the
    /// capture handle is created where it lives and never crosses threads.
    pub fn start<F>(
        make_source: F,
        selector: Arc<PipelineSelector>,
        data: Arc<DataChannel<f64>>,
        feed: Option<Arc<DataChannel<Vec<u8>>>>,
        options: WorkerOptions,
    ) -> Self
    where
        F: FnOnce() -> Result<Box<dyn FrameSource>> + Send + 'static,
    {
        let shared = Arc::new(WorkerShared {
            gate: Gate::new(),
            terminate: AtomicBool::new(false),
            heartbeat: Mutex::new(Instant::now()),
            selector,
            data,
            feed,
        });

        let thread_shared = Arc::clone(&shared);
        let handle = std::thread::spawn(move || {
            let source = match make_source() {
                Ok(source) => source,
                Err(err) => {
                    eprintln!("{}", format!("Frame source init failed: {err:#}").red());
                    return;
                }
            };
            run_loop(thread_shared, source, options);
        });

        Self {
            shared,
            handle: Some(handle),
        }
    }

    pub fn enable(&self) {
        self.shared.gate.set();
    }

    /// The worker finishes its current iteration, then parks at the gate.
    /// Pipeline state (running windows, held positions) is untouched.
    pub fn disable(&self) {
        self.shared.gate.clear();
    }

    pub fn is_enabled(&self) -> bool {
        self.shared.gate.is_set()
    }

    /// Raise the terminate flag. Observed within one iteration (capture +
    /// process + cadence delay), or within one gate poll while disabled.
    pub fn terminate(&self) {
        self.shared.terminate.store(true, Ordering::Relaxed);
        self.shared.gate.cond.notify_all();
    }

    /// Terminate and join the worker thread.
    pub fn shutdown(mut self) -> Result<()> {
        self.terminate();
        if let Some(handle) = self.handle.take() {
            handle
                .join()
                .map_err(|_| anyhow::anyhow!("vision worker panicked"))?;
        }
        Ok(())
    }

    /// Time since the worker last completed a loop checkpoint. A supervisor
    /// can poll this as a liveness signal; a silently stuck worker would
    /// otherwise just stop publishing with nothing observable.
    pub fn since_heartbeat(&self) -> Duration {
        self.shared
            .heartbeat
            .lock()
            .expect("heartbeat lock poisoned")
            .elapsed()
    }
}

impl Drop for VisionWorker {
    fn drop(&mut self) {
        self.terminate();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn touch(shared: &WorkerShared) {
    *shared.heartbeat.lock().expect("heartbeat lock poisoned") = Instant::now();
}

fn run_loop(shared: Arc<WorkerShared>, mut source: Box<dyn FrameSource>, options: WorkerOptions) {
    loop {
        // Gate check doubles as the terminate checkpoint while disabled.
        if !shared.gate.wait_while_clear(&shared.terminate) {
            break;
        }
        touch(&shared);

        let frame = match source.capture() {
            Ok(frame) => frame,
            Err(err) => {
                // Skip this iteration's processing, no emission, no crash.
                eprintln!("{}", format!("Capture failed: {err:#}").red());
                std::thread::sleep(options.cadence);
                continue;
            }
        };

        if let Some(feed) = &shared.feed {
            match encode::encode_jpeg(&frame, options.jpeg_quality) {
                Ok(bytes) => feed.put(bytes),
                Err(err) => eprintln!("{}", format!("Feed encode failed: {err:#}").red()),
            }
        }

        match shared.selector.process(&frame) {
            Ok(Some(error)) => shared.data.put(error),
            Ok(None) => {} // no active pipeline
            Err(err) => {
                eprintln!("{}", format!("Pipeline error: {err:#}").red());
            }
        }

        touch(&shared);
        std::thread::sleep(options.cadence);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Pipeline;
    use crate::selector::PipelineKind;
    use crate::types::Frame;
    use anyhow::bail;
    use std::sync::atomic::AtomicUsize;

    /// Counts frames and emits an increasing error value.
    struct CountingPipeline(Arc<AtomicUsize>);

    impl Pipeline for CountingPipeline {
        fn name(&self) -> String {
            "counting".into()
        }

        fn process(&mut self, _frame: &Frame) -> anyhow::Result<f64> {
            Ok(self.0.fetch_add(1, Ordering::SeqCst) as f64)
        }
    }

    struct SynthSource {
        fail_every: Option<usize>,
        captures: usize,
    }

    impl FrameSource for SynthSource {
        fn capture(&mut self) -> anyhow::Result<Frame> {
            self.captures += 1;
            if let Some(n) = self.fail_every {
                if self.captures % n == 0 {
                    bail!("synthetic capture failure");
                }
            }
            Ok(Frame::new(8, 8))
        }

        fn width(&self) -> u32 {
            8
        }

        fn height(&self) -> u32 {
            8
        }
    }

    fn fast_options() -> WorkerOptions {
        WorkerOptions {
            cadence: Duration::from_millis(2),
            jpeg_quality: 80,
        }
    }

    fn counting_selector(counter: Arc<AtomicUsize>) -> Arc<PipelineSelector> {
        Arc::new(PipelineSelector::new(
            vec![(
                PipelineKind::Cube,
                Box::new(CountingPipeline(counter)) as Box<dyn Pipeline>,
            )],
            Some(PipelineKind::Cube),
        ))
    }

    #[test]
    fn worker_waits_at_gate_until_enabled() {
        let counter = Arc::new(AtomicUsize::new(0));
        let data = Arc::new(DataChannel::new(32));
        let worker = VisionWorker::start(
            || {
                Ok(Box::new(SynthSource {
                    fail_every: None,
                    captures: 0,
                }) as Box<dyn FrameSource>)
            },
            counting_selector(Arc::clone(&counter)),
            Arc::clone(&data),
            None,
            fast_options(),
        );

        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(counter.load(Ordering::SeqCst), 0, "gated worker processed");
        assert!(data.is_empty());

        worker.enable();
        std::thread::sleep(Duration::from_millis(100));
        assert!(counter.load(Ordering::SeqCst) > 0, "enabled worker idle");
        assert!(!data.is_empty());

        worker.shutdown().unwrap();
    }

    #[test]
    fn disable_then_enable_resumes_emission() {
        let counter = Arc::new(AtomicUsize::new(0));
        let data = Arc::new(DataChannel::new(64));
        let worker = VisionWorker::start(
            || {
                Ok(Box::new(SynthSource {
                    fail_every: None,
                    captures: 0,
                }) as Box<dyn FrameSource>)
            },
            counting_selector(Arc::clone(&counter)),
            Arc::clone(&data),
            None,
            fast_options(),
        );

        worker.enable();
        std::thread::sleep(Duration::from_millis(60));
        worker.disable();
        // Let the in-flight iteration drain, then flush.
        std::thread::sleep(Duration::from_millis(60));
        while data.get().is_some() {}
        let at_disable = counter.load(Ordering::SeqCst);

        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(
            counter.load(Ordering::SeqCst),
            at_disable,
            "disabled worker kept processing"
        );

        worker.enable();
        std::thread::sleep(Duration::from_millis(100));
        assert!(
            counter.load(Ordering::SeqCst) > at_disable,
            "emission did not resume"
        );
        assert!(!data.is_empty());

        worker.shutdown().unwrap();
    }

    #[test]
    fn capture_failures_are_absorbed() {
        let counter = Arc::new(AtomicUsize::new(0));
        let data = Arc::new(DataChannel::new(64));
        let worker = VisionWorker::start(
            || {
                Ok(Box::new(SynthSource {
                    fail_every: Some(2),
                    captures: 0,
                }) as Box<dyn FrameSource>)
            },
            counting_selector(Arc::clone(&counter)),
            Arc::clone(&data),
            None,
            fast_options(),
        );

        worker.enable();
        std::thread::sleep(Duration::from_millis(150));
        assert!(
            counter.load(Ordering::SeqCst) > 0,
            "worker died on capture failure"
        );

        worker.shutdown().unwrap();
    }

    #[test]
    fn terminate_joins_while_disabled() {
        let counter = Arc::new(AtomicUsize::new(0));
        let data = Arc::new(DataChannel::new(8));
        let worker = VisionWorker::start(
            || {
                Ok(Box::new(SynthSource {
                    fail_every: None,
                    captures: 0,
                }) as Box<dyn FrameSource>)
            },
            counting_selector(counter),
            data,
            None,
            fast_options(),
        );

        // Never enabled; shutdown must still return promptly.
        let started = Instant::now();
        worker.shutdown().unwrap();
        assert!(
            started.elapsed() < Duration::from_secs(1),
            "shutdown latency exceeded the gate poll bound"
        );
    }

    #[test]
    fn heartbeat_advances_while_running() {
        let counter = Arc::new(AtomicUsize::new(0));
        let data = Arc::new(DataChannel::new(8));
        let worker = VisionWorker::start(
            || {
                Ok(Box::new(SynthSource {
                    fail_every: None,
                    captures: 0,
                }) as Box<dyn FrameSource>)
            },
            counting_selector(counter),
            data,
            None,
            fast_options(),
        );

        worker.enable();
        std::thread::sleep(Duration::from_millis(100));
        assert!(worker.since_heartbeat() < Duration::from_millis(500));
        worker.shutdown().unwrap();
    }
}
