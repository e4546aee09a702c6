//! In-memory printer shared by the integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use label_printer::{
    DeviceDescriptor, DeviceInfo, DeviceSession, Driver, GeometryCatalog, Link, PrintError,
    PrintResult,
};
use label_server::printing::{PrintJob, PrintQueue, QueueSettings};
use label_server::JobStatus;
use parking_lot::Mutex;
use tokio::sync::Semaphore;

#[derive(Default)]
pub struct Log {
    pub opens: usize,
    pub written: Vec<Vec<u8>>,
    /// Errors returned by the next writes, front first
    pub write_errors: Vec<PrintError>,
}

/// Driver whose links record every write
///
/// With a gate, each write waits for one permit before completing.
#[derive(Clone)]
pub struct MockPrinter {
    pub log: Arc<Mutex<Log>>,
    gate: Option<Arc<Semaphore>>,
}

impl MockPrinter {
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(Log::default())),
            gate: None,
        }
    }

    /// Writes block until [`MockPrinter::release_writes`]
    pub fn gated() -> Self {
        Self {
            gate: Some(Arc::new(Semaphore::new(0))),
            ..Self::new()
        }
    }

    pub fn release_writes(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    pub fn fail_next_write(&self, err: PrintError) {
        self.log.lock().write_errors.push(err);
    }

    pub fn written_text(&self) -> Vec<String> {
        self.log
            .lock()
            .written
            .iter()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .collect()
    }

    pub fn opens(&self) -> usize {
        self.log.lock().opens
    }
}

struct MockLink {
    log: Arc<Mutex<Log>>,
    gate: Option<Arc<Semaphore>>,
}

#[async_trait]
impl Driver for MockPrinter {
    async fn discover(&self) -> PrintResult<Vec<DeviceInfo>> {
        Ok(vec![DeviceInfo::new(
            DeviceDescriptor::usb(0x1203, 0x0230),
            Some("TSC".into()),
            None,
        )])
    }

    async fn open(&self, _descriptor: &DeviceDescriptor) -> PrintResult<Box<dyn Link>> {
        self.log.lock().opens += 1;
        Ok(Box::new(MockLink {
            log: self.log.clone(),
            gate: self.gate.clone(),
        }))
    }
}

#[async_trait]
impl Link for MockLink {
    async fn write(&mut self, data: &[u8]) -> PrintResult<()> {
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        let mut log = self.log.lock();
        if !log.write_errors.is_empty() {
            return Err(log.write_errors.remove(0));
        }
        log.written.push(data.to_vec());
        Ok(())
    }

    async fn release(&mut self) -> PrintResult<()> {
        Ok(())
    }
}

/// Queue over `printer`, already connected
pub async fn connected_queue(printer: &MockPrinter) -> (PrintQueue, Arc<DeviceSession>) {
    let (queue, device) = queue(printer);
    device
        .connect(DeviceDescriptor::usb(0x1203, 0x0230))
        .await
        .unwrap();
    (queue, device)
}

/// Queue over `printer`, not connected
pub fn queue(printer: &MockPrinter) -> (PrintQueue, Arc<DeviceSession>) {
    let device = Arc::new(DeviceSession::new(Arc::new(printer.clone())));
    let queue = PrintQueue::new(
        Arc::new(GeometryCatalog::builtin()),
        device.clone(),
        QueueSettings::default(),
    );
    (queue, device)
}

pub async fn wait_for(queue: &PrintQueue, id: &str, status: JobStatus) -> PrintJob {
    for _ in 0..300 {
        let job = queue.get(id).unwrap();
        if job.status == status {
            return job;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!(
        "job {} never reached {}, last seen {}",
        id,
        status,
        queue.get(id).unwrap().status
    );
}

pub async fn wait_idle(queue: &PrintQueue) {
    for _ in 0..300 {
        if !queue.is_worker_running() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("worker still running");
}
