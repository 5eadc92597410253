// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-analog-i2c project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Temperature polling monitor
//!
//! One background task per sensor ticks at a fixed interval. While the
//! monitor is active each tick performs one corrected object temperature
//! read and logs it as `slot<N>: <value>`; while inactive the tick is skipped.
//! [`TemperatureMonitor::read_stop`] only pauses sampling, the task keeps
//! running until [`TemperatureMonitor::shutdown`] or drop.
//!
//! Sensor reads block (retries sleep between attempts), so they run on the
//! blocking thread pool.

use anyhow::Result;
use log::{debug, error, info, warn};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::{self, JoinHandle};
use tokio::time::{self, MissedTickBehavior};

use crate::bus::BusTransport;
use crate::drivers::Mlx90614;

pub const START_MESSAGE: &str = "start read--->";
pub const STOP_MESSAGE: &str = "stop read--->";

/// Background sampler for one [`Mlx90614`]
pub struct TemperatureMonitor<B> {
    sensor: Arc<Mlx90614<B>>,
    active: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    stop: Arc<Notify>,
    handle: Option<JoinHandle<()>>,
}

impl<B: BusTransport + 'static> TemperatureMonitor<B> {
    /// Spawn the polling task, initially inactive
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(sensor: Arc<Mlx90614<B>>, interval: Duration) -> Self {
        let active = Arc::new(AtomicBool::new(false));
        let running = Arc::new(AtomicBool::new(true));
        let stop = Arc::new(Notify::new());

        let handle = tokio::spawn(poll_loop(
            Arc::clone(&sensor),
            interval,
            Arc::clone(&active),
            Arc::clone(&running),
            Arc::clone(&stop),
        ));

        Self {
            sensor,
            active,
            running,
            stop,
            handle: Some(handle),
        }
    }
}

impl<B> TemperatureMonitor<B> {
    /// Resume sampling
    pub fn read_start(&self) -> &'static str {
        self.active.store(true, Ordering::SeqCst);
        START_MESSAGE
    }

    /// Pause sampling
    pub fn read_stop(&self) -> &'static str {
        self.active.store(false, Ordering::SeqCst);
        STOP_MESSAGE
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// The monitored sensor, for foreground reads
    pub fn sensor(&self) -> &Arc<Mlx90614<B>> {
        &self.sensor
    }

    /// Ask the polling task to terminate
    pub fn shutdown(&self) {
        self.active.store(false, Ordering::SeqCst);
        self.running.store(false, Ordering::SeqCst);
        self.stop.notify_one();
    }

    /// Stop the polling task and wait for it to finish
    pub async fn join(mut self) -> Result<()> {
        self.shutdown();
        if let Some(handle) = self.handle.take() {
            handle.await?;
        }
        Ok(())
    }
}

impl<B> Drop for TemperatureMonitor<B> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.shutdown();
            handle.abort();
        }
    }
}

async fn poll_loop<B: BusTransport + 'static>(
    sensor: Arc<Mlx90614<B>>,
    interval: Duration,
    active: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    stop: Arc<Notify>,
) {
    let slot = sensor.slot();
    debug!("slot{} monitor started, interval {:?}", slot, interval);

    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    while running.load(Ordering::SeqCst) {
        tokio::select! {
            _ = stop.notified() => break,
            _ = ticker.tick() => {
                if !active.load(Ordering::SeqCst) {
                    continue;
                }
                let reader = Arc::clone(&sensor);
                match task::spawn_blocking(move || reader.corrected_object_temp()).await {
                    Ok(Ok(value)) => info!("slot{}: {}", slot, value),
                    Ok(Err(e)) => warn!("slot{}: {}", slot, e),
                    Err(e) => {
                        error!("slot{} sampling task failed: {}", slot, e);
                        break;
                    }
                }
            }
        }
    }

    debug!("slot{} monitor stopped", slot);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{MockBus, SharedBus};
    use crate::drivers::mlx90614::RetryPolicy;

    fn sensor(bus: &SharedBus<MockBus>) -> Arc<Mlx90614<SharedBus<MockBus>>> {
        Arc::new(
            Mlx90614::new(bus.clone(), 0x5A, 3).with_retry_policy(RetryPolicy {
                attempts: 5,
                delay: Duration::ZERO,
            }),
        )
    }

    fn transaction_count(bus: &SharedBus<MockBus>) -> usize {
        bus.lock().unwrap().transactions().len()
    }

    #[tokio::test]
    async fn test_inactive_monitor_does_not_sample() {
        let bus = SharedBus::new(MockBus::new());
        let monitor = TemperatureMonitor::spawn(sensor(&bus), Duration::from_millis(5));

        time::sleep(Duration::from_millis(50)).await;
        assert!(!monitor.is_active());
        assert_eq!(transaction_count(&bus), 0);

        monitor.join().await.unwrap();
    }

    #[tokio::test]
    async fn test_start_and_stop() {
        let bus = SharedBus::new(MockBus::new());
        let monitor = TemperatureMonitor::spawn(sensor(&bus), Duration::from_millis(5));

        assert_eq!(monitor.read_start(), "start read--->");
        assert!(monitor.is_active());
        time::sleep(Duration::from_millis(60)).await;
        assert!(transaction_count(&bus) > 0);

        assert_eq!(monitor.read_stop(), "stop read--->");
        time::sleep(Duration::from_millis(30)).await;
        let paused = transaction_count(&bus);
        time::sleep(Duration::from_millis(50)).await;
        assert_eq!(transaction_count(&bus), paused);

        monitor.join().await.unwrap();
    }

    #[tokio::test]
    async fn test_foreground_reads_while_polling() {
        let bus = SharedBus::new(MockBus::new());
        let monitor = TemperatureMonitor::spawn(sensor(&bus), Duration::from_millis(2));
        monitor.read_start();

        let reader = Arc::clone(monitor.sensor());
        let reads = task::spawn_blocking(move || {
            (0..20)
                .map(|_| reader.read_ambient_temp_c())
                .filter(Result::is_ok)
                .count()
        })
        .await
        .unwrap();

        assert_eq!(reads, 20);
        monitor.join().await.unwrap();
    }

    #[tokio::test]
    async fn test_join_stops_the_task() {
        let bus = SharedBus::new(MockBus::new());
        let monitor = TemperatureMonitor::spawn(sensor(&bus), Duration::from_secs(3600));
        monitor.read_start();

        // The long interval would block forever without the stop notification
        time::timeout(Duration::from_secs(1), monitor.join())
            .await
            .expect("monitor did not stop")
            .unwrap();
    }
}
