//! Progress reporting for long Monte Carlo runs (feature `progress`).
//!
//! Components
//! -----------------
//! * [`IterTimer`] – Tracks per-trial durations and computes a smoothed
//!   **exponential moving average** (EMA), `ema ← α·dt + (1–α)·ema`.
//!   The first tick initializes the average to the first duration.
//!
//! * [`fmt_dur`] – Human-readable formatter for [`Duration`] values,
//!   producing strings like `"253µs"`, `"42ms"`, or `"3.14s"`.
//!
//! * [`TrialProgress`] – `indicatif` bar plus an [`IterTimer`] behind a mutex, so
//!   trials running on several threads can tick the same bar.
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub struct IterTimer {
    last: Instant,
    ema_ns: f64,
    alpha: f64,
    count: u64,
}

impl IterTimer {
    pub fn new(alpha: f64) -> Self {
        Self {
            last: Instant::now(),
            ema_ns: 0.0,
            alpha,
            count: 0,
        }
    }

    #[inline]
    pub fn tick(&mut self) -> Duration {
        let now = Instant::now();
        let dt = now.duration_since(self.last);
        self.last = now;
        self.count += 1;

        let dt_ns = dt.as_nanos() as f64;
        self.ema_ns = if self.count == 1 {
            dt_ns
        } else {
            self.alpha * dt_ns + (1.0 - self.alpha) * self.ema_ns
        };

        dt
    }

    #[inline]
    pub fn avg(&self) -> Duration {
        if self.count == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(self.ema_ns as u64)
        }
    }
}

#[inline]
pub fn fmt_dur(d: Duration) -> String {
    let us = d.as_micros();
    if us < 1_000 {
        format!("{us}µs")
    } else {
        let ms = d.as_millis();
        if ms < 1_000 {
            format!("{ms}ms")
        } else {
            let s = d.as_secs_f32();
            format!("{s:.2}s")
        }
    }
}

/// Progress bar over the trials of one Monte Carlo run.
pub struct TrialProgress {
    bar: ProgressBar,
    timer: Mutex<IterTimer>,
}

impl TrialProgress {
    pub fn new(total: u64) -> Self {
        let bar = ProgressBar::new(total.max(1));
        let style = ProgressStyle::with_template(
            "{bar:40.cyan/blue} {pos}/{len} trials ({percent:>3}%) \
             | {per_sec} | ETA {eta_precise} | {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(200));

        TrialProgress {
            bar,
            timer: Mutex::new(IterTimer::new(0.2)),
        }
    }

    /// Mark one trial as done.
    pub fn tick(&self) {
        if let Ok(mut timer) = self.timer.lock() {
            let last = timer.tick();
            let avg = timer.avg();
            self.bar
                .set_message(format!("last: {}, avg: {}", fmt_dur(last), fmt_dur(avg)));
        }
        self.bar.inc(1);
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
