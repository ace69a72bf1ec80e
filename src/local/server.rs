use crate::acquisition::client::ECG_DATA_ROUTE;
use crate::config::ServerConfig;
use crate::error::Result;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use log::{debug, info};
use rand::Rng;
use std::ops::Range;
use std::sync::{Arc, Mutex, PoisonError};

// -----------------------------------------------------------------------------
// SLIDING WINDOW OVER THE RECORDING
// -----------------------------------------------------------------------------

/// Moves a fixed-size window over `total` samples, `step` samples per request.
#[derive(Debug, Clone)]
pub struct WindowCursor {
    start: usize,
    window_size: usize,
    step: usize,
    total: usize,
}

impl WindowCursor {
    pub fn new(total: usize, window_size: usize, step: usize) -> Self {
        Self {
            start: 0,
            window_size,
            step,
            total,
        }
    }

    /// Steps forward and returns the next window. The start wraps modulo
    /// `total - window_size`; a recording no longer than one window is served
    /// whole every time.
    pub fn advance(&mut self) -> Range<usize> {
        if self.total <= self.window_size {
            return 0..self.total;
        }
        self.start = (self.start + self.step) % (self.total - self.window_size);
        self.start..self.start + self.window_size
    }
}

pub struct Feed {
    samples: Vec<f64>,
    cursor: WindowCursor,
}

pub type SharedFeed = Arc<Mutex<Feed>>;

impl Feed {
    pub fn new(samples: Vec<f64>, config: &ServerConfig) -> Self {
        let cursor = WindowCursor::new(samples.len(), config.window_size, config.step);
        Self { samples, cursor }
    }

    pub fn into_shared(self) -> SharedFeed {
        Arc::new(Mutex::new(self))
    }
}

// -----------------------------------------------------------------------------
// HTTP
// -----------------------------------------------------------------------------

pub async fn get_ecg_data(State(feed): State<SharedFeed>) -> Response {
    let mut feed = feed.lock().unwrap_or_else(PoisonError::into_inner);
    if feed.samples.is_empty() {
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "no ECG data loaded" })),
        )
            .into_response();
    }

    let window = feed.cursor.advance();
    debug!("serving samples {}..{}", window.start, window.end);
    Json(feed.samples[window].to_vec()).into_response()
}

pub fn router(feed: SharedFeed) -> Router {
    Router::new()
        .route(ECG_DATA_ROUTE, get(get_ecg_data))
        .with_state(feed)
}

pub async fn run(listener: tokio::net::TcpListener, feed: SharedFeed) -> std::io::Result<()> {
    axum::serve(listener, router(feed)).await
}

/// Blocks serving `samples` on `127.0.0.1:<port>`.
pub fn serve(config: &ServerConfig, samples: Vec<f64>) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let feed = Feed::new(samples, config).into_shared();
    let port = config.port;

    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
        info!("serving ECG data on http://127.0.0.1:{}{}", port, ECG_DATA_ROUTE);
        run(listener, feed).await
    })?;

    Ok(())
}

// -----------------------------------------------------------------------------
// SIMULATED SIGNAL
// -----------------------------------------------------------------------------

const SIM_RATE_BPM: f64 = 72.0;
const SIM_RR_JITTER: f64 = 0.05;
const SIM_NOISE: f64 = 0.02;
const SIM_BASELINE_AMPLITUDE: f64 = 0.1;
const SIM_BASELINE_FREQ: f64 = 0.3;

/// ECG-like test signal: narrow QRS spikes with jittered spacing, a small T
/// wave, baseline wander and uniform noise.
pub fn synthesize_ecg(len: usize, fs: f64) -> Vec<f64> {
    let mut rng = rand::thread_rng();
    let mean_rr = fs * 60.0 / SIM_RATE_BPM;

    let mut signal: Vec<f64> = (0..len)
        .map(|i| {
            let t = i as f64 / fs;
            SIM_BASELINE_AMPLITUDE * (2.0 * std::f64::consts::PI * SIM_BASELINE_FREQ * t).sin()
                + rng.gen_range(-SIM_NOISE..SIM_NOISE)
        })
        .collect();

    let t_wave_offset = (0.25 * fs) as usize;
    let t_wave_half_width = (0.06 * fs).max(1.0);

    let mut beat = mean_rr / 2.0;
    while (beat as usize) < len {
        let r = beat as usize;
        // QRS: -0.15, 1.0, -0.25 around the R sample
        for (offset, amplitude) in [(-1i64, -0.15), (0, 1.0), (1, -0.25)] {
            let index = r as i64 + offset;
            if index >= 0 && (index as usize) < len {
                signal[index as usize] += amplitude;
            }
        }
        for k in 0..(2.0 * t_wave_half_width) as usize {
            let index = r + t_wave_offset + k;
            if index >= len {
                break;
            }
            let phase = k as f64 / (2.0 * t_wave_half_width);
            signal[index] += 0.2 * (std::f64::consts::PI * phase).sin();
        }

        beat += mean_rr * (1.0 + rng.gen_range(-SIM_RR_JITTER..SIM_RR_JITTER));
    }

    signal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::pipeline::{process, ProcessingSettings};
    use crate::processing::signal::RawSignal;

    #[test]
    fn cursor_steps_and_wraps() {
        let mut cursor = WindowCursor::new(100, 20, 30);
        assert_eq!(cursor.advance(), 30..50);
        assert_eq!(cursor.advance(), 60..80);
        // (60 + 30) % 80
        assert_eq!(cursor.advance(), 10..30);
    }

    #[test]
    fn short_recording_served_whole() {
        let mut cursor = WindowCursor::new(50, 1100, 60);
        assert_eq!(cursor.advance(), 0..50);
        assert_eq!(cursor.advance(), 0..50);
    }

    fn call(feed: SharedFeed) -> (StatusCode, serde_json::Value) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        runtime.block_on(async {
            let response = get_ecg_data(State(feed)).await;
            let status = response.status();
            let body = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            (status, serde_json::from_slice(&body).unwrap())
        })
    }

    #[test]
    fn serves_next_window() {
        let config = ServerConfig {
            window_size: 3,
            step: 2,
            ..ServerConfig::default()
        };
        let samples: Vec<f64> = (0..10).map(f64::from).collect();
        let feed = Feed::new(samples, &config).into_shared();

        let (status, body) = call(Arc::clone(&feed));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!([2.0, 3.0, 4.0]));

        let (_, body) = call(feed);
        assert_eq!(body, serde_json::json!([4.0, 5.0, 6.0]));
    }

    #[test]
    fn empty_feed_is_not_found() {
        let feed = Feed::new(Vec::new(), &ServerConfig::default()).into_shared();
        let (status, body) = call(feed);
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.get("error").is_some());
    }

    #[test]
    fn synthetic_signal_has_detectable_beats() {
        let fs = 125.0;
        let samples = synthesize_ecg(1100, fs);
        assert_eq!(samples.len(), 1100);

        let raw = RawSignal::new(samples, fs).unwrap();
        let processed = process(&raw, &ProcessingSettings::default()).unwrap();
        // 8.8 s at ~72 bpm
        let found = processed.peaks.indices.len();
        assert!((8..=12).contains(&found), "found {} beats", found);
    }
}
