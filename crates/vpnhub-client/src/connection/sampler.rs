//! Оценка пропускной способности канала.

use rand::Rng;
use std::ops::RangeInclusive;
use vpnhub_entities::ServerRecord;

/// Пропускная способность канала, Мбит/с.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkSample {
    pub download_mbps: f64,
    pub upload_mbps: f64,
}

/// Замер канала после подключения к серверу.
pub trait LinkSampler: Send + Sync {
    fn sample(&self, server: &ServerRecord) -> LinkSample;
}

/// Синтетический замер: случайные значения из фиксированных диапазонов.
/// Реальной сетевой активности нет.
#[derive(Debug, Clone)]
pub struct SyntheticSampler {
    download: RangeInclusive<f64>,
    upload: RangeInclusive<f64>,
}

impl SyntheticSampler {
    pub fn new(download: RangeInclusive<f64>, upload: RangeInclusive<f64>) -> Self {
        Self { download, upload }
    }
}

impl Default for SyntheticSampler {
    fn default() -> Self {
        Self::new(50.0..=100.0, 30.0..=50.0)
    }
}

impl LinkSampler for SyntheticSampler {
    fn sample(&self, _server: &ServerRecord) -> LinkSample {
        let mut rng = rand::rng();
        LinkSample {
            download_mbps: round_tenth(rng.random_range(self.download.clone())),
            upload_mbps: round_tenth(rng.random_range(self.upload.clone())),
        }
    }
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
