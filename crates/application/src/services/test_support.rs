//! Shared fakes for service tests

use std::collections::HashMap;
use std::io::Cursor;

use async_trait::async_trait;
use chrono::NaiveDate;
use domain::{Identity, QuotaRecord};
use hound::{WavSpec, WavWriter};
use parking_lot::Mutex;

use crate::error::ApplicationError;
use crate::ports::{QuotaStorePort, Reservation};

/// Minimal store with the same atomicity guarantee as the real ones
#[derive(Debug, Default)]
pub(crate) struct InMemoryStore {
    records: Mutex<HashMap<Identity, QuotaRecord>>,
}

impl InMemoryStore {
    pub(crate) fn count(&self, identity: &Identity) -> u32 {
        self.records.lock().get(identity).map_or(0, |r| r.count)
    }
}

#[async_trait]
impl QuotaStorePort for InMemoryStore {
    async fn reserve(
        &self,
        identity: &Identity,
        day: NaiveDate,
        limit: u32,
    ) -> Result<Reservation, ApplicationError> {
        let mut records = self.records.lock();
        let record = records
            .entry(identity.clone())
            .or_insert_with(|| QuotaRecord::new(identity.clone(), day));
        let admitted = record.try_reserve(day, limit).is_some();
        Ok(Reservation {
            admitted,
            count: record.count_on(day),
        })
    }

    async fn usage(&self, identity: &Identity, day: NaiveDate) -> Result<u32, ApplicationError> {
        Ok(self
            .records
            .lock()
            .get(identity)
            .map_or(0, |r| r.count_on(day)))
    }

    async fn purge_before(&self, day: NaiveDate) -> Result<u64, ApplicationError> {
        let mut records = self.records.lock();
        let before = records.len();
        records.retain(|_, r| r.day >= day);
        Ok((before - records.len()) as u64)
    }
}

/// Silent MPEG-1 Layer III frames: 128 kbit/s, 48 kHz, 384 bytes each
pub(crate) fn mp3_frames(count: usize) -> Vec<u8> {
    let mut frame = vec![0u8; 384];
    frame[..4].copy_from_slice(&[0xFF, 0xFB, 0x94, 0x00]);
    frame.repeat(count)
}

/// WAV file holding `samples` under `spec`
pub(crate) fn wav_bytes(spec: WavSpec, samples: &[i16]) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    let mut writer = WavWriter::new(&mut out, spec).unwrap();
    for &sample in samples {
        writer.write_sample(sample).unwrap();
    }
    writer.finalize().unwrap();
    out.into_inner()
}
