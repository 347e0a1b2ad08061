//! Batched remote-read gateway contract
//!
//! The remote source is round-trip-latency-bound, not bandwidth-bound,
//! so the whole pipeline is built around coalescing reads: callers queue
//! any number of (address, length) requests into a [`ScatterBatch`] and
//! the gateway performs them in one round trip. Slot fulfillment is
//! best-effort — a failed slot comes back absent without failing the
//! batch, while a failed round trip is a transport error the caller
//! degrades on.

pub mod memory;

use glam::{Mat4, Vec3};
use thiserror::Error;

use crate::core::types::RemoteAddr;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("remote transport failure: {0}")]
    Transport(String),
}

/// Handle to one queued read within a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotId(usize);

#[derive(Debug, Clone, Copy)]
pub struct ReadRequest {
    pub addr: RemoteAddr,
    pub len: u32,
}

/// Accumulates read requests for a single round trip.
#[derive(Debug, Default)]
pub struct ScatterBatch {
    requests: Vec<ReadRequest>,
}

impl ScatterBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            requests: Vec::with_capacity(capacity),
        }
    }

    /// Queue a raw read. Nothing executes until the gateway runs the batch.
    pub fn push(&mut self, addr: RemoteAddr, len: u32) -> SlotId {
        let slot = SlotId(self.requests.len());
        self.requests.push(ReadRequest { addr, len });
        slot
    }

    pub fn push_u64(&mut self, addr: RemoteAddr) -> SlotId {
        self.push(addr, 8)
    }

    pub fn push_i32(&mut self, addr: RemoteAddr) -> SlotId {
        self.push(addr, 4)
    }

    pub fn push_f32(&mut self, addr: RemoteAddr) -> SlotId {
        self.push(addr, 4)
    }

    pub fn push_vec3(&mut self, addr: RemoteAddr) -> SlotId {
        self.push(addr, 12)
    }

    pub fn push_mat4(&mut self, addr: RemoteAddr) -> SlotId {
        self.push(addr, 64)
    }

    pub fn requests(&self) -> &[ReadRequest] {
        &self.requests
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

/// Per-slot results of one executed batch.
///
/// A slot is `None` when the remote could not serve it; callers treat
/// that as "skip this record this pass", never as an error.
#[derive(Debug)]
pub struct BatchResults {
    slots: Vec<Option<Box<[u8]>>>,
}

impl BatchResults {
    pub fn new(slots: Vec<Option<Box<[u8]>>>) -> Self {
        Self { slots }
    }

    pub fn bytes(&self, slot: SlotId) -> Option<&[u8]> {
        self.slots.get(slot.0)?.as_deref()
    }

    fn read_pod<T: bytemuck::AnyBitPattern>(&self, slot: SlotId) -> Option<T> {
        let bytes = self.bytes(slot)?;
        if bytes.len() != std::mem::size_of::<T>() {
            return None;
        }
        Some(bytemuck::pod_read_unaligned(bytes))
    }

    pub fn read_u64(&self, slot: SlotId) -> Option<u64> {
        self.read_pod(slot)
    }

    pub fn read_i32(&self, slot: SlotId) -> Option<i32> {
        self.read_pod(slot)
    }

    pub fn read_f32(&self, slot: SlotId) -> Option<f32> {
        self.read_pod(slot)
    }

    pub fn read_vec3(&self, slot: SlotId) -> Option<Vec3> {
        self.read_pod::<[f32; 3]>(slot).map(Vec3::from_array)
    }

    pub fn read_mat4(&self, slot: SlotId) -> Option<Mat4> {
        self.read_pod::<[f32; 16]>(slot)
            .map(|cols| Mat4::from_cols_array(&cols))
    }

    /// Decode a slot holding `count` packed pointers.
    pub fn read_addr_array(&self, slot: SlotId, count: usize) -> Option<Vec<RemoteAddr>> {
        let bytes = self.bytes(slot)?;
        if bytes.len() != count * 8 {
            return None;
        }
        Some(
            bytes
                .chunks_exact(8)
                .map(bytemuck::pod_read_unaligned::<u64>)
                .collect(),
        )
    }
}

/// One round trip against the remote source.
///
/// Implementations fill each requested slot independently; partial
/// failure surfaces as absent slots, not as an `Err`.
pub trait RemoteMemoryGateway {
    fn execute(&mut self, batch: &ScatterBatch) -> Result<BatchResults, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn results_of(slots: Vec<Option<Box<[u8]>>>) -> BatchResults {
        BatchResults::new(slots)
    }

    #[test]
    fn typed_reads_decode_little_endian_bytes() {
        let f = 37.5f32.to_le_bytes();
        let results = results_of(vec![
            Some(Box::from(0xdead_beefu64.to_le_bytes().as_slice())),
            Some(Box::from(f.as_slice())),
        ]);
        assert_eq!(results.read_u64(SlotId(0)), Some(0xdead_beef));
        assert_eq!(results.read_f32(SlotId(1)), Some(37.5));
    }

    #[test]
    fn absent_or_short_slots_decode_to_none() {
        let results = results_of(vec![None, Some(Box::from([0u8; 3].as_slice()))]);
        assert_eq!(results.read_u64(SlotId(0)), None);
        assert_eq!(results.read_f32(SlotId(1)), None);
        assert_eq!(results.read_vec3(SlotId(1)), None);
    }

    #[test]
    fn addr_array_requires_exact_length() {
        let mut bytes = Vec::new();
        for v in [0x10u64, 0x20, 0x30] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        let results = results_of(vec![Some(bytes.into_boxed_slice())]);
        assert_eq!(
            results.read_addr_array(SlotId(0), 3),
            Some(vec![0x10, 0x20, 0x30])
        );
        assert_eq!(results.read_addr_array(SlotId(0), 4), None);
    }

    #[test]
    fn batch_slots_are_issued_in_push_order() {
        let mut batch = ScatterBatch::new();
        let a = batch.push_u64(0x100);
        let b = batch.push_vec3(0x200);
        assert_eq!(a, SlotId(0));
        assert_eq!(b, SlotId(1));
        assert_eq!(batch.requests()[1].len, 12);
    }
}
