//! In-memory gateway backed by a sparse byte map
//!
//! Stands in for a real transport in the demo binary and the test
//! suites. Supports per-address fault injection (a slot touching a
//! faulted byte comes back absent) and whole-round-trip failure, and
//! counts round trips so tests can assert batching discipline.

use ahash::{AHashMap, AHashSet};
use glam::{Mat4, Vec3};

use crate::core::types::RemoteAddr;
use crate::gateway::{BatchResults, GatewayError, RemoteMemoryGateway, ScatterBatch};

#[derive(Debug, Default)]
pub struct InMemoryGateway {
    bytes: AHashMap<RemoteAddr, u8>,
    faulted: AHashSet<RemoteAddr>,
    transport_down: bool,
    round_trips: u64,
    slots_served: u64,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_bytes(&mut self, addr: RemoteAddr, data: &[u8]) {
        for (i, byte) in data.iter().enumerate() {
            self.bytes.insert(addr.wrapping_add(i as u64), *byte);
        }
    }

    pub fn write_u64(&mut self, addr: RemoteAddr, value: u64) {
        self.write_bytes(addr, &value.to_le_bytes());
    }

    pub fn write_i32(&mut self, addr: RemoteAddr, value: i32) {
        self.write_bytes(addr, &value.to_le_bytes());
    }

    pub fn write_f32(&mut self, addr: RemoteAddr, value: f32) {
        self.write_bytes(addr, &value.to_le_bytes());
    }

    pub fn write_vec3(&mut self, addr: RemoteAddr, value: Vec3) {
        self.write_bytes(addr, bytemuck::bytes_of(&value.to_array()));
    }

    pub fn write_mat4(&mut self, addr: RemoteAddr, value: Mat4) {
        self.write_bytes(addr, bytemuck::bytes_of(&value.to_cols_array()));
    }

    /// Drop all bytes at `addr..addr+len`, as if the region were unmapped.
    pub fn erase(&mut self, addr: RemoteAddr, len: u32) {
        for i in 0..len as u64 {
            self.bytes.remove(&addr.wrapping_add(i));
        }
    }

    /// Make any slot touching `addr` come back absent.
    pub fn fault_address(&mut self, addr: RemoteAddr) {
        self.faulted.insert(addr);
    }

    pub fn clear_faults(&mut self) {
        self.faulted.clear();
    }

    /// Fail entire round trips until restored.
    pub fn set_transport_down(&mut self, down: bool) {
        self.transport_down = down;
    }

    pub fn round_trips(&self) -> u64 {
        self.round_trips
    }

    pub fn slots_served(&self) -> u64 {
        self.slots_served
    }

    fn slot_bytes(&self, addr: RemoteAddr, len: u32) -> Option<Box<[u8]>> {
        let mut out = Vec::with_capacity(len as usize);
        for i in 0..len as u64 {
            let at = addr.wrapping_add(i);
            if self.faulted.contains(&at) {
                return None;
            }
            out.push(*self.bytes.get(&at)?);
        }
        Some(out.into_boxed_slice())
    }
}

impl RemoteMemoryGateway for InMemoryGateway {
    fn execute(&mut self, batch: &ScatterBatch) -> Result<BatchResults, GatewayError> {
        if self.transport_down {
            return Err(GatewayError::Transport("link down".into()));
        }
        self.round_trips += 1;

        let slots: Vec<_> = batch
            .requests()
            .iter()
            .map(|req| self.slot_bytes(req.addr, req.len))
            .collect();
        self.slots_served += slots.iter().filter(|s| s.is_some()).count() as u64;

        Ok(BatchResults::new(slots))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::ScatterBatch;

    #[test]
    fn round_trip_preserves_written_values() {
        let mut gw = InMemoryGateway::new();
        gw.write_f32(0x100, 1.25);
        gw.write_vec3(0x200, Vec3::new(1.0, 2.0, 3.0));

        let mut batch = ScatterBatch::new();
        let f = batch.push_f32(0x100);
        let v = batch.push_vec3(0x200);
        let results = gw.execute(&batch).unwrap();

        assert_eq!(results.read_f32(f), Some(1.25));
        assert_eq!(results.read_vec3(v), Some(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(gw.round_trips(), 1);
    }

    #[test]
    fn faulted_slot_is_absent_without_failing_the_batch() {
        let mut gw = InMemoryGateway::new();
        gw.write_u64(0x100, 7);
        gw.write_u64(0x200, 9);
        gw.fault_address(0x203);

        let mut batch = ScatterBatch::new();
        let ok = batch.push_u64(0x100);
        let bad = batch.push_u64(0x200);
        let results = gw.execute(&batch).unwrap();

        assert_eq!(results.read_u64(ok), Some(7));
        assert_eq!(results.read_u64(bad), None);
    }

    #[test]
    fn unmapped_region_is_absent() {
        let mut gw = InMemoryGateway::new();
        gw.write_u64(0x100, 7);
        gw.erase(0x104, 4);

        let mut batch = ScatterBatch::new();
        let slot = batch.push_u64(0x100);
        let results = gw.execute(&batch).unwrap();
        assert_eq!(results.read_u64(slot), None);
    }

    #[test]
    fn transport_down_fails_the_round_trip() {
        let mut gw = InMemoryGateway::new();
        gw.set_transport_down(true);
        let mut batch = ScatterBatch::new();
        batch.push_u64(0x100);
        assert!(gw.execute(&batch).is_err());
        assert_eq!(gw.round_trips(), 0);
    }
}
