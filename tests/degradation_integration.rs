//! Failure-taxonomy tests: every degradation path leaves prior cache
//! state authoritative and none of them aborts the loop.

mod common;

use std::time::{Duration, Instant};

use common::TestWorld;
use sightline::core::config::TrackerConfig;
use sightline::core::types::TransformProfile;
use sightline::pipeline::Tracker;
use sightline::project::Viewport;

const TICK: Duration = Duration::from_millis(16);

#[test]
fn transport_outage_degrades_and_recovers() {
    let t0 = Instant::now();
    let world = TestWorld::new(2);
    let ids = world.ids.clone();
    let mut tracker = Tracker::new(
        world.gateway,
        world.layout,
        TrackerConfig::default(),
        Viewport::default(),
        t0,
    );
    tracker.tick(t0);
    assert_eq!(tracker.valid_ids().len(), 2);

    tracker.gateway_mut().set_transport_down(true);
    for i in 1..=5u32 {
        let shapes = tracker.tick(t0 + TICK * i);
        assert!(shapes.is_empty());
    }
    // Outage ticks leave the fast tier exactly as it was.
    assert_eq!(tracker.valid_ids().len(), 2);
    assert!(tracker.position(ids[0]).unwrap().valid);

    tracker.gateway_mut().set_transport_down(false);
    let shapes = tracker.tick(t0 + TICK * 6);
    assert!(!shapes.is_empty());
}

#[test]
fn faulted_attribute_slot_leaves_prior_record() {
    let t0 = Instant::now();
    let world = TestWorld::new(2);
    let ids = world.ids.clone();
    let layout = world.layout.clone();
    let mut tracker = Tracker::new(
        world.gateway,
        world.layout,
        TrackerConfig::default(),
        Viewport::default(),
        t0,
    );

    tracker.tick(t0);
    let t1 = t0 + Duration::from_secs(5);
    tracker.tick(t1);
    assert_eq!(tracker.attributes(ids[0]).unwrap().health, 100.0);

    // The remote now garbles this entity's health; its record must keep
    // the last good value through the next slow refresh.
    tracker
        .gateway_mut()
        .fault_address(ids[0].addr() + layout.health_offset);
    tracker
        .gateway_mut()
        .write_f32(ids[1].addr() + layout.health_offset, 40.0);

    let t2 = t1 + Duration::from_secs(5);
    tracker.tick(t2);
    assert_eq!(tracker.attributes(ids[0]).unwrap().health, 100.0);
    assert_eq!(tracker.attributes(ids[0]).unwrap().last_update, t1);
    assert_eq!(tracker.attributes(ids[1]).unwrap().health, 40.0);
}

#[test]
fn stale_transform_stays_usable_as_fallback() {
    let t0 = Instant::now();
    let world = TestWorld::new(1);
    let id = world.ids[0];
    let layout = world.layout.clone();
    let mut tracker = Tracker::new(
        world.gateway,
        world.layout,
        TrackerConfig::default(),
        Viewport::default(),
        t0,
    );
    tracker.tick(t0);
    let (_, fresh) = tracker.transform(id, TransformProfile::Head, t0).unwrap();
    assert!(fresh);

    // Pose reads start failing; the record survives past its TTL with
    // the validity bit reporting stale.
    tracker
        .gateway_mut()
        .fault_address(id.addr() + layout.matrix_offset);
    let t1 = t0 + Duration::from_millis(100);
    tracker.tick(t1);
    let (record, fresh) = tracker
        .transform(id, TransformProfile::Head, t1)
        .expect("stale record still present");
    assert!(!fresh);
    assert_eq!(record.last_update, t0);
}

#[test]
fn read_counters_track_batching_discipline() {
    let t0 = Instant::now();
    let world = TestWorld::new(4);
    let mut tracker = Tracker::new(
        world.gateway,
        world.layout,
        TrackerConfig::default(),
        Viewport::default(),
        t0,
    );

    tracker.tick(t0);
    let stats = tracker.stats().clone();
    // Five collection passes plus the two-pass bulk transform refresh.
    assert_eq!(stats.batch_round_trips, 7);
    // Slot count scales with entities, round trips do not.
    assert!(stats.remote_reads > stats.batch_round_trips);

    tracker.tick(t0 + TICK);
    // The second tick adds the same bounded number of round trips.
    assert_eq!(tracker.stats().batch_round_trips, 14);
}
