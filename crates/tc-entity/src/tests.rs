//! Unit tests for tc-entity.

#[cfg(test)]
mod fixtures {
    use tc_core::Rgba;
    use tc_engine::InMemoryEngine;

    /// A → B → C, with light J feeding AB's two lanes into three links:
    /// AB_0 owns links 0 and 1, AB_1 owns link 2.
    pub fn network() -> InMemoryEngine {
        InMemoryEngine::builder()
            .junction("A", 0.0, 0.0)
            .junction("B", 100.0, 0.0)
            .junction("C", 200.0, 0.0)
            .edge("AB", "A", "B", 2)
            .edge("BC", "B", "C", 1)
            .edge(":B_0", "B", "B", 1)
            .route("r_ac", &["AB", "BC"])
            .light(
                "J",
                &["AB_0", "AB_0", "AB_1"],
                &[(30.0, "GGr"), (3.0, "yyr"), (2.0, "rrr"), (30.0, "rrG"), (3.0, "rry")],
            )
            .light("K", &["BC_0"], &[(10.0, "y"), (10.0, "r")])
            .polygon("park", &[(0.0, 10.0), (50.0, 10.0), (50.0, 40.0)], Rgba::GREEN, true)
            .station("cs0", 0)
            .build()
    }
}

#[cfg(test)]
mod vehicle_tests {
    use tc_core::{Rgba, RouteId, VehicleId};
    use tc_engine::TrafficEngine;

    use super::fixtures::network;
    use crate::Vehicle;

    #[test]
    fn spawn_registers_with_engine_then_colours() {
        let e = network();
        let mut v = Vehicle::spawn(&e, VehicleId::from("v0"), RouteId::from("r_ac"), "car").unwrap();
        assert_eq!(v.color(), None);
        v.set_color(&e, Rgba::RED).unwrap();
        assert_eq!(v.id().as_str(), "v0");
        assert_eq!(v.vehicle_type(), "car");
        assert_eq!(v.color(), Some(Rgba::RED));
        assert_eq!(e.vehicle_color(v.id()), Some(Rgba::RED));
    }

    #[test]
    fn spawn_on_unknown_route_fails() {
        let e = network();
        let err = Vehicle::spawn(&e, VehicleId::from("v0"), RouteId::from("nope"), "car").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(e.vehicle_count(), 0);
    }

    #[test]
    fn refresh_tracks_engine() {
        let e = network();
        let mut v = Vehicle::spawn(&e, VehicleId::from("v0"), RouteId::from("r_ac"), "car").unwrap();
        v.set_speed(&e, 10.0).unwrap();
        e.advance_step().unwrap();
        v.refresh(&e).unwrap();
        assert_eq!(v.speed(), 10.0);
        assert!((v.position().x - 10.0).abs() < 1e-9);
    }

    #[test]
    fn failed_refresh_keeps_last_values() {
        let e = network();
        let mut v = Vehicle::spawn(&e, VehicleId::from("v0"), RouteId::from("r_ac"), "car").unwrap();
        v.set_speed(&e, 5.0).unwrap();
        e.advance_step().unwrap();
        v.refresh(&e).unwrap();
        let before = v.clone();
        e.fail_vehicle(v.id());
        e.advance_step().unwrap();
        assert!(v.refresh(&e).is_err());
        assert_eq!(v, before);
    }
}

#[cfg(test)]
mod light_tests {
    use tc_core::{LaneId, LightId};
    use tc_engine::TrafficEngine;

    use super::fixtures::network;
    use crate::{EntityError, TrafficLight};

    fn light_j(e: &tc_engine::InMemoryEngine) -> TrafficLight {
        TrafficLight::import(e, LightId::from("J"), "tl_0".into()).unwrap()
    }

    #[test]
    fn import_reads_program_and_state() {
        let e = network();
        let l = light_j(&e);
        assert_eq!(l.alias(), "tl_0");
        assert_eq!(l.program_id(), "0");
        assert_eq!(l.program().phases.len(), 5);
        assert_eq!(l.phase_index(), 0);
        assert_eq!(l.remaining_secs(), 30.0);
    }

    #[test]
    fn controlled_lanes_are_unique_in_link_order() {
        let e = network();
        let l = light_j(&e);
        let lanes: Vec<&str> = l.controlled_lanes().iter().map(|l| l.as_str()).collect();
        assert_eq!(lanes, vec!["AB_0", "AB_1"]);
    }

    #[test]
    fn congestion_needs_strictly_more_than_threshold() {
        let e = network();
        let l = light_j(&e);
        e.set_lane_halting(&LaneId::from("AB_1"), 3);
        assert_eq!(l.most_congested_lane(&e, 3).unwrap(), None);
        e.set_lane_halting(&LaneId::from("AB_1"), 4);
        assert_eq!(l.most_congested_lane(&e, 3).unwrap(), Some(LaneId::from("AB_1")));
    }

    #[test]
    fn congestion_picks_highest_then_earliest() {
        let e = network();
        let l = light_j(&e);
        e.set_lane_halting(&LaneId::from("AB_0"), 6);
        e.set_lane_halting(&LaneId::from("AB_1"), 6);
        assert_eq!(l.most_congested_lane(&e, 3).unwrap(), Some(LaneId::from("AB_0")));
        e.set_lane_halting(&LaneId::from("AB_1"), 7);
        assert_eq!(l.most_congested_lane(&e, 3).unwrap(), Some(LaneId::from("AB_1")));
    }

    #[test]
    fn green_phase_for_lane_scans_all_links_of_the_lane() {
        let e = network();
        let l = light_j(&e);
        assert_eq!(l.green_phase_for_lane(&LaneId::from("AB_0")), Some(0));
        assert_eq!(l.green_phase_for_lane(&LaneId::from("AB_1")), Some(3));
        assert_eq!(l.green_phase_for_lane(&LaneId::from("BC_0")), None);
    }

    #[test]
    fn phase_classes() {
        let e = network();
        let mut l = light_j(&e);
        assert!(l.is_green_phase());
        assert!(!l.is_red_phase());
        l.set_phase(&e, 1).unwrap();
        assert!(!l.is_green_phase());
        assert!(!l.is_red_phase(), "amber is not red");
        l.set_phase(&e, 2).unwrap();
        assert!(l.is_red_phase());
    }

    #[test]
    fn set_phase_updates_engine_and_mirror() {
        let e = network();
        let mut l = light_j(&e);
        l.set_phase(&e, 3).unwrap();
        assert_eq!(l.phase_index(), 3);
        assert_eq!(e.light_state(l.id()).unwrap().phase_index, 3);
        l.set_phase_duration(&e, 7.0).unwrap();
        assert_eq!(e.light_state(l.id()).unwrap().remaining_secs, 7.0);
        assert!(l.set_phase(&e, 9).is_err());
        assert_eq!(l.phase_index(), 3);
    }

    #[test]
    fn switch_to_next_red_and_green_wrap_around() {
        let e = network();
        let mut l = light_j(&e);
        assert_eq!(l.switch_to_next_red(&e).unwrap(), 2);
        assert_eq!(l.switch_to_next_green(&e).unwrap(), 3);
        assert_eq!(l.switch_to_next_green(&e).unwrap(), 0);
    }

    #[test]
    fn switch_without_matching_phase_is_an_error() {
        let e = network();
        let mut l = TrafficLight::import(&e, LightId::from("K"), "tl_1".into()).unwrap();
        let err = l.switch_to_next_green(&e).unwrap_err();
        assert!(matches!(err, EntityError::NoPhase { class: "green", .. }));
        assert_eq!(l.switch_to_next_red(&e).unwrap(), 1);
    }

    #[test]
    fn refresh_follows_engine_cycle() {
        let e = network();
        let mut l = TrafficLight::import(&e, LightId::from("K"), "tl_1".into()).unwrap();
        for _ in 0..10 {
            e.advance_step().unwrap();
        }
        l.refresh(&e).unwrap();
        assert_eq!(l.phase_index(), 1);
    }

    #[test]
    fn program_definition_lists_phases() {
        let e = network();
        let l = light_j(&e);
        let text = l.program_definition();
        assert!(text.starts_with("light tl_0 (J) program 0"));
        assert_eq!(text.lines().count(), 6);
        assert!(text.contains("*  0:"));
    }
}

#[cfg(test)]
mod flow_tests {
    use tc_core::{Rgba, RouteId, VehicleId};
    use tc_engine::TrafficEngine;

    use super::fixtures::network;
    use crate::Flow;

    #[test]
    fn inject_creates_batch_with_indexed_ids() {
        let e = network();
        let flow = Flow::new("f", RouteId::from("r_ac"), "car", 3).with_color(Rgba::BLUE);
        let vehicles = flow.inject(&e).unwrap();
        let ids: Vec<&str> = vehicles.iter().map(|v| v.id().as_str()).collect();
        assert_eq!(ids, vec!["f_0", "f_1", "f_2"]);
        assert_eq!(e.vehicle_count(), 3);
        assert_eq!(e.vehicle_color(&VehicleId::from("f_1")), Some(Rgba::BLUE));
    }

    #[test]
    fn zero_batch_is_empty() {
        let e = network();
        let flow = Flow::new("f", RouteId::from("r_ac"), "car", 0);
        assert!(flow.inject(&e).unwrap().is_empty());
    }

    #[test]
    fn failure_mid_batch_returns_created_vehicles() {
        let e = network();
        e.add_vehicle(&VehicleId::from("f_2"), &RouteId::from("r_ac"), "car").unwrap();
        let flow = Flow::new("f", RouteId::from("r_ac"), "car", 4);
        let err = flow.inject(&e).unwrap_err();
        assert_eq!(err.failed.as_str(), "f_2");
        assert_eq!(err.created.len(), 2);
        assert!(err.to_string().contains("after 2 created"));
    }

    #[test]
    fn refused_colour_keeps_vehicle_in_created() {
        let e = network();
        e.fail_color(&VehicleId::from("f_2"));
        let flow = Flow::new("f", RouteId::from("r_ac"), "car", 5).with_color(Rgba::RED);
        let err = flow.inject(&e).unwrap_err();

        assert_eq!(err.failed.as_str(), "f_2");
        let ids: Vec<&str> = err.created.iter().map(|v| v.id().as_str()).collect();
        assert_eq!(ids, vec!["f_0", "f_1", "f_2"]);
        assert_eq!(e.vehicle_count(), err.created.len(), "every engine vehicle is handed back");
        assert_eq!(err.created[2].color(), None);
        assert_eq!(err.created[1].color(), Some(Rgba::RED));
    }
}

#[cfg(test)]
mod geometry_tests {
    use tc_core::EdgeId;

    use super::fixtures::network;
    use crate::geometry::load_edges;
    use crate::MapGeometry;

    #[test]
    fn internal_edges_are_filtered() {
        let e = network();
        let edges = load_edges(&e).unwrap();
        assert_eq!(edges, vec![EdgeId::from("AB"), EdgeId::from("BC")]);
    }

    #[test]
    fn import_collects_everything() {
        let e = network();
        let geo = MapGeometry::import(&e).unwrap();
        assert_eq!(geo.bounds.max_x, 200.0);
        assert_eq!(geo.lanes.len(), 4);
        assert_eq!(geo.polygons.len(), 1);
        assert!(geo.polygons[0].filled);
        assert_eq!(geo.edges.len(), 2);
    }
}

#[cfg(test)]
mod registry_tests {
    use std::sync::Arc;
    use std::thread;

    use tc_core::{RouteId, VehicleId};

    use crate::{lock, EntityRegistry, Registry, Vehicle};

    fn vehicle(id: &str) -> Vehicle {
        Vehicle::new(VehicleId::from(id), RouteId::from("r"), "car")
    }

    #[test]
    fn values_are_ordered_by_key() {
        let reg: Registry<String, u32> = Registry::new();
        reg.put("b".into(), 2);
        reg.put("a".into(), 1);
        reg.put("c".into(), 3);
        let values: Vec<u32> = reg.values().iter().map(|v| *lock(v)).collect();
        assert_eq!(values, vec![1, 2, 3]);
        assert_eq!(reg.ids(), vec!["a", "b", "c"]);
    }

    #[test]
    fn lookup_by_borrowed_key() {
        let reg = EntityRegistry::new();
        reg.add_vehicle(vehicle("v0"));
        assert!(reg.vehicles.contains("v0"));
        assert!(reg.vehicles.get("v1").is_none());
        assert_eq!(reg.vehicles.with("v0", |v| v.vehicle_type().to_owned()), Some("car".into()));
    }

    #[test]
    fn remove_all_counts_present_keys() {
        let reg = EntityRegistry::new();
        reg.add_vehicles([vehicle("a"), vehicle("b"), vehicle("c")]);
        let gone = [VehicleId::from("a"), VehicleId::from("c"), VehicleId::from("z")];
        assert_eq!(reg.vehicles.remove_all(gone.iter()), 2);
        assert_eq!(reg.vehicles.ids(), vec![VehicleId::from("b")]);
    }

    #[test]
    fn snapshot_survives_concurrent_removal() {
        let reg = EntityRegistry::new();
        reg.add_vehicles([vehicle("a"), vehicle("b")]);
        let snapshot = reg.vehicles.values();
        reg.vehicles.remove("a");
        assert_eq!(snapshot.len(), 2);
        assert_eq!(lock(&snapshot[0]).id().as_str(), "a");
        assert_eq!(reg.vehicles.len(), 1);
    }

    #[test]
    fn get_or_try_insert_creates_once() {
        let reg: Registry<String, u32> = Registry::new();
        let mut calls = 0;
        let a = reg.get_or_try_insert_with("k".into(), || -> Result<u32, ()> { calls += 1; Ok(7) }).unwrap();
        let b = reg.get_or_try_insert_with("k".into(), || -> Result<u32, ()> { calls += 1; Ok(8) }).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(calls, 1);
        assert_eq!(*lock(&a), 7);
        assert!(reg.get_or_try_insert_with("e".into(), || Err::<u32, _>("boom")).is_err());
        assert!(!reg.contains("e"));
    }

    #[test]
    fn concurrent_inserts_all_land() {
        let reg = Arc::new(EntityRegistry::new());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let reg = Arc::clone(&reg);
                thread::spawn(move || {
                    for i in 0..50 {
                        reg.add_vehicle(vehicle(&format!("t{t}_{i}")));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(reg.vehicles.len(), 200);
    }

    #[test]
    fn poisoned_entity_lock_is_recovered() {
        let reg: Arc<Registry<String, u32>> = Arc::new(Registry::new());
        let shared = reg.put("k".into(), 1);
        let poison = Arc::clone(&shared);
        let _ = thread::spawn(move || {
            let _guard = poison.lock().unwrap();
            panic!("poison");
        })
        .join();
        assert!(shared.is_poisoned());
        assert_eq!(reg.with("k", |v| { *v += 1; *v }), Some(2));
    }
}

#[cfg(test)]
mod parking_tests {
    use tc_core::{RouteId, StationId};
    use tc_engine::TrafficEngine;

    use super::fixtures::network;
    use crate::{ParkingArea, Route};

    #[test]
    fn station_refresh_reads_occupancy() {
        let e = network();
        let mut s = ParkingArea::new(StationId::from("cs0"));
        assert_eq!(s.refresh(&e).unwrap(), 0);
        assert!(!s.is_occupied());
        e.set_station_occupancy(s.id(), 2);
        s.refresh(&e).unwrap();
        assert_eq!(s.occupancy(), 2);
        assert!(s.is_occupied());
    }

    #[test]
    fn route_fetch_reads_edges() {
        let e = network();
        let r = Route::fetch(&e, RouteId::from("r_ac")).unwrap();
        assert_eq!(r.origin().map(|e| e.as_str()), Some("AB"));
        assert_eq!(r.destination().map(|e| e.as_str()), Some("BC"));
        assert!(Route::fetch(&e, RouteId::from("nope")).is_err());
        assert!(e.route_edges(r.id()).is_ok());
    }
}
