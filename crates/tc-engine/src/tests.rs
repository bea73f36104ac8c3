//! Tests for the in-memory engine.

#[cfg(test)]
mod memory_tests {
    use tc_core::{EdgeId, LaneId, LightId, Position, Rgba, RouteId, StationId, VehicleId};

    use crate::{EngineError, EntityKind, InMemoryEngine, Phase, TrafficEngine};

    /// A → B → C in a straight line, 100 m per edge, plus a disconnected D → E.
    fn line() -> InMemoryEngine {
        InMemoryEngine::builder()
            .junction("A", 0.0, 0.0)
            .junction("B", 100.0, 0.0)
            .junction("C", 200.0, 0.0)
            .junction("D", 0.0, 500.0)
            .junction("E", 100.0, 500.0)
            .edge("AB", "A", "B", 2)
            .edge("BC", "B", "C", 1)
            .edge("DE", "D", "E", 1)
            .route("r_ac", &["AB", "BC"])
            .light("J", &["AB_0", "AB_1"], &[(3.0, "Gr"), (1.0, "yr"), (3.0, "rG")])
            .station("cs0", 2)
            .build()
    }

    #[test]
    fn lanes_named_after_edge() {
        let e = line();
        assert_eq!(e.lanes_of(&EdgeId::from("AB")), vec![LaneId::from("AB_0"), LaneId::from("AB_1")]);
        let shape = e.lane_shape(&LaneId::from("BC_0")).unwrap();
        assert_eq!(shape, vec![Position::new(100.0, 0.0), Position::new(200.0, 0.0)]);
    }

    #[test]
    fn bfs_route_across_edges() {
        let e = line();
        let route = e.compute_route(&EdgeId::from("AB"), &EdgeId::from("BC")).unwrap();
        assert_eq!(route, vec![EdgeId::from("AB"), EdgeId::from("BC")]);
        assert_eq!(e.route_query_count(), 1);
    }

    #[test]
    fn unreachable_route_is_empty() {
        let e = line();
        let route = e.compute_route(&EdgeId::from("AB"), &EdgeId::from("DE")).unwrap();
        assert!(route.is_empty());
    }

    #[test]
    fn unknown_edge_is_not_found() {
        let e = line();
        let err = e.compute_route(&EdgeId::from("AB"), &EdgeId::from("ZZ")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn vehicle_moves_and_arrives() {
        let e = line();
        let id = VehicleId::from("v0");
        e.add_vehicle(&id, &RouteId::from("r_ac"), "car").unwrap();
        e.set_vehicle_speed(&id, 50.0).unwrap();

        e.advance_step().unwrap();
        let t = e.vehicle_telemetry(&id).unwrap();
        assert_eq!(t.position, Position::new(50.0, 0.0));
        assert_eq!(t.speed, 50.0);

        e.advance_step().unwrap(); // 100 m: start of BC
        e.advance_step().unwrap(); // 150 m
        assert!(e.arrived_ids().unwrap().is_empty());
        e.advance_step().unwrap(); // 200 m: end of BC
        assert_eq!(e.arrived_ids().unwrap(), vec![id.clone()]);
        assert!(e.vehicle_telemetry(&id).unwrap_err().is_not_found());

        e.advance_step().unwrap();
        assert!(e.arrived_ids().unwrap().is_empty(), "arrivals are per step");
    }

    #[test]
    fn duplicate_vehicle_rejected() {
        let e = line();
        let id = VehicleId::from("v0");
        e.add_vehicle(&id, &RouteId::from("r_ac"), "car").unwrap();
        let err = e.add_vehicle(&id, &RouteId::from("r_ac"), "car").unwrap_err();
        assert!(matches!(err, EngineError::Rejected { op: "add_vehicle", .. }));
    }

    #[test]
    fn add_vehicle_unknown_route() {
        let e = line();
        let err = e.add_vehicle(&VehicleId::from("v"), &RouteId::from("nope"), "car").unwrap_err();
        assert_eq!(err, EngineError::not_found(EntityKind::Route, "nope"));
    }

    #[test]
    fn light_cycles_phases() {
        let e = line();
        let j = LightId::from("J");
        assert_eq!(e.light_state(&j).unwrap().phase_index, 0);
        for _ in 0..3 {
            e.advance_step().unwrap();
        }
        let s = e.light_state(&j).unwrap();
        assert_eq!(s.phase_index, 1);
        assert_eq!(s.remaining_secs, 1.0);
        e.advance_step().unwrap();
        assert_eq!(e.light_state(&j).unwrap().phase_index, 2);
    }

    #[test]
    fn set_phase_and_duration() {
        let e = line();
        let j = LightId::from("J");
        e.set_phase(&j, 2).unwrap();
        e.set_phase_duration(&j, 12.0).unwrap();
        let s = e.light_state(&j).unwrap();
        assert_eq!(s.phase_index, 2);
        assert_eq!(s.remaining_secs, 12.0);
        assert!(e.set_phase(&j, 9).is_err());
    }

    #[test]
    fn create_route_once() {
        let e = line();
        let id = RouteId::from("dyn");
        e.create_route(&id, &[EdgeId::from("AB")]).unwrap();
        assert!(e.create_route(&id, &[EdgeId::from("AB")]).is_err());
        assert!(e.create_route(&RouteId::from("empty"), &[]).is_err());
        assert_eq!(e.route_creation_count(), 1);
        assert_eq!(e.route_edges(&id).unwrap(), vec![EdgeId::from("AB")]);
    }

    #[test]
    fn list_ids_by_kind() {
        let e = line();
        assert_eq!(e.list_ids(EntityKind::Edge).unwrap(), vec!["AB", "BC", "DE"]);
        assert_eq!(e.list_ids(EntityKind::TrafficLight).unwrap(), vec!["J"]);
        assert_eq!(e.list_ids(EntityKind::ChargingStation).unwrap(), vec!["cs0"]);
        assert!(e.list_ids(EntityKind::Polygon).unwrap().is_empty());
    }

    #[test]
    fn bounds_enclose_junctions() {
        let b = line().network_bounds().unwrap();
        assert_eq!((b.min_x, b.min_y, b.max_x, b.max_y), (0.0, 0.0, 200.0, 500.0));
    }

    #[test]
    fn injected_faults() {
        let e = line();
        let id = VehicleId::from("v0");
        e.add_vehicle(&id, &RouteId::from("r_ac"), "car").unwrap();

        e.fail_vehicle(&id);
        assert!(matches!(e.vehicle_telemetry(&id), Err(EngineError::Connection(_))));
        e.heal_vehicle(&id);
        assert!(e.vehicle_telemetry(&id).is_ok());

        e.fail_next_step();
        assert!(matches!(e.advance_step(), Err(EngineError::Step(_))));
        assert!(e.advance_step().is_ok(), "step fault fires once");

        e.fail_station(&StationId::from("cs0"));
        assert!(e.station_occupancy(&StationId::from("cs0")).is_err());
    }

    #[test]
    fn colour_and_time_faults() {
        let e = line();
        let id = VehicleId::from("v0");
        e.fail_color(&id);
        e.add_vehicle(&id, &RouteId::from("r_ac"), "car").unwrap();
        assert!(matches!(e.set_vehicle_color(&id, Rgba::RED), Err(EngineError::Rejected { .. })));
        assert_eq!(e.vehicle_color(&id), None);
        assert_eq!(e.vehicle_count(), 1, "a refused colour leaves the vehicle in place");

        e.fail_next_time_read();
        assert!(e.sim_time().is_err());
        assert!(e.sim_time().is_ok(), "time fault fires once");
    }

    #[test]
    fn reported_arrival_delivered_next_step() {
        let e = line();
        let id = VehicleId::from("v0");
        e.add_vehicle(&id, &RouteId::from("r_ac"), "car").unwrap();
        e.report_arrival(&id);
        e.report_arrival(&id);
        e.advance_step().unwrap();
        assert_eq!(e.arrived_ids().unwrap(), vec![id.clone(), id]);
    }

    #[test]
    fn phase_helpers() {
        let p = Phase::new(5.0, "GgrY");
        assert!(p.is_green_at(0));
        assert!(p.is_green_at(1));
        assert!(!p.is_green_at(2));
        assert!(!p.is_green_at(10));
        assert!(p.has_green());
        assert!(!p.is_all_red());
        assert!(Phase::new(2.0, "rrr").is_all_red());
        assert!(!Phase::new(2.0, "ryr").is_all_red());
    }
}
