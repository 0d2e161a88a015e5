use gw_balance::error::SimError;
use gw_balance::{ConfigError, HotStart, Project, Simulation};

const DEMO: &str = include_str!("../data/demo.toml");

#[test]
fn demo_scenario_runs_with_small_continuity_error() {
    let project = Project::from_toml_str(DEMO).unwrap();
    let mut sim = Simulation::new(project);
    let mut out = Vec::new();
    let err = sim.run(&mut out).unwrap();
    assert!(err.abs() < 2.0, "continuity error {err} %");

    let text = String::from_utf8(out).unwrap();
    // 120 hr of 15 min steps for two subcatchments, plus the header
    assert_eq!(text.lines().count(), 1 + 2 * 480);

    for (i, s) in sim.project.subcatchments.iter().enumerate() {
        let gw = s.groundwater.as_ref().unwrap();
        let aquifer = &sim.project.aquifers[gw.aquifer];
        assert!(gw.theta >= aquifer.wilting_point && gw.theta < aquifer.porosity);
        assert!(gw.lower_depth >= 0.0 && gw.lower_depth < gw.total_depth());
        assert_eq!(sim.stats.gw[i].steps(), 480);
    }
}

#[test]
fn hot_start_continues_from_saved_state() {
    let mut first = Simulation::new(Project::from_toml_str(DEMO).unwrap());
    first.run(std::io::sink()).unwrap();
    let saved = HotStart::capture(&first.project);
    let text = saved.to_toml_string().unwrap();

    let mut second = Simulation::new(Project::from_toml_str(DEMO).unwrap());
    let restored = HotStart::from_toml_str(&text).unwrap();
    assert_eq!(restored.apply(&mut second.project), 2);
    second.reset_totals();

    for (a, b) in first
        .project
        .subcatchments
        .iter()
        .zip(&second.project.subcatchments)
    {
        let (ga, gb) = (a.groundwater.as_ref().unwrap(), b.groundwater.as_ref().unwrap());
        assert_eq!(ga.theta, gb.theta);
        assert_eq!(ga.lower_depth, gb.lower_depth);
        assert_eq!(ga.new_flow, gb.new_flow);
    }
    assert_eq!(HotStart::capture(&second.project), saved);
}

#[test]
fn bad_scenario_reports_every_problem() {
    let text = DEMO
        .replace("node = \"J1\"\nsurface_elev = 18.0", "node = \"J2\"\nsurface_elev = 18.0")
        .replace("HGW - HCB)", "HGW - HXB)");
    match Project::from_toml_str(&text) {
        Err(SimError::Validation(errors)) => {
            assert_eq!(errors.len(), 2);
            assert!(errors
                .iter()
                .any(|e| matches!(e, ConfigError::UndefinedObject { kind: "node", .. })));
            assert!(errors
                .iter()
                .any(|e| matches!(e, ConfigError::FlowExpression { which: "lateral", .. })));
        }
        other => panic!("expected validation errors, got {other:?}"),
    }
}
