use approx::assert_relative_eq;
use plate_rd::prelude::*;

fn plate(inducer_concentration: f64, bandpass: bool) -> Plate<f64> {
    let setup = PlateSetup::new(
        vec![[2, 2], [2, 6], [6, 6]],
        vec![[0, 0]],
        inducer_concentration,
        (8, 8),
        4.5,
    )
    .with_flags(true, bandpass, false);
    let (params, curve) = fitted_parameters(setup.topology);
    make_plate(&setup, &params, UniformGrowth::new(curve)).unwrap()
}

fn settings(solver: Solver) -> Settings<f64> {
    Settings {
        time: FixedStepsize::from_save_freq(0.0, 1.0, 600.0, 100).unwrap(),
        solver,
        show_progressbar: false,
    }
}

#[test]
fn integration_conserves_inducer() {
    let mut plate = plate(5.0, false);
    let initial = plate.state().get(INDUCER).unwrap().sum();
    let trajectory = integrate(&mut plate, settings(Solver::RungeKutta4)).unwrap();
    assert_eq!(trajectory.len(), 7);
    for (_, state) in trajectory.iter() {
        assert_relative_eq!(
            state.get(INDUCER).unwrap().sum(),
            initial,
            max_relative = 1e-6
        );
    }
    // Inducer spread away from the source
    let last = plate.state();
    let a = last.get(INDUCER).unwrap();
    assert!(a[[0, 0]] < initial);
    assert!(a[[2, 2]] > 0.0);
}

#[test]
fn receivers_grow_and_express_reporter() {
    let mut plate = plate(5.0, true);
    integrate(&mut plate, settings(Solver::AdamsBashforth3)).unwrap();
    let state = plate.state();
    let (params, curve) = fitted_parameters(Topology::Bandpass);

    let x = state.get(BIOMASS).unwrap();
    // Biomass follows the growth curve in every receiver
    assert_relative_eq!(
        x[[2, 2]],
        params.x_0 + curve.value(600.0) - curve.value(0.0),
        max_relative = 1e-6
    );
    assert_eq!(x[[0, 0]], 0.0);

    let g = state.get(REPORTER).unwrap();
    assert!(g[[2, 2]] > 0.0);
    assert_eq!(g[[4, 4]], 0.0);
    for (_, field) in state.iter() {
        assert!(field.iter().all(|v| v.is_finite()));
    }
}

#[test]
fn batch_of_inducer_concentrations() {
    let concentrations = [0.0, 1.0, 10.0];
    let jobs = concentrations
        .iter()
        .map(|c| (plate(*c, false), settings(Solver::Euler)))
        .collect();
    let results = run_batch(jobs);
    assert_eq!(results.len(), 3);
    for (result, c) in results.into_iter().zip(concentrations) {
        let trajectory = result.unwrap();
        let sequential = integrate(&mut plate(c, false), settings(Solver::Euler)).unwrap();
        assert_eq!(trajectory, sequential);
    }
}

#[test]
fn settings_from_json() {
    let settings = settings(Solver::RungeKutta4);
    let json = serde_json::to_string(&settings).unwrap();
    let parsed: Settings<f64> = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.solver, Solver::RungeKutta4);
    assert_eq!(
        parsed.time.maximum_iterations(),
        settings.time.maximum_iterations()
    );
}
