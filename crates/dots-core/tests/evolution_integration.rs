use dots_core::{
    CheckpointError, CheckpointStore, EvolutionConfig, Layout, ObstacleField, Population,
    PopulationSnapshot, ReproductionMode,
};

fn config(layout: Layout, mode: ReproductionMode) -> EvolutionConfig {
    EvolutionConfig {
        seed: 7,
        population_size: 30,
        mating_pool_size: 6,
        elitism_count: 2,
        reproduction_mode: mode,
        layout,
        ..EvolutionConfig::default()
    }
}

fn run(population: &mut Population, field: &ObstacleField, generations: usize) -> Vec<f64> {
    (0..generations)
        .map(|_| population.run_generation(field).unwrap().report.best_fitness)
        .collect()
}

#[test]
fn every_layout_evolves_without_losing_dots() {
    for layout in Layout::ALL {
        let config = config(layout, ReproductionMode::Crossover);
        let field = layout.build(&config);
        let mut population = Population::new(config, *field.goal()).unwrap();
        run(&mut population, &field, 3);
        assert_eq!(population.len(), 30, "{layout:?}");
        assert_eq!(population.generation(), 3);
        assert_eq!(population.elites().len(), 2);
    }
}

#[test]
fn saved_population_resumes_deterministically() {
    let config = config(Layout::TwoBars, ReproductionMode::Crossover);
    let field = config.layout.build(&config);
    let mut population = Population::new(config, *field.goal()).unwrap();
    run(&mut population, &field, 4);

    let bytes = population.save().unwrap();
    let mut first = Population::load(&bytes).unwrap();
    let mut second = Population::load(&bytes).unwrap();

    assert_eq!(first.generation(), 4);
    assert_eq!(first.config(), population.config());
    assert_eq!(first.elites(), population.elites());
    for (restored, original) in first.dots().iter().zip(population.dots()) {
        assert_eq!(restored.genome(), original.genome());
    }

    assert_eq!(run(&mut first, &field, 3), run(&mut second, &field, 3));
}

#[test]
fn elites_keep_best_fitness_from_regressing() {
    let config = config(Layout::CenterBar, ReproductionMode::Replicate);
    let field = config.layout.build(&config);
    let mut population = Population::new(config, *field.goal()).unwrap();
    let history = run(&mut population, &field, 10);
    assert!(history.windows(2).all(|w| w[1] >= w[0]), "{history:?}");
}

#[test]
fn store_tracks_generation_slots() {
    let dir = tempfile::tempdir().unwrap();
    let store = CheckpointStore::open(dir.path().join("run")).unwrap();
    let config = config(Layout::Open, ReproductionMode::Crossover);
    let field = config.layout.build(&config);
    let mut population = Population::new(config, *field.goal()).unwrap();

    for generation in 0..3u64 {
        store
            .write(&CheckpointStore::generation_slot(generation), &population)
            .unwrap();
        population.run_generation(&field).unwrap();
    }
    std::fs::write(store.root().join("run.json"), b"{}").unwrap();

    let slots = store.generation_slots().unwrap();
    assert_eq!(
        slots.iter().map(|(g, _)| *g).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
    let (latest, path) = store.latest().unwrap().unwrap();
    assert_eq!(latest, 2);
    let restored = CheckpointStore::read_path(&path).unwrap();
    assert_eq!(restored.generation(), 2);
}

#[test]
fn foreign_bytes_are_rejected() {
    assert!(matches!(
        Population::load(b"not a checkpoint"),
        Err(CheckpointError::Corrupt(_))
    ));

    let config = config(Layout::Open, ReproductionMode::Crossover);
    let field = config.layout.build(&config);
    let population = Population::new(config, *field.goal()).unwrap();
    let mut snapshot = PopulationSnapshot::capture(&population);
    snapshot.dots.pop();
    let bytes = snapshot.encode().unwrap();
    assert!(matches!(
        Population::load(&bytes),
        Err(CheckpointError::Corrupt(_))
    ));
}
