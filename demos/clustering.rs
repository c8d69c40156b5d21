//! Spherical k-means on a handful of toy "documents", scored against their topics.

use std::collections::BTreeSet;

use sphkmeans::{evaluate, Engine, LabelMap, LogFacadeSink, Seed};

fn main() -> sphkmeans::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Term ids: 0-3 sports, 4-7 finance, 8 shared filler.
    let docs: Vec<(u64, &str, Vec<usize>, Vec<f64>)> = vec![
        (1, "sports", vec![0, 1, 8], vec![3.0, 1.0, 1.0]),
        (2, "sports", vec![0, 2], vec![2.0, 2.0]),
        (3, "sports", vec![1, 2, 3, 8], vec![1.0, 1.0, 4.0, 1.0]),
        (4, "sports", vec![0, 3], vec![1.0, 2.0]),
        (5, "finance", vec![4, 5, 8], vec![2.0, 2.0, 1.0]),
        (6, "finance", vec![5, 6], vec![3.0, 1.0]),
        (7, "finance", vec![4, 6, 7, 8], vec![1.0, 2.0, 2.0, 1.0]),
        (8, "finance", vec![7], vec![5.0]),
    ];

    let mut engine = Engine::new(2);
    engine.set_seed(Seed::Fixed(1));
    engine.set_sink(Box::new(LogFacadeSink));

    let mut labels = LabelMap::new();
    for (id, topic, indices, values) in docs {
        engine.add_data_point(id, indices, values)?;
        labels.entry(topic.to_string()).or_insert_with(BTreeSet::new).insert(id);
    }

    let iterations = engine.run()?;
    println!("=== spherical k-means (k=2, {iterations} iterations) ===");
    for (cid, members) in engine.clusters().iter().enumerate() {
        println!("  cluster {cid}: {members:?}");
    }

    if let Some(result) = engine.last_result() {
        println!();
        print!("{}", evaluate(result, &labels));
    }
    Ok(())
}
