// src/dag/scheduler.rs

use std::collections::HashMap;

use anyhow::{Result, bail};
use petgraph::Direction;
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use crate::job::Job;

/// Compute the execution generations for one stage's active job set.
///
/// Builds an in-degree graph from `needs` edges restricted to jobs present
/// in `jobs` itself: a dependency naming a job outside the active set (a
/// different stage, a branch-filtered job, or an unknown name) contributes
/// no edge and does not block scheduling — cross-stage ordering is enforced
/// by the stage sequence alone.
///
/// The result places every job in exactly one generation, with each job's
/// in-set dependencies in a strictly earlier generation. Jobs within one
/// generation carry no relative order beyond log determinism.
///
/// Fails with a circular-dependency error when the layering cannot place
/// every job; the caller attaches the stage name and aborts the run without
/// executing any job of the stage.
pub fn plan_generations(jobs: &[Job]) -> Result<Vec<Vec<Job>>> {
    let by_name: HashMap<&str, &Job> = jobs.iter().map(|job| (job.name.as_str(), job)).collect();

    // Edge direction: dependency -> dependent, as in the config's
    // `needs: [dep]`.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
    for job in jobs {
        graph.add_node(job.name.as_str());
    }
    for job in jobs {
        for dep in &job.needs {
            if dep == &job.name {
                // GraphMap has no self-loops; a self-dependency is the
                // smallest possible cycle.
                bail!("circular dependency detected: job '{}' needs itself", job.name);
            }
            if by_name.contains_key(dep.as_str()) {
                graph.add_edge(dep.as_str(), job.name.as_str(), ());
            }
        }
    }

    let mut in_degree: HashMap<&str, usize> = graph
        .nodes()
        .map(|n| (n, graph.neighbors_directed(n, Direction::Incoming).count()))
        .collect();

    let mut current: Vec<&str> = graph
        .nodes()
        .filter(|n| in_degree[n] == 0)
        .collect();

    let mut generations: Vec<Vec<Job>> = Vec::new();
    let mut placed = 0;

    while !current.is_empty() {
        placed += current.len();

        let mut next = Vec::new();
        for &name in &current {
            for dependent in graph.neighbors_directed(name, Direction::Outgoing) {
                let degree = in_degree
                    .get_mut(dependent)
                    .expect("dependent is a graph node");
                *degree -= 1;
                if *degree == 0 {
                    next.push(dependent);
                }
            }
        }

        generations.push(
            current
                .iter()
                .map(|name| (*by_name.get(name).expect("planned job is in active set")).clone())
                .collect(),
        );
        current = next;
    }

    if placed != jobs.len() {
        bail!("circular dependency detected in job dependencies");
    }

    debug!(
        jobs = jobs.len(),
        generations = generations.len(),
        "stage scheduled into generations"
    );

    Ok(generations)
}
