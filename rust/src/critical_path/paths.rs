//! Bounded enumeration of every source-to-sink path.
//!
//! The number of paths grows exponentially in densely cross-linked graphs, so
//! enumeration refuses oversized graphs up front and aborts once the path cap
//! is reached.

use crate::config::AnalysisConfig;
use crate::graph::TaskGraph;
use crate::interner::NodeId;
use crate::log_checks;
use crate::models::{Dependency, Task};

use super::calculation::cycle_error;
use super::types::{SchedulePath, SchedulingError};

/// Enumerate all paths from a source task to a sink task, longest first.
pub fn enumerate_paths(
    tasks: &[Task],
    dependencies: &[Dependency],
    config: &AnalysisConfig,
) -> Result<Vec<SchedulePath>, SchedulingError> {
    let graph = TaskGraph::build(tasks, dependencies);
    enumerate_on_graph(&graph, config)
}

/// The longest source-to-sink path, or `None` for an empty snapshot.
pub fn longest_path(
    tasks: &[Task],
    dependencies: &[Dependency],
    config: &AnalysisConfig,
) -> Result<Option<SchedulePath>, SchedulingError> {
    Ok(enumerate_paths(tasks, dependencies, config)?
        .into_iter()
        .next())
}

fn enumerate_on_graph(
    graph: &TaskGraph<'_>,
    config: &AnalysisConfig,
) -> Result<Vec<SchedulePath>, SchedulingError> {
    if graph.len() > config.max_path_graph_tasks {
        return Err(SchedulingError::GraphTooLarge {
            tasks: graph.len(),
            limit: config.max_path_graph_tasks,
        });
    }
    graph.topological_order().map_err(|_| cycle_error(graph))?;

    let mut paths: Vec<SchedulePath> = Vec::new();
    let mut path: Vec<NodeId> = Vec::new();
    // (node, index of the next outgoing edge to follow)
    let mut stack: Vec<(NodeId, usize)> = Vec::new();

    for source in graph.sources() {
        path.push(source);
        stack.push((source, 0));

        while let Some(frame) = stack.last_mut() {
            let node = frame.0;
            if graph.is_sink(node) {
                if paths.len() >= config.max_enumerated_paths {
                    log_checks!(
                        config.verbosity,
                        "path enumeration hit the cap of {} paths",
                        config.max_enumerated_paths
                    );
                    return Err(SchedulingError::PathLimitExceeded {
                        limit: config.max_enumerated_paths,
                    });
                }
                paths.push(SchedulePath {
                    task_ids: path.iter().map(|&n| graph.task_id(n).to_string()).collect(),
                    total_duration: path.iter().map(|&n| graph.duration(n)).sum(),
                });
                stack.pop();
                path.pop();
                continue;
            }

            match graph.successors(node).nth(frame.1) {
                Some(edge) => {
                    frame.1 += 1;
                    let next = edge.to;
                    path.push(next);
                    stack.push((next, 0));
                }
                None => {
                    stack.pop();
                    path.pop();
                }
            }
        }
    }

    paths.sort_by(|a, b| {
        b.total_duration
            .total_cmp(&a.total_duration)
            .then_with(|| a.task_ids.cmp(&b.task_ids))
    });
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_task(id: &str, duration: f64) -> Task {
        Task::new(id, id.to_uppercase(), duration)
    }

    fn diamond() -> (Vec<Task>, Vec<Dependency>) {
        let tasks = vec![
            make_task("a", 2.0),
            make_task("b", 3.0),
            make_task("c", 5.0),
            make_task("d", 4.0),
        ];
        let deps = vec![
            Dependency::new("a", "b"),
            Dependency::new("a", "c"),
            Dependency::new("b", "d"),
            Dependency::new("c", "d"),
        ];
        (tasks, deps)
    }

    #[test]
    fn test_enumerate_diamond() {
        let (tasks, deps) = diamond();
        let paths = enumerate_paths(&tasks, &deps, &AnalysisConfig::default()).unwrap();

        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].task_ids, vec!["a", "c", "d"]);
        assert_eq!(paths[0].total_duration, 11.0);
        assert_eq!(paths[1].task_ids, vec!["a", "b", "d"]);
        assert_eq!(paths[1].total_duration, 9.0);
    }

    #[test]
    fn test_isolated_task_is_its_own_path() {
        let tasks = vec![make_task("solo", 8.0)];
        let longest = longest_path(&tasks, &[], &AnalysisConfig::default())
            .unwrap()
            .unwrap();
        assert_eq!(longest.task_ids, vec!["solo"]);
        assert_eq!(longest.total_duration, 8.0);
    }

    #[test]
    fn test_path_cap() {
        let (tasks, deps) = diamond();
        let config = AnalysisConfig {
            max_enumerated_paths: 1,
            ..Default::default()
        };
        assert_eq!(
            enumerate_paths(&tasks, &deps, &config),
            Err(SchedulingError::PathLimitExceeded { limit: 1 })
        );
    }

    #[test]
    fn test_graph_size_ceiling() {
        let (tasks, deps) = diamond();
        let config = AnalysisConfig {
            max_path_graph_tasks: 3,
            ..Default::default()
        };
        assert_eq!(
            enumerate_paths(&tasks, &deps, &config),
            Err(SchedulingError::GraphTooLarge { tasks: 4, limit: 3 })
        );
    }

    #[test]
    fn test_cyclic_graph_refused() {
        let tasks = vec![make_task("a", 1.0), make_task("b", 1.0)];
        let deps = vec![Dependency::new("a", "b"), Dependency::new("b", "a")];
        let result = enumerate_paths(&tasks, &deps, &AnalysisConfig::default());
        assert!(matches!(
            result,
            Err(SchedulingError::CyclicDependencies { .. })
        ));
    }
}
