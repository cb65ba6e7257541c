//! Critical path calculation using forward and backward passes.

use std::collections::BTreeSet;

use crate::config::AnalysisConfig;
use crate::graph::TaskGraph;
use crate::interner::NodeId;
use crate::log_debug;
use crate::models::{Dependency, DependencyType, Task};

use super::types::{CriticalPathResult, FloatRecord, SchedulingError};

/// Earliest start a dependency edge allows for its successor.
///
/// `pred_start`/`pred_finish` are the predecessor's earliest times and
/// `duration` is the successor's duration.
fn forward_bound(
    kind: DependencyType,
    lag: f64,
    pred_start: f64,
    pred_finish: f64,
    duration: f64,
) -> f64 {
    match kind {
        DependencyType::FinishToStart => pred_finish + lag,
        DependencyType::StartToStart => pred_start + lag,
        DependencyType::FinishToFinish => pred_finish + lag - duration,
        DependencyType::StartToFinish => pred_start + lag - duration,
    }
}

/// Latest finish a dependency edge allows for its predecessor.
///
/// `succ_start`/`succ_finish` are the successor's latest times and
/// `duration` is the predecessor's duration.
fn backward_bound(
    kind: DependencyType,
    lag: f64,
    succ_start: f64,
    succ_finish: f64,
    duration: f64,
) -> f64 {
    match kind {
        DependencyType::FinishToStart => succ_start - lag,
        DependencyType::StartToStart => succ_start - lag + duration,
        DependencyType::FinishToFinish => succ_finish - lag,
        DependencyType::StartToFinish => succ_finish - lag + duration,
    }
}

/// Slack an edge leaves between predecessor and successor in the early schedule.
fn edge_slack(
    kind: DependencyType,
    lag: f64,
    pred_start: f64,
    pred_finish: f64,
    succ_start: f64,
    succ_finish: f64,
) -> f64 {
    match kind {
        DependencyType::FinishToStart => succ_start - lag - pred_finish,
        DependencyType::StartToStart => succ_start - lag - pred_start,
        DependencyType::FinishToFinish => succ_finish - lag - pred_finish,
        DependencyType::StartToFinish => succ_finish - lag - pred_start,
    }
}

/// Build the error naming every edge that participates in a cycle.
pub(crate) fn cycle_error(graph: &TaskGraph<'_>) -> SchedulingError {
    let mut edges: Vec<_> = graph
        .cyclic_edges()
        .into_iter()
        .map(|e| graph.edge_ref(e))
        .collect();
    edges.sort();
    edges.dedup();
    SchedulingError::CyclicDependencies { edges }
}

/// Compute float for every task and the overall project duration.
///
/// Cycle-freedom is a precondition: cyclic input is refused with
/// `SchedulingError::CyclicDependencies` naming the offending edges.
pub fn compute_critical_path(
    tasks: &[Task],
    dependencies: &[Dependency],
    config: &AnalysisConfig,
) -> Result<CriticalPathResult, SchedulingError> {
    let graph = TaskGraph::build(tasks, dependencies);
    calculate_on_graph(&graph, config)
}

/// Critical path over an already built graph.
pub fn calculate_on_graph(
    graph: &TaskGraph<'_>,
    config: &AnalysisConfig,
) -> Result<CriticalPathResult, SchedulingError> {
    let order = graph.topological_order().map_err(|_| cycle_error(graph))?;
    let n = graph.len();

    // Forward pass: earliest start/finish in topological order
    let mut earliest_start = vec![0.0_f64; n];
    let mut earliest_finish = vec![0.0_f64; n];
    let mut total_work = 0.0;

    for &node in &order {
        let idx = node as usize;
        let duration = graph.duration(node);
        total_work += duration;

        let mut start = 0.0_f64;
        for edge in graph.predecessors(node) {
            let p = edge.from as usize;
            let bound = forward_bound(
                edge.dependency_type,
                edge.lag,
                earliest_start[p],
                earliest_finish[p],
                duration,
            );
            start = start.max(bound);
        }

        earliest_start[idx] = start;
        earliest_finish[idx] = start + duration;
        log_debug!(
            config.verbosity,
            "forward {}: ES={} EF={}",
            graph.task_id(node),
            start,
            start + duration
        );
    }

    let project_duration = earliest_finish.iter().copied().fold(0.0_f64, f64::max);

    // Backward pass: latest start/finish in reverse topological order
    let mut latest_start = vec![0.0_f64; n];
    let mut latest_finish = vec![0.0_f64; n];

    for &node in order.iter().rev() {
        let idx = node as usize;
        let duration = graph.duration(node);

        // Sinks finish at the project end; no task may finish after it
        let mut finish = project_duration;
        for edge in graph.successors(node) {
            let s = edge.to as usize;
            let bound = backward_bound(
                edge.dependency_type,
                edge.lag,
                latest_start[s],
                latest_finish[s],
                duration,
            );
            finish = finish.min(bound);
        }

        latest_finish[idx] = finish;
        latest_start[idx] = finish - duration;
        log_debug!(
            config.verbosity,
            "backward {}: LS={} LF={}",
            graph.task_id(node),
            finish - duration,
            finish
        );
    }

    let mut records = Vec::with_capacity(n);
    let mut critical_task_ids = BTreeSet::new();
    let mut critical_chain = Vec::new();

    for &node in &order {
        let idx = node as usize;
        let mut total_float = latest_start[idx] - earliest_start[idx];
        if total_float.abs() <= config.critical_epsilon {
            total_float = 0.0;
        }

        let free_float = free_float(
            graph,
            node,
            &earliest_start,
            &earliest_finish,
            project_duration,
        );

        let critical = total_float <= config.critical_epsilon;
        let task_id = graph.task_id(node).to_string();
        if critical {
            critical_task_ids.insert(task_id.clone());
            critical_chain.push(task_id.clone());
        }

        records.push(FloatRecord {
            task_id,
            earliest_start: earliest_start[idx],
            earliest_finish: earliest_finish[idx],
            latest_start: latest_start[idx],
            latest_finish: latest_finish[idx],
            total_float,
            free_float,
            critical,
        });
    }

    Ok(CriticalPathResult {
        records,
        critical_task_ids,
        critical_chain,
        project_duration,
        total_work,
        warnings: graph.warnings().to_vec(),
    })
}

fn free_float(
    graph: &TaskGraph<'_>,
    node: NodeId,
    earliest_start: &[f64],
    earliest_finish: &[f64],
    project_duration: f64,
) -> f64 {
    let idx = node as usize;
    if graph.is_sink(node) {
        return (project_duration - earliest_finish[idx]).max(0.0);
    }
    graph
        .successors(node)
        .map(|edge| {
            let s = edge.to as usize;
            edge_slack(
                edge.dependency_type,
                edge.lag,
                earliest_start[idx],
                earliest_finish[idx],
                earliest_start[s],
                earliest_finish[s],
            )
        })
        .fold(f64::MAX, f64::min)
        .max(0.0)
}

/// Copy of the task snapshot with each task's `critical` flag set from a result.
pub fn mark_critical(tasks: &[Task], result: &CriticalPathResult) -> Vec<Task> {
    tasks
        .iter()
        .map(|task| Task {
            critical: result.is_critical(&task.id),
            ..task.clone()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_task(id: &str, duration: f64) -> Task {
        Task::new(id, id.to_uppercase(), duration)
    }

    fn run(tasks: &[Task], deps: &[Dependency]) -> CriticalPathResult {
        compute_critical_path(tasks, deps, &AnalysisConfig::default()).unwrap()
    }

    #[test]
    fn test_single_isolated_task() {
        let result = run(&[make_task("t", 8.0)], &[]);
        let record = result.record("t").unwrap();

        assert_eq!(record.earliest_start, 0.0);
        assert_eq!(record.latest_start, 0.0);
        assert_eq!(record.earliest_finish, 8.0);
        assert_eq!(record.latest_finish, 8.0);
        assert_eq!(record.total_float, 0.0);
        assert!(record.critical);
        assert_eq!(result.project_duration, 8.0);
    }

    #[test]
    fn test_chain_with_independent_task() {
        let tasks = vec![make_task("T1", 8.0), make_task("T2", 4.0), make_task("T3", 4.0)];
        let deps = vec![Dependency::new("T1", "T2")];
        let result = run(&tasks, &deps);

        assert_eq!(result.project_duration, 12.0);
        assert_eq!(
            result.critical_task_ids,
            BTreeSet::from(["T1".to_string(), "T2".to_string()])
        );
        assert_eq!(result.critical_chain, vec!["T1", "T2"]);

        let t3 = result.record("T3").unwrap();
        assert_eq!(t3.total_float, 8.0);
        assert_eq!(t3.free_float, 8.0);
        assert!(!t3.critical);
        assert_eq!(result.total_work, 16.0);
    }

    #[test]
    fn test_diamond_float() {
        // a -> b (3h) -> d, a -> c (5h) -> d
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
        let result = run(&tasks, &deps);

        assert_eq!(result.project_duration, 11.0);
        let b = result.record("b").unwrap();
        assert_eq!(b.total_float, 2.0);
        assert_eq!(b.free_float, 2.0);
        assert_eq!(result.critical_chain, vec!["a", "c", "d"]);
    }

    #[test]
    fn test_lag_and_lead() {
        let tasks = vec![make_task("a", 8.0), make_task("b", 4.0), make_task("c", 4.0)];
        let deps = vec![
            Dependency::new("a", "b").with_lag(2.0),
            // c may overlap the last 3h of a
            Dependency::new("a", "c").with_lag(-3.0),
        ];
        let result = run(&tasks, &deps);

        assert_eq!(result.record("b").unwrap().earliest_start, 10.0);
        assert_eq!(result.record("c").unwrap().earliest_start, 5.0);
        assert_eq!(result.project_duration, 14.0);
        assert_eq!(result.record("c").unwrap().total_float, 5.0);
    }

    #[test]
    fn test_dependency_types() {
        let tasks = vec![make_task("p", 10.0), make_task("ss", 4.0), make_task("ff", 20.0)];
        let deps = vec![
            Dependency::new("p", "ss")
                .with_type(DependencyType::StartToStart)
                .with_lag(2.0),
            Dependency::new("p", "ff").with_type(DependencyType::FinishToFinish),
        ];
        let result = run(&tasks, &deps);

        assert_eq!(result.record("ss").unwrap().earliest_start, 2.0);
        // FF: ff must finish no earlier than p finishes; its own length dominates
        assert_eq!(result.record("ff").unwrap().earliest_start, 0.0);
        assert_eq!(result.project_duration, 20.0);
        let p = result.record("p").unwrap();
        assert_eq!(p.latest_finish, 20.0);
        assert_eq!(p.total_float, 10.0);
    }

    #[test]
    fn test_start_to_finish() {
        let tasks = vec![make_task("p", 6.0), make_task("s", 2.0)];
        let deps = vec![Dependency::new("p", "s")
            .with_type(DependencyType::StartToFinish)
            .with_lag(5.0)];
        let result = run(&tasks, &deps);

        // s must finish at least 5h after p starts
        assert_eq!(result.record("s").unwrap().earliest_start, 3.0);
        assert_eq!(result.record("s").unwrap().earliest_finish, 5.0);
        assert_eq!(result.project_duration, 6.0);
    }

    #[test]
    fn test_floats_never_negative() {
        let tasks = vec![
            make_task("a", 3.0),
            make_task("b", 7.0),
            make_task("c", 1.0),
            make_task("d", 6.0),
            make_task("e", 2.0),
        ];
        let deps = vec![
            Dependency::new("a", "b"),
            Dependency::new("a", "c").with_type(DependencyType::StartToStart),
            Dependency::new("c", "d").with_lag(-1.0),
            Dependency::new("b", "e").with_type(DependencyType::FinishToFinish),
            Dependency::new("d", "e"),
        ];
        let result = run(&tasks, &deps);

        assert!(!result.critical_task_ids.is_empty());
        for record in &result.records {
            assert!(record.total_float >= 0.0, "{:?}", record);
            assert!(record.free_float >= 0.0, "{:?}", record);
            assert_eq!(record.critical, record.total_float == 0.0);
        }
    }

    #[test]
    fn test_cycle_refused_with_edges() {
        let tasks = vec![make_task("a", 1.0), make_task("b", 1.0), make_task("c", 1.0)];
        let deps = vec![
            Dependency::new("a", "b"),
            Dependency::new("b", "a"),
            Dependency::new("b", "c"),
        ];
        let err = compute_critical_path(&tasks, &deps, &AnalysisConfig::default()).unwrap_err();

        match err {
            SchedulingError::CyclicDependencies { edges } => {
                let names: Vec<String> = edges.iter().map(|e| e.to_string()).collect();
                assert_eq!(names, vec!["a -> b", "b -> a"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_malformed_tasks_still_scheduled() {
        let mut broken = make_task("broken", 0.0);
        broken.duration = Some(-5.0);
        let tasks = vec![make_task("a", 4.0), broken];
        let deps = vec![Dependency::new("a", "broken"), Dependency::new("ghost", "a")];
        let result = run(&tasks, &deps);

        assert_eq!(result.records.len(), 2);
        assert_eq!(result.project_duration, 4.0);
        assert_eq!(result.warnings.len(), 2);
    }

    #[test]
    fn test_empty_input() {
        let result = run(&[], &[]);
        assert!(result.records.is_empty());
        assert_eq!(result.project_duration, 0.0);
    }

    #[test]
    fn test_mark_critical() {
        let tasks = vec![make_task("a", 4.0), make_task("b", 1.0)];
        let result = run(&tasks, &[]);
        let marked = mark_critical(&tasks, &result);
        assert!(marked[0].critical);
        assert!(!marked[1].critical);
        assert!(!tasks[0].critical);
    }
}
