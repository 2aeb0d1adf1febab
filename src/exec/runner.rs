//! Sequential plan execution
//!
//! Targets run one at a time in plan order. For each target the runner
//! checks, in order: the condition gate (skip), required inputs (fatal
//! halt), failed hard predecessors (cascade and continue), and finally the
//! action itself. The context is read-only for the whole walk.

use std::collections::HashMap;
use std::time::Instant;

use chrono::Utc;

use super::report::{FailureReason, Outcome, RunReport, TargetResult};
use crate::domain::{Plan, RunContext, TargetGraph};

/// Executes the plan against the graph it was computed from
pub fn run(graph: &TargetGraph, plan: &Plan, ctx: &RunContext) -> RunReport {
    let started_at = Utc::now();

    let mut outcomes: HashMap<&str, Outcome> = HashMap::new();
    let mut results: Vec<TargetResult> = Vec::with_capacity(plan.len());
    let mut halted = false;

    for name in plan.iter() {
        let mut duration_ms = 0u64;

        let outcome = if halted {
            Outcome::NotRun
        } else if let Some(target) = graph.target(name) {
            if !target.is_enabled(ctx) {
                // Skipped targets never evaluate `requires` and count as
                // vacuously successful for their dependents.
                Outcome::Skipped
            } else if let Some(input) = target.missing_requirement(ctx) {
                halted = true;
                Outcome::Failed(FailureReason::MissingRequirement {
                    input: input.to_string(),
                })
            } else if let Some(dep) = failed_predecessor(graph, plan, &outcomes, name) {
                Outcome::Failed(FailureReason::UpstreamFailure {
                    dependency: dep.to_string(),
                })
            } else {
                let start = Instant::now();
                let result = (target.action)(ctx);
                duration_ms = start.elapsed().as_millis() as u64;
                match result {
                    Ok(()) => Outcome::Succeeded,
                    Err(e) => Outcome::Failed(FailureReason::Action {
                        message: format!("{:#}", e),
                    }),
                }
            }
        } else {
            // Only reachable when a plan is replayed against a different
            // graph than the one that produced it.
            Outcome::Failed(FailureReason::Action {
                message: format!("target '{}' is not registered", name),
            })
        };

        outcomes.insert(name, outcome.clone());
        results.push(TargetResult {
            name: name.to_string(),
            outcome,
            duration_ms,
        });
    }

    RunReport::new(results, started_at, Utc::now())
}

/// Finds a hard dependency of `name`, restricted to the plan, that failed
fn failed_predecessor<'g>(
    graph: &'g TargetGraph,
    plan: &Plan,
    outcomes: &HashMap<&str, Outcome>,
    name: &str,
) -> Option<&'g str> {
    graph
        .hard_dependencies(name)
        .into_iter()
        .find(|&dep| plan.contains(dep) && matches!(outcomes.get(dep), Some(Outcome::Failed(_))))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::domain::{plan, Target};
    use crate::exec::OverallResult;

    type Log = Rc<RefCell<Vec<String>>>;

    fn logged(name: &str, deps: &[&str], log: &Log) -> Target {
        let log = Rc::clone(log);
        let recorded = name.to_string();
        let mut t = Target::new(name, move |_| {
            log.borrow_mut().push(recorded.clone());
            Ok(())
        });
        t.depends_on = deps.iter().map(|s| s.to_string()).collect();
        t
    }

    fn failing(name: &str, deps: &[&str]) -> Target {
        let mut t = Target::new(name, |_| Err(anyhow::anyhow!("boom")));
        t.depends_on = deps.iter().map(|s| s.to_string()).collect();
        t
    }

    fn run_goals(targets: Vec<Target>, goals: &[&str], ctx: &RunContext) -> RunReport {
        let graph = TargetGraph::from_targets(targets).unwrap();
        let p = plan(&graph, goals).unwrap();
        run(&graph, &p, ctx)
    }

    #[test]
    fn successful_chain_runs_in_order() {
        let log: Log = Rc::default();
        let report = run_goals(
            vec![
                logged("restore", &[], &log),
                logged("compile", &["restore"], &log),
                logged("test", &["compile"], &log),
            ],
            &["test"],
            &RunContext::new(),
        );

        assert_eq!(report.overall, OverallResult::Success);
        assert_eq!(*log.borrow(), ["restore", "compile", "test"]);
        assert_eq!(report.outcome_of("compile"), Some(&Outcome::Succeeded));
    }

    #[test]
    fn false_condition_skips_without_evaluating_requires() {
        let log: Log = Rc::default();

        // push requires an input that is never set, but its condition is
        // false, so the requirement check must not run either.
        let mut push = logged("push", &[], &log);
        push.condition = Some(Box::new(|ctx| ctx.is_truthy("is-tag")));
        push.requires = vec!["api-key".into()];

        let report = run_goals(
            vec![push, logged("announce", &["push"], &log)],
            &["announce"],
            &RunContext::new(),
        );

        assert_eq!(report.outcome_of("push"), Some(&Outcome::Skipped));
        // Dependent of a skipped target still runs
        assert_eq!(report.outcome_of("announce"), Some(&Outcome::Succeeded));
        assert_eq!(report.overall, OverallResult::Success);
        assert_eq!(*log.borrow(), ["announce"]);
    }

    #[test]
    fn missing_requirement_halts_the_run() {
        let log: Log = Rc::default();

        let mut push = logged("push", &[], &log);
        push.requires = vec!["api-key".into()];
        // docs is unrelated to push but scheduled after it
        let docs = logged("docs", &["push"], &log);

        let report = run_goals(vec![push, docs], &["docs"], &RunContext::new());

        assert_eq!(
            report.outcome_of("push"),
            Some(&Outcome::Failed(FailureReason::MissingRequirement {
                input: "api-key".into()
            }))
        );
        assert_eq!(report.outcome_of("docs"), Some(&Outcome::NotRun));
        assert_eq!(report.overall, OverallResult::Fatal);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn missing_requirement_halts_unrelated_branches_too() {
        let log: Log = Rc::default();

        let mut gated = Target::new("gated", |_| Ok(()));
        gated.requires = vec!["token".into()];
        // "later" sorts after "gated", so it is scheduled second despite
        // having no relationship to it.
        let later = logged("later", &[], &log);

        let report = run_goals(vec![gated, later], &["gated", "later"], &RunContext::new());

        assert_eq!(report.outcome_of("later"), Some(&Outcome::NotRun));
        assert_eq!(report.overall, OverallResult::Fatal);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn satisfied_requirement_allows_execution() {
        let log: Log = Rc::default();
        let mut push = logged("push", &[], &log);
        push.requires = vec!["api-key".into()];

        let mut ctx = RunContext::new();
        ctx.set("api-key", "secret");

        let report = run_goals(vec![push], &["push"], &ctx);
        assert_eq!(report.overall, OverallResult::Success);
        assert_eq!(*log.borrow(), ["push"]);
    }

    #[test]
    fn action_failure_cascades_but_siblings_run() {
        let log: Log = Rc::default();
        let report = run_goals(
            vec![
                failing("compile", &[]),
                logged("test", &["compile"], &log),
                logged("lint", &[], &log),
                logged("all", &["test", "lint"], &log),
            ],
            &["all"],
            &RunContext::new(),
        );

        assert_eq!(
            report.outcome_of("compile"),
            Some(&Outcome::Failed(FailureReason::Action {
                message: "boom".into()
            }))
        );
        assert_eq!(
            report.outcome_of("test"),
            Some(&Outcome::Failed(FailureReason::UpstreamFailure {
                dependency: "compile".into()
            }))
        );
        // lint has no dependency on compile and still runs to completion
        assert_eq!(report.outcome_of("lint"), Some(&Outcome::Succeeded));
        // the cascade reaches transitively through test
        assert_eq!(
            report.outcome_of("all"),
            Some(&Outcome::Failed(FailureReason::UpstreamFailure {
                dependency: "test".into()
            }))
        );
        assert_eq!(report.overall, OverallResult::Failure);
        assert_eq!(*log.borrow(), ["lint"]);
    }

    #[test]
    fn requirement_check_precedes_upstream_check() {
        // Even with a failed dependency, a missing requirement is the
        // recorded (and halting) outcome.
        let mut gated = Target::new("gated", |_| Ok(()));
        gated.depends_on = vec!["broken".into()];
        gated.requires = vec!["token".into()];

        let report = run_goals(
            vec![failing("broken", &[]), gated],
            &["gated"],
            &RunContext::new(),
        );

        assert_eq!(
            report.outcome_of("gated"),
            Some(&Outcome::Failed(FailureReason::MissingRequirement {
                input: "token".into()
            }))
        );
        assert_eq!(report.overall, OverallResult::Fatal);
    }

    #[test]
    fn skipped_dependency_is_vacuously_successful() {
        let log: Log = Rc::default();

        let mut clean = logged("clean", &[], &log);
        clean.condition = Some(Box::new(|_| false));

        let report = run_goals(
            vec![clean, logged("restore", &["clean"], &log)],
            &["restore"],
            &RunContext::new(),
        );

        assert_eq!(report.outcome_of("clean"), Some(&Outcome::Skipped));
        assert_eq!(report.outcome_of("restore"), Some(&Outcome::Succeeded));
        assert_eq!(report.overall, OverallResult::Success);
    }

    #[test]
    fn action_error_message_is_recorded() {
        use anyhow::Context as _;

        let t = Target::new("flaky", |_| {
            Err(anyhow::anyhow!("exit status 3")).context("command `false` failed")
        });

        let report = run_goals(vec![t], &["flaky"], &RunContext::new());

        match report.outcome_of("flaky") {
            Some(Outcome::Failed(FailureReason::Action { message })) => {
                assert!(message.contains("command `false` failed"));
                assert!(message.contains("exit status 3"));
            }
            other => panic!("expected action failure, got {:?}", other),
        }
    }

    #[test]
    fn report_enumerates_every_plan_entry() {
        let report = run_goals(
            vec![
                failing("a", &[]),
                Target::new("b", |_| Ok(())),
                {
                    let mut c = Target::new("c", |_| Ok(()));
                    c.depends_on = vec!["a".into(), "b".into()];
                    c
                },
            ],
            &["c"],
            &RunContext::new(),
        );

        let names: Vec<&str> = report.results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn empty_plan_is_a_successful_run() {
        let graph = TargetGraph::from_targets([]).unwrap();
        let p = plan(&graph, &[] as &[&str]).unwrap();
        let report = run(&graph, &p, &RunContext::new());

        assert!(report.results.is_empty());
        assert_eq!(report.overall, OverallResult::Success);
    }
}
