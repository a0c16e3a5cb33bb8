//! Bloodlink Headless Simulation Harness
//!
//! Drives the connection engine through scripted scenarios and a seeded
//! random sweep. Runs entirely in-process: no window, no input devices.
//!
//! Usage:
//!   cargo run -p bloodlink-simtest
//!   cargo run -p bloodlink-simtest -- --verbose
//!   cargo run -p bloodlink-simtest -- --seed 7 --ticks 5000 --json

use bloodlink_core::prelude::*;
use bloodlink_logic::config::ConfigTable;
use hecs::Entity;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::str::FromStr;
use tracing_subscriber::filter::LevelFilter;

// ── Game state table (same file the game ships) ─────────────────────────
const GAME_STATE: &str = include_str!("../../../data/game_state.txt");

// ── Logging ─────────────────────────────────────────────────────────────

/// Engine records go to stderr so `--json` output on stdout stays clean.
fn log_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    }
}

fn init_logging(verbose: bool) {
    tracing_subscriber::fmt()
        .with_max_level(log_level(verbose))
        .with_writer(std::io::stderr)
        .init();
}

// ── Test harness ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn check(name: &str, passed: bool, detail: impl Into<String>) -> TestResult {
    TestResult {
        name: name.to_string(),
        passed,
        detail: detail.into(),
    }
}

#[derive(Debug, Default, Serialize)]
struct SweepStats {
    ticks: u32,
    connectors_started: u32,
    commits: u32,
    rejections: HashMap<String, u32>,
    blood_spent: i64,
    final_blood: i64,
    edges: usize,
}

#[derive(Serialize)]
struct Report<'a> {
    seed: u64,
    passed: usize,
    failed: usize,
    results: &'a [TestResult],
    sweep: &'a SweepStats,
}

struct Options {
    verbose: bool,
    json: bool,
    seed: u64,
    ticks: u32,
}

fn parse_args(args: &[String]) -> Options {
    fn value_of<T: FromStr>(args: &[String], flag: &str) -> Option<T> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .and_then(|v| v.parse().ok())
    }
    Options {
        verbose: args.iter().any(|a| a == "--verbose"),
        json: args.iter().any(|a| a == "--json"),
        seed: value_of(args, "--seed").unwrap_or(42),
        ticks: value_of(args, "--ticks").unwrap_or(3000),
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let opts = parse_args(&args);
    init_logging(opts.verbose);

    if !opts.json {
        println!("=== Bloodlink Simulation Harness ===\n");
    }

    let mut results = Vec::new();

    // 1. Game state table
    results.extend(validate_game_state_table());

    // 2. Affordable connection
    results.extend(validate_affordable_connection());

    // 3. Unaffordable connection
    results.extend(validate_unaffordable_connection());

    // 4. Probe rejections
    results.extend(validate_probe_rejections());

    // 5. Directives
    results.extend(validate_directives());

    // 6. Notifications
    results.extend(validate_notifications());

    // 7. Random sweep
    let (sweep_results, stats) = random_sweep(opts.seed, opts.ticks);
    results.extend(sweep_results);

    // ── Summary ──
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();

    if opts.json {
        let report = Report {
            seed: opts.seed,
            passed,
            failed,
            results: &results,
            sweep: &stats,
        };
        match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("failed to encode report: {}", e),
        }
    } else {
        for r in &results {
            let icon = if r.passed { "✓" } else { "✗" };
            if !r.passed || opts.verbose {
                println!("  {} {}: {}", icon, r.name, r.detail);
            }
        }
        println!(
            "\n  sweep: {} ticks, {} connectors, {} commits, {} blood spent, {} edges",
            stats.ticks, stats.connectors_started, stats.commits, stats.blood_spent, stats.edges
        );
        println!(
            "\n=== RESULT: {}/{} passed, {} failed ===",
            passed,
            results.len(),
            failed
        );
    }

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────

fn two_node_board(blood: i64) -> (LinkEngine, Entity, Entity) {
    let mut engine = LinkEngine::new(LinkSettings {
        cost_per_unit: 2.0,
        starting_blood: blood,
        line_half_width: 1.0,
    });
    let source = engine.spawn_node(Vec2::new(0.0, 0.0), 0.5);
    let target = engine.spawn_node(Vec2::new(3.0, 0.0), 0.5);
    (engine, source, target)
}

fn outcome_of(outcomes: &[(Entity, TickOutcome)], connector: Entity) -> Option<TickOutcome> {
    outcomes.iter().find(|(e, _)| *e == connector).map(|(_, o)| *o)
}

// ── 1. Game State Table ─────────────────────────────────────────────────

fn validate_game_state_table() -> Vec<TestResult> {
    let mut results = Vec::new();

    let table = match ConfigTable::parse_text(GAME_STATE) {
        Ok(t) => t,
        Err(e) => {
            results.push(check("table_parse", false, e.to_string()));
            return results;
        }
    };
    results.push(check(
        "table_parse",
        !table.is_empty(),
        format!("{} rows", table.len()),
    ));

    for row in table.iter() {
        results.push(check(
            &format!("table_row_{}", row.id),
            row.cost_per_unit >= 0.0 && row.pool_depth > 0,
            format!("cost/unit={} depth={}", row.cost_per_unit, row.pool_depth),
        ));
    }

    let binary = table.to_bytes().and_then(|b| ConfigTable::from_bytes(&b));
    let same = match &binary {
        Ok(decoded) => table.iter().all(|r| decoded.get(r.id) == Some(r)),
        Err(_) => false,
    };
    results.push(check(
        "table_binary",
        same,
        match binary {
            Ok(_) => "binary table matches text table".to_string(),
            Err(e) => e.to_string(),
        },
    ));

    match LinkEngine::from_config(&table, 1, 10) {
        Ok(engine) => results.push(check(
            "table_engine",
            engine.settings.cost_per_unit == 2.0,
            format!("cost/unit={}", engine.settings.cost_per_unit),
        )),
        Err(e) => results.push(check("table_engine", false, e.to_string())),
    }

    results
}

// ── 2. Affordable Connection ────────────────────────────────────────────

fn validate_affordable_connection() -> Vec<TestResult> {
    let mut results = Vec::new();
    let (mut engine, source, target) = two_node_board(10);

    let Ok(connector) = engine.begin_connection(source) else {
        results.push(check("commit_begin", false, "begin_connection failed"));
        return results;
    };
    let outcomes = engine.update(&PointerFrame::press(3.0, 0.0));
    results.push(check(
        "commit_outcome",
        outcome_of(&outcomes, connector) == Some(TickOutcome::Committed { target, debited: 6 }),
        format!("{:?}", outcome_of(&outcomes, connector)),
    ));
    results.push(check(
        "commit_blood",
        engine.blood() == 4,
        format!("blood={}", engine.blood()),
    ));
    results.push(check(
        "commit_registry_symmetric",
        engine.registry.is_connected(source, target) && engine.registry.is_connected(target, source),
        format!("{} ordered pairs", engine.registry.len()),
    ));

    // Retry the same pair; the only change may be the new connector itself
    engine.pool.credit(10);
    let retry = engine.begin_connection(source);
    let outcomes = engine.update(&PointerFrame::press(3.0, 0.0));
    let retry_outcome = retry.ok().and_then(|c| outcome_of(&outcomes, c));
    results.push(check(
        "commit_retry_noop",
        retry_outcome == Some(TickOutcome::Duplicate)
            && engine.blood() == 14
            && engine.graph.edge_count() == 1
            && engine.registry.len() == 2,
        format!("{:?}, blood={}", retry_outcome, engine.blood()),
    ));

    results
}

// ── 3. Unaffordable Connection ──────────────────────────────────────────

fn validate_unaffordable_connection() -> Vec<TestResult> {
    let (mut engine, source, _) = two_node_board(5);
    let Ok(connector) = engine.begin_connection(source) else {
        return vec![check("unaffordable_begin", false, "begin_connection failed")];
    };
    let outcomes = engine.update(&PointerFrame::press(3.0, 0.0));
    let state = engine.connector(connector).map(|c| (c.state, c.tint));

    vec![
        check(
            "unaffordable_outcome",
            outcome_of(&outcomes, connector) == Some(TickOutcome::Infeasible),
            format!("{:?}", outcome_of(&outcomes, connector)),
        ),
        check(
            "unaffordable_state",
            state == Some((ConnectorState::NotConnect, Tint::Infeasible)),
            format!("{:?}", state),
        ),
        check(
            "unaffordable_blood",
            engine.blood() == 5 && engine.registry.is_empty(),
            format!("blood={}", engine.blood()),
        ),
    ]
}

// ── 4. Probe Rejections ─────────────────────────────────────────────────

fn validate_probe_rejections() -> Vec<TestResult> {
    let (mut engine, source, _) = two_node_board(10);
    let Ok(connector) = engine.begin_connection(source) else {
        return vec![check("probe_begin", false, "begin_connection failed")];
    };

    let self_hit = engine.update(&PointerFrame::press(0.1, 0.1));
    let miss = engine.update(&PointerFrame::press(1.5, -1.0));

    vec![
        check(
            "probe_self_hit",
            outcome_of(&self_hit, connector) == Some(TickOutcome::SelfHit),
            format!("{:?}", outcome_of(&self_hit, connector)),
        ),
        check(
            "probe_miss",
            outcome_of(&miss, connector) == Some(TickOutcome::Missed),
            format!("{:?}", outcome_of(&miss, connector)),
        ),
        check(
            "probe_no_side_effects",
            engine.blood() == 10 && engine.registry.is_empty() && engine.graph.edge_count() == 0,
            format!("blood={} edges={}", engine.blood(), engine.graph.edge_count()),
        ),
    ]
}

// ── 5. Directives ───────────────────────────────────────────────────────

fn validate_directives() -> Vec<TestResult> {
    let mut results = Vec::new();
    let (mut engine, source, target) = two_node_board(10);

    let (Ok(committed), Ok(pending)) = (
        engine.begin_connection(source),
        engine.begin_connection(target),
    ) else {
        return vec![check("directive_begin", false, "begin_connection failed")];
    };
    // Commit the first: pointer on target; the second self-hits on target
    engine.update(&PointerFrame::press(3.0, 0.0));

    let validity = engine.dispatch(Directive::Validity(false));
    results.push(check(
        "directive_validity_pending_only",
        validity == vec![(pending, DirectiveOutcome::ValiditySet(false))],
        format!("{:?}", validity),
    ));

    engine.mark_clearing(target);
    let cleared = engine.dispatch(Directive::Validity(true));
    results.push(check(
        "directive_validity_clearing_source",
        cleared == vec![(pending, DirectiveOutcome::Ignored)]
            && engine.connector(pending).map(|c| c.valid) == Some(false),
        format!("{:?}", cleared),
    ));

    let hidden = engine.dispatch(Directive::Hide(HideTarget::All));
    results.push(check(
        "directive_hide",
        hidden == vec![(pending, DirectiveOutcome::Hidden)]
            && engine.connector(pending).is_none()
            && engine.connector(committed).map(|c| c.state) == Some(ConnectorState::Connect),
        format!("{:?}", hidden),
    ));

    results
}

// ── 6. Notifications ────────────────────────────────────────────────────

fn validate_notifications() -> Vec<TestResult> {
    let (mut engine, source, target) = two_node_board(20);
    let counts = Rc::new(RefCell::new((0u32, 0u32)));
    let sink = Rc::clone(&counts);
    let _sub = engine.subscribe(move |event| {
        let mut c = sink.borrow_mut();
        match event {
            GraphEvent::ChildAdded(_) => c.0 += 1,
            GraphEvent::ParentAdded(_) => c.1 += 1,
        }
    });

    let _ = engine.begin_connection(source);
    engine.update(&PointerFrame::press(3.0, 0.0));
    let _ = engine.begin_connection(target);
    engine.update(&PointerFrame::press(0.0, 0.0));

    let (children, parents) = *counts.borrow();
    vec![check(
        "notifications_once_per_edge",
        children == 1 && parents == 1,
        format!("child_added={} parent_added={}", children, parents),
    )]
}

// ── 7. Random Sweep ─────────────────────────────────────────────────────

fn random_sweep(seed: u64, ticks: u32) -> (Vec<TestResult>, SweepStats) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut stats = SweepStats::default();
    let mut violations: Vec<String> = Vec::new();

    let mut engine = LinkEngine::new(LinkSettings {
        cost_per_unit: 1.5,
        starting_blood: 60,
        line_half_width: 0.5,
    });
    let nodes: Vec<Entity> = (0..24)
        .map(|_| {
            let pos = Vec2::new(rng.gen_range(-10.0..10.0), rng.gen_range(-10.0..10.0));
            engine.spawn_node(pos, 0.6)
        })
        .collect();

    for tick in 0..ticks {
        if engine.pending_count() < 4 && rng.gen_bool(0.1) {
            let source = nodes[rng.gen_range(0..nodes.len())];
            if engine.begin_connection(source).is_ok() {
                stats.connectors_started += 1;
            }
        }
        if rng.gen_bool(0.03) {
            engine.dispatch(Directive::Validity(rng.gen_bool(0.7)));
        }
        if rng.gen_bool(0.02) {
            engine.dispatch(Directive::Hide(HideTarget::All));
        }
        if rng.gen_bool(0.005) {
            engine.mark_clearing(nodes[rng.gen_range(0..nodes.len())]);
        }
        if rng.gen_bool(0.05) {
            engine.pool.credit(5);
        }

        let pointer = if rng.gen_bool(0.6) {
            let node = nodes[rng.gen_range(0..nodes.len())];
            let at = engine
                .world
                .get::<&Position>(node)
                .map(|p| p.0)
                .unwrap_or(Vec2::ZERO);
            Vec2::new(at.x + rng.gen_range(-0.3..0.3), at.y + rng.gen_range(-0.3..0.3))
        } else {
            Vec2::new(rng.gen_range(-11.0..11.0), rng.gen_range(-11.0..11.0))
        };
        let frame = PointerFrame {
            position: pointer,
            commit: rng.gen_bool(0.25),
        };

        let frozen: Vec<(Entity, Connector)> = engine
            .world
            .query::<&Connector>()
            .iter()
            .filter(|(_, c)| c.is_committed())
            .map(|(e, c)| (e, *c))
            .collect();
        let blood_before = engine.blood();

        let outcomes = engine.update(&frame);
        stats.ticks += 1;

        let mut spent = 0;
        for (_, outcome) in &outcomes {
            match outcome {
                TickOutcome::Committed { debited, .. } => {
                    stats.commits += 1;
                    spent += debited;
                }
                TickOutcome::Idle | TickOutcome::Tracking => {}
                other => *stats.rejections.entry(format!("{:?}", other)).or_insert(0) += 1,
            }
        }
        stats.blood_spent += spent;

        if engine.blood() < 0 {
            violations.push(format!("tick {}: blood went negative", tick));
        }
        if engine.blood() != blood_before - spent {
            violations.push(format!(
                "tick {}: blood {} -> {} but debited {}",
                tick,
                blood_before,
                engine.blood(),
                spent
            ));
        }
        for (entity, before) in &frozen {
            let after = engine.connector(*entity);
            let unchanged = after.map_or(false, |a| a.end == before.end && a.state == before.state);
            if !unchanged {
                violations.push(format!("tick {}: committed connector {:?} changed", tick, entity));
            }
        }
        violations.extend(graph_violations(&engine, tick));

        if violations.len() > 20 {
            break;
        }
    }

    stats.final_blood = engine.blood();
    stats.edges = engine.graph.edge_count();

    let detail = if violations.is_empty() {
        format!(
            "{} ticks, {} commits, {} edges",
            stats.ticks, stats.commits, stats.edges
        )
    } else {
        violations.join("; ")
    };
    (vec![check("sweep_invariants", violations.is_empty(), detail)], stats)
}

/// Registry symmetry, unique adjacency, and edges mirrored in both directions
fn graph_violations(engine: &LinkEngine, tick: u32) -> Vec<String> {
    let mut out = Vec::new();

    for pair in engine.registry.pairs() {
        if !engine.registry.is_connected(pair.target, pair.source) {
            out.push(format!("tick {}: registry pair {:?} is one-sided", tick, pair));
        }
    }

    for node in engine.graph.entities() {
        let children = engine.graph.children(node);
        let parents = engine.graph.parents(node);
        for (i, c) in children.iter().enumerate() {
            if children[..i].contains(c) {
                out.push(format!("tick {}: duplicate child {:?} on {:?}", tick, c, node));
            }
            if !engine.graph.parents(*c).contains(&node) {
                out.push(format!("tick {}: {:?} -> {:?} has no parent edge", tick, node, c));
            }
            if !engine.registry.is_connected(node, *c) {
                out.push(format!("tick {}: edge {:?} -> {:?} not registered", tick, node, c));
            }
        }
        for (i, p) in parents.iter().enumerate() {
            if parents[..i].contains(p) {
                out.push(format!("tick {}: duplicate parent {:?} on {:?}", tick, p, node));
            }
        }
        if !parents.is_empty() && engine.graph.state(node) != Some(NodeState::Active) {
            out.push(format!("tick {}: {:?} has parents but is inactive", tick, node));
        }
    }

    out
}
