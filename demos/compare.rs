//! Compare variable ordering heuristics on generated benchmark circuits.
//!
//! Run with:
//! ```bash
//! cargo run --release --example compare -- adder --width 8
//! cargo run --release --example compare -- random-cnf --width 20 -H force -H mince
//! ```

use std::time::Duration;

use bdd_order::bdd::BddConfig;
use bdd_order::circuit::{Circuit, GateKind};
use bdd_order::compile::CompileConfig;
use bdd_order::evaluate::compare;
use bdd_order::formula::{Formula, Variable};
use bdd_order::heuristic::Heuristic;
use bdd_order::transform::cnf_to_circuit;
use clap::{Parser, ValueEnum};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

#[derive(Debug, Copy, Clone, ValueEnum)]
enum Family {
    /// Ripple-carry adder.
    Adder,
    /// Unsigned `a > b` comparator.
    Comparator,
    /// Multiplexer with `width` select lines.
    Mux,
    /// Random 3-CNF with `width` variables, factored into a circuit.
    RandomCnf,
}

#[derive(Debug, Parser)]
#[command(author, version, about = "Compare BDD variable ordering heuristics")]
struct Cli {
    /// Benchmark family.
    #[arg(value_enum)]
    family: Family,

    /// Width of the generated instance.
    #[arg(long, value_name = "INT", default_value = "4")]
    width: usize,

    /// Heuristics to compare (default: all of them).
    #[arg(short = 'H', long = "heuristic", value_name = "NAME")]
    heuristics: Vec<Heuristic>,

    /// Seed for random instances and the random baseline.
    #[arg(long, default_value = "0")]
    seed: u64,

    /// Compilation timeout, in seconds.
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// Partition search budget for MINCE, in seconds.
    #[arg(long, value_name = "SECONDS", default_value = "10")]
    partition_timeout: u64,

    /// Node table ceiling.
    #[arg(long, value_name = "INT")]
    max_nodes: Option<usize>,

    /// Enable debug logging.
    #[arg(long)]
    debug: bool,
}

fn adder(n: usize) -> Circuit {
    let mut c = Circuit::new();
    for i in 0..n {
        c.add_input(format!("a{}", i)).unwrap();
        c.add_input(format!("b{}", i)).unwrap();
    }
    c.add_input("cin").unwrap();
    let mut carry = Variable::from("cin");
    for i in 0..n {
        let a = Variable::new(format!("a{}", i));
        let b = Variable::new(format!("b{}", i));
        let g = |name: &str| Variable::new(format!("{}{}", name, i));
        c.add_gate(g("s"), GateKind::Xor, [&a, &b, &carry], true).unwrap();
        c.add_gate(g("ab"), GateKind::And, [&a, &b], false).unwrap();
        c.add_gate(g("x"), GateKind::Xor, [&a, &b], false).unwrap();
        c.add_gate(g("xc"), GateKind::And, [g("x"), carry.clone()], false).unwrap();
        let next = Variable::new(format!("c{}", i + 1));
        c.add_gate(&next, GateKind::Or, [g("ab"), g("xc")], i + 1 == n).unwrap();
        carry = next;
    }
    c
}

fn comparator(n: usize) -> Circuit {
    let mut c = Circuit::new();
    for i in 0..n {
        c.add_input(format!("a{}", i)).unwrap();
    }
    for i in 0..n {
        c.add_input(format!("b{}", i)).unwrap();
    }
    let mut terms = Vec::new();
    let mut equal: Option<Variable> = None;
    for i in (0..n).rev() {
        let a = Variable::new(format!("a{}", i));
        let b = Variable::new(format!("b{}", i));
        let g = |name: &str| Variable::new(format!("{}{}", name, i));
        c.add_gate(g("nb"), GateKind::Not, [&b], false).unwrap();
        let mut fanin = vec![a.clone(), g("nb")];
        fanin.extend(equal.clone());
        c.add_gate(g("gt"), GateKind::And, fanin, false).unwrap();
        terms.push(g("gt"));
        c.add_gate(g("eq"), GateKind::Xnor, [&a, &b], false).unwrap();
        equal = Some(match equal {
            None => g("eq"),
            Some(prev) => {
                c.add_gate(g("pre"), GateKind::And, [prev, g("eq")], false).unwrap();
                g("pre")
            }
        });
    }
    c.add_gate("gt", GateKind::Or, terms, true).unwrap();
    c
}

fn mux(k: usize) -> Circuit {
    let mut c = Circuit::new();
    for i in 0..1 << k {
        c.add_input(format!("d{}", i)).unwrap();
    }
    for j in 0..k {
        c.add_input(format!("s{}", j)).unwrap();
        c.add_gate(format!("ns{}", j), GateKind::Not, [format!("s{}", j)], false).unwrap();
    }
    let mut terms = Vec::new();
    for i in 0..1usize << k {
        let mut fanin = vec![format!("d{}", i)];
        for j in 0..k {
            let line = if i >> j & 1 == 1 { "s" } else { "ns" };
            fanin.push(format!("{}{}", line, j));
        }
        let term = format!("t{}", i);
        c.add_gate(term.as_str(), GateKind::And, fanin, false).unwrap();
        terms.push(term);
    }
    c.add_gate("out", GateKind::Or, terms, true).unwrap();
    c
}

fn random_cnf(n: usize, seed: u64) -> color_eyre::Result<Circuit> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let clauses: Vec<Vec<i32>> = (0..4 * n)
        .map(|_| {
            (0..3)
                .map(|_| {
                    let v = rng.random_range(1..=n as i32);
                    if rng.random_bool(0.5) { v } else { -v }
                })
                .collect()
        })
        .collect();
    let refs: Vec<&[i32]> = clauses.iter().map(Vec::as_slice).collect();
    Ok(cnf_to_circuit(&Formula::from_dimacs(&refs))?)
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Cli::parse();

    simplelog::TermLogger::init(
        if args.debug {
            simplelog::LevelFilter::Debug
        } else {
            simplelog::LevelFilter::Warn
        },
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    println!("args = {:?}", args);

    let circuit = match args.family {
        Family::Adder => adder(args.width),
        Family::Comparator => comparator(args.width),
        Family::Mux => mux(args.width),
        Family::RandomCnf => random_cnf(args.width, args.seed)?,
    };
    circuit.validate()?;
    println!(
        "circuit: {} inputs, {} outputs, {} gates",
        circuit.inputs().len(),
        circuit.outputs().len(),
        circuit.len()
    );

    let heuristics: Vec<Heuristic> = if args.heuristics.is_empty() {
        Heuristic::all()
    } else {
        args.heuristics.clone()
    };
    let partition_timeout = Duration::from_secs(args.partition_timeout);
    let heuristics: Vec<Heuristic> = heuristics
        .into_iter()
        .map(|h| match h {
            Heuristic::Random { .. } => Heuristic::Random { seed: args.seed },
            Heuristic::Mince(config) => Heuristic::Mince(config.with_timeout(partition_timeout)),
            h => h,
        })
        .collect();

    let mut bdd = BddConfig::default();
    if let Some(max_nodes) = args.max_nodes {
        bdd = bdd.with_max_nodes(max_nodes);
    }
    let mut config = CompileConfig::default().with_bdd(bdd);
    if let Some(seconds) = args.timeout {
        config = config.with_timeout(Duration::from_secs(seconds));
    }

    println!(
        "{:>26} {:>10} {:>10} {:>12} {:>12}",
        "Heuristic", "Size", "Nodes", "Order (ms)", "Compile (ms)"
    );
    for (h, result) in compare(&heuristics, &circuit, &config) {
        match result {
            Ok(m) => println!(
                "{:>26} {:>10} {:>10} {:>12.3} {:>12.3}",
                h.name(),
                m.size,
                m.num_nodes,
                m.ordering_time.as_secs_f64() * 1000.0,
                m.compile_time.as_secs_f64() * 1000.0
            ),
            Err(e) => println!("{:>26} {}", h.name(), e),
        }
    }

    Ok(())
}
