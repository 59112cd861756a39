//  Copyright 2024 ordlist Project Authors
//
//  Licensed under the Apache License, Version 2.0 (the "License");
//  you may not use this file except in compliance with the License.
//  You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.

//! Workload driver for ordlist.
//!
//! Runs a random mix of positional operations against one list shared by all worker threads behind a mutex, then
//! prints per-operation latency.

use std::time::Instant;

use anyhow::{anyhow, ensure, Result};
use clap::{Parser, ValueEnum};
use hdrhistogram::Histogram;
use itertools::Itertools;
use ordlist::{ListConfig, Node, OrderedList, Strategy, StrategyConfig};
use parking_lot::Mutex;
use rand::{
    distributions::{Distribution, WeightedIndex},
    rngs::SmallRng,
    Rng, SeedableRng,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

type BenchList = OrderedList<u64, Strategy<Node<u64>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StrategyKind {
    Heap,
    Bounded,
}

#[derive(Debug, Clone, Parser)]
#[command(author, version, about)]
struct Args {
    /// Operations per worker.
    #[arg(long, default_value_t = 100_000)]
    ops: usize,

    /// Items appended before the workload starts.
    #[arg(long, default_value_t = 1_000)]
    prefill: usize,

    /// Worker threads sharing the list.
    #[arg(long, default_value_t = 1)]
    threads: usize,

    /// Node allocation strategy.
    #[arg(long, value_enum, default_value_t = StrategyKind::Heap)]
    strategy: StrategyKind,

    /// Node budget of the bounded strategy.
    #[arg(long)]
    capacity: Option<usize>,

    /// Weights of insert, lookup, erase and swap.
    #[arg(long, value_delimiter = ',', default_values_t = vec![4, 4, 1, 1])]
    weights: Vec<u32>,

    /// Max items removed by a single erase.
    #[arg(long, default_value_t = 4)]
    erase_span: usize,

    /// Seed of the first worker. Worker `i` uses `seed + i`.
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Insert,
    Lookup,
    Erase,
    Swap,
}

impl Op {
    const ALL: [Op; 4] = [Op::Insert, Op::Lookup, Op::Erase, Op::Swap];

    fn name(&self) -> &'static str {
        match self {
            Op::Insert => "insert",
            Op::Lookup => "lookup",
            Op::Erase => "erase",
            Op::Swap => "swap",
        }
    }
}

struct Stats {
    hists: Vec<Histogram<u64>>,
    failed: Vec<u64>,
}

impl Stats {
    fn new() -> Result<Self> {
        let hists = Op::ALL
            .iter()
            .map(|_| Histogram::new(3))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self {
            hists,
            failed: vec![0; Op::ALL.len()],
        })
    }

    fn merge(&mut self, other: &Stats) -> Result<()> {
        for (hist, o) in self.hists.iter_mut().zip_eq(other.hists.iter()) {
            hist.add(o)?;
        }
        for (failed, o) in self.failed.iter_mut().zip_eq(other.failed.iter()) {
            *failed += o;
        }
        Ok(())
    }

    fn report(&self) {
        println!(
            "{:<8} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
            "op", "count", "failed", "p50(ns)", "p90(ns)", "p99(ns)", "max(ns)"
        );
        for (i, op) in Op::ALL.iter().enumerate() {
            let hist = &self.hists[i];
            println!(
                "{:<8} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
                op.name(),
                hist.len(),
                self.failed[i],
                hist.value_at_quantile(0.5),
                hist.value_at_quantile(0.9),
                hist.value_at_quantile(0.99),
                hist.max(),
            );
        }
    }
}

fn list_config(args: &Args) -> ListConfig {
    let strategy = match args.strategy {
        StrategyKind::Heap => StrategyConfig::Heap {
            initial_capacity: args.prefill,
        },
        StrategyKind::Bounded => StrategyConfig::Bounded {
            capacity: args.capacity,
        },
    };
    ListConfig { strategy }
}

fn run(id: usize, list: &Mutex<BenchList>, args: &Args) -> Result<Stats> {
    let mut rng = SmallRng::seed_from_u64(args.seed + id as u64);
    let dist = WeightedIndex::new(&args.weights)?;
    let mut stats = Stats::new()?;

    for i in 0..args.ops {
        let op = dist.sample(&mut rng);
        let value = ((id as u64) << 48) | i as u64;

        let mut list = list.lock();
        let len = list.len();

        let start = Instant::now();
        let res = match Op::ALL[op] {
            Op::Insert => list.insert(rng.gen_range(0..=len), value),
            Op::Lookup => list.lookup(rng.gen_range(0..len.max(1))).map(|_| ()),
            Op::Erase => {
                let s = rng.gen_range(0..len.max(1));
                let e = s + rng.gen_range(0..=args.erase_span);
                list.erase(s, e)
            }
            Op::Swap => list.swap(rng.gen_range(0..len.max(1)), rng.gen_range(0..len.max(1))),
        };
        let elapsed = start.elapsed().as_nanos() as u64;
        drop(list);

        match res {
            Ok(()) => stats.hists[op].saturating_record(elapsed),
            Err(e) => {
                tracing::debug!(worker = id, op = Op::ALL[op].name(), %e, "[bench]: op failed");
                stats.failed[op] += 1;
            }
        }
    }

    tracing::info!(worker = id, ops = args.ops, "[bench]: worker finished");
    Ok(stats)
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    tracing::info!(?args, "[bench]: start");

    ensure!(
        args.weights.len() == Op::ALL.len(),
        "expected {} weights, got {}",
        Op::ALL.len(),
        args.weights.len()
    );
    ensure!(args.threads > 0, "at least one worker is required");

    let mut list = OrderedList::with_config(&list_config(&args))?;
    for i in 0..args.prefill {
        list.append(i as u64)?;
    }
    let list = Mutex::new(list);

    let start = Instant::now();
    let results = std::thread::scope(|s| {
        let handles = (0..args.threads)
            .map(|id| {
                let list = &list;
                let args = &args;
                s.spawn(move || run(id, list, args))
            })
            .collect_vec();
        handles
            .into_iter()
            .map(|handle| -> Result<Stats> { handle.join().map_err(|_| anyhow!("worker panicked"))? })
            .collect_vec()
    });
    let elapsed = start.elapsed();

    let mut stats = Stats::new()?;
    for res in results {
        stats.merge(&res?)?;
    }

    let list = list.into_inner();
    println!(
        "threads: {}, ops: {}, elapsed: {:.3?}, final len: {}",
        args.threads,
        args.threads * args.ops,
        elapsed,
        list.len()
    );
    stats.report();

    Ok(())
}
