//! # tick_host — demonstration host
//!
//! Plays the host engine's role against the grouped tick scheduler:
//!
//! 1. Define a sample policy set in a [`MemoryPolicyProvider`].
//! 2. Build a [`TickList`] and schedule a sample population.
//! 3. Run unconstrained frames with the plain cursor.
//! 4. Run one pressured frame with the budget-aware cursor and a wall-clock
//!    frame budget, showing low-priority groups being deferred.
//! 5. Delete a policy and `reload()`, showing members relocating live.

use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tick_list::{FrameBudget, Member, ObjectId, TickList};
use tick_policy::{GroupPolicy, MemoryPolicyProvider, ObjectKind, PolicyName, WorldId};

#[derive(Parser)]
#[command(name = "tick_host", about = "Demonstration host for the grouped tick scheduler")]
struct Args {
    /// Unconstrained frames to run before the pressured pass
    #[arg(short, long, default_value_t = 3)]
    frames: u64,

    /// Frame budget for the pressured pass, in microseconds
    #[arg(short, long, default_value_t = 150)]
    budget_us: u64,

    /// Simulated per-object tick cost, in microseconds
    #[arg(short, long, default_value_t = 40)]
    tick_cost_us: u64,
}

/// Frame budget backed by a wall-clock deadline, the way a host profiler
/// meters a scheduling phase.
struct FrameClock {
    started: Instant,
    slice: Duration,
}

impl FrameClock {
    fn start(slice: Duration) -> Self {
        Self {
            started: Instant::now(),
            slice,
        }
    }
}

impl FrameBudget for FrameClock {
    fn exhausted(&self) -> bool {
        self.started.elapsed() >= self.slice
    }
}

/// Global fallback plus two routed groups with distinct priorities, and a
/// per-world override trimming the monsters group's priority.
fn define_sample_policies(provider: &mut MemoryPolicyProvider) {
    provider.define(GroupPolicy::new(
        PolicyName::global("actors"),
        ObjectKind::Actor,
    ));
    provider.define(
        GroupPolicy::new(PolicyName::global("monsters"), ObjectKind::Actor)
            .route("mob.zombie")
            .route("mob.skeleton")
            .with_priority(1),
    );
    provider.define(
        GroupPolicy::new(PolicyName::global("villagers"), ObjectKind::Actor)
            .route("mob.villager")
            .with_priority(5),
    );
    provider.define(
        GroupPolicy::new(PolicyName::world(WorldId(0), "monsters"), ObjectKind::Actor)
            .with_parent(PolicyName::global("monsters"))
            .with_priority(0),
    );
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "tick_host=info,tick_list=info".into()),
        )
        .init();

    let args = Args::parse();

    let mut provider = MemoryPolicyProvider::new();
    define_sample_policies(&mut provider);
    if let Err(e) = provider.validate() {
        // Routing stays last-write-wins at runtime; surface the finding.
        warn!(%e, "policy validation failed");
    }

    let mut list = TickList::new(WorldId(0), ObjectKind::Actor, &provider)?;

    let mut next_id = 0u64;
    let mut spawn = |list: &mut TickList, type_key: &str, count: u64| {
        for _ in 0..count {
            next_id += 1;
            list.add(Member::new(ObjectId(next_id), type_key));
        }
    };
    spawn(&mut list, "mob.zombie", 4);
    spawn(&mut list, "mob.skeleton", 2);
    spawn(&mut list, "mob.villager", 3);
    spawn(&mut list, "mob.chicken", 2); // unrouted, lands in the fallback group
    info!(members = list.len(), groups = list.group_count(), "population scheduled");

    let tick_cost = Duration::from_micros(args.tick_cost_us);
    for frame in 0..args.frames {
        let started = Instant::now();
        let mut cursor = list.cursor();
        let mut ticked = 0u64;
        while let Some(object) = cursor.next(&list)? {
            tick_object(object, tick_cost);
            ticked += 1;
        }
        info!(
            frame,
            ticked,
            elapsed_us = started.elapsed().as_micros() as u64,
            "unconstrained frame"
        );
    }

    // Pressured pass: the budget trips mid-frame and the remaining
    // (lowest-priority) groups wait for the next frame.
    let clock = FrameClock::start(Duration::from_micros(args.budget_us));
    let mut cursor = list.budget_cursor(&clock);
    let mut ticked = 0u64;
    while let Some(object) = cursor.next(&list)? {
        tick_object(object, tick_cost);
        ticked += 1;
    }
    info!(
        ticked,
        deferred_groups = cursor.deferred_groups(),
        budget_us = args.budget_us,
        "pressured frame"
    );

    // Live reconfiguration: delete the monsters policies and regroup.
    provider.remove(&PolicyName::world(WorldId(0), "monsters"));
    provider.remove(&PolicyName::global("monsters"));
    list.reload(&provider)?;
    for summary in list.group_summaries() {
        info!(
            group = summary.name,
            members = summary.members,
            priority = summary.priority,
            "group after reload"
        );
    }

    list.log_diagnostics();
    Ok(())
}

/// Stand-in for the host ticking one object.
fn tick_object(_object: ObjectId, cost: Duration) {
    if !cost.is_zero() {
        std::thread::sleep(cost);
    }
}
