use std::error::Error;
use std::time::Duration;

use tracing::{info, span, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use route_sweep::config::constant::{
    ENGINE, FRONTIER_CSV_PATH, MAX_PRIORITY_DISTANCE, MAX_SEGMENT_LENGTH, PRIORITY_DECAY,
    SOLUTIONS_CAP, TIME_BUDGET_SECONDS, VOLUME_BUDGET,
};
use route_sweep::database::sqlx::db_connection;
use route_sweep::domain::frontier::Frontier;
use route_sweep::domain::types::SweepConfig;
use route_sweep::report::{
    print_frontier, print_solution_summary, save_frontier_csv, solution_path_lines,
};
use route_sweep::setup::{setup, PlannerInput};
use route_sweep::solver::adjacency::AdjacencySweep;
use route_sweep::solver::powerset::PowersetSweep;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialise tracing_subscriber for better logging/debugging
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env()) // Reads RUST_LOG
        .with(
            fmt::layer()
                .with_span_events(fmt::format::FmtSpan::NEW | fmt::format::FmtSpan::CLOSE)
                .pretty(),
        )
        .init();

    let db_pool = db_connection().await?;

    let input = {
        let span = span!(Level::INFO, "setup");
        let _guard = span.enter();
        setup(&db_pool).await?
    };

    info!(
        "Planning sweep from system {} over {} systems and {} candidate sites",
        input.starting_system_id,
        input.graph.len(),
        input.index.len()
    );

    let mut sweep_config =
        SweepConfig::new(VOLUME_BUDGET, Duration::from_secs(TIME_BUDGET_SECONDS));
    sweep_config.max_segment_length = MAX_SEGMENT_LENGTH;
    sweep_config.max_priority_distance = MAX_PRIORITY_DISTANCE;
    sweep_config.priority_decay = PRIORITY_DECAY;
    sweep_config.solutions_cap = SOLUTIONS_CAP;

    match ENGINE {
        "adjacency" => {
            let mut engine = AdjacencySweep::new(
                &input.graph,
                &input.index,
                input.starting_system_id,
                sweep_config,
            );
            engine.run();
            report(engine.frontier(), &input)?;
        }
        _ => {
            let mut engine = PowersetSweep::new(
                &input.graph,
                &input.index,
                input.starting_system_id,
                sweep_config,
            );
            engine.run();
            report(engine.frontier(), &input)?;
        }
    }

    Ok(())
}

fn report(frontier: &Frontier, input: &PlannerInput) -> Result<(), Box<dyn Error>> {
    if frontier.is_empty() {
        warn!("no solutions found within the configured budgets");
        return Ok(());
    }

    println!();
    print_frontier(frontier);

    let system_name = |id| {
        input
            .system_names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("System {id}"))
    };
    let site_name = |id| {
        input
            .site_names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("Site {id}"))
    };

    if let Some(best) = frontier.best_by_value() {
        println!();
        print_solution_summary("Total value sweep", best);
        for line in solution_path_lines(best, system_name, site_name) {
            println!("{line}");
        }
    }
    if let Some(best) = frontier.best_by_value_per_jump() {
        println!();
        print_solution_summary("Value per jump sweep", best);
        for line in solution_path_lines(best, system_name, site_name) {
            println!("{line}");
        }
    }

    save_frontier_csv(frontier, FRONTIER_CSV_PATH)?;
    info!("Frontier written to {FRONTIER_CSV_PATH}");

    Ok(())
}
