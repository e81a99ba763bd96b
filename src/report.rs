use std::error::Error;

use colored::*;
use csv::Writer;

use crate::domain::frontier::Frontier;
use crate::domain::types::{Site, SiteId, Solution, SystemId};

/// Render a solution as one line per step, walking the tour in reverse.
///
/// Lines are built forward with each pickup emitted just before its system,
/// then the whole listing is reversed. Since the tour is a loop either
/// direction is valid, and this ordering makes every pickup happen on the
/// *last* pass through its system, so cargo rides along for as few hops as
/// possible.
pub fn solution_path_lines(
    solution: &Solution,
    system_name: impl Fn(SystemId) -> String,
    site_name: impl Fn(SiteId) -> String,
) -> Vec<String> {
    let mut lines = vec![];
    let mut remaining: Vec<Site> = solution.load.clone();
    for &system_id in &solution.tour {
        let (here, rest): (Vec<Site>, Vec<Site>) = remaining
            .into_iter()
            .partition(|site| site.system_id == system_id);
        for site in here {
            lines.push(format!(
                "   {}  value={:.0}  volume={:.0}",
                site_name(site.site_id),
                site.value,
                site.volume
            ));
        }
        lines.push(system_name(system_id));
        remaining = rest;
    }
    lines.reverse();
    lines
}

pub fn print_solution_summary(label: &str, solution: &Solution) {
    println!(
        "{}: {} hops, {} sites, value={:.0}, value/jump={:.1}",
        label.bold(),
        solution.tour.len() - 1,
        solution.load.len(),
        solution.total_value,
        solution.value_per_jump
    );
}

/// Print the whole frontier, one row per jump count, highlighting the rows
/// that win on total value and on value per jump.
pub fn print_frontier(frontier: &Frontier) {
    let best_value = frontier.best_by_value().map(|s| s.jump_count);
    let best_rate = frontier.best_by_value_per_jump().map(|s| s.jump_count);
    for (jump_count, solution) in frontier.iter() {
        let row = format!(
            "{:3} jumps: {:2} hops, {:2} sites, value={:14.0}, value/jump={:10.1}",
            jump_count,
            solution.tour.len() - 1,
            solution.load.len(),
            solution.total_value,
            solution.value_per_jump
        );
        if Some(jump_count) == best_value {
            println!("{}", row.green());
        } else if Some(jump_count) == best_rate {
            println!("{}", row.cyan());
        } else {
            println!("{row}");
        }
    }
}

pub fn save_frontier_csv(frontier: &Frontier, filename: &str) -> Result<(), Box<dyn Error>> {
    let mut wtr = Writer::from_path(filename)?;

    wtr.write_record([
        "jump_count",
        "tour_hops",
        "sites",
        "total_value",
        "total_volume",
        "value_per_jump",
    ])?;

    for (jump_count, solution) in frontier.iter() {
        wtr.write_record([
            jump_count.to_string(),
            (solution.tour.len() - 1).to_string(),
            solution.load.len().to_string(),
            solution.total_value.to_string(),
            solution.total_volume.to_string(),
            solution.value_per_jump.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
