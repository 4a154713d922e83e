//! Output formatting for CLI

use crate::{encoder::describe, q_learning::StatsSummary, types::Observation};

/// Print a section header
pub fn print_section(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("{title}");
    println!("{}", "=".repeat(60));
}

/// Print a subsection header
pub fn print_subsection(title: &str) {
    println!("\n{title}");
    println!("{}", "-".repeat(40));
}

/// Format a number with thousands separators
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.insert(0, ',');
        }
        result.insert(0, c);
    }
    result
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:24} {}", format!("{key}:"), value);
}

/// Print the telemetry block shared by `train` and `stats`.
pub fn print_stats(stats: &StatsSummary) {
    print_subsection("Agent");
    print_kv(
        "Intelligence",
        &format!("{:.1} ({})", stats.intelligence_score, stats.intelligence_tier),
    );
    print_kv("Epsilon", &format!("{:.4}", stats.epsilon));
    print_kv("Alpha", &format!("{:.4}", stats.alpha));
    print_kv(
        "Battles",
        &format!(
            "{} won / {} ({:.1}%)",
            format_number(stats.battles_won),
            format_number(stats.total_battles),
            stats.win_rate * 100.0
        ),
    );
    print_kv("Floors cleared", &format_number(stats.floors_cleared));
    print_kv("Highest floor", &stats.highest_floor.to_string());
    print_kv("Learning updates", &format_number(stats.total_learning_updates));
    print_kv("Taught actions", &format_number(stats.player_taught_actions));

    print_subsection("Knowledge");
    print_kv("Combat entries", &format_number(stats.combat_entries as u64));
    print_kv("Base entries", &format_number(stats.base_entries as u64));
    print_kv("Minigame entries", &format_number(stats.minigame_entries as u64));

    if !stats.lessons.is_empty() {
        print_subsection("Lessons learned");
        for lesson in &stats.lessons {
            println!("  - {lesson}");
        }
    }
}

/// One-line label for an observation; combat observations get a description.
pub fn observation_label(state: &Observation, combat: bool) -> String {
    if combat {
        format!("{state}  {}", describe(state))
    } else {
        state.to_string()
    }
}
