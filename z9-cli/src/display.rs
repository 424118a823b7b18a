use comfy_table::{Table, ContentArrangement, presets::UTF8_FULL, Cell, Color};

use crate::import::ImportResult;
use z9_db::models::DrawRecord;
use z9_engine::analytics::{NumberAnalytics, NumberStatus};
use z9_engine::generator::GeneratedCandidate;
use z9_engine::pipeline::ScanReport;
use z9_engine::thermal::ThermalStatus;
use z9_engine::trend::PositionRootProfile;

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn join_numbers(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| format!("{:02}", n))
        .collect::<Vec<_>>()
        .join(" - ")
}

fn thermal_color(status: ThermalStatus) -> Color {
    match status {
        ThermalStatus::Positive => Color::Green,
        ThermalStatus::Negative => Color::Red,
        ThermalStatus::Warning => Color::Yellow,
        ThermalStatus::Neutral => Color::Cyan,
        ThermalStatus::Unknown => Color::White,
    }
}

fn precision_tier(precision: f64) -> (&'static str, Color) {
    if precision > 90.0 {
        ("ULTRA", Color::Red)
    } else if precision > 80.0 {
        ("PREMIUM", Color::Green)
    } else if precision > 70.0 {
        ("HOT", Color::Yellow)
    } else {
        ("STD", Color::White)
    }
}

pub fn display_draws(draws: &[DrawRecord]) {
    if draws.is_empty() {
        println!("Aucun tirage à afficher.");
        return;
    }

    let mut table = new_table(vec!["Concours", "Numéros", "Racines", "Somme"]);
    for draw in draws {
        table.add_row(vec![
            draw.index().to_string(),
            join_numbers(draw.numbers()),
            draw.roots().iter().map(|r| r.to_string()).collect::<Vec<_>>().join(" "),
            draw.sum().to_string(),
        ]);
    }
    println!("{table}");
}

pub fn display_import_summary(result: &ImportResult) {
    println!("Import terminé :");
    println!("  Total lignes lues : {}", result.total_lines);
    println!("  Tirages valides   : {}", result.accepted);
    println!("  Insérés           : {}", result.inserted);
    println!("  Doublons ignorés  : {}", result.duplicates);
    if result.skipped > 0 {
        println!("  Lignes ignorées   : {}", result.skipped);
    }
}

pub fn display_analytics(analytics: &[NumberAnalytics], draw_count: usize) {
    println!("\n📊 Analytics sur {} tirages\n", draw_count);

    let mut table = new_table(vec![
        "Numéro", "Racine", "Retard", "Retard moyen", "Fréquence", "Momentum", "Prob. sortie", "Statut", "Conf. MC",
    ]);

    let mut sorted = analytics.to_vec();
    sorted.sort_by(|a, b| b.exit_probability.partial_cmp(&a.exit_probability).unwrap_or(std::cmp::Ordering::Equal));

    for a in &sorted {
        let color = match a.status {
            NumberStatus::Hot => Color::Green,
            NumberStatus::Cold => Color::Blue,
            NumberStatus::Critical => Color::Yellow,
            NumberStatus::Neutral => Color::White,
        };
        table.add_row(vec![
            Cell::new(format!("{:02}", a.number)),
            Cell::new(a.root),
            Cell::new(a.current_delay),
            Cell::new(format!("{:.1}", a.mean_delay)),
            Cell::new(format!("{} ({:.1}%)", a.total_frequency, a.recent_frequency_percent)),
            Cell::new(format!("{:.1}", a.momentum)),
            Cell::new(format!("{:.1}%", a.exit_probability)),
            Cell::new(a.status.to_string()).fg(color),
            Cell::new(format!("{:.3}", a.mc_confidence)),
        ]);
    }
    println!("{table}");
}

pub fn display_profiles(profiles: &[PositionRootProfile]) {
    let structure = profiles
        .iter()
        .map(|p| format!("{}ª[{}]({})", p.position, p.dominant_root, p.trend))
        .collect::<Vec<_>>()
        .join(" ");
    println!("\n── Structure des racines : {} ──\n", structure);

    let mut table = new_table(vec![
        "Position", "Racine", "Tendance", "Force", "Poids", "Confiance", "Variance MC", "Cycle",
    ]);
    for p in profiles {
        let weight = p.distribution[(p.dominant_root - 1) as usize];
        table.add_row(vec![
            Cell::new(p.position),
            Cell::new(p.dominant_root),
            Cell::new(p.trend.to_string()),
            Cell::new(format!("{:.0}", p.strength)),
            Cell::new(format!("{:.1}%", weight * 100.0)),
            Cell::new(format!("{:.1}", p.confidence)),
            Cell::new(format!("{:.4}", p.mc_variance)),
            Cell::new(p.cyclic_attractor.map(|l| l.to_string()).unwrap_or_else(|| "—".to_string())),
        ]);
    }
    println!("{table}");
}

fn numbers_cell_row(candidate: &GeneratedCandidate) -> Vec<Cell> {
    candidate
        .numbers
        .iter()
        .zip(candidate.statuses.iter())
        .map(|(n, s)| Cell::new(format!("{:02}{}", n, s)).fg(thermal_color(*s)))
        .collect()
}

pub fn display_candidates(candidates: &[GeneratedCandidate]) {
    println!("\n🎲 Grilles générées\n");
    if candidates.is_empty() {
        println!("Aucune grille générée.");
        return;
    }

    let mut table = new_table(vec![
        "Grille", "N1", "N2", "N3", "N4", "N5", "N6", "Précision", "Score MC", "Convergence", "Empreinte",
    ]);
    for c in candidates {
        let mut row = vec![Cell::new(&c.label)];
        row.extend(numbers_cell_row(c));
        row.push(Cell::new(format!("{:.1}%", c.precision)).fg(precision_tier(c.precision).1));
        row.push(Cell::new(format!("{:.1}", c.mc_score)));
        row.push(Cell::new(format!("{:.3}", c.mc_convergence)));
        row.push(Cell::new(&c.fingerprint));
        table.add_row(row);
    }
    println!("{table}");
}

/// Détail des 3 meilleures grilles avec retard et probabilité de sortie de chaque numéro.
pub fn display_elite(candidates: &[GeneratedCandidate], analytics: &[NumberAnalytics], next_contest: usize) {
    if candidates.is_empty() {
        return;
    }
    println!("\n◆ ÉLITE : CONCOURS {} ◆", next_contest);

    for (rank, c) in candidates.iter().take(3).enumerate() {
        let (tier, color) = precision_tier(c.precision);
        println!("\n[RANG {}] GRILLE {} ({:.2}% {})", rank + 1, c.label, c.precision, tier);

        let mut table = new_table(vec!["Numéro", "Statut", "Retard", "Prob. sortie"]);
        for (n, s) in c.numbers.iter().zip(c.statuses.iter()) {
            let a = analytics.iter().find(|a| a.number == *n);
            table.add_row(vec![
                Cell::new(format!("{:02}", n)).fg(color),
                Cell::new(s.to_string()).fg(thermal_color(*s)),
                Cell::new(a.map(|a| a.current_delay.to_string()).unwrap_or_default()),
                Cell::new(a.map(|a| format!("{:.1}%", a.exit_probability)).unwrap_or_default()),
            ]);
        }
        println!("{table}");
    }
}

pub fn display_elite_pool(pool: &[Vec<u8>]) {
    if pool.is_empty() {
        return;
    }
    let mut table = new_table(vec!["Emplacement", "Numéros d'élite"]);
    for (slot, numbers) in pool.iter().enumerate() {
        table.add_row(vec![(slot + 1).to_string(), join_numbers(numbers)]);
    }
    println!("{table}");
}

pub fn display_master(master: &GeneratedCandidate) {
    println!("\n█ GRILLE {} (CONVERGENCE MAÎTRESSE) █\n", master.label);
    let mut table = new_table(vec!["N1", "N2", "N3", "N4", "N5", "N6", "Précision", "Score MC"]);
    let mut row = numbers_cell_row(master);
    row.push(Cell::new(format!("{:.2}%", master.precision)).fg(Color::Yellow));
    row.push(Cell::new(format!("{:.1}", master.mc_score)));
    table.add_row(row);
    println!("{table}");
}

pub fn display_report(report: &ScanReport) {
    println!(
        "\nBase : {} concours | Prochain : {} | Seed : {}",
        report.draw_count,
        report.draw_count + 1,
        report.seed
    );
    display_profiles(&report.profiles);
    display_candidates(&report.candidates);
    display_elite(&report.candidates, &report.analytics, report.draw_count + 1);
    display_elite_pool(&report.elite_pool);
    if let Some(master) = &report.master {
        display_master(master);
    }
}
