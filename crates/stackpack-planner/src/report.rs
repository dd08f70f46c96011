//! Human-readable plan formatting.

use crate::plan::Plan;

const LABEL_WIDTH: usize = 12;
const MIN_VALUE_WIDTH: usize = 28;

pub fn format_plan(plan: &Plan) -> String {
    let mut out = String::new();
    let warnings = plan.warnings().count();
    let members: usize = plan.phase1.iter().map(|c| c.members.len()).sum();
    let edges: usize = plan.phase2.iter().map(|c| c.members.len()).sum();

    let rows = [
        ("Namespace:", plan.namespace.clone()),
        ("Phase 1:", format!("{} containers", plan.phase1.len())),
        ("Phase 2:", format!("{} containers", plan.phase2.len())),
        ("Warnings:", warnings.to_string()),
    ];
    // Box grows with the longest value so the right border stays aligned.
    let value_width = rows
        .iter()
        .map(|(_, v)| v.chars().count())
        .max()
        .unwrap_or(0)
        .max(MIN_VALUE_WIDTH);
    let inner = LABEL_WIDTH + value_width + 2;
    let rule = "═".repeat(inner);

    out.push_str(&format!("\n╔{rule}╗\n"));
    out.push_str(&format!("║  {:<w$}║\n", "stackpack deployment plan", w = inner - 2));
    out.push_str(&format!("╠{rule}╣\n"));
    for (label, value) in &rows {
        out.push_str(&format!(
            "║  {label:<LABEL_WIDTH$}{value:<value_width$}║\n"
        ));
    }
    out.push_str(&format!("╚{rule}╝\n\n"));

    if plan.is_empty() {
        out.push_str("Nothing to deploy.\n");
    }

    if !plan.phase1.is_empty() {
        out.push_str(&format!("PHASE 1 ({members} resources):\n\n"));
        for c in &plan.phase1 {
            out.push_str(&format!("  {} (cost {})\n", c.name, c.cost));
            for m in &c.members {
                out.push_str(&format!("    • {} [{}]\n", m.name, m.cost));
            }
            out.push('\n');
        }
    }

    if !plan.phase2.is_empty() {
        out.push_str(&format!("PHASE 2 ({edges} references):\n\n"));
        for c in &plan.phase2 {
            out.push_str(&format!("  {} (cost {})\n", c.name, c.cost));
            let deps: Vec<&str> = c.depends_on.iter().map(String::as_str).collect();
            out.push_str(&format!("    depends on: {}\n", deps.join(", ")));
            for m in &c.members {
                let e = &m.record;
                out.push_str(&format!(
                    "    • {}: {} → {} ({})\n",
                    m.name, e.source, e.target, e.direction
                ));
            }
            out.push('\n');
        }
    }

    if warnings > 0 {
        out.push_str("⚠️  WARNINGS:\n\n");
        for d in plan.warnings() {
            out.push_str(&format!("  • {}\n", d.message));
        }
        out.push('\n');
    }

    out
}
