use std::fmt::{self, Display, Formatter};

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::*;

use crate::power::PowerEstimate;

impl PowerEstimate {
    pub fn display(&self) -> String {
        let power_display = format!("{:.3}", self.power);
        let cutoff_display = format!("{:.4}", self.cutoff);
        let level_display = format!("{:.3}", self.alpha);

        let power_interpretation = if self.power >= 0.8 {
            "🟢 Adequately powered"
        } else if self.power >= 0.5 {
            "🟡 Marginally powered"
        } else if self.power > self.alpha * 2.0 {
            "🟠 Underpowered"
        } else {
            "🔴 Indistinguishable from the null"
        };

        let resolution = 1.0 / self.reps as f64;
        let reps_interpretation = if resolution <= 0.001 {
            "🟢 Fine Monte Carlo resolution"
        } else if resolution <= 0.01 {
            "🟡 Moderate Monte Carlo resolution"
        } else {
            "🟠 Coarse Monte Carlo resolution"
        };

        let mut title_table = Table::new();
        title_table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .add_row(vec![
                Cell::new("Two-Level Permutation Power Analysis")
                    .set_alignment(CellAlignment::Center),
            ]);

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("Metric").set_alignment(CellAlignment::Center),
                Cell::new("Value").set_alignment(CellAlignment::Center),
                Cell::new("Interpretation").set_alignment(CellAlignment::Center),
            ]);

        table
            .add_row(vec![
                Cell::new("Empirical power").set_alignment(CellAlignment::Left),
                Cell::new(&power_display).set_alignment(CellAlignment::Right),
                Cell::new(power_interpretation).set_alignment(CellAlignment::Left),
            ])
            .add_row(vec![
                Cell::new("Critical cutoff").set_alignment(CellAlignment::Left),
                Cell::new(&cutoff_display).set_alignment(CellAlignment::Right),
                Cell::new(format!("(1-α) permutation quantile, α = {level_display}"))
                    .set_alignment(CellAlignment::Left),
            ])
            .add_row(vec![
                Cell::new("Replications").set_alignment(CellAlignment::Left),
                Cell::new(self.reps).set_alignment(CellAlignment::Right),
                Cell::new(reps_interpretation).set_alignment(CellAlignment::Left),
            ]);

        format!("{}\n{}", title_table, table)
    }
}

impl Display for PowerEstimate {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}
