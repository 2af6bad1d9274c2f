use std::collections::HashMap;

use rand::Rng;
use serde::Serialize;
use shared::domain::ChoiceId;

use crate::tally::AggregateTally;

/// Fallback for a choice without an assigned color; keeps the builder
/// total without regenerating anything mid-slide.
const FALLBACK_COLOR: &str = "#9ca3af";

/// Render-ready view of the live tally. Labels, counts, and colors are
/// index-aligned with the slide's choice order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartProjection {
    pub question: String,
    pub labels: Vec<String>,
    pub counts: Vec<usize>,
    pub colors: Vec<String>,
}

impl ChartProjection {
    /// What the renderer draws while slide data is still loading.
    pub fn empty() -> Self {
        Self {
            question: String::new(),
            labels: Vec::new(),
            counts: Vec::new(),
            colors: Vec::new(),
        }
    }
}

/// Chart colors for one slide's tally, drawn once when the tally is
/// created so the bars don't change color under the audience on every
/// vote. Regenerated only when the current slide changes.
#[derive(Debug, Clone)]
pub struct ColorAssignment {
    colors: HashMap<ChoiceId, String>,
}

impl ColorAssignment {
    pub fn generate(tally: &AggregateTally) -> Self {
        let mut rng = rand::thread_rng();
        let colors = tally
            .choices
            .iter()
            .map(|choice| (choice.choice_id, random_chart_color(&mut rng)))
            .collect();
        Self { colors }
    }

    fn color_for(&self, choice_id: ChoiceId) -> &str {
        self.colors
            .get(&choice_id)
            .map(String::as_str)
            .unwrap_or(FALLBACK_COLOR)
    }
}

fn random_chart_color(rng: &mut impl Rng) -> String {
    format!("#{:06x}", rng.gen_range(0x000000..=0xffffffu32))
}

/// Pure mapping from the aggregator's state to the chart structure. Two
/// calls over an unchanged tally yield identical output; only
/// [`ColorAssignment::generate`] draws randomness.
pub fn build_projection(tally: &AggregateTally, colors: &ColorAssignment) -> ChartProjection {
    ChartProjection {
        question: tally.question.clone(),
        labels: tally
            .choices
            .iter()
            .map(|choice| choice.content.clone())
            .collect(),
        counts: tally
            .choices
            .iter()
            .map(|choice| choice.votes.len())
            .collect(),
        colors: tally
            .choices
            .iter()
            .map(|choice| colors.color_for(choice.choice_id).to_string())
            .collect(),
    }
}

#[cfg(test)]
#[path = "tests/projection_tests.rs"]
mod tests;
