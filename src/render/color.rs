use eframe::egui::Color32;

pub const SCORE_MIN: f64 = -10.0;
pub const SCORE_MAX: f64 = 10.0;

pub fn clamp_score(score: f64) -> f64 {
    score.clamp(SCORE_MIN, SCORE_MAX)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RelationshipColorScale {
    hostile: Color32,
    neutral: Color32,
    ally: Color32,
}

impl RelationshipColorScale {
    pub fn new(hostile: Color32, neutral: Color32, ally: Color32) -> Self {
        Self {
            hostile,
            neutral,
            ally,
        }
    }

    pub fn color_of(&self, score: f64) -> Color32 {
        if score.is_nan() {
            return self.neutral;
        }

        let score = clamp_score(score);
        if score < 0.0 {
            lerp_rgb(self.neutral, self.hostile, score / SCORE_MIN)
        } else {
            lerp_rgb(self.neutral, self.ally, score / SCORE_MAX)
        }
    }
}

fn lerp_rgb(from: Color32, to: Color32, t: f64) -> Color32 {
    let channel = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
    Color32::from_rgb(
        channel(from.r(), to.r()),
        channel(from.g(), to.g()),
        channel(from.b(), to.b()),
    )
}
