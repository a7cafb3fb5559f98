/// Distance thresholds at which simplified representations take over.
///
/// Level 0 is full detail; level `n` is used beyond the `n`-th threshold.
/// The preset's LOD bias stretches distances, so a larger bias switches to
/// coarser levels sooner.
#[derive(Clone, Debug, PartialEq)]
pub struct LodLevels {
    thresholds: Vec<f32>,
}

impl LodLevels {
    /// Thresholds are sorted; non-finite and negative values are dropped.
    pub fn new(thresholds: impl IntoIterator<Item = f32>) -> Self {
        let mut thresholds: Vec<f32> = thresholds
            .into_iter()
            .filter(|t| t.is_finite() && *t >= 0.0)
            .collect();
        thresholds.sort_by(f32::total_cmp);
        Self { thresholds }
    }

    /// Evenly spaced levels covering a preset's draw distance.
    pub fn spread(draw_distance: f32, levels: usize) -> Self {
        let step = draw_distance / (levels + 1) as f32;
        Self::new((1..=levels).map(|i| step * i as f32))
    }

    pub fn level_count(&self) -> usize {
        self.thresholds.len() + 1
    }

    pub fn level_for(&self, distance: f32, lod_bias: f32) -> usize {
        let effective = distance * (1.0 + lod_bias.max(0.0));
        self.thresholds.iter().take_while(|t| effective > **t).count()
    }
}
