/// One evaluated point.
///
/// `spherical` is always the canonical representation of `euclidean`
/// (radius `≥ 0`, interior angles in `[0, π]`, final angle in `[0, 2π)`),
/// recomputed from the Euclidean point rather than copied from the
/// proposal.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Observation {
    /// The point handed to the objective.
    pub euclidean: Vec<f64>,
    /// `[r, φ₁, …, φ_{d-1}]` under the optimizer's axis order.
    pub spherical: Vec<f64>,
    /// The objective value (always finite).
    pub value: f64,
}

/// Append-only record of every evaluation, in evaluation order.
///
/// The initial design comes first, followed by one entry per iteration.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dataset {
    observations: Vec<Observation>,
}

impl Dataset {
    /// Creates an empty dataset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, observation: Observation) {
        self.observations.push(observation);
    }

    /// Number of observations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Returns `true` if nothing has been evaluated yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// All observations in evaluation order.
    #[must_use]
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// The most recent observation.
    #[must_use]
    pub fn last(&self) -> Option<&Observation> {
        self.observations.last()
    }

    /// Iterates over observations in evaluation order.
    #[must_use]
    pub fn iter(&self) -> core::slice::Iter<'_, Observation> {
        self.observations.iter()
    }

    /// The observation with the smallest value. Ties go to the earliest.
    #[must_use]
    pub fn best(&self) -> Option<&Observation> {
        self.observations.iter().fold(None, |best, obs| match best {
            Some(b) if b.value <= obs.value => Some(b),
            _ => Some(obs),
        })
    }

    /// The smallest observed value.
    #[must_use]
    pub fn best_value(&self) -> Option<f64> {
        self.best().map(|o| o.value)
    }

    /// Best value after each observation; non-increasing.
    #[must_use]
    pub fn running_minimum(&self) -> Vec<f64> {
        self.observations
            .iter()
            .scan(f64::INFINITY, |best, obs| {
                *best = best.min(obs.value);
                Some(*best)
            })
            .collect()
    }

    /// Spherical rows, in order.
    #[must_use]
    pub fn spherical_inputs(&self) -> Vec<Vec<f64>> {
        self.observations
            .iter()
            .map(|o| o.spherical.clone())
            .collect()
    }

    /// Euclidean rows, in order.
    #[must_use]
    pub fn euclidean_inputs(&self) -> Vec<Vec<f64>> {
        self.observations
            .iter()
            .map(|o| o.euclidean.clone())
            .collect()
    }

    /// Objective values, in order.
    #[must_use]
    pub fn values(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.value).collect()
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Observation;
    type IntoIter = core::slice::Iter<'a, Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.observations.iter()
    }
}
