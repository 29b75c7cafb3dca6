// src/cosmology/factor_cache.rs

use std::time::Instant;
use log::{debug, info};
use rayon::prelude::*;
use crate::cosmology::{drift_kernel, gravkick_kernel, hydrokick_kernel, Cosmology, TimelineParameters};
use crate::utils::{integrate_adaptive, GravityError, HighPrecision};

/// Which of the three tables a query interpolates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactorKind {
    Drift,
    GravKick,
    HydroKick,
}

/// Lookup tables of cumulative drift and kick integrals over log-time.
///
/// Entry `i` of each table holds the integral of its kernel from the start
/// of the run to the upper bound of bin `i`, i.e. up to
/// `exp(log_begin + (log_max - log_begin) * (i + 1) / table_length)`.
/// The tables are built once and never change afterwards.
///
/// Factors are only meaningful for comoving integration; non-comoving runs
/// advance with the plain timestep and must not query the cache.
#[derive(Debug, Clone)]
pub struct CosmologicalFactorCache<T> {
    log_time_begin: T,
    log_time_max: T,
    timebase_interval: T,
    drift: Vec<T>,
    gravkick: Vec<T>,
    hydrokick: Vec<T>,
}

impl<T: HighPrecision> CosmologicalFactorCache<T> {
    /// Integrates the three kernels for every table bin.
    ///
    /// # Errors
    /// Fails if the parameters are invalid or any quadrature does not reach
    /// its tolerance; the cache is then unusable for the whole run.
    pub fn init(cosmology: &Cosmology, timeline: &TimelineParameters<T>) -> Result<Self, GravityError> {
        cosmology.validate()?;
        timeline.validate()?;

        let start = Instant::now();
        let log_time_begin = timeline.time_begin.ln();
        let log_time_max = timeline.time_max.ln();
        let length = timeline.table_length;
        let bin_width = (log_time_max - log_time_begin) / T::from_int(length as i64);
        let lower = log_time_begin.exp().to_approx();

        info!(
            "Building drift/kick tables with {} bins for a in [{:?}, {:?}]",
            length, timeline.time_begin, timeline.time_max
        );

        let rows: Vec<(T, T, T)> = (0..length)
            .into_par_iter()
            .map(|i| -> Result<(T, T, T), GravityError> {
                let upper = (log_time_begin + bin_width * T::from_int(i as i64 + 1)).exp().to_approx();
                let drift = integrate_adaptive(|a| drift_kernel(cosmology, a), lower, upper, &timeline.quadrature)?;
                let gravkick = integrate_adaptive(|a| gravkick_kernel(cosmology, a), lower, upper, &timeline.quadrature)?;
                let hydrokick = integrate_adaptive(|a| hydrokick_kernel(cosmology, a), lower, upper, &timeline.quadrature)?;
                Ok((
                    T::from_approx(drift.value),
                    T::from_approx(gravkick.value),
                    T::from_approx(hydrokick.value),
                ))
            })
            .collect::<Result<Vec<_>, GravityError>>()?;

        let mut drift = Vec::with_capacity(length);
        let mut gravkick = Vec::with_capacity(length);
        let mut hydrokick = Vec::with_capacity(length);
        for (d, g, h) in rows {
            drift.push(d);
            gravkick.push(g);
            hydrokick.push(h);
        }

        debug!("drift/kick tables built in {:?}", start.elapsed());

        Ok(Self {
            log_time_begin,
            log_time_max,
            timebase_interval: timeline.timebase_interval,
            drift,
            gravkick,
            hydrokick,
        })
    }

    pub fn table_length(&self) -> usize {
        self.drift.len()
    }

    pub fn table(&self, kind: FactorKind) -> &[T] {
        match kind {
            FactorKind::Drift => &self.drift,
            FactorKind::GravKick => &self.gravkick,
            FactorKind::HydroKick => &self.hydrokick,
        }
    }

    /// Drift prefactor `∫ da / (H a³)` between two integer timesteps.
    ///
    /// # Example
    /// ```
    /// use rs_gravity::cosmology::{CosmologicalFactorCache, Cosmology, TimelineParameters};
    ///
    /// let timeline = TimelineParameters::comoving(0.1_f64, 1.0).unwrap().with_table_length(64);
    /// let cache = CosmologicalFactorCache::init(&Cosmology::default(), &timeline).unwrap();
    /// assert_eq!(cache.drift_factor(1 << 20, 1 << 20), 0.0);
    /// assert!(cache.drift_factor(0, 1 << 27) > 0.0);
    /// ```
    pub fn drift_factor(&self, time0: i64, time1: i64) -> T {
        self.factor(FactorKind::Drift, time0, time1)
    }

    /// Gravitational kick prefactor `∫ da / (H a²)` between two integer timesteps.
    pub fn gravkick_factor(&self, time0: i64, time1: i64) -> T {
        self.factor(FactorKind::GravKick, time0, time1)
    }

    /// Hydrodynamical kick prefactor between two integer timesteps.
    pub fn hydrokick_factor(&self, time0: i64, time1: i64) -> T {
        self.factor(FactorKind::HydroKick, time0, time1)
    }

    pub fn factor(&self, kind: FactorKind, time0: i64, time1: i64) -> T {
        let table = self.table(kind);
        self.interpolate(table, time1) - self.interpolate(table, time0)
    }

    /// Cumulative integral at an integer timestep.
    ///
    /// The bin index is clamped to the last bin. Indices 0 and 1 scale the
    /// first entry linearly from zero instead of interpolating between two bins.
    fn interpolate(&self, table: &[T], time: i64) -> T {
        let length = table.len();
        let log_a = self.log_time_begin + T::from_int(time) * self.timebase_interval;
        let u = (log_a - self.log_time_begin) / (self.log_time_max - self.log_time_begin) * T::from_int(length as i64);

        let i = u.trunc_to_int().min(length as i64 - 1);
        if i <= 1 {
            u * table[0]
        } else {
            let i = i as usize;
            table[i - 1] + (table[i] - table[i - 1]) * (u - T::from_int(i as i64))
        }
    }
}
