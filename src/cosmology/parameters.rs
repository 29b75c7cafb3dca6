use crate::utils::{GravityError, HighPrecision, QuadratureConfig, DEFAULT_HUBBLE, DRIFT_TABLE_LENGTH, TIMEBASE};

/// Parameters of the background expansion history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cosmology {
    /// Matter density parameter Ω_m.
    pub omega0: f64,
    /// Dark-energy density parameter Ω_Λ.
    pub omega_lambda: f64,
    /// Hubble constant in internal units.
    pub hubble: f64,
    /// Adiabatic index of the gas.
    pub gamma: f64,
}

impl Default for Cosmology {
    fn default() -> Self {
        Self {
            omega0: 0.3,
            omega_lambda: 0.7,
            hubble: DEFAULT_HUBBLE,
            gamma: 5.0 / 3.0,
        }
    }
}

impl Cosmology {
    /// Builds a parameter set, falling back to the defaults for every `None`.
    ///
    /// # Example
    /// ```
    /// use rs_gravity::cosmology::Cosmology;
    ///
    /// let eds = Cosmology::new(Some(1.0), Some(0.0), None, None);
    /// assert_eq!(eds.curvature(), 0.0);
    /// ```
    pub fn new(omega0: Option<f64>, omega_lambda: Option<f64>, hubble: Option<f64>, gamma: Option<f64>) -> Self {
        let default = Self::default();
        Self {
            omega0: omega0.unwrap_or(default.omega0),
            omega_lambda: omega_lambda.unwrap_or(default.omega_lambda),
            hubble: hubble.unwrap_or(default.hubble),
            gamma: gamma.unwrap_or(default.gamma),
        }
    }

    pub fn validate(&self) -> Result<(), GravityError> {
        let values = [self.omega0, self.omega_lambda, self.hubble, self.gamma];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(GravityError::InvalidParameter("cosmological parameters must be finite".to_string()));
        }
        if self.omega0 < 0.0 {
            return Err(GravityError::InvalidParameter(format!("omega0 must be non-negative, got {}", self.omega0)));
        }
        if self.hubble <= 0.0 {
            return Err(GravityError::InvalidParameter(format!("hubble must be positive, got {}", self.hubble)));
        }
        if self.gamma < 1.0 {
            return Err(GravityError::InvalidParameter(format!("gamma must be at least 1, got {}", self.gamma)));
        }
        Ok(())
    }

    /// Curvature density 1 − Ω_m − Ω_Λ.
    pub fn curvature(&self) -> f64 {
        1.0 - self.omega0 - self.omega_lambda
    }

    /// H(a) = H0·sqrt(Ω_m/a³ + Ω_k/a² + Ω_Λ).
    pub fn hubble_rate(&self, a: f64) -> f64 {
        let e2 = self.omega0 / (a * a * a) + self.curvature() / (a * a) + self.omega_lambda;
        self.hubble * e2.sqrt()
    }
}

/// Time range and resolution of the integer timeline.
#[derive(Debug, Clone, Copy)]
pub struct TimelineParameters<T> {
    /// Scale factor at the start of the run.
    pub time_begin: T,
    /// Scale factor at the end of the run.
    pub time_max: T,
    /// Log-time covered by one integer tick.
    pub timebase_interval: T,
    pub table_length: usize,
    pub quadrature: QuadratureConfig,
}

impl<T: HighPrecision> TimelineParameters<T> {
    /// Comoving timeline spanning `[time_begin, time_max]` in `TIMEBASE` ticks.
    pub fn comoving(time_begin: T, time_max: T) -> Result<Self, GravityError> {
        if !(time_begin > T::zero()) || !(time_max > time_begin) {
            return Err(GravityError::InvalidParameter(format!(
                "require 0 < time_begin < time_max, got {:?} and {:?}",
                time_begin, time_max
            )));
        }
        let timebase_interval = (time_max.ln() - time_begin.ln()) / T::from_int(TIMEBASE);
        let timeline = Self {
            time_begin,
            time_max,
            timebase_interval,
            table_length: DRIFT_TABLE_LENGTH,
            quadrature: QuadratureConfig::default(),
        };
        timeline.validate()?;
        Ok(timeline)
    }

    pub fn with_table_length(mut self, table_length: usize) -> Self {
        self.table_length = table_length;
        self
    }

    pub fn with_timebase_interval(mut self, timebase_interval: T) -> Self {
        self.timebase_interval = timebase_interval;
        self
    }

    pub fn validate(&self) -> Result<(), GravityError> {
        if !(self.time_begin > T::zero()) || !(self.time_max > self.time_begin) {
            return Err(GravityError::InvalidParameter(format!(
                "require 0 < time_begin < time_max, got {:?} and {:?}",
                self.time_begin, self.time_max
            )));
        }
        if !(self.timebase_interval > T::zero()) {
            return Err(GravityError::InvalidParameter("timebase_interval must be positive".to_string()));
        }
        if self.table_length < 2 {
            return Err(GravityError::InvalidParameter(format!(
                "table_length must be at least 2, got {}",
                self.table_length
            )));
        }
        Ok(())
    }
}
