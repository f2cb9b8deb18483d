use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::types::Rect;
use crate::error::{ChartError, ChartResult};
use crate::render::{Font, TextMeasure};

/// Minimal value span a degenerate numeric range is expanded to.
const MIN_NUMERIC_SPAN: f64 = 1.0;
/// Minimal time span in seconds; anything under 10 ms is nudged up.
const MIN_TIME_SPAN: f64 = 0.01;
/// Extra pixels reserved around each label so neighbors never touch.
const LABEL_GAP_PX: f64 = 8.0;

/// Canonical mantissa ladder for numeric interval selection.
const NICE_MULTIPLIERS: [f64; 3] = [1.0, 2.0, 5.0];

/// Calendar-unit ladder for time-domain interval selection, in seconds,
/// paired with the strftime format appropriate at that granularity.
const TIME_LADDER: [(f64, &str); 20] = [
    (1.0, "%H:%M:%S"),
    (2.0, "%H:%M:%S"),
    (5.0, "%H:%M:%S"),
    (10.0, "%H:%M:%S"),
    (15.0, "%H:%M:%S"),
    (30.0, "%H:%M:%S"),
    (60.0, "%H:%M"),
    (120.0, "%H:%M"),
    (300.0, "%H:%M"),
    (600.0, "%H:%M"),
    (900.0, "%H:%M"),
    (1800.0, "%H:%M"),
    (3600.0, "%H:%M"),
    (7200.0, "%H:%M"),
    (10800.0, "%H:%M"),
    (21600.0, "%H:%M"),
    (43200.0, "%H:%M"),
    (86400.0, "%d %b"),
    (172_800.0, "%d %b"),
    (604_800.0, "%d %b"),
];

/// How the label interval is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum IntervalMode {
    /// Pick the smallest nice interval whose labels fit the pixel extent.
    #[default]
    Auto,
    /// Caller-forced interval in value units.
    Fixed(f64),
    /// Caller-forced label count; interval is span / (count - 1).
    FixedCount(usize),
}

/// One generated axis label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleLabel {
    pub text: String,
    pub value: f64,
    /// Position along the scale region, in pixels from the region start.
    pub position_px: f64,
    /// Measured layout rectangle, positioned by the owning axis.
    pub rect: Rect,
}

/// Serializable scale configuration and bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleConfig {
    pub vertical: bool,
    pub inverted: bool,
    pub logarithmic: bool,
    pub log_base: f64,
    pub time_domain: bool,
    pub time_format: String,
    /// When set, the time format is never replaced by ladder selection.
    pub fixed_time_format: bool,
    pub fixed_decimals: Option<usize>,
    pub interval: IntervalMode,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            vertical: false,
            inverted: false,
            logarithmic: false,
            log_base: 10.0,
            time_domain: false,
            time_format: "%H:%M".to_owned(),
            fixed_time_format: false,
            fixed_decimals: None,
            interval: IntervalMode::Auto,
        }
    }
}

/// Numeric/time/log axis mathematics: bounds handling, nice-interval
/// selection, label generation, and value<->pixel mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct Scale {
    config: ScaleConfig,
    min: f64,
    max: f64,
    size_px: f64,
    labels: Vec<ScaleLabel>,
}

impl Scale {
    #[must_use]
    pub fn new(config: ScaleConfig) -> Self {
        let (min, max) = default_bounds(config.time_domain);
        Self {
            config,
            min,
            max,
            size_px: 0.0,
            labels: Vec::new(),
        }
    }

    #[must_use]
    pub fn horizontal() -> Self {
        Self::new(ScaleConfig::default())
    }

    #[must_use]
    pub fn vertical() -> Self {
        Self::new(ScaleConfig {
            vertical: true,
            ..ScaleConfig::default()
        })
    }

    #[must_use]
    pub fn config(&self) -> &ScaleConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ScaleConfig {
        &mut self.config
    }

    #[must_use]
    pub fn bounds(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    #[must_use]
    pub fn size_px(&self) -> f64 {
        self.size_px
    }

    pub fn set_size_px(&mut self, size_px: f64) -> ChartResult<()> {
        if !size_px.is_finite() || size_px < 0.0 {
            return Err(ChartError::InvalidData(
                "scale pixel size must be finite and >= 0".to_owned(),
            ));
        }
        self.size_px = size_px;
        Ok(())
    }

    /// Applies new bounds, nudging degenerate or non-finite input to a
    /// usable span (see [`normalize_bounds`]).
    pub fn set_bounds(&mut self, min: f64, max: f64) {
        let (min, max) = normalize_bounds(min, max, self.config.time_domain);
        self.min = min;
        self.max = max;
    }

    #[must_use]
    pub fn labels(&self) -> &[ScaleLabel] {
        &self.labels
    }

    /// Pixels per value unit over the current region.
    ///
    /// For logarithmic scales the unit is one log-base step.
    #[must_use]
    pub fn calculate_scale(&self, max: f64, min: f64) -> f64 {
        let (min, max) = normalize_bounds(min, max, self.config.time_domain);
        let span = if self.config.logarithmic {
            log_of(max, self.config.log_base) - log_of(min, self.config.log_base)
        } else {
            max - min
        };
        if span == 0.0 {
            return 0.0;
        }
        self.size_px / span
    }

    /// Maps a value to its pixel position inside the scale region.
    ///
    /// Horizontal scales grow rightward, vertical scales grow upward in
    /// value (downward in pixel Y); `inverted` flips either direction.
    #[must_use]
    pub fn value_to_pos(&self, value: f64) -> f64 {
        let mut t = self.normalized(value);
        if self.config.inverted {
            t = 1.0 - t;
        }
        if self.config.vertical {
            (1.0 - t) * self.size_px
        } else {
            t * self.size_px
        }
    }

    /// Inverse of [`Scale::value_to_pos`].
    #[must_use]
    pub fn pos_to_value(&self, pos: f64) -> f64 {
        if self.size_px == 0.0 {
            return self.min;
        }
        let mut t = if self.config.vertical {
            1.0 - pos / self.size_px
        } else {
            pos / self.size_px
        };
        if self.config.inverted {
            t = 1.0 - t;
        }
        self.denormalized(t)
    }

    /// Converts a pixel padding at one end of the region into value space
    /// by evaluating the mapping's local derivative at that boundary.
    ///
    /// Returns a non-negative value delta.
    #[must_use]
    pub fn offset_to_value_delta(&self, offset_px: f64, at_max_edge: bool) -> f64 {
        if !offset_px.is_finite() || offset_px == 0.0 || self.size_px <= 0.0 {
            return 0.0;
        }
        let edge_value = if at_max_edge { self.max } else { self.min };
        let edge_pos = self.value_to_pos(edge_value);
        // Step outward in pixel space and measure the value distance covered.
        let probe = self.pos_to_value(edge_pos + offset_px.abs());
        let alt = self.pos_to_value(edge_pos - offset_px.abs());
        (probe - edge_value).abs().max((alt - edge_value).abs())
    }

    /// Generates the ordered label list for `[min, max]`.
    ///
    /// Interval selection draws from {1,2,5}x10^n (numeric), the calendar
    /// ladder (time domain), or powers of `log_base` (logarithmic), picked
    /// so the measured labels fit the region. A fixed interval or fixed
    /// label count bypasses auto-selection.
    pub fn generate_labels(
        &mut self,
        max: f64,
        min: f64,
        measure: &dyn TextMeasure,
        font: &Font,
    ) -> ChartResult<&[ScaleLabel]> {
        self.set_bounds(min, max);
        self.labels.clear();

        if self.size_px <= 0.0 {
            return Ok(&self.labels);
        }

        if self.config.logarithmic {
            self.generate_log_labels(measure, font)?;
        } else if self.config.time_domain {
            self.generate_time_labels(measure, font)?;
        } else {
            self.generate_numeric_labels(measure, font)?;
        }

        Ok(&self.labels)
    }

    /// Pixel positions for `count` minor ticks between each adjacent pair
    /// of major labels. Pairs whose resulting spacing would fall under
    /// `min_pixel_width` produce no ticks.
    #[must_use]
    pub fn generate_minor_ticks(&self, min_pixel_width: f64, count: usize) -> Vec<f64> {
        if count == 0 || self.labels.len() < 2 {
            return Vec::new();
        }

        let mut ticks = Vec::new();
        for pair in self.labels.windows(2) {
            let start = pair[0].position_px;
            let end = pair[1].position_px;
            let step = (end - start) / (count + 1) as f64;
            if step.abs() < min_pixel_width {
                continue;
            }
            for index in 1..=count {
                ticks.push(start + step * index as f64);
            }
        }
        ticks
    }

    fn normalized(&self, value: f64) -> f64 {
        if self.config.logarithmic {
            let base = self.config.log_base;
            let log_min = log_of(self.min, base);
            let log_max = log_of(self.max, base);
            let span = log_max - log_min;
            if span == 0.0 {
                return 0.0;
            }
            (log_of(value, base) - log_min) / span
        } else {
            let span = self.max - self.min;
            if span == 0.0 {
                return 0.0;
            }
            (value - self.min) / span
        }
    }

    fn denormalized(&self, t: f64) -> f64 {
        if self.config.logarithmic {
            let base = self.config.log_base;
            let log_min = log_of(self.min, base);
            let log_max = log_of(self.max, base);
            base.powf(log_min + t * (log_max - log_min))
        } else {
            self.min + t * (self.max - self.min)
        }
    }

    fn generate_numeric_labels(
        &mut self,
        measure: &dyn TextMeasure,
        font: &Font,
    ) -> ChartResult<()> {
        let span = self.max - self.min;
        let interval = match self.config.interval {
            IntervalMode::Fixed(interval) => validate_fixed_interval(interval)?,
            IntervalMode::FixedCount(count) => span / (count.max(2) - 1) as f64,
            IntervalMode::Auto => {
                self.select_numeric_interval(span, measure, font)?
            }
        };

        let decimals = self.numeric_decimals(interval);
        let first = (self.min / interval).ceil() * interval;
        let mut value = first;
        // Tiny overshoot tolerance keeps the top label when
        // floating-point drift lands it just past max.
        while value <= self.max + interval * 1e-9 {
            self.push_label(format_numeric(value, decimals), value, measure, font);
            value += interval;
        }
        Ok(())
    }

    fn select_numeric_interval(
        &self,
        span: f64,
        measure: &dyn TextMeasure,
        font: &Font,
    ) -> ChartResult<f64> {
        let exponent_low = (span.log10().floor() as i32) - 2;
        let exponent_high = (span.log10().ceil() as i32) + 1;

        for exponent in exponent_low..=exponent_high {
            for multiplier in NICE_MULTIPLIERS {
                let candidate = multiplier * 10_f64.powi(exponent);
                if !candidate.is_finite() || candidate <= 0.0 {
                    continue;
                }
                let count = (span / candidate).floor() as usize + 1;
                if count < 2 {
                    continue;
                }
                if self.labels_fit(candidate, count, measure, font) {
                    return Ok(candidate);
                }
            }
        }

        // Nothing fits: fall back to the full span (two end labels).
        Ok(span)
    }

    fn generate_time_labels(&mut self, measure: &dyn TextMeasure, font: &Font) -> ChartResult<()> {
        let span = self.max - self.min;
        let (interval, ladder_format) = match self.config.interval {
            IntervalMode::Fixed(interval) => {
                (validate_fixed_interval(interval)?, ladder_format_for(interval))
            }
            IntervalMode::FixedCount(count) => {
                let interval = span / (count.max(2) - 1) as f64;
                (interval, ladder_format_for(interval))
            }
            IntervalMode::Auto => self.select_time_interval(span, measure, font),
        };

        if !self.config.fixed_time_format {
            self.config.time_format = ladder_format.to_owned();
        }
        let format = self.config.time_format.clone();

        let first = (self.min / interval).ceil() * interval;
        let mut value = first;
        while value <= self.max + interval * 1e-9 {
            let text = format_time(value, &format);
            self.push_label(text, value, measure, font);
            value += interval;
        }
        Ok(())
    }

    fn select_time_interval(
        &self,
        span: f64,
        measure: &dyn TextMeasure,
        font: &Font,
    ) -> (f64, &'static str) {
        for (interval, format) in TIME_LADDER {
            let count = (span / interval).floor() as usize + 1;
            if count < 2 {
                continue;
            }
            if self.labels_fit(interval, count, measure, font) {
                return (interval, format);
            }
        }

        // Beyond the ladder: multiples of one week until the count fits.
        let week = TIME_LADDER[TIME_LADDER.len() - 1].0;
        let mut interval = week;
        loop {
            let count = (span / interval).floor() as usize + 1;
            if count <= 2 || self.labels_fit(interval, count, measure, font) {
                return (interval, "%d %b");
            }
            interval += week;
        }
    }

    fn generate_log_labels(&mut self, measure: &dyn TextMeasure, font: &Font) -> ChartResult<()> {
        let base = self.config.log_base;
        if !(base.is_finite() && base > 1.0) {
            return Err(ChartError::InvalidData(
                "log base must be finite and > 1".to_owned(),
            ));
        }
        if self.min <= 0.0 || self.max <= 0.0 {
            return Err(ChartError::InvalidData(
                "logarithmic scale requires bounds > 0".to_owned(),
            ));
        }

        let low = log_of(self.min, base).floor() as i32;
        let high = log_of(self.max, base).ceil() as i32;
        let total = (high - low).max(1) as usize + 1;

        // Step whole powers; widen the stride until the labels fit.
        let mut stride = 1usize;
        while stride < total && !self.labels_fit_count(total.div_ceil(stride), measure, font) {
            stride += 1;
        }

        let decimals = self.config.fixed_decimals.unwrap_or(0);
        let mut exponent = low;
        while exponent <= high {
            let value = base.powi(exponent);
            if value >= self.min * (1.0 - 1e-12) && value <= self.max * (1.0 + 1e-12) {
                self.push_label(format_numeric(value, decimals), value, measure, font);
            }
            exponent += stride as i32;
        }
        Ok(())
    }

    fn labels_fit(
        &self,
        interval: f64,
        count: usize,
        measure: &dyn TextMeasure,
        font: &Font,
    ) -> bool {
        let sample_a = self.sample_label_text(self.min, interval);
        let sample_b = self.sample_label_text(self.max, interval);
        let extent_a = self.label_extent(&sample_a, measure, font);
        let extent_b = self.label_extent(&sample_b, measure, font);
        let per_label = extent_a.max(extent_b) + LABEL_GAP_PX;
        (count as f64) * per_label <= self.size_px
    }

    fn labels_fit_count(&self, count: usize, measure: &dyn TextMeasure, font: &Font) -> bool {
        let sample = self.sample_label_text(self.max, self.max.abs().max(1.0));
        let per_label = self.label_extent(&sample, measure, font) + LABEL_GAP_PX;
        (count as f64) * per_label <= self.size_px
    }

    fn sample_label_text(&self, value: f64, interval: f64) -> String {
        if self.config.time_domain && !self.config.logarithmic {
            format_time(value, ladder_format_for(interval))
        } else {
            format_numeric(value, self.numeric_decimals(interval))
        }
    }

    fn label_extent(&self, text: &str, measure: &dyn TextMeasure, font: &Font) -> f64 {
        let rect = measure.measure_text(text, font, 0.0);
        if self.config.vertical {
            rect.height
        } else {
            rect.width
        }
    }

    fn numeric_decimals(&self, interval: f64) -> usize {
        if let Some(precision) = self.config.fixed_decimals {
            return precision;
        }
        if !interval.is_finite() || interval <= 0.0 {
            return 0;
        }
        let magnitude = interval.log10().floor();
        if magnitude >= 0.0 {
            0
        } else {
            (-magnitude) as usize
        }
    }

    fn push_label(&mut self, text: String, value: f64, measure: &dyn TextMeasure, font: &Font) {
        let position_px = self.value_to_pos(value);
        let measured = measure.measure_text(&text, font, 0.0);
        self.labels.push(ScaleLabel {
            text,
            value,
            position_px,
            rect: Rect::new(0.0, 0.0, measured.width, measured.height),
        });
    }
}

/// Expands degenerate or non-finite bounds to a usable span.
///
/// Non-finite input falls back to the domain default: [-0.5, 0.5] for
/// numeric scales and the most recent one-hour window for time scales.
#[must_use]
pub fn normalize_bounds(min: f64, max: f64, time_domain: bool) -> (f64, f64) {
    if !min.is_finite() || !max.is_finite() {
        return default_bounds(time_domain);
    }

    let (min, max) = if min <= max { (min, max) } else { (max, min) };
    let span = max - min;

    if time_domain {
        if span < MIN_TIME_SPAN {
            let mid = min + span * 0.5;
            return (mid - MIN_TIME_SPAN * 0.5, mid + MIN_TIME_SPAN * 0.5);
        }
        return (min, max);
    }

    if span == 0.0 {
        return (min - MIN_NUMERIC_SPAN * 0.5, max + MIN_NUMERIC_SPAN * 0.5);
    }
    (min, max)
}

fn default_bounds(time_domain: bool) -> (f64, f64) {
    if time_domain {
        let now = datetime_to_seconds(Utc::now());
        (now - 3600.0, now)
    } else {
        (-0.5, 0.5)
    }
}

fn validate_fixed_interval(interval: f64) -> ChartResult<f64> {
    if !interval.is_finite() || interval <= 0.0 {
        return Err(ChartError::InvalidData(
            "fixed label interval must be finite and > 0".to_owned(),
        ));
    }
    Ok(interval)
}

fn ladder_format_for(interval: f64) -> &'static str {
    for (step, format) in TIME_LADDER.iter().rev() {
        if interval >= *step {
            return format;
        }
    }
    TIME_LADDER[0].1
}

fn log_of(value: f64, base: f64) -> f64 {
    value.ln() / base.ln()
}

fn format_numeric(value: f64, decimals: usize) -> String {
    // Avoid "-0" style output for values rounded to zero.
    let rounded = if value == 0.0 { 0.0 } else { value };
    format!("{rounded:.decimals$}")
}

fn format_time(unix_seconds: f64, format: &str) -> String {
    match seconds_to_datetime(unix_seconds) {
        Some(stamp) => stamp.format(format).to_string(),
        None => String::new(),
    }
}

fn seconds_to_datetime(unix_seconds: f64) -> Option<DateTime<Utc>> {
    if !unix_seconds.is_finite() {
        return None;
    }
    let seconds = unix_seconds.floor() as i64;
    let nanos = ((unix_seconds - unix_seconds.floor()) * 1_000_000_000.0) as u32;
    DateTime::<Utc>::from_timestamp(seconds, nanos)
}

fn datetime_to_seconds(value: DateTime<Utc>) -> f64 {
    value.timestamp() as f64 + f64::from(value.timestamp_subsec_millis()) / 1_000.0
}
