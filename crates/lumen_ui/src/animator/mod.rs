//! Time-driven property animation.
//!
//! An [`Animator`] lives in a node attached as a child of the node it animates
//! (its owner). Every frame the tree steps its clock, evaluates its waveform and
//! writes the result into one [`Facet`] of the owner.
//!
//! ```text
//!   Delayed ──(delay elapsed)──▶ Active ──(timer·|speed| > periods)──▶ Expired
//! ```
//!
//! `Expired` is latched: only [`Animator::reset`] or reconfiguring the clock
//! brings an animator back.

mod facet;
mod quantize;
mod waveform;

pub use facet::{to_byte, Facet, WritePolicy};
pub use quantize::{quantize, Rounding};
pub use waveform::{frac, SpeedPolicy, Waveform};

use std::fmt;

use lumen_core::NodeId;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::warn;

use crate::config::AnimatorDefaults;
use crate::error::ConfigError;
use crate::node::Node;
use crate::property::{format_bool, invalid, parse_bool, parse_f32};
use crate::tree::NodeTree;

/// User waveform: receives the animator and the (possibly frozen) time.
pub type CustomFn = Box<dyn Fn(&Animator, f32) -> f32>;

/// Hover presence test: receives the tree and the owner id.
pub type PresenceFn = Box<dyn Fn(&NodeTree, NodeId) -> bool>;

/// Lifecycle phase of an animator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimatorState {
    /// Waiting for the start delay to elapse.
    Delayed,
    /// Running.
    Active,
    /// Past its last period. Sticky.
    Expired,
}

/// Transitions that happened during one [`Animator::step`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepEvents {
    /// The start delay ran out this step.
    pub delay_ended: bool,
    /// The animator expired this step.
    pub expired: bool,
}

/// Waveform-driven writer of one owner facet.
pub struct Animator {
    facet: Facet,
    policy: WritePolicy,
    waveform: Waveform,
    enabled: bool,
    state: AnimatorState,
    timer: f32,
    delay: f32,
    initial_delay: f32,
    periods: f32,
    amplitude: f32,
    speed: f32,
    offset: f32,
    acceleration: f32,
    discrete_step: f32,
    rounding: Rounding,
    reset_on_expire: bool,
    inherit_value: bool,
    target: Option<f32>,
    value: f32,
    last_dt: f32,
    custom: Option<CustomFn>,
    presence: Option<PresenceFn>,
    rng: StdRng,
}

impl Animator {
    /// Creates an animator for `facet` with the built-in defaults.
    #[must_use]
    pub fn new(facet: Facet) -> Self {
        Self::from_defaults(facet, &AnimatorDefaults::default())
    }

    /// Creates an animator for `facet` using configured defaults.
    #[must_use]
    pub fn from_defaults(facet: Facet, defaults: &AnimatorDefaults) -> Self {
        Self {
            policy: facet.default_policy(),
            facet,
            waveform: Waveform::Linear,
            enabled: true,
            state: AnimatorState::Active,
            timer: 0.0,
            delay: 0.0,
            initial_delay: 0.0,
            periods: defaults.periods,
            amplitude: defaults.amplitude,
            speed: defaults.speed,
            offset: 0.0,
            acceleration: 0.0,
            discrete_step: 0.0,
            rounding: Rounding::Floor,
            reset_on_expire: false,
            inherit_value: false,
            target: None,
            value: 0.0,
            last_dt: 0.0,
            custom: None,
            presence: None,
            rng: StdRng::from_entropy(),
        }
    }

    /// Sets the waveform.
    #[must_use]
    pub fn with_waveform(mut self, waveform: Waveform) -> Self {
        self.set_waveform(waveform);
        self
    }

    /// Sets the start delay.
    #[must_use]
    pub fn with_delay(mut self, delay: f32) -> Self {
        self.set_delay(delay);
        self
    }

    /// Sets the period count (negative runs forever).
    #[must_use]
    pub fn with_periods(mut self, periods: f32) -> Self {
        self.set_periods(periods);
        self
    }

    /// Sets the amplitude.
    #[must_use]
    pub fn with_amplitude(mut self, amplitude: f32) -> Self {
        self.amplitude = amplitude;
        self
    }

    /// Sets the speed.
    #[must_use]
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// Sets the offset added to the waveform output.
    #[must_use]
    pub fn with_offset(mut self, offset: f32) -> Self {
        self.offset = offset;
        self
    }

    /// Sets the acceleration applied to `speed`.
    #[must_use]
    pub fn with_acceleration(mut self, acceleration: f32) -> Self {
        self.acceleration = acceleration;
        self
    }

    /// Enables quantization to multiples of `step`.
    #[must_use]
    pub fn with_discrete(mut self, step: f32, rounding: Rounding) -> Self {
        self.discrete_step = step.max(0.0);
        self.rounding = rounding;
        self
    }

    /// Snap back to `offset` once expired.
    #[must_use]
    pub fn with_reset_on_expire(mut self, reset: bool) -> Self {
        self.reset_on_expire = reset;
        self
    }

    /// Capture the owner's facet value on attach.
    #[must_use]
    pub fn with_inherit_value(mut self, inherit: bool) -> Self {
        self.inherit_value = inherit;
        self
    }

    /// Converge onto `target` (implies value inheritance).
    #[must_use]
    pub fn with_target(mut self, target: f32) -> Self {
        self.target = Some(target);
        self.inherit_value = true;
        self
    }

    /// Overrides the write policy.
    #[must_use]
    pub fn with_policy(mut self, policy: WritePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Installs a custom waveform function and switches to [`Waveform::Custom`].
    #[must_use]
    pub fn with_custom(mut self, f: impl Fn(&Animator, f32) -> f32 + 'static) -> Self {
        self.custom = Some(Box::new(f));
        self.set_waveform(Waveform::Custom);
        self
    }

    /// Replaces the cursor-over-owner test used by hover.
    #[must_use]
    pub fn with_presence(mut self, f: impl Fn(&NodeTree, NodeId) -> bool + 'static) -> Self {
        self.presence = Some(Box::new(f));
        self
    }

    /// Seeds the noise generator.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Driven facet.
    #[must_use]
    pub fn facet(&self) -> &Facet {
        &self.facet
    }

    /// Write-back policy.
    #[must_use]
    pub fn policy(&self) -> WritePolicy {
        self.policy
    }

    /// Waveform kind.
    #[must_use]
    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> AnimatorState {
        self.state
    }

    /// Elapsed active time.
    #[must_use]
    pub fn timer(&self) -> f32 {
        self.timer
    }

    /// Remaining start delay.
    #[must_use]
    pub fn delay(&self) -> f32 {
        self.delay
    }

    /// Period count.
    #[must_use]
    pub fn periods(&self) -> f32 {
        self.periods
    }

    /// Amplitude.
    #[must_use]
    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    /// Current speed (changes under acceleration).
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Offset.
    #[must_use]
    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// Last written value.
    #[must_use]
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Time step of the last active frame.
    #[must_use]
    pub fn last_dt(&self) -> f32 {
        self.last_dt
    }

    /// Convergence target, if any.
    #[must_use]
    pub fn target(&self) -> Option<f32> {
        self.target
    }

    /// Whether the clock runs.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether `reset_on_expire` is set.
    #[must_use]
    pub fn resets_on_expire(&self) -> bool {
        self.reset_on_expire
    }

    /// True while the animator is producing values.
    #[must_use]
    pub fn is_animated(&self) -> bool {
        self.enabled && (self.waveform == Waveform::Hover || self.state == AnimatorState::Active)
    }

    /// True once the animator has run past its last period.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.state == AnimatorState::Expired
    }

    /// Enables or disables the clock. Takes effect on the next step.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Changes the waveform and re-derives the state.
    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
        self.refresh_state();
    }

    /// Sets both the configured and the remaining delay.
    pub fn set_delay(&mut self, delay: f32) {
        self.initial_delay = delay;
        self.delay = delay;
        self.refresh_state();
    }

    /// Sets the elapsed time.
    pub fn set_timer(&mut self, timer: f32) {
        self.timer = timer;
        self.refresh_state();
    }

    /// Sets the period count.
    pub fn set_periods(&mut self, periods: f32) {
        self.periods = periods;
        self.refresh_state();
    }

    /// Overwrites the stored value (hover pursues from here).
    pub fn set_value(&mut self, value: f32) {
        self.value = value;
    }

    /// Rewinds the clock: timer 0, full delay, state re-derived.
    pub fn reset(&mut self) {
        self.timer = 0.0;
        self.delay = self.initial_delay;
        self.refresh_state();
    }

    fn past_last_period(&self) -> bool {
        self.waveform.expires() && self.periods >= 0.0 && self.timer * self.speed.abs() > self.periods
    }

    fn refresh_state(&mut self) {
        self.state = if self.delay > 0.0 {
            AnimatorState::Delayed
        } else if self.past_last_period() {
            AnimatorState::Expired
        } else {
            AnimatorState::Active
        };
    }

    /// Advances the clock by `dt`.
    ///
    /// Acceleration is integrated only when its magnitude exceeds `epsilon`.
    /// An expired animator keeps its clock frozen.
    pub fn step(&mut self, dt: f32, epsilon: f32) -> StepEvents {
        let mut events = StepEvents::default();
        if !self.enabled {
            return events;
        }
        let mut dt = dt;
        if self.state == AnimatorState::Delayed {
            self.delay -= dt;
            if self.delay > 0.0 {
                return events;
            }
            // Carry what is left of this frame into the clock.
            dt = -self.delay;
            self.delay = 0.0;
            self.state = AnimatorState::Active;
            events.delay_ended = true;
        }
        self.last_dt = dt;
        if self.state == AnimatorState::Expired {
            return events;
        }
        self.timer += dt;
        if self.acceleration.abs() > epsilon {
            self.speed += self.acceleration * dt;
        }
        if self.past_last_period() {
            self.state = AnimatorState::Expired;
            events.expired = true;
        }
        events
    }

    fn effective_speed(&self) -> f32 {
        match self.waveform.speed_policy() {
            SpeedPolicy::Signed => self.speed,
            SpeedPolicy::NonNegative => self.speed.abs(),
        }
    }

    /// Time at which an expired animator is frozen.
    fn frozen_time(&self) -> f32 {
        let speed = self.speed.abs();
        if speed > f32::EPSILON {
            self.periods / speed
        } else {
            self.timer
        }
    }

    /// Computes this frame's value. `present` feeds the hover waveform.
    pub fn compute_value(&mut self, present: bool) -> f32 {
        match self.state {
            AnimatorState::Delayed => return self.quantized(self.offset),
            AnimatorState::Expired if self.reset_on_expire => return self.quantized(self.offset),
            _ => {}
        }
        let time = if self.state == AnimatorState::Expired {
            self.frozen_time()
        } else {
            self.timer
        };
        let speed = self.effective_speed();
        let raw = match self.waveform {
            Waveform::Hover => {
                let limit = self.amplitude.abs();
                let current = self.value - self.offset;
                let stride = self.last_dt * speed;
                if present {
                    (current + stride).min(limit)
                } else {
                    (current - stride).max(-limit)
                }
            }
            Waveform::Noise => {
                let bound = (speed * self.amplitude).abs();
                if bound > 0.0 {
                    self.rng.gen_range(-bound..=bound)
                } else {
                    0.0
                }
            }
            Waveform::Custom => match &self.custom {
                Some(f) => f(self, time),
                None => self.value - self.offset,
            },
            pure => pure.evaluate(time, speed, self.amplitude).unwrap_or_default(),
        };
        self.quantized(raw + self.offset)
    }

    fn quantized(&self, value: f32) -> f32 {
        quantize(value, self.discrete_step, self.rounding)
    }

    /// Evaluates the hover presence test for `owner`.
    pub(crate) fn is_present(&self, tree: &NodeTree, owner: NodeId) -> bool {
        match &self.presence {
            Some(f) => f(tree, owner),
            None => tree.is_cursor_inside(owner),
        }
    }

    /// Writes `value` into the owner according to the write policy.
    /// Returns true if the owner changed.
    pub fn write_back(&mut self, owner: &mut Node, value: f32) -> bool {
        match self.policy {
            WritePolicy::Simple => {
                self.value = value;
                self.facet.write(owner, value)
            }
            WritePolicy::ByteClamped => {
                let value = value.clamp(0.0, 255.0);
                self.value = value;
                let byte = to_byte(value);
                if self.facet.read(owner).map(to_byte) == Some(byte) {
                    return false;
                }
                self.facet.write(owner, value)
            }
        }
    }

    /// Captures the owner's facet value when value inheritance is on.
    pub(crate) fn inherit_from(&mut self, owner: &Node) {
        if !self.inherit_value {
            return;
        }
        if let Some(current) = self.facet.read(owner) {
            self.value = current;
            self.offset = current;
            if let Some(target) = self.target {
                self.amplitude = target - current;
            }
        }
    }

    /// Applies a string property. Returns `Ok(false)` for unknown names.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for malformed values or unknown kinds.
    pub fn set_property(&mut self, name: &str, value: &str) -> Result<bool, ConfigError> {
        match name {
            "function" | "func" => self.set_waveform(value.parse()?),
            "timer" => self.set_timer(parse_f32(name, value)?),
            "delay" => self.set_delay(parse_f32(name, value)?),
            "periods" => self.set_periods(parse_f32(name, value)?),
            "amplitude" | "amp" => self.amplitude = parse_f32(name, value)?,
            "peak_to_peak" => self.amplitude = parse_f32(name, value)? * 0.5,
            "speed" => self.speed = parse_f32(name, value)?,
            "time" => {
                let time = parse_f32(name, value)?;
                if time == 0.0 {
                    return Err(invalid(name, value));
                }
                self.speed = 1.0 / time;
            }
            "offset" => self.offset = parse_f32(name, value)?,
            "dc_offset" => {
                warn!("property 'dc_offset' is deprecated, use 'offset'");
                self.offset = parse_f32(name, value)?;
            }
            "acceleration" => self.acceleration = parse_f32(name, value)?,
            "discrete_step" => {
                let step = parse_f32(name, value)?;
                if step < 0.0 {
                    return Err(invalid(name, value));
                }
                self.discrete_step = step;
            }
            "discrete_mode" => self.rounding = value.parse()?,
            "reset" => self.reset_on_expire = parse_bool(name, value)?,
            "inherit_value" => self.inherit_value = parse_bool(name, value)?,
            "target" => {
                self.target = Some(parse_f32(name, value)?);
                self.inherit_value = true;
            }
            "facet" => {
                self.facet = value.parse()?;
                self.policy = self.facet.default_policy();
            }
            "write_policy" => self.policy = value.parse()?,
            "seed" => {
                let seed = value.trim().parse::<u64>().map_err(|_| invalid(name, value))?;
                self.rng = StdRng::seed_from_u64(seed);
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Reads a string property. `None` for unknown names.
    #[must_use]
    pub fn get_property(&self, name: &str) -> Option<String> {
        Some(match name {
            "function" | "func" => self.waveform.name().to_owned(),
            "timer" => self.timer.to_string(),
            "delay" => self.delay.to_string(),
            "periods" => self.periods.to_string(),
            "amplitude" | "amp" => self.amplitude.to_string(),
            "peak_to_peak" => (self.amplitude * 2.0).to_string(),
            "speed" => self.speed.to_string(),
            "time" => (1.0 / self.speed).to_string(),
            "offset" | "dc_offset" => self.offset.to_string(),
            "acceleration" => self.acceleration.to_string(),
            "discrete_step" => self.discrete_step.to_string(),
            "discrete_mode" => self.rounding.name().to_owned(),
            "reset" => format_bool(self.reset_on_expire),
            "inherit_value" => format_bool(self.inherit_value),
            "target" => self.target?.to_string(),
            "facet" => self.facet.to_string(),
            "write_policy" => self.policy.name().to_owned(),
            "value" => self.value.to_string(),
            _ => return None,
        })
    }
}

impl fmt::Debug for Animator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Animator")
            .field("facet", &self.facet)
            .field("waveform", &self.waveform)
            .field("state", &self.state)
            .field("enabled", &self.enabled)
            .field("timer", &self.timer)
            .field("delay", &self.delay)
            .field("periods", &self.periods)
            .field("amplitude", &self.amplitude)
            .field("speed", &self.speed)
            .field("offset", &self.offset)
            .field("value", &self.value)
            .field("custom", &self.custom.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 0.01;

    #[test]
    fn test_defaults() {
        let anim = Animator::new(Facet::X);
        assert_eq!(anim.periods(), 1.0);
        assert_eq!(anim.amplitude(), 0.5);
        assert_eq!(anim.speed(), 1.0);
        assert_eq!(anim.state(), AnimatorState::Active);
    }

    #[test]
    fn test_delay_remainder_carries_into_timer() {
        let mut anim = Animator::new(Facet::X).with_delay(1.0);
        assert_eq!(anim.state(), AnimatorState::Delayed);
        assert!(!anim.step(0.4, EPS).delay_ended);
        assert!(!anim.step(0.4, EPS).delay_ended);
        assert_eq!(anim.timer(), 0.0);
        let events = anim.step(0.4, EPS);
        assert!(events.delay_ended);
        assert_eq!(anim.state(), AnimatorState::Active);
        assert!((anim.timer() - 0.2).abs() < 1e-5);
    }

    #[test]
    fn test_expiry_is_latched_and_frozen() {
        let mut anim = Animator::new(Facet::X)
            .with_waveform(Waveform::Linear)
            .with_periods(1.0)
            .with_amplitude(10.0)
            .with_speed(2.0);
        anim.step(0.4, EPS);
        assert!(!anim.is_expired());
        assert!(anim.step(0.2, EPS).expired);
        let frozen = anim.compute_value(false);
        assert!((frozen - 10.0).abs() < 1e-4);
        assert!(!anim.step(1.0, EPS).expired);
        assert_eq!(anim.compute_value(false), frozen);
    }

    #[test]
    fn test_reset_on_expire_snaps_to_offset() {
        let mut anim = Animator::new(Facet::X)
            .with_offset(3.0)
            .with_amplitude(10.0)
            .with_reset_on_expire(true);
        anim.step(2.0, EPS);
        assert!(anim.is_expired());
        assert_eq!(anim.compute_value(false), 3.0);
    }

    #[test]
    fn test_negative_periods_never_expire() {
        let mut anim = Animator::new(Facet::X).with_periods(-1.0);
        for _ in 0..100 {
            anim.step(1.0, EPS);
        }
        assert!(!anim.is_expired());
    }

    #[test]
    fn test_zero_speed_does_not_divide() {
        let mut anim = Animator::new(Facet::X).with_speed(0.0).with_periods(0.0);
        anim.step(1.0, EPS);
        assert!(!anim.is_expired());
        assert!(anim.compute_value(false).is_finite());
    }

    #[test]
    fn test_acceleration_below_epsilon_is_ignored() {
        let mut anim = Animator::new(Facet::X).with_periods(-1.0).with_acceleration(0.005);
        anim.step(1.0, EPS);
        assert_eq!(anim.speed(), 1.0);

        let mut anim = Animator::new(Facet::X).with_periods(-1.0).with_acceleration(2.0);
        anim.step(0.5, EPS);
        assert!((anim.speed() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_disabled_clock_does_not_advance() {
        let mut anim = Animator::new(Facet::X);
        anim.set_enabled(false);
        anim.step(0.5, EPS);
        assert_eq!(anim.timer(), 0.0);
        assert!(!anim.is_animated());
    }

    #[test]
    fn test_reset_restores_delay() {
        let mut anim = Animator::new(Facet::X).with_delay(0.5);
        anim.step(3.0, EPS);
        assert!(anim.is_expired());
        anim.reset();
        assert_eq!(anim.state(), AnimatorState::Delayed);
        assert_eq!(anim.delay(), 0.5);
        assert_eq!(anim.timer(), 0.0);
    }

    #[test]
    fn test_noise_is_bounded_and_seeded() {
        let mut a = Animator::new(Facet::X)
            .with_waveform(Waveform::Noise)
            .with_periods(-1.0)
            .with_amplitude(2.0)
            .with_speed(-3.0)
            .with_seed(7);
        let mut b = Animator::new(Facet::X)
            .with_waveform(Waveform::Noise)
            .with_periods(-1.0)
            .with_amplitude(2.0)
            .with_speed(-3.0)
            .with_seed(7);
        for _ in 0..50 {
            a.step(0.1, EPS);
            b.step(0.1, EPS);
            let v = a.compute_value(false);
            assert!((-6.0..=6.0).contains(&v));
            assert_eq!(v, b.compute_value(false));
        }
    }

    #[test]
    fn test_custom_function_receives_time() {
        let mut anim = Animator::new(Facet::X)
            .with_periods(-1.0)
            .with_custom(|anim, t| t * 100.0 + anim.amplitude());
        anim.step(0.25, EPS);
        assert!((anim.compute_value(false) - 25.5).abs() < 1e-4);
    }

    #[test]
    fn test_property_surface() {
        let mut anim = Animator::new(Facet::X);
        assert_eq!(anim.set_property("func", "sine"), Ok(true));
        assert_eq!(anim.waveform(), Waveform::Sine);
        assert_eq!(anim.set_property("peak_to_peak", "8"), Ok(true));
        assert_eq!(anim.amplitude(), 4.0);
        assert_eq!(anim.set_property("time", "4"), Ok(true));
        assert_eq!(anim.speed(), 0.25);
        assert!(anim.set_property("time", "0").is_err());
        assert_eq!(anim.set_property("dc_offset", "2"), Ok(true));
        assert_eq!(anim.offset(), 2.0);
        assert_eq!(
            anim.set_property("function", "zigzag"),
            Err(ConfigError::UnknownWaveform("zigzag".into()))
        );
        assert_eq!(anim.set_property("wobble", "1"), Ok(false));
        assert_eq!(anim.set_property("target", "40"), Ok(true));
        assert_eq!(anim.get_property("inherit_value").as_deref(), Some("1"));
        assert_eq!(anim.get_property("function").as_deref(), Some("sine"));
        assert_eq!(anim.get_property("wobble"), None);
    }

    #[test]
    fn test_byte_clamped_write_skips_unchanged_byte() {
        let mut owner = Node::new("owner");
        owner.color.r = 100;
        let mut anim = Animator::new(Facet::Red);
        assert_eq!(anim.policy(), WritePolicy::ByteClamped);
        assert!(!anim.write_back(&mut owner, 100.2));
        assert!(anim.write_back(&mut owner, 400.0));
        assert_eq!(owner.color.r, 255);
        assert_eq!(anim.value(), 255.0);
    }
}
