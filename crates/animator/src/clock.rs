/// Rate at which the frame counter feeds the `move` value.
pub const MOVE_RATE: f64 = 0.005;
/// Period of the `move` value and length of the texture cycle.
pub const CYCLE_LENGTH: u64 = 4;
/// Angular rate of the transition oscillation.
pub const TRANSITION_RATE: f64 = 0.01;

/// Indices of the two color textures bound for a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TexturePair {
    pub current: usize,
    pub next: usize,
}

impl TexturePair {
    pub fn for_cycle(index: usize) -> Self {
        let current = index % CYCLE_LENGTH as usize;
        Self {
            current,
            next: (current + 1) % CYCLE_LENGTH as usize,
        }
    }
}

/// Frame counter that drives every time-dependent value of the effect.
///
/// The counter is a `u64` advanced once per rendered frame; at 240 Hz it
/// would take billions of years to saturate. All derived values are
/// computed in `f64` and narrowed at the end so long sessions keep their
/// precision.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AnimationClock {
    frame: u64,
}

impl AnimationClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock positioned at an arbitrary frame.
    pub fn at(frame: u64) -> Self {
        Self { frame }
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Advances the counter by exactly one frame.
    pub fn tick(&mut self) -> u64 {
        self.frame = self.frame.saturating_add(1);
        self.frame
    }

    fn phase(&self) -> f64 {
        self.frame as f64 * MOVE_RATE
    }

    /// `(frame * 0.005) mod 4`.
    pub fn move_value(&self) -> f32 {
        (self.phase() % CYCLE_LENGTH as f64) as f32
    }

    /// `floor(|frame * 0.005|) mod 4`.
    pub fn cycle_index(&self) -> usize {
        (self.phase().abs().floor() as u64 % CYCLE_LENGTH) as usize
    }

    /// Slot cross-faded toward, `(cycle_index + 1) mod 4`.
    pub fn next_index(&self) -> usize {
        (self.cycle_index() + 1) % CYCLE_LENGTH as usize
    }

    pub fn textures(&self) -> TexturePair {
        TexturePair::for_cycle(self.cycle_index())
    }

    /// `sin(frame * 0.01)`, deliberately left in `[-1, 1]`.
    pub fn transition(&self) -> f32 {
        (self.frame as f64 * TRANSITION_RATE).sin() as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_advances_by_one() {
        let mut clock = AnimationClock::new();
        assert_eq!(clock.frame(), 0);
        for expected in 1..=1000 {
            assert_eq!(clock.tick(), expected);
        }
        assert_eq!(clock.frame(), 1000);
    }

    #[test]
    fn tick_saturates_instead_of_wrapping() {
        let mut clock = AnimationClock::at(u64::MAX);
        clock.tick();
        assert_eq!(clock.frame(), u64::MAX);
    }

    #[test]
    fn move_value_wraps_every_800_frames() {
        assert_eq!(AnimationClock::at(0).move_value(), 0.0);
        assert_eq!(AnimationClock::at(800).move_value(), 0.0);
        assert_eq!(AnimationClock::at(1600).move_value(), 0.0);
        assert!((AnimationClock::at(200).move_value() - 1.0).abs() < 1e-6);
        assert!((AnimationClock::at(799).move_value() - 3.995).abs() < 1e-5);
    }

    #[test]
    fn cycle_index_walks_the_four_textures() {
        let mut clock = AnimationClock::new();
        let mut last = clock.cycle_index();
        assert_eq!(last, 0);
        let mut wraps = 0;
        for _ in 0..3200 {
            clock.tick();
            let index = clock.cycle_index();
            assert!(index < 4);
            if index != last {
                if last == 3 {
                    assert_eq!(index, 0);
                    wraps += 1;
                } else {
                    assert_eq!(index, last + 1);
                }
            }
            let pair = clock.textures();
            assert_eq!(pair.current, index);
            assert_eq!(pair.next, (index + 1) % 4);
            assert_eq!(clock.next_index(), pair.next);
            last = index;
        }
        assert_eq!(wraps, 4);
    }

    #[test]
    fn cycle_boundaries_fall_on_200_frame_steps() {
        assert_eq!(AnimationClock::at(199).cycle_index(), 0);
        assert_eq!(AnimationClock::at(200).cycle_index(), 1);
        assert_eq!(AnimationClock::at(600).cycle_index(), 3);
        assert_eq!(AnimationClock::at(800).cycle_index(), 0);
        assert_eq!(TexturePair::for_cycle(3), TexturePair { current: 3, next: 0 });
    }

    #[test]
    fn transition_oscillates_unclamped() {
        assert_eq!(AnimationClock::at(0).transition(), 0.0);
        let mut min = f32::MAX;
        let mut max = f32::MIN;
        for frame in 0..1000 {
            let value = AnimationClock::at(frame).transition();
            assert!((-1.0..=1.0).contains(&value));
            min = min.min(value);
            max = max.max(value);
        }
        assert!(min < -0.99);
        assert!(max > 0.99);
    }
}
