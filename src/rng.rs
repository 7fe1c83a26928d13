#[derive(Clone, Debug)]
pub struct Rng {
    state: u32,
}

impl Rng {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    pub fn from_entropy() -> Self {
        Self::new(rand::random::<u32>())
    }

    pub fn next_f32(&mut self) -> f32 {
        self.state = self.state.wrapping_add(0x6d2b79f5);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        let out = t ^ (t >> 14);
        let value = (out as f64 / 4_294_967_296.0) as f32;
        // f64 -> f32 rounding can land exactly on 1.0
        value.min(1.0 - f32::EPSILON)
    }

    pub fn int(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        let span = (max - min + 1) as f32;
        let offset = (self.next_f32() * span).floor() as i32;
        min + offset.min(max - min)
    }

    pub fn chance(&mut self, probability: f32) -> bool {
        self.next_f32() < probability
    }

    pub fn pick_index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        (self.next_f32() * len as f32).floor().min((len - 1) as f32) as usize
    }

    pub fn sign(&mut self) -> i32 {
        if self.pick_index(2) == 0 {
            -1
        } else {
            1
        }
    }

    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for idx in (1..items.len()).rev() {
            let swap_with = self.pick_index(idx + 1);
            items.swap(idx, swap_with);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_replays_same_sequence() {
        let mut a = Rng::new(42);
        let mut b = Rng::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_f32().to_bits(), b.next_f32().to_bits());
        }
    }

    #[test]
    fn int_stays_within_inclusive_range() {
        let mut rng = Rng::new(7);
        let mut seen_min = false;
        let mut seen_max = false;
        for _ in 0..5_000 {
            let value = rng.int(3, 6);
            assert!((3..=6).contains(&value));
            seen_min |= value == 3;
            seen_max |= value == 6;
        }
        assert!(seen_min && seen_max);
    }

    #[test]
    fn int_with_empty_range_returns_min() {
        let mut rng = Rng::new(1);
        assert_eq!(rng.int(5, 5), 5);
        assert_eq!(rng.int(5, 2), 5);
    }

    #[test]
    fn chance_respects_extremes() {
        let mut rng = Rng::new(99);
        for _ in 0..1_000 {
            assert!(rng.chance(1.0));
            assert!(!rng.chance(0.0));
        }
    }

    #[test]
    fn shuffle_keeps_every_element() {
        let mut rng = Rng::new(11);
        let mut items: Vec<i32> = (0..8).collect();
        rng.shuffle(&mut items);
        let mut sorted = items.clone();
        sorted.sort();
        assert_eq!(sorted, (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn sign_is_never_zero() {
        let mut rng = Rng::new(3);
        for _ in 0..200 {
            let value = rng.sign();
            assert!(value == -1 || value == 1);
        }
    }
}
