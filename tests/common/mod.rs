use rand::Rng;

/// A priority source that replays a fixed list of priorities.
pub struct Scripted {
    priorities: Vec<u32>,
    next: usize,
}

impl Scripted {
    pub fn new(priorities: &[u32]) -> Self {
        Scripted {
            priorities: priorities.to_vec(),
            next: 0,
        }
    }
}

impl Rng for Scripted {
    fn next_u32(&mut self) -> u32 {
        let priority = self.priorities[self.next];
        self.next += 1;
        priority
    }
}
