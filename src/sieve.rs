//! Lazily grown Eratosthenes bitmap backing `pri`, `com`, `npri` and `ncom`.
//!
//! The sieve is owned by the evaluator state, so independent evaluations never
//! contend on shared memory.

/// Bitmap sieve over `0..limit`; a set bit marks a composite number.
#[derive(Debug, Default, Clone)]
pub struct Sieve {
    composite: Vec<u64>,
    limit: usize,
}

impl Sieve {
    pub fn new() -> Self {
        Sieve::default()
    }

    fn is_set(&self, index: usize) -> bool {
        self.composite[index / 64] & (1 << (index % 64)) != 0
    }

    fn set(&mut self, index: usize) {
        self.composite[index / 64] |= 1 << (index % 64);
    }

    /// Ensures the sieve covers `0..required`. Growth overshoots to 3/2 of
    /// the requested range (floor 10_000) so repeated nearby queries do not
    /// re-sieve.
    fn ensure(&mut self, required: usize) {
        if self.limit >= required {
            return;
        }
        let target = (required * 3 / 2).max(10_000);
        log::trace!("regrowing prime sieve from {} to {}", self.limit, target);

        self.composite = vec![0; target / 64 + 1];
        self.limit = target;

        let mut p = 2;
        while p * p < target {
            if !self.is_set(p) {
                let mut multiple = p * p;
                while multiple < target {
                    self.set(multiple);
                    multiple += p;
                }
            }
            p += 1;
        }
    }

    pub fn is_prime(&mut self, n: u64) -> bool {
        if n < 2 {
            return false;
        }
        let n = n as usize;
        self.ensure(n + 1);
        !self.is_set(n)
    }

    /// Composites start at 4; 0, 1 and the primes are excluded.
    pub fn is_composite(&mut self, n: u64) -> bool {
        n >= 4 && !self.is_prime(n)
    }

    /// Zero-based: `nth_prime(0) == 2`.
    pub fn nth_prime(&mut self, n: usize) -> u64 {
        // p_n < n(ln n + ln ln n) for n >= 6; smaller inputs use the floor.
        let estimate = if n < 6 {
            100.0
        } else {
            let nf = n as f64;
            (nf * (nf.ln() + nf.ln().ln())).max(100.0)
        };
        self.ensure(estimate as usize + 1);

        loop {
            let mut seen = 0;
            for candidate in 2..self.limit {
                if !self.is_set(candidate) {
                    if seen == n {
                        return candidate as u64;
                    }
                    seen += 1;
                }
            }
            // Estimate fell short; widen and rescan.
            self.ensure(self.limit * 2);
        }
    }

    /// Zero-based: `nth_composite(0) == 4`.
    pub fn nth_composite(&mut self, n: usize) -> u64 {
        self.ensure((2 * n + 4).max(100));

        loop {
            let mut seen = 0;
            for candidate in 4..self.limit {
                if self.is_set(candidate) {
                    if seen == n {
                        return candidate as u64;
                    }
                    seen += 1;
                }
            }
            self.ensure(self.limit * 2);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primality() {
        let mut sieve = Sieve::new();
        assert!(sieve.is_prime(2));
        assert!(sieve.is_prime(7));
        assert!(!sieve.is_prime(8));
        assert!(!sieve.is_prime(1));
        assert!(!sieve.is_prime(0));
        assert!(sieve.is_prime(7919));
    }

    #[test]
    fn test_composites() {
        let mut sieve = Sieve::new();
        assert!(sieve.is_composite(4));
        assert!(sieve.is_composite(9));
        assert!(!sieve.is_composite(3));
        assert!(!sieve.is_composite(1));
    }

    #[test]
    fn test_nth_prime() {
        let mut sieve = Sieve::new();
        assert_eq!(sieve.nth_prime(0), 2);
        assert_eq!(sieve.nth_prime(4), 11);
        assert_eq!(sieve.nth_prime(10), 31);
        // Beyond the initial floor, forcing the estimate path.
        assert_eq!(sieve.nth_prime(999), 7919);
    }

    #[test]
    fn test_nth_composite() {
        let mut sieve = Sieve::new();
        assert_eq!(sieve.nth_composite(0), 4);
        assert_eq!(sieve.nth_composite(1), 6);
        assert_eq!(sieve.nth_composite(4), 10);
    }

    #[test]
    fn test_growth_is_monotonic() {
        let mut sieve = Sieve::new();
        assert!(sieve.is_prime(5));
        let small = sieve.limit;
        assert!(sieve.is_prime(100_003));
        assert!(sieve.limit > small);
        assert!(sieve.limit >= 100_004);
    }
}
