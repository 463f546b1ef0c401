//! Bounded busy-waiting on hardware status flags.
//!
//! Hardware handshakes in this crate (oscillator stabilization, calibration,
//! conversion completion) are busy-waited. [`Wait`] makes the bound explicit:
//! [`Wait::Forever`] spins until the flag comes up, [`Wait::Spins`] gives up
//! after a fixed number of polls and reports [`Timeout`].

/// How long to poll a status flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Wait {
    /// Poll until the condition holds.
    Forever,
    /// Poll at most this many times.
    Spins(u32),
}

impl Default for Wait {
    fn default() -> Self {
        Wait::Forever
    }
}

/// The polled condition did not come up within the bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timeout;

/// Polls `ready` under the given bound.
pub fn spin_until(wait: Wait, mut ready: impl FnMut() -> bool) -> Result<(), Timeout> {
    match wait {
        Wait::Forever => {
            while !ready() {}
            Ok(())
        }
        Wait::Spins(n) => {
            for _ in 0..n {
                if ready() {
                    return Ok(());
                }
            }
            Err(Timeout)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_wait_times_out() {
        assert_eq!(spin_until(Wait::Spins(10), || false), Err(Timeout));
    }

    #[test]
    fn bounded_wait_stops_polling_once_ready() {
        let mut polls = 0;
        let res = spin_until(Wait::Spins(10), || {
            polls += 1;
            polls == 3
        });
        assert_eq!(res, Ok(()));
        assert_eq!(polls, 3);
    }

    #[test]
    fn zero_spins_never_polls() {
        let mut polls = 0;
        let res = spin_until(Wait::Spins(0), || {
            polls += 1;
            true
        });
        assert_eq!(res, Err(Timeout));
        assert_eq!(polls, 0);
    }

    #[test]
    fn forever_returns_when_ready() {
        assert_eq!(spin_until(Wait::Forever, || true), Ok(()));
    }
}
