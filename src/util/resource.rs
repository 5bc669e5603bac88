//! Resource utilization tracking
//!
//! Wall-clock and CPU-time snapshots for the parsum process. CPU time comes
//! from `getrusage(RUSAGE_SELF)`, which covers every thread of the process,
//! so a snapshot taken after the barrier includes all worker threads.

use serde::Serialize;
use std::time::{Duration, Instant};

/// Point-in-time resource usage
#[derive(Debug, Clone, Copy)]
pub struct ResourceSnapshot {
    /// CPU time in user mode
    pub cpu_user: Duration,
    /// CPU time in kernel mode
    pub cpu_system: Duration,
    /// Wall-clock time when snapshot was taken
    pub timestamp: Instant,
}

/// Resource usage between two snapshots
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunTiming {
    pub wall: Duration,
    pub cpu_user: Duration,
    pub cpu_system: Duration,
}

impl ResourceSnapshot {
    /// Take a snapshot of current resource utilization
    ///
    /// CPU fields are zero if `getrusage` fails, which it does not for
    /// `RUSAGE_SELF` on supported platforms.
    pub fn take() -> Self {
        let (cpu_user, cpu_system) = Self::read_cpu_time().unwrap_or_default();
        Self {
            cpu_user,
            cpu_system,
            timestamp: Instant::now(),
        }
    }

    /// Get the number of CPU cores on the system
    pub fn num_cpus() -> usize {
        num_cpus::get()
    }

    /// Read (user, system) CPU time of the whole process
    fn read_cpu_time() -> Option<(Duration, Duration)> {
        // SAFETY: rusage is plain old data, and getrusage only writes into
        // the struct we pass it.
        let usage = unsafe {
            let mut usage: libc::rusage = std::mem::zeroed();
            if libc::getrusage(libc::RUSAGE_SELF, &mut usage) != 0 {
                return None;
            }
            usage
        };

        Some((timeval_to_duration(usage.ru_utime), timeval_to_duration(usage.ru_stime)))
    }

    /// Usage accumulated since `earlier`
    pub fn since(&self, earlier: &ResourceSnapshot) -> RunTiming {
        RunTiming {
            wall: self.timestamp.saturating_duration_since(earlier.timestamp),
            cpu_user: self.cpu_user.saturating_sub(earlier.cpu_user),
            cpu_system: self.cpu_system.saturating_sub(earlier.cpu_system),
        }
    }
}

impl RunTiming {
    /// User plus system CPU time
    pub fn cpu_total(&self) -> Duration {
        self.cpu_user + self.cpu_system
    }

    /// CPU utilization as a percentage of one core (200.0 = two busy cores)
    pub fn cpu_percent(&self) -> f64 {
        let wall = self.wall.as_secs_f64();
        if wall == 0.0 {
            return 0.0;
        }
        self.cpu_total().as_secs_f64() / wall * 100.0
    }
}

fn timeval_to_duration(tv: libc::timeval) -> Duration {
    let secs = u64::try_from(tv.tv_sec).unwrap_or(0);
    let micros = u64::try_from(tv.tv_usec).unwrap_or(0);
    Duration::from_secs(secs) + Duration::from_micros(micros)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_cpu_time_advances_with_work() {
        let start = ResourceSnapshot::take();

        let mut sum = 0u64;
        for i in 0..5_000_000u64 {
            sum = sum.wrapping_add(i ^ (sum >> 3));
        }
        thread::sleep(Duration::from_millis(5));

        let end = ResourceSnapshot::take();
        let timing = end.since(&start);
        assert!(timing.wall >= Duration::from_millis(5));
        assert!(timing.cpu_total() >= Duration::ZERO);
        assert!(timing.cpu_percent() >= 0.0);

        // Prevent optimization
        assert!(sum > 0);
    }

    #[test]
    fn test_since_never_negative() {
        let later = ResourceSnapshot::take();
        let earlier = ResourceSnapshot {
            cpu_user: later.cpu_user + Duration::from_secs(1),
            cpu_system: later.cpu_system,
            timestamp: later.timestamp,
        };
        let timing = later.since(&earlier);
        assert_eq!(timing.cpu_user, Duration::ZERO);
        assert_eq!(timing.wall, Duration::ZERO);
    }

    #[test]
    fn test_cpu_percent_zero_wall() {
        let timing = RunTiming {
            wall: Duration::ZERO,
            cpu_user: Duration::from_millis(3),
            cpu_system: Duration::ZERO,
        };
        assert_eq!(timing.cpu_percent(), 0.0);
    }

    #[test]
    fn test_cpu_percent() {
        let timing = RunTiming {
            wall: Duration::from_millis(100),
            cpu_user: Duration::from_millis(150),
            cpu_system: Duration::from_millis(50),
        };
        assert!((timing.cpu_percent() - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_num_cpus() {
        assert!(ResourceSnapshot::num_cpus() >= 1);
    }
}
